use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub currency: String,
    /// How long a pending authorization may wait for its settlement
    /// callback before the reaper expires it.
    pub settlement_horizon_seconds: i64,
    pub reaper_interval_seconds: u64,
    /// Commission rate table, keyed by conversion type.
    pub booking_commission_rate_bps: i64,
    pub signup_commission_minor: i64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .set_default("server.port", 8080)?
            .set_default("business_rules.currency", "THB")?
            .set_default("business_rules.settlement_horizon_seconds", 1800)?
            .set_default("business_rules.reaper_interval_seconds", 60)?
            .set_default("business_rules.booking_commission_rate_bps", 500)?
            .set_default("business_rules.signup_commission_minor", 5000)?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. FITPASS__SERVER__PORT=9090
            .add_source(config::Environment::with_prefix("FITPASS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
