pub mod ledger;
pub mod models;
pub mod repository;

pub use ledger::CommissionLedger;
pub use models::{AffiliateConversion, CommissionRates, ConversionStatus, ConversionType};
pub use repository::{ConversionRepository, ReferralRepository};
