pub mod inventory;
pub mod promotion;
pub mod unit;

pub use inventory::{AdmissionError, HoldToken, InventoryGuard};
pub use promotion::{DiscountResult, DiscountType, Promotion, PromotionEngine, PromotionRepository};
pub use unit::{SellableUnit, UnitKind, UnitRepository};
