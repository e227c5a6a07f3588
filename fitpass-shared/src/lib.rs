pub mod money;
pub mod reference;
pub mod window;

pub use window::TimeWindow;
