// Bonus allocation: the brand → sub-brand → indicator tree and everything
// that changes it. All changes commit through renormalization to 100%.

pub mod adjust;
pub mod edit;
pub mod handlers;
pub mod models;
pub mod seed;
pub mod store;
pub mod summary;

pub use adjust::{apply_adjustments, Adjustment, IndicatorAdjustment};
pub use edit::AllocationError;
pub use store::AllocationStore;
