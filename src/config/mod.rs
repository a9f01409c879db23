pub mod settings;
pub mod thresholds;

pub use settings::*;
pub use thresholds::*;
