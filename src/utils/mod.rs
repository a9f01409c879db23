pub mod logging;
pub mod math;
pub mod time;

pub use logging::*;
pub use math::*;
pub use time::*;
