pub mod diagnostic;
pub mod insight;
pub mod market_metrics;
pub mod protocol_health;
pub mod raw_protocol;

pub use diagnostic::*;
pub use insight::*;
pub use market_metrics::*;
pub use protocol_health::*;
pub use raw_protocol::*;
