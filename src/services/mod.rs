pub mod diagnostics;
pub mod health_scorer;
pub mod insight_generator;
pub mod market_aggregator;
pub mod protocol_pipeline;
pub mod protocol_source;
pub mod source_validator;

pub use diagnostics::*;
pub use health_scorer::*;
pub use insight_generator::*;
pub use market_aggregator::*;
pub use protocol_pipeline::*;
pub use protocol_source::*;
pub use source_validator::*;
