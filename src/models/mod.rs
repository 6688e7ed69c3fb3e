pub mod block;
pub mod metrics;
pub mod record;
pub mod tokens;

pub use block::{ModelStats, SessionBlock};
pub use metrics::{BurnRate, LoadStats, Metrics};
pub use record::UsageRecord;
pub use tokens::TokenVector;
