pub mod health;
pub mod runs;

pub use health::HealthResponse;
pub use runs::{AsyncReply, StatusReply, StopReply};
