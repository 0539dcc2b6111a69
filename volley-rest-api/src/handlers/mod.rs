pub mod health;
pub mod runs;

pub use health::health_check;
pub use runs::{run, status, stop};
