pub mod query;

pub use query::{RunIdQuery, RunQuery, RUN_ID_PARAM};
