//! # Volley Engine
//!
//! HTTP load generator behind the [`volley_core::LoadEngine`] contract.
//!
//! A run uses `c` workers, each with its own keep-alive HTTP/1.1 client limited
//! to one idle connection. With a positive rate every worker fires on a fixed
//! schedule of `c / qps` seconds, otherwise workers run back-to-back. A run ends
//! after an exact number of calls, after its duration or when cancelled.
//!
//! Latencies and response sizes are recorded in HdrHistograms and reported as
//! [`volley_core::RunResults`]. Transport failures are counted under
//! [`volley_core::TRANSPORT_ERROR_CODE`].

pub mod config;
pub mod engine;
pub mod histogram;
pub mod worker;

pub use config::EngineSettings;
pub use engine::HttpLoadEngine;
