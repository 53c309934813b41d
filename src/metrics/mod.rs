mod feed;
mod history;
mod sampler;
mod source;

pub use feed::*;
pub use history::*;
pub use sampler::*;
pub use source::*;

use std::time::Instant;
use thiserror::Error;

/// One CPU and memory reading taken by the sampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub timestamp: Instant,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SampleError {
    #[error("{0} is not available")]
    Unavailable(&'static str),

    #[error("invalid {metric} reading: {value}")]
    InvalidReading { metric: &'static str, value: f64 },

    #[error("no filesystem is mounted at {0}")]
    NoFilesystem(String),
}
