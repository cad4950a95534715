//! Sink utilities
//!
//! - **chain_writer**: buffered gzip/plain writers wrapping each output file
//! - **rate_limited_logger**: error logging that stays quiet under floods

pub mod chain_writer;
pub mod rate_limited_logger;

pub use chain_writer::{
    ChainWrite, ChainWriter, DEFAULT_BUFFER_SIZE, GzipWriter, PlainWriter, chain_writer_for,
};
pub use rate_limited_logger::{DEFAULT_LOG_INTERVAL, MAX_DATA_LOG_LENGTH, RateLimitedLogger};
