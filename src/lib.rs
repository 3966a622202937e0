// imagepress library
// Image upload service: multipart in, transformed file on disk, JSON out

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod router;
pub mod server;
pub mod transform;
pub mod upload;
