//! Health module: liveness and storage ping

pub mod handlers;

pub use handlers::*;
