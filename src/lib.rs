//! # EV Charging Reservations
//!
//! Reserve chargepoint connectors for a bounded time, start charging within
//! a ten minute grace window, and let a background sweep release lapsed
//! reservations.
//!
//! - **domain**: chargepoints, the connector state machine, reservations and users
//! - **application**: reservation lifecycle, registry and the expiry sweep
//! - **infrastructure**: SeaORM/SQLite and in-memory repositories
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: errors and shutdown plumbing

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};

pub use interfaces::http::create_api_router;

pub use server::{ServerHandle, ServerOptions};
