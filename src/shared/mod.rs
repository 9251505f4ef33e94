pub mod errors;
pub mod shutdown;

pub use errors::{DomainError, ErrorKind};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
