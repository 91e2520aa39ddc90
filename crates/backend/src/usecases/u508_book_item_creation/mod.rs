pub mod csv_import;
pub mod error;
pub mod executor;
pub mod export;
pub mod realtime;

pub use error::BookItemError;
pub use executor::BookItemExecutor;
pub use realtime::{RealtimeHub, RealtimeMessage};
