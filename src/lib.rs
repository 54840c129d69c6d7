pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
pub mod ledger;
pub mod model;
pub mod snapshot;
pub mod store;
pub mod summary;
mod utils;


pub use backup::{Backup, PRE_IMPORT};
pub use config::Config;
pub use error::{error_type, Error, ErrorType, IntoResult, PublicError, Result};
pub use ledger::Ledger;
pub use snapshot::{ImportReport, PendingImport, Snapshot, SnapshotError};
pub use store::{Key, Medium, MemoryMedium, RecordStore, SqliteMedium};
pub use summary::Summary;
