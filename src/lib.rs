pub mod adapters;
pub mod config;
pub mod disk;
pub mod list;
pub mod model;
pub mod util;

pub use config::DiskConfig;
pub use disk::OssDisk;
pub use list::{CancelFlag, ListRequest};
pub use model::entry::{Entry, EntryKind, Visibility};
pub use model::error::{DiskError, RemoteError};
