pub mod config_io;
pub mod lock;
pub mod paths;
pub mod recovery;
pub mod store;

pub use store::{FileStore, MonthStore, StoreError};
