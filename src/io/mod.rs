pub mod config_io;
pub mod json_store;
pub mod lock;
pub mod migrate;
pub mod recovery;
pub mod storage;
pub mod write_behind;
