pub mod config;
pub mod focus;
pub mod group;
pub mod note;
pub mod tag;
pub mod task;

pub use config::*;
pub use focus::*;
pub use group::*;
pub use note::*;
pub use tag::*;
pub use task::*;

/// Generate a fresh stable identifier for any entity.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
