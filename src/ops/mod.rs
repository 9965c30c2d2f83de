//! Operations on the in-memory collections. None of them touch storage.

pub mod completion;
pub mod group_ops;
pub mod move_ops;
pub mod note_ops;
pub mod order;
pub mod query;
pub mod tag_ops;
pub mod task_ops;
