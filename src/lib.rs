//! taskdeck: a personal task and note board.
//!
//! The core is the ordering engine in [`ops`]: tasks live in one flat
//! collection that must render correctly when split by group and by
//! completion state. [`store::Store`] wraps the operations with
//! persistence, subscriptions, and focus mode; [`deck::Deck`] opens a store
//! on a locked data directory.

pub mod deck;
pub mod io;
pub mod logging;
pub mod model;
pub mod ops;
pub mod store;
