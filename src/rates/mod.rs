//! Rate keys, snapshots, and the history log's entry and diff types.

pub mod history;
pub mod key;
pub mod snapshot;
