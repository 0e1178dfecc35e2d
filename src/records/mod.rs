//! The record store.
//!
//! Records are keyed by original page URL and held alongside a single
//! coverage range. Both only ever grow: records are never replaced or
//! removed, and the end of coverage is never lowered.

mod store;

pub use store::RecordStore;
