//! Value types exchanged with callers of the asset storage service.
//!
//! Nothing here is persisted by this crate. Callers store the `url` string
//! (and, where they can, the backend tag) in their own records.

pub mod asset;
