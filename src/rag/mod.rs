//! Retrieval over the reference corpus.
//!
//! A small in-memory nearest-neighbor index is built once at startup and
//! queried read-only for the lifetime of the process.

mod index;

pub use index::{SearchResult, SimilarityIndex};
