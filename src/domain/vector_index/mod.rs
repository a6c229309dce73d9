//! Exact nearest-neighbour search over a growable set of embeddings
//!
//! The index is rebuilt from the full stored vector collection on every
//! mutation. Callers only depend on `new`/`add`/`search`, so an incremental
//! structure can replace the flat matrix without touching call sites.

mod index;

pub use index::{Neighbor, VectorIndex};
