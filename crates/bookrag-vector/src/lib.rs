//! bookrag-vector
//!
//! LanceDB-backed chunk store: staged writes with an atomic swap
//! ([`StoreBuilder`]) and cosine-similarity retrieval ([`LanceStore`]).

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use search::{relevance_from_cosine_distance, LanceStore};
pub use table::StoreMeta;
pub use writer::StoreBuilder;
