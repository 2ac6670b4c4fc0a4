//! Search index for bibhub entries.
//!
//! The entry store pushes an [`IndexRecord`](bibhub_types::IndexRecord)
//! after every save and asks the index for matching ids. The index is never
//! authoritative: it can be cleared and rebuilt from the hub and hook files
//! at any time.

pub mod error;
pub mod filter;
pub mod memory;
pub mod traits;

pub use error::{SearchError, SearchResult};
pub use filter::matches;
pub use memory::InMemorySearchIndex;
pub use traits::SearchIndex;
