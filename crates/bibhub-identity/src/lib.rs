//! DOI/PMID identity index for bibhub.
//!
//! Maps normalized external identifiers to entry ids so imports can detect
//! records that already exist. The index is a cache: it is built by
//! scanning every persisted entry once, kept current by the store on each
//! save, and can be reset and rebuilt at any time.
//!
//! Normalization is a strategy ([`IdentifierNormalizer`]) chosen when the
//! index is constructed; [`DefaultNormalizer`] is used unless the caller
//! supplies another.

pub mod error;
pub mod index;
pub mod normalize;
pub mod source;

pub use error::{IdentityError, IdentityResult};
pub use index::{IdentityIndex, IndexPhase};
pub use normalize::{DefaultNormalizer, IdentifierNormalizer, LegacyNormalizer};
pub use source::{IdentityRecord, IdentitySource};
