use async_trait::async_trait;
use bibhub_types::EntryId;
use chrono::{DateTime, Utc};

use crate::error::IdentityResult;

/// Raw identifiers of one persisted entry, as read during a scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityRecord {
    pub id: EntryId,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub updated_utc: DateTime<Utc>,
}

/// Supplies every persisted entry's identifiers for the initial build.
///
/// Implementations skip entries they cannot parse rather than failing the
/// whole scan.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    async fn scan_identities(&self) -> IdentityResult<Vec<IdentityRecord>>;
}
