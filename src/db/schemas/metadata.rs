//! Shared document metadata envelope
//!
//! Every collection embeds this under `metadata`. `created_at` doubles as
//! the event timestamp for append-only documents (ledger entries, follows,
//! engagement counters).

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Timestamps and soft-delete flag common to all documents
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,

    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// Soft-delete flag; reads filter on `metadata.is_deleted != true`
    #[serde(default)]
    pub is_deleted: bool,

    /// When the document was soft-deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime>,
}

impl Metadata {
    /// Fresh metadata stamped with the current time
    pub fn new() -> Self {
        let now = DateTime::now();
        Self {
            created_at: Some(now),
            updated_at: Some(now),
            is_deleted: false,
            deleted_at: None,
        }
    }
}
