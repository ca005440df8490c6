//! Daily claim document schema
//!
//! One record per account: last-claim timestamp and streak counter. Created
//! lazily on the first successful claim.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for daily claim state
pub const DAILY_CLAIM_COLLECTION: &str = "daily_claims";

/// Per-account daily claim state
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct DailyClaimDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning account (unique)
    pub account_id: ObjectId,

    /// When the account last claimed, if ever
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_claimed_at: Option<DateTime>,

    /// Consecutive claim counter. Increments on every successful claim;
    /// gaps do not reset it.
    #[serde(default)]
    pub streak: i64,
}

impl DailyClaimDoc {
    /// First claim for an account: streak starts at 1
    pub fn first_claim(account_id: ObjectId, claimed_at: DateTime) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            account_id,
            last_claimed_at: Some(claimed_at),
            streak: 1,
        }
    }
}

impl IntoIndexes for DailyClaimDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "account_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("account_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for DailyClaimDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
