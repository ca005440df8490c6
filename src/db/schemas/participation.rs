//! Participation document schema
//!
//! One account's attempt at one task: pending -> completed -> claimed.
//! pending -> completed is the task owner's review decision; completed ->
//! claimed pays the reward.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for participations
pub const PARTICIPATION_COLLECTION: &str = "participations";

/// Participation lifecycle status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    #[default]
    Pending,
    Completed,
    Claimed,
}

/// Participation document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ParticipationDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Participating account
    pub account_id: ObjectId,

    /// Task being attempted
    pub task_id: ObjectId,

    /// Free-form proof of completion (URL or text)
    #[serde(default)]
    pub proof: String,

    /// Lifecycle status
    #[serde(default)]
    pub status: ParticipationStatus,
}

impl ParticipationDoc {
    /// New pending participation
    pub fn pending(account_id: ObjectId, task_id: ObjectId, proof: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            account_id,
            task_id,
            proof,
            status: ParticipationStatus::Pending,
        }
    }
}

impl IntoIndexes for ParticipationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "account_id": 1, "task_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("account_task_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "task_id": 1, "status": 1 },
                Some(
                    IndexOptions::builder()
                        .name("task_status_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ParticipationDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ParticipationStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&ParticipationStatus::Claimed).unwrap(),
            "\"claimed\""
        );
    }
}
