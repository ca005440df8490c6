//! Task document schema
//!
//! A creator-published unit of engagement work. Creation escrows
//! `reward_points * max_participants` from the creator's balance.
//! `participant_count` is maintained atomically by the participation path so
//! capacity can be enforced as a conditional increment instead of a
//! count-then-insert race.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for tasks
pub const TASK_COLLECTION: &str = "tasks";

/// Task lifecycle status
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Active,
    Completed,
    Inactive,
}

/// Task document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TaskDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning creator
    pub creator_id: ObjectId,

    /// Display title
    pub title: String,

    /// Longer description of the work
    #[serde(default)]
    pub description: String,

    /// Media reference (image URL), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,

    /// Target platform (validated against platform_configs at write time)
    pub platform: String,

    /// Required engagement types, a subset of the platform's vocabulary
    pub engagement_types: Vec<String>,

    /// $CLS paid per participant on a claimed completion
    pub reward_points: i64,

    /// Maximum number of participants
    pub max_participants: i64,

    /// Participants admitted so far (atomically incremented)
    #[serde(default)]
    pub participant_count: i64,

    /// Optional expiration; once in the past the task accepts no new
    /// participation regardless of `status`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime>,

    /// Lifecycle status
    #[serde(default)]
    pub status: TaskStatus,
}

impl TaskDoc {
    /// Total points escrowed from the creator at creation time
    ///
    /// `None` when `reward_points * max_participants` overflows i64; callers
    /// reject the task instead of escrowing a wrapped amount.
    pub fn escrow_amount(&self) -> Option<i64> {
        self.reward_points.checked_mul(self.max_participants)
    }

    /// Whether the task is expired at `now`
    pub fn is_expired(&self, now: DateTime) -> bool {
        match self.expires_at {
            Some(expiry) => expiry <= now,
            None => false,
        }
    }
}

impl IntoIndexes for TaskDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "creator_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("creator_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "status": 1, "expires_at": 1 },
                Some(
                    IndexOptions::builder()
                        .name("status_expiry_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for TaskDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escrow_amount() {
        let task = TaskDoc {
            reward_points: 25,
            max_participants: 40,
            ..Default::default()
        };
        assert_eq!(task.escrow_amount(), Some(1000));
    }

    #[test]
    fn test_escrow_amount_overflow_is_none() {
        let task = TaskDoc {
            reward_points: i64::MAX / 2,
            max_participants: 3,
            ..Default::default()
        };
        assert_eq!(task.escrow_amount(), None);
    }

    #[test]
    fn test_expiry() {
        let now = DateTime::now();
        let past = DateTime::from_millis(now.timestamp_millis() - 1000);
        let future = DateTime::from_millis(now.timestamp_millis() + 60_000);

        let mut task = TaskDoc::default();
        assert!(!task.is_expired(now), "no expiry means never expired");

        task.expires_at = Some(past);
        assert!(task.is_expired(now));

        task.expires_at = Some(future);
        assert!(!task.is_expired(now));
    }
}
