//! Engagement counter document schemas
//!
//! Likes, comments, and shares are independent append-only collections keyed
//! by (task, account). They are only ever counted in aggregate; individual
//! documents are never re-read for content.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for task likes
pub const TASK_LIKE_COLLECTION: &str = "task_likes";

/// Collection name for task comments
pub const TASK_COMMENT_COLLECTION: &str = "task_comments";

/// Collection name for task shares
pub const TASK_SHARE_COLLECTION: &str = "task_shares";

fn counter_indices() -> Vec<(Document, Option<IndexOptions>)> {
    vec![
        (
            doc! { "task_id": 1, "account_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("task_account_unique".to_string())
                    .build(),
            ),
        ),
        (
            doc! { "task_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("task_index".to_string())
                    .build(),
            ),
        ),
    ]
}

/// One like on a task
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TaskLikeDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub task_id: ObjectId,

    pub account_id: ObjectId,
}

impl IntoIndexes for TaskLikeDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        counter_indices()
    }
}

impl MutMetadata for TaskLikeDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// One comment on a task
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TaskCommentDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub task_id: ObjectId,

    pub account_id: ObjectId,

    /// Comment text (stored, never re-read by the core; counted only)
    #[serde(default)]
    pub body: String,
}

impl IntoIndexes for TaskCommentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        counter_indices()
    }
}

impl MutMetadata for TaskCommentDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

/// One share of a task
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TaskShareDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub task_id: ObjectId,

    pub account_id: ObjectId,
}

impl IntoIndexes for TaskShareDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        counter_indices()
    }
}

impl MutMetadata for TaskShareDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
