//! Engagement counter appends
//!
//! Likes, comments, and shares feed the trending aggregation and nothing
//! else. Appends are idempotent per (task, account) via the unique index;
//! a second like from the same account is a conflict, not a double count.

use bson::{doc, oid::ObjectId};

use crate::db::schemas::{
    Metadata, TaskCommentDoc, TaskDoc, TaskLikeDoc, TaskShareDoc, TASK_COLLECTION,
    TASK_COMMENT_COLLECTION, TASK_LIKE_COLLECTION, TASK_SHARE_COLLECTION,
};
use crate::db::MongoClient;
use crate::types::{CoreError, Result};

/// Appends engagement counter documents
pub struct EngagementService {
    mongo: MongoClient,
}

impl EngagementService {
    pub fn new(mongo: MongoClient) -> Self {
        Self { mongo }
    }

    async fn require_task(&self, task_id: ObjectId) -> Result<()> {
        let tasks = self.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
        tasks
            .find_one(doc! { "_id": task_id })
            .await?
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound("task not found".into()))
    }

    fn map_duplicate(e: CoreError, what: &str) -> CoreError {
        match e {
            CoreError::Database(ref msg) if msg.contains("E11000") => {
                CoreError::Conflict(format!("already {} this task", what))
            }
            other => other,
        }
    }

    /// Record a like
    pub async fn like(&self, account_id: ObjectId, task_id: ObjectId) -> Result<ObjectId> {
        self.require_task(task_id).await?;

        let likes = self.mongo.collection::<TaskLikeDoc>(TASK_LIKE_COLLECTION).await?;
        likes
            .insert_one(TaskLikeDoc {
                _id: None,
                metadata: Metadata::new(),
                task_id,
                account_id,
            })
            .await
            .map_err(|e| Self::map_duplicate(e, "liked"))
    }

    /// Record a comment
    pub async fn comment(
        &self,
        account_id: ObjectId,
        task_id: ObjectId,
        body: String,
    ) -> Result<ObjectId> {
        if body.trim().is_empty() {
            return Err(CoreError::BadInput("comment body is required".into()));
        }
        self.require_task(task_id).await?;

        let comments = self
            .mongo
            .collection::<TaskCommentDoc>(TASK_COMMENT_COLLECTION)
            .await?;
        comments
            .insert_one(TaskCommentDoc {
                _id: None,
                metadata: Metadata::new(),
                task_id,
                account_id,
                body,
            })
            .await
            .map_err(|e| Self::map_duplicate(e, "commented on"))
    }

    /// Record a share
    pub async fn share(&self, account_id: ObjectId, task_id: ObjectId) -> Result<ObjectId> {
        self.require_task(task_id).await?;

        let shares = self.mongo.collection::<TaskShareDoc>(TASK_SHARE_COLLECTION).await?;
        shares
            .insert_one(TaskShareDoc {
                _id: None,
                metadata: Metadata::new(),
                task_id,
                account_id,
            })
            .await
            .map_err(|e| Self::map_duplicate(e, "shared"))
    }
}
