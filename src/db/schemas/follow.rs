//! Follow relation document schema
//!
//! Directed edge follower -> followee. Unlike every other collection this one
//! is hard-deleted on unfollow; the unique index makes duplicate follows a
//! write-time conflict rather than a read-then-check race.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for follow relations
pub const FOLLOW_RELATION_COLLECTION: &str = "follow_relations";

/// Directed follow edge
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FollowRelationDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at is the follow timestamp)
    #[serde(default)]
    pub metadata: Metadata,

    /// Account doing the following
    pub follower_id: ObjectId,

    /// Creator being followed
    pub followee_id: ObjectId,
}

impl FollowRelationDoc {
    pub fn new(follower_id: ObjectId, followee_id: ObjectId) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            follower_id,
            followee_id,
        }
    }
}

impl IntoIndexes for FollowRelationDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "follower_id": 1, "followee_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("pair_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for FollowRelationDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
