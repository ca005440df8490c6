//! Follow / unfollow settlement
//!
//! A directed NotFollowing <-> Following state machine per (follower,
//! followee) pair. Following is free (no reward is paid; the UI copy that
//! promises one is wrong, see DESIGN.md). Unfollowing costs a fixed fee and
//! settles the relation delete, the balance debit, and the ledger entry as
//! one transaction.

use bson::{doc, oid::ObjectId};
use tracing::info;

use crate::db::schemas::{
    AccountDoc, FollowRelationDoc, Role, TxKind, ACCOUNT_COLLECTION, FOLLOW_RELATION_COLLECTION,
};
use crate::db::MongoClient;
use crate::services::ledger::LedgerService;
use crate::types::{CoreError, Result};

/// Fixed $CLS fee charged on unfollow
pub const UNFOLLOW_FEE: i64 = 5;

/// Follow relationship settlement
pub struct FollowService {
    mongo: MongoClient,
    ledger: LedgerService,
}

impl FollowService {
    pub fn new(mongo: MongoClient) -> Self {
        let ledger = LedgerService::new(mongo.clone());
        Self { mongo, ledger }
    }

    async fn load_followee(&self, handle: &str) -> Result<AccountDoc> {
        let accounts = self.mongo.collection::<AccountDoc>(ACCOUNT_COLLECTION).await?;
        accounts
            .find_one(doc! { "handle": handle })
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("creator '{}' not found", handle)))
    }

    /// Follow a creator
    ///
    /// Preconditions, each its own reported condition: not self, followee
    /// exists, followee is a creator, follower is a creator (an inherited
    /// rule: only creators follow creators), no existing relation.
    pub async fn follow(&self, follower: &AccountDoc, followee_handle: &str) -> Result<ObjectId> {
        let followee = self.load_followee(followee_handle).await?;

        let follower_id = follower
            ._id
            .ok_or_else(|| CoreError::Database("follower missing _id".into()))?;
        let followee_id = followee
            ._id
            .ok_or_else(|| CoreError::Database("followee missing _id".into()))?;

        if follower_id == followee_id {
            return Err(CoreError::PreconditionFailed(
                "cannot follow yourself".into(),
            ));
        }

        if followee.role != Role::Creator {
            return Err(CoreError::PreconditionFailed(format!(
                "'{}' is not a creator",
                followee_handle
            )));
        }

        if follower.role != Role::Creator {
            return Err(CoreError::PreconditionFailed(
                "only creator accounts may follow creators".into(),
            ));
        }

        let relations = self
            .mongo
            .collection::<FollowRelationDoc>(FOLLOW_RELATION_COLLECTION)
            .await?;

        // The unique (follower, followee) index is the duplicate check
        let relation_id = relations
            .insert_one(FollowRelationDoc::new(follower_id, followee_id))
            .await
            .map_err(|e| match e {
                CoreError::Database(ref msg) if msg.contains("E11000") => {
                    CoreError::Conflict(format!("already following '{}'", followee_handle))
                }
                other => other,
            })?;

        info!(follower = %follower.handle, followee = %followee_handle, "follow created");
        Ok(relation_id)
    }

    /// Unfollow a creator
    ///
    /// Deletes the relation and charges the fixed fee as one unit: if the
    /// balance check fails the relation stays, if the relation is absent
    /// nothing is charged.
    pub async fn unfollow(&self, follower: &AccountDoc, followee_handle: &str) -> Result<()> {
        let followee = self.load_followee(followee_handle).await?;

        let follower_id = follower
            ._id
            .ok_or_else(|| CoreError::Database("follower missing _id".into()))?;
        let followee_id = followee
            ._id
            .ok_or_else(|| CoreError::Database("followee missing _id".into()))?;

        let relations = self
            .mongo
            .collection::<FollowRelationDoc>(FOLLOW_RELATION_COLLECTION)
            .await?;

        let mut session = self.mongo.start_session().await?;
        session
            .start_transaction()
            .await
            .map_err(|e| CoreError::Database(format!("Failed to start transaction: {}", e)))?;

        let outcome = async {
            let deleted = relations
                .delete_one_in(
                    doc! { "follower_id": follower_id, "followee_id": followee_id },
                    &mut session,
                )
                .await?;

            if deleted.deleted_count == 0 {
                return Err(CoreError::NotFound(format!(
                    "not following '{}'",
                    followee_handle
                )));
            }

            self.ledger
                .debit_in(&mut session, follower_id, TxKind::UnfollowCreator, UNFOLLOW_FEE)
                .await
        }
        .await;

        match outcome {
            Ok(()) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|e| CoreError::Database(format!("Commit failed: {}", e)))?;
                info!(follower = %follower.handle, followee = %followee_handle, "unfollow settled");
                Ok(())
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // Follow/unfollow settlement requires a MongoDB replica set; exercised
    // in integration environments.
}
