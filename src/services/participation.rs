//! Task publication and the participation lifecycle
//!
//! NoParticipation -> Pending -> Completed -> Claimed. Pending -> Completed
//! is the task owner's review decision (`mark_completed`); Completed ->
//! Claimed pays the reward. Task creation escrows the full payout budget
//! from the creator up front.

use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use mongodb::ClientSession;
use tracing::info;

use crate::db::schemas::{
    AccountDoc, ParticipationDoc, ParticipationStatus, PlatformConfigDoc, Role, TaskDoc, TxKind,
    PARTICIPATION_COLLECTION, PLATFORM_CONFIG_COLLECTION, TASK_COLLECTION,
};
use crate::db::MongoClient;
use crate::services::ledger::LedgerService;
use crate::types::{CoreError, Result};

/// Input for publishing a task
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
    pub media_url: Option<String>,
    pub platform: String,
    pub engagement_types: Vec<String>,
    pub reward_points: i64,
    pub max_participants: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Task + participation settlement
pub struct ParticipationService {
    mongo: MongoClient,
    ledger: LedgerService,
}

impl ParticipationService {
    pub fn new(mongo: MongoClient) -> Self {
        let ledger = LedgerService::new(mongo.clone());
        Self { mongo, ledger }
    }

    async fn begin(&self) -> Result<ClientSession> {
        let mut session = self.mongo.start_session().await?;
        session
            .start_transaction()
            .await
            .map_err(|e| CoreError::Database(format!("Failed to start transaction: {}", e)))?;
        Ok(session)
    }

    async fn settle<T>(mut session: ClientSession, outcome: Result<T>) -> Result<T> {
        match outcome {
            Ok(value) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|e| CoreError::Database(format!("Commit failed: {}", e)))?;
                Ok(value)
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                Err(e)
            }
        }
    }

    /// Publish a task
    ///
    /// Validates the engagement types against the platform's configured
    /// vocabulary, then escrows `reward_points * max_participants` from the
    /// creator and inserts the task in one transaction. Returns the task id
    /// together with the escrowed amount.
    pub async fn create_task(
        &self,
        creator: &AccountDoc,
        input: TaskInput,
    ) -> Result<(ObjectId, i64)> {
        if creator.role != Role::Creator {
            return Err(CoreError::PreconditionFailed(
                "only creator accounts may publish tasks".into(),
            ));
        }

        let creator_id = creator
            ._id
            .ok_or_else(|| CoreError::Database("creator missing _id".into()))?;

        if input.title.trim().is_empty() {
            return Err(CoreError::BadInput("title is required".into()));
        }
        if input.reward_points <= 0 {
            return Err(CoreError::BadInput("rewardPoints must be positive".into()));
        }
        if input.max_participants <= 0 {
            return Err(CoreError::BadInput("maxParticipants must be positive".into()));
        }
        if input.engagement_types.is_empty() {
            return Err(CoreError::BadInput(
                "at least one engagement type is required".into(),
            ));
        }

        // Vocabulary lookup against the live platform configuration
        let platforms = self
            .mongo
            .collection::<PlatformConfigDoc>(PLATFORM_CONFIG_COLLECTION)
            .await?;
        let config = platforms
            .find_one(doc! { "platform": &input.platform })
            .await?
            .ok_or_else(|| {
                CoreError::BadInput(format!("unknown platform '{}'", input.platform))
            })?;

        if !config.allows(&input.engagement_types) {
            return Err(CoreError::BadInput(format!(
                "engagement types {:?} not allowed on '{}'",
                input.engagement_types, input.platform
            )));
        }

        let task = TaskDoc {
            _id: None,
            metadata: Default::default(),
            creator_id,
            title: input.title,
            description: input.description,
            media_url: input.media_url,
            platform: input.platform,
            engagement_types: input.engagement_types,
            reward_points: input.reward_points,
            max_participants: input.max_participants,
            participant_count: 0,
            expires_at: input.expires_at.map(bson::DateTime::from_chrono),
            status: Default::default(),
        };
        let escrow = task
            .escrow_amount()
            .ok_or_else(|| CoreError::BadInput("escrow amount overflows".into()))?;

        let tasks = self.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;

        let mut session = self.begin().await?;
        let outcome = async {
            self.ledger
                .debit_in(&mut session, creator_id, TxKind::CreateTask, escrow)
                .await?;
            tasks.insert_one_in(task, &mut session).await
        }
        .await;
        let task_id = Self::settle(session, outcome).await?;

        info!(creator = %creator.handle, task = %task_id, escrow, "task published");
        Ok((task_id, escrow))
    }

    /// Submit a participation
    ///
    /// Preconditions checked in order, each with its own error: task exists,
    /// not the caller's own task, not expired, capacity remaining, no
    /// existing participation. Capacity is a conditional increment on the
    /// task document, committed together with the participation insert.
    pub async fn participate(
        &self,
        account: &AccountDoc,
        task_id: ObjectId,
        proof: String,
    ) -> Result<ObjectId> {
        let account_id = account
            ._id
            .ok_or_else(|| CoreError::Database("account missing _id".into()))?;

        let tasks = self.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
        let task = tasks
            .find_one(doc! { "_id": task_id })
            .await?
            .ok_or_else(|| CoreError::NotFound("task not found".into()))?;

        if task.creator_id == account_id {
            return Err(CoreError::PreconditionFailed(
                "cannot participate in your own task".into(),
            ));
        }

        // Expiry always wins, regardless of stored status or spare capacity
        if task.is_expired(bson::DateTime::now()) {
            return Err(CoreError::PreconditionFailed("task has expired".into()));
        }

        let participations = self
            .mongo
            .collection::<ParticipationDoc>(PARTICIPATION_COLLECTION)
            .await?;

        let mut session = self.begin().await?;
        let outcome = async {
            // "Admit only if a slot remains", expressed atomically
            let admitted = tasks
                .update_one_in(
                    doc! {
                        "_id": task_id,
                        "$expr": { "$lt": ["$participant_count", "$max_participants"] },
                    },
                    doc! {
                        "$inc": { "participant_count": 1 },
                        "$set": { "metadata.updated_at": bson::DateTime::now() },
                    },
                    &mut session,
                )
                .await?;

            if admitted.matched_count == 0 {
                return Err(CoreError::PreconditionFailed(
                    "participant capacity reached".into(),
                ));
            }

            participations
                .insert_one_in(
                    ParticipationDoc::pending(account_id, task_id, proof),
                    &mut session,
                )
                .await
                .map_err(|e| match e {
                    CoreError::Database(ref msg) if msg.contains("E11000") => {
                        CoreError::Conflict("already participating in this task".into())
                    }
                    other => other,
                })
        }
        .await;
        let participation_id = Self::settle(session, outcome).await?;

        info!(account = %account.handle, task = %task_id, "participation submitted");
        Ok(participation_id)
    }

    /// Review decision: advance a participation from Pending to Completed
    ///
    /// This is the injected external approval step. Only the owning creator
    /// of the participation's task may take it. No balance effect.
    pub async fn mark_completed(
        &self,
        reviewer: &AccountDoc,
        participation_id: ObjectId,
    ) -> Result<()> {
        let reviewer_id = reviewer
            ._id
            .ok_or_else(|| CoreError::Database("reviewer missing _id".into()))?;

        let participations = self
            .mongo
            .collection::<ParticipationDoc>(PARTICIPATION_COLLECTION)
            .await?;
        let participation = participations
            .find_one(doc! { "_id": participation_id })
            .await?
            .ok_or_else(|| CoreError::NotFound("participation not found".into()))?;

        let tasks = self.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
        let task = tasks
            .find_one(doc! { "_id": participation.task_id })
            .await?
            .ok_or_else(|| CoreError::NotFound("task not found".into()))?;

        if task.creator_id != reviewer_id {
            return Err(CoreError::PreconditionFailed(
                "only the task's creator may review participations".into(),
            ));
        }

        let result = participations
            .update_one(
                doc! { "_id": participation_id, "status": "pending" },
                doc! {
                    "$set": {
                        "status": "completed",
                        "metadata.updated_at": bson::DateTime::now(),
                    }
                },
            )
            .await?;

        if result.matched_count == 0 {
            return Err(CoreError::Conflict("participation is not pending".into()));
        }

        info!(reviewer = %reviewer.handle, participation = %participation_id, "participation approved");
        Ok(())
    }

    /// Claim the reward for a completed participation
    ///
    /// The status advance (Completed -> Claimed), the balance credit, and
    /// the `completed_task` ledger entry are one transaction; the "exactly
    /// Completed" precondition rides in the update filter so a double claim
    /// settles at most once.
    pub async fn claim_reward(&self, account: &AccountDoc, task_id: ObjectId) -> Result<i64> {
        let account_id = account
            ._id
            .ok_or_else(|| CoreError::Database("account missing _id".into()))?;

        let tasks = self.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
        let task = tasks
            .find_one(doc! { "_id": task_id })
            .await?
            .ok_or_else(|| CoreError::NotFound("task not found".into()))?;
        let reward = task.reward_points;

        let participations = self
            .mongo
            .collection::<ParticipationDoc>(PARTICIPATION_COLLECTION)
            .await?;

        let mut session = self.begin().await?;
        let outcome = async {
            let advanced = participations
                .update_one_in(
                    doc! {
                        "account_id": account_id,
                        "task_id": task_id,
                        "status": "completed",
                    },
                    doc! {
                        "$set": {
                            "status": "claimed",
                            "metadata.updated_at": bson::DateTime::now(),
                        }
                    },
                    &mut session,
                )
                .await?;

            if advanced.matched_count == 0 {
                // Explain which precondition actually failed
                let existing = participations
                    .find_one(doc! { "account_id": account_id, "task_id": task_id })
                    .await?;
                return Err(match existing.map(|p| p.status) {
                    None => CoreError::NotFound("no participation for this task".into()),
                    Some(ParticipationStatus::Pending) => CoreError::PreconditionFailed(
                        "participation has not been approved yet".into(),
                    ),
                    Some(ParticipationStatus::Claimed) => {
                        CoreError::Conflict("reward already claimed".into())
                    }
                    Some(ParticipationStatus::Completed) => {
                        CoreError::Database("claim update matched nothing".into())
                    }
                });
            }

            self.ledger
                .credit_in(&mut session, account_id, TxKind::CompletedTask, reward)
                .await?;

            Ok(())
        }
        .await;
        Self::settle(session, outcome).await?;

        info!(account = %account.handle, task = %task_id, reward, "reward claimed");
        Ok(reward)
    }
}

#[cfg(test)]
mod tests {
    // The lifecycle paths require a MongoDB replica set and are covered in
    // integration environments. Pure pieces (escrow math, expiry, vocabulary
    // checks) are tested on their schema types.
}
