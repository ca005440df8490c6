//! Daily claim state machine
//!
//! Per-account cooldown + streak tracking. A claim is permitted once the
//! current time reaches `last_claimed_at` plus one *calendar day* (chrono
//! `Days`, not a flat 86400s diff; across a DST boundary the two differ and
//! the calendar-day behavior is the one we keep). An ineligible claim is not
//! an error: the caller gets back the remaining cooldown in seconds.

use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Days, Utc};
use mongodb::ClientSession;
use serde::Serialize;
use tracing::info;

use crate::db::schemas::{DailyClaimDoc, TxKind, DAILY_CLAIM_COLLECTION};
use crate::db::MongoClient;
use crate::services::ledger::LedgerService;
use crate::types::{CoreError, Result};

/// $CLS credited (and ledger-logged) per successful daily claim
pub const DAILY_CLAIM_REWARD: i64 = 10;

/// Pure eligibility snapshot, computed from `now` vs `last_claimed_at`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatus {
    pub can_claim: bool,
    pub countdown_seconds: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_claimed_at: Option<DateTime<Utc>>,
    pub streak: i64,
}

impl ClaimStatus {
    /// Evaluate eligibility. Pure: never touches storage.
    pub fn evaluate(now: DateTime<Utc>, last_claimed_at: Option<DateTime<Utc>>, streak: i64) -> Self {
        match last_claimed_at {
            None => Self {
                can_claim: true,
                countdown_seconds: 0,
                last_claimed_at: None,
                streak,
            },
            Some(last) => {
                // Calendar day-add, deliberately not last + 86400s
                let next_eligible = last
                    .checked_add_days(Days::new(1))
                    .unwrap_or(last);
                let remaining = (next_eligible - now).num_seconds();

                Self {
                    can_claim: remaining <= 0,
                    countdown_seconds: remaining.max(0),
                    last_claimed_at: Some(last),
                    streak,
                }
            }
        }
    }
}

/// Result of a claim attempt
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "result")]
pub enum ClaimOutcome {
    /// Reward credited
    Claimed { streak: i64, reward: i64 },
    /// Not yet eligible; this is the normal "wait" response, not a failure
    Cooldown { countdown_seconds: i64 },
}

/// Daily claim settlement
pub struct DailyClaimService {
    mongo: MongoClient,
    ledger: LedgerService,
}

impl DailyClaimService {
    pub fn new(mongo: MongoClient) -> Self {
        let ledger = LedgerService::new(mongo.clone());
        Self { mongo, ledger }
    }

    /// Pure status read for an account. Never mutates claim state.
    pub async fn status(&self, account_id: ObjectId) -> Result<ClaimStatus> {
        let claims = self
            .mongo
            .collection::<DailyClaimDoc>(DAILY_CLAIM_COLLECTION)
            .await?;

        let record = claims.find_one(doc! { "account_id": account_id }).await?;
        let now = Utc::now();

        Ok(match record {
            Some(d) => ClaimStatus::evaluate(
                now,
                d.last_claimed_at.map(|t| t.to_chrono()),
                d.streak,
            ),
            None => ClaimStatus::evaluate(now, None, 0),
        })
    }

    /// Attempt a claim for an account
    ///
    /// On success: sets `last_claimed_at`, bumps the streak (or creates the
    /// record with streak 1), credits the balance, and appends a
    /// `daily_login` ledger entry, all in one transaction. The eligibility
    /// precondition rides in the update filter so two concurrent claims
    /// cannot both pass.
    pub async fn claim(&self, account_id: ObjectId) -> Result<ClaimOutcome> {
        let claims = self
            .mongo
            .collection::<DailyClaimDoc>(DAILY_CLAIM_COLLECTION)
            .await?;

        let record = claims.find_one(doc! { "account_id": account_id }).await?;
        let now = Utc::now();

        let status = match &record {
            Some(d) => {
                ClaimStatus::evaluate(now, d.last_claimed_at.map(|t| t.to_chrono()), d.streak)
            }
            None => ClaimStatus::evaluate(now, None, 0),
        };

        if !status.can_claim {
            return Ok(ClaimOutcome::Cooldown {
                countdown_seconds: status.countdown_seconds,
            });
        }

        let mut session = self.mongo.start_session().await?;
        session
            .start_transaction()
            .await
            .map_err(|e| CoreError::Database(format!("Failed to start transaction: {}", e)))?;

        let outcome = self
            .claim_in(&mut session, &claims, account_id, record, now)
            .await;

        match outcome {
            Ok(claimed) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|e| CoreError::Database(format!("Commit failed: {}", e)))?;
                info!(account = %account_id, "daily claim settled");
                Ok(claimed)
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                Err(e)
            }
        }
    }

    async fn claim_in(
        &self,
        session: &mut ClientSession,
        claims: &crate::db::MongoCollection<DailyClaimDoc>,
        account_id: ObjectId,
        record: Option<DailyClaimDoc>,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        let now_bson = bson::DateTime::from_chrono(now);

        let streak = match record {
            None => {
                // Lazy creation on first claim; the unique index turns a
                // concurrent first claim into a write conflict
                claims
                    .insert_one_in(DailyClaimDoc::first_claim(account_id, now_bson), session)
                    .await
                    .map_err(|e| match e {
                        // Duplicate key: another request won the first claim
                        CoreError::Database(ref msg) if msg.contains("E11000") => {
                            CoreError::Conflict("already claimed today".into())
                        }
                        other => other,
                    })?;
                1
            }
            Some(existing) => {
                // Re-state the eligibility precondition in the filter:
                // last_claimed_at must still be at least one calendar day old
                let threshold = now
                    .checked_sub_days(Days::new(1))
                    .ok_or_else(|| CoreError::Database("timestamp underflow".into()))?;

                let result = claims
                    .update_one_in(
                        doc! {
                            "account_id": account_id,
                            "last_claimed_at": { "$lte": bson::DateTime::from_chrono(threshold) },
                        },
                        doc! {
                            "$set": {
                                "last_claimed_at": now_bson,
                                "metadata.updated_at": bson::DateTime::now(),
                            },
                            "$inc": { "streak": 1 },
                        },
                        session,
                    )
                    .await?;

                if result.matched_count == 0 {
                    return Err(CoreError::Conflict("already claimed today".into()));
                }

                existing.streak + 1
            }
        };

        self.ledger
            .credit_in(session, account_id, TxKind::DailyLogin, DAILY_CLAIM_REWARD)
            .await?;

        Ok(ClaimOutcome::Claimed {
            streak,
            reward: DAILY_CLAIM_REWARD,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_no_record_is_eligible() {
        let status = ClaimStatus::evaluate(at(2025, 6, 1, 12, 0, 0), None, 0);
        assert!(status.can_claim);
        assert_eq!(status.countdown_seconds, 0);
        assert_eq!(status.streak, 0);
    }

    #[test]
    fn test_cooldown_countdown_accurate_to_the_second() {
        let last = at(2025, 6, 1, 12, 0, 0);
        let now = at(2025, 6, 1, 18, 30, 15);

        let status = ClaimStatus::evaluate(now, Some(last), 3);
        assert!(!status.can_claim);
        // next eligible 2025-06-02 12:00:00; remaining 17h 29m 45s
        assert_eq!(status.countdown_seconds, 17 * 3600 + 29 * 60 + 45);
        assert_eq!(status.streak, 3);
    }

    #[test]
    fn test_eligible_exactly_at_boundary() {
        let last = at(2025, 6, 1, 12, 0, 0);
        let boundary = at(2025, 6, 2, 12, 0, 0);

        let status = ClaimStatus::evaluate(boundary, Some(last), 1);
        assert!(status.can_claim);
        assert_eq!(status.countdown_seconds, 0);
    }

    #[test]
    fn test_second_claim_within_24h_reports_remaining() {
        let first = at(2025, 6, 1, 0, 0, 0);
        let retry = at(2025, 6, 1, 0, 0, 1);

        let status = ClaimStatus::evaluate(retry, Some(first), 1);
        assert!(!status.can_claim);
        assert_eq!(status.countdown_seconds, 86400 - 1);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let last = at(2025, 6, 1, 12, 0, 0);
        let now = at(2025, 6, 1, 13, 0, 0);

        let a = ClaimStatus::evaluate(now, Some(last), 2);
        let b = ClaimStatus::evaluate(now, Some(last), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_streak_survives_gaps() {
        // A claim ten days after the last one is still just streak + 1;
        // there is no gap detection
        let last = at(2025, 6, 1, 12, 0, 0);
        let much_later = at(2025, 6, 11, 12, 0, 0);

        let status = ClaimStatus::evaluate(much_later, Some(last), 7);
        assert!(status.can_claim);
        assert_eq!(status.streak, 7);
    }

    #[test]
    fn test_calendar_day_add_over_month_boundary() {
        let last = at(2025, 1, 31, 23, 0, 0);
        let now = at(2025, 2, 1, 22, 59, 59);

        let status = ClaimStatus::evaluate(now, Some(last), 1);
        assert!(!status.can_claim);
        assert_eq!(status.countdown_seconds, 1);
    }
}
