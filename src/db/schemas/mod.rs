//! Database schemas for CreatorsLab
//!
//! One document type per collection: accounts, ledger entries, daily claims,
//! follow relations, tasks, participations, engagement counters, and the
//! operator-editable platform vocabulary.

mod account;
mod daily_claim;
mod engagement;
mod follow;
mod ledger;
mod metadata;
mod participation;
mod platform;
mod task;

pub use account::{AccountDoc, Role, ACCOUNT_COLLECTION, CREATOR_SIGNUP_GRANT, USER_SIGNUP_GRANT};
pub use daily_claim::{DailyClaimDoc, DAILY_CLAIM_COLLECTION};
pub use engagement::{
    TaskCommentDoc, TaskLikeDoc, TaskShareDoc, TASK_COMMENT_COLLECTION, TASK_LIKE_COLLECTION,
    TASK_SHARE_COLLECTION,
};
pub use follow::{FollowRelationDoc, FOLLOW_RELATION_COLLECTION};
pub use ledger::{LedgerEntryDoc, TxKind, CURRENCY_CLS, LEDGER_COLLECTION};
pub use metadata::Metadata;
pub use participation::{ParticipationDoc, ParticipationStatus, PARTICIPATION_COLLECTION};
pub use platform::{PlatformConfigDoc, PLATFORM_CONFIG_COLLECTION};
pub use task::{TaskDoc, TaskStatus, TASK_COLLECTION};
