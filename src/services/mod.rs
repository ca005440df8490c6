//! Domain services for the CreatorsLab core
//!
//! Each service owns one settlement area and goes through the shared
//! `MongoClient`. Handlers construct them per-request; there is no
//! in-process state shared between requests beyond the client itself.

pub mod daily_claim;
pub mod engagement;
pub mod ledger;
pub mod participation;
pub mod social;
pub mod trending;
pub mod wallet;

pub use daily_claim::{ClaimOutcome, ClaimStatus, DailyClaimService, DAILY_CLAIM_REWARD};
pub use engagement::EngagementService;
pub use ledger::LedgerService;
pub use participation::{ParticipationService, TaskInput};
pub use social::{FollowService, UNFOLLOW_FEE};
pub use trending::{
    format_abbreviated, parse_abbreviated, trending_score, CountValue, EngagementCounts,
    TrendingService, TrendingTask,
};
pub use wallet::{SolanaBalanceReader, WalletBalance};
