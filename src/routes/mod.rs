//! HTTP routes for the CreatorsLab API

pub mod auth_routes;
pub mod claims;
pub mod health;
pub mod helpers;
pub mod social;
pub mod tasks;
pub mod wallet;

pub use auth_routes::handle_auth_request;
pub use claims::{handle_claim, handle_claim_status};
pub use health::{health_check, readiness_check, version_info};
pub use social::{handle_follow, handle_unfollow};
pub use tasks::{
    handle_comment, handle_create_task, handle_like, handle_mark_completed, handle_participate,
    handle_reward_claim, handle_share, handle_trending,
};
pub use wallet::{handle_convert_points, handle_points_history, handle_wallet_balance};
