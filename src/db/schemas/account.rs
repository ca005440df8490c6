//! Account document schema
//!
//! An account is either a "user" (completes tasks) or a "creator" (publishes
//! tasks). The `balance` field is the incrementally maintained projection of
//! the account's ledger; every mutation of it happens through a conditional
//! update in the same transaction as its ledger entry.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for accounts
pub const ACCOUNT_COLLECTION: &str = "accounts";

/// Starting grant for accounts registering with role "user"
pub const USER_SIGNUP_GRANT: i64 = 100;

/// Starting grant for accounts registering with role "creator"
pub const CREATOR_SIGNUP_GRANT: i64 = 500;

/// Account role
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Creator,
}

impl Role {
    /// Points granted at registration
    pub fn signup_grant(&self) -> i64 {
        match self {
            Role::User => USER_SIGNUP_GRANT,
            Role::Creator => CREATOR_SIGNUP_GRANT,
        }
    }
}

/// Account document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AccountDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// External identity subject (login identifier)
    pub subject: String,

    /// Unique public handle
    pub handle: String,

    /// Argon2 password hash
    pub password_hash: String,

    /// Account role (user or creator)
    #[serde(default)]
    pub role: Role,

    /// Current $CLS balance. Invariant: never negative.
    #[serde(default)]
    pub balance: i64,

    /// Linked Twitter account
    #[serde(default)]
    pub twitter_linked: bool,

    /// Linked Discord account
    #[serde(default)]
    pub discord_linked: bool,

    /// Verified email
    #[serde(default)]
    pub email_linked: bool,

    /// Solana wallet address for balance reads (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl AccountDoc {
    /// Create a new account with the role-dependent starting grant
    pub fn new(subject: String, handle: String, password_hash: String, role: Role) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            subject,
            handle,
            password_hash,
            role,
            balance: role.signup_grant(),
            twitter_linked: false,
            discord_linked: false,
            email_linked: false,
            wallet_address: None,
        }
    }
}

impl IntoIndexes for AccountDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "subject": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("subject_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "handle": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("handle_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for AccountDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_grant_depends_on_role() {
        let user = AccountDoc::new("u@x".into(), "u".into(), "hash".into(), Role::User);
        let creator = AccountDoc::new("c@x".into(), "c".into(), "hash".into(), Role::Creator);

        assert_eq!(user.balance, USER_SIGNUP_GRANT);
        assert_eq!(creator.balance, CREATOR_SIGNUP_GRANT);
        assert!(creator.balance > user.balance);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Creator).unwrap(), "\"creator\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }
}
