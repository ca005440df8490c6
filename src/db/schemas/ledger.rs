//! Ledger entry document schema
//!
//! Append-only record of every balance change. Entries are written exactly
//! once, in the same transaction as the balance update they describe, and are
//! never updated or deleted afterwards.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for ledger entries
pub const LEDGER_COLLECTION: &str = "ledger_entries";

/// The single supported currency tag
pub const CURRENCY_CLS: &str = "CLS";

/// Closed set of balance-affecting transaction kinds
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    #[default]
    SignupBonus,
    Follow,
    UnfollowCreator,
    BuyPoints,
    ConvertPoints,
    CreateTask,
    CompletedTask,
    DailyLogin,
}

/// Immutable ledger entry
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LedgerEntryDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at doubles as the entry timestamp)
    #[serde(default)]
    pub metadata: Metadata,

    /// Account whose balance changed
    pub account_id: ObjectId,

    /// Transaction kind
    pub kind: TxKind,

    /// Signed amount: positive credits, negative debits
    pub amount: i64,

    /// Currency tag (always "CLS")
    pub currency: String,
}

impl LedgerEntryDoc {
    /// Create a new entry. `amount` is signed: credits positive, debits
    /// negative.
    pub fn new(account_id: ObjectId, kind: TxKind, amount: i64) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            account_id,
            kind,
            amount,
            currency: CURRENCY_CLS.to_string(),
        }
    }
}

impl IntoIndexes for LedgerEntryDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "account_id": 1, "metadata.created_at": -1 },
            Some(
                IndexOptions::builder()
                    .name("account_history".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for LedgerEntryDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TxKind::DailyLogin).unwrap(),
            "\"daily_login\""
        );
        assert_eq!(
            serde_json::to_string(&TxKind::UnfollowCreator).unwrap(),
            "\"unfollow_creator\""
        );
        assert_eq!(
            serde_json::to_string(&TxKind::CompletedTask).unwrap(),
            "\"completed_task\""
        );
    }

    #[test]
    fn test_entry_carries_currency_tag() {
        let entry = LedgerEntryDoc::new(ObjectId::new(), TxKind::SignupBonus, 100);
        assert_eq!(entry.currency, CURRENCY_CLS);
        assert_eq!(entry.amount, 100);
    }
}
