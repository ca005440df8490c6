//! Platform configuration document schema
//!
//! Operators add platforms (and their engagement vocabularies) as documents,
//! not compile-time enums, so a new platform needs no code change. Task
//! creation validates its engagement types against the current document.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for platform configurations
pub const PLATFORM_CONFIG_COLLECTION: &str = "platform_configs";

/// Versioned per-platform engagement vocabulary
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PlatformConfigDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Platform name, e.g. "twitter", "discord" (unique)
    pub platform: String,

    /// Allowed engagement types for this platform, e.g. ["follow", "like"]
    pub engagement_types: Vec<String>,

    /// Bumped whenever an operator edits the vocabulary
    #[serde(default)]
    pub version: i64,
}

impl PlatformConfigDoc {
    /// Whether every requested engagement type is in this platform's
    /// vocabulary
    pub fn allows(&self, requested: &[String]) -> bool {
        requested
            .iter()
            .all(|t| self.engagement_types.iter().any(|allowed| allowed == t))
    }
}

impl IntoIndexes for PlatformConfigDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "platform": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("platform_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for PlatformConfigDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twitter() -> PlatformConfigDoc {
        PlatformConfigDoc {
            platform: "twitter".into(),
            engagement_types: vec!["follow".into(), "like".into(), "retweet".into()],
            version: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_allows_subset() {
        let config = twitter();
        assert!(config.allows(&["follow".to_string(), "like".to_string()]));
        assert!(config.allows(&[]));
    }

    #[test]
    fn test_rejects_out_of_vocabulary() {
        let config = twitter();
        assert!(!config.allows(&["follow".to_string(), "superlike".to_string()]));
    }
}
