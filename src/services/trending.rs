//! Trending score ranking
//!
//! Pure weighted sum over a task's engagement counters:
//!
//! ```text
//! score = likes*1 + comments*2 + shares*3 + participation*2
//! ```
//!
//! Raw integer counts are the source of truth for ranking. Abbreviated
//! strings ("1.2K", "3M") are a presentation format; `parse_abbreviated`
//! exists because some inputs arrive already abbreviated, and that
//! round-trip is lossy above 1K (sub-hundred precision is gone). Never
//! feed a formatted count back into storage.

use bson::{doc, oid::ObjectId};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::schemas::{
    TaskCommentDoc, TaskDoc, TaskLikeDoc, TaskShareDoc, TASK_COLLECTION,
    TASK_COMMENT_COLLECTION, TASK_LIKE_COLLECTION, TASK_SHARE_COLLECTION,
};
use crate::db::{IntoIndexes, MongoClient, MutMetadata};
use crate::types::{CoreError, Result};

/// Weight applied to like counts
pub const WEIGHT_LIKES: i64 = 1;
/// Weight applied to comment counts
pub const WEIGHT_COMMENTS: i64 = 2;
/// Weight applied to share counts
pub const WEIGHT_SHARES: i64 = 3;
/// Weight applied to participation counts
pub const WEIGHT_PARTICIPATION: i64 = 2;

/// An engagement count that may arrive raw or pre-abbreviated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CountValue {
    Raw(i64),
    Abbreviated(String),
}

impl Default for CountValue {
    fn default() -> Self {
        CountValue::Raw(0)
    }
}

impl CountValue {
    /// Numeric magnitude of the count
    pub fn magnitude(&self) -> Result<i64> {
        match self {
            CountValue::Raw(n) => Ok(*n),
            CountValue::Abbreviated(s) => parse_abbreviated(s),
        }
    }
}

impl From<i64> for CountValue {
    fn from(n: i64) -> Self {
        CountValue::Raw(n)
    }
}

impl From<&str> for CountValue {
    fn from(s: &str) -> Self {
        CountValue::Abbreviated(s.to_string())
    }
}

/// Engagement counters for one task
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementCounts {
    #[serde(default)]
    pub likes: CountValue,
    #[serde(default)]
    pub comments: CountValue,
    #[serde(default)]
    pub shares: CountValue,
    #[serde(default)]
    pub participation_count: CountValue,
}

/// Parse an abbreviated count back to its magnitude
///
/// Multiplier table: no suffix x1, `K` x1,000, `M` x1,000,000.
pub fn parse_abbreviated(s: &str) -> Result<i64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(CoreError::BadInput("empty count".into()));
    }

    let (number_part, multiplier) = match trimmed.chars().last() {
        Some('K') | Some('k') => (&trimmed[..trimmed.len() - 1], 1_000f64),
        Some('M') | Some('m') => (&trimmed[..trimmed.len() - 1], 1_000_000f64),
        _ => (trimmed, 1f64),
    };

    let value: f64 = number_part
        .parse()
        .map_err(|_| CoreError::BadInput(format!("unparseable count '{}'", s)))?;

    if value < 0.0 {
        return Err(CoreError::BadInput(format!("negative count '{}'", s)));
    }

    Ok((value * multiplier) as i64)
}

/// Format a raw count for display: 1200 -> "1.2K", 3_000_000 -> "3M"
///
/// Presentation-only. The lossy inverse of `parse_abbreviated`.
pub fn format_abbreviated(n: i64) -> String {
    if n >= 1_000_000 {
        trim_decimal(n as f64 / 1_000_000.0, "M")
    } else if n >= 1_000 {
        trim_decimal(n as f64 / 1_000.0, "K")
    } else {
        n.to_string()
    }
}

fn trim_decimal(value: f64, suffix: &str) -> String {
    let truncated = (value * 10.0).floor() / 10.0;
    if truncated.fract() == 0.0 {
        format!("{}{}", truncated as i64, suffix)
    } else {
        format!("{:.1}{}", truncated, suffix)
    }
}

/// Weighted trending score over one task's counters
pub fn trending_score(counts: &EngagementCounts) -> Result<i64> {
    Ok(counts.likes.magnitude()? * WEIGHT_LIKES
        + counts.comments.magnitude()? * WEIGHT_COMMENTS
        + counts.shares.magnitude()? * WEIGHT_SHARES
        + counts.participation_count.magnitude()? * WEIGHT_PARTICIPATION)
}

/// A task with its materialized counters and score
#[derive(Debug, Clone)]
pub struct TrendingTask {
    pub task: TaskDoc,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub participation: i64,
    pub score: i64,
}

/// Ranks active tasks by trending score
pub struct TrendingService {
    mongo: MongoClient,
}

impl TrendingService {
    pub fn new(mongo: MongoClient) -> Self {
        Self { mongo }
    }

    /// Group an engagement collection by task id
    async fn counts_by_task<T>(&self, collection: &str) -> Result<HashMap<ObjectId, i64>>
    where
        T: Serialize
            + DeserializeOwned
            + Unpin
            + Send
            + Sync
            + Default
            + IntoIndexes
            + MutMetadata,
    {
        let coll = self.mongo.collection::<T>(collection).await?;

        let pipeline = vec![
            doc! { "$match": { "metadata.is_deleted": { "$ne": true } } },
            doc! { "$group": { "_id": "$task_id", "count": { "$sum": 1 } } },
        ];

        let mut counts = HashMap::new();
        for d in coll.aggregate(pipeline).await? {
            if let Ok(id) = d.get_object_id("_id") {
                // $sum yields i32 for small groups, i64 for large ones
                let count = d
                    .get_i64("count")
                    .unwrap_or_else(|_| d.get_i32("count").unwrap_or(0) as i64);
                counts.insert(id, count);
            }
        }

        Ok(counts)
    }

    /// Active tasks ranked by descending trending score
    ///
    /// Ties keep the order the task query returned (stable sort, no explicit
    /// tiebreak rule).
    pub async fn trending_tasks(&self, limit: usize) -> Result<Vec<TrendingTask>> {
        let tasks = self.mongo.collection::<TaskDoc>(TASK_COLLECTION).await?;
        let active = tasks
            .find_many(doc! { "status": "active" }, None)
            .await?;

        let likes = self.counts_by_task::<TaskLikeDoc>(TASK_LIKE_COLLECTION).await?;
        let comments = self
            .counts_by_task::<TaskCommentDoc>(TASK_COMMENT_COLLECTION)
            .await?;
        let shares = self.counts_by_task::<TaskShareDoc>(TASK_SHARE_COLLECTION).await?;

        let mut ranked: Vec<TrendingTask> = Vec::with_capacity(active.len());
        for task in active {
            let Some(id) = task._id else { continue };
            let like_count = likes.get(&id).copied().unwrap_or(0);
            let comment_count = comments.get(&id).copied().unwrap_or(0);
            let share_count = shares.get(&id).copied().unwrap_or(0);
            let participation = task.participant_count;

            let counts = EngagementCounts {
                likes: like_count.into(),
                comments: comment_count.into(),
                shares: share_count.into(),
                participation_count: participation.into(),
            };
            let score = trending_score(&counts)?;

            ranked.push(TrendingTask {
                task,
                likes: like_count,
                comments: comment_count,
                shares: share_count,
                participation,
                score,
            });
        }

        ranked.sort_by_key(|t| std::cmp::Reverse(t.score));
        ranked.truncate(limit);

        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_abbreviated_table() {
        assert_eq!(parse_abbreviated("42").unwrap(), 42);
        assert_eq!(parse_abbreviated("1.2K").unwrap(), 1200);
        assert_eq!(parse_abbreviated("3M").unwrap(), 3_000_000);
        assert_eq!(parse_abbreviated("0").unwrap(), 0);
        assert_eq!(parse_abbreviated("2.5k").unwrap(), 2500);
    }

    #[test]
    fn test_parse_abbreviated_rejects_garbage() {
        assert!(parse_abbreviated("").is_err());
        assert!(parse_abbreviated("abc").is_err());
        assert!(parse_abbreviated("-5").is_err());
        assert!(parse_abbreviated("1.2Q").is_err());
    }

    #[test]
    fn test_format_abbreviated() {
        assert_eq!(format_abbreviated(42), "42");
        assert_eq!(format_abbreviated(999), "999");
        assert_eq!(format_abbreviated(1200), "1.2K");
        assert_eq!(format_abbreviated(1000), "1K");
        assert_eq!(format_abbreviated(3_000_000), "3M");
        assert_eq!(format_abbreviated(1_250_000), "1.2M");
    }

    #[test]
    fn test_round_trip_is_lossy_above_1k() {
        // 1234 formats to "1.2K" which parses back to 1200: sub-hundred
        // precision is lost by design
        let formatted = format_abbreviated(1234);
        assert_eq!(formatted, "1.2K");
        assert_eq!(parse_abbreviated(&formatted).unwrap(), 1200);
    }

    #[test]
    fn test_score_weights() {
        // likes 1200*1 + comments 10*2 + shares 0*3 + participation 5*2 = 1230
        let counts = EngagementCounts {
            likes: "1.2K".into(),
            comments: 10.into(),
            shares: 0.into(),
            participation_count: 5.into(),
        };
        assert_eq!(trending_score(&counts).unwrap(), 1230);
    }

    #[test]
    fn test_score_all_raw() {
        let counts = EngagementCounts {
            likes: 7.into(),
            comments: 3.into(),
            shares: 2.into(),
            participation_count: 4.into(),
        };
        // 7 + 6 + 6 + 8
        assert_eq!(trending_score(&counts).unwrap(), 27);
    }

    #[test]
    fn test_count_value_deserializes_both_forms() {
        let raw: CountValue = serde_json::from_str("1200").unwrap();
        assert_eq!(raw, CountValue::Raw(1200));

        let abbrev: CountValue = serde_json::from_str("\"1.2K\"").unwrap();
        assert_eq!(abbrev.magnitude().unwrap(), 1200);
    }

    #[test]
    fn test_stable_ranking_on_ties() {
        let mk = |score: i64| TrendingTask {
            task: TaskDoc::default(),
            likes: score,
            comments: 0,
            shares: 0,
            participation: 0,
            score,
        };

        let mut ranked = vec![mk(10), mk(20), mk(10), mk(5)];
        // Tag the two tied entries through participant slots to observe order
        ranked[0].participation = 1;
        ranked[2].participation = 2;

        ranked.sort_by_key(|t| std::cmp::Reverse(t.score));

        assert_eq!(ranked[0].score, 20);
        assert_eq!(ranked[1].participation, 1, "first tied entry keeps its slot");
        assert_eq!(ranked[2].participation, 2);
    }
}
