//! Database layer
//!
//! MongoDB client wrapper and document schemas for all CreatorsLab
//! collections.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
