//! HTTP server for the CreatorsLab API

pub mod http;

pub use http::{run, AppState};
