//! Storage adapters for model artifacts.
//!
//! This module currently exposes the local-directory store that resolves a
//! model name to a single JSON artifact file.

pub mod fs_store;

pub use fs_store::{FsModelStore, FsStoreConfig, ARTIFACT_EXTENSION};
