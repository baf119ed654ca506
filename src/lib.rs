//! Library crate for courtside, exposing modules for the binary and integration tests.

pub mod config;
/// Snapshot storage: key-value stores, stored records and the versioned loader.
pub mod dao;
/// Views handed to presenters.
pub mod dto;
pub mod error;
/// Session orchestration and the collaborators it drives.
pub mod services;
pub mod state;
