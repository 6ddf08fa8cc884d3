//! Integration test support for the replica workspace: protocol fixtures,
//! hook recorders, and loopback server/client pair builders.

pub mod helpers;

pub use helpers::*;
