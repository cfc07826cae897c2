//! # Trove Sync Engine
//!
//! Connectivity, remote gateway, and sync coordinator for Trove.
//!
//! This crate provides:
//! - Connectivity monitoring with de-duplicated transition subscriptions
//! - The remote gateway abstraction (with an HTTP binding and a mock)
//! - Retry policy with exponential backoff and an abandonment ceiling
//! - The sync coordinator state machine
//!
//! ## Architecture
//!
//! The engine is **offline-first**: every mutation commits to the local
//! store before any network activity (the optimistic apply), then either
//! confirms against the remote gateway or parks the intent in the offline
//! queue. A drain pass replays queued intents once connectivity returns.
//!
//! ## Key Invariants
//!
//! - A mutation never fails because the remote side failed; divergence is
//!   visible only through the item's sync status
//! - Queue entries are removed only on confirmed remote success or after
//!   exhausting the retry budget
//! - One drain pass at a time; extra triggers are coalesced
//! - A create's server-assigned id replaces the local id in the same
//!   critical section as the store update

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auto;
mod config;
mod connectivity;
mod coordinator;
mod error;
mod gateway;
mod http;

pub use auto::AutoSync;
pub use config::{RetryPolicy, SyncConfig};
pub use connectivity::{ConnectivityMonitor, ConnectivityState};
pub use coordinator::{
    DrainOutcome, DrainReport, Mutation, MutationOutcome, SyncCoordinator, SyncStats,
};
pub use error::{GatewayError, GatewayResult, SyncError, SyncResult};
pub use gateway::{GatewayCall, ListFilters, MockGateway, RemoteGateway};
pub use http::{HttpClient, HttpGateway, HttpResponse, LoopbackClient, LoopbackServer};
