//! putqueue Core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `QueuedFile`, `HostPort`, `Credentials`, `AggregateCounters`
//! - **Port definitions** - Traits for adapters: `IUploadQueue`, `IStatusSink`,
//!   `ILogSink`, `IProcessRunner`
//! - **Configuration** - YAML-backed settings with validation and a builder
//!
//! # Architecture
//!
//! The domain module contains the value types the upload worker moves around.
//! Ports define the boundaries towards the queue owner, the status/log sinks and
//! the external upload program. The `putqueue-worker` crate implements the
//! worker on top of these ports.

pub mod config;
pub mod domain;
pub mod ports;
