//! Core module containing the harness functionality
//!
//! This module provides:
//! - Transport layer (TCP, scripted in-memory fake)
//! - Clock abstraction (real tokio time, manual virtual time)
//! - Connection management with bounded connect timeout
//! - Command sequencing with fixed inter-command pacing
//! - Line codec for reassembling telemetry from a raw byte stream
//! - Telemetry collection over a bounded window
//! - Session report building and output sinks
//! - CSV trace loading and rendering for the plotting tools

pub mod clock;
pub mod codec;
pub mod collector;
pub mod connection;
pub mod harness;
pub mod report;
pub mod sequencer;
pub mod trace;
pub mod transport;
