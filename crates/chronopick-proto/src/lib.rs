//! Contract types for the chronopick date-selection engine.
//!
//! This crate defines the declarative configuration consumed by the engine
//! and the event/effect vocabulary exchanged with a hosting UI layer. It
//! carries no engine logic; higher level crates depend on it to talk about
//! selections without linking against the engine internals.

pub mod config;
pub mod ports;
