//! Port definitions for chronopick hosts.
//!
//! This module exposes the public host port contract used by render layers
//! to feed raw input into the selection engine and interpret its effects
//! without linking against the engine internals.

pub mod host;
