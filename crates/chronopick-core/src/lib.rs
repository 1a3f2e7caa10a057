//! chronopick-core: the date-selection constraint and selection engine.
//!
//! The engine is split the way the data flows: [`calendar`] holds the
//! timezone-safe date arithmetic, [`locale`] the injectable locale
//! registry, [`format`] the string conversion layer, [`constraints`] the
//! pure selectability predicates, and [`picker`] the state machine that
//! turns raw input events into committed selections and host [`Effect`]s.
//!
//! [`Effect`]: chronopick_proto::ports::host::Effect

pub mod calendar;
pub mod config;
pub mod constraints;
pub mod format;
pub mod locale;
pub mod picker;
pub mod refocus;

pub use picker::{DatePicker, PickerContext, SelectionState};
