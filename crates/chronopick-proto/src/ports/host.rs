use chrono::{DateTime, TimeZone};

/// Keys the engine reacts to. Anything else never reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Escape,
    Tab,
}

/// Calendar granularity of an activated cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarUnit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Raw input events forwarded by the hosting UI layer.
///
/// Each event is processed to completion before the next one is accepted;
/// a single event yields one consistent state snapshot plus a batch of
/// [`Effect`]s for the host to interpret.
#[derive(Debug, Clone)]
pub enum PickerEvent<Tz: TimeZone> {
    /// Pointer click on the text input.
    InputClicked,
    /// The text input gained focus.
    FocusGained,
    /// The text input lost focus.
    FocusLost,
    /// The text input content changed.
    InputChanged(String),
    /// Key pressed while the text input is focused.
    KeyPressed(Key),
    /// Key pressed while a calendar cell is focused.
    CellKeyPressed(Key),
    /// Pointer activation (or Enter) on a calendar cell.
    CellActivated {
        instant: DateTime<Tz>,
        unit: CalendarUnit,
    },
    /// Activation of an entry in the time list.
    TimeSelected(DateTime<Tz>),
    /// Pointer click outside the calendar surface.
    OutsideClick,
    /// The document scrolled.
    Scrolled,
    /// Imperative request to clear the selection.
    ClearRequested,
    /// Imperative request to open the calendar.
    OpenRequested,
    /// Imperative request to close the calendar.
    CloseRequested,
    /// Imperative pre-selection override.
    SetPreSelection(DateTime<Tz>),
}

/// The value shape handed to change listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange<Tz: TimeZone> {
    Single(Option<DateTime<Tz>>),
    Range {
        start: Option<DateTime<Tz>>,
        end: Option<DateTime<Tz>>,
    },
}

/// Side effects the engine asks its host to perform.
///
/// The engine itself never touches focus, timers, or listeners; it only
/// returns these from its transition function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect<Tz: TimeZone> {
    /// The committed selection changed; drives `onChange`.
    SelectionChanged(SelectionChange<Tz>),
    /// A commit was accepted (fired even when the value is unchanged);
    /// drives `onSelect`.
    SelectionCommitted(Option<DateTime<Tz>>),
    /// A keyboard target had no mapping, or the navigation cursor is
    /// invalid; drives `onInputError`.
    InputError { code: u8, message: &'static str },
    /// The calendar transitioned to open.
    CalendarOpened,
    /// The calendar transitioned to closed.
    CalendarClosed,
    /// Schedule a deferred one-shot refocus of the text input, canceling
    /// any refocus still pending.
    ScheduleRefocus,
    /// Cancel a pending refocus without scheduling a new one.
    CancelRefocus,
}
