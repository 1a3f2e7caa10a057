use chrono::{DateTime, TimeZone};

/// What last moved the pre-selection. Enter commits the cursor only when
/// its latest change came from navigation, never from raw typing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChangeOrigin {
    #[default]
    Input,
    Navigate,
}

/// One consistent snapshot of the selection engine.
///
/// `pre_selection` is the keyboard/pointer cursor and is distinct from the
/// committed `selected` value; `input_buffer` holds raw typed text that has
/// not produced a parseable date yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState<Tz: TimeZone> {
    pub selected: Option<DateTime<Tz>>,
    pub range_start: Option<DateTime<Tz>>,
    pub range_end: Option<DateTime<Tz>>,
    pub pre_selection: Option<DateTime<Tz>>,
    pub input_buffer: Option<String>,
    pub open: bool,
    pub focused: bool,
    pub last_change_origin: ChangeOrigin,
}

impl<Tz: TimeZone> Default for SelectionState<Tz> {
    fn default() -> Self {
        Self {
            selected: None,
            range_start: None,
            range_end: None,
            pre_selection: None,
            input_buffer: None,
            open: false,
            focused: false,
            last_change_origin: ChangeOrigin::default(),
        }
    }
}
