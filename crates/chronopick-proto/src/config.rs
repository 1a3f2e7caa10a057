use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

mod serde_helpers;
mod validation;

pub use serde_helpers::DateFormats;
pub use validation::ConfigValidationError;

pub const DEFAULT_DATE_FORMAT: &str = "MM/dd/yyyy";
pub const DEFAULT_CALENDAR_FORMAT: &str = "LLLL yyyy";
pub const DEFAULT_TIME_FORMAT: &str = "h:mm aa";
pub const DEFAULT_YEAR_ITEM_NUMBER: u32 = 12;
pub const DEFAULT_TIME_INTERVALS: u32 = 30;

/// Granularity of the committed selection.
///
/// Fixed for the lifetime of a control instance; decides which disabled
/// checks apply to a commit and which formatting granularity the input uses.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    #[default]
    Single,
    SingleWithTime,
    Range,
    MonthOnly,
    QuarterOnly,
    YearOnly,
    WeekOnly,
}

impl SelectionMode {
    /// Whether commits in this mode carry a meaningful time-of-day.
    pub fn is_time_bearing(self) -> bool {
        matches!(self, Self::SingleWithTime)
    }

    /// Whether commits resolve to a `[start, end]` pair.
    pub fn is_range(self) -> bool {
        matches!(self, Self::Range)
    }
}

/// A single excluded day, optionally annotated with a message the render
/// layer may surface as a tooltip.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum ExcludedDateConfig {
    Plain(NaiveDate),
    Annotated {
        date: NaiveDate,
        #[serde(default)]
        message: Option<String>,
    },
}

impl ExcludedDateConfig {
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Plain(date) => *date,
            Self::Annotated { date, .. } => *date,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Plain(_) => None,
            Self::Annotated { message, .. } => message.as_deref(),
        }
    }
}

/// An inclusive `[start, end]` day interval.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateIntervalConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Highlight annotation: either a bare day (rendered with the default
/// highlight class) or a class name applied to a list of days.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum HighlightConfig {
    Plain(NaiveDate),
    Class {
        class_name: String,
        dates: Vec<NaiveDate>,
    },
}

/// A named holiday attached to a calendar day.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HolidayConfig {
    pub date: NaiveDate,
    pub name: String,
}

/// Declarative configuration for one picker instance.
///
/// Custom predicate filters (`filter_date`, `filter_time`) are runtime
/// capabilities and are attached when the engine context is built; everything
/// that can be expressed as data lives here.
#[serde_as]
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PickerConfig {
    pub mode: SelectionMode,
    pub date_format: DateFormats,
    pub calendar_format: String,
    pub time_format: String,
    pub locale: Option<String>,
    pub strict_parsing: bool,
    pub year_item_number: u32,
    pub time_intervals: u32,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub week_starts_on: Option<Weekday>,
    pub inline: bool,
    pub close_on_select: bool,
    pub close_on_scroll: bool,
    pub disabled: bool,
    pub read_only: bool,
    pub disabled_keyboard_navigation: bool,
    pub adjust_date_on_change: bool,
    pub allow_same_day: bool,
    pub prevent_open_on_focus: bool,
    pub start_open: bool,
    /// Only meaningful in [`SelectionMode::SingleWithTime`]: the control
    /// edits just the time-of-day of the selected day.
    pub time_only: bool,
    pub open_to: Option<NaiveDate>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub exclude_dates: Option<Vec<ExcludedDateConfig>>,
    pub exclude_date_intervals: Option<Vec<DateIntervalConfig>>,
    pub include_dates: Option<Vec<NaiveDate>>,
    pub include_date_intervals: Option<Vec<DateIntervalConfig>>,
    pub min_time: Option<NaiveTime>,
    pub max_time: Option<NaiveTime>,
    pub exclude_times: Option<Vec<NaiveTime>>,
    pub include_times: Option<Vec<NaiveTime>>,
    pub highlight_dates: Option<Vec<HighlightConfig>>,
    pub holidays: Option<Vec<HolidayConfig>>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::default(),
            date_format: DateFormats::default(),
            calendar_format: DEFAULT_CALENDAR_FORMAT.to_owned(),
            time_format: DEFAULT_TIME_FORMAT.to_owned(),
            locale: None,
            strict_parsing: false,
            year_item_number: DEFAULT_YEAR_ITEM_NUMBER,
            time_intervals: DEFAULT_TIME_INTERVALS,
            week_starts_on: None,
            inline: false,
            close_on_select: true,
            close_on_scroll: false,
            disabled: false,
            read_only: false,
            disabled_keyboard_navigation: false,
            adjust_date_on_change: false,
            allow_same_day: false,
            prevent_open_on_focus: false,
            start_open: false,
            time_only: false,
            open_to: None,
            min_date: None,
            max_date: None,
            exclude_dates: None,
            exclude_date_intervals: None,
            include_dates: None,
            include_date_intervals: None,
            min_time: None,
            max_time: None,
            exclude_times: None,
            include_times: None,
            highlight_dates: None,
            holidays: None,
        }
    }
}
