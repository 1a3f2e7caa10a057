//! Pure predicates deciding whether a day, month, quarter, year or time is
//! selectable under a constraint bundle. No state, no side effects.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Timelike};
use itertools::Itertools;

use crate::calendar::{
    add_hours, add_minutes, add_years, calendar_days_between, calendar_months_between,
    calendar_years_between, end_of_month, end_of_year, is_after, is_before, quarter_of, same_day,
    same_month, same_quarter, same_year, set_time, start_of_day, start_of_month, start_of_year,
    sub_months, sub_years,
};
use chronopick_proto::config::{DateIntervalConfig, ExcludedDateConfig, PickerConfig};

/// Custom acceptance predicate supplied by the host.
pub type DatePredicate<Tz> = Arc<dyn Fn(&DateTime<Tz>) -> bool + Send + Sync>;

/// Inclusive interval between two instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateInterval<Tz: TimeZone> {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> DateInterval<Tz> {
    /// Instant-precision membership; inverted intervals contain nothing.
    pub fn contains(&self, instant: &DateTime<Tz>) -> bool {
        self.start <= self.end && self.start <= *instant && *instant <= self.end
    }
}

/// An excluded day, optionally annotated with a message for the render
/// layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedDate<Tz: TimeZone> {
    pub date: DateTime<Tz>,
    pub message: Option<String>,
}

/// Day-granularity constraint bundle.
///
/// A list that is present but empty is not the same as an absent list: an
/// empty include-list admits no day at all, and an empty exclude-interval
/// list falls back to the exclude-date list in [`day_excluded`].
#[derive(Clone)]
pub struct DateConstraints<Tz: TimeZone> {
    pub min_date: Option<DateTime<Tz>>,
    pub max_date: Option<DateTime<Tz>>,
    pub exclude_dates: Option<Vec<ExcludedDate<Tz>>>,
    pub exclude_date_intervals: Option<Vec<DateInterval<Tz>>>,
    pub include_dates: Option<Vec<DateTime<Tz>>>,
    pub include_date_intervals: Option<Vec<DateInterval<Tz>>>,
    pub filter_date: Option<DatePredicate<Tz>>,
}

impl<Tz: TimeZone> Default for DateConstraints<Tz> {
    fn default() -> Self {
        Self {
            min_date: None,
            max_date: None,
            exclude_dates: None,
            exclude_date_intervals: None,
            include_dates: None,
            include_date_intervals: None,
            filter_date: None,
        }
    }
}

impl<Tz: TimeZone + fmt::Debug> fmt::Debug for DateConstraints<Tz> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateConstraints")
            .field("min_date", &self.min_date)
            .field("max_date", &self.max_date)
            .field("exclude_dates", &self.exclude_dates)
            .field("exclude_date_intervals", &self.exclude_date_intervals)
            .field("include_dates", &self.include_dates)
            .field("include_date_intervals", &self.include_date_intervals)
            .field("filter_date", &self.filter_date.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Time-of-day constraint bundle; only hours and minutes are significant.
#[derive(Clone)]
pub struct TimeConstraints<Tz: TimeZone> {
    pub min_time: Option<DateTime<Tz>>,
    pub max_time: Option<DateTime<Tz>>,
    pub exclude_times: Option<Vec<DateTime<Tz>>>,
    pub include_times: Option<Vec<DateTime<Tz>>>,
    pub filter_time: Option<DatePredicate<Tz>>,
}

impl<Tz: TimeZone> Default for TimeConstraints<Tz> {
    fn default() -> Self {
        Self {
            min_time: None,
            max_time: None,
            exclude_times: None,
            include_times: None,
            filter_time: None,
        }
    }
}

impl<Tz: TimeZone> fmt::Debug for TimeConstraints<Tz> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeConstraints")
            .field("min_time", &self.min_time)
            .field("max_time", &self.max_time)
            .field("exclude_times", &self.exclude_times)
            .field("include_times", &self.include_times)
            .field("filter_time", &self.filter_time.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl<Tz: TimeZone> DateConstraints<Tz> {
    /// Materializes the declarative half of a [`PickerConfig`] in `tz`.
    /// Config intervals are day-granular: they run from the start of their
    /// first day to the end of their last.
    pub fn from_config(config: &PickerConfig, tz: &Tz) -> Self {
        let day_start = |date: chrono::NaiveDate| {
            crate::calendar::resolve_local(tz, date.and_time(NaiveTime::MIN))
        };
        let interval = |interval: &DateIntervalConfig| {
            let start = day_start(interval.start);
            DateInterval {
                end: crate::calendar::end_of_day(&day_start(interval.end)),
                start,
            }
        };

        Self {
            min_date: config.min_date.map(day_start),
            max_date: config.max_date.map(day_start),
            exclude_dates: config.exclude_dates.as_ref().map(|entries| {
                entries
                    .iter()
                    .map(|entry| ExcludedDate {
                        date: day_start(entry.date()),
                        message: entry.message().map(str::to_owned),
                    })
                    .collect()
            }),
            exclude_date_intervals: config
                .exclude_date_intervals
                .as_ref()
                .map(|intervals| intervals.iter().map(interval).collect()),
            include_dates: config
                .include_dates
                .as_ref()
                .map(|dates| dates.iter().copied().map(day_start).collect()),
            include_date_intervals: config
                .include_date_intervals
                .as_ref()
                .map(|intervals| intervals.iter().map(interval).collect()),
            filter_date: None,
        }
    }
}

impl<Tz: TimeZone> TimeConstraints<Tz> {
    /// Materializes the time-oriented half of a [`PickerConfig`]; naive
    /// times are projected onto an arbitrary fixed day since only hour and
    /// minute ever matter.
    pub fn from_config(config: &PickerConfig, tz: &Tz) -> Self {
        let on_reference_day = |time: NaiveTime| {
            let date = chrono::NaiveDate::from_ymd_opt(2000, 1, 1)
                .unwrap_or(chrono::NaiveDate::MIN)
                .and_time(time);
            crate::calendar::resolve_local(tz, date)
        };

        Self {
            min_time: config.min_time.map(on_reference_day),
            max_time: config.max_time.map(on_reference_day),
            exclude_times: config
                .exclude_times
                .as_ref()
                .map(|times| times.iter().copied().map(on_reference_day).collect()),
            include_times: config
                .include_times
                .as_ref()
                .map(|times| times.iter().copied().map(on_reference_day).collect()),
            filter_time: None,
        }
    }
}

/// Why a candidate was rejected. Checks run in this order and stop at the
/// first hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisableReason {
    OutOfBounds,
    Excluded,
    NotIncluded,
    FilteredOut,
}

/// True when `day` falls before `min_date` or after `max_date`, measured in
/// calendar days with inclusive boundaries.
pub fn out_of_bounds<Tz: TimeZone>(
    day: &DateTime<Tz>,
    min_date: Option<&DateTime<Tz>>,
    max_date: Option<&DateTime<Tz>>,
) -> bool {
    min_date.is_some_and(|min| calendar_days_between(day, min) < 0)
        || max_date.is_some_and(|max| calendar_days_between(day, max) > 0)
}

/// The first disabling rule `day` trips, or `None` when it is selectable.
pub fn day_disabled_reason<Tz: TimeZone>(
    day: &DateTime<Tz>,
    constraints: &DateConstraints<Tz>,
) -> Option<DisableReason> {
    if out_of_bounds(
        day,
        constraints.min_date.as_ref(),
        constraints.max_date.as_ref(),
    ) {
        return Some(DisableReason::OutOfBounds);
    }

    if constraints
        .exclude_dates
        .as_ref()
        .is_some_and(|dates| dates.iter().any(|entry| same_day(day, &entry.date)))
    {
        return Some(DisableReason::Excluded);
    }

    if constraints
        .exclude_date_intervals
        .as_ref()
        .is_some_and(|intervals| intervals.iter().any(|interval| interval.contains(day)))
    {
        return Some(DisableReason::Excluded);
    }

    if constraints
        .include_dates
        .as_ref()
        .is_some_and(|dates| !dates.iter().any(|included| same_day(day, included)))
    {
        return Some(DisableReason::NotIncluded);
    }

    if constraints
        .include_date_intervals
        .as_ref()
        .is_some_and(|intervals| !intervals.iter().any(|interval| interval.contains(day)))
    {
        return Some(DisableReason::NotIncluded);
    }

    if constraints
        .filter_date
        .as_ref()
        .is_some_and(|filter| !filter(day))
    {
        return Some(DisableReason::FilteredOut);
    }

    None
}

pub fn day_disabled<Tz: TimeZone>(day: &DateTime<Tz>, constraints: &DateConstraints<Tz>) -> bool {
    day_disabled_reason(day, constraints).is_some()
}

/// Exclusion only. A non-empty interval list takes over completely; the
/// exclude-date list is consulted only when no intervals are configured.
pub fn day_excluded<Tz: TimeZone>(day: &DateTime<Tz>, constraints: &DateConstraints<Tz>) -> bool {
    if let Some(intervals) = constraints
        .exclude_date_intervals
        .as_ref()
        .filter(|intervals| !intervals.is_empty())
    {
        return intervals.iter().any(|interval| interval.contains(day));
    }

    constraints
        .exclude_dates
        .as_ref()
        .is_some_and(|dates| dates.iter().any(|entry| same_day(day, &entry.date)))
}

/// Whether the month containing `month` is disabled. Bounds compare against
/// the month's own start and end.
pub fn month_disabled<Tz: TimeZone>(
    month: &DateTime<Tz>,
    constraints: &DateConstraints<Tz>,
) -> bool {
    let min = constraints.min_date.as_ref().map(start_of_month);
    let max = constraints.max_date.as_ref().map(end_of_month);

    out_of_bounds(month, min.as_ref(), max.as_ref())
        || constraints
            .exclude_dates
            .as_ref()
            .is_some_and(|dates| dates.iter().any(|entry| same_month(month, &entry.date)))
        || constraints
            .include_dates
            .as_ref()
            .is_some_and(|dates| !dates.iter().any(|included| same_month(month, included)))
        || constraints
            .filter_date
            .as_ref()
            .is_some_and(|filter| !filter(month))
}

/// Whether the quarter containing `quarter` is disabled. Bound comparison
/// stays day-granular against the raw bounds.
pub fn quarter_disabled<Tz: TimeZone>(
    quarter: &DateTime<Tz>,
    constraints: &DateConstraints<Tz>,
) -> bool {
    out_of_bounds(
        quarter,
        constraints.min_date.as_ref(),
        constraints.max_date.as_ref(),
    ) || constraints
        .exclude_dates
        .as_ref()
        .is_some_and(|dates| dates.iter().any(|entry| same_quarter(quarter, &entry.date)))
        || constraints
            .include_dates
            .as_ref()
            .is_some_and(|dates| !dates.iter().any(|included| same_quarter(quarter, included)))
        || constraints
            .filter_date
            .as_ref()
            .is_some_and(|filter| !filter(quarter))
}

/// Whether the year containing `year` is disabled. Bounds compare against
/// the year's own start and end.
pub fn year_disabled<Tz: TimeZone>(year: &DateTime<Tz>, constraints: &DateConstraints<Tz>) -> bool {
    let date = start_of_year(year);
    let min = constraints.min_date.as_ref().map(start_of_year);
    let max = constraints.max_date.as_ref().map(end_of_year);

    out_of_bounds(&date, min.as_ref(), max.as_ref())
        || constraints
            .exclude_dates
            .as_ref()
            .is_some_and(|dates| dates.iter().any(|entry| same_year(&date, &entry.date)))
        || constraints
            .include_dates
            .as_ref()
            .is_some_and(|dates| !dates.iter().any(|included| same_year(&date, included)))
        || constraints
            .filter_date
            .as_ref()
            .is_some_and(|filter| !filter(&date))
}

/// Whether month number `month` (1-12) of `day`'s year falls inside the
/// `[start, end]` span. Inverted spans select nothing.
pub fn month_in_range<Tz: TimeZone>(
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
    month: u32,
    day: &DateTime<Tz>,
) -> bool {
    let start_year = start.year();
    let start_month = start.month();
    let end_year = end.year();
    let end_month = end.month();
    let day_year = day.year();

    if start_year == end_year && start_year == day_year {
        return start_month <= month && month <= end_month;
    }

    if start_year < end_year {
        return (day_year == start_year && start_month <= month)
            || (day_year == end_year && end_month >= month)
            || (day_year < end_year && day_year > start_year);
    }

    false
}

/// Quarter analog of [`month_in_range`]; `quarter` runs 1-4.
pub fn quarter_in_range<Tz: TimeZone>(
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
    quarter: u32,
    day: &DateTime<Tz>,
) -> bool {
    let start_year = start.year();
    let start_quarter = quarter_of(start);
    let end_year = end.year();
    let end_quarter = quarter_of(end);
    let day_year = day.year();

    if start_year == end_year && start_year == day_year {
        return start_quarter <= quarter && quarter <= end_quarter;
    }

    if start_year < end_year {
        return (day_year == start_year && start_quarter <= quarter)
            || (day_year == end_year && end_quarter >= quarter)
            || (day_year < end_year && day_year > start_year);
    }

    false
}

/// Whether `year` lies within the calendar years of `start` and `end`;
/// both bounds are required.
pub fn year_in_range<Tz: TimeZone>(
    year: i32,
    start: Option<&DateTime<Tz>>,
    end: Option<&DateTime<Tz>>,
) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => start.year() <= year && year <= end.year(),
        _ => false,
    }
}

fn time_in_list<Tz: TimeZone>(time: &DateTime<Tz>, times: &[DateTime<Tz>]) -> bool {
    times
        .iter()
        .any(|entry| entry.hour() == time.hour() && entry.minute() == time.minute())
}

/// Whether a time-of-day is excluded, not included, or filtered out.
/// Matching is by hour and minute only; dates and seconds are ignored.
pub fn time_disabled<Tz: TimeZone>(
    time: &DateTime<Tz>,
    constraints: &TimeConstraints<Tz>,
) -> bool {
    constraints
        .exclude_times
        .as_ref()
        .is_some_and(|times| time_in_list(time, times))
        || constraints
            .include_times
            .as_ref()
            .is_some_and(|times| !time_in_list(time, times))
        || constraints
            .filter_time
            .as_ref()
            .is_some_and(|filter| !filter(time))
}

/// Whether a time-of-day falls outside `[min_time, max_time]`. All three
/// times are projected onto one reference day so only hours and minutes
/// participate.
///
/// # Panics
///
/// Panics when either bound is missing; invoking the range check without
/// both bounds is a wiring mistake, not user input.
pub fn time_in_disabled_range<Tz: TimeZone>(
    time: &DateTime<Tz>,
    constraints: &TimeConstraints<Tz>,
) -> bool {
    let (Some(min_time), Some(max_time)) =
        (constraints.min_time.as_ref(), constraints.max_time.as_ref())
    else {
        panic!("both min_time and max_time are required for the time-range check");
    };

    let base = start_of_day(time);
    let project = |source: &DateTime<Tz>| {
        let wall = NaiveTime::from_hms_opt(source.hour(), source.minute(), 0)
            .unwrap_or_else(|| source.time());
        set_time(&base, wall)
    };

    let projected = project(time);
    let min = project(min_time);
    let max = project(max_time);

    if min > max {
        return false;
    }

    !(min <= projected && projected <= max)
}

/// Whether paging one month back from `day` leaves every permitted date
/// behind.
pub fn month_disabled_before<Tz: TimeZone>(
    day: &DateTime<Tz>,
    constraints: &DateConstraints<Tz>,
) -> bool {
    let previous_month = sub_months(day, 1);

    constraints
        .min_date
        .as_ref()
        .is_some_and(|min| calendar_months_between(min, &previous_month) > 0)
        || constraints.include_dates.as_ref().is_some_and(|dates| {
            dates
                .iter()
                .all(|included| calendar_months_between(included, &previous_month) > 0)
        })
}

/// Whether paging one month forward from `day` leaves every permitted date
/// behind.
pub fn month_disabled_after<Tz: TimeZone>(
    day: &DateTime<Tz>,
    constraints: &DateConstraints<Tz>,
) -> bool {
    let next_month = crate::calendar::add_months(day, 1);

    constraints
        .max_date
        .as_ref()
        .is_some_and(|max| calendar_months_between(&next_month, max) > 0)
        || constraints.include_dates.as_ref().is_some_and(|dates| {
            dates
                .iter()
                .all(|included| calendar_months_between(&next_month, included) > 0)
        })
}

/// Year analog of [`month_disabled_before`].
pub fn year_disabled_before<Tz: TimeZone>(
    day: &DateTime<Tz>,
    constraints: &DateConstraints<Tz>,
) -> bool {
    let previous_year = sub_years(day, 1);

    constraints
        .min_date
        .as_ref()
        .is_some_and(|min| calendar_years_between(min, &previous_year) > 0)
        || constraints.include_dates.as_ref().is_some_and(|dates| {
            dates
                .iter()
                .all(|included| calendar_years_between(included, &previous_year) > 0)
        })
}

/// Year analog of [`month_disabled_after`].
pub fn year_disabled_after<Tz: TimeZone>(
    day: &DateTime<Tz>,
    constraints: &DateConstraints<Tz>,
) -> bool {
    let next_year = add_years(day, 1);

    constraints
        .max_date
        .as_ref()
        .is_some_and(|max| calendar_years_between(&next_year, max) > 0)
        || constraints.include_dates.as_ref().is_some_and(|dates| {
            dates
                .iter()
                .all(|included| calendar_years_between(&next_year, included) > 0)
        })
}

/// Inclusive calendar-year bounds of the fixed-size year page containing an
/// instant's year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearsPeriod {
    pub start_period: i32,
    pub end_period: i32,
}

/// Computes the page of `year_item_number` years containing `instant`,
/// anchored so page boundaries are multiples of the page size.
pub fn years_period<Tz: TimeZone>(instant: &DateTime<Tz>, year_item_number: u32) -> YearsPeriod {
    let size = year_item_number.max(1) as i32;
    let end_period = (f64::from(instant.year()) / f64::from(size)).ceil() as i32 * size;

    YearsPeriod {
        start_period: end_period - (size - 1),
        end_period,
    }
}

/// Whether paging one year page back from `day` lands entirely before
/// `min_date`.
pub fn years_disabled_before<Tz: TimeZone>(
    day: &DateTime<Tz>,
    constraints: &DateConstraints<Tz>,
    year_item_number: u32,
) -> bool {
    let previous_page = start_of_year(&sub_years(day, year_item_number as i32));
    let YearsPeriod { end_period, .. } = years_period(&previous_page, year_item_number);

    constraints
        .min_date
        .as_ref()
        .is_some_and(|min| min.year() > end_period)
}

/// Whether paging one year page forward from `day` lands entirely after
/// `max_date`.
pub fn years_disabled_after<Tz: TimeZone>(
    day: &DateTime<Tz>,
    constraints: &DateConstraints<Tz>,
    year_item_number: u32,
) -> bool {
    let next_page = add_years(day, year_item_number as i32);
    let YearsPeriod { start_period, .. } = years_period(&next_page, year_item_number);

    constraints
        .max_date
        .as_ref()
        .is_some_and(|max| max.year() < start_period)
}

/// The tightest lower bound after reconciling `min_date` with an
/// include-list: the earliest included day on or after the bound.
pub fn effective_min_date<Tz: TimeZone>(
    constraints: &DateConstraints<Tz>,
) -> Option<DateTime<Tz>> {
    match (&constraints.include_dates, &constraints.min_date) {
        (Some(includes), Some(min)) => includes
            .iter()
            .filter(|included| calendar_days_between(included, min) >= 0)
            .min()
            .cloned(),
        (Some(includes), None) => includes.iter().min().cloned(),
        (None, min) => min.clone(),
    }
}

/// The tightest upper bound after reconciling `max_date` with an
/// include-list: the latest included day on or before the bound.
pub fn effective_max_date<Tz: TimeZone>(
    constraints: &DateConstraints<Tz>,
) -> Option<DateTime<Tz>> {
    match (&constraints.include_dates, &constraints.max_date) {
        (Some(includes), Some(max)) => includes
            .iter()
            .filter(|included| calendar_days_between(included, max) <= 0)
            .max()
            .cloned(),
        (Some(includes), None) => includes.iter().max().cloned(),
        (None, max) => max.clone(),
    }
}

/// Canonical day key used by the annotation maps.
fn day_key<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    format!(
        "{:02}.{:02}.{:04}",
        instant.month(),
        instant.day(),
        instant.year()
    )
}

/// Highlight annotation input: a bare day (default class) or a class name
/// spanning several days.
#[derive(Debug, Clone)]
pub enum HighlightEntry<Tz: TimeZone> {
    Date(DateTime<Tz>),
    Class {
        class_name: String,
        dates: Vec<DateTime<Tz>>,
    },
}

/// Folds highlight entries into a map keyed by canonical day string, each
/// holding its distinct class names in first-seen order.
pub fn highlight_map<Tz: TimeZone>(
    entries: &[HighlightEntry<Tz>],
    default_class: &str,
) -> HashMap<String, Vec<String>> {
    let mut classes_by_day: HashMap<String, Vec<String>> = HashMap::new();
    let mut push = |key: String, class_name: &str| {
        let classes = classes_by_day.entry(key).or_default();
        if !classes.iter().any(|existing| existing == class_name) {
            classes.push(class_name.to_owned());
        }
    };

    for entry in entries {
        match entry {
            HighlightEntry::Date(date) => push(day_key(date), default_class),
            HighlightEntry::Class { class_name, dates } => {
                for date in dates {
                    push(day_key(date), class_name);
                }
            }
        }
    }

    classes_by_day
}

/// A named holiday on a specific day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday<Tz: TimeZone> {
    pub date: DateTime<Tz>,
    pub name: String,
}

/// Per-day holiday annotation handed to the render layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayAnnotation {
    pub class_name: String,
    pub names: Vec<String>,
}

/// Folds holidays into a map keyed by canonical day string, accumulating
/// distinct holiday names per day.
pub fn holiday_map<Tz: TimeZone>(
    holidays: &[Holiday<Tz>],
    default_class: &str,
) -> HashMap<String, HolidayAnnotation> {
    holidays
        .iter()
        .map(|holiday| (day_key(&holiday.date), holiday.name.clone()))
        .into_group_map()
        .into_iter()
        .map(|(key, names)| {
            (
                key,
                HolidayAnnotation {
                    class_name: default_class.to_owned(),
                    names: names.into_iter().unique().collect(),
                },
            )
        })
        .collect()
}

/// The time-list entries for one day: every `interval_minutes` from local
/// midnight.
pub fn time_slots<Tz: TimeZone>(day: &DateTime<Tz>, interval_minutes: u32) -> Vec<DateTime<Tz>> {
    let base = start_of_day(day);
    let step = interval_minutes.max(1);
    let count = (24 * 60) / step;

    (0..count)
        .map(|slot| add_minutes(&base, i64::from(slot * step)))
        .collect()
}

/// Extra time-list entries falling strictly between the generated slot at
/// `current_multiplier` and the next one.
pub fn times_to_inject_after<Tz: TimeZone>(
    day_start: &DateTime<Tz>,
    current_time: &DateTime<Tz>,
    current_multiplier: u32,
    interval_minutes: u32,
    injected_times: &[DateTime<Tz>],
) -> Vec<DateTime<Tz>> {
    let next_time = add_minutes(
        day_start,
        i64::from((current_multiplier + 1) * interval_minutes),
    );

    injected_times
        .iter()
        .filter(|injected| {
            let injected_time = add_minutes(
                &add_hours(day_start, i64::from(injected.hour())),
                i64::from(injected.minute()),
            );

            is_after(&injected_time, current_time) && is_before(&injected_time, &next_time)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn utc(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, 0, 0, 0)
            .single()
            .expect("utc date")
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
            .single()
            .expect("utc instant")
    }

    fn bounded(min: DateTime<Utc>, max: DateTime<Utc>) -> DateConstraints<Utc> {
        DateConstraints {
            min_date: Some(min),
            max_date: Some(max),
            ..DateConstraints::default()
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let constraints = bounded(utc(2024, 1, 10), utc(2024, 1, 20));

        assert!(!day_disabled(&utc(2024, 1, 10), &constraints));
        assert!(!day_disabled(&utc(2024, 1, 20), &constraints));
        assert!(day_disabled(&utc(2024, 1, 9), &constraints));
        assert!(day_disabled(&utc(2024, 1, 21), &constraints));
    }

    #[test]
    fn disable_reasons_follow_check_order() {
        let constraints = DateConstraints {
            min_date: Some(utc(2024, 1, 10)),
            exclude_dates: Some(vec![ExcludedDate {
                date: utc(2024, 1, 15),
                message: None,
            }]),
            include_dates: Some(vec![utc(2024, 1, 15), utc(2024, 1, 16)]),
            ..DateConstraints::default()
        };

        assert_eq!(
            day_disabled_reason(&utc(2024, 1, 5), &constraints),
            Some(DisableReason::OutOfBounds)
        );
        // Listed in both include and exclude: exclusion wins first.
        assert_eq!(
            day_disabled_reason(&utc(2024, 1, 15), &constraints),
            Some(DisableReason::Excluded)
        );
        assert_eq!(
            day_disabled_reason(&utc(2024, 1, 17), &constraints),
            Some(DisableReason::NotIncluded)
        );
        assert_eq!(day_disabled_reason(&utc(2024, 1, 16), &constraints), None);
    }

    #[test]
    fn empty_include_list_admits_nothing() {
        let constraints = DateConstraints {
            include_dates: Some(Vec::new()),
            ..DateConstraints::default()
        };

        assert_eq!(
            day_disabled_reason(&utc(2024, 1, 16), &constraints),
            Some(DisableReason::NotIncluded)
        );
    }

    #[test]
    fn custom_filter_rejects_days() {
        let constraints = DateConstraints {
            filter_date: Some(Arc::new(|day: &DateTime<Utc>| {
                day.weekday().num_days_from_monday() < 5
            })),
            ..DateConstraints::default()
        };

        // 2024-06-08 is a Saturday.
        assert_eq!(
            day_disabled_reason(&utc(2024, 6, 8), &constraints),
            Some(DisableReason::FilteredOut)
        );
        assert!(!day_disabled(&utc(2024, 6, 7), &constraints));
    }

    #[test]
    fn exclusion_intervals_preempt_the_exclude_list() {
        let constraints = DateConstraints {
            exclude_dates: Some(vec![ExcludedDate {
                date: utc(2024, 3, 5),
                message: None,
            }]),
            exclude_date_intervals: Some(vec![DateInterval {
                start: utc(2024, 3, 10),
                end: utc(2024, 3, 12),
            }]),
            ..DateConstraints::default()
        };

        assert!(day_excluded(&utc(2024, 3, 11), &constraints));
        // The interval branch is authoritative; the list is not consulted.
        assert!(!day_excluded(&utc(2024, 3, 5), &constraints));

        let list_only = DateConstraints {
            exclude_date_intervals: Some(Vec::new()),
            ..constraints
        };
        assert!(day_excluded(&utc(2024, 3, 5), &list_only));
    }

    #[test]
    fn month_bounds_use_month_boundaries() {
        let constraints = bounded(utc(2024, 3, 15), utc(2024, 6, 15));

        assert!(!month_disabled(&utc(2024, 3, 1), &constraints));
        assert!(!month_disabled(&utc(2024, 6, 30), &constraints));
        assert!(month_disabled(&utc(2024, 2, 28), &constraints));
        assert!(month_disabled(&utc(2024, 7, 1), &constraints));
    }

    #[test]
    fn year_bounds_use_year_boundaries() {
        let constraints = bounded(utc(2024, 6, 1), utc(2025, 6, 1));

        assert!(!year_disabled(&utc(2024, 1, 1), &constraints));
        assert!(!year_disabled(&utc(2025, 12, 31), &constraints));
        assert!(year_disabled(&utc(2023, 12, 31), &constraints));
        assert!(year_disabled(&utc(2026, 1, 1), &constraints));
    }

    #[test]
    fn month_in_range_spans_years() {
        let start = utc(2023, 11, 1);
        let end = utc(2025, 2, 1);

        assert!(month_in_range(&start, &end, 12, &utc(2023, 6, 1)));
        assert!(!month_in_range(&start, &end, 10, &utc(2023, 6, 1)));
        assert!(month_in_range(&start, &end, 7, &utc(2024, 6, 1)));
        assert!(month_in_range(&start, &end, 1, &utc(2025, 6, 1)));
        assert!(!month_in_range(&start, &end, 3, &utc(2025, 6, 1)));
        // Inverted span selects nothing.
        assert!(!month_in_range(&end, &start, 12, &utc(2024, 6, 1)));
    }

    #[test]
    fn quarter_in_range_same_year() {
        let start = utc(2024, 2, 1);
        let end = utc(2024, 8, 1);
        let day = utc(2024, 5, 1);

        assert!(quarter_in_range(&start, &end, 2, &day));
        assert!(!quarter_in_range(&start, &end, 4, &day));
    }

    #[test]
    fn year_in_range_requires_both_bounds() {
        let start = utc(2020, 1, 1);
        let end = utc(2030, 1, 1);

        assert!(year_in_range(2024, Some(&start), Some(&end)));
        assert!(!year_in_range(2019, Some(&start), Some(&end)));
        assert!(!year_in_range(2024, Some(&start), None));
    }

    #[test]
    fn time_matching_ignores_date_and_seconds() {
        let constraints = TimeConstraints {
            exclude_times: Some(vec![at(2000, 1, 1, 12, 30)]),
            ..TimeConstraints::default()
        };

        assert!(time_disabled(&at(2024, 7, 9, 12, 30), &constraints));
        assert!(!time_disabled(&at(2024, 7, 9, 12, 31), &constraints));
    }

    #[test]
    fn include_times_admit_only_listed_entries() {
        let constraints = TimeConstraints {
            include_times: Some(vec![at(2000, 1, 1, 9, 0), at(2000, 1, 1, 9, 30)]),
            ..TimeConstraints::default()
        };

        assert!(!time_disabled(&at(2024, 7, 9, 9, 30), &constraints));
        assert!(time_disabled(&at(2024, 7, 9, 10, 0), &constraints));
    }

    #[test]
    fn time_range_check_projects_onto_one_day() {
        let constraints = TimeConstraints {
            min_time: Some(at(2000, 1, 1, 9, 0)),
            max_time: Some(at(2000, 1, 1, 17, 0)),
            ..TimeConstraints::default()
        };

        assert!(!time_in_disabled_range(&at(2024, 7, 9, 12, 0), &constraints));
        assert!(!time_in_disabled_range(&at(2024, 7, 9, 9, 0), &constraints));
        assert!(time_in_disabled_range(&at(2024, 7, 9, 8, 59), &constraints));
        assert!(time_in_disabled_range(&at(2024, 7, 9, 17, 1), &constraints));
    }

    #[test]
    #[should_panic(expected = "both min_time and max_time")]
    fn time_range_check_panics_without_both_bounds() {
        let constraints = TimeConstraints {
            min_time: Some(at(2000, 1, 1, 9, 0)),
            ..TimeConstraints::default()
        };

        time_in_disabled_range(&at(2024, 7, 9, 12, 0), &constraints);
    }

    #[test]
    fn month_navigation_respects_bounds_and_includes() {
        let bounded = bounded(utc(2024, 3, 1), utc(2024, 9, 30));

        assert!(month_disabled_before(&utc(2024, 3, 15), &bounded));
        assert!(!month_disabled_before(&utc(2024, 5, 15), &bounded));
        assert!(month_disabled_after(&utc(2024, 9, 15), &bounded));
        assert!(!month_disabled_after(&utc(2024, 7, 15), &bounded));

        let includes = DateConstraints {
            include_dates: Some(vec![utc(2024, 5, 10)]),
            ..DateConstraints::default()
        };
        assert!(month_disabled_before(&utc(2024, 5, 15), &includes));
        assert!(month_disabled_after(&utc(2024, 5, 15), &includes));
    }

    #[test]
    fn year_navigation_respects_bounds() {
        let constraints = bounded(utc(2023, 1, 1), utc(2025, 12, 31));

        assert!(year_disabled_before(&utc(2023, 6, 1), &constraints));
        assert!(!year_disabled_before(&utc(2024, 6, 1), &constraints));
        assert!(year_disabled_after(&utc(2025, 6, 1), &constraints));
        assert!(!year_disabled_after(&utc(2024, 6, 1), &constraints));
    }

    #[test]
    fn years_period_anchors_on_page_multiples() {
        let period = years_period(&utc(2024, 6, 1), 12);
        assert_eq!(
            period,
            YearsPeriod {
                start_period: 2013,
                end_period: 2024
            }
        );

        let next = years_period(&utc(2025, 1, 1), 12);
        assert_eq!(
            next,
            YearsPeriod {
                start_period: 2025,
                end_period: 2036
            }
        );
    }

    #[test]
    fn year_page_navigation_respects_bounds() {
        let narrow = bounded(utc(2020, 1, 1), utc(2028, 12, 31));

        // From 2024, paging back lands on the page ending 2016 and paging
        // forward on the page starting 2029; both fall outside the bounds.
        assert!(years_disabled_before(&utc(2024, 6, 1), &narrow, 12));
        assert!(years_disabled_after(&utc(2024, 6, 1), &narrow, 12));

        let wide = bounded(utc(2001, 1, 1), utc(2050, 12, 31));
        assert!(!years_disabled_before(&utc(2024, 6, 1), &wide, 12));
        assert!(!years_disabled_after(&utc(2024, 6, 1), &wide, 12));
    }

    #[test]
    fn effective_bounds_reconcile_includes_with_bounds() {
        let constraints = DateConstraints {
            min_date: Some(utc(2024, 3, 1)),
            max_date: Some(utc(2024, 9, 30)),
            include_dates: Some(vec![utc(2024, 2, 1), utc(2024, 4, 10), utc(2024, 8, 20)]),
            ..DateConstraints::default()
        };

        assert_eq!(effective_min_date(&constraints), Some(utc(2024, 4, 10)));
        assert_eq!(effective_max_date(&constraints), Some(utc(2024, 8, 20)));

        let include_only = DateConstraints {
            min_date: None,
            max_date: None,
            ..constraints
        };
        assert_eq!(effective_min_date(&include_only), Some(utc(2024, 2, 1)));
        assert_eq!(effective_max_date(&include_only), Some(utc(2024, 8, 20)));

        let bounds_only = bounded(utc(2024, 3, 1), utc(2024, 9, 30));
        assert_eq!(effective_min_date(&bounds_only), Some(utc(2024, 3, 1)));
    }

    #[test]
    fn highlight_map_accumulates_distinct_classes() {
        let entries = vec![
            HighlightEntry::Date(utc(2024, 3, 5)),
            HighlightEntry::Date(utc(2024, 3, 5)),
            HighlightEntry::Class {
                class_name: "release-day".to_owned(),
                dates: vec![utc(2024, 3, 5), utc(2024, 3, 6)],
            },
        ];

        let map = highlight_map(&entries, "highlighted");

        assert_eq!(
            map.get("03.05.2024"),
            Some(&vec!["highlighted".to_owned(), "release-day".to_owned()])
        );
        assert_eq!(map.get("03.06.2024"), Some(&vec!["release-day".to_owned()]));
    }

    #[test]
    fn holiday_map_accumulates_distinct_names() {
        let holidays = vec![
            Holiday {
                date: utc(2024, 12, 25),
                name: "Christmas".to_owned(),
            },
            Holiday {
                date: utc(2024, 12, 25),
                name: "Christmas".to_owned(),
            },
            Holiday {
                date: utc(2024, 12, 25),
                name: "Company holiday".to_owned(),
            },
        ];

        let map = holiday_map(&holidays, "holidays");
        let annotation = map.get("12.25.2024").expect("annotation");

        assert_eq!(annotation.class_name, "holidays");
        assert_eq!(annotation.names, vec!["Christmas", "Company holiday"]);
    }

    #[test]
    fn time_slots_cover_the_day() {
        let slots = time_slots(&utc(2024, 7, 9), 30);

        assert_eq!(slots.len(), 48);
        assert_eq!(slots[0].hour(), 0);
        assert_eq!(slots[47].hour(), 23);
        assert_eq!(slots[47].minute(), 30);
    }

    #[test]
    fn times_to_inject_after_windows_between_slots() {
        let day_start = utc(2024, 7, 9);
        let current = add_minutes(&day_start, 600); // 10:00
        let injected = vec![at(2024, 7, 9, 10, 10), at(2024, 7, 9, 11, 15)];

        // Slot 20 at 30-minute intervals is 10:00; the window is (10:00, 10:30).
        let between = times_to_inject_after(&day_start, &current, 20, 30, &injected);

        assert_eq!(between, vec![at(2024, 7, 9, 10, 10)]);
    }

    #[test]
    fn from_config_materializes_day_granular_intervals() {
        use chronopick_proto::config::PickerConfig;

        let config: PickerConfig = toml::from_str(
            r#"
            min_date = "2024-01-10"
            include_dates = ["2024-01-15"]

            [[exclude_date_intervals]]
            start = "2024-02-01"
            end = "2024-02-03"
            "#,
        )
        .expect("config");

        let constraints = DateConstraints::from_config(&config, &Utc);
        let intervals = constraints
            .exclude_date_intervals
            .as_ref()
            .expect("intervals");

        assert!(intervals[0].contains(&at(2024, 2, 3, 23, 0)));
        assert!(!intervals[0].contains(&at(2024, 2, 4, 0, 0)));
        assert_eq!(constraints.min_date, Some(utc(2024, 1, 10)));
    }
}
