//! Timezone- and DST-correct date arithmetic, truncation and comparison
//! primitives. Everything operates on `chrono::DateTime<Tz>` so the same
//! engine runs against the system zone or a fixed test zone.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Timelike, Weekday,
};

/// Resolves a local wall-clock timestamp in `tz`.
///
/// Ambiguous wall clocks (fall-back transitions) resolve to the earliest
/// valid instant; skipped wall clocks (spring-forward gaps) resolve to the
/// first instant after the gap.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    let mut probe = naive;

    // DST gaps are bounded well below a day; 30-minute steps also cover
    // zones with fractional-hour transitions.
    for _ in 0..48 {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(instant) => return instant,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => probe += Duration::minutes(30),
        }
    }

    tz.from_utc_datetime(&naive)
}

fn with_wall_clock<Tz: TimeZone>(instant: &DateTime<Tz>, naive: NaiveDateTime) -> DateTime<Tz> {
    resolve_local(&instant.timezone(), naive)
}

// ** Arithmetic **

/// Adds instant-precision minutes.
pub fn add_minutes<Tz: TimeZone>(instant: &DateTime<Tz>, minutes: i64) -> DateTime<Tz> {
    instant.clone() + Duration::minutes(minutes)
}

/// Adds instant-precision hours.
pub fn add_hours<Tz: TimeZone>(instant: &DateTime<Tz>, hours: i64) -> DateTime<Tz> {
    instant.clone() + Duration::hours(hours)
}

/// Adds calendar days, preserving the wall-clock time across DST
/// transitions.
pub fn add_days<Tz: TimeZone>(instant: &DateTime<Tz>, days: i64) -> DateTime<Tz> {
    let shifted = instant.date_naive() + Duration::days(days);
    with_wall_clock(instant, shifted.and_time(instant.time()))
}

pub fn sub_days<Tz: TimeZone>(instant: &DateTime<Tz>, days: i64) -> DateTime<Tz> {
    add_days(instant, -days)
}

pub fn add_weeks<Tz: TimeZone>(instant: &DateTime<Tz>, weeks: i64) -> DateTime<Tz> {
    add_days(instant, weeks * 7)
}

pub fn sub_weeks<Tz: TimeZone>(instant: &DateTime<Tz>, weeks: i64) -> DateTime<Tz> {
    add_days(instant, -weeks * 7)
}

/// Adds calendar months, clamping the day-of-month instead of wrapping
/// (Jan 31 + 1 month is Feb 29 in a leap year, Feb 28 otherwise).
pub fn add_months<Tz: TimeZone>(instant: &DateTime<Tz>, months: i32) -> DateTime<Tz> {
    let date = instant.date_naive();
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    }
    .unwrap_or(date);

    with_wall_clock(instant, shifted.and_time(instant.time()))
}

pub fn sub_months<Tz: TimeZone>(instant: &DateTime<Tz>, months: i32) -> DateTime<Tz> {
    add_months(instant, -months)
}

pub fn add_quarters<Tz: TimeZone>(instant: &DateTime<Tz>, quarters: i32) -> DateTime<Tz> {
    add_months(instant, quarters * 3)
}

pub fn sub_quarters<Tz: TimeZone>(instant: &DateTime<Tz>, quarters: i32) -> DateTime<Tz> {
    add_months(instant, -quarters * 3)
}

pub fn add_years<Tz: TimeZone>(instant: &DateTime<Tz>, years: i32) -> DateTime<Tz> {
    add_months(instant, years * 12)
}

pub fn sub_years<Tz: TimeZone>(instant: &DateTime<Tz>, years: i32) -> DateTime<Tz> {
    add_months(instant, -years * 12)
}

// ** Truncation **

pub fn start_of_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Tz> {
    with_wall_clock(instant, instant.date_naive().and_time(NaiveTime::MIN))
}

pub fn end_of_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Tz> {
    with_wall_clock(instant, instant.date_naive().and_time(end_time()))
}

/// Start of the week containing `instant`, where weeks begin on
/// `week_starts_on`.
pub fn start_of_week<Tz: TimeZone>(
    instant: &DateTime<Tz>,
    week_starts_on: Weekday,
) -> DateTime<Tz> {
    let date = instant.date_naive();
    let offset = i64::from(
        (7 + date.weekday().num_days_from_monday() - week_starts_on.num_days_from_monday()) % 7,
    );
    let start = date - Duration::days(offset);

    with_wall_clock(instant, start.and_time(NaiveTime::MIN))
}

/// End of the week containing `instant` (last day of the week, 23:59:59.999).
pub fn end_of_week<Tz: TimeZone>(instant: &DateTime<Tz>, week_starts_on: Weekday) -> DateTime<Tz> {
    end_of_day(&add_days(&start_of_week(instant, week_starts_on), 6))
}

pub fn start_of_month<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let date = instant.date_naive();
    let first = date - Duration::days(i64::from(date.day()) - 1);

    with_wall_clock(instant, first.and_time(NaiveTime::MIN))
}

pub fn end_of_month<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let date = instant.date_naive();
    let last = last_day_of_month(date.year(), date.month());

    with_wall_clock(instant, last.and_time(end_time()))
}

pub fn start_of_quarter<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let date = instant.date_naive();
    let month = (date.month0() / 3) * 3 + 1;
    let first = NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date);

    with_wall_clock(instant, first.and_time(NaiveTime::MIN))
}

pub fn end_of_quarter<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let date = instant.date_naive();
    let month = (date.month0() / 3) * 3 + 3;
    let last = last_day_of_month(date.year(), month);

    with_wall_clock(instant, last.and_time(end_time()))
}

pub fn start_of_year<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let date = instant.date_naive();
    let first = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);

    with_wall_clock(instant, first.and_time(NaiveTime::MIN))
}

pub fn end_of_year<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let date = instant.date_naive();
    let last = NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date);

    with_wall_clock(instant, last.and_time(end_time()))
}

/// Zeroes the seconds and sub-second components by subtracting them from
/// the instant directly. Field-wise truncation through UTC would shift the
/// wall clock around DST transitions; this never does.
pub fn truncate_to_minute<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let seconds = i64::from(instant.second());
    let nanos = i64::from(instant.nanosecond());

    instant.clone() - Duration::seconds(seconds) - Duration::nanoseconds(nanos)
}

fn end_time() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MIN)
}

// ** Field accessors and setters **

/// Quarter of the year, 1 through 4.
pub fn quarter_of<Tz: TimeZone>(instant: &DateTime<Tz>) -> u32 {
    instant.month0() / 3 + 1
}

/// ISO 8601 week number.
pub fn iso_week<Tz: TimeZone>(instant: &DateTime<Tz>) -> u32 {
    instant.iso_week().week()
}

/// Replaces the wall-clock time of day.
pub fn set_time<Tz: TimeZone>(instant: &DateTime<Tz>, time: NaiveTime) -> DateTime<Tz> {
    with_wall_clock(instant, instant.date_naive().and_time(time))
}

/// Copies hour, minute and second from `source` onto `target`'s day.
pub fn graft_time<Tz: TimeZone>(target: &DateTime<Tz>, source: &DateTime<Tz>) -> DateTime<Tz> {
    let time = NaiveTime::from_hms_opt(source.hour(), source.minute(), source.second())
        .unwrap_or_else(|| source.time());

    set_time(target, time)
}

/// Moves `instant` into `month` (1-12) of the same year, clamping the
/// day-of-month.
pub fn with_month<Tz: TimeZone>(instant: &DateTime<Tz>, month: u32) -> DateTime<Tz> {
    let date = instant.date_naive();
    let clamped = NaiveDate::from_ymd_opt(date.year(), month, date.day())
        .or_else(|| {
            (1..=12)
                .contains(&month)
                .then(|| last_day_of_month(date.year(), month))
        })
        .unwrap_or(date);

    with_wall_clock(instant, clamped.and_time(instant.time()))
}

/// Moves `instant` into `quarter` (1-4) of the same year, landing on the
/// quarter's first month.
pub fn with_quarter<Tz: TimeZone>(instant: &DateTime<Tz>, quarter: u32) -> DateTime<Tz> {
    if !(1..=4).contains(&quarter) {
        return instant.clone();
    }

    with_month(instant, (quarter - 1) * 3 + 1)
}

/// Moves `instant` into `year`, clamping Feb 29 to Feb 28 when needed.
pub fn with_year<Tz: TimeZone>(instant: &DateTime<Tz>, year: i32) -> DateTime<Tz> {
    let date = instant.date_naive();
    let clamped = NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .unwrap_or_else(|| last_day_of_month(year, date.month()));

    with_wall_clock(instant, clamped.and_time(instant.time()))
}

// ** Comparison **

pub fn is_before<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    a < b
}

pub fn is_after<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    a > b
}

/// Compares the midnight-truncated forms, so time-of-day never influences
/// day-granularity decisions.
pub fn day_before<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    a.date_naive() < b.date_naive()
}

pub fn same_instant<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    a == b
}

pub fn same_minute<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    truncate_to_minute(a) == truncate_to_minute(b)
}

pub fn same_day<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    a.date_naive() == b.date_naive()
}

pub fn same_month<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn same_quarter<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    a.year() == b.year() && quarter_of(a) == quarter_of(b)
}

pub fn same_year<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    a.year() == b.year()
}

fn opt_cmp<Tz, F>(a: Option<&DateTime<Tz>>, b: Option<&DateTime<Tz>>, cmp: F) -> bool
where
    Tz: TimeZone,
    F: FnOnce(&DateTime<Tz>, &DateTime<Tz>) -> bool,
{
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Null-tolerant equality: two absent instants compare equal, one absent
/// and one present compare false.
pub fn same_instant_opt<Tz: TimeZone>(
    a: Option<&DateTime<Tz>>,
    b: Option<&DateTime<Tz>>,
) -> bool {
    opt_cmp(a, b, same_instant)
}

pub fn same_minute_opt<Tz: TimeZone>(a: Option<&DateTime<Tz>>, b: Option<&DateTime<Tz>>) -> bool {
    opt_cmp(a, b, same_minute)
}

pub fn same_day_opt<Tz: TimeZone>(a: Option<&DateTime<Tz>>, b: Option<&DateTime<Tz>>) -> bool {
    opt_cmp(a, b, same_day)
}

pub fn same_month_opt<Tz: TimeZone>(a: Option<&DateTime<Tz>>, b: Option<&DateTime<Tz>>) -> bool {
    opt_cmp(a, b, same_month)
}

pub fn same_quarter_opt<Tz: TimeZone>(a: Option<&DateTime<Tz>>, b: Option<&DateTime<Tz>>) -> bool {
    opt_cmp(a, b, same_quarter)
}

pub fn same_year_opt<Tz: TimeZone>(a: Option<&DateTime<Tz>>, b: Option<&DateTime<Tz>>) -> bool {
    opt_cmp(a, b, same_year)
}

// ** Diffing **

/// Signed difference in calendar days, ignoring time-of-day.
pub fn calendar_days_between<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> i64 {
    a.date_naive().signed_duration_since(b.date_naive()).num_days()
}

/// Signed difference in calendar months, ignoring day and time.
pub fn calendar_months_between<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> i32 {
    (a.year() - b.year()) * 12 + a.month() as i32 - b.month() as i32
}

/// Signed difference in calendar years.
pub fn calendar_years_between<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> i32 {
    a.year() - b.year()
}

// ** Interval membership **

/// Inclusive day-granularity interval membership. Returns `false` for
/// inverted bounds instead of failing.
pub fn day_in_range<Tz: TimeZone>(
    day: &DateTime<Tz>,
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> bool {
    let start = start_of_day(start);
    let end = end_of_day(end);

    if start > end {
        return false;
    }

    start <= *day && *day <= end
}

/// Wall-clock hours in `instant`'s calendar day: 24 normally, 23 or 25 on
/// the two DST transition days of an observing zone.
pub fn hours_in_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> u32 {
    let midnight = start_of_day(instant);
    let next_midnight = start_of_day(&add_days(instant, 1));
    let minutes = next_midnight.signed_duration_since(&midnight).num_minutes();

    ((minutes as f64) / 60.0).round() as u32
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use chrono_tz::America::New_York;
    use chrono_tz::Tz;

    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().expect("utc instant")
    }

    fn nyc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        New_York
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .single()
            .expect("new york instant")
    }

    #[test]
    fn add_months_clamps_day_of_month() {
        let jan31 = utc(2024, 1, 31, 12, 0, 0);

        assert_eq!(add_months(&jan31, 1).date_naive().to_string(), "2024-02-29");
        assert_eq!(
            add_months(&utc(2023, 1, 31, 12, 0, 0), 1).date_naive().to_string(),
            "2023-02-28"
        );
    }

    #[test]
    fn add_years_clamps_leap_day() {
        let leap = utc(2024, 2, 29, 8, 30, 0);

        assert_eq!(add_years(&leap, 1).date_naive().to_string(), "2025-02-28");
    }

    #[test]
    fn add_days_preserves_wall_clock_across_dst() {
        // 2024-03-10 is the US spring-forward day.
        let before = nyc(2024, 3, 9, 9, 0);
        let after = add_days(&before, 1);

        assert_eq!(after.hour(), 9);
        assert_eq!(after.date_naive().to_string(), "2024-03-10");
    }

    #[test]
    fn start_of_week_honors_week_start() {
        // 2024-06-05 is a Wednesday.
        let wednesday = utc(2024, 6, 5, 15, 0, 0);

        assert_eq!(
            start_of_week(&wednesday, Weekday::Mon).date_naive().to_string(),
            "2024-06-03"
        );
        assert_eq!(
            start_of_week(&wednesday, Weekday::Sun).date_naive().to_string(),
            "2024-06-02"
        );
    }

    #[test]
    fn end_of_week_is_six_days_past_start() {
        let wednesday = utc(2024, 6, 5, 15, 0, 0);
        let end = end_of_week(&wednesday, Weekday::Mon);

        assert_eq!(end.date_naive().to_string(), "2024-06-09");
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
    }

    #[test]
    fn quarter_boundaries() {
        let nov = utc(2024, 11, 15, 0, 0, 0);

        assert_eq!(quarter_of(&nov), 4);
        assert_eq!(start_of_quarter(&nov).date_naive().to_string(), "2024-10-01");
        assert_eq!(end_of_quarter(&nov).date_naive().to_string(), "2024-12-31");

        let feb = utc(2024, 2, 10, 0, 0, 0);
        assert_eq!(end_of_quarter(&feb).date_naive().to_string(), "2024-03-31");
    }

    #[test]
    fn truncate_to_minute_drops_seconds() {
        let instant = utc(2024, 5, 1, 10, 42, 59);
        let truncated = truncate_to_minute(&instant);

        assert_eq!(truncated.second(), 0);
        assert_eq!(truncated.minute(), 42);
        assert!(same_minute(&instant, &truncated));
    }

    #[test]
    fn truncate_to_minute_is_stable_during_fall_back() {
        // First pass through 01:30 on the US fall-back day (EDT, pre-shift).
        let ambiguous = New_York
            .with_ymd_and_hms(2024, 11, 3, 1, 30, 45)
            .earliest()
            .expect("ambiguous instant");
        let truncated = truncate_to_minute(&ambiguous);

        assert_eq!(truncated.offset().to_string(), ambiguous.offset().to_string());
        assert_eq!(
            truncated.timestamp(),
            ambiguous.timestamp() - i64::from(ambiguous.second())
        );
    }

    #[test]
    fn hours_in_day_reflects_dst_transitions() {
        assert_eq!(hours_in_day(&nyc(2024, 3, 10, 12, 0)), 23);
        assert_eq!(hours_in_day(&nyc(2024, 11, 3, 12, 0)), 25);
        assert_eq!(hours_in_day(&nyc(2024, 6, 15, 12, 0)), 24);
    }

    #[test]
    fn null_tolerant_comparisons() {
        let a = utc(2024, 3, 5, 0, 0, 0);

        assert!(same_instant_opt::<Utc>(None, None));
        assert!(!same_instant_opt(Some(&a), None));
        assert!(!same_instant_opt(None, Some(&a)));
        assert!(same_instant_opt(Some(&a), Some(&a.clone())));
    }

    #[test]
    fn calendar_days_between_ignores_time_of_day() {
        let late = utc(2024, 3, 5, 23, 0, 0);
        let early = utc(2024, 3, 4, 1, 0, 0);

        assert_eq!(calendar_days_between(&late, &early), 1);
        assert_eq!(calendar_days_between(&early, &late), -1);
    }

    #[test]
    fn day_in_range_is_inclusive_and_rejects_inverted_bounds() {
        let start = utc(2024, 1, 10, 11, 0, 0);
        let end = utc(2024, 1, 20, 2, 0, 0);

        assert!(day_in_range(&start, &start, &end));
        assert!(day_in_range(&end, &start, &end));
        assert!(!day_in_range(&utc(2024, 1, 21, 0, 0, 0), &start, &end));
        assert!(!day_in_range(&start, &end, &start));
    }

    #[test]
    fn with_year_clamps_february() {
        let leap = utc(2024, 2, 29, 6, 0, 0);

        assert_eq!(with_year(&leap, 2025).date_naive().to_string(), "2025-02-28");
    }

    #[test]
    fn with_quarter_lands_on_first_month() {
        let nov = utc(2024, 11, 15, 6, 0, 0);

        assert_eq!(with_quarter(&nov, 2).date_naive().to_string(), "2024-04-15");
    }
}
