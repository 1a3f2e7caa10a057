//! Pattern tokenizer, renderer and field-level parser.
//!
//! Patterns use Unicode date-field tokens (`yyyy`, `MM`, `dd`, `h:mm aa`, …)
//! with quoted literals and `''` escapes. Long-format tokens (`P`/`p`) are
//! expanded against a locale before anything reaches this module.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};

use crate::calendar::{iso_week, quarter_of};
use crate::locale::Locale;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Token {
    YearFull,
    YearTwoDigit,
    MonthWide,
    MonthAbbrev,
    MonthPadded,
    Month,
    DayPadded,
    Day,
    DayOrdinal,
    WeekdayWide,
    WeekdayAbbrev,
    WeekdayMin,
    Hour24Padded,
    Hour24,
    Hour12Padded,
    Hour12,
    MinutePadded,
    Minute,
    SecondPadded,
    Second,
    DayPeriod,
    QuarterAbbrev,
    Quarter,
    Week,
    Literal(String),
}

pub(super) fn tokenize(pattern: &str) -> Vec<Token> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                literal.push('\'');
                i += 2;
                continue;
            }

            // Quoted section; `''` inside it is an escaped quote.
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        literal.push('\'');
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                literal.push(chars[i]);
                i += 1;
            }
            continue;
        }

        if c.is_ascii_alphabetic() {
            let mut len = 1;
            while chars.get(i + len) == Some(&c) {
                len += 1;
            }

            // `do` is the only two-letter field token.
            if c == 'd' && len == 1 && chars.get(i + 1) == Some(&'o') {
                flush_literal(&mut tokens, &mut literal);
                tokens.push(Token::DayOrdinal);
                i += 2;
                continue;
            }

            match field_token(c, len) {
                Some(token) => {
                    flush_literal(&mut tokens, &mut literal);
                    tokens.push(token);
                }
                None => {
                    for _ in 0..len {
                        literal.push(c);
                    }
                }
            }
            i += len;
            continue;
        }

        literal.push(c);
        i += 1;
    }

    flush_literal(&mut tokens, &mut literal);
    tokens
}

fn flush_literal(tokens: &mut Vec<Token>, literal: &mut String) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}

fn field_token(c: char, len: usize) -> Option<Token> {
    let token = match (c, len) {
        ('y', 4..) | ('y', 1) => Token::YearFull,
        ('y', 2..=3) => Token::YearTwoDigit,
        ('M' | 'L', 4..) => Token::MonthWide,
        ('M' | 'L', 3) => Token::MonthAbbrev,
        ('M' | 'L', 2) => Token::MonthPadded,
        ('M' | 'L', 1) => Token::Month,
        ('d', 2..) => Token::DayPadded,
        ('d', 1) => Token::Day,
        ('E', 5..) => Token::WeekdayMin,
        ('E', 4) => Token::WeekdayWide,
        ('E', 1..=3) => Token::WeekdayAbbrev,
        ('H', 2..) => Token::Hour24Padded,
        ('H', 1) => Token::Hour24,
        ('h', 2..) => Token::Hour12Padded,
        ('h', 1) => Token::Hour12,
        ('m', 2..) => Token::MinutePadded,
        ('m', 1) => Token::Minute,
        ('s', 2..) => Token::SecondPadded,
        ('s', 1) => Token::Second,
        ('a', _) => Token::DayPeriod,
        ('Q', 3..) => Token::QuarterAbbrev,
        ('Q', 1..=2) => Token::Quarter,
        ('w', _) => Token::Week,
        _ => return None,
    };

    Some(token)
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Renders `instant` through the tokenized pattern.
pub(super) fn render<Tz: TimeZone>(
    tokens: &[Token],
    instant: &DateTime<Tz>,
    locale: &Locale,
) -> String {
    let mut out = String::new();
    let month0 = instant.month0() as usize;
    let weekday = instant.weekday().num_days_from_sunday() as usize;
    let hour12 = (instant.hour() + 11) % 12 + 1;

    for token in tokens {
        match token {
            Token::YearFull => out.push_str(&format!("{:04}", instant.year())),
            Token::YearTwoDigit => {
                out.push_str(&format!("{:02}", instant.year().rem_euclid(100)));
            }
            Token::MonthWide => out.push_str(&locale.months[month0]),
            Token::MonthAbbrev => out.push_str(&locale.months_abbrev[month0]),
            Token::MonthPadded => out.push_str(&format!("{:02}", instant.month())),
            Token::Month => out.push_str(&instant.month().to_string()),
            Token::DayPadded => out.push_str(&format!("{:02}", instant.day())),
            Token::Day => out.push_str(&instant.day().to_string()),
            Token::DayOrdinal => {
                out.push_str(&instant.day().to_string());
                out.push_str(ordinal_suffix(instant.day()));
            }
            Token::WeekdayWide => out.push_str(&locale.weekdays[weekday]),
            Token::WeekdayAbbrev => out.push_str(&locale.weekdays_abbrev[weekday]),
            Token::WeekdayMin => out.push_str(&locale.weekdays_min[weekday]),
            Token::Hour24Padded => out.push_str(&format!("{:02}", instant.hour())),
            Token::Hour24 => out.push_str(&instant.hour().to_string()),
            Token::Hour12Padded => out.push_str(&format!("{hour12:02}")),
            Token::Hour12 => out.push_str(&hour12.to_string()),
            Token::MinutePadded => out.push_str(&format!("{:02}", instant.minute())),
            Token::Minute => out.push_str(&instant.minute().to_string()),
            Token::SecondPadded => out.push_str(&format!("{:02}", instant.second())),
            Token::Second => out.push_str(&instant.second().to_string()),
            Token::DayPeriod => {
                let index = usize::from(instant.hour() >= 12);
                out.push_str(&locale.day_periods[index]);
            }
            Token::QuarterAbbrev => {
                out.push_str(&locale.quarters_abbrev[quarter_of(instant) as usize - 1]);
            }
            Token::Quarter => out.push_str(&quarter_of(instant).to_string()),
            Token::Week => out.push_str(&iso_week(instant).to_string()),
            Token::Literal(text) => out.push_str(text),
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Unit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

#[derive(Debug, Default)]
struct Fields {
    year: Option<i32>,
    two_digit_year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour24: Option<u32>,
    hour12: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    pm: Option<bool>,
    finest: Option<Unit>,
}

impl Fields {
    fn record(&mut self, unit: Unit) {
        self.finest = Some(self.finest.map_or(unit, |current| current.max(unit)));
    }
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn digits(&mut self, max: usize) -> Option<u32> {
        let mut value: u32 = 0;
        let mut taken = 0;

        while taken < max {
            match self.chars.get(self.pos) {
                Some(c) if c.is_ascii_digit() => {
                    value = value.checked_mul(10)?.checked_add(c.to_digit(10)?)?;
                    self.pos += 1;
                    taken += 1;
                }
                _ => break,
            }
        }

        (taken > 0).then_some(value)
    }

    fn literal(&mut self, text: &str) -> bool {
        for expected in text.chars() {
            if self.chars.get(self.pos) != Some(&expected) {
                return false;
            }
            self.pos += 1;
        }

        true
    }

    /// Case-insensitive match against a name list, longest name first.
    /// Returns the matched index.
    fn name(&mut self, names: &[String]) -> Option<usize> {
        let mut candidates: Vec<(usize, &String)> = names.iter().enumerate().collect();
        candidates.sort_by_key(|(_, name)| std::cmp::Reverse(name.chars().count()));

        for (index, name) in candidates {
            let len = name.chars().count();
            let slice: String = self.chars.iter().skip(self.pos).take(len).collect();

            if slice.chars().count() == len && slice.eq_ignore_ascii_case(name) {
                self.pos += len;
                return Some(index);
            }
        }

        None
    }

    fn ordinal_day(&mut self) -> Option<u32> {
        let value = self.digits(2)?;
        let suffix: String = self.chars.iter().skip(self.pos).take(2).collect();

        if ["st", "nd", "rd", "th"]
            .iter()
            .any(|s| suffix.eq_ignore_ascii_case(s))
        {
            self.pos += 2;
        }

        Some(value)
    }

    fn exhausted(&self) -> bool {
        self.pos == self.chars.len()
    }
}

/// Two-digit years resolve to the century window centered on the reference
/// year.
fn normalize_two_digit_year(value: i32, reference_year: i32) -> i32 {
    let century = reference_year.div_euclid(100) * 100;
    let mut year = century + value;

    if year > reference_year + 50 {
        year -= 100;
    }

    year
}

/// Parses `value` against the tokenized pattern, filling unparsed fields
/// from `reference`: units coarser than the finest parsed one come from the
/// reference, finer ones reset to their minimum.
pub(super) fn parse<Tz: TimeZone>(
    value: &str,
    tokens: &[Token],
    reference: &DateTime<Tz>,
    locale: &Locale,
) -> Option<NaiveDateTime> {
    if value.is_empty() {
        return None;
    }

    let mut cursor = Cursor {
        chars: value.chars().collect(),
        pos: 0,
    };
    let mut fields = Fields::default();

    for token in tokens {
        match token {
            Token::YearFull => {
                fields.year = Some(cursor.digits(4)? as i32);
                fields.record(Unit::Year);
            }
            Token::YearTwoDigit => {
                fields.two_digit_year = Some(cursor.digits(2)? as i32);
                fields.record(Unit::Year);
            }
            Token::MonthWide => {
                let index = cursor.name(&locale.months)?;
                fields.month = Some(index as u32 + 1);
                fields.record(Unit::Month);
            }
            Token::MonthAbbrev => {
                let index = cursor.name(&locale.months_abbrev)?;
                fields.month = Some(index as u32 + 1);
                fields.record(Unit::Month);
            }
            Token::MonthPadded | Token::Month => {
                fields.month = Some(cursor.digits(2)?);
                fields.record(Unit::Month);
            }
            Token::DayPadded | Token::Day => {
                fields.day = Some(cursor.digits(2)?);
                fields.record(Unit::Day);
            }
            Token::DayOrdinal => {
                fields.day = Some(cursor.ordinal_day()?);
                fields.record(Unit::Day);
            }
            Token::WeekdayWide => {
                cursor.name(&locale.weekdays)?;
            }
            Token::WeekdayAbbrev => {
                cursor.name(&locale.weekdays_abbrev)?;
            }
            Token::WeekdayMin => {
                cursor.name(&locale.weekdays_min)?;
            }
            Token::Hour24Padded | Token::Hour24 => {
                fields.hour24 = Some(cursor.digits(2)?);
                fields.record(Unit::Hour);
            }
            Token::Hour12Padded | Token::Hour12 => {
                fields.hour12 = Some(cursor.digits(2)?);
                fields.record(Unit::Hour);
            }
            Token::MinutePadded | Token::Minute => {
                fields.minute = Some(cursor.digits(2)?);
                fields.record(Unit::Minute);
            }
            Token::SecondPadded | Token::Second => {
                fields.second = Some(cursor.digits(2)?);
                fields.record(Unit::Second);
            }
            Token::DayPeriod => {
                let index = cursor.name(&locale.day_periods)?;
                fields.pm = Some(index == 1);
            }
            Token::QuarterAbbrev => {
                let index = cursor.name(&locale.quarters_abbrev)?;
                fields.month = Some(index as u32 * 3 + 1);
                fields.record(Unit::Month);
            }
            Token::Quarter => {
                let quarter = cursor.digits(1)?;
                if !(1..=4).contains(&quarter) {
                    return None;
                }
                fields.month = Some((quarter - 1) * 3 + 1);
                fields.record(Unit::Month);
            }
            Token::Week => {
                cursor.digits(2)?;
            }
            Token::Literal(text) => {
                if !cursor.literal(text) {
                    return None;
                }
            }
        }
    }

    if !cursor.exhausted() {
        return None;
    }

    assemble(fields, reference)
}

fn assemble<Tz: TimeZone>(fields: Fields, reference: &DateTime<Tz>) -> Option<NaiveDateTime> {
    let finest = fields.finest?;

    let from_reference = |unit: Unit| unit < finest;

    let year = fields
        .year
        .or_else(|| {
            fields
                .two_digit_year
                .map(|value| normalize_two_digit_year(value, reference.year()))
        })
        .unwrap_or(reference.year());

    let month = fields.month.unwrap_or(if from_reference(Unit::Month) {
        reference.month()
    } else {
        1
    });
    let day = fields.day.unwrap_or(if from_reference(Unit::Day) {
        reference.day()
    } else {
        1
    });

    let hour = match (fields.hour24, fields.hour12, fields.pm) {
        (Some(hour), _, _) => hour,
        (None, Some(hour12), pm) => {
            if !(1..=12).contains(&hour12) {
                return None;
            }
            hour12 % 12 + if pm == Some(true) { 12 } else { 0 }
        }
        (None, None, _) => {
            if from_reference(Unit::Hour) {
                reference.hour()
            } else {
                0
            }
        }
    };
    let minute = fields.minute.unwrap_or(if from_reference(Unit::Minute) {
        reference.minute()
    } else {
        0
    });
    let second = fields.second.unwrap_or(if from_reference(Unit::Second) {
        reference.second()
    } else {
        0
    });

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)?;

    Some(date.and_time(time))
}
