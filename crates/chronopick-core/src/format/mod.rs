//! Locale-aware conversion between display strings and instants.
//!
//! Formatting degrades gracefully: an unresolved locale key logs a warning
//! and falls back to the registered default, then to plain English
//! rendering. Parsing supports single patterns, ordered pattern lists,
//! strict round-trip acceptance and a lenient fallback chain.

mod pattern;

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use log::warn;
use regex::Regex;

use crate::calendar::{is_before, resolve_local};
use crate::locale::{Locale, LocaleRegistry, LocaleSpec};
use chronopick_proto::config::DateFormats;

/// Catches symbols escaped by quotes, plus runs of `P` and `p` tokens and
/// combinations like `PPPPppp`.
static LONG_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"P+p+|P+|p+|''|'(''|[^'])+('|$)|.").expect("long-format token pattern is valid")
});

/// Floor for accepted parse results; anything earlier is treated as the
/// residue of an ambiguous parse rather than user intent.
const VALIDITY_FLOOR: NaiveDate = NaiveDate::MIN;

fn validity_floor<Tz: TimeZone>(tz: &Tz) -> DateTime<Tz> {
    let floor = NaiveDate::from_ymd_opt(1000, 1, 1)
        .unwrap_or(VALIDITY_FLOOR)
        .and_time(NaiveTime::MIN);

    resolve_local(tz, floor)
}

/// A parse result is accepted only when it is not before `min_date`
/// (default: January 1 of year 1000).
pub fn is_valid<Tz: TimeZone>(date: &DateTime<Tz>, min_date: Option<&DateTime<Tz>>) -> bool {
    let floor = match min_date {
        Some(min) => min.clone(),
        None => validity_floor(&date.timezone()),
    };

    !is_before(date, &floor)
}

/// Replaces long-format tokens in `pattern` with their locale expansions;
/// quoted sections and ordinary tokens pass through untouched.
fn expand_long_format(pattern: &str, locale: &Locale) -> String {
    LONG_TOKENS
        .find_iter(pattern)
        .map(|token| {
            let text = token.as_str();
            match text.chars().next() {
                Some('P') | Some('p') => locale
                    .expand_long_token(text)
                    .unwrap_or_else(|| text.to_owned()),
                _ => text.to_owned(),
            }
        })
        .collect()
}

fn resolve_for_format(
    registry: &LocaleRegistry,
    spec: Option<&LocaleSpec>,
) -> Option<Arc<Locale>> {
    let resolved = registry.resolve(spec);

    if resolved.is_none() {
        if let Some(LocaleSpec::Key(key)) = spec {
            warn!("a locale object was not found for the provided string [\"{key}\"]");
        }

        return registry.resolve_default();
    }

    resolved
}

/// Renders `instant` through `pattern` using the resolved locale, falling
/// back to the default locale, then to unlocalized English rendering.
pub fn format_date<Tz: TimeZone>(
    instant: &DateTime<Tz>,
    pattern: &str,
    registry: &LocaleRegistry,
    spec: Option<&LocaleSpec>,
) -> String {
    let locale = resolve_for_format(registry, spec).unwrap_or_else(|| Arc::new(Locale::en_us()));
    let expanded = expand_long_format(pattern, &locale);

    pattern::render(&pattern::tokenize(&expanded), instant, &locale)
}

fn parse_with_pattern<Tz: TimeZone>(
    value: &str,
    pattern: &str,
    reference: &DateTime<Tz>,
    locale: &Locale,
) -> Option<DateTime<Tz>> {
    let expanded = expand_long_format(pattern, locale);
    let naive = pattern::parse(value, &pattern::tokenize(&expanded), reference, locale)?;

    Some(resolve_local(&reference.timezone(), naive))
}

/// Unstructured parsing of raw text, tried only after every pattern-driven
/// attempt has failed.
fn parse_native<Tz: TimeZone>(value: &str, reference: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = reference.timezone();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&tz));
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(resolve_local(&tz, parsed));
    }

    if let Ok(parsed) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(resolve_local(&tz, parsed.and_time(NaiveTime::MIN)));
    }

    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&tz))
}

/// Parses typed text against the configured pattern(s).
///
/// With a pattern list, each entry is tried in order and the last entry
/// that parses to a valid instant (and, in strict mode, round-trips back
/// to the exact input) wins. With a single pattern in lenient mode, a
/// failed direct parse falls back to the long-token-expanded pattern
/// truncated to the input length, then to unstructured native parsing.
///
/// Missing fields default from `reference`. Returns `None` when nothing
/// yields a valid instant.
pub fn parse_date<Tz: TimeZone>(
    value: &str,
    formats: &DateFormats,
    reference: &DateTime<Tz>,
    registry: &LocaleRegistry,
    spec: Option<&LocaleSpec>,
    strict: bool,
    min_date: Option<&DateTime<Tz>>,
) -> Option<DateTime<Tz>> {
    let locale = registry
        .resolve(spec)
        .or_else(|| registry.resolve_default())
        .unwrap_or_else(|| Arc::new(Locale::en_us()));

    if formats.is_list() {
        let mut parsed = None;

        for candidate in formats.iter() {
            let attempt = parse_with_pattern(value, candidate, reference, &locale)
                .filter(|date| is_valid(date, min_date));

            let round_trips = |date: &DateTime<Tz>| {
                format_date(date, candidate, registry, spec) == value
            };

            if let Some(date) = attempt {
                if !strict || round_trips(&date) {
                    parsed = Some(date);
                }
            }
        }

        return parsed;
    }

    let pattern = formats.display_format();
    let mut parsed = parse_with_pattern(value, pattern, reference, &locale);

    if strict {
        return parsed
            .filter(|date| is_valid(date, min_date))
            .filter(|date| format_date(date, pattern, registry, spec) == value);
    }

    // An out-of-floor result is as useless as a failed parse; both enter
    // the fallback chain.
    parsed = parsed.filter(|date| is_valid(date, min_date));

    if parsed.is_none() {
        let fallback = expand_long_format(pattern, &locale);

        if !value.is_empty() {
            let prefix: String = fallback.chars().take(value.chars().count()).collect();
            parsed = parse_with_pattern(value, &prefix, reference, &Locale::en_us());
        }

        if parsed.is_none() {
            parsed = parse_native(value, reference);
        }
    }

    parsed.filter(|date| is_valid(date, min_date))
}

/// Renders an optional instant, returning the empty string for `None`.
/// When `formats` is a list, the first entry is the display pattern.
pub fn safe_format<Tz: TimeZone>(
    instant: Option<&DateTime<Tz>>,
    formats: &DateFormats,
    registry: &LocaleRegistry,
    spec: Option<&LocaleSpec>,
) -> String {
    instant.map_or_else(String::new, |date| {
        format_date(date, formats.display_format(), registry, spec)
    })
}

/// Renders a range as `"<start> - <end>"`, with an empty string when the
/// start is absent and an empty end side while the range is half-filled.
pub fn safe_range_format<Tz: TimeZone>(
    start: Option<&DateTime<Tz>>,
    end: Option<&DateTime<Tz>>,
    formats: &DateFormats,
    registry: &LocaleRegistry,
    spec: Option<&LocaleSpec>,
) -> String {
    if start.is_none() {
        return String::new();
    }

    let formatted_start = safe_format(start, formats, registry, spec);
    let formatted_end = safe_format(end, formats, registry, spec);

    format!("{formatted_start} - {formatted_end}")
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike, Utc};

    use super::*;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0)
            .single()
            .expect("reference")
    }

    fn registry() -> LocaleRegistry {
        LocaleRegistry::new()
    }

    fn single(format: &str) -> DateFormats {
        DateFormats::from(format)
    }

    #[test]
    fn strict_round_trip_for_default_format() {
        let registry = registry();
        let date = Utc
            .with_ymd_and_hms(2024, 3, 5, 0, 0, 0)
            .single()
            .expect("date");

        let text = format_date(&date, "MM/dd/yyyy", &registry, None);
        assert_eq!(text, "03/05/2024");

        let parsed = parse_date(
            &text,
            &single("MM/dd/yyyy"),
            &reference(),
            &registry,
            None,
            true,
            None,
        )
        .expect("round trip");

        assert_eq!(parsed, date);
    }

    #[test]
    fn strict_mode_rejects_non_canonical_input() {
        let parsed = parse_date(
            "3/5/2024",
            &single("MM/dd/yyyy"),
            &reference(),
            &registry(),
            None,
            true,
            None,
        );

        assert!(parsed.is_none());
    }

    #[test]
    fn lenient_mode_accepts_unpadded_input() {
        let parsed = parse_date(
            "3/5/2024",
            &single("MM/dd/yyyy"),
            &reference(),
            &registry(),
            None,
            false,
            None,
        )
        .expect("lenient parse");

        assert_eq!(parsed.date_naive().to_string(), "2024-03-05");
    }

    #[test]
    fn pattern_list_last_match_wins() {
        let formats = DateFormats::from(vec![
            "MM/dd/yyyy".to_owned(),
            "yyyy-MM-dd".to_owned(),
        ]);

        let parsed = parse_date(
            "2024-03-05",
            &formats,
            &reference(),
            &registry(),
            None,
            false,
            None,
        )
        .expect("list parse");

        assert_eq!(parsed.date_naive().to_string(), "2024-03-05");
    }

    #[test]
    fn prefix_fallback_parses_partial_input() {
        // Typing in progress: only "12/25" of "MM/dd/yyyy" so far.
        let parsed = parse_date(
            "12/25",
            &single("MM/dd/yyyy"),
            &reference(),
            &registry(),
            None,
            false,
            None,
        )
        .expect("prefix parse");

        assert_eq!(parsed.date_naive().to_string(), "2024-12-25");
    }

    #[test]
    fn long_token_pattern_formats_and_parses() {
        let registry = registry();
        let date = Utc
            .with_ymd_and_hms(2024, 3, 1, 0, 0, 0)
            .single()
            .expect("date");

        let text = format_date(&date, "PPP", &registry, None);
        assert_eq!(text, "March 1st, 2024");

        let parsed = parse_date(
            &text,
            &single("PPP"),
            &reference(),
            &registry,
            None,
            false,
            None,
        )
        .expect("long token parse");

        assert_eq!(parsed.date_naive(), date.date_naive());
    }

    #[test]
    fn native_fallback_handles_iso_input() {
        let parsed = parse_date(
            "2024-03-05T12:30:00",
            &single("MM/dd/yyyy"),
            &reference(),
            &registry(),
            None,
            false,
            None,
        )
        .expect("native parse");

        assert_eq!(parsed.hour(), 12);
        assert_eq!(parsed.date_naive().to_string(), "2024-03-05");
    }

    #[test]
    fn ancient_results_are_rejected() {
        let parsed = parse_date(
            "03/05/0099",
            &single("MM/dd/yyyy"),
            &reference(),
            &registry(),
            None,
            false,
            None,
        );

        assert!(parsed.is_none());
    }

    #[test]
    fn min_date_overrides_validity_floor() {
        let min = Utc
            .with_ymd_and_hms(2024, 4, 1, 0, 0, 0)
            .single()
            .expect("min");

        let parsed = parse_date(
            "03/05/2024",
            &single("MM/dd/yyyy"),
            &reference(),
            &registry(),
            None,
            false,
            Some(&min),
        );

        assert!(parsed.is_none());
    }

    #[test]
    fn unknown_locale_key_falls_back_to_default() {
        let registry = registry();
        let date = Utc
            .with_ymd_and_hms(2024, 3, 5, 0, 0, 0)
            .single()
            .expect("date");
        let spec = LocaleSpec::from("xx-XX");

        assert_eq!(
            format_date(&date, "MMMM yyyy", &registry, Some(&spec)),
            "March 2024"
        );
    }

    #[test]
    fn safe_format_returns_empty_for_none() {
        let registry = registry();

        assert_eq!(
            safe_format::<Utc>(None, &single("MM/dd/yyyy"), &registry, None),
            ""
        );
    }

    #[test]
    fn safe_range_format_requires_a_start() {
        let registry = registry();
        let start = Utc
            .with_ymd_and_hms(2024, 1, 10, 0, 0, 0)
            .single()
            .expect("start");
        let end = Utc
            .with_ymd_and_hms(2024, 1, 20, 0, 0, 0)
            .single()
            .expect("end");
        let formats = single("MM/dd/yyyy");

        assert_eq!(
            safe_range_format(None, Some(&end), &formats, &registry, None),
            ""
        );
        assert_eq!(
            safe_range_format(Some(&start), None, &formats, &registry, None),
            "01/10/2024 - "
        );
        assert_eq!(
            safe_range_format(Some(&start), Some(&end), &formats, &registry, None),
            "01/10/2024 - 01/20/2024"
        );
    }

    #[test]
    fn two_digit_year_parses_relative_to_reference() {
        let parsed = parse_date(
            "03/05/98",
            &single("MM/dd/yy"),
            &reference(),
            &registry(),
            None,
            false,
            None,
        )
        .expect("two digit year");

        assert_eq!(parsed.year(), 1998);
    }
}
