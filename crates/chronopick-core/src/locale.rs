//! Locale capabilities and the registry that maps locale keys to them.
//!
//! The registry is an explicit object owned by the hosting application and
//! handed to every format/parse call; there is no process-global table.
//! Clones share the same underlying map, so a registry can be distributed
//! to many picker instances while `register`/`set_default` stay visible to
//! all of them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Weekday;

/// Long-format pattern expansions, indexed by width: short, medium, long,
/// full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatLong {
    pub date: [&'static str; 4],
    pub time: [&'static str; 4],
    /// Glue patterns combining `{{date}}` and `{{time}}`.
    pub date_time: [&'static str; 4],
}

/// A locale capability: everything the formatter and parser need to render
/// names and expand long-format tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub key: String,
    /// Wide month names, January first.
    pub months: [String; 12],
    /// Abbreviated month names.
    pub months_abbrev: [String; 12],
    /// Wide weekday names, Sunday first.
    pub weekdays: [String; 7],
    /// Abbreviated weekday names, Sunday first.
    pub weekdays_abbrev: [String; 7],
    /// Minimal weekday names (two letters), Sunday first.
    pub weekdays_min: [String; 7],
    /// Abbreviated quarter labels, Q1 first.
    pub quarters_abbrev: [String; 4],
    /// Day-period labels: AM then PM.
    pub day_periods: [String; 2],
    pub week_starts_on: Weekday,
    pub format_long: FormatLong,
}

fn owned<const N: usize>(values: [&str; N]) -> [String; N] {
    values.map(str::to_owned)
}

impl Locale {
    /// The built-in `en-US` capability, also the initial registry content.
    pub fn en_us() -> Self {
        Self {
            key: "en-US".to_owned(),
            months: owned([
                "January",
                "February",
                "March",
                "April",
                "May",
                "June",
                "July",
                "August",
                "September",
                "October",
                "November",
                "December",
            ]),
            months_abbrev: owned([
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov",
                "Dec",
            ]),
            weekdays: owned([
                "Sunday",
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
                "Friday",
                "Saturday",
            ]),
            weekdays_abbrev: owned(["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]),
            weekdays_min: owned(["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"]),
            quarters_abbrev: owned(["Q1", "Q2", "Q3", "Q4"]),
            day_periods: owned(["AM", "PM"]),
            week_starts_on: Weekday::Sun,
            format_long: FormatLong {
                date: [
                    "MM/dd/yyyy",
                    "MMM d, yyyy",
                    "MMMM do, yyyy",
                    "EEEE, MMMM do, yyyy",
                ],
                time: ["h:mm aa", "h:mm:ss aa", "h:mm:ss aa", "h:mm:ss aa"],
                date_time: [
                    "{{date}}, {{time}}",
                    "{{date}}, {{time}}",
                    "{{date}} 'at' {{time}}",
                    "{{date}} 'at' {{time}}",
                ],
            },
        }
    }

    /// Expands a long-format token (`P+`, `p+` or a mixed `P+p+` run) into
    /// its concrete pattern. Returns `None` for anything else.
    pub fn expand_long_token(&self, token: &str) -> Option<String> {
        let dates = token.chars().take_while(|c| *c == 'P').count();
        let times = token.chars().skip(dates).take_while(|c| *c == 'p').count();

        if dates + times != token.chars().count() || dates + times == 0 {
            return None;
        }

        let width = |count: usize| count.clamp(1, 4) - 1;

        match (dates, times) {
            (0, t) => Some(self.format_long.time[width(t)].to_owned()),
            (d, 0) => Some(self.format_long.date[width(d)].to_owned()),
            (d, t) => {
                let glue = self.format_long.date_time[width(t)];
                Some(
                    glue.replace("{{date}}", self.format_long.date[width(d)])
                        .replace("{{time}}", self.format_long.time[width(t)]),
                )
            }
        }
    }
}

/// Either a registered key or an already-resolved capability object.
#[derive(Debug, Clone)]
pub enum LocaleSpec {
    Key(String),
    Object(Arc<Locale>),
}

impl From<&str> for LocaleSpec {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<Locale> for LocaleSpec {
    fn from(locale: Locale) -> Self {
        Self::Object(Arc::new(locale))
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    locales: HashMap<String, Arc<Locale>>,
    default_key: Option<String>,
}

/// Process-lifetime mapping from locale key to capability, plus the current
/// default key.
///
/// # Examples
///
/// ```
/// use chronopick_core::locale::{Locale, LocaleRegistry, LocaleSpec};
///
/// let registry = LocaleRegistry::new();
/// assert_eq!(registry.default_key().as_deref(), Some("en-US"));
///
/// let spec = LocaleSpec::from("en-US");
/// assert!(registry.resolve(Some(&spec)).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl LocaleRegistry {
    /// Creates a registry seeded with [`Locale::en_us`] as the default.
    pub fn new() -> Self {
        let registry = Self::empty();
        let en_us = Locale::en_us();
        let key = en_us.key.clone();

        registry.register(en_us);
        registry.set_default(&key);
        registry
    }

    /// Creates a registry with no locales and no default.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner::default())),
        }
    }

    /// Inserts or overwrites a capability under its own key.
    pub fn register(&self, locale: Locale) {
        let key = locale.key.clone();
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        inner.locales.insert(key, Arc::new(locale));
    }

    /// Sets the key returned by [`default_key`](Self::default_key). The key
    /// does not have to be registered yet.
    pub fn set_default(&self, key: &str) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        inner.default_key = Some(key.to_owned());
    }

    pub fn default_key(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .default_key
            .clone()
    }

    fn lookup(&self, key: &str) -> Option<Arc<Locale>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .locales
            .get(key)
            .cloned()
    }

    /// Resolves a spec to a capability: a key is looked up, an object is
    /// passed through, and `None` falls back to the registered default.
    pub fn resolve(&self, spec: Option<&LocaleSpec>) -> Option<Arc<Locale>> {
        match spec {
            Some(LocaleSpec::Key(key)) => self.lookup(key),
            Some(LocaleSpec::Object(locale)) => Some(Arc::clone(locale)),
            None => self.resolve_default(),
        }
    }

    /// The capability registered under the default key, if any.
    pub fn resolve_default(&self) -> Option<Arc<Locale>> {
        self.default_key().and_then(|key| self.lookup(&key))
    }
}

impl Default for LocaleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn french() -> Locale {
        Locale {
            key: "fr-FR".to_owned(),
            week_starts_on: Weekday::Mon,
            ..Locale::en_us()
        }
    }

    #[test]
    fn new_registry_resolves_en_us_by_default() {
        let registry = LocaleRegistry::new();
        let locale = registry.resolve(None).expect("default locale");

        assert_eq!(locale.key, "en-US");
    }

    #[test]
    fn empty_registry_resolves_nothing() {
        let registry = LocaleRegistry::empty();

        assert!(registry.resolve(None).is_none());
        assert!(registry.default_key().is_none());
    }

    #[test]
    fn register_overwrites_and_is_visible_to_clones() {
        let registry = LocaleRegistry::new();
        let clone = registry.clone();

        registry.register(french());
        clone.set_default("fr-FR");

        let resolved = registry.resolve(None).expect("shared default");
        assert_eq!(resolved.key, "fr-FR");
        assert_eq!(resolved.week_starts_on, Weekday::Mon);
    }

    #[test]
    fn resolve_accepts_capability_objects_transparently() {
        let registry = LocaleRegistry::empty();
        let spec = LocaleSpec::from(french());

        let resolved = registry.resolve(Some(&spec)).expect("object spec");
        assert_eq!(resolved.key, "fr-FR");
    }

    #[test]
    fn unknown_key_resolves_to_none() {
        let registry = LocaleRegistry::new();
        let spec = LocaleSpec::from("de-DE");

        assert!(registry.resolve(Some(&spec)).is_none());
    }

    #[test]
    fn expand_long_token_covers_date_time_and_mixed_runs() {
        let locale = Locale::en_us();

        assert_eq!(locale.expand_long_token("P").as_deref(), Some("MM/dd/yyyy"));
        assert_eq!(locale.expand_long_token("p").as_deref(), Some("h:mm aa"));
        assert_eq!(
            locale.expand_long_token("Pp").as_deref(),
            Some("MM/dd/yyyy, h:mm aa")
        );
        assert_eq!(
            locale.expand_long_token("PPPPp").as_deref(),
            Some("EEEE, MMMM do, yyyy, h:mm aa")
        );
        assert_eq!(locale.expand_long_token("x"), None);
        assert_eq!(locale.expand_long_token("pP"), None);
    }
}
