use serde::Deserialize;

use super::DEFAULT_DATE_FORMAT;

/// One or several display/parse patterns for the text input.
///
/// A single pattern is used for both display and parsing. When a list is
/// given, the first entry renders the committed value and the whole list is
/// offered to the parser, most-specific first.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum DateFormats {
    Single(String),
    Many(Vec<String>),
}

impl DateFormats {
    /// The pattern used to render the committed value.
    pub fn display_format(&self) -> &str {
        match self {
            Self::Single(format) => format,
            Self::Many(formats) => formats.first().map_or(DEFAULT_DATE_FORMAT, String::as_str),
        }
    }

    /// Iterates over every candidate parse pattern.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let (single, many) = match self {
            Self::Single(format) => (Some(format.as_str()), None),
            Self::Many(formats) => (None, Some(formats.iter().map(String::as_str))),
        };

        single.into_iter().chain(many.into_iter().flatten())
    }

    /// Whether the parser should treat this as a pattern list.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::Many(_))
    }
}

impl Default for DateFormats {
    fn default() -> Self {
        Self::Single(DEFAULT_DATE_FORMAT.to_owned())
    }
}

impl From<&str> for DateFormats {
    fn from(format: &str) -> Self {
        Self::Single(format.to_owned())
    }
}

impl From<Vec<String>> for DateFormats {
    fn from(formats: Vec<String>) -> Self {
        Self::Many(formats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_format_round_trip() {
        let formats = DateFormats::from("yyyy-MM-dd");

        assert_eq!(formats.display_format(), "yyyy-MM-dd");
        assert_eq!(formats.iter().collect::<Vec<_>>(), vec!["yyyy-MM-dd"]);
        assert!(!formats.is_list());
    }

    #[test]
    fn list_display_uses_first_entry() {
        let formats = DateFormats::from(vec!["MM/dd/yyyy".to_owned(), "yyyy-MM-dd".to_owned()]);

        assert_eq!(formats.display_format(), "MM/dd/yyyy");
        assert!(formats.is_list());
    }

    #[test]
    fn empty_list_falls_back_to_default_display() {
        let formats = DateFormats::Many(Vec::new());

        assert_eq!(formats.display_format(), DEFAULT_DATE_FORMAT);
        assert_eq!(formats.iter().count(), 0);
    }

    #[test]
    fn deserializes_from_string_or_sequence() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: DateFormats,
        }

        let single: Wrapper = toml::from_str(r#"format = "dd.MM.yyyy""#).expect("single");
        assert!(!single.format.is_list());

        let many: Wrapper =
            toml::from_str(r#"format = ["dd.MM.yyyy", "yyyy-MM-dd"]"#).expect("many");
        assert!(many.format.is_list());
    }
}
