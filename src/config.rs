//! Conversion settings shared by a document and everything it includes.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Settings for one top-level conversion.
///
/// Included sub-documents inherit the same `Config` as their parent.
///
/// # Example
///
/// ```
/// use docbook_adoc::Config;
///
/// let config = Config::new()
///     .with_idprefix("")
///     .with_idseparator("-")
///     .with_attribute("docs-url", "https://docs.example.org");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix enforced on normalized ids and prepended to generated ids.
    pub idprefix: String,
    /// Word separator used in normalized and generated ids.
    pub idseparator: String,
    /// Lower-case ids and fold `_`/`-` to [`Config::idseparator`].
    pub normalize_ids: bool,
    /// Emit AsciiDoc compatibility-mode markup (`+mono+`, ``` ``quotes'' ```).
    pub compat_mode: bool,
    /// Put every sentence of flowing prose on its own line.
    pub sentence_per_line: bool,
    /// Keep the soft line wrapping of the source prose.
    pub preserve_line_wrap: bool,
    /// Always delimit source listings with `----`.
    pub delimit_source: bool,
    /// Document attributes written to the header. Values double as URL
    /// prefixes that links collapse into `{name}` references.
    pub attributes: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idprefix: "_".to_string(),
            idseparator: "_".to_string(),
            normalize_ids: false,
            compat_mode: false,
            sentence_per_line: false,
            preserve_line_wrap: false,
            delimit_source: true,
            attributes: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idprefix(mut self, prefix: impl Into<String>) -> Self {
        self.idprefix = prefix.into();
        self
    }

    pub fn with_idseparator(mut self, separator: impl Into<String>) -> Self {
        self.idseparator = separator.into();
        self
    }

    pub fn with_normalize_ids(mut self, normalize: bool) -> Self {
        self.normalize_ids = normalize;
        self
    }

    pub fn with_compat_mode(mut self, compat: bool) -> Self {
        self.compat_mode = compat;
        self
    }

    pub fn with_sentence_per_line(mut self, enabled: bool) -> Self {
        self.sentence_per_line = enabled;
        self
    }

    pub fn with_preserve_line_wrap(mut self, enabled: bool) -> Self {
        self.preserve_line_wrap = enabled;
        self
    }

    pub fn with_delimit_source(mut self, delimit: bool) -> Self {
        self.delimit_source = delimit;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Check settings that cannot be combined.
    pub fn validate(&self) -> Result<()> {
        if self.sentence_per_line && self.preserve_line_wrap {
            return Err(Error::InvalidConfig(
                "sentence_per_line and preserve_line_wrap are mutually exclusive".to_string(),
            ));
        }
        if self.idseparator.chars().count() > 1 {
            return Err(Error::InvalidConfig(format!(
                "idseparator must be a single character, got {:?}",
                self.idseparator
            )));
        }
        Ok(())
    }

    /// Find the attribute whose value is the longest prefix of `url`.
    pub fn attribute_for_url(&self, url: &str) -> Option<(&str, &str)> {
        self.attributes
            .iter()
            .filter(|(_, value)| !value.is_empty() && url.starts_with(value.as_str()))
            .max_by_key(|(_, value)| value.len())
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_asciidoctor() {
        let config = Config::default();
        assert_eq!(config.idprefix, "_");
        assert_eq!(config.idseparator, "_");
        assert!(config.delimit_source);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_wrap_modes_are_exclusive() {
        let config = Config::new()
            .with_sentence_per_line(true)
            .with_preserve_line_wrap(true);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_multi_char_separator_rejected() {
        let config = Config::new().with_idseparator("--");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_attribute_for_url_prefers_longest() {
        let config = Config::new()
            .with_attribute("site", "https://example.org")
            .with_attribute("docs", "https://example.org/docs");
        assert_eq!(
            config.attribute_for_url("https://example.org/docs/intro.html"),
            Some(("docs", "https://example.org/docs"))
        );
        assert_eq!(
            config.attribute_for_url("https://example.org/blog"),
            Some(("site", "https://example.org"))
        );
        assert_eq!(config.attribute_for_url("https://other.net"), None);
    }
}
