//! Text normalization for AsciiDoc output.
//!
//! AsciiDoc applies replacements (`--` → em dash, `...` → ellipsis, `->` →
//! arrow, typographic quotes) and formatting to plain text. Converted prose
//! must come out the other side unchanged, so these helpers undo Unicode
//! typography, escape characters that would open formatting, and rewrap
//! whitespace.

use std::borrow::Cow;

use crate::config::Config;

/// Characters that can open or close a formatting span.
pub const STYLE_TRIGGERS: &[char] = &['_', '*', '+', '`', '#', '^', '~'];

/// Unicode characters AsciiDoc would generate from an ASCII replacement,
/// mapped back to that ASCII spelling.
const ENTITY_TABLE: &[(char, &str)] = &[
    ('\u{00a9}', "(C)"),
    ('\u{00ae}', "(R)"),
    ('\u{2009}', " "),
    ('\u{2014}', "--"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201c}', "\""),
    ('\u{201d}', "\""),
    ('\u{2026}', "..."),
    ('\u{2122}', "(TM)"),
    ('\u{2190}', "<-"),
    ('\u{2192}', "->"),
    ('\u{21d0}', "<="),
    ('\u{21d2}', "=>"),
];

/// How whitespace in flowing prose is rewrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapPolicy {
    /// Collapse all whitespace runs into single spaces.
    #[default]
    Collapse,
    /// Keep the source's line breaks, dropping indentation.
    PreserveLines,
    /// Collapse, then break after every sentence.
    SentencePerLine,
}

impl WrapPolicy {
    pub fn from_config(config: &Config) -> Self {
        if config.preserve_line_wrap {
            WrapPolicy::PreserveLines
        } else if config.sentence_per_line {
            WrapPolicy::SentencePerLine
        } else {
            WrapPolicy::Collapse
        }
    }
}

/// Replace typographic Unicode characters with their ASCII spellings.
///
/// # Examples
///
/// ```
/// use docbook_adoc::asciidoc::reverse_subs;
///
/// assert_eq!(reverse_subs("Wait\u{2026} \u{201c}ok\u{201d}"), "Wait... \"ok\"");
/// assert_eq!(reverse_subs("plain"), "plain");
/// ```
pub fn reverse_subs(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|c| ENTITY_TABLE.iter().any(|(u, _)| *u == c)) {
        return Cow::Borrowed(text);
    }
    let mut result = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match ENTITY_TABLE.iter().find(|(u, _)| *u == c) {
            Some((_, ascii)) => result.push_str(ascii),
            None => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Escape a style trigger at the start of `text` (after leading whitespace).
///
/// # Examples
///
/// ```
/// use docbook_adoc::asciidoc::escape_leading_style;
///
/// assert_eq!(escape_leading_style("*args"), "\\*args");
/// assert_eq!(escape_leading_style(" _init"), " \\_init");
/// assert_eq!(escape_leading_style("value"), "value");
/// ```
pub fn escape_leading_style(text: &str) -> Cow<'_, str> {
    let trimmed = text.trim_start();
    match trimmed.chars().next() {
        Some(c) if STYLE_TRIGGERS.contains(&c) => {
            let split = text.len() - trimmed.len();
            Cow::Owned(format!("{}\\{}", &text[..split], trimmed))
        }
        _ => Cow::Borrowed(text),
    }
}

/// Escape cell separators in text written `depth` tables deep.
///
/// Top-level tables split cells on `|` and nested tables on `!`. Content of a
/// nested table goes through the outer table's cell splitting first, so both
/// separators are escaped there.
///
/// # Examples
///
/// ```
/// use docbook_adoc::asciidoc::escape_table_separators;
///
/// assert_eq!(escape_table_separators("a|b!", 0), "a|b!");
/// assert_eq!(escape_table_separators("a|b!", 1), "a\\|b!");
/// assert_eq!(escape_table_separators("a|b!", 2), "a\\|b\\!");
/// ```
pub fn escape_table_separators(text: &str, depth: usize) -> Cow<'_, str> {
    let separators: &[char] = match depth {
        0 => return Cow::Borrowed(text),
        1 => &['|'],
        _ => &['|', '!'],
    };
    if !text.contains(separators) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        if separators.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

/// Escape closing brackets inside macro targets such as `footnote:[...]`.
pub fn escape_brackets(text: &str) -> Cow<'_, str> {
    if text.contains(']') {
        Cow::Owned(text.replace(']', "\\]"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Whether literal text must be wrapped in a `+...+` passthrough to survive
/// attribute and formatting substitution.
pub fn needs_passthrough(text: &str) -> bool {
    text.contains('{') || text.contains('`') || text.contains("++")
}

/// Rewrap a run of prose text.
///
/// `first` and `last` tell whether the run opens or closes its parent; edge
/// whitespace is dropped there and collapsed to one space elsewhere, since it
/// separates the run from neighbouring inline markup.
pub fn normalize_whitespace(text: &str, policy: WrapPolicy, first: bool, last: bool) -> String {
    let leading = text.len() - text.trim_start().len();
    let trailing = text.len() - text.trim_end().len();
    let core = text.trim();

    let mut result = String::with_capacity(text.len());
    if leading > 0 && !first {
        result.push(' ');
    }

    match policy {
        WrapPolicy::PreserveLines => {
            let mut first_line = true;
            for line in core.lines() {
                let line = collapse_spaces(line.trim());
                if line.is_empty() {
                    continue;
                }
                if !first_line {
                    result.push('\n');
                }
                result.push_str(&line);
                first_line = false;
            }
        }
        WrapPolicy::Collapse => result.push_str(&collapse_spaces(core)),
        WrapPolicy::SentencePerLine => result.push_str(&split_sentences(&collapse_spaces(core))),
    }

    if trailing > 0 && !last && !core.is_empty() {
        result.push(' ');
    }
    result
}

fn collapse_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Break collapsed prose after each sentence.
///
/// A sentence ends at `.`, `!` or `?` (optionally followed by a closing quote
/// or parenthesis) when the next word starts with an uppercase letter.
///
/// # Examples
///
/// ```
/// use docbook_adoc::asciidoc::split_sentences;
///
/// assert_eq!(split_sentences("One. Two! e.g. three"), "One.\nTwo! e.g. three");
/// ```
pub fn split_sentences(text: &str) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    let mut result = String::with_capacity(text.len());
    for (i, word) in words.iter().enumerate() {
        result.push_str(word);
        let Some(next) = words.get(i + 1) else {
            break;
        };
        let ends_sentence = word
            .trim_end_matches(['"', '\'', ')'])
            .ends_with(['.', '!', '?']);
        let starts_sentence = next.chars().next().is_some_and(char::is_uppercase);
        result.push(if ends_sentence && starts_sentence { '\n' } else { ' ' });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reverse_subs_dashes_and_arrows() {
        assert_eq!(reverse_subs("a\u{2014}b \u{2192} c"), "a--b -> c");
        assert_eq!(reverse_subs("\u{00a9} 2024 ACME\u{2122}"), "(C) 2024 ACME(TM)");
    }

    #[test]
    fn test_escape_leading_style_all_triggers() {
        for trigger in STYLE_TRIGGERS {
            let text = format!("{trigger}x");
            assert_eq!(escape_leading_style(&text), format!("\\{trigger}x"));
        }
    }

    #[test]
    fn test_escape_table_separators() {
        assert_eq!(escape_table_separators("a|b", 1), "a\\|b");
        assert_eq!(escape_table_separators("a|b!", 3), "a\\|b\\!");
        assert!(matches!(escape_table_separators("a!b", 1), Cow::Borrowed(_)));
    }

    #[test]
    fn test_normalize_collapse() {
        assert_eq!(
            normalize_whitespace("\n   Hello\n   world  ", WrapPolicy::Collapse, true, true),
            "Hello world"
        );
        assert_eq!(
            normalize_whitespace("  middle  ", WrapPolicy::Collapse, false, false),
            " middle "
        );
        assert_eq!(normalize_whitespace("   ", WrapPolicy::Collapse, false, false), " ");
    }

    #[test]
    fn test_normalize_preserve_lines() {
        assert_eq!(
            normalize_whitespace(
                "\n  First line\n     second  line\n",
                WrapPolicy::PreserveLines,
                true,
                true
            ),
            "First line\nsecond line"
        );
    }

    #[test]
    fn test_normalize_sentence_per_line() {
        assert_eq!(
            normalize_whitespace(
                "This is one.  This is\n two? Yes.",
                WrapPolicy::SentencePerLine,
                true,
                true
            ),
            "This is one.\nThis is two?\nYes."
        );
    }

    #[test]
    fn test_needs_passthrough() {
        assert!(needs_passthrough("{name}"));
        assert!(needs_passthrough("a`b"));
        assert!(!needs_passthrough("plain_name"));
    }

    proptest! {
        #[test]
        fn prop_collapsed_text_has_no_runs(s in "[ a-z\\n\\t]{0,40}") {
            let out = normalize_whitespace(&s, WrapPolicy::Collapse, true, true);
            prop_assert!(!out.contains("  "));
            prop_assert!(!out.contains('\n'));
            prop_assert_eq!(out.trim(), out.as_str());
        }

        #[test]
        fn prop_escaped_text_never_starts_with_trigger(s in "[_*+`#^~a-z ]{1,20}") {
            let out = escape_leading_style(&s);
            let first = out.trim_start().chars().next();
            prop_assert!(first.is_none_or(|c| !STYLE_TRIGGERS.contains(&c)));
        }
    }
}
