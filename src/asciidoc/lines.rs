//! Ordered output lines with last-line concatenation.
//!
//! The walker only ever appends a line, appends a blank line, or extends the
//! last line. Nothing looks further back than the last line while a document
//! is being walked; whole-buffer cleanups run afterwards in [`tidy_lines`].

use memchr::memchr_iter;

/// One-shot suppression of the next blank line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pending {
    #[default]
    None,
    /// A `+` continuation line was just written; the next block attaches to it.
    Continuation,
    /// A title, role or directive line was just written and must stay glued
    /// to what follows.
    Adjoin,
}

/// Output line buffer for one document.
#[derive(Debug, Default)]
pub struct LineBuffer {
    lines: Vec<String>,
    pending: Pending,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new line.
    pub fn append_line(&mut self, line: impl Into<String>) {
        self.pending = Pending::None;
        self.push_multiline(&line.into());
    }

    /// Separate blocks with a blank line.
    ///
    /// Consumes a pending [`Pending::Continuation`] or [`Pending::Adjoin`]
    /// instead of writing. Never writes a leading blank line or two blank
    /// lines in a row.
    pub fn append_blank_line(&mut self) {
        match std::mem::take(&mut self.pending) {
            Pending::Continuation | Pending::Adjoin => {}
            Pending::None => {
                if self.lines.last().is_some_and(|last| !last.is_empty()) {
                    self.lines.push(String::new());
                }
            }
        }
    }

    /// Extend the last line. Embedded newlines start new lines.
    pub fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.pending = Pending::None;
        let mut start = 0;
        for nl in memchr_iter(b'\n', text.as_bytes()) {
            self.extend_last(&text[start..nl]);
            self.lines.push(String::new());
            start = nl + 1;
        }
        self.extend_last(&text[start..]);
    }

    fn extend_last(&mut self, segment: &str) {
        match self.lines.last_mut() {
            Some(last) => last.push_str(segment),
            None => self.lines.push(segment.to_string()),
        }
    }

    fn push_multiline(&mut self, line: &str) {
        if line.contains('\n') {
            self.lines.extend(line.split('\n').map(str::to_string));
        } else {
            self.lines.push(line.to_string());
        }
    }

    /// Mark that a `+` continuation already separates the next block.
    pub fn set_continuation(&mut self) {
        self.pending = Pending::Continuation;
    }

    /// Keep the next block glued to the line just written.
    pub fn adjoin_next(&mut self) {
        self.pending = Pending::Adjoin;
    }

    pub fn pending(&self) -> Pending {
        self.pending
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Whether the last line has no content yet.
    pub fn current_line_is_empty(&self) -> bool {
        self.last().is_none_or(str::is_empty)
    }

    /// Whether the last line ends in whitespace (or is empty).
    pub fn ends_with_whitespace(&self) -> bool {
        self.last()
            .and_then(|line| line.chars().next_back())
            .is_none_or(char::is_whitespace)
    }

    /// Drop the last line if nothing was written to it.
    pub fn discard_empty_last(&mut self) {
        if self.lines.last().is_some_and(|l| l.is_empty()) {
            self.lines.pop();
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Delimiters whose content is emitted verbatim.
pub(crate) const VERBATIM_DELIMITERS: &[&str] = &["----", "....", "++++", "////"];

/// Tracks whether a line sits inside a verbatim delimited block.
#[derive(Debug, Default)]
pub(crate) struct VerbatimTracker {
    open: Option<String>,
}

impl VerbatimTracker {
    /// Feed the next line; returns true when the line is verbatim content.
    pub fn observe(&mut self, line: &str) -> bool {
        match &self.open {
            Some(delimiter) if line == delimiter => {
                self.open = None;
                false
            }
            Some(_) => true,
            None => {
                if VERBATIM_DELIMITERS.contains(&line) {
                    self.open = Some(line.to_string());
                }
                false
            }
        }
    }
}

/// Line-level cleanup run once a document has been walked and pruned.
///
/// Strips trailing whitespace, collapses repeated blank lines outside verbatim
/// blocks and trims blank lines from both ends.
pub fn tidy_lines(lines: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(lines.len());
    let mut tracker = VerbatimTracker::default();

    for line in lines {
        let line = line.trim_end().to_string();
        let verbatim = tracker.observe(&line);
        if !verbatim && line.is_empty() && result.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        result.push(line);
    }

    while result.last().is_some_and(|l| l.is_empty()) {
        result.pop();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_text_extends_last_line() {
        let mut buf = LineBuffer::new();
        buf.append_line("== Title");
        buf.append_text(" more");
        assert_eq!(buf.last(), Some("== Title more"));
    }

    #[test]
    fn test_append_text_splits_newlines() {
        let mut buf = LineBuffer::new();
        buf.append_line("first");
        buf.append_text(" one.\nSecond one.");
        assert_eq!(buf.into_lines(), vec!["first one.", "Second one."]);
    }

    #[test]
    fn test_blank_line_never_leads_or_repeats() {
        let mut buf = LineBuffer::new();
        buf.append_blank_line();
        assert!(buf.is_empty());
        buf.append_line("text");
        buf.append_blank_line();
        buf.append_blank_line();
        assert_eq!(buf.into_lines(), vec!["text", ""]);
    }

    #[test]
    fn test_continuation_suppresses_once() {
        let mut buf = LineBuffer::new();
        buf.append_line("* item");
        buf.append_line("+");
        buf.set_continuation();
        buf.append_blank_line();
        assert_eq!(buf.pending(), Pending::None);
        buf.append_line("----");
        buf.append_blank_line();
        assert_eq!(buf.into_lines(), vec!["* item", "+", "----", ""]);
    }

    #[test]
    fn test_other_writes_clear_pending() {
        let mut buf = LineBuffer::new();
        buf.append_line(".Title");
        buf.adjoin_next();
        buf.append_line("[source]");
        buf.append_blank_line();
        assert_eq!(buf.into_lines(), vec![".Title", "[source]", ""]);
    }

    #[test]
    fn test_ends_with_whitespace() {
        let mut buf = LineBuffer::new();
        assert!(buf.ends_with_whitespace());
        buf.append_line("* ");
        assert!(buf.ends_with_whitespace());
        buf.append_text("word");
        assert!(!buf.ends_with_whitespace());
    }

    #[test]
    fn test_tidy_lines_keeps_verbatim_blank_lines() {
        let lines = ["", "text  ", "", "", "----", "a", "", "", "b", "----", "", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            tidy_lines(lines),
            vec!["text", "", "----", "a", "", "", "b", "----"]
        );
    }
}
