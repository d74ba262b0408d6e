//! Verbatim blocks: program listings, screens and literal layouts.
//!
//! Listings that carry edit markup (`<ins>`, `<del>` or an edit role on
//! `emphasis`/`phrase`) are rebuilt as a line-oriented diff.

use std::fmt;

use crate::asciidoc::escape::escape_table_separators;
use crate::asciidoc::names::{self, DELETION_ROLES, Handler, INSERTION_ROLES};
use crate::dom::{NodeId, NodeKind};

use super::{Converter, Flow};

/// Edit state of a run of listing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Unmodified,
    Inserted,
    Deleted,
}

impl EditKind {
    fn prefix(self) -> char {
        match self {
            EditKind::Unmodified => ' ',
            EditKind::Inserted => '+',
            EditKind::Deleted => '-',
        }
    }
}

/// One line of a reconstructed diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: EditKind,
    pub text: String,
}

impl DiffLine {
    fn new(kind: EditKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.text)
    }
}

/// Rebuild a diff from edit-tracked runs of text.
///
/// The text is cut into hunks at every newline inside unmodified text (and
/// after an edit that ends a line). An untouched hunk becomes one context
/// line; an edited hunk becomes its old lines followed by its new lines,
/// skipping a side that is empty.
///
/// # Examples
///
/// ```
/// use docbook_adoc::asciidoc::{EditKind, reconstruct_diff};
///
/// let diff = reconstruct_diff(&[
///     (EditKind::Unmodified, "let x = ".to_string()),
///     (EditKind::Deleted, "1".to_string()),
///     (EditKind::Inserted, "2".to_string()),
///     (EditKind::Unmodified, ";\n".to_string()),
/// ]);
/// let lines: Vec<String> = diff.iter().map(ToString::to_string).collect();
/// assert_eq!(lines, ["-let x = 1;", "+let x = 2;"]);
/// ```
pub fn reconstruct_diff(segments: &[(EditKind, String)]) -> Vec<DiffLine> {
    let mut hunks: Vec<Vec<(EditKind, &str)>> = vec![Vec::new()];
    for (kind, text) in segments {
        if *kind != EditKind::Unmodified {
            if let Some(hunk) = hunks.last_mut() {
                hunk.push((*kind, text.as_str()));
            }
            if text.ends_with('\n') {
                hunks.push(Vec::new());
            }
            continue;
        }
        let mut rest = text.as_str();
        while let Some(nl) = rest.find('\n') {
            let (head, tail) = rest.split_at(nl + 1);
            if let Some(hunk) = hunks.last_mut() {
                hunk.push((EditKind::Unmodified, head));
            }
            hunks.push(Vec::new());
            rest = tail;
        }
        if !rest.is_empty()
            && let Some(hunk) = hunks.last_mut()
        {
            hunk.push((EditKind::Unmodified, rest));
        }
    }

    let mut lines = Vec::new();
    for hunk in hunks.iter().filter(|hunk| !hunk.is_empty()) {
        if hunk.iter().all(|(kind, _)| *kind == EditKind::Unmodified) {
            let text: String = hunk.iter().map(|(_, text)| *text).collect();
            lines.push(DiffLine::new(EditKind::Unmodified, text.trim_end_matches('\n')));
            continue;
        }
        let side = |skip: EditKind| -> String {
            hunk.iter()
                .filter(|(kind, _)| *kind != skip)
                .map(|(_, text)| *text)
                .collect()
        };
        for (kind, text) in [
            (EditKind::Deleted, side(EditKind::Inserted)),
            (EditKind::Inserted, side(EditKind::Deleted)),
        ] {
            let text = text.trim_matches('\n');
            if text.trim().is_empty() {
                continue;
            }
            lines.extend(text.split('\n').map(|line| DiffLine::new(kind, line)));
        }
    }

    let blank_context =
        |line: &DiffLine| line.kind == EditKind::Unmodified && line.text.trim().is_empty();
    let start = lines.iter().position(|l| !blank_context(l)).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !blank_context(l)).map_or(start, |i| i + 1);
    lines.drain(start..end).collect()
}

/// Text collected from a verbatim element, split into edit runs.
#[derive(Debug, Default)]
struct VerbatimText {
    segments: Vec<(EditKind, String)>,
    callouts: usize,
    attribute_refs: bool,
}

impl VerbatimText {
    fn push(&mut self, kind: EditKind, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some((last, run)) if *last == kind => run.push_str(text),
            _ => self.segments.push((kind, text.to_string())),
        }
    }

    fn ends_with_whitespace(&self) -> bool {
        self.segments
            .last()
            .and_then(|(_, run)| run.chars().next_back())
            .is_none_or(char::is_whitespace)
    }

    fn ends_line(&self) -> bool {
        self.segments
            .last()
            .is_none_or(|(_, run)| run.ends_with('\n'))
    }

    fn text(&self) -> String {
        self.segments.iter().map(|(_, run)| run.as_str()).collect()
    }
}

impl<'a> Converter<'a> {
    pub(super) fn visit_listing(&mut self, node: NodeId, handler: Handler) -> Flow {
        let dom = self.dom;
        self.out.append_blank_line();
        self.write_anchor_line(node);
        self.write_block_title(node);

        let mut verbatim = VerbatimText::default();
        self.collect_verbatim(node, EditKind::Unmodified, &mut verbatim);

        if verbatim.segments.iter().any(|(kind, _)| *kind != EditKind::Unmodified) {
            self.line("[source,diff]");
            self.line("----");
            for line in reconstruct_diff(&verbatim.segments) {
                let line = line.to_string();
                self.line(escape_table_separators(&line, self.table_depth));
            }
            self.line("----");
            return Flow::Done;
        }

        let text = verbatim.text();
        let content = trim_verbatim(&text);

        let mut attributes: Vec<String> = Vec::new();
        if handler == Handler::ProgramListing {
            let language = dom
                .attr(node, "language")
                .map(str::trim)
                .filter(|l| !l.is_empty());
            let numbered = dom.attr(node, "linenumbering") == Some("numbered");
            match (language, numbered) {
                (Some(language), true) => attributes.push(format!("source,{language},linenums")),
                (Some(language), false) => attributes.push(format!("source,{language}")),
                (None, true) => attributes.push("source%linenums".to_string()),
                (None, false) => {}
            }
        }
        if verbatim.attribute_refs {
            attributes.push("subs=\"attributes+\"".to_string());
        }
        let style = (!attributes.is_empty()).then(|| format!("[{}]", attributes.join(",")));

        let undelimited = handler == Handler::ProgramListing
            && !self.config.delimit_source
            && style.is_some()
            && !content.is_empty()
            && !content.lines().any(|line| line.trim().is_empty());
        let delimiter = match handler {
            Handler::LiteralLayout => "....",
            _ => "----",
        };

        if let Some(style) = style {
            self.line(style);
        }
        if !undelimited {
            self.line(delimiter);
        }
        let depth = self.table_depth;
        for line in content.lines() {
            self.line(escape_table_separators(line, depth));
        }
        if !undelimited {
            self.line(delimiter);
        }
        Flow::Done
    }

    /// Verbatim text of an element and whether it references document attributes.
    pub(super) fn listing_text(&self, node: NodeId) -> (String, bool) {
        let mut verbatim = VerbatimText::default();
        self.collect_verbatim(node, EditKind::Unmodified, &mut verbatim);
        (trim_verbatim(&verbatim.text()).to_string(), verbatim.attribute_refs)
    }

    fn collect_verbatim(&self, parent: NodeId, kind: EditKind, acc: &mut VerbatimText) {
        let dom = self.dom;
        for child in dom.children(parent) {
            match dom.kind(child) {
                Some(NodeKind::Text) => acc.push(kind, dom.text(child).unwrap_or_default()),
                Some(NodeKind::EntityRef) => {
                    let name = dom.name(child).unwrap_or_default();
                    match names::entity_replacement(name) {
                        Some(replacement) => {
                            acc.attribute_refs |= replacement.starts_with('{');
                            acc.push(kind, replacement);
                        }
                        None => {
                            acc.attribute_refs = true;
                            acc.push(kind, &format!("{{{name}}}"));
                        }
                    }
                }
                Some(NodeKind::Element) => match self.handler(child) {
                    Handler::Callout => {
                        acc.callouts += 1;
                        let marker = if acc.ends_with_whitespace() {
                            format!("<{}>", acc.callouts)
                        } else {
                            format!(" <{}>", acc.callouts)
                        };
                        acc.push(kind, &marker);
                    }
                    Handler::Include if dom.attr(child, "parse") == Some("text") => {
                        if !acc.ends_line() {
                            acc.push(kind, "\n");
                        }
                        let href = dom.attr(child, "href").unwrap_or_default();
                        acc.push(kind, &format!("include::{href}[]\n"));
                    }
                    _ => {
                        let kind = self.edit_kind(child).unwrap_or(kind);
                        self.collect_verbatim(child, kind, acc);
                    }
                },
                _ => {}
            }
        }
    }

    fn edit_kind(&self, node: NodeId) -> Option<EditKind> {
        match self.name(node) {
            "ins" => Some(EditKind::Inserted),
            "del" => Some(EditKind::Deleted),
            "emphasis" | "phrase" => {
                let role = self.dom.attr(node, "role")?.trim();
                if INSERTION_ROLES.contains(&role) {
                    Some(EditKind::Inserted)
                } else if DELETION_ROLES.contains(&role) {
                    Some(EditKind::Deleted)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Drop leading blank lines and trailing whitespace.
fn trim_verbatim(text: &str) -> &str {
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }
    text[start..].trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(kind: EditKind, text: &str) -> (EditKind, String) {
        (kind, text.to_string())
    }

    fn render(lines: &[DiffLine]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_diff_context_and_replacement() {
        let diff = reconstruct_diff(&[
            run(EditKind::Unmodified, "fn main() {\n    "),
            run(EditKind::Deleted, "old();"),
            run(EditKind::Inserted, "new();"),
            run(EditKind::Unmodified, "\n}\n"),
        ]);
        assert_eq!(
            render(&diff),
            [" fn main() {", "-    old();", "+    new();", " }"]
        );
    }

    #[test]
    fn test_diff_whole_line_insertion_omits_empty_side() {
        let diff = reconstruct_diff(&[
            run(EditKind::Unmodified, "a\n"),
            run(EditKind::Inserted, "b\n"),
            run(EditKind::Unmodified, "c\n"),
        ]);
        assert_eq!(render(&diff), [" a", "+b", " c"]);
    }

    #[test]
    fn test_diff_trims_blank_context_at_edges() {
        let diff = reconstruct_diff(&[
            run(EditKind::Unmodified, "\n\nx\n"),
            run(EditKind::Deleted, "y"),
            run(EditKind::Unmodified, "\n\n"),
        ]);
        assert_eq!(render(&diff), [" x", "-y"]);
    }

    #[test]
    fn test_trim_verbatim() {
        assert_eq!(trim_verbatim("\n  \n  indented\nline  \n\n"), "  indented\nline");
        assert_eq!(trim_verbatim(""), "");
    }
}
