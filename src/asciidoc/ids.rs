//! Anchor identifiers: resolution, generation and dead-anchor pruning.
//!
//! Asciidoctor derives an id for every section from its title. An explicit
//! anchor is only needed when the source id differs from that derived id, and
//! only useful when something links to it. Links are recorded in a
//! [`UsedIds`] set shared by every document of an inclusion tree; anchors no
//! link points at are removed by [`prune_anchors`] once the whole tree has
//! been walked.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::dom::{NodeId, XmlDom};

use super::lines::VerbatimTracker;

/// Runs of non-word characters and entity references, replaced by the separator.
static ILLEGAL_ID_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:&(?:[[:alpha:]]+|#[[:digit:]]+|#x[[:xdigit:]]+);|\W)+").expect("valid regex")
});

/// A line consisting of nothing but an anchor.
static ANCHOR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\[([\p{Alpha}_:][\w:.-]*)(?:,[^\]]*)?\]\]$").expect("valid regex")
});

/// An inline anchor; ids follow Asciidoctor's anchor id syntax.
static INLINE_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([\p{Alpha}_:][\w:.-]*)\]\]").expect("valid regex"));

#[derive(Debug, Default)]
struct IdSets {
    referenced: BTreeSet<String>,
    anchors: BTreeSet<String>,
}

/// Ids targeted by cross-references, and ids the converter wrote anchors
/// for, shared across an inclusion tree.
///
/// Clones share the same underlying sets, so recording through any handle is
/// visible to all of them.
#[derive(Debug, Clone, Default)]
pub struct UsedIds(Rc<RefCell<IdSets>>);

impl UsedIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cross-reference target.
    pub fn record(&self, id: impl Into<String>) {
        self.0.borrow_mut().referenced.insert(id.into());
    }

    /// Whether some cross-reference targets `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.0.borrow().referenced.contains(id)
    }

    /// Record an anchor written by the converter.
    pub fn record_anchor(&self, id: impl Into<String>) {
        self.0.borrow_mut().anchors.insert(id.into());
    }

    /// Whether the converter wrote an anchor for `id`.
    pub fn is_anchor(&self, id: &str) -> bool {
        self.0.borrow().anchors.contains(id)
    }

    /// Whether an anchor for `id` can be dropped.
    fn is_dead_anchor(&self, id: &str) -> bool {
        let sets = self.0.borrow();
        sets.anchors.contains(id) && !sets.referenced.contains(id)
    }

    /// Union `other` into this set. Idempotent and order-independent.
    pub fn merge(&self, other: &UsedIds) {
        if Rc::ptr_eq(&self.0, &other.0) {
            return;
        }
        let (referenced, anchors) = {
            let theirs = other.0.borrow();
            (theirs.referenced.clone(), theirs.anchors.clone())
        };
        let mut ours = self.0.borrow_mut();
        ours.referenced.extend(referenced);
        ours.anchors.extend(anchors);
    }

    /// Number of referenced ids.
    pub fn len(&self) -> usize {
        self.0.borrow().referenced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().referenced.is_empty()
    }

    /// Copy of the referenced ids.
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.0.borrow().referenced.clone()
    }
}

/// Id resolution and generation rules for one conversion.
#[derive(Debug, Clone)]
pub struct IdResolver {
    prefix: String,
    separator: String,
    normalize: bool,
}

impl IdResolver {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>, normalize: bool) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            normalize,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.idprefix, &config.idseparator, config.normalize_ids)
    }

    /// Whether ids are normalized by default for this conversion.
    pub fn normalizes(&self) -> bool {
        self.normalize
    }

    fn fold(&self, text: &str) -> String {
        text.to_lowercase()
            .chars()
            .map(|c| match c {
                '_' | '-' => self.separator.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    /// Lower-case an id, fold `_`/`-` to the separator and enforce the prefix.
    ///
    /// The prefix is kept exactly as configured, the way Asciidoctor writes it
    /// in front of generated ids. Normalizing an already-normalized id returns
    /// it unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use docbook_adoc::asciidoc::IdResolver;
    ///
    /// let ids = IdResolver::new("_", "-", true);
    /// assert_eq!(ids.normalize_id("Custom_ID"), "_custom-id");
    /// assert_eq!(ids.normalize_id("Custom_ID"), ids.generate_id("Custom ID"));
    /// ```
    pub fn normalize_id(&self, id: &str) -> String {
        let body = id.strip_prefix(self.prefix.as_str()).unwrap_or(id);
        format!("{}{}", self.prefix, self.fold(body))
    }

    /// Apply the configured normalization to an id read from the source.
    pub fn format_id(&self, id: &str) -> String {
        if self.normalize {
            self.normalize_id(id)
        } else {
            id.to_string()
        }
    }

    /// Read the `id` (or `xml:id`) of an element.
    pub fn resolve_id(&self, dom: &XmlDom, node: NodeId, normalize: bool) -> Option<String> {
        let id = dom.attr(node, "id")?.trim();
        if id.is_empty() {
            return None;
        }
        Some(if normalize {
            self.normalize_id(id)
        } else {
            id.to_string()
        })
    }

    /// Derive the id Asciidoctor would give a section with this title.
    ///
    /// # Examples
    ///
    /// ```
    /// use docbook_adoc::asciidoc::IdResolver;
    ///
    /// let ids = IdResolver::new("_", "_", false);
    /// assert_eq!(ids.generate_id("Getting Started"), "_getting_started");
    ///
    /// let bare = IdResolver::new("", "-", false);
    /// assert_eq!(bare.generate_id("  What's new?"), "what-s-new");
    /// ```
    pub fn generate_id(&self, title: &str) -> String {
        let sep = self.separator.as_str();
        let lower = title.to_lowercase();
        let replaced = ILLEGAL_ID_CHARS.replace_all(&lower, sep);
        let mut id = format!("{}{}", self.prefix, replaced);

        if let Some(sep_char) = sep.chars().next() {
            id = squeeze(&id, sep_char);
            while id.ends_with(sep_char) && id.len() > self.prefix.len() {
                id.pop();
            }
            if self.prefix.is_empty() {
                id = id.trim_start_matches(sep_char).to_string();
            }
        }
        id
    }
}

fn squeeze(text: &str, c: char) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_c = false;
    for ch in text.chars() {
        if ch == c && prev_was_c {
            continue;
        }
        prev_was_c = ch == c;
        result.push(ch);
    }
    result
}

/// Remove anchors the converter wrote that no cross-reference uses.
///
/// Text that merely looks like an anchor (`x[[1]]` in a code span) is never
/// touched. Whole-line anchors (`[[id]]`) are deleted; inline anchors are cut out of
/// their line. Bibliography anchors (`[[[id]]]`) and verbatim block content
/// are left alone.
pub fn prune_anchors(lines: Vec<String>, used: &UsedIds) -> Vec<String> {
    let mut tracker = VerbatimTracker::default();
    let mut result = Vec::with_capacity(lines.len());
    let mut pruned = 0usize;

    for line in lines {
        if tracker.observe(&line) {
            result.push(line);
            continue;
        }
        if let Some(caps) = ANCHOR_LINE.captures(&line)
            && used.is_dead_anchor(&caps[1])
        {
            pruned += 1;
            continue;
        }
        if line.contains("[[") {
            let (kept, removed) = prune_inline_anchors(&line, used);
            pruned += removed;
            result.push(kept);
        } else {
            result.push(line);
        }
    }

    if pruned > 0 {
        log::debug!("pruned {pruned} unreferenced anchor(s)");
    }
    result
}

fn prune_inline_anchors(line: &str, used: &UsedIds) -> (String, usize) {
    let mut kept = String::with_capacity(line.len());
    let mut last = 0;
    let mut removed = 0;
    for caps in INLINE_ANCHOR.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let bibliography = line[..whole.start()].ends_with('[') || line[whole.end()..].starts_with(']');
        if bibliography || !used.is_dead_anchor(&caps[1]) {
            continue;
        }
        kept.push_str(&line[last..whole.start()]);
        last = whole.end();
        removed += 1;
    }
    kept.push_str(&line[last..]);
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_id() {
        let ids = IdResolver::new("_", "_", true);
        assert_eq!(ids.normalize_id("Custom-ID"), "_custom_id");
        assert_eq!(ids.normalize_id("_custom_id"), "_custom_id");

        let dashed = IdResolver::new("", "-", true);
        assert_eq!(dashed.normalize_id("My_Section"), "my-section");
    }

    #[test]
    fn test_generate_id_entities_and_punctuation() {
        let ids = IdResolver::new("_", "_", false);
        assert_eq!(ids.generate_id("Tom &amp; Jerry"), "_tom_jerry");
        assert_eq!(ids.generate_id("C++ -- the basics!"), "_c_the_basics");
        assert_eq!(ids.generate_id("Über Straße"), "_über_straße");
    }

    #[test]
    fn test_generate_id_without_prefix_strips_leading_separator() {
        let ids = IdResolver::new("", "_", false);
        assert_eq!(ids.generate_id("...Getting Started"), "getting_started");
    }

    #[test]
    fn test_used_ids_clones_share_state() {
        let parent = UsedIds::new();
        let child = parent.clone();
        child.record("intro");
        assert!(parent.contains("intro"));
    }

    #[test]
    fn test_used_ids_merge_is_union() {
        let a = UsedIds::new();
        let b = UsedIds::new();
        a.record("x");
        b.record("y");
        a.merge(&b);
        a.merge(&b);
        a.merge(&a.clone());
        assert_eq!(a.snapshot().into_iter().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_prune_anchor_lines() {
        let used = UsedIds::new();
        used.record("kept");
        used.record_anchor("kept");
        used.record_anchor("dropped");
        let out = prune_anchors(
            lines(&["[[kept]]", "== One", "[[dropped]]", "== Two", "[[kept,Label]]"]),
            &used,
        );
        assert_eq!(out, lines(&["[[kept]]", "== One", "== Two", "[[kept,Label]]"]));
    }

    #[test]
    fn test_prune_inline_anchors_and_keep_bibliography() {
        let used = UsedIds::new();
        used.record_anchor("p1");
        used.record_anchor("code");
        let out = prune_anchors(
            lines(&["[[p1]]Some text", "* [[[bib1]]] Book", "----", "[[code]]", "----"]),
            &used,
        );
        assert_eq!(
            out,
            lines(&["Some text", "* [[[bib1]]] Book", "----", "[[code]]", "----"])
        );
    }

    #[test]
    fn test_prune_leaves_anchor_lookalikes() {
        let used = UsedIds::new();
        used.record_anchor("p1");
        let out = prune_anchors(
            lines(&["Use `x[[1]]` to index.", "m[[key]] and [[p1]]here", "[[other]]"]),
            &used,
        );
        assert_eq!(
            out,
            lines(&["Use `x[[1]]` to index.", "m[[key]] and here", "[[other]]"])
        );
    }

    #[test]
    fn test_normalized_id_matches_generated_id() {
        let ids = IdResolver::new("_", "-", true);
        assert_eq!(ids.normalize_id("Getting_Started"), "_getting-started");
        assert_eq!(
            ids.normalize_id("Getting_Started"),
            ids.generate_id("Getting Started")
        );
        assert_eq!(ids.normalize_id("_getting-started"), "_getting-started");
    }

    proptest! {
        #[test]
        fn prop_normalize_id_is_idempotent(
            id in "[A-Za-z0-9_-]{1,16}",
            prefix in "(|_|id-|X_)",
            sep in "(_|-|\\.)",
        ) {
            let ids = IdResolver::new(prefix, sep, true);
            let once = ids.normalize_id(&id);
            prop_assert_eq!(ids.normalize_id(&once), once);
        }

        #[test]
        fn prop_generated_ids_have_no_trailing_separator(title in "[A-Za-z !?.,]{1,30}") {
            let ids = IdResolver::new("_", "_", false);
            let id = ids.generate_id(&title);
            prop_assert!(id == "_" || !id.ends_with('_'));
            prop_assert!(!id.contains("__"));
        }
    }
}
