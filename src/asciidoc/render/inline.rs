//! Inline markup: formatting marks, UI macros, links, footnotes and index terms.

use crate::asciidoc::escape::{escape_brackets, escape_table_separators, needs_passthrough};
use crate::asciidoc::names::Handler;
use crate::dom::{NodeId, NodeKind, XLINK_NS};

use super::{Converter, Flow, SiblingCursor};

/// Formatting that collapses when single-child style elements nest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ChainStyle {
    Bold,
    Italic,
    Monospace,
}

fn delimiter(marker: char, doubled: bool) -> String {
    if doubled {
        format!("{marker}{marker}")
    } else {
        marker.to_string()
    }
}

/// Separators allowed between the parts of a bare menu path.
fn is_menu_separator(text: &str) -> bool {
    text.chars()
        .all(|c| c.is_whitespace() || matches!(c, '-' | '>' | '=' | '|' | ',' | '→' | '›' | '»'))
}

fn has_scheme(url: &str) -> bool {
    url.contains("://") || url.starts_with("mailto:")
}

impl<'a> Converter<'a> {
    // ------------------------------------------------------------------
    // Formatting marks
    // ------------------------------------------------------------------

    pub(super) fn visit_styled(&mut self, node: NodeId, marker: char) -> Flow {
        if let Some((styles, innermost)) = self.style_chain(node) {
            return self.write_chain(node, &styles, innermost);
        }
        let doubled = !matches!(marker, '^' | '~') && self.needs_doubling(node);
        self.write_styled("", marker, doubled, |this| this.walk_children(node));
        Flow::Done
    }

    pub(super) fn visit_emphasis(&mut self, node: NodeId) -> Flow {
        match self.dom.attr(node, "role").unwrap_or_default() {
            "bold" | "strong" => self.visit_styled(node, '*'),
            "underline" => self.visit_span(node, "underline"),
            "strikethrough" | "line-through" => self.visit_span(node, "line-through"),
            _ => self.visit_styled(node, '_'),
        }
    }

    pub(super) fn visit_phrase(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        match dom.attr(node, "role").filter(|role| !role.trim().is_empty()) {
            Some(role) => self.visit_span(node, role.trim()),
            None => Flow::Descend,
        }
    }

    /// `[.role]#text#`
    fn visit_span(&mut self, node: NodeId, role: &str) -> Flow {
        let doubled = self.needs_doubling(node);
        self.write_styled(&format!("[.{role}]"), '#', doubled, |this| {
            this.walk_children(node)
        });
        Flow::Done
    }

    pub(super) fn visit_literal(&mut self, node: NodeId) -> Flow {
        if let Some((styles, innermost)) = self.style_chain(node) {
            return self.write_chain(node, &styles, innermost);
        }
        let dom = self.dom;
        let marker = self.monospace_marker();
        let doubled = self.needs_doubling(node);

        let only_text = dom
            .children(node)
            .all(|child| dom.kind(child) == Some(NodeKind::Text));
        let text = dom.text_content(node);
        if only_text && needs_passthrough(&text) {
            self.begin_inline();
            let text = escape_table_separators(text.trim(), self.table_depth);
            let d = delimiter(marker, doubled);
            if self.config.compat_mode {
                self.out.append_text(&format!("`{text}`"));
            } else {
                self.out.append_text(&format!("{d}+{text}+{d}"));
            }
            return Flow::Done;
        }

        self.write_styled("", marker, doubled, |this| this.walk_children(node));
        Flow::Done
    }

    fn monospace_marker(&self) -> char {
        if self.config.compat_mode { '+' } else { '`' }
    }

    /// Write `prefix`, the opening delimiter, the body and the closing delimiter.
    fn write_styled(
        &mut self,
        prefix: &str,
        marker: char,
        doubled: bool,
        body: impl FnOnce(&mut Self),
    ) {
        self.begin_inline();
        let d = delimiter(marker, doubled);
        self.out.append_text(&format!("{prefix}{d}"));
        self.formatting.push(marker);
        body(self);
        self.formatting.pop();
        self.out.append_text(&d);
    }

    /// Whether constrained (single) markers would not be recognized here.
    pub(super) fn needs_doubling(&self, node: NodeId) -> bool {
        if !self.formatting.is_empty() || !self.out.ends_with_whitespace() {
            return true;
        }
        self.touches(self.dom.prev_sibling(node), true)
            || self.touches(self.dom.next_sibling(node), false)
    }

    /// Whether a neighbouring node abuts the styled text without whitespace.
    fn touches(&self, sibling: Option<NodeId>, before: bool) -> bool {
        let Some(sibling) = sibling else {
            return false;
        };
        let edge = |text: &str| {
            let c = if before {
                text.chars().next_back()
            } else {
                text.chars().next()
            };
            c.is_some_and(|c| !c.is_whitespace())
        };
        match self.dom.kind(sibling) {
            Some(NodeKind::Text) => self.dom.text(sibling).is_some_and(edge),
            Some(NodeKind::EntityRef) => true,
            Some(NodeKind::Element) if self.is_style_element(sibling) => {
                edge(&self.dom.text_content(sibling))
            }
            _ => false,
        }
    }

    fn is_style_element(&self, node: NodeId) -> bool {
        matches!(
            self.handler(node),
            Handler::Emphasis
                | Handler::Literal
                | Handler::Keyword
                | Handler::Path
                | Handler::Superscript
                | Handler::Subscript
        )
    }

    fn chain_style(&self, node: NodeId) -> Option<ChainStyle> {
        match self.handler(node) {
            Handler::Emphasis => match self.dom.attr(node, "role").unwrap_or_default() {
                "bold" | "strong" => Some(ChainStyle::Bold),
                "underline" | "strikethrough" | "line-through" => None,
                _ => Some(ChainStyle::Italic),
            },
            Handler::Keyword => Some(ChainStyle::Italic),
            Handler::Literal | Handler::Path => Some(ChainStyle::Monospace),
            _ => None,
        }
    }

    /// Follow a chain of style elements that each wrap exactly one child.
    ///
    /// Returns the distinct styles (bold, italic, monospace order) and the
    /// innermost element whose children carry the text.
    fn style_chain(&self, node: NodeId) -> Option<(Vec<ChainStyle>, NodeId)> {
        let mut styles = vec![self.chain_style(node)?];
        let mut current = node;
        loop {
            let mut children = self.dom.children(current);
            let (Some(only), None) = (children.next(), children.next()) else {
                break;
            };
            let Some(style) = self.chain_style(only) else {
                break;
            };
            styles.push(style);
            current = only;
        }
        if styles.len() < 2 {
            return None;
        }
        styles.sort();
        styles.dedup();
        Some((styles, current))
    }

    fn write_chain(&mut self, node: NodeId, styles: &[ChainStyle], innermost: NodeId) -> Flow {
        let doubled = self.needs_doubling(node);
        let markers: Vec<char> = styles
            .iter()
            .map(|style| match style {
                ChainStyle::Bold => '*',
                ChainStyle::Italic => '_',
                ChainStyle::Monospace => self.monospace_marker(),
            })
            .collect();
        let delimiters: Vec<String> = markers.iter().map(|&m| delimiter(m, doubled)).collect();

        self.begin_inline();
        self.out.append_text(&delimiters.concat());
        self.formatting.extend(&markers);
        self.walk_children(innermost);
        self.formatting.truncate(self.formatting.len() - markers.len());
        let closing: String = delimiters.iter().rev().map(String::as_str).collect();
        self.out.append_text(&closing);
        Flow::Done
    }

    pub(super) fn visit_quote(&mut self, node: NodeId) -> Flow {
        let (open, close) = if self.config.compat_mode {
            ("``", "''")
        } else {
            ("\"`", "`\"")
        };
        self.begin_inline();
        self.out.append_text(open);
        self.walk_children(node);
        self.out.append_text(close);
        Flow::Done
    }

    pub(super) fn visit_trademark(&mut self, node: NodeId) -> Flow {
        self.begin_inline();
        self.walk_children(node);
        let symbol = match self.dom.attr(node, "class") {
            Some("registered") => "(R)",
            Some("copyright") => "(C)",
            Some("service") => "^SM^",
            _ => "(TM)",
        };
        self.out.append_text(symbol);
        Flow::Done
    }

    // ------------------------------------------------------------------
    // User interface
    // ------------------------------------------------------------------

    pub(super) fn visit_ui(&mut self, node: NodeId, cursor: &mut SiblingCursor<'a>) -> Flow {
        match self.name(node) {
            "guibutton" => {
                let label = self.render_inline(node);
                self.begin_inline();
                self.out.append_text(&format!("btn:[{}]", escape_brackets(&label)));
            }
            "keycap" => {
                let key = self.render_inline(node);
                self.begin_inline();
                self.out.append_text(&format!("kbd:[{}]", escape_brackets(&key)));
            }
            "keycombo" => {
                let keys: Vec<String> = self
                    .dom
                    .element_children(node)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .map(|key| self.render_inline(key))
                    .collect();
                self.begin_inline();
                self.out
                    .append_text(&format!("kbd:[{}]", escape_brackets(&keys.join("+"))));
            }
            "menuchoice" => {
                let parts: Vec<NodeId> = self
                    .dom
                    .element_children(node)
                    .filter(|&part| !self.dom.is_named(part, "shortcut"))
                    .collect();
                let items: Vec<String> = parts
                    .into_iter()
                    .map(|part| self.render_inline(part))
                    .collect();
                self.write_menu(&items);
            }
            "guimenu" => {
                let mut items = vec![self.render_inline(node)];
                let mut ahead = cursor.clone();
                while let Some(next) = ahead.advance() {
                    if let Some(text) = self.dom.text(next) {
                        if is_menu_separator(text) {
                            continue;
                        }
                        break;
                    }
                    if self.dom.is_named(next, "guisubmenu") || self.dom.is_named(next, "guimenuitem") {
                        items.push(self.render_inline(next));
                        *cursor = ahead.clone();
                        continue;
                    }
                    break;
                }
                self.write_menu(&items);
            }
            _ => return self.visit_styled(node, '_'),
        }
        Flow::Done
    }

    fn write_menu(&mut self, items: &[String]) {
        self.begin_inline();
        let text = match items {
            [] => return,
            [top] => format!("menu:{top}[]"),
            [top, rest @ ..] => format!("menu:{top}[{}]", rest.join(" > ")),
        };
        self.out.append_text(&text);
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    /// Replace a URL prefix that matches a configured attribute with `{name}`.
    fn collapse_url(&self, url: &str) -> String {
        match self.config.attribute_for_url(url) {
            Some((name, value)) => format!("{{{name}}}{}", &url[value.len()..]),
            None => url.to_string(),
        }
    }

    /// Record a cross-reference target and return its output id.
    pub(super) fn record_reference(&mut self, target: &str) -> String {
        let id = self.ids.format_id(target.trim());
        self.used_ids.record(id.clone());
        id
    }

    pub(super) fn visit_xref(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        let Some(linkend) = dom.attr(node, "linkend") else {
            log::warn!("xref without linkend; skipping");
            return Flow::Done;
        };
        let id = self.record_reference(linkend);
        self.begin_inline();
        self.out.append_text(&format!("<<{id}>>"));
        Flow::Done
    }

    fn write_internal_link(&mut self, node: NodeId, target: &str) {
        let id = self.record_reference(target);
        let text = self.render_inline(node);
        self.begin_inline();
        if text.is_empty() {
            self.out.append_text(&format!("<<{id}>>"));
        } else {
            self.out.append_text(&format!("<<{id},{text}>>"));
        }
    }

    fn write_external_link(&mut self, url: &str, text: &str) {
        let target = self.collapse_url(url);
        let macro_target = if has_scheme(url) {
            target
        } else {
            format!("link:{target}")
        };
        self.begin_inline();
        if text.is_empty() || text == url {
            if has_scheme(url) {
                self.out.append_text(&macro_target);
            } else {
                self.out.append_text(&format!("{macro_target}[]"));
            }
        } else {
            self.out
                .append_text(&format!("{macro_target}[{}]", escape_brackets(text)));
        }
    }

    pub(super) fn visit_link(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        if let Some(linkend) = dom.attr(node, "linkend") {
            self.write_internal_link(node, linkend);
            return Flow::Done;
        }
        let url = dom
            .attr_ns(node, XLINK_NS, "href")
            .or_else(|| dom.attr(node, "href"))
            .or_else(|| dom.attr(node, "url"));
        let Some(url) = url.map(str::trim).filter(|url| !url.is_empty()) else {
            return Flow::Descend;
        };
        if let Some(fragment) = url.strip_prefix('#') {
            self.write_internal_link(node, fragment);
            return Flow::Done;
        }
        let text = self.render_inline(node);
        self.write_external_link(url, &text);
        Flow::Done
    }

    pub(super) fn visit_email(&mut self, node: NodeId) -> Flow {
        let address = self.dom.text_content(node).trim().to_string();
        if address.is_empty() {
            return Flow::Done;
        }
        self.begin_inline();
        self.out
            .append_text(&format!("mailto:{address}[{address}]"));
        Flow::Done
    }

    pub(super) fn visit_uri(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        let text = self.render_inline(node);
        let url = dom
            .attr_ns(node, XLINK_NS, "href")
            .map(str::to_string)
            .unwrap_or_else(|| text.clone());
        if url.is_empty() {
            return Flow::Done;
        }
        self.write_external_link(&url, &text);
        Flow::Done
    }

    // ------------------------------------------------------------------
    // Footnotes, anchors and index terms
    // ------------------------------------------------------------------

    pub(super) fn visit_footnote(&mut self, node: NodeId) -> Flow {
        let text = self.render_inline(node);
        let text = escape_brackets(&text);
        self.begin_inline();
        match self.element_id(node) {
            Some(id) => self.out.append_text(&format!("footnote:{id}[{text}]")),
            None => self.out.append_text(&format!("footnote:[{text}]")),
        }
        Flow::Done
    }

    pub(super) fn visit_footnoteref(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        if let Some(linkend) = dom.attr(node, "linkend") {
            let id = self.ids.format_id(linkend.trim());
            self.begin_inline();
            self.out.append_text(&format!("footnote:{id}[]"));
        }
        Flow::Done
    }

    pub(super) fn visit_anchor(&mut self, node: NodeId) -> Flow {
        let Some(id) = self.element_id(node) else {
            return Flow::Done;
        };
        if self.in_inline_context(node) {
            self.begin_inline();
            let anchor = self.anchor_markup(&id);
            self.out.append_text(&anchor);
        } else {
            self.out.append_blank_line();
            self.line(self.anchor_markup(&id));
            self.out.adjoin_next();
        }
        Flow::Done
    }

    /// `(((primary,secondary,tertiary)))`, or nothing for range ends.
    fn index_term(&self, node: NodeId) -> Option<String> {
        if self.dom.attr(node, "class") == Some("endofrange") {
            return None;
        }
        let terms: Vec<String> = ["primary", "secondary", "tertiary"]
            .iter()
            .filter_map(|name| self.dom.child(node, name))
            .map(|term| {
                let text = self.dom.text_content(term);
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if text.contains(',') {
                    format!("\"{text}\"")
                } else {
                    text
                }
            })
            .filter(|text| !text.is_empty())
            .collect();
        (!terms.is_empty()).then(|| format!("((({})))", terms.join(",")))
    }

    pub(super) fn visit_indexterm(&mut self, node: NodeId, cursor: &mut SiblingCursor<'a>) -> Flow {
        let term = self.index_term(node);
        if self.in_inline_context(node) {
            if let Some(term) = term {
                self.out.append_text(&term);
            }
            return Flow::Done;
        }

        // Consecutive terms between blocks share one line.
        let mut line = term.unwrap_or_default();
        let mut ahead = cursor.clone();
        while let Some(next) = ahead.advance() {
            if self.dom.is_whitespace_text(next) {
                continue;
            }
            if self.dom.is_named(next, "indexterm") {
                if let Some(term) = self.index_term(next) {
                    line.push_str(&term);
                }
                *cursor = ahead.clone();
                continue;
            }
            break;
        }
        if !line.is_empty() {
            self.standalone_line(line);
        }
        Flow::Done
    }
}
