//! DocBook tree → AsciiDoc lines.
//!
//! [`Converter`] walks the DOM depth-first in a single pass. Each node is
//! classified into a [`Handler`], lifecycle hooks run around it (conditional
//! markers, list depth, table nesting) and the handler either renders the
//! node completely or asks the walker to descend into its children.
//!
//! Output goes to a [`LineBuffer`]; whole-document cleanups (anchor pruning,
//! blank-line collapsing) are left to the caller once every document of an
//! inclusion tree has been walked.

mod blocks;
mod inline;
mod listing;
mod lists;
mod table;

use crate::config::Config;
use crate::dom::{NodeId, NodeKind, XINCLUDE_NS, XmlDom};
use crate::util::output_path;

use super::escape::{
    WrapPolicy, escape_leading_style, escape_table_separators, normalize_whitespace, reverse_subs,
};
use super::ids::{IdResolver, UsedIds};
use super::lines::LineBuffer;
use super::names::{self, Handler};

pub use listing::{DiffLine, EditKind, reconstruct_diff};

/// Resolves XInclude directives while a document is walked.
pub trait IncludeResolver {
    /// Convert the document at `href` and return the line that includes it.
    ///
    /// `leveloffset` is the heading offset the included document needs.
    fn resolve(&mut self, href: &str, leveloffset: usize) -> String;
}

/// The `include::` directive for an already converted target.
pub fn include_directive(target: &str, leveloffset: usize) -> String {
    if leveloffset == 0 {
        format!("include::{target}[]")
    } else {
        format!("include::{target}[leveloffset=+{leveloffset}]")
    }
}

/// What the walker does after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Walk the element's children next.
    Descend,
    /// The handler rendered the element completely.
    Done,
}

/// Forward-only cursor over the children of one parent.
///
/// Handlers that render a run of siblings as one construct advance the cursor
/// past the siblings they consumed; the walker never sees them.
#[derive(Debug, Clone)]
pub(crate) struct SiblingCursor<'d> {
    dom: &'d XmlDom,
    next: Option<NodeId>,
}

impl<'d> SiblingCursor<'d> {
    pub fn children(dom: &'d XmlDom, parent: NodeId) -> Self {
        Self {
            dom,
            next: dom.children(parent).next(),
        }
    }

    pub fn after(dom: &'d XmlDom, node: NodeId) -> Self {
        Self {
            dom,
            next: dom.next_sibling(node),
        }
    }

    pub fn peek(&self) -> Option<NodeId> {
        self.next
    }

    pub fn advance(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.next_sibling(current);
        Some(current)
    }
}

/// Whether a line holds nothing but a list marker such as `** ` or `<2> `.
fn is_bare_marker(line: &str) -> bool {
    let marker = line.trim();
    !marker.is_empty()
        && marker
            .chars()
            .all(|c| matches!(c, '*' | '.' | '<' | '>') || c.is_ascii_digit())
}

/// Single-document DocBook → AsciiDoc converter.
pub struct Converter<'a> {
    dom: &'a XmlDom,
    config: &'a Config,
    ids: IdResolver,
    wrap: WrapPolicy,
    used_ids: UsedIds,
    includes: Option<&'a mut dyn IncludeResolver>,
    out: LineBuffer,
    /// Heading depth; `=` repeated `level` times.
    level: usize,
    list_depth: usize,
    dlist_depth: usize,
    table_depth: usize,
    /// Markers of the inline styles currently open.
    formatting: Vec<char>,
    /// Set after a list or table; stray text that follows starts a new paragraph.
    last_added_was_special: bool,
}

impl<'a> Converter<'a> {
    pub fn new(dom: &'a XmlDom, config: &'a Config, used_ids: UsedIds) -> Self {
        Self {
            dom,
            config,
            ids: IdResolver::from_config(config),
            wrap: WrapPolicy::from_config(config),
            used_ids,
            includes: None,
            out: LineBuffer::new(),
            level: 1,
            list_depth: 0,
            dlist_depth: 0,
            table_depth: 0,
            formatting: Vec::new(),
            last_added_was_special: false,
        }
    }

    /// Route XInclude directives through `includes`.
    ///
    /// Without a resolver, includes are emitted as directives pointing at the
    /// target's output path and nothing is converted.
    pub fn with_includes(mut self, includes: &'a mut dyn IncludeResolver) -> Self {
        self.includes = Some(includes);
        self
    }

    /// Walk the whole document and return the raw output lines.
    pub fn convert(mut self) -> Vec<String> {
        if let Some(root) = self.dom.root() {
            let mut cursor = SiblingCursor::after(self.dom, root);
            self.visit(root, &mut cursor);
        }
        self.out.into_lines()
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    fn visit(&mut self, node: NodeId, cursor: &mut SiblingCursor<'a>) {
        match self.dom.kind(node) {
            Some(NodeKind::Element) => self.visit_element(node, cursor),
            Some(NodeKind::Text) => self.visit_text(node),
            Some(NodeKind::EntityRef) => self.visit_entity(node),
            Some(NodeKind::Comment) => self.visit_comment(node),
            Some(NodeKind::ProcessingInstruction) => self.visit_processing_instruction(node),
            Some(NodeKind::Document) | None => {}
        }
    }

    fn visit_element(&mut self, node: NodeId, cursor: &mut SiblingCursor<'a>) {
        let handler = self.handler(node);
        log::trace!("<{}> -> {:?}", self.dom.name(node).unwrap_or_default(), handler);

        if !handler.is_block()
            && !matches!(handler, Handler::Info | Handler::Title | Handler::Callout)
            && let Some(condition) = self.condition(node)
        {
            self.visit_conditional_inline(node, handler, &condition, cursor);
            return;
        }

        let condition = self.before(node, handler);
        if self.dispatch(node, handler, cursor) == Flow::Descend {
            self.walk_children(node);
        }
        self.after(node, handler, condition);
    }

    fn handler(&self, node: NodeId) -> Handler {
        let Some(qname) = self.dom.qual_name(node) else {
            return Handler::Default;
        };
        if qname.local == "include"
            && (qname.ns.as_deref() == Some(XINCLUDE_NS) || qname.prefix.as_deref() == Some("xi"))
        {
            return Handler::Include;
        }
        names::handler_for(&qname.local)
    }

    fn dispatch(&mut self, node: NodeId, handler: Handler, cursor: &mut SiblingCursor<'a>) -> Flow {
        match handler {
            Handler::Document => self.visit_document(node),
            Handler::Info | Handler::Title | Handler::Callout => Flow::Done,
            Handler::Section => self.visit_section(node, None),
            Handler::SpecialSection => {
                let kind = self.name(node);
                self.visit_section(node, Some(kind))
            }
            Handler::Part => self.visit_part(node),
            Handler::Bridgehead => self.visit_bridgehead(node),
            Handler::Para => self.visit_para(node),
            Handler::FormalPara => self.visit_formalpara(node),
            Handler::Admonition => self.visit_admonition(node),
            Handler::Example => self.visit_delimited(node, "===="),
            Handler::Sidebar => self.visit_delimited(node, "****"),
            Handler::BlockQuote => self.visit_blockquote(node),
            Handler::Figure => self.visit_figure(node),
            Handler::MediaObject => self.visit_mediaobject(node),
            Handler::InlineMediaObject => self.visit_inline_mediaobject(node),
            Handler::ProgramListing | Handler::Screen | Handler::LiteralLayout => {
                self.visit_listing(node, handler)
            }
            Handler::ItemizedList | Handler::OrderedList | Handler::StepAlternatives => {
                self.visit_list(node, handler)
            }
            Handler::VariableList => self.visit_variablelist(node),
            Handler::SimpleList => self.visit_simplelist(node),
            Handler::CalloutList => self.visit_calloutlist(node),
            Handler::QandaSet | Handler::QandaDiv => self.visit_qanda(node),
            Handler::GlossList => Flow::Descend,
            Handler::GlossEntry => self.visit_glossentry(node),
            Handler::BiblioEntry => self.visit_biblioentry(node),
            Handler::Remark => self.visit_remark(node),
            Handler::Table => self.visit_table(node),
            Handler::Literal | Handler::Path => self.visit_literal(node),
            Handler::Keyword => self.visit_styled(node, '_'),
            Handler::Emphasis => self.visit_emphasis(node),
            Handler::Superscript => self.visit_styled(node, '^'),
            Handler::Subscript => self.visit_styled(node, '~'),
            Handler::Quote => self.visit_quote(node),
            Handler::Phrase => self.visit_phrase(node),
            Handler::Trademark => self.visit_trademark(node),
            Handler::Ui => self.visit_ui(node, cursor),
            Handler::Xref => self.visit_xref(node),
            Handler::Link => self.visit_link(node),
            Handler::Email => self.visit_email(node),
            Handler::Uri => self.visit_uri(node),
            Handler::Footnote => self.visit_footnote(node),
            Handler::FootnoteRef => self.visit_footnoteref(node),
            Handler::Anchor => self.visit_anchor(node),
            Handler::IndexTerm => self.visit_indexterm(node, cursor),
            Handler::Include => self.visit_include(node),
            Handler::Plain | Handler::Passthrough => Flow::Descend,
            Handler::Default => self.visit_default(node),
        }
    }

    pub(crate) fn walk_children(&mut self, parent: NodeId) {
        let mut cursor = SiblingCursor::children(self.dom, parent);
        while let Some(child) = cursor.advance() {
            self.visit(child, &mut cursor);
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle hooks
    // ------------------------------------------------------------------

    fn before(&mut self, node: NodeId, handler: Handler) -> Option<String> {
        if handler.is_block() {
            self.last_added_was_special = false;
        }
        match handler {
            h if h.is_list() => self.list_depth += 1,
            Handler::VariableList => self.dlist_depth += 1,
            Handler::Table => self.table_depth += 1,
            _ => {}
        }
        self.open_condition(node, handler)
    }

    fn after(&mut self, node: NodeId, handler: Handler, condition: Option<String>) {
        match handler {
            h if h.is_list() => self.list_depth = self.list_depth.saturating_sub(1),
            Handler::VariableList => self.dlist_depth = self.dlist_depth.saturating_sub(1),
            Handler::Table => self.table_depth = self.table_depth.saturating_sub(1),
            _ => {}
        }
        if handler.is_list()
            || matches!(
                handler,
                Handler::VariableList | Handler::Table | Handler::CalloutList
            )
        {
            self.last_added_was_special = true;
        }
        self.close_condition(node, condition);
    }

    /// Joined condition values of an element, e.g. `linux,mac`.
    fn condition(&self, node: NodeId) -> Option<String> {
        let values: Vec<&str> = ["condition", "audience", "arch", "os"]
            .iter()
            .filter_map(|attr| self.dom.attr(node, attr))
            .flat_map(|value| value.split(';'))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .collect();
        (!values.is_empty()).then(|| values.join(","))
    }

    fn open_condition(&mut self, node: NodeId, handler: Handler) -> Option<String> {
        if !handler.is_block() {
            return None;
        }
        let condition = self.condition(node)?;
        self.out.append_blank_line();
        self.line(format!("ifdef::{condition}[]"));
        self.out.adjoin_next();
        Some(condition)
    }

    fn close_condition(&mut self, node: NodeId, condition: Option<String>) {
        let Some(condition) = condition else {
            return;
        };
        self.line(format!("endif::{condition}[]"));
        let next_is_conditional = self
            .dom
            .next_element(node)
            .is_some_and(|next| self.condition(next).is_some());
        if next_is_conditional {
            self.out.adjoin_next();
        } else {
            self.out.append_blank_line();
        }
    }

    /// Conditional inline content as a single-line `ifdef::cond[text]`.
    ///
    /// Preprocessor directives are only recognized at the start of a line,
    /// so the directive gets a line of its own; the paragraph around it
    /// still reads as one run of text.
    fn visit_conditional_inline(
        &mut self,
        node: NodeId,
        handler: Handler,
        condition: &str,
        cursor: &mut SiblingCursor<'a>,
    ) {
        let saved_wrap = std::mem::replace(&mut self.wrap, WrapPolicy::Collapse);
        let lines = self.capture(|this| {
            this.out.append_line("");
            if this.dispatch(node, handler, cursor) == Flow::Descend {
                this.walk_children(node);
            }
        });
        self.wrap = saved_wrap;

        let text = lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return;
        }
        self.begin_inline();
        if self.out.last().is_some_and(is_bare_marker) {
            self.out.append_text("{empty}");
        }
        if !self.out.current_line_is_empty() {
            self.out.append_text("\n");
        }
        self.out.append_text(&format!("ifdef::{condition}[{text}]"));
        self.out.append_text("\n");
    }

    // ------------------------------------------------------------------
    // Non-element nodes
    // ------------------------------------------------------------------

    fn visit_text(&mut self, node: NodeId) {
        let Some(raw) = self.dom.text(node) else {
            return;
        };
        let prev = self.dom.prev_sibling(node);
        let next = self.dom.next_sibling(node);

        if raw.trim().is_empty() {
            if self.is_inline_node(prev)
                && self.is_inline_node(next)
                && !self.out.ends_with_whitespace()
            {
                self.out.append_text(" ");
            }
            return;
        }

        let first = !self.is_inline_node(prev);
        let last = !self.is_inline_node(next);
        let mut text = normalize_whitespace(&reverse_subs(raw), self.wrap, first, last);

        self.begin_inline();
        if text.starts_with(' ') && self.out.ends_with_whitespace() {
            text.remove(0);
        }
        if self.table_depth > 0 {
            text = escape_table_separators(&text, self.table_depth).into_owned();
        }
        if !self.formatting.is_empty() {
            text = escape_leading_style(&text).into_owned();
        }
        self.out.append_text(&text);
    }

    fn visit_entity(&mut self, node: NodeId) {
        let dom = self.dom;
        let Some(name) = dom.name(node) else {
            return;
        };
        self.begin_inline();
        match names::entity_replacement(name) {
            Some(replacement) => self.out.append_text(replacement),
            None => self.out.append_text(&format!("{{{name}}}")),
        }
    }

    fn visit_comment(&mut self, node: NodeId) {
        let dom = self.dom;
        let Some(text) = dom.comment(node) else {
            return;
        };
        let text = text.trim();
        if text.is_empty() || self.in_inline_context(node) {
            return;
        }
        self.out.append_blank_line();
        if text.contains('\n') {
            self.line("////");
            for line in text.lines() {
                self.line(line.trim_end());
            }
            self.line("////");
        } else {
            self.line(format!("// {text}"));
        }
    }

    fn visit_processing_instruction(&mut self, node: NodeId) {
        let dom = self.dom;
        let Some((target, _)) = dom.processing_instruction(node) else {
            return;
        };
        match target {
            "asciidoc-br" => {
                self.out.append_text(" +");
                self.out.append_line("");
            }
            "asciidoc-hr" => self.standalone_line("'''"),
            "asciidoc-pagebreak" => self.standalone_line("<<<"),
            other => log::debug!("ignoring processing instruction <?{other}?>"),
        }
    }

    fn visit_include(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        let Some(href) = dom.attr(node, "href") else {
            log::warn!("XInclude without href; skipping");
            return Flow::Done;
        };
        let directive = if self.dom.attr(node, "parse") == Some("text") {
            format!("include::{href}[]")
        } else {
            let offset = self.level.saturating_sub(1);
            match self.includes.as_deref_mut() {
                Some(resolver) => resolver.resolve(href, offset),
                None => {
                    let target = output_path(std::path::Path::new(href));
                    include_directive(&target.to_string_lossy(), offset)
                }
            }
        };
        self.standalone_line(directive);
        Flow::Done
    }

    fn visit_default(&mut self, node: NodeId) -> Flow {
        let name = self
            .dom
            .qual_name(node)
            .map(|q| q.qualified())
            .unwrap_or_default();
        log::warn!("no conversion for <{name}>; keeping it as a comment block");
        self.out.append_blank_line();
        self.line("////");
        for line in self.dom.serialize(node).lines() {
            self.line(line);
        }
        self.line("////");
        Flow::Done
    }

    // ------------------------------------------------------------------
    // Helpers shared by the renderers
    // ------------------------------------------------------------------

    /// Local name of an element, borrowed from the source tree.
    fn name(&self, node: NodeId) -> &'a str {
        let dom: &'a XmlDom = self.dom;
        dom.name(node).unwrap_or_default()
    }

    /// Start a new output line.
    fn line(&mut self, line: impl Into<String>) {
        self.last_added_was_special = false;
        self.out.append_line(line);
    }

    /// A block that is a single line, separated by blank lines.
    fn standalone_line(&mut self, line: impl Into<String>) {
        self.out.append_blank_line();
        self.line(line);
        self.out.append_blank_line();
    }

    /// Called before inline content is written.
    fn begin_inline(&mut self) {
        if self.last_added_was_special {
            self.out.append_blank_line();
            self.line("");
        }
    }

    /// Whether a node participates in flowing text.
    fn is_inline_node(&self, node: Option<NodeId>) -> bool {
        let Some(node) = node else {
            return false;
        };
        match self.dom.kind(node) {
            Some(NodeKind::Element) => !self.handler(node).is_block(),
            Some(_) => true,
            None => false,
        }
    }

    /// Whether a node sits inside flowing prose rather than between blocks.
    fn in_inline_context(&self, node: NodeId) -> bool {
        self.dom
            .parent_name(node)
            .is_some_and(names::is_inline_container)
    }

    /// Render the children of `node` as a single line of inline markup.
    fn render_inline(&mut self, node: NodeId) -> String {
        let saved_wrap = std::mem::replace(&mut self.wrap, WrapPolicy::Collapse);
        let lines = self.capture(|this| {
            this.out.append_line("");
            this.walk_children(node);
        });
        self.wrap = saved_wrap;
        lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run `f` against a fresh line buffer and return what it wrote.
    fn capture(&mut self, f: impl FnOnce(&mut Self)) -> Vec<String> {
        let saved_out = std::mem::take(&mut self.out);
        let saved_special = std::mem::replace(&mut self.last_added_was_special, false);
        f(self);
        let captured = std::mem::replace(&mut self.out, saved_out);
        self.last_added_was_special = saved_special;
        captured.into_lines()
    }

    /// The `title` of an element, looked up directly or in its info block.
    fn title_node(&self, node: NodeId) -> Option<NodeId> {
        self.info_child(node, "title")
    }

    fn info_child(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.dom.child(node, name).or_else(|| {
            self.dom
                .element_children(node)
                .find(|&child| self.handler(child) == Handler::Info)
                .and_then(|info| self.dom.child(info, name))
        })
    }

    fn title_text(&mut self, node: NodeId) -> Option<String> {
        let title = self.title_node(node)?;
        let text = self.render_inline(title);
        (!text.is_empty()).then_some(text)
    }

    /// The element's id, normalized when configured.
    fn element_id(&self, node: NodeId) -> Option<String> {
        self.ids.resolve_id(self.dom, node, self.ids.normalizes())
    }

    /// `[[id]]` markup; only anchors written this way are ever pruned.
    fn anchor_markup(&self, id: &str) -> String {
        self.used_ids.record_anchor(id);
        format!("[[{id}]]")
    }

    fn write_anchor_line(&mut self, node: NodeId) {
        if let Some(id) = self.element_id(node) {
            self.line(self.anchor_markup(&id));
        }
    }

    fn write_block_title(&mut self, node: NodeId) {
        if let Some(title) = self.title_text(node) {
            self.line(format!(".{title}"));
        }
    }

    /// Open a delimited block; its first child attaches directly.
    fn open_delimiter(&mut self, delimiter: &str) {
        self.line(delimiter);
        self.out.adjoin_next();
    }
}

#[cfg(test)]
mod tests;
