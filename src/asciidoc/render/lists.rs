//! Itemized, ordered, labeled, simple and callout lists.

use crate::asciidoc::names::Handler;
use crate::dom::{NodeId, NodeKind};

use super::{Converter, Flow, SiblingCursor};

/// How the first line of a list item body starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ItemStart {
    /// Continue the marker line, e.g. `* ` or `<1> `.
    Marker(String),
    /// Start on a fresh line below a term.
    NewLine,
}

impl<'a> Converter<'a> {
    pub(super) fn visit_list(&mut self, node: NodeId, handler: Handler) -> Flow {
        let dom = self.dom;
        let depth = self.list_depth.max(1);
        let marker = match handler {
            Handler::OrderedList => ".".repeat(depth),
            Handler::StepAlternatives => "a.".to_string(),
            _ => "*".repeat(depth),
        };

        if depth == 1 {
            self.out.append_blank_line();
        }
        self.write_anchor_line(node);
        self.write_block_title(node);
        if handler == Handler::OrderedList {
            let mut attributes = Vec::new();
            if let Some(numeration) = dom.attr(node, "numeration").filter(|n| *n != "arabic") {
                attributes.push(numeration.to_string());
            }
            if let Some(start) = dom
                .attr(node, "startingnumber")
                .and_then(|n| n.trim().parse::<i64>().ok())
                .filter(|&n| n != 1)
            {
                attributes.push(format!("start={start}"));
            }
            if !attributes.is_empty() {
                self.line(format!("[{}]", attributes.join(",")));
            }
        }

        for child in dom.element_children(node).collect::<Vec<_>>() {
            match self.name(child) {
                "listitem" | "step" => self.list_item(child, &marker),
                _ if matches!(self.handler(child), Handler::Title | Handler::Info) => {}
                _ => {
                    let mut cursor = SiblingCursor::after(dom, child);
                    self.visit(child, &mut cursor);
                }
            }
        }
        Flow::Done
    }

    fn list_item(&mut self, item: NodeId, marker: &str) {
        let condition = self.condition(item);
        if let Some(condition) = &condition {
            self.line(format!("ifdef::{condition}[]"));
        }
        let anchor = self
            .element_id(item)
            .map(|id| self.anchor_markup(&id))
            .unwrap_or_default();
        self.item_body(item, ItemStart::Marker(format!("{marker} {anchor}")));
        if let Some(condition) = condition {
            self.line(format!("endif::{condition}[]"));
        }
    }

    /// Leading children that never open an item.
    fn is_ignorable(&self, node: NodeId) -> bool {
        match self.dom.kind(node) {
            Some(NodeKind::Element) => matches!(self.handler(node), Handler::Title | Handler::Info),
            Some(NodeKind::Comment) => true,
            Some(NodeKind::Text) => self.dom.is_whitespace_text(node),
            _ => false,
        }
    }

    /// Render the children of a list item, glossary definition or answer.
    ///
    /// A leading paragraph or inline run shares the item's first line. Every
    /// later block is attached with a `+` continuation, except nested lists,
    /// which attach by themselves.
    pub(super) fn item_body(&mut self, item: NodeId, start: ItemStart) {
        let dom = self.dom;
        let mut cursor = SiblingCursor::children(dom, item);
        while cursor.peek().is_some_and(|next| self.is_ignorable(next)) {
            cursor.advance();
        }

        let open = |this: &mut Self| match &start {
            ItemStart::Marker(prefix) => this.line(prefix.clone()),
            ItemStart::NewLine => this.line(""),
        };

        let mut after_block = true;
        match cursor.peek() {
            Some(first) if dom.is_element(first) && self.handler(first) == Handler::Para => {
                cursor.advance();
                open(self);
                self.para_inline(first);
            }
            Some(first) if self.is_inline_node(Some(first)) => {
                open(self);
                while let Some(next) = cursor.peek() {
                    if !self.is_inline_node(Some(next)) {
                        break;
                    }
                    cursor.advance();
                    self.visit(next, &mut cursor);
                }
            }
            _ => {
                if let ItemStart::Marker(prefix) = &start {
                    self.line(format!("{prefix}{{empty}}"));
                }
            }
        }

        while let Some(child) = cursor.advance() {
            match dom.kind(child) {
                Some(NodeKind::Element) if self.handler(child).is_block() => {
                    let handler = self.handler(child);
                    if !(handler.is_list() || handler == Handler::VariableList) {
                        self.line("+");
                        self.out.set_continuation();
                    }
                    self.visit(child, &mut cursor);
                    after_block = true;
                }
                Some(NodeKind::Text) if after_block && dom.is_whitespace_text(child) => {}
                Some(NodeKind::Comment) => {}
                _ => {
                    if after_block {
                        self.line("+");
                        self.line("");
                        after_block = false;
                    }
                    self.visit(child, &mut cursor);
                }
            }
        }
    }

    pub(super) fn visit_variablelist(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        if self.list_depth == 0 && self.dlist_depth == 1 {
            self.out.append_blank_line();
        }
        self.write_anchor_line(node);
        self.write_block_title(node);
        let delimiter = ":".repeat(self.dlist_depth + 1);

        for entry in dom.element_children(node).collect::<Vec<_>>() {
            if !dom.is_named(entry, "varlistentry") {
                if !matches!(self.handler(entry), Handler::Title | Handler::Info) {
                    let mut cursor = SiblingCursor::after(dom, entry);
                    self.visit(entry, &mut cursor);
                }
                continue;
            }

            let condition = self.condition(entry);
            if let Some(condition) = &condition {
                self.line(format!("ifdef::{condition}[]"));
            }
            let terms: Vec<NodeId> = dom
                .element_children(entry)
                .filter(|&child| dom.is_named(child, "term"))
                .collect();
            for (index, term) in terms.into_iter().enumerate() {
                let anchor = match index {
                    0 => self
                        .element_id(entry)
                        .map(|id| self.anchor_markup(&id))
                        .unwrap_or_default(),
                    _ => String::new(),
                };
                let text = self.render_inline(term);
                self.line(format!("{anchor}{text}{delimiter}"));
            }
            if let Some(item) = dom.child(entry, "listitem") {
                self.item_body(item, ItemStart::NewLine);
            }
            if let Some(condition) = condition {
                self.line(format!("endif::{condition}[]"));
            }
        }
        Flow::Done
    }

    pub(super) fn visit_simplelist(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        let members: Vec<String> = dom
            .element_children(node)
            .filter(|&child| dom.is_named(child, "member"))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|member| self.render_inline(member))
            .filter(|member| !member.is_empty())
            .collect();
        let text = members.join(", ");

        if self.in_inline_context(node) {
            self.begin_inline();
            self.out.append_text(&text);
        } else if !text.is_empty() {
            self.out.append_blank_line();
            self.write_anchor_line(node);
            self.line(text);
        }
        Flow::Done
    }

    pub(super) fn visit_calloutlist(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        if self.list_depth == 0 {
            self.out.append_blank_line();
        }
        self.write_anchor_line(node);
        self.write_block_title(node);

        let callouts: Vec<NodeId> = dom
            .element_children(node)
            .filter(|&child| dom.is_named(child, "callout"))
            .collect();
        for (index, callout) in callouts.into_iter().enumerate() {
            self.item_body(callout, ItemStart::Marker(format!("<{}> ", index + 1)));
        }
        Flow::Done
    }
}
