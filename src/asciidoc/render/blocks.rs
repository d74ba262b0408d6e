//! Document header, sections and block-level constructs.

use crate::asciidoc::escape::reverse_subs;
use crate::asciidoc::names::Handler;
use crate::dom::NodeId;

use super::lists::ItemStart;
use super::{Converter, Flow, SiblingCursor};

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Quote a positional block attribute value that contains a comma.
fn quote_attribute(value: &str) -> String {
    if value.contains(',') {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// AsciiDoc section style for a special DocBook section.
fn section_style(kind: &str) -> &str {
    match kind {
        "acknowledgements" => "acknowledgments",
        other => other,
    }
}

/// An image reference resolved from a media object.
struct ImageRef {
    target: String,
    alt: String,
    width: Option<String>,
}

impl ImageRef {
    fn attributes(&self) -> String {
        let alt = quote_attribute(&self.alt);
        match &self.width {
            Some(width) if alt.is_empty() => format!("width={width}"),
            Some(width) => format!("{alt},width={width}"),
            None => alt,
        }
    }
}

impl<'a> Converter<'a> {
    // ------------------------------------------------------------------
    // Document header
    // ------------------------------------------------------------------

    pub(super) fn visit_document(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        if dom.parent(node) != Some(dom.document()) {
            return self.visit_section(node, None);
        }

        let title = self
            .section_title(node)
            .unwrap_or_else(|| "Untitled".to_string());
        self.line(format!("= {title}"));

        let authors = self.authors(node);
        let (revnumber, revdate) = self.revision(node);
        if !authors.is_empty() {
            self.line(authors.join("; "));
            let revision = match (&revnumber, &revdate) {
                (Some(number), Some(date)) => Some(format!("v{number}, {date}")),
                (Some(number), None) => Some(format!("v{number}")),
                (None, Some(date)) => Some(date.clone()),
                (None, None) => None,
            };
            if let Some(revision) = revision {
                self.line(revision);
            }
        } else {
            if let Some(number) = &revnumber {
                self.line(format!(":revnumber: {number}"));
            }
            if let Some(date) = &revdate {
                self.line(format!(":revdate: {date}"));
            }
        }

        if self.name(node) == "book" {
            self.line(":doctype: book");
        }
        self.line(":experimental:");
        if self.config.idprefix != "_" {
            self.line(format!(":idprefix: {}", self.config.idprefix));
        }
        if self.config.idseparator != "_" {
            self.line(format!(":idseparator: {}", self.config.idseparator));
        }
        if self.config.compat_mode {
            self.line(":compat-mode:");
        }
        if let Some(keywordset) = self.info_child(node, "keywordset") {
            let keywords: Vec<String> = dom
                .element_children(keywordset)
                .map(|keyword| collapse(&dom.text_content(keyword)))
                .filter(|keyword| !keyword.is_empty())
                .collect();
            if !keywords.is_empty() {
                self.line(format!(":keywords: {}", keywords.join(", ")));
            }
        }
        if let Some(info) = self.info_node(node)
            && let Some(abstract_node) = dom.child(info, "abstract")
        {
            let description = collapse(&reverse_subs(&dom.text_content(abstract_node)));
            if !description.is_empty() {
                self.line(format!(":description: {description}"));
            }
        }
        let config = self.config;
        for (name, value) in &config.attributes {
            self.line(format!(":{name}: {value}").trim_end().to_string());
        }
        self.out.append_blank_line();

        self.level += 1;
        self.walk_children(node);
        self.level -= 1;
        Flow::Done
    }

    fn info_node(&self, node: NodeId) -> Option<NodeId> {
        self.dom
            .element_children(node)
            .find(|&child| self.handler(child) == Handler::Info)
    }

    /// Author line entries: `First Last <email>`.
    fn authors(&self, node: NodeId) -> Vec<String> {
        let dom = self.dom;
        let Some(info) = self.info_node(node) else {
            return Vec::new();
        };
        let mut authors: Vec<NodeId> = dom
            .element_children(info)
            .filter(|&child| dom.is_named(child, "author"))
            .collect();
        if let Some(group) = dom.child(info, "authorgroup") {
            authors.extend(
                dom.element_children(group)
                    .filter(|&child| dom.is_named(child, "author")),
            );
        }

        authors
            .into_iter()
            .filter_map(|author| {
                let person = dom.child(author, "personname").unwrap_or(author);
                let parts: Vec<String> = ["honorific", "firstname", "othername", "surname", "lineage"]
                    .iter()
                    .filter_map(|part| dom.child(person, part))
                    .map(|part| collapse(&dom.text_content(part)))
                    .collect();
                let name = if parts.is_empty() {
                    collapse(&dom.text_content(person))
                } else {
                    parts.join(" ")
                };
                if name.is_empty() {
                    return None;
                }
                let email = dom
                    .child(author, "email")
                    .or_else(|| dom.child_path(author, &["address", "email"]))
                    .map(|email| collapse(&dom.text_content(email)));
                Some(match email {
                    Some(email) => format!("{name} <{email}>"),
                    None => name,
                })
            })
            .collect()
    }

    /// Revision number and date from the first revision, falling back to the publication date.
    fn revision(&self, node: NodeId) -> (Option<String>, Option<String>) {
        let dom = self.dom;
        let Some(info) = self.info_node(node) else {
            return (None, None);
        };
        let text = |node: Option<NodeId>| {
            node.map(|n| collapse(&dom.text_content(n)))
                .filter(|text| !text.is_empty())
        };
        let revision = dom.child_path(info, &["revhistory", "revision"]);
        let number = text(revision.and_then(|r| dom.child(r, "revnumber")))
            .map(|n| n.trim_start_matches(['v', 'V']).to_string());
        let date = text(revision.and_then(|r| dom.child(r, "date")))
            .or_else(|| text(dom.child(info, "pubdate")))
            .or_else(|| text(dom.child(info, "date")));
        (number, date)
    }

    // ------------------------------------------------------------------
    // Sections
    // ------------------------------------------------------------------

    /// Title text, with a subtitle appended after a colon.
    fn section_title(&mut self, node: NodeId) -> Option<String> {
        let title = self.title_text(node)?;
        match self.info_child(node, "subtitle") {
            Some(subtitle) => {
                let subtitle = self.render_inline(subtitle);
                if subtitle.is_empty() {
                    Some(title)
                } else {
                    Some(format!("{title}: {subtitle}"))
                }
            }
            None => Some(title),
        }
    }

    /// Plain title text Asciidoctor would derive a section id from.
    fn plain_title(&self, node: NodeId) -> String {
        let mut title = self
            .title_node(node)
            .map(|t| self.dom.text_content(t))
            .unwrap_or_default();
        if let Some(subtitle) = self.info_child(node, "subtitle") {
            title.push_str(": ");
            title.push_str(&self.dom.text_content(subtitle));
        }
        collapse(&title)
    }

    /// Anchor line for a heading, only when its id differs from the generated one.
    fn write_heading_anchor(&mut self, node: NodeId) {
        let Some(id) = self.element_id(node) else {
            return;
        };
        if id != self.ids.generate_id(&self.plain_title(node)) {
            self.line(self.anchor_markup(&id));
        }
    }

    pub(super) fn visit_section(&mut self, node: NodeId, special: Option<&str>) -> Flow {
        let title = self.section_title(node).unwrap_or_else(|| match special {
            Some(kind) => capitalize(section_style(kind)),
            None => "Untitled".to_string(),
        });
        let toggle_numbering = special.is_some_and(|kind| kind != "appendix")
            && self.config.attributes.contains_key("sectnums");

        self.out.append_blank_line();
        if toggle_numbering {
            self.line(":sectnums!:");
        }
        if let Some(kind) = special {
            self.line(format!("[{}]", section_style(kind)));
        }
        self.write_heading_anchor(node);
        self.line(format!("{} {title}", "=".repeat(self.level.max(1))));

        self.level += 1;
        if special != Some("index") {
            self.walk_children(node);
        }
        self.level -= 1;

        if toggle_numbering {
            self.out.append_blank_line();
            self.line(":sectnums:");
        }
        Flow::Done
    }

    /// Parts sit one level above their chapters and do not deepen them.
    pub(super) fn visit_part(&mut self, node: NodeId) -> Flow {
        let title = self
            .section_title(node)
            .unwrap_or_else(|| "Part".to_string());
        self.out.append_blank_line();
        self.write_heading_anchor(node);
        let depth = self.level.saturating_sub(1).max(1);
        self.line(format!("{} {title}", "=".repeat(depth)));
        self.walk_children(node);
        Flow::Done
    }

    pub(super) fn visit_bridgehead(&mut self, node: NodeId) -> Flow {
        let depth = self
            .dom
            .attr(node, "renderas")
            .and_then(|r| r.strip_prefix("sect"))
            .and_then(|n| n.parse::<usize>().ok())
            .map(|n| n + 1)
            .unwrap_or(self.level.max(2));
        let title = self.render_inline(node);
        self.out.append_blank_line();
        self.write_anchor_line(node);
        self.line("[discrete]");
        self.line(format!("{} {title}", "=".repeat(depth)));
        Flow::Done
    }

    // ------------------------------------------------------------------
    // Paragraphs and delimited blocks
    // ------------------------------------------------------------------

    pub(super) fn visit_para(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        self.out.append_blank_line();
        self.write_anchor_line(node);
        if let Some(role) = dom.attr(node, "role").filter(|r| !r.trim().is_empty()) {
            self.line(format!("[.{}]", role.trim()));
        }
        self.line("");
        self.walk_children(node);
        self.out.discard_empty_last();
        Flow::Done
    }

    /// Paragraph content written onto the current line (list items, cells).
    pub(super) fn para_inline(&mut self, para: NodeId) {
        if let Some(id) = self.element_id(para) {
            let anchor = self.anchor_markup(&id);
            self.out.append_text(&anchor);
        }
        self.walk_children(para);
    }

    pub(super) fn visit_formalpara(&mut self, node: NodeId) -> Flow {
        self.out.append_blank_line();
        self.write_anchor_line(node);
        self.write_block_title(node);
        self.out.adjoin_next();
        Flow::Descend
    }

    pub(super) fn visit_admonition(&mut self, node: NodeId) -> Flow {
        let label = self.name(node).to_uppercase();
        self.out.append_blank_line();
        self.write_anchor_line(node);
        self.write_block_title(node);
        self.line(format!("[{label}]"));
        self.open_delimiter("====");
        self.walk_children(node);
        self.line("====");
        Flow::Done
    }

    pub(super) fn visit_delimited(&mut self, node: NodeId, delimiter: &str) -> Flow {
        self.out.append_blank_line();
        self.write_anchor_line(node);
        self.write_block_title(node);
        self.open_delimiter(delimiter);
        self.walk_children(node);
        self.line(delimiter);
        Flow::Done
    }

    pub(super) fn visit_blockquote(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        let (attribution, cite) = match dom.child(node, "attribution") {
            Some(attribution) => {
                let cite = dom
                    .child(attribution, "citetitle")
                    .map(|c| collapse(&dom.text_content(c)))
                    .filter(|c| !c.is_empty());
                let text: String = dom
                    .children(attribution)
                    .filter(|&child| !dom.is_named(child, "citetitle"))
                    .map(|child| dom.text_content(child))
                    .collect();
                let text = collapse(&text);
                ((!text.is_empty()).then_some(text), cite)
            }
            None => (None, None),
        };

        self.out.append_blank_line();
        self.write_anchor_line(node);
        self.write_block_title(node);
        let style = match (attribution, cite) {
            (Some(a), Some(c)) => format!("[quote, {}, {}]", quote_attribute(&a), quote_attribute(&c)),
            (Some(a), None) => format!("[quote, {}]", quote_attribute(&a)),
            (None, Some(c)) => format!("[quote, , {}]", quote_attribute(&c)),
            (None, None) => "[quote]".to_string(),
        };
        self.line(style);
        self.open_delimiter("____");
        self.walk_children(node);
        self.line("____");
        Flow::Done
    }

    pub(super) fn visit_remark(&mut self, node: NodeId) -> Flow {
        if self.in_inline_context(node) {
            log::debug!("dropping inline remark");
            return Flow::Done;
        }
        let text = collapse(&self.dom.text_content(node));
        if !text.is_empty() {
            self.out.append_blank_line();
            self.line(format!("// {text}"));
        }
        Flow::Done
    }

    // ------------------------------------------------------------------
    // Figures and images
    // ------------------------------------------------------------------

    fn image_ref(&self, media: NodeId) -> Option<ImageRef> {
        let dom = self.dom;
        let imagedata = dom
            .element_children(media)
            .filter(|&child| dom.is_named(child, "imageobject"))
            .find_map(|object| dom.child(object, "imagedata"))?;
        let target = dom
            .attr(imagedata, "fileref")
            .or_else(|| dom.attr(imagedata, "entityref"))?
            .trim()
            .to_string();
        if target.is_empty() {
            return None;
        }
        let alt = dom
            .child(media, "alt")
            .or_else(|| dom.child_path(media, &["textobject", "phrase"]))
            .map(|alt| collapse(&dom.text_content(alt)))
            .unwrap_or_default();
        let width = dom
            .attr(imagedata, "width")
            .or_else(|| dom.attr(imagedata, "contentwidth"))
            .map(str::to_string);
        Some(ImageRef { target, alt, width })
    }

    pub(super) fn visit_figure(&mut self, node: NodeId) -> Flow {
        self.out.append_blank_line();
        self.write_anchor_line(node);
        self.write_block_title(node);
        self.out.adjoin_next();
        Flow::Descend
    }

    pub(super) fn visit_mediaobject(&mut self, node: NodeId) -> Flow {
        let Some(image) = self.image_ref(node) else {
            log::warn!("mediaobject without a usable imageobject; skipping");
            return Flow::Done;
        };
        self.out.append_blank_line();
        self.write_anchor_line(node);
        self.line(format!("image::{}[{}]", image.target, image.attributes()));
        Flow::Done
    }

    pub(super) fn visit_inline_mediaobject(&mut self, node: NodeId) -> Flow {
        let Some(image) = self.image_ref(node) else {
            log::warn!("inlinemediaobject without a usable imageobject; skipping");
            return Flow::Done;
        };
        self.begin_inline();
        self.out
            .append_text(&format!("image:{}[{}]", image.target, image.attributes()));
        Flow::Done
    }

    // ------------------------------------------------------------------
    // Bibliography, glossary and Q&A entries
    // ------------------------------------------------------------------

    pub(super) fn visit_biblioentry(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        let follows_entry = dom
            .prev_element(node)
            .is_some_and(|prev| self.handler(prev) == Handler::BiblioEntry);
        if !follows_entry {
            self.out.append_blank_line();
        }

        let abbrev = dom.child(node, "abbrev").map(|a| collapse(&dom.text_content(a)));
        let text = if dom.is_named(node, "bibliomixed") {
            let text: String = dom
                .children(node)
                .filter(|&child| !dom.is_named(child, "abbrev"))
                .map(|child| dom.text_content(child))
                .collect();
            collapse(&text)
        } else {
            dom.element_children(node)
                .filter(|&child| !dom.is_named(child, "abbrev"))
                .map(|child| collapse(&dom.text_content(child)))
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let text = reverse_subs(&text);

        let anchor = match (self.element_id(node), abbrev) {
            (Some(id), Some(abbrev)) if !abbrev.is_empty() => format!("[[[{id},{abbrev}]]] "),
            (Some(id), _) => format!("[[[{id}]]] "),
            (None, _) => String::new(),
        };
        self.line(format!("* {anchor}{text}"));
        Flow::Done
    }

    pub(super) fn visit_glossentry(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        let follows_entry = dom
            .prev_element(node)
            .is_some_and(|prev| self.handler(prev) == Handler::GlossEntry);
        if !follows_entry {
            self.out.append_blank_line();
            self.line("[glossary]");
        }

        let term = dom
            .child(node, "glossterm")
            .map(|term| self.render_inline(term))
            .unwrap_or_default();
        let anchor = self
            .element_id(node)
            .map(|id| self.anchor_markup(&id))
            .unwrap_or_default();
        self.line(format!("{anchor}{term}::"));

        for child in dom.element_children(node).collect::<Vec<_>>() {
            match self.name(child) {
                "glossdef" => self.item_body(child, ItemStart::NewLine),
                "glosssee" | "glossseealso" => {
                    let lead = if dom.is_named(child, "glosssee") {
                        "See"
                    } else {
                        "See also"
                    };
                    let target = match dom.attr(child, "otherterm") {
                        Some(other) => format!("<<{}>>", self.record_reference(other)),
                        None => self.render_inline(child),
                    };
                    self.line(format!("{lead} {target}."));
                }
                _ => {}
            }
        }
        Flow::Done
    }

    pub(super) fn visit_qanda(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        self.out.append_blank_line();
        self.write_anchor_line(node);
        self.write_block_title(node);

        let mut in_list = false;
        for child in dom.element_children(node).collect::<Vec<_>>() {
            match self.handler(child) {
                Handler::Title | Handler::Info => {}
                _ if dom.is_named(child, "qandaentry") => {
                    if !in_list {
                        self.out.append_blank_line();
                        self.line("[qanda]");
                        in_list = true;
                    }
                    self.qanda_entry(child);
                }
                _ => {
                    in_list = false;
                    let mut cursor = SiblingCursor::after(dom, child);
                    self.visit(child, &mut cursor);
                }
            }
        }
        Flow::Done
    }

    fn qanda_entry(&mut self, entry: NodeId) {
        let dom = self.dom;
        let (Some(question), Some(answer)) = (dom.child(entry, "question"), dom.child(entry, "answer"))
        else {
            log::warn!("qandaentry without a question or an answer; skipping it");
            return;
        };
        let text = self.render_inline(question);
        self.line(format!("{text}::"));
        self.item_body(answer, ItemStart::NewLine);
    }
}
