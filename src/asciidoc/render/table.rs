//! CALS tables.

use crate::asciidoc::escape::escape_table_separators;
use crate::asciidoc::names::{self, Handler};
use crate::dom::NodeId;

use super::{Converter, Flow};

/// Named columns of a `tgroup`, in declaration order.
struct ColumnNames(Vec<(String, usize)>);

impl ColumnNames {
    fn index(&self, name: &str) -> Option<usize> {
        self.0.iter().find(|(n, _)| n == name).map(|&(_, i)| i)
    }
}

/// Proportional width from a `colwidth` such as `2*`, `30%` or `1.5*`.
fn column_width(colwidth: Option<&str>) -> u32 {
    colwidth
        .map(|w| w.trim().trim_end_matches(['*', '%']))
        .and_then(|w| w.parse::<f64>().ok())
        .filter(|w| w.is_finite() && *w > 0.0)
        .map(|w| w.round().max(1.0) as u32)
        .unwrap_or(1)
}

/// Cell span prefix: `2+`, `.3+` or `2.3+`.
fn span_spec(colspan: usize, rowspan: usize) -> String {
    match (colspan > 1, rowspan > 1) {
        (true, true) => format!("{colspan}.{rowspan}+"),
        (true, false) => format!("{colspan}+"),
        (false, true) => format!(".{rowspan}+"),
        (false, false) => String::new(),
    }
}

/// How a cell's content is written.
enum CellContent {
    Inline(String),
    /// Verbatim text, written with the literal style unless the column already has it.
    Literal(String),
    /// Block content, written with the AsciiDoc style.
    Blocks(Vec<String>),
}

impl<'a> Converter<'a> {
    pub(super) fn visit_table(&mut self, node: NodeId) -> Flow {
        let dom = self.dom;
        let Some(tgroup) = dom.child(node, "tgroup") else {
            log::warn!("table {} has no tgroup", self.table_label(node));
            return self.visit_default(node);
        };

        let colspecs: Vec<NodeId> = dom
            .element_children(tgroup)
            .filter(|&child| dom.is_named(child, "colspec"))
            .collect();
        let names = ColumnNames(
            colspecs
                .iter()
                .enumerate()
                .filter_map(|(position, &spec)| {
                    let name = dom.attr(spec, "colname")?;
                    let index = dom
                        .attr(spec, "colnum")
                        .and_then(|n| n.trim().parse::<usize>().ok())
                        .map(|n| n.saturating_sub(1))
                        .unwrap_or(position);
                    Some((name.to_string(), index))
                })
                .collect(),
        );

        let rows = |section: &str| -> Vec<NodeId> {
            dom.child(tgroup, section)
                .map(|s| {
                    dom.element_children(s)
                        .filter(|&row| dom.is_named(row, "row"))
                        .collect()
                })
                .unwrap_or_default()
        };
        let header = rows("thead");
        let body = rows("tbody");
        let footer = rows("tfoot");

        let declared = dom
            .attr(tgroup, "cols")
            .and_then(|c| c.trim().parse::<usize>().ok())
            .filter(|&c| c > 0);
        let header_width = header.first().map(|&row| self.row_width(row, &names));
        let cols = declared
            .or(header_width)
            .or_else(|| body.first().map(|&row| self.row_width(row, &names)))
            .unwrap_or(1)
            .max(1);
        if let (Some(declared), Some(found)) = (declared, header_width)
            && declared != found
        {
            log::warn!(
                "table {}: header row has {found} column(s) but {declared} are declared",
                self.table_label(node)
            );
        }

        let literal_columns: Vec<bool> = (0..cols)
            .map(|col| {
                body.first()
                    .and_then(|&row| dom.element_children(row).nth(col))
                    .is_some_and(|entry| self.verbatim_child(entry).is_some())
            })
            .collect();
        let specs: Vec<String> = (0..cols)
            .map(|col| {
                let width = column_width(colspecs.get(col).and_then(|&s| dom.attr(s, "colwidth")));
                if literal_columns[col] {
                    format!("{width}l")
                } else {
                    width.to_string()
                }
            })
            .collect();

        let mut options = Vec::new();
        if !header.is_empty() {
            options.push("header");
        }
        if !footer.is_empty() {
            options.push("footer");
        }

        let separator = if self.table_depth > 1 { '!' } else { '|' };
        let delimiter = format!("{separator}===");

        self.out.append_blank_line();
        self.write_anchor_line(node);
        self.write_block_title(node);
        if options.is_empty() {
            self.line(format!("[cols=\"{}\"]", specs.join(",")));
        } else {
            self.line(format!(
                "[cols=\"{}\",options=\"{}\"]",
                specs.join(","),
                options.join(",")
            ));
        }
        self.line(delimiter.clone());

        for &row in &header {
            let cells: Vec<String> = dom
                .element_children(row)
                .collect::<Vec<_>>()
                .into_iter()
                .map(|entry| {
                    let (colspan, rowspan) = self.cell_span(entry, &names);
                    let text = self.render_inline(entry);
                    format!("{}{separator}{text}", span_spec(colspan, rowspan))
                })
                .collect();
            self.line(cells.join(" ").trim_end().to_string());
        }
        if !header.is_empty() {
            self.out.append_blank_line();
        }

        for (index, &row) in body.iter().chain(footer.iter()).enumerate() {
            if index > 0 {
                self.out.append_blank_line();
            }
            for entry in dom.element_children(row).collect::<Vec<_>>() {
                let column = self.entry_column(entry, &names);
                let literal_column = column.and_then(|c| literal_columns.get(c)).copied().unwrap_or(false);
                self.write_cell(entry, &names, separator, literal_column);
            }
        }

        self.line(delimiter);
        Flow::Done
    }

    /// Name used for a table in diagnostics: the first text of its title.
    fn table_label(&self, node: NodeId) -> String {
        let dom = self.dom;
        self.title_node(node)
            .and_then(|title| dom.children(title).find_map(|child| dom.text(child)))
            .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|text| !text.is_empty())
            .map(|text| format!("'{text}'"))
            .or_else(|| dom.attr(node, "id").map(|id| format!("'{id}'")))
            .unwrap_or_else(|| "(untitled)".to_string())
    }

    fn cell_span(&self, entry: NodeId, names: &ColumnNames) -> (usize, usize) {
        let dom = self.dom;
        let colspan = match (dom.attr(entry, "namest"), dom.attr(entry, "nameend")) {
            (Some(start), Some(end)) => match (names.index(start), names.index(end)) {
                (Some(start), Some(end)) if end >= start => end - start + 1,
                _ => 1,
            },
            _ => 1,
        };
        let rowspan = dom
            .attr(entry, "morerows")
            .and_then(|m| m.trim().parse::<usize>().ok())
            .map_or(1, |m| m + 1);
        (colspan, rowspan)
    }

    fn row_width(&self, row: NodeId, names: &ColumnNames) -> usize {
        self.dom
            .element_children(row)
            .map(|entry| self.cell_span(entry, names).0)
            .sum()
    }

    /// Column an entry starts in, when it can be told from the entry itself.
    fn entry_column(&self, entry: NodeId, names: &ColumnNames) -> Option<usize> {
        let dom = self.dom;
        if let Some(index) = dom
            .attr(entry, "colname")
            .or_else(|| dom.attr(entry, "namest"))
            .and_then(|name| names.index(name))
        {
            return Some(index);
        }
        let row = dom.parent(entry)?;
        let mut column = 0;
        for sibling in dom.element_children(row) {
            if sibling == entry {
                return Some(column);
            }
            column += self.cell_span(sibling, names).0;
        }
        None
    }

    /// The single verbatim element that makes up a cell, if any.
    fn verbatim_child(&self, entry: NodeId) -> Option<NodeId> {
        let dom = self.dom;
        let mut children = dom.element_children(entry);
        let only = children.next()?;
        let has_text = dom
            .children(entry)
            .any(|child| dom.is_text(child) && !dom.is_whitespace_text(child));
        (children.next().is_none() && !has_text && names::is_verbatim(self.name(only))).then_some(only)
    }

    fn cell_content(&mut self, entry: NodeId) -> CellContent {
        let dom = self.dom;
        if let Some(verbatim) = self.verbatim_child(entry) {
            let (text, _) = self.listing_text(verbatim);
            return CellContent::Literal(text);
        }

        let blocks: Vec<NodeId> = dom
            .element_children(entry)
            .filter(|&child| self.handler(child).is_block())
            .collect();
        match blocks.as_slice() {
            [] => CellContent::Inline(self.render_inline(entry)),
            [para] if self.handler(*para) == Handler::Para
                && dom.element_children(entry).count() == 1
                && self.condition(*para).is_none() =>
            {
                CellContent::Inline(self.render_inline(*para))
            }
            _ => {
                let lines = self.capture(|this| this.walk_children(entry));
                let start = lines.iter().position(|l| !l.trim().is_empty()).unwrap_or(lines.len());
                let end = lines.iter().rposition(|l| !l.trim().is_empty()).map_or(start, |i| i + 1);
                CellContent::Blocks(lines[start..end].to_vec())
            }
        }
    }

    fn write_cell(&mut self, entry: NodeId, names: &ColumnNames, separator: char, literal_column: bool) {
        let (colspan, rowspan) = self.cell_span(entry, names);
        let span = span_spec(colspan, rowspan);
        match self.cell_content(entry) {
            CellContent::Inline(text) => {
                self.line(format!("{span}{separator}{text}").trim_end().to_string());
            }
            CellContent::Literal(text) => {
                let style = if literal_column { "" } else { "l" };
                let text = escape_table_separators(&text, self.table_depth);
                let mut lines = text.lines();
                let first = lines.next().unwrap_or_default();
                self.line(format!("{span}{style}{separator}{first}"));
                for line in lines {
                    self.line(line);
                }
            }
            CellContent::Blocks(lines) => {
                self.line(format!("{span}a{separator}"));
                for line in lines {
                    self.line(line);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_width() {
        assert_eq!(column_width(Some("2*")), 2);
        assert_eq!(column_width(Some("30%")), 30);
        assert_eq!(column_width(Some("1.5*")), 2);
        assert_eq!(column_width(Some("*")), 1);
        assert_eq!(column_width(None), 1);
    }

    #[test]
    fn test_span_spec() {
        assert_eq!(span_spec(1, 1), "");
        assert_eq!(span_spec(2, 1), "2+");
        assert_eq!(span_spec(1, 3), ".3+");
        assert_eq!(span_spec(2, 3), "2.3+");
    }
}
