//! Converted documents and the top-level entry points.

use std::fs;
use std::path::{Path, PathBuf};

use crate::asciidoc::{Converter, UsedIds, prune_anchors, tidy_lines};
use crate::config::Config;
use crate::dom::{XmlDom, parse_xml};
use crate::error::{Error, Result};
use crate::util::{canonical_source, decode_xml, output_path};

use super::includes::TreeIncludes;

/// One converted source file and the files it includes.
#[derive(Debug)]
pub struct Document {
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    lines: Vec<String>,
    children: Vec<Document>,
    used_ids: UsedIds,
}

impl Document {
    /// Source file, or `None` for a document converted from memory.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// File [`Document::write`] writes this document to.
    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Documents included by this one, in inclusion order.
    pub fn children(&self) -> &[Document] {
        &self.children
    }

    /// Ids referenced anywhere in the inclusion tree.
    pub fn used_ids(&self) -> &UsedIds {
        &self.used_ids
    }

    /// The AsciiDoc text, newline-terminated.
    pub fn content(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut content = self.lines.join("\n");
        content.push('\n');
        content
    }

    /// Write this document and every included document to their output paths.
    ///
    /// A document converted from memory has no output path; only its
    /// included documents are written.
    pub fn write(&self) -> Result<()> {
        if let Some(output) = &self.output {
            fs::write(output, self.content())?;
            log::info!("wrote {}", output.display());
        }
        for child in &self.children {
            child.write()?;
        }
        Ok(())
    }

    /// Number of documents in this tree, including this one.
    pub fn document_count(&self) -> usize {
        1 + self.children.iter().map(Document::document_count).sum::<usize>()
    }

    /// Prune dead anchors and tidy blank lines, parents before children.
    fn finish(&mut self) {
        let lines = std::mem::take(&mut self.lines);
        self.lines = tidy_lines(prune_anchors(lines, &self.used_ids));
        for child in &mut self.children {
            child.finish();
        }
    }
}

/// Convert a DocBook file and everything it includes.
pub fn convert_file(path: &Path, config: &Config) -> Result<Document> {
    config.validate()?;
    let used_ids = UsedIds::new();
    let mut document = load_tree(path, config, &used_ids, &[])?;
    document.finish();
    log::info!(
        "converted {} ({} document(s), {} referenced id(s))",
        path.display(),
        document.document_count(),
        used_ids.len()
    );
    Ok(document)
}

/// Convert an in-memory DocBook document.
///
/// Includes resolve relative to the current directory.
///
/// # Example
///
/// ```
/// use docbook_adoc::{Config, convert_str};
///
/// let xml = "<article><title>Hello</title><para>World</para></article>";
/// let document = convert_str(xml, &Config::default())?;
/// assert!(document.content().starts_with("= Hello\n"));
/// # Ok::<(), docbook_adoc::Error>(())
/// ```
pub fn convert_str(xml: &str, config: &Config) -> Result<Document> {
    config.validate()?;
    let dom = parse_xml(xml)?;
    let base_dir = std::env::current_dir()?;
    let used_ids = UsedIds::new();
    let mut document = walk_tree(None, &dom, &base_dir, config, &used_ids, Vec::new());
    document.finish();
    Ok(document)
}

/// Read, parse and walk one source file, converting its includes on the way.
pub(super) fn load_tree(
    path: &Path,
    config: &Config,
    used_ids: &UsedIds,
    ancestors: &[PathBuf],
) -> Result<Document> {
    if !path.is_file() {
        return Err(Error::MissingSource(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    let dom = parse_xml(&decode_xml(&bytes))?;
    log::debug!("parsed {} ({} nodes)", path.display(), dom.len());

    let mut chain = ancestors.to_vec();
    chain.push(canonical_source(path));
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(walk_tree(Some(path), &dom, &base_dir, config, used_ids, chain))
}

fn walk_tree(
    source: Option<&Path>,
    dom: &XmlDom,
    base_dir: &Path,
    config: &Config,
    used_ids: &UsedIds,
    ancestors: Vec<PathBuf>,
) -> Document {
    let mut includes = TreeIncludes::new(base_dir, config, used_ids.clone(), ancestors);
    let lines = Converter::new(dom, config, used_ids.clone())
        .with_includes(&mut includes)
        .convert();

    Document {
        source: source.map(Path::to_path_buf),
        output: source.map(output_path),
        lines,
        children: includes.into_children(),
        used_ids: used_ids.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_file_missing_source() {
        let result = convert_file(Path::new("/nonexistent/guide.xml"), &Config::default());
        assert!(matches!(result, Err(Error::MissingSource(_))));
    }

    #[test]
    fn test_convert_str_rejects_bad_config() {
        let config = Config::default().with_idseparator("--");
        assert!(matches!(
            convert_str("<article/>", &config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_content_is_newline_terminated() {
        let document = convert_str("<article><para>Hi</para></article>", &Config::default()).unwrap();
        assert!(document.content().ends_with("Hi\n"));
        assert_eq!(document.document_count(), 1);
        assert!(document.output().is_none());
    }
}
