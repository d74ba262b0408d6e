//! XInclude resolution for an inclusion tree.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::asciidoc::{IncludeResolver, UsedIds, include_directive};
use crate::config::Config;
use crate::util::{canonical_source, normalize_path, relative_include_path};

use super::document::{Document, load_tree};

/// Converts the documents a source file includes while it is walked.
pub(super) struct TreeIncludes<'c> {
    base_dir: PathBuf,
    config: &'c Config,
    used_ids: UsedIds,
    /// Canonical paths from the top-level file down to the including file.
    ancestors: Vec<PathBuf>,
    children: Vec<Document>,
}

impl<'c> TreeIncludes<'c> {
    pub fn new(base_dir: &Path, config: &'c Config, used_ids: UsedIds, ancestors: Vec<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            config,
            used_ids,
            ancestors,
            children: Vec::new(),
        }
    }

    pub fn into_children(self) -> Vec<Document> {
        self.children
    }
}

impl IncludeResolver for TreeIncludes<'_> {
    fn resolve(&mut self, href: &str, leveloffset: usize) -> String {
        let decoded = percent_decode_str(href).decode_utf8_lossy();
        let path = normalize_path(&self.base_dir.join(decoded.as_ref()));

        if self.ancestors.contains(&canonical_source(&path)) {
            log::warn!("include cycle at {}; not following it", path.display());
            return format!("// include cycle: {href}");
        }

        match load_tree(&path, self.config, &self.used_ids, &self.ancestors) {
            Ok(child) => {
                let target = match child.output() {
                    Some(output) => relative_include_path(output, &self.base_dir),
                    None => href.to_string(),
                };
                log::debug!("included {} as {target}", path.display());
                self.children.push(child);
                include_directive(&target, leveloffset)
            }
            Err(err) => {
                log::warn!("cannot include {}: {err}", path.display());
                format!("// include failed: {href}")
            }
        }
    }
}
