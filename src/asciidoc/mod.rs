//! AsciiDoc output: text escaping, anchor ids, line buffering and the
//! DocBook renderer.
//!
//! - [`escape`]: reverse typographic substitutions and escape markup characters
//! - [`ids`]: id normalization, generation and dead-anchor pruning
//! - [`lines`]: the output line buffer and the finishing cleanup
//! - [`names`]: element categories and handler dispatch
//! - [`render`]: the tree walker

pub mod escape;
pub mod ids;
pub mod lines;
pub mod names;
pub mod render;

pub use escape::{
    WrapPolicy, escape_brackets, escape_leading_style, escape_table_separators, normalize_whitespace,
    reverse_subs, split_sentences,
};
pub use ids::{IdResolver, UsedIds, prune_anchors};
pub use lines::{LineBuffer, Pending, tidy_lines};
pub use names::{Handler, handler_for};
pub use render::{
    Converter, DiffLine, EditKind, IncludeResolver, include_directive, reconstruct_diff,
};
