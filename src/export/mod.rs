//! Conversion of whole inclusion trees.
//!
//! A top-level DocBook file and every file it pulls in through XInclude are
//! converted into a tree of [`Document`]s, one AsciiDoc file per source file.
//!
//! # Architecture
//!
//! - [`convert_file`] reads, parses and walks the top-level file
//! - included files are converted recursively while their parent is walked,
//!   sharing one used-id set so anchors can be referenced across files
//! - once the whole tree is walked, every document is finished (dead-anchor
//!   pruning, blank-line cleanup), parents before their children
//! - [`Document::write`] writes the tree next to its sources
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use docbook_adoc::{Config, convert_file};
//!
//! let document = convert_file(Path::new("guide.xml"), &Config::default())?;
//! document.write()?;
//! # Ok::<(), docbook_adoc::Error>(())
//! ```

mod document;
mod includes;

pub use document::{Document, convert_file, convert_str};
