//! # docbook-adoc
//!
//! Convert DocBook XML (4.x and 5.x) documents to AsciiDoc.
//!
//! ## Features
//!
//! - Single-pass conversion of sections, blocks, lists, tables, listings and
//!   inline markup to Asciidoctor-flavoured AsciiDoc
//! - XInclude trees become one `.adoc` file per source file, joined by
//!   `include::` directives with the right `leveloffset`
//! - Anchors are only kept when something links to them, across the whole
//!   inclusion tree
//! - Unknown elements degrade to commented-out XML instead of failing
//!
//! ## Quick Start
//!
//! ```
//! use docbook_adoc::{Config, convert_str};
//!
//! let xml = r#"<article>
//!   <title>Guide</title>
//!   <section><title>Getting Started</title><para>Run <command>make</command>.</para></section>
//! </article>"#;
//!
//! let document = convert_str(xml, &Config::default())?;
//! assert!(document.content().contains("== Getting Started\n\nRun ``make``."));
//! # Ok::<(), docbook_adoc::Error>(())
//! ```
//!
//! Files are converted with [`convert_file`]; the returned [`Document`] tree
//! is written next to its sources with [`Document::write`].

pub mod asciidoc;
pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::Config;
pub use error::{Error, Result};
pub use export::{Document, convert_file, convert_str};
