//! Source document model.
//!
//! - [`arena`]: arena-allocated XML tree with typed nodes and sibling navigation
//! - [`parser`]: quick-xml event reader that builds the tree

mod arena;
mod parser;

pub use arena::{Attribute, ChildrenIter, Node, NodeData, NodeId, NodeKind, QualName, XmlDom};
pub use parser::parse_xml;

/// XInclude namespace.
pub const XINCLUDE_NS: &str = "http://www.w3.org/2001/XInclude";

/// XLink namespace, used by DocBook 5 hyperlinks.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
