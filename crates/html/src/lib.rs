//! DOM tree storage, HTML parsing with recovery diagnostics, and DOM queries.

pub mod dom;
pub mod parser;
pub mod queries;

pub use dom::{Document, DomNode, NodeKind};
pub use indextree::NodeId;
pub use parser::{ParseResult, ParseWarning, parse_html, parse_html_with_diagnostics};
