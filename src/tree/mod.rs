pub mod layout;
pub mod parser;

pub use layout::{layout, Diagram, PlacedNode};
pub use parser::{extract_literal, parse, render_as_text, NodeId, ParseError, Tree, TreeNode};
