use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected '(' in tree literal")]
    MissingParen,
    #[error("empty node label at byte {0}")]
    EmptyLabel(usize),
    #[error("unbalanced parenthesis at byte {0}")]
    Unbalanced(usize),
    #[error("trailing input after tree literal at byte {0}")]
    TrailingInput(usize),
}

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<NodeId>,
}

/// A parsed tree literal. Nodes live in an index arena in pre-order, so two
/// trees parsed (or rendered and re-parsed) from the same shape compare equal
/// structurally via derived equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, label: String) -> NodeId {
        self.nodes.push(TreeNode {
            label,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }
}

/// Locate the tree literal inside a raw tree-block body. The literal starts
/// at the beginning of the contiguous non-whitespace run containing the first
/// `(`; anything before that run is protocol noise and is discarded.
pub fn extract_literal(body: &str) -> Option<&str> {
    let paren = body.find('(')?;
    let start = body[..paren]
        .rfind(|ch: char| ch.is_whitespace())
        .map(|i| i + 1)
        .unwrap_or(0);
    Some(body[start..].trim_end())
}

/// Parse `label(child, child, ...)` with arbitrary nesting. Bare labels are
/// leaves when nested; the top level must carry parentheses (childless roots
/// are written `label()`).
pub fn parse(text: &str) -> Result<Tree, ParseError> {
    let trimmed = text.trim();
    let mut parser = Parser {
        text: trimmed,
        pos: 0,
    };
    let mut tree = Tree::default();
    parser.parse_node(&mut tree, true)?;
    parser.skip_whitespace();
    if parser.pos < parser.text.len() {
        return Err(ParseError::TrailingInput(parser.pos));
    }
    Ok(tree)
}

/// Canonical unparsing: `,` separators, no whitespace, nested leaves bare,
/// a childless root as `label()`. `parse(render_as_text(t)) == t`.
pub fn render_as_text(tree: &Tree) -> String {
    fn render_node(tree: &Tree, id: NodeId, top_level: bool, out: &mut String) {
        let node = tree.node(id);
        out.push_str(&node.label);
        if node.children.is_empty() && !top_level {
            return;
        }
        out.push('(');
        for (i, child) in node.children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            render_node(tree, *child, false, out);
        }
        out.push(')');
    }

    let mut out = String::new();
    if !tree.is_empty() {
        render_node(tree, tree.root(), true, &mut out);
    }
    out
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.bump();
        }
    }

    /// Read a label: everything up to the next structural character.
    fn read_label(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if matches!(ch, '(' | ')' | ',') {
                break;
            }
            self.bump();
        }
        self.text[start..self.pos].trim()
    }

    fn parse_node(&mut self, tree: &mut Tree, top_level: bool) -> Result<NodeId, ParseError> {
        self.skip_whitespace();
        let label_at = self.pos;
        let label = self.read_label();
        if label.is_empty() {
            return Err(ParseError::EmptyLabel(label_at));
        }
        let id = tree.push(label.to_string());

        match self.peek() {
            Some('(') => {
                self.bump();
                self.skip_whitespace();
                if self.peek() == Some(')') {
                    self.bump();
                    return Ok(id);
                }
                loop {
                    let child = self.parse_node(tree, false)?;
                    tree.nodes[id].children.push(child);
                    self.skip_whitespace();
                    match self.peek() {
                        Some(',') => {
                            self.bump();
                        }
                        Some(')') => {
                            self.bump();
                            break;
                        }
                        _ => return Err(ParseError::Unbalanced(self.pos)),
                    }
                }
                Ok(id)
            }
            // A bare label is a leaf, but only below the top level.
            _ if top_level => Err(ParseError::MissingParen),
            _ => Ok(id),
        }
    }
}
