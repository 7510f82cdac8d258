use std::fmt::Display;

use crate::compiler::{
    grammar::NodeKind,
    lexer::{Token, TokenValue},
    Span,
};

/// A reduced concrete syntax tree.  Leaves are the significant tokens of the
/// program; punctuation has been dropped and single child wrapper nodes have
/// been replaced by their child.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseTree {
    Node(ParseNode),
    Leaf(Token),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub kind: NodeKind,
    pub children: Vec<ParseTree>,
    pub span: Span,
}

impl ParseTree {
    pub fn span(&self) -> Span {
        match self {
            ParseTree::Node(n) => n.span,
            ParseTree::Leaf(t) => t.span,
        }
    }

    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            ParseTree::Node(n) => Some(n.kind),
            ParseTree::Leaf(_) => None,
        }
    }
}

/// Renders the tree as an s-expression, e.g. `(Sum 1 + x)`.
impl Display for ParseTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseTree::Node(node) => {
                f.write_fmt(format_args!("({}", node.kind))?;
                for child in &node.children {
                    f.write_fmt(format_args!(" {}", child))?;
                }
                f.write_str(")")
            }
            ParseTree::Leaf(token) => match &token.value {
                Some(TokenValue::Ident(id)) => f.write_str(id),
                Some(v) => f.write_fmt(format_args!("{}", v)),
                None => f.write_fmt(format_args!("{}", token.kind)),
            },
        }
    }
}
