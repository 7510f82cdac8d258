//! Grammar descriptions in parsing expression grammar notation.
//!
//! A grammar is loaded from text once, validated, and then shared by every
//! parse which uses it.  The grammar which describes the language itself is
//! embedded in the library and available through [`Grammar::builtin`].

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::{lexer::TokenKind, CompilerError, Span};

pub mod error;
mod loader;
pub mod node;
mod tests;

pub use error::GrammarError;
pub use node::NodeKind;

pub type GrammarResult<T> = Result<T, CompilerError<GrammarError>>;

/// Text of the grammar describing the language.
pub const BUILTIN_TEXT: &str = include_str!("../../../grammar/dspl.peg");

static BUILTIN: Lazy<Grammar> = Lazy::new(|| match Grammar::load(BUILTIN_TEXT) {
    Ok(grammar) => grammar,
    Err(err) => panic!(
        "compiler panic: the builtin grammar does not load: {:?}",
        err.inner()
    ),
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(usize);

impl RuleId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A parsing expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Terminal(TokenKind),
    Rule(RuleId),
    Sequence(Vec<Expr>),
    Choice(Vec<Expr>),
    ZeroOrMore(Box<Expr>),
    OneOrMore(Box<Expr>),
    Optional(Box<Expr>),
    And(Box<Expr>),
    Not(Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct Rule {
    name: String,

    /// `None` for helper rules, whose matches are spliced into the rule
    /// which refers to them.
    kind: Option<NodeKind>,

    expr: Expr,
    span: Span,
}

impl Rule {
    pub fn new(name: String, kind: Option<NodeKind>, expr: Expr, span: Span) -> Rule {
        Rule {
            name,
            kind,
            expr,
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Option<NodeKind> {
        self.kind
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<Rule>,
    index: HashMap<String, RuleId>,
}

impl Grammar {
    /// Loads and validates a grammar description.
    pub fn load(text: &str) -> GrammarResult<Grammar> {
        let rules = loader::load(text)?;
        let index = rules
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.name.clone(), RuleId(idx)))
            .collect();
        Ok(Grammar { rules, index })
    }

    /// The grammar of the language, loaded on first use.
    pub fn builtin() -> &'static Grammar {
        &BUILTIN
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.index.get(name).copied()
    }

    /// Looks up the rule a parse starts from.
    pub fn root(&self, name: &str) -> GrammarResult<RuleId> {
        self.rule_id(name).ok_or_else(|| {
            CompilerError::new(Span::zero(), GrammarError::MissingRoot(name.into()))
        })
    }
}
