use std::collections::BTreeSet;

use log::debug;

use crate::compiler::{
    grammar::{Expr, Grammar, GrammarResult, NodeKind, RuleId},
    lexer::{Scanner, Token, TokenKind},
    source::LineMap,
    CompilerError, Span,
};
use crate::diagnostics::TracingConfig;
use crate::trace;

use super::{tokenstream::TokenStream, ParseNode, ParseTree, ParserError, ParserResult};

/// How many rules may be in progress at once.  A parenthesized expression
/// nests about sixteen rules of the builtin grammar.
pub const MAX_RULE_DEPTH: usize = 512;

/// Runs a [`Grammar`] over the tokens of a compilation unit.
///
/// The parser is a backtracking interpreter of parsing expressions: ordered
/// choice commits to the first alternative that matches, repetition is
/// greedy, and a failed expression leaves the cursor where it started.  When
/// the root rule cannot match the whole input, the error is reported at the
/// furthest token any terminal was tried on.
pub struct Parser<'g> {
    grammar: &'g Grammar,
    root: RuleId,
    tracing: TracingConfig,
}

impl<'g> Parser<'g> {
    /// Creates a parser which starts from the rule named `root`.
    pub fn new(grammar: &'g Grammar, root: &str) -> GrammarResult<Parser<'g>> {
        Ok(Parser {
            grammar,
            root: grammar.root(root)?,
            tracing: TracingConfig::Off,
        })
    }

    pub fn set_tracing(&mut self, config: TracingConfig) {
        self.tracing = config;
    }

    /// Scans and parses `text`.
    pub fn parse(&self, text: &str) -> ParserResult<ParseTree> {
        let tokens = Scanner::new(text).tokenize();
        self.parse_tokens(text, &tokens)
    }

    /// Parses tokens which were scanned from `text`.  The text is only used
    /// to label trace events with line numbers.
    pub fn parse_tokens(&self, text: &str, tokens: &[Token]) -> ParserResult<ParseTree> {
        debug!(
            "Parsing {} tokens from rule {}",
            tokens.len(),
            self.grammar.rule(self.root).name()
        );

        let line_map = LineMap::new(text);
        let mut state = ParseState {
            grammar: self.grammar,
            stream: TokenStream::new(tokens),
            line_map: &line_map,
            tracing: self.tracing,
            furthest: 0,
            expected: BTreeSet::new(),
            lookahead: 0,
            depth: 0,
            too_deep: None,
        };

        let mut roots = vec![];
        let matched = state.rule(self.root, &mut roots);
        if let Some(index) = state.too_deep {
            let span = state.stream.get_or_last(index).map_or(Span::zero(), |t| t.span);
            return Err(CompilerError::new(
                span,
                ParserError::NestingTooDeep(MAX_RULE_DEPTH),
            ));
        }
        let at_end = state.stream.peek().map_or(true, |t| t.kind == TokenKind::Eof);
        if !at_end {
            state.record_failure(TokenKind::Eof);
        }

        match (matched && at_end, roots.pop()) {
            (true, Some(tree)) if roots.is_empty() => Ok(tree),
            (true, _) => Ok(ParseTree::Node(ParseNode {
                kind: self
                    .grammar
                    .rule(self.root)
                    .kind()
                    .unwrap_or(NodeKind::Program),
                children: vec![],
                span: Span::zero(),
            })),
            (false, _) => Err(state.error()),
        }
    }
}

struct ParseState<'a, 'g> {
    grammar: &'g Grammar,
    stream: TokenStream<'a>,
    line_map: &'a LineMap<'a>,
    tracing: TracingConfig,

    /// Index of the furthest token a terminal was tried on, and the kinds
    /// that were tried there.
    furthest: usize,
    expected: BTreeSet<TokenKind>,

    /// Depth of `&` and `!` predicates being evaluated.  Failures inside a
    /// predicate are not reported as expectations.
    lookahead: usize,

    /// Rules in progress.  Once the limit is hit, `too_deep` holds the token
    /// it was hit at and every rule fails.
    depth: usize,
    too_deep: Option<usize>,
}

impl<'a, 'g> ParseState<'a, 'g> {
    fn current_line(&self) -> u32 {
        self.stream
            .get_or_last(self.stream.index())
            .map_or(0, |t| self.line_map.position(t.span.low()).line)
    }

    /// Evaluates `expr` at the cursor, appending whatever it produces to
    /// `out`.  On failure the cursor and `out` are restored.
    fn eval(&mut self, expr: &'g Expr, out: &mut Vec<ParseTree>) -> bool {
        let start = self.stream.index();
        let mark = out.len();

        let matched = match expr {
            Expr::Terminal(kind) => self.terminal(*kind, out),
            Expr::Rule(id) => self.rule(*id, out),
            Expr::Sequence(items) => items.iter().all(|e| self.eval(e, out)),
            Expr::Choice(alternatives) => alternatives.iter().any(|e| self.eval(e, out)),
            Expr::ZeroOrMore(e) => {
                self.repeat(e, out);
                true
            }
            Expr::OneOrMore(e) => {
                if self.eval(e, out) {
                    self.repeat(e, out);
                    true
                } else {
                    false
                }
            }
            Expr::Optional(e) => {
                self.eval(e, out);
                true
            }
            Expr::And(e) => {
                let matched = self.lookahead(e);
                self.stream.set_index(start);
                matched
            }
            Expr::Not(e) => {
                let matched = self.lookahead(e);
                self.stream.set_index(start);
                !matched
            }
        };

        if !matched {
            self.stream.set_index(start);
            out.truncate(mark);
        }
        matched
    }

    fn lookahead(&mut self, expr: &'g Expr) -> bool {
        self.lookahead += 1;
        let matched = self.eval(expr, &mut vec![]);
        self.lookahead -= 1;
        matched
    }

    /// Matches `expr` as many times as possible.  Stops early if a match
    /// consumes nothing, since it would match forever.
    fn repeat(&mut self, expr: &'g Expr, out: &mut Vec<ParseTree>) {
        loop {
            let before = self.stream.index();
            if !self.eval(expr, out) || self.stream.index() == before {
                break;
            }
        }
    }

    fn terminal(&mut self, kind: TokenKind, out: &mut Vec<ParseTree>) -> bool {
        match self.stream.peek() {
            Some(token) if token.kind == kind => {
                self.stream.next();
                if kind.is_significant() {
                    out.push(ParseTree::Leaf(token.clone()));
                }
                true
            }
            _ => {
                self.record_failure(kind);
                false
            }
        }
    }

    fn rule(&mut self, id: RuleId, out: &mut Vec<ParseTree>) -> bool {
        if self.too_deep.is_some() {
            return false;
        }
        if self.depth >= MAX_RULE_DEPTH {
            self.too_deep = Some(self.stream.index());
            return false;
        }

        self.depth += 1;
        let matched = self.rule_body(id, out);
        self.depth -= 1;
        matched
    }

    fn rule_body(&mut self, id: RuleId, out: &mut Vec<ParseTree>) -> bool {
        let grammar = self.grammar;
        let rule = grammar.rule(id);
        trace!(
            self.tracing,
            self.current_line(),
            "{} at token {}",
            rule.name(),
            self.stream.index()
        );

        let start = self.stream.index();
        let mut children = vec![];
        if !self.eval(rule.expr(), &mut children) {
            return false;
        }

        match rule.kind() {
            None => out.extend(children),
            Some(kind) => {
                let span = self.span_from(start);
                out.push(Self::reduce(kind, children, span));
            }
        }
        true
    }

    /// Builds the node for a matched rule.  A wrapper rule which matched a
    /// single child is replaced by that child.
    fn reduce(kind: NodeKind, mut children: Vec<ParseTree>, span: Span) -> ParseTree {
        if kind.is_collapsible() && children.len() == 1 {
            if let Some(child) = children.pop() {
                return child;
            }
        }

        ParseTree::Node(ParseNode {
            kind,
            children,
            span,
        })
    }

    /// Span of the tokens consumed since the token at `start`.
    fn span_from(&self, start: usize) -> Span {
        let end = self.stream.index();
        match (self.stream.get(start), end > start) {
            (Some(first), true) => match self.stream.get(end - 1) {
                Some(last) => Span::cover(first.span, last.span),
                None => first.span,
            },
            (Some(first), false) => Span::new(first.span.low(), first.span.low()),
            (None, _) => Span::zero(),
        }
    }

    fn record_failure(&mut self, kind: TokenKind) {
        if self.lookahead > 0 {
            return;
        }

        let index = self.stream.index();
        if index > self.furthest {
            self.furthest = index;
            self.expected.clear();
        }
        if index == self.furthest {
            self.expected.insert(kind);
        }
    }

    fn error(&self) -> CompilerError<ParserError> {
        match self.stream.get_or_last(self.furthest) {
            Some(token) => match token.error() {
                Some(e) => CompilerError::new(token.span, ParserError::Lexical(e.clone())),
                None => CompilerError::new(
                    token.span,
                    ParserError::ExpectedButFound(
                        self.expected.iter().copied().collect(),
                        token.clone(),
                    ),
                ),
            },
            None => CompilerError::new(
                Span::zero(),
                ParserError::ExpectedButFound(
                    self.expected.iter().copied().collect(),
                    Token::new(TokenKind::Eof, Span::zero()),
                ),
            ),
        }
    }
}
