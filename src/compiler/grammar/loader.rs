use std::collections::{HashMap, HashSet};

use log::debug;

use crate::compiler::{lexer::Scanner, lexer::TokenKind, CompilerError, Span};
use crate::err;

use super::{Expr, GrammarError, GrammarResult, NodeKind, Rule, RuleId};

#[derive(Debug, Clone, PartialEq)]
enum Lexeme {
    Name(String),
    Literal(String),
    Arrow,
    Slash,
    Star,
    Plus,
    Question,
    Amp,
    Bang,
    LParen,
    RParen,
    End,
}

impl std::fmt::Display for Lexeme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lexeme::Name(n) => f.write_str(n),
            Lexeme::Literal(l) => f.write_fmt(format_args!("{:?}", l)),
            Lexeme::Arrow => f.write_str("<-"),
            Lexeme::Slash => f.write_str("/"),
            Lexeme::Star => f.write_str("*"),
            Lexeme::Plus => f.write_str("+"),
            Lexeme::Question => f.write_str("?"),
            Lexeme::Amp => f.write_str("&"),
            Lexeme::Bang => f.write_str("!"),
            Lexeme::LParen => f.write_str("("),
            Lexeme::RParen => f.write_str(")"),
            Lexeme::End => f.write_str("end of grammar"),
        }
    }
}

/// Loads the rules of a grammar description, resolving every reference and
/// rejecting grammars the parser could not run.
pub(super) fn load(text: &str) -> GrammarResult<Vec<Rule>> {
    let items = scan(text)?;
    let mut loader = Loader::new(items)?;
    let rules = loader.definitions()?;
    if rules.is_empty() {
        return err!(Span::zero(), GrammarError::Empty);
    }

    check_left_recursion(&rules)?;
    debug!("Loaded grammar with {} rules", rules.len());
    Ok(rules)
}

/// Splits a grammar description into lexemes.  `#` starts a comment which
/// runs to the end of the line.
fn scan(text: &str) -> GrammarResult<Vec<(Lexeme, Span)>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let offset = |idx: usize| chars.get(idx).map(|(o, _)| *o).unwrap_or(text.len());

    let mut items = vec![];
    let mut idx = 0;
    while idx < chars.len() {
        let (start, c) = chars[idx];
        if c.is_whitespace() {
            idx += 1;
            continue;
        }

        if c == '#' {
            while idx < chars.len() && chars[idx].1 != '\n' {
                idx += 1;
            }
            continue;
        }

        let lexeme = match c {
            '<' if chars.get(idx + 1).map(|(_, c)| *c) == Some('-') => {
                idx += 2;
                Lexeme::Arrow
            }
            '/' | '*' | '+' | '?' | '&' | '!' | '(' | ')' => {
                idx += 1;
                match c {
                    '/' => Lexeme::Slash,
                    '*' => Lexeme::Star,
                    '+' => Lexeme::Plus,
                    '?' => Lexeme::Question,
                    '&' => Lexeme::Amp,
                    '!' => Lexeme::Bang,
                    '(' => Lexeme::LParen,
                    _ => Lexeme::RParen,
                }
            }
            '"' | '\'' => {
                let quote = c;
                let mut lit = String::new();
                idx += 1;
                loop {
                    match chars.get(idx).map(|(_, c)| *c) {
                        None | Some('\n') => {
                            return err!(
                                Span::from_range(start, offset(idx)),
                                GrammarError::UnterminatedLiteral
                            )
                        }
                        Some('\\') => {
                            if let Some((_, escaped)) = chars.get(idx + 1) {
                                lit.push(*escaped);
                            }
                            idx += 2;
                        }
                        Some(c) if c == quote => {
                            idx += 1;
                            break;
                        }
                        Some(c) => {
                            lit.push(c);
                            idx += 1;
                        }
                    }
                }
                Lexeme::Literal(lit)
            }
            c if c.is_alphabetic() || c == '_' => {
                while idx < chars.len() && (chars[idx].1.is_alphanumeric() || chars[idx].1 == '_')
                {
                    idx += 1;
                }
                Lexeme::Name(text[start..offset(idx)].into())
            }
            c => {
                return err!(
                    Span::from_range(start, offset(idx + 1)),
                    GrammarError::UnexpectedChar(c)
                )
            }
        };

        items.push((lexeme, Span::from_range(start, offset(idx))));
    }

    items.push((Lexeme::End, Span::from_range(text.len(), text.len())));
    Ok(items)
}

struct Loader {
    items: Vec<(Lexeme, Span)>,
    index: usize,
    rule_ids: HashMap<String, RuleId>,
}

impl Loader {
    /// Collects the name of every rule before any rule body is read, so that
    /// references can be resolved as they are found.
    fn new(items: Vec<(Lexeme, Span)>) -> GrammarResult<Loader> {
        let mut rule_ids = HashMap::new();
        for idx in 0..items.len() {
            if let (Lexeme::Name(name), Some((Lexeme::Arrow, _))) = (&items[idx].0, items.get(idx + 1))
            {
                if rule_ids.contains_key(name) {
                    return err!(items[idx].1, GrammarError::DuplicateRule(name.clone()));
                }
                let id = RuleId(rule_ids.len());
                rule_ids.insert(name.clone(), id);
            }
        }

        Ok(Loader {
            items,
            index: 0,
            rule_ids,
        })
    }

    fn peek(&self) -> &(Lexeme, Span) {
        // The lexeme list always ends with `End`, which is never consumed.
        &self.items[self.index.min(self.items.len() - 1)]
    }

    fn advance(&mut self) -> (Lexeme, Span) {
        let item = self.peek().clone();
        if item.0 != Lexeme::End {
            self.index += 1;
        }
        item
    }

    fn next_if(&mut self, test: &Lexeme) -> bool {
        if &self.peek().0 == test {
            self.advance();
            true
        } else {
            false
        }
    }

    fn next_must_be(&mut self, test: Lexeme, expected: &'static str) -> GrammarResult<Span> {
        let (lexeme, span) = self.peek().clone();
        if lexeme == test {
            self.advance();
            Ok(span)
        } else {
            err!(
                span,
                GrammarError::ExpectedButFound(expected, lexeme.to_string())
            )
        }
    }

    fn at_definition(&self) -> bool {
        match (&self.peek().0, self.items.get(self.index + 1)) {
            (Lexeme::Name(_), Some((Lexeme::Arrow, _))) => true,
            _ => false,
        }
    }

    fn definitions(&mut self) -> GrammarResult<Vec<Rule>> {
        let mut rules = vec![];
        while self.peek().0 != Lexeme::End {
            rules.push(self.definition()?);
        }
        Ok(rules)
    }

    fn definition(&mut self) -> GrammarResult<Rule> {
        let (name, span) = match self.advance() {
            (Lexeme::Name(name), span) => (name, span),
            (other, span) => {
                return err!(
                    span,
                    GrammarError::ExpectedButFound("a rule name", other.to_string())
                )
            }
        };
        self.next_must_be(Lexeme::Arrow, "<-")?;

        let kind = if name.starts_with('_') {
            None
        } else {
            match NodeKind::from_rule_name(&name) {
                Some(kind) => Some(kind),
                None => return err!(span, GrammarError::UnknownNodeKind(name)),
            }
        };

        let expr = self.choice()?;
        Ok(Rule::new(name, kind, expr, span))
    }

    fn choice(&mut self) -> GrammarResult<Expr> {
        let mut alternatives = vec![self.sequence()?];
        while self.next_if(&Lexeme::Slash) {
            alternatives.push(self.sequence()?);
        }

        Ok(if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            Expr::Choice(alternatives)
        })
    }

    fn sequence(&mut self) -> GrammarResult<Expr> {
        let mut items = vec![];
        loop {
            let ends_sequence = match &self.peek().0 {
                Lexeme::Slash | Lexeme::RParen | Lexeme::End => true,
                Lexeme::Name(_) => self.at_definition(),
                _ => false,
            };
            if ends_sequence {
                break;
            }
            items.push(self.prefix()?);
        }

        match items.len() {
            0 => {
                let (lexeme, span) = self.peek().clone();
                err!(
                    span,
                    GrammarError::ExpectedButFound("an expression", lexeme.to_string())
                )
            }
            1 => Ok(items.remove(0)),
            _ => Ok(Expr::Sequence(items)),
        }
    }

    fn prefix(&mut self) -> GrammarResult<Expr> {
        if self.next_if(&Lexeme::Amp) {
            Ok(Expr::And(Box::new(self.suffix()?)))
        } else if self.next_if(&Lexeme::Bang) {
            Ok(Expr::Not(Box::new(self.suffix()?)))
        } else {
            self.suffix()
        }
    }

    fn suffix(&mut self) -> GrammarResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            expr = if self.next_if(&Lexeme::Star) {
                Expr::ZeroOrMore(Box::new(expr))
            } else if self.next_if(&Lexeme::Plus) {
                Expr::OneOrMore(Box::new(expr))
            } else if self.next_if(&Lexeme::Question) {
                Expr::Optional(Box::new(expr))
            } else {
                break;
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> GrammarResult<Expr> {
        match self.advance() {
            (Lexeme::Name(name), span) => {
                if Self::is_terminal_name(&name) {
                    TokenKind::from_name(&name)
                        .map(Expr::Terminal)
                        .ok_or_else(|| CompilerError::new(span, GrammarError::UnknownTerminal(name)))
                } else {
                    match self.rule_ids.get(&name) {
                        Some(id) => Ok(Expr::Rule(*id)),
                        None => err!(span, GrammarError::UndefinedRule(name)),
                    }
                }
            }
            (Lexeme::Literal(lit), span) => Self::literal(lit, span),
            (Lexeme::LParen, _) => {
                let expr = self.choice()?;
                self.next_must_be(Lexeme::RParen, ")")?;
                Ok(expr)
            }
            (other, span) => err!(
                span,
                GrammarError::ExpectedButFound("an expression", other.to_string())
            ),
        }
    }

    /// A quoted literal matches the one keyword or operator token the scanner
    /// produces for it.
    fn literal(lit: String, span: Span) -> GrammarResult<Expr> {
        let tokens = Scanner::new(&lit).tokenize();
        match tokens.as_slice() {
            [token, eof]
                if eof.kind == TokenKind::Eof
                    && token.kind != TokenKind::Error
                    && token.value.is_none() =>
            {
                Ok(Expr::Terminal(token.kind))
            }
            _ => err!(span, GrammarError::InvalidLiteral(lit)),
        }
    }

    fn is_terminal_name(name: &str) -> bool {
        name.chars().next().map_or(false, |c| c.is_ascii_uppercase())
            && name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    }
}

/// Rejects grammars in which a rule can reach itself without consuming any
/// input, since such a rule would never terminate.
fn check_left_recursion(rules: &[Rule]) -> GrammarResult<()> {
    let nullable = nullable_rules(rules);

    let leftmost: Vec<Vec<RuleId>> = rules
        .iter()
        .map(|r| {
            let mut calls = vec![];
            leftmost_calls(r.expr(), &nullable, &mut calls);
            calls
        })
        .collect();

    let mut done = HashSet::new();
    for start in 0..rules.len() {
        let mut path = vec![];
        if let Some(cycle) = find_cycle(RuleId(start), &leftmost, &mut path, &mut done) {
            let names = cycle
                .iter()
                .map(|id| rules[id.0].name().to_string())
                .collect();
            return err!(
                rules[cycle[0].0].span(),
                GrammarError::LeftRecursion(names)
            );
        }
    }

    Ok(())
}

fn find_cycle(
    id: RuleId,
    leftmost: &[Vec<RuleId>],
    path: &mut Vec<RuleId>,
    done: &mut HashSet<RuleId>,
) -> Option<Vec<RuleId>> {
    if let Some(pos) = path.iter().position(|p| *p == id) {
        let mut cycle = path[pos..].to_vec();
        cycle.push(id);
        return Some(cycle);
    }
    if done.contains(&id) {
        return None;
    }

    path.push(id);
    for callee in &leftmost[id.0] {
        if let Some(cycle) = find_cycle(*callee, leftmost, path, done) {
            return Some(cycle);
        }
    }
    path.pop();
    done.insert(id);
    None
}

/// Computes which rules can succeed without consuming a token.
fn nullable_rules(rules: &[Rule]) -> Vec<bool> {
    let mut nullable = vec![false; rules.len()];
    loop {
        let mut changed = false;
        for (idx, rule) in rules.iter().enumerate() {
            if !nullable[idx] && is_nullable(rule.expr(), &nullable) {
                nullable[idx] = true;
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn is_nullable(expr: &Expr, nullable: &[bool]) -> bool {
    match expr {
        Expr::Terminal(_) => false,
        Expr::Rule(id) => nullable[id.0],
        Expr::Sequence(items) => items.iter().all(|e| is_nullable(e, nullable)),
        Expr::Choice(alts) => alts.iter().any(|e| is_nullable(e, nullable)),
        Expr::OneOrMore(e) => is_nullable(e, nullable),
        Expr::ZeroOrMore(_) | Expr::Optional(_) | Expr::And(_) | Expr::Not(_) => true,
    }
}

/// Collects the rules `expr` may call before it has consumed any input.
fn leftmost_calls(expr: &Expr, nullable: &[bool], calls: &mut Vec<RuleId>) {
    match expr {
        Expr::Terminal(_) => (),
        Expr::Rule(id) => calls.push(*id),
        Expr::Sequence(items) => {
            for item in items {
                leftmost_calls(item, nullable, calls);
                if !is_nullable(item, nullable) {
                    break;
                }
            }
        }
        Expr::Choice(alts) => {
            for alt in alts {
                leftmost_calls(alt, nullable, calls);
            }
        }
        Expr::ZeroOrMore(e)
        | Expr::OneOrMore(e)
        | Expr::Optional(e)
        | Expr::And(e)
        | Expr::Not(e) => leftmost_calls(e, nullable, calls),
    }
}
