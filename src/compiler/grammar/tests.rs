#[cfg(test)]
mod tests {
    use crate::compiler::grammar::{Expr, Grammar, GrammarError, NodeKind};
    use crate::compiler::lexer::TokenKind;

    #[test]
    fn test_builtin_loads() {
        let grammar = Grammar::builtin();
        let program = grammar.root("program").expect("Expected a program rule");
        assert_eq!(grammar.rule(program).kind(), Some(NodeKind::Program));

        let cmp = grammar.rule_id("_cmp_op").expect("Expected the helper rule");
        assert_eq!(grammar.rule(cmp).kind(), None);

        for name in vec!["statement", "definition", "delay", "record", "argument"] {
            assert!(grammar.rule_id(name).is_some(), "Missing rule {}", name);
        }
    }

    #[test]
    fn test_literals_become_terminals() {
        let grammar = Grammar::load("unary <- \"~\" unary / \"-\" unary / IDENTIFIER").unwrap();
        let id = grammar.root("unary").unwrap();
        assert_eq!(
            grammar.rule(id).expr(),
            &Expr::Choice(vec![
                Expr::Sequence(vec![Expr::Terminal(TokenKind::BitNot), Expr::Rule(id)]),
                Expr::Sequence(vec![Expr::Terminal(TokenKind::Sub), Expr::Rule(id)]),
                Expr::Terminal(TokenKind::Identifier),
            ])
        );
    }

    #[test]
    fn test_operators_and_grouping() {
        let text = "
            # comment
            program <- (sum / 'import')* !EOF? &IDENTIFIER+ EOF
            sum <- IDENTIFIER
        ";
        let grammar = Grammar::load(text).unwrap();
        let program = grammar.root("program").unwrap();
        let sum = grammar.root("sum").unwrap();
        assert_eq!(
            grammar.rule(program).expr(),
            &Expr::Sequence(vec![
                Expr::ZeroOrMore(Box::new(Expr::Choice(vec![
                    Expr::Rule(sum),
                    Expr::Terminal(TokenKind::Import)
                ]))),
                Expr::Not(Box::new(Expr::Optional(Box::new(Expr::Terminal(TokenKind::Eof))))),
                Expr::And(Box::new(Expr::OneOrMore(Box::new(Expr::Terminal(
                    TokenKind::Identifier
                ))))),
                Expr::Terminal(TokenKind::Eof),
            ])
        );
    }

    #[test]
    fn test_load_errors() {
        for (text, expected) in vec![
            ("", GrammarError::Empty),
            ("# nothing here", GrammarError::Empty),
            (
                "foo <- IDENTIFIER",
                GrammarError::UnknownNodeKind("foo".into()),
            ),
            ("program <- bar", GrammarError::UndefinedRule("bar".into())),
            (
                "program <- NOPE",
                GrammarError::UnknownTerminal("NOPE".into()),
            ),
            ("program <- ERR", GrammarError::UnknownTerminal("ERR".into())),
            (
                "program <- \"+-\"",
                GrammarError::InvalidLiteral("+-".into()),
            ),
            ("program <- \"5\"", GrammarError::InvalidLiteral("5".into())),
            (
                "program <- EOF\nprogram <- EOF",
                GrammarError::DuplicateRule("program".into()),
            ),
            (
                "program <- (EOF",
                GrammarError::ExpectedButFound(")", "end of grammar".into()),
            ),
            (
                "program <- ",
                GrammarError::ExpectedButFound("an expression", "end of grammar".into()),
            ),
            ("program <- \"abc", GrammarError::UnterminatedLiteral),
            ("program <- $", GrammarError::UnexpectedChar('$')),
            (
                "program <- program IDENTIFIER",
                GrammarError::LeftRecursion(vec!["program".into(), "program".into()]),
            ),
            (
                "program <- sum EOF\nsum <- IDENTIFIER? program",
                GrammarError::LeftRecursion(vec![
                    "program".into(),
                    "sum".into(),
                    "program".into(),
                ]),
            ),
        ] {
            let result = Grammar::load(text);
            match result {
                Ok(_) => panic!("Expected {:?} for {:?}", expected, text),
                Err(err) => assert_eq!(err.inner(), &expected, "Loading {:?}", text),
            }
        }
    }

    #[test]
    fn test_right_recursion_is_allowed() {
        assert!(Grammar::load("power <- IDENTIFIER (\"**\" power)?").is_ok());
    }

    #[test]
    fn test_missing_root() {
        let err = Grammar::builtin().root("nothing").unwrap_err();
        assert_eq!(err.inner(), &GrammarError::MissingRoot("nothing".into()));
    }
}
