#[cfg(test)]
mod tests {
    use crate::compiler::{
        grammar::{Grammar, GrammarError},
        lexer::{LexerError, TokenKind},
        parser::{parser::MAX_RULE_DEPTH, ParseTree, Parser, ParserError},
        source::LineMap,
    };

    fn parse(text: &str) -> ParseTree {
        let parser = Parser::new(Grammar::builtin(), "program").unwrap();
        match parser.parse(text) {
            Ok(tree) => tree,
            Err(err) => panic!("Failed to parse {:?}: {:?}", text, err),
        }
    }

    #[test]
    fn parse_statements() {
        for (text, expected) in vec![
            ("", "(Program)"),
            (
                "x: i32 = 2 + 3;",
                "(Program (Definition x (TypeSpec i32) (Sum 2 + 3)))",
            ),
            (
                "snk.in = src.out @ 2;",
                "(Program (Assignment (Postfix snk (Member in)) (Delay (Postfix src (Member out)) @ 2)))",
            ),
            (
                "attach src.out -> snk.in;",
                "(Program (Wiring (Postfix src (Member out)) (Postfix snk (Member in))))",
            ),
            ("import std.math;", "(Program (Import std math))"),
            ("return x;", "(Program (Return x))"),
            ("x;", "(Program x)"),
            (
                "r: record = { a = 1, b = 2.5 };",
                "(Program (Definition r (TypeSpec record) (Record (Field a 1) (Field b 2.5))))",
            ),
            (
                "p: Point = Point(x = 1.0, 2.0);",
                "(Program (Definition p (TypeSpec Point) (Postfix Point (Arguments (Argument x 1.0) (Argument 2.0)))))",
            ),
            (
                "f: process = (x: f32) -> { return x * 2.0; };",
                "(Program (Definition f (TypeSpec process) (Process (Parameters (Parameter x (TypeSpec f32))) (Block (Return (Product x * 2.0))))))",
            ),
            (
                "g: process = () -> { return 1; };",
                "(Program (Definition g (TypeSpec process) (Process (Block (Return 1)))))",
            ),
            ("x: i32 = 1; y: i32 = x;", "(Program (Definition x (TypeSpec i32) 1) (Definition y (TypeSpec i32) x))"),
        ] {
            assert_eq!(format!("{}", parse(text)), expected, "Parsing {:?}", text);
        }
    }

    #[test]
    fn parse_expressions() {
        let parser = Parser::new(Grammar::builtin(), "expression").unwrap();
        for (text, expected) in vec![
            ("1 - 2 - 3", "(Sum 1 - 2 - 3)"),
            ("1 + 2 * 3", "(Sum 1 + (Product 2 * 3))"),
            ("(1 + 2) * 3", "(Product (Sum 1 + 2) * 3)"),
            ("2 ** 3 ** 2", "(Power 2 ** (Power 3 ** 2))"),
            ("-x ** 2", "(Power (Unary - x) ** 2)"),
            ("~5", "(Unary ~ 5)"),
            ("x - 5", "(Sum x - 5)"),
            ("1 << 2 + 3", "(Shift 1 << (Sum 2 + 3))"),
            ("a & b | c ^ d", "(BitOr (BitAnd a & b) | (BitXor c ^ d))"),
            ("a < b", "(Comparison a < b)"),
            ("a != b", "(Comparison a != b)"),
            ("not a and b or c", "(BoolOr (BoolAnd (BoolNot not a) and b) or c)"),
            ("x @", "(Delay x @)"),
            ("x @ 2 @", "(Delay x @ 2 @)"),
            ("a.b.c", "(Postfix a (Member b) (Member c))"),
            ("f(1)(2)", "(Postfix f (Arguments (Argument 1)) (Arguments (Argument 2)))"),
            ("source(rate = 48000)", "(Postfix source (Arguments (Argument rate 48000)))"),
            ("sink()", "(Postfix sink (Arguments))"),
            ("[1, 2, 3]", "(List 1 2 3)"),
            ("[]", "(List)"),
            ("{}", "(Record)"),
            ("'a'", "'a'"),
            ("\"hi\"", "\"hi\""),
            ("true", "true"),
        ] {
            match parser.parse(text) {
                Ok(tree) => assert_eq!(format!("{}", tree), expected, "Parsing {:?}", text),
                Err(err) => panic!("Failed to parse {:?}: {:?}", text, err),
            }
        }
    }

    #[test]
    fn syntax_error_reports_furthest_position() {
        let text = "x: i32 = 1;\nx: i32 = ;";
        let parser = Parser::new(Grammar::builtin(), "program").unwrap();
        let err = parser.parse(text).unwrap_err();

        match err.inner() {
            ParserError::ExpectedButFound(expected, found) => {
                assert_eq!(found.kind, TokenKind::Semicolon);
                for kind in vec![
                    TokenKind::Identifier,
                    TokenKind::LiterInt,
                    TokenKind::OpenParen,
                    TokenKind::BitNot,
                ] {
                    assert!(expected.contains(&kind), "Missing {:?}", kind);
                }
                assert!(!expected.contains(&TokenKind::Semicolon));
            }
            other => panic!("Unexpected error {:?}", other),
        }

        let pos = err.position(&LineMap::new(text));
        assert_eq!((pos.line, pos.column), (2, 10));
    }

    #[test]
    fn syntax_error_at_end_of_input() {
        let parser = Parser::new(Grammar::builtin(), "program").unwrap();
        let err = parser.parse("x: i32 = 5").unwrap_err();
        match err.inner() {
            ParserError::ExpectedButFound(expected, found) => {
                assert_eq!(found.kind, TokenKind::Eof);
                assert!(expected.contains(&TokenKind::Semicolon));
                assert!(expected.contains(&TokenKind::Add));
            }
            other => panic!("Unexpected error {:?}", other),
        }
    }

    #[test]
    fn lexical_errors_surface_in_parser() {
        let parser = Parser::new(Grammar::builtin(), "program").unwrap();
        let err = parser.parse("x: i32 = $;").unwrap_err();
        assert_eq!(err.inner(), &ParserError::Lexical(LexerError::UnexpectedChar('$')));
        let pos = err.position(&LineMap::new("x: i32 = $;"));
        assert_eq!((pos.line, pos.column), (1, 10));
    }

    #[test]
    fn nesting_limit() {
        let parser = Parser::new(Grammar::builtin(), "program").unwrap();
        for (depth, accepted) in vec![(1, true), (25, true), (40, false), (1000, false)] {
            let text = format!("x: i32 = {}1{};", "(".repeat(depth), ")".repeat(depth));
            match parser.parse(&text) {
                Ok(_) => assert!(accepted, "{} levels", depth),
                Err(err) => {
                    assert!(!accepted, "{} levels: {:?}", depth, err);
                    assert_eq!(err.inner(), &ParserError::NestingTooDeep(MAX_RULE_DEPTH));
                }
            }
        }
    }

    #[test]
    fn narrower_root_must_consume_everything() {
        let parser = Parser::new(Grammar::builtin(), "expression").unwrap();
        let err = parser.parse("1 + 2;").unwrap_err();
        match err.inner() {
            ParserError::ExpectedButFound(expected, found) => {
                assert_eq!(found.kind, TokenKind::Semicolon);
                assert!(expected.contains(&TokenKind::Eof));
            }
            other => panic!("Unexpected error {:?}", other),
        }
    }

    #[test]
    fn unknown_root() {
        match Parser::new(Grammar::builtin(), "nope") {
            Ok(_) => panic!("Expected a missing root error"),
            Err(err) => assert_eq!(err.inner(), &GrammarError::MissingRoot("nope".into())),
        }
    }

    #[test]
    fn custom_grammar() {
        let grammar = Grammar::load(
            "program <- _item* EOF\n_item <- sum / IDENTIFIER\nsum <- LITER_INT (\"+\" LITER_INT)+",
        )
        .unwrap();
        let parser = Parser::new(&grammar, "program").unwrap();
        let tree = parser.parse("a 1 + 2 b").unwrap();
        assert_eq!(format!("{}", tree), "(Program a (Sum 1 + 2) b)");
    }
}
