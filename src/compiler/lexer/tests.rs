#[cfg(test)]
mod tests {
    use crate::compiler::lexer::tokens::{Token, TokenKind, TokenValue};
    use crate::compiler::lexer::LexerError;
    use crate::compiler::Span;
    use TokenKind::*;

    use super::super::lexer::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        Scanner::new(text)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn values(text: &str) -> Vec<Option<TokenValue>> {
        Scanner::new(text)
            .tokenize()
            .into_iter()
            .filter(|t| t.kind != Eof)
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_integer() {
        let text = "5";
        let mut scanner = Scanner::new(text);
        let tokens = scanner.tokenize();
        assert_eq!(tokens.len(), 2);
        assert_eq!(
            tokens[0],
            Token::with_value(LiterInt, TokenValue::Int(5), Span::from_range(0, 1))
        );
        assert_eq!(tokens[1], Token::new(Eof, Span::from_range(1, 1)));
    }

    #[test]
    fn test_integers_scan_to_one_token() {
        for n in vec![0i64, 1, 7, 42, 1000, -1, -42, i64::MAX, i64::MIN, 123456789] {
            let text = format!("{}", n);
            assert_eq!(
                values(&text),
                vec![Some(TokenValue::Int(n))],
                "Scanning {}",
                text
            );
        }
    }

    #[test]
    fn test_integer_with_suffix_is_identifier() {
        for n in vec![0i64, 5, 12, 9876] {
            let text = format!("{}x", n);
            let tokens = Scanner::new(&text).tokenize();
            assert_eq!(tokens.len(), 2, "Scanning {}", text);
            assert_eq!(tokens[0].kind, Identifier, "Scanning {}", text);
            assert_eq!(tokens[0].ident(), Some(text.as_str()));
        }

        assert_eq!(values("12abc"), vec![Some(TokenValue::Ident("12abc".into()))]);
    }

    #[test]
    fn test_integer_overflow() {
        let tokens = Scanner::new("99999999999999999999").tokenize();
        assert_eq!(tokens[0].kind, Error);
        assert_eq!(
            tokens[0].error(),
            Some(&LexerError::InvalidInteger("99999999999999999999".into()))
        );
    }

    #[test]
    fn test_float() {
        for (text, expected) in vec![
            ("1.5", 1.5),
            ("0.25", 0.25),
            ("-2.5", -2.5),
            ("10.0", 10.0),
            (".5", 0.5),
            ("-.25", -0.25),
        ] {
            assert_eq!(
                values(text),
                vec![Some(TokenValue::Float(expected))],
                "Scanning {}",
                text
            );
        }

        assert_eq!(kinds("1.5x"), vec![Error, Eof]);
        assert_eq!(kinds("r.5"), vec![Identifier, Dot, LiterInt, Eof]);
    }

    #[test]
    fn test_negative_literal_only_in_operand_position() {
        for (text, expected) in vec![
            ("-5", vec![LiterInt, Eof]),
            ("x-5", vec![Identifier, Sub, LiterInt, Eof]),
            ("x - 5", vec![Identifier, Sub, LiterInt, Eof]),
            ("(1)-2", vec![OpenParen, LiterInt, CloseParen, Sub, LiterInt, Eof]),
            ("3 * -5", vec![LiterInt, Mul, LiterInt, Eof]),
            ("(-5)", vec![OpenParen, LiterInt, CloseParen, Eof]),
            ("x = -1;", vec![Identifier, Assign, LiterInt, Semicolon, Eof]),
            ("- 5", vec![Sub, LiterInt, Eof]),
            ("-x", vec![Sub, Identifier, Eof]),
            ("-12abc", vec![Sub, Identifier, Eof]),
        ] {
            assert_eq!(kinds(text), expected, "Scanning {}", text);
        }

        assert_eq!(
            values("x-5"),
            vec![
                Some(TokenValue::Ident("x".into())),
                None,
                Some(TokenValue::Int(5))
            ]
        );
    }

    #[test]
    fn test_keywords() {
        for (text, expected) in vec![
            ("import", Import),
            ("attach", Attach),
            ("return", Return),
            ("byte", Byte),
            ("i16", I16),
            ("i24", I24),
            ("i32", I32),
            ("i64", I64),
            ("u16", U16),
            ("u24", U24),
            ("u32", U32),
            ("u64", U64),
            ("f32", F32),
            ("f64", F64),
            ("bool", Bool),
            ("number", Number),
            ("record", Record),
            ("process", Process),
            ("module", Module),
            ("and", BoolAnd),
            ("or", BoolOr),
            ("not", BoolNot),
        ] {
            assert_eq!(kinds(text), vec![expected, Eof], "Scanning {}", text);
        }
    }

    #[test]
    fn test_keywords_respect_word_boundaries() {
        for text in vec![
            "importable",
            "attached",
            "returns",
            "i32x",
            "_f64",
            "bytes",
            "order",
            "nothing",
            "android",
            "trueish",
            "falsey",
        ] {
            assert_eq!(kinds(text), vec![Identifier, Eof], "Scanning {}", text);
        }
    }

    #[test]
    fn test_bool() {
        assert_eq!(
            values("true false"),
            vec![Some(TokenValue::Bool(true)), Some(TokenValue::Bool(false))]
        );
    }

    #[test]
    fn test_operators() {
        for (text, expected) in vec![
            ("->", vec![Arrow]),
            ("- >", vec![Sub, CmpGreat]),
            ("**", vec![Pow]),
            ("* *", vec![Mul, Mul]),
            (">=", vec![CmpGeq]),
            (">>", vec![BitRsh]),
            (">", vec![CmpGreat]),
            ("<=", vec![CmpLeq]),
            ("<<", vec![BitLsh]),
            ("<", vec![CmpLess]),
            ("==", vec![CmpEq]),
            ("=", vec![Assign]),
            ("!=", vec![CmpNeq]),
            ("+ / % @ & | ~ ^", vec![Add, Div, Mod, Delay, BitAnd, BitOr, BitNot, BitXor]),
            (": , ; . ( ) [ ] { }", vec![
                Declaration,
                Comma,
                Semicolon,
                Dot,
                OpenParen,
                CloseParen,
                OpenBracket,
                CloseBracket,
                OpenBrace,
                CloseBrace,
            ]),
        ] {
            let mut expected = expected;
            expected.push(Eof);
            assert_eq!(kinds(text), expected, "Scanning {}", text);
        }
    }

    #[test]
    fn test_comments_and_whitespace() {
        let text = "# header\nx # trailing\n\t  # another\n  y";
        assert_eq!(kinds(text), vec![Identifier, Identifier, Eof]);
        assert_eq!(kinds("# only a comment"), vec![Eof]);
        assert_eq!(kinds(""), vec![Eof]);
    }

    #[test]
    fn test_char_literal() {
        for (text, expected) in vec![
            ("'a'", 'a'),
            ("'\\n'", '\n'),
            ("'\\''", '\''),
            ("'\"'", '"'),
            ("'\\0'", '\0'),
        ] {
            assert_eq!(
                values(text),
                vec![Some(TokenValue::Char(expected))],
                "Scanning {}",
                text
            );
        }

        for (text, error) in vec![
            ("''", LexerError::EmptyChar),
            ("'ab'", LexerError::UnterminatedChar),
            ("'\\q'", LexerError::InvalidEscapeSequence('q')),
            ("'", LexerError::UnterminatedChar),
        ] {
            let tokens = Scanner::new(text).tokenize();
            assert_eq!(tokens[0].error(), Some(&error), "Scanning {}", text);
        }
    }

    #[test]
    fn test_string_literal() {
        for (text, expected) in vec![
            ("\"hello\"", "hello"),
            ("\"\"", ""),
            ("\"a\\\"b\"", "a\"b"),
            ("\"tab\\tnew\\nline\"", "tab\tnew\nline"),
            ("\"back\\\\slash\"", "back\\slash"),
        ] {
            assert_eq!(
                values(text),
                vec![Some(TokenValue::Str(expected.into()))],
                "Scanning {}",
                text
            );
        }
    }

    #[test]
    fn test_bad_string_literals() {
        let tokens = Scanner::new("\"abc").tokenize();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].error(), Some(&LexerError::UnterminatedString));
        assert_eq!(tokens[0].span, Span::from_range(0, 4));

        let tokens = Scanner::new("\"a\\qb\" x").tokenize();
        assert_eq!(tokens[0].error(), Some(&LexerError::InvalidEscapeSequence('q')));
        assert_eq!(tokens[0].span, Span::from_range(0, 6));
        assert_eq!(tokens[1].kind, Identifier);
    }

    #[test]
    fn test_unexpected_character() {
        let tokens = Scanner::new("x $ y").tokenize();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Identifier, Error, Identifier, Eof]);
        assert_eq!(tokens[1].error(), Some(&LexerError::UnexpectedChar('$')));
        assert_eq!(tokens[1].span, Span::from_range(2, 3));
    }

    #[test]
    fn test_eof_repeats() {
        let mut scanner = Scanner::new("x");
        assert_eq!(scanner.next_token().kind, Identifier);
        assert_eq!(scanner.next_token().kind, Eof);
        assert_eq!(scanner.next_token().kind, Eof);
    }

    #[test]
    fn test_statement() {
        let text = "snk.in = src.out @ 2 * 0.5;";
        assert_eq!(
            kinds(text),
            vec![
                Identifier, Dot, Identifier, Assign, Identifier, Dot, Identifier, Delay, LiterInt,
                Mul, LiterFloat, Semicolon, Eof
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = Scanner::new("ab: i32").tokenize();
        let spans: Vec<_> = tokens.iter().map(|t| t.span).collect();
        assert_eq!(
            spans,
            vec![
                Span::from_range(0, 2),
                Span::from_range(2, 3),
                Span::from_range(4, 7),
                Span::from_range(7, 7),
            ]
        );
    }

    #[test]
    fn test_grammar_names() {
        for kind in vec![Eof, Identifier, LiterInt, OpenBrace, Delay, CmpNeq, Return] {
            assert_eq!(TokenKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(TokenKind::from_name("ERR"), None);
        assert_eq!(TokenKind::from_name("NOT_A_TOKEN"), None);
    }
}
