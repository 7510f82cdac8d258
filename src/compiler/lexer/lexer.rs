use log::debug;

use crate::compiler::source::{LineMap, Offset};
use crate::compiler::Span;
use crate::diagnostics::TracingConfig;
use crate::trace;

use super::{
    tokens::{Token, TokenKind, TokenValue},
    LexerError,
};
use TokenKind::*;

struct LexerBranch<'b, 'a> {
    scanner: &'b mut Scanner<'a>,
    index: usize,
}

impl<'b, 'a> LexerBranch<'b, 'a> {
    fn from(s: &'b mut Scanner<'a>) -> LexerBranch<'b, 'a> {
        LexerBranch {
            index: s.index,
            scanner: s,
        }
    }

    /// Merges this branch back into it's source Scanner.  Merging has the
    /// effect of accepting the current branch as correct and updating the
    /// source scanner to match the cursor state of the branch.
    fn merge(self) -> Option<(&'a str, Span)> {
        let cut = self.cut();
        if cut.is_some() {
            self.scanner.index = self.index;
        }
        cut
    }

    /// Returns the text between the scanner cursor and the branch cursor
    /// along with its span.  This will NOT update the source.  That must be
    /// done with `merge`.
    fn cut(&self) -> Option<(&'a str, Span)> {
        let start = self.scanner.index;
        let stop = self.index;
        if start == stop {
            None
        } else {
            let low = self.scanner.offset_of(start);
            let high = self.scanner.offset_of(stop);
            let text: &'a str = self.scanner.text;
            Some((&text[low..high], Span::from_range(low, high)))
        }
    }

    /// Advances the cursor one character and returns the character that was
    /// pointed to by the cursor before the advance.  Returns None if the cursor
    /// was already at the end of the stream.
    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.index += 1;
        }
        c
    }

    /// Advances the cursor one character, if the next character matches the
    /// given test character.
    fn next_if(&mut self, t: char) -> bool {
        if self.peek() == Some(t) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Advances the cursor while the next character satisfies `test`.
    fn next_while<F: Fn(char) -> bool>(&mut self, test: F) {
        while self.peek().map_or(false, &test) {
            self.index += 1;
        }
    }

    /// Will advance the cursor if the stream after the cursor starts with the
    /// given test string.  If the remaining stream does not start with the
    /// test string then the cursor is not advanced.
    fn next_if_word(&mut self, t: &str) -> bool {
        if t.chars().any(|c| c.is_whitespace()) {
            panic!("A lexical token cannot contain a whitespace character")
        }

        if self.peek_ifn(t) {
            self.index += t.chars().count();
            true
        } else {
            false
        }
    }

    /// Returns the character pointed at by the cursor which is the next
    /// character in the stream.
    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, i: usize) -> Option<char> {
        self.scanner.chars.get(self.index + i).map(|(_, c)| *c)
    }

    fn digit_at(&self, i: usize) -> bool {
        self.peek_at(i).map_or(false, |c| c.is_ascii_digit())
    }

    /// Whether a `.` followed by a digit starts at `i`.
    fn fraction_at(&self, i: usize) -> bool {
        self.peek_at(i) == Some('.') && self.digit_at(i + 1)
    }

    /// Checks if the character stream from the current cursor starts with
    /// the given test string, without advancing the cursor.
    fn peek_ifn(&self, t: &str) -> bool {
        t.chars()
            .enumerate()
            .all(|(i, tc)| self.peek_at(i) == Some(tc))
    }
}

/// Converts program text into [`Token`]s, one at a time.
///
/// Lexemes are recognized in a fixed priority order: words (keywords,
/// boolean literals, and identifiers), numbers, character and string
/// literals, and finally punctuation and operators.  Anything else becomes an
/// error token covering a single character, so scanning never fails and
/// always ends with an end of input token.
pub struct Scanner<'a> {
    text: &'a str,
    chars: Vec<(usize, char)>,
    index: usize,

    /// Kind of the most recently produced token, used to decide whether a `-`
    /// starts a negative literal.
    last: Option<TokenKind>,

    line_map: LineMap<'a>,
    tracing: TracingConfig,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Scanner<'a> {
        Scanner {
            text,
            chars: text.char_indices().collect(),
            index: 0,
            last: None,
            line_map: LineMap::new(text),
            tracing: TracingConfig::Off,
        }
    }

    pub fn set_tracing(&mut self, config: TracingConfig) {
        self.tracing = config;
    }

    /// Scans the whole text.  The final token is always [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Vec<Token> {
        debug!("Scanning {} bytes", self.text.len());

        let mut tokens = vec![];
        loop {
            let token = self.next_token();
            let done = token.kind == Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        debug!("Produced {} tokens", tokens.len());
        tokens
    }

    /// Returns the token which immediately follows the cursor and advances the
    /// cursor past it.  Once the input is exhausted every call returns an end
    /// of input token.
    pub fn next_token(&mut self) -> Token {
        self.consume_whitespace();

        if self.index >= self.chars.len() {
            let end = self.text.len();
            return Token::new(Eof, Span::from_range(end, end));
        }

        let token = self
            .consume_word()
            .or_else(|| self.consume_number())
            .or_else(|| self.consume_char_literal())
            .or_else(|| self.consume_string_literal())
            .or_else(|| self.consume_operator())
            .unwrap_or_else(|| self.consume_unexpected());

        self.last = Some(token.kind);
        trace!(
            self.tracing,
            self.line_map.position(token.span.low()).line,
            "{}",
            token
        );
        token
    }

    /// Byte offset of the character at `index`, or the end of the text.
    fn offset_of(&self, index: usize) -> usize {
        self.chars
            .get(index)
            .map(|(o, _)| *o)
            .unwrap_or_else(|| self.text.len())
    }

    /// Skips whitespace and `#` line comments.
    fn consume_whitespace(&mut self) {
        loop {
            while self.index < self.chars.len() && self.chars[self.index].1.is_whitespace() {
                self.index += 1;
            }

            if self.index < self.chars.len() && self.chars[self.index].1 == '#' {
                while self.index < self.chars.len() && self.chars[self.index].1 != '\n' {
                    self.index += 1;
                }
            } else {
                break;
            }
        }
    }

    fn consume_word(&mut self) -> Option<Token> {
        let mut branch = LexerBranch::from(self);
        if !branch.peek().map_or(false, |c| c.is_alphabetic() || c == '_') {
            return None;
        }
        branch.next_while(Self::is_word_char);

        let (word, span) = branch.merge()?;
        let kind = match word {
            "import" => Import,
            "attach" => Attach,
            "return" => Return,
            "byte" => Byte,
            "i16" => I16,
            "i24" => I24,
            "i32" => I32,
            "i64" => I64,
            "u16" => U16,
            "u24" => U24,
            "u32" => U32,
            "u64" => U64,
            "f32" => F32,
            "f64" => F64,
            "bool" => Bool,
            "number" => Number,
            "record" => Record,
            "process" => Process,
            "module" => Module,
            "and" => BoolAnd,
            "or" => BoolOr,
            "not" => BoolNot,
            "true" => return Some(Token::with_value(LiterBool, TokenValue::Bool(true), span)),
            "false" => return Some(Token::with_value(LiterBool, TokenValue::Bool(false), span)),
            _ => {
                return Some(Token::with_value(
                    Identifier,
                    TokenValue::Ident(word.into()),
                    span,
                ))
            }
        };

        Some(Token::new(kind, span))
    }

    /// Scans an integer or float literal.  A `-` directly followed by a number
    /// is part of the literal only where an operand is expected, and so is a
    /// float without digits before its `.`.  A run of word characters
    /// starting with a digit which is not a number becomes an identifier.
    fn consume_number(&mut self) -> Option<Token> {
        let operand_position = !self.last.map_or(false, |k| k.ends_operand());
        let mut branch = LexerBranch::from(self);

        let signed = operand_position
            && branch.peek() == Some('-')
            && (branch.digit_at(1) || branch.fraction_at(1));
        if signed {
            branch.next();
        } else if !branch.digit_at(0) && !(operand_position && branch.fraction_at(0)) {
            return None;
        }

        branch.next_while(|c| c.is_ascii_digit());

        if branch.peek().map_or(false, Self::is_word_char) {
            // Not a number: either give the `-` back to the operator scanner
            // or take the whole word as an identifier.
            if signed {
                return None;
            }
            branch.next_while(Self::is_word_char);
            let (word, span) = branch.merge()?;
            return Some(Token::with_value(
                Identifier,
                TokenValue::Ident(word.into()),
                span,
            ));
        }

        let is_float = branch.fraction_at(0);
        if is_float {
            branch.next();
            branch.next_while(|c| c.is_ascii_digit());
            if branch.peek().map_or(false, Self::is_word_char) {
                branch.next_while(Self::is_word_char);
                let (text, span) = branch.merge()?;
                return Some(Self::error_token(
                    LexerError::InvalidNumber(text.into()),
                    span,
                ));
            }
        }

        let (text, span) = branch.merge()?;
        Some(if is_float {
            match text.parse::<f64>() {
                Ok(v) => Token::with_value(LiterFloat, TokenValue::Float(v), span),
                Err(_) => Self::error_token(LexerError::InvalidNumber(text.into()), span),
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => Token::with_value(LiterInt, TokenValue::Int(v), span),
                Err(_) => Self::error_token(LexerError::InvalidInteger(text.into()), span),
            }
        })
    }

    fn consume_char_literal(&mut self) -> Option<Token> {
        let mut branch = LexerBranch::from(self);
        if !branch.next_if('\'') {
            return None;
        }

        let value = match branch.next() {
            None => Err(LexerError::UnterminatedChar),
            Some('\'') => Err(LexerError::EmptyChar),
            Some('\\') => match branch.next() {
                Some(e) => Self::escape(e).ok_or(LexerError::InvalidEscapeSequence(e)),
                None => Err(LexerError::ExpectedEscapeCharacter),
            },
            Some(c) => Ok(c),
        };

        let value = match value {
            Ok(c) if branch.next_if('\'') => Ok(c),
            Ok(_) => Err(LexerError::UnterminatedChar),
            Err(LexerError::EmptyChar) => Err(LexerError::EmptyChar),
            Err(e) => {
                branch.next_if('\'');
                Err(e)
            }
        };

        let (_, span) = branch.merge()?;
        Some(match value {
            Ok(c) => Token::with_value(LiterChar, TokenValue::Char(c), span),
            Err(e) => Self::error_token(e, span),
        })
    }

    /// Scans a string literal.  The payload excludes the quotes and has every
    /// escape sequence decoded.  A bad escape sequence does not stop the
    /// scan, so the error token covers the whole literal.
    fn consume_string_literal(&mut self) -> Option<Token> {
        let mut branch = LexerBranch::from(self);
        if !branch.next_if('"') {
            return None;
        }

        let mut payload = String::new();
        let mut error = None;
        let mut closed = false;
        while let Some(c) = branch.next() {
            match c {
                '"' => {
                    closed = true;
                    break;
                }
                '\\' => match branch.next() {
                    Some(e) => match Self::escape(e) {
                        Some(decoded) => payload.push(decoded),
                        None => {
                            error.get_or_insert(LexerError::InvalidEscapeSequence(e));
                        }
                    },
                    None => {
                        error.get_or_insert(LexerError::ExpectedEscapeCharacter);
                    }
                },
                c => payload.push(c),
            }
        }

        let (_, span) = branch.merge()?;
        Some(match (closed, error) {
            (false, _) => Self::error_token(LexerError::UnterminatedString, span),
            (true, Some(e)) => Self::error_token(e, span),
            (true, None) => Token::with_value(LiterStr, TokenValue::Str(payload), span),
        })
    }

    fn consume_operator(&mut self) -> Option<Token> {
        let mut branch = LexerBranch::from(self);
        let mut operators = vec![
            ("->", Arrow),
            ("**", Pow),
            (">=", CmpGeq),
            ("<=", CmpLeq),
            ("==", CmpEq),
            ("!=", CmpNeq),
            ("<<", BitLsh),
            (">>", BitRsh),
            (":", Declaration),
            (",", Comma),
            (";", Semicolon),
            ("(", OpenParen),
            (")", CloseParen),
            ("[", OpenBracket),
            ("]", CloseBracket),
            ("{", OpenBrace),
            ("}", CloseBrace),
            (".", Dot),
            ("=", Assign),
            ("+", Add),
            ("-", Sub),
            ("*", Mul),
            ("/", Div),
            ("%", Mod),
            ("@", Delay),
            ("&", BitAnd),
            ("|", BitOr),
            ("~", BitNot),
            ("^", BitXor),
            (">", CmpGreat),
            ("<", CmpLess),
        ];
        operators.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let kind = operators
            .iter()
            .find(|(op, _)| branch.next_if_word(op))
            .map(|(_, kind)| *kind)?;
        let (_, span) = branch.merge()?;
        Some(Token::new(kind, span))
    }

    /// Consumes a single character that no other rule accepts.
    fn consume_unexpected(&mut self) -> Token {
        let (low, c) = self.chars[self.index];
        self.index += 1;
        let span = Span::new(
            Offset::new(low as u32),
            Offset::new(self.offset_of(self.index) as u32),
        );
        Self::error_token(LexerError::UnexpectedChar(c), span)
    }

    fn error_token(e: LexerError, span: Span) -> Token {
        Token::with_value(Error, TokenValue::Error(e), span)
    }

    fn is_word_char(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    /// Decodes the character following a `\` in a literal.
    fn escape(c: char) -> Option<char> {
        match c {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '0' => Some('\0'),
            '\\' => Some('\\'),
            '"' => Some('"'),
            '\'' => Some('\''),
            _ => None,
        }
    }
}
