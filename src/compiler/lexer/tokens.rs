use serde::{Deserialize, Serialize};

use crate::compiler::{source::LineMap, CompilerDisplay, CompilerDisplayError, Span};

use super::LexerError;

/// Every class of token the scanner can produce.  The grammar refers to these
/// by the names returned from [`TokenKind::name`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenKind {
    Error,
    Eof,
    Identifier,
    Declaration,
    Byte,
    I16,
    I24,
    I32,
    I64,
    U16,
    U24,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Number,
    Record,
    Process,
    Module,
    Comma,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Semicolon,
    LiterInt,
    LiterFloat,
    LiterBool,
    LiterChar,
    LiterStr,
    Assign,
    Add,
    Sub,
    Mul,
    Pow,
    Div,
    Mod,
    Delay,
    BitAnd,
    BitOr,
    BitNot,
    BitXor,
    BitLsh,
    BitRsh,
    BoolAnd,
    BoolOr,
    BoolNot,
    CmpGreat,
    CmpGeq,
    CmpEq,
    CmpLess,
    CmpLeq,
    CmpNeq,
    Arrow,
    Dot,
    Import,
    Attach,
    Return,
}

use TokenKind::*;

const ALL_KINDS: [TokenKind; 61] = [
    Error, Eof, Identifier, Declaration, Byte, I16, I24, I32, I64, U16, U24, U32, U64, F32, F64,
    Bool, Number, Record, Process, Module, Comma, OpenParen, CloseParen, OpenBracket, CloseBracket,
    OpenBrace, CloseBrace, Semicolon, LiterInt, LiterFloat, LiterBool, LiterChar, LiterStr, Assign,
    Add, Sub, Mul, Pow, Div, Mod, Delay, BitAnd, BitOr, BitNot, BitXor, BitLsh, BitRsh, BoolAnd,
    BoolOr, BoolNot, CmpGreat, CmpGeq, CmpEq, CmpLess, CmpLeq, CmpNeq, Arrow, Dot, Import, Attach,
    Return,
];

impl TokenKind {
    /// The name a grammar description uses to refer to this kind of token.
    pub fn name(&self) -> &'static str {
        match self {
            Error => "ERR",
            Eof => "EOF",
            Identifier => "IDENTIFIER",
            Declaration => "DECLARATION",
            Byte => "TYPE_BYTE",
            I16 => "TYPE_I16",
            I24 => "TYPE_I24",
            I32 => "TYPE_I32",
            I64 => "TYPE_I64",
            U16 => "TYPE_U16",
            U24 => "TYPE_U24",
            U32 => "TYPE_U32",
            U64 => "TYPE_U64",
            F32 => "TYPE_F32",
            F64 => "TYPE_F64",
            Bool => "TYPE_BOOL",
            Number => "TYPE_NUMBER",
            Record => "TYPE_RECORD",
            Process => "TYPE_PROCESS",
            Module => "TYPE_MODULE",
            Comma => "COMMA",
            OpenParen => "OPEN_PAREN",
            CloseParen => "CLOSE_PAREN",
            OpenBracket => "OPEN_BRACKET",
            CloseBracket => "CLOSE_BRACKET",
            OpenBrace => "OPEN_BRACE",
            CloseBrace => "CLOSE_BRACE",
            Semicolon => "SEMICOLON",
            LiterInt => "LITER_INT",
            LiterFloat => "LITER_FLOAT",
            LiterBool => "LITER_BOOL",
            LiterChar => "LITER_CHAR",
            LiterStr => "LITER_STR",
            Assign => "OP_ASSIGN",
            Add => "OP_ADD",
            Sub => "OP_SUB",
            Mul => "OP_MUL",
            Pow => "OP_POW",
            Div => "OP_DIV",
            Mod => "OP_MOD",
            Delay => "OP_DELAY",
            BitAnd => "OP_BIT_AND",
            BitOr => "OP_BIT_OR",
            BitNot => "OP_BIT_NOT",
            BitXor => "OP_BIT_XOR",
            BitLsh => "OP_BIT_LSH",
            BitRsh => "OP_BIT_RSH",
            BoolAnd => "OP_BOOL_AND",
            BoolOr => "OP_BOOL_OR",
            BoolNot => "OP_BOOL_NOT",
            CmpGreat => "OP_CMP_GREAT",
            CmpGeq => "OP_CMP_GEQ",
            CmpEq => "OP_CMP_EQ",
            CmpLess => "OP_CMP_LESS",
            CmpLeq => "OP_CMP_LEQ",
            CmpNeq => "OP_CMP_NEQ",
            Arrow => "ARROW",
            Dot => "DOT",
            Import => "IMPORT",
            Attach => "ATTACH",
            Return => "RETURN",
        }
    }

    /// Looks up a token kind by its grammar name.  The error kind cannot be
    /// named because no grammar may accept it.
    pub fn from_name(name: &str) -> Option<TokenKind> {
        ALL_KINDS
            .iter()
            .copied()
            .filter(|k| *k != Error)
            .find(|k| k.name() == name)
    }

    /// Returns true if tokens of this kind carry meaning beyond the position
    /// they occupy in a rule, and so must be kept in the parse tree.
    pub fn is_significant(&self) -> bool {
        match self {
            Identifier | LiterInt | LiterFloat | LiterBool | LiterChar | LiterStr => true,
            Byte | I16 | I24 | I32 | I64 | U16 | U24 | U32 | U64 | F32 | F64 | Bool | Number
            | Record | Process | Module => true,
            Add | Sub | Mul | Pow | Div | Mod | Delay | BitAnd | BitOr | BitNot | BitXor
            | BitLsh | BitRsh | BoolAnd | BoolOr | BoolNot | CmpGreat | CmpGeq | CmpEq
            | CmpLess | CmpLeq | CmpNeq => true,
            Error | Eof | Declaration | Comma | OpenParen | CloseParen | OpenBracket
            | CloseBracket | OpenBrace | CloseBrace | Semicolon | Assign | Arrow | Dot | Import
            | Attach | Return => false,
        }
    }

    /// Returns true if a token of this kind ends an operand, so that a `-`
    /// directly after it is the subtraction operator.
    pub fn ends_operand(&self) -> bool {
        match self {
            Identifier | LiterInt | LiterFloat | LiterBool | LiterChar | LiterStr | CloseParen
            | CloseBracket | CloseBrace => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Error => "invalid token",
            Eof => "end of input",
            Identifier => "identifier",
            Declaration => ":",
            Byte => "byte",
            I16 => "i16",
            I24 => "i24",
            I32 => "i32",
            I64 => "i64",
            U16 => "u16",
            U24 => "u24",
            U32 => "u32",
            U64 => "u64",
            F32 => "f32",
            F64 => "f64",
            Bool => "bool",
            Number => "number",
            Record => "record",
            Process => "process",
            Module => "module",
            Comma => ",",
            OpenParen => "(",
            CloseParen => ")",
            OpenBracket => "[",
            CloseBracket => "]",
            OpenBrace => "{",
            CloseBrace => "}",
            Semicolon => ";",
            LiterInt => "integer literal",
            LiterFloat => "float literal",
            LiterBool => "bool literal",
            LiterChar => "char literal",
            LiterStr => "string literal",
            Assign => "=",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Pow => "**",
            Div => "/",
            Mod => "%",
            Delay => "@",
            BitAnd => "&",
            BitOr => "|",
            BitNot => "~",
            BitXor => "^",
            BitLsh => "<<",
            BitRsh => ">>",
            BoolAnd => "and",
            BoolOr => "or",
            BoolNot => "not",
            CmpGreat => ">",
            CmpGeq => ">=",
            CmpEq => "==",
            CmpLess => "<",
            CmpLeq => "<=",
            CmpNeq => "!=",
            Arrow => "->",
            Dot => ".",
            Import => "import",
            Attach => "attach",
            Return => "return",
        };
        f.write_str(text)
    }
}

/// Payload carried by literal and identifier tokens, and by error tokens to
/// describe what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Ident(String),
    Error(LexerError),
}

impl std::fmt::Display for TokenValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenValue::Int(i) => f.write_fmt(format_args!("{}", i)),
            TokenValue::Float(v) => f.write_fmt(format_args!("{:?}", v)),
            TokenValue::Bool(b) => f.write_fmt(format_args!("{}", b)),
            TokenValue::Char(c) => f.write_fmt(format_args!("{:?}", c)),
            TokenValue::Str(s) => f.write_fmt(format_args!("{:?}", s)),
            TokenValue::Ident(id) => f.write_str(id),
            TokenValue::Error(e) => f.write_fmt(format_args!("{}", e)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,

    /// Present only for literal, identifier, and error tokens
    pub value: Option<TokenValue>,

    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            value: None,
            span,
        }
    }

    pub fn with_value(kind: TokenKind, value: TokenValue, span: Span) -> Token {
        Token {
            kind,
            value: Some(value),
            span,
        }
    }

    pub fn ident(&self) -> Option<&str> {
        match &self.value {
            Some(TokenValue::Ident(id)) => Some(id),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&LexerError> {
        match &self.value {
            Some(TokenValue::Error(e)) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(v) => f.write_fmt(format_args!("{} {}", self.kind, v)),
            None => f.write_fmt(format_args!("{}", self.kind)),
        }
    }
}

impl CompilerDisplay for Token {
    fn fmt(&self, _: &LineMap) -> Result<String, CompilerDisplayError> {
        Ok(format!("{}", self))
    }
}
