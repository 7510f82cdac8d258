use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::compiler::lexer::TokenKind;

/// Operators of the language.  Each one has a short code which is embedded in
/// the generated names of the values it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Lsh,
    Rsh,
    BitNot,
    And,
    Or,
    Not,
    Neg,
    Greater,
    GreaterEq,
    Equal,
    Less,
    LessEq,
    NotEqual,
    Delay,
}

/// Groups operators by the kinds of operands they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorClass {
    Arithmetic,
    Bitwise,
    Boolean,
    Comparison,
    Equality,
    Delay,
}

impl OperatorKind {
    pub fn code(&self) -> &'static str {
        match self {
            OperatorKind::Add => "1add",
            OperatorKind::Sub => "1sub",
            OperatorKind::Mul => "1mul",
            OperatorKind::Div => "1div",
            OperatorKind::Mod => "1mod",
            OperatorKind::Pow => "1pow",
            OperatorKind::BitAnd => "1ban",
            OperatorKind::BitOr => "1bor",
            OperatorKind::BitXor => "1bxo",
            OperatorKind::Lsh => "1lsh",
            OperatorKind::Rsh => "1rsh",
            OperatorKind::BitNot => "1bno",
            OperatorKind::And => "1and",
            OperatorKind::Or => "1lor",
            OperatorKind::Not => "1not",
            OperatorKind::Neg => "1neg",
            OperatorKind::Greater => "1cgt",
            OperatorKind::GreaterEq => "1cge",
            OperatorKind::Equal => "1ceq",
            OperatorKind::Less => "1clt",
            OperatorKind::LessEq => "1cle",
            OperatorKind::NotEqual => "1cne",
            OperatorKind::Delay => "1dly",
        }
    }

    /// The binary operator written with the token `kind`.
    pub fn binary(kind: TokenKind) -> Option<OperatorKind> {
        Some(match kind {
            TokenKind::Add => OperatorKind::Add,
            TokenKind::Sub => OperatorKind::Sub,
            TokenKind::Mul => OperatorKind::Mul,
            TokenKind::Div => OperatorKind::Div,
            TokenKind::Mod => OperatorKind::Mod,
            TokenKind::Pow => OperatorKind::Pow,
            TokenKind::BitAnd => OperatorKind::BitAnd,
            TokenKind::BitOr => OperatorKind::BitOr,
            TokenKind::BitXor => OperatorKind::BitXor,
            TokenKind::BitLsh => OperatorKind::Lsh,
            TokenKind::BitRsh => OperatorKind::Rsh,
            TokenKind::BoolAnd => OperatorKind::And,
            TokenKind::BoolOr => OperatorKind::Or,
            TokenKind::CmpGreat => OperatorKind::Greater,
            TokenKind::CmpGeq => OperatorKind::GreaterEq,
            TokenKind::CmpEq => OperatorKind::Equal,
            TokenKind::CmpLess => OperatorKind::Less,
            TokenKind::CmpLeq => OperatorKind::LessEq,
            TokenKind::CmpNeq => OperatorKind::NotEqual,
            _ => return None,
        })
    }

    /// The prefix operator written with the token `kind`.
    pub fn unary(kind: TokenKind) -> Option<OperatorKind> {
        Some(match kind {
            TokenKind::BitNot => OperatorKind::BitNot,
            TokenKind::Sub => OperatorKind::Neg,
            TokenKind::BoolNot => OperatorKind::Not,
            _ => return None,
        })
    }

    pub fn is_unary(&self) -> bool {
        match self {
            OperatorKind::BitNot | OperatorKind::Not | OperatorKind::Neg | OperatorKind::Delay => {
                true
            }
            _ => false,
        }
    }

    pub fn class(&self) -> OperatorClass {
        use OperatorKind::*;
        match self {
            Add | Sub | Mul | Div | Mod | Pow | Neg => OperatorClass::Arithmetic,
            BitAnd | BitOr | BitXor | Lsh | Rsh | BitNot => OperatorClass::Bitwise,
            And | Or | Not => OperatorClass::Boolean,
            Greater | GreaterEq | Less | LessEq => OperatorClass::Comparison,
            Equal | NotEqual => OperatorClass::Equality,
            Delay => OperatorClass::Delay,
        }
    }
}

impl Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            OperatorKind::Add => "+",
            OperatorKind::Sub | OperatorKind::Neg => "-",
            OperatorKind::Mul => "*",
            OperatorKind::Div => "/",
            OperatorKind::Mod => "%",
            OperatorKind::Pow => "**",
            OperatorKind::BitAnd => "&",
            OperatorKind::BitOr => "|",
            OperatorKind::BitXor => "^",
            OperatorKind::Lsh => "<<",
            OperatorKind::Rsh => ">>",
            OperatorKind::BitNot => "~",
            OperatorKind::And => "and",
            OperatorKind::Or => "or",
            OperatorKind::Not => "not",
            OperatorKind::Greater => ">",
            OperatorKind::GreaterEq => ">=",
            OperatorKind::Equal => "==",
            OperatorKind::Less => "<",
            OperatorKind::LessEq => "<=",
            OperatorKind::NotEqual => "!=",
            OperatorKind::Delay => "@",
        };
        f.write_str(symbol)
    }
}
