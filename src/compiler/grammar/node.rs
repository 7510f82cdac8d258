use serde::{Deserialize, Serialize};

/// The closed set of grammar rules that produce parse tree nodes.  Every
/// non-helper rule in a grammar description must be named after one of these.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Program,
    Statement,
    Import,
    Definition,
    Wiring,
    Assignment,
    Return,
    TypeSpec,
    Expression,
    Process,
    Parameters,
    Parameter,
    Block,
    BoolOr,
    BoolAnd,
    BoolNot,
    Comparison,
    BitOr,
    BitXor,
    BitAnd,
    Shift,
    Sum,
    Product,
    Power,
    Unary,
    Delay,
    Postfix,
    Member,
    Primary,
    Record,
    Field,
    List,
    Arguments,
    Argument,
}

impl NodeKind {
    pub fn from_rule_name(name: &str) -> Option<NodeKind> {
        use NodeKind::*;
        Some(match name {
            "program" => Program,
            "statement" => Statement,
            "import" => Import,
            "definition" => Definition,
            "wiring" => Wiring,
            "assignment" => Assignment,
            "return" => Return,
            "type_spec" => TypeSpec,
            "expression" => Expression,
            "process" => Process,
            "parameters" => Parameters,
            "parameter" => Parameter,
            "block" => Block,
            "bool_or" => BoolOr,
            "bool_and" => BoolAnd,
            "bool_not" => BoolNot,
            "comparison" => Comparison,
            "bit_or" => BitOr,
            "bit_xor" => BitXor,
            "bit_and" => BitAnd,
            "shift" => Shift,
            "sum" => Sum,
            "product" => Product,
            "power" => Power,
            "unary" => Unary,
            "delay" => Delay,
            "postfix" => Postfix,
            "member" => Member,
            "primary" => Primary,
            "record" => Record,
            "field" => Field,
            "list" => List,
            "arguments" => Arguments,
            "argument" => Argument,
            _ => return None,
        })
    }

    /// Returns true if a node of this kind with a single child carries no
    /// information of its own and is replaced by that child.
    pub fn is_collapsible(&self) -> bool {
        use NodeKind::*;
        match self {
            Statement | Expression | BoolOr | BoolAnd | BoolNot | Comparison | BitOr | BitXor
            | BitAnd | Shift | Sum | Product | Power | Unary | Delay | Postfix | Primary => true,
            Program | Import | Definition | Wiring | Assignment | Return | TypeSpec | Process
            | Parameters | Parameter | Block | Member | Record | Field | List | Arguments
            | Argument => false,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:?}", self))
    }
}
