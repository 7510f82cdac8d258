use crate::{
    compiler::{
        grammar::NodeKind,
        ir::{
            Block, Call, Connection, DeclType, Endpoint, Literal, OperatorKind, Parameter,
            Primitive, ProcessDef, RecordShape, Shape, Signature, Struct, StructKind, Symbol,
            SymbolRef, Value, ValueKind,
        },
        lexer::{Token, TokenKind, TokenValue},
        mangle,
        parser::{ParseNode, ParseTree},
        CompilerError, Span,
    },
    err, trace,
};

use super::{
    context::{AnalysisContext, Declaration},
    fold, SemanticError, SemanticResult,
};

/// Code embedded in the generated names of call results.
const CALL_CODE: &str = "1cal";

const SOURCE: &str = "source";
const SINK: &str = "sink";

/// What analyzing a single node of the parse tree produces.
enum Synth {
    Value(Symbol, Shape),
    Statement(Symbol),
    Return(Symbol, Shape),
    Block(Block, Option<(Symbol, Shape)>),
    Type(DeclType),
    Params(Vec<Parameter>),
    Param(Parameter),
    Args(Vec<Arg>),
    Arg(Arg),
    Field(Symbol, Shape),
    Member(String),
}

/// An argument of a call before it has been matched to a parameter.
struct Arg {
    name: Option<String>,
    value: Symbol,
    shape: Shape,
    span: Span,
}

/// Analyzes a parse tree into the top level block of the program.  A tree
/// whose root is not a program is treated as a program with a single
/// statement.
pub fn analyze_tree(tree: &ParseTree, ctx: &mut AnalysisContext) -> SemanticResult<Block> {
    match tree.kind() {
        Some(NodeKind::Program) => match visit(tree, ctx)? {
            Synth::Block(block, _) => Ok(block),
            _ => invalid(tree.span(), "program did not produce a block"),
        },
        _ => {
            let (statements, _) = statements(std::slice::from_ref(tree), ctx, false)?;
            Ok(Block {
                statements,
                scope: ctx.scope(),
            })
        }
    }
}

fn visit(tree: &ParseTree, ctx: &mut AnalysisContext) -> SemanticResult<Synth> {
    let node = match tree {
        ParseTree::Leaf(token) => {
            let (sym, shape) = leaf(token, ctx)?;
            return Ok(Synth::Value(sym, shape));
        }
        ParseTree::Node(node) => node,
    };

    trace!(ctx.tracing(), ctx.line(node.span), "{}", node.kind);

    match node.kind {
        NodeKind::Program => {
            let (statements, _) = statements(&node.children, ctx, false)?;
            Ok(Synth::Block(
                Block {
                    statements,
                    scope: ctx.scope(),
                },
                None,
            ))
        }
        NodeKind::Statement | NodeKind::Expression | NodeKind::Primary => {
            match node.children.as_slice() {
                [only] => visit(only, ctx),
                _ => invalid(node.span, "wrapper node with several children"),
            }
        }
        NodeKind::Import => import(node, ctx).map(Synth::Statement),
        NodeKind::Definition => definition(node, ctx).map(Synth::Statement),
        NodeKind::Wiring => match node.children.as_slice() {
            [value, target] => connection(target, value, node.span, ctx).map(Synth::Statement),
            _ => invalid(node.span, "malformed wiring"),
        },
        NodeKind::Assignment => match node.children.as_slice() {
            [target, value] => connection(target, value, node.span, ctx).map(Synth::Statement),
            _ => invalid(node.span, "malformed assignment"),
        },
        NodeKind::Return => match node.children.as_slice() {
            [expr] => {
                let (sym, shape) = operand(expr, ctx)?;
                Ok(Synth::Return(sym, shape))
            }
            _ => invalid(node.span, "malformed return"),
        },
        NodeKind::TypeSpec => type_spec(node, ctx).map(Synth::Type),
        NodeKind::Process => process(node, ctx).map(|(sym, shape)| Synth::Value(sym, shape)),
        NodeKind::Parameters => {
            let mut params = vec![];
            for child in &node.children {
                match visit(child, ctx)? {
                    Synth::Param(p) => params.push(p),
                    _ => return invalid(child.span(), "expected a parameter"),
                }
            }
            Ok(Synth::Params(params))
        }
        NodeKind::Parameter => parameter(node, ctx).map(Synth::Param),
        NodeKind::Block => {
            let (statements, ret) = statements(&node.children, ctx, true)?;
            Ok(Synth::Block(
                Block {
                    statements,
                    scope: ctx.scope(),
                },
                ret,
            ))
        }
        NodeKind::BoolOr
        | NodeKind::BoolAnd
        | NodeKind::Comparison
        | NodeKind::BitOr
        | NodeKind::BitXor
        | NodeKind::BitAnd
        | NodeKind::Shift
        | NodeKind::Sum
        | NodeKind::Product
        | NodeKind::Power => binary_chain(node, ctx).map(scalar),
        NodeKind::BoolNot | NodeKind::Unary => prefix(node, ctx).map(scalar),
        NodeKind::Delay => delay(node, ctx).map(scalar),
        NodeKind::Postfix => postfix(node, ctx).map(|(sym, shape)| Synth::Value(sym, shape)),
        NodeKind::Member => match node.children.as_slice() {
            [field] => identifier(field).map(|(name, _)| Synth::Member(name.into())),
            _ => invalid(node.span, "malformed member access"),
        },
        NodeKind::Record => record(node, ctx).map(|(sym, shape)| Synth::Value(sym, shape)),
        NodeKind::Field => match node.children.as_slice() {
            [name, expr] => {
                let (name, _) = identifier(name)?;
                let (mut sym, shape) = operand(expr, ctx)?;
                if let Shape::Process(_) = shape {
                    return err!(expr.span(), SemanticError::ProcessInRecord(name.into()));
                }
                sym.name = Some(name.into());
                Ok(Synth::Field(sym, shape))
            }
            _ => invalid(node.span, "malformed field"),
        },
        NodeKind::List => list(node, ctx).map(|(sym, shape)| Synth::Value(sym, shape)),
        NodeKind::Arguments => {
            let mut args = vec![];
            for child in &node.children {
                match visit(child, ctx)? {
                    Synth::Arg(arg) => args.push(arg),
                    _ => return invalid(child.span(), "expected an argument"),
                }
            }
            Ok(Synth::Args(args))
        }
        NodeKind::Argument => {
            let (name, expr) = match node.children.as_slice() {
                [expr] => (None, expr),
                [name, expr] => (Some(identifier(name)?.0.to_string()), expr),
                _ => return invalid(node.span, "malformed argument"),
            };
            let (value, shape) = operand(expr, ctx)?;
            Ok(Synth::Arg(Arg {
                name,
                value,
                shape,
                span: node.span,
            }))
        }
    }
}

/// Analyzes a list of statements.  When `allow_return` is set the last
/// statement may be a return, which is handed back separately.
fn statements(
    children: &[ParseTree],
    ctx: &mut AnalysisContext,
    allow_return: bool,
) -> SemanticResult<(Vec<Symbol>, Option<(Symbol, Shape)>)> {
    let mut out = vec![];
    let mut ret = None;
    for (idx, child) in children.iter().enumerate() {
        match visit(child, ctx)? {
            Synth::Statement(sym) | Synth::Value(sym, _) => out.push(sym),
            Synth::Return(sym, shape) if allow_return && idx + 1 == children.len() => {
                ret = Some((sym, shape))
            }
            Synth::Return(..) => {
                return err!(child.span(), SemanticError::ReturnInvalidLocation)
            }
            _ => return invalid(child.span(), "expected a statement"),
        }
    }
    Ok((out, ret))
}

fn leaf(token: &Token, ctx: &mut AnalysisContext) -> SemanticResult<(Symbol, Shape)> {
    let literal = match &token.value {
        Some(TokenValue::Ident(name)) => return reference(name, token.span, ctx),
        Some(TokenValue::Int(i)) => Literal::Int(*i),
        Some(TokenValue::Float(f)) => Literal::Float(*f),
        Some(TokenValue::Bool(b)) => Literal::Bool(*b),
        Some(TokenValue::Char(c)) => Literal::Str(c.to_string()),
        Some(TokenValue::Str(s)) => Literal::Str(s.clone()),
        _ => return invalid(token.span, "token without a value in the tree"),
    };

    let shape = Shape::Scalar(literal.primitive());
    Ok((Symbol::immediate(literal, token.span), shape))
}

fn reference(name: &str, span: Span, ctx: &AnalysisContext) -> SemanticResult<(Symbol, Shape)> {
    match ctx.lookup(name) {
        Some(decl) => {
            let target = SymbolRef::new(name, decl.scope);
            let sym = Symbol::reference(target, decl.shape.scalar(), span);
            Ok((sym, decl.shape.clone()))
        }
        None => err!(span, SemanticError::NotDefined(name.into())),
    }
}

fn import(node: &ParseNode, ctx: &mut AnalysisContext) -> SemanticResult<Symbol> {
    let path = node
        .children
        .iter()
        .map(|c| identifier(c).map(|(name, _)| name.to_string()))
        .collect::<SemanticResult<Vec<_>>>()?;
    let name = match path.last() {
        Some(name) => name.clone(),
        None => return invalid(node.span, "import without a path"),
    };

    let scope = ctx.scope();
    ctx.declare(
        &name,
        Declaration {
            decl_type: DeclType::Module,
            shape: Shape::Module,
            scope,
            span: node.span,
            holds_record: false,
        },
    )?;

    let mut sym = Symbol::new(ValueKind::Module, Value::Import(path), node.span);
    sym.bind(&name, scope, DeclType::Module);
    Ok(sym)
}

fn definition(node: &ParseNode, ctx: &mut AnalysisContext) -> SemanticResult<Symbol> {
    let (name_tree, type_tree, expr) = match node.children.as_slice() {
        [name, ty, expr] => (name, ty, expr),
        _ => return invalid(node.span, "malformed definition"),
    };

    let (name, name_span) = identifier(name_tree)?;
    let decl_type = match visit(type_tree, ctx)? {
        Synth::Type(ty) => ty,
        _ => return invalid(type_tree.span(), "expected a type"),
    };
    if decl_type == DeclType::Module {
        return err!(type_tree.span(), SemanticError::ModuleNotImported);
    }

    let (mut sym, shape) = value(expr, ctx)?;
    let shape = check_binding(name, &decl_type, &sym, shape, expr.span(), ctx)?;

    let is_record_literal = sym
        .as_struct()
        .map_or(false, |st| st.is_anonymous && st.kind == StructKind::Record);
    let merges = match ctx.lookup_local(name) {
        Some(existing) if is_record_literal && existing.holds_record => true,
        Some(Declaration {
            shape: Shape::Record(existing),
            ..
        }) if is_record_literal && existing.endpoint.is_none() => {
            return err!(expr.span(), SemanticError::MergeIntoNonLiteral(name.into()))
        }
        _ => false,
    };
    let holds_record = sym.as_struct().map_or(false, |st| match st.kind {
        StructKind::Record | StructKind::Instance(_) => true,
        _ => false,
    });

    if let (DeclType::Custom(ty), Value::Struct(st)) = (&decl_type, &mut sym.value) {
        if st.kind == StructKind::Record {
            st.kind = StructKind::Instance(ty.clone());
        }
    }

    let scope = ctx.scope();
    match shape {
        Shape::Record(fields) if merges => ctx.merge_record(name, fields),
        shape => ctx.declare(
            name,
            Declaration {
                decl_type: decl_type.clone(),
                shape,
                scope,
                span: name_span,
                holds_record,
            },
        )?,
    }

    sym.bind(name, scope, decl_type);
    sym.span = node.span;
    Ok(sym)
}

/// Checks that a value may be bound to a declaration of type `decl_type` and
/// returns the shape the declaration has.
fn check_binding(
    name: &str,
    decl_type: &DeclType,
    sym: &Symbol,
    shape: Shape,
    span: Span,
    ctx: &AnalysisContext,
) -> SemanticResult<Shape> {
    if !decl_type.accepts(&shape) {
        return err!(
            span,
            SemanticError::BindMismatch(name.into(), decl_type.clone(), shape.to_string())
        );
    }
    check_range(decl_type, sym, span)?;

    match (decl_type, shape) {
        (DeclType::Custom(ty), Shape::Record(actual)) => {
            let expected = match ctx.lookup(ty) {
                Some(Declaration {
                    shape: Shape::Record(r),
                    ..
                }) => r.clone(),
                _ => return err!(span, SemanticError::NotAType(ty.clone())),
            };
            check_fields(ty, &expected, &actual.fields, span)?;
            Ok(Shape::Record(RecordShape {
                fields: actual.fields,
                endpoint: None,
                type_name: Some(ty.clone()),
            }))
        }
        (_, shape) => Ok(shape),
    }
}

/// Checks that an immediate integer fits in an integer type.
fn check_range(decl_type: &DeclType, sym: &Symbol, span: Span) -> SemanticResult<()> {
    if let (Some((low, high)), Some(Literal::Int(v))) = (decl_type.int_range(), constant(sym)) {
        if *v < low || *v > high {
            return err!(span, SemanticError::OutOfRange(decl_type.clone(), *v));
        }
    }
    Ok(())
}

/// The literal a symbol stands for.  Delaying a constant leaves it unchanged.
fn constant(sym: &Symbol) -> Option<&Literal> {
    match sym.operation() {
        Some(op) if sym.kind == ValueKind::Delay && sym.delay_depth == 0 => op.lhs.literal(),
        _ => sym.literal(),
    }
}

/// Checks that `actual` has exactly the fields of the record type `ty`.
fn check_fields(
    ty: &str,
    expected: &RecordShape,
    actual: &[(String, Shape)],
    span: Span,
) -> SemanticResult<()> {
    for (field, shape) in &expected.fields {
        match actual.iter().find(|(name, _)| name == field) {
            None => {
                return err!(
                    span,
                    SemanticError::RecordMissingField(ty.into(), field.clone())
                )
            }
            Some((_, found)) if !compatible(shape, found) => {
                return err!(
                    span,
                    SemanticError::RecordFieldMismatch(ty.into(), field.clone(), found.to_string())
                )
            }
            _ => (),
        }
    }

    for (field, _) in actual {
        if expected.field(field).is_none() {
            return err!(
                span,
                SemanticError::RecordUnexpectedField(ty.into(), field.clone())
            );
        }
    }
    Ok(())
}

/// Whether a value of shape `actual` can be used where `expected` is
/// required.
fn compatible(expected: &Shape, actual: &Shape) -> bool {
    match (expected, actual) {
        (_, Shape::External) => true,
        (Shape::Scalar(a), Shape::Scalar(b)) => a == b,
        (Shape::Record(a), Shape::Record(b)) => {
            a.endpoint == b.endpoint
                && a.fields.len() == b.fields.len()
                && a.fields.iter().all(|(name, shape)| {
                    b.field(name)
                        .map_or(false, |other| compatible(shape, other))
                })
        }
        (Shape::Process(a), Shape::Process(b)) => a == b,
        (Shape::Module, Shape::Module) => true,
        _ => false,
    }
}

fn type_spec(node: &ParseNode, ctx: &AnalysisContext) -> SemanticResult<DeclType> {
    let token = match node.children.as_slice() {
        [ParseTree::Leaf(token)] => token,
        _ => return invalid(node.span, "malformed type"),
    };

    if let Some(ty) = DeclType::from_token(token.kind) {
        return Ok(ty);
    }

    match token.ident() {
        Some(name) => match ctx.lookup(name) {
            Some(Declaration {
                shape: Shape::Record(r),
                ..
            }) if r.endpoint.is_none() => Ok(DeclType::Custom(name.into())),
            _ => err!(token.span, SemanticError::NotAType(name.into())),
        },
        None => invalid(token.span, "type is not a keyword or a name"),
    }
}

fn process(node: &ParseNode, ctx: &mut AnalysisContext) -> SemanticResult<(Symbol, Shape)> {
    if ctx.in_process() {
        return err!(node.span, SemanticError::NestedProcess);
    }

    let (params, block) = match node.children.as_slice() {
        [block] => (None, block),
        [params, block] => (Some(params), block),
        _ => return invalid(node.span, "malformed process"),
    };

    ctx.enter_scope();
    ctx.set_in_process(true);
    let result = process_body(params, block, node.span, ctx);
    ctx.set_in_process(false);
    ctx.exit_scope();
    result
}

fn process_body(
    params: Option<&ParseTree>,
    block: &ParseTree,
    span: Span,
    ctx: &mut AnalysisContext,
) -> SemanticResult<(Symbol, Shape)> {
    let params = match params {
        Some(tree) => match visit(tree, ctx)? {
            Synth::Params(params) => params,
            _ => return invalid(tree.span(), "expected parameters"),
        },
        None => vec![],
    };

    let (body, ret) = match visit(block, ctx)? {
        Synth::Block(body, ret) => (body, ret),
        _ => return invalid(block.span(), "expected a block"),
    };

    let (ret, ret_shape) = match ret {
        Some(ret) => ret,
        None => return err!(block.span(), SemanticError::MissingReturn),
    };

    let ret_type = match ret_shape {
        Shape::Scalar(p @ Primitive::Int)
        | Shape::Scalar(p @ Primitive::Float)
        | Shape::Scalar(p @ Primitive::Bool) => p,
        other => return err!(ret.span, SemanticError::InvalidReturnType(other.to_string())),
    };

    let signature = Signature {
        params: params
            .iter()
            .map(|p| (p.name.clone(), p.decl_type.clone()))
            .collect(),
        ret: ret_type,
    };

    let def = ProcessDef { params, body, ret };
    let sym = Symbol::new(ValueKind::Process, Value::Process(Box::new(def)), span);
    Ok((sym, Shape::Process(signature)))
}

fn parameter(node: &ParseNode, ctx: &mut AnalysisContext) -> SemanticResult<Parameter> {
    let (name_tree, type_tree) = match node.children.as_slice() {
        [name, ty] => (name, ty),
        _ => return invalid(node.span, "malformed parameter"),
    };

    let (name, span) = identifier(name_tree)?;
    let decl_type = match visit(type_tree, ctx)? {
        Synth::Type(ty) => ty,
        _ => return invalid(type_tree.span(), "expected a type"),
    };

    let primitive = match decl_type.primitive() {
        Some(p) => p,
        None => {
            return err!(
                type_tree.span(),
                SemanticError::InvalidParameterType(name.into(), decl_type)
            )
        }
    };

    let scope = ctx.scope();
    ctx.declare(
        name,
        Declaration {
            decl_type: decl_type.clone(),
            shape: Shape::Scalar(primitive),
            scope,
            span,
            holds_record: false,
        },
    )?;

    Ok(Parameter {
        name: name.into(),
        decl_type,
        generated_name: mangle::scoped_name(scope, name),
    })
}

fn binary_chain(node: &ParseNode, ctx: &mut AnalysisContext) -> SemanticResult<Symbol> {
    let mut children = node.children.iter();
    let mut acc = match children.next() {
        Some(first) => operand(first, ctx)?.0,
        None => return invalid(node.span, "empty operator chain"),
    };

    while let Some(op_tree) = children.next() {
        let op = match op_tree {
            ParseTree::Leaf(token) => OperatorKind::binary(token.kind),
            _ => None,
        };
        let (op, rhs_tree) = match (op, children.next()) {
            (Some(op), Some(rhs)) => (op, rhs),
            _ => return invalid(op_tree.span(), "expected an operator and an operand"),
        };

        let (rhs, _) = operand(rhs_tree, ctx)?;
        let span = Span::cover(acc.span, rhs.span);
        acc = fold::binary(op, acc, rhs, span)?;
    }

    Ok(acc)
}

fn prefix(node: &ParseNode, ctx: &mut AnalysisContext) -> SemanticResult<Symbol> {
    match node.children.as_slice() {
        [ParseTree::Leaf(token), expr] => {
            let op = match OperatorKind::unary(token.kind) {
                Some(op) => op,
                None => return invalid(token.span, "expected a prefix operator"),
            };
            let (value, _) = operand(expr, ctx)?;
            fold::unary(op, value, node.span)
        }
        _ => invalid(node.span, "malformed prefix operation"),
    }
}

fn delay(node: &ParseNode, ctx: &mut AnalysisContext) -> SemanticResult<Symbol> {
    let mut children = node.children.iter().peekable();
    let mut acc = match children.next() {
        Some(first) => operand(first, ctx)?.0,
        None => return invalid(node.span, "empty delay"),
    };

    while let Some(at) = children.next() {
        let explicit = match children.peek() {
            Some(ParseTree::Leaf(token)) if token.kind == TokenKind::LiterInt => {
                match token.value {
                    Some(TokenValue::Int(n)) => Some(n),
                    _ => return invalid(token.span, "integer literal without a value"),
                }
            }
            _ => None,
        };

        let mut span = Span::cover(acc.span, at.span());
        if explicit.is_some() {
            if let Some(depth) = children.next() {
                span = Span::cover(span, depth.span());
            }
        }

        if acc.kind.is_immediate() {
            let constant = acc
                .literal()
                .map(|l| l.to_string())
                .unwrap_or_default();
            ctx.warn(
                span,
                format!("Delaying the constant {} has no effect", constant),
            );
        }

        acc = fold::delay(acc, explicit.unwrap_or(1), ctx.scope(), span)?;
    }

    Ok(acc)
}

fn postfix(node: &ParseNode, ctx: &mut AnalysisContext) -> SemanticResult<(Symbol, Shape)> {
    let mut children = node.children.iter().peekable();
    let base = match children.next() {
        Some(base) => base,
        None => return invalid(node.span, "empty postfix expression"),
    };

    let calls_builtin = match (base, children.peek()) {
        (ParseTree::Leaf(token), Some(next)) if next.kind() == Some(NodeKind::Arguments) => token
            .ident()
            .filter(|name| (*name == SOURCE || *name == SINK) && ctx.lookup(name).is_none()),
        _ => None,
    };

    let (mut sym, mut shape) = match calls_builtin {
        Some(name) => {
            let args_tree = children.next();
            let args = match args_tree.map(|t| visit(t, ctx)).transpose()? {
                Some(Synth::Args(args)) => args,
                _ => return invalid(node.span, "expected arguments"),
            };
            let span = Span::cover(base.span(), args_tree.map_or(base.span(), |t| t.span()));
            builtin(name, args, span)?
        }
        None => value(base, ctx)?,
    };

    for suffix in children {
        let span = Span::cover(base.span(), suffix.span());
        let (next_sym, next_shape) = match visit(suffix, ctx)? {
            Synth::Member(field) => member(sym, shape, field, span)?,
            Synth::Args(args) => call(sym, shape, args, span, ctx)?,
            _ => return invalid(suffix.span(), "expected a call or a member access"),
        };
        sym = next_sym;
        shape = next_shape;
    }

    Ok((sym, shape))
}

fn member(
    container: Symbol,
    shape: Shape,
    field: String,
    span: Span,
) -> SemanticResult<(Symbol, Shape)> {
    let mut path = match container.access_path() {
        Some(path) => path,
        None => {
            return err!(
                span,
                SemanticError::MemberAccessInvalidRoot(fold::describe(&container))
            )
        }
    };

    let field_shape = match &shape {
        Shape::Record(r) => match r.field(&field) {
            Some(s) => s.clone(),
            None => {
                return err!(
                    span,
                    SemanticError::MemberNotFound(path.to_string(), field)
                )
            }
        },
        Shape::Module | Shape::External => Shape::External,
        other => {
            return err!(
                span,
                SemanticError::MemberAccessInvalidRoot(other.to_string())
            )
        }
    };

    path.fields.push(field.clone());
    let mut holder = container;
    holder.name = Some(field);

    let mut sym = Symbol::new(
        ValueKind::Struct,
        Value::Struct(Struct {
            members: vec![holder],
            is_anonymous: true,
            kind: StructKind::Access,
        }),
        span,
    );
    sym.generated_name = path.generated_name();
    sym.evaluates_to = field_shape.scalar();
    Ok((sym, field_shape))
}

fn call(
    callee: Symbol,
    shape: Shape,
    args: Vec<Arg>,
    span: Span,
    ctx: &mut AnalysisContext,
) -> SemanticResult<(Symbol, Shape)> {
    let target = match callee.access_path() {
        Some(path) if path.fields.is_empty() => path,
        _ => return err!(span, SemanticError::NotCallable(fold::describe(&callee))),
    };

    match shape {
        Shape::Process(sig) => {
            let names: Vec<String> = sig.params.iter().map(|(n, _)| n.clone()).collect();
            let given = args.len();
            let slots = order_arguments(&target.name, &names, args, span)?;

            let mut values = vec![];
            for (slot, (param, ty)) in slots.into_iter().zip(&sig.params) {
                let arg = match slot {
                    Some(arg) => arg,
                    None => {
                        return err!(
                            span,
                            SemanticError::CallWrongNumParams(
                                target.name.clone(),
                                names.len(),
                                given
                            )
                        )
                    }
                };

                if !ty.accepts(&arg.shape) {
                    return err!(
                        arg.span,
                        SemanticError::ArgumentMismatch(
                            param.clone(),
                            ty.clone(),
                            arg.shape.to_string()
                        )
                    );
                }
                check_range(ty, &arg.value, arg.span)?;
                values.push(arg.value);
            }

            let site = ctx.next_call_site();
            let name = mangle::mangle(
                &callee.generated_name,
                &mangle::base32(site as i64),
                CALL_CODE,
            );

            let mut sym = Symbol::new(
                ValueKind::Call,
                Value::Call(Box::new(Call {
                    callee: target,
                    args: values,
                    site,
                })),
                span,
            );
            sym.generated_name = name;
            sym.evaluates_to = Some(sig.ret);
            Ok((sym, Shape::Scalar(sig.ret)))
        }
        Shape::Record(record) if record.endpoint.is_none() => instantiate(&target, &record, args, span),
        _ => err!(span, SemanticError::NotCallable(target.to_string())),
    }
}

/// Builds a record by calling the record type `ty`.
fn instantiate(
    ty: &SymbolRef,
    record: &RecordShape,
    args: Vec<Arg>,
    span: Span,
) -> SemanticResult<(Symbol, Shape)> {
    let names: Vec<String> = record.fields.iter().map(|(n, _)| n.clone()).collect();
    let slots = order_arguments(&ty.name, &names, args, span)?;

    let mut members = vec![];
    for ((field, expected), slot) in record.fields.iter().zip(slots) {
        let arg = match slot {
            Some(arg) => arg,
            None => {
                return err!(
                    span,
                    SemanticError::RecordMissingField(ty.name.clone(), field.clone())
                )
            }
        };

        if !compatible(expected, &arg.shape) {
            return err!(
                arg.span,
                SemanticError::RecordFieldMismatch(
                    ty.name.clone(),
                    field.clone(),
                    arg.shape.to_string()
                )
            );
        }

        let mut member = arg.value;
        member.name = Some(field.clone());
        members.push(member);
    }

    let sym = Symbol::new(
        ValueKind::Struct,
        Value::Struct(Struct {
            members,
            is_anonymous: false,
            kind: StructKind::Instance(ty.name.clone()),
        }),
        span,
    );
    let shape = Shape::Record(RecordShape {
        fields: record.fields.clone(),
        endpoint: None,
        type_name: Some(ty.name.clone()),
    });
    Ok((sym, shape))
}

/// Matches arguments to the parameters `names`.  Positional arguments fill
/// parameters in order and must come before named arguments.  Parameters
/// which are not given are `None`.
fn order_arguments(
    owner: &str,
    names: &[String],
    args: Vec<Arg>,
    span: Span,
) -> SemanticResult<Vec<Option<Arg>>> {
    let given = args.len();
    let mut slots: Vec<Option<Arg>> = names.iter().map(|_| None).collect();
    let mut seen_named = false;

    for (idx, arg) in args.into_iter().enumerate() {
        let slot = match &arg.name {
            Some(name) => {
                seen_named = true;
                match names.iter().position(|p| p == name) {
                    Some(slot) => slot,
                    None => {
                        return err!(
                            arg.span,
                            SemanticError::UnknownParameter(owner.into(), name.clone())
                        )
                    }
                }
            }
            None if seen_named => return err!(arg.span, SemanticError::PositionalAfterNamed),
            None if idx < names.len() => idx,
            None => {
                return err!(
                    span,
                    SemanticError::CallWrongNumParams(owner.into(), names.len(), given)
                )
            }
        };

        if slots[slot].is_some() {
            return err!(arg.span, SemanticError::DuplicateArgument(names[slot].clone()));
        }
        slots[slot] = Some(arg);
    }

    Ok(slots)
}

/// Builds the endpoint records `source(rate)` and `sink()`.
fn builtin(name: &str, args: Vec<Arg>, span: Span) -> SemanticResult<(Symbol, Shape)> {
    let (kind, endpoint, members, fields) = if name == SOURCE {
        let given = args.len();
        let slots = order_arguments(SOURCE, &["rate".to_string()], args, span)?;
        let rate = match slots.into_iter().next().flatten() {
            Some(rate) => rate,
            None => {
                return err!(
                    span,
                    SemanticError::CallWrongNumParams(SOURCE.into(), 1, given)
                )
            }
        };

        let value = match rate.value.literal() {
            Some(Literal::Int(n)) if *n > 0 => *n,
            _ => {
                return err!(
                    rate.span,
                    SemanticError::InvalidSourceRate(fold::describe(&rate.value))
                )
            }
        };

        let mut rate_sym = Symbol::immediate(Literal::Int(value), rate.span);
        rate_sym.name = Some("rate".into());
        let out = endpoint_signal("out", span);
        (
            StructKind::Source,
            Endpoint::Source,
            vec![rate_sym, out],
            vec![
                ("rate".to_string(), Shape::Scalar(Primitive::Int)),
                ("out".to_string(), Shape::Scalar(Primitive::Float)),
            ],
        )
    } else {
        if !args.is_empty() {
            return err!(span, SemanticError::SinkArguments(args.len()));
        }
        (
            StructKind::Sink,
            Endpoint::Sink,
            vec![endpoint_signal("in", span)],
            vec![("in".to_string(), Shape::Scalar(Primitive::Float))],
        )
    };

    let sym = Symbol::new(
        ValueKind::Struct,
        Value::Struct(Struct {
            members,
            is_anonymous: false,
            kind,
        }),
        span,
    );
    let shape = Shape::Record(RecordShape {
        fields,
        endpoint: Some(endpoint),
        type_name: None,
    });
    Ok((sym, shape))
}

/// A run time float signal belonging to an endpoint.
fn endpoint_signal(name: &str, span: Span) -> Symbol {
    let mut sym = Symbol::new(ValueKind::Expression(Primitive::Float), Value::None, span);
    sym.name = Some(name.into());
    sym
}

fn record(node: &ParseNode, ctx: &mut AnalysisContext) -> SemanticResult<(Symbol, Shape)> {
    let mut members: Vec<Symbol> = vec![];
    let mut fields = vec![];
    for child in &node.children {
        let (sym, shape) = match visit(child, ctx)? {
            Synth::Field(sym, shape) => (sym, shape),
            _ => return invalid(child.span(), "expected a field"),
        };

        let name = sym.name.clone().unwrap_or_default();
        if members.iter().any(|m| m.name.as_deref() == Some(name.as_str())) {
            return err!(child.span(), SemanticError::DuplicateField(name));
        }
        fields.push((name, shape));
        members.push(sym);
    }

    let sym = Symbol::new(
        ValueKind::Struct,
        Value::Struct(Struct {
            members,
            is_anonymous: true,
            kind: StructKind::Record,
        }),
        node.span,
    );
    let shape = Shape::Record(RecordShape {
        fields,
        endpoint: None,
        type_name: None,
    });
    Ok((sym, shape))
}

fn list(node: &ParseNode, ctx: &mut AnalysisContext) -> SemanticResult<(Symbol, Shape)> {
    let mut items = vec![];
    for child in &node.children {
        let (sym, _) = operand(child, ctx)?;
        let item = match sym.literal() {
            Some(literal) => literal.clone(),
            None => {
                return err!(
                    child.span(),
                    SemanticError::ListElementNotConstant(fold::describe(&sym))
                )
            }
        };

        if let Some(first) = items.first().map(Literal::primitive) {
            if first != item.primitive() {
                return err!(
                    child.span(),
                    SemanticError::InconsistentListElements(first, item.primitive())
                );
            }
        }
        items.push(item);
    }

    let literal = Literal::List(items);
    Ok((
        Symbol::immediate(literal, node.span),
        Shape::Scalar(Primitive::List),
    ))
}

/// Analyzes a statement which drives the input of a sink with a value.
fn connection(
    target: &ParseTree,
    value_tree: &ParseTree,
    span: Span,
    ctx: &mut AnalysisContext,
) -> SemanticResult<Symbol> {
    let (value, _) = operand(value_tree, ctx)?;

    if let ParseTree::Leaf(_) = target {
        return err!(target.span(), SemanticError::InvalidAssignmentTarget);
    }
    let (target_sym, _) = self::value(target, ctx)?;
    let path = match (&target_sym.value, target_sym.access_path()) {
        (Value::Struct(_), Some(path)) => path,
        _ => return err!(target.span(), SemanticError::InvalidAssignmentTarget),
    };

    let is_sink_input = match ctx.lookup(&path.name) {
        Some(Declaration {
            shape: Shape::Record(r),
            ..
        }) => r.endpoint == Some(Endpoint::Sink) && path.fields.len() == 1 && path.fields[0] == "in",
        _ => false,
    };
    if !is_sink_input {
        return err!(
            target.span(),
            SemanticError::ConnectionToNonSink(path.to_string())
        );
    }

    if value.primitive() != Some(Primitive::Float) {
        return err!(
            value_tree.span(),
            SemanticError::ConnectionExpectsFloat(fold::describe(&value))
        );
    }

    let name = path.generated_name();
    let mut sym = Symbol::new(
        ValueKind::Connection,
        Value::Connection(Box::new(Connection {
            target: path,
            value,
        })),
        span,
    );
    sym.generated_name = name;
    Ok(sym)
}

fn value(tree: &ParseTree, ctx: &mut AnalysisContext) -> SemanticResult<(Symbol, Shape)> {
    match visit(tree, ctx)? {
        Synth::Value(sym, shape) => Ok((sym, shape)),
        _ => invalid(tree.span(), "expected a value"),
    }
}

/// Like [`value`] but rejects members of imported modules, which cannot be
/// computed with.
fn operand(tree: &ParseTree, ctx: &mut AnalysisContext) -> SemanticResult<(Symbol, Shape)> {
    let (sym, shape) = value(tree, ctx)?;
    if shape == Shape::External {
        let name = sym
            .access_path()
            .map(|p| p.to_string())
            .unwrap_or_else(|| sym.generated_name.clone());
        return err!(tree.span(), SemanticError::ExternalValue(name));
    }
    Ok((sym, shape))
}

fn scalar(sym: Symbol) -> Synth {
    let shape = sym
        .primitive()
        .map(Shape::Scalar)
        .unwrap_or(Shape::External);
    Synth::Value(sym, shape)
}

fn identifier(tree: &ParseTree) -> SemanticResult<(&str, Span)> {
    match tree {
        ParseTree::Leaf(token) => match token.ident() {
            Some(name) => Ok((name, token.span)),
            None => invalid(token.span, "expected an identifier"),
        },
        ParseTree::Node(node) => invalid(node.span, "expected an identifier"),
    }
}

fn invalid<T>(span: Span, msg: &str) -> SemanticResult<T> {
    Err(CompilerError::new(
        span,
        SemanticError::InvalidStructure(msg.into()),
    ))
}
