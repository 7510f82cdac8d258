#[cfg(test)]
mod tests {
    use crate::{
        compiler::{
            grammar::Grammar,
            ir::{
                DeclType, Literal, OperatorKind, Primitive, StructKind, Symbol, Value, ValueKind,
            },
            parser::Parser,
            semantics::{analyze, Analysis, SemanticError},
            source::LineMap,
        },
        diagnostics::TracingConfig,
    };

    fn run(text: &str) -> Result<Analysis, SemanticError> {
        let parser = Parser::new(Grammar::builtin(), "program").unwrap();
        let tree = parser.parse(text).unwrap();
        let lm = LineMap::new(text);
        analyze(&tree, &lm, TracingConfig::Off).map_err(|e| e.into_inner())
    }

    fn statements(text: &str) -> Vec<Symbol> {
        match run(text) {
            Ok(analysis) => analysis.block.statements,
            Err(err) => panic!("Failed to analyze {:?}: {:?}", text, err),
        }
    }

    fn last(text: &str) -> Symbol {
        statements(text).pop().unwrap()
    }

    #[test]
    fn definition_of_constant() {
        let x = last("x: i32 = 2 + 3;");
        assert_eq!(x.name.as_deref(), Some("x"));
        assert_eq!(x.literal(), Some(&Literal::Int(5)));
        assert_eq!(x.kind, ValueKind::Immediate(Primitive::Int));
        assert_eq!(x.generated_name, "main__x");
        assert_eq!(x.scope_id, Some(0));
        assert_eq!(x.decl_type, Some(DeclType::I32));
    }

    #[test]
    fn constant_folding() {
        for (text, expected) in vec![
            ("x: i64 = -7 / 2;", Literal::Int(-3)),
            ("x: i64 = -7 % 3;", Literal::Int(-1)),
            ("x: i64 = 2 ** 10;", Literal::Int(1024)),
            ("x: i64 = 2 ** 3 ** 2;", Literal::Int(512)),
            ("x: i64 = 1 << 4;", Literal::Int(16)),
            ("x: i64 = -16 >> 2;", Literal::Int(-4)),
            ("x: i64 = 6 & 3;", Literal::Int(2)),
            ("x: i64 = 6 | 3;", Literal::Int(7)),
            ("x: i64 = 6 ^ 3;", Literal::Int(5)),
            ("x: i64 = ~0;", Literal::Int(-1)),
            ("x: i64 = - 5;", Literal::Int(-5)),
            ("x: i64 = 2 + 3 * 4;", Literal::Int(14)),
            ("x: i64 = (2 + 3) * 4;", Literal::Int(20)),
            ("x: f64 = 1.5 * 2.0;", Literal::Float(3.0)),
            ("x: f64 = 7.5 % 2.0;", Literal::Float(1.5)),
            ("x: f64 = 2.0 ** 3.0;", Literal::Float(8.0)),
            ("x: number = 2.5 - 0.5;", Literal::Float(2.0)),
            ("x: bool = 1 < 2;", Literal::Bool(true)),
            ("x: bool = true and false;", Literal::Bool(false)),
            ("x: bool = not true or true;", Literal::Bool(true)),
            ("x: bool = 2.5 >= 2.5;", Literal::Bool(true)),
            ("x: bool = true != false;", Literal::Bool(true)),
        ] {
            let x = last(text);
            assert_eq!(x.literal(), Some(&expected), "{}", text);
        }
    }

    #[test]
    fn semantic_errors() {
        for (text, expected) in vec![
            (
                "x: i32 = 1 + 2.0;",
                SemanticError::CannotImplicitlyCast(OperatorKind::Add, Primitive::Int, Primitive::Float),
            ),
            ("x: i32 = 1 / 0;", SemanticError::DivisionByZero),
            ("x: f32 = 1.0 / 0.0;", SemanticError::DivisionByZero),
            (
                "x: i64 = 9223372036854775807 + 1;",
                SemanticError::Overflow(OperatorKind::Add),
            ),
            ("x: i32 = 2 ** -1;", SemanticError::NegativeExponent(-1)),
            ("x: i32 = 1 << 64;", SemanticError::ShiftOutOfRange(64)),
            ("x: byte = 256;", SemanticError::OutOfRange(DeclType::Byte, 256)),
            ("b: byte = 300 @;", SemanticError::OutOfRange(DeclType::Byte, 300)),
            (
                "f: process = (x: byte) -> { return x; }; y: i32 = f(300 @);",
                SemanticError::OutOfRange(DeclType::Byte, 300),
            ),
            (
                "x: i32 = 2.0;",
                SemanticError::BindMismatch("x".into(), DeclType::I32, "float".into()),
            ),
            (
                "x: bool = 1;",
                SemanticError::BindMismatch("x".into(), DeclType::Bool, "int".into()),
            ),
            ("x: i32 = y;", SemanticError::NotDefined("y".into())),
            (
                "x: i32 = 1; x: i32 = 2;",
                SemanticError::AlreadyDeclared("x".into()),
            ),
            (
                "x: i32 = true + 1;",
                SemanticError::OpExpected(OperatorKind::Add, "int or float", "bool".into()),
            ),
            (
                "x: f32 = 1.0 & 2.0;",
                SemanticError::OpExpected(OperatorKind::BitAnd, "int", "float".into()),
            ),
            (
                "x: f32 = ~1.5;",
                SemanticError::OpExpected(OperatorKind::BitNot, "int", "float".into()),
            ),
            ("return 1;", SemanticError::ReturnInvalidLocation),
            ("m: module = 1;", SemanticError::ModuleNotImported),
            ("p: Point = { x = 1.0 };", SemanticError::NotAType("Point".into())),
            (
                "f: process = (x: number) -> { return x; };",
                SemanticError::InvalidParameterType("x".into(), DeclType::Number),
            ),
            (
                "f: process = (x: f32) -> { y: f32 = x; };",
                SemanticError::MissingReturn,
            ),
            (
                "f: process = (x: f32) -> { return x; y: f32 = x; };",
                SemanticError::ReturnInvalidLocation,
            ),
            (
                "f: process = () -> { g: process = () -> { return 1; }; return 1; };",
                SemanticError::NestedProcess,
            ),
            ("x: i32 = 3 @ 0;", SemanticError::InvalidDelay(0)),
            ("x: f32 = 1.0; y: f32 = x @ -2;", SemanticError::InvalidDelay(-2)),
            (
                "s: record = source(0);",
                SemanticError::InvalidSourceRate("int".into()),
            ),
            ("s: record = sink(1);", SemanticError::SinkArguments(1)),
            (
                "s: record = source(48000); s.out = 1.0;",
                SemanticError::ConnectionToNonSink("s.out".into()),
            ),
            (
                "k: record = sink(); k.in = 1;",
                SemanticError::ConnectionExpectsFloat("int".into()),
            ),
            ("x: i32 = 1; x = 2;", SemanticError::InvalidAssignmentTarget),
            (
                "f: process = (x: f32) -> { return x; }; y: f32 = f(1.0, 2.0);",
                SemanticError::CallWrongNumParams("f".into(), 1, 2),
            ),
            (
                "f: process = (x: f32) -> { return x; }; y: f32 = f();",
                SemanticError::CallWrongNumParams("f".into(), 1, 0),
            ),
            (
                "f: process = (x: f32) -> { return x; }; y: f32 = f(z = 1.0);",
                SemanticError::UnknownParameter("f".into(), "z".into()),
            ),
            (
                "f: process = (x: f32) -> { return x; }; y: f32 = f(1);",
                SemanticError::ArgumentMismatch("x".into(), DeclType::F32, "int".into()),
            ),
            (
                "f: process = (a: f32, b: f32) -> { return a; }; y: f32 = f(a = 1.0, 2.0);",
                SemanticError::PositionalAfterNamed,
            ),
            (
                "r: record = { a = 1 }; x: i32 = r.b;",
                SemanticError::MemberNotFound("r".into(), "b".into()),
            ),
            (
                "x: i32 = 1; y: i32 = x.a;",
                SemanticError::MemberAccessInvalidRoot("int".into()),
            ),
            ("x: i32 = 5; y: i32 = x(1);", SemanticError::NotCallable("x".into())),
            (
                "l: record = { v = [1, 2.0] };",
                SemanticError::InconsistentListElements(Primitive::Int, Primitive::Float),
            ),
            (
                "r: record = { a = 1, a = 2 };",
                SemanticError::DuplicateField("a".into()),
            ),
            (
                "r: record = { p = () -> { return 1.0; } };",
                SemanticError::ProcessInRecord("p".into()),
            ),
            (
                "q: record = { a = 1 }; r: record = q; r: record = { b = 2 };",
                SemanticError::MergeIntoNonLiteral("r".into()),
            ),
            (
                "q: record = { a = { c = 1 } }; r: record = q.a; r: record = { b = 2 };",
                SemanticError::MergeIntoNonLiteral("r".into()),
            ),
            (
                "import std.math; x: f32 = math.pi + 1.0;",
                SemanticError::ExternalValue("math.pi".into()),
            ),
            (
                "Point: record = { x = 0.0, y = 0.0 }; p: Point = { x = 1.0 };",
                SemanticError::RecordMissingField("Point".into(), "y".into()),
            ),
            (
                "Point: record = { x = 0.0, y = 0.0 }; p: Point = { x = 1.0, y = 2.0, z = 3.0 };",
                SemanticError::RecordUnexpectedField("Point".into(), "z".into()),
            ),
            (
                "Point: record = { x = 0.0, y = 0.0 }; p: Point = Point(x = 1, y = 2.0);",
                SemanticError::RecordFieldMismatch("Point".into(), "x".into(), "int".into()),
            ),
        ] {
            match run(text) {
                Ok(_) => panic!("Expected {:?} for {:?}", expected, text),
                Err(err) => assert_eq!(err, expected, "{}", text),
            }
        }
    }

    #[test]
    fn expression_names() {
        for (text, expected) in vec![
            ("x: f32 = 1.0; x * 2.0;", "_main__x_1mul2d0"),
            ("x: i32 = 1; 3 - x;", "_3_1submain__x"),
            ("x: f32 = 1.0; -x;", "_1negmain__x"),
            ("x: bool = true; not x;", "_1notmain__x"),
            ("x: f32 = 1.0; y: f32 = 2.0; x < y;", "_main__x_1cltmain__y"),
            ("x: i32 = 1; (x + 1) * 2;", "__main__x_1add1_1mul2"),
        ] {
            let sym = last(text);
            assert_eq!(sym.generated_name, expected, "{}", text);
        }
    }

    #[test]
    fn identifiers_are_not_propagated() {
        let y = last("x: i32 = 2; y: i32 = x + 1;");
        assert_eq!(y.kind, ValueKind::Expression(Primitive::Int));
        assert_eq!(y.generated_name, "main__y");

        let op = y.operation().unwrap();
        assert_eq!(op.operator, OperatorKind::Add);
        assert_eq!(op.lhs.kind, ValueKind::Identifier);
        assert_eq!(op.lhs.generated_name, "main__x");
        assert_eq!(op.rhs.as_ref().and_then(|r| r.literal()), Some(&Literal::Int(1)));
    }

    #[test]
    fn delays() {
        for (text, name, depth) in vec![
            ("x: f32 = 1.0; x @;", "_a_1dlybmain__x", 1),
            ("x: f32 = 1.0; x @ 3;", "_a_1dlydmain__x", 3),
            ("x: f32 = 1.0; x @ @ 2;", "_a_1dlydmain__x", 3),
            ("x: f32 = 1.0; (x @ 2) @ 3;", "_a_1dlyfmain__x", 5),
        ] {
            let sym = last(text);
            assert_eq!(sym.kind, ValueKind::Delay, "{}", text);
            assert!(sym.is_delay);
            assert_eq!(sym.generated_name, name, "{}", text);
            assert_eq!(sym.delay_depth, depth, "{}", text);
            assert_eq!(sym.primitive(), Some(Primitive::Float));
        }
    }

    #[test]
    fn delay_of_constant_warns() {
        let analysis = run("true @;").unwrap();
        assert_eq!(analysis.warnings.len(), 1);
        assert_eq!(
            analysis.warnings[0].position.map(|p| (p.line, p.column)),
            Some((1, 1))
        );

        let sym = &analysis.block.statements[0];
        assert_eq!(sym.kind, ValueKind::Delay);
        assert_eq!(sym.delay_depth, 0);
        assert_eq!(sym.primitive(), Some(Primitive::Bool));
    }

    #[test]
    fn process_scopes() {
        let analysis =
            run("x: i32 = 1; f: process = (x: f32) -> { y: f32 = x * 2.0; return y; };").unwrap();
        assert_eq!(analysis.scope_count, 2);

        let f = &analysis.block.statements[1];
        assert_eq!(f.kind, ValueKind::Process);
        assert_eq!(f.generated_name, "main__f");
        let def = match &f.value {
            Value::Process(def) => def,
            other => panic!("Expected a process, found {:?}", other),
        };

        assert_eq!(def.scope(), 1);
        assert_eq!(def.params[0].generated_name, "sb__x");
        let y = &def.body.statements[0];
        assert_eq!(y.generated_name, "sb__y");
        assert_eq!(y.scope_id, Some(1));
        assert_eq!(y.operation().unwrap().lhs.generated_name, "sb__x");
        assert_eq!(def.ret.generated_name, "sb__y");
    }

    #[test]
    fn calls() {
        let stmts = statements(
            "f: process = (a: f32, b: f32) -> { return a - b; }; y: f32 = f(b = 1.0, a = 2.0); f(1.0, 2.0);",
        );

        let y = &stmts[1];
        assert_eq!(y.kind, ValueKind::Call);
        assert_eq!(y.primitive(), Some(Primitive::Float));
        let call = match &y.value {
            Value::Call(call) => call,
            other => panic!("Expected a call, found {:?}", other),
        };
        assert_eq!(call.callee.name, "f");
        assert_eq!(call.site, 0);
        let args: Vec<_> = call.args.iter().map(|a| a.literal().cloned()).collect();
        assert_eq!(
            args,
            vec![Some(Literal::Float(2.0)), Some(Literal::Float(1.0))]
        );

        assert_eq!(stmts[2].generated_name, "_main__f_1calb");
    }

    #[test]
    fn records() {
        let stmts = statements(
            "Point: record = { x = 0.0, y = 0.0 };
             p: Point = Point(y = 2.0, x = 1.0);
             q: Point = { x = 3.0, y = 4.0 };
             z: f64 = p.x;",
        );

        let p = stmts[1].as_struct().unwrap();
        assert_eq!(p.kind, StructKind::Instance("Point".into()));
        assert!(!p.is_anonymous);
        let fields: Vec<_> = p
            .members
            .iter()
            .map(|m| (m.generated_name.clone(), m.literal().cloned()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("main__p_x".to_string(), Some(Literal::Float(1.0))),
                ("main__p_y".to_string(), Some(Literal::Float(2.0))),
            ]
        );

        let q = stmts[2].as_struct().unwrap();
        assert_eq!(q.kind, StructKind::Instance("Point".into()));
        assert!(q.is_anonymous);

        let z = &stmts[3];
        assert_eq!(z.primitive(), Some(Primitive::Float));
        assert_eq!(z.access_path().map(|p| p.to_string()), Some("p.x".to_string()));
    }

    #[test]
    fn record_redeclaration_merges_fields() {
        let stmts = statements("r: record = { a = 1 }; r: record = { b = 2.0 }; x: f32 = r.b; y: i32 = r.a;");
        assert_eq!(stmts.len(), 4);
        assert_eq!(stmts[2].primitive(), Some(Primitive::Float));
        assert_eq!(stmts[3].primitive(), Some(Primitive::Int));

        assert_eq!(
            run("k: record = sink(); k: record = { b = 2.0 };").unwrap_err(),
            SemanticError::AlreadyDeclared("k".into())
        );
    }

    #[test]
    fn endpoints_and_connections() {
        for text in vec![
            "src: record = source(48000); snk: record = sink(); snk.in = src.out * 0.5;",
            "src: record = source(rate = 48000); snk: record = sink(); attach src.out * 0.5 -> snk.in;",
        ] {
            let stmts = statements(text);

            let src = stmts[0].as_struct().unwrap();
            assert_eq!(src.kind, StructKind::Source);
            assert_eq!(
                src.member("rate").and_then(|r| r.literal()),
                Some(&Literal::Int(48000))
            );
            assert_eq!(src.member("out").unwrap().generated_name, "main__src_out");

            let conn = &stmts[2];
            assert_eq!(conn.kind, ValueKind::Connection, "{}", text);
            assert_eq!(conn.generated_name, "main__snk_in");
            match &conn.value {
                Value::Connection(c) => {
                    assert_eq!(c.target.to_string(), "snk.in");
                    assert_eq!(c.value.generated_name, "_main__src_out_1mul0d5");
                }
                other => panic!("Expected a connection, found {:?}", other),
            }
        }
    }

    #[test]
    fn imports_declare_modules() {
        let stmts = statements("import std.math; m: f32 = math.pi;");
        assert_eq!(stmts[0].kind, ValueKind::Module);
        assert_eq!(stmts[0].name.as_deref(), Some("math"));
        assert_eq!(
            stmts[0].value,
            Value::Import(vec!["std".into(), "math".into()])
        );
        assert_eq!(stmts[1].decl_type, Some(DeclType::F32));
    }

    #[test]
    fn inner_scopes_shadow_outer_names() {
        let stmts = statements("x: i32 = 1; f: process = (x: f32) -> { return x * 2.0; };");
        match &stmts[1].value {
            Value::Process(def) => {
                assert_eq!(def.ret.primitive(), Some(Primitive::Float));
                assert_eq!(def.ret.generated_name, "_sb__x_1mul2d0");
            }
            other => panic!("Expected a process, found {:?}", other),
        }
    }

    #[test]
    fn narrower_root_is_a_single_statement() {
        let text = "1 + 2";
        let parser = Parser::new(Grammar::builtin(), "expression").unwrap();
        let tree = parser.parse(text).unwrap();
        let lm = LineMap::new(text);
        let analysis = analyze(&tree, &lm, TracingConfig::Off).unwrap();
        assert_eq!(analysis.block.statements.len(), 1);
        assert_eq!(
            analysis.block.statements[0].literal(),
            Some(&Literal::Int(3))
        );
    }
}
