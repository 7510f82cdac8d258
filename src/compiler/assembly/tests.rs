#[cfg(test)]
mod tests {
    use crate::{
        compiler::{
            assembly::{assemble, flatten::Flattener, Assembly, AssemblyError, DeclMap},
            grammar::Grammar,
            ir::{Clock, Literal, OperatorKind, Primitive, Symbol, Value, ValueKind},
            parser::Parser,
            semantics::{analyze, Analysis, SemanticError},
            source::LineMap,
        },
        diagnostics::TracingConfig,
    };

    fn analysis(text: &str) -> Analysis {
        let parser = Parser::new(Grammar::builtin(), "program").unwrap();
        let tree = parser.parse(text).unwrap();
        let lm = LineMap::new(text);
        analyze(&tree, &lm, TracingConfig::Off).unwrap()
    }

    fn run(text: &str) -> Result<Assembly, AssemblyError> {
        let lm = LineMap::new(text);
        assemble(analysis(text), &lm).map_err(|e| e.into_inner())
    }

    fn statements(text: &str) -> Vec<Symbol> {
        match run(text) {
            Ok(assembly) => assembly.program.block.statements,
            Err(err) => panic!("Failed to assemble {:?}: {:?}", text, err),
        }
    }

    fn find<'a>(stmts: &'a [Symbol], generated_name: &str) -> &'a Symbol {
        stmts
            .iter()
            .find(|s| s.generated_name == generated_name)
            .unwrap_or_else(|| panic!("No statement named {}", generated_name))
    }

    #[test]
    fn calls_are_inlined() {
        let stmts = statements(
            "f: process = (a: f32, b: f32) -> { d: f32 = a - b; return d * 2.0; };
             src: record = source(48000);
             y: f32 = f(src.out, 1.0);",
        );

        let names: Vec<_> = stmts.iter().map(|s| s.generated_name.as_str()).collect();
        assert_eq!(names, vec!["main__src", "sc__d", "main__y"]);

        let d = &stmts[1];
        assert_eq!(d.scope_id, Some(2));
        let op = d.operation().unwrap();
        assert_eq!(op.operator, OperatorKind::Sub);
        assert_eq!(op.lhs.kind, ValueKind::Identifier);
        assert_eq!(op.lhs.generated_name, "main__src_out");
        assert_eq!(op.rhs.as_ref().and_then(|r| r.literal()), Some(&Literal::Float(1.0)));

        let y = &stmts[2];
        assert_eq!(y.kind, ValueKind::Expression(Primitive::Float));
        assert_eq!(y.name.as_deref(), Some("y"));
        assert_eq!(y.operation().unwrap().lhs.generated_name, "sc__d");
    }

    #[test]
    fn constant_arguments_are_folded() {
        for (text, expected) in vec![
            ("f: process = (a: i32) -> { return a * 2; }; y: i32 = f(21);", Literal::Int(42)),
            (
                "f: process = (a: f32, b: f32) -> { return a / b + 1.0; }; y: f32 = f(b = 4.0, a = 2.0);",
                Literal::Float(1.5),
            ),
            (
                "f: process = (a: i32) -> { return a * 2; }; g: process = (b: i32) -> { return f(b) + 1; }; y: i32 = g(3);",
                Literal::Int(7),
            ),
            ("f: process = (a: bool) -> { return not a; }; y: bool = f(false);", Literal::Bool(true)),
        ] {
            let stmts = statements(text);
            let y = find(&stmts, "main__y");
            assert_eq!(y.literal(), Some(&expected), "{}", text);
        }
    }

    #[test]
    fn each_call_gets_its_own_scope() {
        let stmts = statements(
            "f: process = (a: f32) -> { return (a @ 1) * 2.0; };
             src: record = source(48000);
             y: f32 = f(src.out);
             z: f32 = f(y);",
        );

        for (name, delay) in vec![
            ("main__y", "_c_1dlybmain__src_out"),
            ("main__z", "_d_1dlybmain__y"),
        ] {
            let sym = find(&stmts, name);
            let lhs = &sym.operation().unwrap().lhs;
            assert_eq!(lhs.kind, ValueKind::Delay, "{}", name);
            assert_eq!(lhs.generated_name, delay);
        }
    }

    #[test]
    fn delaying_an_inlined_constant_warns() {
        let assembly =
            run("f: process = (a: f32) -> { return (a @ 1) * 2.0; }; y: f32 = f(1.0);").unwrap();
        assert_eq!(assembly.warnings.len(), 1);

        let y = find(&assembly.program.block.statements, "main__y");
        assert_eq!(y.operation().unwrap().lhs.delay_depth, 0);
    }

    #[test]
    fn processes_are_removed() {
        let assembly = run("f: process = (a: i32) -> { return a; }; g: process = f;").unwrap();
        assert!(assembly.program.block.statements.is_empty());
        assert!(assembly.program.declarations.is_empty());
    }

    #[test]
    fn flattening_is_idempotent() {
        let analysis = analysis(
            "f: process = (a: f32) -> { d: f32 = a * 0.5; return d; }; src: record = source(8000); y: f32 = f(src.out);",
        );
        let map = DeclMap::build(&analysis.block).unwrap();
        let once = Flattener::new(&map, analysis.scope_count)
            .run(analysis.block)
            .unwrap();

        let map = DeclMap::build(&once).unwrap();
        let twice = Flattener::new(&map, analysis.scope_count + 1)
            .run(once.clone())
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn field_accesses_become_references() {
        let stmts = statements(
            "src: record = source(48000); snk: record = sink(); snk.in = src.out * 0.5;",
        );

        let conn = match &stmts[2].value {
            Value::Connection(conn) => conn,
            other => panic!("Expected a connection, found {:?}", other),
        };
        let lhs = &conn.value.operation().unwrap().lhs;
        assert_eq!(lhs.kind, ValueKind::Identifier);
        match &lhs.value {
            Value::Reference(path) => assert_eq!(path.to_string(), "src.out"),
            other => panic!("Expected a reference, found {:?}", other),
        }
        assert_eq!(lhs.generated_name, "main__src_out");
    }

    #[test]
    fn endpoints_and_clock() {
        let assembly = run(
            "src: record = source(48000);
             other: record = source(rate = 48000);
             snk: record = sink();
             alias: record = src;
             snk.in = alias.out + other.out;",
        )
        .unwrap();

        let program = assembly.program;
        assert_eq!(program.sources.len(), 2);
        assert_eq!(program.sinks.len(), 1);
        assert_eq!(program.sinks[0].generated_name, "main__snk");
        assert_eq!(
            program.clock,
            Some(Clock {
                rate: 48000,
                source: "main__src".into()
            })
        );
    }

    #[test]
    fn no_endpoints_no_clock() {
        let assembly = run("x: i32 = 2 + 3;").unwrap();
        assert_eq!(assembly.program.clock, None);
        assert_eq!(assembly.program.declarations.len(), 1);
        assert_eq!(
            assembly.program.declarations[0].literal(),
            Some(&Literal::Int(5))
        );
    }

    #[test]
    fn records_merge_in_declarations() {
        let assembly =
            run("r: record = { a = 1 }; r: record = { b = 2.0 }; x: f32 = r.b;").unwrap();
        let decls = &assembly.program.declarations;
        assert_eq!(decls.len(), 2);

        let r = decls[0].as_struct().unwrap();
        let fields: Vec<_> = r
            .members
            .iter()
            .map(|m| m.generated_name.as_str())
            .collect();
        assert_eq!(fields, vec!["main__r_a", "main__r_b"]);
    }

    #[test]
    fn imports_are_listed() {
        let assembly = run("import std.math; import io; m: f32 = math.pi;").unwrap();
        assert_eq!(
            assembly.program.imports,
            vec!["std.math".to_string(), "io".to_string()]
        );
    }

    #[test]
    fn assembly_errors() {
        for (text, expected) in vec![
            (
                "src: record = source(48000); snk: record = sink();",
                AssemblyError::UndrivenSink("snk".into()),
            ),
            (
                "src: record = source(48000); snk: record = sink(); snk.in = src.out; snk.in = src.out;",
                AssemblyError::MultiplyDrivenSink("snk".into(), 2),
            ),
            (
                "snk: record = sink(); snk.in = 1.0;",
                AssemblyError::NoSource,
            ),
            (
                "src: record = source(48000); snk: record = sink(); snk.in = 1.0;",
                AssemblyError::SinkWithoutSource("snk".into()),
            ),
            (
                "src: record = source(48000); x: f32 = 1.0; snk: record = sink(); snk.in = x * 2.0;",
                AssemblyError::SinkWithoutSource("snk".into()),
            ),
            (
                "a: record = source(48000); b: record = source(44100); snk: record = sink(); snk.in = a.out;",
                AssemblyError::InconsistentClock("a".into(), 48000, "b".into(), 44100),
            ),
            (
                "f: process = (a: i32) -> { return 10 / a; }; y: i32 = f(0);",
                AssemblyError::Semantic(SemanticError::DivisionByZero),
            ),
        ] {
            assert_eq!(run(text).unwrap_err(), expected, "{}", text);
        }
    }

    #[test]
    fn sources_reached_through_processes() {
        let assembly = run(
            "gain: process = (x: f32, g: f32) -> { return x * g; };
             src: record = source(48000);
             snk: record = sink();
             snk.in = gain(src.out, 0.5);",
        )
        .unwrap();

        let conn = assembly
            .program
            .block
            .statements
            .iter()
            .find(|s| s.kind == ValueKind::Connection)
            .unwrap();
        assert_eq!(conn.generated_name, "main__snk_in");
        match &conn.value {
            Value::Connection(c) => assert_eq!(c.value.generated_name, "_main__src_out_1mul0d5"),
            other => panic!("Expected a connection, found {:?}", other),
        }
    }
}
