//! Planner end-to-end: registration, resolution, expression compilation.

use std::sync::Arc;

use vellum::{CompileError, Planner, StructType, Tag, Type, Value};
use vellum_parser::parse_expr;

fn person() -> Arc<StructType> {
    Arc::new(
        StructType::new("Person")
            .field("Name", Type::Str)
            .field("Age", Type::Int),
    )
}

fn exec(planner: &mut Planner, source: &str, bind: impl FnOnce(&mut vellum::State)) -> Value {
    let expr = planner.compile(&parse_expr(source).unwrap()).unwrap();
    let operand = planner.operand(expr).unwrap();
    let mut state = planner.new_state();
    bind(&mut state);
    operand.exec(&mut state)
}

fn compile_err(planner: &mut Planner, source: &str) -> CompileError {
    planner.compile(&parse_expr(source).unwrap()).unwrap_err()
}

#[test]
fn test_offsets_are_sums_of_preceding_sizes() {
    let mut planner = Planner::new();
    let types = [
        ("a", Type::Int),
        ("b", Type::Bool),
        ("c", Type::Str),
        ("d", Type::ptr(Type::Struct(person()))),
        ("e", Type::slice(Type::Float)),
        ("f", Type::Struct(person())),
    ];

    let mut expected = 0;
    for (name, ty) in &types {
        planner.define_variable(name, ty.clone()).unwrap();
        let accessor = planner.layout().accessor(name).unwrap();
        assert_eq!(accessor.offset, expected, "offset of {}", name);
        expected += ty.size();
    }
    planner.embed_variable("P", Type::Struct(person())).unwrap();
    assert_eq!(planner.layout().accessor("P").unwrap().offset, expected);
}

#[test]
fn test_duplicate_definition_fails() {
    let mut planner = Planner::new();
    planner.define_variable("x", Type::Int).unwrap();
    let err = planner.define_variable("x", Type::Int).unwrap_err();
    assert_eq!(err.to_string(), "variable x already defined, use an explicit prefix");
}

#[test]
fn test_embedded_member_colliding_with_top_level_requires_prefix() {
    let mut planner = Planner::new();
    planner.define_variable("Age", Value::Int(40)).unwrap();
    let err = planner.embed_variable("P", Type::Struct(person())).unwrap_err();
    assert_eq!(err, CompileError::Duplicate("Age".to_string()));

    planner
        .embed_variable_prefixed("P", "person_", Type::Struct(person()))
        .unwrap();
    let ada = Value::record(&person(), [("Name", Value::from("Ada")), ("Age", Value::Int(36))]).unwrap();
    let value = exec(&mut planner, "person_Age - Age", |state| {
        state.set_value("P", ada).unwrap();
    });
    assert_eq!(value, Value::Int(-4));
}

#[test]
fn test_nested_pointers_mark_selectors_indirect() {
    let c = Arc::new(StructType::new("C").field("c", Type::Int));
    let b = Arc::new(StructType::new("B").field("b", Type::ptr(Type::Struct(Arc::clone(&c)))));
    let mut planner = Planner::new();
    planner
        .define_variable("a", Type::ptr(Type::Struct(Arc::clone(&b))))
        .unwrap();

    let inner = Value::ptr_to(Value::record(&c, [("c", Value::Int(7))]).unwrap());
    let outer = Value::ptr_to(Value::record(&b, [("b", inner)]).unwrap());
    let value = exec(&mut planner, "a.b.c", |state| state.set_value("a", outer).unwrap());
    assert_eq!(value, Value::Int(7));

    assert!(planner.selector("a.b").unwrap().indirect);
    assert!(planner.selector("a.b.c").unwrap().indirect);
    assert!(!planner.selector("a").unwrap().indirect);
}

#[test]
fn test_nil_pointer_reads_zero_value() {
    let mut planner = Planner::new();
    planner.define_variable("p", Type::ptr(Type::Struct(person()))).unwrap();
    assert_eq!(exec(&mut planner, "p.Age", |_| {}), Value::Int(0));
}

#[test]
fn test_int_float_unification_allocates_one_temporary() {
    let mut planner = Planner::new();
    planner.define_variable("i", Value::Int(1)).unwrap();
    planner.define_variable("f", Value::Float(2.5)).unwrap();

    let before = planner.layout().len();
    let expr = planner.compile(&parse_expr("i + f").unwrap()).unwrap();
    assert_eq!(expr.ty, Some(Type::Int));
    assert_eq!(planner.layout().len(), before + 1);
    assert_eq!(planner.temporaries(), 1);

    let expr = planner.compile(&parse_expr("f + i").unwrap()).unwrap();
    assert_eq!(expr.ty, Some(Type::Float));
    let operand = planner.operand(expr).unwrap();
    assert_eq!(operand.exec(&mut planner.new_state()), Value::Float(3.5));

    let value = exec(&mut planner, "i + f", |_| {});
    assert_eq!(value, Value::Int(3));
}

#[test]
fn test_comparison_has_its_own_static_type() {
    let mut planner = Planner::new();
    planner.define_variable("i", Value::Int(1)).unwrap();
    let expr = planner.compile(&parse_expr("i < 2.5").unwrap()).unwrap();
    assert_eq!(expr.ty, Some(Type::Bool));
}

#[test]
fn test_same_expression_twice_allocates_distinct_temporaries() {
    let mut planner = Planner::new();
    planner.define_variable("x", Value::Int(5)).unwrap();
    planner.define_variable("y", Value::Int(3)).unwrap();

    let first = planner.compile(&parse_expr("x + y").unwrap()).unwrap();
    let second = planner.compile(&parse_expr("x + y").unwrap()).unwrap();
    assert_ne!(first.selector, second.selector);
    assert!(planner.layout().field("$T0").is_some());
    assert!(planner.layout().field("$T1").is_some());
}

#[test]
fn test_temporaries_do_not_collide_with_variables() {
    let mut planner = Planner::new();
    planner.define_variable("_T0", Value::Int(1)).unwrap();
    planner.define_variable("$T0", Value::Int(2)).unwrap();
    planner.define_variable("x", Value::Int(5)).unwrap();

    let execution = planner.compile_template("{{ x + 1 }}|{{ _T0 + x }}").unwrap();
    let mut state = execution.new_state();
    assert_eq!(execution.render(&mut state), "6|6");
    assert!(planner.layout().field("$T1").is_some());
    assert_eq!(state.value("$T0").unwrap(), &Value::Int(2));
}

#[test]
fn test_repeat_with_huge_count_renders_empty() {
    let mut planner = Planner::new();
    planner.define_variable("s", Value::from("ab")).unwrap();
    let execution = planner
        .compile_template("[{{ s.repeat(9223372036854775807) }}]")
        .unwrap();
    let mut state = execution.new_state();
    assert_eq!(execution.render(&mut state), "[]");
}

#[test]
fn test_parentheses_allocate_nothing() {
    let mut planner = Planner::new();
    planner.define_variable("x", Value::Int(5)).unwrap();
    let before = planner.layout().len();
    planner.compile(&parse_expr("((x))").unwrap()).unwrap();
    assert_eq!(planner.layout().len(), before);
}

#[test]
fn test_x_plus_y() {
    let mut planner = Planner::new();
    planner.define_variable("x", Value::Int(5)).unwrap();
    planner.define_variable("y", Value::Int(3)).unwrap();
    assert_eq!(exec(&mut planner, "x + y", |_| {}), Value::Int(8));
}

#[test]
fn test_pointer_member_read_is_indirect() {
    let st = Arc::new(StructType::default().field("Name", Type::Str));
    let mut planner = Planner::new();
    planner.define_variable("p", Type::ptr(Type::Struct(Arc::clone(&st)))).unwrap();

    let record = Value::record(&st, [("Name", Value::from("A"))]).unwrap();
    let value = exec(&mut planner, "p.Name", |state| {
        state.set_value("p", Value::ptr_to(record)).unwrap();
    });
    assert_eq!(value, Value::from("A"));
    assert!(planner.selector("p.Name").unwrap().indirect);
}

#[test]
fn test_promoted_and_aliased_members() {
    let employee = StructType::new("Employee")
        .embed("Person", Type::Struct(person()))
        .tagged("Salary", Type::Float, Tag::parse("names=pay"));
    let employee = Arc::new(employee);
    let mut planner = Planner::new();
    planner.define_variable("e", Type::Struct(Arc::clone(&employee))).unwrap();

    let ada = Value::record(&person(), [("Name", Value::from("Ada"))]).unwrap();
    let record = Value::record(&employee, [("Person", ada), ("Salary", Value::Float(10.0))]).unwrap();
    let value = exec(&mut planner, r#"e.Name + " earns " + e.pay"#, |state| {
        state.set_value("e", record).unwrap();
    });
    assert_eq!(value, Value::from("Ada earns 10"));
}

#[test]
fn test_member_promoted_through_pointer_is_indirect() {
    let emp = Arc::new(StructType::new("Emp").embed("Person", Type::ptr(Type::Struct(person()))));
    let mut planner = Planner::new();
    planner.define_variable("e", Type::Struct(Arc::clone(&emp))).unwrap();

    let ada = Value::record(&person(), [("Name", Value::from("Ada"))]).unwrap();
    let record = Value::record(&emp, [("Person", Value::ptr_to(ada))]).unwrap();
    let value = exec(&mut planner, "e.Name", |state| state.set_value("e", record).unwrap());
    assert_eq!(value, Value::from("Ada"));
    assert!(planner.selector("e.Name").unwrap().indirect);

    assert_eq!(exec(&mut planner, "e.Age", |_| {}), Value::Int(0));
}

#[test]
fn test_function_calls() {
    let mut planner = Planner::new();
    planner.define_variable("s", Value::from("  abc ")).unwrap();
    planner.define_variable("n", Value::Int(1)).unwrap();

    assert_eq!(exec(&mut planner, "s.trim().upper()", |_| {}), Value::from("ABC"));
    assert_eq!(
        exec(&mut planner, "s.trim().repeat(n + 1)", |_| {}),
        Value::from("abcabc")
    );
    assert_eq!(exec(&mut planner, "s.len() * 2", |_| {}), Value::Int(12));
}

#[test]
fn test_resolution_errors() {
    let st = StructType::new("User")
        .field("Name", Type::Str)
        .tagged("Secret", Type::Str, Tag::parse("omit"));
    let mut planner = Planner::new();
    planner.define_variable("u", Type::structure(st)).unwrap();
    planner.define_variable("s", Type::Str).unwrap();

    assert_eq!(
        compile_err(&mut planner, "missing"),
        CompileError::UnknownVariable("missing".to_string())
    );
    assert_eq!(
        compile_err(&mut planner, "u.Nope"),
        CompileError::FieldNotFound {
            field: "Nope".to_string(),
            ty: "User".to_string(),
        }
    );
    assert_eq!(
        compile_err(&mut planner, "u.Secret"),
        CompileError::FieldOmitted("u.Secret".to_string())
    );
    assert_eq!(
        compile_err(&mut planner, "s.shout()"),
        CompileError::UnknownFunction("shout".to_string())
    );
    assert_eq!(
        compile_err(&mut planner, "s.upper(1)"),
        CompileError::ArityMismatch {
            name: "upper".to_string(),
            expected: "1".to_string(),
            found: 2,
        }
    );
}

#[test]
fn test_unsupported_operator_names_operator_and_type() {
    let mut planner = Planner::new();
    let err = compile_err(&mut planner, "true + 1");
    assert_eq!(err.to_string(), "unsupported + use on bool");
}

#[test]
fn test_integer_division_by_zero_is_nil() {
    let mut planner = Planner::new();
    planner.define_variable("x", Value::Int(5)).unwrap();
    assert_eq!(exec(&mut planner, "x / 0", |_| {}), Value::Nil);
}

#[test]
fn test_user_function_registration() {
    let mut functions = vellum::Functions::new();
    functions.register(vellum::Function::new(
        "double",
        vellum::Arity::Fixed(1),
        Type::Int,
        |args| Value::Int(args[0].as_i64() * 2),
    ));
    let mut planner = Planner::new().with_functions(Arc::new(functions));
    planner.define_variable("x", Value::Int(21)).unwrap();
    assert_eq!(exec(&mut planner, "x.double()", |_| {}), Value::Int(42));
}
