//! Templates and dynamic sub-templates.

use std::sync::Arc;
use std::thread;

use vellum::{EvaluateError, Planner, PlannerConfig, StructType, Type, Value};

#[test]
fn test_render_template() {
    let mut planner = Planner::new();
    planner.define_variable("x", Value::Int(5)).unwrap();
    planner.define_variable("y", Value::Int(3)).unwrap();
    let execution = planner.compile_template("x + y = {{ x + y }}!").unwrap();

    let mut state = execution.new_state();
    assert_eq!(execution.render(&mut state), "x + y = 8!");
    state.set_value("y", 10i64).unwrap();
    assert_eq!(execution.render(&mut state), "x + y = 15!");
}

#[test]
fn test_dynamic_template_twice_compiles_once() {
    let mut planner = Planner::new();
    planner.define_variable("tpl", Value::from("{{1+1}}")).unwrap();
    let execution = planner
        .compile_template("{{ evaluate(tpl) }}|{{ evaluate(tpl) }}")
        .unwrap();

    let mut state = execution.new_state();
    assert_eq!(execution.render(&mut state), "2|2");
    assert_eq!(planner.cache().len(), 1);
    assert!(planner.cache().contains("{{1+1}}"));
    assert!(state.diagnostics().is_empty());
}

#[test]
fn test_evaluator_returns_same_value_for_same_text() {
    let planner = Planner::new();
    let evaluator = planner.evaluator();
    let mut state = planner.new_state();
    assert_eq!(evaluator.evaluate(&mut state, "{{1+1}}"), Value::from("2"));
    assert_eq!(evaluator.evaluate(&mut state, "{{1+1}}"), Value::from("2"));
    assert_eq!(evaluator.cache().len(), 1);
}

#[test]
fn test_dynamic_template_sees_outer_variables() {
    let mut planner = Planner::new();
    planner.define_variable("name", Type::Str).unwrap();
    planner.define_variable("tpl", Type::Str).unwrap();
    let execution = planner.compile_template("[{{ evaluate(tpl) }}]").unwrap();

    let mut state = execution.new_state();
    state.set_value("tpl", "Hello {{ name.upper() }}").unwrap();
    state.set_value("name", "ada").unwrap();
    assert_eq!(execution.render(&mut state), "[Hello ADA]");

    state.set_value("name", "grace").unwrap();
    assert_eq!(execution.render(&mut state), "[Hello GRACE]");
    assert_eq!(planner.cache().len(), 1);
}

#[test]
fn test_dynamic_template_sees_embedded_members() {
    let person = Arc::new(StructType::new("Person").field("Name", Type::Str));
    let mut planner = Planner::new();
    let ada = Value::record(&person, [("Name", Value::from("Ada"))]).unwrap();
    planner.embed_variable("P", ada).unwrap();
    planner.define_variable("tpl", Value::from("{{ Name }}!")).unwrap();

    let execution = planner.compile_template("{{ evaluate(tpl) }}").unwrap();
    let mut state = execution.new_state();
    assert_eq!(execution.render(&mut state), "Ada!");
}

#[test]
fn test_parse_failure_renders_empty() {
    let mut planner = Planner::new();
    planner.define_variable("tpl", Value::from("{{ 1 +")).unwrap();
    let execution = planner
        .compile_template("<{{ evaluate(tpl) }}>")
        .unwrap();

    let mut state = execution.new_state();
    assert_eq!(execution.render(&mut state), "<>");
    assert_eq!(state.diagnostics().len(), 1);
    assert!(planner.cache().is_empty());
}

#[test]
fn test_compile_failure_is_a_diagnostic() {
    let planner = Planner::new();
    let evaluator = planner.evaluator();
    let mut state = planner.new_state();
    assert_eq!(evaluator.evaluate(&mut state, "{{ nobody.Name }}"), Value::from(""));

    let diagnostics = state.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    let err = diagnostics[0].downcast_ref::<EvaluateError>().unwrap();
    assert!(matches!(err, EvaluateError::Compile { .. }));
}

#[test]
fn test_cached_plan_needs_matching_scope() {
    let mut planner = Planner::new();
    planner.define_variable("t", Type::Str).unwrap();
    let narrow = planner.compile_template("{{ evaluate(t) }}").unwrap();
    planner.define_variable("b", Value::Int(7)).unwrap();
    let wide = planner.compile_template("{{ evaluate(t) }}").unwrap();

    let mut state = wide.new_state();
    state.set_value("t", "{{ b }}").unwrap();
    assert_eq!(wide.render(&mut state), "7");
    assert!(planner.cache().contains("{{ b }}"));

    let mut state = narrow.new_state();
    state.set_value("t", "{{ b }}").unwrap();
    assert_eq!(narrow.render(&mut state), "");
    let diagnostics = state.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    let err = diagnostics[0].downcast_ref::<EvaluateError>().unwrap();
    assert!(matches!(err, EvaluateError::Compile { .. }));

    // A failed compile leaves the cached plan in place.
    let mut state = wide.new_state();
    state.set_value("t", "{{ b }}").unwrap();
    assert_eq!(wide.render(&mut state), "7");
}

#[test]
fn test_nested_dynamic_templates() {
    let mut planner = Planner::new();
    planner.define_variable("inner", Value::from("{{ 2 * 3 }}")).unwrap();
    planner
        .define_variable("outer", Value::from("({{ evaluate(inner) }})"))
        .unwrap();
    let execution = planner.compile_template("{{ evaluate(outer) }}").unwrap();
    let mut state = execution.new_state();
    assert_eq!(execution.render(&mut state), "(6)");
}

#[test]
fn test_bounded_cache_evicts_oldest() {
    let config = PlannerConfig {
        cache_size: 1,
        ..PlannerConfig::default()
    };
    let planner = Planner::with_config(config);
    let evaluator = planner.evaluator();
    let mut state = planner.new_state();
    evaluator.evaluate(&mut state, "a");
    evaluator.evaluate(&mut state, "b");
    assert_eq!(evaluator.cache().len(), 1);
    assert!(evaluator.cache().contains("b"));
}

#[test]
fn test_concurrent_evaluations_share_one_plan() {
    let mut planner = Planner::new();
    planner.define_variable("n", Type::Int).unwrap();
    planner.define_variable("tpl", Value::from("n={{ n }}")).unwrap();
    let execution = planner.compile_template("{{ evaluate(tpl) }}").unwrap();

    thread::scope(|scope| {
        for n in 0..8i64 {
            let execution = &execution;
            scope.spawn(move || {
                for _ in 0..16 {
                    let mut state = execution.new_state();
                    state.set_value("n", n).unwrap();
                    assert_eq!(execution.render(&mut state), format!("n={}", n));
                }
            });
        }
    });
    assert_eq!(planner.cache().len(), 1);
}
