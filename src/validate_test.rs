//! Tests of the module validator: declaration handlers, initializer
//! expressions, deferred cross-section checks, and the instruction entry
//! points that consult the registries.

use crate::{
    diagnostics::{ErrorKind, Location},
    features::Features,
    opcode::Opcode,
    types::{
        ExternalKind, Limits,
        SegmentKind,
        ValueType::{self, Funcref, I32, I64},
    },
    validate::Validator,
};

fn loc(line: u32) -> Location {
    Location {
        line:   Some(line),
        column: Some(1),
        offset: None,
    }
}

fn limits(initial: u64, max: Option<u64>) -> Limits {
    Limits {
        initial,
        max,
        shared: false,
    }
}

fn shared_limits(initial: u64, max: Option<u64>) -> Limits {
    Limits {
        initial,
        max,
        shared: true,
    }
}

fn validator() -> Validator { Validator::new(Features::default()) }

/// Declare a `() -> ()` function and enter its body.
fn begin_void_body(v: &mut Validator) {
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(1), 0).is_ok());
    assert!(v.begin_function_body(loc(2), 0).is_ok());
}

#[test]
fn minimal_module_validates() {
    let mut v = validator();
    assert!(v.on_table(loc(1), Funcref, &limits(0, Some(0))).is_ok());
    assert!(v.on_memory(loc(2), &limits(0, Some(0))).is_ok());
    assert!(v.end_module().is_ok());
    assert!(!v.has_errors());
}

#[test]
fn duplicate_export_is_reported_once() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(2), 0).is_ok());
    assert!(v.on_export(loc(3), ExternalKind::Func, 0, "x").is_ok());
    assert!(v.on_export(loc(4), ExternalKind::Func, 0, "x").is_err());
    let errors = v.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "duplicate export \"x\"");
    assert_eq!(errors[0].kind, ErrorKind::DuplicateDeclaration);
    assert_eq!(errors[0].location, loc(4));
}

#[test]
fn export_of_a_missing_memory_is_out_of_range() {
    let mut v = validator();
    assert!(v.on_export(loc(1), ExternalKind::Memory, 0, "m").is_err());
    assert_eq!(v.errors()[0].message, "memory variable out of range: 0 (max 4294967295)");
}

#[test]
fn mutable_global_import_requires_the_feature() {
    let mut features = Features::default();
    features.mutable_globals = false;
    let mut v = Validator::new(features);
    assert!(v.on_global_import(loc(1), I32, true).is_err());
    assert_eq!(v.errors()[0].message, "mutable globals cannot be imported");

    let mut v = validator();
    assert!(v.on_global_import(loc(1), I32, true).is_ok());
}

#[test]
fn global_initializer_may_only_reference_imported_globals() {
    let mut v = validator();
    assert!(v.on_global_import(loc(1), I32, false).is_ok());
    assert!(v.on_global(loc(2), I32, false).is_ok());
    assert!(v.on_global_init_expr_global_get(loc(2), 1).is_err());
    let errors = v.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "initializer expression can only reference an imported global");
}

#[test]
fn global_initializer_may_not_reference_mutable_globals() {
    let mut v = validator();
    assert!(v.on_global_import(loc(1), I32, true).is_ok());
    assert!(v.on_global(loc(2), I32, false).is_ok());
    assert!(v.on_global_init_expr_global_get(loc(2), 0).is_err());
    assert_eq!(
        v.errors()[0].message,
        "initializer expression cannot reference a mutable global"
    );
}

#[test]
fn global_initializer_type_is_checked() {
    let mut v = validator();
    assert!(v.on_global(loc(1), I32, false).is_ok());
    assert!(v.on_global_init_expr_const(loc(1), I64).is_err());
    assert_eq!(
        v.errors()[0].message,
        "type mismatch at global initializer expression. got i64, expected i32"
    );
}

#[test]
fn ref_null_initializes_a_funcref_global() {
    let mut v = validator();
    assert!(v.on_global(loc(1), Funcref, false).is_ok());
    assert!(v.on_global_init_expr_ref_null(loc(1)).is_ok());
    assert!(!v.has_errors());

    let mut v = validator();
    assert!(v.on_global(loc(1), I32, false).is_ok());
    assert!(v.on_global_init_expr_ref_null(loc(1)).is_err());
    assert_eq!(
        v.errors()[0].message,
        "type mismatch at global initializer expression. got nullref, expected i32"
    );
}

#[test]
fn non_constant_global_initializer_is_rejected() {
    let mut v = validator();
    assert!(v.on_global(loc(1), I32, false).is_ok());
    assert!(v.on_global_init_expr_other(loc(1)).is_err());
    assert_eq!(
        v.errors()[0].message,
        "invalid global initializer expression, must be a constant expression; either *.const \
         or global.get."
    );
    assert_eq!(v.errors()[0].kind, ErrorKind::InvalidInitializerExpression);
}

#[test]
fn ref_func_initializer_is_deferred_to_end_module() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(1), 0).is_ok());
    assert!(v.on_global(loc(2), Funcref, false).is_ok());
    assert!(v.on_global_init_expr_ref_func(loc(2), 0).is_ok());
    assert!(v.end_module().is_err());
    let errors = v.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "function is not declared in any elem sections");
    // The diagnostic points back at the initializer, not at the module end.
    assert_eq!(errors[0].location, loc(2));
}

#[test]
fn ref_func_initializer_passes_with_a_declaring_elem_segment() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(1), 0).is_ok());
    assert!(v.on_global(loc(2), Funcref, false).is_ok());
    assert!(v.on_global_init_expr_ref_func(loc(2), 0).is_ok());
    assert!(v.on_elem_segment(loc(3), 0, SegmentKind::Passive, Funcref).is_ok());
    assert!(v.on_elem_segment_elem_expr_ref_func(loc(3), 0).is_ok());
    assert!(v.end_module().is_ok());
    assert!(!v.has_errors());
}

#[test]
fn only_one_table_without_reference_types() {
    let mut v = validator();
    assert!(v.on_table(loc(1), Funcref, &limits(0, None)).is_ok());
    assert!(v.on_table(loc(2), Funcref, &limits(0, None)).is_err());
    assert_eq!(v.errors()[0].message, "only one table allowed");

    let mut v = Validator::new(Features::all());
    assert!(v.on_table(loc(1), Funcref, &limits(0, None)).is_ok());
    assert!(v.on_table(loc(2), Funcref, &limits(0, None)).is_ok());
}

#[test]
fn table_element_type_is_gated_and_checked() {
    let mut v = validator();
    assert!(v.on_table(loc(1), I32, &limits(0, None)).is_err());
    let messages: Vec<&str> = v.errors().iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["tables must have funcref type", "tables must have reference types"]);
}

#[test]
fn tables_may_not_be_shared() {
    let mut v = validator();
    assert!(v.on_table(loc(1), Funcref, &shared_limits(0, Some(0))).is_err());
    assert_eq!(v.errors()[0].message, "tables may not be shared");
}

#[test]
fn only_one_memory_is_allowed() {
    let mut v = validator();
    assert!(v.on_memory(loc(1), &limits(0, None)).is_ok());
    assert!(v.on_memory(loc(2), &limits(0, None)).is_err());
    assert_eq!(v.errors()[0].message, "only one memory block allowed");
}

#[test]
fn memory_limits_are_bounded() {
    let mut v = validator();
    assert!(v.on_memory(loc(1), &limits(65537, None)).is_err());
    let errors = v.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "initial pages (65537) must be <= (65536)");
    assert_eq!(errors[0].kind, ErrorKind::InvalidLimits);
}

#[test]
fn inverted_limits_are_reported() {
    let mut v = validator();
    assert!(v.on_table(loc(1), Funcref, &limits(5, Some(4))).is_err());
    let errors = v.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "max elems (4) must be >= initial elems (5)");
}

#[test]
fn limit_failures_accumulate_independently() {
    let mut v = validator();
    assert!(v.on_memory(loc(1), &limits(65537, Some(65538))).is_err());
    let messages: Vec<&str> = v.errors().iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "initial pages (65537) must be <= (65536)",
            "max pages (65538) must be <= (65536)"
        ]
    );
}

#[test]
fn shared_memory_needs_threads_and_a_max() {
    let mut v = validator();
    assert!(v.on_memory(loc(1), &shared_limits(0, Some(0))).is_err());
    assert_eq!(v.errors()[0].message, "memories may not be shared");

    let mut features = Features::default();
    features.threads = true;
    let mut v = Validator::new(features);
    assert!(v.on_memory(loc(1), &shared_limits(0, None)).is_err());
    assert_eq!(v.errors()[0].message, "shared memories must have max sizes");

    let mut v = Validator::new(features);
    assert!(v.on_memory(loc(1), &shared_limits(0, Some(1))).is_ok());
}

#[test]
fn multiple_results_require_multi_value() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![], vec![I32, I32]).is_ok());
    assert!(v.on_function(loc(2), 0).is_err());
    assert_eq!(v.errors()[0].message, "multiple result values not currently supported.");

    let mut features = Features::default();
    features.multi_value = true;
    let mut v = Validator::new(features);
    assert!(v.on_type(loc(1), vec![], vec![I32, I32]).is_ok());
    assert!(v.on_function(loc(2), 0).is_ok());
}

#[test]
fn function_signature_index_must_resolve() {
    let mut v = validator();
    assert!(v.on_function(loc(1), 5).is_err());
    assert_eq!(v.errors()[0].message, "function type variable out of range: 5 (max 4294967295)");
}

#[test]
fn event_signatures_must_have_no_results() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![I32], vec![I32]).is_ok());
    assert!(v.on_event(loc(2), 0).is_err());
    assert_eq!(v.errors()[0].message, "Event signature must have 0 results.");
}

#[test]
fn start_function_rules() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![I32], vec![I32]).is_ok());
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(2), 0).is_ok());
    assert!(v.on_function(loc(2), 1).is_ok());
    assert!(v.on_start(loc(3), 0).is_err());
    let messages: Vec<&str> = v.errors().iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["start function must be nullary", "start function must not return anything"]
    );

    let mut v = validator();
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(2), 0).is_ok());
    assert!(v.on_start(loc(3), 0).is_ok());
    assert!(v.on_start(loc(4), 0).is_err());
    assert_eq!(v.errors()[0].message, "only one start function allowed");
}

#[test]
fn elem_segment_offsets_must_be_i32_constants() {
    let mut v = validator();
    assert!(v.on_table(loc(1), Funcref, &limits(1, None)).is_ok());
    assert!(v.on_elem_segment(loc(2), 0, SegmentKind::Active, Funcref).is_ok());
    assert!(v.on_elem_segment_init_expr_const(loc(2), I64).is_err());
    assert_eq!(v.errors()[0].message, "type mismatch at elem segment offset. got i64, expected i32");

    assert!(v.on_elem_segment_init_expr_other(loc(3)).is_err());
    assert_eq!(
        v.errors()[1].message,
        "invalid elem segment offset, must be a constant expression; either i32.const or \
         global.get."
    );
}

#[test]
fn elem_expressions_are_restricted() {
    let mut v = validator();
    assert!(v.on_elem_segment(loc(1), 0, SegmentKind::Passive, Funcref).is_ok());
    assert!(v.on_elem_segment_elem_expr_ref_null(loc(1)).is_ok());
    assert!(v.on_elem_segment_elem_expr_other(loc(2)).is_err());
    assert_eq!(
        v.errors()[0].message,
        "invalid elem expression expression; must be either ref.null or ref.func."
    );
}

#[test]
fn data_segment_offsets_mirror_elem_offsets() {
    let mut v = validator();
    assert!(v.on_memory(loc(1), &limits(1, None)).is_ok());
    assert!(v.on_data_segment(loc(2), 0, SegmentKind::Active).is_ok());
    assert!(v.on_data_segment_init_expr_const(loc(2), I64).is_err());
    assert_eq!(v.errors()[0].message, "type mismatch at data segment offset. got i64, expected i32");
    assert!(v.on_data_segment_init_expr_other(loc(3)).is_err());
    assert_eq!(
        v.errors()[1].message,
        "invalid data segment offset, must be a constant expression; either i32.const or \
         global.get."
    );
}

#[test]
fn active_data_segments_need_their_memory() {
    let mut v = validator();
    assert!(v.on_data_segment(loc(1), 0, SegmentKind::Active).is_err());
    assert!(v.on_data_segment(loc(2), 0, SegmentKind::Passive).is_ok());
}

#[test]
fn atomic_access_requires_a_shared_memory() {
    let mut v = validator();
    assert!(v.on_memory(loc(1), &limits(1, Some(1))).is_ok());
    begin_void_body(&mut v);
    assert!(v.on_const(loc(3), I32).is_ok());
    assert!(v.on_atomic_load(loc(4), Opcode::I32AtomicLoad, 4).is_err());
    let errors = v.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "i32.atomic.load requires memory to be shared.");
    assert_eq!(errors[0].location, loc(4));
}

#[test]
fn atomic_alignment_must_be_natural() {
    let mut features = Features::default();
    features.threads = true;
    let mut v = Validator::new(features);
    assert!(v.on_memory(loc(1), &shared_limits(1, Some(1))).is_ok());
    begin_void_body(&mut v);
    assert!(v.on_const(loc(3), I32).is_ok());
    assert!(v.on_atomic_load(loc(4), Opcode::I32AtomicLoad, 2).is_err());
    assert_eq!(v.errors()[0].message, "alignment must be equal to natural alignment (4)");
}

#[test]
fn load_alignment_is_bounded_by_the_access_width() {
    let mut v = validator();
    assert!(v.on_memory(loc(1), &limits(1, None)).is_ok());
    begin_void_body(&mut v);
    for alignment in [1u32, 2, 4].iter() {
        assert!(v.on_const(loc(3), I32).is_ok());
        assert!(v.on_load(loc(3), Opcode::I32Load, *alignment).is_ok());
        assert!(v.on_drop(loc(3)).is_ok());
    }
    assert!(v.on_const(loc(4), I32).is_ok());
    assert!(v.on_load(loc(4), Opcode::I32Load, 3).is_err());
    assert_eq!(v.errors()[0].message, "alignment (3) must be a power of 2");
    assert!(v.on_load(loc(5), Opcode::I32Load, 8).is_err());
    assert_eq!(
        v.errors()[1].message,
        "alignment must not be larger than natural alignment (4)"
    );
}

#[test]
fn loads_require_a_memory() {
    let mut v = validator();
    begin_void_body(&mut v);
    assert!(v.on_const(loc(3), I32).is_ok());
    assert!(v.on_load(loc(3), Opcode::I32Load, 4).is_err());
    assert_eq!(v.errors()[0].message, "memory variable out of range: 0 (max 4294967295)");
}

#[test]
fn bulk_memory_instructions_use_the_tagged_diagnostic() {
    let mut v = validator();
    begin_void_body(&mut v);
    for _ in 0..3 {
        assert!(v.on_const(loc(3), I32).is_ok());
    }
    assert!(v.on_memory_copy(loc(4)).is_err());
    assert_eq!(v.errors()[0].message, "memory.copy requires an imported or defined memory.");
}

#[test]
fn memory_init_checks_the_data_count() {
    let mut v = validator();
    assert!(v.on_memory(loc(1), &limits(1, None)).is_ok());
    v.on_data_count(2);
    begin_void_body(&mut v);
    for _ in 0..3 {
        assert!(v.on_const(loc(3), I32).is_ok());
    }
    assert!(v.on_memory_init(loc(4), 2).is_err());
    assert_eq!(v.errors()[0].message, "data_segment variable out of range: 2 (max 1)");
}

#[test]
fn return_call_indirect_requires_a_table() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(1), 0).is_ok());
    assert!(v.begin_function_body(loc(2), 0).is_ok());
    assert!(v.on_const(loc(3), I32).is_ok());
    assert!(v.on_return_call_indirect(loc(4), 0, 0).is_err());
    let errors = v.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "return_call_indirect requires table 0 to be an imported or defined table."
    );
}

#[test]
fn global_set_rejects_immutable_globals() {
    let mut v = validator();
    assert!(v.on_global_import(loc(1), I32, false).is_ok());
    begin_void_body(&mut v);
    assert!(v.on_const(loc(3), I32).is_ok());
    assert!(v.on_global_set(loc(4), 0).is_err());
    let errors = v.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "can't global.set on immutable global at index 0.");
}

#[test]
fn block_signatures_are_gated_on_multi_value() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![I32, I32], vec![]).is_ok());
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(1), 1).is_ok());
    assert!(v.begin_function_body(loc(2), 0).is_ok());
    assert!(v.on_const(loc(3), I32).is_ok());
    assert!(v.on_const(loc(3), I32).is_ok());
    assert!(v.on_block(loc(4), ValueType::Index(0)).is_err());
    let errors = v.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "block params not currently supported.");
    assert_eq!(errors[0].kind, ErrorKind::FeatureDisabled);
}

#[test]
fn multiple_block_results_are_gated_on_multi_value() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![], vec![I32, I32]).is_ok());
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(1), 1).is_ok());
    assert!(v.begin_function_body(loc(2), 0).is_ok());
    assert!(v.on_block(loc(3), ValueType::Index(0)).is_err());
    assert_eq!(v.errors()[0].message, "multiple block results not currently supported.");
}

#[test]
fn locals_resolve_through_declaration_ranges() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![I32], vec![]).is_ok());
    assert!(v.on_function(loc(1), 0).is_ok());
    assert!(v.begin_function_body(loc(2), 0).is_ok());
    assert!(v.on_local_decl(loc(2), 2, I64).is_ok());
    assert!(v.on_local_decl(loc(2), 1, ValueType::F32).is_ok());
    // Index 0 is the parameter, 1..2 the i64 run, 3 the f32.
    assert!(v.on_local_get(loc(3), 0).is_ok());
    assert!(v.on_local_set(loc(4), 0).is_ok());
    assert!(v.on_local_get(loc(5), 3).is_ok());
    assert!(v.on_drop(loc(5)).is_ok());
    assert!(v.on_local_get(loc(6), 4).is_err());
    assert_eq!(v.errors()[0].message, "local variable out of range (max 4)");
    assert_eq!(v.errors()[0].location, loc(6));
}

#[test]
fn local_count_overflow_is_rejected() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![I32], vec![]).is_ok());
    assert!(v.on_function(loc(1), 0).is_ok());
    assert!(v.begin_function_body(loc(2), 0).is_ok());
    assert!(v.on_local_decl(loc(2), u32::MAX, I32).is_err());
    assert_eq!(v.errors()[0].message, "local count must be < 0x10000000");
}

#[test]
fn call_checks_the_function_index() {
    let mut v = validator();
    begin_void_body(&mut v);
    assert!(v.on_call(loc(3), 0).is_ok());
    assert!(v.on_call(loc(4), 1).is_err());
    assert_eq!(v.errors()[0].message, "function variable out of range: 1 (max 0)");
}

#[test]
fn call_forwards_the_signature_to_the_type_checker() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![I32], vec![I64]).is_ok());
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(1), 0).is_ok());
    assert!(v.on_function(loc(1), 1).is_ok());
    assert!(v.begin_function_body(loc(2), 1).is_ok());
    assert!(v.on_const(loc(3), I32).is_ok());
    assert!(v.on_call(loc(4), 0).is_ok());
    assert!(v.on_drop(loc(5)).is_ok());
    assert!(v.end_function_body(loc(6)).is_ok());
    assert!(!v.has_errors());
}

#[test]
fn type_checker_diagnostics_carry_the_instruction_location() {
    let mut v = validator();
    begin_void_body(&mut v);
    assert!(v.on_const(loc(3), I64).is_ok());
    assert!(v.on_const(loc(4), I64).is_ok());
    assert!(v.on_binary(loc(5), Opcode::I32Add).is_err());
    let errors = v.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "type mismatch at i32.add. got i64, expected i32");
    assert_eq!(errors[0].kind, ErrorKind::TypeMismatch);
    assert_eq!(errors[0].location, loc(5));
}

#[test]
fn ref_func_requires_an_elem_declaration() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(1), 0).is_ok());
    assert!(v.on_elem_segment(loc(2), 0, SegmentKind::Declared, Funcref).is_ok());
    assert!(v.on_elem_segment_elem_expr_ref_func(loc(2), 0).is_ok());
    assert!(v.begin_function_body(loc(3), 0).is_ok());
    assert!(v.on_ref_func(loc(4), 0).is_ok());
    assert!(v.on_drop(loc(5)).is_ok());
    assert!(v.end_function_body(loc(6)).is_ok());
    assert!(!v.has_errors());

    let mut v = validator();
    begin_void_body(&mut v);
    assert!(v.on_ref_func(loc(3), 0).is_err());
    assert_eq!(v.errors()[0].message, "function is not declared in any elem sections");
}

#[test]
fn table_instructions_resolve_the_element_type() {
    let mut features = Features::default();
    features.reference_types = true;
    let mut v = Validator::new(features);
    assert!(v.on_table(loc(1), Funcref, &limits(1, None)).is_ok());
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_function(loc(1), 0).is_ok());
    assert!(v.begin_function_body(loc(2), 0).is_ok());
    assert!(v.on_const(loc(3), I32).is_ok());
    assert!(v.on_table_get(loc(4), 0).is_ok());
    assert!(v.on_const(loc(5), I32).is_ok());
    assert!(v.on_table_set(loc(6), 0).is_err());
    // table.set expects (i32, funcref); the funcref from table.get is below
    // the i32, so the value on top has the wrong type.
    assert_eq!(v.errors().len(), 1);
}

#[test]
fn throw_forwards_the_event_parameters() {
    let mut v = validator();
    assert!(v.on_type(loc(1), vec![I32], vec![]).is_ok());
    assert!(v.on_type(loc(1), vec![], vec![]).is_ok());
    assert!(v.on_event(loc(2), 0).is_ok());
    assert!(v.on_function(loc(2), 1).is_ok());
    assert!(v.begin_function_body(loc(3), 0).is_ok());
    assert!(v.on_const(loc(4), I32).is_ok());
    assert!(v.on_throw(loc(5), 0).is_ok());
    assert!(v.end_function_body(loc(6)).is_ok());
    assert!(!v.has_errors());
}

#[test]
fn validation_is_deterministic_for_a_fixed_feature_set() {
    let run = || {
        let mut v = validator();
        let _ = v.on_table(loc(1), I32, &shared_limits(5, Some(4)));
        let _ = v.on_memory(loc(2), &limits(65537, None));
        let _ = v.on_export(loc(3), ExternalKind::Func, 0, "x");
        let _ = v.on_export(loc(4), ExternalKind::Func, 0, "x");
        let _ = v.end_module();
        v.into_errors()
    };
    let first = run();
    let second = run();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn empty_function_body_round_trip() {
    let mut v = validator();
    begin_void_body(&mut v);
    assert!(v.end_function_body(loc(3)).is_ok());
    assert!(v.end_module().is_ok());
    assert!(!v.has_errors());
}

#[test]
fn surplus_results_are_reported_at_the_last_instruction() {
    let mut v = validator();
    begin_void_body(&mut v);
    assert!(v.on_const(loc(3), I32).is_ok());
    assert!(v.end_function_body(loc(4)).is_err());
    let errors = v.errors();
    assert_eq!(errors.len(), 1);
    // The end of the body keeps the previous instruction's location.
    assert_eq!(errors[0].location, loc(3));
}
