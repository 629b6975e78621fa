//! End-to-end expression tests: compile through the operator stack, render
//! back with the infix state machine, and require the text to be stable.

use slate_core::ErrorCode;
use slate_lang::decompile::DecompileOptions;
use slate_lang::{Compiler, Decompiler, Heap, LibraryRegistry, standard_registry};

fn round_trip_with(reg: &LibraryRegistry, source: &str) -> String {
    let mut heap = Heap::new();
    let obj = Compiler::new(reg)
        .compile(&mut heap, source, false)
        .unwrap_or_else(|e| panic!("compile {source:?}: {e}"));
    Decompiler::with_options(reg, DecompileOptions::editing())
        .decompile(heap.object(obj))
        .unwrap_or_else(|e| panic!("decompile {source:?}: {e}"))
}

/// Compiles, renders, and checks the render is a fixed point: compiling it
/// again gives the same words and the same text.
fn assert_renders(source: &str, expected: &str) {
    let reg = standard_registry();
    let text = round_trip_with(&reg, source);
    assert_eq!(text, expected, "first render of {source:?}");
    let again = round_trip_with(&reg, &text);
    assert_eq!(again, expected, "render of {source:?} is not a fixed point");

    let mut a = Heap::new();
    let mut b = Heap::new();
    let obj_a = Compiler::new(&reg).compile(&mut a, source, false).unwrap();
    let obj_b = Compiler::new(&reg).compile(&mut b, &text, false).unwrap();
    assert_eq!(
        a.object(obj_a),
        b.object(obj_b),
        "recompiling the render of {source:?} changed the object"
    );
}

/// As [`assert_renders`], but without requiring the recompiled words to
/// match; rewrites that fold operators change the tree.
fn assert_renders_text(source: &str, expected: &str) {
    let reg = standard_registry();
    let text = round_trip_with(&reg, source);
    assert_eq!(text, expected, "first render of {source:?}");
    let again = round_trip_with(&reg, &text);
    assert_eq!(again, expected, "render of {source:?} is not a fixed point");
}

fn compile_err(source: &str) -> ErrorCode {
    let reg = standard_registry();
    let mut heap = Heap::new();
    Compiler::new(&reg)
        .compile(&mut heap, source, false)
        .expect_err(source)
        .code
}

#[test]
fn precedence_orders_the_tree() {
    assert_renders("'1+2*3'", "'1+2*3'");
    assert_renders("'1*2+3'", "'1*2+3'");
    assert_renders("'1+2<3*4'", "'1+2<3*4'");
}

#[test]
fn grouping_parens_vanish_but_reappear_where_needed() {
    assert_renders("'(1+2)*3'", "'(1+2)*3'");
    assert_renders("'(1)'", "'1'");
    assert_renders("'((1+2))*3'", "'(1+2)*3'");
}

#[test]
fn left_associative_chains_keep_their_shape() {
    // The left-nested subtraction is spelled out; the text recompiles to
    // the identical tree.
    assert_renders("'10-3-2'", "'(10-3)-2'");
    assert_renders("'8/4/2'", "'(8/4)/2'");
}

#[test]
fn pow_is_right_associative() {
    assert_renders("'2^3^2'", "'2^(3^2)'");
}

#[test]
fn leading_sign_is_unary() {
    assert_renders("'-3'", "'-3'");
    assert_renders("'2-3'", "'2-3'");
    assert_renders("'-2+3'", "'-2+3'");
    assert_renders("'2*-3'", "'2*(-3)'");
}

#[test]
fn uplus_survives_compilation() {
    assert_renders("'1++2'", "'1+(+2)'");
}

#[test]
fn additive_sugar_rewrites() {
    // The render folds the sign into the operator, so recompiling yields a
    // plain subtraction or division; only the text is a fixed point here.
    assert_renders_text("'A+-B'", "'A-B'");
    assert_renders_text("'A*INV(B)'", "'A/B'");
    assert_renders_text("'A+-B*C'", "'A-B*C'");
}

#[test]
fn functions_take_argument_lists() {
    assert_renders("'SIN(1+2)'", "'SIN(1+2)'");
    assert_renders("'MAX(1,2)'", "'MAX(1,2)'");
    assert_renders("'SIN(COS(X))'", "'SIN(COS(X))'");
}

#[test]
fn function_names_are_canonicalized() {
    assert_renders("'sin(x)'", "'SIN(x)'");
}

#[test]
fn postfix_binds_tighter_than_binaries() {
    assert_renders("'1+2!'", "'1+2!'");
}

#[test]
fn call_through_a_name_becomes_funceval() {
    assert_renders("'F(1,2)'", "'F(1,2)'");
    assert_renders("'F()+1'", "'F()+1'");
}

#[test]
fn expression_brackets_build_composites() {
    assert_renders("'[1,2]'", "'[1,2]'");
    assert_renders("'{1,2}'", "'{1,2}'");
    assert_renders("'⟨1,2}'", "'⟨1,2}'");
    assert_renders("'[1+1,2]'", "'[1+1,2]'");
}

#[test]
fn whitespace_inside_expressions_is_free() {
    assert_renders("'1 + 2 * 3'", "'1+2*3'");
}

#[test]
fn mismatched_brackets_are_rejected() {
    assert_eq!(compile_err("'[1,2)'"), ErrorCode::MissingBracket);
    assert_eq!(compile_err("'1+2)'"), ErrorCode::MissingBracket);
}

#[test]
fn unterminated_expression_is_unbalanced() {
    assert_eq!(compile_err("'(1+2'"), ErrorCode::StartWithoutEnd);
    assert_eq!(compile_err("'1+2"), ErrorCode::StartWithoutEnd);
}

#[test]
fn arity_is_checked_at_the_close() {
    assert_eq!(compile_err("'MAX(1,2,3)'"), ErrorCode::BadArgCount);
    assert_eq!(compile_err("'SIN(1,2)'"), ErrorCode::BadArgCount);
}

#[test]
fn bare_function_name_is_an_arity_error() {
    // The arithmetic library outranks identifiers, so a known function
    // name without arguments cannot fall back to being a variable.
    assert_eq!(compile_err("'SIN'"), ErrorCode::BadArgCount);
}

#[test]
fn strings_are_not_allowed_in_expressions() {
    assert_eq!(compile_err("'\"ab\"'"), ErrorCode::NotAllowedInSymbolic);
}

#[test]
fn empty_expression_is_a_syntax_error() {
    assert_eq!(compile_err("''"), ErrorCode::Syntax);
}

#[test]
fn dangling_operator_is_rejected() {
    assert_eq!(compile_err("'1+'"), ErrorCode::BadArgCount);
}
