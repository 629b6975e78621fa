//! Driver-level compile tests: token scanning, construct nesting, wrap
//! mode, split tokens and failure behavior of the heap.

use slate_core::{ErrorCode, Span, extract_cmd, extract_lib, extract_size, is_prolog};
use slate_lang::libs::prog;
use slate_lang::well_known::{PROG_LIB, REAL_LIB};
use slate_lang::{Compiler, Heap, compile_source, standard_registry};

#[test]
fn wrap_encloses_the_input_and_appends_an_exit() {
    let reg = standard_registry();
    let mut heap = Heap::new();
    let obj = compile_source(&reg, &mut heap, "1 2").unwrap();
    let words = heap.object(obj);
    assert!(is_prolog(words[0]));
    assert_eq!(extract_lib(words[0]), PROG_LIB);
    // two reals plus the end marker
    assert_eq!(extract_size(words[0]), 7);
    assert_eq!(extract_cmd(*words.last().unwrap()), prog::cmd::END);
    // The exit marker sits after the object proper.
    let exit = heap.word(heap.cursor() - 1);
    assert_eq!(extract_lib(exit), PROG_LIB);
    assert_eq!(extract_cmd(exit), prog::cmd::EXIT);
}

#[test]
fn empty_input_is_a_syntax_error() {
    let reg = standard_registry();
    let mut heap = Heap::new();
    let err = Compiler::new(&reg).compile(&mut heap, "   \n\t ", false).unwrap_err();
    assert_eq!(err.code, ErrorCode::Syntax);
}

#[test]
fn constructs_nest_across_libraries() {
    let reg = standard_registry();
    let mut heap = Heap::new();
    let obj = Compiler::new(&reg)
        .compile(&mut heap, ":: { 1 [ 2 3 ] } ;", false)
        .unwrap();
    let words = heap.object(obj);
    assert_eq!(extract_lib(words[0]), PROG_LIB);
    // prolog sizes chain: outer program covers the list, the list covers
    // the vector.
    assert_eq!(heap.skip(obj.start()), heap.cursor());
}

#[test]
fn wrapped_unterminated_construct_reports_the_inner_span() {
    let reg = standard_registry();
    let mut heap = Heap::new();
    let err = compile_source(&reg, &mut heap, "1 { 2").unwrap_err();
    assert_eq!(err.code, ErrorCode::StartWithoutEnd);
    // The open list, not the synthesized wrapper at 0..0.
    assert_eq!(err.span, Span::of_range(2, 3));
}

#[test]
fn unbalanced_open_reports_its_span() {
    let reg = standard_registry();
    let mut heap = Heap::new();
    let err = Compiler::new(&reg).compile(&mut heap, "1 { 2", false).unwrap_err();
    assert_eq!(err.code, ErrorCode::StartWithoutEnd);
    assert_eq!(err.span, Span::of_range(2, 3));
}

#[test]
fn signed_number_wins_at_top_level() {
    let reg = standard_registry();
    let mut heap = Heap::new();
    let obj = Compiler::new(&reg).compile(&mut heap, "-5", false).unwrap();
    let words = heap.object(obj);
    assert!(is_prolog(words[0]));
    assert_eq!(extract_lib(words[0]), REAL_LIB);
}

#[test]
fn plain_mode_splits_a_number_glued_to_a_name() {
    let reg = standard_registry();
    let mut heap = Heap::new();
    // "5x" is a real followed by an identifier, not one bad token.
    Compiler::new(&reg).compile(&mut heap, ":: 5x ;", false).unwrap();
    let starts: Vec<u16> = heap
        .object_starts(0, heap.cursor())
        .iter()
        .map(|p| extract_lib(heap.word(*p)))
        .collect();
    assert_eq!(starts, vec![PROG_LIB]);
    assert_eq!(extract_lib(heap.word(1)), REAL_LIB);
}

#[test]
fn commit_survives_a_following_failure() {
    let reg = standard_registry();
    let mut heap = Heap::new();
    let obj = Compiler::new(&reg).compile(&mut heap, "{ 1 }", false).unwrap();
    let kept = heap.object(obj).to_vec();
    let err = Compiler::new(&reg).compile(&mut heap, "{ ?", false).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidToken);
    assert_eq!(heap.object(obj), kept.as_slice());
    assert_eq!(heap.cursor(), heap.committed_end());
}

#[test]
fn word_limit_surfaces_as_out_of_memory() {
    let reg = standard_registry();
    let mut heap = Heap::with_limit(2);
    let err = Compiler::new(&reg).compile(&mut heap, "1", false).unwrap_err();
    assert_eq!(err.code, ErrorCode::OutOfMemory);
}

#[test]
fn each_compile_commits_one_block() {
    let reg = standard_registry();
    let mut heap = Heap::new();
    let a = Compiler::new(&reg).compile(&mut heap, "1", false).unwrap();
    let b = Compiler::new(&reg).compile(&mut heap, "2", false).unwrap();
    assert_eq!(heap.blocks(), &[a.start(), b.start()]);
    assert!(b.start() > a.start());
}
