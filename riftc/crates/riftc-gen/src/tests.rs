//! Compile-and-run tests: lowered, optimized IR through the module
//! compiler and the executor. `eval` needs the full driver pipeline and is
//! exercised in the driver's end-to-end suite instead.

use crate::code::CompiledCode;
use crate::compile::compile_module;
use crate::exec;
use rgc::{CharacterVector, DoubleVector, Environment, RVal};
use riftc_ir::{lower_program, opt};
use riftc_par::Parser;
use riftc_runtime::{Result, RuntimeError};

/// Compile a program and run its top-level entry in a fresh environment.
fn run(program: &str) -> Result<*mut RVal> {
    exec::install();
    let ast = Parser::parse(program).expect("test program parses");
    let (mut module, top) = lower_program(&ast)?;
    for f in &mut module.functions {
        opt::optimize_function(f);
    }
    let compiled = compile_module(&module).expect("test program links");
    // Tests keep modules alive the same way the driver does: forever.
    let compiled = Box::leak(Box::new(compiled));
    for (index, entry) in compiled.entries() {
        unsafe {
            riftc_runtime::set_function_code(index, entry);
        }
    }

    let env = Environment::new(std::ptr::null_mut())?;
    let entry = unsafe { (*riftc_runtime::get_function(top)).code };
    unsafe { exec::execute(&*(entry as *const CompiledCode), env) }
}

fn run_doubles(program: &str) -> Vec<f64> {
    let v = run(program).unwrap();
    unsafe {
        let dv = RVal::as_double(v).expect("expected a double vector");
        DoubleVector::as_slice(dv).to_vec()
    }
}

fn run_chars(program: &str) -> String {
    let v = run(program).unwrap();
    unsafe {
        let cv = RVal::as_character(v).expect("expected a character vector");
        String::from_utf8_lossy(CharacterVector::as_bytes(cv)).into_owned()
    }
}

#[test]
fn test_scalar_addition() {
    assert_eq!(run_doubles("1 + 2"), vec![3.0]);
}

#[test]
fn test_vector_broadcast() {
    assert_eq!(run_doubles("c(1, 2, 3) + c(1, 2)"), vec![2.0, 4.0, 4.0]);
}

#[test]
fn test_character_concatenation() {
    assert_eq!(run_chars("\"foo\" + \"bar\""), "foobar");
}

#[test]
fn test_character_comparison() {
    assert_eq!(run_doubles("\"aba\" == \"aca\""), vec![1.0, 0.0, 1.0]);
}

#[test]
fn test_assignment_roundtrip() {
    assert_eq!(run_doubles("a <- 42; a"), vec![42.0]);
}

#[test]
fn test_index_assignment_scenario() {
    assert_eq!(
        run_doubles("a <- c(1, 2, 3); a[c(0, 1)] <- 56; a"),
        vec![56.0, 56.0, 3.0]
    );
}

#[test]
fn test_user_function_call() {
    assert_eq!(run_doubles("f <- function(a, b) { a + b }; f(1, 2)"), vec![3.0]);
}

#[test]
fn test_while_loop() {
    assert_eq!(
        run_doubles("a <- 10; b <- 0; while (a > 0) { b <- b + 1; a <- a - 1 }; c(a, b)"),
        vec![0.0, 10.0]
    );
}

#[test]
fn test_if_else_both_arms() {
    assert_eq!(run_doubles("if (1 < 2) { 10 } else { 20 }"), vec![10.0]);
    assert_eq!(run_doubles("if (2 < 1) { 10 } else { 20 }"), vec![20.0]);
}

#[test]
fn test_if_without_else_yields_zero() {
    assert_eq!(run_doubles("if (0) { 10 }"), vec![0.0]);
}

#[test]
fn test_type_of_function() {
    assert_eq!(run_chars("type(function() { 1 })"), "function");
}

#[test]
fn test_length_call() {
    assert_eq!(run_doubles("length(c(1, 2, 3))"), vec![3.0]);
}

#[test]
fn test_closure_captures_definition_environment() {
    assert_eq!(
        run_doubles("x <- 7; f <- function() { x }; f()"),
        vec![7.0]
    );
}

#[test]
fn test_closure_assignment_stays_local() {
    // Assignment inside the closure binds in its own frame; the outer
    // binding is untouched.
    assert_eq!(
        run_doubles("x <- 7; f <- function() { x <- 1; x }; f(); x"),
        vec![7.0]
    );
}

#[test]
fn test_nested_scalar_chain_constant_folds_and_runs() {
    assert_eq!(run_doubles("1 + 2 * 3 - 4"), vec![3.0]);
}

#[test]
fn test_empty_program_yields_zero() {
    assert_eq!(run_doubles(""), vec![0.0]);
}

#[test]
fn test_unbound_variable_error() {
    assert_eq!(run("no_such_variable").unwrap_err(), RuntimeError::Lookup);
}

#[test]
fn test_arity_error() {
    let err = run("f <- function(a, b) { a }; f(1)").unwrap_err();
    assert_eq!(err, RuntimeError::Arity);
}

#[test]
fn test_calling_a_vector_fails() {
    let err = run("a <- 1; a(2)").unwrap_err();
    assert_eq!(err, RuntimeError::Type("Not a function!"));
}

#[test]
fn test_module_cache_patches_entries() {
    exec::install();
    let ast = Parser::parse("function(x) { x }").unwrap();
    let (mut module, top) = lower_program(&ast).unwrap();
    for f in &mut module.functions {
        opt::optimize_function(f);
    }
    let compiled = Box::leak(Box::new(compile_module(&module).unwrap()));
    for (index, entry) in compiled.entries() {
        unsafe {
            riftc_runtime::set_function_code(index, entry);
        }
    }
    unsafe {
        assert!(!(*riftc_runtime::get_function(top)).code.is_null());
    }
}

#[test]
fn test_function_equality_by_entry() {
    // Two closures of the same template share a native entry; closures of
    // different templates do not.
    assert_eq!(
        run_doubles("f <- function() { 1 }; g <- f; f == g"),
        vec![1.0]
    );
    assert_eq!(
        run_doubles("f <- function() { 1 }; g <- function() { 1 }; f == g"),
        vec![0.0]
    );
}

#[test]
fn test_gc_pressure_during_execution() {
    // Enough allocation inside the loop to force several collections while
    // compiled frames are live.
    let result = run_doubles(
        "a <- 0; while (a < 500) { v <- c(a, a, a, a, a, a, a, a); a <- a + 1 }; a",
    );
    assert_eq!(result, vec![500.0]);
}
