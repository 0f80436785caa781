mod common;

use common::{bare, eval, interp};

#[test]
fn conditionals() {
    let (mut interp, _) = interp();
    assert_eq!(eval(&mut interp, "(if nil 1 2 3)"), "3");
    assert_eq!(eval(&mut interp, "(if nil 1)"), "nil");
    assert_eq!(eval(&mut interp, "(if 0 'yes 'no)"), "yes");
    assert_eq!(eval(&mut interp, "(when t 1 2)"), "2");
    assert_eq!(eval(&mut interp, "(when nil 1 2)"), "nil");
    assert_eq!(eval(&mut interp, "(unless t 1)"), "nil");
    assert_eq!(eval(&mut interp, "(unless nil 1 2)"), "2");
}

#[test]
fn boolean_connectives() {
    let (mut interp, _) = interp();
    assert_eq!(eval(&mut interp, "(and 1 2 3)"), "3");
    assert_eq!(eval(&mut interp, "(and 1 nil 3)"), "nil");
    assert_eq!(eval(&mut interp, "(or nil 2 3)"), "2");
    assert_eq!(eval(&mut interp, "(or nil nil)"), "nil");
    assert_eq!(eval(&mut interp, "(not nil)"), "t");
    assert_eq!(eval(&mut interp, "(null '(1))"), "nil");
}

#[test]
fn or_evaluates_each_operand_once() {
    let (mut interp, _) = interp();
    eval(&mut interp, "(setq hits 0)");
    assert_eq!(eval(&mut interp, "(or (setq hits (+ hits 1)) 'other)"), "1");
    assert_eq!(eval(&mut interp, "hits"), "1");
}

#[test]
fn let_binds_in_parallel() {
    let (mut interp, _) = interp();
    assert_eq!(eval(&mut interp, "(let ((x 1) (y 2)) (+ x y))"), "3");
    assert_eq!(eval(&mut interp, "(let (z) z)"), "nil");
    assert_eq!(eval(&mut interp, "(let ((x 1)) (let ((x 2) (y x)) y))"), "1");
}

#[test]
fn list_accessors() {
    let (mut interp, _) = interp();
    assert_eq!(eval(&mut interp, "(cadr '(a b c))"), "b");
    assert_eq!(eval(&mut interp, "(cddr '(a b c))"), "(c)");
    assert_eq!(eval(&mut interp, "(caar '((a) b))"), "a");
    assert_eq!(eval(&mut interp, "(cdar '((a . x) b))"), "x");
    assert_eq!(eval(&mut interp, "(nth 2 '(a b c))"), "c");
}

#[test]
fn definitions_return_their_names() {
    let (mut interp, _) = interp();
    assert_eq!(eval(&mut interp, "(defun sq (x) (* x x))"), "sq");
    assert_eq!(eval(&mut interp, "(sq 12)"), "144");
    assert_eq!(eval(&mut interp, "(defmacro my-quote (x) (list 'quote x))"), "my-quote");
    assert_eq!(eval(&mut interp, "(my-quote (a b))"), "(a b)");
}

#[test]
fn equal_compares_structure() {
    let (mut interp, _) = interp();
    assert_eq!(
        eval(&mut interp, "(equal '(1 (2 . \"s\") [3 (4)]) '(1 (2 . \"s\") [3 (4)]))"),
        "t"
    );
    assert_eq!(eval(&mut interp, "(equal '(1 2) '(1 2 3))"), "nil");
    assert_eq!(eval(&mut interp, "(equal '[1 2] '[1 3])"), "nil");
    assert_eq!(eval(&mut interp, "(equal '(a) 'a)"), "nil");
    assert_eq!(eval(&mut interp, "(equal nil nil)"), "t");
    assert_eq!(eval(&mut interp, "(equal 1.0 1)"), "nil");
    assert_eq!(
        eval(&mut interp, "(equal 100000000000000000000 100000000000000000000)"),
        "t"
    );
    assert_eq!(eval(&mut interp, "(equal \"ab\" \"ab\")"), "t");
    assert_eq!(eval(&mut interp, "(equal \"ab\" 'ab)"), "nil");
}

#[test]
fn bare_interpreter_has_no_prelude() {
    let mut interp = bare();
    assert_eq!(eval(&mut interp, "defun"), "void variable: defun");
    assert_eq!(eval(&mut interp, "(car '(1))"), "1");
}
