//! End-to-end coverage of expression parsing through the public `parse()`
//! entry point, mirroring the error-scenario matrix the unit tests in
//! `src/expr.rs` only partially cover in isolation.

use qb_frontend::ast::{ConstantValue, Expr, Node, Statement};

fn print_params(src: &str) -> Vec<Expr> {
    let program = qb_frontend::parse(src).expect("parse failed");
    let main = program.globals.find_procedure("_main").unwrap();
    let body = main.body.as_ref().unwrap();
    let Statement::Print { params } = &body.statements[0] else {
        panic!("expected a Print statement, got {:?}", body.statements[0]);
    };
    params.clone()
}

#[test]
fn print_expression_builds_left_associative_tree_with_trailing_newline() {
    let params = print_params("? 2 + 3 - 4");
    assert_eq!(params.len(), 2);
    assert!(matches!(&params[0], Expr::BinOp { op: "-", .. }));
    assert_eq!(
        params[1],
        Expr::Constant {
            value: ConstantValue::Str("\n".to_string()),
            ty: std::rc::Rc::clone(&qb_frontend::types::builtin_types()["string"]),
        }
    );
}

#[test]
fn unterminated_expression_is_a_parse_error() {
    assert!(qb_frontend::parse("? 2 +").is_err());
}

#[test]
fn unclosed_parenthesis_is_a_parse_error() {
    assert!(qb_frontend::parse("? 2 + (3").is_err());
}

#[test]
fn unmatched_closing_paren_is_a_parse_error() {
    assert!(qb_frontend::parse("? 2)").is_err());
}

#[test]
fn two_operators_in_a_row_is_a_parse_error() {
    assert!(qb_frontend::parse("? 2 + * 3").is_err());
}

#[test]
fn stray_character_after_operator_is_a_parse_error() {
    assert!(qb_frontend::parse("? 2 + .").is_err());
}

#[test]
fn assignment_registers_a_variable_at_default_type() {
    let program = qb_frontend::parse("x = 5").unwrap();
    let var = program.globals.find_variable("x").unwrap();
    assert_eq!(var.ty.name, "single");
}

#[test]
fn repeated_assignment_reuses_the_same_variable() {
    let program = qb_frontend::parse("foo = 32 : foo = 17").unwrap();
    let main = program.globals.find_procedure("_main").unwrap();
    let assignments = main
        .body
        .as_ref()
        .unwrap()
        .find_all(|n| matches!(n, Node::Stmt(Statement::Assignment { .. })));
    assert_eq!(assignments.len(), 2);
}
