//! Semantic queries the passes rely on.
//!
//! Two oracles live here: expression movability (may an expression be
//! reordered or deleted without changing observable behavior?) and
//! control-flow classification of statements (does control flow out of a
//! statement, or does it terminate, break, continue or leave?). Both consult
//! the dialect's builtin registry and default to the conservative answer for
//! anything the dialect does not know.

use kiln_ir::{Dialect, Expression, Statement};

/// True iff evaluating `expression` can be reordered or dropped without
/// changing observable behavior.
///
/// Literals and identifier reads are movable. A call is movable only if the
/// dialect marks the builtin movable and every argument is movable in turn;
/// user-defined functions are unknown to the dialect and never movable.
pub fn is_movable(dialect: &Dialect, expression: &Expression) -> bool {
    match expression {
        Expression::Literal(_) | Expression::Identifier(_) => true,
        Expression::FunctionCall(call) => {
            dialect
                .builtin(&call.name)
                .map_or(false, |builtin| builtin.movable)
                && call.args.iter().all(|arg| is_movable(dialect, arg))
        }
    }
}

/// True iff `expression` contains a call that never returns to its caller.
pub fn contains_terminating_call(dialect: &Dialect, expression: &Expression) -> bool {
    match expression {
        Expression::Literal(_) | Expression::Identifier(_) => false,
        Expression::FunctionCall(call) => {
            dialect
                .builtin(&call.name)
                .map_or(false, |builtin| builtin.terminating)
                || call
                    .args
                    .iter()
                    .any(|arg| contains_terminating_call(dialect, arg))
        }
    }
}

/// How control leaves a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    /// Control continues with the next statement
    FlowOut,
    /// The statement contains a non-continuing call
    Terminate,
    Break,
    Continue,
    Leave,
}

/// Classify how control flow leaves `statement`.
///
/// Anything that cannot be classified precisely is `FlowOut`, the
/// conservative choice: it never licenses treating code after the statement
/// as unreachable.
pub fn control_flow_kind(dialect: &Dialect, statement: &Statement) -> ControlFlow {
    match statement {
        Statement::Break(_) => ControlFlow::Break,
        Statement::Continue(_) => ControlFlow::Continue,
        Statement::Leave(_) => ControlFlow::Leave,
        Statement::Expression(statement)
            if contains_terminating_call(dialect, &statement.expression) =>
        {
            ControlFlow::Terminate
        }
        Statement::Assignment(assignment)
            if contains_terminating_call(dialect, &assignment.value) =>
        {
            ControlFlow::Terminate
        }
        Statement::VariableDeclaration(declaration)
            if declaration
                .value
                .as_ref()
                .map_or(false, |value| contains_terminating_call(dialect, value)) =>
        {
            ControlFlow::Terminate
        }
        _ => ControlFlow::FlowOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_ir::{Span, Statement};

    fn dialect() -> Dialect {
        Dialect::evm()
    }

    #[test]
    fn test_literals_and_identifiers_are_movable() {
        assert!(is_movable(&dialect(), &Expression::literal(1u64)));
        assert!(is_movable(&dialect(), &Expression::identifier("x")));
    }

    #[test]
    fn test_movable_builtin_call() {
        let expr = Expression::call(
            "add",
            vec![Expression::identifier("a"), Expression::literal(1u64)],
        );
        assert!(is_movable(&dialect(), &expr));
    }

    #[test]
    fn test_immovable_builtin_call() {
        let expr = Expression::call(
            "sload",
            vec![Expression::literal(0u64)],
        );
        assert!(!is_movable(&dialect(), &expr));
    }

    #[test]
    fn test_immovable_argument_poisons_call() {
        let expr = Expression::call(
            "add",
            vec![
                Expression::call("sload", vec![Expression::literal(0u64)]),
                Expression::literal(1u64),
            ],
        );
        assert!(!is_movable(&dialect(), &expr));
    }

    #[test]
    fn test_user_function_is_not_movable() {
        assert!(!is_movable(&dialect(), &Expression::call("helper", vec![])));
    }

    #[test]
    fn test_terminating_call_detection() {
        let revert = Expression::call(
            "revert",
            vec![Expression::literal(0u64), Expression::literal(0u64)],
        );
        assert!(contains_terminating_call(&dialect(), &revert));
        assert!(!contains_terminating_call(
            &dialect(),
            &Expression::call("add", vec![]),
        ));
    }

    #[test]
    fn test_control_flow_of_exits() {
        let d = dialect();
        assert_eq!(
            control_flow_kind(&d, &Statement::Break(Span::dummy())),
            ControlFlow::Break
        );
        assert_eq!(
            control_flow_kind(&d, &Statement::Continue(Span::dummy())),
            ControlFlow::Continue
        );
        assert_eq!(
            control_flow_kind(&d, &Statement::Leave(Span::dummy())),
            ControlFlow::Leave
        );
    }

    #[test]
    fn test_control_flow_of_terminating_statements() {
        let d = dialect();
        let revert = Expression::call(
            "revert",
            vec![Expression::literal(0u64), Expression::literal(0u64)],
        );
        assert_eq!(
            control_flow_kind(&d, &Statement::expression(revert.clone())),
            ControlFlow::Terminate
        );
        assert_eq!(
            control_flow_kind(&d, &Statement::assign("x", revert.clone())),
            ControlFlow::Terminate
        );
        assert_eq!(
            control_flow_kind(&d, &Statement::declare("x", Some(revert))),
            ControlFlow::Terminate
        );
    }

    #[test]
    fn test_everything_else_flows_out() {
        let d = dialect();
        assert_eq!(
            control_flow_kind(&d, &Statement::assign("x", Expression::literal(1u64))),
            ControlFlow::FlowOut
        );
        // An unknown call might terminate, but without dialect knowledge the
        // classifier must not assume so.
        assert_eq!(
            control_flow_kind(&d, &Statement::expression(Expression::call("f", vec![]))),
            ControlFlow::FlowOut
        );
    }
}
