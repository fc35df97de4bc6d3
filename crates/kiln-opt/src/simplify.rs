//! Structural simplification of constant-driven control flow.
//!
//! Collapses control-flow constructs whose guards or selectors are
//! compile-time constants, and removes the degenerate `if .. { leave }`
//! tail of a function body:
//!
//! - `if 1 { body }` → the body's statements, spliced into the enclosing
//!   block
//! - `if 0 { body }` → nothing
//! - `switch <literal>` → the matching case's statements (or the default's,
//!   or nothing), spliced into the enclosing block
//! - `for { pre } 0 { post } { body }` → the pre statements, spliced into
//!   the enclosing block
//! - a function body ending in `if cond { leave }` loses that trailing if
//!
//! Splicing dissolves the body's scope into the enclosing block. That is
//! sound exactly because the guard is constant: the body was guaranteed to
//! run (or guaranteed not to), so its declarations may live in the outer
//! scope. Constructs with non-constant guards are left alone and only their
//! children are simplified.

use kiln_ir::{iterate_replacing, Block, Statement, Switch, U256};

use crate::OptContext;

/// Rewrite `block` in place into a structurally simpler equivalent.
pub fn simplify_structure(_ctx: &OptContext<'_>, block: &mut Block) {
    simplify(&mut block.statements);
}

/// One left-to-right pass over a statement sequence.
///
/// A produced replacement is recursively simplified before it is spliced, so
/// freshly exposed structure is reduced before iteration moves on; this
/// yields a bottom-up fixpoint in a single pass.
fn simplify(statements: &mut Vec<Statement>) {
    iterate_replacing(statements, |statement| match reduce(statement) {
        Some(mut replacement) => {
            simplify(&mut replacement);
            Some(replacement)
        }
        None => {
            visit_children(statement);
            None
        }
    });
}

/// Compute the replacement sequence for a single statement, if any.
///
/// `Some(vec![])` deletes the statement; `None` keeps it untouched (the
/// caller then descends into its children).
fn reduce(statement: &mut Statement) -> Option<Vec<Statement>> {
    match statement {
        Statement::If(if_stmt) => match if_stmt.condition.literal_value() {
            Some(value) if value != U256::ZERO => {
                Some(std::mem::take(&mut if_stmt.body.statements))
            }
            Some(_) => Some(Vec::new()),
            None => None,
        },
        Statement::Switch(switch) => {
            let value = switch.expression.literal_value()?;
            Some(reduce_constant_switch(switch, value))
        }
        Statement::ForLoop(for_loop) => match for_loop.condition.literal_value() {
            // The body and post block never run, but the pre block runs once.
            Some(value) if value == U256::ZERO => {
                Some(std::mem::take(&mut for_loop.pre.statements))
            }
            _ => None,
        },
        Statement::FunctionDefinition(function) => {
            // At the very end of a function `if cond { leave }` is a no-op:
            // the function is about to return anyway. Peeling one such tail
            // can expose another, so repeat until the tail changes shape.
            while has_trailing_if_leave(&function.body) {
                function.body.statements.pop();
            }
            None
        }
        _ => None,
    }
}

fn reduce_constant_switch(switch: &mut Switch, value: U256) -> Vec<Statement> {
    let mut default_case = None;
    let mut matching_case = None;

    for (index, case) in switch.cases.iter().enumerate() {
        match &case.value {
            Some(literal) if literal.value == value => {
                matching_case = Some(index);
                break;
            }
            Some(_) => {}
            None => default_case = Some(index),
        }
    }

    match matching_case.or(default_case) {
        Some(index) => std::mem::take(&mut switch.cases[index].body.statements),
        None => Vec::new(),
    }
}

fn has_trailing_if_leave(body: &Block) -> bool {
    match body.statements.last() {
        Some(Statement::If(if_stmt)) => {
            matches!(if_stmt.body.statements.as_slice(), [Statement::Leave(_)])
        }
        _ => false,
    }
}

fn visit_children(statement: &mut Statement) {
    match statement {
        Statement::Block(block) => simplify(&mut block.statements),
        Statement::If(if_stmt) => simplify(&mut if_stmt.body.statements),
        Statement::Switch(switch) => {
            for case in &mut switch.cases {
                simplify(&mut case.body.statements);
            }
        }
        Statement::ForLoop(for_loop) => {
            simplify(&mut for_loop.pre.statements);
            simplify(&mut for_loop.post.statements);
            simplify(&mut for_loop.body.statements);
        }
        Statement::FunctionDefinition(function) => simplify(&mut function.body.statements),
        _ => {}
    }
}
