//! Structural validation of IR trees.
//!
//! The optimizer passes treat their input as well-formed and assert rather
//! than recover; producers run this check once, before any pass, so that
//! malformed trees are rejected with a real error instead of a pass abort.

use crate::ir::{Block, Statement};
use crate::span::Span;
use ethnum::U256;
use rustc_hash::FxHashSet;
use thiserror::Error;

/// Structural invariant violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("assignment has no targets")]
    EmptyAssignment { span: Span },

    #[error("variable declaration declares no names")]
    EmptyDeclaration { span: Span },

    #[error("switch has no cases")]
    CaselessSwitch { span: Span },

    #[error("switch has more than one default case")]
    MultipleDefaultCases { span: Span },

    #[error("duplicate switch case value {value}")]
    DuplicateCaseValue { value: U256, span: Span },
}

/// Check the structural invariants of a block and everything beneath it.
pub fn validate_block(block: &Block) -> Result<(), IrError> {
    for statement in &block.statements {
        validate_statement(statement)?;
    }
    Ok(())
}

fn validate_statement(statement: &Statement) -> Result<(), IrError> {
    match statement {
        Statement::Block(block) => validate_block(block),
        Statement::VariableDeclaration(declaration) => {
            if declaration.variables.is_empty() {
                return Err(IrError::EmptyDeclaration {
                    span: declaration.span,
                });
            }
            Ok(())
        }
        Statement::Assignment(assignment) => {
            if assignment.targets.is_empty() {
                return Err(IrError::EmptyAssignment {
                    span: assignment.span,
                });
            }
            Ok(())
        }
        Statement::If(if_stmt) => validate_block(&if_stmt.body),
        Statement::Switch(switch) => {
            if switch.cases.is_empty() {
                return Err(IrError::CaselessSwitch { span: switch.span });
            }
            let mut seen_values = FxHashSet::default();
            let mut seen_default = false;
            for case in &switch.cases {
                match &case.value {
                    Some(literal) => {
                        if !seen_values.insert(literal.value) {
                            return Err(IrError::DuplicateCaseValue {
                                value: literal.value,
                                span: case.span,
                            });
                        }
                    }
                    None => {
                        if seen_default {
                            return Err(IrError::MultipleDefaultCases { span: case.span });
                        }
                        seen_default = true;
                    }
                }
                validate_block(&case.body)?;
            }
            Ok(())
        }
        Statement::ForLoop(for_loop) => {
            validate_block(&for_loop.pre)?;
            validate_block(&for_loop.post)?;
            validate_block(&for_loop.body)
        }
        Statement::FunctionDefinition(function) => validate_block(&function.body),
        Statement::Break(_)
        | Statement::Continue(_)
        | Statement::Leave(_)
        | Statement::Expression(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Assignment, Block, Case, Expression, Literal, Switch, VariableDeclaration};

    #[test]
    fn test_valid_block_passes() {
        let block = Block::new(vec![
            Statement::declare("x", Some(Expression::literal(1u64))),
            Statement::assign("x", Expression::literal(2u64)),
        ]);
        assert_eq!(validate_block(&block), Ok(()));
    }

    #[test]
    fn test_empty_assignment_rejected() {
        let block = Block::new(vec![Assignment::new(&[], Expression::literal(1u64)).into()]);
        assert!(matches!(
            validate_block(&block),
            Err(IrError::EmptyAssignment { .. })
        ));
    }

    #[test]
    fn test_empty_declaration_rejected() {
        let block = Block::new(vec![VariableDeclaration::new(&[], None).into()]);
        assert!(matches!(
            validate_block(&block),
            Err(IrError::EmptyDeclaration { .. })
        ));
    }

    #[test]
    fn test_duplicate_case_value_rejected() {
        let block = Block::new(vec![Switch::new(
            Expression::identifier("x"),
            vec![
                Case::new(Some(Literal::new(1u64)), Block::empty()),
                Case::new(Some(Literal::new(1u64)), Block::empty()),
            ],
        )
        .into()]);
        assert!(matches!(
            validate_block(&block),
            Err(IrError::DuplicateCaseValue { .. })
        ));
    }

    #[test]
    fn test_multiple_defaults_rejected() {
        let block = Block::new(vec![Switch::new(
            Expression::identifier("x"),
            vec![
                Case::new(None, Block::empty()),
                Case::new(None, Block::empty()),
            ],
        )
        .into()]);
        assert!(matches!(
            validate_block(&block),
            Err(IrError::MultipleDefaultCases { .. })
        ));
    }

    #[test]
    fn test_caseless_switch_rejected() {
        let block = Block::new(vec![Switch::new(Expression::identifier("x"), vec![]).into()]);
        assert!(matches!(
            validate_block(&block),
            Err(IrError::CaselessSwitch { .. })
        ));
    }

    #[test]
    fn test_validation_recurses_into_nested_scopes() {
        let inner = Block::new(vec![Assignment::new(&[], Expression::literal(1u64)).into()]);
        let block = Block::new(vec![Statement::from(crate::ir::If::new(
            Expression::identifier("c"),
            inner,
        ))]);
        assert!(matches!(
            validate_block(&block),
            Err(IrError::EmptyAssignment { .. })
        ));
    }
}
