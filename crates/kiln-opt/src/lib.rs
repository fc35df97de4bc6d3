//! Optimization passes over Kiln IR.
//!
//! Two semantics-preserving passes reduce code size and remove dead work
//! before code generation:
//!
//! - **Structural simplification** ([`simplify_structure`]): collapses
//!   control flow driven by compile-time constants and removes the
//!   degenerate `if .. { leave }` tail of a function body.
//! - **Unused-assignment elimination**
//!   ([`eliminate_unused_assignments`]): a scope-aware data-flow analysis
//!   that deletes stores whose written value can never be observed, when
//!   the stored expression is movable.
//!
//! # Architecture
//!
//! ```text
//! IR → simplify_structure → eliminate_unused_assignments → IR
//! ```
//!
//! Both passes mutate the block in place, preserve observable behavior for
//! every execution, and are idempotent on their own output. They are
//! intra-procedural and single-threaded; a pass owns the IR for the
//! duration of the call.
//!
//! # Example
//!
//! ```
//! use kiln_ir::{Block, Dialect, Expression, Statement};
//! use kiln_opt::{optimize, OptContext, OptLevel};
//!
//! let dialect = Dialect::evm();
//! let ctx = OptContext::new(&dialect);
//! let mut block = Block::new(vec![
//!     Statement::declare("x", Some(Expression::literal(1u64))),
//!     Statement::assign("x", Expression::literal(2u64)),
//! ]);
//! optimize(&ctx, &mut block, OptLevel::Basic);
//! ```

use kiln_ir::{Block, Dialect};

pub mod semantics;
mod simplify;
mod unused_assign;

pub use semantics::{contains_terminating_call, control_flow_kind, is_movable, ControlFlow};
pub use simplify::simplify_structure;
pub use unused_assign::eliminate_unused_assignments;

/// Shared state handed to every pass: a handle to the dialect the IR is
/// written against.
#[derive(Debug, Clone, Copy)]
pub struct OptContext<'a> {
    pub dialect: &'a Dialect,
}

impl<'a> OptContext<'a> {
    pub fn new(dialect: &'a Dialect) -> Self {
        Self { dialect }
    }
}

/// Optimization level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    #[default]
    None,
    /// One round of structural simplification and unused-assignment
    /// elimination
    Basic,
    /// Repeated rounds; each pass can expose more work for the other
    Aggressive,
}

/// Apply the optimization passes to a block at the given level.
pub fn optimize(ctx: &OptContext<'_>, block: &mut Block, level: OptLevel) {
    match level {
        OptLevel::None => {}
        OptLevel::Basic => {
            tracing::debug!("optimizing (basic)");
            simplify_structure(ctx, block);
            eliminate_unused_assignments(ctx, block);
        }
        OptLevel::Aggressive => {
            tracing::debug!("optimizing (aggressive)");
            for _ in 0..3 {
                simplify_structure(ctx, block);
                eliminate_unused_assignments(ctx, block);
            }
        }
    }
}
