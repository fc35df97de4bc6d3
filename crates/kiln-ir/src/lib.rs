//! Intermediate representation for the Kiln compiler.
//!
//! Kiln IR is a low-level, block-structured representation for a 256-bit
//! stack machine. It keeps structured control flow (blocks, conditionals,
//! switches, bounded for-loops) and first-class function definitions rather
//! than flattening to basic blocks, which lets the optimizer reason about
//! lexical scopes directly.
//!
//! # Architecture
//!
//! ```text
//! producer → validate → IR → [kiln-opt passes] → IR → codegen
//! ```
//!
//! This crate provides:
//!
//! - the IR node types and builders ([`ir`])
//! - source spans round-tripped through every rewrite ([`Span`])
//! - the splice-rewrite primitive passes use to replace statements by
//!   subsequences ([`iterate_replacing`])
//! - the dialect, i.e. the builtin registry of the target machine
//!   ([`dialect`])
//! - a deterministic pretty printer for diagnostics ([`pretty`])
//! - structural validation run upstream of the passes ([`validate`])

pub use ethnum::U256;

pub mod dialect;
pub mod ir;
pub mod pretty;
mod rewrite;
mod span;
pub mod validate;

// Re-export main types
pub use ir::{
    // Expressions
    Expression,
    FunctionCall,
    Identifier,
    Literal,
    Name,

    // Statements
    Assignment,
    Block,
    Case,
    ExpressionStatement,
    ForLoop,
    FunctionDefinition,
    If,
    Statement,
    Switch,
    TypedName,
    VariableDeclaration,

    // Store identity
    StoreId,
};

pub use dialect::{BuiltinFunction, Dialect};
pub use pretty::{print_block, print_expression, print_statement};
pub use rewrite::iterate_replacing;
pub use span::Span;
pub use validate::{validate_block, IrError};
