//! Kiln IR data structures.
//!
//! The IR is a block-structured tree: ordered statement sequences forming
//! lexical scopes, with first-class function definitions, multi-assignment,
//! conditionals, multi-way switches and bounded for-loops. Expressions are a
//! small sum of literals, identifier reads and calls; the machine word is a
//! 256-bit unsigned integer.
//!
//! Nodes are plain tagged variants and passes dispatch by pattern matching;
//! there is no node class hierarchy. Every tree is owned by its enclosing
//! block, no node is shared between two parents and there are no cycles, so
//! passes may rewrite children in place or splice replacement sequences into
//! a parent block.

use crate::span::Span;
use ethnum::U256;
use smol_str::SmolStr;

/// Variable and function names. Cheap to clone, compare and hash.
pub type Name = SmolStr;

// ============================================================================
// Store identity
// ============================================================================

/// Identity of a tracked store (an assignment or an initialized variable
/// declaration).
///
/// The unused-assignment eliminator keys its analysis maps by this id, so it
/// must survive the analysis phase unmodified; a numbering pre-pass assigns
/// ids before analysis starts and the removal phase consumes them afterwards.
/// The id is bookkeeping, not structure: it takes no part in equality and is
/// never printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(pub u32);

impl StoreId {
    /// Id of a node no numbering pass has seen yet.
    pub const UNSET: StoreId = StoreId(0);

    pub fn is_set(self) -> bool {
        self != StoreId::UNSET
    }
}

impl Default for StoreId {
    fn default() -> Self {
        StoreId::UNSET
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// A compile-time constant word
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: U256,
    pub span: Span,
}

impl Literal {
    pub fn new(value: impl Into<U256>) -> Self {
        Self {
            value: value.into(),
            span: Span::dummy(),
        }
    }

    /// The literal's value as the machine word.
    pub fn value(&self) -> U256 {
        self.value
    }
}

/// A read of a variable by name
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: Name,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            span: Span::dummy(),
        }
    }
}

/// A call of a builtin or user-defined function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: Name,
    pub args: Vec<Expression>,
    pub span: Span,
}

impl FunctionCall {
    pub fn new(name: impl Into<Name>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
            span: Span::dummy(),
        }
    }
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Identifier(Identifier),
    FunctionCall(FunctionCall),
}

impl Expression {
    pub fn literal(value: impl Into<U256>) -> Self {
        Expression::Literal(Literal::new(value))
    }

    pub fn identifier(name: impl Into<Name>) -> Self {
        Expression::Identifier(Identifier::new(name))
    }

    pub fn call(name: impl Into<Name>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall(FunctionCall::new(name, args))
    }

    /// The constant value of this expression, if it is a literal.
    pub fn literal_value(&self) -> Option<U256> {
        match self {
            Expression::Literal(literal) => Some(literal.value),
            _ => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(literal) => literal.span,
            Expression::Identifier(identifier) => identifier.span,
            Expression::FunctionCall(call) => call.span,
        }
    }
}

// ============================================================================
// Statements
// ============================================================================

/// A name introduced by a declaration, parameter list or return list.
///
/// The IR is untyped beyond the machine word; the struct exists so that
/// declarations round-trip as a unit distinct from identifier reads.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedName {
    pub name: Name,
    pub span: Span,
}

impl TypedName {
    pub fn new(name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            span: Span::dummy(),
        }
    }
}

/// An ordered statement sequence forming a lexical scope
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            span: Span::dummy(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// `let a, b := value`: introduces new names into the enclosing block's
/// scope, visible only after the declaration point
#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub id: StoreId,
    pub variables: Vec<TypedName>,
    pub value: Option<Expression>,
    pub span: Span,
}

impl VariableDeclaration {
    pub fn new(variables: &[&str], value: Option<Expression>) -> Self {
        Self {
            id: StoreId::UNSET,
            variables: variables.iter().map(|name| TypedName::new(*name)).collect(),
            value,
            span: Span::dummy(),
        }
    }
}

impl PartialEq for VariableDeclaration {
    fn eq(&self, other: &Self) -> bool {
        // StoreId is analysis bookkeeping, not structure.
        self.variables == other.variables && self.value == other.value && self.span == other.span
    }
}

/// `a, b := value`: writes each target
#[derive(Debug, Clone)]
pub struct Assignment {
    pub id: StoreId,
    pub targets: Vec<Identifier>,
    pub value: Expression,
    pub span: Span,
}

impl Assignment {
    pub fn new(targets: &[&str], value: Expression) -> Self {
        Self {
            id: StoreId::UNSET,
            targets: targets.iter().map(|name| Identifier::new(*name)).collect(),
            value,
            span: Span::dummy(),
        }
    }
}

impl PartialEq for Assignment {
    fn eq(&self, other: &Self) -> bool {
        // StoreId is analysis bookkeeping, not structure.
        self.targets == other.targets && self.value == other.value && self.span == other.span
    }
}

/// `if condition { body }`: the body runs iff the condition is nonzero
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Expression,
    pub body: Block,
    pub span: Span,
}

impl If {
    pub fn new(condition: Expression, body: Block) -> Self {
        Self {
            condition,
            body,
            span: Span::dummy(),
        }
    }
}

/// One arm of a switch; a missing value marks the default case
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub value: Option<Literal>,
    pub body: Block,
    pub span: Span,
}

impl Case {
    pub fn new(value: Option<Literal>, body: Block) -> Self {
        Self {
            value,
            body,
            span: Span::dummy(),
        }
    }
}

/// `switch expression case .. default ..`: selector values are pairwise
/// distinct and at most one default is present
#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub expression: Expression,
    pub cases: Vec<Case>,
    pub span: Span,
}

impl Switch {
    pub fn new(expression: Expression, cases: Vec<Case>) -> Self {
        Self {
            expression,
            cases,
            span: Span::dummy(),
        }
    }
}

/// `for { pre } condition { post } { body }`
///
/// The pre block runs once in the loop's scope before the first test; the
/// test gates entry; after the body the post block runs, then the test again.
#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub pre: Block,
    pub condition: Expression,
    pub post: Block,
    pub body: Block,
    pub span: Span,
}

impl ForLoop {
    pub fn new(pre: Block, condition: Expression, post: Block, body: Block) -> Self {
        Self {
            pre,
            condition,
            post,
            body,
            span: Span::dummy(),
        }
    }
}

/// `function name(params) -> returns { body }`
///
/// Opens a fresh variable scope; return variables are implicitly declared
/// and live on every exit path, including `leave`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: Name,
    pub parameters: Vec<TypedName>,
    pub return_variables: Vec<TypedName>,
    pub body: Block,
    pub span: Span,
}

impl FunctionDefinition {
    pub fn new(
        name: impl Into<Name>,
        parameters: &[&str],
        return_variables: &[&str],
        body: Block,
    ) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.iter().map(|name| TypedName::new(*name)).collect(),
            return_variables: return_variables
                .iter()
                .map(|name| TypedName::new(*name))
                .collect(),
            body,
            span: Span::dummy(),
        }
    }
}

/// Expression evaluated for its effects only
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

impl ExpressionStatement {
    pub fn new(expression: Expression) -> Self {
        Self {
            expression,
            span: Span::dummy(),
        }
    }
}

/// Statement kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block(Block),
    VariableDeclaration(VariableDeclaration),
    Assignment(Assignment),
    If(If),
    Switch(Switch),
    ForLoop(ForLoop),
    FunctionDefinition(FunctionDefinition),
    /// Exit the innermost enclosing for-loop past its end
    Break(Span),
    /// Skip to the post block of the innermost enclosing for-loop
    Continue(Span),
    /// Exit the enclosing function
    Leave(Span),
    Expression(ExpressionStatement),
}

impl Statement {
    /// `let name := value` / `let name`
    pub fn declare(name: &str, value: Option<Expression>) -> Self {
        VariableDeclaration::new(&[name], value).into()
    }

    /// `name := value`
    pub fn assign(name: &str, value: Expression) -> Self {
        Assignment::new(&[name], value).into()
    }

    /// Expression evaluated for effect
    pub fn expression(expression: Expression) -> Self {
        ExpressionStatement::new(expression).into()
    }

    pub fn span(&self) -> Span {
        match self {
            Statement::Block(block) => block.span,
            Statement::VariableDeclaration(declaration) => declaration.span,
            Statement::Assignment(assignment) => assignment.span,
            Statement::If(if_stmt) => if_stmt.span,
            Statement::Switch(switch) => switch.span,
            Statement::ForLoop(for_loop) => for_loop.span,
            Statement::FunctionDefinition(function) => function.span,
            Statement::Break(span) | Statement::Continue(span) | Statement::Leave(span) => *span,
            Statement::Expression(statement) => statement.span,
        }
    }
}

impl From<Block> for Statement {
    fn from(block: Block) -> Self {
        Statement::Block(block)
    }
}

impl From<VariableDeclaration> for Statement {
    fn from(declaration: VariableDeclaration) -> Self {
        Statement::VariableDeclaration(declaration)
    }
}

impl From<Assignment> for Statement {
    fn from(assignment: Assignment) -> Self {
        Statement::Assignment(assignment)
    }
}

impl From<If> for Statement {
    fn from(if_stmt: If) -> Self {
        Statement::If(if_stmt)
    }
}

impl From<Switch> for Statement {
    fn from(switch: Switch) -> Self {
        Statement::Switch(switch)
    }
}

impl From<ForLoop> for Statement {
    fn from(for_loop: ForLoop) -> Self {
        Statement::ForLoop(for_loop)
    }
}

impl From<FunctionDefinition> for Statement {
    fn from(function: FunctionDefinition) -> Self {
        Statement::FunctionDefinition(function)
    }
}

impl From<ExpressionStatement> for Statement {
    fn from(statement: ExpressionStatement) -> Self {
        Statement::Expression(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_value() {
        let expr = Expression::literal(42u64);
        assert_eq!(expr.literal_value(), Some(U256::new(42)));

        let expr = Expression::identifier("x");
        assert_eq!(expr.literal_value(), None);

        let expr = Expression::call("add", vec![Expression::literal(1u64)]);
        assert_eq!(expr.literal_value(), None);
    }

    #[test]
    fn test_store_id_default_is_unset() {
        let assignment = Assignment::new(&["x"], Expression::literal(1u64));
        assert_eq!(assignment.id, StoreId::UNSET);
        assert!(!assignment.id.is_set());
        assert!(StoreId(1).is_set());
    }

    #[test]
    fn test_store_id_is_not_structure() {
        let mut a = Assignment::new(&["x"], Expression::literal(1u64));
        let b = Assignment::new(&["x"], Expression::literal(1u64));
        a.id = StoreId(7);
        assert_eq!(a, b);

        let mut c = VariableDeclaration::new(&["x"], Some(Expression::literal(1u64)));
        let d = VariableDeclaration::new(&["x"], Some(Expression::literal(1u64)));
        c.id = StoreId(9);
        assert_eq!(c, d);
    }

    #[test]
    fn test_builders() {
        let block = Block::new(vec![
            Statement::declare("x", Some(Expression::literal(1u64))),
            Statement::assign("x", Expression::literal(2u64)),
            Statement::expression(Expression::call(
                "sstore",
                vec![Expression::literal(0u64), Expression::identifier("x")],
            )),
        ]);
        assert_eq!(block.statements.len(), 3);
        assert!(matches!(
            block.statements[0],
            Statement::VariableDeclaration(_)
        ));
        assert!(matches!(block.statements[1], Statement::Assignment(_)));
    }

    #[test]
    fn test_function_definition_builder() {
        let function = FunctionDefinition::new("f", &["a", "b"], &["r"], Block::empty());
        assert_eq!(function.parameters.len(), 2);
        assert_eq!(function.return_variables.len(), 1);
        assert_eq!(function.return_variables[0].name.as_str(), "r");
    }

    #[test]
    fn test_statement_span_round_trip() {
        let mut if_stmt = If::new(Expression::literal(1u64), Block::empty());
        if_stmt.span = Span::new(5, 17);
        let statement = Statement::from(if_stmt);
        assert_eq!(statement.span(), Span::new(5, 17));
    }
}
