//! Pretty printing for Kiln IR.
//!
//! Produces a deterministic, human-readable rendering of IR trees for
//! diagnostics and tests. Two trees print equal iff they are structurally
//! equal (store ids and spans are bookkeeping and never printed).

use std::fmt::Write;

use crate::ir::*;

/// Pretty print a block, including its braces.
pub fn print_block(block: &Block) -> String {
    let mut printer = Printer::new();
    printer.block(block);
    printer.out
}

/// Pretty print a single statement.
pub fn print_statement(statement: &Statement) -> String {
    let mut printer = Printer::new();
    printer.statement(statement);
    printer.out
}

/// Pretty print a single expression.
pub fn print_expression(expression: &Expression) -> String {
    let mut printer = Printer::new();
    printer.expression(expression);
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push(' ');
        }
    }

    fn block(&mut self, block: &Block) {
        if block.statements.is_empty() {
            self.out.push_str("{ }");
            return;
        }
        self.out.push_str("{\n");
        self.indent += 2;
        for statement in &block.statements {
            self.write_indent();
            self.statement(statement);
            self.out.push('\n');
        }
        self.indent -= 2;
        self.write_indent();
        self.out.push('}');
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Block(block) => self.block(block),
            Statement::VariableDeclaration(declaration) => {
                self.out.push_str("let ");
                self.name_list(declaration.variables.iter().map(|v| v.name.as_str()));
                if let Some(value) = &declaration.value {
                    self.out.push_str(" := ");
                    self.expression(value);
                }
            }
            Statement::Assignment(assignment) => {
                self.name_list(assignment.targets.iter().map(|t| t.name.as_str()));
                self.out.push_str(" := ");
                self.expression(&assignment.value);
            }
            Statement::If(if_stmt) => {
                self.out.push_str("if ");
                self.expression(&if_stmt.condition);
                self.out.push(' ');
                self.block(&if_stmt.body);
            }
            Statement::Switch(switch) => {
                self.out.push_str("switch ");
                self.expression(&switch.expression);
                for case in &switch.cases {
                    self.out.push('\n');
                    self.write_indent();
                    match &case.value {
                        Some(literal) => {
                            let _ = write!(self.out, "case {} ", literal.value);
                        }
                        None => self.out.push_str("default "),
                    }
                    self.block(&case.body);
                }
            }
            Statement::ForLoop(for_loop) => {
                self.out.push_str("for ");
                self.block(&for_loop.pre);
                self.out.push(' ');
                self.expression(&for_loop.condition);
                self.out.push(' ');
                self.block(&for_loop.post);
                self.out.push(' ');
                self.block(&for_loop.body);
            }
            Statement::FunctionDefinition(function) => {
                let _ = write!(self.out, "function {}(", function.name);
                self.name_list(function.parameters.iter().map(|p| p.name.as_str()));
                self.out.push(')');
                if !function.return_variables.is_empty() {
                    self.out.push_str(" -> ");
                    self.name_list(function.return_variables.iter().map(|r| r.name.as_str()));
                }
                self.out.push(' ');
                self.block(&function.body);
            }
            Statement::Break(_) => self.out.push_str("break"),
            Statement::Continue(_) => self.out.push_str("continue"),
            Statement::Leave(_) => self.out.push_str("leave"),
            Statement::Expression(statement) => self.expression(&statement.expression),
        }
    }

    fn expression(&mut self, expression: &Expression) {
        match expression {
            Expression::Literal(literal) => {
                let _ = write!(self.out, "{}", literal.value);
            }
            Expression::Identifier(identifier) => self.out.push_str(&identifier.name),
            Expression::FunctionCall(call) => {
                let _ = write!(self.out, "{}(", call.name);
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expression(arg);
                }
                self.out.push(')');
            }
        }
    }

    fn name_list<'a>(&mut self, names: impl Iterator<Item = &'a str>) {
        for (i, name) in names.enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_expressions() {
        assert_eq!(print_expression(&Expression::literal(42u64)), "42");
        assert_eq!(print_expression(&Expression::identifier("x")), "x");
        assert_eq!(
            print_expression(&Expression::call(
                "add",
                vec![Expression::identifier("a"), Expression::literal(1u64)],
            )),
            "add(a, 1)"
        );
    }

    #[test]
    fn test_print_declaration_and_assignment() {
        assert_eq!(
            print_statement(&Statement::declare("x", Some(Expression::literal(1u64)))),
            "let x := 1"
        );
        assert_eq!(print_statement(&Statement::declare("x", None)), "let x");
        assert_eq!(
            print_statement(&Statement::assign("x", Expression::literal(2u64))),
            "x := 2"
        );
        assert_eq!(
            print_statement(
                &Assignment::new(&["a", "b"], Expression::call("f", vec![])).into()
            ),
            "a, b := f()"
        );
    }

    #[test]
    fn test_print_if_and_block() {
        let statement = Statement::from(If::new(
            Expression::identifier("c"),
            Block::new(vec![Statement::Leave(Default::default())]),
        ));
        assert_eq!(print_statement(&statement), "if c {\n  leave\n}");
        assert_eq!(print_block(&Block::empty()), "{ }");
    }

    #[test]
    fn test_print_switch() {
        let statement = Statement::from(Switch::new(
            Expression::identifier("x"),
            vec![
                Case::new(
                    Some(Literal::new(1u64)),
                    Block::new(vec![Statement::assign("a", Expression::literal(1u64))]),
                ),
                Case::new(None, Block::empty()),
            ],
        ));
        assert_eq!(
            print_statement(&statement),
            "switch x\ncase 1 {\n  a := 1\n}\ndefault { }"
        );
    }

    #[test]
    fn test_print_for_loop() {
        let statement = Statement::from(ForLoop::new(
            Block::new(vec![Statement::declare(
                "i",
                Some(Expression::literal(0u64)),
            )]),
            Expression::call(
                "lt",
                vec![Expression::identifier("i"), Expression::literal(10u64)],
            ),
            Block::new(vec![Statement::assign(
                "i",
                Expression::call(
                    "add",
                    vec![Expression::identifier("i"), Expression::literal(1u64)],
                ),
            )]),
            Block::empty(),
        ));
        assert_eq!(
            print_statement(&statement),
            "for {\n  let i := 0\n} lt(i, 10) {\n  i := add(i, 1)\n} { }"
        );
    }

    #[test]
    fn test_print_function_definition() {
        let statement = Statement::from(FunctionDefinition::new(
            "f",
            &["a"],
            &["r"],
            Block::new(vec![Statement::assign("r", Expression::identifier("a"))]),
        ));
        assert_eq!(
            print_statement(&statement),
            "function f(a) -> r {\n  r := a\n}"
        );

        let statement = Statement::from(FunctionDefinition::new("g", &[], &[], Block::empty()));
        assert_eq!(print_statement(&statement), "function g() { }");
    }

    #[test]
    fn test_nested_indentation() {
        let block = Block::new(vec![Statement::from(If::new(
            Expression::literal(1u64),
            Block::new(vec![Statement::from(If::new(
                Expression::identifier("c"),
                Block::new(vec![Statement::Break(Default::default())]),
            ))]),
        ))]);
        assert_eq!(
            print_block(&block),
            "{\n  if 1 {\n    if c {\n      break\n    }\n  }\n}"
        );
    }
}
