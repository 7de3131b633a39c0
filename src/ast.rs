use crate::expr::*;
use crate::literal::Literal;
use crate::stmt::*;

/// Builds a parenthesized prefix-notation string for an operator and its
/// operands, recursing through `accept` on each.
macro_rules! parenthesize {
    ( $self:ident, $name:expr, $( $x:expr ),+ ) => {
        {
            let mut string = String::new();
            string += "(";
            string += $name;
            $(
                string += " ";
                string += &$x.accept($self);
            )*
            string += ")";

            string
        }
    };
}

/// Renders an AST back to a Lox-like source string. Used by tests to check
/// that parsing preserves structure, not to regenerate runnable source.
#[derive(Default)]
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&mut self, expr: &Expr) -> String {
        expr.accept(self)
    }
}

impl ExprVisitor<String> for AstPrinter {
    fn visit_literal_expr(&mut self, literal: &Literal) -> String {
        literal.to_string()
    }

    fn visit_logical_expr(&mut self, data: &LogicalData) -> String {
        parenthesize!(self, &data.operator.lexeme, &data.left, &data.right)
    }

    fn visit_unary_expr(&mut self, data: &UnaryData) -> String {
        parenthesize!(self, &data.operator.lexeme, &data.expr)
    }

    fn visit_binary_expr(&mut self, data: &BinaryData) -> String {
        parenthesize!(self, &data.operator.lexeme, &data.left, &data.right)
    }

    fn visit_grouping_expr(&mut self, data: &GroupingData) -> String {
        parenthesize!(self, "group", data.expr)
    }

    fn visit_variable_expr(&mut self, data: &VariableData) -> String {
        data.name.lexeme.clone()
    }

    fn visit_assign_expr(&mut self, data: &AssignData) -> String {
        parenthesize!(self, format!("= {}", data.name.lexeme).as_str(), data.value)
    }

    fn visit_call_expr(&mut self, data: &CallData) -> String {
        let mut string = data.callee.accept(self);
        string += "(";
        string += &data.arguments.iter().map(|arg| arg.accept(self)).collect::<Vec<_>>().join(" ");
        string += ")";
        string
    }

    fn visit_get_expr(&mut self, data: &GetData) -> String {
        format!("(. {} {})", data.object.accept(self), data.name.lexeme)
    }

    fn visit_set_expr(&mut self, data: &SetData) -> String {
        format!("(= (. {} {}) {})", data.object.accept(self), data.name.lexeme, data.value.accept(self))
    }

    fn visit_this_expr(&mut self, _data: &ThisData) -> String {
        "this".to_string()
    }

    fn visit_super_expr(&mut self, data: &SuperData) -> String {
        format!("(super.{})", data.method.lexeme)
    }
}

impl StmtVisitor<String> for AstPrinter {
    fn visit_expression_stmt(&mut self, data: &ExpressionData) -> String {
        parenthesize!(self, "expr", data.expr)
    }

    fn visit_print_stmt(&mut self, data: &PrintData) -> String {
        parenthesize!(self, "print", data.expr)
    }

    fn visit_var_stmt(&mut self, data: &VarData) -> String {
        match &data.initializer {
            Some(initializer) => format!("(var {} = {})", data.name.lexeme, initializer.accept(self)),
            None => format!("(var {})", data.name.lexeme),
        }
    }

    fn visit_block_stmt(&mut self, data: &BlockData) -> String {
        let mut string = "{".to_string();
        for stmt in &data.statements {
            string += " ";
            string += &stmt.accept(self);
        }
        string += " }";
        string
    }

    fn visit_if_stmt(&mut self, data: &IfData) -> String {
        let mut string = format!("(if {} {}", data.condition.accept(self), data.then_branch.accept(self));
        if let Some(else_branch) = &data.else_branch {
            string += &format!(" else {}", else_branch.accept(self));
        }
        string += ")";
        string
    }

    fn visit_while_stmt(&mut self, data: &WhileData) -> String {
        parenthesize!(self, "while", data.condition, data.body)
    }

    fn visit_function_stmt(&mut self, data: &FunctionData) -> String {
        let params = data.params.iter().map(|p| p.lexeme.clone()).collect::<Vec<_>>().join(" ");
        let body = data.body.iter().map(|stmt| stmt.accept(self)).collect::<Vec<_>>().join(" ");
        format!("(fun {}({}) {{ {} }})", data.name.lexeme, params, body)
    }

    fn visit_return_stmt(&mut self, data: &ReturnData) -> String {
        match &data.value {
            Some(value) => format!("(return {})", value.accept(self)),
            None => "(return)".to_string(),
        }
    }

    fn visit_class_stmt(&mut self, data: &ClassData) -> String {
        let mut string = format!("(class {}", data.name.lexeme);
        if let Some(superclass) = &data.superclass {
            string += &format!(" < {}", superclass.accept(self));
        }
        for method in &data.methods {
            string += " ";
            string += &method.accept(self);
        }
        string += ")";
        string
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Diagnostics;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn print_first(source: &str) -> String {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let statements = Parser::new(tokens).parse(&mut diagnostics);
        statements[0].accept(&mut AstPrinter)
    }

    #[test]
    fn prints_binary_expression_in_prefix_form() {
        assert_eq!(print_first("1 + 2 * 3;"), "(expr (+ 1 (* 2 3)))");
    }

    #[test]
    fn prints_grouping() {
        assert_eq!(print_first("(1 + 2) * 3;"), "(expr (* (group (+ 1 2)) 3))");
    }

    #[test]
    fn prints_var_declaration() {
        assert_eq!(print_first("var a = 1;"), "(var a = 1)");
    }
}
