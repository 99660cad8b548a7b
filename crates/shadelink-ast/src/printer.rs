//! GLSL source output for a [`Document`].

use crate::document::Document;
use crate::node::{JumpKind, NodeClass, NodeId, NodeKind};

pub struct Printer<'a> {
    doc: &'a Document,
    indent_level: usize,
    output: String,
}

impl<'a> Printer<'a> {
    pub fn print(doc: &'a Document) -> String {
        let mut printer = Printer {
            doc,
            indent_level: 0,
            output: String::new(),
        };
        printer.print_unit();
        printer.output
    }

    fn indent(&mut self) {
        self.output.push_str(&"    ".repeat(self.indent_level));
    }

    fn push_line(&mut self, text: &str) {
        self.indent();
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn print_unit(&mut self) {
        let doc = self.doc;
        let mut previous: Option<NodeClass> = None;
        for &declaration in doc.declarations() {
            let class = doc.class(declaration);
            let separated = class == NodeClass::FunctionDefinition
                || previous == Some(NodeClass::FunctionDefinition);
            if previous.is_some() && separated {
                self.output.push('\n');
            }
            self.print_external(declaration);
            previous = Some(class);
        }
    }

    fn print_external(&mut self, id: NodeId) {
        let doc = self.doc;
        match doc.kind(id) {
            NodeKind::Directive(text) => self.push_line(text),
            NodeKind::EmptyDeclaration => self.push_line(";"),
            NodeKind::FunctionDefinition { prototype, body } => {
                let header = self.prototype(*prototype);
                self.push_line(&format!("{} {{", header));
                self.print_block_contents(*body);
                self.push_line("}");
            }
            NodeKind::FunctionPrototype { .. } => {
                let header = self.prototype(id);
                self.push_line(&format!("{};", header));
            }
            NodeKind::VariableDeclaration { .. } => {
                let text = self.declaration(id);
                self.push_line(&format!("{};", text));
            }
            _ => {
                let text = self.expression(id);
                self.push_line(&text);
            }
        }
    }

    fn print_block_contents(&mut self, block: NodeId) {
        let doc = self.doc;
        self.indent_level += 1;
        match doc.kind(block) {
            NodeKind::CompoundStatement { statements } => {
                for &statement in statements {
                    self.print_statement(statement);
                }
            }
            _ => self.print_statement(block),
        }
        self.indent_level -= 1;
    }

    fn print_statement(&mut self, id: NodeId) {
        let doc = self.doc;
        match doc.kind(id) {
            NodeKind::CompoundStatement { .. } => {
                self.push_line("{");
                self.print_block_contents(id);
                self.push_line("}");
            }
            NodeKind::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                let (then_branch, else_branch) = (*then_branch, *else_branch);
                let condition = self.expression(*condition);
                self.push_line(&format!("if ({}) {{", condition));
                self.print_block_contents(then_branch);
                match else_branch {
                    Some(branch) => {
                        self.push_line("} else {");
                        self.print_block_contents(branch);
                        self.push_line("}");
                    }
                    None => self.push_line("}"),
                }
            }
            NodeKind::ForStatement {
                init,
                condition,
                step,
                body,
            } => {
                let init = init.map(|init| self.inline_statement(init)).unwrap_or_default();
                let condition = condition.map(|c| self.expression(c)).unwrap_or_default();
                let step = step.map(|s| self.expression(s)).unwrap_or_default();
                let body = *body;
                self.push_line(&format!("for ({}; {}; {}) {{", init, condition, step));
                self.print_block_contents(body);
                self.push_line("}");
            }
            NodeKind::WhileStatement { condition, body } => {
                let body = *body;
                let condition = self.expression(*condition);
                self.push_line(&format!("while ({}) {{", condition));
                self.print_block_contents(body);
                self.push_line("}");
            }
            _ => {
                let text = self.inline_statement(id);
                self.push_line(&format!("{};", text));
            }
        }
    }

    /// A simple statement without its terminator.
    fn inline_statement(&self, id: NodeId) -> String {
        match self.doc.kind(id) {
            NodeKind::DeclarationStatement { declaration } => self.declaration(*declaration),
            NodeKind::ExpressionStatement { expression } => {
                expression.map(|e| self.expression(e)).unwrap_or_default()
            }
            NodeKind::ReturnStatement { value: Some(value) } => {
                format!("return {}", self.expression(*value))
            }
            NodeKind::ReturnStatement { value: None } => "return".to_string(),
            NodeKind::JumpStatement(JumpKind::Break) => "break".to_string(),
            NodeKind::JumpStatement(JumpKind::Continue) => "continue".to_string(),
            NodeKind::JumpStatement(JumpKind::Discard) => "discard".to_string(),
            _ => self.expression(id),
        }
    }

    fn prototype(&self, id: NodeId) -> String {
        match self.doc.kind(id) {
            NodeKind::FunctionPrototype {
                return_type,
                name,
                parameters,
            } => {
                let parameters = parameters
                    .iter()
                    .map(|p| self.parameter(*p))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "{} {}({})",
                    self.full_type(*return_type),
                    self.expression(*name),
                    parameters
                )
            }
            _ => String::new(),
        }
    }

    fn parameter(&self, id: NodeId) -> String {
        match self.doc.kind(id) {
            NodeKind::FunctionParameter { ty, name, array } => {
                let mut text = self.full_type(*ty);
                if let Some(name) = name {
                    text.push(' ');
                    text.push_str(&self.expression(*name));
                }
                if let Some(array) = array {
                    text.push_str(&self.array(*array));
                }
                text
            }
            _ => String::new(),
        }
    }

    fn declaration(&self, id: NodeId) -> String {
        match self.doc.kind(id) {
            NodeKind::VariableDeclaration { ty, members } => {
                let members = members
                    .iter()
                    .map(|m| self.member(*m))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} {}", self.full_type(*ty), members)
            }
            _ => String::new(),
        }
    }

    fn member(&self, id: NodeId) -> String {
        match self.doc.kind(id) {
            NodeKind::DeclarationMember {
                name,
                array,
                initializer,
            } => {
                let mut text = self.expression(*name);
                if let Some(array) = array {
                    text.push_str(&self.array(*array));
                }
                if let Some(value) = initializer {
                    text.push_str(" = ");
                    text.push_str(&self.expression(*value));
                }
                text
            }
            _ => String::new(),
        }
    }

    fn array(&self, id: NodeId) -> String {
        match self.doc.kind(id) {
            NodeKind::ArraySpecifier { size: Some(size) } => format!("[{}]", self.expression(*size)),
            _ => "[]".to_string(),
        }
    }

    fn full_type(&self, id: NodeId) -> String {
        match self.doc.kind(id) {
            NodeKind::FullySpecifiedType {
                qualifier,
                specifier,
            } => {
                let specifier = self.expression(*specifier);
                match qualifier {
                    Some(qualifier) => {
                        let parts = self
                            .doc
                            .qualifier_parts(*qualifier)
                            .iter()
                            .map(|part| self.expression(*part))
                            .collect::<Vec<_>>();
                        if parts.is_empty() {
                            specifier
                        } else {
                            format!("{} {}", parts.join(" "), specifier)
                        }
                    }
                    None => specifier,
                }
            }
            _ => String::new(),
        }
    }

    fn operand(&self, id: NodeId) -> String {
        let text = self.expression(id);
        match self.doc.class(id) {
            NodeClass::BinaryExpression
            | NodeClass::AssignmentExpression
            | NodeClass::ConditionalExpression => format!("({})", text),
            _ => text,
        }
    }

    fn expression(&self, id: NodeId) -> String {
        match self.doc.kind(id) {
            NodeKind::Identifier(name) => name.clone(),
            NodeKind::TypeSpecifier(ty) => ty.to_string(),
            NodeKind::StorageQualifier(storage) => storage.keyword().to_string(),
            NodeKind::QualifierText(text) => text.clone(),
            NodeKind::ReferenceExpression { name } => self.expression(*name),
            NodeKind::LiteralExpression(value) => value.to_string(),
            NodeKind::FunctionCallExpression { callee, arguments } => {
                let arguments = arguments
                    .iter()
                    .map(|a| self.expression(*a))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}({})", self.expression(*callee), arguments)
            }
            NodeKind::AssignmentExpression { op, target, value } => {
                format!("{} {} {}", self.expression(*target), op.symbol(), self.expression(*value))
            }
            NodeKind::BinaryExpression { op, left, right } => {
                format!("{} {} {}", self.operand(*left), op.symbol(), self.operand(*right))
            }
            NodeKind::UnaryExpression { op, operand } => {
                if op.is_postfix() {
                    format!("{}{}", self.operand(*operand), op.symbol())
                } else {
                    format!("{}{}", op.symbol(), self.operand(*operand))
                }
            }
            NodeKind::MemberAccessExpression { base, field } => {
                format!("{}.{}", self.operand(*base), field)
            }
            NodeKind::IndexExpression { base, index } => {
                format!("{}[{}]", self.operand(*base), self.expression(*index))
            }
            NodeKind::ConditionalExpression {
                condition,
                then_value,
                else_value,
            } => format!(
                "{} ? {} : {}",
                self.operand(*condition),
                self.operand(*then_value),
                self.operand(*else_value)
            ),
            NodeKind::VariableDeclaration { .. } => self.declaration(id),
            NodeKind::FullySpecifiedType { .. } => self.full_type(id),
            _ => String::new(),
        }
    }
}
