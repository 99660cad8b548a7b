//! Owned interchange tree handed over by an external GLSL front end.
//!
//! This is the serialized shape of a parsed translation unit. It is lowered
//! into a [`Document`] with [`Document::from_syntax`], which is where the
//! arena and identifier index get built.

use serde::{Deserialize, Serialize};
use shadelink_core::{Literal, ShadelinkError, ShadelinkResult};

use crate::document::Document;
use crate::node::{AssignOp, BinaryOp, JumpKind, NodeId, NodeKind, StorageQualifier, TypeName, UnaryOp};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    #[serde(default)]
    pub declarations: Vec<ExternalDeclaration>,
}

impl TranslationUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, declaration: ExternalDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExternalDeclaration {
    /// A line copied to the output verbatim: a preprocessor line (`#version`,
    /// `#extension`, `#define`) or a qualifier-only declaration such as
    /// `layout(triangles) in;` or `layout(max_vertices = 3) out;`, which has
    /// no members and so cannot be a [`ExternalDeclaration::Variable`].
    /// The text must start with `#` or end with `;`.
    Directive {
        text: String,
    },
    Empty,
    Function {
        prototype: Prototype,
        #[serde(default)]
        body: Vec<Statement>,
    },
    Prototype {
        prototype: Prototype,
    },
    Variable {
        ty: FullType,
        members: Vec<Member>,
    },
}

impl ExternalDeclaration {
    pub fn directive(text: impl Into<String>) -> Self {
        ExternalDeclaration::Directive { text: text.into() }
    }

    /// A `void name()` function with the given body.
    pub fn function(name: impl Into<String>, body: Vec<Statement>) -> Self {
        ExternalDeclaration::Function {
            prototype: Prototype::new(FullType::new("void"), name),
            body,
        }
    }

    pub fn variable(ty: FullType, names: &[&str]) -> Self {
        ExternalDeclaration::Variable {
            ty,
            members: names.iter().map(|name| Member::new(*name)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prototype {
    pub return_type: FullType,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Prototype {
    pub fn new(return_type: FullType, name: impl Into<String>) -> Self {
        Self {
            return_type,
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, ty: FullType, name: impl Into<String>) -> Self {
        self.parameters.push(Parameter {
            ty,
            name: Some(name.into()),
            array: None,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub ty: FullType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub array: Option<ArraySize>,
}

/// Qualifiers plus type specifier, e.g. `flat out vec3`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullType {
    #[serde(default)]
    pub qualifiers: Vec<Qualifier>,
    pub specifier: String,
}

impl FullType {
    pub fn new(specifier: impl Into<String>) -> Self {
        Self {
            qualifiers: Vec::new(),
            specifier: specifier.into(),
        }
    }

    pub fn with_storage(mut self, storage: StorageQualifier) -> Self {
        self.qualifiers.push(Qualifier::Storage(storage));
        self
    }

    pub fn with_qualifier(mut self, text: impl Into<String>) -> Self {
        self.qualifiers.push(Qualifier::Other(text.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    Storage(StorageQualifier),
    /// Layout, interpolation, precision or invariance text.
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(default)]
    pub array: Option<ArraySize>,
    #[serde(default)]
    pub initializer: Option<Expression>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array: None,
            initializer: None,
        }
    }

    pub fn with_initializer(mut self, value: Expression) -> Self {
        self.initializer = Some(value);
        self
    }

    pub fn with_array(mut self, size: Option<Expression>) -> Self {
        self.array = Some(ArraySize { size });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArraySize {
    #[serde(default)]
    pub size: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    Compound {
        statements: Vec<Statement>,
    },
    Declaration {
        ty: FullType,
        members: Vec<Member>,
    },
    Expression {
        #[serde(default)]
        expression: Option<Expression>,
    },
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        #[serde(default)]
        else_branch: Option<Box<Statement>>,
    },
    For {
        #[serde(default)]
        init: Option<Box<Statement>>,
        #[serde(default)]
        condition: Option<Expression>,
        #[serde(default)]
        step: Option<Expression>,
        body: Box<Statement>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    Return {
        #[serde(default)]
        value: Option<Expression>,
    },
    Break,
    Continue,
    Discard,
}

impl Statement {
    pub fn expression(expression: Expression) -> Self {
        Statement::Expression {
            expression: Some(expression),
        }
    }

    /// `name = value;`
    pub fn assign(name: impl Into<String>, value: Expression) -> Self {
        Statement::expression(Expression::Assign {
            op: AssignOp::Assign,
            target: Box::new(Expression::reference(name)),
            value: Box::new(value),
        })
    }

    /// A local declaration with a single initialized member.
    pub fn declare(ty: FullType, name: impl Into<String>, value: Expression) -> Self {
        Statement::Declaration {
            ty,
            members: vec![Member::new(name).with_initializer(value)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    Reference {
        name: String,
    },
    Literal {
        value: Literal,
    },
    /// Function call or constructor; `callee` is a function or type name.
    Call {
        callee: String,
        #[serde(default)]
        arguments: Vec<Expression>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expression>,
        value: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Field {
        base: Box<Expression>,
        field: String,
    },
    Index {
        base: Box<Expression>,
        index: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        then_value: Box<Expression>,
        else_value: Box<Expression>,
    },
}

impl Expression {
    pub fn reference(name: impl Into<String>) -> Self {
        Expression::Reference { name: name.into() }
    }

    pub fn literal(value: Literal) -> Self {
        Expression::Literal { value }
    }

    pub fn float(value: f64) -> Self {
        Expression::literal(Literal::Float(value))
    }

    pub fn call(callee: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::Call {
            callee: callee.into(),
            arguments,
        }
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn field(base: Expression, field: impl Into<String>) -> Self {
        Expression::Field {
            base: Box::new(base),
            field: field.into(),
        }
    }
}

impl Document {
    /// Build a document from the JSON form of an interchange tree.
    pub fn from_json(text: &str) -> ShadelinkResult<Document> {
        let unit: TranslationUnit = serde_json::from_str(text)?;
        Document::from_syntax(&unit)
    }

    /// Build a document from an interchange tree.
    pub fn from_syntax(unit: &TranslationUnit) -> ShadelinkResult<Document> {
        let mut doc = Document::new();
        let mut lowering = Lowering { doc: &mut doc };
        let mut declarations = Vec::with_capacity(unit.declarations.len());
        for declaration in &unit.declarations {
            declarations.push(lowering.external(declaration)?);
        }
        for declaration in declarations {
            doc.push_declaration(declaration)?;
        }
        Ok(doc)
    }

    /// Lower one top-level declaration into an unattached node.
    pub fn lower_declaration(&mut self, declaration: &ExternalDeclaration) -> ShadelinkResult<NodeId> {
        Lowering { doc: self }.external(declaration)
    }

    /// Lower one statement into an unattached node.
    pub fn lower_statement(&mut self, statement: &Statement) -> ShadelinkResult<NodeId> {
        Lowering { doc: self }.statement(statement, "statement fragment")
    }

    pub fn lower_expression(&mut self, expression: &Expression) -> ShadelinkResult<NodeId> {
        Lowering { doc: self }.expression(expression, "expression fragment")
    }
}

struct Lowering<'a> {
    doc: &'a mut Document,
}

impl Lowering<'_> {
    fn external(&mut self, declaration: &ExternalDeclaration) -> ShadelinkResult<NodeId> {
        match declaration {
            ExternalDeclaration::Directive { text } => {
                let text = text.trim();
                if !text.starts_with('#') && !text.ends_with(';') {
                    return Err(ShadelinkError::syntax(
                        format!("directive '{}' is neither a preprocessor line nor a declaration", text),
                        "directive",
                    ));
                }
                Ok(self.doc.alloc(NodeKind::Directive(text.to_string())))
            }
            ExternalDeclaration::Empty => Ok(self.doc.alloc(NodeKind::EmptyDeclaration)),
            ExternalDeclaration::Function { prototype, body } => {
                let context = format!("function '{}'", prototype.name);
                let prototype = self.prototype(prototype)?;
                let statements = self.statements(body, &context)?;
                let body = self.doc.alloc(NodeKind::CompoundStatement { statements });
                Ok(self.doc.alloc(NodeKind::FunctionDefinition { prototype, body }))
            }
            ExternalDeclaration::Prototype { prototype } => self.prototype(prototype),
            ExternalDeclaration::Variable { ty, members } => {
                self.variable(ty, members, "global declaration")
            }
        }
    }

    fn prototype(&mut self, prototype: &Prototype) -> ShadelinkResult<NodeId> {
        let context = format!("function '{}'", prototype.name);
        if prototype.name.is_empty() {
            return Err(ShadelinkError::syntax("function without a name", "prototype"));
        }
        let return_type = self.full_type(&prototype.return_type, &context)?;
        let name = self.doc.identifier(prototype.name.as_str());
        let mut parameters = Vec::with_capacity(prototype.parameters.len());
        for parameter in &prototype.parameters {
            let ty = self.full_type(&parameter.ty, &context)?;
            let name = parameter
                .name
                .as_ref()
                .map(|name| self.doc.identifier(name.as_str()));
            let array = match &parameter.array {
                Some(array) => Some(self.array(array, &context)?),
                None => None,
            };
            parameters.push(self.doc.alloc(NodeKind::FunctionParameter { ty, name, array }));
        }
        Ok(self.doc.alloc(NodeKind::FunctionPrototype {
            return_type,
            name,
            parameters,
        }))
    }

    fn variable(
        &mut self,
        ty: &FullType,
        members: &[Member],
        context: &str,
    ) -> ShadelinkResult<NodeId> {
        if members.is_empty() {
            return Err(ShadelinkError::syntax(
                format!("declaration of type '{}' has no members", ty.specifier),
                context,
            ));
        }
        let ty = self.full_type(ty, context)?;
        let mut lowered = Vec::with_capacity(members.len());
        for member in members {
            let name = self.doc.identifier(member.name.as_str());
            let array = match &member.array {
                Some(array) => Some(self.array(array, context)?),
                None => None,
            };
            let initializer = match &member.initializer {
                Some(value) => Some(self.expression(value, context)?),
                None => None,
            };
            lowered.push(self.doc.alloc(NodeKind::DeclarationMember {
                name,
                array,
                initializer,
            }));
        }
        Ok(self.doc.alloc(NodeKind::VariableDeclaration {
            ty,
            members: lowered,
        }))
    }

    fn full_type(&mut self, ty: &FullType, context: &str) -> ShadelinkResult<NodeId> {
        if ty.specifier.is_empty() {
            return Err(ShadelinkError::syntax("empty type specifier", context));
        }
        let directions = ty
            .qualifiers
            .iter()
            .filter(|q| {
                matches!(
                    q,
                    Qualifier::Storage(
                        StorageQualifier::In
                            | StorageQualifier::Out
                            | StorageQualifier::InOut
                            | StorageQualifier::Attribute
                            | StorageQualifier::Varying
                    )
                )
            })
            .count();
        if directions > 1 {
            return Err(ShadelinkError::syntax(
                format!("more than one storage direction on type '{}'", ty.specifier),
                context,
            ));
        }

        let qualifier = if ty.qualifiers.is_empty() {
            None
        } else {
            let parts = ty
                .qualifiers
                .iter()
                .map(|q| match q {
                    Qualifier::Storage(storage) => NodeKind::StorageQualifier(*storage),
                    Qualifier::Other(text) => NodeKind::QualifierText(text.clone()),
                })
                .map(|kind| self.doc.alloc(kind))
                .collect();
            Some(self.doc.alloc(NodeKind::TypeQualifier { parts }))
        };
        let specifier = self.doc.type_specifier(TypeName::parse(&ty.specifier));
        Ok(self.doc.alloc(NodeKind::FullySpecifiedType {
            qualifier,
            specifier,
        }))
    }

    fn array(&mut self, array: &ArraySize, context: &str) -> ShadelinkResult<NodeId> {
        let size = match &array.size {
            Some(size) => Some(self.expression(size, context)?),
            None => None,
        };
        Ok(self.doc.alloc(NodeKind::ArraySpecifier { size }))
    }

    fn statements(&mut self, statements: &[Statement], context: &str) -> ShadelinkResult<Vec<NodeId>> {
        statements
            .iter()
            .map(|statement| self.statement(statement, context))
            .collect()
    }

    fn statement(&mut self, statement: &Statement, context: &str) -> ShadelinkResult<NodeId> {
        let kind = match statement {
            Statement::Compound { statements } => NodeKind::CompoundStatement {
                statements: self.statements(statements, context)?,
            },
            Statement::Declaration { ty, members } => NodeKind::DeclarationStatement {
                declaration: self.variable(ty, members, context)?,
            },
            Statement::Expression { expression } => NodeKind::ExpressionStatement {
                expression: match expression {
                    Some(expression) => Some(self.expression(expression, context)?),
                    None => None,
                },
            },
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.expression(condition, context)?;
                let then_branch = self.statement(then_branch, context)?;
                let else_branch = match else_branch {
                    Some(branch) => Some(self.statement(branch, context)?),
                    None => None,
                };
                NodeKind::IfStatement {
                    condition,
                    then_branch,
                    else_branch,
                }
            }
            Statement::For {
                init,
                condition,
                step,
                body,
            } => {
                let init = match init {
                    Some(init) => Some(self.statement(init, context)?),
                    None => None,
                };
                let condition = match condition {
                    Some(condition) => Some(self.expression(condition, context)?),
                    None => None,
                };
                let step = match step {
                    Some(step) => Some(self.expression(step, context)?),
                    None => None,
                };
                let body = self.statement(body, context)?;
                NodeKind::ForStatement {
                    init,
                    condition,
                    step,
                    body,
                }
            }
            Statement::While { condition, body } => {
                let condition = self.expression(condition, context)?;
                let body = self.statement(body, context)?;
                NodeKind::WhileStatement { condition, body }
            }
            Statement::Return { value } => NodeKind::ReturnStatement {
                value: match value {
                    Some(value) => Some(self.expression(value, context)?),
                    None => None,
                },
            },
            Statement::Break => NodeKind::JumpStatement(JumpKind::Break),
            Statement::Continue => NodeKind::JumpStatement(JumpKind::Continue),
            Statement::Discard => NodeKind::JumpStatement(JumpKind::Discard),
        };
        Ok(self.doc.alloc(kind))
    }

    fn expression(&mut self, expression: &Expression, context: &str) -> ShadelinkResult<NodeId> {
        let kind = match expression {
            Expression::Reference { name } => {
                if name.is_empty() {
                    return Err(ShadelinkError::syntax("reference without a name", context));
                }
                NodeKind::ReferenceExpression {
                    name: self.doc.identifier(name.as_str()),
                }
            }
            Expression::Literal { value } => NodeKind::LiteralExpression(*value),
            Expression::Call { callee, arguments } => {
                let callee = match TypeName::parse(callee) {
                    TypeName::Builtin(ty) => self.doc.type_specifier(TypeName::Builtin(ty)),
                    _ => self.doc.identifier(callee.as_str()),
                };
                let mut lowered = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    lowered.push(self.expression(argument, context)?);
                }
                NodeKind::FunctionCallExpression {
                    callee,
                    arguments: lowered,
                }
            }
            Expression::Assign { op, target, value } => {
                let target = self.expression(target, context)?;
                let value = self.expression(value, context)?;
                NodeKind::AssignmentExpression {
                    op: *op,
                    target,
                    value,
                }
            }
            Expression::Binary { op, left, right } => {
                let left = self.expression(left, context)?;
                let right = self.expression(right, context)?;
                NodeKind::BinaryExpression { op: *op, left, right }
            }
            Expression::Unary { op, operand } => NodeKind::UnaryExpression {
                op: *op,
                operand: self.expression(operand, context)?,
            },
            Expression::Field { base, field } => NodeKind::MemberAccessExpression {
                base: self.expression(base, context)?,
                field: field.clone(),
            },
            Expression::Index { base, index } => {
                let base = self.expression(base, context)?;
                let index = self.expression(index, context)?;
                NodeKind::IndexExpression { base, index }
            }
            Expression::Conditional {
                condition,
                then_value,
                else_value,
            } => {
                let condition = self.expression(condition, context)?;
                let then_value = self.expression(then_value, context)?;
                let else_value = self.expression(else_value, context)?;
                NodeKind::ConditionalExpression {
                    condition,
                    then_value,
                    else_value,
                }
            }
        };
        Ok(self.doc.alloc(kind))
    }
}
