//! Node kinds of the arena syntax tree.
//!
//! Every node lives in a [`Document`](crate::Document) arena and refers to its
//! children by [`NodeId`]. The set of kinds is closed; structural queries
//! (matching, traversal, cloning) are ordinary `match`es over [`NodeKind`].

use serde::{Deserialize, Serialize};
use shadelink_core::{Literal, NumericType};

/// Stable handle of a node inside one document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Storage qualifier keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageQualifier {
    Const,
    In,
    Out,
    InOut,
    Attribute,
    Uniform,
    Varying,
    Buffer,
    Shared,
}

impl StorageQualifier {
    pub fn keyword(self) -> &'static str {
        match self {
            StorageQualifier::Const => "const",
            StorageQualifier::In => "in",
            StorageQualifier::Out => "out",
            StorageQualifier::InOut => "inout",
            StorageQualifier::Attribute => "attribute",
            StorageQualifier::Uniform => "uniform",
            StorageQualifier::Varying => "varying",
            StorageQualifier::Buffer => "buffer",
            StorageQualifier::Shared => "shared",
        }
    }
}

/// What a type specifier names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeName {
    Void,
    Builtin(NumericType),
    /// Samplers, images, structs and anything else carried as text.
    Named(String),
}

impl TypeName {
    /// Classify a type name as written in source.
    pub fn parse(text: &str) -> Self {
        if text == "void" {
            TypeName::Void
        } else if let Some(ty) = NumericType::from_name(text) {
            TypeName::Builtin(ty)
        } else {
            TypeName::Named(text.to_string())
        }
    }

    pub fn numeric(&self) -> Option<NumericType> {
        match self {
            TypeName::Builtin(ty) => Some(*ty),
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeName::Void => write!(f, "void"),
            TypeName::Builtin(ty) => write!(f, "{}", ty),
            TypeName::Named(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Xor,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Xor => "^^",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitXor,
    BitOr,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitXor => "^=",
            AssignOp::BitOr => "|=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpKind {
    Break,
    Continue,
    Discard,
}

/// A node of the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    TranslationUnit {
        declarations: Vec<NodeId>,
    },
    /// A preprocessor line (`#version 150`), carried verbatim.
    Directive(String),
    /// A stray `;` at the top level.
    EmptyDeclaration,
    FunctionDefinition {
        prototype: NodeId,
        body: NodeId,
    },
    FunctionPrototype {
        return_type: NodeId,
        name: NodeId,
        parameters: Vec<NodeId>,
    },
    FunctionParameter {
        ty: NodeId,
        name: Option<NodeId>,
        array: Option<NodeId>,
    },
    VariableDeclaration {
        ty: NodeId,
        members: Vec<NodeId>,
    },
    DeclarationMember {
        name: NodeId,
        array: Option<NodeId>,
        initializer: Option<NodeId>,
    },
    ArraySpecifier {
        size: Option<NodeId>,
    },
    FullySpecifiedType {
        qualifier: Option<NodeId>,
        specifier: NodeId,
    },
    TypeQualifier {
        parts: Vec<NodeId>,
    },
    StorageQualifier(StorageQualifier),
    /// Layout, interpolation, precision and invariance qualifiers.
    QualifierText(String),
    TypeSpecifier(TypeName),
    Identifier(String),

    CompoundStatement {
        statements: Vec<NodeId>,
    },
    DeclarationStatement {
        declaration: NodeId,
    },
    ExpressionStatement {
        expression: Option<NodeId>,
    },
    IfStatement {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    ForStatement {
        init: Option<NodeId>,
        condition: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId,
    },
    WhileStatement {
        condition: NodeId,
        body: NodeId,
    },
    ReturnStatement {
        value: Option<NodeId>,
    },
    JumpStatement(JumpKind),

    ReferenceExpression {
        name: NodeId,
    },
    LiteralExpression(Literal),
    /// Call of a function (identifier callee) or constructor (type specifier callee).
    FunctionCallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    AssignmentExpression {
        op: AssignOp,
        target: NodeId,
        value: NodeId,
    },
    BinaryExpression {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    UnaryExpression {
        op: UnaryOp,
        operand: NodeId,
    },
    /// Field selection or swizzle; the field is not an identifier occurrence.
    MemberAccessExpression {
        base: NodeId,
        field: String,
    },
    IndexExpression {
        base: NodeId,
        index: NodeId,
    },
    ConditionalExpression {
        condition: NodeId,
        then_value: NodeId,
        else_value: NodeId,
    },
}

/// The kind of a node without its payload.
///
/// `Expression` is abstract: no node has it as its own class, but every
/// expression kind satisfies it in [`NodeClass::accepts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeClass {
    TranslationUnit,
    Directive,
    EmptyDeclaration,
    FunctionDefinition,
    FunctionPrototype,
    FunctionParameter,
    VariableDeclaration,
    DeclarationMember,
    ArraySpecifier,
    FullySpecifiedType,
    TypeQualifier,
    StorageQualifier,
    QualifierText,
    TypeSpecifier,
    Identifier,
    CompoundStatement,
    DeclarationStatement,
    ExpressionStatement,
    IfStatement,
    ForStatement,
    WhileStatement,
    ReturnStatement,
    JumpStatement,
    ReferenceExpression,
    LiteralExpression,
    FunctionCallExpression,
    AssignmentExpression,
    BinaryExpression,
    UnaryExpression,
    MemberAccessExpression,
    IndexExpression,
    ConditionalExpression,
    Expression,
}

impl NodeClass {
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeClass::ReferenceExpression
                | NodeClass::LiteralExpression
                | NodeClass::FunctionCallExpression
                | NodeClass::AssignmentExpression
                | NodeClass::BinaryExpression
                | NodeClass::UnaryExpression
                | NodeClass::MemberAccessExpression
                | NodeClass::IndexExpression
                | NodeClass::ConditionalExpression
        )
    }

    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeClass::CompoundStatement
                | NodeClass::DeclarationStatement
                | NodeClass::ExpressionStatement
                | NodeClass::IfStatement
                | NodeClass::ForStatement
                | NodeClass::WhileStatement
                | NodeClass::ReturnStatement
                | NodeClass::JumpStatement
        )
    }

    /// Whether a node of class `actual` may stand where `self` is expected.
    pub fn accepts(self, actual: NodeClass) -> bool {
        self == actual || (self == NodeClass::Expression && actual.is_expression())
    }
}

/// A child position of a node: a single optional child or a list.
#[derive(Debug, Clone, Copy)]
pub enum Slot<'a> {
    One(Option<NodeId>),
    Many(&'a [NodeId]),
}

/// Outcome of [`NodeKind::replace_child`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildReplace {
    Done,
    /// The child sits in a mandatory position and cannot be removed.
    Required,
    NotFound,
}

impl NodeKind {
    pub fn class(&self) -> NodeClass {
        match self {
            NodeKind::TranslationUnit { .. } => NodeClass::TranslationUnit,
            NodeKind::Directive(_) => NodeClass::Directive,
            NodeKind::EmptyDeclaration => NodeClass::EmptyDeclaration,
            NodeKind::FunctionDefinition { .. } => NodeClass::FunctionDefinition,
            NodeKind::FunctionPrototype { .. } => NodeClass::FunctionPrototype,
            NodeKind::FunctionParameter { .. } => NodeClass::FunctionParameter,
            NodeKind::VariableDeclaration { .. } => NodeClass::VariableDeclaration,
            NodeKind::DeclarationMember { .. } => NodeClass::DeclarationMember,
            NodeKind::ArraySpecifier { .. } => NodeClass::ArraySpecifier,
            NodeKind::FullySpecifiedType { .. } => NodeClass::FullySpecifiedType,
            NodeKind::TypeQualifier { .. } => NodeClass::TypeQualifier,
            NodeKind::StorageQualifier(_) => NodeClass::StorageQualifier,
            NodeKind::QualifierText(_) => NodeClass::QualifierText,
            NodeKind::TypeSpecifier(_) => NodeClass::TypeSpecifier,
            NodeKind::Identifier(_) => NodeClass::Identifier,
            NodeKind::CompoundStatement { .. } => NodeClass::CompoundStatement,
            NodeKind::DeclarationStatement { .. } => NodeClass::DeclarationStatement,
            NodeKind::ExpressionStatement { .. } => NodeClass::ExpressionStatement,
            NodeKind::IfStatement { .. } => NodeClass::IfStatement,
            NodeKind::ForStatement { .. } => NodeClass::ForStatement,
            NodeKind::WhileStatement { .. } => NodeClass::WhileStatement,
            NodeKind::ReturnStatement { .. } => NodeClass::ReturnStatement,
            NodeKind::JumpStatement(_) => NodeClass::JumpStatement,
            NodeKind::ReferenceExpression { .. } => NodeClass::ReferenceExpression,
            NodeKind::LiteralExpression(_) => NodeClass::LiteralExpression,
            NodeKind::FunctionCallExpression { .. } => NodeClass::FunctionCallExpression,
            NodeKind::AssignmentExpression { .. } => NodeClass::AssignmentExpression,
            NodeKind::BinaryExpression { .. } => NodeClass::BinaryExpression,
            NodeKind::UnaryExpression { .. } => NodeClass::UnaryExpression,
            NodeKind::MemberAccessExpression { .. } => NodeClass::MemberAccessExpression,
            NodeKind::IndexExpression { .. } => NodeClass::IndexExpression,
            NodeKind::ConditionalExpression { .. } => NodeClass::ConditionalExpression,
        }
    }

    /// Child positions in source order.
    pub fn slots(&self) -> Vec<Slot<'_>> {
        use Slot::{Many, One};
        match self {
            NodeKind::TranslationUnit { declarations } => vec![Many(declarations)],
            NodeKind::FunctionDefinition { prototype, body } => {
                vec![One(Some(*prototype)), One(Some(*body))]
            }
            NodeKind::FunctionPrototype {
                return_type,
                name,
                parameters,
            } => vec![One(Some(*return_type)), One(Some(*name)), Many(parameters)],
            NodeKind::FunctionParameter { ty, name, array } => {
                vec![One(Some(*ty)), One(*name), One(*array)]
            }
            NodeKind::VariableDeclaration { ty, members } => vec![One(Some(*ty)), Many(members)],
            NodeKind::DeclarationMember {
                name,
                array,
                initializer,
            } => vec![One(Some(*name)), One(*array), One(*initializer)],
            NodeKind::ArraySpecifier { size } => vec![One(*size)],
            NodeKind::FullySpecifiedType {
                qualifier,
                specifier,
            } => vec![One(*qualifier), One(Some(*specifier))],
            NodeKind::TypeQualifier { parts } => vec![Many(parts)],
            NodeKind::CompoundStatement { statements } => vec![Many(statements)],
            NodeKind::DeclarationStatement { declaration } => vec![One(Some(*declaration))],
            NodeKind::ExpressionStatement { expression } => vec![One(*expression)],
            NodeKind::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => vec![One(Some(*condition)), One(Some(*then_branch)), One(*else_branch)],
            NodeKind::ForStatement {
                init,
                condition,
                step,
                body,
            } => vec![One(*init), One(*condition), One(*step), One(Some(*body))],
            NodeKind::WhileStatement { condition, body } => {
                vec![One(Some(*condition)), One(Some(*body))]
            }
            NodeKind::ReturnStatement { value } => vec![One(*value)],
            NodeKind::ReferenceExpression { name } => vec![One(Some(*name))],
            NodeKind::FunctionCallExpression { callee, arguments } => {
                vec![One(Some(*callee)), Many(arguments)]
            }
            NodeKind::AssignmentExpression { target, value, .. } => {
                vec![One(Some(*target)), One(Some(*value))]
            }
            NodeKind::BinaryExpression { left, right, .. } => {
                vec![One(Some(*left)), One(Some(*right))]
            }
            NodeKind::UnaryExpression { operand, .. } => vec![One(Some(*operand))],
            NodeKind::MemberAccessExpression { base, .. } => vec![One(Some(*base))],
            NodeKind::IndexExpression { base, index } => vec![One(Some(*base)), One(Some(*index))],
            NodeKind::ConditionalExpression {
                condition,
                then_value,
                else_value,
            } => vec![
                One(Some(*condition)),
                One(Some(*then_value)),
                One(Some(*else_value)),
            ],
            NodeKind::Directive(_)
            | NodeKind::EmptyDeclaration
            | NodeKind::StorageQualifier(_)
            | NodeKind::QualifierText(_)
            | NodeKind::TypeSpecifier(_)
            | NodeKind::Identifier(_)
            | NodeKind::JumpStatement(_)
            | NodeKind::LiteralExpression(_) => Vec::new(),
        }
    }

    /// All direct children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut children = Vec::new();
        for slot in self.slots() {
            match slot {
                Slot::One(Some(id)) => children.push(id),
                Slot::One(None) => {}
                Slot::Many(ids) => children.extend_from_slice(ids),
            }
        }
        children
    }

    /// Whether two nodes agree on variant and payload, ignoring children.
    pub fn same_leaf(&self, other: &NodeKind) -> bool {
        use NodeKind::*;
        match (self, other) {
            (Directive(a), Directive(b))
            | (QualifierText(a), QualifierText(b))
            | (Identifier(a), Identifier(b)) => a == b,
            (NodeKind::StorageQualifier(a), NodeKind::StorageQualifier(b)) => a == b,
            (TypeSpecifier(a), TypeSpecifier(b)) => a == b,
            (LiteralExpression(a), LiteralExpression(b)) => a == b,
            (JumpStatement(a), JumpStatement(b)) => a == b,
            (AssignmentExpression { op: a, .. }, AssignmentExpression { op: b, .. }) => a == b,
            (BinaryExpression { op: a, .. }, BinaryExpression { op: b, .. }) => a == b,
            (UnaryExpression { op: a, .. }, UnaryExpression { op: b, .. }) => a == b,
            (MemberAccessExpression { field: a, .. }, MemberAccessExpression { field: b, .. }) => {
                a == b
            }
            _ => self.class() == other.class(),
        }
    }

    /// A copy of this node with every child id passed through `map`.
    pub(crate) fn map_children(&self, mut map: impl FnMut(NodeId) -> NodeId) -> NodeKind {
        match self {
            NodeKind::TranslationUnit { declarations } => NodeKind::TranslationUnit {
                declarations: declarations.iter().map(|id| map(*id)).collect(),
            },
            NodeKind::FunctionDefinition { prototype, body } => {
                let prototype = map(*prototype);
                NodeKind::FunctionDefinition {
                    prototype,
                    body: map(*body),
                }
            }
            NodeKind::FunctionPrototype {
                return_type,
                name,
                parameters,
            } => {
                let return_type = map(*return_type);
                let name = map(*name);
                NodeKind::FunctionPrototype {
                    return_type,
                    name,
                    parameters: parameters.iter().map(|id| map(*id)).collect(),
                }
            }
            NodeKind::FunctionParameter { ty, name, array } => {
                let ty = map(*ty);
                NodeKind::FunctionParameter {
                    ty,
                    name: (*name).map(&mut map),
                    array: (*array).map(&mut map),
                }
            }
            NodeKind::VariableDeclaration { ty, members } => {
                let ty = map(*ty);
                NodeKind::VariableDeclaration {
                    ty,
                    members: members.iter().map(|id| map(*id)).collect(),
                }
            }
            NodeKind::DeclarationMember {
                name,
                array,
                initializer,
            } => {
                let name = map(*name);
                NodeKind::DeclarationMember {
                    name,
                    array: (*array).map(&mut map),
                    initializer: (*initializer).map(&mut map),
                }
            }
            NodeKind::ArraySpecifier { size } => NodeKind::ArraySpecifier {
                size: (*size).map(&mut map),
            },
            NodeKind::FullySpecifiedType {
                qualifier,
                specifier,
            } => {
                let qualifier = (*qualifier).map(&mut map);
                NodeKind::FullySpecifiedType {
                    qualifier,
                    specifier: map(*specifier),
                }
            }
            NodeKind::TypeQualifier { parts } => NodeKind::TypeQualifier {
                parts: parts.iter().map(|id| map(*id)).collect(),
            },
            NodeKind::CompoundStatement { statements } => NodeKind::CompoundStatement {
                statements: statements.iter().map(|id| map(*id)).collect(),
            },
            NodeKind::DeclarationStatement { declaration } => NodeKind::DeclarationStatement {
                declaration: map(*declaration),
            },
            NodeKind::ExpressionStatement { expression } => NodeKind::ExpressionStatement {
                expression: (*expression).map(&mut map),
            },
            NodeKind::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = map(*condition);
                let then_branch = map(*then_branch);
                NodeKind::IfStatement {
                    condition,
                    then_branch,
                    else_branch: (*else_branch).map(&mut map),
                }
            }
            NodeKind::ForStatement {
                init,
                condition,
                step,
                body,
            } => {
                let init = (*init).map(&mut map);
                let condition = (*condition).map(&mut map);
                let step = (*step).map(&mut map);
                NodeKind::ForStatement {
                    init,
                    condition,
                    step,
                    body: map(*body),
                }
            }
            NodeKind::WhileStatement { condition, body } => {
                let condition = map(*condition);
                NodeKind::WhileStatement {
                    condition,
                    body: map(*body),
                }
            }
            NodeKind::ReturnStatement { value } => NodeKind::ReturnStatement {
                value: (*value).map(&mut map),
            },
            NodeKind::ReferenceExpression { name } => NodeKind::ReferenceExpression {
                name: map(*name),
            },
            NodeKind::FunctionCallExpression { callee, arguments } => {
                let callee = map(*callee);
                NodeKind::FunctionCallExpression {
                    callee,
                    arguments: arguments.iter().map(|id| map(*id)).collect(),
                }
            }
            NodeKind::AssignmentExpression { op, target, value } => {
                let target = map(*target);
                NodeKind::AssignmentExpression {
                    op: *op,
                    target,
                    value: map(*value),
                }
            }
            NodeKind::BinaryExpression { op, left, right } => {
                let left = map(*left);
                NodeKind::BinaryExpression {
                    op: *op,
                    left,
                    right: map(*right),
                }
            }
            NodeKind::UnaryExpression { op, operand } => NodeKind::UnaryExpression {
                op: *op,
                operand: map(*operand),
            },
            NodeKind::MemberAccessExpression { base, field } => NodeKind::MemberAccessExpression {
                base: map(*base),
                field: field.clone(),
            },
            NodeKind::IndexExpression { base, index } => {
                let base = map(*base);
                NodeKind::IndexExpression {
                    base,
                    index: map(*index),
                }
            }
            NodeKind::ConditionalExpression {
                condition,
                then_value,
                else_value,
            } => {
                let condition = map(*condition);
                let then_value = map(*then_value);
                NodeKind::ConditionalExpression {
                    condition,
                    then_value,
                    else_value: map(*else_value),
                }
            }
            leaf => leaf.clone(),
        }
    }

    /// Put `new` where `old` is, or drop `old` if `new` is `None`.
    pub(crate) fn replace_child(&mut self, old: NodeId, new: Option<NodeId>) -> ChildReplace {
        fn one(slot: &mut Option<NodeId>, old: NodeId, new: Option<NodeId>) -> ChildReplace {
            if *slot == Some(old) {
                *slot = new;
                ChildReplace::Done
            } else {
                ChildReplace::NotFound
            }
        }

        fn required(slot: &mut NodeId, old: NodeId, new: Option<NodeId>) -> ChildReplace {
            if *slot != old {
                return ChildReplace::NotFound;
            }
            match new {
                Some(new) => {
                    *slot = new;
                    ChildReplace::Done
                }
                None => ChildReplace::Required,
            }
        }

        fn many(list: &mut Vec<NodeId>, old: NodeId, new: Option<NodeId>) -> ChildReplace {
            match list.iter().position(|id| *id == old) {
                Some(position) => {
                    match new {
                        Some(new) => list[position] = new,
                        None => {
                            list.remove(position);
                        }
                    }
                    ChildReplace::Done
                }
                None => ChildReplace::NotFound,
            }
        }

        fn first(results: &[ChildReplace]) -> ChildReplace {
            results
                .iter()
                .copied()
                .find(|r| *r != ChildReplace::NotFound)
                .unwrap_or(ChildReplace::NotFound)
        }

        match self {
            NodeKind::TranslationUnit { declarations } => many(declarations, old, new),
            NodeKind::FunctionDefinition { prototype, body } => first(&[
                required(prototype, old, new),
                required(body, old, new),
            ]),
            NodeKind::FunctionPrototype {
                return_type,
                name,
                parameters,
            } => first(&[
                required(return_type, old, new),
                required(name, old, new),
                many(parameters, old, new),
            ]),
            NodeKind::FunctionParameter { ty, name, array } => first(&[
                required(ty, old, new),
                one(name, old, new),
                one(array, old, new),
            ]),
            NodeKind::VariableDeclaration { ty, members } => {
                first(&[required(ty, old, new), many(members, old, new)])
            }
            NodeKind::DeclarationMember {
                name,
                array,
                initializer,
            } => first(&[
                required(name, old, new),
                one(array, old, new),
                one(initializer, old, new),
            ]),
            NodeKind::ArraySpecifier { size } => one(size, old, new),
            NodeKind::FullySpecifiedType {
                qualifier,
                specifier,
            } => first(&[one(qualifier, old, new), required(specifier, old, new)]),
            NodeKind::TypeQualifier { parts } => many(parts, old, new),
            NodeKind::CompoundStatement { statements } => many(statements, old, new),
            NodeKind::DeclarationStatement { declaration } => required(declaration, old, new),
            NodeKind::ExpressionStatement { expression } => one(expression, old, new),
            NodeKind::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => first(&[
                required(condition, old, new),
                required(then_branch, old, new),
                one(else_branch, old, new),
            ]),
            NodeKind::ForStatement {
                init,
                condition,
                step,
                body,
            } => first(&[
                one(init, old, new),
                one(condition, old, new),
                one(step, old, new),
                required(body, old, new),
            ]),
            NodeKind::WhileStatement { condition, body } => {
                first(&[required(condition, old, new), required(body, old, new)])
            }
            NodeKind::ReturnStatement { value } => one(value, old, new),
            NodeKind::ReferenceExpression { name } => required(name, old, new),
            NodeKind::FunctionCallExpression { callee, arguments } => {
                first(&[required(callee, old, new), many(arguments, old, new)])
            }
            NodeKind::AssignmentExpression { target, value, .. } => {
                first(&[required(target, old, new), required(value, old, new)])
            }
            NodeKind::BinaryExpression { left, right, .. } => {
                first(&[required(left, old, new), required(right, old, new)])
            }
            NodeKind::UnaryExpression { operand, .. } => required(operand, old, new),
            NodeKind::MemberAccessExpression { base, .. } => required(base, old, new),
            NodeKind::IndexExpression { base, index } => {
                first(&[required(base, old, new), required(index, old, new)])
            }
            NodeKind::ConditionalExpression {
                condition,
                then_value,
                else_value,
            } => first(&[
                required(condition, old, new),
                required(then_value, old, new),
                required(else_value, old, new),
            ]),
            _ => ChildReplace::NotFound,
        }
    }

    /// The list a new child is appended to, for nodes that have one.
    pub(crate) fn child_list_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            NodeKind::TranslationUnit { declarations } => Some(declarations),
            NodeKind::FunctionPrototype { parameters, .. } => Some(parameters),
            NodeKind::VariableDeclaration { members, .. } => Some(members),
            NodeKind::TypeQualifier { parts } => Some(parts),
            NodeKind::CompoundStatement { statements } => Some(statements),
            NodeKind::FunctionCallExpression { arguments, .. } => Some(arguments),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expression_class_accepts_concrete_expressions() {
        assert!(NodeClass::Expression.accepts(NodeClass::LiteralExpression));
        assert!(NodeClass::Expression.accepts(NodeClass::FunctionCallExpression));
        assert!(!NodeClass::Expression.accepts(NodeClass::Identifier));
        assert!(!NodeClass::TypeSpecifier.accepts(NodeClass::Identifier));
    }

    #[test]
    fn test_same_leaf_compares_payload() {
        let a = NodeKind::Identifier("a".into());
        let b = NodeKind::Identifier("b".into());
        assert!(a.same_leaf(&a.clone()));
        assert!(!a.same_leaf(&b));
        let decl_a = NodeKind::VariableDeclaration {
            ty: NodeId(0),
            members: vec![NodeId(1)],
        };
        let decl_b = NodeKind::VariableDeclaration {
            ty: NodeId(7),
            members: vec![],
        };
        assert!(decl_a.same_leaf(&decl_b));
        assert!(!decl_a.same_leaf(&a));
    }

    #[test]
    fn test_replace_child_in_required_slot() {
        let mut member = NodeKind::DeclarationMember {
            name: NodeId(1),
            array: None,
            initializer: Some(NodeId(2)),
        };
        assert_eq!(member.replace_child(NodeId(1), None), ChildReplace::Required);
        assert_eq!(member.replace_child(NodeId(2), None), ChildReplace::Done);
        assert_eq!(member.replace_child(NodeId(9), None), ChildReplace::NotFound);
        assert_eq!(member.children(), vec![NodeId(1)]);
    }

    #[test]
    fn test_type_name_parse() {
        assert_eq!(TypeName::parse("void"), TypeName::Void);
        assert!(TypeName::parse("vec3").numeric().is_some());
        assert_eq!(
            TypeName::parse("sampler2D"),
            TypeName::Named("sampler2D".into())
        );
    }
}
