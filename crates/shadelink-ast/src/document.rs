//! One stage's program as a mutable arena tree plus its identifier index.

use shadelink_core::{Literal, ShadelinkError, ShadelinkResult};

use crate::index::IdentifierIndex;
use crate::node::{
    AssignOp, ChildReplace, NodeClass, NodeId, NodeKind, StorageQualifier, TypeName,
};

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
}

/// A parsed shader document.
///
/// Nodes are allocated in an arena and never freed; a detached subtree simply
/// stops being reachable from the root. The identifier index always holds
/// exactly the identifiers reachable from the root, so every structural edit
/// goes through a method here.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    index: IdentifierIndex,
    entry_point: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document whose entry point is `main`.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId::from_index(0),
            index: IdentifierIndex::new(),
            entry_point: "main".to_string(),
        };
        doc.root = doc.push_node(NodeKind::TranslationUnit {
            declarations: Vec::new(),
        });
        doc
    }

    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = name.into();
        self
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) {
        self.entry_point = name.into();
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn class(&self, id: NodeId) -> NodeClass {
        self.kind(id).class()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn index(&self) -> &IdentifierIndex {
        &self.index
    }

    // ---- Allocation -------------------------------------------------------

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node { kind, parent: None });
        id
    }

    /// Allocate an unattached node. Its children must be unattached too.
    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let children = kind.children();
        let id = self.push_node(kind);
        for child in children {
            debug_assert!(
                self.parent(child).is_none() && child != self.root,
                "node {child} already has a parent"
            );
            self.nodes[child.index()].parent = Some(id);
        }
        id
    }

    pub fn identifier(&mut self, name: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Identifier(name.into()))
    }

    pub fn reference(&mut self, name: impl Into<String>) -> NodeId {
        let name = self.identifier(name);
        self.alloc(NodeKind::ReferenceExpression { name })
    }

    pub fn literal(&mut self, value: Literal) -> NodeId {
        self.alloc(NodeKind::LiteralExpression(value))
    }

    pub fn type_specifier(&mut self, ty: TypeName) -> NodeId {
        self.alloc(NodeKind::TypeSpecifier(ty))
    }

    pub fn call(&mut self, callee: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::FunctionCallExpression { callee, arguments })
    }

    /// `name = value;`
    pub fn assignment_statement(&mut self, name: impl Into<String>, value: NodeId) -> NodeId {
        let target = self.reference(name);
        let expression = self.alloc(NodeKind::AssignmentExpression {
            op: AssignOp::Assign,
            target,
            value,
        });
        self.alloc(NodeKind::ExpressionStatement {
            expression: Some(expression),
        })
    }

    // ---- Queries ----------------------------------------------------------

    /// Every reachable identifier occurrence of `name`.
    pub fn lookup(&self, name: &str) -> Vec<NodeId> {
        self.index.get(name).collect()
    }

    pub fn occurrences(&self, name: &str) -> usize {
        self.index.count(name)
    }

    /// Indexed names starting with `prefix`.
    pub fn prefix_query<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.index.prefix_query(prefix)
    }

    /// Nearest proper ancestor of class `class`.
    pub fn ancestor_of(&self, id: NodeId, class: NodeClass) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if class.accepts(self.class(node)) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Pre-order traversal of the subtree rooted at `id`, including `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// Whether any identifier of `name` sits inside a reference expression.
    pub fn is_referenced(&self, name: &str) -> bool {
        self.index
            .get(name)
            .any(|id| self.ancestor_of(id, NodeClass::ReferenceExpression).is_some())
    }

    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Top-level declarations in order.
    pub fn declarations(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::TranslationUnit { declarations } => declarations,
            _ => &[],
        }
    }

    /// Name of a function definition or prototype.
    pub fn function_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::FunctionDefinition { prototype, .. } => self.function_name(*prototype),
            NodeKind::FunctionPrototype { name, .. } => self.identifier_name(*name),
            _ => None,
        }
    }

    pub fn function_parameters(&self, definition: NodeId) -> &[NodeId] {
        match self.kind(definition) {
            NodeKind::FunctionDefinition { prototype, .. } => self.function_parameters(*prototype),
            NodeKind::FunctionPrototype { parameters, .. } => parameters,
            _ => &[],
        }
    }

    /// Top-level function definitions in order.
    pub fn function_definitions(&self) -> Vec<NodeId> {
        self.declarations()
            .iter()
            .copied()
            .filter(|id| self.class(*id) == NodeClass::FunctionDefinition)
            .collect()
    }

    /// The definition of the entry function, if present.
    pub fn entry_function(&self) -> Option<NodeId> {
        self.declarations().iter().copied().find(|id| {
            self.class(*id) == NodeClass::FunctionDefinition
                && self.function_name(*id) == Some(self.entry_point.as_str())
        })
    }

    /// Fully specified type of a declaration or parameter.
    pub fn declared_type(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::VariableDeclaration { ty, .. } | NodeKind::FunctionParameter { ty, .. } => {
                Some(*ty)
            }
            _ => None,
        }
    }

    /// Qualifier set of a declaration or parameter, if it has one.
    pub fn qualifier_of(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(self.declared_type(id)?) {
            NodeKind::FullySpecifiedType { qualifier, .. } => *qualifier,
            _ => None,
        }
    }

    pub fn specifier_of(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(self.declared_type(id)?) {
            NodeKind::FullySpecifiedType { specifier, .. } => Some(*specifier),
            _ => None,
        }
    }

    pub fn type_name(&self, specifier: NodeId) -> Option<&TypeName> {
        match self.kind(specifier) {
            NodeKind::TypeSpecifier(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn members(&self, declaration: NodeId) -> &[NodeId] {
        match self.kind(declaration) {
            NodeKind::VariableDeclaration { members, .. } => members,
            _ => &[],
        }
    }

    pub fn member_name(&self, member: NodeId) -> Option<&str> {
        match self.kind(member) {
            NodeKind::DeclarationMember { name, .. } => self.identifier_name(*name),
            _ => None,
        }
    }

    /// The storage part of a qualifier set equal to `storage`.
    pub fn find_storage(&self, qualifier: NodeId, storage: StorageQualifier) -> Option<NodeId> {
        self.qualifier_parts(qualifier)
            .iter()
            .copied()
            .find(|part| matches!(self.kind(*part), NodeKind::StorageQualifier(s) if *s == storage))
    }

    pub fn qualifier_parts(&self, qualifier: NodeId) -> &[NodeId] {
        match self.kind(qualifier) {
            NodeKind::TypeQualifier { parts } => parts,
            _ => &[],
        }
    }

    // ---- Index maintenance ------------------------------------------------

    fn register_subtree(&mut self, id: NodeId) {
        let found: Vec<(String, NodeId)> = self
            .descendants(id)
            .filter_map(|node| self.identifier_name(node).map(|name| (name.to_string(), node)))
            .collect();
        for (name, node) in found {
            self.index.insert(&name, node);
        }
    }

    fn unregister_subtree(&mut self, id: NodeId) {
        let found: Vec<(String, NodeId)> = self
            .descendants(id)
            .filter_map(|node| self.identifier_name(node).map(|name| (name.to_string(), node)))
            .collect();
        for (name, node) in found {
            self.index.remove(&name, node);
        }
    }

    /// Recompute the index from the tree and compare it with the live one.
    pub fn index_is_consistent(&self) -> bool {
        let mut rebuilt = IdentifierIndex::new();
        for node in self.descendants(self.root) {
            if let Some(name) = self.identifier_name(node) {
                rebuilt.insert(name, node);
            }
        }
        rebuilt == self.index
    }

    // ---- Mutation ---------------------------------------------------------

    /// Rename every occurrence of `old` to `new`.
    pub fn rename(&mut self, old: &str, new: &str) -> usize {
        if old == new {
            return self.index.count(old);
        }
        let moved = self.index.rename(old, new);
        for id in &moved {
            self.nodes[id.index()].kind = NodeKind::Identifier(new.to_string());
        }
        tracing::debug!("renamed {} occurrences of '{}' to '{}'", moved.len(), old, new);
        moved.len()
    }

    /// Unlink `id` from its parent and drop its identifiers from the index.
    pub fn detach(&mut self, id: NodeId) -> ShadelinkResult<()> {
        let parent = self
            .parent(id)
            .ok_or_else(|| ShadelinkError::internal(format!("node {id} has no parent")))?;
        let attached = self.is_attached(parent);
        match self.nodes[parent.index()].kind.replace_child(id, None) {
            ChildReplace::Done => {}
            ChildReplace::Required => {
                return Err(ShadelinkError::internal(format!(
                    "node {id} fills a required position of {:?} and cannot be detached",
                    self.class(parent)
                )))
            }
            ChildReplace::NotFound => {
                return Err(ShadelinkError::internal(format!(
                    "node {id} is not a child of {parent}"
                )))
            }
        }
        if attached {
            self.unregister_subtree(id);
        }
        self.nodes[id.index()].parent = None;
        Ok(())
    }

    /// Put the unattached node `new` in the place of `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> ShadelinkResult<()> {
        if self.parent(new).is_some() {
            return Err(ShadelinkError::internal(format!(
                "replacement node {new} is already attached"
            )));
        }
        let parent = self
            .parent(old)
            .ok_or_else(|| ShadelinkError::internal(format!("node {old} has no parent")))?;
        if self.nodes[parent.index()].kind.replace_child(old, Some(new)) != ChildReplace::Done {
            return Err(ShadelinkError::internal(format!(
                "node {old} is not a child of {parent}"
            )));
        }
        let attached = self.is_attached(parent);
        if attached {
            self.unregister_subtree(old);
        }
        self.nodes[old.index()].parent = None;
        self.nodes[new.index()].parent = Some(parent);
        if attached {
            self.register_subtree(new);
        }
        Ok(())
    }

    /// Insert the unattached node `child` into `parent`'s child list at `position`
    /// (`None` appends).
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        position: Option<usize>,
        child: NodeId,
    ) -> ShadelinkResult<()> {
        if self.parent(child).is_some() || child == self.root {
            return Err(ShadelinkError::internal(format!(
                "inserted node {child} is already attached"
            )));
        }
        let class = self.class(parent);
        let list = self.nodes[parent.index()]
            .kind
            .child_list_mut()
            .ok_or_else(|| ShadelinkError::internal(format!("{class:?} has no child list")))?;
        let position = position.unwrap_or(list.len()).min(list.len());
        list.insert(position, child);
        self.nodes[child.index()].parent = Some(parent);
        if self.is_attached(parent) {
            self.register_subtree(child);
        }
        Ok(())
    }

    /// Fill the empty qualifier position of a fully specified type.
    pub fn set_qualifier(&mut self, ty: NodeId, qualifier: NodeId) -> ShadelinkResult<()> {
        if self.parent(qualifier).is_some() {
            return Err(ShadelinkError::internal(format!(
                "qualifier {qualifier} is already attached"
            )));
        }
        match &mut self.nodes[ty.index()].kind {
            NodeKind::FullySpecifiedType { qualifier: slot, .. } if slot.is_none() => {
                *slot = Some(qualifier)
            }
            _ => {
                return Err(ShadelinkError::internal(format!(
                    "node {ty} has no free qualifier position"
                )))
            }
        }
        self.nodes[qualifier.index()].parent = Some(ty);
        if self.is_attached(ty) {
            self.register_subtree(qualifier);
        }
        Ok(())
    }

    /// Change the keyword of a storage qualifier part.
    pub fn set_storage(&mut self, part: NodeId, storage: StorageQualifier) -> ShadelinkResult<()> {
        match &mut self.nodes[part.index()].kind {
            NodeKind::StorageQualifier(current) => {
                *current = storage;
                Ok(())
            }
            other => Err(ShadelinkError::internal(format!(
                "node {part} is a {:?}, not a storage qualifier",
                other.class()
            ))),
        }
    }

    pub fn push_declaration(&mut self, declaration: NodeId) -> ShadelinkResult<()> {
        self.insert_child(self.root, None, declaration)
    }

    /// Insert a top-level declaration after the leading preprocessor directives.
    pub fn insert_before_declarations(&mut self, declaration: NodeId) -> ShadelinkResult<()> {
        let position = self
            .declarations()
            .iter()
            .position(|id| self.class(*id) != NodeClass::Directive)
            .unwrap_or(self.declarations().len());
        self.insert_child(self.root, Some(position), declaration)
    }

    fn entry_body(&self) -> ShadelinkResult<NodeId> {
        let entry = self
            .entry_function()
            .ok_or_else(|| ShadelinkError::MissingEntryPoint(self.entry_point.clone()))?;
        match self.kind(entry) {
            NodeKind::FunctionDefinition { body, .. } => Ok(*body),
            _ => Err(ShadelinkError::internal("entry point is not a definition")),
        }
    }

    /// Insert a statement at the start of the entry function.
    pub fn prepend_to_entry(&mut self, statement: NodeId) -> ShadelinkResult<()> {
        let body = self.entry_body()?;
        self.insert_child(body, Some(0), statement)
    }

    /// Insert a statement at the end of the entry function.
    pub fn append_to_entry(&mut self, statement: NodeId) -> ShadelinkResult<()> {
        let body = self.entry_body()?;
        self.insert_child(body, None, statement)
    }

    // ---- Cloning ----------------------------------------------------------

    /// Deep-copy a subtree of this document. The copy is unattached.
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        let kind = self.kind(id).clone();
        let copied = kind.map_children(|child| self.clone_node(child));
        self.alloc(copied)
    }

    /// Deep-copy a subtree of `source` into this document. The copy is unattached.
    pub fn import(&mut self, source: &Document, id: NodeId) -> NodeId {
        self.import_with(source, id, &mut |_, _| None)
    }

    /// Deep-copy a subtree of `source`, letting `substitute` provide a node of
    /// this document in place of any source node.
    pub fn import_with(
        &mut self,
        source: &Document,
        id: NodeId,
        substitute: &mut dyn FnMut(&mut Document, NodeId) -> Option<NodeId>,
    ) -> NodeId {
        if let Some(replacement) = substitute(self, id) {
            return replacement;
        }
        let copied = source
            .kind(id)
            .map_children(|child| self.import_with(source, child, substitute));
        self.alloc(copied)
    }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = self.doc.kind(id).children();
        self.stack.extend(children.into_iter().rev());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadelink_core::{NumericType, ScalarKind};

    fn float_type(doc: &mut Document, storage: Option<StorageQualifier>) -> NodeId {
        let qualifier = storage.map(|s| {
            let part = doc.alloc(NodeKind::StorageQualifier(s));
            doc.alloc(NodeKind::TypeQualifier { parts: vec![part] })
        });
        let specifier = doc.type_specifier(TypeName::Builtin(NumericType::scalar(ScalarKind::Float)));
        doc.alloc(NodeKind::FullySpecifiedType {
            qualifier,
            specifier,
        })
    }

    fn global(doc: &mut Document, storage: Option<StorageQualifier>, names: &[&str]) -> NodeId {
        let ty = float_type(doc, storage);
        let members = names
            .iter()
            .map(|name| {
                let name = doc.identifier(*name);
                doc.alloc(NodeKind::DeclarationMember {
                    name,
                    array: None,
                    initializer: None,
                })
            })
            .collect();
        let decl = doc.alloc(NodeKind::VariableDeclaration { ty, members });
        doc.push_declaration(decl).unwrap();
        decl
    }

    fn main_with(doc: &mut Document, statements: Vec<NodeId>) -> NodeId {
        let return_type = doc.type_specifier(TypeName::Void);
        let return_type = doc.alloc(NodeKind::FullySpecifiedType {
            qualifier: None,
            specifier: return_type,
        });
        let name = doc.identifier("main");
        let prototype = doc.alloc(NodeKind::FunctionPrototype {
            return_type,
            name,
            parameters: vec![],
        });
        let body = doc.alloc(NodeKind::CompoundStatement { statements });
        let def = doc.alloc(NodeKind::FunctionDefinition { prototype, body });
        doc.push_declaration(def).unwrap();
        def
    }

    #[test]
    fn test_unattached_nodes_are_not_indexed() {
        let mut doc = Document::new();
        let id = doc.identifier("loose");
        assert_eq!(doc.occurrences("loose"), 0);
        assert!(!doc.is_attached(id));
        global(&mut doc, None, &["kept"]);
        assert_eq!(doc.occurrences("kept"), 1);
        assert!(doc.index_is_consistent());
    }

    #[test]
    fn test_detach_unregisters_subtree() {
        let mut doc = Document::new();
        let decl = global(&mut doc, Some(StorageQualifier::Out), &["a", "b"]);
        let member = doc.members(decl)[0];
        doc.detach(member).unwrap();
        assert_eq!(doc.occurrences("a"), 0);
        assert_eq!(doc.occurrences("b"), 1);
        assert_eq!(doc.members(decl).len(), 1);
        assert!(doc.index_is_consistent());
    }

    #[test]
    fn test_detach_required_child_fails() {
        let mut doc = Document::new();
        let decl = global(&mut doc, None, &["a"]);
        let ty = doc.declared_type(decl).unwrap();
        assert!(doc.detach(ty).is_err());
        assert!(doc.detach(doc.root()).is_err());
    }

    #[test]
    fn test_rename_updates_all_occurrences() {
        let mut doc = Document::new();
        global(&mut doc, Some(StorageQualifier::Out), &["color"]);
        let value = doc.reference("color");
        let stmt = doc.assignment_statement("color", value);
        main_with(&mut doc, vec![stmt]);
        assert_eq!(doc.occurrences("color"), 3);

        assert_eq!(doc.rename("color", "tint"), 3);
        assert_eq!(doc.occurrences("color"), 0);
        assert_eq!(doc.occurrences("tint"), 3);
        for id in doc.lookup("tint") {
            assert_eq!(doc.identifier_name(id), Some("tint"));
        }
        assert!(doc.index_is_consistent());
    }

    #[test]
    fn test_ancestor_of_walks_upward() {
        let mut doc = Document::new();
        let value = doc.reference("x");
        let stmt = doc.assignment_statement("y", value);
        let main = main_with(&mut doc, vec![stmt]);
        let x = doc.lookup("x")[0];
        assert!(doc.ancestor_of(x, NodeClass::ReferenceExpression).is_some());
        assert_eq!(doc.ancestor_of(x, NodeClass::FunctionDefinition), Some(main));
        assert!(doc.ancestor_of(x, NodeClass::VariableDeclaration).is_none());
        assert!(doc.is_referenced("x"));
        assert!(!doc.is_referenced("main"));
    }

    #[test]
    fn test_replace_swaps_index_entries() {
        let mut doc = Document::new();
        let decl = global(&mut doc, None, &["old"]);
        let member = doc.members(decl)[0];
        let old_name = match doc.kind(member) {
            NodeKind::DeclarationMember { name, .. } => *name,
            _ => unreachable!(),
        };
        let new_name = doc.identifier("fresh");
        doc.replace(old_name, new_name).unwrap();
        assert_eq!(doc.member_name(member), Some("fresh"));
        assert_eq!(doc.occurrences("old"), 0);
        assert_eq!(doc.occurrences("fresh"), 1);
        assert!(doc.index_is_consistent());
    }

    #[test]
    fn test_import_registers_on_attach_only() {
        let mut source = Document::new();
        let decl = global(&mut source, Some(StorageQualifier::In), &["normal"]);

        let mut target = Document::new();
        let copy = target.import(&source, decl);
        assert_eq!(target.occurrences("normal"), 0);
        target.push_declaration(copy).unwrap();
        assert_eq!(target.occurrences("normal"), 1);
        assert_eq!(source.occurrences("normal"), 1);
        assert!(target.index_is_consistent());
    }

    #[test]
    fn test_clone_node_is_deep() {
        let mut doc = Document::new();
        let decl = global(&mut doc, None, &["a"]);
        let copy = doc.clone_node(decl);
        assert_ne!(doc.members(copy)[0], doc.members(decl)[0]);
        doc.push_declaration(copy).unwrap();
        assert_eq!(doc.occurrences("a"), 2);
    }

    #[test]
    fn test_insert_before_declarations_skips_directives() {
        let mut doc = Document::new();
        let version = doc.alloc(NodeKind::Directive("#version 150".into()));
        doc.push_declaration(version).unwrap();
        global(&mut doc, None, &["a"]);
        let empty = doc.alloc(NodeKind::EmptyDeclaration);
        doc.insert_before_declarations(empty).unwrap();
        assert_eq!(doc.declarations()[0], version);
        assert_eq!(doc.declarations()[1], empty);
    }

    #[test]
    fn test_entry_injection_points() {
        let mut doc = Document::new();
        let lit = doc.literal(Literal::Float(1.0));
        let first = doc.assignment_statement("a", lit);
        main_with(&mut doc, vec![first]);

        let lit = doc.literal(Literal::Float(0.0));
        let prepended = doc.assignment_statement("b", lit);
        doc.prepend_to_entry(prepended).unwrap();
        let lit = doc.literal(Literal::Float(2.0));
        let appended = doc.assignment_statement("c", lit);
        doc.append_to_entry(appended).unwrap();

        let body = match doc.kind(doc.entry_function().unwrap()) {
            NodeKind::FunctionDefinition { body, .. } => *body,
            _ => unreachable!(),
        };
        assert_eq!(doc.kind(body).children(), vec![prepended, first, appended]);
        assert_eq!(doc.occurrences("b"), 1);
    }

    #[test]
    fn test_missing_entry_point() {
        let mut doc = Document::new().with_entry_point("shade");
        main_with(&mut doc, vec![]);
        let lit = doc.literal(Literal::Int(0));
        let stmt = doc.assignment_statement("x", lit);
        assert!(matches!(
            doc.append_to_entry(stmt),
            Err(ShadelinkError::MissingEntryPoint(name)) if name == "shade"
        ));
    }

    #[test]
    fn test_descendants_preorder() {
        let mut doc = Document::new();
        let decl = global(&mut doc, None, &["a", "b"]);
        let order: Vec<NodeClass> = doc.descendants(decl).map(|id| doc.class(id)).collect();
        assert_eq!(
            order,
            vec![
                NodeClass::VariableDeclaration,
                NodeClass::FullySpecifiedType,
                NodeClass::TypeSpecifier,
                NodeClass::DeclarationMember,
                NodeClass::Identifier,
                NodeClass::DeclarationMember,
                NodeClass::Identifier,
            ]
        );
    }
}
