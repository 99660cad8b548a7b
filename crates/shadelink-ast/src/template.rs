//! Synthesis of new tree fragments from skeletons with replacement slots.

use std::collections::HashMap;

use shadelink_core::ShadelinkResult;

use crate::document::Document;
use crate::matcher::find_placeholder;
use crate::node::{NodeClass, NodeId, NodeKind};
use crate::syntax::{ExternalDeclaration, Statement};

#[derive(Debug, Clone)]
enum SlotKind {
    /// Every identifier with this placeholder name.
    Identifier(String),
    /// One specific skeleton node, replaced by a whole subtree.
    Local { node: NodeId, class: NodeClass },
}

/// A value bound to a template slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotValue {
    /// A name; each occurrence in the skeleton gets its own fresh identifier.
    Identifier(String),
    /// An unattached node of the target document, moved into place.
    Node(NodeId),
}

/// A skeleton fragment with ordered replacement slots.
///
/// Slot values are bound in the order the slots were declared. Passing the
/// wrong number of values or a value of the wrong kind is a bug in the
/// caller and panics.
#[derive(Debug, Clone)]
pub struct Template {
    skeleton: Document,
    root: NodeId,
    slots: Vec<SlotKind>,
}

impl Template {
    pub fn from_declaration(fragment: &ExternalDeclaration) -> ShadelinkResult<Self> {
        let mut skeleton = Document::new();
        let root = skeleton.lower_declaration(fragment)?;
        Ok(Self::new(skeleton, root))
    }

    pub fn from_statement(fragment: &Statement) -> ShadelinkResult<Self> {
        let mut skeleton = Document::new();
        let root = skeleton.lower_statement(fragment)?;
        Ok(Self::new(skeleton, root))
    }

    pub fn new(skeleton: Document, root: NodeId) -> Self {
        Self {
            skeleton,
            root,
            slots: Vec::new(),
        }
    }

    /// Declare a slot for every identifier spelled `placeholder`.
    pub fn identifier_slot(mut self, placeholder: &str) -> ShadelinkResult<Self> {
        find_placeholder(&self.skeleton, self.root, placeholder, NodeClass::Identifier)?;
        self.slots.push(SlotKind::Identifier(placeholder.to_string()));
        Ok(self)
    }

    /// Declare a slot for the first node of `class` spelled `placeholder`.
    pub fn local_slot(mut self, placeholder: &str, class: NodeClass) -> ShadelinkResult<Self> {
        let node = find_placeholder(&self.skeleton, self.root, placeholder, class)?;
        self.slots.push(SlotKind::Local { node, class });
        Ok(self)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Copy the skeleton into `target` with `values` bound to the slots.
    ///
    /// The result is unattached; its identifiers get indexed once it is
    /// inserted into the tree.
    pub fn instantiate(&self, target: &mut Document, values: Vec<SlotValue>) -> NodeId {
        assert_eq!(
            values.len(),
            self.slots.len(),
            "template expects {} slot values, got {}",
            self.slots.len(),
            values.len()
        );

        let mut identifiers: HashMap<&str, String> = HashMap::new();
        let mut locals: HashMap<NodeId, NodeId> = HashMap::new();
        for (slot, value) in self.slots.iter().zip(values) {
            match (slot, value) {
                (SlotKind::Identifier(placeholder), SlotValue::Identifier(name)) => {
                    identifiers.insert(placeholder.as_str(), name);
                }
                (SlotKind::Local { node, class }, SlotValue::Node(value)) => {
                    let actual = target.class(value);
                    assert!(
                        class.accepts(actual),
                        "template slot expects {:?}, got {:?}",
                        class,
                        actual
                    );
                    assert!(
                        target.parent(value).is_none() && value != target.root(),
                        "template slot value {} is already attached",
                        value
                    );
                    locals.insert(*node, value);
                }
                (slot, value) => panic!("template slot {:?} cannot take {:?}", slot, value),
            }
        }

        let skeleton = &self.skeleton;
        target.import_with(skeleton, self.root, &mut |doc, source| {
            if let Some(value) = locals.get(&source) {
                return Some(*value);
            }
            match skeleton.kind(source) {
                NodeKind::Identifier(name) => identifiers
                    .get(name.as_str())
                    .map(|replacement| doc.identifier(replacement.as_str())),
                _ => None,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{StorageQualifier, TypeName};
    use crate::printer::Printer;
    use crate::syntax::{Expression, FullType, TranslationUnit};
    use shadelink_core::{NumericType, ScalarKind};

    fn assignment() -> Template {
        Template::from_statement(&Statement::assign("__target", Expression::reference("__value")))
            .unwrap()
            .identifier_slot("__target")
            .unwrap()
            .local_slot("__value", NodeClass::Expression)
            .unwrap()
    }

    fn main_doc() -> Document {
        let unit = TranslationUnit::new().with(ExternalDeclaration::function("main", vec![]));
        Document::from_syntax(&unit).unwrap()
    }

    #[test]
    fn test_instantiate_assignment_into_target() {
        let template = assignment();
        let mut doc = main_doc();
        let value = doc.reference("source");
        let statement = template.instantiate(
            &mut doc,
            vec![SlotValue::Identifier("dest".into()), SlotValue::Node(value)],
        );
        assert_eq!(doc.occurrences("dest"), 0);
        doc.append_to_entry(statement).unwrap();
        assert_eq!(doc.occurrences("dest"), 1);
        assert_eq!(doc.occurrences("source"), 1);
        assert_eq!(doc.occurrences("__target"), 0);
        assert!(doc.index_is_consistent());
        assert!(Printer::print(&doc).contains("    dest = source;\n"));
    }

    #[test]
    fn test_instantiate_declaration_with_type_slot() {
        let template = Template::from_declaration(&ExternalDeclaration::variable(
            FullType::new("__type").with_storage(StorageQualifier::Out),
            &["__name"],
        ))
        .unwrap()
        .local_slot("__type", NodeClass::TypeSpecifier)
        .unwrap()
        .identifier_slot("__name")
        .unwrap();

        let mut doc = Document::new();
        let ty = doc.type_specifier(TypeName::Builtin(NumericType::vector(ScalarKind::Float, 4)));
        let declaration = template.instantiate(
            &mut doc,
            vec![SlotValue::Node(ty), SlotValue::Identifier("color".into())],
        );
        doc.push_declaration(declaration).unwrap();
        assert_eq!(Printer::print(&doc), "out vec4 color;\n");
    }

    #[test]
    fn test_skeleton_is_reusable() {
        let template = assignment();
        let mut doc = main_doc();
        for name in ["a", "b"] {
            let value = doc.reference("x");
            let statement = template.instantiate(
                &mut doc,
                vec![SlotValue::Identifier(name.into()), SlotValue::Node(value)],
            );
            doc.append_to_entry(statement).unwrap();
        }
        assert_eq!(doc.occurrences("x"), 2);
        assert!(doc.index_is_consistent());
    }

    #[test]
    #[should_panic(expected = "template expects 2 slot values")]
    fn test_wrong_value_count_panics() {
        let mut doc = Document::new();
        assignment().instantiate(&mut doc, vec![SlotValue::Identifier("a".into())]);
    }

    #[test]
    #[should_panic(expected = "template slot expects")]
    fn test_wrong_node_class_panics() {
        let mut doc = Document::new();
        let not_an_expression = doc.type_specifier(TypeName::Void);
        assignment().instantiate(
            &mut doc,
            vec![
                SlotValue::Identifier("a".into()),
                SlotValue::Node(not_an_expression),
            ],
        );
    }

    #[test]
    fn test_unknown_placeholder_is_rejected() {
        let result = Template::from_statement(&Statement::assign("a", Expression::float(0.0)))
            .unwrap()
            .identifier_slot("__missing");
        assert!(result.is_err());
    }
}
