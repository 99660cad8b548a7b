//! Structural pattern matching against canonical example fragments.
//!
//! A [`Matcher`] holds a small example tree in a scratch [`Document`] and a
//! set of wildcard nodes inside it. A candidate matches when it has the same
//! shape as the example everywhere outside the wildcards.

use std::collections::{BTreeMap, HashMap};

use shadelink_core::{NumericType, ShaderStage, ShadelinkError, ShadelinkResult};

use crate::document::Document;
use crate::node::{NodeClass, NodeId, NodeKind, Slot, StorageQualifier, TypeName};
use crate::syntax::{ExternalDeclaration, FullType};

#[derive(Debug, Clone)]
struct Wildcard {
    name: String,
    class: NodeClass,
    /// Matches one or more consecutive list elements.
    repeat: bool,
}

/// Nodes bound to wildcard names by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    bindings: BTreeMap<String, Vec<NodeId>>,
}

impl Captures {
    fn bind(&mut self, name: &str, id: NodeId) {
        self.bindings.entry(name.to_string()).or_default().push(id);
    }

    /// The first node bound to `name`.
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.all(name).first().copied()
    }

    pub fn all(&self, name: &str) -> &[NodeId] {
        self.bindings.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The text a skeleton node stands for when used as a placeholder.
fn placeholder_text(doc: &Document, id: NodeId) -> Option<String> {
    match doc.kind(id) {
        NodeKind::Identifier(name) | NodeKind::QualifierText(name) => Some(name.clone()),
        NodeKind::TypeSpecifier(ty) => Some(ty.to_string()),
        NodeKind::ReferenceExpression { name } => placeholder_text(doc, *name),
        NodeKind::DeclarationMember { name, .. } => placeholder_text(doc, *name),
        NodeKind::TypeQualifier { parts } if parts.len() == 1 => placeholder_text(doc, parts[0]),
        _ => None,
    }
}

/// First node under `root`, in pre-order, of class `class` written as `placeholder`.
pub(crate) fn find_placeholder(
    doc: &Document,
    root: NodeId,
    placeholder: &str,
    class: NodeClass,
) -> ShadelinkResult<NodeId> {
    doc.descendants(root)
        .find(|id| {
            class.accepts(doc.class(*id)) && placeholder_text(doc, *id).as_deref() == Some(placeholder)
        })
        .ok_or_else(|| {
            ShadelinkError::internal(format!(
                "fragment has no {:?} placeholder '{}'",
                class, placeholder
            ))
        })
}

/// A pattern built from an example fragment plus named wildcards.
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: Document,
    root: NodeId,
    wildcards: HashMap<NodeId, Wildcard>,
}

impl Matcher {
    /// Use `root` of the scratch document `pattern` as the example fragment.
    pub fn new(pattern: Document, root: NodeId) -> Self {
        Self {
            pattern,
            root,
            wildcards: HashMap::new(),
        }
    }

    /// Example fragment given as a top-level declaration.
    pub fn from_declaration(fragment: &ExternalDeclaration) -> ShadelinkResult<Self> {
        let mut pattern = Document::new();
        let root = pattern.lower_declaration(fragment)?;
        Ok(Self::new(pattern, root))
    }

    fn mark(
        mut self,
        placeholder: &str,
        name: &str,
        class: NodeClass,
        repeat: bool,
    ) -> ShadelinkResult<Self> {
        let node = find_placeholder(&self.pattern, self.root, placeholder, class)?;
        self.wildcards.insert(
            node,
            Wildcard {
                name: name.to_string(),
                class,
                repeat,
            },
        );
        Ok(self)
    }

    /// Let the node written as `placeholder` match any single node of `class`.
    pub fn wildcard(self, placeholder: &str, name: &str, class: NodeClass) -> ShadelinkResult<Self> {
        self.mark(placeholder, name, class, false)
    }

    /// Let the list element written as `placeholder` match one or more
    /// consecutive elements of `class`.
    pub fn list_wildcard(
        self,
        placeholder: &str,
        name: &str,
        class: NodeClass,
    ) -> ShadelinkResult<Self> {
        self.mark(placeholder, name, class, true)
    }

    /// Match `node` of `doc` against the pattern.
    pub fn matches(&self, doc: &Document, node: NodeId) -> Option<Captures> {
        let mut captures = Captures::default();
        self.match_node(doc, self.root, node, &mut captures)
            .then_some(captures)
    }

    fn match_node(
        &self,
        doc: &Document,
        pattern: NodeId,
        candidate: NodeId,
        captures: &mut Captures,
    ) -> bool {
        if let Some(wildcard) = self.wildcards.get(&pattern) {
            if !wildcard.class.accepts(doc.class(candidate)) {
                return false;
            }
            captures.bind(&wildcard.name, candidate);
            return true;
        }

        let expected = self.pattern.kind(pattern);
        let actual = doc.kind(candidate);
        if !expected.same_leaf(actual) {
            return false;
        }
        let (expected, actual) = (expected.slots(), actual.slots());
        if expected.len() != actual.len() {
            return false;
        }
        expected.iter().zip(actual.iter()).all(|pair| match pair {
            (Slot::One(None), Slot::One(None)) => true,
            (Slot::One(Some(p)), Slot::One(Some(c))) => self.match_node(doc, *p, *c, captures),
            (Slot::Many(p), Slot::Many(c)) => self.match_list(doc, p, c, captures),
            _ => false,
        })
    }

    fn match_list(
        &self,
        doc: &Document,
        pattern: &[NodeId],
        candidate: &[NodeId],
        captures: &mut Captures,
    ) -> bool {
        let Some((&first, rest)) = pattern.split_first() else {
            return candidate.is_empty();
        };

        if let Some(wildcard) = self.wildcards.get(&first).filter(|w| w.repeat) {
            // Longest run first.
            for taken in (1..=candidate.len()).rev() {
                let (run, remaining) = candidate.split_at(taken);
                if !run.iter().all(|id| wildcard.class.accepts(doc.class(*id))) {
                    continue;
                }
                let mut trial = captures.clone();
                for id in run {
                    trial.bind(&wildcard.name, *id);
                }
                if self.match_list(doc, rest, remaining, &mut trial) {
                    *captures = trial;
                    return true;
                }
            }
            return false;
        }

        let Some((&head, remaining)) = candidate.split_first() else {
            return false;
        };
        let mut trial = captures.clone();
        if self.match_node(doc, first, head, &mut trial)
            && self.match_list(doc, rest, remaining, &mut trial)
        {
            *captures = trial;
            true
        } else {
            false
        }
    }
}

/// A matched storage-direction declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationMatch {
    pub declaration: NodeId,
    pub qualifier: NodeId,
    pub specifier: NodeId,
    pub members: Vec<NodeId>,
}

/// Matches top-level `<qualifiers> <type> a, b, ...;` declarations whose
/// storage direction is `in` or `out`.
///
/// `varying` reads as `out` in vertex and geometry stages and as `in` in the
/// fragment stage. Declarations with array members are never matched, which
/// keeps geometry inputs (`in vec3 v[];`) out of reconciliation.
#[derive(Debug, Clone)]
pub struct DeclarationMatcher {
    matcher: Matcher,
    direction: StorageQualifier,
}

impl DeclarationMatcher {
    pub fn new(direction: StorageQualifier) -> ShadelinkResult<Self> {
        let fragment = ExternalDeclaration::variable(
            FullType::new("__type").with_qualifier("__qualifier"),
            &["__member"],
        );
        let matcher = Matcher::from_declaration(&fragment)?
            .wildcard("__qualifier", "qualifier", NodeClass::TypeQualifier)?
            .wildcard("__type", "type", NodeClass::TypeSpecifier)?
            .list_wildcard("__member", "member", NodeClass::DeclarationMember)?;
        Ok(Self { matcher, direction })
    }

    pub fn direction(&self) -> StorageQualifier {
        self.direction
    }

    fn reads_as_direction(&self, stage: ShaderStage) -> bool {
        match (stage, self.direction) {
            (ShaderStage::Vertex | ShaderStage::Geometry, StorageQualifier::Out) => true,
            (ShaderStage::Fragment, StorageQualifier::In) => true,
            _ => false,
        }
    }

    pub fn match_declaration(
        &self,
        doc: &Document,
        node: NodeId,
        stage: ShaderStage,
    ) -> Option<DeclarationMatch> {
        let captures = self.matcher.matches(doc, node)?;
        let qualifier = captures.get("qualifier")?;
        let specifier = captures.get("type")?;
        let members = captures.all("member").to_vec();

        let direction_matches = doc.find_storage(qualifier, self.direction).is_some()
            || (self.reads_as_direction(stage)
                && doc.find_storage(qualifier, StorageQualifier::Varying).is_some());
        if !direction_matches {
            return None;
        }
        let has_array = members.iter().any(|member| {
            matches!(doc.kind(*member), NodeKind::DeclarationMember { array: Some(_), .. })
        });
        if has_array {
            return None;
        }
        Some(DeclarationMatch {
            declaration: node,
            qualifier,
            specifier,
            members,
        })
    }

    /// Numeric type of a matched declaration, if it has one.
    pub fn numeric_type(doc: &Document, matched: &DeclarationMatch) -> Option<NumericType> {
        doc.type_name(matched.specifier).and_then(TypeName::numeric)
    }
}
