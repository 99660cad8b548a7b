//! Per-stage cleanup of constructs that some GLSL compilers reject.

use std::collections::{HashMap, HashSet, VecDeque};

use shadelink_ast::{Document, NodeClass, NodeId, NodeKind, StorageQualifier};
use shadelink_core::{NormalizeConfig, ShadelinkError, ShadelinkResult};

use crate::diagnostics::{DiagnosticClass, Diagnostics};

/// What a normalizer run changed in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub removed_functions: Vec<String>,
    pub stripped_declarations: usize,
    pub removed_empty_declarations: usize,
}

impl NormalizeReport {
    pub fn is_empty(&self) -> bool {
        self.removed_functions.is_empty()
            && self.stripped_declarations == 0
            && self.removed_empty_declarations == 0
    }
}

/// Normalize one document in place.
pub fn normalize(
    doc: &mut Document,
    config: &NormalizeConfig,
    diagnostics: &mut Diagnostics,
) -> ShadelinkResult<NormalizeReport> {
    let mut report = NormalizeReport::default();
    if config.remove_unused_functions {
        remove_unused_functions(doc, diagnostics, &mut report)?;
    }
    if config.strip_const_parameters {
        strip_const_parameters(doc, diagnostics, &mut report)?;
    }
    if config.remove_empty_declarations {
        remove_empty_declarations(doc, diagnostics, &mut report)?;
    }
    tracing::debug!(
        "normalized document: {} functions removed, {} const declarations stripped, {} empty declarations removed",
        report.removed_functions.len(),
        report.stripped_declarations,
        report.removed_empty_declarations
    );
    Ok(report)
}

/// Detach every non-entry function whose name occurs only in its own
/// definition. Repeats until nothing changes so helpers of removed functions
/// go as well.
fn remove_unused_functions(
    doc: &mut Document,
    diagnostics: &mut Diagnostics,
    report: &mut NormalizeReport,
) -> ShadelinkResult<()> {
    loop {
        let unused: Vec<(NodeId, String)> = doc
            .function_definitions()
            .into_iter()
            .filter_map(|definition| {
                let name = doc.function_name(definition)?;
                (name != doc.entry_point() && doc.occurrences(name) <= 1)
                    .then(|| (definition, name.to_string()))
            })
            .collect();
        if unused.is_empty() {
            return Ok(());
        }
        for (definition, name) in unused {
            doc.detach(definition)?;
            diagnostics.report(
                DiagnosticClass::UnusedFunction,
                format!("removed unused function '{}'", name),
            );
            report.removed_functions.push(name);
        }
    }
}

/// The declaration member whose initializer contains `occurrence`.
fn initialized_member(doc: &Document, occurrence: NodeId) -> Option<NodeId> {
    let mut child = occurrence;
    while let Some(parent) = doc.parent(child) {
        if let NodeKind::DeclarationMember { initializer, .. } = doc.kind(parent) {
            return (*initializer == Some(child)).then_some(parent);
        }
        child = parent;
    }
    None
}

/// A local `const` declaration initialized from a reference to the name at `occurrence`.
fn const_local_initialized_by(doc: &Document, occurrence: NodeId) -> Option<(NodeId, NodeId)> {
    doc.ancestor_of(occurrence, NodeClass::ReferenceExpression)?;
    let member = initialized_member(doc, occurrence)?;
    let declaration = doc.parent(member)?;
    if doc.class(doc.parent(declaration)?) != NodeClass::DeclarationStatement {
        return None;
    }
    let qualifier = doc.qualifier_of(declaration)?;
    doc.find_storage(qualifier, StorageQualifier::Const)?;
    let function = doc.ancestor_of(declaration, NodeClass::FunctionDefinition)?;
    Some((declaration, function))
}

/// Const parameters are not compile-time constants on every driver, so any
/// const local initialized from one, directly or through another stripped
/// local, loses its const qualifier.
fn strip_const_parameters(
    doc: &mut Document,
    diagnostics: &mut Diagnostics,
    report: &mut NormalizeReport,
) -> ShadelinkResult<()> {
    let mut tracked: HashMap<NodeId, HashSet<String>> = HashMap::new();
    let mut worklist: VecDeque<String> = VecDeque::new();
    let mut pending: HashSet<String> = HashSet::new();

    for function in doc.function_definitions() {
        let mut names = HashSet::new();
        for &parameter in doc.function_parameters(function) {
            let is_const = doc
                .qualifier_of(parameter)
                .and_then(|q| doc.find_storage(q, StorageQualifier::Const))
                .is_some();
            let name = match doc.kind(parameter) {
                NodeKind::FunctionParameter { name: Some(name), .. } => doc.identifier_name(*name),
                _ => None,
            };
            if let (true, Some(name)) = (is_const, name) {
                names.insert(name.to_string());
                if pending.insert(name.to_string()) {
                    worklist.push_back(name.to_string());
                }
            }
        }
        if !names.is_empty() {
            tracked.insert(function, names);
        }
    }

    let stripped_before = report.stripped_declarations;
    while let Some(name) = worklist.pop_front() {
        pending.remove(&name);
        for occurrence in doc.lookup(&name) {
            let Some((declaration, function)) = const_local_initialized_by(doc, occurrence) else {
                continue;
            };
            let Some(names) = tracked.get_mut(&function) else {
                continue;
            };
            if !names.contains(&name) {
                continue;
            }

            let Some(qualifier) = doc.qualifier_of(declaration) else {
                continue;
            };
            let Some(const_part) = doc.find_storage(qualifier, StorageQualifier::Const) else {
                continue;
            };
            doc.detach(const_part)?;
            if doc.qualifier_parts(qualifier).is_empty() {
                doc.detach(qualifier)?;
            }
            report.stripped_declarations += 1;

            let members: Vec<String> = doc
                .members(declaration)
                .iter()
                .filter_map(|member| doc.member_name(*member))
                .map(str::to_string)
                .collect();
            for member in members {
                if !names.insert(member.clone()) {
                    return Err(ShadelinkError::IllegalRedefinition {
                        name: member,
                        function: doc.function_name(function).unwrap_or_default().to_string(),
                    });
                }
                if pending.insert(member.clone()) {
                    worklist.push_back(member);
                }
            }
        }
    }

    let stripped = report.stripped_declarations - stripped_before;
    if stripped > 0 {
        diagnostics.report(
            DiagnosticClass::ConstStripped,
            format!(
                "removed the const qualifier from {} local declaration(s) initialized from const parameters",
                stripped
            ),
        );
    }
    Ok(())
}

/// Detach top-level bare `;` declarations.
fn remove_empty_declarations(
    doc: &mut Document,
    diagnostics: &mut Diagnostics,
    report: &mut NormalizeReport,
) -> ShadelinkResult<()> {
    let empty: Vec<NodeId> = doc
        .declarations()
        .iter()
        .copied()
        .filter(|id| doc.class(*id) == NodeClass::EmptyDeclaration)
        .collect();
    if empty.is_empty() {
        return Ok(());
    }
    for declaration in &empty {
        doc.detach(*declaration)?;
    }
    report.removed_empty_declarations += empty.len();
    diagnostics.report(
        DiagnosticClass::EmptyDeclaration,
        format!("removed {} stray empty declaration(s)", empty.len()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadelink_ast::syntax::{
        ExternalDeclaration, Expression, FullType, Prototype, Statement, TranslationUnit,
    };
    use shadelink_ast::Printer;

    fn run(doc: &mut Document) -> ShadelinkResult<NormalizeReport> {
        let mut diagnostics = Diagnostics::new(false);
        normalize(doc, &NormalizeConfig::default(), &mut diagnostics)
    }

    fn float_function(name: &str, params: &[&str], body: Vec<Statement>) -> ExternalDeclaration {
        let prototype = params.iter().fold(
            Prototype::new(FullType::new("float"), name),
            |prototype, param| {
                prototype.with_parameter(
                    FullType::new("float").with_storage(StorageQualifier::Const),
                    *param,
                )
            },
        );
        ExternalDeclaration::Function { prototype, body }
    }

    fn const_float() -> FullType {
        FullType::new("float").with_storage(StorageQualifier::Const)
    }

    #[test]
    fn test_removes_unused_functions_transitively() {
        let unit = TranslationUnit::new()
            .with(float_function("leaf", &[], vec![]))
            .with(float_function(
                "caller",
                &[],
                vec![Statement::Return {
                    value: Some(Expression::call("leaf", vec![])),
                }],
            ))
            .with(float_function("used", &[], vec![]))
            .with(ExternalDeclaration::function(
                "main",
                vec![Statement::expression(Expression::call("used", vec![]))],
            ));
        let mut doc = Document::from_syntax(&unit).unwrap();
        let report = run(&mut doc).unwrap();

        assert_eq!(report.removed_functions, vec!["caller", "leaf"]);
        assert_eq!(doc.occurrences("leaf"), 0);
        assert_eq!(doc.occurrences("caller"), 0);
        assert_eq!(doc.occurrences("used"), 2);
        assert!(doc.entry_function().is_some());
        assert!(doc.index_is_consistent());
    }

    #[test]
    fn test_entry_point_is_never_removed() {
        let unit = TranslationUnit::new().with(ExternalDeclaration::function("main", vec![]));
        let mut doc = Document::from_syntax(&unit).unwrap();
        let report = run(&mut doc).unwrap();
        assert!(report.is_empty());
        assert!(doc.entry_function().is_some());
    }

    #[test]
    fn test_const_stripping_is_transitive() {
        let body = vec![
            Statement::declare(const_float(), "a", Expression::reference("p")),
            Statement::declare(const_float(), "b", Expression::reference("a")),
            Statement::declare(const_float(), "c", Expression::float(1.0)),
            Statement::Return {
                value: Some(Expression::reference("b")),
            },
        ];
        let unit = TranslationUnit::new()
            .with(float_function("f", &["p"], body))
            .with(ExternalDeclaration::function(
                "main",
                vec![Statement::expression(Expression::call(
                    "f",
                    vec![Expression::float(2.0)],
                ))],
            ));
        let mut doc = Document::from_syntax(&unit).unwrap();
        let mut diagnostics = Diagnostics::new(false);
        let report = normalize(&mut doc, &NormalizeConfig::default(), &mut diagnostics).unwrap();

        assert_eq!(report.stripped_declarations, 2);
        let text = Printer::print(&doc);
        assert!(text.contains("float f(const float p)"));
        assert!(text.contains("    float a = p;\n"));
        assert!(text.contains("    float b = a;\n"));
        assert!(text.contains("    const float c = 1.0;\n"));
        assert_eq!(diagnostics.warnings(DiagnosticClass::ConstStripped), 1);
        assert!(doc.index_is_consistent());
    }

    #[test]
    fn test_other_qualifiers_survive_stripping() {
        let ty = FullType::new("float")
            .with_qualifier("highp")
            .with_storage(StorageQualifier::Const);
        let body = vec![Statement::declare(ty, "a", Expression::reference("p"))];
        let unit = TranslationUnit::new()
            .with(float_function("f", &["p"], body))
            .with(ExternalDeclaration::function(
                "main",
                vec![Statement::expression(Expression::call("f", vec![]))],
            ));
        let mut doc = Document::from_syntax(&unit).unwrap();
        run(&mut doc).unwrap();
        assert!(Printer::print(&doc).contains("    highp float a = p;\n"));
    }

    #[test]
    fn test_const_redefinition_is_fatal() {
        let body = vec![Statement::declare(const_float(), "q", Expression::reference("p"))];
        let unit = TranslationUnit::new()
            .with(float_function("f", &["p", "q"], body))
            .with(ExternalDeclaration::function(
                "main",
                vec![Statement::expression(Expression::call("f", vec![]))],
            ));
        let mut doc = Document::from_syntax(&unit).unwrap();
        let result = run(&mut doc);
        assert!(matches!(
            result,
            Err(ShadelinkError::IllegalRedefinition { ref name, ref function }) if name == "q" && function == "f"
        ));
    }

    #[test]
    fn test_removes_empty_declarations() {
        let unit = TranslationUnit::new()
            .with(ExternalDeclaration::directive("#version 150"))
            .with(ExternalDeclaration::Empty)
            .with(ExternalDeclaration::function("main", vec![]))
            .with(ExternalDeclaration::Empty);
        let mut doc = Document::from_syntax(&unit).unwrap();
        let mut diagnostics = Diagnostics::new(false);
        let report = normalize(&mut doc, &NormalizeConfig::default(), &mut diagnostics).unwrap();
        assert_eq!(report.removed_empty_declarations, 2);
        assert_eq!(doc.declarations().len(), 2);
        assert_eq!(diagnostics.warnings(DiagnosticClass::EmptyDeclaration), 1);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let body = vec![Statement::declare(const_float(), "a", Expression::reference("p"))];
        let unit = TranslationUnit::new()
            .with(float_function("helper", &[], vec![]))
            .with(float_function("f", &["p"], body))
            .with(ExternalDeclaration::Empty)
            .with(ExternalDeclaration::function(
                "main",
                vec![Statement::expression(Expression::call("f", vec![]))],
            ));
        let mut doc = Document::from_syntax(&unit).unwrap();
        assert!(!run(&mut doc).unwrap().is_empty());
        let once = Printer::print(&doc);
        assert!(run(&mut doc).unwrap().is_empty());
        assert_eq!(Printer::print(&doc), once);
    }

    #[test]
    fn test_disabled_steps_leave_document_alone() {
        let unit = TranslationUnit::new()
            .with(float_function("unused", &[], vec![]))
            .with(ExternalDeclaration::Empty)
            .with(ExternalDeclaration::function("main", vec![]));
        let mut doc = Document::from_syntax(&unit).unwrap();
        let config = NormalizeConfig {
            remove_unused_functions: false,
            strip_const_parameters: false,
            remove_empty_declarations: false,
        };
        let report = normalize(&mut doc, &config, &mut Diagnostics::new(false)).unwrap();
        assert!(report.is_empty());
        assert_eq!(doc.declarations().len(), 3);
    }
}
