//! Cross-stage interface reconciliation.
//!
//! Walks the pipeline in stage order and makes every used input of a stage
//! have an output of compatible type in the previous present stage, patching
//! the producing document where that is possible.

use std::collections::HashMap;

use shadelink_ast::syntax::{ExternalDeclaration, Expression, FullType, Statement};
use shadelink_ast::{
    DeclarationMatch, DeclarationMatcher, Document, NodeClass, NodeId, NodeKind, SlotValue,
    StorageQualifier, Template, TypeName,
};
use shadelink_core::{
    Literal, NumericType, PatchStage, ShaderStage, ShadelinkConfig, ShadelinkError,
    ShadelinkResult,
};

use crate::diagnostics::{DiagnosticClass, Diagnostics};
use crate::pipeline::Pipeline;

/// One interface variable touched while reconciling a stage pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfacePatch {
    pub producer: PatchStage,
    pub consumer: PatchStage,
    pub name: String,
}

/// What reconciliation changed or left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Outputs synthesized in the producer for inputs it did not declare.
    pub declared: Vec<InterfacePatch>,
    /// Declared but never written outputs given a zero initializer.
    pub initialized: Vec<InterfacePatch>,
    /// Outputs re-typed through an internal alias variable.
    pub aliased: Vec<InterfacePatch>,
    /// Mismatches reported and left for the compiler to judge.
    pub unpatchable: Vec<InterfacePatch>,
    /// Set when a reserved-prefix collision stopped the pass.
    pub aborted: bool,
}

impl ReconcileReport {
    /// Whether any document was modified.
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty() && self.initialized.is_empty() && self.aliased.is_empty()
    }
}

/// State of a producer output while reconciling one stage pair.
#[derive(Debug, Clone, Copy)]
enum OutEntry {
    Declared { specifier: NodeId },
    /// Already patched for this pair.
    Resolved,
}

/// Fragments synthesized into producer documents.
struct Templates {
    /// `<qualifier> <type> <member>;`
    out_declaration: Template,
    /// `<type> alias;`
    internal_declaration: Template,
    /// `name = <value>;`
    initializer: Template,
    /// `name = <type>(alias);`
    conversion: Template,
    /// `name = <type>(alias, vec4(0));`
    widening: Template,
}

impl Templates {
    fn new() -> ShadelinkResult<Self> {
        let out_declaration = Template::from_declaration(&ExternalDeclaration::variable(
            FullType::new("__type").with_qualifier("__qualifier"),
            &["__member"],
        ))?
        .local_slot("__qualifier", NodeClass::TypeQualifier)?
        .local_slot("__type", NodeClass::TypeSpecifier)?
        .local_slot("__member", NodeClass::DeclarationMember)?;

        let internal_declaration = Template::from_declaration(&ExternalDeclaration::variable(
            FullType::new("__type"),
            &["__name"],
        ))?
        .local_slot("__type", NodeClass::TypeSpecifier)?
        .identifier_slot("__name")?;

        let initializer =
            Template::from_statement(&Statement::assign("__target", Expression::reference("__value")))?
                .identifier_slot("__target")?
                .local_slot("__value", NodeClass::Expression)?;

        let conversion = Template::from_statement(&Statement::assign(
            "__target",
            Expression::call("vec3", vec![Expression::reference("__internal")]),
        ))?
        .identifier_slot("__target")?
        .local_slot("vec3", NodeClass::TypeSpecifier)?
        .identifier_slot("__internal")?;

        let widening = Template::from_statement(&Statement::assign(
            "__target",
            Expression::call(
                "vec3",
                vec![
                    Expression::reference("__internal"),
                    Expression::call("vec4", vec![Expression::literal(Literal::Int(0))]),
                ],
            ),
        ))?
        .identifier_slot("__target")?
        .local_slot("vec3", NodeClass::TypeSpecifier)?
        .identifier_slot("__internal")?;

        Ok(Self {
            out_declaration,
            internal_declaration,
            initializer,
            conversion,
            widening,
        })
    }
}

/// Reconcile the interfaces of every adjacent pair of present stages.
pub fn reconcile(
    pipeline: &mut Pipeline,
    config: &ShadelinkConfig,
    diagnostics: &mut Diagnostics,
) -> ShadelinkResult<ReconcileReport> {
    let mut report = ReconcileReport::default();
    if !config.reconcile.enabled {
        tracing::debug!("interface reconciliation disabled");
        return Ok(report);
    }

    let reconciler = Reconciler {
        prefix: config.alias_prefix.clone(),
        out_matcher: DeclarationMatcher::new(StorageQualifier::Out)?,
        in_matcher: DeclarationMatcher::new(StorageQualifier::In)?,
        templates: Templates::new()?,
    };

    let mut producer: Option<ShaderStage> = None;
    for stage in ShaderStage::PIPELINE {
        if !pipeline.has_stage(stage) {
            continue;
        }
        if let Some(previous) = producer {
            if !reconciler.reconcile_pair(pipeline, previous, stage, diagnostics, &mut report)? {
                report.aborted = true;
                return Ok(report);
            }
        }
        producer = Some(stage);
    }
    Ok(report)
}

struct Reconciler {
    prefix: String,
    out_matcher: DeclarationMatcher,
    in_matcher: DeclarationMatcher,
    templates: Templates,
}

/// The stage pair being reconciled.
struct Pair<'a> {
    producer: PatchStage,
    consumer: PatchStage,
    consumer_stage: ShaderStage,
    consumer_doc: &'a Document,
}

impl Pair<'_> {
    fn patch(&self, name: &str) -> InterfacePatch {
        InterfacePatch {
            producer: self.producer,
            consumer: self.consumer,
            name: name.to_string(),
        }
    }
}

impl Reconciler {
    /// Returns `false` when the pass has to stop.
    fn reconcile_pair(
        &self,
        pipeline: &mut Pipeline,
        producer_stage: ShaderStage,
        consumer_stage: ShaderStage,
        diagnostics: &mut Diagnostics,
        report: &mut ReconcileReport,
    ) -> ShadelinkResult<bool> {
        let producer = pipeline.producer_variant(producer_stage).ok_or_else(|| {
            ShadelinkError::internal(format!("stage {} has no document", producer_stage))
        })?;
        let mut producer_doc = pipeline.take(producer).ok_or_else(|| {
            ShadelinkError::internal(format!("document {} vanished from the pipeline", producer))
        })?;
        let result = self.patch_producer(
            &mut producer_doc,
            producer,
            pipeline,
            consumer_stage,
            diagnostics,
            report,
        );
        pipeline.insert(producer, producer_doc);
        result
    }

    fn patch_producer(
        &self,
        producer_doc: &mut Document,
        producer: PatchStage,
        pipeline: &Pipeline,
        consumer_stage: ShaderStage,
        diagnostics: &mut Diagnostics,
        report: &mut ReconcileReport,
    ) -> ShadelinkResult<bool> {
        if let Some(taken) = producer_doc.prefix_query(&self.prefix).next() {
            diagnostics.report(
                DiagnosticClass::PrefixCollision,
                format!(
                    "identifier '{}' in {} uses the reserved prefix '{}'; interface reconciliation skipped",
                    taken, producer, self.prefix
                ),
            );
            return Ok(false);
        }

        let mut out_table = self.out_table(producer_doc, producer.stage());
        for &consumer in consumer_stage.variants() {
            let Some(consumer_doc) = pipeline.get(consumer) else {
                continue;
            };
            let pair = Pair {
                producer,
                consumer,
                consumer_stage,
                consumer_doc,
            };
            self.patch_consumer(producer_doc, &pair, &mut out_table, diagnostics, report)?;
        }
        Ok(true)
    }

    fn out_table(&self, doc: &Document, stage: ShaderStage) -> HashMap<String, OutEntry> {
        let mut table = HashMap::new();
        for &declaration in doc.declarations() {
            let Some(matched) = self.out_matcher.match_declaration(doc, declaration, stage) else {
                continue;
            };
            for &member in &matched.members {
                if let Some(name) = doc.member_name(member) {
                    table.insert(
                        name.to_string(),
                        OutEntry::Declared {
                            specifier: matched.specifier,
                        },
                    );
                }
            }
        }
        table
    }

    fn patch_consumer(
        &self,
        producer_doc: &mut Document,
        pair: &Pair<'_>,
        out_table: &mut HashMap<String, OutEntry>,
        diagnostics: &mut Diagnostics,
        report: &mut ReconcileReport,
    ) -> ShadelinkResult<()> {
        let consumer_doc = pair.consumer_doc;
        for &declaration in consumer_doc.declarations() {
            let Some(input) =
                self.in_matcher
                    .match_declaration(consumer_doc, declaration, pair.consumer_stage)
            else {
                continue;
            };
            for &member in &input.members {
                let Some(name) = consumer_doc.member_name(member) else {
                    continue;
                };
                if !consumer_doc.is_referenced(name) {
                    continue;
                }
                let Some(in_type) = consumer_doc.type_name(input.specifier) else {
                    continue;
                };

                match out_table.get(name).copied() {
                    None => {
                        let Some(in_numeric) = in_type.numeric() else {
                            diagnostics.report(
                                DiagnosticClass::NonNumericMissing,
                                format!(
                                    "'{}' of type {} is read by {} but not written by {}, and cannot be synthesized",
                                    name, in_type, pair.consumer, pair.producer
                                ),
                            );
                            report.unpatchable.push(pair.patch(name));
                            continue;
                        };
                        self.declare_missing(producer_doc, pair, &input, name, in_numeric)?;
                        out_table.insert(name.to_string(), OutEntry::Resolved);
                        diagnostics.report(
                            DiagnosticClass::MissingOutPatched,
                            format!(
                                "'{}' is read by {} but not written by {}; declared it as an output initialized to zero",
                                name, pair.consumer, pair.producer
                            ),
                        );
                        report.declared.push(pair.patch(name));
                    }
                    Some(OutEntry::Resolved) => {}
                    Some(OutEntry::Declared { specifier }) => {
                        let Some(out_type) = producer_doc.type_name(specifier).cloned() else {
                            continue;
                        };
                        if &out_type == in_type {
                            if producer_doc.occurrences(name) > 1 {
                                continue;
                            }
                            let Some(numeric) = out_type.numeric() else {
                                tracing::debug!(
                                    "output '{}' of type {} in {} is never written",
                                    name,
                                    out_type,
                                    pair.producer
                                );
                                continue;
                            };
                            self.append_initializer(producer_doc, name, numeric)?;
                            out_table.insert(name.to_string(), OutEntry::Resolved);
                            tracing::debug!(
                                "output '{}' in {} is never written; initialized it to zero",
                                name,
                                pair.producer
                            );
                            report.initialized.push(pair.patch(name));
                            continue;
                        }

                        let (Some(out_numeric), Some(in_numeric)) =
                            (out_type.numeric(), in_type.numeric())
                        else {
                            diagnostics.report(
                                DiagnosticClass::TypeMismatchUnpatchable,
                                format!(
                                    "'{}' is written as {} by {} but read as {} by {}",
                                    name, out_type, pair.producer, in_type, pair.consumer
                                ),
                            );
                            report.unpatchable.push(pair.patch(name));
                            continue;
                        };
                        if out_numeric.dimensionality() != in_numeric.dimensionality() {
                            diagnostics.report(
                                DiagnosticClass::DimensionMismatch,
                                format!(
                                    "'{}' is written as {} by {} but read as {} by {}; left for the compiler",
                                    name, out_numeric, pair.producer, in_numeric, pair.consumer
                                ),
                            );
                            report.unpatchable.push(pair.patch(name));
                            continue;
                        }

                        self.alias_swap(
                            producer_doc,
                            pair,
                            &input,
                            name,
                            specifier,
                            out_numeric,
                            in_numeric,
                        )?;
                        out_table.insert(name.to_string(), OutEntry::Resolved);
                        diagnostics.report(
                            DiagnosticClass::TypeMismatchPatched,
                            format!(
                                "'{}' is written as {} by {} but read as {} by {}; converted through '{}{}'",
                                name, out_numeric, pair.producer, in_numeric, pair.consumer, self.prefix, name
                            ),
                        );
                        report.aliased.push(pair.patch(name));
                    }
                }
            }
        }
        Ok(())
    }

    /// `<type>(0)` or the bare zero literal for scalars.
    fn zero_value(doc: &mut Document, ty: NumericType) -> NodeId {
        let zero = doc.literal(ty.zero());
        if ty.is_scalar() {
            zero
        } else {
            let callee = doc.type_specifier(TypeName::Builtin(ty));
            doc.call(callee, vec![zero])
        }
    }

    fn append_initializer(
        &self,
        doc: &mut Document,
        name: &str,
        ty: NumericType,
    ) -> ShadelinkResult<()> {
        let value = Self::zero_value(doc, ty);
        let statement = self.templates.initializer.instantiate(
            doc,
            vec![SlotValue::Identifier(name.to_string()), SlotValue::Node(value)],
        );
        doc.append_to_entry(statement)
    }

    /// Copy of a consumer qualifier set with `in` turned into `out`.
    fn output_qualifier(doc: &mut Document, consumer_doc: &Document, qualifier: NodeId) -> NodeId {
        doc.import_with(consumer_doc, qualifier, &mut |doc, source| {
            match consumer_doc.kind(source) {
                NodeKind::StorageQualifier(StorageQualifier::In) => {
                    Some(doc.alloc(NodeKind::StorageQualifier(StorageQualifier::Out)))
                }
                _ => None,
            }
        })
    }

    fn declare_missing(
        &self,
        producer_doc: &mut Document,
        pair: &Pair<'_>,
        input: &DeclarationMatch,
        name: &str,
        ty: NumericType,
    ) -> ShadelinkResult<()> {
        let qualifier = Self::output_qualifier(producer_doc, pair.consumer_doc, input.qualifier);
        let specifier = producer_doc.import(pair.consumer_doc, input.specifier);
        let identifier = producer_doc.identifier(name);
        let member = producer_doc.alloc(NodeKind::DeclarationMember {
            name: identifier,
            array: None,
            initializer: None,
        });
        let declaration = self.templates.out_declaration.instantiate(
            producer_doc,
            vec![
                SlotValue::Node(qualifier),
                SlotValue::Node(specifier),
                SlotValue::Node(member),
            ],
        );
        producer_doc.insert_before_declarations(declaration)?;
        self.append_initializer(producer_doc, name, ty)
    }

    /// Keep the producer writing its own type into an internal alias and
    /// expose `name` with the consumer's type, converted at the end of the
    /// entry function.
    #[allow(clippy::too_many_arguments)]
    fn alias_swap(
        &self,
        producer_doc: &mut Document,
        pair: &Pair<'_>,
        input: &DeclarationMatch,
        name: &str,
        specifier: NodeId,
        out_type: NumericType,
        in_type: NumericType,
    ) -> ShadelinkResult<()> {
        let alias = format!("{}{}", self.prefix, name);
        producer_doc.rename(name, &alias);

        let declaration = producer_doc
            .ancestor_of(specifier, NodeClass::VariableDeclaration)
            .ok_or_else(|| ShadelinkError::DetachedDeclaration {
                name: name.to_string(),
            })?;
        let member = producer_doc
            .members(declaration)
            .iter()
            .copied()
            .find(|member| producer_doc.member_name(*member) == Some(alias.as_str()))
            .ok_or_else(|| ShadelinkError::MissingOutMember {
                name: name.to_string(),
            })?;
        let renamed = match producer_doc.kind(member) {
            NodeKind::DeclarationMember { name, .. } => *name,
            _ => return Err(ShadelinkError::internal("declaration member expected")),
        };
        let restored = producer_doc.identifier(name);
        producer_doc.replace(renamed, restored)?;

        // Siblings keep the shared type, so the member moves to its own declaration.
        let external_specifier = if producer_doc.members(declaration).len() > 1 {
            let qualifier = producer_doc.qualifier_of(declaration).ok_or_else(|| {
                ShadelinkError::internal(format!("output declaration of '{}' lost its qualifier", name))
            })?;
            producer_doc.detach(member)?;
            let qualifier = producer_doc.clone_node(qualifier);
            let specifier = producer_doc.clone_node(specifier);
            let split = self.templates.out_declaration.instantiate(
                producer_doc,
                vec![
                    SlotValue::Node(qualifier),
                    SlotValue::Node(specifier),
                    SlotValue::Node(member),
                ],
            );
            producer_doc.insert_before_declarations(split)?;
            specifier
        } else {
            specifier
        };

        let internal_type = producer_doc.type_specifier(TypeName::Builtin(out_type));
        let internal = self.templates.internal_declaration.instantiate(
            producer_doc,
            vec![
                SlotValue::Node(internal_type),
                SlotValue::Identifier(alias.clone()),
            ],
        );
        producer_doc.insert_before_declarations(internal)?;

        let template = if in_type.is_vector() && out_type.is_vector() && in_type.width() > out_type.width() {
            &self.templates.widening
        } else {
            &self.templates.conversion
        };
        let constructor = producer_doc.type_specifier(TypeName::Builtin(in_type));
        let assignment = template.instantiate(
            producer_doc,
            vec![
                SlotValue::Identifier(name.to_string()),
                SlotValue::Node(constructor),
                SlotValue::Identifier(alias),
            ],
        );
        producer_doc.append_to_entry(assignment)?;

        let consumer_type = producer_doc.import(pair.consumer_doc, input.specifier);
        producer_doc.replace(external_specifier, consumer_type)
    }
}
