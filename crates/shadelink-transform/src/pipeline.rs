//! The set of stage documents processed together and the full pass over it.

use std::collections::BTreeMap;

use shadelink_ast::Document;
use shadelink_core::{PatchStage, ShaderStage, ShadelinkConfig, ShadelinkResult};

use crate::diagnostics::Diagnostics;
use crate::normalize::{normalize, NormalizeReport};
use crate::reconcile::{reconcile, ReconcileReport};

/// Stage documents of one shader program, keyed by patch stage.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    documents: BTreeMap<PatchStage, Document>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stage: PatchStage, document: Document) -> Self {
        self.documents.insert(stage, document);
        self
    }

    /// Insert a document, returning the one it replaces.
    pub fn insert(&mut self, stage: PatchStage, document: Document) -> Option<Document> {
        self.documents.insert(stage, document)
    }

    pub fn get(&self, stage: PatchStage) -> Option<&Document> {
        self.documents.get(&stage)
    }

    pub fn get_mut(&mut self, stage: PatchStage) -> Option<&mut Document> {
        self.documents.get_mut(&stage)
    }

    pub fn remove(&mut self, stage: PatchStage) -> Option<Document> {
        self.documents.remove(&stage)
    }

    pub(crate) fn take(&mut self, stage: PatchStage) -> Option<Document> {
        self.remove(stage)
    }

    pub fn contains(&self, stage: PatchStage) -> bool {
        self.documents.contains_key(&stage)
    }

    /// Whether any variant of `stage` is present.
    pub fn has_stage(&self, stage: ShaderStage) -> bool {
        stage.variants().iter().any(|variant| self.contains(*variant))
    }

    /// The variant whose outputs feed the next stage: the first present one.
    pub fn producer_variant(&self, stage: ShaderStage) -> Option<PatchStage> {
        stage
            .variants()
            .iter()
            .copied()
            .find(|variant| self.contains(*variant))
    }

    pub fn stages(&self) -> impl Iterator<Item = PatchStage> + '_ {
        self.documents.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatchStage, &Document)> {
        self.documents.iter().map(|(stage, doc)| (*stage, doc))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Everything one [`transform_pipeline`] run did.
#[derive(Debug, Clone, Default)]
pub struct TransformReport {
    pub normalized: BTreeMap<PatchStage, NormalizeReport>,
    pub reconciled: ReconcileReport,
    pub diagnostics: Diagnostics,
}

/// Normalize every stage document, then reconcile the stage interfaces.
pub fn transform_pipeline(
    pipeline: &mut Pipeline,
    config: &ShadelinkConfig,
) -> ShadelinkResult<TransformReport> {
    let mut report = TransformReport {
        diagnostics: Diagnostics::new(config.verbose_diagnostics),
        ..TransformReport::default()
    };
    tracing::info!("Transforming {} stage document(s)", pipeline.len());

    for (stage, doc) in pipeline.documents.iter_mut() {
        doc.set_entry_point(config.entry_point.as_str());
        tracing::debug!("Normalizing {}", stage);
        let normalized = normalize(doc, &config.normalize, &mut report.diagnostics)?;
        report.normalized.insert(*stage, normalized);
    }

    report.reconciled = reconcile(pipeline, config, &mut report.diagnostics)?;
    report.diagnostics.finish();

    tracing::info!(
        "Declared {} output(s), initialized {}, converted {}",
        report.reconciled.declared.len(),
        report.reconciled.initialized.len(),
        report.reconciled.aliased.len()
    );
    Ok(report)
}
