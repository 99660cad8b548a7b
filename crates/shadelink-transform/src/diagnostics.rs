//! Compatibility diagnostics with per-class throttling.

use std::collections::BTreeMap;

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticClass {
    UnusedFunction,
    ConstStripped,
    EmptyDeclaration,
    MissingOutPatched,
    NonNumericMissing,
    DimensionMismatch,
    TypeMismatchPatched,
    TypeMismatchUnpatchable,
    PrefixCollision,
}

impl DiagnosticClass {
    /// Classes where only the first report is shown unless verbose output is on.
    pub fn is_throttled(self) -> bool {
        matches!(
            self,
            DiagnosticClass::UnusedFunction | DiagnosticClass::ConstStripped
        )
    }

    fn label(self) -> &'static str {
        match self {
            DiagnosticClass::UnusedFunction => "unused function removed",
            DiagnosticClass::ConstStripped => "const qualifier stripped",
            DiagnosticClass::EmptyDeclaration => "empty declaration removed",
            DiagnosticClass::MissingOutPatched => "missing output patched",
            DiagnosticClass::NonNumericMissing => "non-numeric output missing",
            DiagnosticClass::DimensionMismatch => "dimension mismatch",
            DiagnosticClass::TypeMismatchPatched => "type mismatch patched",
            DiagnosticClass::TypeMismatchUnpatchable => "type mismatch left unpatched",
            DiagnosticClass::PrefixCollision => "reserved prefix collision",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub class: DiagnosticClass,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
        };
        write!(f, "{prefix}: {}: {}", self.class.label(), self.message)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counter {
    reported: usize,
    suppressed: usize,
}

/// Diagnostics of one transformation run.
///
/// Every emitted diagnostic goes to `tracing` and is kept for inspection.
/// Throttled classes report their first occurrence and, unless verbose,
/// only count the rest until [`Diagnostics::finish`] summarizes them.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    verbose: bool,
    counters: BTreeMap<DiagnosticClass, Counter>,
    emitted: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            ..Self::default()
        }
    }

    pub fn report(&mut self, class: DiagnosticClass, message: impl Into<String>) {
        let counter = self.counters.entry(class).or_default();
        if class.is_throttled() && counter.reported > 0 && !self.verbose {
            counter.suppressed += 1;
            return;
        }
        counter.reported += 1;
        self.emit(DiagnosticSeverity::Warning, class, message.into());
    }

    fn emit(&mut self, severity: DiagnosticSeverity, class: DiagnosticClass, message: String) {
        let diagnostic = Diagnostic {
            severity,
            class,
            message,
        };
        match severity {
            DiagnosticSeverity::Warning => tracing::warn!("{}", diagnostic),
            DiagnosticSeverity::Info => tracing::info!("{}", diagnostic),
        }
        self.emitted.push(diagnostic);
    }

    /// Emit one summary per class with suppressed reports and reset the counts.
    pub fn finish(&mut self) {
        let pending: Vec<(DiagnosticClass, usize)> = self
            .counters
            .iter_mut()
            .filter(|(_, counter)| counter.suppressed > 0)
            .map(|(class, counter)| (*class, std::mem::take(&mut counter.suppressed)))
            .collect();
        for (class, suppressed) in pending {
            self.emit(
                DiagnosticSeverity::Info,
                class,
                format!(
                    "{} further occurrence(s) suppressed; enable verbose diagnostics to see all",
                    suppressed
                ),
            );
        }
    }

    pub fn emitted(&self) -> &[Diagnostic] {
        &self.emitted
    }

    /// Warnings emitted for `class`.
    pub fn warnings(&self, class: DiagnosticClass) -> usize {
        self.emitted
            .iter()
            .filter(|d| d.class == class && d.severity == DiagnosticSeverity::Warning)
            .count()
    }

    pub fn suppressed(&self, class: DiagnosticClass) -> usize {
        self.counters.get(&class).map_or(0, |counter| counter.suppressed)
    }

    pub fn has_warnings(&self) -> bool {
        self.emitted
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttled_class_reports_first_only() {
        let mut diagnostics = Diagnostics::new(false);
        diagnostics.report(DiagnosticClass::UnusedFunction, "removed 'a'");
        diagnostics.report(DiagnosticClass::UnusedFunction, "removed 'b'");
        diagnostics.report(DiagnosticClass::UnusedFunction, "removed 'c'");
        assert_eq!(diagnostics.warnings(DiagnosticClass::UnusedFunction), 1);
        assert_eq!(diagnostics.suppressed(DiagnosticClass::UnusedFunction), 2);

        diagnostics.finish();
        assert_eq!(diagnostics.suppressed(DiagnosticClass::UnusedFunction), 0);
        let last = diagnostics.emitted().last().unwrap();
        assert_eq!(last.severity, DiagnosticSeverity::Info);
        assert!(last.message.starts_with("2 further"));
    }

    #[test]
    fn test_verbose_reports_everything() {
        let mut diagnostics = Diagnostics::new(true);
        diagnostics.report(DiagnosticClass::ConstStripped, "a");
        diagnostics.report(DiagnosticClass::ConstStripped, "b");
        diagnostics.finish();
        assert_eq!(diagnostics.warnings(DiagnosticClass::ConstStripped), 2);
        assert_eq!(diagnostics.emitted().len(), 2);
    }

    #[test]
    fn test_unthrottled_classes_always_report() {
        let mut diagnostics = Diagnostics::new(false);
        diagnostics.report(DiagnosticClass::DimensionMismatch, "color");
        diagnostics.report(DiagnosticClass::DimensionMismatch, "normal");
        assert_eq!(diagnostics.warnings(DiagnosticClass::DimensionMismatch), 2);
        assert!(diagnostics.has_warnings());
    }

    #[test]
    fn test_display_includes_class_label() {
        let diagnostic = Diagnostic {
            severity: DiagnosticSeverity::Warning,
            class: DiagnosticClass::MissingOutPatched,
            message: "'foo' in fragment".into(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "warning: missing output patched: 'foo' in fragment"
        );
    }
}
