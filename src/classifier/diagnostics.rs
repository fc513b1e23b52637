use std::fmt;

/// Severity of a collected diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    /// Informational record for a major pipeline step.
    Info,
    /// Borderline condition that did not change the outcome.
    Warning,
    /// A contained failure (per-column check, table creation).
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Info => write!(f, "INFO"),
            DiagnosticLevel::Warning => write!(f, "WARNING"),
            DiagnosticLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// One collected diagnostic record.
#[derive(Debug, Clone)]
pub struct DiagnosticRecord {
    /// Severity of the record.
    pub level: DiagnosticLevel,
    /// Human-readable message.
    pub message: String,
}

/// Explicitly passed diagnostics collector.
///
/// Every record is forwarded to `tracing` and kept in memory so callers and
/// tests can inspect exactly what a run reported, without process-wide
/// logger state.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Vec<DiagnosticRecord>,
}

impl Diagnostics {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an informational message.
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.records.push(DiagnosticRecord {
            level: DiagnosticLevel::Info,
            message,
        });
    }

    /// Record a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.records.push(DiagnosticRecord {
            level: DiagnosticLevel::Warning,
            message,
        });
    }

    /// Record a contained error.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.records.push(DiagnosticRecord {
            level: DiagnosticLevel::Error,
            message,
        });
    }

    /// All records in emission order.
    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    /// Records at warning level.
    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records
            .iter()
            .filter(|r| r.level == DiagnosticLevel::Warning)
    }

    /// Records at error level.
    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records
            .iter()
            .filter(|r| r.level == DiagnosticLevel::Error)
    }
}
