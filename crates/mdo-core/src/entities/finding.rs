use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{Severity, ValidationStatus};

/// One rule violation or advisory. Pure value object.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ValidationFinding {
    pub file_id: String,
    pub row_index: usize,
    /// Canonical field (or source column) the finding is tagged with.
    pub column_name: String,
    pub severity: Severity,
    pub rule_id: String,
    pub description: String,
    /// Offending value as read, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationFinding {
    #[must_use]
    pub fn new(
        file_id: impl Into<String>,
        row_index: usize,
        column_name: impl Into<String>,
        severity: Severity,
        rule_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            row_index,
            column_name: column_name.into(),
            severity,
            rule_id: rule_id.into(),
            description: description.into(),
            value: None,
            suggestion: None,
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Stable ordering: file, row, field, rule.
    #[must_use]
    pub fn location_cmp(&self, other: &Self) -> Ordering {
        self.file_id
            .cmp(&other.file_id)
            .then(self.row_index.cmp(&other.row_index))
            .then_with(|| self.column_name.cmp(&other.column_name))
            .then_with(|| self.rule_id.cmp(&other.rule_id))
    }
}

/// Per-severity finding counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SeverityCounts {
    pub blocker: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    #[must_use]
    pub fn tally(findings: &[ValidationFinding]) -> Self {
        findings.iter().fold(Self::default(), |mut acc, f| {
            match f.severity {
                Severity::Blocker => acc.blocker += 1,
                Severity::Warning => acc.warning += 1,
                Severity::Info => acc.info += 1,
            }
            acc
        })
    }
}

/// Outcome of one validation attempt for a run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ValidationResult {
    pub id: String,
    pub run_id: String,
    pub status: ValidationStatus,
    pub blocker_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    /// Findings in evaluation order.
    pub findings: Vec<ValidationFinding>,
    pub created_at: DateTime<Utc>,
}

impl ValidationResult {
    /// Build a result, deriving counts and status from `findings`.
    ///
    /// The status is `passed` if and only if there are no blockers.
    #[must_use]
    pub fn from_findings(
        id: String,
        run_id: String,
        findings: Vec<ValidationFinding>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let counts = SeverityCounts::tally(&findings);
        let status = if counts.blocker == 0 {
            ValidationStatus::Passed
        } else {
            ValidationStatus::Failed
        };
        Self {
            id,
            run_id,
            status,
            blocker_count: counts.blocker,
            warning_count: counts.warning,
            info_count: counts.info,
            findings,
            created_at,
        }
    }

    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.status, ValidationStatus::Passed)
    }
}
