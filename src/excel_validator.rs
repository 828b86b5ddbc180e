use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::rules::{Rule, RuleEngine, RuleSpec};
use crate::sheet::{RawRow, SheetData, XlsxSource};
use crate::staging::{self, IncomingFile};
use crate::utils::{DEFAULT_REPLACEMENT, normalize_header_with, write_error_to_log};

/// Fatal, run-terminating failures: nothing row-level has been produced
/// when one of these is returned, and any staged file has already been
/// released
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Invalid File Type. Upload Excel File.")]
    InvalidFileType,

    #[error("Failed to stage the uploaded file: {0}")]
    Upload(#[from] std::io::Error),

    #[error("Failed to read the Excel file: {0}")]
    Read(String),

    #[error("Unknown validation rule `{0}`")]
    UnknownRule(String),
}

/// Overall status of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Success,
    Error,
}

/// Sanitized values for the rule-declared columns of one row, in rule
/// declaration order, plus that row's failure messages
///
/// A failing field is `None`; the row itself is never dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    pub values: IndexMap<String, Option<String>>,
    pub errors: Vec<String>,
}

/// Final result of a validation run that got past parsing
///
/// `data` holds one entry per input row in original order even when the
/// status is `Error`. Serializes to the `{status, errors, data}` shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub errors: Vec<String>,
    pub data: Vec<IndexMap<String, Option<String>>>,
}

impl ValidationResult {
    pub fn is_success(&self) -> bool {
        self.status == ValidationStatus::Success
    }
}

/// Configures and builds an [`ExcelValidator`]
pub struct ExcelValidatorBuilder {
    replacement: char,
    include_undeclared: bool,
    engine: RuleEngine,
}

impl ExcelValidatorBuilder {
    pub fn new() -> Self {
        ExcelValidatorBuilder {
            replacement: DEFAULT_REPLACEMENT,
            include_undeclared: false,
            engine: RuleEngine::with_builtins(),
        }
    }

    /// Character substituted for non-alphanumeric header characters
    /// during canonicalization (default underscore)
    pub fn replacement_char(mut self, replacement: char) -> Self {
        self.replacement = replacement;
        self
    }

    /// Also pass columns without a declared rule through to the row data
    /// as raw values (default: only rule-declared columns are emitted)
    pub fn include_undeclared_columns(mut self, include: bool) -> Self {
        self.include_undeclared = include;
        self
    }

    /// Register a custom rule alongside the built-ins
    pub fn register_rule(mut self, name: &str, rule: Box<dyn Rule>) -> Self {
        self.engine.register(name, rule);
        self
    }

    pub fn build(self) -> ExcelValidator {
        ExcelValidator {
            replacement: self.replacement,
            include_undeclared: self.include_undeclared,
            engine: self.engine,
        }
    }
}

impl Default for ExcelValidatorBuilder {
    fn default() -> Self {
        ExcelValidatorBuilder::new()
    }
}

/// Validates uploaded spreadsheets against a [`RuleSpec`]
///
/// Holds only immutable configuration, so one instance per call (or a
/// shared reference across calls) is safe; all per-run state lives on the
/// stack of [`ExcelValidator::validate`].
pub struct ExcelValidator {
    replacement: char,
    include_undeclared: bool,
    engine: RuleEngine,
}

impl ExcelValidator {
    /// Validator with default configuration and the built-in rule set
    pub fn new() -> Self {
        ExcelValidatorBuilder::new().build()
    }

    pub fn builder() -> ExcelValidatorBuilder {
        ExcelValidatorBuilder::new()
    }

    /// Run the full pipeline against an uploaded file
    ///
    /// Sequence: rule-spec check, content-type gate, staging, workbook
    /// read, row-by-row validation, result assembly. The staged temporary
    /// file is removed before this returns on every path, error branches
    /// included.
    pub fn validate(
        &self,
        upload: &IncomingFile,
        spec: &RuleSpec,
    ) -> Result<ValidationResult, ValidatorError> {
        self.engine.check_spec(spec)?;

        let staged = staging::stage(upload)?;
        let sheet = XlsxSource::load(staged.path())?;

        Ok(self.validate_sheet(&sheet, spec))
        // `staged` drops here, releasing the temporary file
    }

    /// Validate already-parsed sheet data
    ///
    /// This is the whole pipeline minus staging and file parsing; callers
    /// that obtain rows some other way (or tests) enter here.
    pub fn validate_sheet(&self, sheet: &SheetData, spec: &RuleSpec) -> ValidationResult {
        let headers: Vec<String> = sheet
            .headers
            .iter()
            .map(|cell| normalize_header_with(cell, self.replacement))
            .collect();

        // Key -> column index. Later duplicates overwrite earlier ones, so
        // on a duplicate normalized header the later column shadows the
        // earlier one. Documented limitation, kept for compatibility.
        let mut columns: HashMap<&str, usize> = HashMap::new();
        for (index, key) in headers.iter().enumerate() {
            columns.insert(key.as_str(), index);
        }

        let outcomes: Vec<RowOutcome> = sheet
            .rows
            .iter()
            .map(|row| self.validate_row(row, &headers, &columns, spec))
            .collect();

        self.assemble(outcomes)
    }

    /// Validate one row against every declared rule, in declaration order
    fn validate_row(
        &self,
        row: &RawRow,
        headers: &[String],
        columns: &HashMap<&str, usize>,
        spec: &RuleSpec,
    ) -> RowOutcome {
        let mut values = IndexMap::new();
        let mut errors = Vec::new();

        for (key, descriptors) in spec.iter() {
            // A key with no matching column resolves to the empty string
            // for every row rather than failing the run
            let value = columns.get(key.as_str()).map(|&i| row.cell(i)).unwrap_or("");

            let outcome = self.engine.evaluate(key, value, descriptors);

            if outcome.failures.is_empty() {
                values.insert(key.clone(), Some(outcome.sanitized));
            } else {
                for failure in outcome.failures {
                    errors.push(format!("{} at row {}", failure, row.number));
                }
                values.insert(key.clone(), None);
            }
        }

        if self.include_undeclared {
            for (index, key) in headers.iter().enumerate() {
                if !values.contains_key(key) {
                    values.insert(key.clone(), Some(row.cell(index).to_string()));
                }
            }
        }

        RowOutcome { values, errors }
    }

    /// Package per-row outcomes into the final result
    ///
    /// Messages keep row order, and within a row, rule declaration order.
    /// Failed rows are not discarded - their data stays, with failing
    /// fields nulled. A non-empty error list is also appended to the
    /// errors log.
    fn assemble(&self, outcomes: Vec<RowOutcome>) -> ValidationResult {
        let mut errors = Vec::new();
        let mut data = Vec::with_capacity(outcomes.len());

        for outcome in outcomes {
            errors.extend(outcome.errors);
            data.push(outcome.values);
        }

        let status = if errors.is_empty() {
            ValidationStatus::Success
        } else {
            ValidationStatus::Error
        };

        if !errors.is_empty() {
            write_error_to_log(
                "Excel Validation Error Report",
                &format_validation_report(&errors),
            );
        }

        ValidationResult {
            status,
            errors,
            data,
        }
    }
}

impl Default for ExcelValidator {
    fn default() -> Self {
        ExcelValidator::new()
    }
}

/// Format accumulated failure messages for the errors log
fn format_validation_report(errors: &[String]) -> String {
    let mut report = String::new();

    report.push_str("=============================\n");
    report.push_str(&format!("Total validation errors: {}\n", errors.len()));

    for error in errors {
        report.push_str(&format!("  - {}\n", error));
    }

    report
}
