#![allow(clippy::needless_return)]

mod excel_validator;
mod rules;
mod sheet;
mod staging;
pub mod utils;

// Test utilities - only compiled when testing or with test feature
// #[cfg(test)] alone doesn't work for integration tests (they're external crates)
// The feature flag makes it available to integration tests via dev-dependencies
#[cfg(any(test, feature = "test"))]
pub mod test_utils;

pub use excel_validator::{
    ExcelValidator, ExcelValidatorBuilder, RowOutcome, ValidationResult, ValidationStatus,
    ValidatorError,
};
pub use rules::{
    EmailRule, FieldOutcome, InSetRule, NumericRule, RequiredRule, Rule, RuleDescriptor,
    RuleEngine, RuleOutcome, RuleSpec,
};
pub use sheet::{RawRow, SheetData, XlsxSource};
pub use staging::{ACCEPTED_CONTENT_TYPES, IncomingFile, StagedFile, stage};

pub const ERRORS_LOG_FILE: &str = "errors.log";
