//! # Catalog
//!
//! Everything the intake form knows about its own fields, with no I/O.
//!
//! ## Pipeline
//!
//! - Raw urlencoded pairs are decoded into a [`FormRecord`] (every field a string, bool or list of strings)
//!   plus the [`OtherValues`] side table holding the free text typed next to an "Other" checkbox.
//! - [`validate`] runs the per-field shape checks, then the cross-field rules, and either returns a typed
//!   [`ValidatedRecord`] or every error it found alongside the untouched input.
//! - [`prepare`] turns a [`ValidatedRecord`] into the payload the store RPC expects: one flat row for
//!   `protests` and one `{id, other}` list per junction table.
//! - [`hydrate`] goes the other way, from a stored record back to display values for edit/autofill.
//!
//! ## Slot 0
//!
//! Option identifiers are numeric strings in the form layer. Identifier `0` is reserved for "Other" and
//! its text is never stored on the option itself, only in [`OtherValues`], one value per category.

pub mod fields;
pub mod mapping;
pub mod models;
pub mod prepare;
pub mod utils;
pub mod validation;

pub use fields::{FormRecord, Incident, MultiSelect, OtherValues, default_record};
pub use mapping::{FormSubmission, clear, hydrate};
pub use models::{LookupOption, OptionLink, ProtestRecord, ProtestRow, StateOption};
pub use prepare::{JunctionEntry, OptionRef, ProtestData, SubmissionPayload, prepare};
pub use validation::{
    FieldErrors, InPersonRule, IncidentReport, IncidentStatus, Submission, ValidatedRecord,
    ValidationFailure, validate,
};
