//! Forms: field definitions, validation, CSRF and the submission helper.
//!
//! A form is declared as a [`FormSpec`]. Posting runs [`submit`], which
//! validates every field and either hands the typed model to a callback or
//! queues a single notification listing every problem.

pub mod csrf;
mod fields;
mod submit;

pub use csrf::{CSRF_FIELD, generate_csrf_token, verify_csrf_token};
pub use fields::{
    FieldKind, FieldSpec, FieldView, FormSpec, FormValues, OptionView, Rule, SelectOption,
    ValidationError,
};
pub use submit::{
    DefaultLabels, FormContext, LabelResolver, SubmitOutcome, default_label_key, submit,
    validation_notification,
};
