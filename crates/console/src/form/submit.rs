//! Validate-then-submit cycle with one aggregated error notification.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_sessions::Session;
use tracing::{debug, warn};

use super::csrf::{CSRF_FIELD, verify_csrf_token};
use super::fields::{FieldView, FormSpec, FormValues, ValidationError};
use crate::i18n::Translations;
use crate::notify::{self, Notification};

/// Fields labelled with the combined culture-specific label.
const TRANSLATION_VALUE_FIELDS: [&str; 2] = ["nameTranslationValue", "descriptionTranslationValue"];

/// Maps a field name to its translated label.
pub trait LabelResolver: Send + Sync {
    fn label(&self, field: &str, t: &Translations) -> String;
}

/// `Label_` + the field name with its first character upper-cased.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLabels;

impl LabelResolver for DefaultLabels {
    fn label(&self, field: &str, t: &Translations) -> String {
        t.t(&default_label_key(field))
    }
}

impl<F> LabelResolver for F
where
    F: Fn(&str, &Translations) -> String + Send + Sync,
{
    fn label(&self, field: &str, t: &Translations) -> String {
        self(field, t)
    }
}

/// Label key derived from a field name: "email" -> "Label_Email".
pub fn default_label_key(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("Label_{}{}", first.to_uppercase(), chars.as_str()),
        None => "Label_".to_string(),
    }
}

/// What labels and messages are rendered with.
pub struct FormContext<'a> {
    pub t: &'a Translations,
    /// Display name of the active culture, for the combined label.
    pub culture_name: &'a str,
    pub labels: &'a dyn LabelResolver,
}

impl<'a> FormContext<'a> {
    pub fn new(t: &'a Translations, culture_name: &'a str) -> Self {
        Self {
            t,
            culture_name,
            labels: &DefaultLabels,
        }
    }

    pub fn with_labels(mut self, labels: &'a dyn LabelResolver) -> Self {
        self.labels = labels;
        self
    }

    /// Label of `field` as shown to the user.
    pub fn label_for(&self, spec: &FormSpec, field: &str) -> String {
        if TRANSLATION_VALUE_FIELDS.contains(&field) {
            return self.t.t_with(
                "Label_NameTranslationValue",
                &[("cultureName", self.culture_name)],
            );
        }
        match spec.get(field).and_then(|f| f.label_key.as_deref()) {
            Some(key) => self.t.t(key),
            None => self.labels.label(field, self.t),
        }
    }

    /// Views of every field of `spec`, for templates.
    pub fn field_views(
        &self,
        spec: &FormSpec,
        values: &FormValues,
        errors: &[ValidationError],
    ) -> Vec<FieldView> {
        spec.fields
            .iter()
            .map(|field| field.view(self.label_for(spec, &field.name), values, errors, self.t))
            .collect()
    }
}

/// The single notification listing every failing field, if any.
///
/// One line per error: `"{label}: {message}"`.
pub fn validation_notification(
    spec: &FormSpec,
    errors: &[ValidationError],
    ctx: &FormContext<'_>,
) -> Option<Notification> {
    if errors.is_empty() {
        return None;
    }
    let lines = errors.iter().map(|e| {
        let message = if e.message.is_empty() {
            ctx.t.t("Validation_Input_Required")
        } else {
            e.message.clone()
        };
        format!("{}: {}", ctx.label_for(spec, &e.field), message)
    });
    Some(Notification::error(ctx.t.t("Validation_Required_Fields")).with_lines(lines))
}

/// Outcome of [`submit`].
#[derive(Debug)]
pub enum SubmitOutcome<R> {
    /// Values were valid; carries the callback's result.
    Submitted(R),
    /// Nothing was submitted. The notification is already queued.
    Rejected {
        errors: Vec<ValidationError>,
        notification: Notification,
    },
}

impl<R> SubmitOutcome<R> {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

/// Run the validate-then-submit cycle.
///
/// Verifies the CSRF token, validates every field, overlays the values on
/// `base` and deserializes the result into `T`, then calls `on_success`.
/// Any failure queues exactly one error notification in the session and
/// returns [`SubmitOutcome::Rejected`]; `on_success` is not called.
pub async fn submit<T, F, Fut, R>(
    session: &Session,
    spec: &FormSpec,
    values: &FormValues,
    base: Value,
    ctx: &FormContext<'_>,
    on_success: F,
) -> SubmitOutcome<R>
where
    T: DeserializeOwned,
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = R>,
{
    let csrf_ok = match verify_csrf_token(session, values.get(CSRF_FIELD)).await {
        Ok(ok) => ok,
        Err(e) => {
            warn!(error = %e, form = %spec.form_id, "CSRF verification failed");
            false
        }
    };
    if !csrf_ok {
        return reject(session, Vec::new(), Notification::error(ctx.t.t("Error_FormExpired"))).await;
    }

    let errors = spec.validate(values, ctx.t);
    if let Some(notification) = validation_notification(spec, &errors, ctx) {
        debug!(form = %spec.form_id, count = errors.len(), "form validation failed");
        return reject(session, errors, notification).await;
    }

    let model: T = match serde_json::from_value(values.apply_to(spec, base)) {
        Ok(model) => model,
        Err(e) => {
            warn!(error = %e, form = %spec.form_id, "form values do not fit the model");
            return reject(session, Vec::new(), Notification::error(ctx.t.t("Error_InvalidForm")))
                .await;
        }
    };

    SubmitOutcome::Submitted(on_success(model).await)
}

async fn reject<R>(
    session: &Session,
    errors: Vec<ValidationError>,
    notification: Notification,
) -> SubmitOutcome<R> {
    notify::push(session, notification.clone()).await;
    SubmitOutcome::Rejected {
        errors,
        notification,
    }
}
