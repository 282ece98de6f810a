//! Declarative form fields, validation rules and posted values.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::ListItem;
use crate::i18n::Translations;

/// Loose address check: something@something.tld, no spaces.
#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex literal")
});

/// Input kind of a field; decides rendering and value conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Password,
    Textarea,
    /// Dropdown. `numeric` values are sent to the API as integers.
    Select {
        options: Vec<SelectOption>,
        numeric: bool,
    },
    Checkbox,
}

impl FieldKind {
    fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Password => "password",
            FieldKind::Textarea => "textarea",
            FieldKind::Select { .. } => "select",
            FieldKind::Checkbox => "checkbox",
        }
    }
}

/// One dropdown entry; the label is a translation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label_key: String,
}

impl SelectOption {
    /// Options from an API dropdown.
    pub fn from_list(items: &[ListItem]) -> Vec<Self> {
        items
            .iter()
            .map(|item| SelectOption {
                value: item.id.clone(),
                label_key: item
                    .name_translation_key
                    .clone()
                    .unwrap_or_else(|| item.id.clone()),
            })
            .collect()
    }
}

/// A validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    MinLength(usize),
    Email,
}

/// Definition of one form field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Posted name, matching the model's camelCase field.
    pub name: String,
    pub kind: FieldKind,
    pub rules: Vec<Rule>,
    /// Explicit label key; derived from the name when absent.
    pub label_key: Option<String>,
    pub readonly: bool,
}

impl FieldSpec {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            rules: Vec::new(),
            label_key: None,
            readonly: false,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// Text input validated as an address.
    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Email).rule(Rule::Email)
    }

    pub fn password(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Password)
    }

    pub fn textarea(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Textarea)
    }

    pub fn select(name: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::new(
            name,
            FieldKind::Select {
                options,
                numeric: false,
            },
        )
    }

    pub fn numeric_select(name: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::new(
            name,
            FieldKind::Select {
                options,
                numeric: true,
            },
        )
    }

    pub fn checkbox(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Checkbox)
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn required(self) -> Self {
        self.rule(Rule::Required)
    }

    pub fn min_length(self, min: usize) -> Self {
        self.rule(Rule::MinLength(min))
    }

    pub fn label(mut self, key: impl Into<String>) -> Self {
        self.label_key = Some(key.into());
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }

    /// Translated message of the first rule `value` breaks.
    fn check(&self, value: &str, t: &Translations) -> Option<String> {
        let value = value.trim();
        for rule in &self.rules {
            match rule {
                Rule::Required if value.is_empty() => {
                    let key = match self.kind {
                        FieldKind::Select { .. } => "Validation_DropDown_Required",
                        _ => "Validation_Input_Required",
                    };
                    return Some(t.t(key));
                }
                // Length and format only apply to filled-in values
                Rule::MinLength(min) if !value.is_empty() && value.chars().count() < *min => {
                    return Some(t.t_with(
                        "Validation_Input_MinLength",
                        &[("min", &min.to_string())],
                    ));
                }
                Rule::Email if !value.is_empty() && !EMAIL.is_match(value) => {
                    return Some(t.t("Validation_Email_Invalid"));
                }
                _ => {}
            }
        }
        None
    }
}

/// A form: ordered fields.
#[derive(Debug, Clone)]
pub struct FormSpec {
    pub form_id: String,
    pub fields: Vec<FieldSpec>,
}

impl FormSpec {
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check every field, in form order.
    pub fn validate(&self, values: &FormValues, t: &Translations) -> Vec<ValidationError> {
        self.fields
            .iter()
            .filter(|field| !field.readonly)
            .filter_map(|field| {
                field
                    .check(values.get(&field.name), t)
                    .map(|message| ValidationError::field(&field.name, message))
            })
            .collect()
    }
}

/// A failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    /// Translated message.
    pub message: String,
}

impl ValidationError {
    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: name.into(),
            message: message.into(),
        }
    }
}

/// Raw posted values, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, String>);

impl FormValues {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self(values.into_iter().collect())
    }

    /// Value of `name`, empty when not posted.
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Values pre-filled from a record, for edit forms.
    ///
    /// Strings, numbers and booleans are kept; nulls become empty.
    pub fn from_record(record: &impl Serialize) -> Self {
        let mut values = BTreeMap::new();
        if let Ok(Value::Object(map)) = serde_json::to_value(record) {
            for (key, value) in map {
                let text = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(true) => "true".to_string(),
                    Value::Bool(false) | Value::Null => String::new(),
                    _ => continue,
                };
                values.insert(key, text);
            }
        }
        Self(values)
    }

    /// Overlay the values of `spec`'s fields on `base` as typed JSON.
    ///
    /// Readonly fields are left as `base` has them.
    pub fn apply_to(&self, spec: &FormSpec, base: Value) -> Value {
        let mut object = match base {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for field in spec.fields.iter().filter(|f| !f.readonly) {
            let raw = self.get(&field.name).trim();
            let value = match &field.kind {
                FieldKind::Checkbox => Value::Bool(matches!(raw, "on" | "true" | "1")),
                _ if raw.is_empty() => Value::Null,
                FieldKind::Select { numeric: true, .. } => raw
                    .parse::<i64>()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                _ => Value::String(raw.to_string()),
            };
            object.insert(field.name.clone(), value);
        }
        Value::Object(object)
    }
}

/// Template view of one field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub kind: &'static str,
    pub value: String,
    pub checked: bool,
    pub options: Vec<OptionView>,
    pub required: bool,
    pub readonly: bool,
    pub invalid: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl FieldSpec {
    pub(crate) fn view(
        &self,
        label: String,
        values: &FormValues,
        errors: &[ValidationError],
        t: &Translations,
    ) -> FieldView {
        let value = values.get(&self.name).to_string();
        let options = match &self.kind {
            FieldKind::Select { options, .. } => options
                .iter()
                .map(|o| OptionView {
                    value: o.value.clone(),
                    label: t.t(&o.label_key),
                    selected: o.value == value,
                })
                .collect(),
            _ => Vec::new(),
        };
        FieldView {
            name: self.name.clone(),
            label,
            kind: self.kind.as_str(),
            checked: matches!(value.as_str(), "on" | "true" | "1"),
            value,
            options,
            required: self.is_required(),
            readonly: self.readonly,
            invalid: errors.iter().any(|e| e.field == self.name),
        }
    }
}
