//! Issue forms: schema, validation, and the issue-body wire format.
//!
//! An [`IssueForm`] mirrors the structure of a GitHub issue-form template
//! (`.github/ISSUE_TEMPLATE/*.yml`) so it can be rendered directly with
//! `serde_yaml`. A [`FormSubmission`] holds the values a requester entered,
//! keyed by field id.
//!
//! ## Issue body format
//!
//! GitHub renders a submitted form as one section per field:
//!
//! ```text
//! ### Repository Name
//!
//! sample-svc
//!
//! ### Branch Protection
//!
//! - [X] Enforce for admins
//! - [ ] Require review
//! ```
//!
//! Empty optional fields render as `_No response_`.
//! [`IssueForm::render_body`] produces this format and
//! [`IssueForm::parse_body`] reads it back.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{FieldId, LabelName};

#[cfg(test)]
#[path = "form_tests.rs"]
mod tests;

/// Placeholder GitHub writes for an optional field left empty.
pub const NO_RESPONSE: &str = "_No response_";

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// A structured issue template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueForm {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<LabelName>,
    pub body: Vec<FormElement>,
}

/// Constraints on a field value, checked at submission time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validations {
    /// Text fields must be non-blank; dropdowns need exactly one selection;
    /// checkbox groups need at least one checked option.
    #[serde(default)]
    pub required: bool,

    /// Regular expression the whole text value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Maximum text length in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Display attributes shared by text fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAttributes {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownAttributes {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownAttributes {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Vec<String>,
    #[serde(default)]
    pub multiple: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxOption {
    pub label: String,
    /// This particular option must be checked.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxesAttributes {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Vec<CheckboxOption>,
}

/// One element of a form body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormElement {
    /// Static text shown to the requester; carries no value.
    Markdown { attributes: MarkdownAttributes },

    /// Single-line text.
    Input {
        id: FieldId,
        attributes: TextAttributes,
        #[serde(default)]
        validations: Validations,
    },

    /// Multi-line text.
    Textarea {
        id: FieldId,
        attributes: TextAttributes,
        #[serde(default)]
        validations: Validations,
    },

    /// Choice among fixed options.
    Dropdown {
        id: FieldId,
        attributes: DropdownAttributes,
        #[serde(default)]
        validations: Validations,
    },

    /// A group of independent checkboxes.
    Checkboxes {
        id: FieldId,
        attributes: CheckboxesAttributes,
        #[serde(default)]
        validations: Validations,
    },
}

impl FormElement {
    /// The field id, or `None` for markdown.
    pub fn id(&self) -> Option<&FieldId> {
        match self {
            FormElement::Markdown { .. } => None,
            FormElement::Input { id, .. }
            | FormElement::Textarea { id, .. }
            | FormElement::Dropdown { id, .. }
            | FormElement::Checkboxes { id, .. } => Some(id),
        }
    }

    /// The label shown to the requester and used as the body section heading.
    pub fn label(&self) -> Option<&str> {
        match self {
            FormElement::Markdown { .. } => None,
            FormElement::Input { attributes, .. } | FormElement::Textarea { attributes, .. } => {
                Some(&attributes.label)
            }
            FormElement::Dropdown { attributes, .. } => Some(&attributes.label),
            FormElement::Checkboxes { attributes, .. } => Some(&attributes.label),
        }
    }

    fn validations(&self) -> Option<&Validations> {
        match self {
            FormElement::Markdown { .. } => None,
            FormElement::Input { validations, .. }
            | FormElement::Textarea { validations, .. }
            | FormElement::Dropdown { validations, .. }
            | FormElement::Checkboxes { validations, .. } => Some(validations),
        }
    }
}

/// The schema itself is unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Field '{field}' has an invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        field: FieldId,
        pattern: String,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// The value entered for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Input and textarea content.
    Text(String),
    /// Selected dropdown options or checked checkbox labels.
    Selection(Vec<String>),
}

impl FieldValue {
    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Selection(items) => items.is_empty(),
        }
    }
}

/// Values entered into a form, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormSubmission(BTreeMap<FieldId, FieldValue>);

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value, replacing any previous one.
    pub fn set(&mut self, field: FieldId, value: FieldValue) {
        self.0.insert(field, value);
    }

    /// Builder-style [`FormSubmission::set`] for text values.
    pub fn with_text(mut self, field: &str, value: impl Into<String>) -> Self {
        if let Some(id) = FieldId::new(field) {
            self.set(id, FieldValue::Text(value.into()));
        }
        self
    }

    /// Builder-style [`FormSubmission::set`] for selections.
    pub fn with_selection<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(id) = FieldId::new(field) {
            self.set(
                id,
                FieldValue::Selection(values.into_iter().map(Into::into).collect()),
            );
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(id, _)| id.as_str() == field).map(|(_, v)| v)
    }

    /// Text value of `field`, trimmed; `None` when absent, blank, or a selection.
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::Text(text)) if !text.trim().is_empty() => Some(text.trim()),
            _ => None,
        }
    }

    /// Selected options of `field`; empty when absent or a text value.
    pub fn selection(&self, field: &str) -> &[String] {
        match self.get(field) {
            Some(FieldValue::Selection(items)) => items,
            _ => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// One constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub field: FieldId,
    /// Field label, for human-facing output.
    pub label: String,
    pub message: String,
}

/// Result of validating a submission: one finding per violated constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns `true` if any finding concerns `field`.
    pub fn has_finding_for(&self, field: &str) -> bool {
        self.findings.iter().any(|f| f.field.as_str() == field)
    }

    /// Markdown feedback comment listing every violation.
    pub fn to_markdown(&self) -> String {
        let mut comment =
            String::from("## ❌ Validation Failed\n\nPlease fix the following issues:\n\n");
        for finding in &self.findings {
            comment.push_str(&format!("- **{}**: {}\n", finding.label, finding.message));
        }
        comment.push_str("\nPlease update the issue with corrected information.");
        comment
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self
            .findings
            .iter()
            .map(|finding| format!("{}: {}", finding.field, finding.message))
            .collect();
        f.write_str(&messages.join("; "))
    }
}

impl IssueForm {
    /// Elements that carry a value, in form order.
    pub fn fields(&self) -> impl Iterator<Item = &FormElement> {
        self.body.iter().filter(|e| e.id().is_some())
    }

    /// Checks a submission against every field constraint.
    ///
    /// Values for ids the form does not declare are ignored.
    pub fn validate(&self, submission: &FormSubmission) -> Result<ValidationReport, FormError> {
        let mut report = ValidationReport::default();

        for element in self.fields() {
            let (Some(id), Some(label), Some(validations)) =
                (element.id(), element.label(), element.validations())
            else {
                continue;
            };
            let mut fail = |message: String| {
                report.findings.push(ValidationFinding {
                    field: id.clone(),
                    label: label.to_string(),
                    message,
                });
            };

            let value = submission.get(id.as_str()).filter(|v| !v.is_blank());
            let Some(value) = value else {
                if validations.required {
                    fail(match element {
                        FormElement::Checkboxes { .. } => {
                            "At least one option must be selected".to_string()
                        }
                        FormElement::Dropdown { .. } => "An option must be selected".to_string(),
                        _ => format!("{label} is required"),
                    });
                }
                continue;
            };

            match (element, value) {
                (
                    FormElement::Input { .. } | FormElement::Textarea { .. },
                    FieldValue::Text(text),
                ) => {
                    let text = text.trim();
                    if let Some(max) = validations.max_length {
                        let length = text.chars().count();
                        if length > max {
                            fail(format!(
                                "Must be {max} characters or less (got {length})"
                            ));
                        }
                    }
                    if let Some(pattern) = &validations.pattern {
                        if !compile_pattern(id, pattern)?.is_match(text) {
                            fail(format!("'{text}' does not match the pattern {pattern}"));
                        }
                    }
                }

                (FormElement::Dropdown { attributes, .. }, FieldValue::Selection(selected)) => {
                    if !attributes.multiple && selected.len() > 1 {
                        fail("Exactly one option must be selected".to_string());
                    }
                    for choice in selected {
                        if !attributes.options.iter().any(|o| o == choice) {
                            fail(format!(
                                "'{choice}' is not one of: {}",
                                attributes.options.join(", ")
                            ));
                        }
                    }
                }

                (FormElement::Checkboxes { attributes, .. }, FieldValue::Selection(checked)) => {
                    for item in checked {
                        if !attributes.options.iter().any(|o| &o.label == item) {
                            fail(format!("'{item}' is not a known option"));
                        }
                    }
                    for option in attributes.options.iter().filter(|o| o.required) {
                        if !checked.contains(&option.label) {
                            fail(format!("'{}' must be checked", option.label));
                        }
                    }
                }

                _ => fail("Unexpected kind of value for this field".to_string()),
            }
        }

        Ok(report)
    }

    /// Renders a submission as the issue body GitHub would produce.
    pub fn render_body(&self, submission: &FormSubmission) -> String {
        let sections: Vec<String> = self
            .fields()
            .filter_map(|element| {
                let id = element.id()?;
                let label = element.label()?;
                let content = match element {
                    FormElement::Checkboxes { attributes, .. } => {
                        let checked = submission.selection(id.as_str());
                        attributes
                            .options
                            .iter()
                            .map(|o| {
                                let mark = if checked.contains(&o.label) { "X" } else { " " };
                                format!("- [{mark}] {}", o.label)
                            })
                            .collect::<Vec<_>>()
                            .join("\n")
                    }
                    FormElement::Dropdown { .. } => {
                        let selected = submission.selection(id.as_str());
                        if selected.is_empty() {
                            NO_RESPONSE.to_string()
                        } else {
                            selected.join(", ")
                        }
                    }
                    _ => submission
                        .text(id.as_str())
                        .unwrap_or(NO_RESPONSE)
                        .to_string(),
                };
                Some(format!("### {label}\n\n{content}"))
            })
            .collect();
        sections.join("\n\n")
    }

    /// Reads an issue body back into a submission.
    ///
    /// A `### ` line opens a section only when it names, case-insensitively,
    /// a field that comes after the current one in form order. Any other
    /// `### ` line is part of the current value, so free text may contain
    /// headings of its own. Fields without a section are absent.
    pub fn parse_body(&self, body: &str) -> FormSubmission {
        let mut submission = FormSubmission::new();
        let fields: Vec<&FormElement> = self.fields().collect();
        let labels: Vec<&str> = fields.iter().map(|e| e.label().unwrap_or_default()).collect();

        for (index, content) in split_sections(body, &labels) {
            let element = fields[index];
            let Some(id) = element.id() else { continue };

            let content = content.trim();
            let content = if content == NO_RESPONSE { "" } else { content };

            let value = match element {
                FormElement::Checkboxes { .. } => FieldValue::Selection(
                    content
                        .lines()
                        .filter_map(|line| {
                            let line = line.trim();
                            line.strip_prefix("- [X]")
                                .or_else(|| line.strip_prefix("- [x]"))
                                .map(|label| label.trim().to_string())
                        })
                        .collect(),
                ),
                FormElement::Dropdown { attributes, .. } => {
                    let selected = if content.is_empty() {
                        Vec::new()
                    } else if attributes.multiple {
                        content.split(", ").map(str::to_string).collect()
                    } else {
                        vec![content.to_string()]
                    };
                    FieldValue::Selection(selected)
                }
                _ => FieldValue::Text(content.to_string()),
            };
            submission.set(id.clone(), value);
        }

        submission
    }
}

fn compile_pattern(field: &FieldId, pattern: &str) -> Result<Regex, FormError> {
    // Like an HTML `pattern` attribute, the expression must match the whole value.
    Regex::new(&format!("^(?:{pattern})$")).map_err(|e| FormError::InvalidPattern {
        field: field.clone(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Splits a body into `(label index, content)` pairs.
///
/// Text before the first recognised heading is dropped.
fn split_sections(body: &str, labels: &[&str]) -> Vec<(usize, String)> {
    let mut sections = Vec::new();
    let mut current: Option<(usize, String)> = None;
    let mut next = 0;

    for line in body.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let opens = line.strip_prefix("### ").and_then(|heading| {
            let heading = heading.trim();
            labels[next..]
                .iter()
                .position(|l| l.eq_ignore_ascii_case(heading))
                .map(|offset| next + offset)
        });

        if let Some(index) = opens {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some((index, String::new()));
            next = index + 1;
        } else if let Some((_, content)) = current.as_mut() {
            content.push_str(line);
            content.push('\n');
        }
    }
    if let Some(section) = current {
        sections.push(section);
    }
    sections
}
