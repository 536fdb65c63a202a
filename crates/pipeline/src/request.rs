//! The repository-creation request: intake form and typed request.
//!
//! [`repository_creation_form`] is the schema humans fill in. The issue body
//! it produces is the wire format the creation script reads; a
//! [`RepositoryCreationRequest`] is that body parsed and validated.
//!
//! Validation here is shape only. Whether `repo-name` collides with an
//! existing repository is for the creation script to decide.

use serde::{Deserialize, Serialize};

use crate::{
    form::{
        CheckboxOption, CheckboxesAttributes, DropdownAttributes, FormElement, FormError,
        FormSubmission, IssueForm, MarkdownAttributes, TextAttributes, ValidationFinding,
        ValidationReport, Validations,
    },
    workflows::REPOSITORY_CREATION_LABEL,
    FieldId, LabelName, RepositoryName,
};

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

/// Allowed characters of a requested repository name.
pub const REPO_NAME_PATTERN: &str = "^[a-z0-9_.-]+$";

/// Maximum length of a requested description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 280;

pub const FIELD_REPO_NAME: &str = "repo-name";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_VISIBILITY: &str = "visibility";
pub const FIELD_BRANCH_PROTECTION: &str = "branch-protection";
pub const FIELD_TEAMS: &str = "teams";
pub const FIELD_ADDITIONAL_NOTES: &str = "additional-notes";

const _: () = assert!(
    !FIELD_REPO_NAME.is_empty()
        && !FIELD_DESCRIPTION.is_empty()
        && !FIELD_VISIBILITY.is_empty()
        && !FIELD_BRANCH_PROTECTION.is_empty()
        && !FIELD_TEAMS.is_empty()
        && !FIELD_ADDITIONAL_NOTES.is_empty()
);

/// Visibility of the requested repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

impl Visibility {
    pub const ALL: [Visibility; 2] = [Visibility::Private, Visibility::Public];

    /// Option text in the form dropdown.
    pub fn label(self) -> &'static str {
        match self {
            Visibility::Private => "Private",
            Visibility::Public => "Public",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.label().eq_ignore_ascii_case(label.trim()))
    }
}

/// Branch-protection settings a requester can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchProtectionFlag {
    EnforceForAdmins,
    RequireStatusChecks,
    RequireReview,
}

impl BranchProtectionFlag {
    pub const ALL: [BranchProtectionFlag; 3] = [
        BranchProtectionFlag::EnforceForAdmins,
        BranchProtectionFlag::RequireStatusChecks,
        BranchProtectionFlag::RequireReview,
    ];

    /// Stable identifier (`enforce-for-admins`, ...).
    pub fn id(self) -> &'static str {
        match self {
            BranchProtectionFlag::EnforceForAdmins => "enforce-for-admins",
            BranchProtectionFlag::RequireStatusChecks => "require-status-checks",
            BranchProtectionFlag::RequireReview => "require-review",
        }
    }

    /// Checkbox text in the form.
    pub fn label(self) -> &'static str {
        match self {
            BranchProtectionFlag::EnforceForAdmins => "Enforce for admins",
            BranchProtectionFlag::RequireStatusChecks => "Require status checks",
            BranchProtectionFlag::RequireReview => "Require review",
        }
    }

    /// Accepts either the checkbox text or the identifier.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|f| {
            f.label().eq_ignore_ascii_case(label) || f.id().eq_ignore_ascii_case(label)
        })
    }
}

fn field_id(id: &'static str) -> FieldId {
    FieldId::from_static(id)
}

fn text(label: &str, description: &str, placeholder: Option<&str>) -> TextAttributes {
    TextAttributes {
        label: label.to_string(),
        description: Some(description.to_string()),
        placeholder: placeholder.map(str::to_string),
    }
}

/// The intake form for repository-creation requests.
pub fn repository_creation_form() -> IssueForm {
    IssueForm {
        name: "Repository Creation Request".to_string(),
        description: "Request a new repository in this organization".to_string(),
        title: Some("[Repo Request]: ".to_string()),
        labels: vec![LabelName::from_static(REPOSITORY_CREATION_LABEL)],
        body: vec![
            FormElement::Markdown {
                attributes: MarkdownAttributes {
                    value: "Fill out this form to request a new repository. \
                            The request is processed automatically once submitted."
                        .to_string(),
                },
            },
            FormElement::Input {
                id: field_id(FIELD_REPO_NAME),
                attributes: text(
                    "Repository Name",
                    "Lowercase letters, digits, underscores, periods and hyphens only.",
                    Some("my-new-service"),
                ),
                validations: Validations {
                    required: true,
                    pattern: Some(REPO_NAME_PATTERN.to_string()),
                    max_length: None,
                },
            },
            FormElement::Textarea {
                id: field_id(FIELD_DESCRIPTION),
                attributes: text("Description", "What the repository is for.", None),
                validations: Validations {
                    required: true,
                    pattern: None,
                    max_length: Some(MAX_DESCRIPTION_CHARS),
                },
            },
            FormElement::Dropdown {
                id: field_id(FIELD_VISIBILITY),
                attributes: DropdownAttributes {
                    label: "Visibility".to_string(),
                    description: Some("Who can see the repository.".to_string()),
                    options: Visibility::ALL.iter().map(|v| v.label().to_string()).collect(),
                    multiple: false,
                },
                validations: Validations {
                    required: true,
                    ..Validations::default()
                },
            },
            FormElement::Checkboxes {
                id: field_id(FIELD_BRANCH_PROTECTION),
                attributes: CheckboxesAttributes {
                    label: "Branch Protection".to_string(),
                    description: Some(
                        "Protection applied to the default branch. Select at least one."
                            .to_string(),
                    ),
                    options: BranchProtectionFlag::ALL
                        .iter()
                        .map(|f| CheckboxOption {
                            label: f.label().to_string(),
                            required: false,
                        })
                        .collect(),
                },
                validations: Validations {
                    required: true,
                    ..Validations::default()
                },
            },
            FormElement::Textarea {
                id: field_id(FIELD_TEAMS),
                attributes: text(
                    "Teams",
                    "Teams to grant access, one per line.",
                    Some("platform\nsecurity"),
                ),
                validations: Validations::default(),
            },
            FormElement::Textarea {
                id: field_id(FIELD_ADDITIONAL_NOTES),
                attributes: text("Additional Notes", "Anything else the reviewers should know.", None),
                validations: Validations::default(),
            },
        ],
    }
}

/// Why a submission could not become a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Request is invalid: {0}")]
    Invalid(ValidationReport),

    #[error(transparent)]
    Schema(#[from] FormError),
}

/// A validated repository-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryCreationRequest {
    pub repo_name: RepositoryName,
    pub description: String,
    pub visibility: Visibility,
    /// Non-empty, in form order, without duplicates.
    pub branch_protection: Vec<BranchProtectionFlag>,
    /// One team per non-blank line, in order.
    pub teams: Vec<String>,
    pub additional_notes: Option<String>,
}

impl RepositoryCreationRequest {
    /// Parses and validates an issue body produced by the intake form.
    pub fn from_issue_body(body: &str) -> Result<Self, RequestError> {
        let form = repository_creation_form();
        Self::from_submission(&form, &form.parse_body(body))
    }

    /// Validates `submission` against `form` and converts it.
    pub fn from_submission(form: &IssueForm, submission: &FormSubmission) -> Result<Self, RequestError> {
        let mut report = form.validate(submission)?;

        let repo_name = submission.text(FIELD_REPO_NAME).and_then(RepositoryName::new);
        let description = submission.text(FIELD_DESCRIPTION).map(str::to_string);
        let visibility = submission
            .selection(FIELD_VISIBILITY)
            .first()
            .and_then(|v| Visibility::from_label(v));

        let mut branch_protection = Vec::new();
        for item in submission.selection(FIELD_BRANCH_PROTECTION) {
            if let Some(flag) = BranchProtectionFlag::from_label(item) {
                if !branch_protection.contains(&flag) {
                    branch_protection.push(flag);
                }
            }
        }
        branch_protection.sort();

        // A form other than the built-in one may pass validation yet lack the
        // fields a request needs.
        for (field, present) in [
            (FIELD_REPO_NAME, repo_name.is_some()),
            (FIELD_DESCRIPTION, description.is_some()),
            (FIELD_VISIBILITY, visibility.is_some()),
            (FIELD_BRANCH_PROTECTION, !branch_protection.is_empty()),
        ] {
            if !present && !report.has_finding_for(field) {
                let label = form
                    .fields()
                    .find(|e| e.id().is_some_and(|id| id.as_str() == field))
                    .and_then(|e| e.label())
                    .unwrap_or(field);
                report.findings.push(ValidationFinding {
                    field: field_id(field),
                    label: label.to_string(),
                    message: "Missing or unrecognised value".to_string(),
                });
            }
        }

        let (Some(repo_name), Some(description), Some(visibility), true) = (
            repo_name,
            description,
            visibility,
            report.is_valid(),
        ) else {
            return Err(RequestError::Invalid(report));
        };

        let teams = submission
            .text(FIELD_TEAMS)
            .map(|t| {
                t.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            repo_name,
            description,
            visibility,
            branch_protection,
            teams,
            additional_notes: submission.text(FIELD_ADDITIONAL_NOTES).map(str::to_string),
        })
    }

    /// The form submission equivalent to this request.
    pub fn to_submission(&self) -> FormSubmission {
        let mut submission = FormSubmission::new()
            .with_text(FIELD_REPO_NAME, self.repo_name.as_str())
            .with_text(FIELD_DESCRIPTION, self.description.as_str())
            .with_selection(FIELD_VISIBILITY, [self.visibility.label()])
            .with_selection(
                FIELD_BRANCH_PROTECTION,
                self.branch_protection.iter().map(|f| f.label()),
            );
        if !self.teams.is_empty() {
            submission = submission.with_text(FIELD_TEAMS, self.teams.join("\n"));
        }
        if let Some(notes) = &self.additional_notes {
            submission = submission.with_text(FIELD_ADDITIONAL_NOTES, notes.as_str());
        }
        submission
    }
}
