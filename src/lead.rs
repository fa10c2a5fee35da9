//! Lead-capture form validation
//!
//! Submissions are checked field by field and, when valid, only logged.
//! Nothing is sent anywhere or stored.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

const MIN_NAME_CHARS: usize = 2;
const MIN_COMPANY_CHARS: usize = 2;
const MIN_MESSAGE_CHARS: usize = 10;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-]+(\.[A-Za-z0-9_'+\-]+)*@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

/// Vendors whose licenses are bought
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseVendor {
    Microsoft,
    Adobe,
    Oracle,
    Sap,
    Autodesk,
    Other,
}

impl LicenseVendor {
    pub const ALL: [LicenseVendor; 6] = [
        LicenseVendor::Microsoft,
        LicenseVendor::Adobe,
        LicenseVendor::Oracle,
        LicenseVendor::Sap,
        LicenseVendor::Autodesk,
        LicenseVendor::Other,
    ];

    /// Form value, as submitted by the select box
    pub fn as_str(self) -> &'static str {
        match self {
            LicenseVendor::Microsoft => "microsoft",
            LicenseVendor::Adobe => "adobe",
            LicenseVendor::Oracle => "oracle",
            LicenseVendor::Sap => "sap",
            LicenseVendor::Autodesk => "autodesk",
            LicenseVendor::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LicenseVendor::Microsoft => "Microsoft",
            LicenseVendor::Adobe => "Adobe",
            LicenseVendor::Oracle => "Oracle",
            LicenseVendor::Sap => "SAP",
            LicenseVendor::Autodesk => "Autodesk",
            LicenseVendor::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for LicenseVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which page the form was submitted from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormOrigin {
    Landing,
    #[default]
    Contact,
}

impl FormOrigin {
    /// How long the page shows its thank-you banner before resetting
    pub fn confirmation_window(self) -> Duration {
        match self {
            FormOrigin::Landing => Duration::from_secs(3),
            FormOrigin::Contact => Duration::from_secs(5),
        }
    }
}

/// Raw form submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, alias = "licenseType")]
    pub license_type: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub origin: FormOrigin,
}

/// A submission that passed every check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub company: String,
    pub license_type: LicenseVendor,
    pub message: String,
    pub origin: FormOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LeadField {
    Name,
    Email,
    Company,
    LicenseType,
    Message,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: LeadField,
    pub message: &'static str,
}

/// Every failed field of one submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lead form has {} invalid field(s)", .0.len())]
pub struct ValidationErrors(pub Vec<FieldError>);

#[cfg(test)]
impl ValidationErrors {
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn message_for(&self, field: LeadField) -> Option<&'static str> {
        self.0.iter().find(|e| e.field == field).map(|e| e.message)
    }
}

fn char_len(value: &str) -> usize {
    value.trim().chars().count()
}

impl LeadForm {
    pub fn validate(&self) -> Result<Lead, ValidationErrors> {
        let mut errors = Vec::new();
        let mut fail = |field, message| errors.push(FieldError { field, message });

        if char_len(&self.name) < MIN_NAME_CHARS {
            fail(LeadField::Name, "Name must be at least 2 characters.");
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            fail(LeadField::Email, "Please enter a valid email address.");
        }
        if char_len(&self.company) < MIN_COMPANY_CHARS {
            fail(
                LeadField::Company,
                "Company name must be at least 2 characters.",
            );
        }
        let license_type = LicenseVendor::parse(&self.license_type);
        if license_type.is_none() {
            fail(LeadField::LicenseType, "Please select a license type.");
        }
        if char_len(&self.message) < MIN_MESSAGE_CHARS {
            fail(
                LeadField::Message,
                "Message must be at least 10 characters.",
            );
        }

        match license_type {
            Some(license_type) if errors.is_empty() => Ok(Lead {
                name: self.name.trim().to_string(),
                email: self.email.trim().to_string(),
                company: self.company.trim().to_string(),
                license_type,
                message: self.message.trim().to_string(),
                origin: self.origin,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }
}

/// Thank-you banner shown after a valid submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub shown_at: DateTime<Utc>,
    pub window: Duration,
}

impl Confirmation {
    pub fn new(origin: FormOrigin, shown_at: DateTime<Utc>) -> Self {
        Self {
            shown_at,
            window: origin.confirmation_window(),
        }
    }

    pub fn visible_until(&self) -> DateTime<Utc> {
        let window =
            chrono::Duration::from_std(self.window).unwrap_or_else(|_| chrono::Duration::zero());
        self.shown_at + window
    }

    #[cfg(test)]
    pub fn is_visible_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.shown_at && at < self.visible_until()
    }
}
