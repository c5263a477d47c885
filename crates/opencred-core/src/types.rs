//! # Domain Enums
//!
//! The closed vocabularies of the registry. String forms are the
//! persisted database values and the wire values — `as_str`/`parse`
//! round-trip exactly.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Kind of academic credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    Degree,
    Transcript,
    SkillCertificate,
    InternshipProof,
    MicroCredential,
}

impl CredentialType {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Degree => "degree",
            Self::Transcript => "transcript",
            Self::SkillCertificate => "skill_certificate",
            Self::InternshipProof => "internship_proof",
            Self::MicroCredential => "micro_credential",
        }
    }

    /// Parse the stable string form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownCredentialType`] for any other
    /// string.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "degree" => Ok(Self::Degree),
            "transcript" => Ok(Self::Transcript),
            "skill_certificate" => Ok(Self::SkillCertificate),
            "internship_proof" => Ok(Self::InternshipProof),
            "micro_credential" => Ok(Self::MicroCredential),
            other => Err(ValidationError::UnknownCredentialType(other.to_string())),
        }
    }
}

/// Persisted lifecycle status of a credential.
///
/// `Expired` may also be derived at read time from `valid_until` without
/// ever being persisted; `Revoked` is persisted and terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    Active,
    Revoked,
    Expired,
    Pending,
}

impl CredentialStatus {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
            Self::Pending => "pending",
        }
    }
}

/// Access level granted by a credential share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    View,
    Verify,
    Download,
}

impl AccessType {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Verify => "verify",
            Self::Download => "download",
        }
    }

    /// Parse the stable string form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownAccessType`] for any other
    /// string.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "view" => Ok(Self::View),
            "verify" => Ok(Self::Verify),
            "download" => Ok(Self::Download),
            other => Err(ValidationError::UnknownAccessType(other.to_string())),
        }
    }
}

impl Default for AccessType {
    fn default() -> Self {
        Self::View
    }
}

/// Role granted to an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Institution,
    Employer,
    Admin,
}

impl UserRole {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Institution => "institution",
            Self::Employer => "employer",
            Self::Admin => "admin",
        }
    }

    /// Parse the stable string form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownUserRole`] for any other string.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "student" => Ok(Self::Student),
            "institution" => Ok(Self::Institution),
            "employer" => Ok(Self::Employer),
            "admin" => Ok(Self::Admin),
            other => Err(ValidationError::UnknownUserRole(other.to_string())),
        }
    }
}

/// Outcome of a single verification attempt, as recorded in the
/// append-only verification log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Invalid,
    Revoked,
    Expired,
    Pending,
}

impl VerificationStatus {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Invalid => "invalid",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
            Self::Pending => "pending",
        }
    }
}
