//! Profile domain types — Role, ProfileRecord, NewProfile
//!
//! Profiles live in the `users` collection of the document store, one
//! document per principal, written once at sign-up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::identity::PrincipalId;

/// Marketplace role chosen at sign-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "cliente", alias = "client")]
    Client,
    #[serde(rename = "profissional", alias = "professional")]
    Professional,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Professional => "professional",
        }
    }

    /// Value stored in the `userType` document field
    pub fn document_value(&self) -> &'static str {
        match self {
            Self::Client => "cliente",
            Self::Professional => "profissional",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile document as stored in the `users` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    /// Document key; not part of the document body
    #[serde(skip)]
    pub principal_id: PrincipalId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "userType", alias = "role")]
    pub role: Role,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProfileRecord {
    /// Decode a stored document body
    pub fn from_document(principal_id: PrincipalId, document: serde_json::Value) -> Result<Self> {
        let mut record: ProfileRecord =
            serde_json::from_value(document).map_err(|e| SessionError::MalformedProfile {
                principal_id: principal_id.to_string(),
                reason: e.to_string(),
            })?;
        record.principal_id = principal_id;
        Ok(record)
    }

    /// Encode the document body
    pub fn to_document(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Name for greetings, falling back to the email
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            &self.email
        } else {
            name
        }
    }
}

/// Sign-up form data for a new profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub role: Role,
    pub profile_picture_url: Option<String>,
}

impl NewProfile {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            location: String::new(),
            role,
            profile_picture_url: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Name and email are mandatory
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SessionError::InvalidProfile("name is required".into()));
        }
        if !self.email.contains('@') {
            return Err(SessionError::InvalidProfile(format!(
                "invalid email address: {}",
                self.email
            )));
        }
        Ok(())
    }

    pub fn into_record(self, principal_id: PrincipalId) -> ProfileRecord {
        ProfileRecord {
            principal_id,
            name: self.name.trim().to_string(),
            email: self.email,
            phone: self.phone,
            location: self.location,
            role: self.role,
            profile_picture_url: self.profile_picture_url,
            created_at: Some(Utc::now()),
        }
    }
}
