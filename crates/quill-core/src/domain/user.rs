use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::text;
use crate::error::DomainError;

const NAME_MAX: usize = 100;
const BIO_MAX: usize = 500;
const WEBSITE_MAX: usize = 200;
const SOCIAL_MAX: usize = 200;

/// Role attached to an account. Stored but not consulted for authorization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(DomainError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

/// Links to a user's profiles elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
}

impl SocialLinks {
    fn normalized(self) -> Result<Self, DomainError> {
        Ok(Self {
            twitter: text::optional("twitter", self.twitter, SOCIAL_MAX)?,
            github: text::optional("github", self.github, SOCIAL_MAX)?,
            linkedin: text::optional("linkedin", self.linkedin, SOCIAL_MAX)?,
            facebook: text::optional("facebook", self.facebook, SOCIAL_MAX)?,
            instagram: text::optional("instagram", self.instagram, SOCIAL_MAX)?,
        })
    }
}

/// User entity - represents a registered author or reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub social_links: SocialLinks,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a user may change on their own profile.
///
/// Role and email are deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub social_links: Option<SocialLinks>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    ///
    /// The email is trimmed and lowercased before validation.
    pub fn new(name: &str, email: &str, password_hash: String) -> Result<Self, DomainError> {
        let name = text::required("name", name, NAME_MAX)?;
        let email = normalize_email(email);
        if !text::is_valid_email(&email) {
            return Err(DomainError::Validation("Invalid email address".to_string()));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role: UserRole::default(),
            bio: None,
            website: None,
            social_links: SocialLinks::default(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a profile update. Absent fields are left untouched.
    pub fn apply_profile(&mut self, update: ProfileUpdate) -> Result<(), DomainError> {
        if let Some(name) = update.name {
            self.name = text::required("name", &name, NAME_MAX)?;
        }
        if update.bio.is_some() {
            self.bio = text::optional("bio", update.bio, BIO_MAX)?;
        }
        if update.website.is_some() {
            self.website = text::optional("website", update.website, WEBSITE_MAX)?;
        }
        if let Some(links) = update.social_links {
            self.social_links = links.normalized()?;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
