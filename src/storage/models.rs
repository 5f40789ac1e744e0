use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A person known to the registry, created on first identity-provider sign-in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(()),
        }
    }
}

/// Biometric registration with its reference image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprint {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub id_number: String,
    pub image_url: String,
    pub image_size: Option<u64>,
    pub image_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Offence {
    pub id: i64,
    pub user_id: i64,
    pub offence_details: String,
    pub offence_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A clearance certificate application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Clearance {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub id_number: String,
    pub image_url: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewFingerprint {
    pub user_id: i64,
    pub full_name: String,
    pub id_number: String,
    pub image_url: String,
    pub image_size: Option<u64>,
    pub image_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOffence {
    pub user_id: i64,
    pub offence_details: String,
    /// Defaults to the time of recording
    pub offence_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewClearance {
    pub user_id: i64,
    pub full_name: String,
    pub id_number: String,
    pub image_url: String,
    pub description: String,
}
