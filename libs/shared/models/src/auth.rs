use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "client")]
    Patient,
    #[serde(alias = "admin")]
    Practitioner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Practitioner => "practitioner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "patient" | "client" => Ok(Role::Patient),
            "practitioner" | "admin" => Ok(Role::Practitioner),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// The authenticated caller, handed explicitly to every core operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            role,
            email: None,
        }
    }

    pub fn is_practitioner(&self) -> bool {
        self.role == Role::Practitioner
    }

    pub fn is_patient(&self) -> bool {
        self.role == Role::Patient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_accepts_legacy_names() {
        assert_eq!("client".parse::<Role>().unwrap(), Role::Patient);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Practitioner);
        assert_eq!("practitioner".parse::<Role>().unwrap(), Role::Practitioner);
        assert!("doctor".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Practitioner).unwrap(), "\"practitioner\"");
    }
}
