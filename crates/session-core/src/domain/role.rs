// ============================================================================
// Session Core - Role
// File: crates/session-core/src/domain/role.rs
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clinical roles recognised by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Patient,
    Doctor,
    Lab,
    Pharmacy,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "PATIENT",
            Role::Doctor => "DOCTOR",
            Role::Lab => "LAB",
            Role::Pharmacy => "PHARMACY",
            Role::Admin => "ADMIN",
        }
    }

    /// Case-insensitive; directory rows store roles in either case.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PATIENT" => Some(Role::Patient),
            "DOCTOR" => Some(Role::Doctor),
            "LAB" => Some(Role::Lab),
            "PHARMACY" => Some(Role::Pharmacy),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_str("DOCTOR"), Some(Role::Doctor));
        assert_eq!(Role::from_str("pharmacy"), Some(Role::Pharmacy));
        assert_eq!(Role::from_str("nurse"), None);
        assert_eq!(Role::Lab.as_str(), "LAB");
    }

    #[test]
    fn test_role_serde_uses_upper_case() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let role: Role = serde_json::from_str("\"PATIENT\"").unwrap();
        assert_eq!(role, Role::Patient);
    }
}
