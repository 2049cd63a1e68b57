use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Job role used for approval authority.
///
/// Variants are declared in ascending authority so the derived ordering doubles as the
/// rank comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "employee_limited")]
    EmployeeLimited,
    #[serde(rename = "employee")]
    Employee,
    #[serde(rename = "manager_level_1")]
    Manager1,
    #[serde(rename = "manager_level_2")]
    Manager2,
    #[serde(rename = "administrator")]
    Administrator,
}

impl Role {
    pub const ALL: [Role; 5] =
        [Role::EmployeeLimited, Role::Employee, Role::Manager1, Role::Manager2, Role::Administrator];

    pub fn rank(self) -> u8 {
        match self {
            Self::EmployeeLimited => 0,
            Self::Employee => 1,
            Self::Manager1 => 2,
            Self::Manager2 => 3,
            Self::Administrator => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmployeeLimited => "employee_limited",
            Self::Employee => "employee",
            Self::Manager1 => "manager_level_1",
            Self::Manager2 => "manager_level_2",
            Self::Administrator => "administrator",
        }
    }

    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_role_token(value).as_str() {
            "employee" => Ok(Self::Employee),
            "employee_limited" | "limited_employee" => Ok(Self::EmployeeLimited),
            "manager_level_1" | "manager_1" | "manager1" => Ok(Self::Manager1),
            "manager_level_2" | "manager_2" | "manager2" => Ok(Self::Manager2),
            "administrator" | "admin" => Ok(Self::Administrator),
            _ => Err(DomainError::InvalidInput(format!("unknown role `{}`", value.trim()))),
        }
    }
}

fn normalize_role_token(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|ch| if ch == ' ' || ch == '-' { '_' } else { ch.to_ascii_lowercase() })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub user_id: Option<UserId>,
}
