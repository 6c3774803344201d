use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role label attached to every account. Controls both the list filter and
/// the admin authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Teacher, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
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

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Maps the `?filter=` query value to the role it narrows to.
/// `teachers` and `students` (any case) narrow; anything else means "all".
pub fn filter_role(filter: Option<&str>) -> Option<Role> {
    match filter.map(|f| f.to_lowercase()).as_deref() {
        Some("teachers") => Some(Role::Teacher),
        Some("students") => Some(Role::Student),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert_eq!("STUDENT".parse::<Role>().unwrap(), Role::Student);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn parse_rejects_unknown_role() {
        let err = "principal".parse::<Role>().unwrap_err();
        assert!(err.contains("principal"));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn filter_maps_known_values() {
        assert_eq!(filter_role(Some("teachers")), Some(Role::Teacher));
        assert_eq!(filter_role(Some("Students")), Some(Role::Student));
        assert_eq!(filter_role(Some("TEACHERS")), Some(Role::Teacher));
    }

    #[test]
    fn filter_ignores_absent_or_unrecognized_values() {
        assert_eq!(filter_role(None), None);
        assert_eq!(filter_role(Some("")), None);
        assert_eq!(filter_role(Some("admins")), None);
        assert_eq!(filter_role(Some("everyone")), None);
    }
}
