//! Setup choices offered to the candidate before an interview starts.
//!
//! The front-end renders these as pickers. Selections outside the lists are
//! still accepted by `Session::start`; only non-emptiness is enforced there.

use serde::Serialize;

pub const ROLES: &[&str] = &[
    "Software Engineer",
    "Data Scientist",
    "Product Manager",
    "Sales Representative",
    "Marketing Manager",
    "Retail Associate",
    "Customer Service",
    "DevOps Engineer",
    "UI/UX Designer",
    "Business Analyst",
];

pub const EXPERIENCE_LEVELS: &[&str] = &[
    "Entry Level (0-2 years)",
    "Mid Level (3-5 years)",
    "Senior Level (5+ years)",
];

pub const FOCUS_AREAS: &[&str] = &[
    "Technical Skills",
    "Behavioral Questions",
    "Problem Solving",
    "Leadership",
    "Communication",
    "Past Projects",
];

#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub roles: &'static [&'static str],
    pub experience_levels: &'static [&'static str],
    pub focus_areas: &'static [&'static str],
}

pub fn catalog() -> Catalog {
    Catalog {
        roles: ROLES,
        experience_levels: EXPERIENCE_LEVELS,
        focus_areas: FOCUS_AREAS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_every_choice() {
        let c = catalog();
        assert_eq!(c.roles.len(), 10);
        assert_eq!(c.experience_levels.len(), 3);
        assert_eq!(c.focus_areas.len(), 6);
        assert!(c.roles.contains(&"Software Engineer"));
    }

    #[test]
    fn test_catalog_serializes_as_string_lists() {
        let value = serde_json::to_value(catalog()).unwrap();
        assert_eq!(value["experience_levels"][0], "Entry Level (0-2 years)");
    }
}
