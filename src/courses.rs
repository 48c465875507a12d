use crate::calc::CalcError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CUSTOM_COURSE: &str = "custom";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseMaxes {
    pub pt_maxes: Vec<f64>,
    pub nt_maxes: Vec<f64>,
}

impl CourseMaxes {
    fn uniform(pt: f64, nt: f64, count: usize) -> Self {
        Self {
            pt_maxes: vec![pt; count],
            nt_maxes: vec![nt; count],
        }
    }
}

/// Max marks per course key. Always carries a `custom` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCatalog {
    courses: BTreeMap<String, CourseMaxes>,
}

impl Default for CourseCatalog {
    fn default() -> Self {
        let mut courses = BTreeMap::new();
        courses.insert("da101".to_string(), CourseMaxes::uniform(20.0, 10.0, 6));
        courses.insert("da102".to_string(), CourseMaxes::uniform(10.0, 10.0, 6));
        courses.insert(
            "da103".to_string(),
            CourseMaxes {
                pt_maxes: vec![10.0; 6],
                nt_maxes: vec![4.0, 10.0, 10.0, 10.0, 10.0, 10.0],
            },
        );
        courses.insert(
            "da104".to_string(),
            CourseMaxes {
                pt_maxes: vec![15.0, 15.0, 20.0, 20.0, 20.0, 20.0],
                nt_maxes: vec![20.0; 6],
            },
        );
        courses.insert(
            CUSTOM_COURSE.to_string(),
            CourseMaxes::uniform(100.0, 100.0, 6),
        );
        Self { courses }
    }
}

fn check_maxes(key: &str, what: &str, maxes: &[f64], expected: usize) -> Result<(), CalcError> {
    if maxes.len() != expected {
        return Err(CalcError::configuration(format!(
            "course {} lists {} {} maxes, expected {}",
            key,
            maxes.len(),
            what,
            expected
        )));
    }
    if let Some(bad) = maxes.iter().find(|m| !m.is_finite() || **m <= 0.0) {
        return Err(CalcError::configuration(format!(
            "course {} has non-positive {} max {}",
            key, what, bad
        )));
    }
    Ok(())
}

impl CourseCatalog {
    pub fn new(courses: BTreeMap<String, CourseMaxes>) -> Self {
        Self { courses }
    }

    /// Checks every course against the scheme's test counts and fills in `custom` when absent.
    pub fn validated(mut self, pt_count: usize, nt_count: usize) -> Result<Self, CalcError> {
        self.courses
            .entry(CUSTOM_COURSE.to_string())
            .or_insert_with(|| CourseMaxes {
                pt_maxes: vec![100.0; pt_count],
                nt_maxes: vec![100.0; nt_count],
            });
        for (key, c) in &self.courses {
            if key.trim().is_empty() {
                return Err(CalcError::configuration("course key must not be empty"));
            }
            check_maxes(key, "PT", &c.pt_maxes, pt_count)?;
            check_maxes(key, "NT", &c.nt_maxes, nt_count)?;
        }
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&CourseMaxes> {
        self.courses.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CourseMaxes)> {
        self.courses.iter()
    }
}
