use crate::calc::CalcError;
use crate::courses::{CourseCatalog, CourseMaxes};
use crate::predict::GradingScheme;
use crate::scale::{GradeScale, GradeTier};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Active grading configuration: scheme, scale and course table, all validated together.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub scheme: GradingScheme,
    pub grade_scale: GradeScale,
    pub courses: CourseCatalog,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scheme: GradingScheme::default(),
            grade_scale: GradeScale::default(),
            courses: CourseCatalog::default(),
        }
    }
}

/// Partial config as written in a config file or sent with `calc.config.update`.
/// Missing sections keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigPatch {
    #[serde(default)]
    pub scheme: Option<GradingScheme>,
    #[serde(default)]
    pub grade_scale: Option<Vec<GradeTier>>,
    #[serde(default)]
    pub courses: Option<BTreeMap<String, CourseMaxes>>,
}

impl AppConfig {
    pub fn apply(&self, patch: ConfigPatch) -> Result<AppConfig, CalcError> {
        let scheme = patch.scheme.unwrap_or(self.scheme);
        scheme.validate()?;

        let grade_scale = match patch.grade_scale {
            Some(tiers) => GradeScale::new(tiers)?,
            None => self.grade_scale.clone(),
        };

        let courses = match patch.courses {
            Some(map) => CourseCatalog::new(map),
            None => self.courses.clone(),
        }
        .validated(scheme.pt.test_count, scheme.nt.test_count)?;

        Ok(AppConfig {
            scheme,
            grade_scale,
            courses,
        })
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<AppConfig> {
        let patch: ConfigPatch = serde_json::from_str(text).context("invalid config json")?;
        let cfg = AppConfig::default().apply(patch)?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> anyhow::Result<AppConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.to_string_lossy()))?;
        AppConfig::from_json_str(&text)
            .with_context(|| format!("failed to load config {}", path.to_string_lossy()))
    }

    /// Hex SHA-256 of the canonical JSON form.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_file_yields_defaults() {
        let cfg = AppConfig::from_json_str("{}").expect("config");
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.fingerprint(), AppConfig::default().fingerprint());
    }

    #[test]
    fn config_accepts_short_tier_field_names() {
        let cfg = AppConfig::from_json_str(
            r#"{"gradeScale": [
                {"grade": "P", "min": 40, "point": 1},
                {"grade": "F", "min": 0, "point": 0}
            ]}"#,
        )
        .expect("config");
        assert_eq!(cfg.grade_scale.tiers().len(), 2);
        assert_eq!(cfg.grade_scale.determine_grade(40.0).label, "P");
        assert_ne!(cfg.fingerprint(), AppConfig::default().fingerprint());
    }

    #[test]
    fn scheme_change_revalidates_courses() {
        let patch = ConfigPatch {
            scheme: Some(GradingScheme {
                pt: crate::predict::CategoryPolicy {
                    weight: 0.8,
                    best_k: 3,
                    test_count: 4,
                },
                nt: crate::predict::CategoryPolicy {
                    weight: 0.2,
                    best_k: 2,
                    test_count: 3,
                },
            }),
            ..ConfigPatch::default()
        };
        let e = AppConfig::default()
            .apply(patch)
            .expect_err("default courses list six maxes");
        assert_eq!(e.code, "configuration_error");
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(AppConfig::from_json_str(r#"{"theme": "dark"}"#).is_err());
    }

    #[test]
    fn bad_scale_surfaces_configuration_error() {
        let patch: ConfigPatch = serde_json::from_value(serde_json::json!({
            "gradeScale": [{ "label": "A", "minPercent": 50, "gradePoint": 1 }]
        }))
        .expect("patch shape");
        let e = AppConfig::default().apply(patch).expect_err("no zero floor");
        assert_eq!(e.code, "configuration_error");
    }
}
