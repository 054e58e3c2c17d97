use crate::error::GradecardResult;
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_skip_rows() -> usize {
    2 // title row + Min/Max sub-header row
}

fn default_placeholder() -> String {
    "...".to_string()
}

fn default_noise_substrings() -> Vec<String> {
    vec![
        "SEAT NO".to_string(),
        "University Of Mumbai".to_string(),
        "PAGE :".to_string(),
        "#:".to_string(),
        "ADC:".to_string(),
        "%Marks".to_string(),
        "Grade O".to_string(),
        "GRADE POINT".to_string(),
        "NEP 2020".to_string(),
        "TERM WORK".to_string(),
        "ORAL (".to_string(),
        "External (".to_string(),
        "Internal(".to_string(),
        "TOT GP".to_string(),
        "õC".to_string(),
        "õCG".to_string(),
    ]
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Column layout of the first-page course table
    #[serde(default)]
    pub catalog: CatalogLayout,
    /// Page furniture that must never end up inside a student block
    #[serde(default)]
    pub noise: NoiseConfig,
    /// Accepted domain for the cumulative grade average
    #[serde(default)]
    pub grade_average: GradeAverageRange,
}

/// Where things live in the course table. Max marks is always the last cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogLayout {
    /// Leading header rows of each table that never hold subjects
    pub skip_rows: usize,
    pub credits_column: usize,
    /// "Max" sub-column of each component; a numeric value there means the
    /// subject grades that component
    pub internal_max_column: usize,
    pub external_max_column: usize,
    pub term_work_max_column: usize,
    pub oral_max_column: usize,
    /// Token the sheet prints for "not applicable"
    pub placeholder: String,
}

impl Default for CatalogLayout {
    fn default() -> Self {
        // 0: Code, 1: Title, 2: Credits, 3/4: I1 Min/Max, 5/6: E1 Min/Max,
        // 7/8: T1 Min/Max, 9/10: O1 Min/Max, 11/12: Total Min/Max
        Self {
            skip_rows: default_skip_rows(),
            credits_column: 2,
            internal_max_column: 4,
            external_max_column: 6,
            term_work_max_column: 8,
            oral_max_column: 10,
            placeholder: default_placeholder(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// A line containing any of these is a repeated header/footer
    #[serde(default = "default_noise_substrings")]
    pub header_footer_substrings: Vec<String>,
    /// Drop lines whose first token (minus a trailing colon) is a catalog code
    #[serde(default = "default_true")]
    pub filter_subject_banners: bool,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            header_footer_substrings: default_noise_substrings(),
            filter_subject_banners: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeAverageRange {
    pub min: f64,
    pub max: f64,
}

impl Default for GradeAverageRange {
    fn default() -> Self {
        Self { min: 0.0, max: 10.0 }
    }
}

impl GradeAverageRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl ParsingConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> GradecardResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParsingConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                log::warn!("⚠️  Failed to load config from {}: {}, using defaults", p, e);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "noise:\n  header_footer_substrings: [\"FOOTER\"]\n";
        let config: ParsingConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.noise.header_footer_substrings, vec!["FOOTER"]);
        assert!(config.noise.filter_subject_banners);
        assert_eq!(config.catalog.oral_max_column, 10);
        assert_eq!(config.catalog.placeholder, "...");
        assert!(config.grade_average.contains(10.0));
        assert!(!config.grade_average.contains(10.01));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ParsingConfig::load_with_fallback(Some("/nonexistent/gradecard.yaml"));
        assert_eq!(config.catalog.skip_rows, 2);
        assert!(config
            .noise
            .header_footer_substrings
            .iter()
            .any(|s| s == "SEAT NO"));
    }
}
