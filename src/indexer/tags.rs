use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"202[0-9]").unwrap());

fn default_department_marker() -> String {
    "团组".to_string()
}

fn default_fallback_department() -> String {
    "通用资源".to_string()
}

fn default_year_placeholder() -> String {
    "----".to_string()
}

fn default_category_separator() -> String {
    " > ".to_string()
}

/// Naming conventions used to classify documents by their location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRules {
    /// Substring that marks a directory as a department folder.
    #[serde(default = "default_department_marker")]
    pub department_marker: String,

    #[serde(default = "default_fallback_department")]
    pub fallback_department: String,

    #[serde(default = "default_year_placeholder")]
    pub year_placeholder: String,

    #[serde(default = "default_category_separator")]
    pub category_separator: String,
}

impl Default for TagRules {
    fn default() -> Self {
        Self {
            department_marker: default_department_marker(),
            fallback_department: default_fallback_department(),
            year_placeholder: default_year_placeholder(),
            category_separator: default_category_separator(),
        }
    }
}

impl TagRules {
    /// First directory segment containing the department marker.
    pub fn department(&self, segments: &[String]) -> String {
        segments
            .iter()
            .find(|s| s.contains(&self.department_marker))
            .cloned()
            .unwrap_or_else(|| self.fallback_department.clone())
    }

    /// First `202x` token in the file name.
    pub fn year(&self, file_name: &str) -> String {
        YEAR_PATTERN
            .find(file_name)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| self.year_placeholder.clone())
    }

    pub fn category_path(&self, segments: &[String]) -> String {
        segments.join(&self.category_separator)
    }
}
