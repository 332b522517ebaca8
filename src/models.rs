//! Data models for enrollment aggregation.
//!
//! This module contains the raw spreadsheet record and the derived
//! department/section hierarchy handed to the renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel used as the grouping key (or faculty name) when a text field is absent.
pub const MISSING_KEY: &str = "";

/// Name of the hierarchy's root node.
pub const ROOT_NAME: &str = "Departments";

/// Column headers the first sheet must carry.
pub const DEPARTMENT_HEADER: &str = "Department";
pub const SECTION_HEADER: &str = "Section_Name";
pub const FACULTY_HEADER: &str = "Faculty";
pub const STUDENT_COUNT_HEADER: &str = "Student_Count";

/// One row of the source spreadsheet.
///
/// Every field is optional because a row may leave any cell blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    #[serde(rename = "Department")]
    pub department: Option<String>,
    #[serde(rename = "Section_Name")]
    pub section_name: Option<String>,
    #[serde(rename = "Faculty")]
    pub faculty: Option<String>,
    /// `None` when the cell is blank or not a non-negative whole number.
    #[serde(rename = "Student_Count")]
    pub student_count: Option<u64>,
}

impl EnrollmentRecord {
    /// Creates a fully populated record.
    #[cfg(test)]
    pub fn new(department: &str, section_name: &str, faculty: &str, student_count: u64) -> Self {
        Self {
            department: Some(department.to_string()),
            section_name: Some(section_name.to_string()),
            faculty: Some(faculty.to_string()),
            student_count: Some(student_count),
        }
    }

    /// Department grouping key, or [`MISSING_KEY`].
    pub fn department_key(&self) -> &str {
        self.department.as_deref().unwrap_or(MISSING_KEY)
    }

    /// Section grouping key, or [`MISSING_KEY`].
    pub fn section_key(&self) -> &str {
        self.section_name.as_deref().unwrap_or(MISSING_KEY)
    }

    /// Faculty name, or [`MISSING_KEY`].
    pub fn faculty_name(&self) -> &str {
        self.faculty.as_deref().unwrap_or(MISSING_KEY)
    }
}

/// Aggregated figures for one section of a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub name: String,
    /// Sum of `Student_Count` over the section's records.
    pub student_count: u64,
    /// Distinct faculty names in first-seen order, joined with `", "`.
    pub professors: String,
}

impl SectionSummary {
    /// Hover payload for this section.
    pub fn tooltip(&self) -> Tooltip {
        Tooltip {
            name: self.name.clone(),
            professors: self.professors.clone(),
            total_students: self.student_count,
        }
    }
}

/// Aggregated figures for one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub name: String,
    pub total_students: u64,
    /// Distinct faculty across the whole department, not per section.
    pub unique_professor_count: usize,
    pub sections: Vec<SectionSummary>,
}

impl DepartmentSummary {
    /// Hover payload for this department.
    ///
    /// Departments show the number of distinct professors in place of a name list.
    pub fn tooltip(&self) -> Tooltip {
        Tooltip {
            name: self.name.clone(),
            professors: self.unique_professor_count.to_string(),
            total_students: self.total_students,
        }
    }
}

/// Root of the department → section tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hierarchy {
    pub name: String,
    pub departments: Vec<DepartmentSummary>,
    /// Records whose `Student_Count` was missing or unusable.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub uncounted_records: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Hierarchy {
    /// Creates an empty hierarchy under the standard root name.
    pub fn new() -> Self {
        Self {
            name: ROOT_NAME.to_string(),
            departments: Vec::new(),
            uncounted_records: 0,
        }
    }

    /// Total students across every department, saturating at `u64::MAX`.
    pub fn total_students(&self) -> u64 {
        self.departments
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(d.total_students))
    }

    /// Number of sections across every department.
    pub fn section_count(&self) -> usize {
        self.departments.iter().map(|d| d.sections.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self::new()
    }
}

/// The fields shown when hovering a treemap node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub name: String,
    pub professors: String,
    pub total_students: u64,
}

impl fmt::Display for Tooltip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let professors = if self.professors.is_empty() {
            "N/A"
        } else {
            &self.professors
        };
        write!(
            f,
            "{}\nProfessors: {}\nTotal Students: {}",
            self.name, professors, self.total_students
        )
    }
}

/// Metadata about one run of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// URL or path the spreadsheet was read from.
    pub source: String,
    /// Name of the sheet that was read.
    pub sheet_name: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of data rows read from the sheet.
    pub records_read: usize,
    /// Wall-clock duration of the run in seconds.
    pub duration_seconds: f64,
}

/// Everything the renderers need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Heading used by the HTML and Markdown outputs.
    pub title: String,
    pub metadata: ReportMetadata,
    pub hierarchy: Hierarchy,
}
