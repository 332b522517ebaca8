//! Markdown and JSON report generation.
//!
//! The Markdown report summarizes departments and sections in tables; the
//! JSON report is the aggregated hierarchy itself.

use crate::analysis::largest_departments;
use crate::error::DeptmapResult;
use crate::models::{DepartmentSummary, Hierarchy, Report, ReportMetadata};

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.title));
    output.push_str(&generate_metadata_section(&report.metadata, &report.hierarchy));

    if report.hierarchy.is_empty() {
        output.push_str("No enrollment records were found.\n\n");
    } else {
        output.push_str(&generate_departments_section(&report.hierarchy));
        output.push_str(&generate_sections_section(&report.hierarchy));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata, hierarchy: &Hierarchy) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!("- **Sheet:** {}\n", metadata.sheet_name));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records Read:** {}\n", metadata.records_read));
    section.push_str(&format!("- **Departments:** {}\n", hierarchy.departments.len()));
    section.push_str(&format!("- **Sections:** {}\n", hierarchy.section_count()));
    section.push_str(&format!(
        "- **Total Students:** {}\n",
        hierarchy.total_students()
    ));
    if hierarchy.uncounted_records > 0 {
        section.push_str(&format!(
            "- **Records Without Student Count:** {}\n",
            hierarchy.uncounted_records
        ));
    }
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the department overview table, largest first.
fn generate_departments_section(hierarchy: &Hierarchy) -> String {
    let mut section = String::new();

    section.push_str("## Departments\n\n");
    section.push_str("| Department | Sections | Professors | Students |\n");
    section.push_str("|:---|:---:|:---:|---:|\n");

    for dept in largest_departments(hierarchy, hierarchy.departments.len()) {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            display_name(&dept.name),
            dept.sections.len(),
            dept.unique_professor_count,
            dept.total_students
        ));
    }
    section.push('\n');

    section
}

/// Generate one table per department, in source order.
fn generate_sections_section(hierarchy: &Hierarchy) -> String {
    let mut section = String::new();

    section.push_str("## Sections by Department\n\n");
    for dept in &hierarchy.departments {
        section.push_str(&generate_department_block(dept));
    }

    section
}

fn generate_department_block(dept: &DepartmentSummary) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {}\n\n", display_name(&dept.name)));
    block.push_str(&format!(
        "*Students: {} | Professors: {}*\n\n",
        dept.total_students, dept.unique_professor_count
    ));
    block.push_str("| Section | Students | Professors |\n");
    block.push_str("|:---|---:|:---|\n");

    for s in &dept.sections {
        block.push_str(&format!(
            "| {} | {} | {} |\n",
            display_name(&s.name),
            s.student_count,
            escape_cell(&s.professors)
        ));
    }
    block.push('\n');

    block
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by deptmap*\n".to_string()
}

/// Blank grouping keys are shown as a placeholder.
fn display_name(name: &str) -> String {
    if name.is_empty() {
        "*(blank)*".to_string()
    } else {
        escape_cell(name)
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate a JSON report of the hierarchy.
pub fn generate_json_report(hierarchy: &Hierarchy) -> DeptmapResult<String> {
    serde_json::to_string_pretty(hierarchy).map_err(Into::into)
}
