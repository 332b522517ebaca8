//! Enrollment aggregation.
//!
//! Groups records by department and then by section, keeping the order in
//! which each key is first seen, and computes the per-level totals.

use crate::models::{DepartmentSummary, EnrollmentRecord, Hierarchy, SectionSummary};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Running totals for one (department, section) group.
#[derive(Debug, Default)]
struct SectionAccumulator {
    name: String,
    student_count: u64,
    professors: Vec<String>,
    seen_professors: HashSet<String>,
}

impl SectionAccumulator {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn add(&mut self, record: &EnrollmentRecord, count: u64) {
        self.student_count += count;

        let faculty = record.faculty_name();
        if self.seen_professors.insert(faculty.to_string()) {
            self.professors.push(faculty.to_string());
        }
    }

    fn finish(self) -> SectionSummary {
        SectionSummary {
            name: self.name,
            student_count: self.student_count,
            professors: self.professors.join(", "),
        }
    }
}

/// Running totals for one department.
#[derive(Debug, Default)]
struct DepartmentAccumulator {
    name: String,
    sections: Vec<SectionAccumulator>,
    section_index: HashMap<String, usize>,
    /// Kept apart from the per-section sets so a professor teaching
    /// several sections is only counted once.
    professors: HashSet<String>,
}

impl DepartmentAccumulator {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn add(&mut self, record: &EnrollmentRecord, count: u64) {
        let key = record.section_key();
        let idx = match self.section_index.get(key) {
            Some(&idx) => idx,
            None => {
                self.sections.push(SectionAccumulator::new(key));
                self.section_index
                    .insert(key.to_string(), self.sections.len() - 1);
                self.sections.len() - 1
            }
        };

        self.sections[idx].add(record, count);
        self.professors.insert(record.faculty_name().to_string());
    }

    fn finish(self) -> DepartmentSummary {
        let sections: Vec<SectionSummary> = self
            .sections
            .into_iter()
            .map(SectionAccumulator::finish)
            .collect();
        let total_students = sections.iter().map(|s| s.student_count).sum();

        DepartmentSummary {
            name: self.name,
            total_students,
            unique_professor_count: self.professors.len(),
            sections,
        }
    }
}

/// Build the department → section hierarchy from flat records.
///
/// A record without a usable `Student_Count` still creates its department
/// and section but adds nothing to the sums; such records are tallied in
/// [`Hierarchy::uncounted_records`]. So is a record whose count would push
/// the overall total past `u64::MAX`.
pub fn aggregate(records: &[EnrollmentRecord]) -> Hierarchy {
    let mut departments: Vec<DepartmentAccumulator> = Vec::new();
    let mut department_index: HashMap<String, usize> = HashMap::new();
    let mut uncounted = 0;
    // Every section and department sum is bounded by this, so none can overflow.
    let mut grand_total: u64 = 0;

    for record in records {
        let count = match record.student_count {
            Some(n) => match grand_total.checked_add(n) {
                Some(total) => {
                    grand_total = total;
                    n
                }
                None => {
                    warn!(
                        "Student_Count {} for {}/{} overflows the total; not summed",
                        n,
                        record.department_key(),
                        record.section_key()
                    );
                    uncounted += 1;
                    0
                }
            },
            None => {
                uncounted += 1;
                0
            }
        };

        let key = record.department_key();
        let idx = match department_index.get(key) {
            Some(&idx) => idx,
            None => {
                departments.push(DepartmentAccumulator::new(key));
                department_index.insert(key.to_string(), departments.len() - 1);
                departments.len() - 1
            }
        };

        departments[idx].add(record, count);
    }

    if uncounted > 0 {
        warn!(
            "{} of {} records had no usable Student_Count and were not summed",
            uncounted,
            records.len()
        );
    }

    let mut hierarchy = Hierarchy::new();
    hierarchy.departments = departments
        .into_iter()
        .map(DepartmentAccumulator::finish)
        .collect();
    hierarchy.uncounted_records = uncounted;

    debug!(
        "Aggregated {} records into {} departments, {} sections",
        records.len(),
        hierarchy.departments.len(),
        hierarchy.section_count()
    );

    hierarchy
}

/// Departments ordered by total students (largest first), ties keep input order.
pub fn largest_departments(hierarchy: &Hierarchy, n: usize) -> Vec<&DepartmentSummary> {
    let mut depts: Vec<_> = hierarchy.departments.iter().collect();
    depts.sort_by_key(|d| std::cmp::Reverse(d.total_students));
    depts.truncate(n);
    depts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MISSING_KEY, ROOT_NAME};

    fn sample_records() -> Vec<EnrollmentRecord> {
        vec![
            EnrollmentRecord::new("CS", "A", "Smith", 10),
            EnrollmentRecord::new("CS", "A", "Jones", 5),
            EnrollmentRecord::new("CS", "B", "Smith", 20),
        ]
    }

    #[test]
    fn test_aggregate_example() {
        let hierarchy = aggregate(&sample_records());

        assert_eq!(hierarchy.name, ROOT_NAME);
        assert_eq!(hierarchy.departments.len(), 1);

        let cs = &hierarchy.departments[0];
        assert_eq!(cs.name, "CS");
        assert_eq!(cs.total_students, 35);
        assert_eq!(cs.unique_professor_count, 2);
        assert_eq!(cs.sections.len(), 2);

        assert_eq!(cs.sections[0].name, "A");
        assert_eq!(cs.sections[0].student_count, 15);
        assert_eq!(cs.sections[0].professors, "Smith, Jones");

        assert_eq!(cs.sections[1].name, "B");
        assert_eq!(cs.sections[1].student_count, 20);
        assert_eq!(cs.sections[1].professors, "Smith");
    }

    #[test]
    fn test_aggregate_empty_input() {
        let hierarchy = aggregate(&[]);
        assert!(hierarchy.is_empty());
        assert_eq!(hierarchy.total_students(), 0);
        assert_eq!(hierarchy.uncounted_records, 0);
    }

    #[test]
    fn test_zero_count_section_is_kept() {
        let hierarchy = aggregate(&[EnrollmentRecord::new("Math", "Calc", "Lee", 0)]);

        assert_eq!(hierarchy.departments.len(), 1);
        let math = &hierarchy.departments[0];
        assert_eq!(math.total_students, 0);
        assert_eq!(math.sections.len(), 1);
        assert_eq!(math.sections[0].student_count, 0);
    }

    #[test]
    fn test_same_section_lists_faculty_in_first_seen_order() {
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("CS", "A", "Zhou", 1),
            EnrollmentRecord::new("CS", "A", "Adams", 2),
            EnrollmentRecord::new("CS", "A", "Zhou", 3),
        ]);

        let section = &hierarchy.departments[0].sections[0];
        assert_eq!(section.professors, "Zhou, Adams");
        assert_eq!(section.student_count, 6);
    }

    #[test]
    fn test_first_seen_order_not_sorted() {
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("Physics", "Z", "P1", 1),
            EnrollmentRecord::new("Biology", "M", "B1", 1),
            EnrollmentRecord::new("Physics", "A", "P2", 1),
            EnrollmentRecord::new("Art", "X", "A1", 1),
        ]);

        let names: Vec<_> = hierarchy.departments.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Physics", "Biology", "Art"]);

        let sections: Vec<_> = hierarchy.departments[0]
            .sections
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(sections, vec!["Z", "A"]);
    }

    #[test]
    fn test_unique_professors_not_summed_across_sections() {
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("CS", "A", "Smith", 1),
            EnrollmentRecord::new("CS", "B", "Smith", 1),
            EnrollmentRecord::new("CS", "C", "Smith", 1),
            EnrollmentRecord::new("CS", "C", "Jones", 1),
        ]);

        let cs = &hierarchy.departments[0];
        let per_section: usize = cs
            .sections
            .iter()
            .map(|s| s.professors.split(", ").count())
            .sum();
        assert_eq!(per_section, 4);
        assert_eq!(cs.unique_professor_count, 2);
    }

    #[test]
    fn test_same_section_name_in_different_departments() {
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("CS", "101", "Smith", 10),
            EnrollmentRecord::new("Math", "101", "Smith", 7),
        ]);

        assert_eq!(hierarchy.departments.len(), 2);
        assert_eq!(hierarchy.departments[0].sections[0].student_count, 10);
        assert_eq!(hierarchy.departments[1].sections[0].student_count, 7);
        assert_eq!(hierarchy.departments[1].unique_professor_count, 1);
    }

    #[test]
    fn test_totals_match_record_sum() {
        let records = vec![
            EnrollmentRecord::new("CS", "A", "Smith", 10),
            EnrollmentRecord::new("Math", "B", "Lee", 4),
            EnrollmentRecord::new("CS", "C", "Jones", 7),
            EnrollmentRecord::new("Math", "B", "Kim", 9),
            EnrollmentRecord::new("Art", "D", "Ng", 0),
        ];
        let expected: u64 = records.iter().filter_map(|r| r.student_count).sum();

        let hierarchy = aggregate(&records);
        assert_eq!(hierarchy.total_students(), expected);

        for dept in &hierarchy.departments {
            let section_total: u64 = dept.sections.iter().map(|s| s.student_count).sum();
            assert_eq!(dept.total_students, section_total);

            let distinct: HashSet<_> = records
                .iter()
                .filter(|r| r.department_key() == dept.name)
                .map(|r| r.faculty_name())
                .collect();
            assert_eq!(dept.unique_professor_count, distinct.len());
        }
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let records = sample_records();
        assert_eq!(aggregate(&records), aggregate(&records));
    }

    #[test]
    fn test_missing_fields_group_under_sentinel() {
        let records = vec![
            EnrollmentRecord {
                department: None,
                section_name: None,
                faculty: None,
                student_count: Some(3),
            },
            EnrollmentRecord {
                department: None,
                section_name: None,
                faculty: Some("Smith".to_string()),
                student_count: Some(4),
            },
        ];

        let hierarchy = aggregate(&records);
        assert_eq!(hierarchy.departments.len(), 1);

        let dept = &hierarchy.departments[0];
        assert_eq!(dept.name, MISSING_KEY);
        assert_eq!(dept.total_students, 7);
        // The absent faculty counts as its own distinct entry.
        assert_eq!(dept.unique_professor_count, 2);
        assert_eq!(dept.sections[0].name, MISSING_KEY);
        assert_eq!(dept.sections[0].professors, ", Smith");
    }

    #[test]
    fn test_missing_count_is_flagged_not_summed() {
        let records = vec![
            EnrollmentRecord::new("CS", "A", "Smith", 10),
            EnrollmentRecord {
                student_count: None,
                ..EnrollmentRecord::new("CS", "A", "Jones", 0)
            },
        ];

        let hierarchy = aggregate(&records);
        let section = &hierarchy.departments[0].sections[0];
        assert_eq!(section.student_count, 10);
        assert_eq!(section.professors, "Smith, Jones");
        assert_eq!(hierarchy.uncounted_records, 1);
    }

    #[test]
    fn test_counts_overflowing_the_total_are_not_summed() {
        let huge = 10_000_000_000_000_000_000;
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("CS", "A", "Smith", huge),
            EnrollmentRecord::new("CS", "A", "Smith", huge),
            EnrollmentRecord::new("Math", "B", "Lee", huge),
        ]);

        assert_eq!(hierarchy.uncounted_records, 2);
        assert_eq!(hierarchy.total_students(), huge);

        let cs = &hierarchy.departments[0];
        assert_eq!(cs.total_students, huge);
        assert_eq!(cs.sections[0].student_count, huge);

        let math = &hierarchy.departments[1];
        assert_eq!(math.total_students, 0);
        assert_eq!(math.sections[0].student_count, 0);
    }

    #[test]
    fn test_largest_departments() {
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("A", "1", "x", 5),
            EnrollmentRecord::new("B", "1", "x", 50),
            EnrollmentRecord::new("C", "1", "x", 5),
            EnrollmentRecord::new("D", "1", "x", 20),
        ]);

        let top: Vec<_> = largest_departments(&hierarchy, 3)
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(top, vec!["B", "D", "A"]);
    }
}
