//! Squarified treemap layout.
//!
//! Assigns a rectangle to every node of the hierarchy: the root fills the
//! canvas, departments and sections are tiled inside their parent with
//! areas proportional to student counts.

use crate::models::{Hierarchy, Tooltip};
use std::collections::VecDeque;

/// Target aspect ratio for squarified rows.
const PHI: f64 = 1.618_033_988_749_895;

/// Canvas size and padding for the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub width: f64,
    pub height: f64,
    /// Space between an internal node's edge and its children.
    pub padding_outer: f64,
    /// Space between adjacent siblings.
    pub padding_inner: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            width: 1900.0,
            height: 800.0,
            padding_outer: 25.0,
            padding_inner: 5.0,
        }
    }
}

/// A positioned node, ready to be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    /// 0 for the root, 1 for departments, 2 for sections.
    pub depth: usize,
    pub name: String,
    /// Weight used for tiling (student count, summed for internal nodes).
    pub value: f64,
    /// Hover payload; the root has none.
    pub tooltip: Option<Tooltip>,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl LayoutNode {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

#[derive(Debug)]
struct TreeNode {
    name: String,
    value: f64,
    tooltip: Option<Tooltip>,
    children: Vec<TreeNode>,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl TreeNode {
    fn leaf(name: &str, value: f64, tooltip: Tooltip) -> Self {
        Self {
            name: name.to_string(),
            value,
            tooltip: Some(tooltip),
            children: Vec::new(),
            x0: 0.0,
            y0: 0.0,
            x1: 0.0,
            y1: 0.0,
        }
    }

    fn branch(name: &str, tooltip: Option<Tooltip>, mut children: Vec<TreeNode>) -> Self {
        // Largest first; the sort is stable so ties keep their input order.
        children.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
        let value = children.iter().map(|c| c.value).sum();
        Self {
            name: name.to_string(),
            value,
            tooltip,
            children,
            x0: 0.0,
            y0: 0.0,
            x1: 0.0,
            y1: 0.0,
        }
    }
}

/// Lay out the hierarchy. Nodes are returned breadth-first, root first.
pub fn layout(hierarchy: &Hierarchy, options: &LayoutOptions) -> Vec<LayoutNode> {
    let departments = hierarchy
        .departments
        .iter()
        .map(|dept| {
            let sections = dept
                .sections
                .iter()
                .map(|s| TreeNode::leaf(&s.name, s.student_count as f64, s.tooltip()))
                .collect();
            TreeNode::branch(&dept.name, Some(dept.tooltip()), sections)
        })
        .collect();

    let mut root = TreeNode::branch(&hierarchy.name, None, departments);
    root.x1 = options.width;
    root.y1 = options.height;
    position(&mut root, 0.0, options);

    flatten(root)
}

/// Shrink a node by `pad` on every side, then tile its children.
fn position(node: &mut TreeNode, pad: f64, options: &LayoutOptions) {
    let (x0, x1) = shrink(node.x0 + pad, node.x1 - pad);
    let (y0, y1) = shrink(node.y0 + pad, node.y1 - pad);
    node.x0 = x0;
    node.y0 = y0;
    node.x1 = x1;
    node.y1 = y1;

    if node.children.is_empty() {
        return;
    }

    let child_pad = options.padding_inner / 2.0;
    let inset = options.padding_outer - child_pad;
    let (x0, x1) = shrink(x0 + inset, x1 - inset);
    let (y0, y1) = shrink(y0 + inset, y1 - inset);

    squarify(&mut node.children, node.value, x0, y0, x1, y1);

    for child in &mut node.children {
        position(child, child_pad, options);
    }
}

/// Collapse an inverted interval to its midpoint.
fn shrink(lo: f64, hi: f64) -> (f64, f64) {
    if hi < lo {
        let mid = (lo + hi) / 2.0;
        (mid, mid)
    } else {
        (lo, hi)
    }
}

/// `Math.max` semantics: NaN if either side is NaN.
fn nan_max(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// Tile `nodes` into the rectangle in rows whose aspect ratio stays near PHI.
fn squarify(nodes: &mut [TreeNode], parent_value: f64, mut x0: f64, mut y0: f64, x1: f64, y1: f64) {
    let n = nodes.len();
    let mut value = parent_value;
    let mut i0 = 0;
    let mut i1 = 0;

    while i0 < n {
        let dx = x1 - x0;
        let dy = y1 - y0;

        // Start the row at the next non-empty node.
        let mut sum_value;
        loop {
            sum_value = nodes[i1].value;
            i1 += 1;
            if (sum_value != 0.0 && !sum_value.is_nan()) || i1 >= n {
                break;
            }
        }

        let mut min_value = sum_value;
        let mut max_value = sum_value;
        let alpha = nan_max(dy / dx, dx / dy) / (value * PHI);
        let mut beta = sum_value * sum_value * alpha;
        let mut min_ratio = nan_max(max_value / beta, beta / min_value);

        // Keep adding nodes while the worst aspect ratio does not get worse.
        while i1 < n {
            let node_value = nodes[i1].value;
            sum_value += node_value;
            if node_value < min_value {
                min_value = node_value;
            }
            if node_value > max_value {
                max_value = node_value;
            }
            beta = sum_value * sum_value * alpha;
            let new_ratio = nan_max(max_value / beta, beta / min_value);
            if new_ratio > min_ratio {
                sum_value -= node_value;
                break;
            }
            min_ratio = new_ratio;
            i1 += 1;
        }

        let row = &mut nodes[i0..i1];
        if dx < dy {
            let row_y0 = y0;
            let row_y1 = if value != 0.0 {
                y0 += dy * sum_value / value;
                y0
            } else {
                y1
            };
            dice(row, sum_value, x0, row_y0, x1, row_y1);
        } else {
            let row_x0 = x0;
            let row_x1 = if value != 0.0 {
                x0 += dx * sum_value / value;
                x0
            } else {
                x1
            };
            slice(row, sum_value, row_x0, y0, row_x1, y1);
        }

        value -= sum_value;
        i0 = i1;
    }
}

/// Place a row left to right across the rectangle.
fn dice(row: &mut [TreeNode], row_value: f64, mut x0: f64, y0: f64, x1: f64, y1: f64) {
    let k = if row_value != 0.0 { (x1 - x0) / row_value } else { 0.0 };
    for node in row {
        node.y0 = y0;
        node.y1 = y1;
        node.x0 = x0;
        x0 += node.value * k;
        node.x1 = x0;
    }
}

/// Place a row top to bottom down the rectangle.
fn slice(row: &mut [TreeNode], row_value: f64, x0: f64, mut y0: f64, x1: f64, y1: f64) {
    let k = if row_value != 0.0 { (y1 - y0) / row_value } else { 0.0 };
    for node in row {
        node.x0 = x0;
        node.x1 = x1;
        node.y0 = y0;
        y0 += node.value * k;
        node.y1 = y0;
    }
}

/// Breadth-first: the root, then every department, then every section.
fn flatten(root: TreeNode) -> Vec<LayoutNode> {
    let mut out = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back((root, 0usize));

    while let Some((node, depth)) = queue.pop_front() {
        out.push(LayoutNode {
            depth,
            name: node.name,
            value: node.value,
            tooltip: node.tooltip,
            x0: node.x0,
            y0: node.y0,
            x1: node.x1,
            y1: node.y1,
        });
        for child in node.children {
            queue.push_back((child, depth + 1));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::EnrollmentRecord;

    const EPS: f64 = 1e-6;

    fn area(node: &LayoutNode) -> f64 {
        node.width() * node.height()
    }

    fn contains(outer: &LayoutNode, inner: &LayoutNode) -> bool {
        inner.x0 >= outer.x0 - EPS
            && inner.x1 <= outer.x1 + EPS
            && inner.y0 >= outer.y0 - EPS
            && inner.y1 <= outer.y1 + EPS
    }

    fn unpadded(width: f64, height: f64) -> LayoutOptions {
        LayoutOptions {
            width,
            height,
            padding_outer: 0.0,
            padding_inner: 0.0,
        }
    }

    #[test]
    fn test_single_section_padding() {
        let hierarchy = aggregate(&[EnrollmentRecord::new("CS", "A", "Smith", 10)]);
        let nodes = layout(&hierarchy, &LayoutOptions::default());

        assert_eq!(nodes.len(), 3);

        let root = &nodes[0];
        assert_eq!(root.depth, 0);
        assert!(root.tooltip.is_none());
        assert_eq!((root.x0, root.y0, root.x1, root.y1), (0.0, 0.0, 1900.0, 800.0));

        let dept = &nodes[1];
        assert_eq!(dept.depth, 1);
        assert_eq!((dept.x0, dept.y0, dept.x1, dept.y1), (25.0, 25.0, 1875.0, 775.0));

        let section = &nodes[2];
        assert_eq!(section.depth, 2);
        assert_eq!(
            (section.x0, section.y0, section.x1, section.y1),
            (50.0, 50.0, 1850.0, 750.0)
        );
    }

    #[test]
    fn test_leaf_areas_proportional_without_padding() {
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("CS", "A", "Smith", 30),
            EnrollmentRecord::new("CS", "B", "Jones", 10),
            EnrollmentRecord::new("Math", "C", "Lee", 40),
        ]);
        let nodes = layout(&hierarchy, &unpadded(100.0, 80.0));

        let total_area = 100.0 * 80.0;
        for node in nodes.iter().filter(|n| n.depth > 0) {
            let expected = total_area * node.value / 80.0;
            assert!(
                (area(node) - expected).abs() < EPS,
                "{} area {} != {}",
                node.name,
                area(node),
                expected
            );
        }
    }

    #[test]
    fn test_nodes_emitted_breadth_first() {
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("CS", "A", "Smith", 30),
            EnrollmentRecord::new("CS", "B", "Jones", 10),
            EnrollmentRecord::new("Math", "C", "Lee", 50),
        ]);
        let nodes = layout(&hierarchy, &LayoutOptions::default());

        let order: Vec<_> = nodes.iter().map(|n| (n.depth, n.name.as_str())).collect();
        assert_eq!(
            order,
            vec![
                (0, "Departments"),
                (1, "Math"),
                (1, "CS"),
                (2, "C"),
                (2, "A"),
                (2, "B"),
            ]
        );
    }

    #[test]
    fn test_children_sorted_by_value_desc() {
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("Small", "s", "a", 1),
            EnrollmentRecord::new("Big", "b", "a", 100),
            EnrollmentRecord::new("Mid", "m", "a", 10),
        ]);
        let nodes = layout(&hierarchy, &LayoutOptions::default());

        let depts: Vec<_> = nodes
            .iter()
            .filter(|n| n.depth == 1)
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(depts, vec!["Big", "Mid", "Small"]);
    }

    #[test]
    fn test_children_inside_parent() {
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("CS", "A", "Smith", 30),
            EnrollmentRecord::new("CS", "B", "Jones", 12),
            EnrollmentRecord::new("CS", "C", "Jones", 3),
            EnrollmentRecord::new("Math", "D", "Lee", 40),
            EnrollmentRecord::new("Math", "E", "Kim", 8),
            EnrollmentRecord::new("Art", "F", "Ng", 5),
        ]);
        let nodes = layout(&hierarchy, &LayoutOptions::default());

        let root = &nodes[0];
        for node in &nodes {
            assert!(node.x0 <= node.x1 && node.y0 <= node.y1);
            assert!(contains(root, node));
        }
        for section in nodes.iter().filter(|n| n.depth == 2) {
            let inside = nodes
                .iter()
                .filter(|n| n.depth == 1)
                .filter(|dept| contains(dept, section))
                .count();
            assert_eq!(inside, 1, "{} should sit in exactly one department", section.name);
        }
    }

    #[test]
    fn test_zero_value_section_has_no_area() {
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("CS", "A", "Smith", 10),
            EnrollmentRecord::new("CS", "Empty", "Jones", 0),
        ]);
        let nodes = layout(&hierarchy, &unpadded(100.0, 100.0));

        let empty = nodes.iter().find(|n| n.name == "Empty").unwrap();
        assert!(area(empty).abs() < EPS);
        let full = nodes.iter().find(|n| n.name == "A").unwrap();
        assert!((area(full) - 10_000.0).abs() < EPS);
    }

    #[test]
    fn test_all_zero_values_do_not_panic() {
        let hierarchy = aggregate(&[
            EnrollmentRecord::new("CS", "A", "Smith", 0),
            EnrollmentRecord::new("CS", "B", "Smith", 0),
        ]);
        let nodes = layout(&hierarchy, &LayoutOptions::default());
        assert_eq!(nodes.len(), 4);
        for node in nodes.iter().filter(|n| n.depth == 2) {
            assert!(area(node).abs() < EPS);
        }
    }

    #[test]
    fn test_empty_hierarchy_is_just_root() {
        let nodes = layout(&Hierarchy::new(), &LayoutOptions::default());
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name, "Departments");
    }

    #[test]
    fn test_padding_larger_than_canvas_collapses() {
        let hierarchy = aggregate(&[EnrollmentRecord::new("CS", "A", "Smith", 10)]);
        let options = LayoutOptions {
            width: 40.0,
            height: 40.0,
            ..LayoutOptions::default()
        };
        let nodes = layout(&hierarchy, &options);

        let section = &nodes[2];
        assert_eq!(section.width(), 0.0);
        assert_eq!(section.height(), 0.0);
        assert_eq!(section.x0, 20.0);
    }
}
