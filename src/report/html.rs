//! HTML treemap rendering.
//!
//! Writes a standalone page with an inline SVG. Every department and
//! section rectangle carries a `<title>` so browsers show the tooltip on
//! hover; no scripts are needed.

use crate::layout::LayoutNode;
use crate::models::Report;

/// Fill colors by depth: root, department, section.
const ROOT_FILL: &str = "#e3f2fd";
const DEPARTMENT_FILL: &str = "#76e5c5";
const SECTION_FILL: &str = "#e3d0e6";

/// Rendering knobs that are not part of the layout itself.
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    pub width: f64,
    pub height: f64,
    pub min_label_width: f64,
    pub min_label_height: f64,
}

/// Generate the HTML page for a laid-out report.
pub fn generate_html_report(report: &Report, nodes: &[LayoutNode], options: &HtmlOptions) -> String {
    let mut page = String::new();
    let title = escape_xml(&report.title);

    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    page.push_str("<meta charset=\"utf-8\">\n");
    page.push_str(&format!("<title>{}</title>\n", title));
    page.push_str("<style>\n");
    page.push_str("  body { font-family: sans-serif; margin: 20px; }\n");
    page.push_str("  svg rect:hover { stroke-width: 2; }\n");
    page.push_str("  .meta { color: #555; font-size: 12px; }\n");
    page.push_str("</style>\n</head>\n<body>\n");
    page.push_str(&format!("<h1>{}</h1>\n", title));

    page.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n",
        coord(options.width),
        coord(options.height),
        coord(options.width),
        coord(options.height)
    ));
    for node in nodes {
        page.push_str(&generate_node(node, options));
    }
    page.push_str("</svg>\n");

    page.push_str(&format!(
        "<p class=\"meta\">{} students in {} departments. Source: {} (sheet {}), generated {}.</p>\n",
        report.hierarchy.total_students(),
        report.hierarchy.departments.len(),
        escape_xml(&report.metadata.source),
        escape_xml(&report.metadata.sheet_name),
        report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    page.push_str("</body>\n</html>\n");

    page
}

/// One `<g>` per node: rectangle, optional tooltip, optional label.
fn generate_node(node: &LayoutNode, options: &HtmlOptions) -> String {
    let mut group = String::new();

    let fill = match node.depth {
        0 => ROOT_FILL,
        1 => DEPARTMENT_FILL,
        _ => SECTION_FILL,
    };

    group.push_str(&format!(
        "  <g transform=\"translate({}, {})\">\n",
        coord(node.x0),
        coord(node.y0)
    ));

    match node.tooltip {
        Some(ref tooltip) if !node.name.is_empty() => {
            group.push_str(&format!(
                "    <rect width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"black\"><title>{}</title></rect>\n",
                coord(node.width()),
                coord(node.height()),
                fill,
                escape_xml(&tooltip.to_string())
            ));
        }
        _ => {
            group.push_str(&format!(
                "    <rect width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"black\"/>\n",
                coord(node.width()),
                coord(node.height()),
                fill
            ));
        }
    }

    if node.width() >= options.min_label_width && node.height() >= options.min_label_height {
        group.push_str(&format!(
            "    <text x=\"5\" y=\"15\" font-size=\"10px\" font-weight=\"bold\" fill=\"black\" style=\"pointer-events: none\">{}</text>\n",
            escape_xml(&node.name)
        ));
    }

    group.push_str("  </g>\n");
    group
}

/// Format a coordinate with at most two decimals.
fn coord(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
