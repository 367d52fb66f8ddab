//! Markdown body rendering.

use regex::Regex;

use crate::spec::{Block, ManualSpec};

use super::{default_columns, fit_row};

fn clean_md(text: &str) -> String {
    let ws = Regex::new(r"\s+").unwrap();
    ws.replace_all(text, " ").trim().to_string()
}

/// Render the spec as a Markdown body with reconciliation tokens.
pub fn to_markdown(spec: &ManualSpec) -> String {
    let mut lines: Vec<String> = Vec::new();

    for section in spec.sections_in_order() {
        let depth = section.level.clamp(1, 6) as usize;
        lines.push(format!("{} {}", "#".repeat(depth), clean_md(&section.title)));
        lines.push(String::new());

        for block in &section.blocks {
            lines.push(format!("MANUAL_BLOCK:{}", block.block_id()));
            lines.push(String::new());

            match block {
                Block::Paragraph { text, .. } => {
                    lines.push(clean_md(text));
                }
                Block::BulletList { items, .. } => {
                    for item in items {
                        lines.push(format!("- {}", clean_md(item)));
                    }
                }
                Block::NumberedList { items, .. } => {
                    for (i, item) in items.iter().enumerate() {
                        lines.push(format!("{}. {}", i + 1, clean_md(item)));
                    }
                }
                Block::Table { columns, rows, .. } => {
                    let columns = if columns.is_empty() {
                        default_columns()
                    } else {
                        columns.clone()
                    };
                    lines.push(format!(
                        "| {} |",
                        columns
                            .iter()
                            .map(|c| clean_md(c))
                            .collect::<Vec<_>>()
                            .join(" | ")
                    ));
                    lines.push(format!("| {} |", vec!["---"; columns.len()].join(" | ")));
                    for row in rows {
                        lines.push(format!(
                            "| {} |",
                            fit_row(row, columns.len())
                                .iter()
                                .map(|c| clean_md(c))
                                .collect::<Vec<_>>()
                                .join(" | ")
                        ));
                    }
                }
                Block::Figure {
                    figure_id,
                    caption,
                    image_rel,
                    ..
                } => {
                    lines.push(format!("MANUAL_FIG:{}", figure_id));
                    lines.push(String::new());
                    lines.push(format!("![{}]({})", clean_md(caption), image_rel));
                }
            }
            lines.push(String::new());
        }
    }

    let mut body = lines.join("\n");
    while body.ends_with('\n') {
        body.pop();
    }
    body.push('\n');
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ManualSpec {
        ManualSpec::from_json(
            r#"{
                "meta": {"spec_version": "1.0", "locale": "en", "url": "u", "host": "h",
                         "app_target": "Example", "generator_mode": "rules"},
                "sections": [
                    {"section_id": "flows", "title": "Example   Task Flows", "order": 1, "blocks": [
                        {"type": "numbered_list", "block_id": "flows.flow_steps",
                         "items": ["Open the page", "Type a query"]},
                        {"type": "table", "block_id": "flows.controls",
                         "columns": ["Control", "Type"],
                         "rows": [["Search box", "input", "extra cell"]]},
                        {"type": "figure", "block_id": "flows.fig", "figure_id": "results",
                         "caption": "Search  results", "image_rel": "figures/results.png",
                         "anchor_section_id": "flows", "order": 1}
                    ]}
                ],
                "trace": {"rules_used": ["base"], "llm_rewrite_applied": false, "fallbacks": []}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_heading_and_tokens() {
        let body = to_markdown(&spec());
        assert!(body.starts_with("# Example Task Flows\n"));
        assert!(body.contains("MANUAL_BLOCK:flows.flow_steps"));
        assert!(body.contains("MANUAL_FIG:results"));
    }

    #[test]
    fn test_numbered_items_and_table() {
        let body = to_markdown(&spec());
        assert!(body.contains("1. Open the page\n2. Type a query"));
        assert!(body.contains("| Control | Type |"));
        assert!(body.contains("| --- | --- |"));
        // Row truncated to the column count
        assert!(body.contains("| Search box | input |"));
        assert!(!body.contains("extra cell"));
    }

    #[test]
    fn test_figure_image_link() {
        let body = to_markdown(&spec());
        assert!(body.contains("![Search results](figures/results.png)"));
    }
}
