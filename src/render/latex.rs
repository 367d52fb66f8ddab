//! LaTeX body rendering.

use crate::spec::{Block, ManualSpec};

use super::{default_columns, fit_row};

/// Escape LaTeX special characters in prose.
pub fn tex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' => out.push_str(r"\&"),
            '%' => out.push_str(r"\%"),
            '$' => out.push_str(r"\$"),
            '#' => out.push_str(r"\#"),
            '_' => out.push_str(r"\_"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the spec as a LaTeX body with reconciliation tokens.
///
/// Block tokens ride in comments so the compiled PDF stays clean; the DOCX
/// renderer turns them into visible placeholder paragraphs instead.
pub fn to_latex(spec: &ManualSpec) -> String {
    let mut lines: Vec<String> = Vec::new();

    for section in spec.sections_in_order() {
        if section.level <= 1 {
            lines.push(format!(r"\section{{{}}}", tex_escape(&section.title)));
        } else {
            lines.push(format!(r"\subsection{{{}}}", tex_escape(&section.title)));
        }

        for block in &section.blocks {
            lines.push(format!("% MANUAL_BLOCK:{}", block.block_id()));
            match block {
                Block::Paragraph { text, .. } => {
                    lines.push(tex_escape(text));
                    lines.push(String::new());
                }
                Block::BulletList { items, .. } => {
                    lines.push(r"\begin{itemize}".to_string());
                    for item in items {
                        lines.push(format!(r"  \item {}", tex_escape(item)));
                    }
                    lines.push(r"\end{itemize}".to_string());
                }
                Block::NumberedList { items, .. } => {
                    lines.push(r"\begin{enumerate}".to_string());
                    for item in items {
                        lines.push(format!(r"  \item {}", tex_escape(item)));
                    }
                    lines.push(r"\end{enumerate}".to_string());
                }
                Block::Table { columns, rows, .. } => {
                    let columns = if columns.is_empty() {
                        default_columns()
                    } else {
                        columns.clone()
                    };
                    let width = 0.92 / columns.len() as f64;
                    let layout = columns
                        .iter()
                        .map(|_| format!(r"p{{{:.2}\linewidth}}", width))
                        .collect::<Vec<_>>()
                        .join(" ");
                    lines.push(format!(r"\begin{{longtable}}{{{}}}", layout));
                    lines.push(r"\toprule".to_string());
                    lines.push(format!(
                        r"{} \\",
                        columns
                            .iter()
                            .map(|c| tex_escape(c))
                            .collect::<Vec<_>>()
                            .join(" & ")
                    ));
                    lines.push(r"\midrule".to_string());
                    lines.push(r"\endhead".to_string());
                    for row in rows {
                        lines.push(format!(
                            r"{} \\",
                            fit_row(row, columns.len())
                                .iter()
                                .map(|c| tex_escape(c))
                                .collect::<Vec<_>>()
                                .join(" & ")
                        ));
                    }
                    lines.push(r"\bottomrule".to_string());
                    lines.push(r"\end{longtable}".to_string());
                }
                Block::Figure {
                    figure_id,
                    caption,
                    image_rel,
                    ..
                } => {
                    lines.push(format!("% MANUAL_FIG:{}", figure_id));
                    lines.push(format!(
                        r"\screenshotbox{{{}}}{{{}}}{{Captured from live UI}}",
                        tex_escape(image_rel),
                        tex_escape(caption)
                    ));
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

    #[test]
    fn test_tex_escape() {
        assert_eq!(tex_escape("50% & rising"), r"50\% \& rising");
        assert_eq!(tex_escape("a_b"), r"a\_b");
        assert_eq!(tex_escape("x^2"), r"x\textasciicircum{}2");
    }

    fn spec() -> ManualSpec {
        ManualSpec::from_json(
            r#"{
                "meta": {"spec_version": "1.0", "locale": "en", "url": "u", "host": "h",
                         "app_target": "Example", "generator_mode": "rules"},
                "sections": [
                    {"section_id": "nav", "title": "Top Navigation", "level": 2, "order": 2, "blocks": [
                        {"type": "table", "block_id": "nav.controls",
                         "columns": ["Control", "Type", "Function"],
                         "rows": [["Search box", "input", "Query entry"], ["Mic"]]}
                    ]},
                    {"section_id": "scope", "title": "Scope", "order": 1, "blocks": [
                        {"type": "bullet_list", "block_id": "scope.items", "items": ["100% coverage"]},
                        {"type": "figure", "block_id": "scope.fig", "figure_id": "home",
                         "caption": "Home page", "image_rel": "figures/home.png",
                         "anchor_section_id": "scope", "order": 1}
                    ]}
                ],
                "trace": {"rules_used": ["base"], "llm_rewrite_applied": false, "fallbacks": []}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_sections_rendered_in_order_with_tokens() {
        let body = to_latex(&spec());
        let scope = body.find(r"\section{Scope}").unwrap();
        let nav = body.find(r"\subsection{Top Navigation}").unwrap();
        assert!(scope < nav, "sections must follow the order field");
        assert!(body.contains("% MANUAL_BLOCK:scope.items"));
        assert!(body.contains("% MANUAL_FIG:home"));
        assert!(body.contains(r"\screenshotbox{figures/home.png}{Home page}{Captured from live UI}"));
    }

    #[test]
    fn test_table_rows_padded() {
        let body = to_latex(&spec());
        assert!(body.contains(r"Search box & input & Query entry \\"));
        // The short row gains empty trailing cells
        assert!(body.contains(r"Mic &  & "));
        assert!(body.contains(r"\endhead"));
    }

    #[test]
    fn test_escaping_in_items() {
        let body = to_latex(&spec());
        assert!(body.contains(r"\item 100\% coverage"));
    }
}
