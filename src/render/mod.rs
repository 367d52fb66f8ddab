//! Flat renderings of a manual spec.
//!
//! The LaTeX and Markdown bodies carry `MANUAL_BLOCK:` / `MANUAL_FIG:`
//! tokens ahead of each block so a document built from them can later be
//! reconciled in token mode. Bodies are substituted into user templates via
//! `__TOKEN__` placeholders.

mod latex;
mod markdown;

pub use latex::{tex_escape, to_latex};
pub use markdown::to_markdown;

use crate::spec::ManualSpec;

/// Substitute the spec's metadata and rendered bodies into a template.
///
/// Recognized placeholders: `__APP_TARGET__`, `__MANUAL_DATE__`,
/// `__TEST_URL__`, `__HOST__`, `__TEX_BODY__`, `__MD_BODY__`. Unknown
/// placeholders are left untouched.
pub fn apply_template(template: &str, spec: &ManualSpec) -> String {
    let date = spec
        .meta
        .generated_at
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    template
        .replace("__APP_TARGET__", &spec.meta.app_target)
        .replace("__MANUAL_DATE__", &date)
        .replace("__TEST_URL__", &spec.meta.url)
        .replace("__HOST__", &spec.meta.host)
        .replace("__TEX_BODY__", &to_latex(spec))
        .replace("__MD_BODY__", &to_markdown(spec))
}

/// Pad or truncate a table row to the column count.
fn fit_row<'a>(row: &'a [String], columns: usize) -> Vec<&'a str> {
    (0..columns)
        .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
        .collect()
}

/// Fallback header when a table block declares no columns.
fn default_columns() -> Vec<String> {
    vec![
        "Column 1".to_string(),
        "Column 2".to_string(),
        "Column 3".to_string(),
    ]
}
