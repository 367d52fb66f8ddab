//! Structural extraction from the companion LaTeX source.
//!
//! Legacy mode has no placeholder tokens, so the content to reconcile is
//! pulled straight out of the rendered `.tex` file: `itemize` items under a
//! `\section`, `longtable` rows under a `\subsection`, `enumerate` steps,
//! and `\screenshotbox` figures. This is delimiter matching on known
//! environments, not LaTeX parsing.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::Result;

/// A loaded LaTeX source queried for section content.
#[derive(Debug, Clone)]
pub struct LatexSource {
    text: String,
}

impl LatexSource {
    /// Read a `.tex` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(fs::read_to_string(path)?))
    }

    /// Wrap LaTeX text already in memory.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Items of the first `itemize` environment under the named `\section`.
    pub fn itemize(&self, section: &str) -> Vec<String> {
        self.env_items("section", section, "itemize")
    }

    /// Items of the first `enumerate` environment under the named
    /// `\subsection`.
    pub fn enumerate(&self, subsection: &str) -> Vec<String> {
        self.env_items("subsection", subsection, "enumerate")
    }

    /// Data rows of the first `longtable` under the named `\subsection`:
    /// the lines between `\endhead` and `\bottomrule`, split on `&`.
    /// Rows with fewer than three cells are dropped, wider ones truncated.
    pub fn table(&self, subsection: &str) -> Vec<Vec<String>> {
        let pattern = format!(
            r"(?s)\\subsection\{{{}\}}.*?\\begin\{{longtable\}}.*?\\endhead(.*?)\\bottomrule",
            regex::escape(subsection)
        );
        let re = Regex::new(&pattern).unwrap();
        let body = match re.captures(&self.text) {
            Some(c) => c.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
            None => return Vec::new(),
        };

        let mut rows = Vec::new();
        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() || !line.ends_with(r"\\") {
                continue;
            }
            let line = line[..line.len() - 2].trim();
            let cells: Vec<String> = line.split('&').map(|c| clean_latex_text(c)).collect();
            if cells.len() >= 3 {
                rows.push(cells[..3].to_vec());
            }
        }
        rows
    }

    /// Every `\screenshotbox{image}{caption}{note}` in source order as
    /// `(image_rel, caption)` pairs.
    pub fn screenshots(&self) -> Vec<(String, String)> {
        let re = Regex::new(r"\\screenshotbox\{([^}]*)\}\{([^}]*)\}\{([^}]*)\}").unwrap();
        re.captures_iter(&self.text)
            .map(|c| (c[1].trim().to_string(), c[2].trim().to_string()))
            .collect()
    }

    fn env_items(&self, delimiter: &str, name: &str, env: &str) -> Vec<String> {
        let pattern = format!(
            r"(?s)\\{}\{{{}\}}.*?\\begin\{{{}\}}(.*?)\\end\{{{}\}}",
            delimiter,
            regex::escape(name),
            env,
            env
        );
        let re = Regex::new(&pattern).unwrap();
        let body = match re.captures(&self.text) {
            Some(c) => c.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
            None => return Vec::new(),
        };
        let item_re = Regex::new(r"\\item\s+(.*)").unwrap();
        item_re
            .captures_iter(&body)
            .map(|c| clean_latex_text(c[1].trim()))
            .collect()
    }
}

/// Strip the LaTeX markup the renderer emits: unwrap `\texttt`/`\url`,
/// undo character escapes, collapse whitespace.
pub fn clean_latex_text(s: &str) -> String {
    let texttt = Regex::new(r"\\texttt\{([^}]*)\}").unwrap();
    let url = Regex::new(r"\\url\{([^}]*)\}").unwrap();
    let ws = Regex::new(r"\s+").unwrap();

    let s = texttt.replace_all(s, "$1");
    let s = url.replace_all(&s, "$1");
    let s = s
        .replace(r"\&", "&")
        .replace(r"\%", "%")
        .replace(r"\_", "_")
        .replace(r"\$", "$")
        .replace(r"\#", "#")
        .replace(r"\{", "{")
        .replace(r"\}", "}");
    ws.replace_all(&s, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEX: &str = r#"
\section{Scope}
\begin{itemize}
  \item Covers the public home page of \url{https://example.com}.
  \item Signed-out state only \& desktop layout.
\end{itemize}

\section{Links and Buttons Mapping}
\subsection{Top Navigation}
\begin{longtable}{p{0.3\linewidth} p{0.3\linewidth} p{0.3\linewidth}}
\toprule
Control & Type & Function \\
\midrule
\endhead
Search box & input & Query entry \\
\texttt{Mic} & button & Voice search \\
short & row \\
\bottomrule
\end{longtable}

\section{Example Task Flows}
\subsection{Flow A: Search for a Video}
\begin{enumerate}
  \item Open the home page.
  \item Type a query
    across lines.
\end{enumerate}
\screenshotbox{figures/home.png}{Home page overview}{Captured from live UI}
\screenshotbox{figures/results.png}{Search results}{Captured from live UI}
"#;

    #[test]
    fn test_itemize_extraction() {
        let tex = LatexSource::new(TEX);
        let items = tex.itemize("Scope");
        assert_eq!(
            items,
            vec![
                "Covers the public home page of https://example.com.",
                "Signed-out state only & desktop layout."
            ]
        );
        assert!(tex.itemize("Missing Section").is_empty());
    }

    #[test]
    fn test_table_rows() {
        let tex = LatexSource::new(TEX);
        let rows = tex.table("Top Navigation");
        // The two-cell line is dropped
        assert_eq!(
            rows,
            vec![
                vec!["Search box", "input", "Query entry"],
                vec!["Mic", "button", "Voice search"],
            ]
        );
    }

    #[test]
    fn test_enumerate_single_line_items() {
        let tex = LatexSource::new(TEX);
        let steps = tex.enumerate("Flow A: Search for a Video");
        // \item captures to end of line only; the continuation is not part
        // of the step
        assert_eq!(steps[0], "Open the home page.");
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_screenshots_in_order() {
        let tex = LatexSource::new(TEX);
        let shots = tex.screenshots();
        assert_eq!(
            shots,
            vec![
                ("figures/home.png".to_string(), "Home page overview".to_string()),
                ("figures/results.png".to_string(), "Search results".to_string()),
            ]
        );
    }

    #[test]
    fn test_clean_latex_text() {
        assert_eq!(clean_latex_text(r"\texttt{yt-icon} \& more"), "yt-icon & more");
        assert_eq!(clean_latex_text("spread   over\n lines"), "spread over lines");
        assert_eq!(clean_latex_text(r"100\% \_done\_"), "100% _done_");
    }
}
