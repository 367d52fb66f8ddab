//! Cardinality reconciliation for lists and tables.
//!
//! Existing paragraphs and rows are templates: growing clones the formatted
//! node, shrinking drops from the tail, and text is overwritten positionally.
//! Run properties, numbering references and cell shading therefore survive a
//! sync untouched.

use crate::docx::document::{cell_text, is_list_paragraph, paragraph_text, set_cell_text, set_paragraph_text};
use crate::docx::{XmlChild, XmlNode};
use crate::sync::anchor::body_elements;

/// Locate the first contiguous run of list paragraphs in `(start, end)`.
///
/// Returns the child index of the first list paragraph and the run length.
/// The run ends at the first non-list child; a second list later in the same
/// range is not part of it.
pub fn find_list_run(body: &XmlNode, start: usize, end: usize) -> Option<(usize, usize)> {
    let mut first = None;
    let mut count = 0;
    for (i, child) in body_elements(body) {
        if i <= start {
            continue;
        }
        if i >= end {
            break;
        }
        if is_list_paragraph(child) {
            if first.is_none() {
                first = Some(i);
            }
            count += 1;
        } else if first.is_some() {
            break;
        }
    }
    first.map(|f| (f, count))
}

/// Locate the first table in `(start, end)` and return its child index.
pub fn find_table(body: &XmlNode, start: usize, end: usize) -> Option<usize> {
    body_elements(body)
        .filter(|(i, _)| *i > start && *i < end)
        .find(|(_, child)| child.name == "w:tbl")
        .map(|(i, _)| i)
}

/// Reconcile a contiguous list run at `first..first + count` against `items`.
///
/// The first paragraph of the run is the clone template for growth, so a
/// bullet run stays bulleted and a numbered run keeps its numbering
/// reference. Returns the number of mutations applied; zero means the run
/// already matched.
pub fn reconcile_list_run(
    body: &mut XmlNode,
    first: usize,
    count: usize,
    items: &[String],
) -> usize {
    let mut changed = 0;
    let mut count = count;

    if items.len() > count {
        let template = match &body.children[first] {
            XmlChild::Element(n) => n.clone(),
            XmlChild::Text(_) => return 0,
        };
        for _ in count..items.len() {
            body.insert(first + count, template.clone());
            count += 1;
            changed += 1;
        }
    }
    while count > items.len() {
        body.remove(first + count - 1);
        count -= 1;
        changed += 1;
    }

    for (offset, item) in items.iter().enumerate() {
        if let XmlChild::Element(p) = &mut body.children[first + offset] {
            if paragraph_text(p) != *item {
                set_paragraph_text(p, item);
                changed += 1;
            }
        }
    }
    changed
}

/// Reconcile a table's data rows against `rows`, optionally rewriting the
/// header row as well.
///
/// Row one (the first row after the header) is the clone template; with a
/// single-row table the header row doubles as the template. Cell values are
/// padded with empty strings or truncated to the width of each row, so a
/// narrower spec never drops formatted cells.
pub fn reconcile_table(table: &mut XmlNode, rows: &[Vec<String>], headers: Option<&[String]>) -> usize {
    let mut changed = 0;

    let tr_indices: Vec<usize> = table
        .children
        .iter()
        .enumerate()
        .filter_map(|(i, c)| match c {
            XmlChild::Element(n) if n.name == "w:tr" => Some(i),
            _ => None,
        })
        .collect();
    if tr_indices.is_empty() {
        return 0;
    }

    if let Some(headers) = headers {
        if let XmlChild::Element(header_row) = &mut table.children[tr_indices[0]] {
            changed += overwrite_row(header_row, headers);
        }
    }

    let template_idx = tr_indices.get(1).copied().unwrap_or(tr_indices[0]);
    let template = match &table.children[template_idx] {
        XmlChild::Element(n) => n.clone(),
        XmlChild::Text(_) => return changed,
    };

    let mut data_count = tr_indices.len() - 1;
    let last_tr = *tr_indices.last().unwrap_or(&tr_indices[0]);
    let mut tail = last_tr + 1;

    while data_count < rows.len() {
        table.insert(tail, template.clone());
        tail += 1;
        data_count += 1;
        changed += 1;
    }
    while data_count > rows.len() {
        tail -= 1;
        table.remove(tail);
        data_count -= 1;
        changed += 1;
    }

    let data_start = tr_indices[0] + 1;
    let mut row_offset = 0;
    for i in data_start..table.children.len() {
        if row_offset >= rows.len() {
            break;
        }
        if let XmlChild::Element(tr) = &mut table.children[i] {
            if tr.name != "w:tr" {
                continue;
            }
            changed += overwrite_row(tr, &rows[row_offset]);
            row_offset += 1;
        }
    }
    changed
}

/// Overwrite a row's cells positionally, counting cells whose text differed.
fn overwrite_row(tr: &mut XmlNode, values: &[String]) -> usize {
    let mut changed = 0;
    let mut cell = 0;
    for child in tr.children.iter_mut() {
        if let XmlChild::Element(tc) = child {
            if tc.name != "w:tc" {
                continue;
            }
            let value = values.get(cell).map(String::as_str).unwrap_or("");
            if cell_text(tc) != value {
                set_cell_text(tc, value);
                changed += 1;
            }
            cell += 1;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::document::{make_heading, make_paragraph, make_table, set_paragraph_numbering};

    fn list_paragraph(text: &str) -> XmlNode {
        let mut p = make_paragraph(text);
        set_paragraph_numbering(&mut p, "7");
        p
    }

    fn body_with_list(items: &[&str]) -> XmlNode {
        let mut body = XmlNode::new("w:body");
        body.push(make_heading("1. Scope", 1));
        for item in items {
            body.push(list_paragraph(item));
        }
        body.push(make_heading("2. Prerequisites", 1));
        body
    }

    fn run_items(body: &XmlNode, first: usize, count: usize) -> Vec<String> {
        (first..first + count)
            .filter_map(|i| match &body.children[i] {
                XmlChild::Element(p) => Some(paragraph_text(p)),
                XmlChild::Text(_) => None,
            })
            .collect()
    }

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_list_run_stops_at_non_list() {
        let mut body = body_with_list(&["a", "b"]);
        body.insert(3, make_paragraph("plain"));
        body.insert(4, list_paragraph("stray"));
        let (first, count) = find_list_run(&body, 0, body.children.len()).unwrap();
        assert_eq!((first, count), (1, 2));
    }

    #[test]
    fn test_grow_list_keeps_numbering() {
        let mut body = body_with_list(&["a"]);
        let changed = reconcile_list_run(&mut body, 1, 1, &owned(&["a", "b", "c"]));
        assert_eq!(changed, 4);
        assert_eq!(run_items(&body, 1, 3), owned(&["a", "b", "c"]));
        for i in 1..4 {
            if let XmlChild::Element(p) = &body.children[i] {
                assert!(is_list_paragraph(p));
            } else {
                panic!("expected element");
            }
        }
    }

    #[test]
    fn test_shrink_list_drops_tail() {
        let mut body = body_with_list(&["a", "b", "c"]);
        let changed = reconcile_list_run(&mut body, 1, 3, &owned(&["x"]));
        assert_eq!(changed, 3);
        assert_eq!(run_items(&body, 1, 1), owned(&["x"]));
        // The trailing heading survives at the slot after the run.
        if let XmlChild::Element(p) = &body.children[2] {
            assert_eq!(paragraph_text(p), "2. Prerequisites");
        } else {
            panic!("expected element");
        }
    }

    #[test]
    fn test_matching_list_is_untouched() {
        let mut body = body_with_list(&["a", "b"]);
        let changed = reconcile_list_run(&mut body, 1, 2, &owned(&["a", "b"]));
        assert_eq!(changed, 0);
    }

    #[test]
    fn test_table_grow_and_overwrite() {
        let columns = owned(&["Control", "Action"]);
        let mut table = make_table(&columns, &[owned(&["Search", "Submits"])]);
        let rows = vec![owned(&["Search", "Submits"]), owned(&["Mic", "Voice input"])];
        let changed = reconcile_table(&mut table, &rows, None);
        assert!(changed > 0);
        let trs: Vec<&XmlNode> = table.elements().filter(|n| n.name == "w:tr").collect();
        assert_eq!(trs.len(), 3);
        assert_eq!(cell_text(trs[2].elements().find(|n| n.name == "w:tc").unwrap()), "Mic");
    }

    #[test]
    fn test_table_shrink_and_header_rewrite() {
        let columns = owned(&["A", "B"]);
        let mut table = make_table(
            &columns,
            &[owned(&["1", "2"]), owned(&["3", "4"]), owned(&["5", "6"])],
        );
        let headers = owned(&["Control", "Function"]);
        let changed = reconcile_table(&mut table, &[owned(&["1", "2"])], Some(&headers));
        assert!(changed > 0);
        let trs: Vec<&XmlNode> = table.elements().filter(|n| n.name == "w:tr").collect();
        assert_eq!(trs.len(), 2);
        assert_eq!(cell_text(trs[0].elements().find(|n| n.name == "w:tc").unwrap()), "Control");
    }

    #[test]
    fn test_table_pads_short_rows() {
        let columns = owned(&["A", "B", "C"]);
        let mut table = make_table(&columns, &[owned(&["1", "2", "3"])]);
        reconcile_table(&mut table, &[owned(&["only"])], None);
        let trs: Vec<&XmlNode> = table.elements().filter(|n| n.name == "w:tr").collect();
        let cells: Vec<String> = trs[1]
            .elements()
            .filter(|n| n.name == "w:tc")
            .map(cell_text)
            .collect();
        assert_eq!(cells, owned(&["only", "", ""]));
    }
}
