//! Study-finder table scraper.
//!
//! Static study-finder pages list programmes in a single table with the
//! columns: area, programme, level, mode, university, contact (mailto link).

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StudyRow {
    pub area: String,
    pub programme: String,
    pub level: String,
    pub mode: String,
    pub university: String,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid selector `{0}`")]
pub struct SelectorError(String);

fn selector(s: &str) -> Result<Selector, SelectorError> {
    Selector::parse(s).map_err(|_| SelectorError(s.to_string()))
}

/// Text nodes are trimmed and concatenated with no separator, so
/// `<td>Data <b>Science</b></td>` reads `"DataScience"`.
fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().map(str::trim).collect()
}

/// Parse the first `<table>` of a page into rows.
///
/// Rows with fewer than five cells (headers, spacers) are ignored, as are rows
/// missing a programme or university name.
pub fn parse_study_table(html: &str) -> Result<Vec<StudyRow>, SelectorError> {
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a")?;

    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&table_sel).next() else {
        tracing::warn!("no table found in study-finder page");
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for tr in table.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = tr.select(&cell_sel).collect();
        if cells.len() < 5 {
            continue;
        }

        let email = cells
            .get(5)
            .and_then(|c| c.select(&link_sel).next())
            .and_then(|a| a.value().attr("href"))
            .map(|href| href.replace("mailto:", ""))
            .unwrap_or_default();

        let row = StudyRow {
            area: cell_text(&cells[0]),
            programme: cell_text(&cells[1]),
            level: cell_text(&cells[2]),
            mode: cell_text(&cells[3]),
            university: cell_text(&cells[4]),
            email,
        };
        if row.programme.is_empty() || row.university.is_empty() {
            continue;
        }
        rows.push(row);
    }

    tracing::debug!(rows = rows.len(), "parsed study-finder table");
    Ok(rows)
}
