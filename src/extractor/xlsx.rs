use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};

use super::ExtractError;

/// First `max_rows` rows of every sheet, cells space-separated, in
/// workbook order.
///
/// Formula cells carry the value cached by the authoring application.
pub fn extract(path: &Path, max_rows: usize) -> Result<String, ExtractError> {
    let mut workbook = open_workbook_auto(path)?;
    let mut content = String::new();

    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        push_sheet_rows(&range, max_rows, &mut content);
    }

    Ok(content)
}

/// Append exactly `max_rows` lines for a sheet, counted from sheet row 1.
/// Rows outside the used range, and empty sheets, give empty lines.
pub(crate) fn push_sheet_rows(range: &Range<Data>, max_rows: usize, out: &mut String) {
    let columns = match (range.start(), range.end()) {
        (Some((_, first)), Some((_, last))) => first..=last,
        _ => 1..=0,
    };
    let max_rows = u32::try_from(max_rows).unwrap_or(u32::MAX);

    for row in 0..max_rows {
        let cells: Vec<String> = columns
            .clone()
            .filter_map(|col| range.get_value((row, col)))
            .filter(|cell| !is_blank(cell))
            .map(ToString::to_string)
            .collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_rows_joined_and_blank_cells_skipped() {
        let mut range = Range::new((0, 0), (1, 2));
        range.set_value((0, 0), Data::String("地区".into()));
        range.set_value((0, 2), Data::Int(12));
        range.set_value((1, 1), Data::String("顺德".into()));

        let mut out = String::new();
        push_sheet_rows(&range, 5, &mut out);
        assert_eq!(out, "地区 12\n顺德\n\n\n\n");
    }

    #[test]
    fn test_row_cap_counts_from_sheet_top() {
        // Used range starts on the third sheet row.
        let mut range = Range::new((2, 0), (9, 0));
        for row in 2..=9 {
            range.set_value((row, 0), Data::Int(i64::from(row)));
        }

        let mut out = String::new();
        push_sheet_rows(&range, 5, &mut out);
        assert_eq!(out, "\n\n2\n3\n4\n");
    }

    #[test]
    fn test_empty_sheet_pads_lines() {
        let range: Range<Data> = Range::empty();
        let mut out = String::new();
        push_sheet_rows(&range, 5, &mut out);
        assert_eq!(out, "\n\n\n\n\n");
    }

    const SHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
    const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    /// Minimal workbook: one part per sheet, cells given as raw `<c>` XML
    /// per row.
    fn write_xlsx(path: &Path, sheets: &[(&str, &[&str])]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        let mut sheet_list = String::new();
        let mut rels = String::new();
        for (i, (name, rows)) in sheets.iter().enumerate() {
            let n = i + 1;
            sheet_list.push_str(&format!(
                r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{n}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{n}.xml"/>"#
            ));

            let body: String = rows
                .iter()
                .enumerate()
                .map(|(r, cells)| format!(r#"<row r="{}">{cells}</row>"#, r + 1))
                .collect();
            zip.start_file(format!("xl/worksheets/sheet{n}.xml"), options)
                .unwrap();
            write!(
                zip,
                r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="{SHEET_NS}"><sheetData>{body}</sheetData></worksheet>"#
            )
            .unwrap();
        }

        zip.start_file("xl/workbook.xml", options).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="{SHEET_NS}" xmlns:r="{REL_NS}"><sheets>{sheet_list}</sheets></workbook>"#
        )
        .unwrap();
        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
        )
        .unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_workbook_sheets_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("统计.xlsx");
        write_xlsx(
            &path,
            &[
                (
                    "汇总",
                    &[r#"<c r="A1" t="inlineStr"><is><t>地区</t></is></c><c r="B1"><f>1+1</f><v>2</v></c>"#][..],
                ),
                (
                    "明细",
                    &[r#"<c r="A1" t="inlineStr"><is><t>顺德</t></is></c>"#][..],
                ),
            ],
        );

        let text = extract(&path, 5).unwrap();
        assert_eq!(text, "地区 2\n\n\n\n\n顺德\n\n\n\n\n");
    }
}
