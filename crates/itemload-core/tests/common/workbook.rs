//! In-memory xlsx fixtures: just enough of the OOXML package for a reader.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

#[derive(Debug, Clone, Copy)]
pub enum Cell {
    Text(&'static str),
    Number(f64),
    /// A number displayed through a number format.
    Styled(f64, NumFmt),
    /// A formula with the value last computed by the writing application.
    Formula { f: &'static str, cached: f64 },
    /// Error value such as "#DIV/0!".
    Error(&'static str),
    /// No `<c>` element at all.
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumFmt {
    /// A built-in format id, such as 9 for `0%`.
    Builtin(u32),
    /// A custom format code, written to `<numFmts>`.
    Custom(&'static str),
}

/// A workbook with a single sheet.
pub fn xlsx(rows: &[&[Cell]]) -> Vec<u8> {
    xlsx_sheets(&[rows])
}

/// A workbook with one sheet per entry, in order. An empty slice yields a
/// workbook without sheets.
pub fn xlsx_sheets(sheets: &[&[&[Cell]]]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let mut put = |name: &str, data: String| {
        let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file(name, opts).unwrap();
        zip.write_all(data.as_bytes()).unwrap();
    };

    put("[Content_Types].xml", content_types(sheets.len()));
    put("_rels/.rels", ROOT_RELS.to_string());
    put("xl/workbook.xml", workbook_xml(sheets.len()));
    put("xl/_rels/workbook.xml.rels", workbook_rels(sheets.len()));
    let formats = used_formats(sheets);
    put("xl/styles.xml", styles_xml(&formats));
    for (i, rows) in sheets.iter().enumerate() {
        put(
            &format!("xl/worksheets/sheet{}.xml", i + 1),
            sheet_xml(rows, &formats),
        );
    }

    zip.finish().unwrap().into_inner()
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

fn content_types(sheet_count: usize) -> String {
    let mut s = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    );
    for i in 1..=sheet_count {
        s.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i
        ));
    }
    s.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    s.push_str("</Types>");
    s
}

fn workbook_xml(sheet_count: usize) -> String {
    let mut s = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    for i in 1..=sheet_count {
        s.push_str(&format!(
            r#"<sheet name="Sheet{i}" sheetId="{i}" r:id="rId{i}"/>"#
        ));
    }
    s.push_str("</sheets></workbook>");
    s
}

fn workbook_rels(sheet_count: usize) -> String {
    let mut s = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        s.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    s.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    ));
    s.push_str("</Relationships>");
    s
}

/// Distinct formats in first-use order; cell style `i + 1` uses entry `i`.
fn used_formats(sheets: &[&[&[Cell]]]) -> Vec<NumFmt> {
    let mut formats = Vec::new();
    for cell in sheets.iter().flat_map(|rows| rows.iter()).flat_map(|row| row.iter()) {
        if let Cell::Styled(_, fmt) = cell {
            if !formats.contains(fmt) {
                formats.push(*fmt);
            }
        }
    }
    formats
}

fn styles_xml(formats: &[NumFmt]) -> String {
    let mut custom = String::new();
    let mut xfs = String::from(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#);
    let mut next_custom = 164;
    for fmt in formats {
        let id = match fmt {
            NumFmt::Builtin(id) => *id,
            NumFmt::Custom(code) => {
                let id = next_custom;
                next_custom += 1;
                custom.push_str(&format!(
                    r#"<numFmt numFmtId="{}" formatCode="{}"/>"#,
                    id,
                    escape(code)
                ));
                id
            }
        };
        xfs.push_str(&format!(
            r#"<xf numFmtId="{}" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
            id
        ));
    }

    let mut s = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    if !custom.is_empty() {
        s.push_str(&format!(
            r#"<numFmts count="{}">{}</numFmts>"#,
            next_custom - 164,
            custom
        ));
    }
    s.push_str(r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="1"><fill><patternFill patternType="none"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
    s.push_str(&format!(
        r#"<cellXfs count="{}">{}</cellXfs></styleSheet>"#,
        formats.len() + 1,
        xfs
    ));
    s
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn sheet_xml(rows: &[&[Cell]], formats: &[NumFmt]) -> String {
    let mut s = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        let r = r + 1;
        s.push_str(&format!(r#"<row r="{r}">"#));
        for (c, cell) in row.iter().enumerate() {
            let col = (b'A' + c as u8) as char;
            match cell {
                Cell::Text(t) => s.push_str(&format!(
                    r#"<c r="{col}{r}" t="inlineStr"><is><t>{t}</t></is></c>"#
                )),
                Cell::Number(n) => s.push_str(&format!(r#"<c r="{col}{r}"><v>{n}</v></c>"#)),
                Cell::Styled(n, fmt) => {
                    let style = formats.iter().position(|f| f == fmt).unwrap() + 1;
                    s.push_str(&format!(r#"<c r="{col}{r}" s="{style}"><v>{n}</v></c>"#))
                }
                Cell::Formula { f, cached } => s.push_str(&format!(
                    r#"<c r="{col}{r}"><f>{}</f><v>{cached}</v></c>"#,
                    escape(f)
                )),
                Cell::Error(e) => {
                    s.push_str(&format!(r#"<c r="{col}{r}" t="e"><v>{e}</v></c>"#))
                }
                Cell::Blank => {}
            }
        }
        s.push_str("</row>");
    }
    s.push_str("</sheetData></worksheet>");
    s
}
