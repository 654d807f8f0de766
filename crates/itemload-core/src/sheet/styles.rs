//! Number format codes of the first worksheet of an xlsx package.
//!
//! calamine reports cell values but not the number format each cell is
//! displayed with, so the package parts that carry it are read here:
//! `xl/workbook.xml` for the first sheet and the date system, the workbook
//! relationships for its part name, `xl/styles.xml` for the format of each
//! cell style, and the sheet itself for the style of each cell.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::numfmt;

const WORKBOOK: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const STYLES: &str = "xl/styles.xml";

/// Format code per absolute, zero-based `(row, column)`. Cells shown with
/// General have no entry.
#[derive(Debug, Default)]
pub(crate) struct CellFormats {
    /// Format code per `cellXfs` index.
    styles: Vec<Option<String>>,
    cells: HashMap<(u32, u32), usize>,
    pub(crate) date1904: bool,
}

impl CellFormats {
    pub(crate) fn code_at(&self, row: u32, col: u32) -> Option<&str> {
        let style = *self.cells.get(&(row, col))?;
        self.styles.get(style)?.as_deref()
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }
}

pub(crate) fn read_xlsx(bytes: &[u8]) -> Result<CellFormats> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("opening xlsx package")?;
    let (rel_id, date1904) = first_sheet(&read_part(&mut archive, WORKBOOK)?)?;
    let sheet_part = relationship_target(&read_part(&mut archive, WORKBOOK_RELS)?, &rel_id)?;

    let mut formats = CellFormats {
        date1904,
        ..CellFormats::default()
    };
    if !archive.file_names().any(|name| name == STYLES) {
        return Ok(formats);
    }
    formats.styles = style_codes(&read_part(&mut archive, STYLES)?)?;
    if formats.styles.iter().all(Option::is_none) {
        return Ok(formats);
    }
    formats.cells = cell_styles(&read_part(&mut archive, &sheet_part)?)?;
    Ok(formats)
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut part = archive
        .by_name(name)
        .with_context(|| format!("missing part {}", name))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .with_context(|| format!("reading part {}", name))?;
    Ok(xml)
}

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for a in e.attributes() {
        let a = a?;
        if a.key.local_name().as_ref() == name {
            return Ok(Some(a.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Relationship id of the first `<sheet>`, and whether the workbook uses
/// the 1904 date system.
fn first_sheet(xml: &str) -> Result<(String, bool)> {
    let mut reader = Reader::from_str(xml);
    let mut rel_id = None;
    let mut date1904 = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"workbookPr" => {
                    date1904 = matches!(attr(&e, b"date1904")?.as_deref(), Some("1" | "true"));
                }
                b"sheet" if rel_id.is_none() => rel_id = attr(&e, b"id")?,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    let rel_id = rel_id.ok_or_else(|| anyhow!("workbook lists no sheets"))?;
    Ok((rel_id, date1904))
}

/// Package part name of the relationship `id`.
fn relationship_target(xml: &str, id: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attr(&e, b"Id")?.as_deref() != Some(id) {
                    continue;
                }
                let target = attr(&e, b"Target")?
                    .ok_or_else(|| anyhow!("relationship {} has no target", id))?;
                return Ok(match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{}", target),
                });
            }
            Event::Eof => return Err(anyhow!("no relationship {}", id)),
            _ => {}
        }
    }
}

/// Format code of every `cellXfs` entry, in index order.
fn style_codes(xml: &str) -> Result<Vec<Option<String>>> {
    let mut reader = Reader::from_str(xml);
    let mut custom = HashMap::new();
    let mut xf_formats = Vec::new();
    let mut in_cell_xfs = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attr(&e, b"numFmtId")?.and_then(|id| id.parse::<u32>().ok());
                    if let (Some(id), Some(code)) = (id, attr(&e, b"formatCode")?) {
                        custom.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => {
                    let id = attr(&e, b"numFmtId")?
                        .and_then(|id| id.parse::<u32>().ok())
                        .unwrap_or(0);
                    xf_formats.push(id);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(xf_formats
        .into_iter()
        .map(|id| {
            custom
                .get(&id)
                .cloned()
                .or_else(|| numfmt::builtin(id).map(str::to_string))
                .filter(|code| !code.eq_ignore_ascii_case("general"))
        })
        .collect())
}

/// Style index of every styled `<c>` in the sheet.
fn cell_styles(xml: &str) -> Result<HashMap<(u32, u32), usize>> {
    let mut reader = Reader::from_str(xml);
    let mut cells = HashMap::new();
    let mut row = 0u32;
    let mut next_row = 0u32;
    let mut next_col = 0u32;
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    row = match attr(&e, b"r")? {
                        Some(r) => r.parse::<u32>()?.saturating_sub(1),
                        None => next_row,
                    };
                    next_row = row + 1;
                    next_col = 0;
                }
                b"c" => {
                    let (r, c) = match attr(&e, b"r")? {
                        Some(reference) => parse_reference(&reference)
                            .ok_or_else(|| anyhow!("bad cell reference {:?}", reference))?,
                        None => (row, next_col),
                    };
                    next_col = c + 1;
                    if let Some(style) = attr(&e, b"s")? {
                        cells.insert((r, c), style.parse::<usize>()?);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(cells)
}

/// `"B3"` → `(2, 1)`.
fn parse_reference(reference: &str) -> Option<(u32, u32)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut col = 0u32;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let digit = u32::from(b.to_ascii_uppercase() - b'A' + 1);
        col = col.checked_mul(26)?.checked_add(digit)?;
    }
    let row: u32 = digits.parse().ok()?;
    Some((row.checked_sub(1)?, col - 1))
}
