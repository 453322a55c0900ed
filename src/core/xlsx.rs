//! Minimal SpreadsheetML package writer: one worksheet, shared strings, and a
//! date style so date-time cells read back as dates.

use crate::domain::model::{format_float, Table, Value};
use crate::utils::error::{PipelineError, Result};
use crate::utils::validation::validate_sheet_name;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Style index of the date-time cell format in `styles.xml`.
const DATETIME_STYLE: usize = 1;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

// numFmtId 22 is the built-in "m/d/yy h:mm" format
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="22" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// Escapes text for XML element and attribute content, dropping characters
/// XML 1.0 cannot carry.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(ch),
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }
    out
}

/// Zero-based column index to its letter reference (`0 → A`, `26 → AA`).
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Days since 1899-12-30, the 1900 date system serial used by Excel.
pub fn excel_serial(at: NaiveDateTime) -> f64 {
    // 1970-01-01 is serial 25569
    at.and_utc().timestamp_millis() as f64 / 86_400_000.0 + 25569.0
}

#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    ordered: Vec<String>,
    references: usize,
}

impl SharedStrings {
    fn intern(&mut self, text: &str) -> usize {
        self.references += 1;
        if let Some(&i) = self.index.get(text) {
            return i;
        }
        let i = self.ordered.len();
        self.index.insert(text.to_string(), i);
        self.ordered.push(text.to_string());
        i
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
"#,
        );
        let _ = write!(
            xml,
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.references,
            self.ordered.len()
        );
        for text in &self.ordered {
            let _ = write!(xml, r#"<si><t xml:space="preserve">{}</t></si>"#, escape_xml(text));
        }
        xml.push_str("</sst>");
        xml
    }
}

/// Writes one cell; missing and non-finite values write nothing and return
/// `false`.
fn push_cell(xml: &mut String, strings: &mut SharedStrings, reference: &str, value: &Value) -> bool {
    match value {
        Value::Missing => return false,
        Value::Float(f) if !f.is_finite() => return false,
        Value::Int(i) => {
            let _ = write!(xml, r#"<c r="{}"><v>{}</v></c>"#, reference, i);
        }
        Value::Float(f) => {
            let _ = write!(xml, r#"<c r="{}"><v>{}</v></c>"#, reference, format_float(*f));
        }
        Value::Bool(b) => {
            let _ = write!(xml, r#"<c r="{}" t="b"><v>{}</v></c>"#, reference, u8::from(*b));
        }
        Value::Text(s) => {
            let i = strings.intern(s);
            let _ = write!(xml, r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, i);
        }
        Value::DateTime(dt) => {
            let _ = write!(
                xml,
                r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                reference,
                DATETIME_STYLE,
                format_float(excel_serial(*dt))
            );
        }
    }
    true
}

fn sheet_xml(table: &Table, strings: &mut SharedStrings) -> String {
    let letters: Vec<String> = (0..table.column_count()).map(column_letter).collect();
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    );
    if let Some(last) = letters.last() {
        let _ = write!(xml, r#"<dimension ref="A1:{}{}"/>"#, last, table.row_count() + 1);
    }
    xml.push_str("<sheetData>");

    if table.column_count() > 0 {
        xml.push_str(r#"<row r="1">"#);
        for (letter, name) in letters.iter().zip(table.column_names()) {
            let i = strings.intern(name);
            let _ = write!(xml, r#"<c r="{}1" t="s"><v>{}</v></c>"#, letter, i);
        }
        xml.push_str("</row>");
    }

    let row_count = table.row_count();
    for (offset, row) in table.rows().enumerate() {
        let row_number = offset + 2;
        let _ = write!(xml, r#"<row r="{}">"#, row_number);
        let mut written = 0;
        for (letter, value) in letters.iter().zip(row) {
            if push_cell(&mut xml, strings, &format!("{}{}", letter, row_number), value) {
                written += 1;
            }
        }
        // Readers size the sheet by its last non-empty cell, so an all-missing
        // final row keeps an empty string in its first cell.
        if written == 0 && offset + 1 == row_count && !letters.is_empty() {
            let i = strings.intern("");
            let _ = write!(xml, r#"<c r="A{}" t="s"><v>{}</v></c>"#, row_number, i);
        }
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        escape_xml(sheet_name)
    )
}

/// Writes `table` as a single-sheet workbook and returns the package bytes.
pub fn write_workbook(table: &Table, sheet_name: &str) -> Result<Vec<u8>> {
    validate_sheet_name("sheet_name", sheet_name).map_err(|e| PipelineError::ExportError {
        message: e.to_string(),
    })?;

    let mut strings = SharedStrings::default();
    let sheet = sheet_xml(table, &mut strings);

    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    let parts: [(&str, String); 7] = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml(sheet_name)),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/styles.xml", STYLES.to_string()),
        ("xl/sharedStrings.xml", strings.to_xml()),
        ("xl/worksheets/sheet1.xml", sheet),
    ];

    for (path, content) in parts {
        zip.start_file(path, options)?;
        zip.write_all(content.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
