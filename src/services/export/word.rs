//! Timetable document renderer.
//!
//! Writes a minimal WordprocessingML package by hand: content types, package
//! relationships, core properties and `word/document.xml` holding the title
//! paragraph and an 8-column table laid out like the spreadsheet export.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::grid::{CORNER_HEADER, TIME_BLOCKS, period_label};
use super::{ExportError, ExportJob, Renderer};
use crate::models::Weekday;
use crate::services::color::Rgb;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const COLUMN_COUNT: u32 = 8;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

#[derive(Clone, Debug)]
pub struct WordRenderer {
    /// Column width in twentieths of a point.
    pub column_width: u32,
    /// Title font size in half-points.
    pub title_size: u32,
}

impl Default for WordRenderer {
    fn default() -> Self {
        Self {
            // 1.2 inch
            column_width: 1728,
            title_size: 36,
        }
    }
}

impl Renderer for WordRenderer {
    fn render(&self, job: &ExportJob) -> Result<Vec<u8>, ExportError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", opts)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;

        zip.start_file("_rels/.rels", opts)?;
        zip.write_all(PACKAGE_RELS.as_bytes())?;

        zip.start_file("docProps/core.xml", opts)?;
        zip.write_all(core_properties(&job.title).as_bytes())?;

        zip.start_file("word/document.xml", opts)?;
        zip.write_all(self.document(job).as_bytes())?;

        Ok(zip.finish()?.into_inner())
    }
}

impl WordRenderer {
    pub fn document(&self, job: &ExportJob) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(&format!(r#"<w:document xmlns:w="{W_NS}"><w:body>"#));
        xml.push_str(&paragraph(&job.title, true, Some(self.title_size)));
        xml.push_str(&self.table(job));
        // a body may not end with a table
        xml.push_str("<w:p/>");
        xml.push_str(concat!(
            r#"<w:sectPr><w:pgSz w:w="16838" w:h="11906" w:orient="landscape"/>"#,
            r#"<w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="567" w:footer="567" w:gutter="0"/>"#,
            "</w:sectPr>"
        ));
        xml.push_str("</w:body></w:document>");
        xml
    }

    fn table(&self, job: &ExportJob) -> String {
        let mut xml = String::from("<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/><w:jc w:val=\"center\"/><w:tblBorders>");
        for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
            xml.push_str(&format!(
                r#"<w:{side} w:val="single" w:sz="4" w:space="0" w:color="000000"/>"#
            ));
        }
        xml.push_str(r#"</w:tblBorders><w:tblLayout w:type="fixed"/></w:tblPr><w:tblGrid>"#);
        for _ in 0..COLUMN_COUNT {
            xml.push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, self.column_width));
        }
        xml.push_str("</w:tblGrid>");

        xml.push_str("<w:tr>");
        xml.push_str(&self.cell(CORNER_HEADER, true, None, 1));
        for day in Weekday::ALL {
            xml.push_str(&self.cell(day.long_name(), true, None, 1));
        }
        xml.push_str("</w:tr>");

        for block in TIME_BLOCKS {
            xml.push_str("<w:tr>");
            xml.push_str(&self.cell(block.label, true, None, COLUMN_COUNT));
            xml.push_str("</w:tr>");

            for period in block.periods() {
                xml.push_str("<w:tr>");
                xml.push_str(&self.cell(&period_label(period), false, None, 1));
                for day in Weekday::ALL {
                    let content = job.grid.cell(day, period).and_then(|cell| {
                        let lead = cell.lead()?;
                        Some((cell.text(), job.colors.color(&lead.name)))
                    });
                    match content {
                        Some((text, color)) => {
                            xml.push_str(&self.cell(&text, false, Some(color), 1))
                        }
                        None => xml.push_str(&self.cell("", false, None, 1)),
                    }
                }
                xml.push_str("</w:tr>");
            }
        }

        xml.push_str("</w:tbl>");
        xml
    }

    fn cell(&self, text: &str, bold: bool, fill: Option<Rgb>, span: u32) -> String {
        let mut xml = format!(
            r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/>"#,
            self.column_width * span
        );
        if span > 1 {
            xml.push_str(&format!(r#"<w:gridSpan w:val="{span}"/>"#));
        }
        if let Some(color) = fill {
            xml.push_str(&format!(
                r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
                color.hex()
            ));
        }
        xml.push_str(r#"<w:vAlign w:val="center"/></w:tcPr>"#);
        for line in text.split('\n') {
            xml.push_str(&paragraph(line, bold, None));
        }
        xml.push_str("</w:tc>");
        xml
    }
}

fn paragraph(text: &str, bold: bool, size: Option<u32>) -> String {
    let mut xml = String::from(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr>"#);
    if !text.is_empty() {
        xml.push_str("<w:r>");
        if bold || size.is_some() {
            xml.push_str("<w:rPr>");
            if bold {
                xml.push_str("<w:b/>");
            }
            if let Some(size) = size {
                xml.push_str(&format!(r#"<w:sz w:val="{size}"/>"#));
            }
            xml.push_str("</w:rPr>");
        }
        xml.push_str(&format!(
            r#"<w:t xml:space="preserve">{}</w:t>"#,
            xml_text(text)
        ));
        xml.push_str("</w:r>");
    }
    xml.push_str("</w:p>");
    xml
}

fn core_properties(title: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
            "<dc:title>{}</dc:title>",
            "</cp:coreProperties>"
        ),
        xml_text(title)
    )
}

/// Escaped character data with the code points XML 1.0 forbids dropped.
fn xml_text(text: &str) -> String {
    let allowed: String = text
        .chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || (c >= '\u{20}' && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
        })
        .collect();
    escape(&allowed).into_owned()
}
