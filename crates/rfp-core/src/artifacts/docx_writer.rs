//! Minimal OOXML WordprocessingML package assembly shared by the Win-Plan
//! and Word proposal builders. Hand-rolled on the same zip/quick-xml stack
//! the document parsers already use, rather than pulling in a dedicated
//! docx-writing crate.

use std::io::Write;

use crate::error::ArtifactError;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
</Relationships>"#;

/// Escape text for inclusion inside a WordprocessingML run.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// A heading paragraph at the given Word style level (`Heading1`, etc).
pub fn heading(level: u8, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="Heading{level}"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_text(text)
    )
}

/// A single body paragraph of plain text.
pub fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, escape_text(text))
}

/// A simple grid table: first row bold as a header.
pub fn table(rows: &[Vec<String>]) -> String {
    let mut xml = String::from(r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="0" w:type="auto"/></w:tblPr>"#);
    for (i, row) in rows.iter().enumerate() {
        xml.push_str("<w:tr>");
        for cell in row {
            let run = if i == 0 {
                format!(r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#, escape_text(cell))
            } else {
                format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, escape_text(cell))
            };
            xml.push_str(&format!("<w:tc><w:p>{run}</w:p></w:tc>"));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// Assemble a full `.docx` package from a body fragment (paragraphs and
/// tables, already serialized as WordprocessingML).
pub fn assemble(body_xml: &str) -> Result<Vec<u8>, ArtifactError> {
    let document_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:body>{body_xml}<w:sectPr/></w:body>
</w:document>"#
    );

    let mut out = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut out);
        let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        writer.start_file("[Content_Types].xml", options).map_err(|e| ArtifactError::Docx(e.to_string()))?;
        writer.write_all(CONTENT_TYPES_XML.as_bytes())?;

        writer.start_file("_rels/.rels", options).map_err(|e| ArtifactError::Docx(e.to_string()))?;
        writer.write_all(ROOT_RELS_XML.as_bytes())?;

        writer.start_file("word/document.xml", options).map_err(|e| ArtifactError::Docx(e.to_string()))?;
        writer.write_all(document_xml.as_bytes())?;

        writer
            .start_file("word/_rels/document.xml.rels", options)
            .map_err(|e| ArtifactError::Docx(e.to_string()))?;
        writer.write_all(DOCUMENT_RELS_XML.as_bytes())?;

        writer.finish().map_err(|e| ArtifactError::Docx(e.to_string()))?;
    }

    Ok(out.into_inner())
}
