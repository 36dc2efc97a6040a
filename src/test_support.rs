use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use zip::CompressionMethod;
use zip::write::FileOptions;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

pub(crate) fn unique_temp_path(suffix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);

    let mut path = std::env::temp_dir();
    path.push(format!("pvd_{}_{nanos}_{seq}_{suffix}", process::id()));
    path
}

/// Minimal PDF with one 300x300pt page per entry, each drawing its text.
pub(crate) fn build_pdf(page_texts: &[&str]) -> Vec<u8> {
    let page_streams: Vec<String> = page_texts
        .iter()
        .map(|text| {
            let escaped = escape_literal_string(text);
            format!("BT /F1 14 Tf 36 260 Td ({escaped}) Tj ET")
        })
        .collect();

    build_pdf_from_streams(&page_streams)
}

fn build_pdf_from_streams(page_streams: &[String]) -> Vec<u8> {
    let page_count = page_streams.len();
    let page_ids: Vec<usize> = (0..page_count).map(|i| 4 + i * 2).collect();

    let mut objects = Vec::new();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());

    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!(
        "<< /Type /Pages /Kids [{kids}] /Count {page_count} >>"
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

    for (index, stream) in page_streams.iter().enumerate() {
        let content_id = 5 + index * 2;

        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 300 300] /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::new();
    for (index, object) in objects.iter().enumerate() {
        offsets.push(bytes.len());
        bytes.extend_from_slice(format!("{} 0 obj\n{object}\nendobj\n", index + 1).as_bytes());
    }

    let xref_start = bytes.len();
    bytes.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    bytes.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        bytes.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }

    bytes.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );

    bytes
}

fn escape_literal_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }

    out
}

pub(crate) const COVER_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-payload";

/// Minimal EPUB 2 container: one chapter per body, plus a stylesheet and an image.
/// Chapters live at `OEBPS/chapterN.xhtml` (1-based).
pub(crate) fn build_epub(chapter_bodies: &[&str]) -> Vec<u8> {
    let mut manifest = String::new();
    let mut spine = String::new();
    for index in 1..=chapter_bodies.len() {
        manifest.push_str(&format!(
            r#"<item id="ch{index}" href="chapter{index}.xhtml" media-type="application/xhtml+xml"/>"#
        ));
        spine.push_str(&format!(r#"<itemref idref="ch{index}"/>"#));
    }
    let opf = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0" unique-identifier="bookid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Fixture</dc:title>
    <dc:identifier id="bookid">urn:uuid:fixture</dc:identifier>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    {manifest}
    <item id="css" href="css/style.css" media-type="text/css"/>
    <item id="cover" href="images/cover.png" media-type="image/png"/>
  </manifest>
  <spine>{spine}</spine>
</package>"#
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let stored = FileOptions::default().compression_method(CompressionMethod::Stored);
    let mut add = |name: &str, bytes: &[u8]| {
        writer.start_file(name, stored).expect("zip entry should start");
        writer.write_all(bytes).expect("zip entry should be written");
    };

    add("mimetype", b"application/epub+zip");
    add(
        "META-INF/container.xml",
        br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
    );
    add("OEBPS/content.opf", opf.as_bytes());
    add("OEBPS/css/style.css", b"p { text-indent: 1em; }");
    add("OEBPS/images/cover.png", COVER_PNG);
    for (index, body) in chapter_bodies.iter().enumerate() {
        add(
            &format!("OEBPS/chapter{}.xhtml", index + 1),
            chapter_xhtml(index + 1, body).as_bytes(),
        );
    }

    writer
        .finish()
        .expect("zip archive should finish")
        .into_inner()
}

pub(crate) fn chapter_xhtml(number: usize, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>Chapter {number}</title><link rel="stylesheet" type="text/css" href="css/style.css"/></head><body>{body}</body></html>"#
    )
}
