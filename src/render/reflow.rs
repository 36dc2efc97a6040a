use std::borrow::Cow;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use tempfile::TempDir;

use crate::backend::ChapterSource;
use crate::document::DocumentHandle;
use crate::error::{AppError, AppResult};

use super::surface::{RenderRequest, RenderedSurface, Viewport};
use super::UnitRenderer;

/// Presentation rules injected into every chapter. Not user-configurable.
pub const BASELINE_STYLESHEET: &str = "
body {
    margin: 0 auto;
    padding: 20px;
    font-family: system-ui, -apple-system, sans-serif;
    line-height: 1.6;
    max-width: 800px;
}
img, svg { max-width: 100%; height: auto; }
";

/// Chapter markup ready for the paint engine, plus the archive resources it
/// points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedChapter {
    pub markup: String,
    pub resources: Vec<PathBuf>,
}

pub struct ReflowableChapterRenderer {
    root: TempDir,
}

impl ReflowableChapterRenderer {
    pub fn new() -> AppResult<Self> {
        let root = tempfile::Builder::new()
            .prefix("pvd-chapters-")
            .tempdir()
            .map_err(|err| AppError::io_with_context(err, "failed to create chapter directory"))?;
        debug!("materializing chapters under {}", root.path().display());
        Ok(Self { root })
    }

    /// Directory the paint engine loads chapters from. Removed on drop.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn materialize(&self, source: &dyn ChapterSource, index: usize) -> AppResult<PathBuf> {
        let count = source.chapter_count();
        if index >= count {
            return Err(AppError::index_out_of_range(index, count));
        }

        let chapter = source.chapter(index)?;
        let prepared = match prepare_markup(&chapter.markup, &chapter.path) {
            Ok(prepared) => prepared,
            Err(AppError::Markup(reason)) => {
                warn!(
                    "chapter {} has malformed markup, showing notice: {reason}",
                    chapter.path.display()
                );
                PreparedChapter {
                    markup: fallback_notice(&chapter.path, &reason),
                    resources: Vec::new(),
                }
            }
            Err(err) => return Err(err),
        };

        for resource in &prepared.resources {
            self.extract_resource(source, resource)?;
        }

        let location = self.root.path().join(format!("chapter-{index:04}.xhtml"));
        fs::write(&location, prepared.markup.as_bytes()).map_err(|err| {
            AppError::io_with_context(err, format!("failed to write {}", location.display()))
        })?;
        Ok(location)
    }

    fn extract_resource(&self, source: &dyn ChapterSource, resource: &Path) -> AppResult<()> {
        let target = self.root.path().join(resource);
        if target.exists() {
            return Ok(());
        }
        let Some(bytes) = source.resource(resource) else {
            warn!("resource {} is missing from the archive", resource.display());
            return Ok(());
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                AppError::io_with_context(err, format!("failed to create {}", parent.display()))
            })?;
        }
        fs::write(&target, bytes).map_err(|err| {
            AppError::io_with_context(err, format!("failed to extract {}", resource.display()))
        })
    }
}

impl UnitRenderer for ReflowableChapterRenderer {
    fn name(&self) -> &'static str {
        "reflow"
    }

    fn supports_zoom(&self) -> bool {
        false
    }

    fn rescales_on_resize(&self) -> bool {
        false
    }

    fn resolve_scale(
        &self,
        _doc: &DocumentHandle,
        _unit: usize,
        _viewport: Viewport,
        _zoom: f32,
    ) -> f32 {
        1.0
    }

    fn render(
        &mut self,
        doc: &DocumentHandle,
        request: &RenderRequest,
    ) -> AppResult<RenderedSurface> {
        let chapters = doc
            .chapters()
            .ok_or_else(|| AppError::unsupported("reflow renderer needs a chaptered document"))?;
        let location = self.materialize(chapters, request.unit)?;
        Ok(RenderedSurface::Layout {
            unit: request.unit,
            generation: request.generation,
            location,
        })
    }
}

/// Injects the baseline stylesheet and points media references at their
/// archive paths, relative to the materialization root.
pub fn prepare_markup(markup: &str, chapter_path: &Path) -> AppResult<PreparedChapter> {
    let mut reader = Reader::from_str(markup);
    // Chapters are often HTML with unclosed void tags.
    reader.config_mut().check_end_names = false;
    reader.config_mut().allow_unmatched_ends = true;
    let mut writer = Writer::new(Vec::with_capacity(markup.len() + BASELINE_STYLESHEET.len()));
    let mut resources = Vec::new();
    let mut styled = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| AppError::markup(format!("{err} at byte {}", reader.buffer_position())))?;
        match event {
            Event::Eof => break,
            Event::Start(start) => {
                let tag = local_name(&start);
                if tag == "body" && !styled {
                    write_style_head(&mut writer)?;
                    styled = true;
                }
                let start = rewrite_references(&reader, start, &tag, chapter_path, &mut resources)?;
                if is_void_element(&tag) {
                    write_event(&mut writer, Event::Empty(start))?;
                } else {
                    write_event(&mut writer, Event::Start(start))?;
                }
            }
            Event::Empty(start) => {
                let tag = local_name(&start);
                if tag == "head" && !styled {
                    write_style_head(&mut writer)?;
                    styled = true;
                    continue;
                }
                let start = rewrite_references(&reader, start, &tag, chapter_path, &mut resources)?;
                write_event(&mut writer, Event::Empty(start))?;
            }
            Event::End(end) => {
                let tag = String::from_utf8_lossy(end.local_name().as_ref()).to_ascii_lowercase();
                if is_void_element(&tag) {
                    continue;
                }
                let is_head = tag == "head";
                if is_head && !styled {
                    write_style(&mut writer)?;
                    styled = true;
                }
                write_event(&mut writer, Event::End(end))?;
            }
            other => write_event(&mut writer, other)?,
        }
    }

    let body = String::from_utf8(writer.into_inner())
        .map_err(|err| AppError::markup(format!("rewritten chapter is not UTF-8: {err}")))?;
    let markup = if styled {
        body
    } else {
        format!(
            "<html xmlns=\"http://www.w3.org/1999/xhtml\"><head><style>{BASELINE_STYLESHEET}</style></head><body>{body}</body></html>"
        )
    };

    Ok(PreparedChapter { markup, resources })
}

/// Minimal document shown in place of a chapter that cannot be parsed.
pub fn fallback_notice(chapter_path: &Path, reason: &str) -> String {
    let chapter = chapter_path.display().to_string();
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\"><head><style>{BASELINE_STYLESHEET}</style></head>\
         <body><h1>Chapter unavailable</h1><p>{}</p><p>{}</p></body></html>\n",
        quick_xml::escape::escape(chapter.as_str()),
        quick_xml::escape::escape(reason),
    )
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).to_ascii_lowercase()
}

/// HTML elements that never have content. They are written self-closed so
/// the materialized chapter stays well-formed XHTML.
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Attribute that carries a resource reference for `tag`, if any.
fn reference_attribute(tag: &str, key: &str) -> bool {
    match tag {
        "img" | "source" | "video" | "audio" | "track" => key == "src",
        "link" => key == "href",
        "image" => key == "href" || key == "xlink:href",
        _ => false,
    }
}

fn rewrite_references<'a>(
    reader: &Reader<&[u8]>,
    start: BytesStart<'a>,
    tag: &str,
    chapter_path: &Path,
    resources: &mut Vec<PathBuf>,
) -> AppResult<BytesStart<'a>> {
    if !matches!(tag, "img" | "source" | "video" | "audio" | "track" | "link" | "image") {
        return Ok(start);
    }

    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut rewritten = BytesStart::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|err| AppError::markup(format!("bad attribute: {err}")))?;
        let key = reader
            .decoder()
            .decode(attr.key.as_ref())
            .map_err(|err| AppError::markup(err.to_string()))?
            .to_ascii_lowercase();
        if !reference_attribute(tag, &key) {
            rewritten.push_attribute(attr);
            continue;
        }

        let raw = reader
            .decoder()
            .decode(&attr.value)
            .map_err(|err| AppError::markup(err.to_string()))?;
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|err| AppError::markup(format!("bad attribute value: {err}")))?;
        match resolve_reference(chapter_path, &value) {
            Some((archive_path, fragment)) => {
                let target = format!("{}{fragment}", encode_path(&archive_path));
                let original_key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                rewritten.push_attribute((original_key.as_str(), target.as_str()));
                if !resources.contains(&archive_path) {
                    resources.push(archive_path);
                }
            }
            None => rewritten.push_attribute(attr),
        }
    }
    Ok(rewritten)
}

/// Resolves a chapter-relative reference to a full archive path. Returns the
/// trailing `#fragment` separately. External, `data:` and fragment-only
/// references resolve to nothing.
pub(crate) fn resolve_reference<'r>(
    chapter_path: &Path,
    reference: &'r str,
) -> Option<(PathBuf, &'r str)> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') || has_scheme(reference) {
        return None;
    }

    let (target, fragment) = match reference.find(['#', '?']) {
        Some(split) => reference.split_at(split),
        None => (reference, ""),
    };
    let fragment = if fragment.starts_with('#') { fragment } else { "" };
    let decoded = percent_decode(target);

    let mut resolved = PathBuf::new();
    let base = if decoded.starts_with('/') {
        None
    } else {
        chapter_path.parent()
    };
    for component in base
        .into_iter()
        .flat_map(Path::components)
        .chain(Path::new(&*decoded).components())
    {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if resolved.as_os_str().is_empty() {
        None
    } else {
        Some((resolved, fragment))
    }
}

fn has_scheme(reference: &str) -> bool {
    let Some(colon) = reference.find(':') else {
        return false;
    };
    let scheme = &reference[..colon];
    !scheme.is_empty()
        && scheme.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
        && scheme.chars().next().is_some_and(|ch| ch.is_ascii_alphabetic())
}

pub(crate) fn percent_decode(input: &str) -> Cow<'_, str> {
    if !input.contains('%') {
        return Cow::Borrowed(input);
    }
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%'
            && let Some(hex) = input.get(idx + 1..idx + 3)
            && let Ok(value) = u8::from_str_radix(hex, 16)
        {
            out.push(value);
            idx += 3;
            continue;
        }
        out.push(bytes[idx]);
        idx += 1;
    }
    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

fn encode_path(path: &Path) -> String {
    let joined = path
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    let mut out = String::with_capacity(joined.len());
    for ch in joined.chars() {
        match ch {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> AppResult<()> {
    writer
        .write_event(event)
        .map_err(|err| AppError::markup(format!("failed to write chapter: {err}")))
}

fn write_style(writer: &mut Writer<Vec<u8>>) -> AppResult<()> {
    write_event(writer, Event::Start(BytesStart::new("style")))?;
    write_event(writer, Event::Text(BytesText::from_escaped(BASELINE_STYLESHEET)))?;
    write_event(writer, Event::End(BytesEnd::new("style")))
}

fn write_style_head(writer: &mut Writer<Vec<u8>>) -> AppResult<()> {
    write_event(writer, Event::Start(BytesStart::new("head")))?;
    write_style(writer)?;
    write_event(writer, Event::End(BytesEnd::new("head")))
}
