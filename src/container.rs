//! Places the rendered news can be mounted into

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::error::ContainerError;
use crate::render_funcs::{NewsView, render_view};

/// Injected replacement for the page's news element. Written once per run.
pub trait NewsContainer {
    fn mount(&mut self, view: &NewsView) -> Result<(), ContainerError>;
}

/// An HTML page on disk; only the inner content of the element with
/// `container_id` is replaced.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    path: PathBuf,
    container_id: String,
}

impl HtmlPage {
    pub fn new(path: impl Into<PathBuf>, container_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            container_id: container_id.into(),
        }
    }
}

impl NewsContainer for HtmlPage {
    fn mount(&mut self, view: &NewsView) -> Result<(), ContainerError> {
        let page = fs::read_to_string(&self.path)?;
        let updated = replace_element_content(&page, &self.container_id, &render_view(view))?;
        fs::write(&self.path, updated)?;
        tracing::info!(path = %self.path.display(), id = %self.container_id, "Page updated");
        Ok(())
    }
}

/// Writes the fragment to stdout
#[derive(Debug, Default)]
pub struct StdoutContainer;

impl NewsContainer for StdoutContainer {
    fn mount(&mut self, view: &NewsView) -> Result<(), ContainerError> {
        let mut out = io::stdout().lock();
        out.write_all(render_view(view).as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

/// Hands the view to the terminal viewer
#[derive(Debug, Clone)]
pub struct ChannelContainer {
    tx: mpsc::UnboundedSender<NewsView>,
}

impl ChannelContainer {
    pub fn new(tx: mpsc::UnboundedSender<NewsView>) -> Self {
        Self { tx }
    }
}

impl NewsContainer for ChannelContainer {
    fn mount(&mut self, view: &NewsView) -> Result<(), ContainerError> {
        self.tx
            .send(view.clone())
            .map_err(|_| ContainerError::ViewerClosed)
    }
}

/// Keeps the mounted fragment in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryContainer {
    pub html: String,
    pub view: Option<NewsView>,
    pub mounts: usize,
}

#[cfg(test)]
impl NewsContainer for MemoryContainer {
    fn mount(&mut self, view: &NewsView) -> Result<(), ContainerError> {
        self.html = render_view(view);
        self.view = Some(view.clone());
        self.mounts += 1;
        Ok(())
    }
}

/// Replace everything between the opening and matching closing tag of the
/// element whose `id` is `id`. Nested elements with the same tag name are
/// balanced; the rest of the document is kept byte for byte.
pub fn replace_element_content(page: &str, id: &str, inner: &str) -> Result<String, ContainerError> {
    let not_found = || ContainerError::ElementNotFound(id.to_string());
    let unclosed = || ContainerError::Unclosed(id.to_string());

    let (tag_start, attr_pos) = find_id_attribute(page, id).ok_or_else(not_found)?;
    let tag_name: String = page[tag_start + 1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();
    if tag_name.is_empty() {
        return Err(not_found());
    }

    let open_end = find_tag_end(page, attr_pos).ok_or_else(unclosed)?;
    if page[..open_end].ends_with('/') {
        return Err(unclosed());
    }
    let content_start = open_end + 1;

    let content_end = find_matching_close(page, content_start, &tag_name).ok_or_else(unclosed)?;

    let mut out = String::with_capacity(page.len() + inner.len());
    out.push_str(&page[..content_start]);
    out.push('\n');
    out.push_str(inner);
    out.push_str(&page[content_end..]);
    Ok(out)
}

/// `(tag start, attribute offset)` of the first `id` attribute that sits
/// in a tag, outside any quoted attribute value.
fn find_id_attribute(page: &str, id: &str) -> Option<(usize, usize)> {
    let mut candidates: Vec<usize> = [format!("id=\"{id}\""), format!("id='{id}'")]
        .iter()
        .flat_map(|needle| page.match_indices(needle.as_str()).map(|(pos, _)| pos))
        .filter(|&pos| page[..pos].ends_with(|c: char| c.is_ascii_whitespace()))
        .collect();
    candidates.sort_unstable();
    candidates
        .into_iter()
        .find_map(|pos| enclosing_tag_start(page, pos).map(|start| (start, pos)))
}

/// Start of the tag `pos` lies in, scanning forward so that `<` and `>`
/// inside quoted attribute values are skipped. `None` when `pos` is in text
/// or inside a quoted value.
fn enclosing_tag_start(page: &str, pos: usize) -> Option<usize> {
    let bytes = page.as_bytes();
    let mut tag_start = None;
    let mut quote = None;

    for (i, &b) in bytes[..pos].iter().enumerate() {
        match (tag_start, quote) {
            (Some(_), Some(q)) => {
                if b == q {
                    quote = None;
                }
            }
            (Some(_), None) => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => tag_start = None,
                _ => {}
            },
            (None, _) => {
                if b == b'<' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
                    tag_start = Some(i);
                }
            }
        }
    }

    if quote.is_some() { None } else { tag_start }
}

/// Offset of the `>` closing the tag that contains `from`, skipping quoted values.
fn find_tag_end(page: &str, from: usize) -> Option<usize> {
    let mut quote = None;
    for (i, b) in page.bytes().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(i),
            None => {}
        }
    }
    None
}

/// Byte offset of the `</tag` closing the element whose content starts at `from`.
fn find_matching_close(page: &str, from: usize, tag: &str) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets aligned with `page`
    let lower = page.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let mut depth = 1usize;
    let mut pos = from;

    while let Some(rel) = lower[pos..].find('<') {
        let at = pos + rel;
        let rest = &lower[at..];
        if rest.starts_with(&close) && ends_name(&rest[close.len()..]) {
            depth -= 1;
            if depth == 0 {
                return Some(at);
            }
        } else if rest.starts_with(&open) && ends_name(&rest[open.len()..]) {
            let tag_end = rest.find('>')?;
            if !rest[..tag_end].ends_with('/') {
                depth += 1;
            }
        }
        pos = at + 1;
    }
    None
}

fn ends_name(rest: &str) -> bool {
    matches!(rest.chars().next(), Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace())
}
