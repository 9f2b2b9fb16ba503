use std::path::Path;

use lopdf::Document;

use super::ExtractError;

/// Text of the first `max_pages` pages. A document without pages gives "".
pub fn extract(path: &Path, max_pages: usize) -> Result<String, ExtractError> {
    let doc = Document::load(path)?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().take(max_pages).collect();
    if pages.is_empty() {
        return Ok(String::new());
    }
    Ok(doc.extract_text(&pages)?)
}
