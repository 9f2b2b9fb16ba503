/// Mock extractor for testing purposes.
///
/// Serves canned excerpts keyed by file name, so catalogs can be built
/// from plain placeholder files instead of real office documents.
use std::collections::{HashMap, HashSet};
use std::path::Path;

use super::{ContentExtractor, ExtractError};
use crate::catalog::DocType;

#[derive(Debug, Clone, Default)]
pub struct MockExtractor {
    excerpts: HashMap<String, String>,
    failing: HashSet<String>,
}

impl MockExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `text` for any file called `name`.
    #[must_use]
    pub fn with_excerpt(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.excerpts.insert(name.into(), text.into());
        self
    }

    /// Fail extraction for any file called `name`.
    #[must_use]
    pub fn with_failure(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }
}

impl ContentExtractor for MockExtractor {
    fn extract(&self, path: &Path, doc_type: DocType) -> Result<String, ExtractError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.failing.contains(&name) {
            return Err(ExtractError::Unsupported(format!("{doc_type}: {name}")));
        }
        Ok(self.excerpts.get(&name).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_excerpt_by_name() {
        let extractor = MockExtractor::new().with_excerpt("a.pdf", "伊蚊");
        let text = extractor
            .extract(Path::new("/any/dir/a.pdf"), DocType::Pdf)
            .unwrap();
        assert_eq!(text, "伊蚊");
        let other = extractor
            .extract(Path::new("/any/dir/b.pdf"), DocType::Pdf)
            .unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn test_mock_failure() {
        let extractor = MockExtractor::new()
            .with_excerpt("bad.docx", "never served")
            .with_failure("bad.docx");
        let path = Path::new("/x/bad.docx");
        assert!(extractor.extract(path, DocType::Docx).is_err());
        assert_eq!(extractor.extract_or_empty(path, DocType::Docx), "");
    }
}
