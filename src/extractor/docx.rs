use std::fs;
use std::path::Path;

use docx_rs::{DocumentChild, InsertChild, ParagraphChild, Run, RunChild};

use super::ExtractError;

/// Text of the first `max_paragraphs` body paragraphs, one per line.
///
/// Hyperlink and tracked-insert runs count as paragraph text, and line
/// breaks become `\n`. Tables and other block content are skipped; empty
/// paragraphs still contribute an empty line.
pub fn extract(path: &Path, max_paragraphs: usize) -> Result<String, ExtractError> {
    let bytes = fs::read(path)?;
    let docx = docx_rs::read_docx(&bytes).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut content = String::new();
    let paragraphs = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(p),
            _ => None,
        })
        .take(max_paragraphs);

    for paragraph in paragraphs {
        push_children(&paragraph.children, &mut content);
        content.push('\n');
    }

    Ok(content)
}

fn push_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(run, out),
            ParagraphChild::Hyperlink(link) => push_children(&link.children, out),
            ParagraphChild::Insert(insert) => {
                for c in &insert.children {
                    if let InsertChild::Run(run) = c {
                        push_run(run, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) | RunChild::CarriageReturn(_) => out.push('\n'),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{BreakType, Docx, Hyperlink, HyperlinkType, Paragraph};

    fn write_docx(path: &Path, paragraphs: &[&str]) {
        let mut docx = Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
        }
        let file = fs::File::create(path).unwrap();
        docx.build().pack(file).unwrap();
    }

    #[test]
    fn test_extract_paragraphs() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("方案.docx");
        write_docx(&path, &["第一段 登革热", "第二段"]);

        let text = extract(&path, 20).unwrap();
        assert_eq!(text, "第一段 登革热\n第二段\n");
    }

    #[test]
    fn test_hyperlink_and_break_text() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("links.docx");
        let paragraph = Paragraph::new()
            .add_run(Run::new().add_text("见"))
            .add_hyperlink(
                Hyperlink::new("guide", HyperlinkType::Anchor)
                    .add_run(Run::new().add_text("登革热指南")),
            )
            .add_run(
                Run::new()
                    .add_text("第一行")
                    .add_break(BreakType::TextWrapping)
                    .add_text("第二行"),
            );
        let file = fs::File::create(&path).unwrap();
        Docx::new().add_paragraph(paragraph).build().pack(file).unwrap();

        let text = extract(&path, 20).unwrap();
        assert_eq!(text, "见登革热指南第一行\n第二行\n");
    }

    #[test]
    fn test_paragraph_cap() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("long.docx");
        let paragraphs: Vec<String> = (0..30).map(|i| format!("para{i}")).collect();
        let refs: Vec<&str> = paragraphs.iter().map(String::as_str).collect();
        write_docx(&path, &refs);

        let text = extract(&path, 20).unwrap();
        assert_eq!(text.lines().count(), 20);
        assert!(text.contains("para19"));
        assert!(!text.contains("para20"));
    }

    #[test]
    fn test_legacy_doc_is_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("old.doc");
        // OLE2 compound document signature, not a zip container.
        fs::write(&path, [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]).unwrap();
        assert!(extract(&path, 20).is_err());
    }
}
