use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use xml::reader::{EventReader, XmlEvent};
use zip::ZipArchive;
use zip::result::ZipError;

use super::ExtractError;

const DRAWINGML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PRESENTATIONML_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// Text of every top-level shape on the first `max_slides` slides.
///
/// Slides are taken in presentation order. Each shape's paragraphs are
/// joined by `\n` and each shape ends with `\n`, text or not.
pub fn extract(path: &Path, max_slides: usize) -> Result<String, ExtractError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let slides = slide_parts(&mut archive)?;

    let mut content = String::new();
    for name in slides.into_iter().take(max_slides) {
        let Some(xml) = read_part(&mut archive, &name)? else {
            continue;
        };
        for shape in shape_texts(&xml)? {
            content.push_str(&shape);
            content.push('\n');
        }
    }

    Ok(content)
}

/// Slide part names in the order the deck shows them.
///
/// Follows `p:sldIdLst` through the presentation relationships. Packages
/// without those parts fall back to the slide file numbers.
fn slide_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>, ExtractError> {
    let presentation = read_part(archive, PRESENTATION_PART)?;
    let rels = read_part(archive, PRESENTATION_RELS_PART)?;

    if let (Some(presentation), Some(rels)) = (presentation, rels) {
        let targets = relationship_targets(&rels)?;
        return Ok(slide_ids(&presentation)?
            .iter()
            .filter_map(|id| targets.get(id))
            .map(|target| resolve_part(target))
            .collect());
    }

    let mut numbered: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    numbered.sort();
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, ExtractError> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut xml = String::new();
            file.read_to_string(&mut xml)?;
            Ok(Some(xml))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// `r:id` of each `p:sldId`, in document order.
fn slide_ids(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut ids = Vec::new();
    for event in EventReader::new(xml.as_bytes()) {
        if let XmlEvent::StartElement {
            name, attributes, ..
        } = event?
        {
            if !is_element(&name, PRESENTATIONML_NS, "sldId") {
                continue;
            }
            if let Some(attr) = attributes
                .iter()
                .find(|a| is_element(&a.name, RELATIONSHIPS_NS, "id"))
            {
                ids.push(attr.value.clone());
            }
        }
    }
    Ok(ids)
}

/// Relationship `Id` → `Target`.
fn relationship_targets(xml: &str) -> Result<HashMap<String, String>, ExtractError> {
    let mut targets = HashMap::new();
    for event in EventReader::new(xml.as_bytes()) {
        if let XmlEvent::StartElement {
            name, attributes, ..
        } = event?
        {
            if name.local_name != "Relationship" {
                continue;
            }
            let attr = |key: &str| {
                attributes
                    .iter()
                    .find(|a| a.name.local_name == key)
                    .map(|a| a.value.clone())
            };
            if let (Some(id), Some(target)) = (attr("Id"), attr("Target")) {
                targets.insert(id, target);
            }
        }
    }
    Ok(targets)
}

/// Relationship targets are relative to `ppt/` unless absolute.
fn resolve_part(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{target}"),
    }
}

/// `ppt/slides/slide12.xml` → 12
fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn is_element(name: &xml::name::OwnedName, ns: &str, local: &str) -> bool {
    name.local_name == local && name.namespace.as_deref() == Some(ns)
}

/// Text of each top-level `p:sp` shape. Shapes nested in groups are skipped.
fn shape_texts(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut shapes = Vec::new();
    let mut group_depth = 0usize;
    let mut current: Option<Vec<String>> = None;
    let mut in_text = false;

    for event in EventReader::new(xml.as_bytes()) {
        match event? {
            XmlEvent::StartElement { name, .. } => {
                if is_element(&name, PRESENTATIONML_NS, "grpSp") {
                    group_depth += 1;
                } else if group_depth == 0 && is_element(&name, PRESENTATIONML_NS, "sp") {
                    current = Some(Vec::new());
                } else if let Some(paragraphs) = current.as_mut() {
                    if is_element(&name, DRAWINGML_NS, "p") {
                        paragraphs.push(String::new());
                    } else if is_element(&name, DRAWINGML_NS, "t") {
                        in_text = true;
                    }
                }
            }
            XmlEvent::Characters(text) | XmlEvent::Whitespace(text) if in_text => {
                if let Some(last) = current.as_mut().and_then(|p| p.last_mut()) {
                    last.push_str(&text);
                }
            }
            XmlEvent::EndElement { name } => {
                if is_element(&name, DRAWINGML_NS, "t") {
                    in_text = false;
                } else if is_element(&name, PRESENTATIONML_NS, "grpSp") {
                    group_depth = group_depth.saturating_sub(1);
                } else if group_depth == 0 && is_element(&name, PRESENTATIONML_NS, "sp") {
                    if let Some(paragraphs) = current.take() {
                        shapes.push(paragraphs.join("\n"));
                    }
                }
            }
            _ => {}
        }
    }

    Ok(shapes)
}
