//! Element-path reads and in-place edits for XML documents
//!
//! Paths are absolute element paths like `/Project/PropertyGroup/Version`.
//! Edits stream the document through `quick-xml`, so everything outside the
//! edited element (declaration, comments, whitespace, attributes) is written
//! back exactly as it was read.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesEnd, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::BuildError;

const BOM: &str = "\u{FEFF}";

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn element_name(name: quick_xml::name::QName<'_>) -> String {
    String::from_utf8_lossy(name.as_ref()).into_owned()
}

fn is_match(stack: &[String], segments: &[&str]) -> bool {
    stack.len() == segments.len() && stack.iter().zip(segments).all(|(a, b)| a == b)
}

/// Text of every element matching `path`, trimmed
pub fn peek(content: &str, path: &str) -> Result<Vec<String>> {
    let segments = segments(path);
    let mut reader = Reader::from_str(content);
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let mut values = Vec::new();

    loop {
        match reader.read_event().context("Failed to parse XML")? {
            Event::Start(e) => {
                stack.push(element_name(e.name()));
                if current.is_none() && is_match(&stack, &segments) {
                    current = Some(String::new());
                }
            }
            Event::Empty(e) => {
                stack.push(element_name(e.name()));
                if current.is_none() && is_match(&stack, &segments) {
                    values.push(String::new());
                }
                stack.pop();
            }
            Event::Text(t) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&t.unescape().context("Invalid XML text")?);
                }
            }
            Event::CData(c) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if is_match(&stack, &segments) {
                    if let Some(value) = current.take() {
                        values.push(value.trim().to_string());
                    }
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(values)
}

/// Replace the text of every element matching `path`
///
/// Returns the edited document and the number of matching elements; the
/// caller decides whether a count other than one is an error.
fn poke_all(content: &str, path: &str, value: &str) -> Result<(String, usize)> {
    let segments = segments(path);
    // The reader drops a leading byte order mark, so carry it over by hand
    let (bom, body) = match content.strip_prefix(BOM) {
        Some(body) => (BOM, body),
        None => ("", content),
    };
    let mut reader = Reader::from_str(body);
    let mut output = Vec::with_capacity(content.len());
    output.extend_from_slice(bom.as_bytes());
    let mut writer = Writer::new(output);
    let mut stack: Vec<String> = Vec::new();
    // Depth of the element whose content is being replaced
    let mut replacing: Option<usize> = None;
    let mut matches = 0usize;

    loop {
        let event = reader.read_event().context("Failed to parse XML")?;
        match &event {
            Event::Start(e) => {
                stack.push(element_name(e.name()));
                if replacing.is_some() {
                    continue;
                }
                if is_match(&stack, &segments) {
                    matches += 1;
                    replacing = Some(stack.len());
                    writer.write_event(event.borrow())?;
                    writer.write_event(Event::Text(BytesText::new(value)))?;
                    continue;
                }
            }
            Event::Empty(e) => {
                if replacing.is_some() {
                    continue;
                }
                let name = element_name(e.name());
                stack.push(name.clone());
                let matched = is_match(&stack, &segments);
                stack.pop();
                if matched {
                    matches += 1;
                    writer.write_event(Event::Start(e.clone()))?;
                    writer.write_event(Event::Text(BytesText::new(value)))?;
                    writer.write_event(Event::End(BytesEnd::new(name)))?;
                    continue;
                }
            }
            Event::End(_) => {
                let depth = stack.len();
                stack.pop();
                match replacing {
                    Some(d) if d == depth => replacing = None,
                    Some(_) => continue,
                    None => {}
                }
            }
            Event::Eof => break,
            _ => {
                if replacing.is_some() {
                    continue;
                }
            }
        }
        writer.write_event(event)?;
    }

    let output = String::from_utf8(writer.into_inner()).context("Edited XML is not UTF-8")?;
    Ok((output, matches))
}

/// Read the single element text at `path` in `file`
pub fn peek_single_file(file: &Path, path: &str) -> Result<String> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut values =
        peek(&content, path).with_context(|| format!("Failed to parse {}", file.display()))?;
    if values.len() != 1 {
        return Err(BuildError::XmlPath {
            path: path.to_string(),
            file: file.to_path_buf(),
            found: values.len(),
        }
        .into());
    }
    Ok(values.remove(0))
}

/// Set the text of the single element at `path` in `file`
pub fn poke_file(file: &Path, path: &str, value: &str) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let (edited, found) = poke_all(&content, path, value)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    if found != 1 {
        return Err(BuildError::XmlPath {
            path: path.to_string(),
            file: file.to_path_buf(),
            found,
        }
        .into());
    }
    fs::write(file, edited).with_context(|| format!("Failed to write {}", file.display()))?;
    tracing::debug!(file = %file.display(), path, value, "updated element");
    Ok(())
}
