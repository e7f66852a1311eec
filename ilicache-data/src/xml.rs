//! Minimal element tree over `quick-xml` events.
//!
//! Repository documents are small, so they are loaded whole. Element names
//! are stored without namespace prefixes.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::{events::Event, reader::Reader};
use thiserror::Error;

/// Errors raised while loading a metadata document.
#[derive(Debug, Error)]
pub(crate) enum XmlError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed XML in {path}: {source}")]
    Syntax {
        path: Utf8PathBuf,
        #[source]
        source: quick_xml::Error,
    },
    #[error("{path} ends before element <{element}> is closed")]
    Unclosed { path: Utf8PathBuf, element: String },
    #[error("{path} has no root element")]
    Empty { path: Utf8PathBuf },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) name: String,
    pub(crate) text: String,
    pub(crate) children: Vec<Element>,
}

impl Element {
    fn named(raw: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(raw).into_owned(),
            ..Self::default()
        }
    }

    /// First direct child called `name`.
    pub(crate) fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Direct children called `name`, in document order.
    pub(crate) fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// This element and every descendant called `name`, in document order.
    pub(crate) fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Self> {
        let mut found = Vec::new();
        self.collect_named(name, &mut found);
        found
    }

    fn collect_named<'a>(&'a self, name: &str, found: &mut Vec<&'a Self>) {
        if self.name == name {
            found.push(self);
        }
        for child in &self.children {
            child.collect_named(name, found);
        }
    }

    /// Trimmed text of the first child called `name`, if non-empty.
    pub(crate) fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .map(|child| child.text.trim())
            .filter(|text| !text.is_empty())
    }
}

/// Load the document at `path` into an element tree.
pub(crate) fn read_document(path: &Utf8Path) -> Result<Element, XmlError> {
    let bytes = ilicache_fs::read_bytes(path).map_err(|source| XmlError::Read {
        path: path.to_owned(),
        source,
    })?;
    parse_document(&bytes, path)
}

fn parse_document(bytes: &[u8], path: &Utf8Path) -> Result<Element, XmlError> {
    let syntax = |source| XmlError::Syntax {
        path: path.to_owned(),
        source,
    };
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(syntax)? {
            Event::Start(start) => stack.push(Element::named(start.local_name().as_ref())),
            Event::Empty(empty) => {
                let element = Element::named(empty.local_name().as_ref());
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                let decoded = text.unescape().map_err(syntax)?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&decoded);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed {
            path: path.to_owned(),
            element: open.name,
        });
    }
    root.ok_or_else(|| XmlError::Empty {
        path: path.to_owned(),
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TRANSFER xmlns="http://www.interlis.ch/INTERLIS2.3">
  <DATASECTION>
    <ili:Entry xmlns:ili="http://www.interlis.ch/INTERLIS2.3">
      <Name> Units </Name>
      <Note><![CDATA[a < b]]></Note>
      <Empty/>
    </ili:Entry>
    <Entry><Name>Time</Name></Entry>
  </DATASECTION>
</TRANSFER>"#;

    fn parse(text: &str) -> Result<Element, XmlError> {
        parse_document(text.as_bytes(), Utf8Path::new("sample.xml"))
    }

    #[rstest]
    fn strips_prefixes_and_keeps_document_order() {
        let root = parse(SAMPLE).expect("sample parses");
        assert_eq!(root.name, "TRANSFER");
        let names: Vec<&str> = root
            .descendants_named("Entry")
            .into_iter()
            .filter_map(|entry| entry.child_text("Name"))
            .collect();
        assert_eq!(names, ["Units", "Time"]);
    }

    #[rstest]
    fn reads_cdata_and_ignores_empty_text() {
        let root = parse(SAMPLE).expect("sample parses");
        let entry = root
            .descendants_named("Entry")
            .into_iter()
            .next()
            .expect("first entry");
        assert_eq!(entry.child_text("Note"), Some("a < b"));
        assert!(entry.child("Empty").is_some());
        assert_eq!(entry.child_text("Empty"), None);
    }

    #[rstest]
    #[case("<TRANSFER><DATASECTION></TRANSFER>")]
    #[case("<TRANSFER><DATASECTION>")]
    #[case("")]
    fn rejects_broken_documents(#[case] text: &str) {
        assert!(parse(text).is_err());
    }
}
