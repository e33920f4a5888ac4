//! Owned XML element tree.
//!
//! The file text and the borrowing `roxmltree` document only live inside
//! [`MarkupDocument::parse`]; everything handed to callers owns its strings, so
//! no parsed tree can outlive the buffer it was read from.

use crate::error::LoadError;
use std::path::{Path, PathBuf};

/// One XML element with its attributes, trimmed text content and child elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute that must be present; `path` is only used for the error.
    pub fn required_attr(&self, name: &str, path: &Path) -> Result<&str, LoadError> {
        self.attr(name).ok_or_else(|| {
            LoadError::parse(
                path,
                format!("<{}> is missing the `{name}` attribute", self.name),
            )
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text content of the first child element called `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.text.as_deref())
    }
}

/// A parsed markup file.
#[derive(Debug, Clone)]
pub struct MarkupDocument {
    path: PathBuf,
    root: Element,
}

impl MarkupDocument {
    /// Read and parse the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        tracing::debug!("parsing {}", path.display());
        Self::parse(path, &text)
    }

    /// Parse `text` as the contents of `path`.
    pub fn parse(path: impl AsRef<Path>, text: &str) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let doc = roxmltree::Document::parse(text)
            .map_err(|e| LoadError::parse(path, e.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            root: convert(doc.root_element()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// The root element, provided it is called `name`.
    pub fn expect_root(&self, name: &str) -> Result<&Element, LoadError> {
        if self.root.name == name {
            Ok(&self.root)
        } else {
            Err(LoadError::parse(
                &self.path,
                format!("expected root element <{name}>, found <{}>", self.root.name),
            ))
        }
    }
}

fn convert(node: roxmltree::Node<'_, '_>) -> Element {
    let mut text = String::new();
    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push(convert(child));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                text.push_str(t);
            }
        }
    }
    let text = text.trim();

    Element {
        name: node.tag_name().name().to_string(),
        attributes: node
            .attributes()
            .map(|a| (a.name().to_string(), a.value().to_string()))
            .collect(),
        text: (!text.is_empty()).then(|| text.to_string()),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parse_builds_owned_tree() {
        let doc = MarkupDocument::parse(
            "inline.xml",
            r#"<root a="1"><item name="x">  hello </item><item name="y"/></root>"#,
        )
        .unwrap();
        let root = doc.expect_root("root").unwrap();
        assert_eq!(root.attr("a"), Some("1"));
        assert_eq!(root.children_named("item").count(), 2);
        assert_eq!(root.child_text("item"), Some("hello"));
        assert_eq!(root.children[1].text, None);
    }

    #[test]
    fn unclosed_tag_is_parse_error() {
        let err = MarkupDocument::parse("broken.xml", "<root><item></root>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.path(), Path::new("broken.xml"));
    }

    #[test]
    fn wrong_root_is_parse_error() {
        let doc = MarkupDocument::parse("x.xml", "<scenes/>").unwrap();
        assert_eq!(doc.expect_root("tag").unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MarkupDocument::load(dir.path().join("nope.xml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn required_attr_reports_element() {
        let el = Element::new("scene");
        let err = el.required_attr("name", Path::new("s.xml")).unwrap_err();
        assert!(err.to_string().contains("<scene> is missing the `name` attribute"));
    }
}
