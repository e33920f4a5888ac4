use crate::error::LoadError;
use crate::markup::Element;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Label used to categorize entities. Tags form a tree; any node's name can
/// be attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    pub children: Vec<Tag>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Number of levels in the tree; a lone tag has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Tag::depth).max().unwrap_or(0)
    }

    /// Total number of tags including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Tag::count).sum::<usize>()
    }

    /// Depth-first search by name.
    pub fn find(&self, name: &str) -> Option<&Tag> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

/// Parse the element `<tag name="..">` and everything nested under it,
/// appending the result to `tags`.
pub(crate) fn parse_tag(tags: &mut Vec<Tag>, element: &Element, path: &Path) -> Result<(), LoadError> {
    if element.name != "tag" {
        return Err(LoadError::parse(
            path,
            format!("unexpected <{}> inside tag definitions", element.name),
        ));
    }
    let name = element.required_attr("name", path)?;
    let mut tag = Tag::new(name);
    parse_tag_children(&mut tag, element, path)?;
    tags.push(tag);
    Ok(())
}

pub(crate) fn parse_tag_children(tag: &mut Tag, element: &Element, path: &Path) -> Result<(), LoadError> {
    let mut seen = HashSet::new();
    for child in &element.children {
        parse_tag(&mut tag.children, child, path)?;
        let added = &tag.children[tag.children.len() - 1].name;
        if !seen.insert(added.clone()) {
            return Err(LoadError::parse(
                path,
                format!("tag `{added}` is defined twice under `{}`", tag.name),
            ));
        }
    }
    Ok(())
}
