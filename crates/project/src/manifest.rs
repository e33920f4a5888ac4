use crate::error::LoadError;
use crate::markup::Element;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_VERSION: &str = "0.0.0";

/// Project metadata read from `manifest.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub project_version: String,
    pub engine_version: String,
    /// Scene loaded when the project starts.
    pub start_scene: Option<String>,
}

impl ProjectInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_version: DEFAULT_VERSION.into(),
            engine_version: DEFAULT_VERSION.into(),
            start_scene: None,
        }
    }

    pub(crate) fn from_element(root: &Element, path: &Path) -> Result<Self, LoadError> {
        let name = root
            .child_text("name")
            .ok_or_else(|| LoadError::parse(path, "manifest has no <name>"))?;
        let version = |tag: &str| {
            root.child_text(tag)
                .unwrap_or(DEFAULT_VERSION)
                .to_string()
        };
        Ok(Self {
            name: name.to_string(),
            project_version: version("project_version"),
            engine_version: version("engine_version"),
            start_scene: root.child_text("start_scene").map(str::to_string),
        })
    }

    /// Serialize to the manifest file format.
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<manifest>\n");
        push_field(&mut out, "name", &self.name);
        push_field(&mut out, "project_version", &self.project_version);
        push_field(&mut out, "engine_version", &self.engine_version);
        if let Some(scene) = &self.start_scene {
            push_field(&mut out, "start_scene", scene);
        }
        out.push_str("</manifest>\n");
        out
    }
}

fn push_field(out: &mut String, tag: &str, value: &str) {
    out.push_str(&format!("    <{tag}>{}</{tag}>\n", escape(value)));
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::markup::MarkupDocument;

    fn parse(xml: &str) -> Result<ProjectInfo, LoadError> {
        let doc = MarkupDocument::parse("manifest.xml", xml)?;
        ProjectInfo::from_element(doc.expect_root("manifest")?, doc.path())
    }

    #[test]
    fn reads_all_fields() {
        let info = parse(
            "<manifest><name>Demo</name><project_version>1.2.0</project_version>\
             <engine_version>0.1.0</engine_version><start_scene>Title</start_scene></manifest>",
        )
        .unwrap();
        assert_eq!(info.name, "Demo");
        assert_eq!(info.project_version, "1.2.0");
        assert_eq!(info.engine_version, "0.1.0");
        assert_eq!(info.start_scene.as_deref(), Some("Title"));
    }

    #[test]
    fn versions_default_when_absent() {
        let info = parse("<manifest><name>Bare</name></manifest>").unwrap();
        assert_eq!(info, ProjectInfo::new("Bare"));
    }

    #[test]
    fn missing_name_is_parse_error() {
        let err = parse("<manifest><project_version>1</project_version></manifest>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn xml_round_trip_preserves_info() {
        let info = ProjectInfo {
            name: "Tom & Jerry's <Game>".into(),
            project_version: "2.0.1".into(),
            engine_version: "0.1.0".into(),
            start_scene: Some("Intro \"A\"".into()),
        };
        assert_eq!(parse(&info.to_xml()).unwrap(), info);

        let bare = ProjectInfo::new("Bare");
        assert_eq!(parse(&bare.to_xml()).unwrap(), bare);
    }
}
