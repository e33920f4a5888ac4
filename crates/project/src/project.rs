use crate::manifest::ProjectInfo;
use crate::settings::{InputSettings, ProjectSettings};
use crate::tag::Tag;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// File extension shared by every project file.
pub const FILE_EXTENSION: &str = "xml";

/// A loaded project. Owns everything read from the project directory except
/// scenes, which are loaded on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    path: PathBuf,
    info: ProjectInfo,
    scenes: BTreeMap<String, String>,
    tags: Tag,
    settings: ProjectSettings,
    input: InputSettings,
}

impl Project {
    pub fn new(
        path: impl Into<PathBuf>,
        info: ProjectInfo,
        scenes: BTreeMap<String, String>,
        tags: Tag,
        settings: ProjectSettings,
        input: InputSettings,
    ) -> Self {
        Self {
            path: path.into(),
            info,
            scenes,
            tags,
            settings,
            input,
        }
    }

    /// Project directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &ProjectInfo {
        &self.info
    }

    /// Declared scenes: name to project-relative path.
    pub fn scenes(&self) -> &BTreeMap<String, String> {
        &self.scenes
    }

    pub fn tags(&self) -> &Tag {
        &self.tags
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn input(&self) -> &InputSettings {
        &self.input
    }

    /// Resolve a project-relative path against the project directory.
    ///
    /// `None` when the path could leave the directory: absolute paths and
    /// paths with `..` components.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> Option<PathBuf> {
        let relative = relative.as_ref();
        is_project_relative(relative).then(|| self.path.join(relative))
    }

    /// Resolve a project-relative markup path, appending the file extension
    /// when it has none.
    pub fn resolve_markup(&self, relative: &str) -> Option<PathBuf> {
        let mut path = self.resolve(relative)?;
        if path.extension().is_none() {
            path.set_extension(FILE_EXTENSION);
        }
        Some(path)
    }

    /// File path of a declared scene.
    pub fn scene_path(&self, name: &str) -> Option<PathBuf> {
        self.scenes.get(name).and_then(|p| self.resolve_markup(p))
    }
}

/// True when `path` only names entries below the directory it is joined to.
pub fn is_project_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
