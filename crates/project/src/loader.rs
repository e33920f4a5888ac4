//! Loading projects from XML files.
//!
//! # Layout
//! ```text
//! <projects root>/<project name>/
//!   manifest.xml            - ProjectInfo
//!   scene_declarations.xml  - scene name -> scene file
//!   tag_definitions.xml     - tag tree
//!   project_settings.xml    - window and rendering settings
//!   input_settings.xml      - action bindings
//!   Scenes/*.xml            - one file per scene (paths are declared)
//!   Prefabs/*.xml           - reusable entity subtrees (paths are referenced)
//! ```

use crate::alias::{AliasMap, SubstituteError};
use crate::entity::{Entity, Resource, ResourceKind};
use crate::error::{LoadError, Reference};
use crate::manifest::ProjectInfo;
use crate::markup::{Element, MarkupDocument};
use crate::project::{FILE_EXTENSION, Project, is_project_relative};
use crate::scene::Scene;
use crate::settings::{InputSettings, ProjectSettings};
use crate::tag::{Tag, parse_tag_children};
use glam::Vec3;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tessera_common::{Transform, parse_vec3};

pub const MANIFEST_FILE: &str = "manifest";
pub const SCENE_DECLARATIONS_FILE: &str = "scene_declarations";
pub const TAG_DEFINITIONS_FILE: &str = "tag_definitions";
pub const PROJECT_SETTINGS_FILE: &str = "project_settings";
pub const INPUT_SETTINGS_FILE: &str = "input_settings";

/// Name given to the root of the tag tree when the markup does not name it.
pub const ROOT_TAG: &str = "root";

/// Source of projects, scenes and prefabs.
///
/// Every operation either returns a fully built value or fails; nothing is
/// cached between calls.
pub trait ProjectLoader {
    /// Load the project called `name`, composing its manifest, scene
    /// declarations, tags and settings.
    fn load_project(&self, name: &str) -> Result<Project, LoadError>;

    fn load_project_manifest(&self, project_path: &Path) -> Result<ProjectInfo, LoadError>;

    /// Scene name to project-relative scene file. Declaring a name twice is an error.
    fn load_scene_declarations(
        &self,
        project_path: &Path,
    ) -> Result<BTreeMap<String, String>, LoadError>;

    fn load_tag_definitions(&self, project_path: &Path) -> Result<Tag, LoadError>;

    fn load_project_settings(&self, project_path: &Path) -> Result<ProjectSettings, LoadError>;

    fn load_input_settings(&self, project_path: &Path) -> Result<InputSettings, LoadError>;

    /// Load a scene declared by `project`.
    fn load_scene(&self, project: &Project, scene_name: &str) -> Result<Scene, LoadError>;

    /// Load a prefab file with `aliases` as the enclosing alias scope.
    fn load_entity_prefab(
        &self,
        prefab_path: &str,
        project: &Project,
        aliases: &AliasMap,
    ) -> Result<Entity, LoadError>;
}

/// [`ProjectLoader`] reading the XML layout described in the module docs.
#[derive(Debug, Clone)]
pub struct XmlProjectLoader {
    projects_root: PathBuf,
}

impl XmlProjectLoader {
    pub fn new(projects_root: impl Into<PathBuf>) -> Self {
        Self {
            projects_root: projects_root.into(),
        }
    }

    pub fn projects_root(&self) -> &Path {
        &self.projects_root
    }

    fn project_file(project_path: &Path, stem: &str) -> PathBuf {
        project_path.join(format!("{stem}.{FILE_EXTENSION}"))
    }

    /// Load `path` and check that its root element is `<root>`.
    fn load_checked(path: &Path, root: &str) -> Result<MarkupDocument, LoadError> {
        let doc = MarkupDocument::load(path)?;
        doc.expect_root(root)?;
        Ok(doc)
    }

    /// Parse an `<entity>` element and its subtree.
    ///
    /// `aliases` is the enclosing scope, `prefabs` the chain of prefab files
    /// currently being expanded.
    fn parse_entity(
        &self,
        element: &Element,
        aliases: &AliasMap,
        project: &Project,
        file: &Path,
        prefabs: &mut Vec<PathBuf>,
    ) -> Result<Entity, LoadError> {
        if element.name != "entity" {
            return Err(LoadError::parse(
                file,
                format!("expected <entity>, found <{}>", element.name),
            ));
        }

        let declared = parse_aliases(element, aliases, file)?;
        let scope = aliases.scoped(&declared);

        let tags: Vec<String> = element
            .attr("tags")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if let Some(unknown) = tags.iter().find(|t| !project.tags().contains(t.as_str())) {
            return Err(LoadError::reference(file, Reference::Tag(unknown.clone())));
        }

        let transform_element = element.child("transform");
        let transform = match transform_element {
            Some(t) => parse_transform(t, file)?,
            None => Transform::default(),
        };

        let mut resources = Vec::new();
        let mut children = Vec::new();
        for child in &element.children {
            match child.name.as_str() {
                "alias" | "transform" => {}
                "resources" => self.parse_resources(&mut resources, child, &scope, project, file)?,
                "entity" => children.push(self.parse_entity(child, &scope, project, file, prefabs)?),
                other => {
                    return Err(LoadError::parse(
                        file,
                        format!("unexpected <{other}> inside <entity>"),
                    ));
                }
            }
        }

        let mut entity = Entity {
            name: element.attr("name").unwrap_or_default().to_string(),
            tags,
            prefab: element.attr("prefab").map(str::to_string),
            aliases: declared,
            transform,
            resources,
            children,
        };

        match element.attr("prefab") {
            Some(prefab) => {
                let base = self.instantiate_prefab(prefab, project, &scope, file, prefabs)?;
                if element.attr("name").is_none() {
                    entity.name = base.name.clone();
                }
                Ok(Entity::merge_onto(base, entity, transform_element.is_some()))
            }
            None => {
                element.required_attr("name", file)?;
                Ok(entity)
            }
        }
    }

    /// Expand a prefab referenced from `file`.
    fn instantiate_prefab(
        &self,
        prefab: &str,
        project: &Project,
        aliases: &AliasMap,
        file: &Path,
        prefabs: &mut Vec<PathBuf>,
    ) -> Result<Entity, LoadError> {
        let Some(path) = project.resolve_markup(prefab) else {
            return Err(LoadError::reference(file, Reference::Prefab(prefab.to_string())));
        };
        if prefabs.contains(&path) {
            return Err(LoadError::reference(
                file,
                Reference::PrefabCycle(prefab.to_string()),
            ));
        }
        if !path.is_file() {
            return Err(LoadError::reference(file, Reference::Prefab(prefab.to_string())));
        }

        prefabs.push(path.clone());
        let result = self.parse_prefab_file(&path, project, aliases, prefabs);
        prefabs.pop();
        result
    }

    fn parse_prefab_file(
        &self,
        path: &Path,
        project: &Project,
        aliases: &AliasMap,
        prefabs: &mut Vec<PathBuf>,
    ) -> Result<Entity, LoadError> {
        let doc = Self::load_checked(path, "entity")?;
        tracing::debug!("expanding prefab {}", path.display());
        self.parse_entity(doc.root(), aliases, project, doc.path(), prefabs)
    }

    /// Parse a `<resources>` element, appending to `resources`. Paths are
    /// rewritten with `aliases` and then resolved inside the project.
    fn parse_resources(
        &self,
        resources: &mut Vec<Resource>,
        element: &Element,
        aliases: &AliasMap,
        project: &Project,
        file: &Path,
    ) -> Result<(), LoadError> {
        for res in &element.children {
            let kind = ResourceKind::from_element(&res.name).ok_or_else(|| {
                LoadError::parse(file, format!("unknown resource kind <{}>", res.name))
            })?;
            let raw_path = res.required_attr("path", file)?;
            let relative = substitute(aliases, raw_path, file)?;
            let path = project.resolve(&relative).ok_or_else(|| {
                LoadError::parse(
                    file,
                    format!("resource path `{relative}` leaves the project directory"),
                )
            })?;
            let name = res.attr("name").unwrap_or(&relative).to_string();
            resources.push(Resource { kind, name, path });
        }
        Ok(())
    }
}

impl ProjectLoader for XmlProjectLoader {
    fn load_project(&self, name: &str) -> Result<Project, LoadError> {
        let project_path = self.projects_root.join(name);
        let info = self.load_project_manifest(&project_path)?;
        let scenes = self.load_scene_declarations(&project_path)?;
        let tags = self.load_tag_definitions(&project_path)?;
        let settings = self.load_project_settings(&project_path)?;
        let input = self.load_input_settings(&project_path)?;

        if let Some(start) = &info.start_scene {
            if !scenes.contains_key(start) {
                return Err(LoadError::reference(
                    &Self::project_file(&project_path, MANIFEST_FILE),
                    Reference::Scene(start.clone()),
                ));
            }
        }

        tracing::info!(
            "loaded project {} ({} scenes, {} tags)",
            info.name,
            scenes.len(),
            tags.count()
        );
        Ok(Project::new(project_path, info, scenes, tags, settings, input))
    }

    fn load_project_manifest(&self, project_path: &Path) -> Result<ProjectInfo, LoadError> {
        let path = Self::project_file(project_path, MANIFEST_FILE);
        let doc = Self::load_checked(&path, "manifest")?;
        ProjectInfo::from_element(doc.root(), &path)
    }

    fn load_scene_declarations(
        &self,
        project_path: &Path,
    ) -> Result<BTreeMap<String, String>, LoadError> {
        let path = Self::project_file(project_path, SCENE_DECLARATIONS_FILE);
        let doc = Self::load_checked(&path, "scenes")?;

        let mut scenes = BTreeMap::new();
        for scene in &doc.root().children {
            if scene.name != "scene" {
                return Err(LoadError::parse(
                    &path,
                    format!("unexpected <{}> in scene declarations", scene.name),
                ));
            }
            let name = scene.required_attr("name", &path)?;
            let file = scene.required_attr("path", &path)?;
            if !is_project_relative(Path::new(file)) {
                return Err(LoadError::parse(
                    &path,
                    format!("scene `{name}` path `{file}` leaves the project directory"),
                ));
            }
            if scenes.insert(name.to_string(), file.to_string()).is_some() {
                return Err(LoadError::parse(
                    &path,
                    format!("scene `{name}` is declared more than once"),
                ));
            }
        }
        Ok(scenes)
    }

    fn load_tag_definitions(&self, project_path: &Path) -> Result<Tag, LoadError> {
        let path = Self::project_file(project_path, TAG_DEFINITIONS_FILE);
        let doc = Self::load_checked(&path, "tag")?;
        let root = doc.root();
        let mut tag = Tag::new(root.attr("name").unwrap_or(ROOT_TAG));
        parse_tag_children(&mut tag, root, &path)?;
        Ok(tag)
    }

    fn load_project_settings(&self, project_path: &Path) -> Result<ProjectSettings, LoadError> {
        let path = Self::project_file(project_path, PROJECT_SETTINGS_FILE);
        let doc = Self::load_checked(&path, "settings")?;
        ProjectSettings::from_element(doc.root(), &path)
    }

    fn load_input_settings(&self, project_path: &Path) -> Result<InputSettings, LoadError> {
        let path = Self::project_file(project_path, INPUT_SETTINGS_FILE);
        let doc = Self::load_checked(&path, "input")?;
        InputSettings::from_element(doc.root(), &path)
    }

    fn load_scene(&self, project: &Project, scene_name: &str) -> Result<Scene, LoadError> {
        let path = project.scene_path(scene_name).ok_or_else(|| {
            LoadError::reference(
                &Self::project_file(project.path(), SCENE_DECLARATIONS_FILE),
                Reference::Scene(scene_name.to_string()),
            )
        })?;
        let doc = Self::load_checked(&path, "scene")?;
        let root = doc.root();

        let aliases = parse_aliases(root, &AliasMap::new(), doc.path())?;
        let mut prefabs = Vec::new();
        let mut scene = Scene::new(scene_name);
        for child in &root.children {
            match child.name.as_str() {
                "alias" => {}
                "entity" => scene.entities.push(self.parse_entity(
                    child,
                    &aliases,
                    project,
                    doc.path(),
                    &mut prefabs,
                )?),
                other => {
                    return Err(LoadError::parse(
                        doc.path(),
                        format!("unexpected <{other}> inside <scene>"),
                    ));
                }
            }
        }

        tracing::info!(
            "loaded scene {} ({} entities)",
            scene.name,
            scene.entity_count()
        );
        Ok(scene)
    }

    fn load_entity_prefab(
        &self,
        prefab_path: &str,
        project: &Project,
        aliases: &AliasMap,
    ) -> Result<Entity, LoadError> {
        let path = project.resolve_markup(prefab_path).ok_or_else(|| {
            LoadError::reference(project.path(), Reference::Prefab(prefab_path.to_string()))
        })?;
        let mut prefabs = vec![path.clone()];
        self.parse_prefab_file(&path, project, aliases, &mut prefabs)
    }
}

/// Collect the `<alias>` children of `element`. Values are substituted
/// against the enclosing scope, not against each other.
fn parse_aliases(element: &Element, enclosing: &AliasMap, file: &Path) -> Result<AliasMap, LoadError> {
    let mut declared = AliasMap::new();
    for alias in element.children_named("alias") {
        let name = alias.required_attr("name", file)?;
        let value = substitute(enclosing, alias.required_attr("value", file)?, file)?;
        if declared.insert(name, value).is_some() {
            return Err(LoadError::parse(
                file,
                format!("alias `{name}` is declared twice on <{}>", element.name),
            ));
        }
    }
    Ok(declared)
}

fn substitute(aliases: &AliasMap, text: &str, file: &Path) -> Result<String, LoadError> {
    aliases.substitute(text).map_err(|e| match e {
        SubstituteError::Unknown(key) => LoadError::reference(file, Reference::Alias(key)),
        SubstituteError::Unterminated(_) => LoadError::parse(file, e.to_string()),
    })
}

fn parse_transform(element: &Element, file: &Path) -> Result<Transform, LoadError> {
    let vec = |name: &str, default: Vec3| -> Result<Vec3, LoadError> {
        element
            .attr(name)
            .map(|v| {
                parse_vec3(v).map_err(|e| LoadError::parse(file, format!("transform {name}: {e}")))
            })
            .transpose()
            .map(|v| v.unwrap_or(default))
    };
    Ok(Transform::from_euler_degrees(
        vec("position", Vec3::ZERO)?,
        vec("rotation", Vec3::ZERO)?,
        vec("scale", Vec3::ONE)?,
    ))
}
