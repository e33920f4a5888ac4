use crate::alias::AliasMap;
use serde::Serialize;
use std::path::PathBuf;
use tessera_common::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    Texture,
    Mesh,
    Audio,
    Script,
}

impl ResourceKind {
    /// Element name used in entity markup.
    pub fn from_element(name: &str) -> Option<Self> {
        match name {
            "texture" => Some(Self::Texture),
            "mesh" => Some(Self::Mesh),
            "audio" => Some(Self::Audio),
            "script" => Some(Self::Script),
            _ => None,
        }
    }
}

/// A file an entity depends on, resolved to a path inside the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub kind: ResourceKind,
    pub name: String,
    pub path: PathBuf,
}

/// A node in a scene's entity tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub name: String,
    pub tags: Vec<String>,
    /// Prefab this entity was instantiated from, as written in the markup.
    pub prefab: Option<String>,
    /// Aliases declared on this node, with values already substituted.
    pub aliases: AliasMap,
    pub transform: Transform,
    pub resources: Vec<Resource>,
    pub children: Vec<Entity>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            prefab: None,
            aliases: AliasMap::new(),
            transform: Transform::default(),
            resources: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Depth-first search of this entity and its descendants.
    pub fn find(&self, name: &str) -> Option<&Entity> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Visit this entity and every descendant in document order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Entity, usize)) {
        self.walk_at(0, f);
    }

    fn walk_at<'a>(&'a self, depth: usize, f: &mut impl FnMut(&'a Entity, usize)) {
        f(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, f);
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn resources_of(&self, kind: ResourceKind) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(move |r| r.kind == kind)
    }

    /// Combine a prefab `base` with the overrides written on the including node.
    pub(crate) fn merge_onto(base: Entity, overrides: Entity, transform_overridden: bool) -> Entity {
        let mut merged = base;
        merged.name = overrides.name;
        for tag in overrides.tags {
            if !merged.tags.contains(&tag) {
                merged.tags.push(tag);
            }
        }
        merged.prefab = overrides.prefab;
        merged.aliases = overrides.aliases;
        if transform_overridden {
            merged.transform = overrides.transform;
        }
        merged.resources.extend(overrides.resources);
        merged.children.extend(overrides.children);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn tree() -> Entity {
        let mut root = Entity::new("root");
        let mut a = Entity::new("a");
        a.children.push(Entity::new("a1"));
        root.children.push(a);
        root.children.push(Entity::new("b"));
        root
    }

    #[test]
    fn walk_is_depth_first_in_order() {
        let root = tree();
        let mut seen = Vec::new();
        root.walk(&mut |e, depth| seen.push((e.name.clone(), depth)));
        assert_eq!(
            seen,
            [
                ("root".to_string(), 0),
                ("a".to_string(), 1),
                ("a1".to_string(), 2),
                ("b".to_string(), 1)
            ]
        );
    }

    #[test]
    fn find_descends() {
        assert!(tree().find("a1").is_some());
        assert!(tree().find("zz").is_none());
    }

    #[test]
    fn merge_appends_and_overrides() {
        let mut base = Entity::new("Enemy");
        base.tags.push("enemy".into());
        base.transform.position = Vec3::X;
        base.children.push(Entity::new("Weapon"));

        let mut over = Entity::new("Boss");
        over.tags.extend(["enemy".to_string(), "boss".to_string()]);
        over.prefab = Some("Prefabs/Enemy".into());
        over.transform.position = Vec3::Y;
        over.children.push(Entity::new("Crown"));

        let merged = Entity::merge_onto(base.clone(), over.clone(), false);
        assert_eq!(merged.name, "Boss");
        assert_eq!(merged.tags, ["enemy", "boss"]);
        assert_eq!(merged.transform.position, Vec3::X);
        let kids: Vec<_> = merged.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(kids, ["Weapon", "Crown"]);

        let moved = Entity::merge_onto(base, over, true);
        assert_eq!(moved.transform.position, Vec3::Y);
    }
}
