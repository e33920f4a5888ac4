use crate::entity::Entity;
use serde::Serialize;

/// A loaded scene: its declared name and top-level entities in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub name: String,
    pub entities: Vec<Entity>,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    /// Number of entities including nested children.
    pub fn entity_count(&self) -> usize {
        let mut count = 0;
        for e in &self.entities {
            e.walk(&mut |_, _| count += 1);
        }
        count
    }

    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find_map(|e| e.find(name))
    }
}
