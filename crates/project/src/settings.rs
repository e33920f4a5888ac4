//! Project and input settings.
//!
//! Both are plain values returned by the loader and passed on by the caller;
//! nothing here is process-global.

use crate::error::LoadError;
use crate::markup::Element;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tessera_common::{parse_bool, parse_color};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowMode {
    #[default]
    Windowed,
    Borderless,
    Fullscreen,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSettings {
    pub title: Option<String>,
    pub width: u32,
    pub height: u32,
    pub mode: WindowMode,
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: None,
            width: 1280,
            height: 720,
            mode: WindowMode::Windowed,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectionMode {
    Orthographic,
    Perspective { fov_degrees: f32, near: f32, far: f32 },
}

impl Default for ProjectionMode {
    fn default() -> Self {
        Self::Perspective {
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub projection: ProjectionMode,
    pub clear_color: [f32; 4],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            projection: ProjectionMode::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Contents of `project_settings.xml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    pub window: WindowSettings,
    pub rendering: RenderSettings,
}

impl ProjectSettings {
    pub(crate) fn from_element(root: &Element, path: &Path) -> Result<Self, LoadError> {
        let mut settings = Self::default();

        if let Some(window) = root.child("window") {
            let w = &mut settings.window;
            w.title = window.attr("title").map(str::to_string);
            if let Some(v) = window.attr("width") {
                w.width = parse_number(v, "width", path)?;
            }
            if let Some(v) = window.attr("height") {
                w.height = parse_number(v, "height", path)?;
            }
            if let Some(v) = window.attr("mode") {
                w.mode = match v {
                    "windowed" => WindowMode::Windowed,
                    "borderless" => WindowMode::Borderless,
                    "fullscreen" => WindowMode::Fullscreen,
                    other => {
                        return Err(LoadError::parse(path, format!("unknown window mode `{other}`")));
                    }
                };
            }
            if let Some(v) = window.attr("vsync") {
                w.vsync = parse_bool(v).map_err(|e| LoadError::parse(path, e.to_string()))?;
            }
        }

        if let Some(rendering) = root.child("rendering") {
            let r = &mut settings.rendering;
            match rendering.attr("projection") {
                None | Some("perspective") => {
                    let (fov_degrees, near, far) = match r.projection {
                        ProjectionMode::Perspective {
                            fov_degrees,
                            near,
                            far,
                        } => (fov_degrees, near, far),
                        ProjectionMode::Orthographic => (45.0, 0.1, 100.0),
                    };
                    r.projection = ProjectionMode::Perspective {
                        fov_degrees: optional_number(rendering, "fov", path)?.unwrap_or(fov_degrees),
                        near: optional_number(rendering, "near", path)?.unwrap_or(near),
                        far: optional_number(rendering, "far", path)?.unwrap_or(far),
                    };
                }
                Some("orthographic") => r.projection = ProjectionMode::Orthographic,
                Some(other) => {
                    return Err(LoadError::parse(path, format!("unknown projection `{other}`")));
                }
            }
            if let Some(v) = rendering.attr("clear_color") {
                r.clear_color = parse_color(v).map_err(|e| LoadError::parse(path, e.to_string()))?;
            }
        }

        Ok(settings)
    }
}

/// Keys bound to one named action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBinding {
    pub action: String,
    pub keys: Vec<String>,
}

/// Contents of `input_settings.xml`, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSettings {
    pub bindings: Vec<ActionBinding>,
}

impl InputSettings {
    pub(crate) fn from_element(root: &Element, path: &Path) -> Result<Self, LoadError> {
        let mut seen = HashSet::new();
        let mut bindings = Vec::new();
        for action in &root.children {
            if action.name != "action" {
                return Err(LoadError::parse(
                    path,
                    format!("unexpected <{}> in input settings", action.name),
                ));
            }
            let name = action.required_attr("name", path)?;
            if !seen.insert(name) {
                return Err(LoadError::parse(path, format!("action `{name}` is bound twice")));
            }
            let mut keys = Vec::new();
            for key in &action.children {
                if key.name != "key" {
                    return Err(LoadError::parse(
                        path,
                        format!("unexpected <{}> in action `{name}`", key.name),
                    ));
                }
                keys.extend(key.text.clone());
            }
            bindings.push(ActionBinding {
                action: name.to_string(),
                keys,
            });
        }
        Ok(Self { bindings })
    }

    pub fn keys_for(&self, action: &str) -> Option<&[String]> {
        self.bindings
            .iter()
            .find(|b| b.action == action)
            .map(|b| b.keys.as_slice())
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str, path: &Path) -> Result<T, LoadError> {
    value
        .trim()
        .parse()
        .map_err(|_| LoadError::parse(path, format!("`{value}` is not a valid {what}")))
}

fn optional_number(el: &Element, name: &str, path: &Path) -> Result<Option<f32>, LoadError> {
    el.attr(name).map(|v| parse_number(v, name, path)).transpose()
}
