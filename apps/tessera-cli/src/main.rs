use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec2;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tessera_project::{
    Entity, ProjectLoader, ProjectionMode, ResourceKind, Scene, Tag, XmlProjectLoader,
};
use tessera_render::{
    Quad, RecordingDevice, RenderObject, RenderPool, RenderingEngine, Texture, TextureHandle,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tessera-cli", about = "CLI tool for tessera projects")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding one sub-directory per project
    #[arg(short, long, default_value = "projects")]
    projects_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Load a project and every scene it declares
    Validate { project: String },
    /// Print manifest, scenes, settings and input bindings
    Inspect {
        project: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the tag tree
    Tags { project: String },
    /// Print a scene's entity tree
    Scene {
        project: String,
        scene: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the device commands one frame of a scene would issue
    Plan {
        project: String,
        scene: String,
        /// Framebuffer width (defaults to the project's window width)
        #[arg(long)]
        width: Option<u32>,
        /// Framebuffer height (defaults to the project's window height)
        #[arg(long)]
        height: Option<u32>,
    },
    /// Request a graphics adapter and print its capabilities
    Probe,
}

/// One pass with a single `sprite` group and one object per entity that has
/// textures. Texture handles are numbered by first use of each path.
fn build_pool(scene: &Scene) -> RenderPool {
    let mut handles: BTreeMap<PathBuf, TextureHandle> = BTreeMap::new();
    let mut pool = RenderPool::new();
    let group = pool.add_pass("main").add_group("sprite");
    for root in &scene.entities {
        root.walk(&mut |entity: &Entity, _depth| {
            let quad = Quad::new(
                entity.transform.position.truncate(),
                Vec2::new(entity.transform.scale.x, entity.transform.scale.y),
            );
            let mut object = RenderObject::new(&entity.name).with_quad(quad);
            for resource in entity.resources_of(ResourceKind::Texture) {
                let next = TextureHandle(handles.len() as u32 + 1);
                let handle = *handles.entry(resource.path.clone()).or_insert(next);
                object = object.with_texture(Texture::new(&resource.name, handle));
            }
            if !object.textures.is_empty() {
                group.add_object(object);
            }
        });
    }
    pool
}

fn print_tag(tag: &Tag, depth: usize) {
    println!("{}{}", "  ".repeat(depth), tag.name);
    for child in &tag.children {
        print_tag(child, depth + 1);
    }
}

fn print_scene(scene: &Scene) {
    println!("scene {} ({} entities)", scene.name, scene.entity_count());
    for root in &scene.entities {
        root.walk(&mut |entity: &Entity, depth| {
            let p = entity.transform.position;
            let mut line = format!(
                "{}{} @ ({}, {}, {})",
                "  ".repeat(depth + 1),
                entity.name,
                p.x,
                p.y,
                p.z
            );
            if let Some(prefab) = &entity.prefab {
                line.push_str(&format!(" prefab={prefab}"));
            }
            if !entity.tags.is_empty() {
                line.push_str(&format!(" tags=[{}]", entity.tags.join(", ")));
            }
            if !entity.aliases.is_empty() {
                let aliases: Vec<_> = entity
                    .aliases
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                line.push_str(&format!(" aliases=[{}]", aliases.join(", ")));
            }
            if !entity.resources.is_empty() {
                line.push_str(&format!(" resources={}", entity.resources.len()));
            }
            println!("{line}");
        });
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let loader = XmlProjectLoader::new(&cli.projects_root);

    match cli.command {
        Commands::Info => {
            println!("tessera-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", tessera_common::crate_info());
            println!("project: {}", tessera_project::crate_info());
            println!("render: {}", tessera_render::crate_info());
            println!("render-wgpu: {}", tessera_render_wgpu::crate_info());
        }
        Commands::Validate { project } => {
            let loaded = loader
                .load_project(&project)
                .with_context(|| format!("loading project `{project}`"))?;
            for name in loaded.scenes().keys() {
                let scene = loader
                    .load_scene(&loaded, name)
                    .with_context(|| format!("loading scene `{name}`"))?;
                println!("scene {name}: {} entities", scene.entity_count());
            }
            println!(
                "{}: OK ({} scenes, {} tags)",
                loaded.info().name,
                loaded.scenes().len(),
                loaded.tags().count()
            );
        }
        Commands::Inspect { project, json } => {
            let loaded = loader
                .load_project(&project)
                .with_context(|| format!("loading project `{project}`"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&loaded)?);
                return Ok(());
            }
            let info = loaded.info();
            println!("project: {}", info.name);
            println!("version: {} (engine {})", info.project_version, info.engine_version);
            if let Some(start) = &info.start_scene {
                println!("start scene: {start}");
            }
            println!("scenes:");
            for (name, path) in loaded.scenes() {
                println!("  {name} -> {path}");
            }
            let window = &loaded.settings().window;
            println!(
                "window: {} {}x{} {:?} vsync={}",
                window.title.as_deref().unwrap_or(&info.name),
                window.width,
                window.height,
                window.mode,
                window.vsync
            );
            println!("projection: {:?}", loaded.settings().rendering.projection);
            println!("input:");
            for binding in &loaded.input().bindings {
                println!("  {} = {}", binding.action, binding.keys.join(", "));
            }
        }
        Commands::Tags { project } => {
            let loaded = loader
                .load_project(&project)
                .with_context(|| format!("loading project `{project}`"))?;
            print_tag(loaded.tags(), 0);
        }
        Commands::Scene {
            project,
            scene,
            json,
        } => {
            let loaded = loader
                .load_project(&project)
                .with_context(|| format!("loading project `{project}`"))?;
            let scene = loader
                .load_scene(&loaded, &scene)
                .with_context(|| format!("loading scene `{scene}`"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&scene)?);
            } else {
                print_scene(&scene);
            }
        }
        Commands::Plan {
            project,
            scene,
            width,
            height,
        } => {
            let loaded = loader
                .load_project(&project)
                .with_context(|| format!("loading project `{project}`"))?;
            let scene = loader
                .load_scene(&loaded, &scene)
                .with_context(|| format!("loading scene `{scene}`"))?;
            let settings = loaded.settings();
            let width = width.unwrap_or(settings.window.width);
            let height = height.unwrap_or(settings.window.height);

            let pool = build_pool(&scene);
            let mut engine = RenderingEngine::new(RecordingDevice::new());
            engine.set_clear_color(settings.rendering.clear_color);
            match settings.rendering.projection {
                ProjectionMode::Orthographic => {
                    engine.update_orthographic_projection(width, height)
                }
                ProjectionMode::Perspective {
                    fov_degrees,
                    near,
                    far,
                } => engine.update_perspective_projection(fov_degrees, width, height, near, far),
            }
            let stats = engine.update(&pool);

            for command in engine.device().commands() {
                println!("{command}");
            }
            println!(
                "clears={} batches={} quads={} textures={}",
                stats.clears,
                stats.batches,
                stats.quads,
                pool.texture_count()
            );
        }
        Commands::Probe => {
            let caps = pollster::block_on(async {
                let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
                let adapter = tessera_render_wgpu::request_adapter(&instance, None).await?;
                let caps = tessera_render_wgpu::probe(&adapter);
                tessera_render_wgpu::request_device(&adapter).await?;
                Ok::<_, tessera_render_wgpu::RenderError>(caps)
            })?;
            println!("backend: {}", caps.backend);
            println!("baseline: {}", caps.baseline);
            println!("instancing: {}", caps.instancing);
            println!("max texture size: {}", caps.max_texture_size);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_project::Resource;

    fn textured(name: &str, path: &str) -> Entity {
        let mut entity = Entity::new(name);
        entity.resources.push(Resource {
            kind: ResourceKind::Texture,
            name: name.into(),
            path: PathBuf::from(path),
        });
        entity
    }

    #[test]
    fn pool_shares_handles_for_equal_paths() {
        let mut scene = Scene::new("level");
        let mut parent = textured("a", "textures/grass.png");
        parent.children.push(textured("b", "textures/grass.png"));
        parent.children.push(Entity::new("empty"));
        scene.entities.push(parent);
        scene.entities.push(textured("c", "textures/rock.png"));

        let pool = build_pool(&scene);
        let objects = &pool.passes()[0].groups[0].objects;
        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0].textures[0].handle, objects[1].textures[0].handle);
        assert_ne!(objects[0].textures[0].handle, objects[2].textures[0].handle);
    }

    #[test]
    fn planned_frame_batches_shared_texture() {
        let mut scene = Scene::new("level");
        for i in 0..3 {
            scene.entities.push(textured(&format!("tile{i}"), "tile.png"));
        }
        let mut engine = RenderingEngine::new(RecordingDevice::new());
        let stats = engine.update(&build_pool(&scene));
        assert_eq!((stats.clears, stats.batches, stats.quads), (1, 1, 3));
    }
}
