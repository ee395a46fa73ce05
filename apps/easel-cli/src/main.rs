use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use easel_assets::MeshCache;
use easel_ecs::{
    Camera, ComponentStore, Line, LineGenerator, LineRenderer, Mesh, MeshRenderer, ObjMesh,
    apply_line_generators,
};
use easel_persist::SceneSerializer;
use easel_render::{
    Command, DrawKind, EditorCamera, FrameStats, RecordingDevice, RenderPipeline, RenderSettings,
    ResourceContext, SoftwareDevice, ViewportRect, on_viewport_resize, pick_entity,
};
use easel_tools::{SceneInspector, populate_sample_scene};
use glam::Vec2;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "easel-cli", about = "Headless tools for easel scene files")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and built-in shader names
    Info,
    /// Write the starter scene to a file
    Sample {
        /// Output scene file
        output: PathBuf,
        /// Scene name stored in the file
        #[arg(long, default_value = "Sample")]
        name: String,
    },
    /// Print a scene summary and its entities
    Inspect {
        scene: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Check a scene for problems that would break rendering
    Validate { scene: PathBuf },
    /// Render a scene with the software device and optionally pick pixels
    Render {
        scene: PathBuf,
        #[arg(long, default_value = "320")]
        width: u32,
        #[arg(long, default_value = "240")]
        height: u32,
        /// Cursor position to pick, in top-left pixel coordinates (repeatable)
        #[arg(long, value_parser = parse_point)]
        pick: Vec<Vec2>,
        /// Render settings YAML
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Print the recorded device command stream
        #[arg(long)]
        trace: bool,
        /// Write the color attachment as a binary PPM image
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("easel-cli v{}", env!("CARGO_PKG_VERSION"));
            let resources = ResourceContext::default();
            let names: Vec<&str> = (0..)
                .map(easel_render::ShaderHandle)
                .map_while(|h| resources.shaders.name(h))
                .collect();
            println!("shaders: {}", names.join(", "));
            println!("settings: {:?}", RenderSettings::default());
        }
        Commands::Sample { output, name } => {
            let mut store = ComponentStore::new();
            let ids = populate_sample_scene(&mut store)?;
            SceneSerializer::save(&store, &name, &output)?;
            println!("wrote {} entities to {}", ids.len(), output.display());
        }
        Commands::Inspect { scene, json } => {
            let (name, store) = load_scene(&scene)?;
            let summary = SceneInspector::summary(&store);
            let entities: Vec<_> = store
                .entities()
                .filter_map(|id| SceneInspector::inspect_entity(&store, id))
                .collect();
            if json {
                let report = serde_json::json!({
                    "scene": name,
                    "summary": summary,
                    "entities": entities,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{name}");
                println!("{summary}");
                for info in &entities {
                    println!("  {info}");
                }
            }
        }
        Commands::Validate { scene } => {
            let (name, store) = load_scene(&scene)?;
            let problems = validate(&store);
            if problems.is_empty() {
                println!("{name}: OK ({} entities)", store.entity_count());
            } else {
                for problem in &problems {
                    println!("{name}: {problem}");
                }
                bail!("{} problem(s) found in {}", problems.len(), scene.display());
            }
        }
        Commands::Render {
            scene,
            width,
            height,
            pick,
            settings,
            trace,
            output,
        } => {
            let settings = match settings {
                Some(path) => RenderSettings::load(&path)
                    .with_context(|| format!("loading settings {}", path.display()))?,
                None => RenderSettings::default(),
            };
            let (_, mut store) = load_scene(&scene)?;
            prepare_scene(&mut store, width, height);

            let (device, stats) = render_scene(&store, &settings, width, height)?;
            println!(
                "frame: camera={:?} lines={} opaque={} transparent_triangles={}",
                stats.camera, stats.line_draws, stats.opaque_draws, stats.transparent_triangles
            );

            let rect = ViewportRect::new(Vec2::ZERO, Vec2::new(width as f32, height as f32));
            for cursor in pick {
                let hit = pick_entity(cursor, &rect, &device, &store)?;
                let label = hit
                    .and_then(|id| SceneInspector::inspect_entity(&store, id))
                    .map_or_else(|| "none".to_string(), |info| format!("#{} \"{}\"", info.id, info.name));
                println!("pick ({}, {}): {label}", cursor.x, cursor.y);
            }

            if trace {
                for command in trace_scene(&store, &settings, width, height)? {
                    println!("{}", describe(&command));
                }
            }

            if let Some(path) = output {
                write_ppm(&device, &path)?;
                println!("wrote {}", path.display());
            }
        }
    }

    Ok(())
}

fn load_scene(path: &Path) -> Result<(String, ComponentStore)> {
    let mut cache = MeshCache::new();
    SceneSerializer::load(path, &mut cache).with_context(|| format!("loading scene {}", path.display()))
}

/// Between-frame fix-ups a host performs before the first frame.
fn prepare_scene(store: &mut ComponentStore, width: u32, height: u32) {
    let lines = apply_line_generators(store);
    let cameras = on_viewport_resize(store, width, height);
    tracing::debug!(lines, cameras, "scene prepared");
}

fn editor_camera(settings: &RenderSettings, width: u32, height: u32) -> EditorCamera {
    let mut camera = EditorCamera::from_settings(&settings.editor_camera);
    camera.set_viewport_size(width, height);
    camera
}

fn render_scene(
    store: &ComponentStore,
    settings: &RenderSettings,
    width: u32,
    height: u32,
) -> Result<(SoftwareDevice, FrameStats)> {
    let resources = ResourceContext::default();
    let camera = editor_camera(settings, width, height);
    let mut device = SoftwareDevice::new(width, height, &resources.shaders);
    let mut pipeline = RenderPipeline::new(*settings);
    let stats = pipeline.render_frame(store, &camera, &mut device, &resources)?;
    Ok((device, stats))
}

fn trace_scene(
    store: &ComponentStore,
    settings: &RenderSettings,
    width: u32,
    height: u32,
) -> Result<Vec<Command>> {
    let resources = ResourceContext::default();
    let camera = editor_camera(settings, width, height);
    let mut device = RecordingDevice::new();
    RenderPipeline::new(*settings).render_frame(store, &camera, &mut device, &resources)?;
    Ok(device.take())
}

fn describe(command: &Command) -> String {
    match command {
        Command::Draw(draw) => format!(
            "Draw {} entity={} depth_write={} blending={}",
            kind_label(&draw.kind),
            draw.entity.map_or_else(|| "-".to_string(), |e| e.to_string()),
            draw.depth_write,
            draw.blending
        ),
        Command::BeginScene(uniforms) => {
            format!("BeginScene camera={:?} lights={}", uniforms.camera_position, uniforms.lights.len())
        }
        other => format!("{other:?}"),
    }
}

fn kind_label(kind: &DrawKind) -> String {
    match kind {
        DrawKind::Quad => "Quad".to_string(),
        DrawKind::Lines { point_count, looped } => format!("Lines points={point_count} looped={looped}"),
        DrawKind::Triangles { index_count, .. } => format!("Triangles indices={index_count}"),
    }
}

/// Problems that would make a frame abort or render nothing.
fn validate(store: &ComponentStore) -> Vec<String> {
    let mut problems = Vec::new();

    let primaries: Vec<_> = store
        .iter::<Camera>()
        .filter(|(_, c)| c.primary)
        .map(|(id, _)| id.to_string())
        .collect();
    if primaries.len() > 1 {
        problems.push(format!(
            "{} primary cameras ({}); only the first is used",
            primaries.len(),
            primaries.join(", ")
        ));
    }

    for (id, _) in store.iter::<MeshRenderer>() {
        let mesh = store
            .try_get::<Mesh>(id)
            .or_else(|| store.try_get::<ObjMesh>(id).map(ObjMesh::mesh));
        match mesh {
            None => problems.push(format!("{id} has a MeshRenderer but no geometry")),
            Some(mesh) if mesh.is_empty() => problems.push(format!("{id} has empty mesh geometry")),
            Some(_) => {}
        }
    }

    for (id, line, _) in store.query2::<Line, LineRenderer>() {
        if line.points().len() < 2 && !store.contains::<LineGenerator>(id) {
            problems.push(format!("{id} has a LineRenderer with fewer than two points"));
        }
    }

    problems
}

fn parse_point(text: &str) -> Result<Vec2, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{text}`"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("bad coordinate `{v}`: {e}"))
    };
    Ok(Vec2::new(parse(x)?, parse(y)?))
}

fn write_ppm(device: &SoftwareDevice, path: &Path) -> Result<()> {
    let framebuffer = device.framebuffer();
    let (width, height) = (framebuffer.width(), framebuffer.height());
    let mut bytes = Vec::with_capacity((width * height * 3) as usize + 32);
    write!(bytes, "P6\n{width} {height}\n255\n")?;
    // PPM rows run top to bottom; the framebuffer origin is bottom-left.
    for y in (0..height as i32).rev() {
        for x in 0..width as i32 {
            let [r, g, b, _] = framebuffer.color_at(x, y).unwrap_or_default();
            bytes.extend([r, g, b]);
        }
    }
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_common::Transform;

    fn sample() -> ComponentStore {
        let mut store = ComponentStore::new();
        populate_sample_scene(&mut store).unwrap();
        prepare_scene(&mut store, 64, 64);
        store
    }

    #[test]
    fn parses_pick_points() {
        assert_eq!(parse_point("10,20").unwrap(), Vec2::new(10.0, 20.0));
        assert_eq!(parse_point(" 1.5 , 2 ").unwrap(), Vec2::new(1.5, 2.0));
        assert!(parse_point("10").is_err());
        assert!(parse_point("a,b").is_err());
    }

    #[test]
    fn sample_scene_validates() {
        assert!(validate(&sample()).is_empty());
    }

    #[test]
    fn validate_reports_missing_geometry_and_extra_primaries() {
        let mut store = ComponentStore::new();
        let a = store.create_entity("A");
        store.attach(a, Camera::default()).unwrap();
        let b = store.create_entity("B");
        store.attach(b, Camera::default()).unwrap();
        let bare = store.create_entity("Bare");
        store.attach(bare, MeshRenderer::default()).unwrap();

        let problems = validate(&store);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("2 primary cameras"));
        assert!(problems[1].contains("no geometry"));
    }

    #[test]
    fn sample_scene_centre_pick_hits_cube() {
        let store = sample();
        let (device, stats) = render_scene(&store, &RenderSettings::default(), 64, 64).unwrap();
        assert_eq!(stats.line_draws, 1);
        let rect = ViewportRect::new(Vec2::ZERO, Vec2::new(64.0, 64.0));
        let hit = pick_entity(Vec2::new(32.0, 32.0), &rect, &device, &store).unwrap();
        let cube = store
            .entities()
            .find(|&id| SceneInspector::inspect_entity(&store, id).is_some_and(|i| i.name == "Cube"))
            .unwrap();
        assert_eq!(hit, Some(cube));
    }

    #[test]
    fn trace_lists_frame_commands() {
        let mut store = ComponentStore::new();
        let e = store.create_entity("Line");
        store
            .attach(e, Line::new(vec![glam::Vec3::ZERO, glam::Vec3::X]))
            .unwrap();
        store.attach(e, LineRenderer::default()).unwrap();
        store.get_mut::<Transform>(e).unwrap().translation.z = -1.0;

        let commands = trace_scene(&store, &RenderSettings::default(), 32, 32).unwrap();
        assert!(matches!(commands.first(), Some(Command::BeginScene(_))));
        assert!(matches!(commands.last(), Some(Command::EndScene)));
        assert!(commands.iter().any(|c| describe(c).starts_with("Draw Lines")));
    }

    #[test]
    fn ppm_has_header_and_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.ppm");
        let (device, _) = render_scene(&sample(), &RenderSettings::default(), 8, 4).unwrap();
        write_ppm(&device, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let header = b"P6\n8 4\n255\n";
        assert!(bytes.starts_with(header));
        assert_eq!(bytes.len(), header.len() + 8 * 4 * 3);
    }

    #[test]
    fn sample_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.yaml");
        let mut store = ComponentStore::new();
        populate_sample_scene(&mut store).unwrap();
        SceneSerializer::save(&store, "Sample", &path).unwrap();

        let (name, loaded) = load_scene(&path).unwrap();
        assert_eq!(name, "Sample");
        assert_eq!(
            SceneInspector::summary(&loaded),
            SceneInspector::summary(&store)
        );
    }
}
