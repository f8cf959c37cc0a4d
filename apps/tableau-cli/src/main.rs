use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{Parser, Subcommand};
use tableau_assets::{MAX_TEXTURE_SLOTS, ResourceRegistry, SceneManifest};
use tableau_common::{MAX_POINT_LIGHTS, Primitive};
use tableau_input::{CameraAction, KeyBindings};
use tableau_render::{
    CameraController, LookupMode, RecordingBackend, SceneCompositor, upload_lights,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tableau-cli", about = "Inspect and validate tableau scene manifests")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, limits and default key bindings
    Info,
    /// Load a manifest's textures and report anything that fails
    Validate {
        /// Path to the manifest
        manifest: PathBuf,
    },
    /// Run one frame against the recording backend and print the uniform log
    Frame {
        /// Path to the manifest. Defaults to the built-in still life.
        manifest: Option<PathBuf>,
        /// Viewport aspect ratio
        #[arg(long, default_value = "1.25")]
        aspect: f32,
        /// Fail on unknown texture or material tags
        #[arg(long)]
        strict: bool,
    },
    /// Write the built-in still life as a manifest
    ExportDefault {
        /// Output path
        path: PathBuf,
    },
}

fn load_manifest(path: Option<&Path>) -> anyhow::Result<SceneManifest> {
    Ok(match path {
        Some(path) => SceneManifest::load(path)?,
        None => SceneManifest::still_life(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tableau-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("texture slots: {MAX_TEXTURE_SLOTS}");
            println!("point lights: {MAX_POINT_LIGHTS}");
            println!("primitives: {:?}", Primitive::ALL);
            let bindings = KeyBindings::default();
            println!("default bindings:");
            for action in CameraAction::ALL {
                println!("  {action:?}: {}", bindings.keys_for(action).join(", "));
            }
        }
        Commands::Validate { manifest } => {
            let scene = SceneManifest::load(&manifest)?;
            let dangling = scene.dangling_references();

            let mut gpu = RecordingBackend::new();
            let mut registry = ResourceRegistry::new();
            let report = scene.apply(&mut registry, &mut gpu);

            println!(
                "{}: {} textures loaded, {} materials, {} lights, {} draws",
                manifest.display(),
                report.loaded.len(),
                report.materials_defined,
                scene.lights.len(),
                scene.draws.len()
            );
            for (tag, err) in &report.failed {
                println!("  texture '{tag}': {err}");
            }
            for reference in &dangling {
                println!("  undeclared {reference}");
            }
            if scene.lights.len() > MAX_POINT_LIGHTS {
                println!(
                    "  {} lights declared, only {MAX_POINT_LIGHTS} are used",
                    scene.lights.len()
                );
            }
            if !report.is_clean() || !dangling.is_empty() {
                bail!(
                    "{} texture failures, {} undeclared references",
                    report.failed.len(),
                    dangling.len()
                );
            }
            println!("OK");
        }
        Commands::Frame {
            manifest,
            aspect,
            strict,
        } => {
            let scene = load_manifest(manifest.as_deref())?;
            let mut gpu = RecordingBackend::new();
            let mut registry = ResourceRegistry::new();
            let report = scene.apply(&mut registry, &mut gpu);
            if !report.is_clean() {
                tracing::warn!(
                    failed = report.failed.len(),
                    "rendering with missing textures"
                );
            }

            let mode = if strict {
                LookupMode::Strict
            } else {
                LookupMode::Compatible
            };
            let camera = CameraController::default();
            let mut compositor = SceneCompositor::new(RecordingBackend::mesh_table()).with_mode(mode);

            gpu.clear_calls();
            compositor.begin_frame(&registry, &mut gpu);
            compositor.set_view(
                &mut gpu,
                &camera.build_view_projection(aspect),
                camera.position(),
            );
            upload_lights(&mut gpu, &scene.lights);
            let drawn = compositor.draw_all(&registry, &mut gpu, &scene.draws);
            let stats = compositor.end_frame()?;

            print!("{}", gpu.render_log());
            println!(
                "draws={} texture_misses={} material_misses={}",
                stats.draws, stats.texture_misses, stats.material_misses
            );
            drawn?;
            registry.destroy_all(&mut gpu);
        }
        Commands::ExportDefault { path } => {
            SceneManifest::still_life().save(&path)?;
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}
