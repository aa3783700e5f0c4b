#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

#[cfg(not(target_arch = "wasm32"))]
use anyhow::{Context, Result};
#[cfg(not(target_arch = "wasm32"))]
use atlas_cube::{ViewerConfig, flow, resources, snapshot};
#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser)]
#[command(
    name = "atlas-cube",
    about = "Six images on an orbiting cube, composited through one texture atlas"
)]
struct Cli {
    /// Asset root holding the test_images/ directory
    #[arg(long, default_value = "assets")]
    assets: String,

    /// Window (or snapshot) width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Window (or snapshot) height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Initial distance between the camera and the cube centre
    #[arg(long, default_value_t = 4.0)]
    distance: f32,

    /// Show the raw atlas behind the cube
    #[arg(long)]
    backdrop: bool,

    /// Render one frame offscreen to this PNG instead of opening a window
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[cfg(not(target_arch = "wasm32"))]
impl Cli {
    fn config(&self) -> ViewerConfig {
        ViewerConfig {
            asset_root: self.assets.clone(),
            camera_distance: self.distance,
            backdrop: self.backdrop,
            window_size: (self.width, self.height),
            ..Default::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    let Some(path) = cli.snapshot else {
        return flow::run(config);
    };

    flow::init_logging();
    let runtime = tokio::runtime::Runtime::new()?;
    let image = runtime.block_on(async {
        let atlas = resources::load_atlas(&config).await;
        snapshot::render_snapshot(&config, atlas, cli.width, cli.height).await
    })?;
    image
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
