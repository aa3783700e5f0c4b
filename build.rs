use anyhow::*;
use fs_extra::dir::{CopyOptions, copy};
use std::env;
use std::path::PathBuf;

// Natively the viewer reads images from `assets/`; mirror it next to the build
// output so `--assets $OUT_DIR/assets` works from any working directory.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.is_dir() {
        println!("cargo:warning=no assets/ directory, the viewer will start with a blank atlas");
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut options = CopyOptions::new();
    options.overwrite = true;
    copy(&assets, out_dir, &options)?;
    Ok(())
}
