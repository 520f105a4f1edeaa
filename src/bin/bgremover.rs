//! Background Removal Session Tool
//!
//! Terminal frontend for the bgremover library: pick a photo, remove its
//! background, toggle between original and processed, save to the gallery.

#[cfg(feature = "cli")]
use bgremover::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
