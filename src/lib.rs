pub mod animation;
pub mod asset;
pub mod config;
pub mod error;
pub mod render_snapshot;
pub mod scene_graph;
pub mod sim;
pub mod skinning;

pub use asset::{Asset, AssetId, AssetParser, AssetStore};
pub use error::{EvaluationError, LoadError};
pub use scene_graph::SceneGraph;
pub use sim::SceneInstance;

/// Installs a fmt subscriber filtered by `RUST_LOG`, `info` when unset.
/// Calling it twice is harmless.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
