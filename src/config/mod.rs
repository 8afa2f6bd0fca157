pub mod beat;

pub use beat::{load_config_default, load_config_from, BeatConfig, OutputConfig};
