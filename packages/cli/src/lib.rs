// ABOUTME: Command implementations behind the sdlcgen binary
// ABOUTME: Flag overlay, catalog loading, snapshot sources and table rendering

pub mod commands;
pub mod render;

pub use commands::{
    apply_overrides, generate_dataset, load_catalog, persist, GenerateOptions, Snapshot,
};
