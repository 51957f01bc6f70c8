// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across sdlcgen

// Generation
pub const SDLC_SEED: &str = "SDLC_SEED";
pub const SDLC_CATALOG_PATH: &str = "SDLC_CATALOG_PATH";

// Output
pub const SDLC_DATABASE_PATH: &str = "SDLC_DATABASE_PATH";
pub const SDLC_OUTPUT_PATH: &str = "SDLC_OUTPUT_PATH";

// Pull request policy overrides
pub const SDLC_PR_CREATION_PROBABILITY: &str = "SDLC_PR_CREATION_PROBABILITY";
pub const SDLC_NON_MAIN_MERGE_DISCOUNT: &str = "SDLC_NON_MAIN_MERGE_DISCOUNT";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";
