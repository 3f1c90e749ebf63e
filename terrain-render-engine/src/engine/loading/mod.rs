pub mod manifest_loader;
pub mod progress;
pub mod texture_loader;
