pub mod files;
pub mod progress;
