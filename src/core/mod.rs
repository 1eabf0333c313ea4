#[cfg(target_os = "linux")]
pub mod load_bias;
pub mod types;
pub mod walker;
