pub mod core;
pub mod plugin;
