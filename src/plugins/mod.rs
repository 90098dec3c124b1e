pub mod plugin_components;
pub mod plugin_static;
