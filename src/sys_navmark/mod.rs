pub mod core;
pub mod handlers;
pub mod html;
pub mod menu;
