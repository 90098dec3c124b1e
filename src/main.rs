use std::{process::ExitCode, sync::Arc};

use tracing_subscriber::EnvFilter;

use crate::plugins::plugin_components::{PluginComponents, components::comp_header::CompHeader};
use crate::plugins::plugin_static::PluginStatic;
use crate::sys_config::core::SiteConfig;
use crate::sys_core::{core::run_server, plugin::PluginManager};
use crate::sys_navmark::menu::NavMenu;

pub mod plugins;
pub mod sys_config;
pub mod sys_core;
pub mod sys_navmark;
pub mod sys_statichost;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match SiteConfig::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let menu = match NavMenu::load_or_default(&config.nav_file) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("failed to load {}: {e}", config.nav_file.display());
            return ExitCode::FAILURE;
        }
    };

    let mut manager = PluginManager::new();
    let mut components = PluginComponents::new(&config.components_root);

    components.register(CompHeader::new(menu, config.nav_marker()));
    components.register_simple(config.components_root.join("underConstruction.html"));

    manager.apply_plugin(Box::new(components));
    manager.apply_plugin(Box::new(PluginStatic::new(
        &config.static_root,
        true,
        ["html", "css", "js", "svg", "png"]
            .into_iter()
            .map(String::from)
            .collect(),
    )));
    manager.init_plugins().await;
    let manager = Arc::new(manager);

    match run_server(config, manager).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
