//! Site configuration from the environment. No Hyper types here.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::sys_navmark::core::{NavMarker, ACTIVE_CLASS, NAV_CLASS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub host: IpAddr,
    pub port: u16,
    pub static_root: PathBuf,
    pub components_root: PathBuf,
    pub nav_file: PathBuf,
    pub nav_class: String,
    pub active_class: String,
    /// Run the active-link marker over outgoing HTML.
    pub mark_nav: bool,
    pub security_headers: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            static_root: PathBuf::from("static"),
            components_root: PathBuf::from("components"),
            nav_file: PathBuf::from("data/navigation.json"),
            nav_class: NAV_CLASS.to_string(),
            active_class: ACTIVE_CLASS.to_string(),
            mark_nav: true,
            security_headers: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}={:?}: {}", self.var, self.value, self.reason)
    }
}
impl std::error::Error for ConfigError {}

impl SiteConfig {
    /// Read `ASSETDESK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| {
            // upper-case first, lower-case for compatibility
            env::var(name)
                .or_else(|_| env::var(name.to_ascii_lowercase()))
                .ok()
        })
    }

    /// Build from any variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("ASSETDESK_HOST") {
            cfg.host = v.trim().parse().map_err(|_| ConfigError {
                var: "ASSETDESK_HOST",
                value: v.clone(),
                reason: "expected an IP address",
            })?;
        }
        if let Some(v) = lookup("ASSETDESK_PORT") {
            cfg.port = v.trim().parse().map_err(|_| ConfigError {
                var: "ASSETDESK_PORT",
                value: v.clone(),
                reason: "expected a port number",
            })?;
        }
        if let Some(v) = lookup("ASSETDESK_STATIC_ROOT") {
            cfg.static_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("ASSETDESK_COMPONENTS_ROOT") {
            cfg.components_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("ASSETDESK_NAV_FILE") {
            cfg.nav_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("ASSETDESK_NAV_CLASS") {
            cfg.nav_class = class_token("ASSETDESK_NAV_CLASS", v)?;
        }
        if let Some(v) = lookup("ASSETDESK_ACTIVE_CLASS") {
            cfg.active_class = class_token("ASSETDESK_ACTIVE_CLASS", v)?;
        }
        if let Some(v) = lookup("ASSETDESK_MARK_NAV") {
            cfg.mark_nav = flag("ASSETDESK_MARK_NAV", v)?;
        }
        if let Some(v) = lookup("ASSETDESK_SECURITY_HEADERS") {
            cfg.security_headers = flag("ASSETDESK_SECURITY_HEADERS", v)?;
        }

        Ok(cfg)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn nav_marker(&self) -> NavMarker {
        NavMarker::new(self.nav_class.clone(), self.active_class.clone())
    }
}

fn flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            var,
            value,
            reason: "expected true/false",
        }),
    }
}

/// A class token: non-empty, no whitespace.
fn class_token(var: &'static str, value: String) -> Result<String, ConfigError> {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(ConfigError {
            var,
            value,
            reason: "expected a single class token",
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<SiteConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SiteConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = from_pairs(&[]).unwrap();
        assert_eq!(cfg, SiteConfig::default());
        assert_eq!(cfg.bind_addr().to_string(), "127.0.0.1:8000");
        assert_eq!(cfg.nav_marker(), NavMarker::default());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = from_pairs(&[
            ("ASSETDESK_HOST", "0.0.0.0"),
            ("ASSETDESK_PORT", "5000"),
            ("ASSETDESK_STATIC_ROOT", "public"),
            ("ASSETDESK_ACTIVE_CLASS", "current"),
            ("ASSETDESK_MARK_NAV", "off"),
            ("ASSETDESK_SECURITY_HEADERS", "0"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr().to_string(), "0.0.0.0:5000");
        assert_eq!(cfg.static_root, PathBuf::from("public"));
        assert_eq!(cfg.nav_marker().active_class(), "current");
        assert!(!cfg.mark_nav);
        assert!(!cfg.security_headers);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = from_pairs(&[("ASSETDESK_PORT", "eighty")]).unwrap_err();
        assert_eq!(err.var, "ASSETDESK_PORT");

        let err = from_pairs(&[("ASSETDESK_MARK_NAV", "maybe")]).unwrap_err();
        assert_eq!(err.var, "ASSETDESK_MARK_NAV");

        let err = from_pairs(&[("ASSETDESK_NAV_CLASS", "two words")]).unwrap_err();
        assert!(err.to_string().contains("ASSETDESK_NAV_CLASS"));
    }
}
