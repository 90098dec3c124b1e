use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::sys_navmark::core::{NavElement, NavMarker};

/// One header entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NavItem {
    pub label: String,
    pub href: String,
    #[serde(default)]
    pub admin_only: bool,
}

/// Top-level JSON:
/// { "nav_items": [ { label, href, admin_only? }, ... ] }
#[derive(Debug, Deserialize)]
struct MenuRoot {
    nav_items: Vec<NavItem>,
}

#[derive(Debug)]
pub enum MenuError {
    Io(std::io::Error),
    Json(serde_json::Error),
}
impl From<std::io::Error> for MenuError {
    fn from(e: std::io::Error) -> Self { MenuError::Io(e) }
}
impl From<serde_json::Error> for MenuError {
    fn from(e: serde_json::Error) -> Self { MenuError::Json(e) }
}
impl std::fmt::Display for MenuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuError::Io(e) => write!(f, "I/O error: {e}"),
            MenuError::Json(e) => write!(f, "JSON parse error: {e}"),
        }
    }
}
impl std::error::Error for MenuError {}

/// The header's navigation entries, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavMenu {
    items: Vec<NavItem>,
}

impl Default for NavMenu {
    /// The asset desk header.
    fn default() -> Self {
        let item = |label: &str, href: &str, admin_only: bool| NavItem {
            label: label.to_string(),
            href: href.to_string(),
            admin_only,
        };
        Self {
            items: vec![
                item("Dashboard", "/assets/", false),
                item("Assets", "/assets/assets", false),
                item("Add Asset", "/assets/assets/add", false),
                item("Categories", "/assets/categories", false),
                item("Users", "/admin/users", true),
                item("Profile", "/auth/profile/edit", false),
                item("Logout", "/auth/logout", false),
            ],
        }
    }
}

impl NavMenu {
    pub fn new(items: Vec<NavItem>) -> Self {
        Self { items }
    }

    pub fn from_json(text: &str) -> Result<Self, MenuError> {
        let parsed: MenuRoot = serde_json::from_str(text)?;
        Ok(Self::new(parsed.nav_items))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MenuError> {
        let mut text = String::new();
        BufReader::new(File::open(path)?).read_to_string(&mut text)?;
        Self::from_json(&text)
    }

    /// Load `path`, falling back to the built-in menu when the file does not exist.
    /// A file that exists but cannot be parsed is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, MenuError> {
        match Self::from_file(&path) {
            Err(MenuError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    "no navigation file at {}, using the built-in menu",
                    path.as_ref().display()
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn items(&self) -> &[NavItem] {
        &self.items
    }

    /// Entries shown to the given role; admin-only entries are hidden from regular users.
    pub fn visible_items(&self, is_admin: bool) -> impl Iterator<Item = &NavItem> {
        self.items.iter().filter(move |i| is_admin || !i.admin_only)
    }

    /// Build the navigation elements for a page and mark the one for `current_path`.
    /// Without a path nothing is marked.
    pub fn elements_for(
        &self,
        current_path: Option<&str>,
        is_admin: bool,
        marker: &NavMarker,
    ) -> Vec<(&NavItem, NavElement)> {
        let items: Vec<&NavItem> = self.visible_items(is_admin).collect();
        let mut elements: Vec<NavElement> = items
            .iter()
            .map(|i| NavElement::new(Some(&i.href), marker.nav_class()))
            .collect();
        if let Some(path) = current_path {
            marker.mark_active(path, &mut elements);
        }
        items.into_iter().zip(elements).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_menu_json() {
        let menu = NavMenu::from_json(
            r#"{ "nav_items": [
                { "label": "Home", "href": "/" },
                { "label": "Users", "href": "/admin/users", "admin_only": true }
            ] }"#,
        )
        .unwrap();
        assert_eq!(menu.items().len(), 2);
        assert!(!menu.items()[0].admin_only);
        assert!(menu.items()[1].admin_only);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(NavMenu::from_json("{ nav_items: }"), Err(MenuError::Json(_))));
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let menu = NavMenu::load_or_default("definitely/not/here.json").unwrap();
        assert_eq!(menu, NavMenu::default());
    }

    #[test]
    fn admin_entries_hidden_from_regular_users() {
        let menu = NavMenu::default();
        assert!(menu.visible_items(false).all(|i| i.href != "/admin/users"));
        assert!(menu.visible_items(true).any(|i| i.href == "/admin/users"));
    }

    #[test]
    fn elements_mark_current_page() {
        let menu = NavMenu::default();
        let marker = NavMarker::default();
        let elements = menu.elements_for(Some("/assets/categories"), false, &marker);
        let active: Vec<&str> = elements
            .iter()
            .filter(|(_, e)| e.is_active(&marker))
            .map(|(i, _)| i.label.as_str())
            .collect();
        assert_eq!(active, vec!["Categories"]);
    }

    #[test]
    fn dashboard_requires_exact_trailing_slash() {
        let menu = NavMenu::default();
        let marker = NavMarker::default();
        let elements = menu.elements_for(Some("/assets"), false, &marker);
        assert!(elements.iter().all(|(_, e)| !e.is_active(&marker)));
    }
}
