use async_trait::async_trait;
use hyper::{Body, Response, StatusCode};
use std::convert::Infallible;

use crate::plugins::plugin_components::{ComponentHandler, ok_with_type, respond_status};
use crate::sys_navmark::core::NavMarker;
use crate::sys_navmark::menu::NavMenu;

/// Header component
/// Args: [section_heading, current_path, role]
///
/// Renders the navigation menu into `{{nav_items}}` with the entry for `current_path`
/// marked active, and the heading into `{{section_heading}}`.
pub struct CompHeader {
    menu: NavMenu,
    marker: NavMarker,
}

impl CompHeader {
    pub fn new(menu: NavMenu, marker: NavMarker) -> Self {
        Self { menu, marker }
    }

    fn render_nav(&self, current_path: Option<&str>, is_admin: bool) -> String {
        let elements = self.menu.elements_for(current_path, is_admin, &self.marker);

        let mut html = String::new();
        for (item, element) in elements {
            html.push_str(&format!(
                r#"<a class="{}" href="{}">{}</a>"#,
                html_escape(&element.classes.to_attr_value()),
                html_escape(&item.href),
                html_escape(&item.label)
            ));
        }
        html
    }
}

#[async_trait]
impl ComponentHandler for CompHeader {
    fn component_name(&self) -> &str {
        "header"
    }

    async fn component_parse(
        &self,
        template: Option<String>,
        args: Vec<String>,
    ) -> Result<Response<Body>, Infallible> {
        // Desired heading text, default if missing
        let section_heading = args.first().map(String::as_str).unwrap_or("Asset Manager");
        let current_path = args.get(1).map(String::as_str);
        let is_admin = args.get(2).is_some_and(|r| r == "admin");

        let Some(tpl) = template else {
            return Ok(respond_status(
                StatusCode::INTERNAL_SERVER_ERROR,
                concat!(
                    "Header template not found: expected components/header.html ",
                    "(or components/header/template.html)",
                ),
            ));
        };

        let html = tpl
            .replace("{{section_heading}}", &html_escape(section_heading))
            .replace("{{nav_items}}", &self.render_nav(current_path, is_admin));

        Ok(ok_with_type(html, "text/html; charset=utf-8"))
    }
}

/// Simple HTML escaper
fn html_escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".into(),
            '<' => "&lt;".into(),
            '>' => "&gt;".into(),
            '"' => "&quot;".into(),
            '\'' => "&#39;".into(),
            _ => c.to_string(),
        })
        .collect()
}
