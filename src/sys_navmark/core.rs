//! Active-link marking: pure selection plus the call-site class mutation.
//! No Hyper types and no HTML here.

/// Class token identifying navigation elements.
pub const NAV_CLASS: &str = "item-title";
/// Class token added to the navigation element of the current page.
pub const ACTIVE_CLASS: &str = "active";

/// Anything that can expose a navigation target (`href`).
pub trait NavTarget {
    fn target(&self) -> Option<&str>;
}

/// Which class marks navigation elements, and which class marks the active one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavMarker {
    nav_class: String,
    active_class: String,
}

impl Default for NavMarker {
    fn default() -> Self {
        Self::new(NAV_CLASS, ACTIVE_CLASS)
    }
}

impl NavMarker {
    pub fn new(nav_class: impl Into<String>, active_class: impl Into<String>) -> Self {
        Self {
            nav_class: nav_class.into(),
            active_class: active_class.into(),
        }
    }

    pub fn nav_class(&self) -> &str {
        &self.nav_class
    }

    pub fn active_class(&self) -> &str {
        &self.active_class
    }

    /// Add the active class to every link selected by [`links_to_mark`].
    /// Returns how many links matched the path.
    pub fn mark_active(&self, current_path: &str, links: &mut [NavElement]) -> usize {
        let selected = links_to_mark(current_path, &*links);
        for &i in &selected {
            links[i].classes.add(&self.active_class);
        }
        selected.len()
    }
}

/// Indices (document order) of every link whose target equals `current_path` exactly.
///
/// Ordinal comparison: no case folding, no trailing-slash handling, no decoding.
/// A link without a target never matches.
pub fn links_to_mark<L: NavTarget>(current_path: &str, links: &[L]) -> Vec<usize> {
    links
        .iter()
        .enumerate()
        .filter(|(_, link)| link.target() == Some(current_path))
        .map(|(i, _)| i)
        .collect()
}

/// Mark with the default classes.
pub fn mark_active(current_path: &str, links: &mut [NavElement]) -> usize {
    NavMarker::default().mark_active(current_path, links)
}

/// Ordered, duplicate-free set of class tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    tokens: Vec<String>,
}

impl ClassList {
    /// Split a `class` attribute value on ASCII whitespace.
    pub fn parse(value: &str) -> Self {
        let mut list = Self::default();
        for token in value.split_ascii_whitespace() {
            list.add(token);
        }
        list
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Returns `false` if the token was already present.
    pub fn add(&mut self, token: &str) -> bool {
        if token.is_empty() || self.contains(token) {
            return false;
        }
        self.tokens.push(token.to_string());
        true
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Serialize back to an attribute value.
    pub fn to_attr_value(&self) -> String {
        self.tokens.join(" ")
    }
}

/// A navigation element as seen by the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavElement {
    pub href: Option<String>,
    pub classes: ClassList,
}

impl NavElement {
    pub fn new(href: Option<&str>, class_attr: &str) -> Self {
        Self {
            href: href.map(str::to_string),
            classes: ClassList::parse(class_attr),
        }
    }

    pub fn is_active(&self, marker: &NavMarker) -> bool {
        self.classes.contains(marker.active_class())
    }
}

impl NavTarget for NavElement {
    fn target(&self) -> Option<&str> {
        self.href.as_deref()
    }
}

impl NavTarget for &NavElement {
    fn target(&self) -> Option<&str> {
        self.href.as_deref()
    }
}

impl NavTarget for Option<&str> {
    fn target(&self) -> Option<&str> {
        *self
    }
}

impl NavTarget for &str {
    fn target(&self) -> Option<&str> {
        Some(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn links(targets: &[Option<&str>]) -> Vec<NavElement> {
        targets
            .iter()
            .map(|t| NavElement::new(*t, NAV_CLASS))
            .collect()
    }

    fn active_targets(links: &[NavElement]) -> Vec<Option<String>> {
        let marker = NavMarker::default();
        links
            .iter()
            .filter(|l| l.is_active(&marker))
            .map(|l| l.href.clone())
            .collect()
    }

    #[test]
    fn marks_only_services() {
        let mut nav = links(&[Some("/"), Some("/services"), Some("/contact")]);
        assert_eq!(mark_active("/services", &mut nav), 1);
        assert_eq!(active_targets(&nav), vec![Some("/services".to_string())]);
    }

    #[test]
    fn root_path_marks_only_root() {
        let mut nav = links(&[Some("/"), Some("/about")]);
        mark_active("/", &mut nav);
        assert_eq!(active_targets(&nav), vec![Some("/".to_string())]);
    }

    #[test]
    fn no_elements_is_a_noop() {
        let mut nav: Vec<NavElement> = Vec::new();
        assert_eq!(mark_active("/anything", &mut nav), 0);
        assert!(links_to_mark::<NavElement>("/anything", &nav).is_empty());
    }

    #[test]
    fn no_match_marks_nothing() {
        let mut nav = links(&[Some("/a"), Some("/b")]);
        assert_eq!(mark_active("/c", &mut nav), 0);
        assert!(active_targets(&nav).is_empty());
    }

    #[test]
    fn case_and_trailing_slash_do_not_match() {
        assert!(links_to_mark("/About", &["/about"]).is_empty());
        assert!(links_to_mark("/about/", &["/about"]).is_empty());
        assert!(links_to_mark("/about", &["/about/"]).is_empty());
    }

    #[test]
    fn duplicate_targets_are_all_marked() {
        let nav = [Some("/x"), Some("/y"), Some("/x")];
        assert_eq!(links_to_mark("/x", &nav), vec![0, 2]);
    }

    #[test]
    fn missing_href_is_skipped() {
        let nav: [Option<&str>; 2] = [None, Some("/")];
        assert_eq!(links_to_mark("/", &nav), vec![1]);
        // An empty href is still a value.
        assert_eq!(links_to_mark("", &[None, Some("")]), vec![1]);
    }

    #[test]
    fn marking_twice_is_idempotent() {
        let mut nav = links(&[Some("/a"), Some("/b")]);
        mark_active("/a", &mut nav);
        let once = nav.clone();
        mark_active("/a", &mut nav);
        assert_eq!(nav, once);
        assert_eq!(nav[0].classes.to_attr_value(), "item-title active");
    }

    #[test]
    fn existing_marks_are_never_cleared() {
        let mut nav = vec![NavElement::new(Some("/old"), "item-title active")];
        mark_active("/new", &mut nav);
        assert!(nav[0].classes.contains(ACTIVE_CLASS));
    }

    #[test]
    fn custom_classes() {
        let marker = NavMarker::new("nav-link", "current");
        let mut nav = vec![NavElement::new(Some("/a"), "nav-link")];
        marker.mark_active("/a", &mut nav);
        assert_eq!(nav[0].classes.to_attr_value(), "nav-link current");
    }

    #[test]
    fn class_list_parse_dedups_and_splits() {
        let list = ClassList::parse("  a\tb  a\nc ");
        assert_eq!(list.tokens(), ["a", "b", "c"]);
        assert!(ClassList::parse("   ").is_empty());
    }

    fn path_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("/".to_string()),
            Just("/about".to_string()),
            Just("/About".to_string()),
            Just("/about/".to_string()),
            Just("/services".to_string()),
            "/[a-c]{0,3}",
        ]
    }

    proptest! {
        #[test]
        fn marked_iff_target_equals_path(
            path in path_strategy(),
            targets in proptest::collection::vec(proptest::option::of(path_strategy()), 0..8),
        ) {
            let mut nav: Vec<NavElement> = targets
                .iter()
                .map(|t| NavElement::new(t.as_deref(), NAV_CLASS))
                .collect();
            mark_active(&path, &mut nav);
            let marker = NavMarker::default();
            for (link, target) in nav.iter().zip(&targets) {
                prop_assert_eq!(link.is_active(&marker), target.as_deref() == Some(path.as_str()));
            }

            let once = nav.clone();
            mark_active(&path, &mut nav);
            prop_assert_eq!(nav, once);
        }
    }
}
