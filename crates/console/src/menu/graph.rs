//! The menu graph: permission-scoped groups and items for one session.

use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// A group of menu items (rendered as a collapsible section / tile group).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuGroup {
    pub id: String,
    /// Translation key.
    pub title: String,
    /// Translation key.
    pub description: String,
    /// Symbolic icon name.
    pub icon: String,
    pub items: Vec<MenuItem>,
    pub is_visible: bool,
}

/// A navigable entry with its capability flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    /// Route fragment, with or without a leading `/`.
    pub path: String,
    pub is_visible: bool,
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_create: bool,
}

impl MenuItem {
    /// Whether this item's path designates `path`.
    ///
    /// A single leading `/` on either side is ignored, as is a trailing `/`
    /// on the request path.
    pub fn matches_path(&self, path: &str) -> bool {
        let wanted = normalize_path(path);
        !wanted.is_empty() && normalize_path(&self.path) == wanted
    }

    /// Capability flags carried by this item.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_view: self.can_view,
            can_edit: self.can_edit,
            can_delete: self.can_delete,
            can_create: self.can_create,
        }
    }
}

/// Strip one leading and one trailing separator.
pub(crate) fn normalize_path(path: &str) -> &str {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.strip_suffix('/').unwrap_or(path)
}

/// Ordered collection of menu groups for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MenuGraph {
    groups: Vec<MenuGroup>,
}

impl MenuGraph {
    pub fn new(groups: Vec<MenuGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[MenuGroup] {
        &self.groups
    }

    /// All items of all groups, in menu order.
    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    /// First item (in menu order) whose path designates `path`.
    ///
    /// Visibility does not matter here: a hidden item still grants access.
    pub fn find_item(&self, path: &str) -> Option<&MenuItem> {
        self.items().find(|item| item.matches_path(path))
    }

    /// Resolve the capability flags for a page.
    ///
    /// Pages without a menu item get `default` for all four flags.
    pub fn capabilities_for(&self, path: &str, default: CapabilityDefault) -> Capabilities {
        match self.find_item(path) {
            Some(item) => item.capabilities(),
            None => default.capabilities(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// One of the four per-item permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    View,
    Edit,
    Delete,
    Create,
}

/// Capability flags of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_create: bool,
}

impl Capabilities {
    pub const ALL: Self = Self {
        can_view: true,
        can_edit: true,
        can_delete: true,
        can_create: true,
    };

    pub const NONE: Self = Self {
        can_view: false,
        can_edit: false,
        can_delete: false,
        can_create: false,
    };

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::View => self.can_view,
            Capability::Edit => self.can_edit,
            Capability::Delete => self.can_delete,
            Capability::Create => self.can_create,
        }
    }
}

/// Flags used for a page that has no menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityDefault {
    /// Every action disabled.
    #[default]
    Deny,
    /// Every action enabled.
    Allow,
}

impl CapabilityDefault {
    pub fn capabilities(self) -> Capabilities {
        match self {
            CapabilityDefault::Deny => Capabilities::NONE,
            CapabilityDefault::Allow => Capabilities::ALL,
        }
    }
}

/// Error for unrecognized policy names in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown policy {0:?} (expected \"deny\" or \"allow\")")]
pub struct UnknownPolicy(pub String);

impl FromStr for CapabilityDefault {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deny" => Ok(CapabilityDefault::Deny),
            "allow" => Ok(CapabilityDefault::Allow),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn item(path: &str, flags: [bool; 4]) -> MenuItem {
        MenuItem {
            id: path.to_string(),
            title: format!("Menu_{path}"),
            description: String::new(),
            icon: String::new(),
            path: path.to_string(),
            is_visible: true,
            can_view: flags[0],
            can_edit: flags[1],
            can_delete: flags[2],
            can_create: flags[3],
        }
    }

    fn graph() -> MenuGraph {
        MenuGraph::new(vec![
            MenuGroup {
                id: "admin".into(),
                title: "Menu_Admin".into(),
                description: String::new(),
                icon: "settings".into(),
                items: vec![item("companies", [true, false, true, false])],
                is_visible: true,
            },
            MenuGroup {
                id: "apps".into(),
                title: "Menu_Apps".into(),
                description: String::new(),
                icon: "apps".into(),
                items: vec![item("/applications", [true, true, true, true])],
                is_visible: true,
            },
        ])
    }

    #[test]
    fn find_item_ignores_leading_separator_on_both_sides() {
        let graph = graph();
        assert!(graph.find_item("/companies").is_some());
        assert!(graph.find_item("companies").is_some());
        assert!(graph.find_item("/applications").is_some());
        assert!(graph.find_item("applications").is_some());
        assert!(graph.find_item("/applications/").is_some());
    }

    #[test]
    fn find_item_is_exact_on_segments() {
        let graph = graph();
        assert!(graph.find_item("/companies/new").is_none());
        assert!(graph.find_item("/compan").is_none());
        assert!(graph.find_item("/").is_none());
        assert!(graph.find_item("").is_none());
    }

    #[test]
    fn empty_item_path_never_matches() {
        let graph = MenuGraph::new(vec![MenuGroup {
            id: "g".into(),
            title: String::new(),
            description: String::new(),
            icon: String::new(),
            items: vec![item("", [true; 4])],
            is_visible: true,
        }]);
        assert!(graph.find_item("/").is_none());
    }

    #[test]
    fn capabilities_come_from_the_found_item() {
        let caps = graph().capabilities_for("/companies", CapabilityDefault::Allow);
        assert_eq!(
            caps,
            Capabilities {
                can_view: true,
                can_edit: false,
                can_delete: true,
                can_create: false,
            }
        );
    }

    #[test]
    fn capabilities_default_when_page_not_in_menu() {
        let graph = graph();
        assert_eq!(
            graph.capabilities_for("/users", CapabilityDefault::Deny),
            Capabilities::NONE
        );
        assert_eq!(
            graph.capabilities_for("/users", CapabilityDefault::Allow),
            Capabilities::ALL
        );
    }

    #[test]
    fn capability_default_parses_config_values() {
        assert_eq!("deny".parse(), Ok(CapabilityDefault::Deny));
        assert_eq!(" Allow ".parse(), Ok(CapabilityDefault::Allow));
        assert!("maybe".parse::<CapabilityDefault>().is_err());
    }

    #[test]
    fn unknown_policy_names_the_value() {
        let err = "maybe".parse::<CapabilityDefault>().unwrap_err();
        assert_eq!(err, UnknownPolicy("maybe".into()));
        assert_eq!(
            err.to_string(),
            r#"unknown policy "maybe" (expected "deny" or "allow")"#
        );
    }

    #[test]
    fn allows_maps_each_capability() {
        let caps = Capabilities {
            can_view: true,
            can_edit: false,
            can_delete: false,
            can_create: true,
        };
        assert!(caps.allows(Capability::View));
        assert!(!caps.allows(Capability::Edit));
        assert!(!caps.allows(Capability::Delete));
        assert!(caps.allows(Capability::Create));
    }
}
