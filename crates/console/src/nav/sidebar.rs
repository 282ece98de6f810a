//! Side menu and dashboard view models.

use std::collections::BTreeSet;

use serde::Serialize;

use super::icons::{IconSlot, IconView, resolve};
use crate::i18n::Translations;
use crate::menu::{MenuGraph, MenuGroup, MenuItem, normalize_path};

/// Query parameter carrying the expanded group ids.
pub const OPEN_PARAM: &str = "open";

/// Expanded side-menu groups of the current page.
///
/// Lives only in the URL: a link without the parameter collapses everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedGroups(BTreeSet<String>);

impl ExpandedGroups {
    /// Parse the comma-separated `open` parameter.
    pub fn from_param(raw: Option<&str>) -> Self {
        Self(
            raw.unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.0.contains(group_id)
    }

    /// The set with `group_id` flipped; other groups are unaffected.
    pub fn toggled(&self, group_id: &str) -> Self {
        let mut ids = self.0.clone();
        if !ids.remove(group_id) {
            ids.insert(group_id.to_string());
        }
        Self(ids)
    }

    pub fn to_param(&self) -> String {
        self.0.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `?open=...` suffix for links, empty when nothing is expanded.
    pub fn query_suffix(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("?{OPEN_PARAM}={}", urlencoding::encode(&self.to_param()))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SideMenuItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: IconView,
    pub href: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SideMenuGroup {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: IconView,
    pub expanded: bool,
    /// Link that flips this group's expansion on the current page.
    pub toggle_href: String,
    pub items: Vec<SideMenuItem>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SideMenu {
    pub groups: Vec<SideMenuGroup>,
}

fn item_href(item: &MenuItem) -> String {
    format!("/{}", normalize_path(&item.path))
}

fn visible_items(group: &MenuGroup) -> impl Iterator<Item = &MenuItem> {
    group
        .items
        .iter()
        .filter(|item| item.is_visible && !normalize_path(&item.path).is_empty())
}

/// Build the side menu for `current_path`.
pub fn side_menu(
    graph: &MenuGraph,
    t: &Translations,
    current_path: &str,
    expanded: &ExpandedGroups,
) -> SideMenu {
    let current = normalize_path(current_path);
    let keep = expanded.query_suffix();

    let groups = graph
        .groups()
        .iter()
        .filter(|group| group.is_visible)
        .map(|group| {
            let items = visible_items(group)
                .map(|item| SideMenuItem {
                    id: item.id.clone(),
                    title: t.t(&item.title),
                    description: t.t(&item.description),
                    icon: resolve(&item.icon, IconSlot::Item),
                    href: format!("{}{keep}", item_href(item)),
                    selected: item.matches_path(current),
                })
                .collect();

            SideMenuGroup {
                id: group.id.clone(),
                title: t.t(&group.title),
                description: t.t(&group.description),
                icon: resolve(&group.icon, IconSlot::Group),
                expanded: expanded.contains(&group.id),
                toggle_href: format!("/{current}{}", expanded.toggled(&group.id).query_suffix()),
                items,
            }
        })
        .collect();

    SideMenu { groups }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tile {
    pub title: String,
    pub description: String,
    pub icon: IconView,
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TileGroup {
    pub title: String,
    pub description: String,
    pub icon: IconView,
    pub tiles: Vec<Tile>,
}

/// Dashboard tiles: one per visible item, grouped like the menu.
///
/// Groups left without visible items are dropped.
pub fn dashboard_tiles(graph: &MenuGraph, t: &Translations) -> Vec<TileGroup> {
    graph
        .groups()
        .iter()
        .filter(|group| group.is_visible)
        .filter_map(|group| {
            let tiles: Vec<Tile> = visible_items(group)
                .map(|item| Tile {
                    title: t.t(&item.title),
                    description: t.t(&item.description),
                    icon: resolve(&item.icon, IconSlot::Group),
                    href: item_href(item),
                })
                .collect();
            if tiles.is_empty() {
                return None;
            }
            Some(TileGroup {
                title: t.t(&group.title),
                description: t.t(&group.description),
                icon: resolve(&group.icon, IconSlot::Group),
                tiles,
            })
        })
        .collect()
}
