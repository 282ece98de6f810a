//! Symbolic icon names to glyphs.
//!
//! Menu entries name their icon with free-form strings ("Business",
//! "business_icon", "BUSINESS"). Names are normalized to lowercase ASCII
//! alphanumerics and looked up in a fixed table. Anything unknown renders as
//! an empty box of the slot's size.

use serde::Serialize;

/// Concrete glyphs the console can draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    Dashboard,
    Business,
    Apps,
    People,
    Person,
    Settings,
    Security,
    Key,
    Language,
    Public,
    List,
    Description,
    Assessment,
    Notifications,
    Email,
    Folder,
    Storage,
    Menu,
    // Actions
    View,
    Edit,
    Delete,
    Add,
    Blocked,
    Search,
    Clear,
    Save,
    Back,
    Logout,
    ExpandMore,
    ExpandLess,
    ChevronLeft,
    ChevronRight,
}

impl Glyph {
    /// Character drawn for the glyph.
    pub fn symbol(self) -> &'static str {
        match self {
            Glyph::Dashboard => "\u{25A6}",
            Glyph::Business => "\u{1F3E2}",
            Glyph::Apps => "\u{25A3}",
            Glyph::People => "\u{1F465}",
            Glyph::Person => "\u{1F464}",
            Glyph::Settings => "\u{2699}",
            Glyph::Security => "\u{1F512}",
            Glyph::Key => "\u{1F511}",
            Glyph::Language => "\u{1F310}",
            Glyph::Public => "\u{1F30D}",
            Glyph::List => "\u{2630}",
            Glyph::Description => "\u{1F4C4}",
            Glyph::Assessment => "\u{1F4CA}",
            Glyph::Notifications => "\u{1F514}",
            Glyph::Email => "\u{2709}",
            Glyph::Folder => "\u{1F4C1}",
            Glyph::Storage => "\u{1F5C4}",
            Glyph::Menu => "\u{2261}",
            Glyph::View => "\u{1F441}",
            Glyph::Edit => "\u{270E}",
            Glyph::Delete => "\u{1F5D1}",
            Glyph::Add => "+",
            Glyph::Blocked => "\u{1F6AB}",
            Glyph::Search => "\u{1F50D}",
            Glyph::Clear => "\u{2715}",
            Glyph::Save => "\u{1F4BE}",
            Glyph::Back => "\u{2190}",
            Glyph::Logout => "\u{238B}",
            Glyph::ExpandMore => "\u{25BE}",
            Glyph::ExpandLess => "\u{25B4}",
            Glyph::ChevronLeft => "\u{2039}",
            Glyph::ChevronRight => "\u{203A}",
        }
    }
}

/// Slot an icon is drawn in; decides the placeholder size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSlot {
    Group,
    Item,
}

impl IconSlot {
    pub fn size_px(self) -> u32 {
        match self {
            IconSlot::Group => 24,
            IconSlot::Item => 20,
        }
    }
}

/// What a template draws for one icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconView {
    /// None draws an empty placeholder box.
    pub glyph: Option<Glyph>,
    pub symbol: &'static str,
    pub size_px: u32,
}

/// Lowercase ASCII alphanumerics only.
pub fn normalize_icon_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Look up a normalized name. An `icon` suffix ("businessicon") is ignored.
pub fn glyph_for(normalized: &str) -> Option<Glyph> {
    lookup(normalized).or_else(|| {
        normalized
            .strip_suffix("icon")
            .filter(|base| !base.is_empty())
            .and_then(lookup)
    })
}

fn lookup(name: &str) -> Option<Glyph> {
    let glyph = match name {
        "dashboard" | "home" => Glyph::Dashboard,
        "business" | "company" | "companies" | "domain" | "corporatefare" => Glyph::Business,
        "apps" | "app" | "application" | "applications" | "widgets" => Glyph::Apps,
        "people" | "group" | "groups" | "users" => Glyph::People,
        "person" | "user" | "account" | "accountcircle" => Glyph::Person,
        "settings" | "admin" | "adminpanelsettings" | "tune" => Glyph::Settings,
        "security" | "lock" | "shield" | "roles" => Glyph::Security,
        "key" | "vpnkey" | "license" | "licenses" => Glyph::Key,
        "language" | "translate" | "culture" | "cultures" | "localization" => Glyph::Language,
        "public" | "country" | "countries" | "flag" => Glyph::Public,
        "list" | "listalt" | "viewlist" => Glyph::List,
        "description" | "article" | "document" | "docs" => Glyph::Description,
        "assessment" | "reports" | "report" | "analytics" | "barchart" => Glyph::Assessment,
        "notifications" | "notification" | "alerts" => Glyph::Notifications,
        "email" | "mail" => Glyph::Email,
        "folder" | "category" => Glyph::Folder,
        "storage" | "database" | "master" => Glyph::Storage,
        "menu" => Glyph::Menu,
        "visibility" | "view" => Glyph::View,
        "edit" => Glyph::Edit,
        "delete" => Glyph::Delete,
        "add" | "new" => Glyph::Add,
        "block" | "blocked" => Glyph::Blocked,
        "search" => Glyph::Search,
        "clear" | "close" => Glyph::Clear,
        "save" => Glyph::Save,
        "arrowback" | "back" => Glyph::Back,
        "logout" => Glyph::Logout,
        "expandmore" => Glyph::ExpandMore,
        "expandless" => Glyph::ExpandLess,
        "chevronleft" => Glyph::ChevronLeft,
        "chevronright" => Glyph::ChevronRight,
        _ => return None,
    };
    Some(glyph)
}

/// Resolve a symbolic name for a slot. Never fails.
pub fn resolve(name: &str, slot: IconSlot) -> IconView {
    let glyph = glyph_for(&normalize_icon_name(name));
    IconView {
        glyph,
        symbol: glyph.map(Glyph::symbol).unwrap_or(""),
        size_px: slot.size_px(),
    }
}

/// Icon for a known glyph.
pub fn icon(glyph: Glyph, slot: IconSlot) -> IconView {
    IconView {
        glyph: Some(glyph),
        symbol: glyph.symbol(),
        size_px: slot.size_px(),
    }
}
