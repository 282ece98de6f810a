//! Action controls driven by capability flags.
//!
//! Every action is always rendered. A disabled one swaps its glyph for the
//! blocked glyph, uses the `_NoPermissions` tooltip and carries no link.

use serde::Serialize;

use super::icons::{Glyph, IconSlot, IconView, icon};
use crate::i18n::Translations;
use crate::menu::{Capabilities, Capability};

#[derive(Debug, Clone, Serialize)]
pub struct ActionView {
    pub capability: Capability,
    pub enabled: bool,
    pub label: String,
    pub tooltip: String,
    pub icon: IconView,
    /// None for disabled actions.
    pub href: Option<String>,
}

fn glyph_of(capability: Capability) -> Glyph {
    match capability {
        Capability::View => Glyph::View,
        Capability::Edit => Glyph::Edit,
        Capability::Delete => Glyph::Delete,
        Capability::Create => Glyph::Add,
    }
}

fn button_key(capability: Capability) -> &'static str {
    match capability {
        Capability::View => "Button_View",
        Capability::Edit => "Button_Edit",
        Capability::Delete => "Button_Delete",
        Capability::Create => "Button_New",
    }
}

/// One action control for `capability`, linking to `href` when allowed.
pub fn action(
    caps: Capabilities,
    capability: Capability,
    href: String,
    t: &Translations,
) -> ActionView {
    let enabled = caps.allows(capability);
    let key = button_key(capability);
    let tooltip = if enabled {
        t.t(&format!("{key}_Tooltip"))
    } else {
        t.t(&format!("{key}_Tooltip_NoPermissions"))
    };
    let glyph = if enabled {
        glyph_of(capability)
    } else {
        Glyph::Blocked
    };

    ActionView {
        capability,
        enabled,
        label: t.t(key),
        tooltip,
        icon: icon(glyph, IconSlot::Item),
        href: enabled.then_some(href),
    }
}

/// View, edit and delete controls of one list row.
///
/// `base` is the list path without trailing separator, e.g. "/companies".
pub fn row_actions(caps: Capabilities, base: &str, id: i64, t: &Translations) -> Vec<ActionView> {
    vec![
        action(caps, Capability::View, format!("{base}/{id}/view"), t),
        action(caps, Capability::Edit, format!("{base}/{id}/edit"), t),
        action(caps, Capability::Delete, format!("{base}/{id}/delete"), t),
    ]
}
