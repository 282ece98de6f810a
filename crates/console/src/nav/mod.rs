//! Navigation rendering: side menu, dashboard tiles, icons and actions.

pub mod actions;
pub mod icons;
pub mod popover;
mod sidebar;

pub use actions::{ActionView, action, row_actions};
pub use icons::{Glyph, IconSlot, IconView};
pub use popover::PopoverDelays;
pub use sidebar::{
    ExpandedGroups, OPEN_PARAM, SideMenu, SideMenuGroup, SideMenuItem, Tile, TileGroup,
    dashboard_tiles, side_menu,
};
