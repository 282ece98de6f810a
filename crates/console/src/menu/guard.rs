//! Route authorization against the menu graph.

use std::str::FromStr;

use super::graph::{Capability, MenuGraph, UnknownPolicy};
use super::routes::{RouteMatch, RouteTable};

/// What to do with a routed path whose anchor is missing from the menu graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardPolicy {
    /// Deny access (fail closed).
    #[default]
    DenyUnlisted,
    /// Let the page render anyway (legacy permissive behavior).
    AllowUnlisted,
}

impl FromStr for GuardPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deny" => Ok(GuardPolicy::DenyUnlisted),
            "allow" => Ok(GuardPolicy::AllowUnlisted),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No menu item carries the route's anchor path.
    NotInMenu,
    /// The anchor item exists but lacks the capability the route needs.
    MissingCapability(Capability),
}

/// Outcome of checking one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The path is not in the route table; the router decides.
    Unrouted,
    /// The route needs no menu entry.
    Open(RouteMatch),
    /// The menu graph authorizes the route.
    Allowed(RouteMatch),
    /// The anchor was not found but the policy lets it through.
    AllowedUnlisted(RouteMatch),
    Denied(DenyReason),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, GuardDecision::Denied(_))
    }
}

/// Decide whether `path` may render for the holder of `graph`.
pub fn authorize(
    path: &str,
    table: &RouteTable,
    graph: &MenuGraph,
    policy: GuardPolicy,
) -> GuardDecision {
    let Some(matched) = table.match_path(path) else {
        return GuardDecision::Unrouted;
    };

    let Some(anchor) = matched.route.anchor else {
        return GuardDecision::Open(matched);
    };

    match graph.find_item(anchor) {
        Some(item) => match matched.route.capability {
            Some(capability) if !item.capabilities().allows(capability) => {
                GuardDecision::Denied(DenyReason::MissingCapability(capability))
            }
            _ => GuardDecision::Allowed(matched),
        },
        None => match policy {
            GuardPolicy::DenyUnlisted => GuardDecision::Denied(DenyReason::NotInMenu),
            GuardPolicy::AllowUnlisted => GuardDecision::AllowedUnlisted(matched),
        },
    }
}

/// Whether `path` needs the menu graph at all.
///
/// Lets the middleware skip the upstream fetch for open and unrouted paths.
pub fn requires_menu(path: &str, table: &RouteTable) -> bool {
    table
        .match_path(path)
        .is_some_and(|m| m.route.anchor.is_some())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::menu::{MenuGroup, MenuItem};

    fn graph_with(path: &str, flags: [bool; 4]) -> MenuGraph {
        MenuGraph::new(vec![MenuGroup {
            id: "g".into(),
            title: "Menu_Group".into(),
            description: String::new(),
            icon: String::new(),
            items: vec![MenuItem {
                id: "i".into(),
                title: "Menu_Item".into(),
                description: String::new(),
                icon: String::new(),
                path: path.to_string(),
                is_visible: true,
                can_view: flags[0],
                can_edit: flags[1],
                can_delete: flags[2],
                can_create: flags[3],
            }],
            is_visible: true,
        }])
    }

    #[test]
    fn listed_route_is_allowed_with_or_without_leading_separator() {
        let table = RouteTable::console();
        for item_path in ["companies", "/companies"] {
            let graph = graph_with(item_path, [true; 4]);
            for request_path in ["/companies", "companies"] {
                let decision = authorize(request_path, &table, &graph, GuardPolicy::DenyUnlisted);
                assert!(
                    matches!(decision, GuardDecision::Allowed(_)),
                    "{item_path} vs {request_path}: {decision:?}"
                );
            }
        }
    }

    #[test]
    fn unlisted_route_is_denied_under_deny_policy() {
        let table = RouteTable::console();
        let graph = graph_with("companies", [true; 4]);
        let decision = authorize("/applications", &table, &graph, GuardPolicy::DenyUnlisted);
        assert_eq!(decision, GuardDecision::Denied(DenyReason::NotInMenu));
        assert!(!decision.is_allowed());
    }

    #[test]
    fn unlisted_route_passes_under_allow_policy() {
        let table = RouteTable::console();
        let graph = MenuGraph::default();
        let decision = authorize("/applications", &table, &graph, GuardPolicy::AllowUnlisted);
        assert!(matches!(decision, GuardDecision::AllowedUnlisted(_)));
        assert!(decision.is_allowed());
    }

    #[test]
    fn sub_page_requires_the_matching_capability() {
        let table = RouteTable::console();
        // view + delete only
        let graph = graph_with("companies", [true, false, true, false]);

        let view = authorize("/companies/1/view", &table, &graph, GuardPolicy::DenyUnlisted);
        assert!(matches!(view, GuardDecision::Allowed(_)));

        let edit = authorize("/companies/1/edit", &table, &graph, GuardPolicy::DenyUnlisted);
        assert_eq!(
            edit,
            GuardDecision::Denied(DenyReason::MissingCapability(Capability::Edit))
        );

        let create = authorize("/companies/new", &table, &graph, GuardPolicy::AllowUnlisted);
        assert_eq!(
            create,
            GuardDecision::Denied(DenyReason::MissingCapability(Capability::Create))
        );
    }

    #[test]
    fn open_and_unrouted_paths_skip_the_menu() {
        let table = RouteTable::console();
        let graph = MenuGraph::default();

        let dashboard = authorize("/dashboard", &table, &graph, GuardPolicy::DenyUnlisted);
        assert!(matches!(dashboard, GuardDecision::Open(_)));

        let other = authorize("/nowhere", &table, &graph, GuardPolicy::DenyUnlisted);
        assert_eq!(other, GuardDecision::Unrouted);

        assert!(!requires_menu("/dashboard", &table));
        assert!(!requires_menu("/login", &table));
        assert!(requires_menu("/companies/5/edit", &table));
    }

    #[test]
    fn guard_policy_parses_config_values() {
        assert_eq!("deny".parse(), Ok(GuardPolicy::DenyUnlisted));
        assert_eq!("ALLOW".parse(), Ok(GuardPolicy::AllowUnlisted));
        assert!("open".parse::<GuardPolicy>().is_err());
    }
}
