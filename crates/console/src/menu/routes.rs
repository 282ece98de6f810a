//! Static route table of the authenticated area.
//!
//! The menu graph is validated against this table, not the reverse: a menu
//! item pointing at a path the console does not serve is simply never used
//! by the guard.

use std::collections::HashMap;

use super::graph::{Capability, normalize_path};

/// One navigable page of the authenticated area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    /// Path pattern without leading `/` (e.g. "companies/:id/edit").
    pub pattern: &'static str,
    /// Menu path that authorizes this route. `None` marks an open route.
    pub anchor: Option<&'static str>,
    /// Capability the anchor item must grant, if any.
    pub capability: Option<Capability>,
}

impl RouteDefinition {
    /// A route reachable by every authenticated user.
    pub const fn open(pattern: &'static str) -> Self {
        Self {
            pattern,
            anchor: None,
            capability: None,
        }
    }

    /// A route authorized by its own menu item.
    pub const fn menu(pattern: &'static str) -> Self {
        Self {
            pattern,
            anchor: Some(pattern),
            capability: None,
        }
    }

    /// A sub-page authorized by a parent menu item and one of its flags.
    pub const fn action(
        pattern: &'static str,
        anchor: &'static str,
        capability: Capability,
    ) -> Self {
        Self {
            pattern,
            anchor: Some(anchor),
            capability: Some(capability),
        }
    }
}

/// Result of matching a path against the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: RouteDefinition,
    /// Path parameters extracted (e.g., {"id": "42"}).
    pub params: HashMap<String, String>,
}

/// Ordered route table, most specific patterns first.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
}

impl RouteTable {
    /// Build a table, sorting so literal segments win over parameters.
    pub fn new(mut routes: Vec<RouteDefinition>) -> Self {
        routes.sort_by_key(|r| {
            let param_count = r.pattern.matches(':').count();
            let segment_count = r.pattern.split('/').count();
            (param_count, std::cmp::Reverse(segment_count))
        });
        Self { routes }
    }

    /// The console's pages.
    pub fn console() -> Self {
        Self::new(vec![
            RouteDefinition::open("dashboard"),
            RouteDefinition::menu("companies"),
            RouteDefinition::action("companies/new", "companies", Capability::Create),
            RouteDefinition::action("companies/:id/view", "companies", Capability::View),
            RouteDefinition::action("companies/:id/edit", "companies", Capability::Edit),
            RouteDefinition::action("companies/:id/delete", "companies", Capability::Delete),
            RouteDefinition::menu("applications"),
            RouteDefinition::action("applications/:id/view", "applications", Capability::View),
            RouteDefinition::action("applications/:id/edit", "applications", Capability::Edit),
            RouteDefinition::action(
                "applications/:id/delete",
                "applications",
                Capability::Delete,
            ),
        ])
    }

    /// Match a request path against the table.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let path = normalize_path(path);
        self.routes.iter().find_map(|route| {
            match_pattern(route.pattern, path).map(|params| RouteMatch {
                route: route.clone(),
                params,
            })
        })
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }
}

/// Match a route pattern against a path, extracting parameters.
///
/// Pattern: "companies/:id/edit"
/// Path: "companies/42/edit"
/// Result: Some({"id": "42"})
fn match_pattern(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').collect();
    let path_parts: Vec<&str> = path.split('/').collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (pat, actual) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(param_name) = pat.strip_prefix(':') {
            if actual.is_empty() {
                return None;
            }
            params.insert(param_name.to_string(), actual.to_string());
        } else if pat != actual {
            return None;
        }
    }

    Some(params)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn match_pattern_exact() {
        let params = match_pattern("companies", "companies");
        assert!(params.unwrap().is_empty());
    }

    #[test]
    fn match_pattern_with_param() {
        let params = match_pattern("companies/:id/view", "companies/17/view").unwrap();
        assert_eq!(params.get("id"), Some(&"17".to_string()));
    }

    #[test]
    fn match_pattern_no_match() {
        assert!(match_pattern("companies", "applications").is_none());
        assert!(match_pattern("companies/:id/view", "companies/17").is_none());
        assert!(match_pattern("companies/:id/view", "companies//view").is_none());
    }

    #[test]
    fn literal_route_beats_parameter_route() {
        let table = RouteTable::new(vec![
            RouteDefinition::action("companies/:id", "companies", Capability::View),
            RouteDefinition::action("companies/new", "companies", Capability::Create),
        ]);
        let matched = table.match_path("/companies/new").unwrap();
        assert_eq!(matched.route.pattern, "companies/new");
        assert_eq!(matched.route.capability, Some(Capability::Create));
    }

    #[test]
    fn console_table_maps_sub_pages_to_parent_anchor() {
        let table = RouteTable::console();

        let edit = table.match_path("/companies/3/edit").unwrap();
        assert_eq!(edit.route.anchor, Some("companies"));
        assert_eq!(edit.route.capability, Some(Capability::Edit));
        assert_eq!(edit.params["id"], "3");

        let list = table.match_path("/applications").unwrap();
        assert_eq!(list.route.anchor, Some("applications"));
        assert_eq!(list.route.capability, None);

        let dashboard = table.match_path("/dashboard").unwrap();
        assert_eq!(dashboard.route.anchor, None);
    }

    #[test]
    fn unknown_paths_do_not_match() {
        let table = RouteTable::console();
        assert!(table.match_path("/users").is_none());
        assert!(table.match_path("/").is_none());
        assert!(table.match_path("/companies/1/2/3").is_none());
    }
}
