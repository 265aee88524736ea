//! Compiled URL rule table.
//!
//! # Data Flow
//! ```text
//! merged config [components.urlManager.rules]
//!     → RouteTable::from_config (compile once at bootstrap)
//!     → shared by reference (Arc) with every isolated instance
//! ```
//!
//! # Design Decisions
//! - Compiled at bootstrap, immutable at runtime; isolated instances share
//!   the table by reference instead of copying it per request
//! - First match wins, in config order
//! - Exact match, or prefix match for patterns ending in `*`
//! - Interpreting the matched route is the hosted application's concern

use crate::config::AppConfig;

/// One compiled URL rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRule {
    pub pattern: String,
    pub route: String,
}

/// Request-invariant URL-matching state, built once per bootstrap.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<UrlRule>,
}

impl RouteTable {
    /// Compile the rule table from `components.urlManager.rules`.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut rules = Vec::new();
        if let Some(table) = config
            .get("components.urlManager.rules")
            .and_then(|v| v.as_table())
        {
            for (pattern, route) in table {
                if let Some(route) = route.as_str() {
                    rules.push(UrlRule {
                        pattern: pattern.clone(),
                        route: route.to_string(),
                    });
                }
            }
        }
        Self { rules }
    }

    /// Find the first rule matching a request path.
    pub fn match_path(&self, path: &str) -> Option<&UrlRule> {
        self.rules.iter().find(|rule| {
            match rule.pattern.strip_suffix('*') {
                Some(prefix) => path.starts_with(prefix),
                None => rule.pattern == path,
            }
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        let config = AppConfig::from_table(
            toml::from_str(
                r#"
                [components.urlManager.rules]
                "/post/*" = "post/view"
                "/about" = "site/about"
                "#,
            )
            .unwrap(),
        );
        RouteTable::from_config(&config)
    }

    #[test]
    fn exact_and_prefix_matching() {
        let routes = table();
        assert_eq!(routes.match_path("/about").unwrap().route, "site/about");
        assert_eq!(routes.match_path("/post/42").unwrap().route, "post/view");
        assert!(routes.match_path("/missing").is_none());
    }

    #[test]
    fn empty_config_compiles_to_empty_table() {
        let routes = RouteTable::from_config(&AppConfig::default());
        assert!(routes.is_empty());
    }
}
