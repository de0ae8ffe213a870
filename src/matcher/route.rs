//! Route applicability gate.

use crate::config::RouteRules;

/// Decide whether a request path participates in transformation.
///
/// An exclude prefix wins outright; a non-empty include list then
/// restricts to matching routes; with neither, every route applies.
pub fn applies(route: &str, rules: &RouteRules) -> bool {
    if rules.exclude.iter().any(|prefix| route.starts_with(prefix)) {
        return false;
    }
    if !rules.include.is_empty() {
        return rules.include.iter().any(|prefix| route.starts_with(prefix));
    }
    true
}
