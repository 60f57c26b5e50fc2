//! Route rule storage and lookup.
//!
//! # Responsibilities
//! - Compile rule configs into matchable rules
//! - Look up the winning rule for a (path, method) pair
//! - Swap in a new rule set atomically on reload
//!
//! # Design Decisions
//! - The active rule set is an immutable snapshot behind `ArcSwap`;
//!   readers never observe a half-updated table
//! - Rules sorted by priority descending with a stable sort, so equal
//!   priorities keep load order (first-loaded wins)
//! - Inactive and malformed rules are dropped at compile time with a loud
//!   log, never evaluated per request
//! - No match is a normal outcome, not an error

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Method;

use crate::config::schema::{
    AuthConfig, CorsConfig, RateLimitConfig, RouteRuleConfig, TargetConfig,
};
use crate::observability::metrics;
use crate::routing::pattern::PathPattern;

/// A compiled, matchable route rule.
#[derive(Debug)]
pub struct RouteRule {
    pub id: String,
    pub name: String,
    pub pattern: PathPattern,
    pub methods: MethodSet,
    pub priority: i32,
    pub rate_limit: Option<RateLimitConfig>,
    pub auth: Option<AuthConfig>,
    pub cors: Option<CorsConfig>,
    pub target: Option<TargetConfig>,
}

/// The set of HTTP methods a rule permits.
#[derive(Debug)]
pub enum MethodSet {
    /// Wildcard: any method.
    Any,
    /// Explicit list, uppercase.
    List(Vec<Method>),
}

impl MethodSet {
    fn compile(methods: &[String]) -> Option<Self> {
        if methods.iter().any(|m| m == "*") {
            return Some(MethodSet::Any);
        }
        let mut list = Vec::with_capacity(methods.len());
        for m in methods {
            list.push(m.to_uppercase().parse::<Method>().ok()?);
        }
        if list.is_empty() {
            None
        } else {
            Some(MethodSet::List(list))
        }
    }

    /// Whether the given method is permitted.
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            MethodSet::Any => true,
            MethodSet::List(list) => list.contains(method),
        }
    }
}

/// One immutable generation of the rule table.
#[derive(Debug, Default)]
struct RuleTable {
    rules: Vec<Arc<RouteRule>>,
}

impl RuleTable {
    fn compile(configs: &[RouteRuleConfig]) -> Self {
        let mut rules: Vec<Arc<RouteRule>> = Vec::with_capacity(configs.len());

        for config in configs {
            if !config.active {
                tracing::debug!(rule = %config.id, "Skipping inactive rule");
                continue;
            }
            match compile_rule(config) {
                Ok(rule) => rules.push(Arc::new(rule)),
                Err(reason) => {
                    // Config fault: exclude the rule, keep the gateway up.
                    tracing::error!(rule = %config.id, %reason, "Excluding malformed route rule");
                    metrics::record_config_fault("route_rule");
                }
            }
        }

        // Stable sort: equal priorities keep load order.
        rules.sort_by_key(|r| std::cmp::Reverse(r.priority));

        Self { rules }
    }
}

fn compile_rule(config: &RouteRuleConfig) -> Result<RouteRule, String> {
    let pattern = PathPattern::compile(&config.pattern).map_err(|e| e.to_string())?;
    let methods =
        MethodSet::compile(&config.methods).ok_or_else(|| "invalid method set".to_string())?;

    Ok(RouteRule {
        id: config.id.clone(),
        name: config.name.clone(),
        pattern,
        methods,
        priority: config.priority,
        rate_limit: config.rate_limit.clone(),
        auth: config.auth.clone(),
        cors: config.cors.clone(),
        target: config.target.clone(),
    })
}

/// Holds the active rule set and performs per-request matching.
pub struct RouteRegistry {
    table: ArcSwap<RuleTable>,
}

impl RouteRegistry {
    /// Compile the given rule configs into a fresh registry.
    pub fn from_config(configs: &[RouteRuleConfig]) -> Self {
        Self {
            table: ArcSwap::from_pointee(RuleTable::compile(configs)),
        }
    }

    /// Replace the entire rule set atomically. In-flight matches complete
    /// against the generation they loaded.
    pub fn reload(&self, configs: &[RouteRuleConfig]) {
        let table = RuleTable::compile(configs);
        let count = table.rules.len();
        self.table.store(Arc::new(table));
        tracing::info!(rules = count, "Route table reloaded");
    }

    /// Find the winning rule for a request, if any.
    ///
    /// First match in priority-descending order wins; overlapping patterns
    /// are resolved purely by priority, never by specificity.
    pub fn find_match(&self, path: &str, method: &Method) -> Option<Arc<RouteRule>> {
        let table = self.table.load();
        table
            .rules
            .iter()
            .find(|rule| rule.methods.allows(method) && rule.pattern.matches(path))
            .cloned()
    }

    /// Number of active rules in the current snapshot.
    pub fn len(&self) -> usize {
        self.table.load().rules.len()
    }

    /// Whether the current snapshot holds no rules.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
