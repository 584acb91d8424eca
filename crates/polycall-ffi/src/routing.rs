use parking_lot::RwLock;

/// Single-`*`-wildcard glob match, identical in spirit to
/// `polycall_security::glob_match` but kept local: the two crates aren't
/// linked, and a routing glob is a different namespace (endpoints, not
/// function names) from an ACL glob.
fn glob_match(pattern: &str, text: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == text,
        Some((prefix, suffix)) => {
            text.len() >= prefix.len() + suffix.len() && text.starts_with(prefix) && text.ends_with(suffix)
        }
    }
}

/// A routing rule: calls whose function name matches `source_glob` are sent
/// to `target_endpoint` (`spec.md` §3 "Routing rule").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRule {
    pub source_glob: String,
    pub target_endpoint: String,
    pub priority: u32,
}

impl RoutingRule {
    pub fn new(source_glob: impl Into<String>, target_endpoint: impl Into<String>, priority: u32) -> Self {
        Self { source_glob: source_glob.into(), target_endpoint: target_endpoint.into(), priority }
    }
}

/// Read-mostly table of routing rules (`spec.md` §5: "routing table are
/// read-mostly and guarded by reader-writer locks"). Resolution picks the
/// highest-priority matching rule; ties are broken by registration order,
/// the earliest-added rule winning (`spec.md` §9 Open Questions).
#[derive(Default)]
pub struct RoutingTable {
    rules: RwLock<Vec<RoutingRule>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, rule: RoutingRule) {
        self.rules.write().push(rule);
    }

    pub fn resolve(&self, function_name: &str) -> Option<String> {
        let rules = self.rules.read();
        let mut best: Option<&RoutingRule> = None;
        for rule in rules.iter().filter(|r| glob_match(&r.source_glob, function_name)) {
            best = match best {
                Some(current) if rule.priority > current.priority => Some(rule),
                Some(current) => Some(current),
                None => Some(rule),
            };
        }
        best.map(|r| r.target_endpoint.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_highest_priority_match() {
        let table = RoutingTable::new();
        table.add(RoutingRule::new("math.*", "tcp://low", 1));
        table.add(RoutingRule::new("math.*", "tcp://high", 5));
        assert_eq!(table.resolve("math.add").as_deref(), Some("tcp://high"));
    }

    #[test]
    fn equal_priority_ties_break_by_insertion_order() {
        let table = RoutingTable::new();
        table.add(RoutingRule::new("math.*", "tcp://first", 1));
        table.add(RoutingRule::new("math.*", "tcp://second", 1));
        assert_eq!(table.resolve("math.add").as_deref(), Some("tcp://first"));
    }

    #[test]
    fn no_match_resolves_to_none() {
        let table = RoutingTable::new();
        table.add(RoutingRule::new("math.*", "tcp://x", 1));
        assert!(table.resolve("string.concat").is_none());
    }
}
