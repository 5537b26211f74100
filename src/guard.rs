use indexmap::IndexMap;
use log::debug;

/// Per-call cycle and depth tracking.
///
/// `enter` refuses a type when either holds:
/// - the current depth is above the configured limit;
/// - the type was already visited and the depth is above the number of distinct
///   types seen so far.
///
/// Builders bump the depth with [`RegistryGuard::descend`] when they step into the
/// fields of an object or the element of a collection or map, and restore it with
/// [`RegistryGuard::ascend`].
#[derive(Debug, Clone)]
pub struct RegistryGuard {
    visited: IndexMap<String, usize>,
    depth: usize,
    limit: usize,
}

impl RegistryGuard {
    pub fn new(limit: usize) -> Self {
        Self {
            visited: IndexMap::new(),
            depth: 0,
            limit,
        }
    }

    /// Register a visit to `type_name`, or refuse it when descent must stop
    pub fn enter(&mut self, type_name: &str) -> bool {
        if self.depth > self.limit {
            debug!(
                "Truncating {} at depth {} (limit {})",
                type_name, self.depth, self.limit
            );
            return false;
        }
        if self.visited.contains_key(type_name) && self.depth > self.visited.len() {
            debug!(
                "Truncating {} at depth {}: seen {} distinct types",
                type_name,
                self.depth,
                self.visited.len()
            );
            return false;
        }
        *self.visited.entry(type_name.to_string()).or_insert(0) += 1;
        true
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn descend(&mut self) {
        self.depth += 1;
    }

    pub fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn visits(&self, type_name: &str) -> usize {
        self.visited.get(type_name).copied().unwrap_or(0)
    }

    pub fn distinct_types(&self) -> usize {
        self.visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_ceiling() {
        let mut guard = RegistryGuard::new(2);
        assert!(guard.enter("A"));
        guard.descend();
        assert!(guard.enter("B"));
        guard.descend();
        assert!(guard.enter("C"));
        guard.descend();
        assert!(!guard.enter("D"));
        assert_eq!(guard.visits("D"), 0);
    }

    #[test]
    fn test_revisit_heuristic() {
        let mut guard = RegistryGuard::new(10);
        assert!(guard.enter("A"));
        guard.descend();
        assert!(guard.enter("B"));
        guard.descend();
        // depth 2, two distinct types seen: still allowed
        assert!(guard.enter("A"));
        assert_eq!(guard.visits("A"), 2);
        guard.descend();
        assert!(!guard.enter("B"));
        // unseen types are only bound by the ceiling
        assert!(guard.enter("C"));
        assert_eq!(guard.distinct_types(), 3);
    }

    #[test]
    fn test_ascend_restores_depth() {
        let mut guard = RegistryGuard::new(1);
        guard.descend();
        guard.descend();
        assert!(!guard.enter("A"));
        guard.ascend();
        assert!(guard.enter("A"));
        assert_eq!(guard.depth(), 1);
        guard.ascend();
        guard.ascend();
        assert_eq!(guard.depth(), 0);
    }
}
