//! Fresh joint names for generated joints

use std::collections::HashSet;

/// Joint name allocator owned by one build
///
/// Generated names are `{prefix}_{n}` with a counter shared across prefixes.
/// Names reserved by callers are never handed out again.
#[derive(Debug, Clone, Default)]
pub struct NameGenerator {
    next: u64,
    taken: HashSet<String>,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a caller-chosen name; false if it is already in use
    pub fn reserve(&mut self, name: &str) -> bool {
        self.taken.insert(name.to_string())
    }

    /// Next unused name for `prefix`
    pub fn fresh(&mut self, prefix: &str) -> String {
        loop {
            let candidate = format!("{}_{}", prefix, self.next);
            self.next += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Forget every name and restart the counter
    pub fn reset(&mut self) {
        self.next = 0;
        self.taken.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_is_monotonic() {
        let mut names = NameGenerator::new();
        assert_eq!(names.fresh("root_fixed"), "root_fixed_0");
        assert_eq!(names.fresh("abstract_fixed"), "abstract_fixed_1");
        assert_eq!(names.fresh("root_fixed"), "root_fixed_2");
    }

    #[test]
    fn test_fresh_skips_reserved() {
        let mut names = NameGenerator::new();
        assert!(names.reserve("joint_prismatic_0"));
        assert_eq!(names.fresh("joint_prismatic"), "joint_prismatic_1");
        assert!(!names.reserve("joint_prismatic_1"));
    }

    #[test]
    fn test_reset_is_reproducible() {
        let mut names = NameGenerator::new();
        let first: Vec<String> = (0..3).map(|_| names.fresh("j")).collect();
        names.reset();
        let second: Vec<String> = (0..3).map(|_| names.fresh("j")).collect();
        assert_eq!(first, second);
    }
}
