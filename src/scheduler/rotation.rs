//! Round-robin target rotation
//!
//! A fixed list and a cursor advanced modulo its length. The same list always
//! yields the same sequence, starting from the first entry.

/// Endless round-robin over a fixed, non-empty target list
#[derive(Debug, Clone)]
pub struct TargetRotation {
    targets: Vec<String>,
    cursor: usize,
}

impl TargetRotation {
    /// Create a rotation; returns `None` for an empty list
    pub fn new<I, S>(targets: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: Vec<String> = targets.into_iter().map(Into::into).collect();
        if targets.is_empty() {
            return None;
        }
        Some(Self { targets, cursor: 0 })
    }

    /// Target for this iteration; advances the cursor
    pub fn next_target(&mut self) -> &str {
        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.targets.len();
        &self.targets[index]
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_is_rejected() {
        assert!(TargetRotation::new(Vec::<String>::new()).is_none());
    }

    #[test]
    fn test_round_robin_wraps() {
        let mut rotation = TargetRotation::new(["A", "B", "C", "D"]).unwrap();

        let order: Vec<String> = (0..5).map(|_| rotation.next_target().to_string()).collect();
        assert_eq!(order, vec!["A", "B", "C", "D", "A"]);
        assert_eq!(rotation.next_target(), "B");
    }

    #[test]
    fn test_single_target_repeats() {
        let mut rotation = TargetRotation::new(["only"]).unwrap();
        assert_eq!(rotation.next_target(), "only");
        assert_eq!(rotation.next_target(), "only");
        assert_eq!(rotation.len(), 1);
    }
}
