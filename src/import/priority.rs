//! Global priority orders recovered from per-section priority numbers.

use itertools::Itertools;

/// Accumulates `(priority, label)` observations from many sections and
/// resolves them into one global order.
///
/// A label may be observed several times with different priorities; the
/// smallest one wins. Ties between labels break on the label itself so the
/// result does not depend on document order.
#[derive(Debug, Default)]
pub struct PriorityOrder {
    observations: Vec<(i32, String)>,
}

impl PriorityOrder {
    pub fn observe(&mut self, priority: i32, label: &str) {
        self.observations.push((priority, label.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Labels with their winning priority, sorted.
    pub fn resolved(&self) -> Vec<(i32, String)> {
        let grouped = self
            .observations
            .iter()
            .map(|(priority, label)| (label.clone(), *priority))
            .into_group_map();
        let mut resolved: Vec<(i32, String)> = grouped
            .into_iter()
            .map(|(label, priorities)| {
                let winner = priorities.into_iter().min().unwrap_or(i32::MAX);
                (winner, label)
            })
            .collect();
        resolved.sort();
        resolved
    }

    /// Labels only, in resolved order.
    pub fn ranked(&self) -> Vec<String> {
        self.resolved().into_iter().map(|(_, label)| label).collect()
    }

    /// Resolved labels joined with `", "` for storage.
    pub fn order_string(&self) -> String {
        self.ranked().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smallest_observation_wins() {
        let mut order = PriorityOrder::default();
        order.observe(3, "Basic");
        order.observe(1, "Basic");
        order.observe(2, "Ring");
        assert_eq!(
            order.resolved(),
            vec![(1, "Basic".to_string()), (2, "Ring".to_string())]
        );
        assert_eq!(order.order_string(), "Basic, Ring");
    }

    #[test]
    fn ties_break_on_label() {
        let mut order = PriorityOrder::default();
        order.observe(1, "Swine");
        order.observe(1, "Cattle");
        assert_eq!(order.ranked(), vec!["Cattle", "Swine"]);
    }

    #[test]
    fn empty_order() {
        let order = PriorityOrder::default();
        assert!(order.is_empty());
        assert_eq!(order.order_string(), "");
    }
}
