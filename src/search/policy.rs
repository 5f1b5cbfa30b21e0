use std::fmt;

use itertools::Itertools;

/// Preference weights over the moves of a searched position, in the order of
/// the node's moves.
///
/// Weights are not a probability distribution unless
/// [`Policy::normalized`] is used.
#[derive(Clone, Debug, PartialEq)]
pub struct Policy<M> {
    weights: Vec<(M, f32)>,
}

impl<M> Default for Policy<M> {
    fn default() -> Self {
        Self { weights: vec![] }
    }
}

impl<M: Copy + PartialEq> Policy<M> {
    #[allow(missing_docs)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns the weight of `action`, if it is present.
    #[must_use]
    pub fn weight(&self, action: M) -> Option<f32> {
        self.weights
            .iter()
            .find(|(m, _)| *m == action)
            .map(|&(_, weight)| weight)
    }

    /// Returns the move with the highest weight, the first one on ties.
    #[must_use]
    pub fn best(&self) -> Option<M> {
        let mut best: Option<(M, f32)> = None;
        for &(action, weight) in &self.weights {
            if best.map_or(true, |(_, best_weight)| weight > best_weight) {
                best = Some((action, weight));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Scales the weights so that they sum up to one. Policies without
    /// positive mass are returned as is.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let total: f32 = self.weights.iter().map(|&(_, weight)| weight).sum();
        if total <= 0.0 {
            return self.clone();
        }
        self.weights
            .iter()
            .map(|&(action, weight)| (action, weight / total))
            .collect()
    }
}

impl<M> FromIterator<(M, f32)> for Policy<M> {
    fn from_iter<I: IntoIterator<Item = (M, f32)>>(iter: I) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

impl<M: fmt::Display> fmt::Display for Policy<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.weights
                .iter()
                .map(|(action, weight)| format!("{action}:{weight:.3}"))
                .join(" ")
        )
    }
}
