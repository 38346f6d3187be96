//! Dense factors over discrete variables.
//!
//! Values are stored row-major over `scope`, with the last variable varying
//! fastest.

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Factor {
    scope: Vec<usize>,
    cards: Vec<usize>,
    values: Vec<f64>,
}

impl Factor {
    pub(crate) fn new(scope: Vec<usize>, cards: Vec<usize>, values: Vec<f64>) -> Self {
        debug_assert_eq!(scope.len(), cards.len());
        debug_assert_eq!(cards.iter().product::<usize>(), values.len());
        Self {
            scope,
            cards,
            values,
        }
    }

    pub(crate) fn unit() -> Self {
        Self::new(Vec::new(), Vec::new(), vec![1.0])
    }

    pub(crate) fn scope(&self) -> &[usize] {
        &self.scope
    }

    pub(crate) fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn contains(&self, variable: usize) -> bool {
        self.scope.contains(&variable)
    }

    fn strides(cards: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; cards.len()];
        for i in (0..cards.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * cards[i + 1];
        }
        strides
    }

    /// Pointwise product over the union of both scopes.
    pub(crate) fn product(&self, other: &Self) -> Self {
        let mut scope = self.scope.clone();
        let mut cards = self.cards.clone();
        for (&var, &card) in other.scope.iter().zip(&other.cards) {
            if !scope.contains(&var) {
                scope.push(var);
                cards.push(card);
            }
        }

        let position = |var: usize| scope.iter().position(|&v| v == var).unwrap_or(0);
        let self_map: Vec<usize> = self.scope.iter().map(|&v| position(v)).collect();
        let other_map: Vec<usize> = other.scope.iter().map(|&v| position(v)).collect();
        let self_strides = Self::strides(&self.cards);
        let other_strides = Self::strides(&other.cards);

        let size: usize = cards.iter().product();
        let mut values = Vec::with_capacity(size);
        let mut assignment = vec![0usize; scope.len()];
        for _ in 0..size {
            let a: usize = self_map
                .iter()
                .zip(&self_strides)
                .map(|(&pos, &stride)| assignment[pos] * stride)
                .sum();
            let b: usize = other_map
                .iter()
                .zip(&other_strides)
                .map(|(&pos, &stride)| assignment[pos] * stride)
                .sum();
            values.push(self.values[a] * other.values[b]);
            advance(&mut assignment, &cards);
        }

        Self::new(scope, cards, values)
    }

    /// Sums `variable` out of the factor.
    pub(crate) fn marginalize(&self, variable: usize) -> Self {
        let Some(axis) = self.scope.iter().position(|&v| v == variable) else {
            return self.clone();
        };
        self.collapse(axis, None)
    }

    /// Fixes `variable` to `state` and drops it from the scope.
    pub(crate) fn reduce(&self, variable: usize, state: usize) -> Self {
        let Some(axis) = self.scope.iter().position(|&v| v == variable) else {
            return self.clone();
        };
        self.collapse(axis, Some(state))
    }

    fn collapse(&self, axis: usize, keep: Option<usize>) -> Self {
        let mut scope = self.scope.clone();
        let mut cards = self.cards.clone();
        scope.remove(axis);
        cards.remove(axis);

        let mut values = vec![0.0; cards.iter().product()];
        let out_strides = Self::strides(&cards);
        let mut assignment = vec![0usize; self.scope.len()];
        for &value in &self.values {
            let state = assignment[axis];
            if keep.map_or(true, |k| k == state) {
                let target: usize = assignment
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != axis)
                    .zip(&out_strides)
                    .map(|((_, &s), &stride)| s * stride)
                    .sum();
                values[target] += value;
            }
            advance(&mut assignment, &self.cards);
        }

        Self::new(scope, cards, values)
    }
}

/// Odometer increment, last position fastest.
fn advance(assignment: &mut [usize], cards: &[usize]) {
    for i in (0..assignment.len()).rev() {
        assignment[i] += 1;
        if assignment[i] < cards[i] {
            return;
        }
        assignment[i] = 0;
    }
}
