use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rung<T> {
    pub threshold: f64,
    pub value: T,
}

/// Descending tier table; the first (highest) rung the input clears wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdLadder<T> {
    rungs: Vec<Rung<T>>,
    floor: T,
    inclusive: bool,
}

impl<T: Copy> ThresholdLadder<T> {
    /// Rungs match when the input is strictly greater than the threshold.
    pub fn above(rungs: &[(f64, T)], floor: T) -> Self {
        Self::build(rungs, floor, false)
    }

    /// Rungs match when the input is greater than or equal to the threshold.
    pub fn at_least(rungs: &[(f64, T)], floor: T) -> Self {
        Self::build(rungs, floor, true)
    }

    fn build(rungs: &[(f64, T)], floor: T, inclusive: bool) -> Self {
        let mut rungs: Vec<Rung<T>> = rungs
            .iter()
            .map(|(threshold, value)| Rung {
                threshold: *threshold,
                value: *value,
            })
            .collect();
        rungs.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));

        Self {
            rungs,
            floor,
            inclusive,
        }
    }

    pub fn resolve(&self, input: f64) -> T {
        if input.is_nan() {
            return self.floor;
        }

        self.rungs
            .iter()
            .find(|rung| {
                if self.inclusive {
                    input >= rung.threshold
                } else {
                    input > rung.threshold
                }
            })
            .map(|rung| rung.value)
            .unwrap_or(self.floor)
    }

    pub fn rungs(&self) -> &[Rung<T>] {
        &self.rungs
    }

    pub fn floor(&self) -> T {
        self.floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_ladder_excludes_the_boundary() {
        let ladder = ThresholdLadder::above(&[(0.10, 2.0), (0.15, 3.0), (0.05, 1.0)], 0.0);
        assert_eq!(ladder.resolve(0.20), 3.0);
        assert_eq!(ladder.resolve(0.15), 2.0);
        assert_eq!(ladder.resolve(0.051), 1.0);
        assert_eq!(ladder.resolve(0.05), 0.0);
        assert_eq!(ladder.resolve(f64::NAN), 0.0);
    }

    #[test]
    fn inclusive_ladder_includes_the_boundary() {
        let ladder = ThresholdLadder::at_least(&[(0.8, 'A'), (0.6, 'B')], 'C');
        assert_eq!(ladder.resolve(0.8), 'A');
        assert_eq!(ladder.resolve(0.6), 'B');
        assert_eq!(ladder.resolve(0.59), 'C');
        assert_eq!(ladder.rungs()[0].threshold, 0.8);
    }
}
