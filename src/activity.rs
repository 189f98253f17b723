//! Switching-activity estimation.
//!
//! Estimates, for one crossbar, how many workload-dependent devices switch during
//! an evaluation, in the best and in the worst case, without simulating any input
//! vector.
//!
//! For every input, the polarity occurring in more distinct minterms is the
//! *majority* polarity (ties go to the base, non-complemented polarity) and the
//! other one is the *minority* polarity. Driving the majority polarity switches
//! the most NAND-stage devices, so the worst NAND bound sums majority counts and
//! the best NAND bound sums minority counts.
//!
//! The AND stage is then bounded from the minterm table:
//! - worst case: minterms whose literals all belong to the minority set switch;
//!   every other minterm adds one to the worst-case error,
//! - best case: minterms whose literals all belong to the majority set switch;
//!   their number is also the best-case error.

use std::collections::BTreeSet;

use log::debug;

use crate::function::{complement, strip_complement, Function};

/// Switching bounds of one crossbar, in units of `(Cup+Cdown)`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct SwitchingActivity {
    /// NAND-stage devices switching in the worst case.
    pub nand_worst: usize,
    /// NAND-stage devices switching in the best case.
    pub nand_best: usize,
    /// AND-stage devices switching in the worst case.
    pub and_worst: usize,
    /// AND-stage devices switching in the best case.
    pub and_best: usize,
    /// Minterms not covered by the worst-case assignment.
    pub worst_error: usize,
}

impl SwitchingActivity {
    pub fn estimate(func: &Function) -> Self {
        let mut majority = BTreeSet::new();
        let mut minority = BTreeSet::new();
        let mut activity = Self::default();

        for input in func.inputs() {
            let positive = strip_complement(input).to_string();
            let negative = complement(&positive);
            let positive_count = func.literal_occurrences(&positive);
            let negative_count = func.literal_occurrences(&negative);

            let (major, minor, major_count, minor_count) = if negative_count > positive_count {
                (negative, positive, negative_count, positive_count)
            } else {
                (positive, negative, positive_count, negative_count)
            };

            // An input and its complement describe the same pair.
            if minority.insert(minor) {
                majority.insert(major);
                activity.nand_worst += major_count;
                activity.nand_best += minor_count;
            }
        }

        for (_, minterm) in func.entries() {
            if minterm.literals().iter().all(|l| minority.contains(l)) {
                activity.and_worst += 1;
            } else {
                activity.worst_error += 1;
            }
            if minterm.literals().iter().all(|l| majority.contains(l)) {
                activity.and_best += 1;
            }
        }

        debug!("switching activity: {:?}", activity);
        activity
    }

    /// Workload-dependent switching, worst case.
    pub fn worst_case(&self) -> usize {
        self.nand_worst + self.and_worst
    }

    /// Workload-dependent switching, best case.
    pub fn best_case(&self) -> usize {
        self.nand_best + self.and_best
    }

    pub fn worst_case_error(&self) -> usize {
        self.worst_error
    }

    /// Minterms fully covered by the best-case assignment.
    pub fn best_case_coverage(&self) -> usize {
        self.and_best
    }
}
