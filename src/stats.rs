//! Circuit-wide statistics.
//!
//! [`CircuitStats::collect`] folds over the ordered level units. Device count,
//! area and distinct minterms are summed over the units. Every crossbar runs
//! [`STATES_PER_CROSSBAR`] FSM states, so the step count is the number of
//! crossbars times that constant.
//!
//! Switching estimates add, per unit, the workload-independent devices (half
//! the unit inputs, since complements share a driver, plus one per output) to
//! the workload-dependent bounds of [`SwitchingActivity`].
//!
//! [`SwitchingActivity`]: crate::activity::SwitchingActivity

use std::fmt;

use crate::decompose::LevelUnit;
use crate::function::Function;
use crate::voltage::STATES_PER_CROSSBAR;

/// Unit of the switching estimates.
pub const SWITCHING_UNIT: &str = "× (Cup+Cdown)";

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct CircuitStats {
    /// Primary inputs, complements not counted.
    pub inputs: usize,
    pub outputs: usize,
    /// Distinct minterms, summed over the crossbars.
    pub minterms: usize,
    pub devices: usize,
    /// Total area in crossbar cells.
    pub area: usize,
    pub crossbars: usize,
    pub steps: usize,
    pub worst_case: usize,
    pub worst_case_error: usize,
    pub best_case: usize,
    pub best_case_error: usize,
}

impl CircuitStats {
    pub fn collect(function: &Function, units: &[LevelUnit]) -> Self {
        let init = Self {
            inputs: function.num_inputs() / 2,
            outputs: function.num_outputs(),
            ..Self::default()
        };
        units.iter().fold(init, |mut stats, unit| {
            let sub = unit.function();
            let crossbar = unit.crossbar();
            let activity = unit.activity();
            let fixed = sub.num_inputs() / 2 + sub.num_outputs();

            stats.minterms += sub.num_distinct_minterms();
            stats.devices += crossbar.num_devices();
            stats.area += crossbar.area();
            stats.crossbars += 1;
            stats.steps += STATES_PER_CROSSBAR;
            stats.worst_case += fixed + activity.worst_case();
            stats.best_case += fixed + activity.best_case();
            stats.worst_case_error += activity.worst_case_error();
            stats.best_case_error += activity.best_case_coverage();
            stats
        })
    }
}

impl fmt::Display for CircuitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Inputs: {}", self.inputs)?;
        writeln!(f, "Outputs: {}", self.outputs)?;
        writeln!(f, "Minterms: {}", self.minterms)?;
        writeln!(f, "Number of memristors of the circuit: {}", self.devices)?;
        writeln!(
            f,
            "Total area of the circuit: k^2 * {} (where k^2 = area of a crossbar's cell)",
            self.area
        )?;
        writeln!(f, "Number of steps (memristor switching) to complete computation: {}", self.steps)?;
        writeln!(f, "Number of crossbars: {}", self.crossbars)?;
        writeln!(f, "Estimated power consumption (worst case): {} {}", self.worst_case, SWITCHING_UNIT)?;
        writeln!(f, "Estimated error (worst case): {} {}", self.worst_case_error, SWITCHING_UNIT)?;
        writeln!(f, "Estimated power consumption (best case): {} {}", self.best_case, SWITCHING_UNIT)?;
        writeln!(f, "Estimated error (best case): {} {}", self.best_case_error, SWITCHING_UNIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::decompose::{synthesize, SynthConfig};
    use crate::function::Minterm;

    fn xnor() -> Function {
        let mut f = Function::default();
        f.add_inputs(["a", "b", "not_a", "not_b"]);
        f.add_output("z");
        f.add_minterm("z", Minterm::new(["a", "b"]));
        f.add_minterm("z", Minterm::new(["not_a", "not_b"]));
        f
    }

    fn two_level() -> Function {
        let mut f = Function::default();
        f.add_inputs(["a", "b", "c", "not_a", "not_b", "not_c"]);
        f.add_outputs(["x", "y"]);
        f.add_minterm("x", Minterm::new(["a", "b"]));
        f.add_minterm("y", Minterm::new(["x", "c"]));
        f.add_minterm("y", Minterm::new(["not_x", "not_c"]));
        f
    }

    #[test]
    fn test_xnor_stats() {
        let stats = synthesize(&xnor(), &SynthConfig::default()).unwrap().stats();
        assert_eq!(stats.inputs, 2);
        assert_eq!(stats.outputs, 1);
        assert_eq!(stats.minterms, 2);
        assert_eq!(stats.devices, 12);
        assert_eq!(stats.area, 24);
        assert_eq!(stats.crossbars, 1);
        assert_eq!(stats.steps, 7);
        assert_eq!(stats.worst_case, 6);
        assert_eq!(stats.best_case, 6);
        assert_eq!(stats.worst_case_error, 1);
        assert_eq!(stats.best_case_error, 1);
    }

    #[test]
    fn test_two_level_stats() {
        let stats = synthesize(&two_level(), &SynthConfig::default()).unwrap().stats();
        assert_eq!(stats.inputs, 3);
        assert_eq!(stats.outputs, 2);
        assert_eq!(stats.minterms, 3);
        assert_eq!(stats.devices, 21);
        assert_eq!(stats.area, 42);
        assert_eq!(stats.crossbars, 2);
        assert_eq!(stats.steps, 14);
        assert_eq!(stats.worst_case, 11);
        assert_eq!(stats.best_case, 10);
        assert_eq!(stats.worst_case_error, 2);
        assert_eq!(stats.best_case_error, 2);
    }

    #[test]
    fn test_empty_fold() {
        let stats = CircuitStats::collect(&xnor(), &[]);
        assert_eq!(stats.inputs, 2);
        assert_eq!(stats.crossbars, 0);
        assert_eq!(stats.steps, 0);
        assert_eq!(stats.devices, 0);
    }

    #[test]
    fn test_report() {
        let stats = synthesize(&xnor(), &SynthConfig::default()).unwrap().stats();
        let report = stats.to_string();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "Inputs: 2");
        assert_eq!(lines[3], "Number of memristors of the circuit: 12");
        assert_eq!(
            lines[4],
            "Total area of the circuit: k^2 * 24 (where k^2 = area of a crossbar's cell)"
        );
        assert_eq!(lines[5], "Number of steps (memristor switching) to complete computation: 7");
        assert_eq!(lines[7], "Estimated power consumption (worst case): 6 × (Cup+Cdown)");
        assert_eq!(lines[10], "Estimated error (best case): 1 × (Cup+Cdown)");
    }
}
