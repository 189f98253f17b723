//! Decomposition of a multi-level function into per-level crossbars.
//!
//! The function is levelized (see [`graph`][crate::graph]) and every level above
//! the inputs is carved into an independent two-level sub-function:
//! - outputs: the terms at that level, in node order,
//! - inputs: every term those outputs reference, each followed by its complement,
//!   in first-seen order,
//! - minterms: the minterms of those outputs.
//!
//! Each sub-function becomes one [`LevelUnit`] holding its crossbar, voltage
//! schedule and switching-activity estimate. Units are kept in ascending level
//! order: the crossbar of level `d` consumes the outputs of level `d - 1`.
//!
//! Carving is sequential. Once every sub-function is known, the units are
//! synthesized independently, in parallel unless disabled in [`SynthConfig`].
//!
//! ```
//! use xbar_rs::decompose::{synthesize, SynthConfig};
//! use xbar_rs::function::{Function, Minterm};
//!
//! let mut f = Function::default();
//! f.add_inputs(["a", "b", "not_a", "not_b"]);
//! f.add_output("z");
//! f.add_minterm("z", Minterm::new(["a", "b"]));
//! f.add_minterm("z", Minterm::new(["not_a", "not_b"]));
//!
//! let circuit = synthesize(&f, &SynthConfig::default()).unwrap();
//! assert_eq!(circuit.num_crossbars(), 1);
//! assert_eq!(circuit.units()[0].crossbar().num_devices(), 12);
//! ```

use indexmap::IndexSet;
use log::{debug, info};
use rayon::prelude::*;

use crate::activity::SwitchingActivity;
use crate::crossbar::Crossbar;
use crate::error::Result;
use crate::function::{complement, Function};
use crate::graph::{DependencyGraph, Levels};
use crate::stats::CircuitStats;
use crate::types::Level;
use crate::voltage::Schedule;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SynthConfig {
    /// Build and levelize a dependency graph for every per-level sub-function.
    pub deep_graphs: bool,
    /// Synthesize the levels in parallel once they are carved.
    pub parallel: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            deep_graphs: false,
            parallel: true,
        }
    }
}

impl SynthConfig {
    pub fn with_deep_graphs(mut self, deep_graphs: bool) -> Self {
        self.deep_graphs = deep_graphs;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Dependency graph of a sub-function, with its levels.
#[derive(Debug, Clone)]
pub struct LevelGraph {
    pub graph: DependencyGraph,
    pub levels: Levels,
}

/// One synthesized level: a two-level sub-function and its crossbar.
#[derive(Debug, Clone)]
pub struct LevelUnit {
    level: Level,
    function: Function,
    crossbar: Crossbar,
    schedule: Schedule,
    activity: SwitchingActivity,
    graph: Option<LevelGraph>,
}

impl LevelUnit {
    /// Synthesizes the crossbar, schedule and activity estimate of `function`.
    pub fn synthesize(level: Level, function: Function, config: &SynthConfig) -> Result<Self> {
        function.validate()?;

        let graph = if config.deep_graphs {
            let graph = DependencyGraph::build(&function)?;
            let levels = graph.levelize(&function)?;
            Some(LevelGraph { graph, levels })
        } else {
            None
        };

        let crossbar = Crossbar::synthesize(&function, level)?;
        let schedule = Schedule::generate(&function, &crossbar)?;
        let activity = SwitchingActivity::estimate(&function);

        info!(
            "level {}: {} outputs, {}x{} crossbar, {} devices",
            level,
            function.num_outputs(),
            crossbar.height(),
            crossbar.width(),
            crossbar.num_devices()
        );

        Ok(Self {
            level,
            function,
            crossbar,
            schedule,
            activity,
            graph,
        })
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn crossbar(&self) -> &Crossbar {
        &self.crossbar
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn activity(&self) -> &SwitchingActivity {
        &self.activity
    }

    /// The sub-function graph, present only with [`SynthConfig::deep_graphs`].
    pub fn graph(&self) -> Option<&LevelGraph> {
        self.graph.as_ref()
    }
}

/// A synthesized multi-level function.
#[derive(Debug, Clone)]
pub struct Circuit {
    function: Function,
    graph: DependencyGraph,
    levels: Levels,
    units: Vec<LevelUnit>,
}

impl Circuit {
    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    /// Units in ascending level order.
    pub fn units(&self) -> &[LevelUnit] {
        &self.units
    }

    pub fn num_crossbars(&self) -> usize {
        self.units.len()
    }

    pub fn stats(&self) -> CircuitStats {
        CircuitStats::collect(&self.function, &self.units)
    }
}

/// Carves the sub-function of `level`.
pub fn carve(func: &Function, graph: &DependencyGraph, levels: &Levels, level: Level) -> Function {
    let nodes = levels.get(level);

    let mut referenced = IndexSet::new();
    for &id in nodes {
        for &target in graph.successors(id) {
            referenced.insert(graph.name(target));
        }
    }

    let mut sub = Function::default();
    for name in referenced {
        sub.add_input(name);
        sub.add_input(complement(name));
    }
    for &id in nodes {
        let output = graph.name(id);
        sub.add_output(output);
        for minterm in func.minterms_of(output) {
            sub.add_minterm(output, minterm.clone());
        }
    }

    debug!("sub-function of level {}:\n{}", level, sub);
    sub
}

/// Levelizes `func` and synthesizes one crossbar per level above the inputs.
pub fn synthesize(func: &Function, config: &SynthConfig) -> Result<Circuit> {
    func.validate()?;
    let graph = DependencyGraph::build(func)?;
    let levels = graph.levelize(func)?;

    let carved: Vec<(Level, Function)> = levels
        .synthesizable()
        .map(|(level, _)| (level, carve(func, &graph, &levels, level)))
        .collect();
    debug!("carved {} levels (max level {})", carved.len(), levels.max_level());

    let units = if config.parallel {
        carved
            .into_par_iter()
            .map(|(level, sub)| LevelUnit::synthesize(level, sub, config))
            .collect::<Result<Vec<_>>>()?
    } else {
        carved
            .into_iter()
            .map(|(level, sub)| LevelUnit::synthesize(level, sub, config))
            .collect::<Result<Vec<_>>>()?
    };

    Ok(Circuit {
        function: func.clone(),
        graph,
        levels,
        units,
    })
}
