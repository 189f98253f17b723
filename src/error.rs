//! Synthesis errors.
//!
//! Two classes of failure exist inside the synthesis pipeline:
//! - malformed functions (empty minterms, undeclared literals, terms that do not
//!   depend on any input, cyclic definitions), and
//! - lookup-consistency violations (a label or nanowire missing from a structure
//!   that should contain it), which indicate a bug rather than bad input.
//!
//! Synthesis is deterministic, so a failing function always fails the same way.

use thiserror::Error;

use crate::crossbar::Axis;
use crate::types::Level;
use crate::voltage::{Nanowire, Stage};

pub type Result<T> = std::result::Result<T, SynthError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthError {
    /// A product term with no literals.
    #[error("output '{output}' has a minterm with no literals")]
    EmptyMinterm { output: String },

    /// A literal that is neither an input, an output, nor an output complement.
    #[error("output '{output}' references undeclared literal '{literal}'")]
    UndeclaredLiteral { output: String, literal: String },

    /// Minterms keyed by a name missing from the output list.
    #[error("minterms given for undeclared output '{output}'")]
    UndeclaredOutput { output: String },

    /// A term with no dependency path down to a primary input.
    #[error("term '{term}' does not depend on any primary input")]
    UnreachableTerm { term: String },

    /// A term whose definition eventually references itself.
    #[error("cyclic dependency through term '{term}'")]
    CyclicDependency { term: String },

    #[error("label '{label}' is missing from the {axis} index of level {level}")]
    MissingLabel { label: String, axis: Axis, level: Level },

    #[error("label '{label}' appears twice in the {axis} index of level {level}")]
    DuplicateLabel { label: String, axis: Axis, level: Level },

    #[error("nanowire {nanowire} has no voltage in stage {stage} of level {level}")]
    MissingVoltage {
        nanowire: Nanowire,
        stage: Stage,
        level: Level,
    },
}
