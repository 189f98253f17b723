//! Voltage schedules driving a crossbar evaluation.
//!
//! One evaluation of a crossbar runs six [`Stage`]s in a fixed order. In each
//! stage every row and column [`Nanowire`] receives one logical [`Voltage`]. The
//! nanowires of a crossbar fall into six roles, and each stage assigns one
//! voltage per role:
//!
//! | Stage             | IL row | minterm rows | output rows | input cols | output cols | complement cols |
//! |-------------------|--------|--------------|-------------|------------|-------------|-----------------|
//! | reset             | Vw     | Vw           | Vw          | zero       | zero        | zero            |
//! | receive inputs    | zero   | Vr           | Vr          | Z          | Vr          | Vr              |
//! | compute minterms  | Vw     | zero         | Vr          | Z          | Vr          | Vr              |
//! | evaluate NAND     | Vr     | Z            | Vr          | Vr         | Vr          | Vw              |
//! | evaluate AND      | Vr     | Vw           | zero        | Vr         | Vr          | Z               |
//! | invert            | Vr     | Vr           | Z           | Vr         | Vw          | Vr              |
//!
//! Floating (`Z`) entries are kept as such in the schedule. What a floating
//! nanowire is actually driven with depends on the stage and on the previous
//! stage; see [`Schedule::drive`].

use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::crossbar::{Axis, Crossbar, CrossbarIndex};
use crate::error::{Result, SynthError};
use crate::function::{complement, is_complement, strip_complement, Function};
use crate::types::Level;

/// Logical voltage level of a nanowire.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Voltage {
    /// Write voltage (`Vw`).
    WriteHigh,
    /// Negative write voltage (`Vw_neg`).
    WriteLow,
    /// Read voltage (`Vr`).
    Read,
    /// High impedance (`Z`).
    Floating,
    /// Ground (`zero`).
    Zero,
}

impl Voltage {
    /// Symbol used by the memristor model library.
    pub fn symbol(self) -> &'static str {
        match self {
            Voltage::WriteHigh => "Vw",
            Voltage::WriteLow => "Vw_neg",
            Voltage::Read => "Vr",
            Voltage::Floating => "Z",
            Voltage::Zero => "zero",
        }
    }
}

impl fmt::Display for Voltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Evaluation stage. The derived order is the evaluation order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Stage {
    Reset,
    ReceiveInputs,
    ComputeMinterms,
    EvaluateNand,
    EvaluateAnd,
    Invert,
}

/// Number of controller states per crossbar: one idle state plus the six stages.
pub const STATES_PER_CROSSBAR: usize = Stage::ALL.len() + 1;

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Reset,
        Stage::ReceiveInputs,
        Stage::ComputeMinterms,
        Stage::EvaluateNand,
        Stage::EvaluateAnd,
        Stage::Invert,
    ];

    /// Controller state name; the letter prefix keeps lexicographic order equal
    /// to evaluation order.
    pub fn tag(self) -> &'static str {
        match self {
            Stage::Reset => "A_INA",
            Stage::ReceiveInputs => "B_RI",
            Stage::ComputeMinterms => "C_CFM",
            Stage::EvaluateNand => "D_EVM",
            Stage::EvaluateAnd => "E_EVR",
            Stage::Invert => "F_INR",
        }
    }

    pub fn previous(self) -> Option<Stage> {
        let pos = Self::ALL.iter().position(|&s| s == self)?;
        pos.checked_sub(1).map(|p| Self::ALL[p])
    }

    /// Voltages per role, in the order: input line, minterm rows, output rows,
    /// input columns, output columns, complement columns.
    fn pattern(self) -> [Voltage; 6] {
        use Voltage::*;
        match self {
            Stage::Reset => [WriteHigh, WriteHigh, WriteHigh, Zero, Zero, Zero],
            Stage::ReceiveInputs => [Zero, Read, Read, Floating, Read, Read],
            Stage::ComputeMinterms => [WriteHigh, Zero, Read, Floating, Read, Read],
            Stage::EvaluateNand => [Read, Floating, Read, Read, Read, WriteHigh],
            Stage::EvaluateAnd => [Read, WriteHigh, Zero, Read, Read, Floating],
            Stage::Invert => [Read, Read, Floating, Read, WriteHigh, Read],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A row (horizontal) or column (vertical) nanowire.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Nanowire {
    Row(usize),
    Column(usize),
}

impl fmt::Display for Nanowire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nanowire::Row(i) => write!(f, "XbG_H{}", i),
            Nanowire::Column(i) => write!(f, "XbG_V{}", i),
        }
    }
}

/// How a nanowire is actually driven once floating entries are resolved.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Drive {
    /// Drive the voltage as scheduled.
    Fixed(Voltage),
    /// Driven from an input bit of the previous level: [`Voltage::WriteLow`] when
    /// the represented literal is asserted, else [`Voltage::WriteHigh`].
    External { input: String, complemented: bool },
    /// Read for a short settling interval, then float.
    SettleThenRelease,
    /// Float immediately.
    Release,
}

impl Drive {
    /// Resolves an [`External`][Drive::External] drive for a value of its input.
    /// Other drives are returned as their steady voltage.
    pub fn voltage_for(&self, input_value: bool) -> Voltage {
        match self {
            Drive::Fixed(v) => *v,
            Drive::External { complemented, .. } => {
                if input_value != *complemented {
                    Voltage::WriteLow
                } else {
                    Voltage::WriteHigh
                }
            }
            Drive::SettleThenRelease | Drive::Release => Voltage::Floating,
        }
    }
}

/// Nanowires grouped by role.
struct Roles {
    input_line: Vec<usize>,
    minterm_rows: Vec<usize>,
    output_rows: Vec<usize>,
    input_columns: Vec<usize>,
    output_columns: Vec<usize>,
    complement_columns: Vec<usize>,
}

impl Roles {
    fn new(func: &Function, index: &CrossbarIndex) -> Result<Self> {
        let mut minterm_rows = Vec::new();
        for minterm in func.distinct_minterms() {
            minterm_rows.push(index.minterm_row(minterm)?);
        }
        let mut roles = Self {
            input_line: vec![index.input_line()],
            minterm_rows,
            output_rows: Vec::new(),
            input_columns: Vec::new(),
            output_columns: Vec::new(),
            complement_columns: Vec::new(),
        };
        for input in func.inputs() {
            roles.input_columns.push(index.require_column(input)?);
        }
        for output in func.outputs() {
            let not_output = complement(output);
            roles.output_rows.push(index.require_row(&not_output)?);
            roles.output_columns.push(index.require_column(output)?);
            roles.complement_columns.push(index.require_column(&not_output)?);
        }
        Ok(roles)
    }

    fn wires(&self) -> [Vec<Nanowire>; 6] {
        let rows = |v: &[usize]| -> Vec<Nanowire> { v.iter().map(|&i| Nanowire::Row(i)).collect() };
        let columns = |v: &[usize]| -> Vec<Nanowire> { v.iter().map(|&i| Nanowire::Column(i)).collect() };
        [
            rows(&self.input_line),
            rows(&self.minterm_rows),
            rows(&self.output_rows),
            columns(&self.input_columns),
            columns(&self.output_columns),
            columns(&self.complement_columns),
        ]
    }
}

/// The voltage of every nanowire in every stage of one crossbar.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Schedule {
    level: Level,
    stages: BTreeMap<Stage, BTreeMap<Nanowire, Voltage>>,
}

impl Schedule {
    /// Generates the six stages for `crossbar`, which must have been synthesized
    /// from `func`.
    ///
    /// Fails with [`SynthError::MissingVoltage`] if a nanowire is left without a
    /// voltage in some stage.
    pub fn generate(func: &Function, crossbar: &Crossbar) -> Result<Self> {
        let level = crossbar.level();
        let roles = Roles::new(func, crossbar.index())?;
        let wires = roles.wires();

        let mut stages = BTreeMap::new();
        for stage in Stage::ALL {
            let mut voltages = BTreeMap::new();
            for (group, voltage) in wires.iter().zip(stage.pattern()) {
                for &wire in group {
                    voltages.insert(wire, voltage);
                }
            }
            let rows = (0..crossbar.height()).map(Nanowire::Row);
            let columns = (0..crossbar.width()).map(Nanowire::Column);
            if let Some(nanowire) = rows.chain(columns).find(|w| !voltages.contains_key(w)) {
                return Err(SynthError::MissingVoltage { nanowire, stage, level });
            }
            stages.insert(stage, voltages);
        }

        let schedule = Self { level, stages };
        debug!("voltages of level {}:\n{}", level, schedule);
        Ok(schedule)
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Stages in evaluation order.
    pub fn stages(&self) -> impl Iterator<Item = (Stage, &BTreeMap<Nanowire, Voltage>)> {
        self.stages.iter().map(|(&stage, voltages)| (stage, voltages))
    }

    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn voltage(&self, stage: Stage, wire: Nanowire) -> Option<Voltage> {
        self.stages.get(&stage)?.get(&wire).copied()
    }

    /// Resolves how `wire` is driven in `stage`.
    ///
    /// Non-floating voltages are driven as scheduled. A floating column in the
    /// receive-inputs stage is driven from the input bit it represents. A floating
    /// nanowire in any other stage is first read for a settling interval and then
    /// released, unless the previous stage wrote it high, in which case it is
    /// released immediately.
    pub fn drive(&self, stage: Stage, wire: Nanowire, index: &CrossbarIndex) -> Result<Drive> {
        let voltage = self.voltage(stage, wire).ok_or(SynthError::MissingVoltage {
            nanowire: wire,
            stage,
            level: self.level,
        })?;
        if voltage != Voltage::Floating {
            return Ok(Drive::Fixed(voltage));
        }

        if let (Stage::ReceiveInputs, Nanowire::Column(column)) = (stage, wire) {
            let label = index.column_label(column).ok_or_else(|| SynthError::MissingLabel {
                label: wire.to_string(),
                axis: Axis::Column,
                level: self.level,
            })?;
            return Ok(Drive::External {
                input: strip_complement(label).to_string(),
                complemented: is_complement(label),
            });
        }

        match stage.previous().and_then(|prev| self.voltage(prev, wire)) {
            Some(Voltage::WriteHigh) => Ok(Drive::Release),
            _ => Ok(Drive::SettleThenRelease),
        }
    }

    /// Resolved drives of every nanowire in `stage`, rows first.
    pub fn drives(&self, stage: Stage, index: &CrossbarIndex) -> Result<Vec<(Nanowire, Drive)>> {
        let Some(voltages) = self.stages.get(&stage) else {
            return Ok(Vec::new());
        };
        voltages
            .keys()
            .map(|&wire| self.drive(stage, wire, index).map(|drive| (wire, drive)))
            .collect()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (stage, voltages) in self.stages() {
            writeln!(f, "Stage {}:", stage)?;
            for (wire, voltage) in voltages.iter() {
                writeln!(f, "{}={}", wire, voltage)?;
            }
        }
        Ok(())
    }
}
