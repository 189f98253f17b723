//! Behavioral VHDL for a synthesized circuit.
//!
//! Every level unit is rendered as three design units:
//! - `crossbar_structure_<L>`: a package holding the device matrix,
//! - `crossbar_<L>`: the crossbar, one memristor instance per device,
//! - `crossbar_controller_<L>`: the FSM driving the nanowires through the
//!   [`Schedule`] stages.
//!
//! A top-level entity chains the controllers: the `en` input of level `d` is the
//! `done` output of level `d - 1`, and level 1 is enabled by a pulse whenever a
//! primary input changes.
//!
//! The emitter only renders text. Writing the files is left to the caller.
//!
//! [`Schedule`]: crate::voltage::Schedule

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write as _};
use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::crossbar::Crossbar;
use crate::decompose::{Circuit, LevelUnit};
use crate::error::SynthError;
use crate::function::{is_complement, Function};
use crate::voltage::{Drive, Nanowire, Stage};

/// VHDL-93 reserved words.
pub const VHDL_KEYWORDS: &[&str] = &[
    "abs", "access", "after", "alias", "all", "and", "architecture", "array", "assert", "attribute", "begin", "block",
    "body", "buffer", "bus", "case", "component", "configuration", "constant", "disconnect", "downto", "else", "elsif",
    "end", "entity", "exit", "file", "for", "function", "generate", "generic", "group", "guarded", "if", "impure", "in",
    "inertial", "inout", "is", "label", "library", "linkage", "literal", "loop", "map", "mod", "nand", "new", "next",
    "nor", "not", "null", "of", "on", "open", "or", "others", "out", "package", "port", "postponed", "procedure",
    "process", "pure", "range", "record", "register", "reject", "rem", "report", "return", "rol", "ror", "select",
    "severity", "signal", "shared", "sla", "sll", "sra", "srl", "subtype", "then", "to", "transport", "type",
    "unaffected", "units", "until", "use", "variable", "wait", "when", "while", "with", "xnor", "xor",
];

/// Identifiers declared by the generated code itself.
pub const GENERATED_IDENTIFIERS: &[&str] = &[
    "en", "done", "clk", "clk_period", "state", "next_state", "output", "output_temp", "vpos", "vneg",
    "vpos_temp", "vneg_temp",
];

/// Prefix given to reserved and generated names.
pub const NAME_PREFIX: &str = "XbG_";

#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Synth(#[from] SynthError),
    #[error("formatting failed")]
    Format(#[from] fmt::Error),
}

pub type Result<T> = std::result::Result<T, EmitError>;

/// Turns signal names into legal VHDL identifiers.
///
/// Results are memoized, so a name is rewritten the same way in every file
/// emitted by one emitter.
#[derive(Debug, Clone)]
pub struct NameSanitizer {
    reserved: HashSet<String>,
    cache: HashMap<String, String>,
    generated: usize,
}

impl Default for NameSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NameSanitizer {
    /// A sanitizer reserving the VHDL keywords and the generated identifiers.
    pub fn new() -> Self {
        let mut sanitizer = Self::empty();
        sanitizer.add_reserved_words(VHDL_KEYWORDS.iter().copied());
        sanitizer.add_reserved_words(GENERATED_IDENTIFIERS.iter().copied());
        sanitizer
    }

    /// A sanitizer without reserved words.
    pub fn empty() -> Self {
        Self {
            reserved: HashSet::new(),
            cache: HashMap::new(),
            generated: 0,
        }
    }

    pub fn add_reserved_words<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim();
            if !word.is_empty() {
                self.reserved.insert(word.to_ascii_lowercase());
            }
        }
        self.cache.clear();
    }

    /// Adds the reserved words listed in `path`, one per line.
    pub fn load_reserved_words(&mut self, path: impl AsRef<Path>) -> io::Result<()> {
        let text = fs::read_to_string(path)?;
        self.add_reserved_words(text.lines());
        Ok(())
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(&name.to_ascii_lowercase())
    }

    pub fn sanitize(&mut self, name: &str) -> String {
        if let Some(clean) = self.cache.get(name) {
            return clean.clone();
        }

        let mut s: String = name
            .chars()
            .map(|c| if matches!(c, '[' | ']' | '<' | '>' | '.') { '_' } else { c })
            .collect();
        while s.contains("__") {
            s = s.replace("__", "_");
        }
        loop {
            let trimmed = s
                .trim_end_matches('_')
                .trim_start_matches('_')
                .trim_start_matches('-')
                .trim_start_matches(|c: char| c.is_ascii_digit());
            if trimmed.len() == s.len() {
                break;
            }
            s = trimmed.to_string();
        }

        if s.is_empty() {
            s = format!("{}sig{}", NAME_PREFIX, self.generated);
            self.generated += 1;
        } else if self.is_reserved(&s) {
            s = format!("{}{}", NAME_PREFIX, s);
        }

        if s != name {
            debug!("renamed signal '{}' to '{}'", name, s);
        }
        self.cache.insert(name.to_string(), s.clone());
        s
    }
}

/// One emitted VHDL source file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct VhdlFile {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Clone, Default)]
pub struct VhdlEmitter {
    sanitizer: NameSanitizer,
}

const HEADER: &str = "\
----------------------------------------------------------------------------------
-- Generated by xbargen
----------------------------------------------------------------------------------
";

const LIBRARIES: &str = "\
library IEEE;
use IEEE.STD_LOGIC_1164.ALL;
";

const MEMRISTOR_LIBRARY: &str = "\
library memristor_lib;
use memristor_lib.types.all;
";

fn structure_name(unit: &LevelUnit) -> String {
    format!("crossbar_structure_{}", unit.level())
}

fn crossbar_name(unit: &LevelUnit) -> String {
    format!("crossbar_{}", unit.level())
}

fn controller_name(unit: &LevelUnit) -> String {
    format!("crossbar_controller_{}", unit.level())
}

/// Non-complemented inputs, the ones with a port.
fn base_inputs(func: &Function) -> impl Iterator<Item = &str> {
    func.inputs().iter().map(String::as_str).filter(|i| !is_complement(i))
}

impl VhdlEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sanitizer(sanitizer: NameSanitizer) -> Self {
        Self { sanitizer }
    }

    /// Renders every file of `circuit`: three per level, then the top level
    /// `<entity>.vhd`.
    pub fn emit(&mut self, circuit: &Circuit, entity: &str) -> Result<Vec<VhdlFile>> {
        let mut files = Vec::with_capacity(3 * circuit.num_crossbars() + 1);
        for unit in circuit.units() {
            files.push(VhdlFile {
                name: format!("{}.vhd", structure_name(unit)),
                contents: self.structure(unit)?,
            });
            files.push(VhdlFile {
                name: format!("{}.vhd", crossbar_name(unit)),
                contents: self.crossbar(unit)?,
            });
            files.push(VhdlFile {
                name: format!("controller_{}.vhd", unit.level()),
                contents: self.controller(unit)?,
            });
        }
        files.push(VhdlFile {
            name: format!("{}.vhd", entity),
            contents: self.top_level(circuit, entity)?,
        });
        debug!("emitted {} VHDL files", files.len());
        Ok(files)
    }

    /// The package holding the device matrix of `unit`.
    pub fn structure(&self, unit: &LevelUnit) -> Result<String> {
        let name = structure_name(unit);
        let crossbar: &Crossbar = unit.crossbar();

        let mut out = String::new();
        out.push_str(HEADER);
        out.push_str(LIBRARIES);
        writeln!(out)?;
        writeln!(out, "package {} is", name)?;
        writeln!(out)?;
        writeln!(out, "constant cb_height : integer := {};", crossbar.height())?;
        writeln!(out, "constant cb_width : integer := {};", crossbar.width())?;
        writeln!(out)?;
        writeln!(out, "type matrix_row is array (0 to cb_width-1) of integer;")?;
        writeln!(out)?;
        writeln!(out, "type matrix is array (0 to cb_height-1) of matrix_row;")?;
        writeln!(out)?;
        writeln!(out, "constant cb_structure : matrix := (")?;
        let rows: Vec<String> = crossbar
            .matrix()
            .iter_rows()
            .map(|row| {
                let cells: Vec<String> = row.iter().map(u32::to_string).collect();
                format!("\t\t\t\t\t({})", cells.join(","))
            })
            .collect();
        writeln!(out, "{}", rows.join(",\n"))?;
        writeln!(out, ");")?;
        writeln!(out, "end {};", name)?;
        Ok(out)
    }

    /// The crossbar entity of `unit`: one memristor per device.
    pub fn crossbar(&self, unit: &LevelUnit) -> Result<String> {
        let name = crossbar_name(unit);
        let num_outputs = unit.function().num_outputs();

        let mut out = String::new();
        out.push_str(HEADER);
        out.push_str(LIBRARIES);
        writeln!(out, "use ieee.numeric_std.all;")?;
        writeln!(out)?;
        out.push_str(MEMRISTOR_LIBRARY);
        writeln!(out)?;
        writeln!(out, "use work.{}.all;", structure_name(unit))?;
        writeln!(out)?;
        writeln!(out, "entity {} is", name)?;
        writeln!(out, "Port (")?;
        writeln!(out, "Vpos : in  voltage_vector (0 to cb_width-1);")?;
        writeln!(out, "Vneg : in  voltage_vector (0 to cb_height-1);")?;
        writeln!(out, "output : out STD_LOGIC_VECTOR(0 to {}) -- {} outputs", num_outputs - 1, num_outputs)?;
        writeln!(out, ");")?;
        writeln!(out, "end {};", name)?;
        writeln!(out)?;
        writeln!(out, "architecture Behavioral of {} is", name)?;
        out.push_str(
            "
COMPONENT Memristor_behavioral_Snider_internal_clock
PORT(
Vpos : INOUT voltage;
Vneg : INOUT voltage;
Rout : OUT std_logic
);
END COMPONENT;

COMPONENT Memristor_behavioral_Snider_internal_clock_noOutput
PORT(
Vpos : INOUT voltage;
Vneg : INOUT voltage
);
END COMPONENT;

signal verticalWires : voltage_vector (0 to cb_width-1);
signal horizontalWires : voltage_vector (0 to cb_height-1);

begin

verticalWires <= Vpos;
horizontalWires <= Vneg;
rows : for i in cb_height-1 downto 0 generate

columns : for j in cb_width-1 downto 0 generate

check: if (cb_structure(i)(j)=1) generate
memristor_row : Memristor_behavioral_Snider_internal_clock_noOutput PORT MAP(
Vpos => verticalWires(j),
Vneg => horizontalWires(i)
);
end generate check;

check_output: if (cb_structure(i)(j)>1) generate
memristor_row : Memristor_behavioral_Snider_internal_clock PORT MAP(
Vpos => verticalWires(j),
Vneg => horizontalWires(i),
Rout => output(cb_structure(i)(j)-2)
);
end generate check_output;

end generate columns;

end generate rows;

end Behavioral;
",
        );
        Ok(out)
    }

    /// The FSM driving the nanowires of `unit`.
    pub fn controller(&mut self, unit: &LevelUnit) -> Result<String> {
        let name = controller_name(unit);
        let crossbar = unit.crossbar();
        let func = unit.function();
        let (width, height) = (crossbar.width(), crossbar.height());
        let num_outputs = func.num_outputs();
        let inputs: Vec<String> = base_inputs(func).map(|i| self.sanitizer.sanitize(i)).collect();
        let outputs: Vec<String> = func.outputs().iter().map(|o| self.sanitizer.sanitize(o)).collect();

        let mut out = String::new();
        out.push_str(HEADER);
        out.push_str(LIBRARIES);
        writeln!(out)?;
        out.push_str(MEMRISTOR_LIBRARY);
        writeln!(out)?;
        writeln!(out, "use work.{}.all;", structure_name(unit))?;
        writeln!(out)?;
        writeln!(out, "entity {} is", name)?;
        writeln!(out, "Port (")?;
        for input in inputs.iter() {
            writeln!(out, "{} : in  STD_LOGIC;", input)?;
        }
        writeln!(out, "en : in STD_LOGIC;")?;
        for output in outputs.iter() {
            writeln!(out, "{} : out  STD_LOGIC;", output)?;
        }
        writeln!(out, "done : out STD_LOGIC")?;
        writeln!(out, ");")?;
        writeln!(out, "end {};", name)?;
        writeln!(out)?;
        writeln!(out, "architecture Behavioral of {} is", name)?;
        writeln!(out)?;
        writeln!(out, "COMPONENT {}", crossbar_name(unit))?;
        writeln!(out, "PORT(")?;
        writeln!(out, "Vpos : IN voltage_vector(0 to {});", width - 1)?;
        writeln!(out, "Vneg : IN voltage_vector(0 to {});", height - 1)?;
        writeln!(out, "output : out STD_LOGIC_VECTOR(0 to {}) -- {} outputs", num_outputs - 1, num_outputs)?;
        writeln!(out, ");")?;
        writeln!(out, "END COMPONENT;")?;
        writeln!(out)?;
        writeln!(out, "signal Vpos_temp : voltage_vector(0 to {});", width - 1)?;
        writeln!(out, "signal Vneg_temp : voltage_vector(0 to {});", height - 1)?;
        writeln!(out, "signal output_temp : STD_LOGIC_VECTOR(0 to {});", num_outputs - 1)?;
        writeln!(out)?;
        for i in 0..width {
            writeln!(out, "\talias {} : voltage is Vpos_temp({});", Nanowire::Column(i), i)?;
        }
        for i in 0..height {
            writeln!(out, "\talias {} : voltage is Vneg_temp({});", Nanowire::Row(i), i)?;
        }
        for (bit, output) in outputs.iter().enumerate() {
            writeln!(out, "alias {}_tmp : std_logic is output_temp({});", output, bit)?;
        }

        let states: Vec<&str> = Stage::ALL.iter().map(|s| s.tag()).collect();
        writeln!(out, "type FSMstate is (IDLE,{});", states.join(","))?;
        out.push_str(
            "
signal state, next_state : FSMstate := IDLE;

signal clk : std_logic := '0';

constant clk_period : time := 1 ns;

begin

",
        );
        writeln!(out, "Inst_Crossbar : {} PORT MAP(", crossbar_name(unit))?;
        writeln!(out, "Vpos => Vpos_temp,")?;
        writeln!(out, "Vneg => Vneg_temp,")?;
        writeln!(out, "output => output_temp")?;
        writeln!(out, ");")?;
        writeln!(out)?;
        for output in outputs.iter() {
            writeln!(out, "{}<={}_tmp;", output, output)?;
        }
        out.push_str(
            "
-- Clock process definitions
clk_process : process (clk)
begin
clk <= not(clk) after clk_period/2; -- behavioral simulation only
end process;

change_state: process (clk)
begin
if(clk'event and clk='1') then
state <= next_state;
end if;
end process;

",
        );
        let sensitivity: Vec<&str> = inputs.iter().map(String::as_str).chain(["en"]).collect();
        writeln!(out, "FSM: process(state,{})", sensitivity.join(","))?;
        writeln!(out, "begin")?;
        writeln!(out)?;
        writeln!(out, "case state is")?;
        writeln!(out)?;
        writeln!(out, "when IDLE =>")?;
        writeln!(out)?;
        writeln!(out, "done<='0' after clk_period;")?;
        writeln!(out)?;
        writeln!(out, "if(en='1') then")?;
        writeln!(out, "next_state<={};", Stage::Reset.tag())?;
        writeln!(out, "else")?;
        writeln!(out, "next_state<=IDLE;")?;
        writeln!(out, "end if;")?;
        writeln!(out)?;

        let schedule = unit.schedule();
        for stage in Stage::ALL {
            if stage.previous().is_some() {
                writeln!(out)?;
                writeln!(out, "next_state<={};", stage.tag())?;
                writeln!(out)?;
            }
            writeln!(out, "when {} =>", stage.tag())?;
            writeln!(out)?;
            for (wire, drive) in schedule.drives(stage, crossbar.index())? {
                let line = self.render_drive(wire, &drive);
                writeln!(out, "{}", line)?;
            }
        }

        out.push_str(
            "
done<='1' after clk_period;

next_state<=IDLE;

end case;

end process;

end Behavioral;
",
        );
        Ok(out)
    }

    /// One nanowire assignment.
    pub fn render_drive(&mut self, wire: Nanowire, drive: &Drive) -> String {
        match drive {
            Drive::Fixed(voltage) => format!("{}<={};", wire, voltage),
            Drive::External { input, complemented } => {
                let asserted = if *complemented { '0' } else { '1' };
                format!(
                    "if {}='{}' then {}<=Vw_neg; else {}<=Vw; end if;",
                    self.sanitizer.sanitize(input),
                    asserted,
                    wire,
                    wire
                )
            }
            Drive::SettleThenRelease => format!("{}<=Vr;\n{}<=(others=>'Z') after 1 ps;", wire, wire),
            Drive::Release => format!("{}<=(others=>'Z');", wire),
        }
    }

    /// The top-level entity chaining the controllers of `circuit`.
    pub fn top_level(&mut self, circuit: &Circuit, entity: &str) -> Result<String> {
        let entity = self.sanitizer.sanitize(entity);
        let func = circuit.function();
        let inputs: Vec<String> = base_inputs(func).map(|i| self.sanitizer.sanitize(i)).collect();
        let outputs: Vec<String> = func.outputs().iter().map(|o| self.sanitizer.sanitize(o)).collect();

        let mut out = String::new();
        out.push_str(HEADER);
        out.push_str(LIBRARIES);
        writeln!(out)?;
        out.push_str(MEMRISTOR_LIBRARY);
        writeln!(out)?;
        writeln!(out, "entity {} is", entity)?;
        writeln!(out, "Port (")?;
        let ports: Vec<String> = inputs
            .iter()
            .map(|i| format!("{} : in  STD_LOGIC", i))
            .chain(outputs.iter().map(|o| format!("{} : out  STD_LOGIC", o)))
            .collect();
        writeln!(out, "{}", ports.join(";\n"))?;
        writeln!(out, ");")?;
        writeln!(out, "end {};", entity)?;
        writeln!(out)?;
        writeln!(out, "architecture Behavioral of {} is", entity)?;
        writeln!(out)?;

        let mut instances = String::new();
        let mut wires = Vec::new();
        for unit in circuit.units() {
            let level = unit.level();
            let name = controller_name(unit);
            let unit_inputs: Vec<String> = base_inputs(unit.function()).map(|i| self.sanitizer.sanitize(i)).collect();
            let unit_outputs: Vec<String> =
                unit.function().outputs().iter().map(|o| self.sanitizer.sanitize(o)).collect();

            writeln!(out, "COMPONENT {}", name)?;
            writeln!(out, "PORT(")?;
            writeln!(instances, "Inst_Crossbar_{} : {} PORT MAP(", level, name)?;
            for input in unit_inputs.iter() {
                writeln!(out, "{} : in  STD_LOGIC;", input)?;
                writeln!(instances, "{} => {}_temp,", input, input)?;
            }
            writeln!(out, "en : in STD_LOGIC;")?;
            // Level d starts when level d - 1 is done; level 0 is the input pulse.
            let previous = level.prev().map(|l| l.index()).unwrap_or(0);
            writeln!(instances, "en => done_temp_{},", previous)?;
            for output in unit_outputs.iter() {
                writeln!(out, "{} : out  STD_LOGIC;", output)?;
                writeln!(instances, "{} => {}_temp,", output, output)?;
                wires.push(format!("{}_temp", output));
            }
            writeln!(instances, "done => done_temp_{}", level)?;
            writeln!(instances, ");")?;
            writeln!(instances)?;
            writeln!(out, "done : out STD_LOGIC")?;
            writeln!(out, ");")?;
            writeln!(out, "END COMPONENT;")?;
            writeln!(out)?;
        }

        for input in inputs.iter() {
            writeln!(out, "signal {}_temp : STD_LOGIC;", input)?;
        }
        for wire in wires.iter() {
            writeln!(out, "signal {} : STD_LOGIC;", wire)?;
        }
        for i in 0..=circuit.num_crossbars() {
            writeln!(out, "signal done_temp_{} : STD_LOGIC;", i)?;
        }
        writeln!(out)?;
        writeln!(out, "begin")?;
        writeln!(out)?;
        out.push_str(&instances);

        for input in inputs.iter() {
            writeln!(out, "{}_temp <= {};", input, input)?;
        }
        for output in outputs.iter() {
            writeln!(out, "{} <= {}_temp;", output, output)?;
        }
        writeln!(out)?;
        writeln!(out, "process({})", inputs.join(","))?;
        writeln!(out, "begin")?;
        writeln!(out, "done_temp_0<='1';")?;
        writeln!(out, "done_temp_0<='0' after 4 ns;")?;
        writeln!(out, "end process;")?;
        writeln!(out)?;
        writeln!(out, "end Behavioral;")?;
        Ok(out)
    }
}
