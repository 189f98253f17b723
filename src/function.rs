//! Multi-level Boolean functions in sum-of-products form.
//!
//! A [`Function`] is a list of inputs, a list of outputs, and a table of
//! [`Minterm`]s keyed by output name. Each minterm is a conjunction of literals;
//! an output is the disjunction of its minterms. A literal is either a declared
//! input (every base input is paired with a complement named `not_<input>`), or
//! another output (optionally complemented), which makes the function multi-level.
//!
//! The minterm table iterates by output name, then in insertion order within one
//! output. Every "first-seen" order in the synthesis pipeline refers to this order.
//!
//! ```
//! use xbar_rs::function::{Function, Minterm};
//!
//! let mut f = Function::default();
//! f.add_inputs(["a", "b", "not_a", "not_b"]);
//! f.add_output("z");
//! f.add_minterm("z", Minterm::new(["a", "b"]));
//! f.add_minterm("z", Minterm::new(["not_a", "not_b"]));
//!
//! assert!(f.validate().is_ok());
//! assert_eq!(f.num_distinct_minterms(), 2);
//! assert_eq!(f.literal_count()["not_a"], 1);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use crate::error::{Result, SynthError};

/// Name prefix marking the complement of a signal.
pub const COMPLEMENT_PREFIX: &str = "not_";

/// Separator joining the literals of a minterm into its product label.
pub const PRODUCT_SEPARATOR: &str = "*";

/// Returns the complement name of `name`.
pub fn complement(name: &str) -> String {
    format!("{}{}", COMPLEMENT_PREFIX, name)
}

pub fn is_complement(name: &str) -> bool {
    name.starts_with(COMPLEMENT_PREFIX)
}

/// Strips the complement marker, if any.
pub fn strip_complement(name: &str) -> &str {
    name.strip_prefix(COMPLEMENT_PREFIX).unwrap_or(name)
}

/// One product term.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Minterm {
    literals: Vec<String>,
}

impl Minterm {
    pub fn new<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            literals: literals.into_iter().map(Into::into).collect(),
        }
    }

    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// The product label: literals joined with [`PRODUCT_SEPARATOR`].
    ///
    /// Two minterms with the same label share one crossbar row.
    pub fn label(&self) -> String {
        self.literals.join(PRODUCT_SEPARATOR)
    }
}

impl fmt::Display for Minterm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Function {
    inputs: Vec<String>,
    outputs: Vec<String>,
    minterms: BTreeMap<String, Vec<Minterm>>,
    literal_count: OnceLock<BTreeMap<String, usize>>,
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.inputs == other.inputs && self.outputs == other.outputs && self.minterms == other.minterms
    }
}

impl Eq for Function {}

// Constructors
impl Function {
    pub fn new(inputs: Vec<String>, outputs: Vec<String>, minterms: BTreeMap<String, Vec<Minterm>>) -> Self {
        Self {
            inputs,
            outputs,
            minterms,
            literal_count: OnceLock::new(),
        }
    }

    pub fn add_input(&mut self, input: impl Into<String>) {
        self.inputs.push(input.into());
    }

    pub fn add_inputs<I, S>(&mut self, inputs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
    }

    pub fn add_output(&mut self, output: impl Into<String>) {
        self.outputs.push(output.into());
    }

    pub fn add_outputs<I, S>(&mut self, outputs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(outputs.into_iter().map(Into::into));
    }

    pub fn add_minterm(&mut self, output: impl Into<String>, minterm: Minterm) {
        self.minterms.entry(output.into()).or_default().push(minterm);
        self.literal_count = OnceLock::new();
    }
}

// Getters
impl Function {
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Inputs without the synthesized complements.
    pub fn base_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(String::as_str).filter(|name| !is_complement(name))
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn minterms(&self) -> &BTreeMap<String, Vec<Minterm>> {
        &self.minterms
    }

    /// Minterms of one output (empty if it has none).
    pub fn minterms_of(&self, output: &str) -> &[Minterm] {
        self.minterms.get(output).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All `(output, minterm)` entries in table order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Minterm)> {
        self.minterms
            .iter()
            .flat_map(|(output, minterms)| minterms.iter().map(move |m| (output.as_str(), m)))
    }

    /// Distinct minterms in first-seen order.
    pub fn distinct_minterms(&self) -> Vec<&Minterm> {
        let mut seen = HashSet::new();
        self.entries()
            .map(|(_, m)| m)
            .filter(|m| seen.insert(m.label()))
            .collect()
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Number of minterm entries, duplicates included.
    pub fn num_minterms(&self) -> usize {
        self.minterms.values().map(Vec::len).sum()
    }

    /// Number of distinct product labels.
    pub fn num_distinct_minterms(&self) -> usize {
        self.distinct_minterms().len()
    }

    /// Literal occurrences over the distinct minterms (memoized).
    ///
    /// A product shared by several outputs is counted once.
    pub fn literal_count(&self) -> &BTreeMap<String, usize> {
        self.literal_count.get_or_init(|| {
            let mut count = BTreeMap::new();
            for minterm in self.distinct_minterms() {
                for literal in minterm.literals() {
                    *count.entry(literal.clone()).or_insert(0) += 1;
                }
            }
            count
        })
    }

    /// Occurrences of one literal (0 if absent).
    pub fn literal_occurrences(&self, literal: &str) -> usize {
        self.literal_count().get(literal).copied().unwrap_or(0)
    }
}

// Checks
impl Function {
    pub fn is_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|i| i == name)
    }

    pub fn is_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|o| o == name)
    }

    /// Checks that every minterm is non-empty, only references declared literals,
    /// and belongs to a declared output.
    ///
    /// A literal is declared if it names an input, an output, or an output complement.
    pub fn validate(&self) -> Result<()> {
        let inputs: HashSet<&str> = self.inputs.iter().map(String::as_str).collect();
        let outputs: HashSet<&str> = self.outputs.iter().map(String::as_str).collect();
        let declared = |literal: &str| {
            inputs.contains(literal)
                || outputs.contains(literal)
                || (is_complement(literal) && outputs.contains(strip_complement(literal)))
        };

        for (output, minterm) in self.entries() {
            if !outputs.contains(output) {
                return Err(SynthError::UndeclaredOutput {
                    output: output.to_string(),
                });
            }
            if minterm.is_empty() {
                return Err(SynthError::EmptyMinterm {
                    output: output.to_string(),
                });
            }
            if let Some(literal) = minterm.literals().iter().find(|l| !declared(l.as_str())) {
                return Err(SynthError::UndeclaredLiteral {
                    output: output.to_string(),
                    literal: literal.clone(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "input: {}", self.inputs.join(" "))?;
        writeln!(f, "output: {}", self.outputs.join(" "))?;
        for (output, minterms) in self.minterms.iter() {
            let terms: Vec<String> = minterms.iter().map(|m| format!("({})", m)).collect();
            writeln!(f, "{}={}", output, terms.join("+"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xnor() -> Function {
        let mut f = Function::default();
        f.add_inputs(["a", "b", "not_a", "not_b"]);
        f.add_output("z");
        f.add_minterm("z", Minterm::new(["a", "b"]));
        f.add_minterm("z", Minterm::new(["not_a", "not_b"]));
        f
    }

    #[test]
    fn test_complement_helpers() {
        assert_eq!(complement("a"), "not_a");
        assert!(is_complement("not_a"));
        assert!(!is_complement("a"));
        assert_eq!(strip_complement("not_a"), "a");
        assert_eq!(strip_complement("a"), "a");
    }

    #[test]
    fn test_minterm_label() {
        let m = Minterm::new(["a", "not_b", "c"]);
        assert_eq!(m.label(), "a*not_b*c");
        assert_eq!(m.len(), 3);
        assert_eq!(m.to_string(), "a*not_b*c");
    }

    #[test]
    fn test_counts() {
        let f = xnor();
        assert_eq!(f.num_inputs(), 4);
        assert_eq!(f.num_outputs(), 1);
        assert_eq!(f.num_minterms(), 2);
        assert_eq!(f.num_distinct_minterms(), 2);
        assert_eq!(f.base_inputs().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_shared_minterm_counted_once() {
        let mut f = Function::default();
        f.add_inputs(["a", "b", "not_a", "not_b"]);
        f.add_outputs(["x", "y"]);
        f.add_minterm("x", Minterm::new(["a", "b"]));
        f.add_minterm("y", Minterm::new(["a", "b"]));
        f.add_minterm("y", Minterm::new(["not_a"]));

        assert_eq!(f.num_minterms(), 3);
        assert_eq!(f.num_distinct_minterms(), 2);
        assert_eq!(f.literal_occurrences("a"), 1);
        assert_eq!(f.literal_occurrences("not_a"), 1);
        assert_eq!(f.literal_occurrences("not_b"), 0);
    }

    #[test]
    fn test_literal_count_reset_on_mutation() {
        let mut f = xnor();
        assert_eq!(f.literal_occurrences("a"), 1);
        f.add_minterm("z", Minterm::new(["a", "not_b"]));
        assert_eq!(f.literal_occurrences("a"), 2);
    }

    #[test]
    fn test_entries_order_by_output_then_insertion() {
        let mut f = Function::default();
        f.add_inputs(["a", "not_a"]);
        f.add_outputs(["y", "x"]);
        f.add_minterm("y", Minterm::new(["a"]));
        f.add_minterm("x", Minterm::new(["not_a"]));
        f.add_minterm("x", Minterm::new(["a"]));

        let labels: Vec<(&str, String)> = f.entries().map(|(o, m)| (o, m.label())).collect();
        assert_eq!(
            labels,
            vec![
                ("x", "not_a".to_string()),
                ("x", "a".to_string()),
                ("y", "a".to_string())
            ]
        );
    }

    #[test]
    fn test_validate_ok() {
        assert_eq!(xnor().validate(), Ok(()));
    }

    #[test]
    fn test_validate_multi_level_references() {
        let mut f = Function::default();
        f.add_inputs(["a", "not_a"]);
        f.add_outputs(["x", "y"]);
        f.add_minterm("x", Minterm::new(["a"]));
        f.add_minterm("y", Minterm::new(["not_x", "a"]));
        assert_eq!(f.validate(), Ok(()));
    }

    #[test]
    fn test_validate_wide_function() {
        let mut f = Function::default();
        f.add_inputs(["a", "not_a"]);
        for i in 0..2000 {
            let output = format!("o{}", i);
            let literal = if i == 0 { "a".to_string() } else { format!("not_o{}", i - 1) };
            f.add_output(output.clone());
            f.add_minterm(output, Minterm::new([literal]));
        }
        assert_eq!(f.validate(), Ok(()));

        f.add_minterm("o1999", Minterm::new(["not_o2000"]));
        assert_eq!(
            f.validate(),
            Err(SynthError::UndeclaredLiteral {
                output: "o1999".to_string(),
                literal: "not_o2000".to_string()
            })
        );
    }

    #[test]
    fn test_validate_empty_minterm() {
        let mut f = xnor();
        f.add_minterm("z", Minterm::new(Vec::<String>::new()));
        assert_eq!(
            f.validate(),
            Err(SynthError::EmptyMinterm {
                output: "z".to_string()
            })
        );
    }

    #[test]
    fn test_validate_undeclared_literal() {
        let mut f = xnor();
        f.add_minterm("z", Minterm::new(["a", "q"]));
        assert_eq!(
            f.validate(),
            Err(SynthError::UndeclaredLiteral {
                output: "z".to_string(),
                literal: "q".to_string()
            })
        );
    }

    #[test]
    fn test_validate_undeclared_output() {
        let mut f = xnor();
        f.add_minterm("w", Minterm::new(["a"]));
        assert_eq!(
            f.validate(),
            Err(SynthError::UndeclaredOutput {
                output: "w".to_string()
            })
        );
    }

    #[test]
    fn test_display() {
        let text = xnor().to_string();
        assert!(text.contains("input: a b not_a not_b"));
        assert!(text.contains("z=(a*b)+(not_a*not_b)"));
    }
}
