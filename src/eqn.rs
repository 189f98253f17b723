//! Parser for the EQN equation format.
//!
//! ```text
//! # comment
//! INORDER = a b c;
//! OUTORDER = x y;
//! x = a*b;
//! y = x*c + !x*!c;
//! ```
//!
//! Statements end at `;` and may span several lines. `INORDER` declares the
//! primary inputs; every input is paired with its complement, appended after all
//! inputs of the statement. `OUTORDER` declares the outputs. Any other statement
//! defines the minterms of one output: terms are separated by `+`, literals by
//! `*` or whitespace, and `!` complements a literal.

use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::function::{complement, Function, Minterm, COMPLEMENT_PREFIX};

pub const INPUT_DECLARATION: &str = "INORDER";
pub const OUTPUT_DECLARATION: &str = "OUTORDER";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read equation file: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<Function, ParseError> {
    let path = path.as_ref();
    debug!("parsing '{}'", path.display());
    let text = fs::read_to_string(path)?;
    parse_str(&text)
}

pub fn parse_str(text: &str) -> Result<Function, ParseError> {
    let mut func = Function::default();
    let mut pending = String::new();
    // Line on which the pending statement starts.
    let mut start = 0;

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        if line.trim_start().starts_with('#') {
            continue;
        }

        let mut rest = line.trim_end_matches('\r');
        while let Some(end) = rest.find(';') {
            if pending.trim().is_empty() {
                start = line_no;
            }
            pending.push_str(&rest[..end]);
            statement(&mut func, &pending, start)?;
            pending.clear();
            rest = &rest[end + 1..];
        }

        if !rest.trim().is_empty() {
            if pending.trim().is_empty() {
                start = line_no;
            }
            pending.push_str(rest);
            pending.push(' ');
        }
    }

    if !pending.trim().is_empty() {
        return Err(ParseError::Syntax {
            line: start,
            message: format!("unterminated statement '{}'", pending.trim()),
        });
    }

    debug!("parsed function:\n{}", func);
    Ok(func)
}

fn statement(func: &mut Function, text: &str, line: usize) -> Result<(), ParseError> {
    if text.trim().is_empty() {
        return Ok(());
    }
    let Some((lhs, rhs)) = text.split_once('=') else {
        return Err(ParseError::Syntax {
            line,
            message: format!("expected '=' in '{}'", text.trim()),
        });
    };
    let lhs = lhs.trim();
    if lhs.is_empty() {
        return Err(ParseError::Syntax {
            line,
            message: "missing left-hand side".to_string(),
        });
    }

    match lhs {
        INPUT_DECLARATION => {
            let inputs: Vec<&str> = rhs.split_whitespace().collect();
            func.add_inputs(inputs.iter().copied());
            func.add_inputs(inputs.iter().map(|input| complement(input)));
        }
        OUTPUT_DECLARATION => {
            func.add_outputs(rhs.split_whitespace());
        }
        output => {
            let terms: Vec<&str> = rhs.split('+').collect();
            for (i, term) in terms.iter().enumerate() {
                let term = term.replace('!', COMPLEMENT_PREFIX).replace('*', " ");
                let literals: Vec<&str> = term.split_whitespace().collect();
                // A dangling final `+` is tolerated. Any other empty product is
                // kept and rejected by validation.
                if literals.is_empty() && i > 0 && i + 1 == terms.len() {
                    continue;
                }
                func.add_minterm(output, Minterm::new(literals));
            }
        }
    }
    Ok(())
}
