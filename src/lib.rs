//! # xbar-rs: memristor crossbar synthesis
//!
//! **`xbar-rs`** turns a multi-level Boolean function, given as sum-of-products
//! equations, into an implementation plan for a chain of memristor crossbars.
//!
//! ## Pipeline
//!
//! 1. The function's terms form a dependency graph; each term gets a *level*, the
//!    length of its longest dependency chain down to a primary input.
//! 2. Every level above the inputs is carved into an independent two-level
//!    sub-function and realized by one crossbar: a device matrix with an input
//!    line, one row per distinct product and one row per output.
//! 3. Each crossbar is evaluated by a six-stage voltage schedule (reset, receive
//!    inputs, compute minterms, evaluate NAND, evaluate AND, invert), run by an
//!    FSM with one extra idle state.
//! 4. Circuit-wide statistics include best and worst case switching estimates.
//!
//! Crossbars are chained: the crossbar of level `d` reads the outputs of level
//! `d - 1` and starts when that level is done.
//!
//! ## Basic Usage
//!
//! ```rust
//! use xbar_rs::decompose::{synthesize, SynthConfig};
//! use xbar_rs::eqn;
//!
//! let func = eqn::parse_str(
//!     "INORDER = a b c;
//!      OUTORDER = x y;
//!      x = a*b;
//!      y = x*c + !x*!c;",
//! )
//! .unwrap();
//!
//! let circuit = synthesize(&func, &SynthConfig::default()).unwrap();
//! assert_eq!(circuit.num_crossbars(), 2);
//!
//! let stats = circuit.stats();
//! assert_eq!(stats.devices, 21);
//! assert_eq!(stats.steps, 14);
//! ```
//!
//! ## Core Components
//!
//! - **[`function`]**: the [`Function`][crate::function::Function] model.
//! - **[`graph`]**: dependency graph and levelization.
//! - **[`decompose`]**: per-level carving and synthesis into a [`Circuit`][crate::decompose::Circuit].
//! - **[`crossbar`]**: device matrices and their row/column indices.
//! - **[`voltage`]**: voltage schedules and floating-wire resolution.
//! - **[`activity`]**: switching-activity estimation.
//!
//! Around them, [`eqn`] parses equation files, [`dot`] exports graphs for
//! Graphviz, [`stats`] builds the statistics report and [`vhdl`] renders
//! behavioral VHDL.

pub mod activity;
pub mod crossbar;
pub mod decompose;
pub mod dot;
pub mod eqn;
pub mod error;
pub mod function;
pub mod graph;
pub mod stats;
pub mod types;
pub mod voltage;
pub mod vhdl;
