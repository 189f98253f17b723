use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::info;

use xbar_rs::decompose::{synthesize, SynthConfig};
use xbar_rs::dot::DotConfig;
use xbar_rs::eqn;
use xbar_rs::vhdl::{NameSanitizer, VhdlEmitter};

#[derive(Parser)]
#[command(author, version, about = "Memristor crossbar synthesis from EQN files")]
struct Cli {
    /// Input function (.eqn format)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Write the dependency graph of the function (.dot format)
    #[arg(long)]
    graph: bool,

    /// With --graph, also write the dependency graph of every level
    #[arg(long)]
    dgraph: bool,

    /// Write a statistics report of the circuit
    #[arg(long)]
    stat: bool,

    /// Write a behavioral VHDL implementation of the circuit
    #[arg(long)]
    vhdl: bool,

    /// Print details of every synthesis step
    #[arg(long)]
    verbose: bool,

    /// Directory for the generated files
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Extra reserved identifiers for VHDL names, one per line
    #[arg(long, value_name = "FILE")]
    reserved_words: Option<PathBuf>,

    /// Synthesize the levels one after another
    #[arg(long)]
    sequential: bool,
}

fn write(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, contents).wrap_err_with(|| format!("cannot write '{}'", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let level = if cli.verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = Instant::now();

    let entity = cli
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| eyre!("cannot derive an entity name from '{}'", cli.input.display()))?
        .to_string();

    let func = eqn::parse_file(&cli.input)?;
    info!(
        "function '{}': {} inputs, {} outputs, {} minterms",
        entity,
        func.num_inputs() / 2,
        func.num_outputs(),
        func.num_minterms()
    );

    let config = SynthConfig::default()
        .with_deep_graphs(cli.graph && cli.dgraph)
        .with_parallel(!cli.sequential);
    let circuit = synthesize(&func, &config)?;
    info!("synthesized {} crossbars", circuit.num_crossbars());

    if cli.graph || cli.vhdl || cli.stat {
        fs::create_dir_all(&cli.out_dir).wrap_err_with(|| format!("cannot create '{}'", cli.out_dir.display()))?;
    }

    if cli.graph {
        write(&cli.out_dir, "dependency_graph.dot", &circuit.graph().to_dot()?)?;
        for unit in circuit.units() {
            if let Some(deep) = unit.graph() {
                let dot = deep.graph.to_dot_with_config(&DotConfig {
                    name: "level_graph",
                    ..DotConfig::default()
                })?;
                write(&cli.out_dir, &format!("dependency_graph_{}.dot", unit.level()), &dot)?;
            }
        }
    }

    if cli.vhdl {
        let mut sanitizer = NameSanitizer::new();
        if let Some(path) = &cli.reserved_words {
            sanitizer
                .load_reserved_words(path)
                .wrap_err_with(|| format!("cannot read reserved words from '{}'", path.display()))?;
        }
        let mut emitter = VhdlEmitter::with_sanitizer(sanitizer);
        for file in emitter.emit(&circuit, &entity)? {
            write(&cli.out_dir, &file.name, &file.contents)?;
        }
    }

    let elapsed = time_total.elapsed();
    if cli.stat {
        let report = format!(
            "{}xbargen exec time: {:.3} ms\n",
            circuit.stats(),
            elapsed.as_secs_f64() * 1000.0
        );
        write(&cli.out_dir, &format!("{}_stat.txt", entity), &report)?;
    }

    info!("All done in {:.3} s", elapsed.as_secs_f64());
    Ok(())
}
