//! rowchain CLI: summarise and join JSON row files through chains.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rowchain_core::prelude::{BatchConfig, ChainConfig, JoinConfig, Node, StepResult};
use rowchain_core::value::{into_rows, key_string};
use rowchain_exec::{start, Chain, ChainOutput, Compose, Engine};
use rowchain_operators::collect;
use serde_json::{Map, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rowchain")]
#[command(about = "Chainable record pipelines over JSON files", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print count, min, max, sum and avg of a JSON array
    Stats {
        /// JSON file holding an array of values or records
        #[arg(short, long)]
        input: PathBuf,

        /// Summarise this record field instead of the raw values
        #[arg(short, long)]
        field: Option<String>,

        /// Slice length for batch steps (0 = whole sequence)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Join two JSON arrays of records and print the result
    Join {
        #[arg(long)]
        left: PathBuf,

        #[arg(long)]
        right: PathBuf,

        #[arg(long)]
        left_key: String,

        #[arg(long)]
        right_key: String,

        /// Attach matches under this property instead of merging fields
        #[arg(long)]
        property: Option<String>,

        #[arg(long)]
        one_to_many: bool,

        /// Also emit right rows without a left match
        #[arg(long)]
        full: bool,

        /// Slice length for right-side lookups (left joins only)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Print the run manifest to stderr
        #[arg(long)]
        manifest: bool,
    },
}

struct JoinArgs {
    left_key: String,
    right_key: String,
    property: Option<String>,
    one_to_many: bool,
    full: bool,
    batch_size: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Stats {
            input,
            field,
            batch_size,
        } => run_stats(&input, field, batch_size),
        Commands::Join {
            left,
            right,
            left_key,
            right_key,
            property,
            one_to_many,
            full,
            batch_size,
            manifest,
        } => run_join(
            &left,
            &right,
            JoinArgs {
                left_key,
                right_key,
                property,
                one_to_many,
                full,
                batch_size,
            },
            manifest,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", report(e.as_ref()));
        std::process::exit(1);
    }
}

/// Render an error with every cause its own message does not already carry.
fn report(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(e) = cause {
        let msg = e.to_string();
        if !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        cause = e.source();
    }
    out
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_writer(std::io::stderr)
        .init();

    debug!("rowchain started with verbosity level: {}", verbose);
}

fn run_stats(
    input: &Path,
    field: Option<String>,
    batch_size: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = read_json(input)?;
    let summary = stats(rows, field, &engine(batch_size)?)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_join(
    left: &Path,
    right: &Path,
    args: JoinArgs,
    print_manifest: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let left_rows = read_json(left)?;
    let right_rows = read_json(right)?;
    let engine = engine(args.batch_size)?;
    let out = join(left_rows, right_rows, &args, &engine)?;

    println!("{}", serde_json::to_string_pretty(&out.value)?);
    if print_manifest {
        eprintln!("{}", serde_json::to_string_pretty(&out.manifest)?);
    }
    info!(
        run = %out.manifest.id,
        elapsed_ms = out.manifest.elapsed_ms(),
        "join finished"
    );
    Ok(())
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let value = serde_json::from_str(&text)
        .map_err(|e| format!("{} is not valid JSON: {}", path.display(), e))?;
    Ok(value)
}

fn engine(batch_size: Option<usize>) -> Result<Engine, Box<dyn std::error::Error>> {
    let mut cfg = ChainConfig::try_from_env()?;
    if let Some(n) = batch_size {
        cfg.default_batch_size = n;
    }
    Ok(Engine::new(cfg))
}

/// Source chain yielding the values to summarise.
fn values_chain(rows: Value, field: Option<String>) -> Chain {
    let chain = start(move || Ok(rows.clone()));
    match field {
        Some(name) => chain
            .map_batch(move |slice| {
                Ok(Value::Array(
                    into_rows(slice)
                        .iter()
                        .map(|row| row.get(name.as_str()).cloned().unwrap_or(Value::Null))
                        .collect(),
                ))
            })
            .then(collect::not_null()),
        None => chain,
    }
}

fn stats(
    rows: Value,
    field: Option<String>,
    engine: &Engine,
) -> Result<Value, Box<dyn std::error::Error>> {
    let values = values_chain(rows, field);
    let mut summary = Map::new();
    for (name, step) in [
        ("count", collect::count()),
        ("min", collect::min()),
        ("max", collect::max()),
        ("sum", collect::sum()),
        ("avg", collect::avg()),
    ] {
        let out = values.clone().then(step).run_with(engine)?;
        summary.insert(name.to_string(), out.value);
    }
    Ok(Value::Object(summary))
}

fn join(
    left: Value,
    right: Value,
    args: &JoinArgs,
    engine: &Engine,
) -> Result<ChainOutput, Box<dyn std::error::Error>> {
    let mut cfg = JoinConfig::on_fields(&args.left_key, &args.right_key).one_to_many(args.one_to_many);
    if let Some(p) = &args.property {
        cfg = cfg.left_property(p.clone());
    }
    let cfg = cfg.build()?;

    let right_rows = into_rows(right);
    let chain = start(move || Ok(left.clone()));
    let chain = if args.full {
        // Right-only rows must be fetched too, so the whole table comes back in one call.
        let fetch_all = Node::prepare_with(
            move |_| Ok(Value::Array(right_rows.clone())),
            BatchConfig::whole(),
        );
        chain.then(fetch_all.full_join(cfg))
    } else {
        let (left_key, right_key) = (args.left_key.clone(), args.right_key.clone());
        let lookup = move |slice: Value| -> StepResult {
            let wanted: HashSet<String> = into_rows(slice)
                .iter()
                .filter_map(|row| row.get(left_key.as_str()).map(key_string))
                .collect();
            Ok(Value::Array(
                right_rows
                    .iter()
                    .filter(|row| {
                        row.get(right_key.as_str())
                            .is_some_and(|k| wanted.contains(&key_string(k)))
                    })
                    .cloned()
                    .collect(),
            ))
        };
        match args.batch_size {
            Some(n) => chain.left_join_sized(lookup, n, cfg),
            None => chain.left_join(lookup, cfg),
        }
    };

    Ok(chain.run_with(engine)?)
}
