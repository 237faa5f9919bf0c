use std::fs;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use log::{LevelFilter, debug, info};

use rs_markov_core::ingest::{self, IngestEvent, IngestOptions, Source};
use rs_markov_core::io::expand_inputs;
use rs_markov_core::model::walk_input::DEFAULT_LENGTH;
use rs_markov_core::text::prepare_text;
use rs_markov_core::{Chain, Generator, WalkInput};

#[derive(Parser, Debug)]
#[command(name = "rs-markov-cli", version, about = "First-order Markov chain text generator")]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Learn a chain from text files and save it
    Learn(LearnArgs),
    /// Generate text from text files and/or a saved chain
    Generate(GenerateArgs),
    /// Re-flow a hard-wrapped text file, one paragraph per line
    Prepare {
        /// Text file to re-flow (printed to stdout)
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct LearnArgs {
    /// Text files, or directories of .txt files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Destination; .json selects the structured format, a trailing 'z' compresses
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Text files, or directories of .txt files
    inputs: Vec<PathBuf>,

    /// Start from a saved chain
    #[arg(short, long, value_name = "PATH")]
    chain: Option<PathBuf>,

    /// Save the chain before generating
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Number of tokens to generate
    #[arg(short = 'n', long, default_value_t = DEFAULT_LENGTH)]
    length: usize,

    /// Fixed random seed (defaults to the current time)
    #[arg(long)]
    seed: Option<u64>,

    /// Prefer start tokens beginning with an uppercase letter
    #[arg(long)]
    sentence_start: bool,

    /// Mark each restart with a trailing backslash and a line break
    #[arg(long)]
    mark_restarts: bool,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Learn(args) => run_learn(args),
        Commands::Generate(args) => run_generate(args),
        Commands::Prepare { file } => {
            print!("{}", prepare_text(&fs::read_to_string(file)?));
            Ok(())
        }
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    let level = if quiet > 0 {
        match quiet {
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn run_learn(args: LearnArgs) -> Result<(), Box<dyn std::error::Error>> {
    let chain = build_chain(Chain::new(), &args.inputs, args.jobs)?;
    chain.save(&args.output)?;
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Start from a saved chain if given, then merge any text inputs into it
    let mut chain = match &args.chain {
        Some(path) => Chain::load(path)?,
        None => Chain::new(),
    };
    if !args.inputs.is_empty() {
        chain = build_chain(chain, &args.inputs, args.jobs)?;
    }

    // A loaded chain carries raw counts only
    if !chain.is_finalized() {
        chain.finalize();
    }

    if let Some(path) = &args.save {
        chain.save(path)?;
    }

    let mut input = WalkInput::new(args.length)?;
    input.seed = args.seed;
    input.sentence_start = args.sentence_start;
    input.mark_restarts = args.mark_restarts;

    let mut generator = Generator::new(&input);
    println!("{}", generator.generate(&chain, &input)?);
    Ok(())
}

/// Ingests `inputs` into `chain` on the background worker and waits for it.
fn build_chain(chain: Chain, inputs: &[PathBuf], jobs: Option<usize>) -> Result<Chain, Box<dyn std::error::Error>> {
    let sources: Vec<Source> = expand_inputs(inputs, "txt")?.into_iter().map(Source::File).collect();

    let mut options = IngestOptions::default();
    if let Some(jobs) = jobs {
        options.jobs = jobs;
    }

    let handle = ingest::spawn(chain, sources, options);
    for event in handle.events().iter() {
        match event {
            IngestEvent::Loading { index, name } => info!("Loading #{index}: {name}"),
            IngestEvent::Progress { processed, total } => debug!("Progress: {processed}/{total} bytes"),
            IngestEvent::Skipped { .. } | IngestEvent::Cancelled => (),
            IngestEvent::Finished(report) => {
                info!("Learned {} tokens, {} distinct", report.tokens, report.nodes)
            }
        }
    }

    Ok(handle.join()?)
}
