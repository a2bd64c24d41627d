mod input;
mod output;
mod profile_file;
mod run_config;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use spring_core::{DebugSink, SpringEngine, TracingSink};
use spring_store::{Store, default_db_path};

use crate::input::{Sample, SampleReader};
use crate::output::{DetectionWriter, OutputFormat};
use crate::profile_file::read_profile;
use crate::run_config::{Overrides, RunConfig};

#[derive(Parser)]
#[command(name = "spring", about = "Real-time profile detection with streaming DTW (SPRING)")]
struct Cli {
    /// SQLite database for profiles and detections
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor a sample stream for occurrences of a profile
    Run(RunArgs),

    /// Manage stored reference profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// List recorded detections
    Detections {
        #[arg(long)]
        profile_id: u32,

        /// Only detections recorded for this stream
        #[arg(long)]
        stream: Option<String>,

        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,

        #[arg(long)]
        no_header: bool,
    },
}

#[derive(Args)]
#[command(group(clap::ArgGroup::new("profile_source").required(true).args(["profile_file", "profile_id"])))]
struct RunArgs {
    /// Profile file (.toml, .json, or plain numbers)
    #[arg(long)]
    profile_file: Option<PathBuf>,

    /// Stored profile id
    #[arg(long)]
    profile_id: Option<u32>,

    /// TOML run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Largest DTW distance accepted as a match
    #[arg(long)]
    threshold: Option<f64>,

    /// Minimum match length as a fraction of the profile length
    #[arg(long)]
    length_min: Option<f64>,

    /// Minimum match energy as a fraction of the profile energy
    #[arg(long)]
    energy_min: Option<f64>,

    /// Prefix for debug lines
    #[arg(long)]
    identifier: Option<String>,

    /// Sample file (`timestamp,value` or `value` per line); stdin when absent
    #[arg(long)]
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Persist detections under this stream name
    #[arg(long)]
    record: Option<String>,

    /// Log every engine cycle through tracing
    #[arg(long)]
    debug: bool,

    #[arg(long)]
    no_header: bool,
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Store a profile from a file
    Import {
        file: PathBuf,

        /// Profile id (required for plain-text files)
        #[arg(long)]
        id: Option<u32>,

        /// Display name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// List stored profiles
    List,

    /// Print a stored profile
    Show { id: u32 },

    /// Remove a profile and its detections
    Delete { id: u32 },
}

fn open_store(cli: &Cli) -> Result<Store> {
    let path = cli.db.clone().unwrap_or_else(default_db_path);
    Store::open(&path).with_context(|| format!("failed to open store {}", path.display()))
}

fn init_tracing(verbose: bool, debug: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else if debug {
        EnvFilter::new("warn,spring=debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let debug = matches!(&cli.command, Commands::Run(args) if args.debug);
    init_tracing(cli.verbose, debug);

    match &cli.command {
        Commands::Run(args) => cmd_run(&cli, args),
        Commands::Profile(cmd) => cmd_profile(&cli, cmd),
        Commands::Detections {
            profile_id,
            stream,
            format,
            no_header,
        } => cmd_detections(&cli, *profile_id, stream.as_deref(), *format, *no_header),
    }
}

fn cmd_run(cli: &Cli, args: &RunArgs) -> Result<()> {
    let file_config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let (config, identifier) = file_config.resolve(Overrides {
        threshold: args.threshold,
        length_minimum: args.length_min,
        energy_minimum: args.energy_min,
        identifier: args.identifier.clone(),
    })?;

    let store = if args.profile_id.is_some() || args.record.is_some() {
        Some(open_store(cli)?)
    } else {
        None
    };

    let profile = match (&args.profile_file, args.profile_id, &store) {
        (Some(path), _, _) => read_profile(path, None, false)?,
        (None, Some(id), Some(store)) => store
            .load_profile(id)
            .context("failed to load profile")?
            .with_context(|| format!("profile {id} not found"))?,
        _ => bail!("pass --profile-file or --profile-id"),
    };

    let recording = match (&args.record, &store) {
        (Some(stream), Some(store)) => {
            if store.load_profile(profile.id())?.is_none() {
                bail!(
                    "profile {} is not stored; import it before recording detections",
                    profile.id()
                );
            }
            Some((store, stream.as_str()))
        }
        _ => None,
    };

    tracing::info!(
        "monitoring profile {} (length {}, threshold {})",
        profile.id(),
        profile.len(),
        config.threshold
    );

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let samples = SampleReader::new(reader);
    let mut writer = DetectionWriter::new(io::stdout().lock(), args.format, !args.no_header)?;

    let (cycles, found) = if args.debug {
        let engine = SpringEngine::with_sink(profile, config, TracingSink::new(identifier))?;
        drive(engine, samples, &mut writer, recording)?
    } else {
        let engine = SpringEngine::new(profile, config)?;
        drive(engine, samples, &mut writer, recording)?
    };

    tracing::info!("processed {cycles} samples, {found} detections");
    Ok(())
}

/// Feed every sample through the engine, writing (and optionally recording)
/// each detection as soon as it is reported.
fn drive<S: DebugSink>(
    mut engine: SpringEngine<S>,
    samples: impl Iterator<Item = Result<Sample>>,
    writer: &mut DetectionWriter<impl Write>,
    recording: Option<(&Store, &str)>,
) -> Result<(u64, usize)> {
    engine.report_initialization();

    let mut found = 0;
    for sample in samples {
        let sample = sample?;
        let Some(occurrence) = engine.advance(sample.value, &sample.timestamp) else {
            continue;
        };
        writer.write(&occurrence)?;
        if let Some((store, stream)) = recording {
            store
                .record_detection(engine.profile().id(), stream, &occurrence)
                .context("failed to record detection")?;
        }
        found += 1;
    }
    Ok((engine.cycle(), found))
}

fn cmd_profile(cli: &Cli, cmd: &ProfileCommand) -> Result<()> {
    let store = open_store(cli)?;
    match cmd {
        ProfileCommand::Import { file, id, name } => {
            let profile = read_profile(file, *id, true)?;
            let name = name.clone().unwrap_or_else(|| file_stem(file));
            store
                .save_profile(&profile, &name)
                .context("failed to save profile")?;
            println!(
                "imported profile {} '{}': {} samples, total energy {:?}",
                profile.id(),
                name,
                profile.len(),
                profile.total_energy()
            );
        }
        ProfileCommand::List => {
            let profiles = store.list_profiles().context("failed to list profiles")?;
            if profiles.is_empty() {
                println!("(no profiles)");
            }
            for p in profiles {
                println!(
                    "{:>6}  {:>6}  {:>12.3}  {}  {}",
                    p.id, p.length, p.total_energy, p.created_at, p.name
                );
            }
        }
        ProfileCommand::Show { id } => {
            let profile = store
                .load_profile(*id)?
                .with_context(|| format!("profile {id} not found"))?;
            println!("{profile}");
            let samples: Vec<String> = profile.samples().iter().map(|v| format!("{v:?}")).collect();
            println!("{}", samples.join(","));
        }
        ProfileCommand::Delete { id } => {
            if !store.delete_profile(*id)? {
                bail!("profile {id} not found");
            }
            println!("deleted profile {id}");
        }
    }
    Ok(())
}

fn cmd_detections(
    cli: &Cli,
    profile_id: u32,
    stream: Option<&str>,
    format: OutputFormat,
    no_header: bool,
) -> Result<()> {
    let store = open_store(cli)?;
    let detections = store
        .detections(profile_id, stream)
        .context("failed to load detections")?;

    let mut writer = DetectionWriter::new(io::stdout().lock(), format, !no_header)?;
    for occurrence in &detections {
        writer.write(occurrence)?;
    }
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string()
}
