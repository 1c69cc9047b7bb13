use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use jotgen_core::distribute::ArtifactDistributor;
use jotgen_core::flags::gameflags_map;
use jotgen_core::{
    AppConfig, Configuration, CosmeticOptions, ErrorKind, GeneratorError, OptionMap, Pipeline,
    Secrecy, SpoilerFormat, SpoilerView,
};

#[derive(Debug, Parser)]
#[command(name = "jotgen", version, about = "Seed generation and sharing for the Jets of Time randomizer")]
struct Args {
    /// TOML config file. Defaults to jotgen/jotgen.toml in the user config
    /// directory when that exists.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate and store a seed from a JSON option map ("-" reads stdin).
    Generate {
        options: PathBuf,
        /// Withhold the spoiler log and obfuscate the seed.
        #[arg(long)]
        race: bool,
    },
    /// Generate a practice copy of a stored seed with a new seed string.
    Practice { id: String },
    /// Print the share details of a stored seed.
    Show { id: String },
    Spoiler {
        id: String,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Patch a base artifact with a stored seed.
    Download {
        id: String,
        #[arg(long, value_name = "FILE")]
        rom: PathBuf,
        /// JSON option map with cosmetic settings.
        #[arg(long, value_name = "FILE")]
        cosmetics: Option<PathBuf>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Write the seed verification image as PNG.
    Image {
        id: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// List the most recent seeds.
    List {
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Print the full spoiler and effective seed, race seeds included.
    Dump { id: String },
    /// Check a base artifact against the supported binary.
    ValidateRom { rom: PathBuf },
    /// Print default settings and the flag map for an option front-end.
    Defaults,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
    Web,
}

impl From<Format> for SpoilerFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => SpoilerFormat::Text,
            Format::Json => SpoilerFormat::Json,
            Format::Web => SpoilerFormat::Web,
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("jotgen").join("jotgen.toml"))
        .filter(|path| path.exists())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_option_map(path: &Path) -> anyhow::Result<OptionMap> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing option map {}", path.display()))
}

fn run(args: Args, config: AppConfig) -> anyhow::Result<()> {
    if let Command::ValidateRom { rom } = &args.command {
        let bytes = fs::read(rom).with_context(|| format!("reading {}", rom.display()))?;
        let body = ArtifactDistributor::new(&config.base_artifact).validate_base_artifact(&bytes)?;
        println!("{}: ok ({} bytes after header)", rom.display(), body.len());
        return Ok(());
    }
    if let Command::Defaults = &args.command {
        println!("{}", Configuration::defaults_json()?);
        for (key, flag) in gameflags_map() {
            println!("{key}\t{flag}");
        }
        return Ok(());
    }

    let pipeline = Pipeline::from_config(&config)?;

    match args.command {
        Command::Generate { options, race } => {
            let options = read_option_map(&options)?;
            let record = pipeline.generate(&options, Secrecy::from_race_flag(race))?;
            println!("{}", record.id);
        }
        Command::Practice { id } => {
            let record = pipeline.practice(&id)?;
            println!("{}", record.id);
        }
        Command::Show { id } => {
            let record = pipeline.store().get(&id)?;
            println!("Id: {}", record.id);
            println!("Created: {}", record.created_at.to_rfc3339());
            println!("Race: {}", if record.race { "yes" } else { "no" });
            print!("{}", pipeline.share_details(&id)?);
        }
        Command::Spoiler { id, format } => match pipeline.spoiler(&id, format.into())? {
            SpoilerView::Withheld => match format {
                Format::Json => println!("{}", SpoilerView::WITHHELD_JSON),
                _ => eprintln!("No spoiler log available for this seed."),
            },
            SpoilerView::Text(text) => print!("{text}"),
            SpoilerView::Json(json) => println!("{json}"),
            SpoilerView::Web(web) => println!("{}", serde_json::to_string_pretty(&web)?),
        },
        Command::Download {
            id,
            rom,
            cosmetics,
            out_dir,
        } => {
            let bytes = fs::read(&rom).with_context(|| format!("reading {}", rom.display()))?;
            let cosmetics = match cosmetics {
                Some(path) => CosmeticOptions::from_options(&read_option_map(&path)?)?,
                None => CosmeticOptions::default(),
            };
            let (name, patched) = pipeline.download(&id, &bytes, &cosmetics)?;
            let path = out_dir.join(name);
            fs::write(&path, patched).with_context(|| format!("writing {}", path.display()))?;
            println!("{}", path.display());
        }
        Command::Image { id, out } => {
            let png = pipeline.verification_image(&id)?;
            fs::write(&out, png).with_context(|| format!("writing {}", out.display()))?;
        }
        Command::List { count } => {
            for record in pipeline.recent(count)? {
                let summary = if record.configuration.is_mystery() {
                    "mystery".to_string()
                } else {
                    record.configuration.flag_string()
                };
                println!(
                    "{}\t{}\t{}{}",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    summary,
                    if record.race { "\trace" } else { "" }
                );
            }
        }
        Command::Dump { id } => {
            let dump = pipeline.dump(&id)?;
            println!("Effective seed: {}", dump.effective_seed);
            print!("{}", dump.spoiler);
        }
        Command::ValidateRom { .. } | Command::Defaults => {}
    }
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<GeneratorError>().map(GeneratorError::kind) {
        Some(ErrorKind::Validation) => 2,
        Some(ErrorKind::Artifact) => 3,
        Some(ErrorKind::NotFound) => 4,
        Some(ErrorKind::Transient) => 75,
        _ => 1,
    }
}

fn main() {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_level);
    tracing::debug!(path = ?config_path, store = %config.store_dir.display(), "loaded configuration");

    if let Err(err) = run(args, config) {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}
