#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use log_export::core::{ConfigOverrides, ExportConfig, SchemaKind};
use log_export::{ExportResult, export_cmd};

#[derive(Parser, Debug)]
#[command(name = "log-export")]
#[command(about = "Export recent search-cluster logs to a time-sorted CSV", long_about = None)]
struct Cli {
    /// Enable verbose logging (or set LOG_EXPORT_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch documents and write the sorted CSV
    Export {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print the search request body without contacting the cluster
    Query {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Search cluster base URL
    #[arg(long)]
    endpoint: Option<String>,
    /// Index name or pattern
    #[arg(long)]
    index: Option<String>,
    /// Column layout
    #[arg(long, value_enum)]
    schema: Option<SchemaKind>,
    /// IANA time zone for timestamps (e.g., Europe/Istanbul)
    #[arg(long)]
    timezone: Option<String>,
    /// How many days back to query
    #[arg(long)]
    lookback_days: Option<u32>,
    /// Round the query window to whole days
    #[arg(long, overrides_with = "no_day_aligned")]
    day_aligned: bool,
    /// Query a rolling window even if the config file sets `day_aligned`
    #[arg(long, overrides_with = "day_aligned")]
    no_day_aligned: bool,
    /// Output file name prefix
    #[arg(long)]
    prefix: Option<String>,
    /// Directory for the generated file
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Write to this exact path instead of a derived file name
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ConfigArgs {
    fn resolve(self) -> ExportResult<ExportConfig> {
        let overrides = ConfigOverrides {
            endpoint: self.endpoint,
            index: self.index,
            schema: self.schema,
            timezone: self.timezone,
            lookback_days: self.lookback_days,
            day_aligned: match (self.day_aligned, self.no_day_aligned) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            prefix: self.prefix,
            output_dir: self.output_dir,
            output: self.output,
        };
        Ok(ExportConfig::load_or_default(self.config.as_deref())?.apply(overrides))
    }
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("LOG_EXPORT_LOG").unwrap_or_else(|_| {
        if verbose { "log_export=debug".to_string() } else { "log_export=info".to_string() }
    });
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn run(command: Commands) -> ExportResult<()> {
    match command {
        Commands::Export { config } => {
            let config = config.resolve()?;
            let summary = export_cmd::run(&config)?;
            println!("{}", summary.path.display());
            Ok(())
        }
        Commands::Query { config } => {
            let config = config.resolve()?;
            let body = export_cmd::query_body(&config)?;
            let pretty = serde_json::to_string_pretty(&body)
                .map_err(|e| log_export::ExportError::Message(e.to_string()))?;
            println!("{pretty}");
            Ok(())
        }
    }
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("{:#}", e);
        std::process::exit(e.exit_code());
    }
}
