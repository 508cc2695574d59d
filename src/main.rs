use std::io;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use ghi2bz::bugzilla::BugFiler;
use ghi2bz::cache::DiskCache;
use ghi2bz::cli::Args;
use ghi2bz::config::{self, ConfigError, MigrationConfig};
use ghi2bz::credentials::PromptCredentials;
use ghi2bz::github::HttpSource;
use ghi2bz::logging;
use ghi2bz::migrate::{self, MigrationSummary};
use tracing::{error, info};

fn resolve_config(args: Args) -> Result<MigrationConfig, ConfigError> {
    let file = config::load_file(args.config.as_deref())?;
    let overrides = args.overrides();
    MigrationConfig::resolve(args.repo, file, overrides)
}

fn run(cfg: &MigrationConfig) -> Result<MigrationSummary, Box<dyn std::error::Error>> {
    let client = migrate::authenticate(cfg, &PromptCredentials)?;

    let cache = DiskCache::new(&cfg.cache_dir, HttpSource::new()?);
    let filer = client.as_ref().map(|c| c as &dyn BugFiler);
    let target = migrate::target_for(cfg, filer)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    Ok(migrate::run(cfg, &cache, target, &mut out)?)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let cfg = match resolve_config(args) {
        Ok(cfg) => cfg,
        Err(ConfigError::Missing { flag }) => Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                format!("the following required argument was not provided: {flag}"),
            )
            .exit(),
        Err(err @ ConfigError::Invalid(_)) => Args::command()
            .error(ErrorKind::ValueValidation, err)
            .exit(),
        Err(err) => Args::command().error(ErrorKind::Io, err).exit(),
    };

    logging::init(cfg.debug);
    info!(
        repo = %cfg.repo,
        dry_run = cfg.dry_run,
        cache_dir = %cfg.cache_dir.display(),
        "starting ghi2bz"
    );

    match run(&cfg) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "migration failed");
            ExitCode::FAILURE
        }
    }
}
