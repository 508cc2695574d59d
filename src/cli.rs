use std::path::PathBuf;

use clap::Parser;

use crate::config::ConfigOverrides;

/// Export issues from a GitHub issue tracker to a Bugzilla instance.
#[derive(Parser, Debug)]
#[command(name = "ghi2bz", version, about, long_about = None)]
pub struct Args {
    /// Print out issues, do not import them.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Base url of the Bugzilla server. Must end with '/'.
    #[arg(long = "bz_url", value_name = "URL")]
    pub bz_url: Option<String>,

    /// Bugzilla user name. Asked for interactively when omitted.
    #[arg(long = "bz_user", value_name = "USER")]
    pub bz_user: Option<String>,

    /// Bugzilla product name.
    #[arg(long = "bz_product", value_name = "PRODUCT")]
    pub bz_product: Option<String>,

    /// Bugzilla component name.
    #[arg(long = "bz_component", value_name = "COMPONENT")]
    pub bz_component: Option<String>,

    /// GitHub repos API base.
    #[arg(long = "github_url", value_name = "URL", env = "GHI2BZ_GITHUB_URL")]
    pub github_url: Option<String>,

    /// Directory holding issues.json and the per-issue comment files.
    #[arg(long = "cache_dir", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Config file with defaults for the flags above.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Name of the GitHub repo, in the form owner/repo.
    pub repo: String,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            dry_run: self.dry_run,
            bz_url: self.bz_url.clone(),
            bz_user: self.bz_user.clone(),
            bz_product: self.bz_product.clone(),
            bz_component: self.bz_component.clone(),
            github_url: self.github_url.clone(),
            cache_dir: self.cache_dir.clone(),
            debug: self.debug.then_some(true),
        }
    }
}
