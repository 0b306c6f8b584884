//! Run configuration, layered from a TOML file, `COURSEFIX_*` environment
//! variables, and command-line overrides.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use coursefix_core::normalize::{DEFAULT_MAX_SLUG_ATTEMPTS, NormalizeOptions};
use serde::Deserialize;

/// Deserialised run configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
  /// `sqlite://<path>`, a bare path, or `:memory:`.
  pub database_url:      String,
  #[serde(default = "default_max_slug_attempts")]
  pub max_slug_attempts: usize,
  #[serde(default)]
  pub dry_run:           bool,
}

fn default_max_slug_attempts() -> usize { DEFAULT_MAX_SLUG_ATTEMPTS }

impl RunConfig {
  /// Build the configuration. `uri` and `dry_run` from the command line win
  /// over both the file and the environment.
  pub fn load(file: &Path, uri: Option<String>, dry_run: bool) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("COURSEFIX"))
      .set_override_option("database_url", uri)?
      .set_override_option("dry_run", dry_run.then_some(true))?
      .build()
      .context("failed to read configuration")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise RunConfig (is COURSEFIX_DATABASE_URL set?)")?;
    anyhow::ensure!(
      cfg.max_slug_attempts >= 1,
      "invalid configuration: max_slug_attempts must be at least 1, got {}",
      cfg.max_slug_attempts
    );
    Ok(cfg)
  }

  pub fn options(&self) -> NormalizeOptions {
    NormalizeOptions { max_slug_attempts: self.max_slug_attempts, dry_run: self.dry_run }
  }

  /// The database URL with a leading `~` in its path expanded.
  pub fn database_url(&self) -> String {
    let url = &self.database_url;
    let (scheme, path) = match url.strip_prefix("sqlite://") {
      Some(path) => ("sqlite://", path),
      None => ("", url.as_str()),
    };
    format!("{scheme}{}", expand_tilde(Path::new(path)).display())
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
