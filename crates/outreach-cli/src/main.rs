//! `outreach` — terminal client for the Journey On outreach tracker.
//!
//! # Usage
//!
//! ```text
//! outreach record --risk medium --condition "Sleeping" --new-person
//! outreach list --anonymous-id 3f2a...
//! outreach update <id> --status closed
//! outreach export --output encounters.csv
//! outreach --url http://tracker.internal:3000 health
//! ```

mod client;
mod form;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use form::{CONDITIONS, RecordForm, UpdateForm};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:3000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "outreach", version, about = "Record and review outreach encounters")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE", global = true)]
  config: Option<PathBuf>,

  /// Base URL of the outreach server (default: http://localhost:3000).
  #[arg(long, env = "OUTREACH_URL", global = true)]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Record a new encounter.
  Record(RecordForm),

  /// Print the observed-condition checklist.
  Conditions,

  /// List encounters, newest first.
  List {
    /// Only encounters with this anonymous id.
    #[arg(long)]
    anonymous_id: Option<String>,
  },

  /// Show one encounter in full.
  Show { id: String },

  /// Change some fields of an encounter.
  Update {
    id: String,

    #[command(flatten)]
    form: UpdateForm,
  },

  /// Download every encounter as CSV.
  Export {
    /// Write to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
  },

  /// Check that the server is up.
  Health,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

impl ConfigFile {
  fn load(path: Option<&Path>) -> Result<Self> {
    let Some(path) = path else {
      return Ok(Self::default());
    };
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let file_cfg = ConfigFile::load(args.config.as_deref())?;

  // CLI flags (and OUTREACH_URL) override the config file, which overrides
  // the default.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
  };
  tracing::debug!(url = %api_config.base_url, "using server");

  let client = ApiClient::new(api_config)?;
  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Record(form) => {
      let encounter = client.create(&form.payload()).await?;
      println!("Recorded encounter {}", encounter.id);
      println!("Anonymous id: {}", encounter.anonymous_id);
    }

    Command::Conditions => {
      for condition in CONDITIONS {
        println!("{condition}");
      }
    }

    Command::List { anonymous_id } => {
      let filter = anonymous_id.as_deref().filter(|a| !a.is_empty());
      let encounters = client.list(filter).await?;
      if encounters.is_empty() {
        println!("No encounters.");
      }
      for e in &encounters {
        println!("{}", render::summary_line(e));
      }
    }

    Command::Show { id } => {
      let encounter = client.get(&id).await?;
      println!("{}", render::detail(&encounter));
    }

    Command::Update { id, form } => {
      let patch = form
        .payload()
        .context("nothing to update; pass at least one field flag")?;
      let encounter = client.update(&id, &patch).await?;
      println!("{}", render::detail(&encounter));
    }

    Command::Export { output } => {
      let csv = client.export().await?;
      match output {
        Some(path) => {
          std::fs::write(&path, csv)
            .with_context(|| format!("writing {}", path.display()))?;
          eprintln!("Wrote {}", path.display());
        }
        None => print!("{csv}"),
      }
    }

    Command::Health => {
      let health = client.health().await?;
      println!("{} ({})", health.status, health.timestamp);
    }
  }
  Ok(())
}
