use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use intervalgraph_core::{
    analyze_session, load_config, load_meta, meta_path_for, metrics, print_report, read_stream_csv,
    save_meta, write_stream_csv, AnalysisConfig, AnalyzeInputs, StravaClient,
};

#[derive(Parser)]
#[command(
    name = "intervalgraph",
    version,
    about = "Multi-scale interval detection for run sessions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyser en økt lagret som CSV (time_s, speed_kmh, bpm[, altitude_m])
    Analyze {
        csv: PathBuf,
        /// JSON-oppsett; standardoppsett hvis utelatt
        #[arg(long)]
        config: Option<PathBuf>,
        /// Metadata (JSON) til rapporthodet; ellers `<csv>.meta.json` hvis den finnes
        #[arg(long)]
        meta: Option<PathBuf>,
        /// Skriv rapporten som JSON i stedet for tekst
        #[arg(long)]
        json: bool,
        /// Slå på klassifisering (korte / lange drag)
        #[arg(long)]
        classify: bool,
        /// Skriv Prometheus-metrikker til stderr etterpå
        #[arg(long)]
        metrics: bool,
    },
    /// Hent strømmer og metadata for en Strava-aktivitet; lagres som CSV og
    /// `<out>.meta.json`
    Fetch {
        activity_id: u64,
        #[arg(long)]
        token: String,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Command::Analyze { csv, config, meta, json, classify, metrics: show_metrics } => {
            let mut cfg = match &config {
                Some(path) => load_config(path)
                    .with_context(|| format!("reading config {}", path.display()))?,
                None => AnalysisConfig::default(),
            };
            cfg.classify |= classify;

            let stream = read_stream_csv(&csv)
                .with_context(|| format!("reading stream {}", csv.display()))?;
            let meta_path = meta.or_else(|| Some(meta_path_for(&csv)).filter(|p| p.exists()));
            let meta = match &meta_path {
                Some(path) => Some(
                    load_meta(path).with_context(|| format!("reading meta {}", path.display()))?,
                ),
                None => None,
            };
            let inputs = AnalyzeInputs { stream: &stream, meta: meta.as_ref(), config: &cfg };
            let report = analyze_session(inputs).context("analysis failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            if show_metrics {
                eprint!("{}", metrics::gather_text());
            }
        }
        Command::Fetch { activity_id, token, out } => {
            let client = StravaClient::new();
            let stream = client
                .fetch_streams(activity_id, &token)
                .with_context(|| format!("fetching streams for activity {activity_id}"))?;
            let meta = client
                .fetch_activity_meta(activity_id, &token)
                .with_context(|| format!("fetching activity {activity_id}"))?;
            write_stream_csv(&stream, &out).with_context(|| format!("writing {}", out.display()))?;
            let meta_out = meta_path_for(&out);
            save_meta(&meta, &meta_out)
                .with_context(|| format!("writing {}", meta_out.display()))?;
            println!("Streams saved to {} (meta: {})", out.display(), meta_out.display());
        }
    }
    Ok(())
}
