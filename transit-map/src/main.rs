//! CLI entry point: geocode raw station lists, or serve a geocoded dataset.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use transit_map::dataset::load_path;
use transit_map::lines::ColorScheme;
use transit_map::pipeline::{PipelineConfig, geocode_dir};
use transit_map::stations::{CacheFileConfig, GeocodeConfig};
use transit_map::web::{AppState, create_router};

#[derive(Parser)]
#[command(name = "transit-map")]
#[command(about = "Geocode transit station lists and draw them on a map", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Geocode a directory of per-line station lists into one dataset file
    Geocode {
        /// Directory of `<line>.csv` station lists
        #[arg(short, long)]
        input: PathBuf,

        /// Dataset file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Keep successful geocodes in this JSON file between runs
        #[arg(long)]
        cache_file: Option<PathBuf>,

        /// Days before the cache file is considered stale
        #[arg(long = "cache-ttl-days", value_name = "DAYS", default_value = "30", value_parser = parse_days)]
        cache_ttl: Duration,

        /// Station lookups in flight at once
        #[arg(short, long, default_value_t = 1)]
        concurrency: usize,

        /// Extra attempts for transient geocoder failures
        #[arg(short, long, default_value_t = 0)]
        retries: u32,

        /// Stop starting new lookups after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Country appended to every query
        #[arg(long, default_value = "Germany")]
        country: String,

        /// City appended to queries for local stations
        #[arg(long, default_value = "Berlin")]
        city: String,

        /// Geocoding endpoint
        #[arg(long)]
        geocoder_url: Option<String>,

        /// Minimum delay between outbound requests. The public Nominatim
        /// endpoint always gets at least one second.
        #[arg(long, default_value_t = 1000)]
        min_interval_ms: u64,

        /// Input files start with a header row
        #[arg(long, default_value_t = false)]
        header: bool,

        /// How lines are colored
        #[arg(long, value_enum, default_value_t = ColorScheme::Palette)]
        colors: ColorScheme,
    },
    /// Serve the map for a geocoded dataset
    Serve {
        /// Dataset file produced by `geocode`
        #[arg(short, long)]
        dataset: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,

        /// Directory of static assets
        #[arg(long, default_value = "static")]
        static_dir: String,

        /// How lines are colored
        #[arg(long, value_enum, default_value_t = ColorScheme::Palette)]
        colors: ColorScheme,
    },
}

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Parse a whole number of days into a duration.
fn parse_days(s: &str) -> Result<Duration, String> {
    let days: u64 = s
        .parse()
        .map_err(|e| format!("invalid number of days {s:?}: {e}"))?;
    days.checked_mul(SECS_PER_DAY)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("{days} days is too long"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("transit_map=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Geocode {
            input,
            output,
            cache_file,
            cache_ttl,
            concurrency,
            retries,
            deadline_secs,
            country,
            city,
            geocoder_url,
            min_interval_ms,
            header,
            colors,
        } => {
            let mut geocode = GeocodeConfig::new()
                .with_region(city, country)
                .with_min_interval(Duration::from_millis(min_interval_ms));
            if let Some(url) = geocoder_url {
                geocode = geocode.with_base_url(url);
            }

            let mut config = PipelineConfig::new(geocode)
                .with_concurrency(concurrency)
                .with_max_retries(retries)
                .with_color_scheme(colors)
                .with_header(header);
            if let Some(secs) = deadline_secs {
                config = config.with_deadline(Duration::from_secs(secs));
            }
            if let Some(path) = cache_file {
                config = config.with_cache_file(CacheFileConfig::new(path).with_ttl(cache_ttl));
            }

            let report = geocode_dir(&input, &output, &config)
                .await
                .with_context(|| format!("geocoding {}", input.display()))?;
            report.log_summary();
        }
        Commands::Serve {
            dataset,
            addr,
            static_dir,
            colors,
        } => {
            let loaded = load_path(&dataset, colors)
                .with_context(|| format!("loading {}", dataset.display()))?;
            let state = AppState::new(loaded.lines);
            info!(
                lines = state.lines.len(),
                stations = state.station_count(),
                malformed_rows = loaded.malformed_rows,
                "dataset loaded"
            );

            let app = create_router(state, &static_dir);

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            info!("transit map listening on http://{addr}");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
