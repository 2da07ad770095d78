use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tunebridge::{
    itunes, CatalogClient, Cooldown, PlaylistTransfer, RetryPolicy, SpotifyApi, TransferConfig,
};

#[derive(Parser)]
#[command(name = "tunebridge-cli")]
#[command(about = "CLI for Tunebridge - iTunes to Spotify playlist transfer", long_about = None)]
struct Cli {
    /// Spotify access token (can also be set via SPOTIFY_ACCESS_TOKEN env var)
    #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Number of concurrent catalog lookups
    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    /// Pause before writing the playlist, in milliseconds
    #[arg(long, default_value_t = 1000)]
    cooldown_ms: u64,

    /// Wait out the last server back-off instead (never less than --cooldown-ms)
    #[arg(long)]
    adaptive_cooldown: bool,

    /// Give up after this many consecutive rate-limited responses
    #[arg(long)]
    max_retries: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match an iTunes export and save the matches as a new Spotify playlist
    Transfer {
        /// Tab-separated playlist export from iTunes
        file: PathBuf,

        /// Name of the playlist to create
        #[arg(short, long)]
        name: String,
    },
    /// Match an iTunes export without creating a playlist
    Match {
        /// Tab-separated playlist export from iTunes
        file: PathBuf,
    },
    /// Search the catalog the way a song lookup does
    Search {
        /// Search query, e.g. "track:Yesterday artist:The Beatles"
        query: String,

        /// Limit results (the catalog serves at most 50)
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
    /// Print the songs read from an iTunes export
    Parse {
        /// Tab-separated playlist export from iTunes
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut api = SpotifyApi::new(cli.token.as_deref().unwrap_or(""))?;
    api.set_retry_policy(RetryPolicy {
        max_retries: cli.max_retries,
        ..RetryPolicy::default()
    });
    if let Commands::Search { limit, .. } = &cli.command {
        api.set_search_limit(*limit);
    }
    let api = Arc::new(api);

    let cooldown = match (cli.adaptive_cooldown, cli.cooldown_ms) {
        (true, ms) => Cooldown::Adaptive {
            floor: Duration::from_millis(ms),
        },
        (false, 0) => Cooldown::None,
        (false, ms) => Cooldown::Fixed(Duration::from_millis(ms)),
    };
    let transfer = PlaylistTransfer::with_config(
        Arc::clone(&api),
        TransferConfig {
            workers: cli.workers,
            cooldown,
        },
    );

    match &cli.command {
        Commands::Transfer { file, name } => {
            let songs = itunes::read_playlist(File::open(file)?)?;

            match transfer.run(name, songs).await {
                Ok(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
                Err(e) => {
                    eprintln!("{}", serde_json::to_string_pretty(&e.report())?);
                    std::process::exit(1);
                }
            }
        }
        Commands::Match { file } => {
            let songs = itunes::read_playlist(File::open(file)?)?;
            let results = transfer.match_songs(songs).await;

            println!("Matched {}/{}", results.matched.len(), results.total);
            if !results.unmatched.is_empty() {
                println!("Unmatched songs:");
                for miss in &results.unmatched {
                    println!(
                        "   - {} - {}: {}",
                        miss.song.artist, miss.song.name, miss.reason
                    );
                }
            }
        }
        Commands::Search { query, .. } => {
            println!("Searching for '{}'...", query);
            let results = api.search_tracks(query).await?;
            for (i, track) in results.iter().enumerate() {
                println!(
                    "{}. {} - {} [{}] (ID: {})",
                    i + 1,
                    track.artists_string(", "),
                    track.name,
                    track.album,
                    track.id
                );
            }
        }
        Commands::Parse { file } => {
            let songs = itunes::read_playlist(File::open(file)?)?;
            println!("{}", serde_json::to_string_pretty(&songs)?);
        }
    }

    Ok(())
}
