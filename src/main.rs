use std::{path::PathBuf, time::Duration};

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotseek::{catalog::PlaylistLayout, cli, config, config::AcquireSettings, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Acquire every catalog track from the Soulseek network
    Fetch(FetchOptions),

    /// Write M3U files for the catalog's playlists and albums
    Playlists(PlaylistsOptions),

    /// Show how much of each album and playlist is on disk
    Status(StatusOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct CatalogArgs {
    /// Catalog JSON files; later files override earlier ones on id collision
    #[clap(default_value = "track_index.json")]
    pub catalogs: Vec<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct FetchOptions {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Directory the tracks are written to
    #[clap(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Target file extension
    #[clap(long, default_value = "mp3")]
    pub ext: String,

    /// Seconds to wait for the first search results
    #[clap(long, default_value_t = 10)]
    pub search_timeout: u64,

    /// Seconds a started transfer may take to complete
    #[clap(long, default_value_t = 60)]
    pub download_timeout: u64,

    /// Seconds to wait for a requested transfer to start
    #[clap(long, default_value_t = 10)]
    pub appear_timeout: u64,

    /// Maximum number of albums or tracks acquired at the same time
    #[clap(long, default_value_t = 2)]
    pub concurrent: usize,

    /// Files smaller than this many bytes are treated as truncated
    #[clap(long, default_value_t = 1000)]
    pub min_size: u64,

    /// Top-level search attempts per track
    #[clap(long, default_value_t = 3)]
    pub max_attempts: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistsOptions {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Directory holding the acquired tracks
    #[clap(long, default_value = "output")]
    pub tracks_dir: PathBuf,

    #[clap(long, default_value = "Playlists")]
    pub playlist_dir: PathBuf,

    #[clap(long, default_value = "Albums")]
    pub album_dir: PathBuf,

    #[clap(long, default_value = "mp3")]
    pub ext: String,
}

#[derive(Parser, Debug, Clone)]
pub struct StatusOptions {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    #[clap(short, long, default_value = "output")]
    pub output: PathBuf,

    #[clap(long, default_value = "mp3")]
    pub ext: String,

    #[clap(long, default_value_t = 1000)]
    pub min_size: u64,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

impl From<&FetchOptions> for AcquireSettings {
    fn from(opt: &FetchOptions) -> Self {
        AcquireSettings {
            output_dir: opt.output.clone(),
            extension: opt.ext.clone(),
            search_timeout: Duration::from_secs(opt.search_timeout),
            download_timeout: Duration::from_secs(opt.download_timeout),
            appear_timeout: Duration::from_secs(opt.appear_timeout),
            min_file_size: opt.min_size,
            max_attempts: opt.max_attempts,
            concurrency: opt.concurrent,
            ..AcquireSettings::default()
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Fetch(opt) => {
            let settings = AcquireSettings::from(&opt);
            cli::fetch(opt.catalog.catalogs, settings).await
        }
        Command::Playlists(opt) => {
            let layout = PlaylistLayout {
                playlist_dir: opt.playlist_dir,
                album_dir: opt.album_dir,
                track_dir: opt.tracks_dir,
                extension: opt.ext.trim_start_matches('.').to_string(),
            };
            cli::playlists(opt.catalog.catalogs, layout).await
        }
        Command::Status(opt) => {
            let settings = AcquireSettings {
                output_dir: opt.output,
                extension: opt.ext,
                min_file_size: opt.min_size,
                ..AcquireSettings::default()
            };
            cli::status(opt.catalog.catalogs, settings).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
