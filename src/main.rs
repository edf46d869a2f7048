use std::{error::Error, pin::pin, process};

use clap::{command, Parser, Subcommand, ValueEnum, ValueHint};
use futures_util::{stream, Stream, StreamExt, TryStreamExt};
use log::{debug, error, info, LevelFilter};
use serde::Serialize;

use vkaudio::{
    audio::VkAudio, config::Config, protocol::catalog::SearchScope, secrets::Secrets,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when not built release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Secrets file
    ///
    /// Ensure that the this file is kept secure and not shared publicly, as it
    /// contains the session cookie of your VK account.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath, default_value_t = String::from("secrets.toml"))]
    secrets_file: String,

    /// Keep HLS playlist URLs instead of rewriting them to MP3 files
    #[arg(long, default_value_t = false)]
    no_m3u8_conversion: bool,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// List the tracks of an owner or album
    List {
        /// Owner ID, negative for communities [default: own account]
        #[arg(short, long, allow_negative_numbers = true)]
        owner: Option<i64>,

        /// Album ID
        #[arg(short, long)]
        album: Option<i64>,

        /// Access hash of a private album
        #[arg(long, requires = "album")]
        access_hash: Option<String>,

        /// Print the unresolved audio tuples
        #[arg(long, default_value_t = false)]
        raw: bool,
    },

    /// List the albums of an owner
    Albums {
        /// Owner ID, negative for communities [default: own account]
        #[arg(short, long, allow_negative_numbers = true)]
        owner: Option<i64>,
    },

    /// Search the catalog
    Search {
        query: String,

        /// Number of results to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum number of results
        #[arg(long)]
        count: Option<usize>,

        /// Where to search
        #[arg(long, value_enum, default_value_t = Scope::Global)]
        scope: Scope,

        /// Print the unresolved audio tuples
        #[arg(long, default_value_t = false, conflicts_with = "count")]
        raw: bool,
    },

    /// List recent additions of friends and communities
    Updates,

    /// List the popular chart
    Popular {
        /// Number of entries to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// List new releases
    News {
        /// Number of entries to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Show a single track
    Track {
        #[arg(allow_negative_numbers = true)]
        owner: i64,
        id: i64,
    },

    /// List the tracks attached to a wall post
    Post {
        #[arg(allow_negative_numbers = true)]
        owner: i64,
        id: i64,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Scope {
    Global,
    Owned,
    Lyrics,
}

impl From<Scope> for SearchScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Global => Self::Global,
            Scope::Owned => Self::Owned,
            Scope::Lyrics => Self::Lyrics,
        }
    }
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
///
/// # Panics
///
/// Panics when a logger facade is already initialized.
fn init_logger(config: &Args) {
    let mut logger = env_logger::Builder::from_env(
        // Note: if you change the default logging level here, then you should
        // probably also change the verbosity levels below.
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if config.quiet || config.verbose > 0 {
        let level = match config.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module(module_path!(), level);
    }

    logger.init();
}

/// Loads the session secrets from a file.
fn load_secrets(secrets_file: &str) -> vkaudio::error::Result<Secrets> {
    let secrets = Secrets::from_file(secrets_file);

    if let Err(ref e) = secrets {
        if e.kind == vkaudio::error::ErrorKind::NotFound {
            info!("copy secrets.toml.example to {secrets_file} and set your session cookie");
        }
    }

    secrets
}

/// Prints every item of `items` as one line of JSON.
async fn print_all<S, I>(items: S) -> Result<usize, Box<dyn Error>>
where
    S: Stream<Item = vkaudio::error::Result<I>>,
    I: Serialize,
{
    let mut items = pin!(items);
    let mut count = 0;
    while let Some(item) = items.try_next().await? {
        println!("{}", serde_json::to_string(&item)?);
        count += 1;
    }

    Ok(count)
}

/// Runs the requested command until its listing is exhausted.
async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let secrets = load_secrets(&args.secrets_file)?;

    let mut config = Config::with_secrets(secrets);
    config.convert_m3u8_links = !args.no_m3u8_conversion;

    let vk = VkAudio::connect(&config).await?;

    let count = match args.command {
        Command::List {
            owner,
            album,
            access_hash,
            raw,
        } => {
            if raw {
                print_all(vk.get_iter_raw(owner, album, access_hash)).await?
            } else {
                print_all(vk.get_iter(owner, album, access_hash)).await?
            }
        }
        Command::Albums { owner } => print_all(vk.get_albums_iter(owner)).await?,
        Command::Search {
            query,
            offset,
            count,
            scope,
            raw,
        } => {
            if raw {
                print_all(vk.search_iter_raw(&query, offset, scope.into())).await?
            } else {
                let tracks = vk.search_iter(&query, offset, scope.into());
                print_all(tracks.take(count.unwrap_or(usize::MAX))).await?
            }
        }
        Command::Updates => print_all(vk.get_updates_iter()).await?,
        Command::Popular { offset } => print_all(vk.get_popular_iter(offset)).await?,
        Command::News { offset } => print_all(vk.get_news_iter(offset)).await?,
        Command::Track { owner, id } => {
            let track = vk.get_audio_by_id(owner, id).await?;
            print_all(stream::iter(track.map(Ok))).await?
        }
        Command::Post { owner, id } => {
            let tracks = vk.get_post_audio(owner, id).await?;
            print_all(stream::iter(tracks.into_iter().map(Ok))).await?
        }
    };

    info!("listed {count} items");
    Ok(())
}

/// Main entry point of the application.
///
/// This function initializes the logger facade, parses the command line
/// arguments, and runs the command until it completes or is interrupted.
#[tokio::main]
async fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    info!("starting {name}/{version}; {BUILD_PROFILE}");

    tokio::select! {
        // Prioritize shutdown signals.
        biased;

        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, stopping");
        }

        result = run(args) => {
            if let Err(e) = result {
                error!("{e}");
                process::exit(1);
            }
        }
    }
}
