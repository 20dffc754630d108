use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::game::GameSession;
use server::hub::BroadcastHub;
use server::network::{Server, WS_PATH};
use server::words::WordPool;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Word list, one word per line or comma separated
    #[arg(short, long, env = "CODENAMES_WORDS", default_value = "words.txt")]
    words: PathBuf,

    /// Maximum number of concurrently connected observers
    #[arg(short, long, default_value = "64")]
    max_observers: usize,

    /// Seed for a reproducible board
    #[arg(short, long, env = "CODENAMES_SEED")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let pool = WordPool::load(&args.words)?;
    let rng = match args.seed {
        Some(seed) => {
            info!("Using board seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let session = Arc::new(GameSession::new(pool, rng));

    // A corpus that cannot fill a board is fatal before anyone connects.
    session.board().await?;

    let hub = Arc::new(BroadcastHub::new(session, args.max_observers));
    let address = format!("{}:{}", args.host, args.port);
    let server = Server::bind(&address, hub).await?;
    info!(
        "Observers connect at ws://{}{}",
        server.local_addr()?,
        WS_PATH
    );

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
