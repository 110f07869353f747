use crate::client::Sender;
use crate::room::{Room, SharedRoom};
use clap::Parser;
use common::GameState;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, Level};
use warp::{
    http::{header, Method},
    Filter, Rejection, Reply,
};

mod client;
mod handler;
mod room;
mod util;
mod ws;

/// Authoritative server for a two-player game of thaler.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: IpAddr,
    /// Server port to listen on
    #[clap(short, long, default_value = "8765")]
    port: u16,
    /// Directory for the daily rolling JSON log
    #[clap(long, default_value = "./logs")]
    log_dir: PathBuf,
    /// Most verbose level written to the log
    #[clap(long, default_value = "info")]
    log_level: Level,
    /// Seed for peg and thaler placement, for reproducible boards
    #[clap(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let file_appender = tracing_appender::rolling::daily(&args.log_dir, "server.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(args.log_level)
        .with_writer(non_blocking)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("could not install the log subscriber: {}", err);
    }

    let game_state = match args.seed {
        Some(seed) => GameState::random(&mut StdRng::seed_from_u64(seed)),
        None => GameState::default(),
    };
    let room: SharedRoom<Sender> = Arc::new(RwLock::new(Room::new(game_state)));
    info!("created room, seed {:?}", args.seed);

    let addr = SocketAddr::new(args.host, args.port);
    info!("listening on ws://{}/ws", addr);
    warp::serve(routes(room)).run(addr).await;
}

fn routes(
    room: SharedRoom<Sender>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health_route = warp::path!("health").and_then(handler::health_handler);

    let ws_route = warp::path("ws")
        .and(warp::ws())
        .and(with_room(room))
        .and_then(handler::ws_handler);

    health_route.or(ws_route).with(
        warp::cors()
            .allow_methods(&[Method::OPTIONS, Method::GET])
            .allow_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .max_age(300)
            .allow_any_origin(),
    )
}

fn with_room(
    room: SharedRoom<Sender>,
) -> impl Filter<Extract = (SharedRoom<Sender>,), Error = Infallible> + Clone {
    warp::any().map(move || room.clone())
}
