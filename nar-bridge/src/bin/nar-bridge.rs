use clap::Parser;
use mimalloc::MiMalloc;
use nar_bridge::{AppState, NarCache};
use std::num::NonZeroUsize;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Expose the Nix HTTP Binary Cache protocol for a tvix-store.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, env, default_value = "grpc+http://[::1]:8000")]
    path_info_service_addr: String,

    /// The priority to announce at the `nix-cache-info` endpoint.
    /// A lower number means it's *more preferred.
    #[arg(long, env, default_value_t = 39)]
    priority: u64,

    /// The number of NARs to remember between a narinfo and a NAR request.
    #[arg(long, env, default_value = "1000")]
    nar_cache_capacity: NonZeroUsize,

    /// A global log level to use when printing logs.
    /// It's also possible to set `RUST_LOG` according to
    /// `tracing_subscriber::filter::EnvFilter`, which will always have
    /// priority.
    #[arg(long, env, default_value_t = Level::INFO)]
    log_level: Level,

    /// Print logs as JSON, one object per line.
    #[arg(long, env)]
    json_logs: bool,

    /// The address to listen on.
    #[clap(flatten)]
    listen_args: tokio_listener::ListenerAddressLFlag,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    nar_bridge_tracing::TracingBuilder::default()
        .level(cli.log_level)
        .json(cli.json_logs)
        .build()?;

    let path_info_service =
        nar_bridge_store::pathinfoservice::from_addr(&cli.path_info_service_addr).await?;

    let state = AppState::new(path_info_service, NarCache::new(cli.nar_cache_capacity));

    let app = nar_bridge::gen_router(cli.priority)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listen_address = &cli.listen_args.listen_address.unwrap_or_else(|| {
        "[::]:8000"
            .parse()
            .expect("invalid fallback listen address")
    });

    let listener = tokio_listener::Listener::bind(
        listen_address,
        &Default::default(),
        &cli.listen_args.listener_options,
    )
    .await?;

    info!(listen_address=%listen_address, "starting daemon");

    tokio_listener::axum07::serve(
        listener,
        app.into_make_service_with_connect_info::<tokio_listener::SomeSocketAddrClonable>(),
    )
    .await?;

    Ok(())
}
