// GridTunes - Spotify in a grid of terminal panes
// No arguments opens the TUI, `player` does one playback action and exits

use anyhow::{Context, Result};
use tracing::{error, info};

use gridtunes::cli::{Cli, Cmdline};
use gridtunes::spotify::Endpoints;
use gridtunes::ui::App;
use gridtunes::{session, Authorizer, Config, CredentialStore, Refresher, SpotifyClient};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cmdline::parse_args(std::env::args_os());

    // Load config - written with defaults on first run
    let config = Config::load()?;
    let _log_guard = gridtunes::logging::init(&config.log_dir, args.dev)?;
    info!(dev = args.dev, "gridtunes starting");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = CredentialStore::open(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;

    let client = SpotifyClient::new(Endpoints::default())?;
    let authorizer = Authorizer::new(client.clone())
        .with_timeouts(config.network.auth_timeout(), config.network.settle_delay());
    let refresher = Refresher::new(client.clone()).with_timeout(config.network.refresh_timeout());

    let credentials = session::setup(
        &store,
        &config.client_info(),
        &authorizer,
        &refresher,
        |url| {
            println!("Log in to Spotify by visiting:\n\n  {url}\n");
            if let Err(e) = open::that(url.as_str()) {
                error!("could not open a browser: {e}");
            }
        },
    )
    .await?;

    match args.command {
        Some(command) => {
            let mut cli = Cli::new(
                client,
                refresher,
                &store,
                credentials,
                config.spotify.market.clone(),
            );
            let outcome = cli.run(command).await;
            drop(cli);
            store.close()?;
            match outcome {
                Ok(line) => println!("{line}"),
                Err(e) => {
                    error!("{e:#}");
                    return Err(e);
                }
            }
        }
        None => {
            let app = App::new(&config, credentials, client, refresher, store)?;
            app.run().await?;
        }
    }

    info!("gridtunes exiting");
    Ok(())
}
