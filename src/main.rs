//! CLI for wsrelay
//!
//! Subcommands:
//! - `serve`: run the relay (default)
//! - `publish`: connect as a publisher and send payloads
//! - `subscribe`: connect as a subscriber and print what arrives

use clap::{Parser, Subcommand};
use tracing::{error, info};
use wsrelay::client::{RelayPublisher, subscribe};
use wsrelay::config::{Settings, load_config};
use wsrelay::relay::RelayMessage;
use wsrelay::transport::RelayServer;
use wsrelay::utils::{Result, logging};

#[derive(Parser)]
#[command(name = "wsrelay", about = "Publisher/subscriber WebSocket relay")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the relay server
    Serve,
    /// Publish payloads to a running relay
    Publish {
        /// Relay URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8000")]
        url: String,
        /// Send payloads as raw bytes instead of JSON text
        #[arg(long)]
        binary: bool,
        /// Payloads to send, one message each
        #[arg(required = true)]
        payloads: Vec<String>,
    },
    /// Print messages relayed from publishers
    Subscribe {
        /// Relay URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8000")]
        url: String,
        /// Stop after this many messages
        #[arg(long)]
        count: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => match load_config() {
            Ok(config) => {
                logging::init(&config.log.level);
                run_server(config).await
            }
            Err(e) => {
                logging::init("info");
                Err(e)
            }
        },
        Command::Publish {
            url,
            binary,
            payloads,
        } => {
            logging::init("info");
            run_publish(&url, binary, payloads).await
        }
        Command::Subscribe { url, count } => {
            logging::init("info");
            run_subscribe(&url, count).await
        }
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run_server(config: Settings) -> Result<()> {
    let server = RelayServer::bind(&config.server.addr(), config.relay).await?;
    info!(addr = %server.local_addr()?, "relay started");

    tokio::select! {
        served = server.run() => {
            served?;
            error!("Relay server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_publish(url: &str, binary: bool, payloads: Vec<String>) -> Result<()> {
    let mut publisher = RelayPublisher::connect(url).await?;
    for payload in payloads {
        if binary {
            publisher.publish_bytes(payload.into_bytes()).await?;
        } else {
            // Validate, then send exactly what was given.
            serde_json::from_str::<serde_json::Value>(&payload)?;
            publisher.publish(RelayMessage::Text(payload.into())).await?;
        }
    }
    publisher.close().await
}

async fn run_subscribe(url: &str, count: Option<usize>) -> Result<()> {
    let mut subscription = subscribe(url).await?;
    let mut received = 0;
    while count.is_none_or(|limit| received < limit) {
        let Some(msg) = subscription.next().await else {
            break;
        };
        match msg? {
            RelayMessage::Text(text) => println!("{text}"),
            RelayMessage::Binary(data) => println!("<{} bytes>", data.len()),
        }
        received += 1;
    }
    Ok(())
}
