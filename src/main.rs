//! CLI for pullsub
//!
//! Subcommands:
//! - `server`: run the WebSocket broker
//! - `publish`: register as a publisher, create a topic and send messages
//! - `subscribe`: register as a subscriber and poll a topic

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pullsub::broker::Broker;
use pullsub::client::PubSubClient;
use pullsub::config::{DEFAULT_CONFIG_PATH, load_config_from};
use pullsub::transport::start_websocket_server;
use pullsub::utils::{Result, logging};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "pullsub")]
enum Command {
    /// Start the WebSocket broker
    Server {
        /// Configuration file (extension optional)
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,
    },
    /// Create a topic and publish messages to it
    Publish {
        #[arg(long, default_value = "ws://127.0.0.1:5000")]
        url: String,
        #[arg(long)]
        topic: String,
        /// Messages to send, in order
        #[arg(required = true)]
        messages: Vec<String>,
    },
    /// Subscribe to a topic and print pulled messages
    Subscribe {
        #[arg(long, default_value = "ws://127.0.0.1:5000")]
        url: String,
        #[arg(long)]
        topic: String,
        /// Number of pulls before exiting
        #[arg(long, default_value_t = 1)]
        polls: u32,
        /// Delay between pulls
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let result = match Command::parse() {
        Command::Server { config } => run_server(&config).await,
        Command::Publish {
            url,
            topic,
            messages,
        } => {
            logging::init("info");
            run_publisher(&url, &topic, &messages).await
        }
        Command::Subscribe {
            url,
            topic,
            polls,
            interval_ms,
        } => {
            logging::init("info");
            run_subscriber(&url, &topic, polls, Duration::from_millis(interval_ms)).await
        }
    };

    if let Err(e) = result {
        // No-op when a subcommand already installed the subscriber.
        logging::init("info");
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run_server(config_path: &str) -> Result<()> {
    let config = load_config_from(config_path)?;
    logging::init(&config.logging.level);

    let addr = config.server.addr();
    let broker = Arc::new(Broker::new());

    tokio::select! {
        res = start_websocket_server(addr, broker, config) => {
            res?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_publisher(url: &str, topic: &str, messages: &[String]) -> Result<()> {
    let mut api = PubSubClient::connect(url).await?;
    let pid = api.register_publisher().await?;
    info!("Registered as publisher {pid}");

    api.create_topic(&pid, topic).await?;
    for message in messages {
        api.send_message(&pid, topic, message).await?;
        info!("Sent '{message}' to {topic}");
    }

    api.close().await
}

async fn run_subscriber(url: &str, topic: &str, polls: u32, interval: Duration) -> Result<()> {
    let mut api = PubSubClient::connect(url).await?;
    let sid = api.register_subscriber().await?;
    info!("Registered as subscriber {sid}");

    api.subscribe(&sid, topic).await?;
    for poll in 0..polls {
        if poll > 0 {
            tokio::time::sleep(interval).await;
        }
        let messages = api.pull_messages(&sid, topic).await?;
        println!("Messages received: {messages:?}");
    }

    api.close().await
}
