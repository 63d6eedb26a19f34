//! CLI for edgerelay
//!
//! Subcommands:
//! - `run`: start the relay
//! - `check`: publish one message and wait for its acknowledgment (useful
//!   for smoke tests against a running relay)

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use edgerelay::broker::ack_check::round_trip;
use edgerelay::broker::{BrokerClient, MqttBroker, event_loop, session};
use edgerelay::cloud::{CloudSink, IotHubSink};
use edgerelay::config::{DEFAULT_CONFIG_PATH, Settings, load_config_from};
use edgerelay::relay::Relay;
use edgerelay::utils::{RelayError, logging};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "edgerelay")]
enum Command {
    /// Subscribe, acknowledge and (optionally) forward to the cloud
    Run {
        /// Settings file, without extension
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,
    },
    /// Publish one message and wait for the relay's acknowledgment
    Check {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,
        #[arg(long, default_value = "edge/temp")]
        topic: String,
        #[arg(long, default_value = "23.5")]
        payload: String,
        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() {
    let cmd = Command::parse();

    let result = match cmd {
        Command::Run { config } => run_relay(&config).await,
        Command::Check {
            config,
            topic,
            payload,
            timeout_secs,
        } => run_check(&config, &topic, &payload, timeout_secs).await,
    };

    if let Err(e) = result {
        // no-op when settings already initialised logging
        logging::init("info");
        error!("edgerelay failed: {e}");
        std::process::exit(1);
    }
}

fn load(path: &str) -> Result<Settings, RelayError> {
    let settings = load_config_from(path)?;
    logging::init(&settings.log.level);
    Ok(settings)
}

async fn run_relay(config_path: &str) -> Result<(), RelayError> {
    let settings = load(config_path)?;

    let sink = IotHubSink::from_settings(&settings.cloud)?
        .map(|s| Box::new(s) as Box<dyn CloudSink>);

    let client_id = session::client_id(&settings.broker.client_id_prefix);
    info!(
        "Connecting to {}:{} as {client_id}",
        settings.broker.host, settings.broker.port
    );
    let (client, eventloop) = session::connect(&settings.broker, client_id);
    let broker = Arc::new(MqttBroker::new(client, settings.broker.qos()));
    let shutdown = broker.shutdown_signal();

    let mut relay = Relay::new(broker.clone(), sink, settings.relay.clone());
    if relay.forwards_to_cloud() {
        info!("Forwarding payloads to the cloud");
    }

    let reconnect_delay = settings.broker.reconnect_delay();
    let mut worker: JoinHandle<Result<(), RelayError>> = tokio::spawn(async move {
        event_loop::run(eventloop, &mut relay, reconnect_delay, shutdown).await
    });

    tokio::select! {
        res = &mut worker => res??,
        _ = tokio::signal::ctrl_c() => {
            info!("Disconnecting MQTT client...");
            if let Err(e) = broker.disconnect().await {
                warn!("Disconnect request failed: {e}");
            }
            // a second Ctrl-C gives up on the graceful path
            let force = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            event_loop::finish(worker, force).await?;
        }
    }

    info!("Exiting...");
    Ok(())
}

async fn run_check(
    config_path: &str,
    topic: &str,
    payload: &str,
    timeout_secs: u64,
) -> Result<(), RelayError> {
    let settings = load(config_path)?;
    let ack_topic = format!("{topic}{}", settings.relay.ack_suffix);

    let ack = round_trip(&settings, topic, payload, Duration::from_secs(timeout_secs)).await?;
    println!("Acknowledgment on '{ack_topic}': {ack}");
    Ok(())
}
