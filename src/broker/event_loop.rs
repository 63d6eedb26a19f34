//! Drives the client library and dispatches its events.
//!
//! Polling runs in its own task and hands events over a channel, so the
//! client's request queue keeps draining while a handler awaits a publish.
//! Handler calls stay serial: the next event is only dispatched after the
//! call for the current one has returned.

use std::future::Future;
use std::time::Duration;

use rumqttc::{ConnectionError, Event, EventLoop, Outgoing, Packet};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::broker::ConnectCode;
use crate::relay::EventHandler;
use crate::utils::RelayError;

type PollResult = Result<Event, ConnectionError>;

/// What the loop does after an event has been dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The connection dropped; the poller waits before the library reconnects.
    Backoff,
    /// We asked for a disconnect and the library has sent it.
    Stop,
}

/// Maps one poll result onto handler calls.
///
/// Only an error returned by `on_message` is propagated; connection errors
/// are logged and left to the library's reconnect.
pub async fn dispatch<H>(event: PollResult, handler: &mut H) -> Result<Flow, RelayError>
where
    H: EventHandler + ?Sized,
{
    match event {
        Ok(Event::Incoming(Packet::ConnAck(ack))) => {
            handler.on_connect(ack.code.into()).await;
            Ok(Flow::Continue)
        }
        Ok(Event::Incoming(Packet::Publish(publish))) => {
            handler.on_message(&publish.topic, &publish.payload).await?;
            Ok(Flow::Continue)
        }
        Ok(Event::Incoming(Packet::Disconnect)) => {
            info!("broker closed the connection");
            Ok(Flow::Continue)
        }
        Ok(Event::Outgoing(Outgoing::Disconnect)) => Ok(Flow::Stop),
        Ok(other) => {
            debug!(event = ?other, "mqtt event");
            Ok(Flow::Continue)
        }
        Err(ConnectionError::ConnectionRefused(code)) => {
            handler.on_connect(ConnectCode::from(code)).await;
            Ok(Flow::Backoff)
        }
        Err(e) => {
            warn!("MQTT connection error: {e}");
            Ok(Flow::Backoff)
        }
    }
}

/// Runs the event loop until a requested disconnect has gone out, the
/// shutdown signal fires while the broker is unreachable, or the handler
/// fails.
pub async fn run<H>(
    eventloop: EventLoop,
    handler: &mut H,
    reconnect_delay: Duration,
    shutdown: watch::Receiver<bool>,
) -> Result<(), RelayError>
where
    H: EventHandler + ?Sized,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    // dropping the set aborts the poller on every return path
    let mut poller = JoinSet::new();
    poller.spawn(poll_events(eventloop, tx, reconnect_delay, shutdown));

    while let Some(event) = rx.recv().await {
        if dispatch(event, handler).await? == Flow::Stop {
            info!("MQTT client disconnected");
            return Ok(());
        }
    }

    info!("MQTT event loop stopped before reaching the broker");
    Ok(())
}

async fn poll_events(
    mut eventloop: EventLoop,
    tx: mpsc::UnboundedSender<PollResult>,
    reconnect_delay: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let event = eventloop.poll().await;
        let stop = matches!(event, Ok(Event::Outgoing(Outgoing::Disconnect)));
        let failed = event.is_err();

        if tx.send(event).is_err() || stop {
            return;
        }

        if failed {
            // offline, so a queued DISCONNECT will never be sent
            if *shutdown.borrow() {
                return;
            }
            tokio::select! {
                _ = tokio::time::sleep(reconnect_delay) => {}
                Ok(()) = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }
}

/// Waits once for `worker`, unless `force` completes first, in which case
/// the worker is aborted.
pub async fn finish<F>(
    mut worker: JoinHandle<Result<(), RelayError>>,
    force: F,
) -> Result<(), RelayError>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        res = &mut worker => res?,
        _ = force => {
            warn!("Forcing shutdown before the MQTT client disconnected");
            worker.abort();
            Ok(())
        }
    }
}
