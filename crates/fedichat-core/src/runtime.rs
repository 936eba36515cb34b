//! Background worker that owns the chat timeline.
//!
//! The UI talks to it over a command channel and receives update batches
//! back; commands are processed strictly one at a time, so every merge
//! finishes its diff-and-persist cycle before the next mutation starts.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use crate::constants::TIMESTAMP_REFRESH_INTERVAL;
use crate::events::AppEvent;
use crate::models::{ChatMessage, ChatViewData};
use crate::timeline::{ChatTimeline, ListOp};

#[derive(Debug)]
pub enum TimelineCommand {
    /// Fetch above the newest known chat.
    Refresh,
    /// Fetch below the oldest known chat.
    LoadOlder,
    /// Fetch the range behind a gap placeholder.
    ExpandGap { boundary_id: String },
    /// A live message pushed from elsewhere (streaming, notifications).
    NewMessage(ChatMessage),
    Event(AppEvent),
}

/// One batch of update instructions plus the projection they lead to.
#[derive(Debug)]
pub struct TimelineUpdate {
    pub ops: Vec<ListOp>,
    pub rows: Vec<ChatViewData>,
    pub fetch_failed: bool,
    /// Current display options; they can change at runtime via
    /// `AppEvent::PreferenceChanged`.
    pub options: crate::config::DisplayOptions,
}

#[derive(Clone)]
pub struct TimelineHandle {
    command_tx: mpsc::Sender<TimelineCommand>,
}

impl TimelineHandle {
    pub async fn send(&self, command: TimelineCommand) -> anyhow::Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| anyhow::anyhow!("timeline worker is gone"))
    }

    pub fn try_send(&self, command: TimelineCommand) -> anyhow::Result<()> {
        self.command_tx
            .try_send(command)
            .map_err(|_| anyhow::anyhow!("timeline worker is gone or busy"))
    }
}

pub struct TimelineRuntime {
    handle: TimelineHandle,
    update_rx: Option<mpsc::Receiver<TimelineUpdate>>,
    shutdown_tx: watch::Sender<bool>,
    worker: Option<JoinHandle<()>>,
}

impl TimelineRuntime {
    /// Spawn the worker around an assembled timeline. The worker loads the
    /// cached page, refreshes from the network, then serves commands.
    pub fn spawn(timeline: ChatTimeline) -> Self {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (update_tx, update_rx) = mpsc::channel(64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = tokio::spawn(run_worker(timeline, command_rx, update_tx, shutdown_rx));
        Self {
            handle: TimelineHandle { command_tx },
            update_rx: Some(update_rx),
            shutdown_tx,
            worker: Some(worker),
        }
    }

    pub fn handle(&self) -> TimelineHandle {
        self.handle.clone()
    }

    /// The update stream; can be taken once.
    pub fn take_update_rx(&mut self) -> Option<mpsc::Receiver<TimelineUpdate>> {
        self.update_rx.take()
    }

    /// Stop the worker. In-flight fetches are dropped, so no result can be
    /// applied after this returns.
    pub fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

impl Drop for TimelineRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_worker(
    mut timeline: ChatTimeline,
    mut command_rx: mpsc::Receiver<TimelineCommand>,
    update_tx: mpsc::Sender<TimelineUpdate>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // Disk first for a fast paint, then reconcile with the server.
    match timeline.init().await {
        Ok(ops) => send_update(&update_tx, &timeline, ops).await,
        Err(err) => error!(error = %err, "loading cached chats failed"),
    }
    match timeline.refresh().await {
        Ok(ops) => send_update(&update_tx, &timeline, ops).await,
        Err(err) => error!(error = %err, "initial chat refresh failed"),
    }

    let mut tick = tokio::time::interval_at(
        tokio::time::Instant::now() + TIMESTAMP_REFRESH_INTERVAL,
        TIMESTAMP_REFRESH_INTERVAL,
    );
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            _ = tick.tick() => {
                let ops = timeline.tick_timestamps();
                if !ops.is_empty() {
                    send_update(&update_tx, &timeline, ops).await;
                }
            }
            command = command_rx.recv() => {
                let Some(command) = command else { break };
                debug!(?command, "timeline command");
                handle_command(&mut timeline, command, &update_tx).await;
            }
        }
    }
}

async fn handle_command(
    timeline: &mut ChatTimeline,
    command: TimelineCommand,
    update_tx: &mpsc::Sender<TimelineUpdate>,
) {
    let result = match command {
        TimelineCommand::Refresh => timeline.refresh().await,
        TimelineCommand::LoadOlder => timeline.load_older().await,
        TimelineCommand::ExpandGap { boundary_id } => {
            let ops = timeline.set_gap_loading(&boundary_id, true);
            send_update(update_tx, timeline, ops).await;
            timeline.expand_gap(&boundary_id).await
        }
        TimelineCommand::NewMessage(message) => timeline.apply_new_message(message).await,
        TimelineCommand::Event(event) => timeline.handle_event(event).await,
    };
    match result {
        Ok(ops) => send_update(update_tx, timeline, ops).await,
        Err(err) => error!(error = %err, "timeline command failed"),
    }
}

async fn send_update(
    update_tx: &mpsc::Sender<TimelineUpdate>,
    timeline: &ChatTimeline,
    ops: Vec<ListOp>,
) {
    let update = TimelineUpdate {
        ops,
        rows: timeline.rows().to_vec(),
        fetch_failed: timeline.fetch_failed(),
        options: timeline.options(),
    };
    let _ = update_tx.send(update).await;
}
