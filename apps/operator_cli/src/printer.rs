//! Background task that prints session events as they happen.

use std::{io::Write, sync::Arc};

use client_core::{
    render::{render_message, MarkupPolicy},
    SessionController, SessionEvent,
};
use colored::Colorize;
use shared::domain::{ConnectionState, Sender};
use tokio::{
    sync::{
        broadcast::{
            self,
            error::{RecvError, TryRecvError},
        },
        mpsc, oneshot,
    },
    task::JoinHandle,
};
use tracing::{debug, warn};

pub struct EventPrinter {
    settle_requests: mpsc::Sender<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl EventPrinter {
    pub fn spawn<W>(controller: Arc<SessionController>, policy: MarkupPolicy, out: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let (settle_requests, settles) = mpsc::channel(1);
        let events = controller.subscribe();
        let task = tokio::spawn(run(controller, events, settles, policy, out));
        Self {
            settle_requests,
            task,
        }
    }

    /// Returns once every event emitted before the call has been printed.
    pub async fn settle(&self) {
        let (done, printed) = oneshot::channel();
        if self.settle_requests.send(done).await.is_ok() {
            let _ = printed.await;
        }
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

async fn run<W: Write>(
    controller: Arc<SessionController>,
    mut events: broadcast::Receiver<SessionEvent>,
    mut settles: mpsc::Receiver<oneshot::Sender<()>>,
    policy: MarkupPolicy,
    mut out: W,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => print_event(&mut out, &controller, event, policy),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer fell behind"),
                Err(RecvError::Closed) => break,
            },
            Some(done) = settles.recv() => {
                loop {
                    match events.try_recv() {
                        Ok(event) => print_event(&mut out, &controller, event, policy),
                        Err(TryRecvError::Lagged(skipped)) => {
                            warn!(skipped, "event printer fell behind")
                        }
                        Err(_) => break,
                    }
                }
                let _ = done.send(());
            }
        }
    }
}

fn print_event<W: Write>(
    out: &mut W,
    controller: &SessionController,
    event: SessionEvent,
    policy: MarkupPolicy,
) {
    let line = match event {
        // A user message always opens a request, so the reply is pending from here.
        SessionEvent::MessageAppended(message) if message.sender == Sender::User => format!(
            "{}\n{}",
            crate::view::message(&render_message(&message, policy)),
            crate::view::thinking()
        ),
        SessionEvent::MessageAppended(message) => {
            crate::view::message(&render_message(&message, policy))
        }
        SessionEvent::ConnectionChanged(ConnectionState::Connecting) => {
            "Connecting...".yellow().to_string()
        }
        SessionEvent::ConnectionChanged(_) => crate::view::connection_panel(&controller.snapshot()),
        SessionEvent::PendingChanged(_) | SessionEvent::StatusChanged(_) => return,
    };
    if let Err(err) = writeln!(out, "{line}").and_then(|()| out.flush()) {
        debug!(error = %err, "failed to print session event");
    }
}

#[cfg(test)]
#[path = "tests/printer_tests.rs"]
mod tests;
