//! Chat session runtime executor

use super::archive::ArchiveQueue;
use super::traits::ReplyClient;
use crate::backend::BackendError;
use crate::history::{load_history, persist_history, SessionIdentity, Turn};
use crate::state_machine::{transition, ChatContext, ChatState, Effect, Event, TransitionError};
use crate::store::SessionStore;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Snapshot published to the rendering layer after every processed event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatView {
    pub state: ChatState,
    pub input: String,
    pub history: Vec<Turn>,
    pub identity: Option<SessionIdentity>,
}

/// What became of an event sent through a `ChatHandle`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    /// Rejected by the state machine; nothing changed
    Ignored(TransitionError),
    /// The runtime has shut down
    Closed,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted)
    }
}

/// Event plus an optional acknowledgement, sent once the event and every
/// event it synchronously generated have been applied
struct Envelope {
    event: Event,
    ack: Option<oneshot::Sender<SubmitOutcome>>,
}

/// Generic chat runtime that can work with any store and reply client
pub struct ChatRuntime<S, C>
where
    S: SessionStore + 'static,
    C: ReplyClient + 'static,
{
    context: ChatContext,
    state: ChatState,
    history: Vec<Turn>,
    input: String,
    store: S,
    client: Arc<C>,
    archive: ArchiveQueue,
    reply_timeout: Option<Duration>,
    event_rx: mpsc::Receiver<Envelope>,
    /// Weak so the loop ends once every handle is gone
    event_tx: mpsc::WeakSender<Envelope>,
    view_tx: watch::Sender<ChatView>,
    shutdown: CancellationToken,
}

impl<S, C> ChatRuntime<S, C>
where
    S: SessionStore + 'static,
    C: ReplyClient + 'static,
{
    /// Build a runtime and the handle that drives it. Nothing runs until
    /// `run` is awaited (usually via `tokio::spawn`).
    pub fn new(
        store: S,
        client: C,
        archive: ArchiveQueue,
        reply_timeout: Option<Duration>,
    ) -> (Self, ChatHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (view_tx, view_rx) = watch::channel(ChatView::default());
        let shutdown = CancellationToken::new();

        let handle = ChatHandle {
            event_tx: event_tx.clone(),
            view_rx,
            archive: archive.clone(),
            shutdown: shutdown.clone(),
        };

        let runtime = Self {
            context: ChatContext::default(),
            state: ChatState::Idle,
            history: Vec::new(),
            input: String::new(),
            store,
            client: Arc::new(client),
            archive,
            reply_timeout,
            event_rx,
            event_tx: event_tx.downgrade(),
            view_tx,
            shutdown,
        };

        (runtime, handle)
    }

    pub async fn run(mut self) {
        tracing::info!("Starting chat runtime");

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                envelope = self.event_rx.recv() => {
                    // None: every handle is gone
                    let Some(envelope) = envelope else { break };
                    let outcome = self.process_event(envelope.event);
                    if let Some(ack) = envelope.ack {
                        let _ = ack.send(outcome);
                    }
                }
            }
        }

        tracing::info!(
            state = self.state.name(),
            turns = self.history.len(),
            "Chat runtime stopped"
        );
    }

    /// Apply an event and everything it synchronously generates. Only the
    /// outcome of the first transition is reported.
    fn process_event(&mut self, event: Event) -> SubmitOutcome {
        let mut outcome = None;
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let event_name = current_event.name();

            // Pure state transition
            let result = match transition(&self.state, &self.context, current_event) {
                Ok(r) => r,
                Err(e) => {
                    match &e {
                        TransitionError::InvalidTransition(_) => {
                            tracing::warn!(event = event_name, error = %e, "Unexpected event");
                        }
                        _ => {
                            tracing::debug!(
                                event = event_name,
                                state = self.state.name(),
                                reason = %e,
                                "Event ignored"
                            );
                        }
                    }
                    outcome.get_or_insert(SubmitOutcome::Ignored(e));
                    continue;
                }
            };
            outcome.get_or_insert(SubmitOutcome::Accepted);

            if self.state != result.new_state {
                tracing::debug!(
                    from = self.state.name(),
                    to = result.new_state.name(),
                    event = event_name,
                    "State change"
                );
            }
            self.state = result.new_state;

            // Execute effects and collect generated events
            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(effect) {
                    events_to_process.push(generated_event);
                }
            }

            self.publish();
        }

        outcome.unwrap_or(SubmitOutcome::Accepted)
    }

    /// Execute an effect and optionally return a generated event
    fn execute_effect(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::SetIdentity { identity } => {
                self.context.identity = identity;
                None
            }

            Effect::LoadHistory => {
                let turns = load_history(&self.store, self.context.identity.as_ref());
                Some(Event::HistoryLoaded { turns })
            }

            Effect::ReplaceHistory { turns } => {
                self.history = turns;
                None
            }

            Effect::SetInput { text } => {
                self.input = text;
                None
            }

            Effect::ClearInput => {
                self.input.clear();
                None
            }

            Effect::RequestReply { prompt } => {
                self.spawn_reply_request(prompt);
                None
            }

            Effect::AppendTurn { turn } => {
                self.history.push(turn);
                None
            }

            Effect::PersistHistory => {
                // The in-memory append stands even if the write fails
                if let Err(e) = persist_history(&self.store, &self.history) {
                    tracing::warn!(error = %e, turns = self.history.len(), "Error saving to session storage");
                }
                None
            }

            Effect::ArchiveTurn { identity, turn } => {
                self.archive.enqueue(identity, turn);
                None
            }
        }
    }

    /// Run the primary exchange in the background; the settled result comes
    /// back through the event channel
    fn spawn_reply_request(&self, prompt: String) {
        let client = self.client.clone();
        let event_tx = self.event_tx.clone();
        let reply_timeout = self.reply_timeout;

        tokio::spawn(async move {
            tracing::info!("Sending chat request (background)");

            let result = match reply_timeout {
                Some(limit) => tokio::time::timeout(limit, client.complete(&prompt))
                    .await
                    .unwrap_or_else(|_| {
                        Err(BackendError::timeout(format!(
                            "No reply within {}ms",
                            limit.as_millis()
                        )))
                    }),
                None => client.complete(&prompt).await,
            };

            let event = match result {
                Ok(reply) => Event::ReplyReceived {
                    text: reply.text,
                    at: Utc::now(),
                },
                Err(e) => {
                    tracing::error!(error = %e.message, kind = %e.kind, "Error in chat");
                    Event::ReplyFailed {
                        message: e.message,
                        at: Utc::now(),
                    }
                }
            };

            match event_tx.upgrade() {
                Some(tx) => {
                    let _ = tx.send(Envelope { event, ack: None }).await;
                }
                None => tracing::debug!("Chat session dropped before the reply settled"),
            }
        });
    }

    fn publish(&self) {
        self.view_tx.send_replace(ChatView {
            state: self.state.clone(),
            input: self.input.clone(),
            history: self.history.clone(),
            identity: self.context.identity.clone(),
        });
    }
}

/// Handle to interact with a running chat session
#[derive(Clone)]
pub struct ChatHandle {
    event_tx: mpsc::Sender<Envelope>,
    view_rx: watch::Receiver<ChatView>,
    archive: ArchiveQueue,
    shutdown: CancellationToken,
}

impl ChatHandle {
    /// Send an event and wait until the runtime has applied it
    async fn dispatch(&self, event: Event) -> SubmitOutcome {
        let (ack_tx, ack_rx) = oneshot::channel();
        let envelope = Envelope {
            event,
            ack: Some(ack_tx),
        };

        if self.event_tx.send(envelope).await.is_err() {
            tracing::warn!("Chat runtime is gone, event dropped");
            return SubmitOutcome::Closed;
        }

        ack_rx.await.unwrap_or(SubmitOutcome::Closed)
    }

    /// Adopt a session identity and load its stored history. Returns once the
    /// history is in place.
    pub async fn load_history(&self, identity: Option<SessionIdentity>) -> SubmitOutcome {
        self.dispatch(Event::IdentityResolved { identity }).await
    }

    /// Mirror the user's draft into the input buffer
    pub async fn set_input(&self, text: impl Into<String>) -> SubmitOutcome {
        self.dispatch(Event::InputChanged { text: text.into() }).await
    }

    /// Start an exchange. Returns once the submit was accepted (input buffer
    /// already cleared) or ignored; the reply settles in the background.
    pub async fn submit(&self, text: impl Into<String>) -> SubmitOutcome {
        self.dispatch(Event::Submit { text: text.into() }).await
    }

    /// Submit and wait for the resulting turn to land in history
    pub async fn submit_and_wait(&self, text: impl Into<String>) -> ChatView {
        if self.submit(text).await.is_accepted() {
            self.wait_until_settled().await
        } else {
            self.view()
        }
    }

    /// Wait until no exchange is in flight
    pub async fn wait_until_settled(&self) -> ChatView {
        let mut rx = self.view_rx.clone();
        let view = match rx.wait_for(|view| !view.state.is_sending()).await {
            Ok(view) => view.clone(),
            Err(_) => self.view(),
        };
        view
    }

    /// Latest published snapshot
    pub fn view(&self) -> ChatView {
        self.view_rx.borrow().clone()
    }

    /// Receiver that wakes on every published snapshot
    #[allow(dead_code)] // API completeness
    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.view_rx.clone()
    }

    /// Stop the runtime loop. Remote saves already dispatched keep running
    /// only as long as the tokio runtime does; see `close`.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Stop the runtime loop, then wait up to `grace` for dispatched remote
    /// saves. Returns `false` if some saves were still running.
    pub async fn close(&self, grace: Duration) -> bool {
        self.shutdown();
        self.archive.drain(grace).await
    }
}
