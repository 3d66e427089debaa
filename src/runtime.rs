//! Runtime for driving a chat session
//!
//! Owns the history, the input buffer and the loading state, executes the
//! effects the state machine asks for, and publishes a `ChatView` snapshot
//! for the rendering layer after every event.

mod archive;
mod executor;
pub mod traits;


pub use archive::ArchiveQueue;
pub use executor::{ChatHandle, ChatRuntime, ChatView, SubmitOutcome};
pub use traits::*;

use crate::store::SessionStore;
use std::time::Duration;

/// Wire up a runtime plus its save queue and start it on the current tokio
/// runtime
pub fn spawn_session<S, C, A>(
    store: S,
    client: C,
    archive: A,
    reply_timeout: Option<Duration>,
) -> ChatHandle
where
    S: SessionStore + 'static,
    C: ReplyClient + 'static,
    A: TurnArchive + 'static,
{
    let queue = ArchiveQueue::new(archive);
    let (runtime, handle) = ChatRuntime::new(store, client, queue, reply_timeout);
    tokio::spawn(runtime.run());
    handle
}
