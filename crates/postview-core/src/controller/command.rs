// ── Posts command channel ──
//
// Store subscribers are synchronous, so they never fetch themselves: they
// enqueue a `PostsCommand` and the controller's processor task runs them
// one at a time, in the order they were sent.

use postview_api::ResourceQuery;
use tokio::sync::oneshot;

/// Work items for the posts command processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostsCommand {
    /// Fetch the first page and replace the list.
    Load,
    /// Fetch the page behind the current cursor and append it.
    FetchNext,
    /// Drop the cursor, fetch page 1 for `query`, replace the list.
    Reload { query: ResourceQuery },
    /// Drop the cursor, fetch the unsorted unfiltered first page.
    Reset,
    /// No-op barrier; acknowledged once everything queued before it ran.
    Flush,
}

/// A command plus an optional completion signal.
pub(crate) struct CommandEnvelope {
    pub command: PostsCommand,
    pub ack: Option<oneshot::Sender<()>>,
}

impl CommandEnvelope {
    pub fn fire(command: PostsCommand) -> Self {
        Self { command, ack: None }
    }

    pub fn acked(command: PostsCommand) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                command,
                ack: Some(tx),
            },
            rx,
        )
    }
}
