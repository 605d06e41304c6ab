// ── Posts controller ──
//
// Owns the posts feed stores and keeps them consistent: the order and user
// selectors drive reloads, the cursor drives "load more". All fetching
// happens on one command processor task per controller, so responses land
// in the order their requests were made.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use postview_api::SortOrder;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use super::command::{CommandEnvelope, PostsCommand};
use crate::config::FeedConfig;
use crate::error::CoreError;
use crate::fetch::{CachedFetcher, FetchSource};
use crate::model::Post;
use crate::state::{State, Unsubscribe};

const COMMAND_CHANNEL_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
    Replace,
    Append,
}

/// Handle to the posts feed.
///
/// Cheaply cloneable via `Arc<PostsInner>`. Call [`start`](Self::start)
/// before anything else and [`stop`](Self::stop) when done; stopping tears
/// down the processor task and the selector subscriptions.
#[derive(Clone)]
pub struct PostsController {
    inner: Arc<PostsInner>,
}

struct PostsInner {
    config: FeedConfig,
    fetcher: Arc<CachedFetcher>,
    first_page: Url,

    posts: State<Vec<Post>>,
    loading: State<bool>,
    error: State<Option<String>>,
    order: State<Option<SortOrder>>,
    user: State<Option<u64>>,
    next_link: State<Option<Url>>,

    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    running: AtomicBool,
    task_handle: Mutex<Option<JoinHandle<()>>>,
    subscriptions: parking_lot::Mutex<Vec<Unsubscribe>>,
}

impl PostsController {
    /// Build the stores. Nothing is fetched until [`start`](Self::start).
    ///
    /// The cursor starts out pointing at the unsorted first page.
    pub fn new(config: FeedConfig, fetcher: Arc<CachedFetcher>) -> Result<Self, CoreError> {
        let first_page = fetcher
            .client()
            .url_for(&config.posts_endpoint, &config.first_page())?;
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(PostsInner {
                config,
                fetcher,
                posts: State::new(Vec::new()),
                loading: State::new(false),
                error: State::new(None),
                order: State::new(None),
                user: State::new(None),
                next_link: State::new(Some(first_page.clone())),
                first_page,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                running: AtomicBool::new(false),
                task_handle: Mutex::new(None),
                subscriptions: parking_lot::Mutex::new(Vec::new()),
            }),
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Wire the selector stores, spawn the command processor and load the
    /// first page. Resolves once that page has been applied to the stores.
    pub async fn start(&self) -> Result<(), CoreError> {
        let Some(rx) = self.inner.command_rx.lock().await.take() else {
            return Err(CoreError::Internal("posts controller already started".into()));
        };

        self.install_subscriptions();

        let handle = tokio::spawn(command_processor_task(Arc::clone(&self.inner), rx));
        *self.inner.task_handle.lock().await = Some(handle);
        self.inner.running.store(true, Ordering::Release);

        info!(url = %self.inner.first_page, "posts controller started");
        self.dispatch(PostsCommand::Load).await
    }

    /// Cancel the processor, wait for it, and drop the selector
    /// subscriptions. Commands still queued are discarded.
    pub async fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.inner.cancel.cancel();

        let handle = self.inner.task_handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.lock());
        for subscription in subscriptions {
            subscription.unsubscribe();
        }
        debug!("posts controller stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    // ── Actions ──────────────────────────────────────────────────

    /// Append the page behind the cursor. Does nothing once the cursor is
    /// exhausted.
    pub async fn fetch_next_posts(&self) -> Result<(), CoreError> {
        self.dispatch(PostsCommand::FetchNext).await
    }

    /// Select a title order; `None` resets both selectors.
    pub async fn sort_by_title(&self, order: Option<SortOrder>) -> Result<(), CoreError> {
        self.ensure_running()?;
        self.inner.order.set(order);
        self.flush().await
    }

    /// Select an author; `None` resets both selectors.
    pub async fn filter_by_user(&self, user_id: Option<u64>) -> Result<(), CoreError> {
        self.ensure_running()?;
        self.inner.user.set(user_id);
        self.flush().await
    }

    /// Clear both selectors and reload the default first page.
    ///
    /// Always issues exactly one reset fetch, even when nothing was selected.
    pub async fn reset_filters(&self) -> Result<(), CoreError> {
        self.ensure_running()?;

        if self.inner.order.get().is_some() {
            self.inner.order.set(None);
        } else if self.inner.user.get().is_some() {
            self.inner.user.set(None);
        } else {
            enqueue(&self.inner.command_tx, PostsCommand::Reset);
        }

        self.flush().await
    }

    /// Wait until every command queued so far has been processed.
    pub async fn flush(&self) -> Result<(), CoreError> {
        self.dispatch(PostsCommand::Flush).await
    }

    // ── Stores ───────────────────────────────────────────────────

    pub fn posts(&self) -> &State<Vec<Post>> {
        &self.inner.posts
    }

    pub fn loading(&self) -> &State<bool> {
        &self.inner.loading
    }

    /// Message of the most recent failed fetch, cleared by the next success.
    pub fn error(&self) -> &State<Option<String>> {
        &self.inner.error
    }

    pub fn order(&self) -> &State<Option<SortOrder>> {
        &self.inner.order
    }

    pub fn user(&self) -> &State<Option<u64>> {
        &self.inner.user
    }

    /// Cursor for the next page; `None` at the end of the collection.
    pub fn next_link(&self) -> &State<Option<Url>> {
        &self.inner.next_link
    }

    pub fn config(&self) -> &FeedConfig {
        &self.inner.config
    }

    // ── Internals ────────────────────────────────────────────────

    fn ensure_running(&self) -> Result<(), CoreError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(CoreError::ControllerStopped)
        }
    }

    async fn dispatch(&self, command: PostsCommand) -> Result<(), CoreError> {
        self.ensure_running()?;

        let (envelope, done) = CommandEnvelope::acked(command);
        self.inner
            .command_tx
            .send(envelope)
            .await
            .map_err(|_| CoreError::ControllerStopped)?;

        done.await.map_err(|_| CoreError::ControllerStopped)
    }

    /// Selector wiring. A move to a different `Some` reloads page 1 with
    /// the other selector kept; a move to `None` clears the other selector
    /// too, and whichever store clears last enqueues the single reset.
    fn install_subscriptions(&self) {
        let inner = &self.inner;

        let order_sub = {
            let tx = inner.command_tx.clone();
            let config = inner.config.clone();
            let user = inner.user.clone();
            inner.order.subscribe(move |order, previous| {
                if order == previous {
                    return;
                }
                match order {
                    Some(order) => {
                        let query = config.posts_query(Some(*order), user.get());
                        enqueue(&tx, PostsCommand::Reload { query });
                    }
                    None if user.get().is_some() => user.set(None),
                    None => enqueue(&tx, PostsCommand::Reset),
                }
            })
        };

        let user_sub = {
            let tx = inner.command_tx.clone();
            let config = inner.config.clone();
            let order = inner.order.clone();
            inner.user.subscribe(move |user_id, previous| {
                if user_id == previous {
                    return;
                }
                match user_id {
                    Some(user_id) => {
                        let query = config.posts_query(order.get(), Some(*user_id));
                        enqueue(&tx, PostsCommand::Reload { query });
                    }
                    None if order.get().is_some() => order.set(None),
                    None => enqueue(&tx, PostsCommand::Reset),
                }
            })
        };

        inner.subscriptions.lock().extend([order_sub, user_sub]);
    }
}

impl std::fmt::Debug for PostsController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostsController")
            .field("first_page", &self.inner.first_page.as_str())
            .field("running", &self.is_running())
            .field("posts", &self.inner.posts.with(Vec::len))
            .field("next_link", &self.inner.next_link.get().map(String::from))
            .finish_non_exhaustive()
    }
}

/// Queue from synchronous store callbacks. A full channel drops the command.
fn enqueue(tx: &mpsc::Sender<CommandEnvelope>, command: PostsCommand) {
    if let Err(e) = tx.try_send(CommandEnvelope::fire(command)) {
        warn!(error = %e, "posts command dropped");
    }
}

// ── Background task ──────────────────────────────────────────────

async fn command_processor_task(inner: Arc<PostsInner>, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                run_command(&inner, envelope.command).await;
                if let Some(ack) = envelope.ack {
                    let _ = ack.send(());
                }
            }
        }
    }
}

async fn run_command(inner: &PostsInner, command: PostsCommand) {
    debug!(?command, "posts command");

    match command {
        PostsCommand::Load => {
            let url = inner.first_page.clone();
            load_page(inner, &url, Merge::Replace).await;
        }
        PostsCommand::FetchNext => {
            let Some(url) = inner.next_link.get() else {
                debug!("no next page, skipping fetch");
                return;
            };
            load_page(inner, &url, Merge::Append).await;
        }
        PostsCommand::Reload { query } => {
            // The old query's cursor must not survive a failed reload.
            inner.next_link.set(None);
            match inner
                .fetcher
                .client()
                .url_for(&inner.config.posts_endpoint, &query)
            {
                Ok(url) => load_page(inner, &url, Merge::Replace).await,
                Err(e) => {
                    error!(error = %e, "cannot build posts URL");
                    inner.error.set(Some(e.to_string()));
                }
            }
        }
        PostsCommand::Reset => {
            inner.next_link.set(None);
            let url = inner.first_page.clone();
            load_page(inner, &url, Merge::Replace).await;
        }
        PostsCommand::Flush => {}
    }
}

/// Fetch one page through the cache and apply it to the stores.
///
/// The pending cursor is consumed by this fetch. A network page installs
/// its own `next`; a cached page leaves the cursor empty, which ends
/// pagination; a failure puts the consumed cursor back so the same page
/// can be retried.
async fn load_page(inner: &PostsInner, url: &Url, merge: Merge) {
    inner.loading.set(true);

    let consumed = inner.next_link.get();
    if consumed.is_some() {
        inner.next_link.set(None);
    }

    let page = inner.fetcher.fetch_page::<Post>(url).await;

    match page.error {
        Some(reason) => inner.error.set(Some(reason)),
        None if inner.error.with(Option::is_some) => inner.error.set(None),
        None => {}
    }

    match page.source {
        FetchSource::Network => inner.next_link.set(page.next),
        FetchSource::Failed if consumed.is_some() => inner.next_link.set(consumed),
        FetchSource::Cache | FetchSource::Failed => {}
    }

    let items = page.items;
    match merge {
        Merge::Replace => inner.posts.set(items),
        Merge::Append if items.is_empty() => {}
        Merge::Append => inner.posts.update(move |current| {
            let mut combined = current.clone();
            combined.extend(items);
            combined
        }),
    }

    inner.loading.set(false);
}
