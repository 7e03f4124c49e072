//! Core of git-sync-static: the sync engine and its notification pipeline
//!
//! ```text
//! [ SyncEngine ] --Event--> [ bounded queue (cap 1) ] --> [ WebhookDispatcher ] --HTTP--> sink
//!       |
//!       +--> VcsBackend (clone / pull) --> local checkout <-- served read-only over HTTP
//! ```
//!
//! The engine owns the checkout path and decides clone vs. pull from disk
//! presence alone. Each completed cycle produces one [`Event`], which is
//! pushed through a bounded queue; a slow webhook sink therefore stalls the
//! sync loop instead of growing memory.

pub mod engine;
pub mod error;
pub mod event;
pub mod queue;
pub mod target;
pub mod template;
pub mod webhook;

pub use engine::{
    DEFAULT_OPERATION_TIMEOUT, DEFAULT_SYNC_INTERVAL, NotifyPolicy, RepoState, SyncEngine,
    checkout_state,
};
pub use error::{Error, Result};
pub use event::{Event, SyncAction};
pub use queue::{EVENT_QUEUE_CAPACITY, EventReceiver, EventSender, event_queue};
pub use target::{DEFAULT_BRANCH, SyncTarget, derive_local_path};
pub use template::{DEFAULT_PAYLOAD_TEMPLATE, PayloadTemplate};
pub use webhook::{
    CONTENT_TYPE, DEFAULT_WEBHOOK_METHOD, DEFAULT_WEBHOOK_TIMEOUT, WebhookConfig,
    WebhookDispatcher,
};
