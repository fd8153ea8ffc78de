//! session.rs — per-subscriber monitoring state and the registry of active sessions.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ledger::DedupLedger;
use crate::notify::ChatId;
use crate::scheduler::PollHandle;

/// Ledger + destination + cancellation for one subscriber.
#[derive(Debug)]
pub struct PollSession {
    chat: ChatId,
    ledger: DedupLedger,
    cancel: CancellationToken,
}

impl PollSession {
    pub fn new(chat: ChatId) -> Self {
        Self::with_ledger(chat, DedupLedger::new())
    }

    pub fn with_ledger(chat: ChatId, ledger: DedupLedger) -> Self {
        Self {
            chat,
            ledger,
            cancel: CancellationToken::new(),
        }
    }

    pub fn chat(&self) -> ChatId {
        self.chat
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct Active {
    session: Arc<PollSession>,
    // None while the first cycle is still running.
    handle: Option<PollHandle>,
}

impl Active {
    fn is_live(&self) -> bool {
        !self.session.is_cancelled()
            && self.handle.as_ref().map_or(true, |h| !h.is_finished())
    }
}

/// Chat id -> running session. One poll loop per chat at most.
#[derive(Default)]
pub struct SessionRegistry {
    active: Mutex<HashMap<ChatId, Active>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Running (or starting) session for `chat`.
    pub fn get(&self, chat: ChatId) -> Option<Arc<PollSession>> {
        let mut map = self.active.lock();
        match map.get(&chat) {
            Some(a) if a.is_live() => Some(a.session.clone()),
            Some(_) => {
                map.remove(&chat);
                None
            }
            None => None,
        }
    }

    /// Existing live session for `chat`, or a new one reserved under the same
    /// lock. The flag is `true` only for the caller that created it; that caller
    /// must follow up with [`attach`](Self::attach).
    pub fn get_or_create(&self, chat: ChatId) -> (Arc<PollSession>, bool) {
        let mut map = self.active.lock();
        if let Some(a) = map.get(&chat) {
            if a.is_live() {
                return (a.session.clone(), false);
            }
        }
        let session = Arc::new(PollSession::new(chat));
        let stale = map.insert(
            chat,
            Active {
                session: session.clone(),
                handle: None,
            },
        );
        drop(map);
        if let Some(stale) = stale {
            stale.session.cancel();
        }
        (session, true)
    }

    /// Attach the poll loop to a session reserved by `get_or_create`.
    ///
    /// Returns `false` (and cancels the loop) when the session was stopped or
    /// replaced in the meantime.
    pub fn attach(&self, session: &Arc<PollSession>, handle: PollHandle) -> bool {
        let rejected = {
            let mut map = self.active.lock();
            match map.get_mut(&session.chat()) {
                Some(a) if Arc::ptr_eq(&a.session, session) && !session.is_cancelled() => {
                    a.handle = Some(handle);
                    None
                }
                _ => Some(handle),
            }
        };
        match rejected {
            Some(handle) => {
                handle.cancel();
                false
            }
            None => true,
        }
    }

    /// Cancel and forget the session for `chat`, including one still in its
    /// first cycle. Returns whether one was running.
    pub fn stop(&self, chat: ChatId) -> bool {
        let removed = self.active.lock().remove(&chat);
        match removed {
            Some(a) => {
                let live = a.is_live();
                a.session.cancel();
                live
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }

    /// Cancel every loop and wait for them to wind down.
    pub async fn shutdown(&self) {
        let drained: Vec<Active> = self.active.lock().drain().map(|(_, a)| a).collect();
        for a in drained {
            a.session.cancel();
            if let Some(handle) = a.handle {
                handle.shutdown().await;
            }
        }
    }
}
