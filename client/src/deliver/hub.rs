// Copyright (c) 2024-2026 The HLF SDK Authors

//! The per-channel dispatcher behind the hub.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use hlf_protos::common::Block;

use super::{BlockSource, SeekFrom};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct HubOptions {
    /// Consecutive failed (re)connects before all subscribers are errored.
    pub retry_budget: u32,
    /// Base reconnect delay; scaled linearly per attempt.
    pub retry_backoff: Duration,
    /// How long an idle stream lingers before it is closed.
    pub linger: Duration,
    /// Blocks buffered per subscriber before it counts as slow.
    pub buffer: usize,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            retry_budget: 5,
            retry_backoff: Duration::from_millis(500),
            linger: Duration::from_secs(5),
            buffer: 64,
        }
    }
}

/// Why a subscription's channel was closed.
#[derive(Debug, Clone)]
enum Terminal {
    Closed,
    Failed(String),
    Slow,
}

#[derive(Default)]
struct FailCell(Mutex<Option<Terminal>>);

impl FailCell {
    fn set(&self, terminal: Terminal) {
        let mut slot = self.0.lock().expect("fail cell poisoned");
        if slot.is_none() {
            *slot = Some(terminal);
        }
    }

    fn error(&self) -> Error {
        match self.0.lock().expect("fail cell poisoned").clone() {
            None | Some(Terminal::Closed) => Error::StreamClosed,
            Some(Terminal::Failed(reason)) => Error::StreamFailed(reason),
            Some(Terminal::Slow) => Error::SlowSubscriber,
        }
    }
}

struct Subscriber {
    id: u64,
    tx: mpsc::Sender<Arc<Block>>,
    fail: Arc<FailCell>,
}

/// Registration-ordered subscriber set. Register/remove are O(1)-ish under
/// the write lock; dispatch iterates under the read lock and never blocks
/// on a subscriber.
#[derive(Default)]
struct Roster {
    subs: RwLock<Vec<Subscriber>>,
}

impl Roster {
    fn add(&self, sub: Subscriber) {
        self.subs.write().expect("roster poisoned").push(sub);
    }

    fn remove(&self, id: u64) {
        self.subs
            .write()
            .expect("roster poisoned")
            .retain(|s| s.id != id);
    }

    fn is_empty(&self) -> bool {
        self.subs.read().expect("roster poisoned").is_empty()
    }

    /// Delivers one block to every subscriber in registration order. A
    /// subscriber whose buffer is full is detached with `SlowSubscriber`
    /// instead of stalling the rest.
    fn dispatch(&self, block: &Arc<Block>) {
        let mut dropped = Vec::new();
        {
            let subs = self.subs.read().expect("roster poisoned");
            for sub in subs.iter() {
                match sub.tx.try_send(block.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(id = sub.id, "dropping slow block subscriber");
                        sub.fail.set(Terminal::Slow);
                        dropped.push(sub.id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        dropped.push(sub.id);
                    }
                }
            }
        }
        if !dropped.is_empty() {
            self.subs
                .write()
                .expect("roster poisoned")
                .retain(|s| !dropped.contains(&s.id));
        }
    }

    fn fail_all(&self, terminal: Terminal) {
        let mut subs = self.subs.write().expect("roster poisoned");
        for sub in subs.drain(..) {
            sub.fail.set(terminal.clone());
        }
    }
}

struct ChannelStream {
    roster: Arc<Roster>,
    done: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// One shared ordered block subscription per channel.
pub struct DeliverHub {
    source: Arc<dyn BlockSource>,
    options: HubOptions,
    next_id: AtomicU64,
    channels: Mutex<HashMap<String, ChannelStream>>,
}

impl DeliverHub {
    pub fn new(source: Arc<dyn BlockSource>) -> Self {
        Self::with_options(source, HubOptions::default())
    }

    pub fn with_options(source: Arc<dyn BlockSource>, options: HubOptions) -> Self {
        Self {
            source,
            options,
            next_id: AtomicU64::new(0),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Attaches a raw-block subscriber to `channel`, starting the shared
    /// stream if this is the first subscriber. Must be called from within a
    /// tokio runtime.
    pub fn subscribe_blocks(&self, channel: &str) -> BlockSubscription {
        let mut channels = self.channels.lock().expect("hub poisoned");
        let needs_spawn = match channels.get(channel) {
            Some(entry) => entry.done.load(Ordering::Acquire),
            None => true,
        };
        if needs_spawn {
            let roster = Arc::new(Roster::default());
            let done = Arc::new(AtomicBool::new(false));
            let task = tokio::spawn(run_stream(
                channel.to_owned(),
                self.source.clone(),
                roster.clone(),
                done.clone(),
                self.options,
            ));
            channels.insert(channel.to_owned(), ChannelStream { roster, done, task });
        }
        let entry = channels.get(channel).expect("stream just inserted");

        let (tx, rx) = mpsc::channel(self.options.buffer.max(1));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let fail = Arc::new(FailCell::default());
        entry.roster.add(Subscriber {
            id,
            tx,
            fail: fail.clone(),
        });
        BlockSubscription {
            rx,
            fail,
            _guard: SubscriptionGuard {
                id,
                roster: entry.roster.clone(),
            },
        }
    }

    /// Waits for the validation outcome of one transaction on `channel`.
    pub fn subscribe_tx(&self, channel: &str, tx_id: impl Into<String>) -> super::TxSubscription {
        super::TxSubscription::new(self.subscribe_blocks(channel), tx_id.into())
    }

    /// Yields, in block order, every event emitted by `chaincode`.
    pub fn subscribe_cc_events(
        &self,
        channel: &str,
        chaincode: impl Into<String>,
    ) -> super::CcEventSubscription {
        super::CcEventSubscription::new(self.subscribe_blocks(channel), chaincode.into())
    }

    /// How many subscribers are attached to `channel` right now.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        let channels = self.channels.lock().expect("hub poisoned");
        channels
            .get(channel)
            .map(|entry| entry.roster.subs.read().expect("roster poisoned").len())
            .unwrap_or(0)
    }

    /// Tears down every channel stream; pending subscribers resolve with
    /// `StreamClosed`.
    pub fn close(&self) {
        let mut channels = self.channels.lock().expect("hub poisoned");
        for (channel, entry) in channels.drain() {
            debug!(channel, "closing deliver stream");
            entry.done.store(true, Ordering::Release);
            entry.task.abort();
            entry.roster.fail_all(Terminal::Closed);
        }
    }
}

impl Drop for DeliverHub {
    fn drop(&mut self) {
        self.close();
    }
}

/// A raw-block subscription handle. Dropping it detaches the subscriber
/// without affecting the others.
pub struct BlockSubscription {
    rx: mpsc::Receiver<Arc<Block>>,
    fail: Arc<FailCell>,
    _guard: SubscriptionGuard,
}

impl BlockSubscription {
    /// The next block in ledger order, or the terminal error for this
    /// subscription.
    pub async fn next_block(&mut self) -> Result<Arc<Block>> {
        match self.rx.recv().await {
            Some(block) => Ok(block),
            None => Err(self.fail.error()),
        }
    }
}

struct SubscriptionGuard {
    id: u64,
    roster: Arc<Roster>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.roster.remove(self.id);
    }
}

/// The per-channel dispatcher: owns the underlying stream, fans blocks out,
/// reconnects from `last seen + 1`, and shuts down after lingering idle.
async fn run_stream(
    channel: String,
    source: Arc<dyn BlockSource>,
    roster: Arc<Roster>,
    done: Arc<AtomicBool>,
    options: HubOptions,
) {
    let mut resume: Option<u64> = None;
    let mut attempts: u32 = 0;
    let mut empty_since: Option<tokio::time::Instant> = None;
    let mut idle = tokio::time::interval(Duration::from_millis(250));
    idle.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    'connect: loop {
        let seek = match resume {
            None => SeekFrom::Newest,
            Some(number) => SeekFrom::Specified(number),
        };
        let mut stream = match source.open(&channel, seek).await {
            Ok(stream) => stream,
            Err(e) => {
                attempts += 1;
                if attempts >= options.retry_budget {
                    warn!(channel, error = %e, "deliver stream failed permanently");
                    roster.fail_all(Terminal::Failed(e.to_string()));
                    done.store(true, Ordering::Release);
                    return;
                }
                tokio::time::sleep(options.retry_backoff * attempts).await;
                continue 'connect;
            }
        };
        debug!(channel, resume = ?resume, "deliver stream open");

        loop {
            tokio::select! {
                item = stream.next() => {
                    let failure = match item {
                        Some(Ok(block)) => {
                            attempts = 0;
                            if let Some(header) = &block.header {
                                resume = Some(header.number + 1);
                            }
                            roster.dispatch(&Arc::new(block));
                            continue;
                        }
                        Some(Err(e)) => e.to_string(),
                        None => "stream ended".to_owned(),
                    };
                    attempts += 1;
                    if attempts >= options.retry_budget {
                        warn!(channel, failure, "deliver stream failed permanently");
                        roster.fail_all(Terminal::Failed(failure));
                        done.store(true, Ordering::Release);
                        return;
                    }
                    debug!(channel, failure, attempt = attempts, "deliver stream dropped, reconnecting");
                    tokio::time::sleep(options.retry_backoff * attempts).await;
                    continue 'connect;
                }
                _ = idle.tick() => {
                    if roster.is_empty() {
                        let since = empty_since.get_or_insert_with(tokio::time::Instant::now);
                        if since.elapsed() >= options.linger {
                            debug!(channel, "last subscriber detached, closing stream");
                            done.store(true, Ordering::Release);
                            return;
                        }
                    } else {
                        empty_since = None;
                    }
                }
            }
        }
    }
}
