//! # Store
//!
//! Owns the application state and runs the dispatch loop:
//!
//! ```text
//! dispatch(action) ─▶ queue ─▶ reduce ─▶ publish state ─▶ execute effects
//!                       ▲                                      │
//!                       └──── sent / emitted actions ──────────┘
//! ```
//!
//! Actions are processed strictly one at a time in arrival order, on
//! whichever thread happens to be draining the queue. Each action's state
//! change is published on a watch channel before that action's effects
//! execute, so an effect can always observe the state its action produced.
//!
//! `run` effects become Tokio tasks. A task tagged with a [`CancelKey`] is
//! registered under that key; starting another task under the same key, or
//! executing a `cancel` effect for it, stops the running one. Cancellation
//! is silent: from the moment the cancel is processed, emissions from the
//! stopped task are discarded, including ones already sitting in the queue.
//!
//! A panicking reducer poisons the store. No state is published for the
//! panicked action and every later use of the store panics as well; a
//! reducer bug cannot be papered over at runtime.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::debug;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use super::effect::{CancelKey, Effect, EffectKind, Emitter, RunBody};
use super::reducer::Reducer;

// ============================================================================
// Store Handle
// ============================================================================

/// Shared handle to a running store. Clones share the same state, queue,
/// and task registry; when the last handle drops, all running tasks are
/// stopped.
pub struct Store<R: Reducer> {
    core: Arc<StoreCore<R>>,
}

impl<R> Store<R>
where
    R: Reducer + 'static,
    R::State: Clone + Send + Sync + 'static,
{
    pub fn new(initial: R::State, reducer: R) -> Self {
        let (watch_tx, _) = watch::channel(initial.clone());
        let core = Arc::new_cyclic(|weak| StoreCore {
            reducer,
            watch_tx,
            weak: weak.clone(),
            inner: Mutex::new(Inner {
                state: initial,
                queue: VecDeque::new(),
                draining: false,
                registry: Registry::default(),
            }),
        });
        Store { core }
    }

    /// Feed an action into the store. When no other thread is mid-drain,
    /// this processes the action plus every follow-up `send` it triggers
    /// before returning; `run` tasks are started but not awaited.
    pub fn dispatch(&self, action: R::Action) {
        self.core.enqueue(Envelope {
            action,
            source: None,
        });
    }

    /// Snapshot of the most recently published state.
    pub fn state(&self) -> R::State {
        self.core.watch_tx.borrow().clone()
    }

    /// Observe state publications. The receiver always holds the latest
    /// state; intermediate values may be skipped under load.
    pub fn subscribe(&self) -> watch::Receiver<R::State> {
        self.core.watch_tx.subscribe()
    }

    /// Whether a task is currently registered under `key`.
    pub fn is_task_running(&self, key: &CancelKey) -> bool {
        let inner = self.core.inner.lock().unwrap();
        inner.registry.keyed.contains_key(key)
    }
}

impl<R: Reducer> Clone for Store<R> {
    fn clone(&self) -> Self {
        Store {
            core: Arc::clone(&self.core),
        }
    }
}

// ============================================================================
// Core: queue and drain loop
// ============================================================================

/// A queued action plus the cancellation flag of the task that emitted it.
/// External dispatches and reducer `send` children carry no flag.
struct Envelope<A> {
    action: A,
    source: Option<Arc<AtomicBool>>,
}

struct StoreCore<R: Reducer> {
    reducer: R,
    watch_tx: watch::Sender<R::State>,
    weak: Weak<StoreCore<R>>,
    inner: Mutex<Inner<R::State, R::Action>>,
}

struct Inner<S, A> {
    state: S,
    queue: VecDeque<Envelope<A>>,
    draining: bool,
    registry: Registry,
}

impl<R> StoreCore<R>
where
    R: Reducer + 'static,
    R::State: Clone + Send + Sync + 'static,
{
    fn enqueue(&self, envelope: Envelope<R::Action>) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.queue.push_back(envelope);
            if inner.draining {
                return;
            }
            inner.draining = true;
        }
        self.drain();
    }

    /// Process queued actions until the queue is empty. The `draining`
    /// flag guarantees a single drainer, so reduces never overlap.
    fn drain(&self) {
        loop {
            let envelope = {
                let mut inner = self.inner.lock().unwrap();
                match inner.queue.pop_front() {
                    Some(envelope) => envelope,
                    None => {
                        inner.draining = false;
                        return;
                    }
                }
            };

            // Delivery-time check: the emitting task may have been
            // cancelled after this envelope was queued.
            if let Some(flag) = &envelope.source
                && flag.load(Ordering::SeqCst)
            {
                debug!("dropped queued action from a cancelled task");
                continue;
            }

            let effect = {
                let mut inner = self.inner.lock().unwrap();
                let effect = self.reducer.reduce(&mut inner.state, envelope.action);
                self.watch_tx.send_replace(inner.state.clone());
                effect
            };
            self.execute(effect);
        }
    }

    fn execute(&self, effect: Effect<R::Action>) {
        match effect.into_kind() {
            EffectKind::None => {}
            EffectKind::Send(action) => self.enqueue(Envelope {
                action,
                source: None,
            }),
            EffectKind::Cancel(key) => {
                let mut inner = self.inner.lock().unwrap();
                inner.registry.cancel(&key);
            }
            EffectKind::Run { key, body } => self.spawn(key, body),
            EffectKind::Batch(children) => {
                for child in children {
                    self.execute(child);
                }
            }
        }
    }

    /// Start a `run` task on the ambient Tokio runtime. For keyed tasks
    /// the previous holder of the key is stopped before the new task is
    /// registered, so at most one task runs per key.
    fn spawn(&self, key: Option<CancelKey>, body: RunBody<R::Action>) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let emitter = self.emitter(Arc::clone(&cancelled));

        let mut inner = self.inner.lock().unwrap();
        if let Some(key) = &key {
            inner.registry.cancel(key);
        }
        let id = inner.registry.allocate_id();

        // The guard is captured by the future itself, so deregistration
        // runs when the future is dropped: on completion, panic, or abort.
        let guard = Deregister {
            core: self.weak.clone(),
            id,
        };
        let handle = tokio::spawn(async move {
            let _guard = guard;
            body(emitter).await;
        });

        inner.registry.tasks.insert(
            id,
            RunningTask {
                abort: handle.abort_handle(),
                cancelled,
                key: key.clone(),
            },
        );
        if let Some(key) = key {
            debug!("task started under key '{key}'");
            inner.registry.keyed.insert(key, id);
        }
    }

    /// Emit capability handed to a task body. Emissions are dropped once
    /// the owning task is cancelled or the store is gone.
    fn emitter(&self, cancelled: Arc<AtomicBool>) -> Emitter<R::Action> {
        let core = self.weak.clone();
        Emitter::new(Arc::new(move |action| {
            if cancelled.load(Ordering::SeqCst) {
                debug!("discarded emission from a cancelled task");
                return;
            }
            if let Some(core) = core.upgrade() {
                core.enqueue(Envelope {
                    action,
                    source: Some(Arc::clone(&cancelled)),
                });
            }
        }))
    }
}

impl<R: Reducer> Drop for StoreCore<R> {
    fn drop(&mut self) {
        let inner = match self.inner.get_mut() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (_, task) in inner.registry.tasks.drain() {
            task.cancelled.store(true, Ordering::SeqCst);
            task.abort.abort();
        }
        inner.registry.keyed.clear();
    }
}

// ============================================================================
// Task Registry
// ============================================================================

#[derive(Default)]
struct Registry {
    next_id: u64,
    tasks: HashMap<u64, RunningTask>,
    keyed: HashMap<CancelKey, u64>,
}

struct RunningTask {
    abort: AbortHandle,
    cancelled: Arc<AtomicBool>,
    key: Option<CancelKey>,
}

impl Registry {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Stop and forget the task under `key`. The flag is raised before the
    /// abort so in-flight emissions are already dead when the task winds
    /// down. No-op when nothing runs under the key.
    fn cancel(&mut self, key: &CancelKey) {
        if let Some(id) = self.keyed.remove(key)
            && let Some(task) = self.tasks.remove(&id)
        {
            task.cancelled.store(true, Ordering::SeqCst);
            task.abort.abort();
            debug!("cancelled task under key '{key}'");
        }
    }

    /// Forget a finished task. The key mapping is only cleared when it
    /// still points at this task; a successor may own the key by now.
    fn deregister(&mut self, id: u64) {
        if let Some(task) = self.tasks.remove(&id)
            && let Some(key) = task.key
            && self.keyed.get(&key) == Some(&id)
        {
            self.keyed.remove(&key);
        }
    }
}

/// Removes a task's registry entry when its future is dropped.
struct Deregister<R: Reducer> {
    core: Weak<StoreCore<R>>,
    id: u64,
}

impl<R: Reducer> Drop for Deregister<R> {
    fn drop(&mut self) {
        // Tolerate a poisoned lock here: this runs during task teardown
        // and must not panic while unwinding.
        if let Some(core) = self.core.upgrade()
            && let Ok(mut inner) = core.inner.lock()
        {
            inner.registry.deregister(self.id);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
