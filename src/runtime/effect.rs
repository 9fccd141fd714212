//! # Effects
//!
//! Reducers stay synchronous; anything that touches the outside world is
//! described as an [`Effect`] value and handed back to the store. The store
//! interprets effects only after the state change that produced them has
//! been applied and published, so an effect can never observe state older
//! than its own action.
//!
//! An effect is one of:
//! - `none`: nothing to do
//! - `send(action)`: feed a follow-up action straight back into the store
//! - `run(body)`: spawn an async task that may emit any number of actions
//! - `cancel(key)`: stop whatever task is registered under `key`
//! - `merge(effects)`: several of the above, kept in declaration order
//!
//! A `run` effect tagged with [`Effect::cancellable`] registers its task
//! under a [`CancelKey`]. Starting a second task under the same key stops
//! the first one, and a cancelled task is silent: none of its actions reach
//! the store afterwards, not even ones it emitted just before the cancel.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

// ============================================================================
// Cancellation Keys
// ============================================================================

/// Identity for a cancellable task. The store keeps at most one running
/// task per key; keys are compared by value, so two features using the
/// same string share one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CancelKey(Cow<'static, str>);

impl CancelKey {
    pub const fn from_static(name: &'static str) -> Self {
        CancelKey(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        CancelKey(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CancelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for CancelKey {
    fn from(name: &'static str) -> Self {
        CancelKey::from_static(name)
    }
}

impl From<String> for CancelKey {
    fn from(name: String) -> Self {
        CancelKey(Cow::Owned(name))
    }
}

// ============================================================================
// Emitter
// ============================================================================

/// Send-actions-back capability handed to `run` bodies. Emitting never
/// blocks: the action is queued on the store and processed in order with
/// everything else. Emissions from a cancelled task are discarded.
pub struct Emitter<A> {
    send: Arc<dyn Fn(A) + Send + Sync>,
}

impl<A> Emitter<A> {
    pub(crate) fn new(send: Arc<dyn Fn(A) + Send + Sync>) -> Self {
        Emitter { send }
    }

    pub fn emit(&self, action: A) {
        (self.send)(action);
    }
}

impl<A> Clone for Emitter<A> {
    fn clone(&self) -> Self {
        Emitter {
            send: Arc::clone(&self.send),
        }
    }
}

// ============================================================================
// Effect
// ============================================================================

pub(crate) type RunBody<A> = Box<dyn FnOnce(Emitter<A>) -> BoxFuture<'static, ()> + Send>;

pub(crate) enum EffectKind<A> {
    None,
    Send(A),
    Run {
        key: Option<CancelKey>,
        body: RunBody<A>,
    },
    Cancel(CancelKey),
    Batch(Vec<Effect<A>>),
}

/// A description of work for the store to perform after a reduce step.
/// Building one performs nothing; the store owns execution.
pub struct Effect<A> {
    kind: EffectKind<A>,
}

impl<A> Effect<A> {
    /// The empty effect. Reducer arms that only touch state return this.
    pub fn none() -> Self {
        Effect {
            kind: EffectKind::None,
        }
    }

    /// Feed `action` back into the store. Processed before the dispatch
    /// that produced it returns, ahead of any concurrently queued work.
    pub fn send(action: A) -> Self {
        Effect {
            kind: EffectKind::Send(action),
        }
    }

    /// Spawn `body` as an async task. The task receives an [`Emitter`] and
    /// may emit zero or more actions over its lifetime.
    pub fn run<F, Fut>(body: F) -> Self
    where
        A: Send + 'static,
        F: FnOnce(Emitter<A>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Effect {
            kind: EffectKind::Run {
                key: None,
                body: Box::new(move |emitter| body(emitter).boxed()),
            },
        }
    }

    /// Stop the task currently registered under `key`, if any. Cancelling
    /// an unused key does nothing.
    pub fn cancel(key: impl Into<CancelKey>) -> Self {
        Effect {
            kind: EffectKind::Cancel(key.into()),
        }
    }

    /// Combine several effects. Order is preserved; `none` entries are
    /// dropped, and a single surviving effect is returned unwrapped.
    pub fn merge(effects: impl IntoIterator<Item = Effect<A>>) -> Self {
        let mut kept: Vec<Effect<A>> = effects.into_iter().filter(|e| !e.is_none()).collect();
        match kept.len() {
            0 => Effect::none(),
            1 => kept.remove(0),
            _ => Effect {
                kind: EffectKind::Batch(kept),
            },
        }
    }

    /// Register the task of a `run` effect under `key`. The store stops any
    /// task already running under the same key before starting this one.
    /// On effects without a task this is a no-op.
    pub fn cancellable(self, key: impl Into<CancelKey>) -> Self {
        match self.kind {
            EffectKind::Run { body, .. } => Effect {
                kind: EffectKind::Run {
                    key: Some(key.into()),
                    body,
                },
            },
            other => Effect { kind: other },
        }
    }

    /// Lift this effect into a parent action type. Every action the effect
    /// produces, now or from a running task, passes through `transform`.
    /// Cancellation keys are left untouched.
    pub fn map<B, F>(self, transform: F) -> Effect<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        self.map_shared(Arc::new(transform))
    }

    fn map_shared<B>(self, transform: Arc<dyn Fn(A) -> B + Send + Sync>) -> Effect<B>
    where
        A: Send + 'static,
        B: Send + 'static,
    {
        let kind = match self.kind {
            EffectKind::None => EffectKind::None,
            EffectKind::Send(action) => EffectKind::Send(transform(action)),
            EffectKind::Run { key, body } => EffectKind::Run {
                key,
                body: Box::new(move |emitter: Emitter<B>| {
                    let inner = Emitter::new(Arc::new(move |action: A| {
                        emitter.emit(transform(action));
                    }));
                    body(inner)
                }),
            },
            EffectKind::Cancel(key) => EffectKind::Cancel(key),
            EffectKind::Batch(children) => EffectKind::Batch(
                children
                    .into_iter()
                    .map(|child| child.map_shared(Arc::clone(&transform)))
                    .collect(),
            ),
        };
        Effect { kind }
    }

    pub fn is_none(&self) -> bool {
        matches!(self.kind, EffectKind::None)
    }

    pub(crate) fn into_kind(self) -> EffectKind<A> {
        self.kind
    }
}

impl<A> fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl<A> fmt::Debug for EffectKind<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectKind::None => f.write_str("Effect::none"),
            EffectKind::Send(_) => f.write_str("Effect::send"),
            EffectKind::Run { key: Some(key), .. } => write!(f, "Effect::run({key})"),
            EffectKind::Run { key: None, .. } => f.write_str("Effect::run"),
            EffectKind::Cancel(key) => write!(f, "Effect::cancel({key})"),
            EffectKind::Batch(children) => write!(f, "Effect::merge(len={})", children.len()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
