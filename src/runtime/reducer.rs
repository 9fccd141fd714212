//! # Reducers
//!
//! A reducer owns one slice of application state. It receives each action,
//! applies the state change synchronously, and returns an [`Effect`]
//! describing any follow-up work. Reducers never perform I/O themselves.
//!
//! Composition is structural:
//! - [`Scoped`] lifts a child reducer into a parent domain through a state
//!   lens and an action mapping, so features stay self-contained.
//! - [`Combined`] runs several reducers over the same domain in
//!   declaration order and merges their effects in that order.

use super::effect::Effect;

/// One step of the state machine. Implementations must be cheap and
/// synchronous; long-running work belongs in the returned effect.
pub trait Reducer: Send + Sync {
    type State;
    type Action: Send + 'static;

    fn reduce(&self, state: &mut Self::State, action: Self::Action) -> Effect<Self::Action>;
}

// ============================================================================
// Scoped
// ============================================================================

/// Lifts a child reducer into a parent domain.
///
/// `focus` selects the child's state slice inside the parent state,
/// `extract` recognizes the child's actions inside the parent action type,
/// and `embed` wraps child actions back up for effects. Parent actions the
/// child does not recognize are ignored without touching the slice.
pub struct Scoped<PS, PA, R: Reducer> {
    child: R,
    focus: fn(&mut PS) -> &mut R::State,
    extract: fn(&PA) -> Option<R::Action>,
    embed: fn(R::Action) -> PA,
}

impl<PS, PA, R: Reducer> Scoped<PS, PA, R> {
    pub fn new(
        child: R,
        focus: fn(&mut PS) -> &mut R::State,
        extract: fn(&PA) -> Option<R::Action>,
        embed: fn(R::Action) -> PA,
    ) -> Self {
        Scoped {
            child,
            focus,
            extract,
            embed,
        }
    }
}

impl<PS, PA, R> Reducer for Scoped<PS, PA, R>
where
    PS: Send + 'static,
    PA: Send + 'static,
    R: Reducer,
{
    type State = PS;
    type Action = PA;

    fn reduce(&self, state: &mut PS, action: PA) -> Effect<PA> {
        let Some(child_action) = (self.extract)(&action) else {
            return Effect::none();
        };
        let effect = self.child.reduce((self.focus)(state), child_action);
        effect.map(self.embed)
    }
}

// ============================================================================
// Combined
// ============================================================================

/// Runs reducers over the same domain, in the order they were added.
///
/// Children are expected to own disjoint slices of the state; under that
/// discipline no child observes another child's update for the action
/// currently being reduced. Effects are merged in declaration order.
pub struct Combined<S, A> {
    children: Vec<Box<dyn Reducer<State = S, Action = A>>>,
}

impl<S: 'static, A: Send + 'static> Combined<S, A> {
    pub fn new() -> Self {
        Combined {
            children: Vec::new(),
        }
    }

    pub fn with(mut self, child: impl Reducer<State = S, Action = A> + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }
}

impl<S: 'static, A: Send + 'static> Default for Combined<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> Reducer for Combined<S, A>
where
    S: Send + 'static,
    A: Clone + Send + 'static,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: &mut S, action: A) -> Effect<A> {
        let mut effects = Vec::with_capacity(self.children.len());
        for child in &self.children {
            effects.push(child.reduce(state, action.clone()));
        }
        Effect::merge(effects)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::effect::EffectKind;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Tally {
        count: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TallyAction {
        Add(i32),
        Reset,
    }

    /// Resets itself once the count reaches ten.
    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = Tally;
        type Action = TallyAction;

        fn reduce(&self, state: &mut Tally, action: TallyAction) -> Effect<TallyAction> {
            match action {
                TallyAction::Add(n) => {
                    state.count += n;
                    if state.count >= 10 {
                        Effect::send(TallyAction::Reset)
                    } else {
                        Effect::none()
                    }
                }
                TallyAction::Reset => {
                    state.count = 0;
                    Effect::none()
                }
            }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Shell {
        tally: Tally,
        renames: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum ShellAction {
        Tally(TallyAction),
        Rename,
    }

    fn scoped_tally() -> Scoped<Shell, ShellAction, TallyReducer> {
        Scoped::new(
            TallyReducer,
            |shell| &mut shell.tally,
            |action| match action {
                ShellAction::Tally(inner) => Some(inner.clone()),
                _ => None,
            },
            ShellAction::Tally,
        )
    }

    #[test]
    fn test_scoped_routes_child_actions_to_the_slice() {
        let reducer = scoped_tally();
        let mut shell = Shell::default();

        let effect = reducer.reduce(&mut shell, ShellAction::Tally(TallyAction::Add(3)));

        assert_eq!(shell.tally.count, 3);
        assert!(effect.is_none());
    }

    #[test]
    fn test_scoped_ignores_unrelated_actions() {
        let reducer = scoped_tally();
        let mut shell = Shell {
            tally: Tally { count: 4 },
            renames: 0,
        };

        let effect = reducer.reduce(&mut shell, ShellAction::Rename);

        assert_eq!(shell.tally.count, 4);
        assert!(effect.is_none());
    }

    #[test]
    fn test_scoped_embeds_child_effects_into_parent_actions() {
        let reducer = scoped_tally();
        let mut shell = Shell::default();

        let effect = reducer.reduce(&mut shell, ShellAction::Tally(TallyAction::Add(12)));

        match effect.into_kind() {
            EffectKind::Send(ShellAction::Tally(TallyAction::Reset)) => {}
            other => panic!("expected embedded reset, got {other:?}"),
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Trace {
        visits: Vec<&'static str>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TraceAction {
        Go,
        One,
        Two,
    }

    struct First;

    impl Reducer for First {
        type State = Trace;
        type Action = TraceAction;

        fn reduce(&self, state: &mut Trace, action: TraceAction) -> Effect<TraceAction> {
            match action {
                TraceAction::Go => {
                    state.visits.push("first");
                    Effect::send(TraceAction::One)
                }
                _ => Effect::none(),
            }
        }
    }

    struct Second;

    impl Reducer for Second {
        type State = Trace;
        type Action = TraceAction;

        fn reduce(&self, state: &mut Trace, action: TraceAction) -> Effect<TraceAction> {
            match action {
                TraceAction::Go => {
                    state.visits.push("second");
                    Effect::send(TraceAction::Two)
                }
                _ => Effect::none(),
            }
        }
    }

    #[test]
    fn test_combined_runs_children_in_declaration_order() {
        let reducer = Combined::new().with(First).with(Second);
        let mut state = Trace::default();

        let effect = reducer.reduce(&mut state, TraceAction::Go);

        assert_eq!(state.visits, vec!["first", "second"]);
        let EffectKind::Batch(children) = effect.into_kind() else {
            panic!("expected both effects to survive the merge");
        };
        let order: Vec<TraceAction> = children
            .into_iter()
            .map(|child| match child.into_kind() {
                EffectKind::Send(action) => action,
                other => panic!("expected send, got {other:?}"),
            })
            .collect();
        assert_eq!(order, vec![TraceAction::One, TraceAction::Two]);
    }
}
