//! Named modes with enter/leave hooks.
//!
//! A [`ModeMachine`] holds the current mode of something (the rocket) and
//! runs per-mode hooks when it changes. Any mode may follow any other; the
//! machine only sequences the hooks.
//!
//! ```ignore
//! let mut machine = ModeMachine::new(RocketMode::Idle)
//!     .on_enter(RocketMode::Launching, |log: &mut Vec<&str>| log.push("ignite"))
//!     .on_leave(RocketMode::Launching, |log: &mut Vec<&str>| log.push("cut"));
//!
//! let mut log = Vec::new();
//! machine.start(&mut log);
//! machine.transition_to(RocketMode::Launching, &mut log); // "[idle] -> [launching]"
//! ```

use std::fmt;

pub use spacefx_derive::Mode;

/// A closed set of unit variants with dense indices.
///
/// Implement with `#[derive(Mode)]`.
pub trait Mode: Copy + Eq + fmt::Debug + 'static {
    /// Number of variants.
    const COUNT: usize;
    /// Every variant in declaration order.
    const ALL: &'static [Self];

    /// Position of this variant in [`ALL`](Self::ALL).
    fn index(self) -> usize;

    fn from_index(index: usize) -> Option<Self>;

    /// `snake_case` name.
    fn name(self) -> &'static str;
}

/// What the rocket is doing.
#[derive(Mode, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RocketMode {
    #[default]
    Idle,
    Launching,
    Following,
    Resetting,
}

type Hook<C> = Box<dyn FnMut(&mut C)>;

/// Current mode plus a hook table indexed by [`Mode::index`].
///
/// `C` is the context handed to every hook.
pub struct ModeMachine<S: Mode, C = ()> {
    current: S,
    initial: S,
    started: bool,
    transitions: u64,
    enter: Vec<Option<Hook<C>>>,
    leave: Vec<Option<Hook<C>>>,
}

impl<S: Mode, C> ModeMachine<S, C> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            initial,
            started: false,
            transitions: 0,
            enter: (0..S::COUNT).map(|_| None).collect(),
            leave: (0..S::COUNT).map(|_| None).collect(),
        }
    }

    /// Run `hook` whenever `mode` is entered. Replaces an earlier hook.
    pub fn on_enter(mut self, mode: S, hook: impl FnMut(&mut C) + 'static) -> Self {
        self.enter[mode.index()] = Some(Box::new(hook));
        self
    }

    /// Run `hook` whenever `mode` is left. Replaces an earlier hook.
    pub fn on_leave(mut self, mode: S, hook: impl FnMut(&mut C) + 'static) -> Self {
        self.leave[mode.index()] = Some(Box::new(hook));
        self
    }

    /// Run the initial mode's enter hook. Only the first call does anything.
    pub fn start(&mut self, ctx: &mut C) {
        if self.started {
            return;
        }
        self.started = true;
        if let Some(hook) = self.enter[self.initial.index()].as_mut() {
            hook(ctx);
        }
    }

    /// Leave the current mode, switch, then enter `next`.
    ///
    /// Self-transitions run both hooks too.
    pub fn transition_to(&mut self, next: S, ctx: &mut C) {
        let from = self.current;
        log::info!("[{}] -> [{}]", from.name(), next.name());

        if let Some(hook) = self.leave[from.index()].as_mut() {
            hook(ctx);
        }
        self.current = next;
        self.transitions += 1;
        if let Some(hook) = self.enter[next.index()].as_mut() {
            hook(ctx);
        }
    }

    /// Current mode.
    pub fn value(&self) -> S {
        self.current
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Transitions since construction.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}

impl<S: Mode, C> fmt::Debug for ModeMachine<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeMachine")
            .field("current", &self.current)
            .field("started", &self.started)
            .field("transitions", &self.transitions)
            .finish_non_exhaustive()
    }
}
