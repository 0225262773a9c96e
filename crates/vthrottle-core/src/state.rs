//! Throttle state machine.
//!
//! Pure transitions with no clock or timer attached: callers pass in the
//! current instant and act on the returned [`Step`]. `ThrottleController`
//! is the usual caller, but hosts with their own scheduling (a game loop, an
//! actor mailbox) can drive this directly.
//!
//! ```text
//!            input, elapsed >= delay
//!          +-----------------------+
//!          v                       |
//!   ---> Idle --input, elapsed < delay--> Armed --fire--> Idle
//!                                  ^        |
//!                                  +--------+  input: retire ticket, re-evaluate
//!
//!   teardown from any phase --> TornDown (terminal)
//! ```

use std::time::{Duration, Instant};

/// Generation token for one armed deferred publish.
///
/// A fire carrying a ticket that is no longer the pending one is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Coarse phase of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No deferred publish pending.
    Idle,
    /// Exactly one deferred publish pending.
    Armed,
    /// Session ended; inputs and fires are ignored.
    TornDown,
}

/// What the caller has to do after feeding an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The input became the published value.
    Published {
        /// Pending deferred publish superseded by this input.
        retired: Option<Ticket>,
    },
    /// The input must be published after `after` unless superseded.
    Armed {
        ticket: Ticket,
        after: Duration,
        retired: Option<Ticket>,
    },
    /// The state machine is torn down.
    Ignored,
}

impl Step {
    /// Ticket whose timer the caller must cancel, if any.
    pub const fn retired(&self) -> Option<Ticket> {
        match self {
            Self::Published { retired } | Self::Armed { retired, .. } => *retired,
            Self::Ignored => None,
        }
    }
}

#[derive(Debug)]
struct Pending<T> {
    ticket: Ticket,
    value: T,
    /// `None` when the deadline is past what `Instant` can represent.
    due: Option<Instant>,
}

/// Trailing-edge throttle state.
#[derive(Debug)]
pub struct ThrottleState<T> {
    published: T,
    last_publish: Instant,
    pending: Option<Pending<T>>,
    next_ticket: u64,
    torn_down: bool,
}

impl<T> ThrottleState<T> {
    /// Start a session; `initial` counts as published at `now`.
    pub const fn new(initial: T, now: Instant) -> Self {
        Self {
            published: initial,
            last_publish: now,
            pending: None,
            next_ticket: 0,
            torn_down: false,
        }
    }

    /// Feed a new `(value, delay)` snapshot observed at `now`.
    ///
    /// Any pending deferred publish is retired first; it referenced an older
    /// value. The remaining wait is computed against the last publish, so a
    /// re-armed timer keeps the original window end rather than restarting it.
    pub fn on_input(&mut self, value: T, delay: Duration, now: Instant) -> Step {
        if self.torn_down {
            return Step::Ignored;
        }

        let retired = self.pending.take().map(|pending| pending.ticket);
        let elapsed = now.saturating_duration_since(self.last_publish);

        if elapsed >= delay {
            self.published = value;
            self.last_publish = now;
            return Step::Published { retired };
        }

        let after = delay - elapsed;
        let ticket = self.issue_ticket();
        self.pending = Some(Pending {
            ticket,
            value,
            due: now.checked_add(after),
        });
        Step::Armed {
            ticket,
            after,
            retired,
        }
    }

    /// A timer armed for `ticket` fired at `now`.
    ///
    /// Returns `true` if the pending value was published.
    pub fn on_fire(&mut self, ticket: Ticket, now: Instant) -> bool {
        if self.torn_down {
            return false;
        }
        match self.pending.take() {
            Some(pending) if pending.ticket == ticket => {
                self.published = pending.value;
                self.last_publish = now;
                true
            }
            other => {
                self.pending = other;
                false
            }
        }
    }

    /// Drop the pending publish for `ticket` without publishing.
    ///
    /// Used when the timer for it could not be registered.
    pub fn abandon(&mut self, ticket: Ticket) -> bool {
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.ticket == ticket)
        {
            self.pending = None;
            return true;
        }
        false
    }

    /// End the session, returning the ticket that still needs canceling.
    ///
    /// Idempotent.
    pub fn teardown(&mut self) -> Option<Ticket> {
        self.torn_down = true;
        self.pending.take().map(|pending| pending.ticket)
    }

    pub const fn phase(&self) -> Phase {
        if self.torn_down {
            Phase::TornDown
        } else if self.pending.is_some() {
            Phase::Armed
        } else {
            Phase::Idle
        }
    }

    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub const fn published(&self) -> &T {
        &self.published
    }

    pub const fn last_publish(&self) -> Instant {
        self.last_publish
    }

    /// When the pending deferred publish is due, if one is armed and the
    /// deadline is representable.
    pub fn pending_due(&self) -> Option<Instant> {
        self.pending.as_ref().and_then(|pending| pending.due)
    }

    /// Value waiting to be published, if one is armed.
    pub fn pending_value(&self) -> Option<&T> {
        self.pending.as_ref().map(|pending| &pending.value)
    }

    const fn issue_ticket(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        ticket
    }
}
