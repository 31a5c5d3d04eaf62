//! Level-to-edge conversion for deadlock notifications.
//!
//! A deadlock is a *level*: it holds on every poll until something breaks
//! it. Callers want an *edge*: one notification when it appears. The
//! trigger arms on the rising edge and disarms, silently, once the level
//! drops.

/// What a single observation did to the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTransition {
    /// Condition appeared. Notify.
    Rising,
    /// Condition cleared. The trigger is re-armed for the next rising edge.
    Falling,
    /// No change since the previous observation.
    Steady,
}

/// Edge detector with explicit armed state.
///
/// # Example
///
/// ```rust
/// use arbiter_monitor::{EdgeTransition, EdgeTrigger};
///
/// let mut trigger = EdgeTrigger::new();
/// assert_eq!(trigger.observe(true), EdgeTransition::Rising);
/// assert_eq!(trigger.observe(true), EdgeTransition::Steady);
/// assert_eq!(trigger.observe(false), EdgeTransition::Falling);
/// assert_eq!(trigger.observe(true), EdgeTransition::Rising);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EdgeTrigger {
    armed: bool,
}

impl EdgeTrigger {
    /// Creates a disarmed trigger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while the condition is known to hold.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Feeds the current level and reports the transition.
    pub fn observe(&mut self, level: bool) -> EdgeTransition {
        match (self.armed, level) {
            (false, true) => {
                self.armed = true;
                EdgeTransition::Rising
            }
            (true, false) => {
                self.armed = false;
                EdgeTransition::Falling
            }
            _ => EdgeTransition::Steady,
        }
    }
}
