//! Depth-indented tracing for the decode and encode drivers.
//!
//! The tracer mirrors the recursion of the driver: each nested value pushes
//! a level, and a level entered quietly silences everything below it. Output
//! goes through `tracing::debug!` so hosts control it with their subscriber.

use std::fmt;

/// Per-context trace state.
pub struct Tracer {
    // quiet flag per level; index 0 is the root
    stack: Vec<bool>,
}

impl Tracer {
    pub fn new(quiet: bool) -> Self {
        Self { stack: vec![quiet] }
    }

    /// Current nesting depth below the root.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Whether a line emitted now would be visible.
    pub fn on(&self) -> bool {
        !*self.stack.last().unwrap_or(&true)
    }

    /// Enter a nested level. Quiet propagates: a level below a quiet one
    /// stays quiet.
    pub fn push(&mut self, quiet: bool) {
        let inherited = !self.on();
        self.stack.push(inherited || quiet);
    }

    /// Leave the current level; the root level is never popped.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Emit one indented line unless silenced.
    pub fn line(&self, args: fmt::Arguments<'_>) {
        if self.on() {
            tracing::debug!("{:indent$}{}", "", args, indent = self.depth() * 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_visibility() {
        assert!(Tracer::new(false).on());
        assert!(!Tracer::new(true).on());
    }

    #[test]
    fn quiet_propagates_to_children() {
        let mut t = Tracer::new(false);
        t.push(true);
        assert!(!t.on());
        t.push(false);
        // still quiet: inherited from the quiet parent
        assert!(!t.on());
        t.pop();
        t.pop();
        assert!(t.on());
    }

    #[test]
    fn depth_tracks_pushes() {
        let mut t = Tracer::new(false);
        assert_eq!(t.depth(), 0);
        t.push(false);
        t.push(false);
        assert_eq!(t.depth(), 2);
        t.pop();
        assert_eq!(t.depth(), 1);
    }

    #[test]
    fn root_is_never_popped() {
        let mut t = Tracer::new(false);
        t.pop();
        t.pop();
        assert_eq!(t.depth(), 0);
        assert!(t.on());
    }
}
