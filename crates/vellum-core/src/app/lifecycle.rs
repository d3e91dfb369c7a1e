//! Lifecycle - Parsed → Installed → Activated
//!
//! Activated になるまで Gallery はリクエストを横取りしない。

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Parsed,
    Installed,
    Activated,
}

impl LifecycleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Parsed,
            1 => Self::Installed,
            _ => Self::Activated,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Parsed => 0,
            Self::Installed => 1,
            Self::Activated => 2,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Installed => "installed",
            Self::Activated => "activated",
        };
        f.write_str(name)
    }
}

/// 状態は前にしか進まない
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Parsed.as_u8()),
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `target` まで進める。遷移したら直前の状態を返す（既に到達済みなら None）
    pub fn advance(&self, target: LifecycleState) -> Option<LifecycleState> {
        let previous = self.state.fetch_max(target.as_u8(), Ordering::AcqRel);
        (previous < target.as_u8()).then(|| LifecycleState::from_u8(previous))
    }

    pub fn is_active(&self) -> bool {
        self.state() == LifecycleState::Activated
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_parsed() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Parsed);
        assert!(!lifecycle.is_active());
    }

    #[test]
    fn advance_is_idempotent() {
        let lifecycle = Lifecycle::new();
        assert_eq!(
            lifecycle.advance(LifecycleState::Installed),
            Some(LifecycleState::Parsed)
        );
        assert_eq!(lifecycle.advance(LifecycleState::Installed), None);
        assert_eq!(lifecycle.state(), LifecycleState::Installed);
    }

    #[test]
    fn never_moves_backwards() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(LifecycleState::Activated);
        assert_eq!(lifecycle.advance(LifecycleState::Installed), None);
        assert_eq!(lifecycle.state(), LifecycleState::Activated);
        assert_eq!(lifecycle.state().to_string(), "activated");
    }
}
