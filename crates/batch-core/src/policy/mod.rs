//! Políticas de completitud de chunk.
//!
//! Una política decide cuándo el chunk en curso está "lleno". Su estado vive
//! sólo durante un chunk: el executor llama a `reset` al abrir cada chunk.

use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Estado observable del chunk en curso.
#[derive(Debug, Clone, Copy)]
pub struct ChunkState {
    /// Items leídos en este chunk (incluye los descartados por el processor).
    pub item_count: usize,
    pub now: Instant,
}

pub trait CompletionPolicy: Send + Debug {
    fn reset(&mut self, now: Instant);
    fn is_complete(&self, state: &ChunkState) -> bool;
}

/// Completo al alcanzar `n` items.
#[derive(Debug, Clone)]
pub struct CountPolicy {
    size: usize,
}

impl CountPolicy {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }
}

impl CompletionPolicy for CountPolicy {
    fn reset(&mut self, _now: Instant) {}
    fn is_complete(&self, state: &ChunkState) -> bool {
        state.item_count >= self.size
    }
}

/// Completo cuando el tiempo desde el inicio del chunk supera `timeout`,
/// sin importar cuántos items haya.
#[derive(Debug, Clone)]
pub struct TimeoutPolicy {
    timeout: Duration,
    started: Option<Instant>,
}

impl TimeoutPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, started: None }
    }
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl CompletionPolicy for TimeoutPolicy {
    fn reset(&mut self, now: Instant) {
        self.started = Some(now);
    }
    fn is_complete(&self, state: &ChunkState) -> bool {
        match self.started {
            Some(start) => state.now.saturating_duration_since(start) > self.timeout,
            None => false,
        }
    }
}

/// OR lógico: completo en cuanto cualquiera de las sub-políticas lo esté.
#[derive(Debug, Default)]
pub struct CompositePolicy {
    policies: Vec<Box<dyn CompletionPolicy>>,
}

impl CompositePolicy {
    pub fn new(policies: Vec<Box<dyn CompletionPolicy>>) -> Self {
        Self { policies }
    }
    pub fn with(mut self, policy: impl CompletionPolicy + 'static) -> Self {
        self.policies.push(Box::new(policy));
        self
    }
}

impl CompletionPolicy for CompositePolicy {
    fn reset(&mut self, now: Instant) {
        for p in &mut self.policies {
            p.reset(now);
        }
    }
    fn is_complete(&self, state: &ChunkState) -> bool {
        self.policies.iter().any(|p| p.is_complete(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FakeClock};

    fn state(n: usize, clock: &FakeClock) -> ChunkState {
        ChunkState { item_count: n,
                     now: clock.now() }
    }

    #[test]
    fn count_policy_completes_at_n() {
        let clock = FakeClock::new();
        let mut p = CountPolicy::new(3);
        p.reset(clock.now());
        assert!(!p.is_complete(&state(2, &clock)));
        assert!(p.is_complete(&state(3, &clock)));
    }

    #[test]
    fn timeout_requires_strictly_exceeding() {
        let clock = FakeClock::new();
        let mut p = TimeoutPolicy::from_millis(3000);
        p.reset(clock.now());
        clock.advance_ms(3000);
        assert!(!p.is_complete(&state(0, &clock)));
        clock.advance_ms(1);
        assert!(p.is_complete(&state(0, &clock)));
    }

    #[test]
    fn composite_fires_on_count_without_waiting() {
        let clock = FakeClock::new();
        let mut p = CompositePolicy::default().with(CountPolicy::new(5)).with(TimeoutPolicy::from_millis(3000));
        p.reset(clock.now());
        for n in 1..5 {
            assert!(!p.is_complete(&state(n, &clock)));
        }
        assert!(p.is_complete(&state(5, &clock)));
    }

    #[test]
    fn composite_fires_on_timeout_with_few_items() {
        let clock = FakeClock::new();
        let mut p = CompositePolicy::default().with(CountPolicy::new(5)).with(TimeoutPolicy::from_millis(3000));
        p.reset(clock.now());
        for n in 1..=3 {
            clock.advance_ms(1000);
            assert!(!p.is_complete(&state(n, &clock)), "item {n}");
        }
        clock.advance_ms(1);
        assert!(p.is_complete(&state(3, &clock)));
    }

    #[test]
    fn reset_clears_timeout_window() {
        let clock = FakeClock::new();
        let mut p = TimeoutPolicy::from_millis(10);
        p.reset(clock.now());
        clock.advance_ms(50);
        assert!(p.is_complete(&state(1, &clock)));
        p.reset(clock.now());
        assert!(!p.is_complete(&state(0, &clock)));
    }
}
