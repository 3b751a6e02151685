//! Fuente de tiempo inyectable.
//!
//! Las políticas de chunk y las marcas de ejecución leen el tiempo a través
//! de `Clock`, de modo que los tests pueden avanzar el reloj sin dormir.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

pub trait Clock: Send + Sync {
    /// Instante monotónico (duraciones, timeouts).
    fn now(&self) -> Instant;
    /// Hora de pared (timestamps persistidos).
    fn wall(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
struct FakeState {
    instant: Instant,
    wall: DateTime<Utc>,
}

/// Reloj controlado manualmente; los clones comparten el mismo estado.
#[derive(Clone, Debug)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(FakeState { instant: Instant::now(),
                                                      wall: Utc::now() })) }
    }

    pub fn advance(&self, by: Duration) {
        let mut st = self.inner.lock();
        st.instant += by;
        st.wall += chrono::Duration::milliseconds(by.as_millis() as i64);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.inner.lock().instant
    }
    fn wall(&self) -> DateTime<Utc> {
        self.inner.lock().wall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances_both_sources() {
        let clock = FakeClock::new();
        let (i0, w0) = (clock.now(), clock.wall());
        clock.clone().advance_ms(1500);
        assert_eq!(clock.now() - i0, Duration::from_millis(1500));
        assert_eq!((clock.wall() - w0).num_milliseconds(), 1500);
    }
}
