// crates/carto-core/src/geocode/debounce.rs

//! Keystroke debounce driven by host timestamps. The core has no timers, so
//! the host calls [`Debounce::ready`] whenever its own clock ticks.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Debounce {
    window_ms: u64,
    pending: Option<(String, u64)>,
}

impl Debounce {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            pending: None,
        }
    }

    /// A zero window never defers.
    pub fn is_immediate(&self) -> bool {
        self.window_ms == 0
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Replaces any pending text; the window restarts at `now_ms`.
    pub fn defer(&mut self, text: &str, now_ms: u64) {
        self.pending = Some((text.to_owned(), now_ms.saturating_add(self.window_ms)));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_ref().map(|(text, _)| text.as_str())
    }

    /// Time at which the pending text becomes due.
    pub fn due_at(&self) -> Option<u64> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    /// Takes the pending text once its window has elapsed.
    pub fn ready(&mut self, now_ms: u64) -> Option<String> {
        match self.pending {
            Some((_, due)) if now_ms >= due => self.pending.take().map(|(text, _)| text),
            _ => None,
        }
    }
}
