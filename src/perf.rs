use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderStats {
    /// Duration of the most recent successful render.
    pub render_ms: f64,
    pub renders: u64,
    pub failures: u64,
    /// Completions dropped because a newer request superseded them.
    pub discarded: u64,
}

impl RenderStats {
    pub fn record_render(&mut self, elapsed: Duration) {
        self.render_ms = elapsed.as_secs_f64() * 1000.0;
        self.renders += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn record_discarded(&mut self) {
        self.discarded += 1;
    }
}
