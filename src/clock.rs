/// Turns host frame timestamps (milliseconds) into animation time (seconds
/// since the first frame).
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    start_ms: Option<f64>,
    elapsed_ms: f64,
    rebase: bool,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed seconds at `now_ms`. The first call pins the start.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let start = match self.start_ms {
            Some(start) if !self.rebase => start,
            Some(_) => {
                self.rebase = false;
                let start = now_ms - self.elapsed_ms;
                self.start_ms = Some(start);
                start
            }
            None => {
                self.start_ms = Some(now_ms);
                now_ms
            }
        };
        self.elapsed_ms = (now_ms - start).max(0.0);
        (self.elapsed_ms / 1000.0) as f32
    }

    /// Freezes animation time: the next tick continues from the last elapsed
    /// value instead of jumping over the gap.
    pub fn suspend(&mut self) {
        if self.start_ms.is_some() {
            self.rebase = true;
        }
    }
}
