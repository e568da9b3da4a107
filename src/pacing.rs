//! Wall-clock pacing of the replayed records
//! The relative timing between records is reproduced through a single offset
//! fixed by the first traffic record of each pass.
//!

use std::{sync::atomic::{AtomicBool, Ordering}, thread, time::Duration};


/// Seconds since the unix epoch
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}


/// Pacing state of one replay pass
pub struct PassState {
    ts_diff: Option<f64>,   // recorded time to wall-clock offset, fixed by the first record of the pass
    buf_period: f64,        // seconds the first record is pushed into the past
    pass_index: u32,
}

impl PassState {
    pub fn new(buf_period: f64) -> Self {
        PassState {
            ts_diff: None,
            buf_period,
            pass_index: 0,
        }
    }

    /// Wall-clock time at which the record with timestamp `raw_ts` is due.
    /// The first call of a pass fixes the offset for the whole pass.
    pub fn target_for(&mut self, raw_ts: f64, now: f64) -> f64 {
        let ts_diff = match self.ts_diff {
            Some(diff) => diff,
            None => {
                let diff = now - raw_ts - self.buf_period;
                log::debug!("Timestamp difference: {diff:.3}s");
                self.ts_diff = Some(diff);
                diff
            }
        };
        raw_ts + ts_diff
    }

    pub fn pass_index(&self) -> u32 {
        self.pass_index
    }

    /// Resets the state for the next pass of a looped replay.
    /// The buffering offset is a one-time measure, continuous replay must
    /// not apply it again.
    pub fn next_pass(&mut self) {
        self.ts_diff = None;
        self.buf_period = 0.0;
        self.pass_index += 1;
    }
}


/// Waits until the `target` wall-clock time, a target in the past returns
/// immediately. Sleeps in slices of at most one second so that a raised
/// cancellation flag is honored promptly; returns false when cancelled.
pub fn wait_until(target: f64, cancel: &AtomicBool) -> bool {
    let remaining = target - unix_now();
    if remaining > 0.0 {
        log::debug!("Waiting for {:.0} seconds...", remaining.ceil());
    }

    while !cancel.load(Ordering::Relaxed) {
        let remaining = target - unix_now();
        if remaining <= 0.0 {
            return true;
        }
        thread::sleep(Duration::from_secs_f64(remaining.min(1.0)));
    }

    false
}
