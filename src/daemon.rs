//! Poll loop tying the sensor, presence monitor and playback controller together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::Rng;

use crate::audio::AudioChannel;
use crate::player::PlaybackController;
use crate::presence::{PresenceEvent, PresenceMonitor};
use crate::sensor::MotionSensor;

pub struct Daemon<S, C, R> {
    sensor: S,
    monitor: PresenceMonitor,
    player: PlaybackController<C, R>,
    retry_delay: Duration,
    /// Next start attempt while present but nothing could be played.
    retry_at: Option<Instant>,
    sensor_ok: bool,
}

impl<S: MotionSensor, C: AudioChannel, R: Rng> Daemon<S, C, R> {
    pub fn new(sensor: S, monitor: PresenceMonitor, player: PlaybackController<C, R>, retry_delay: Duration) -> Self {
        Daemon {
            sensor,
            monitor,
            player,
            retry_delay,
            retry_at: None,
            sensor_ok: true,
        }
    }

    /// One poll: read the sensor at `now` and act on the resulting edge.
    pub fn tick(&mut self, now: Instant) {
        let motion = self.read_sensor();
        if self.player.refresh() {
            // pick a new track right away if someone is still around
            self.retry_at = Some(now);
        }

        match self.monitor.observe(motion, now) {
            Some(PresenceEvent::MotionResumed) => {
                debug!("Motion resumed");
                self.try_start(now);
            }
            Some(PresenceEvent::Absent) => {
                debug!("No motion for the timeout window");
                self.retry_at = None;
                self.player.stop();
            }
            None => {
                let due = self.retry_at.is_some_and(|at| now >= at);
                if due && self.monitor.is_present() && !self.player.is_playing() {
                    self.try_start(now);
                }
            }
        }
    }

    /// Tick every `poll_interval` until `running` is cleared, then halt output.
    pub fn run(&mut self, running: &AtomicBool, poll_interval: Duration) {
        while running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();
            self.tick(tick_start);

            let elapsed = tick_start.elapsed();
            if elapsed < poll_interval {
                std::thread::sleep(poll_interval - elapsed);
            }
        }

        info!("Shutting down");
        self.player.halt();
    }

    pub fn player(&self) -> &PlaybackController<C, R> {
        &self.player
    }

    #[cfg(test)]
    pub(crate) fn monitor(&self) -> &PresenceMonitor {
        &self.monitor
    }

    fn try_start(&mut self, now: Instant) {
        if self.player.start() {
            self.retry_at = None;
        } else {
            self.retry_at = now.checked_add(self.retry_delay);
            match self.retry_at {
                Some(_) => debug!("Retrying playback in {}s", self.retry_delay.as_secs()),
                None => warn!("Retry delay out of range, waiting for the next motion"),
            }
        }
    }

    // A failed read counts as no motion; only transitions are logged.
    fn read_sensor(&mut self) -> bool {
        match self.sensor.motion_detected() {
            Ok(motion) => {
                if !self.sensor_ok {
                    info!("Motion sensor readable again");
                    self.sensor_ok = true;
                }
                motion
            }
            Err(e) => {
                if self.sensor_ok {
                    warn!("Motion sensor read failed: {e}");
                    self.sensor_ok = false;
                }
                false
            }
        }
    }
}
