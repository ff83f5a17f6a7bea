//! Single looping audio channel backed by rodio.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use log::debug;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};

const FADE_STEP: Duration = Duration::from_millis(50);

/// The one output channel the player drives.
pub trait AudioChannel {
    /// Replace whatever is loaded with `track`, looping until halted.
    fn play_looped(&mut self, track: &Path) -> Result<(), String>;
    /// Ramp the volume to silence over `duration`. Blocks until done.
    fn fade_out(&mut self, duration: Duration) -> Result<(), String>;
    /// Stop output immediately.
    fn halt(&mut self);
    fn is_active(&self) -> bool;
}

pub struct RodioChannel {
    // Output stops when the stream is dropped, so it lives as long as the channel.
    stream: OutputStream,
    sink: Option<Sink>,
}

impl RodioChannel {
    /// Open the default output device.
    pub fn open() -> Result<Self, String> {
        let mut stream = OutputStreamBuilder::open_default_stream().map_err(|e| format!("audio output: {e}"))?;
        stream.log_on_drop(false);
        Ok(RodioChannel { stream, sink: None })
    }
}

impl AudioChannel for RodioChannel {
    fn play_looped(&mut self, track: &Path) -> Result<(), String> {
        let file = File::open(track).map_err(|e| format!("open {}: {e}", track.display()))?;
        let source = Decoder::new_looped(BufReader::new(file)).map_err(|e| format!("decode {}: {e}", track.display()))?;

        self.halt();
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        self.sink = Some(sink);
        Ok(())
    }

    fn fade_out(&mut self, duration: Duration) -> Result<(), String> {
        let sink = self.sink.as_ref().ok_or_else(|| "fade: no active sink".to_string())?;
        let start = sink.volume();
        let (steps, step) = fade_steps(duration);
        debug!("Fading from {start:.2} over {steps} steps");

        for i in 1..=steps {
            sink.set_volume(start * (1.0 - i as f32 / steps as f32));
            std::thread::sleep(step);
        }
        Ok(())
    }

    fn halt(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_active(&self) -> bool {
        self.sink.as_ref().map(|s| !s.empty()).unwrap_or(false)
    }
}

/// Split a fade into volume steps of roughly `FADE_STEP` each.
fn fade_steps(duration: Duration) -> (u32, Duration) {
    let steps = (duration.as_millis() / FADE_STEP.as_millis()).clamp(1, u32::MAX as u128) as u32;
    (steps, duration / steps)
}


#[cfg(test)]
pub(crate) mod fake {
    use super::AudioChannel;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Play(PathBuf),
        Fade(Duration),
        Halt,
    }

    /// Records every call; the log is shared so tests can inspect it after
    /// the channel has been moved into a controller.
    #[derive(Default)]
    pub struct FakeChannel {
        pub calls: Arc<Mutex<Vec<Call>>>,
        pub fail_fade: bool,
        active: Arc<AtomicBool>,
    }

    impl FakeChannel {
        pub fn new() -> (Self, Arc<Mutex<Vec<Call>>>) {
            let channel = FakeChannel::default();
            let calls = channel.calls.clone();
            (channel, calls)
        }

        /// Shared output flag; clearing it makes the channel go silent on its own.
        pub fn output(&self) -> Arc<AtomicBool> {
            self.active.clone()
        }
    }

    impl AudioChannel for FakeChannel {
        fn play_looped(&mut self, track: &Path) -> Result<(), String> {
            self.calls.lock().unwrap().push(Call::Play(track.to_path_buf()));
            self.active.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn fade_out(&mut self, duration: Duration) -> Result<(), String> {
            self.calls.lock().unwrap().push(Call::Fade(duration));
            if self.fail_fade {
                return Err("fade: device gone".into());
            }
            Ok(())
        }

        fn halt(&mut self) {
            self.calls.lock().unwrap().push(Call::Halt);
            self.active.store(false, Ordering::SeqCst);
        }

        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
    }
}
