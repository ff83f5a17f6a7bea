//! presence-player: Motion-triggered ambient music for a PIR sensor.
//!
//! Polls the sensor, loops a random track from the media directory while
//! someone is around, and fades it out after a quiet period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use presence_player::audio::RodioChannel;
use presence_player::config::PlayerConfig;
use presence_player::daemon::Daemon;
use presence_player::player::PlaybackController;
use presence_player::presence::PresenceMonitor;
use presence_player::sensor::GpioSensor;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PlayerConfig::find_and_load();
    let playback = &config.playback;

    // Without an output device there is nothing to do
    let channel = match RodioChannel::open() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to initialise audio: {e}");
            std::process::exit(1);
        }
    };

    let sensor = match GpioSensor::open(&config.sensor) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open motion sensor: {e}");
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        error!("Failed to install signal handler: {e}");
        std::process::exit(1);
    }

    let player = PlaybackController::new(channel, StdRng::from_entropy(), playback.media_dir(), playback.fade_out());
    info!(
        "Media dir: {} (timeout {}s, fade {}ms)",
        player.media_dir().display(),
        playback.no_motion_timeout_secs,
        playback.fade_out_ms
    );

    let monitor = PresenceMonitor::new(playback.no_motion_timeout());
    let mut daemon = Daemon::new(sensor, monitor, player, playback.retry_delay());

    info!("Ready, waiting for motion. Ctrl+C to exit.");
    daemon.run(&running, playback.poll_interval());
}
