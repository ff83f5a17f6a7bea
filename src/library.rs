//! Media directory scanning and random track selection.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

/// Extensions considered playable, compared case-insensitively.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];

/// List playable files directly inside `dir` (non-recursive), sorted by path.
pub fn list_tracks(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = std::fs::read_dir(dir).map_err(|e| format!("read dir {}: {e}", dir.display()))?;

    let mut tracks: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| is_audio_file(path))
        .collect();
    tracks.sort();
    Ok(tracks)
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Uniformly pick one track, or `None` when the list is empty.
pub fn pick_track<'a, R: Rng + ?Sized>(tracks: &'a [PathBuf], rng: &mut R) -> Option<&'a PathBuf> {
    tracks.choose(rng)
}
