//! Output file naming and media directories.
//!
//! Stills and videos are named by a second-resolution timestamp; timelapse
//! sequences add a numeric suffix (a `%04d` placeholder for tool-timed
//! bursts, a plain counter for controller-timed shots).

use chrono::Local;
use std::path::{Path, PathBuf};

/// Second-resolution timestamp used in every output name.
pub fn timestamp() -> String {
    Local::now().format("%y%m%d%H%M%S").to_string()
}

pub fn still_path(dir: &Path, stamp: &str, container: &str) -> PathBuf {
    dir.join(format!("{}.{}", stamp, container))
}

pub fn video_path(dir: &Path, stamp: &str, container: &str) -> PathBuf {
    dir.join(format!("{}.{}", stamp, container))
}

/// Pattern for tool-timed sequences; the tool substitutes the shot number.
pub fn sequence_pattern(dir: &Path, stamp: &str, container: &str) -> String {
    dir.join(format!("{}_%04d.{}", stamp, container))
        .to_string_lossy()
        .into_owned()
}

/// Path for one shot of a controller-timed sequence.
pub fn sequence_shot_path(dir: &Path, stamp: &str, shot: i32, container: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", stamp, shot, container))
}

pub fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// Remove leftover preview frames so the stream starts clean and the scratch
/// directory cannot fill up.
pub fn sweep_frames(dir: &Path) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("frame_") && n.ends_with(".jpg"))
        {
            let _ = std::fs::remove_file(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_second_resolution() {
        let stamp = timestamp();
        assert_eq!(stamp.len(), 12, "yyMMddHHmmss");
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_media_paths() {
        let dir = Path::new("/home/pi/Pictures");
        assert_eq!(
            still_path(dir, "240101120000", "jpg"),
            PathBuf::from("/home/pi/Pictures/240101120000.jpg")
        );
        assert_eq!(
            sequence_shot_path(dir, "240101120000", 3, "png"),
            PathBuf::from("/home/pi/Pictures/240101120000_3.png")
        );
        assert_eq!(
            sequence_pattern(dir, "240101120000", "jpg"),
            "/home/pi/Pictures/240101120000_%04d.jpg"
        );
    }

    #[test]
    fn test_sweep_removes_only_frames() {
        let dir = tempfile::tempdir().unwrap();
        let frame = dir.path().join("frame_17.jpg");
        let keeper = dir.path().join("240101120000.jpg");
        std::fs::write(&frame, b"f").unwrap();
        std::fs::write(&keeper, b"k").unwrap();
        sweep_frames(dir.path());
        assert!(!frame.exists());
        assert!(keeper.exists());
    }
}
