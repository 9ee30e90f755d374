//! End-to-end scenarios across the settings model, capability table and
//! command builder.

use std::path::PathBuf;

use picam_panel::capability::{CameraCapability, CameraModel};
use picam_panel::command::{build, CaptureIntent};
use picam_panel::config::PanelConfig;
use picam_panel::settings::{Field, Settings, SHUTTERS, VIDEO_MAX_FPS};

fn fixture(model: CameraModel) -> (Settings, CameraCapability, PanelConfig) {
    let cap = CameraCapability::for_model(model);
    let panel = PanelConfig::default();
    let settings = Settings::defaults(panel.preview.width, panel.preview.height);
    (settings, cap, panel)
}

fn pair_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

#[test]
fn manual_eighth_millisecond_still_on_one_second_camera() {
    // Default state driven to manual 1/125s on a camera whose shutter range
    // is capped at one second.
    let (mut settings, cap, panel) = fixture(CameraModel::V1);
    settings.set(Field::Mode, 0, &cap);
    settings.set(Field::ShutterIndex, 15, &cap);
    settings.set(Field::Gain, 0, &cap);
    assert_eq!(SHUTTERS[settings.shutter_index as usize], -125.0);

    let cmd = build(
        &settings,
        &cap,
        &panel,
        &CaptureIntent::Still {
            output: PathBuf::from("/tmp/still.jpg"),
        },
    );
    assert_eq!(pair_value(&cmd.args, "--shutter"), Some("8000"));
    assert!(!cmd.args.iter().any(|a| a == "--exposure"));
}

#[test]
fn format_past_codec_ceiling_clamps_format_and_fps() {
    let (mut settings, cap, panel) = fixture(CameraModel::V2);

    // mjpeg unlocks the V2's native formats up to index 6 (3280x2464@20).
    settings.set(Field::Codec, 1, &cap);
    settings.set(Field::VideoFormat, 8, &cap);
    assert_eq!(settings.video_format, 6);
    assert_eq!(settings.video_fps, VIDEO_MAX_FPS[6]);

    // Switching back to h264 re-clamps to the 1080p ceiling.
    settings.set(Field::Codec, 0, &cap);
    assert_eq!(settings.video_format, 4);
    assert!(settings.video_fps <= VIDEO_MAX_FPS[4]);

    let cmd = build(
        &settings,
        &cap,
        &panel,
        &CaptureIntent::Video {
            output: PathBuf::from("/tmp/clip.h264"),
        },
    );
    assert_eq!(pair_value(&cmd.args, "--width"), Some("1920"));
    assert_eq!(pair_value(&cmd.args, "--height"), Some("1080"));
}

#[test]
fn timelapse_triangle_survives_gesture_sequences() {
    let (mut settings, cap, _) = fixture(CameraModel::Hq);
    let edits = [
        (Field::Interval, 9),
        (Field::ShotCount, 40),
        (Field::Interval, 3),
        (Field::ShotCount, 7),
    ];
    for (field, value) in edits {
        settings.set(field, value, &cap);
        assert_eq!(
            settings.duration_secs(),
            settings.interval_secs * settings.shot_count,
            "triangle broken after setting {:?} to {}",
            field,
            value
        );
    }

    // Editing the duration leaves it as entered and re-derives the shot
    // count; the next interval/shots edit snaps the triangle exact again.
    settings.set(Field::Duration, 50, &cap);
    assert_eq!(settings.shot_count, 50 / settings.interval_secs);
    settings.set(Field::ShotCount, 7, &cap);
    assert_eq!(settings.duration_secs(), settings.interval_secs * 7);
}

#[test]
fn long_exposure_guard_holds_for_every_guarded_intent() {
    let (mut settings, cap, panel) = fixture(CameraModel::Hq);
    settings.set(Field::Mode, 0, &cap);
    settings.set(Field::Gain, 18, &cap);
    settings.set(Field::ShutterIndex, 50, &cap);
    assert!(settings.exposure_micros() > 5_000_000);

    let intents = [
        CaptureIntent::Preview,
        CaptureIntent::Still {
            output: PathBuf::from("/tmp/a.jpg"),
        },
        CaptureIntent::TimelapseBurst {
            pattern: "/tmp/a_%04d.jpg".to_string(),
        },
        CaptureIntent::TimelapseShot {
            output: PathBuf::from("/tmp/a_0.jpg"),
        },
        CaptureIntent::TimelapseSegment {
            pattern: "/tmp/a_%04d.jpg".to_string(),
        },
    ];
    for intent in intents {
        let cmd = build(&settings, &cap, &panel, &intent);
        assert_eq!(
            pair_value(&cmd.args, "--gain"),
            Some("1"),
            "user gain leaked into {:?}",
            intent
        );
        assert!(cmd.args.iter().any(|a| a == "--immediate"));
    }
}

#[test]
fn command_builder_is_deterministic_across_state_copies() {
    let (mut settings, cap, panel) = fixture(CameraModel::Arducam16mp);
    settings.set(Field::Awb, 0, &cap);
    settings.set(Field::Zoom, 3, &cap);
    settings.set(Field::Brightness, -40, &cap);

    let copy = settings.clone();
    for intent in [
        CaptureIntent::Preview,
        CaptureIntent::Still {
            output: PathBuf::from("/tmp/x.jpg"),
        },
    ] {
        let a = build(&settings, &cap, &panel, &intent);
        let b = build(&copy, &cap, &panel, &intent);
        assert_eq!(a, b);
    }
}

#[test]
fn no_camera_still_yields_usable_commands() {
    // Without a camera the panel stays alive with conservative limits.
    let (mut settings, cap, panel) = fixture(CameraModel::NoCamera);
    settings.set(Field::ShutterIndex, 65, &cap);
    assert_eq!(SHUTTERS[settings.shutter_index as usize], 1.0);
    settings.set(Field::Codec, 2, &cap);
    settings.set(Field::VideoFormat, 8, &cap);
    assert_eq!(settings.video_format, 4);

    let cmd = build(&settings, &cap, &panel, &CaptureIntent::Preview);
    assert!(!cmd.args.is_empty());
    assert!(!cmd.args.iter().any(|a| a == "--autofocus"));
}
