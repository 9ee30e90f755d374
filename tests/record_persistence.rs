//! Settings record persistence: save, reload, and schema rejection.

use picam_panel::capability::{CameraCapability, CameraModel};
use picam_panel::settings::{Field, Settings};
use picam_panel::store::{self, FIELD_COUNT, SCHEMA_VERSION};

#[test]
fn settings_roundtrip_through_the_record_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.txt");
    let cap = CameraCapability::for_model(CameraModel::Hq);

    let mut settings = Settings::defaults(800, 600);
    settings.set(Field::Mode, 0, &cap);
    settings.set(Field::ShutterIndex, 20, &cap);
    settings.set(Field::Awb, 0, &cap);
    settings.set(Field::RedGain, 31, &cap);
    settings.set(Field::Interval, 25, &cap);
    settings.set(Field::ShotCount, 8, &cap);

    store::save(&path, &settings.to_record()).unwrap();
    let record = store::load(&path).unwrap();
    let mut restored = Settings::from_record(&record, 800, 600);
    restored.reconcile(&cap);

    assert_eq!(restored.mode, 0);
    assert_eq!(restored.shutter_index, 20);
    assert_eq!(restored.red_gain, 31);
    assert_eq!(restored.interval_secs, 25);
    assert_eq!(restored.shot_count, 8);
    assert_eq!(restored.duration_secs(), 200);
}

#[test]
fn record_starts_with_the_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.txt");
    store::save(&path, &[0i32; FIELD_COUNT]).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next().unwrap(), SCHEMA_VERSION.to_string());
    assert_eq!(lines.count(), FIELD_COUNT);
}

#[test]
fn foreign_schema_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.txt");
    let mut content = String::from("0\n");
    for _ in 0..FIELD_COUNT {
        content.push_str("1\n");
    }
    std::fs::write(&path, content).unwrap();
    assert!(store::load(&path).is_err());
}

#[test]
fn truncated_record_is_refused_not_zero_filled() {
    // A record written by an older build with fewer fields must not load
    // with the tail positions silently defaulted.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.txt");
    let mut content = format!("{}\n", SCHEMA_VERSION);
    for _ in 0..16 {
        content.push_str("2\n");
    }
    std::fs::write(&path, content).unwrap();
    assert!(store::load(&path).is_err());
}

#[test]
fn stale_record_reconciles_against_a_smaller_camera() {
    // Save against the HQ camera, reload on a v1: every camera-bound field
    // must land back inside the v1's limits.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.txt");
    let hq = CameraCapability::for_model(CameraModel::Hq);

    let mut settings = Settings::defaults(800, 600);
    settings.set(Field::Mode, 0, &hq);
    settings.set(Field::ShutterIndex, 65, &hq);
    settings.set(Field::Codec, 1, &hq);
    settings.set(Field::VideoFormat, 7, &hq);
    store::save(&path, &settings.to_record()).unwrap();

    let v1 = CameraCapability::for_model(CameraModel::V1);
    let record = store::load(&path).unwrap();
    let mut restored = Settings::from_record(&record, 800, 600);
    restored.reconcile(&v1);

    assert!(restored.shutter_index <= v1.max_shutter_index);
    assert!(restored.video_format <= v1.max_video_format(restored.codec));
}
