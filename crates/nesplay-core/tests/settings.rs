use nesplay_core::audio::AudioVolume;
use nesplay_core::settings::{Settings, SettingsRecord, read_record, write_record};
use nesplay_core::volume::{VolumeController, level_to_scalar};
use std::cell::Cell;
use std::fs;
use std::rc::Rc;
use std::sync::Arc;

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let record = read_record(&dir.path().join("absent.toml"));
    assert_eq!(record, SettingsRecord::default());
    assert_eq!(record.volume_level, 100);
}

#[test]
fn corrupt_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(&path, "volume_level = \"loud\"\n[[[").unwrap();
    assert_eq!(read_record(&path), SettingsRecord::default());
}

#[test]
fn unknown_keys_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(&path, "volume_level = 30\ntheme = \"dark\"\n").unwrap();
    assert_eq!(read_record(&path).volume_level, 30);
}

#[test]
fn write_creates_parent_and_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.toml");
    write_record(&path, &SettingsRecord { volume_level: 40 }).unwrap();

    assert_eq!(read_record(&path).volume_level, 40);
    let names: Vec<_> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec!["settings.toml"]);
}

#[test]
fn participants_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");

    let level = Rc::new(Cell::new(70u8));
    let mut settings = Settings::new(&path);
    let save_level = Rc::clone(&level);
    let load_level = Rc::clone(&level);
    assert!(settings.register(
        "probe",
        move |r| load_level.set(r.volume_level),
        move |r| r.volume_level = save_level.get(),
    ));
    settings.save().unwrap();

    level.set(0);
    settings.load();
    assert_eq!(level.get(), 70);
}

#[test]
fn duplicate_registration_keeps_original() {
    let mut settings = Settings::new("unused.toml");
    let hits = Rc::new(Cell::new(0));
    let first = Rc::clone(&hits);
    assert!(settings.register("volume", move |_| first.set(first.get() + 1), |_| {}));
    assert!(!settings.register("volume", |_| panic!("replaced"), |_| {}));
    assert_eq!(settings.participant_count(), 1);

    settings.load();
    assert_eq!(hits.get(), 1);
}

#[test]
fn unregister_is_idempotent() {
    let mut settings = Settings::new("unused.toml");
    settings.register("volume", |_| {}, |_| {});
    assert!(settings.unregister("volume"));
    assert!(!settings.unregister("volume"));
    assert!(!settings.is_registered("volume"));
}

#[test]
fn failed_save_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, b"").unwrap();

    let mut settings = Settings::new(blocker.join("settings.toml"));
    let err = settings.save().unwrap_err();
    assert!(err.to_string().contains("settings.toml"));
}

#[test]
fn volume_scalar_is_quadratic() {
    assert_eq!(level_to_scalar(100), 1.0);
    assert_eq!(level_to_scalar(50), 0.25);
    assert_eq!(level_to_scalar(0), 0.0);
}

#[test]
fn volume_loads_level_from_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    write_record(&path, &SettingsRecord { volume_level: 50 }).unwrap();

    let output = Arc::new(AudioVolume::default());
    let mut settings = Settings::new(&path);
    let volume = VolumeController::new(Arc::clone(&output), &mut settings);
    assert!(settings.is_registered(VolumeController::SETTING_ID));

    settings.load();
    assert_eq!(volume.level(), 50);
    assert_eq!(output.get(), 0.25);
}

#[test]
fn out_of_range_level_is_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(&path, "volume_level = 255\n").unwrap();

    let output = Arc::new(AudioVolume::default());
    let mut settings = Settings::new(&path);
    let volume = VolumeController::new(Arc::clone(&output), &mut settings);
    settings.load();
    assert_eq!(volume.level(), 100);
    assert_eq!(output.get(), 1.0);
}

#[test]
fn volume_steps_stay_in_bounds() {
    let output = Arc::new(AudioVolume::default());
    let mut settings = Settings::new("unused.toml");
    let mut volume = VolumeController::new(Arc::clone(&output), &mut settings);

    volume.up();
    assert_eq!(volume.level(), 100);
    assert!(volume.is_visible());

    for _ in 0..15 {
        volume.down();
    }
    assert_eq!(volume.level(), 0);
    assert_eq!(output.get(), 0.0);

    volume.up();
    assert_eq!(volume.level(), 10);
    assert!((output.get() - 0.01).abs() < 1e-6);
}

#[test]
fn volume_level_is_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    let mut settings = Settings::new(&path);
    let mut volume = VolumeController::new(Arc::new(AudioVolume::default()), &mut settings);
    volume.down();
    volume.down();
    settings.save().unwrap();

    assert_eq!(read_record(&path).volume_level, 80);
}
