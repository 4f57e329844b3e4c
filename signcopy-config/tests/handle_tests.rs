use signcopy_config::{Capacity, ConfigError, ConfigHandle, Settings};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn load_missing_file_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let handle = ConfigHandle::load(&path);
    assert!(path.exists());
    assert_eq!(*handle.snapshot(), Settings::default());

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(Settings::from_toml(&written).unwrap(), Settings::default());
}

#[test]
fn load_invalid_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();

    let handle = ConfigHandle::load(&path);
    assert_eq!(*handle.snapshot(), Settings::default());
    // The broken file is left for the operator to fix.
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "this is = = not toml"
    );
}

#[test]
fn load_resets_out_of_range_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[limits]\nmax-saved-signs = 5\nmax-line-length = 9999\n").unwrap();

    let handle = ConfigHandle::load(&path);
    assert_eq!(handle.capacity(), Capacity::Limited(5));
    assert_eq!(handle.max_line_length(), 90);
}

#[test]
fn reload_swaps_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let handle = ConfigHandle::load(&path);
    let before = handle.snapshot();

    std::fs::write(&path, "[features]\nallow-overwrite = true\n").unwrap();
    let issues = handle.reload().unwrap();
    assert!(issues.is_empty());

    assert!(handle.allow_overwrite());
    // Snapshots taken before the reload are unaffected.
    assert!(!before.features.allow_overwrite);
}

#[test]
fn reload_failure_keeps_previous_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[limits]\nmax-saved-signs = 3\n").unwrap();
    let handle = ConfigHandle::load(&path);

    std::fs::write(&path, "[limits\nbroken").unwrap();
    assert!(matches!(handle.reload(), Err(ConfigError::Parse(_))));
    assert_eq!(handle.capacity(), Capacity::Limited(3));
}

#[test]
fn reload_without_file_is_an_error() {
    let handle = ConfigHandle::with_settings(Settings::default());
    assert!(matches!(handle.reload(), Err(ConfigError::NoBackingFile)));
}

#[test]
fn update_persists_and_validates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let handle = ConfigHandle::load(&path);

    let issues = handle
        .update(|s| {
            s.limits.max_saved_signs = -1;
            s.limits.max_name_length = 0;
        })
        .unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(handle.capacity(), Capacity::Unlimited);
    assert_eq!(handle.max_name_length(), 32);

    let reloaded = ConfigHandle::load(&path);
    assert_eq!(reloaded.capacity(), Capacity::Unlimited);
}

#[test]
fn concurrent_readers_see_whole_snapshots() {
    let mut initial = Settings::default();
    initial.limits.max_saved_signs = 0;
    initial.cooldowns.copy_seconds = 0;
    let handle = Arc::new(ConfigHandle::with_settings(initial));

    let writer = {
        let handle = Arc::clone(&handle);
        thread::spawn(move || {
            for i in 0..200 {
                handle
                    .update(|s| {
                        // Both fields always move together.
                        s.limits.max_saved_signs = i;
                        s.cooldowns.copy_seconds = i as u64;
                    })
                    .unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = Arc::clone(&handle);
            thread::spawn(move || {
                for _ in 0..500 {
                    let snapshot = handle.snapshot();
                    assert_eq!(
                        snapshot.limits.max_saved_signs as u64,
                        snapshot.cooldowns.copy_seconds
                    );
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(handle.snapshot().limits.max_saved_signs, 199);
}
