//! # Configuration Loading
//!
//! Reads engine configuration from disk and drives an engine with it.
//!
//! Run with: cargo test --test config_loading

use std::path::PathBuf;

use krepel::{ConfigError, Engine, EngineConfig, EngineError, MAX_ARENA_CAPACITY};
use krepel_rendering::{extract_line, Color, HeadlessDevice, Vec2};

fn write_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "krepel-{}-{}.toml",
        name,
        std::process::id()
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn verify_config_file_drives_engine() {
    let path = write_config(
        "drive",
        r#"
        max_frames = 5

        [arena]
        initial_capacity = 32
        allow_growth = true

        [presentation]
        warn_on_missing_camera = false
        clear_color = [0.0, 0.0, 0.0, 1.0]
        target_width = 320
        target_height = 240
        "#,
    );

    let config = EngineConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let mut engine = Engine::new(config, HeadlessDevice::new()).unwrap();
    engine.add_extraction_listener(|extractor| {
        // Enough records to outgrow a 32-byte arena.
        for i in 0..16_u8 {
            let x = f32::from(i);
            extract_line(extractor, Vec2::new(x, 0.0), Vec2::new(x, 1.0), Color::GREEN);
        }
    });

    assert_eq!(engine.run(), 5);
    assert_eq!(engine.render_target().size(), (320, 240));
    assert_eq!(engine.render_target().clear_color(), Color::BLACK);

    let renderer = engine.renderer();
    assert_eq!(renderer.stats().total_frames, 5);
    assert_eq!(renderer.stats().total_draw_calls, 4 * 16);
    assert_eq!(renderer.stats().frames_missing_camera, 4);
}

#[test]
fn verify_invalid_file_is_reported() {
    let path = write_config("invalid", "[schedule]\npresent_priority = 0\nextract_priority = 0\n");
    let err = EngineConfig::load(&path).unwrap_err();
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(err, ConfigError::Invalid(_)));
    let engine_err = EngineError::from(err);
    assert!(engine_err.to_string().contains("present_priority"));
}

#[test]
fn verify_oversized_arena_is_rejected_before_allocation() {
    let mut config = EngineConfig::default();
    config.arena.initial_capacity = usize::MAX / 2;

    let err = Engine::new(config, HeadlessDevice::new()).unwrap_err();
    assert!(matches!(err, EngineError::Config(ConfigError::Invalid(_))));

    config.arena.initial_capacity = MAX_ARENA_CAPACITY / 1024;
    assert!(Engine::new(config, HeadlessDevice::new()).is_ok());
}

#[test]
fn verify_malformed_file_is_reported() {
    let path = write_config("malformed", "[arena\ninitial_capacity = ");
    let err = EngineConfig::load(&path).unwrap_err();
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn verify_fixed_arena_rejects_nothing_it_can_hold() {
    let config = EngineConfig::from_toml_str(
        "max_frames = 3\n[arena]\ninitial_capacity = 4096\nallow_growth = false\n",
    )
    .unwrap();

    let mut engine = Engine::new(config, HeadlessDevice::new()).unwrap();
    engine.add_extraction_listener(|extractor| {
        extract_line(extractor, Vec2::ZERO, Vec2::new(1.0, 1.0), Color::RED);
    });

    assert_eq!(engine.run(), 3);
    assert_eq!(engine.renderer().device().total_submissions(), 2);
    assert!(!engine.pipeline().read_buffer().growth_allowed());
}
