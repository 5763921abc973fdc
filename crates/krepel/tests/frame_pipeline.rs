//! # Frame Pipeline Verification
//!
//! End-to-end checks of the frame loop:
//!
//! 1. **Pipelining**: frame N presents what frame N-1 extracted; frame 0 is empty
//! 2. **Ordering**: present, game logic and extract run in priority order
//! 3. **Lifetimes**: records keep resources borrowed exactly until presented
//!
//! Run with: cargo test --test frame_pipeline

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use krepel::{Engine, EngineConfig, EXTRACT_LOOP, PRESENT_LOOP};
use krepel_core::{Owned, RefCountedPtr};
use krepel_rendering::{
    extract_camera, extract_line, extract_sprite, Camera2D, Color, HeadlessDevice, Sampler,
    ShaderProgram, Sprite, Submission, Texture, Transform2D, Vec2, VertexBuffer,
};

fn engine() -> Engine<HeadlessDevice> {
    Engine::new(EngineConfig::default(), HeadlessDevice::new()).unwrap()
}

/// Emits one line per frame whose x coordinate is the extraction frame index.
fn frame_marker(engine: &Engine<HeadlessDevice>) {
    let frame = Cell::new(0_u32);
    engine.add_extraction_listener(move |extractor| {
        let x = f32::from(u16::try_from(frame.get()).unwrap());
        extract_line(extractor, Vec2::new(x, 0.0), Vec2::new(x, 1.0), Color::WHITE);
        frame.set(frame.get() + 1);
    });
}

fn presented_markers(engine: &Engine<HeadlessDevice>) -> Vec<Vec<f32>> {
    engine
        .renderer()
        .device()
        .frames()
        .iter()
        .map(|frame| {
            frame
                .iter()
                .filter_map(|submission| match submission {
                    Submission::Line { start, .. } => Some(start.x),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

// ============================================================================
// PIPELINING
// ============================================================================

#[test]
fn verify_one_frame_lag() {
    let mut engine = engine();
    frame_marker(&engine);

    for _ in 0..4 {
        let _ = engine.tick();
    }

    let markers = presented_markers(&engine);
    assert_eq!(markers.len(), 4);
    assert!(markers[0].is_empty(), "frame 0 must present nothing");
    assert_eq!(markers[1], [0.0]);
    assert_eq!(markers[2], [1.0]);
    assert_eq!(markers[3], [2.0]);
}

#[test]
fn verify_tick_reports_frame_stats() {
    let mut engine = engine();
    frame_marker(&engine);

    let first = engine.tick().unwrap();
    assert_eq!(first.frame_number, 0);
    assert_eq!(first.records, 0);

    let second = engine.tick().unwrap();
    assert_eq!(second.frame_number, 1);
    assert_eq!(second.draw_calls, 1);
    assert!(second.missing_camera);
    assert!(second.presented());
}

#[test]
fn verify_camera_record_drives_view() {
    let mut engine = engine();
    let mut camera = Camera2D::new(Vec2::new(100.0, 100.0));
    camera.zoom = 2.0;
    engine.add_extraction_listener(move |extractor| {
        extract_camera(extractor, &camera);
        extract_line(extractor, Vec2::ZERO, Vec2::new(1.0, 0.0), Color::RED);
    });

    let _ = engine.tick();
    let stats = engine.tick().unwrap();
    assert!(!stats.missing_camera);
    assert_eq!(stats.cameras, 1);

    let renderer = engine.renderer();
    match &renderer.device().last_frame().unwrap()[0] {
        Submission::Line { view, .. } => assert_eq!(view.view, camera.view_matrix()),
        other => panic!("unexpected submission {other:?}"),
    }
}

#[test]
fn verify_camera_less_extraction_is_reported() {
    let mut engine = engine();
    engine.add_extraction_listener(|_| {});

    let first = engine.tick().unwrap();
    assert!(!first.missing_camera, "nothing was extracted before frame 0");

    let second = engine.tick().unwrap();
    assert_eq!(second.records, 0);
    assert_eq!(second.cameras, 0);
    assert!(second.missing_camera);
    assert_eq!(engine.renderer().stats().frames_missing_camera, 1);
}

// ============================================================================
// ORDERING
// ============================================================================

#[test]
fn verify_priority_order_within_a_frame() {
    let mut engine = engine();
    let trace = Rc::new(RefCell::new(Vec::new()));

    let logic_trace = Rc::clone(&trace);
    engine
        .add_loop("logic", 0, move || logic_trace.borrow_mut().push("logic"))
        .unwrap();
    let extract_trace = Rc::clone(&trace);
    engine.add_extraction_listener(move |_| extract_trace.borrow_mut().push("extract"));

    let _ = engine.tick();
    assert_eq!(*trace.borrow(), ["logic", "extract"]);
    assert_eq!(
        engine.registry().tick_order(),
        [PRESENT_LOOP, "logic", EXTRACT_LOOP]
    );
}

#[test]
fn verify_logic_can_stop_the_driver() {
    let mut engine = engine();
    let registry = Rc::downgrade(engine.registry());
    let ticks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&ticks);
    engine
        .add_loop("quit_after_three", 0, move || {
            counter.set(counter.get() + 1);
            if counter.get() == 3 {
                registry.upgrade().unwrap().set_keep_ticking(false);
            }
        })
        .unwrap();

    assert_eq!(engine.run(), 3);
    assert_eq!(ticks.get(), 3);
}

#[test]
fn verify_listener_removal_takes_effect_next_extract() {
    let mut engine = engine();
    let id = engine.add_extraction_listener(|extractor| {
        extract_line(extractor, Vec2::ZERO, Vec2::ZERO, Color::RED);
    });

    let _ = engine.tick();
    assert!(engine.remove_extraction_listener(id));
    assert!(!engine.remove_extraction_listener(id));

    let presented = engine.tick().unwrap();
    assert_eq!(presented.draw_calls, 1, "already-extracted records still present");
    let after = engine.tick().unwrap();
    assert_eq!(after.draw_calls, 0);
}

// ============================================================================
// LIFETIMES
// ============================================================================

#[test]
fn verify_records_hold_borrows_until_presented() {
    let texture = Owned::new(Texture::new("hero", 16, 16));
    let shader = Owned::new(ShaderProgram::new("sprite"));
    let quad = Owned::new(VertexBuffer::unit_quad());
    let sampler = Owned::new(Sampler::default());

    {
        let mut engine = engine();
        let hero = Sprite::new(&texture, &shader, &quad, &sampler);
        let emit = Rc::new(Cell::new(true));
        let toggle = Rc::clone(&emit);
        engine.add_extraction_listener(move |extractor| {
            if toggle.get() {
                extract_sprite(extractor, &hero, Transform2D::IDENTITY);
            }
        });
        // The sprite inside the listener holds one borrow.
        assert_eq!(texture.borrow_count(), 1);

        let _ = engine.tick();
        assert_eq!(texture.borrow_count(), 2, "pending record borrows the texture");

        emit.set(false);
        let stats = engine.tick().unwrap();
        assert_eq!(stats.sprites, 1);
        assert_eq!(texture.borrow_count(), 1, "presentation released the record");

        engine.shutdown();
        assert_eq!(texture.borrow_count(), 0, "shutdown dropped the listener");
    }

    assert_eq!(texture.borrow_count(), 0);
}

#[test]
fn verify_shutdown_releases_pending_records() {
    let texture = Owned::new(Texture::new("hero", 16, 16));
    let shader = Owned::new(ShaderProgram::new("sprite"));
    let quad = Owned::new(VertexBuffer::unit_quad());
    let sampler = Owned::new(Sampler::default());
    let hero = Rc::new(Sprite::new(&texture, &shader, &quad, &sampler));

    let mut engine = engine();
    let scene = Rc::clone(&hero);
    engine.add_extraction_listener(move |extractor| {
        extract_sprite(extractor, &scene, Transform2D::IDENTITY);
    });
    let _ = engine.tick();
    assert_eq!(texture.borrow_count(), 2);

    engine.shutdown();
    assert_eq!(texture.borrow_count(), 1);
    drop(hero);
    assert_eq!(texture.borrow_count(), 0);
}

// ============================================================================
// RENDER TARGET
// ============================================================================

#[test]
fn verify_render_target_sharing() {
    let mut engine = engine();
    let target = engine.render_target();
    assert_eq!(target.size(), (800, 600));

    let _ = engine.tick();
    let _ = engine.tick();
    assert_eq!(target.frames_presented(), 2);

    engine.set_render_target(&RefCountedPtr::null());
    let stats = engine.tick().unwrap();
    assert!(stats.skipped);
    assert_eq!(target.frames_presented(), 2);
}
