//! # KREPEL Demo
//!
//! A headless scene: a few sprites bounce inside the viewport, a debug
//! circle marks each one, and the camera follows the first.
//!
//! Usage: `krepel_demo [config.toml]`
//!
//! Without a config file the demo runs 120 frames with default settings.

use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

use krepel::{Engine, EngineConfig, EngineResult};
use krepel_core::Owned;
use krepel_rendering::{
    extract_camera, extract_circle, extract_line, extract_sprite, Camera2D, Color,
    HeadlessDevice, Sampler, ShaderProgram, Sprite, Texture, Transform2D, Vec2, VertexBuffer,
};

const DEMO_FRAMES: u64 = 120;
const SPRITE_COUNT: usize = 8;

/// Resources owned by the demo scene. Must outlive every sprite and every
/// pending extraction record.
struct Assets {
    texture: Owned<Texture>,
    shader: Owned<ShaderProgram>,
    quad: Owned<VertexBuffer>,
    sampler: Owned<Sampler>,
}

impl Assets {
    fn load() -> Self {
        Self {
            texture: Owned::new(Texture::new("ball.png", 32, 32)),
            shader: Owned::new(ShaderProgram::new("sprite")),
            quad: Owned::new(VertexBuffer::unit_quad()),
            sampler: Owned::new(Sampler::default()),
        }
    }
}

/// One moving sprite.
struct Ball {
    sprite: Sprite,
    transform: Transform2D,
    velocity: Vec2,
}

fn spawn_balls(assets: &Assets) -> Vec<Ball> {
    let palette = [Color::RED, Color::GREEN, Color::BLUE, Color::WHITE];
    (0..SPRITE_COUNT)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let f = i as f32;
            Ball {
                sprite: Sprite::new(&assets.texture, &assets.shader, &assets.quad, &assets.sampler)
                    .with_color(palette[i % palette.len()]),
                transform: Transform2D::new(Vec2::new(f * 40.0 - 150.0, f * 10.0), 0.0),
                velocity: Vec2::new(3.0 + f, 2.0 - f * 0.5),
            }
        })
        .collect()
}

fn step(balls: &mut [Ball], half_extent: Vec2) {
    for ball in balls {
        let position = &mut ball.transform.position;
        position.x += ball.velocity.x;
        position.y += ball.velocity.y;
        if position.x.abs() > half_extent.x {
            ball.velocity.x = -ball.velocity.x;
        }
        if position.y.abs() > half_extent.y {
            ball.velocity.y = -ball.velocity.y;
        }
        ball.transform.rotation += 0.05;
    }
}

fn run(config: EngineConfig) -> EngineResult<()> {
    #[allow(clippy::cast_precision_loss)]
    let viewport = Vec2::new(
        config.presentation.target_width as f32,
        config.presentation.target_height as f32,
    );
    let half_extent = Vec2::new(viewport.x * 0.5, viewport.y * 0.5);

    let assets = Assets::load();
    let balls = Rc::new(RefCell::new(spawn_balls(&assets)));
    let mut engine = Engine::new(config, HeadlessDevice::new())?;

    let physics = Rc::clone(&balls);
    engine.add_loop("demo.physics", 0, move || {
        step(&mut physics.borrow_mut(), half_extent);
    })?;

    let scene = Rc::clone(&balls);
    engine.add_extraction_listener(move |extractor| {
        let balls = scene.borrow();
        let mut camera = Camera2D::new(viewport);
        if let Some(lead) = balls.first() {
            camera.position = lead.transform.position;
        }
        extract_camera(extractor, &camera);

        for ball in balls.iter() {
            extract_sprite(extractor, &ball.sprite, ball.transform);
            extract_circle(extractor, ball.transform.position, 20.0, ball.sprite.color);
        }
        if let [first, .., last] = balls.as_slice() {
            extract_line(
                extractor,
                first.transform.position,
                last.transform.position,
                Color::WHITE,
            );
        }
    });

    let frames = engine.run();

    let renderer = engine.renderer();
    let stats = renderer.stats();
    println!("krepel_demo: {frames} frames");
    println!(
        "  presented {} / {}, draw calls {}, device errors {}",
        stats.frames_presented, stats.total_frames, stats.total_draw_calls, stats.device_errors
    );
    println!(
        "  render target presented {} frames",
        engine.render_target().frames_presented()
    );
    drop(renderer);

    // Release pending records, then the sprites, before the assets go away.
    engine.shutdown();
    drop(engine);
    balls.borrow_mut().clear();
    drop(assets);
    Ok(())
}

fn main() -> ExitCode {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(&path),
        None => Ok(EngineConfig {
            max_frames: Some(DEMO_FRAMES),
            ..EngineConfig::default()
        }),
    };

    let result = config.map_err(Into::into).and_then(|mut config| {
        config.max_frames.get_or_insert(DEMO_FRAMES);
        run(config)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("krepel_demo: {error}");
            ExitCode::FAILURE
        }
    }
}
