use log::{debug, error, info};
use sdl2::keyboard::Keycode;
use sdl2::pixels::Color;

use pixelgrid::config::{self, Command, USAGE};
use pixelgrid::convert::default_workers;
use pixelgrid::util::{hsv_to_rgb, FpsCounter, Rng};
use pixelgrid::{Bitmap, Display, InputEvent, SdlTarget, SyncOutcome};

/// Square bouncing around the logical grid
struct Bouncer {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    size: i32,
}

impl Bouncer {
    fn update(&mut self, dt: f32, width: u32, height: u32) {
        let max_x = (width as i32 - self.size).max(0) as f32;
        let max_y = (height as i32 - self.size).max(0) as f32;
        self.x += self.vx * dt;
        self.y += self.vy * dt;
        if self.x < 0.0 || self.x > max_x {
            self.vx = -self.vx;
            self.x = self.x.clamp(0.0, max_x);
        }
        if self.y < 0.0 || self.y > max_y {
            self.vy = -self.vy;
            self.y = self.y.clamp(0.0, max_y);
        }
    }

    fn render(&self, bitmap: &mut Bitmap<SdlTarget>, color: Color) {
        let (x0, y0) = (self.x as i32, self.y as i32);
        for y in y0..y0 + self.size {
            for x in x0..x0 + self.size {
                bitmap.write_pixel(color, x, y);
            }
        }
    }
}

/// Diagonal hue bands scrolling with time
fn render_backdrop(bitmap: &mut Bitmap<SdlTarget>, width: u32, height: u32, t: f32) {
    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let hue = (x + y) as f32 * 3.0 + t * 60.0;
            bitmap.write_pixel(hsv_to_rgb(hue, 0.6, 0.35), x, y);
        }
    }
}

fn run(config: config::Config) -> pixelgrid::Result<()> {
    let (mut display, texture_creator) = Display::new(&config.window)?;
    let target = SdlTarget::new(&texture_creator);
    let mut bitmap = Bitmap::with_config(target, display.output_size()?, &config.render)?;
    bitmap.initialize(config.bitmap.width, config.bitmap.height)?;

    let (width, height) = match bitmap.buffer() {
        Some(buffer) => (buffer.width(), buffer.height()),
        None => return Ok(()),
    };
    if let Some(state) = bitmap.state_mut() {
        state.set_background(Some(Color::RGB(8, 8, 16)));
    }

    let mut multithreading = config.render.multithreading;
    let workers = config.render.workers.unwrap_or_else(default_workers);
    info!(
        "conversion: {}",
        if multithreading { "parallel" } else { "sequential" }
    );
    info!("Escape quits, M toggles multithreaded conversion");

    let mut rng = Rng::new(0x5eed);
    let mut bouncer = Bouncer {
        x: 0.0,
        y: 0.0,
        vx: width as f32 * 0.4,
        vy: height as f32 * 0.3,
        size: (width.min(height) / 8).max(1) as i32,
    };
    let mut fps_counter = FpsCounter::new(60);
    let mut t = 0.0;
    let mut since_report = 0.0;
    let mut skipped = 0u32;

    'main: loop {
        let (dt, avg_fps) = fps_counter.tick();
        t += dt;

        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(Keycode::M) => {
                    multithreading = !multithreading;
                    bitmap.set_multithreading(multithreading, workers)?;
                    info!("multithreading {}", if multithreading { "on" } else { "off" });
                },
                InputEvent::Resized { width, height } => debug!("window resized to {}x{}", width, height),
                InputEvent::KeyDown(_) => {},
            }
        }

        let background = bitmap.state().and_then(|s| s.background);
        display.begin_frame(background);

        bouncer.update(dt, width, height);
        render_backdrop(&mut bitmap, width, height, t);
        bouncer.render(&mut bitmap, Color::RGB(255, 255, 255));
        for _ in 0..8 {
            let (x, y) = (rng.below(width) as i32, rng.below(height) as i32);
            bitmap.write_pixel(hsv_to_rgb(rng.below(360) as f32, 1.0, 1.0), x, y);
        }

        if display.end_frame(&mut bitmap)? == SyncOutcome::Skipped {
            skipped += 1;
        }

        since_report += dt;
        if since_report >= 5.0 {
            info!(
                "{:.0} fps ({:.2} ms), {} skipped frames",
                avg_fps,
                fps_counter.avg_frame_time_ms(),
                skipped
            );
            since_report = 0.0;
            skipped = 0;
        }
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match config::parse_args(&args) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return;
        },
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        },
    };

    if let Err(e) = run(config) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
