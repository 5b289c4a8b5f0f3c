use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::pixels::Color;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;

use crate::bitmap::Bitmap;
use crate::config::WindowConfig;
use crate::error::Result;
use crate::scale::Size;
use crate::sync::SyncOutcome;
use crate::target::SdlTarget;

pub struct Display {
    canvas: Canvas<Window>,
    event_pump: EventPump,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Quit,
    KeyDown(Keycode),
    Resized { width: u32, height: u32 },
}

impl Display {
    /// Create the window and an accelerated canvas.
    /// Returns the texture creator the bitmap's `SdlTarget` borrows from.
    pub fn new(config: &WindowConfig) -> Result<(Self, TextureCreator<WindowContext>)> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        let mut window_builder = video_subsystem.window(&config.title, config.width, config.height);
        window_builder.position_centered();
        if config.resizable {
            window_builder.resizable();
        }
        let window = window_builder.build().map_err(|e| e.to_string())?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if config.vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(|e| e.to_string())?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump()?;

        Ok((Self { canvas, event_pump }, texture_creator))
    }

    /// Current drawable size in physical pixels
    pub fn output_size(&self) -> Result<Size> {
        Ok(self.canvas.output_size()?.into())
    }

    /// Clear the canvas. None clears to transparent black.
    pub fn begin_frame(&mut self, background: Option<Color>) {
        self.canvas
            .set_draw_color(background.unwrap_or(Color::RGBA(0, 0, 0, 0)));
        self.canvas.clear();
    }

    /// Sync the bitmap into its texture at the current window size, stretch
    /// it over the canvas and present.
    pub fn end_frame(&mut self, bitmap: &mut Bitmap<SdlTarget<'_>>) -> Result<SyncOutcome> {
        bitmap.resize(self.output_size()?);
        let outcome = bitmap.sync()?;

        if outcome != SyncOutcome::Inactive {
            if let Some(texture) = bitmap.target().texture() {
                self.canvas.copy(texture, None, None)?;
            }
        }
        self.canvas.present();
        Ok(outcome)
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(k)),
                Event::Window {
                    win_event: WindowEvent::SizeChanged(w, h),
                    ..
                } => events.push(InputEvent::Resized {
                    width: w.max(0) as u32,
                    height: h.max(0) as u32,
                }),
                _ => {},
            }
        }

        events
    }
}
