use std::time::Duration;

use druid::widget::prelude::*;
use druid::{Code, ImageBuf, MouseButton, TimerToken, Widget};
use log::warn;

use crate::config::Config;
use crate::controller::Button;
use crate::error::ConfigError;
use crate::explorer::{Event as ExplorerEvent, ExplorerWorker};
use crate::gui::convert_image;

const FRAME_POLL: Duration = Duration::from_millis(16);
const KEY_PAN: f64 = 0.05;
const WHEEL_STEP: f64 = 100.0;

/// Shows frames from a background `ExplorerWorker` and forwards input to it.
pub struct ExplorerWidget {
    worker: ExplorerWorker,
    width: usize,
    height: usize,
    image: Option<ImageBuf>,
    timer: TimerToken,
}

impl ExplorerWidget {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Ok(Self {
            worker: ExplorerWorker::spawn(config)?,
            width: config.width,
            height: config.height,
            image: None,
            timer: TimerToken::INVALID,
        })
    }

    fn send(&self, event: ExplorerEvent) {
        if !self.worker.send(event) {
            warn!("explorer worker stopped, dropping {:?}", event);
        }
    }

    fn resize(&mut self, size: Size) -> bool {
        let width = f64::round(size.width) as usize;
        let height = f64::round(size.height) as usize;
        if width == 0 || height == 0 || (self.width == width && self.height == height) {
            return false;
        }
        self.width = width;
        self.height = height;
        self.send(ExplorerEvent::Resize { width, height });
        true
    }

    fn key_pan(&self, x: f64, y: f64) {
        self.send(ExplorerEvent::Pan {
            dx: x * self.width as f64,
            dy: y * self.height as f64,
        });
    }
}

fn button(button: MouseButton) -> Option<Button> {
    match button {
        MouseButton::Left => Some(Button::Left),
        MouseButton::Middle => Some(Button::Middle),
        MouseButton::Right => Some(Button::Right),
        _ => None,
    }
}

impl Widget<()> for ExplorerWidget {
    fn event(&mut self, ctx: &mut EventCtx, event: &Event, _data: &mut (), _env: &Env) {
        match event {
            Event::Timer(token) if *token == self.timer => {
                if let Some(frame) = self.worker.next_frame() {
                    self.image = Some(convert_image(&frame.image));
                    ctx.request_paint();
                }
                self.timer = ctx.request_timer(FRAME_POLL);
            }
            Event::KeyDown(key_event) => {
                use Code::*;
                match key_event.code {
                    ArrowUp => self.key_pan(0.0, KEY_PAN),
                    ArrowDown => self.key_pan(0.0, -KEY_PAN),
                    ArrowLeft => self.key_pan(KEY_PAN, 0.0),
                    ArrowRight => self.key_pan(-KEY_PAN, 0.0),
                    PageUp => self.send(ExplorerEvent::Zoom { delta: 2.0 }),
                    PageDown => self.send(ExplorerEvent::Zoom { delta: -2.0 }),
                    KeyR => self.send(ExplorerEvent::Reset),
                    _ => (),
                }
            }
            Event::MouseDown(mouse) => {
                if !ctx.is_focused() {
                    ctx.request_focus();
                }
                if let Some(button) = button(mouse.button) {
                    ctx.set_active(true);
                    self.send(ExplorerEvent::PointerPress {
                        button,
                        x: mouse.pos.x,
                        y: mouse.pos.y,
                    });
                }
            }
            Event::MouseMove(mouse) => {
                if ctx.is_active() {
                    self.send(ExplorerEvent::PointerMove {
                        x: mouse.pos.x,
                        y: mouse.pos.y,
                    });
                }
            }
            Event::MouseUp(mouse) => {
                if let Some(button) = button(mouse.button) {
                    ctx.set_active(false);
                    self.send(ExplorerEvent::PointerRelease { button });
                }
            }
            Event::Wheel(mouse) => {
                // Wheel down zooms out.
                self.send(ExplorerEvent::Wheel {
                    delta: -mouse.wheel_delta.y / WHEEL_STEP,
                    x: mouse.pos.x,
                    y: mouse.pos.y,
                });
            }
            _ => (),
        }
    }

    fn lifecycle(&mut self, ctx: &mut LifeCycleCtx, event: &LifeCycle, _data: &(), _env: &Env) {
        match event {
            LifeCycle::WidgetAdded => {
                ctx.register_for_focus();
                self.timer = ctx.request_timer(FRAME_POLL);
            }
            LifeCycle::Size(size) => {
                self.resize(*size);
            }
            _ => (),
        }
    }

    fn update(&mut self, _ctx: &mut UpdateCtx, _old_data: &(), _new_data: &(), _env: &Env) {}

    fn layout(
        &mut self,
        _ctx: &mut LayoutCtx,
        bc: &BoxConstraints,
        _data: &(),
        _env: &Env,
    ) -> Size {
        bc.max()
    }

    fn paint(&mut self, ctx: &mut PaintCtx, _: &(), _env: &Env) {
        let size = ctx.size();
        if let Some(image_buf) = &self.image {
            let ctx_image = image_buf.to_image(ctx.render_ctx);
            ctx.draw_image(
                &ctx_image,
                size.to_rect(),
                druid::piet::InterpolationMode::NearestNeighbor,
            );
        }
    }
}
