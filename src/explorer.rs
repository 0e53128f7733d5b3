use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use image::RgbImage;
use log::{debug, info, warn};

use crate::config::Config;
use crate::controller::{Button, ViewportController};
use crate::coord::{DisplayTransform, Point, Viewport};
use crate::error::ConfigError;
use crate::painter::colorize;
use crate::solver::{make_solver, EscapeField, FieldSolver};

/// Input understood by the explorer. Positions are in buffer pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Event {
    PointerPress { button: Button, x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerRelease { button: Button },
    /// Zoom about the pointer.
    Wheel { delta: f64, x: f64, y: f64 },
    Pan { dx: f64, dy: f64 },
    /// Zoom about the center.
    Zoom { delta: f64 },
    Resize { width: usize, height: usize },
    Reset,
    RequestRedraw,
}

/// One computed and coloured view.
#[derive(Debug)]
pub struct Frame {
    pub generation: u64,
    pub viewport: Viewport,
    pub field: EscapeField,
    pub image: RgbImage,
    pub transform: DisplayTransform,
}

pub struct Explorer {
    config: Config,
    controller: ViewportController,
    solver: Box<dyn FieldSolver + Send>,
    frame: Option<Arc<Frame>>,
}

impl Explorer {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let controller = ViewportController::new(config.viewport()?, config.zoom_factor)?;
        info!(
            "explorer {}x{}, max_iter {}, {} solver, {} colouring",
            config.width, config.height, config.max_iter, config.strategy, config.color_policy
        );
        Ok(Self {
            solver: make_solver(config.strategy),
            config,
            controller,
            frame: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    pub fn viewport(&self) -> Viewport {
        self.controller.viewport()
    }

    pub fn generation(&self) -> u64 {
        self.controller.generation()
    }

    /// Applies one event; true when the view moved.
    pub fn dispatch(&mut self, event: Event) -> Result<bool, ConfigError> {
        let ctl = &mut self.controller;
        let changed = match event {
            Event::PointerPress { button, x, y } => {
                ctl.press(button, x, y);
                false
            }
            Event::PointerMove { x, y } => ctl.drag_to(x, y),
            Event::PointerRelease { button } => {
                ctl.release(button);
                false
            }
            Event::Wheel { delta, x, y } => ctl.zoom(delta, Some(Point::new(x, y))),
            Event::Pan { dx, dy } => ctl.pan(dx, dy),
            Event::Zoom { delta } => ctl.zoom(delta, None),
            Event::Resize { width, height } => ctl.on_resize(width, height)?,
            Event::Reset => ctl.reset(),
            Event::RequestRedraw => {
                ctl.invalidate();
                false
            }
        };
        Ok(changed)
    }

    pub fn needs_render(&self) -> bool {
        self.frame.is_none() || self.controller.is_stale()
    }

    /// The last frame rendered, if any.
    pub fn frame(&self) -> Option<Arc<Frame>> {
        self.frame.clone()
    }

    /// Recomputes when the view changed since the last frame, then returns
    /// the current frame.
    pub fn render(&mut self) -> Result<Arc<Frame>, ConfigError> {
        if let (false, Some(frame)) = (self.needs_render(), &self.frame) {
            return Ok(frame.clone());
        }
        let generation = self.controller.generation();
        let viewport = self.controller.viewport();
        let request = self.config.request(viewport)?;

        let start = Instant::now();
        let field = self.solver.compute(&request);
        let computed = start.elapsed();
        let image = colorize(&field, &self.config.color_policy);
        debug!(
            "generation {}: {}x{} computed in {:?}, coloured in {:?}",
            generation,
            viewport.width(),
            viewport.height(),
            computed,
            start.elapsed() - computed
        );

        let frame = Arc::new(Frame {
            generation,
            viewport,
            field,
            image,
            transform: viewport.display_transform(),
        });
        self.controller.mark_fresh(generation);
        self.frame = Some(frame.clone());
        Ok(frame)
    }
}

type FrameSlot = Arc<RwLock<Option<Arc<Frame>>>>;

/// What happened to the frame of one worker pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Pass {
    Published(u64),
    Superseded(u64),
    Closed,
    Failed,
}

/// Runs an `Explorer` on a background thread. Events are queued from any
/// thread, finished frames are picked up with `next_frame`.
pub struct ExplorerWorker {
    tx: Option<Sender<Event>>,
    frames: FrameSlot,
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ExplorerWorker {
    pub fn spawn(config: Config) -> Result<Self, ConfigError> {
        let explorer = Explorer::new(config)?;
        let (tx, rx) = channel::<Event>();
        let frames: FrameSlot = Arc::new(RwLock::new(None));
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = Self::spawn_explorer(explorer, rx, frames.clone(), shutdown.clone());

        Ok(Self {
            tx: Some(tx),
            frames,
            shutdown,
            handle: Some(handle),
        })
    }

    fn apply(explorer: &mut Explorer, event: Event) {
        if let Err(e) = explorer.dispatch(event) {
            warn!("rejected {:?}: {}", event, e);
        }
    }

    /// Applies everything queued. Returns the number applied and whether the
    /// sending side is still there.
    fn drain(explorer: &mut Explorer, rx: &Receiver<Event>) -> (usize, bool) {
        let mut n = 0;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    Self::apply(explorer, event);
                    n += 1;
                }
                Err(TryRecvError::Empty) => return (n, true),
                Err(TryRecvError::Disconnected) => return (n, false),
            }
        }
    }

    fn spawn_explorer(
        mut explorer: Explorer,
        rx: Receiver<Event>,
        frames: FrameSlot,
        shutdown: Arc<AtomicBool>,
    ) -> thread::JoinHandle<()> {
        thread::spawn(move || loop {
            if shutdown.load(Ordering::SeqCst) {
                return;
            }
            if !explorer.needs_render() {
                match rx.recv_timeout(Duration::from_millis(20)) {
                    Ok(event) => Self::apply(&mut explorer, event),
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
            let (_, open) = Self::drain(&mut explorer, &rx);
            if !open {
                return;
            }
            if !explorer.needs_render() {
                continue;
            }

            match Self::pass(&mut explorer, &rx, &frames) {
                Pass::Published(_) | Pass::Superseded(_) => (),
                Pass::Closed | Pass::Failed => return,
            }
        })
    }

    /// One render, then the events that queued up meanwhile. The frame is
    /// published unless those events moved the view.
    fn pass(explorer: &mut Explorer, rx: &Receiver<Event>, frames: &FrameSlot) -> Pass {
        let frame = match explorer.render() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("render failed: {}", e);
                return Pass::Failed;
            }
        };

        let (late, open) = Self::drain(explorer, rx);
        let outcome = if late > 0 && explorer.generation() != frame.generation {
            debug!(
                "generation {} superseded by {} queued events",
                frame.generation, late
            );
            Pass::Superseded(frame.generation)
        } else {
            let generation = frame.generation;
            frames
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .replace(frame);
            Pass::Published(generation)
        };
        if open {
            outcome
        } else {
            Pass::Closed
        }
    }

    /// Queues an event. False once the worker has stopped.
    pub fn send(&self, event: Event) -> bool {
        match &self.tx {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub fn has_frame(&self) -> bool {
        self.frames
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Takes the newest published frame, leaving the slot empty.
    pub fn next_frame(&self) -> Option<Arc<Frame>> {
        self.frames
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Drop for ExplorerWorker {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("explorer thread panicked");
            }
        }
    }
}
