use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tui::style::Color;

use crate::display::{FrameBuffer, Renderer, Surface};
use crate::input::{Input, KeyMap};
use crate::interpreter::Interpreter;

/// how a session is put together
#[derive(Debug, Clone)]
pub struct Config {
    /// physical pixels drawn per logical pixel
    pub scale_factor: usize,
    pub foreground: Color,
    pub background: Color,
    /// frames per second; each frame is one core step and one repaint
    pub refresh_hz: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scale_factor: 1,
            foreground: Color::White,
            background: Color::Black,
            refresh_hz: 60,
        }
    }
}

/// whether the core has been handed a program yet. one-way: there is no
/// path back to awaiting once a rom has loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    AwaitingRom,
    Loaded,
}

/// Lets a host stop [`Runtime::run`], which otherwise runs for the life of
/// the process. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        StopToken::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// what one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// no rom yet: nothing stepped, nothing painted
    Idle,
    /// stepped the core once and repainted
    Stepped,
    /// the input device asked to quit
    Quit,
}

/// One running session: the core, its surface and input devices, and the
/// state gating execution on a program being loaded. The scheduler in
/// [`Runtime::run`] drives exactly one core step and one full repaint per
/// frame, so emulation speed is tied 1:1 to the configured refresh rate.
pub struct Runtime<C: Interpreter, S: Surface, I: Input> {
    core: C,
    surface: S,
    input: I,
    keymap: KeyMap,
    renderer: Renderer,
    width: usize,
    height: usize,
    frame_period: Duration,
    load_state: LoadState,
    pending_rom: Option<Vec<u8>>,
    started: Instant,
}

impl<C: Interpreter, S: Surface, I: Input> Runtime<C, S, I> {
    pub fn new(core: C, surface: S, input: I, keymap: KeyMap, config: &Config) -> Self {
        assert!(config.refresh_hz > 0, "refresh rate must be at least 1Hz");
        // dimensions are queried exactly once; the core keeps them fixed
        let width = core.width();
        let height = core.height();
        Runtime {
            core,
            surface,
            input,
            keymap,
            renderer: Renderer::new(config.scale_factor, config.foreground, config.background),
            width,
            height,
            frame_period: Duration::from_secs(1) / config.refresh_hz,
            load_state: LoadState::AwaitingRom,
            pending_rom: None,
            started: Instant::now(),
        }
    }

    /// Stash a program image for the scheduler to load on its next tick.
    /// Supplying again before that tick replaces the stash; supplying after
    /// a rom has loaded does nothing (there is no reload path; start a new
    /// session instead).
    pub fn supply_rom(&mut self, rom: Vec<u8>) {
        match self.load_state {
            LoadState::AwaitingRom => self.pending_rom = Some(rom),
            LoadState::Loaded => {
                log::warn!("a rom is already loaded; ignoring {} new bytes", rom.len())
            }
        }
    }

    pub fn rom_loaded(&self) -> bool {
        self.load_state == LoadState::Loaded
    }

    /// milliseconds since the session started, handed to the core so it can
    /// run its own timers. the shell never computes deltas
    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// drain the input device and forward every mapped edge to the core.
    /// unmapped keys are dropped; the core keeps any pressed-key state
    fn forward_keys(&mut self) -> Result<bool, io::Error> {
        let polled = self.input.poll()?;
        for edge in polled.edges {
            match self.keymap.translate(edge.key) {
                Some(key) => self.core.set_key(key, edge.pressed),
                None => log::debug!("no keypad mapping for {:?}", edge.key),
            }
        }
        Ok(polled.quit)
    }

    /// repaint from a freshly acquired framebuffer view. the view dies at
    /// the core's next step, hence rebuilt here every time
    fn paint(&mut self) -> Result<(), io::Error> {
        let frame = FrameBuffer::new(self.core.framebuffer(), self.width, self.height)?;
        self.renderer.paint(&frame, &mut self.surface)
    }

    /// One frame. In order: forward key edges, then while no rom has loaded
    /// either load the pending image (exactly once, ever) or go back idle,
    /// then step the core and repaint. A core fault fails the tick rather
    /// than being papered over.
    pub fn tick(&mut self) -> Result<Tick, io::Error> {
        if self.forward_keys()? {
            return Ok(Tick::Quit);
        }

        if self.load_state == LoadState::AwaitingRom {
            match self.pending_rom.take() {
                Some(rom) => {
                    log::info!("loading {} byte rom", rom.len());
                    self.core.load_rom(rom);
                    self.load_state = LoadState::Loaded;
                }
                None => return Ok(Tick::Idle),
            }
        }

        self.core.step(self.now_ms());
        self.paint()?;
        Ok(Tick::Stepped)
    }

    /// Run until the token stops us, the input asks to quit, or a tick
    /// fails. The core's blank post-construction frame goes up once before
    /// the first tick. Idle frames (no rom supplied yet) re-arm at the same
    /// cadence as live ones; the wait is user-paced, so spinning at the
    /// refresh rate is fine.
    pub fn run(&mut self, stop: &StopToken) -> Result<(), io::Error> {
        self.paint()?;
        loop {
            let frame_started = Instant::now();
            if stop.is_stopped() {
                return Ok(());
            }
            if self.tick()? == Tick::Quit {
                return Ok(());
            }
            spin_sleep::sleep(self.frame_period.saturating_sub(frame_started.elapsed()));
        }
    }
}
