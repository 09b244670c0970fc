//! Session: The loop that ties module, display and input together.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     HostEvent      ┌──────────────┐   step    ┌──────────┐
//! │ Input Thread │ ─────────────────▶ │              │ ────────▶ │  Module  │
//! └──────────────┘                    │              │           └──────────┘
//! ┌──────────────┐       Tick         │ Session Loop │  render_frame │
//! │Ticker Thread │ ─────────────────▶ │              │ ◀─────────────┘
//! └──────────────┘                    │              │
//! ┌──────────────┐      Command       │              │ ──▶ FrameRenderer ──▶ Surface
//! │  Automation  │ ─────────────────▶ │              │
//! └──────────────┘                    └──────────────┘
//! ```
//!
//! The loop is the only place where the module runs, the sequencer advances
//! and frames are rendered. Helper threads only send messages.

mod automation;
mod messages;
mod module;
mod ticker;

pub use automation::{Automation, AutomationError, SMOKE_TEST_KEYS};
pub use messages::{Command, HostEvent};
pub use module::{Module, ModuleError, ModuleHost};
pub use ticker::{Tick, TickerActor};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, StartupSource};
use crate::input::{InputActor, InputChannel, KeyCode, KeyEvent};
use crate::memory::MemoryHandle;
use crate::render::{FrameRenderer, RenderError, RenderStats, Surface};
use crate::sequencer::{SequenceHandle, Sequencer, SequencerError};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Why the loop woke up.
enum Wake {
    Host(HostEvent),
    Command(Command),
    Tick,
    TickerStopped,
    Idle,
}

/// What the module sees of the bridge.
struct Host<H: MemoryHandle, S: Surface> {
    renderer: FrameRenderer<H, S>,
    channel: InputChannel,
}

impl<H: MemoryHandle, S: Surface> ModuleHost for Host<H, S> {
    fn render_frame(
        &mut self,
        offset: usize,
        length: usize,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        self.renderer
            .render_frame(offset, length, width, height)
            .inspect_err(|err| log::warn!("render_frame rejected: {err}"))
    }

    fn poll_key(&mut self) -> Option<KeyEvent> {
        self.channel.pop()
    }

    fn drain_keys(&mut self) -> Vec<KeyEvent> {
        self.channel.drain()
    }
}

/// One running bridge instance.
///
/// Owns its input channel, memory view and sequencer; nothing is shared
/// with other sessions.
pub struct Session<M: Module, S: Surface> {
    config: BridgeConfig,
    module: M,
    host: Host<M::Memory, S>,
    sequencer: Sequencer,
    host_tx: Sender<HostEvent>,
    host_rx: Receiver<HostEvent>,
    command_tx: Sender<Command>,
    command_rx: Receiver<Command>,
    input: Option<InputActor>,
    running: bool,
    /// Shared with [`Automation`] handles; cleared once commands stop being served.
    serving: Arc<AtomicBool>,
    frames: u64,
}

impl<M: Module, S: Surface> Session<M, S> {
    /// Load the module and wire it to `surface`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Startup`] if `loader` fails and
    /// [`BridgeError::Config`] if `config` is out of range.
    pub fn start<F, E>(config: BridgeConfig, surface: S, loader: F) -> Result<Self, BridgeError>
    where
        F: FnOnce() -> Result<M, E>,
        E: Into<StartupSource>,
    {
        config.validate()?;
        let module = loader().map_err(BridgeError::startup)?;

        let channel = InputChannel::new();
        let (host_tx, host_rx) = unbounded();
        let (command_tx, command_rx) = unbounded();

        let memory = module.memory();
        log::info!("module loaded ({} bytes of memory)", memory.byte_len());

        Ok(Self {
            sequencer: Sequencer::new(channel.clone(), config.sequencer.timing()),
            host: Host {
                renderer: FrameRenderer::new(memory, surface),
                channel,
            },
            config,
            module,
            host_tx,
            host_rx,
            command_tx,
            command_rx,
            input: None,
            running: true,
            serving: Arc::new(AtomicBool::new(true)),
            frames: 0,
        })
    }

    /// Start capturing terminal input into this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture thread cannot be spawned.
    pub fn attach_input(&mut self, synthesize_release: bool) -> io::Result<()> {
        if self.input.is_none() {
            let actor = InputActor::spawn(
                self.host_tx.clone(),
                self.config.input.poll_timeout(),
                synthesize_release,
            )?;
            self.input = Some(actor);
        }
        Ok(())
    }

    /// Sender for feeding host events from outside the loop.
    pub fn host_sender(&self) -> Sender<HostEvent> {
        self.host_tx.clone()
    }

    /// Handle for driving this session from other threads.
    pub fn automation(&self) -> Automation {
        Automation::new(
            self.command_tx.clone(),
            self.host.channel.clone(),
            Arc::clone(&self.serving),
        )
    }

    /// One cooperative iteration without stepping the module.
    ///
    /// Applies queued host events and automation commands, then fires due
    /// sequencer transitions. Returns the sequencer's next deadline.
    pub fn pump(&mut self, now: Instant) -> Option<Instant> {
        while let Ok(event) = self.host_rx.try_recv() {
            self.handle_host_event(event);
        }
        while let Ok(command) = self.command_rx.try_recv() {
            self.handle_command(command, now);
        }
        self.sequencer.poll(now)
    }

    /// Step the module once.
    ///
    /// # Errors
    ///
    /// Returns the module's error; the session should not continue.
    pub fn run_frame(&mut self) -> Result<(), ModuleError> {
        self.module.step(&mut self.host)?;
        self.frames += 1;
        Ok(())
    }

    /// Run until quit, [`Automation::shutdown`] or a module error.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Module`] if the module fails and
    /// [`BridgeError::Io`] if the frame ticker cannot start.
    pub fn run(&mut self) -> Result<(), BridgeError> {
        let interval = self.config.display.frame_interval();
        let ticker = TickerActor::spawn(interval)?;
        let host_rx = self.host_rx.clone();
        let command_rx = self.command_rx.clone();
        self.serving.store(true, Ordering::Release);

        log::info!("session running at {} fps", self.config.display.target_fps);

        let result = loop {
            let deadline = self.pump(Instant::now());
            if !self.running {
                break Ok(());
            }
            let timeout =
                deadline.map_or(interval, |d| d.saturating_duration_since(Instant::now()));

            let wake = select! {
                recv(host_rx) -> event => event.map_or(Wake::Idle, Wake::Host),
                recv(command_rx) -> command => command.map_or(Wake::Idle, Wake::Command),
                recv(ticker.receiver()) -> tick => tick.map_or(Wake::TickerStopped, |_| Wake::Tick),
                default(timeout) => Wake::Idle,
            };

            match wake {
                Wake::Host(event) => self.handle_host_event(event),
                Wake::Command(command) => self.handle_command(command, Instant::now()),
                Wake::Tick => {
                    if let Err(err) = self.run_frame() {
                        log::error!("module stopped: {err}");
                        break Err(err.into());
                    }
                }
                Wake::TickerStopped => {
                    log::warn!("frame ticker stopped");
                    break Ok(());
                }
                Wake::Idle => {}
            }
        };

        ticker.join();
        self.stop_serving();
        log::info!("session stopped after {} frames", self.frames);
        result
    }

    /// Start a sequence from the loop's own thread.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::Busy`] if a sequence is running.
    pub fn run_sequence(
        &mut self,
        keys: Vec<KeyCode>,
        now: Instant,
    ) -> Result<SequenceHandle, SequencerError> {
        self.sequencer.start(keys, now)
    }

    /// Play the smoke-test sequence from the loop's own thread.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::Busy`] if a sequence is running.
    pub fn smoke_test(&mut self, now: Instant) -> Result<SequenceHandle, SequencerError> {
        self.run_sequence(SMOKE_TEST_KEYS.to_vec(), now)
    }

    /// The session's input channel.
    pub const fn channel(&self) -> &InputChannel {
        &self.host.channel
    }

    /// The session's sequencer.
    pub const fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Render statistics.
    pub const fn render_stats(&self) -> &RenderStats {
        self.host.renderer.stats()
    }

    /// The display surface.
    pub const fn surface(&self) -> &S {
        self.host.renderer.surface()
    }

    /// The module.
    pub const fn module(&self) -> &M {
        &self.module
    }

    /// Frames stepped so far.
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Whether the loop should keep going.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Refuse further automation and fail requests already queued.
    fn stop_serving(&self) {
        self.serving.store(false, Ordering::Release);
        // Dropping a queued reply sender wakes its requester
        let dropped = self.command_rx.try_iter().count();
        if dropped > 0 {
            log::debug!("dropped {dropped} automation commands after stop");
        }
    }

    fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Key(key) => self.host.channel.push(key),
            HostEvent::Resize { cols, rows } => {
                if let Err(err) = self.host.renderer.resize(cols, rows) {
                    log::warn!("resize to {cols}x{rows} failed: {err}");
                }
            }
            HostEvent::Quit => {
                log::info!("quit requested");
                self.running = false;
            }
            HostEvent::Error(err) => log::warn!("input error: {err}"),
            HostEvent::Shutdown => log::debug!("input thread stopped"),
        }
    }

    fn handle_command(&mut self, command: Command, now: Instant) {
        match command {
            Command::RunSequence { keys, reply } => {
                let outcome = self.sequencer.start(keys, now);
                if let Err(err) = &outcome {
                    log::info!("sequence refused: {err}");
                }
                // The requester may have given up waiting
                let _ = reply.send(outcome);
            }
            Command::Cancel => {
                self.sequencer.cancel();
            }
            Command::Shutdown => {
                log::info!("shutdown requested");
                self.running = false;
            }
        }
    }
}

impl<M: Module, S: Surface> Drop for Session<M, S> {
    fn drop(&mut self) {
        self.serving.store(false, Ordering::Release);
        if let Some(actor) = self.input.take() {
            actor.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::LinearMemory;
    use crate::render::CaptureSurface;
    use crate::sequencer::{Phase, DEFAULT_HOLD, DEFAULT_REST};
    use std::time::Duration;

    /// Paints its memory as a 2x2 frame and records the keys it sees.
    struct EchoModule {
        memory: LinearMemory,
        seen: Vec<KeyEvent>,
    }

    impl Module for EchoModule {
        type Memory = LinearMemory;

        fn memory(&self) -> LinearMemory {
            self.memory.clone()
        }

        fn step(&mut self, host: &mut dyn ModuleHost) -> Result<(), ModuleError> {
            self.seen.extend(host.drain_keys());
            host.render_frame(0, 16, 2, 2)?;
            Ok(())
        }
    }

    fn session() -> (Session<EchoModule, CaptureSurface>, CaptureSurface) {
        let surface = CaptureSurface::new();
        let session = Session::start(BridgeConfig::default(), surface.clone(), || {
            Ok::<_, BridgeError>(EchoModule {
                memory: LinearMemory::new(64),
                seen: Vec::new(),
            })
        })
        .unwrap();
        (session, surface)
    }

    #[test]
    fn test_loader_failure_is_startup_error() {
        let result = Session::<EchoModule, _>::start(
            BridgeConfig::default(),
            CaptureSurface::new(),
            || Err("truncated module"),
        );
        assert!(matches!(result, Err(BridgeError::Startup { .. })));
    }

    #[test]
    fn test_host_key_events_reach_module_in_order() {
        let (mut session, surface) = session();
        let tx = session.host_sender();
        tx.send(HostEvent::Key(KeyEvent::press(KeyCode::KeyA))).unwrap();
        tx.send(HostEvent::Key(KeyEvent::release(KeyCode::KeyA))).unwrap();

        session.pump(Instant::now());
        session.run_frame().unwrap();

        assert_eq!(
            session.module().seen,
            vec![KeyEvent::press(KeyCode::KeyA), KeyEvent::release(KeyCode::KeyA)]
        );
        assert_eq!(surface.frames_presented(), 1);
        assert_eq!(session.frames(), 1);
    }

    #[test]
    fn test_host_and_sequencer_events_interleave_in_arrival_order() {
        let (mut session, _) = session();
        let tx = session.host_sender();
        let t0 = Instant::now();
        let key = |code, down| KeyEvent { code, down };

        session.run_sequence(vec![KeyCode::KeyX, KeyCode::KeyY], t0).unwrap();

        tx.send(HostEvent::Key(key(KeyCode::KeyA, true))).unwrap();
        session.pump(t0 + Duration::from_millis(10));

        // Host events queued before a due transition land ahead of it
        tx.send(HostEvent::Key(key(KeyCode::KeyB, true))).unwrap();
        session.pump(t0 + DEFAULT_HOLD);
        session.pump(t0 + DEFAULT_HOLD + DEFAULT_REST);

        tx.send(HostEvent::Key(key(KeyCode::KeyA, false))).unwrap();
        tx.send(HostEvent::Key(key(KeyCode::KeyB, false))).unwrap();
        session.pump(t0 + 2 * DEFAULT_HOLD + DEFAULT_REST);

        assert_eq!(
            session.channel().drain(),
            vec![
                key(KeyCode::KeyX, true),
                key(KeyCode::KeyA, true),
                key(KeyCode::KeyB, true),
                key(KeyCode::KeyX, false),
                key(KeyCode::KeyY, true),
                key(KeyCode::KeyA, false),
                key(KeyCode::KeyB, false),
                key(KeyCode::KeyY, false),
            ]
        );
    }

    #[test]
    fn test_quit_stops_session() {
        let (mut session, _) = session();
        session.host_sender().send(HostEvent::Quit).unwrap();
        session.pump(Instant::now());
        assert!(!session.is_running());
    }

    #[test]
    fn test_smoke_test_plays_f7_then_altright() {
        let (mut session, _) = session();
        let t0 = Instant::now();
        session.smoke_test(t0).unwrap();

        let mut now = t0;
        while session.pump(now).is_some() {
            now += Duration::from_millis(50);
        }

        assert_eq!(
            session.channel().drain(),
            vec![
                KeyEvent::press(KeyCode::F7),
                KeyEvent::release(KeyCode::F7),
                KeyEvent::press(KeyCode::AltRight),
                KeyEvent::release(KeyCode::AltRight),
            ]
        );
        assert_eq!(session.sequencer().phase(), Phase::Done);
        assert!(now >= t0 + 2 * (DEFAULT_HOLD + DEFAULT_REST));
    }

    #[test]
    fn test_cancel_command() {
        let (mut session, _) = session();
        let t0 = Instant::now();
        session.run_sequence(vec![KeyCode::KeyQ, KeyCode::KeyW], t0).unwrap();

        session.command_tx.send(Command::Cancel).unwrap();
        assert_eq!(session.pump(t0 + Duration::from_millis(1)), None);
        assert_eq!(
            session.channel().snapshot(),
            vec![KeyEvent::press(KeyCode::KeyQ), KeyEvent::release(KeyCode::KeyQ)]
        );
    }

    #[test]
    fn test_automation_after_run_returns_disconnected() {
        let (mut session, _) = session();
        let automation = session.automation();
        session.host_sender().send(HostEvent::Quit).unwrap();
        session.run().unwrap();
        assert!(!automation.is_connected());

        // The session is still alive; the request must fail, not hang
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let requester = automation.clone();
        std::thread::spawn(move || {
            let _ = done_tx.send(requester.run_sequence(vec![KeyCode::KeyA]));
        });
        let outcome = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(outcome.unwrap_err(), AutomationError::Disconnected);
        assert_eq!(automation.cancel(), Err(AutomationError::Disconnected));
        assert!(session.channel().is_empty());
    }

    #[test]
    fn test_request_queued_before_stop_is_released() {
        let (session, _) = session();
        let automation = session.automation();
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let requester = automation.clone();
        std::thread::spawn(move || {
            let _ = done_tx.send(requester.smoke_test());
        });

        // Wait until the request is sitting in the queue, then stop serving
        while session.command_rx.is_empty() {
            std::thread::sleep(Duration::from_millis(1));
        }
        session.stop_serving();

        let outcome = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(outcome.unwrap_err(), AutomationError::Disconnected);
    }

    #[test]
    fn test_render_error_does_not_stop_module_step() {
        struct OutOfRange;
        impl Module for OutOfRange {
            type Memory = LinearMemory;
            fn memory(&self) -> LinearMemory {
                LinearMemory::new(8)
            }
            fn step(&mut self, host: &mut dyn ModuleHost) -> Result<(), ModuleError> {
                assert!(host.render_frame(0, 16, 2, 2).is_err());
                Ok(())
            }
        }

        let surface = CaptureSurface::new();
        let mut session =
            Session::start(BridgeConfig::default(), surface.clone(), || {
                Ok::<_, BridgeError>(OutOfRange)
            })
            .unwrap();
        session.run_frame().unwrap();

        assert_eq!(surface.frames_presented(), 0);
        assert_eq!(session.render_stats().rejected, 1);
    }
}
