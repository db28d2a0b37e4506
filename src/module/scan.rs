//! Provide Loop for Scanning.
//!
//! The loop owns the operator flags (continuous vision, mute) and feeds the latest
//! frame to the pipeline. Cycles never overlap: each tick runs at most one cycle to
//! completion. A manual scan requested while a cycle runs is deferred to the next tick,
//! and several requests collapse into one forced cycle.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use super::com::ScanCommand;
use super::define;
use super::display::Presenter;
use super::pipeline::{FramePipeline, PipelineMode, RenderDescription};
use super::util::conf::Scan;
use super::vision::FrameSource;

/// Loop states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Scheduling loop.
pub struct ScanLoop {
    state: LoopState,
    continuous: bool,
    muted: bool,
    manual_pending: bool,
    source: Box<dyn FrameSource>,
    pipeline: FramePipeline,
    presenter: Box<dyn Presenter>,
    rx: Receiver<ScanCommand>,
}

impl ScanLoop {
    pub fn new(
        source: Box<dyn FrameSource>,
        pipeline: FramePipeline,
        presenter: Box<dyn Presenter>,
        rx: Receiver<ScanCommand>,
        conf: &Scan,
    ) -> Self {
        Self {
            state: LoopState::Stopped,
            continuous: conf.continuous,
            muted: conf.muted,
            manual_pending: false,
            source,
            pipeline,
            presenter,
            rx,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Enter `Running`. Called once acquisition has succeeded.
    pub fn start(&mut self) {
        if self.state == LoopState::Running {
            return;
        }
        self.state = LoopState::Running;
        log::info!("System Initialization Complete.");
        if !self.muted {
            self.pipeline.announce(define::system::ONLINE_MESSAGE);
        }
    }

    /// Apply one operator command.
    pub fn handle(&mut self, cmd: ScanCommand) {
        match cmd {
            ScanCommand::ManualScan => {
                if self.state != LoopState::Running {
                    log::debug!("Manual scan ignored, loop not running.");
                    return;
                }
                log::info!("Manual Scan Triggered");
                self.manual_pending = true;
            }
            ScanCommand::ToggleContinuous => {
                self.continuous = !self.continuous;
                log::info!(
                    "{}",
                    if self.continuous {
                        "Continuous Vision ON"
                    } else {
                        "Continuous Vision OFF"
                    }
                );
            }
            ScanCommand::ToggleMute => {
                self.muted = !self.muted;
                log::info!("{}", if self.muted { "Audio Muted" } else { "Audio Enabled" });
            }
            ScanCommand::Shutdown => {
                log::info!("Shutdown requested.");
                self.state = LoopState::Stopped;
            }
        }
    }

    /// Drain the command channel without blocking.
    fn poll_commands(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(cmd) => self.handle(cmd),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    /// Mode of the cycle to run this tick, if any.
    fn next_mode(&self) -> Option<PipelineMode> {
        if self.manual_pending {
            Some(PipelineMode::ManualScanPending)
        } else if self.continuous {
            Some(PipelineMode::ContinuousScan)
        } else {
            None
        }
    }

    /// One loop iteration. Returns the description when a cycle ran.
    pub fn tick(&mut self) -> Option<RenderDescription> {
        self.poll_commands();
        if self.state != LoopState::Running {
            return None;
        }
        let mode = self.next_mode()?;
        let frame = match self.source.grab() {
            Ok(frame) => frame,
            Err(e) => {
                // A pending manual scan stays pending for the next tick.
                log::warn!("Frame capture failed. {}", e);
                return None;
            }
        };
        if mode.is_forced() {
            self.manual_pending = false;
        }
        let render = self.pipeline.process_cycle(&frame, mode, self.muted);
        self.presenter.present(&frame, &render);
        Some(render)
    }
}

/// Run the loop on the calling thread until a shutdown command arrives.
///
/// The camera handle stays on the thread that opened it.
pub fn run(mut scan_loop: ScanLoop, scan_rate_ms: u64) {
    let rate = Duration::from_millis(scan_rate_ms);
    scan_loop.start();
    while scan_loop.state() == LoopState::Running {
        let started = Instant::now();
        scan_loop.tick();
        // loop wait, no catching up on missed ticks
        thread::sleep(rate.saturating_sub(started.elapsed()));
    }
    log::info!("Scan loop stopped.");
}
