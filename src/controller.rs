//! Interaction controller.
//!
//! Owns the panel state machine. Pointer drags over the control grid mutate
//! the settings model; the preview process is only restarted once the
//! pointer is released, so a drag does not relaunch the external tool on
//! every intermediate sample. Capture actions stop the preview, run their
//! external process to completion (or cancellation), and hand the camera
//! back to the preview.
//!
//! Rendering of preview frames is the display layer's concern; this module
//! only manages the processes that produce them.

use std::time::{Duration, Instant};

use crate::capability::CameraCapability;
use crate::command::{self, CaptureCommand, CaptureIntent, TimelapseMode};
use crate::config::PanelConfig;
use crate::layout::{DragHit, Gesture, Layout, ReleaseHit};
use crate::pointer::{PointerSource, PointerState};
use crate::process::{interrupt_received, wait_for_file, CaptureError, CaptureProcess};
use crate::settings::{Field, Settings, CODEC_CONTAINERS, FOCUS_ASSIST, STILL_CONTAINERS};
use crate::{storage, store};

/// Control loop cadence.
const LOOP_INTERVAL: Duration = Duration::from_millis(100);

/// Minimum spacing between parameter adjustments while a drag is held.
const ADJUST_COOLDOWN: Duration = Duration::from_millis(250);

/// How long a still capture may run before it is abandoned.
const STILL_TIMEOUT: Duration = Duration::from_secs(30);

/// How long one controller-timed timelapse shot may run.
const SHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for an expected output file after the tool exits.
const OUTPUT_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Previewing,
    CapturingStill,
    RecordingVideo,
    RunningTimelapse,
    Exiting,
}

pub struct Controller {
    settings: Settings,
    capability: CameraCapability,
    panel: PanelConfig,
    layout: Layout,
    state: PanelState,
    preview: Option<CaptureProcess>,
    restart_pending: bool,
    last_adjust: Option<Instant>,
    adjust_cooldown: Duration,
    status: String,
}

impl Controller {
    pub fn new(settings: Settings, capability: CameraCapability, panel: PanelConfig) -> Self {
        let layout = Layout::new(panel.preview.width, panel.preview.height);
        Controller {
            settings,
            capability,
            panel,
            layout,
            state: PanelState::Previewing,
            preview: None,
            restart_pending: false,
            last_adjust: None,
            adjust_cooldown: ADJUST_COOLDOWN,
            status: String::new(),
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Run the control loop until an exit gesture or interrupt.
    pub fn run(&mut self, source: &mut dyn PointerSource) {
        self.start_preview();
        while self.state != PanelState::Exiting {
            self.tick(source);
            std::thread::sleep(LOOP_INTERVAL);
        }
    }

    /// One loop iteration: drain input, apply mutations, restart the preview
    /// if a mutation was deferred until release.
    pub fn tick(&mut self, source: &mut dyn PointerSource) {
        if interrupt_received() {
            self.shutdown();
            return;
        }

        let pointer = source.state();
        if pointer.pressed {
            self.apply_drag(pointer);
        }

        for (x, y) in source.take_releases() {
            self.handle_release(x, y, source);
            if self.state == PanelState::Exiting {
                return;
            }
        }

        if self.restart_pending && !source.state().pressed && self.state == PanelState::Previewing
        {
            self.start_preview();
        }
    }

    /// Terminate any running process and leave the loop.
    pub fn shutdown(&mut self) {
        self.stop_preview();
        self.state = PanelState::Exiting;
    }

    fn set_status(&mut self, message: String) {
        log::info!("{}", message);
        self.status = message;
    }

    // ----- parameter mutation -----

    fn apply_drag(&mut self, pointer: PointerState) {
        if self
            .last_adjust
            .is_some_and(|t| t.elapsed() < self.adjust_cooldown)
        {
            return;
        }
        let Some(hit) = self.layout.hit_drag(pointer.x, pointer.y) else {
            return;
        };
        match hit {
            DragHit::Adjust { field, gesture } => {
                if !self.adjustable(field) {
                    return;
                }
                self.apply_gesture(field, gesture);
                if affects_preview(field) {
                    self.restart_pending = true;
                }
            }
            DragHit::ZoomCell { right_half } => {
                self.apply_zoom_gesture(right_half);
            }
        }
        self.last_adjust = Some(Instant::now());
    }

    fn apply_gesture(&mut self, field: Field, gesture: Gesture) {
        match gesture {
            Gesture::Slider(fraction) => {
                let (min, max) = self.settings.limits(field, &self.capability);
                let span = (max + 1 - min) as f64;
                let value = min + (fraction * span) as i32;
                self.settings.set(field, value, &self.capability);
            }
            Gesture::Increment => self.settings.step(field, 1, &self.capability),
            Gesture::Decrement => self.settings.step(field, -1, &self.capability),
        }
    }

    /// Some controls only respond while the state they modify is active.
    fn adjustable(&self, field: Field) -> bool {
        match field {
            Field::ShutterIndex => self.settings.mode == 0,
            Field::Ev => self.settings.mode != 0,
            Field::RedGain | Field::BlueGain => self.settings.awb == 0,
            Field::VideoFormat | Field::Codec => self.settings.zoom == 0,
            Field::ShotCount => self.settings.interval_secs > 0,
            _ => true,
        }
    }

    /// Zoom stepping: the right half walks up the zoom stages, the left half
    /// walks down; at zoom 0 the left half enters focus-assist on cameras
    /// without their own autofocus, and any tap leaves focus-assist.
    fn apply_zoom_gesture(&mut self, right_half: bool) {
        let zoom = self.settings.zoom;
        if zoom == FOCUS_ASSIST {
            self.settings.set(Field::Zoom, 0, &self.capability);
        } else if right_half {
            self.settings.step(Field::Zoom, 1, &self.capability);
        } else if zoom > 0 {
            self.settings.step(Field::Zoom, -1, &self.capability);
        } else if !self.capability.has_autofocus {
            self.settings.set(Field::Zoom, FOCUS_ASSIST, &self.capability);
        } else {
            return;
        }
        self.restart_pending = true;
    }

    fn handle_release(&mut self, x: i32, y: i32, source: &mut dyn PointerSource) {
        match self.layout.hit_release(x, y) {
            ReleaseHit::CaptureStill => self.capture_still(),
            ReleaseHit::CaptureVideo => self.record_video(source),
            ReleaseHit::CaptureTimelapse => self.run_timelapse(source),
            ReleaseHit::SaveConfig => self.save_settings(),
            ReleaseHit::Exit => self.shutdown(),
            ReleaseHit::FocusPoint { x, y } => {
                if self.settings.zoom == 0 {
                    self.settings.set(Field::FocusX, x, &self.capability);
                    self.settings.set(Field::FocusY, y, &self.capability);
                }
            }
            ReleaseHit::Outside => {}
        }
    }

    fn save_settings(&mut self) {
        let record = self.settings.to_record();
        match store::save(&self.panel.paths.state_file, &record) {
            Ok(()) => self.set_status("settings saved".to_string()),
            Err(e) => self.set_status(format!("saving settings failed: {}", e)),
        }
    }

    // ----- preview lifecycle -----

    fn start_preview(&mut self) {
        self.stop_preview();
        storage::sweep_frames(&self.panel.paths.frame_dir);
        if let Err(e) = storage::ensure_dir(&self.panel.paths.frame_dir) {
            log::warn!("cannot create frame dir: {}", e);
        }
        let command = self.build(&CaptureIntent::Preview);
        log::debug!("preview: {}", command.display_line());
        match CaptureProcess::spawn(&command) {
            Ok(process) => {
                self.preview = Some(process);
                self.restart_pending = false;
                self.set_status("previewing".to_string());
            }
            Err(e) => {
                self.preview = None;
                self.restart_pending = false;
                self.set_status(format!("preview failed: {}", e));
            }
        }
    }

    fn stop_preview(&mut self) {
        if let Some(mut process) = self.preview.take() {
            process.terminate();
        }
    }

    fn build(&self, intent: &CaptureIntent) -> CaptureCommand {
        command::build(&self.settings, &self.capability, &self.panel, intent)
    }

    // ----- captures -----

    fn capture_still(&mut self) {
        self.state = PanelState::CapturingStill;
        self.stop_preview();
        self.set_status("taking still".to_string());

        let outcome = self.run_still_once(STILL_TIMEOUT);
        match outcome {
            Ok(path) => self.set_status(format!("saved {}", path.display())),
            Err(e) => self.set_status(format!("still capture failed: {}", e)),
        }

        self.state = PanelState::Previewing;
        self.restart_pending = true;
    }

    fn run_still_once(&mut self, timeout: Duration) -> Result<std::path::PathBuf, CaptureError> {
        storage::ensure_dir(&self.panel.paths.pictures_dir)?;
        let stamp = storage::timestamp();
        let container = STILL_CONTAINERS[self.settings.still_format as usize];
        let output = storage::still_path(&self.panel.paths.pictures_dir, &stamp, container);
        let command = self.build(&CaptureIntent::Still {
            output: output.clone(),
        });
        log::info!("still: {}", command.display_line());

        let mut process = CaptureProcess::spawn(&command)?;
        let status = process.wait_timeout(timeout)?;
        process.terminate();
        if let Some(status) = status {
            if !status.success() {
                return Err(CaptureError::ToolFailed { status });
            }
        }
        wait_for_file(&output, OUTPUT_WAIT)?;
        Ok(output)
    }

    fn record_video(&mut self, source: &mut dyn PointerSource) {
        self.state = PanelState::RecordingVideo;
        self.stop_preview();

        let outcome = (|| -> Result<std::path::PathBuf, CaptureError> {
            storage::ensure_dir(&self.panel.paths.videos_dir)?;
            let stamp = storage::timestamp();
            let container = CODEC_CONTAINERS[self.settings.codec as usize];
            let output = storage::video_path(&self.panel.paths.videos_dir, &stamp, container);
            let command = self.build(&CaptureIntent::Video {
                output: output.clone(),
            });
            log::info!("video: {}", command.display_line());

            let mut process = CaptureProcess::spawn(&command)?;
            self.set_status(format!("recording {}", output.display()));

            let deadline =
                Instant::now() + Duration::from_secs(self.settings.video_length_secs as u64);
            while Instant::now() < deadline {
                if interrupt_received() {
                    break;
                }
                if stop_requested(&self.layout, source, ReleaseHit::CaptureVideo) {
                    log::info!("video stopped by user");
                    break;
                }
                if !process.is_running() {
                    break;
                }
                std::thread::sleep(LOOP_INTERVAL);
            }
            process.terminate();
            wait_for_file(&output, OUTPUT_WAIT)?;
            Ok(output)
        })();

        match outcome {
            Ok(path) => self.set_status(format!("saved {}", path.display())),
            Err(e) => self.set_status(format!("video capture failed: {}", e)),
        }

        self.state = PanelState::Previewing;
        self.restart_pending = true;
    }

    fn run_timelapse(&mut self, source: &mut dyn PointerSource) {
        self.state = PanelState::RunningTimelapse;
        self.stop_preview();

        let mode = TimelapseMode::for_interval(self.settings.interval_secs);
        log::info!(
            "timelapse: interval {}s, {} shots, {:?}",
            self.settings.interval_secs,
            self.settings.shot_count,
            mode
        );
        let outcome = match mode {
            TimelapseMode::Burst => self.run_timelapse_stream(source, false),
            TimelapseMode::Segment => self.run_timelapse_stream(source, true),
            TimelapseMode::PerShot => self.run_timelapse_shots(source),
        };

        match outcome {
            Ok(()) => self.set_status("timelapse finished".to_string()),
            Err(e) => self.set_status(format!("timelapse failed: {}", e)),
        }

        self.state = PanelState::Previewing;
        self.restart_pending = true;
    }

    /// Tool-timed strategies: a single external process paces the sequence
    /// (`--timelapse` burst, or a segmented mjpeg stream at interval zero)
    /// while the controller only watches the clock and the stop button.
    fn run_timelapse_stream(
        &mut self,
        source: &mut dyn PointerSource,
        segment: bool,
    ) -> Result<(), CaptureError> {
        storage::ensure_dir(&self.panel.paths.pictures_dir)?;
        let stamp = storage::timestamp();
        let intent = if segment {
            CaptureIntent::TimelapseSegment {
                pattern: storage::sequence_pattern(&self.panel.paths.pictures_dir, &stamp, "jpg"),
            }
        } else {
            let container = STILL_CONTAINERS[self.settings.still_format as usize];
            CaptureIntent::TimelapseBurst {
                pattern: storage::sequence_pattern(
                    &self.panel.paths.pictures_dir,
                    &stamp,
                    container,
                ),
            }
        };
        let command = self.build(&intent);
        log::info!("timelapse: {}", command.display_line());

        let mut process = CaptureProcess::spawn(&command)?;
        let deadline =
            Instant::now() + Duration::from_secs(self.settings.duration_secs() as u64 + 1);
        while Instant::now() < deadline {
            if interrupt_received() {
                break;
            }
            if stop_requested(&self.layout, source, ReleaseHit::CaptureTimelapse) {
                log::info!("timelapse stopped by user");
                break;
            }
            if !process.is_running() {
                break;
            }
            std::thread::sleep(LOOP_INTERVAL);
        }
        process.terminate();
        Ok(())
    }

    /// Controller-timed strategy for long intervals: one capture process per
    /// shot, sleeping out the remainder of each interval.
    fn run_timelapse_shots(&mut self, source: &mut dyn PointerSource) -> Result<(), CaptureError> {
        storage::ensure_dir(&self.panel.paths.pictures_dir)?;
        let container = STILL_CONTAINERS[self.settings.still_format as usize];
        let shots = self.settings.shot_count;
        let interval = Duration::from_secs(self.settings.interval_secs as u64);

        'shots: for shot in 0..shots {
            let shot_start = Instant::now();
            let stamp = storage::timestamp();
            let output = storage::sequence_shot_path(
                &self.panel.paths.pictures_dir,
                &stamp,
                shot,
                container,
            );
            let command = self.build(&CaptureIntent::TimelapseShot {
                output: output.clone(),
            });

            let mut process = CaptureProcess::spawn(&command)?;
            let _ = process.wait_timeout(SHOT_TIMEOUT)?;
            process.terminate();
            wait_for_file(&output, OUTPUT_WAIT)?;
            self.set_status(format!("shot {}/{}: {}", shot + 1, shots, output.display()));

            while shot_start.elapsed() < interval && shot + 1 < shots {
                if interrupt_received()
                    || stop_requested(&self.layout, source, ReleaseHit::CaptureTimelapse)
                {
                    log::info!("timelapse stopped by user");
                    break 'shots;
                }
                std::thread::sleep(LOOP_INTERVAL);
            }
        }
        Ok(())
    }

    #[cfg(test)]
    fn without_adjust_cooldown(mut self) -> Self {
        self.adjust_cooldown = Duration::ZERO;
        self
    }
}

/// Fields whose value feeds the running preview stream; mutating them defers
/// a preview restart to the next pointer release.
fn affects_preview(field: Field) -> bool {
    matches!(
        field,
        Field::Mode
            | Field::ShutterIndex
            | Field::Gain
            | Field::Brightness
            | Field::Contrast
            | Field::Ev
            | Field::BlueGain
            | Field::RedGain
            | Field::Awb
            | Field::Saturation
            | Field::Metering
            | Field::Sharpness
            | Field::Denoise
    )
}

/// Drain pending releases and report whether any landed on `stop`.
fn stop_requested(
    layout: &Layout,
    source: &mut dyn PointerSource,
    stop: ReleaseHit,
) -> bool {
    source
        .take_releases()
        .iter()
        .any(|&(x, y)| layout.hit_release(x, y) == stop)
}
