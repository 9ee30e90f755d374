//! Capture command construction.
//!
//! Pure mapping from the settings model, the detected capability and a
//! capture intent to an external-process invocation. Nothing here spawns
//! anything; identical inputs always produce an identical argument vector,
//! and the numeric formatting (fixed-point /100 and /10 values, microsecond
//! shutter times, normalized ROI fractions) matches what the libcamera tools
//! parse.

use std::path::PathBuf;

use crate::capability::CameraCapability;
use crate::config::PanelConfig;
use crate::settings::{
    Settings, AWB_MODES, CODECS, DENOISE_MODES, FOCUS_ASSIST, METERING_MODES, MODES, STILL_FORMATS,
};

/// Exposures beyond this make the auto algorithms misbehave; gain and AWB are
/// pinned flat and the tool is told to skip its convergence frames.
const LONG_EXPOSURE_GUARD_MICROS: i64 = 5_000_000;

/// Preview streams cap the shutter so the panel stays responsive.
const PREVIEW_SHUTTER_CAP_MICROS: i64 = 6_000_000;

/// An external-process invocation: program name plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl CaptureCommand {
    /// Single-line rendering for logs.
    pub fn display_line(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

/// What the controller wants captured. Output paths are chosen by the caller
/// so the builder stays a pure function of its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureIntent {
    /// Continuous mjpeg frame stream into the frame directory.
    Preview,
    Still {
        output: PathBuf,
    },
    Video {
        output: PathBuf,
    },
    /// Tool-timed sequence; `pattern` contains a `%04d` placeholder.
    TimelapseBurst {
        pattern: String,
    },
    /// One shot of a controller-timed sequence.
    TimelapseShot {
        output: PathBuf,
    },
    /// Interval-zero timelapse: a segmented mjpeg stream.
    TimelapseSegment {
        pattern: String,
    },
}

/// Execution strategy for a timelapse, chosen by interval length.
///
/// Short intervals need the tool's own `--timelapse` spacing: spawning one
/// process per shot takes seconds and cannot keep up. Long intervals use the
/// per-shot loop so the controller can show each frame and stay responsive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelapseMode {
    Segment,
    Burst,
    PerShot,
}

impl TimelapseMode {
    pub fn for_interval(interval_secs: i32) -> Self {
        if interval_secs == 0 {
            TimelapseMode::Segment
        } else if interval_secs < 20 {
            TimelapseMode::Burst
        } else {
            TimelapseMode::PerShot
        }
    }
}

/// Build the invocation for `intent` from the current state.
pub fn build(
    settings: &Settings,
    cap: &CameraCapability,
    panel: &PanelConfig,
    intent: &CaptureIntent,
) -> CaptureCommand {
    match intent {
        CaptureIntent::Preview => build_preview(settings, cap, panel),
        CaptureIntent::Still { output } => build_still(settings, cap, panel, output, 5000),
        CaptureIntent::Video { output } => build_video(settings, cap, panel, output),
        CaptureIntent::TimelapseBurst { pattern } => build_burst(settings, cap, panel, pattern),
        CaptureIntent::TimelapseShot { output } => build_still(settings, cap, panel, output, 1000),
        CaptureIntent::TimelapseSegment { pattern } => {
            build_segment(settings, cap, panel, pattern)
        }
    }
}

fn build_preview(settings: &Settings, cap: &CameraCapability, panel: &PanelConfig) -> CaptureCommand {
    let (pw, ph) = settings.preview_size();
    let mut args: Vec<String> = vec![
        "-n".into(),
        "--codec".into(),
        "mjpeg".into(),
        "-t".into(),
        "0".into(),
        "--segment".into(),
        "100".into(),
    ];

    let (width, height) = if cap.has_autofocus {
        // The Arducam previews poorly below its binned 1920x1440 mode.
        (1920, 1440)
    } else if pw == 640 && ph == 480 {
        (720, 540)
    } else {
        (pw, ph)
    };
    push_pair(&mut args, "--width", width.to_string());
    push_pair(&mut args, "--height", height.to_string());
    push_pair(
        &mut args,
        "-o",
        panel
            .paths
            .frame_dir
            .join("frame_%d.jpg")
            .to_string_lossy()
            .into_owned(),
    );

    push_quality(&mut args, settings);

    if settings.mode == 0 {
        let shutter = settings.exposure_micros().min(PREVIEW_SHUTTER_CAP_MICROS);
        push_pair(&mut args, "--shutter", shutter.to_string());
        push_pair(
            &mut args,
            "--framerate",
            fraction(1_000_000.0 / shutter as f64),
        );
    } else {
        push_pair(&mut args, "--exposure", MODES[settings.mode as usize].into());
    }
    push_ev(&mut args, settings);
    push_gain_awb(&mut args, settings);
    push_tail(&mut args, settings, cap);
    push_roi(&mut args, settings, cap);

    CaptureCommand {
        program: panel.tools.video.clone(),
        args,
    }
}

fn build_still(
    settings: &Settings,
    cap: &CameraCapability,
    panel: &PanelConfig,
    output: &PathBuf,
    timeout_ms: i64,
) -> CaptureCommand {
    let (pw, ph) = settings.preview_size();
    let format = STILL_FORMATS[settings.still_format as usize];
    let mut args: Vec<String> = Vec::new();

    if format == "raw" {
        args.push("-r".into());
    } else {
        push_pair(&mut args, "-e", format.into());
    }
    args.push("-n".into());
    push_pair(&mut args, "-t", timeout_ms.to_string());
    push_pair(&mut args, "-o", output.to_string_lossy().into_owned());
    if format == "raw" && pw == 640 && ph == 480 && settings.zoom == FOCUS_ASSIST {
        args.push("--rawfull".into());
    }

    push_quality(&mut args, settings);

    if settings.zoom > 0 {
        push_pair(&mut args, "--width", pw.to_string());
        push_pair(&mut args, "--height", ph.to_string());
    }
    if format == "jpg" && pw == 640 && ph == 480 && settings.zoom == FOCUS_ASSIST {
        args.push("-r".into());
        args.push("--rawfull".into());
    }

    push_exposure(&mut args, settings);
    push_ev(&mut args, settings);
    push_gain_awb(&mut args, settings);
    push_tail(&mut args, settings, cap);
    push_roi(&mut args, settings, cap);

    CaptureCommand {
        program: panel.tools.still.clone(),
        args,
    }
}

fn build_video(
    settings: &Settings,
    cap: &CameraCapability,
    panel: &PanelConfig,
    output: &PathBuf,
) -> CaptureCommand {
    let (pw, ph) = settings.preview_size();
    let (vw, vh) = settings.video_size();
    let mut args: Vec<String> = Vec::new();

    push_pair(&mut args, "-t", (settings.video_length_secs as i64 * 1000).to_string());
    push_pair(&mut args, "-o", output.to_string_lossy().into_owned());
    push_pair(&mut args, "--framerate", settings.video_fps.to_string());
    if settings.codec != 0 {
        push_pair(&mut args, "--codec", CODECS[settings.codec as usize].into());
    }

    push_quality(&mut args, settings);

    if settings.zoom > 0 {
        push_pair(&mut args, "--width", pw.to_string());
        push_pair(&mut args, "--height", ph.to_string());
    } else {
        push_pair(&mut args, "--width", vw.to_string());
        push_pair(&mut args, "--height", vh.to_string());
    }

    push_exposure(&mut args, settings);
    // Video never pins the long-exposure overrides: recording at multi-second
    // shutter speeds is already degenerate and the user asked for it.
    push_pair(&mut args, "--gain", settings.gain.to_string());
    push_ev(&mut args, settings);
    push_awb(&mut args, settings);
    push_tail(&mut args, settings, cap);
    push_pair(&mut args, "-p", format!("0,0,{},{}", pw, ph));
    push_roi(&mut args, settings, cap);

    CaptureCommand {
        program: panel.tools.video.clone(),
        args,
    }
}

fn build_burst(
    settings: &Settings,
    cap: &CameraCapability,
    panel: &PanelConfig,
    pattern: &str,
) -> CaptureCommand {
    let (pw, ph) = settings.preview_size();
    let format = STILL_FORMATS[settings.still_format as usize];
    let duration = settings.duration_secs() as i64;
    let mut args: Vec<String> = Vec::new();

    if format == "raw" {
        args.push("-r".into());
        args.push("-n".into());
        push_pair(&mut args, "-t", (duration * 1000).to_string());
    } else {
        push_pair(&mut args, "-e", format.into());
        args.push("-n".into());
        // One extra second so the final scheduled shot still fires.
        push_pair(&mut args, "-t", ((duration + 1) * 1000).to_string());
    }
    push_pair(
        &mut args,
        "--timelapse",
        (settings.interval_secs as i64 * 1000).to_string(),
    );
    push_pair(&mut args, "-o", pattern.into());
    if format == "raw" && pw == 640 && ph == 480 && settings.zoom == FOCUS_ASSIST {
        args.push("--rawfull".into());
    }

    push_quality(&mut args, settings);

    if format == "jpg" && pw == 640 && ph == 480 && settings.zoom == FOCUS_ASSIST {
        args.push("-r".into());
        args.push("--rawfull".into());
    }
    if settings.zoom > 0 {
        push_pair(&mut args, "--width", pw.to_string());
        push_pair(&mut args, "--height", ph.to_string());
    }

    push_exposure(&mut args, settings);
    push_ev(&mut args, settings);
    push_gain_awb(&mut args, settings);
    push_tail(&mut args, settings, cap);
    push_roi(&mut args, settings, cap);

    CaptureCommand {
        program: panel.tools.still.clone(),
        args,
    }
}

fn build_segment(
    settings: &Settings,
    cap: &CameraCapability,
    panel: &PanelConfig,
    pattern: &str,
) -> CaptureCommand {
    let (vw, vh) = settings.video_size();
    let duration = settings.duration_secs().max(1) as i64;
    let mut args: Vec<String> = vec!["-n".into(), "--codec".into(), "mjpeg".into()];
    push_pair(&mut args, "-t", (duration * 1000).to_string());
    push_pair(&mut args, "--segment", "1".into());
    push_pair(&mut args, "-o", pattern.into());

    if vw == 640 && vh == 480 {
        push_pair(&mut args, "--width", "720".into());
        push_pair(&mut args, "--height", "540".into());
    } else {
        push_pair(&mut args, "--width", vw.to_string());
        push_pair(&mut args, "--height", vh.to_string());
    }

    push_quality(&mut args, settings);

    if settings.mode == 0 {
        let shutter = settings.exposure_micros();
        push_pair(&mut args, "--shutter", shutter.to_string());
        push_pair(
            &mut args,
            "--framerate",
            fraction(1_000_000.0 / shutter as f64),
        );
    } else {
        push_pair(&mut args, "--exposure", MODES[settings.mode as usize].into());
        push_pair(&mut args, "--framerate", settings.video_fps.to_string());
    }
    push_ev(&mut args, settings);
    push_gain_awb(&mut args, settings);
    push_tail(&mut args, settings, cap);
    push_roi(&mut args, settings, cap);

    CaptureCommand {
        program: panel.tools.video.clone(),
        args,
    }
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: String) {
    args.push(flag.to_string());
    args.push(value);
}

fn push_quality(args: &mut Vec<String>, settings: &Settings) {
    push_pair(args, "--brightness", fixed(settings.brightness, 100));
    push_pair(args, "--contrast", fixed(settings.contrast, 100));
}

fn push_exposure(args: &mut Vec<String>, settings: &Settings) {
    if settings.mode == 0 {
        push_pair(args, "--shutter", settings.exposure_micros().to_string());
    } else {
        push_pair(args, "--exposure", MODES[settings.mode as usize].into());
    }
}

fn push_ev(args: &mut Vec<String>, settings: &Settings) {
    if settings.ev != 0 {
        push_pair(args, "--ev", settings.ev.to_string());
    }
}

/// Gain and white balance, mutually exclusive with the long-exposure guard.
fn push_gain_awb(args: &mut Vec<String>, settings: &Settings) {
    if settings.mode == 0 && settings.exposure_micros() > LONG_EXPOSURE_GUARD_MICROS {
        push_pair(args, "--gain", "1".into());
        push_pair(args, "--awbgain", "1,1".into());
        args.push("--immediate".into());
        return;
    }
    push_pair(args, "--gain", settings.gain.to_string());
    push_awb(args, settings);
}

/// Manual red/blue gains when AWB is off, a named algorithm otherwise.
fn push_awb(args: &mut Vec<String>, settings: &Settings) {
    if settings.awb == 0 {
        push_pair(
            args,
            "--awbgains",
            format!("{},{}", fixed(settings.red_gain, 10), fixed(settings.blue_gain, 10)),
        );
    } else {
        push_pair(args, "--awb", AWB_MODES[settings.awb as usize].into());
    }
}

fn push_tail(args: &mut Vec<String>, settings: &Settings, cap: &CameraCapability) {
    push_pair(args, "--metering", METERING_MODES[settings.metering as usize].into());
    push_pair(args, "--saturation", fixed(settings.saturation, 10));
    push_pair(args, "--sharpness", settings.sharpness.to_string());
    push_pair(args, "--denoise", DENOISE_MODES[settings.denoise as usize].into());
    if cap.has_autofocus {
        args.push("--autofocus".into());
    }
}

fn push_roi(args: &mut Vec<String>, settings: &Settings, cap: &CameraCapability) {
    if let Some((x, y, w, h)) = settings.roi(cap) {
        push_pair(
            args,
            "--roi",
            format!("{},{},{},{}", fraction(x), fraction(y), fraction(w), fraction(h)),
        );
    }
}

/// Fixed-point emission: the stored integer divided down to the decimal the
/// tool expects, e.g. contrast 70 -> "0.7", saturation 15 -> "1.5".
fn fixed(value: i32, divisor: i32) -> String {
    fraction(f64::from(value) / f64::from(divisor))
}

fn fraction(value: f64) -> String {
    format!("{}", value)
}
