//! Camera hardware detection.
//!
//! The attached camera is probed once at startup by asking the external still
//! tool for a single frame and inspecting the pixel width of the image it
//! writes. The width identifies the sensor generation, and a static table
//! maps the generation to the limits the settings model enforces for the rest
//! of the session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::CaptureCommand;
use crate::config::PanelConfig;
use crate::process::{wait_for_file, CaptureProcess};
use crate::settings::{MAX_H264_FORMAT, SHUTTERS};

/// How long the probe capture may take before we conclude no camera exists.
const PROBE_TIMEOUT: Duration = Duration::from_secs(8);

/// Sensor generations this panel knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraModel {
    /// No probe image appeared; the panel still runs, conservatively limited.
    NoCamera,
    /// OV5647, 2592x1944.
    V1,
    /// IMX219, 3280x2464.
    V2,
    /// IMX477 HQ, 4056x3040.
    Hq,
    /// Arducam IMX519 16MP autofocus, 4656x3496.
    Arducam16mp,
}

impl CameraModel {
    pub fn label(&self) -> &'static str {
        match self {
            CameraModel::NoCamera => "no camera",
            CameraModel::V1 => "Pi Camera v1",
            CameraModel::V2 => "Pi Camera v2",
            CameraModel::Hq => "Pi HQ Camera",
            CameraModel::Arducam16mp => "Arducam 16MP Autofocus",
        }
    }
}

/// Hardware-derived limits, established once per session and read-only after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraCapability {
    pub model: CameraModel,
    pub native_width: i32,
    pub native_height: i32,
    /// Longest exposure the sensor supports, in whole seconds.
    pub max_shutter_secs: i32,
    /// First shutter-table index reaching `max_shutter_secs`; indices past it
    /// are out of range for this camera.
    pub max_shutter_index: i32,
    pub has_autofocus: bool,
    /// Highest legal video-format index for codecs other than h264.
    max_uncompressed_format: i32,
}

impl CameraCapability {
    /// Limits for a known sensor generation.
    pub fn for_model(model: CameraModel) -> Self {
        let (native_width, native_height, max_shutter_secs, has_autofocus, max_uncompressed_format) =
            match model {
                CameraModel::NoCamera => (2592, 1944, 1, false, MAX_H264_FORMAT),
                CameraModel::V1 => (2592, 1944, 1, false, 5),
                CameraModel::V2 => (3280, 2464, 10, false, 6),
                CameraModel::Hq => (4056, 3040, 239, false, 7),
                CameraModel::Arducam16mp => (4656, 3496, 10, true, 8),
            };
        CameraCapability {
            model,
            native_width,
            native_height,
            max_shutter_secs,
            max_shutter_index: max_shutter_index(max_shutter_secs),
            has_autofocus,
            max_uncompressed_format,
        }
    }

    pub fn no_camera() -> Self {
        CameraCapability::for_model(CameraModel::NoCamera)
    }

    /// Highest legal video-format index for the given codec. H.264 is capped
    /// at 1080p on every sensor; the other codecs reach the sensor's native
    /// formats.
    pub fn max_video_format(&self, codec: i32) -> i32 {
        if codec > 0 {
            self.max_uncompressed_format
        } else {
            MAX_H264_FORMAT
        }
    }
}

/// First shutter-table index whose entry reaches `max_secs`.
fn max_shutter_index(max_secs: i32) -> i32 {
    let mut index = 0;
    while (max_secs as f64) > SHUTTERS[index] {
        index += 1;
    }
    index as i32
}

/// Classify a probe image width into a sensor generation.
pub fn classify_width(width: u32) -> Result<CameraModel, ProbeError> {
    match width {
        2592 => Ok(CameraModel::V1),
        3280 => Ok(CameraModel::V2),
        4056 => Ok(CameraModel::Hq),
        4656 => Ok(CameraModel::Arducam16mp),
        other => Err(ProbeError::UnknownSensor { width: other }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("capture tool '{tool}' not found; install libcamera-apps or set [tools] in the panel config")]
    ToolNotFound { tool: String },

    #[error("failed to run capture tool '{tool}': {source}")]
    ProbeFailed {
        tool: String,
        source: std::io::Error,
    },

    #[error("probe image {path:?} is unreadable: {source}")]
    BadProbeImage {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("probe image width {width} does not match any known sensor")]
    UnknownSensor { width: u32 },
}

/// Probe the attached camera and derive its capability.
///
/// A missing probe image means no camera is connected, which is a usable
/// (if limited) configuration, not an error. An image of unrecognized width
/// is an error: guessing limits for unknown hardware corrupts every range
/// check downstream.
pub fn detect(config: &PanelConfig) -> Result<CameraCapability, ProbeError> {
    let probe_path = std::env::temp_dir().join("picam-panel-probe.jpg");
    if probe_path.exists() {
        let _ = std::fs::remove_file(&probe_path);
    }

    let command = CaptureCommand {
        program: config.tools.probe.clone(),
        args: vec![
            "-n".into(),
            "-t".into(),
            "1000".into(),
            "-e".into(),
            "jpg".into(),
            "-o".into(),
            probe_path.to_string_lossy().into_owned(),
        ],
    };

    log::info!("probing camera with {}", config.tools.probe);
    let mut probe = CaptureProcess::spawn(&command).map_err(|e| match e {
        crate::process::CaptureError::ToolNotFound(tool) => ProbeError::ToolNotFound { tool },
        other => ProbeError::ProbeFailed {
            tool: config.tools.probe.clone(),
            source: std::io::Error::other(other.to_string()),
        },
    })?;
    let _ = probe.wait_timeout(PROBE_TIMEOUT);
    probe.terminate();

    if wait_for_file(&probe_path, Duration::from_secs(2)).is_err() {
        log::warn!("no probe image appeared; continuing without a camera");
        return Ok(CameraCapability::no_camera());
    }

    let capability = capability_from_probe(&probe_path)?;
    let _ = std::fs::remove_file(&probe_path);
    log::info!(
        "detected {} ({}x{})",
        capability.model.label(),
        capability.native_width,
        capability.native_height
    );
    Ok(capability)
}

fn capability_from_probe(path: &Path) -> Result<CameraCapability, ProbeError> {
    let (width, _height) = image::image_dimensions(path).map_err(|e| ProbeError::BadProbeImage {
        path: path.to_path_buf(),
        source: e,
    })?;
    let model = classify_width(width)?;
    Ok(CameraCapability::for_model(model))
}
