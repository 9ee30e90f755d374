//! Camera settings model.
//!
//! Every adjustable parameter is stored as a raw integer. `set` clamps into
//! the field's limits (some of which depend on the detected camera), and the
//! cross-field rules (exposure time, timelapse triangle, format/fps caps) are
//! re-applied after each mutation. This layer never rejects input and never
//! performs I/O.

use crate::capability::CameraCapability;

/// Exposure mode names, emitted as `--exposure` values.
pub const MODES: [&str; 3] = ["manual", "normal", "sport"];

/// Still encodings, emitted as `-e` values.
pub const STILL_FORMATS: [&str; 6] = ["jpg", "png", "bmp", "rgb", "yuv420", "raw"];

/// Container extension written to disk for each still encoding.
pub const STILL_CONTAINERS: [&str; 6] = ["jpg", "png", "bmp", "data", "data", "jpg"];

/// Video format tables, indexed by the `video_format` setting.
pub const VIDEO_WIDTHS: [i32; 9] = [640, 800, 1280, 1280, 1920, 2592, 3280, 4056, 4656];
pub const VIDEO_HEIGHTS: [i32; 9] = [480, 600, 720, 960, 1080, 1944, 2464, 3040, 3496];
pub const VIDEO_MAX_FPS: [i32; 9] = [90, 40, 40, 40, 30, 20, 20, 20, 20];

/// Video codecs, emitted as `--codec` values.
pub const CODECS: [&str; 3] = ["h264", "mjpeg", "yuv420"];

/// Container extension for each codec.
pub const CODEC_CONTAINERS: [&str; 3] = ["h264", "mjpeg", "data"];

pub const METERING_MODES: [&str; 3] = ["centre", "spot", "average"];

/// AWB algorithm names. Index 0 selects manual red/blue gains instead.
pub const AWB_MODES: [&str; 8] = [
    "off",
    "auto",
    "incandescent",
    "tungsten",
    "fluorescent",
    "indoor",
    "daylight",
    "cloudy",
];

pub const DENOISE_MODES: [&str; 4] = ["off", "cdn_off", "cdn_fast", "cdn_hq"];

/// Exposure-time codes. Negative entries denote `1/|v|` seconds, non-negative
/// entries whole or fractional seconds. The table is ordered fastest to
/// slowest; the detected camera caps the usable suffix.
pub const SHUTTERS: [f64; 66] = [
    -2000.0, -1600.0, -1250.0, -1000.0, -800.0, -640.0, -500.0, -400.0, -320.0, -288.0, -250.0,
    -240.0, -200.0, -160.0, -144.0, -125.0, -120.0, -100.0, -96.0, -80.0, -60.0, -50.0, -48.0,
    -40.0, -30.0, -25.0, -20.0, -15.0, -13.0, -10.0, -8.0, -6.0, -5.0, -4.0, -3.0, 0.4, 0.5, 0.6,
    0.8, 1.0, 1.1, 1.2, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 15.0, 20.0, 25.0, 30.0,
    40.0, 50.0, 60.0, 75.0, 100.0, 120.0, 150.0, 200.0, 220.0, 230.0, 239.0,
];

/// Zoom value that selects the focus-assist crop instead of a zoom stage.
pub const FOCUS_ASSIST: i32 = 10;

/// Highest progressive zoom stage.
pub const MAX_ZOOM: i32 = 4;

/// H.264 cannot encode above 1920x1080, so format indices past this are only
/// legal for the other codecs.
pub const MAX_H264_FORMAT: i32 = 4;

/// Convert a shutter-table entry to whole microseconds.
///
/// Truncates, then rounds up when the fractional remainder exceeds 0.5.
pub fn exposure_micros(entry: f64) -> i64 {
    let seconds = if entry < 0.0 { 1.0 / entry.abs() } else { entry };
    let micros = seconds * 1_000_000.0;
    let mut out = micros as i64;
    if micros - out as f64 > 0.5 {
        out += 1;
    }
    out
}

/// A single addressable setting.
///
/// The first 24 variants, in `RECORD_FIELDS` order, form the persisted
/// record. `Duration` is edited through the panel but always derived from
/// interval and shot count, so it is not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Mode,
    ShutterIndex,
    Gain,
    Brightness,
    Contrast,
    Fullscreen,
    RedGain,
    BlueGain,
    Ev,
    VideoLength,
    VideoFps,
    VideoFormat,
    Codec,
    Interval,
    ShotCount,
    StillFormat,
    FocusX,
    FocusY,
    Zoom,
    Saturation,
    Metering,
    Awb,
    Sharpness,
    Denoise,
    Duration,
}

/// Persisted field order. Must never be reordered; the on-disk record is
/// positional.
pub const RECORD_FIELDS: [Field; 24] = [
    Field::Mode,
    Field::ShutterIndex,
    Field::Gain,
    Field::Brightness,
    Field::Contrast,
    Field::Fullscreen,
    Field::RedGain,
    Field::BlueGain,
    Field::Ev,
    Field::VideoLength,
    Field::VideoFps,
    Field::VideoFormat,
    Field::Codec,
    Field::Interval,
    Field::ShotCount,
    Field::StillFormat,
    Field::FocusX,
    Field::FocusY,
    Field::Zoom,
    Field::Saturation,
    Field::Metering,
    Field::Awb,
    Field::Sharpness,
    Field::Denoise,
];

/// Normalized region-of-interest rectangle: x offset, y offset, width
/// fraction, height fraction, all in 0..=1 of the sensor's field of view.
pub type Roi = (f64, f64, f64, f64);

/// The full parameter state of the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mode: i32,
    pub shutter_index: i32,
    pub gain: i32,
    pub brightness: i32,
    pub contrast: i32,
    pub fullscreen: i32,
    pub red_gain: i32,
    pub blue_gain: i32,
    pub ev: i32,
    pub video_length_secs: i32,
    pub video_fps: i32,
    pub video_format: i32,
    pub codec: i32,
    pub interval_secs: i32,
    pub shot_count: i32,
    pub still_format: i32,
    pub focus_x: i32,
    pub focus_y: i32,
    pub zoom: i32,
    pub saturation: i32,
    pub metering: i32,
    pub awb: i32,
    pub sharpness: i32,
    pub denoise: i32,
    duration_secs: i32,
    preview_width: i32,
    preview_height: i32,
}

impl Settings {
    /// Factory defaults, as shipped before any record exists.
    pub fn defaults(preview_width: i32, preview_height: i32) -> Self {
        let mut s = Settings {
            mode: 1,
            shutter_index: 13,
            gain: 0,
            brightness: 0,
            contrast: 70,
            fullscreen: 0,
            red_gain: 15,
            blue_gain: 12,
            ev: 0,
            video_length_secs: 10,
            video_fps: 25,
            video_format: 4,
            codec: 0,
            interval_secs: 5,
            shot_count: 5,
            still_format: 0,
            focus_x: preview_width / 2,
            focus_y: preview_height / 2,
            zoom: 0,
            saturation: 10,
            metering: 0,
            awb: 1,
            sharpness: 1,
            denoise: 0,
            duration_secs: 0,
            preview_width,
            preview_height,
        };
        s.recompute_duration();
        s
    }

    /// Rebuild state from a persisted record (see `RECORD_FIELDS` order).
    pub fn from_record(record: &[i32; 24], preview_width: i32, preview_height: i32) -> Self {
        let mut s = Settings::defaults(preview_width, preview_height);
        for (field, value) in RECORD_FIELDS.iter().zip(record.iter()) {
            s.assign(*field, *value);
        }
        s.recompute_duration();
        s
    }

    /// Snapshot the persisted fields in record order.
    pub fn to_record(&self) -> [i32; 24] {
        let mut record = [0i32; 24];
        for (slot, field) in record.iter_mut().zip(RECORD_FIELDS.iter()) {
            *slot = self.get(*field);
        }
        record
    }

    pub fn get(&self, field: Field) -> i32 {
        match field {
            Field::Mode => self.mode,
            Field::ShutterIndex => self.shutter_index,
            Field::Gain => self.gain,
            Field::Brightness => self.brightness,
            Field::Contrast => self.contrast,
            Field::Fullscreen => self.fullscreen,
            Field::RedGain => self.red_gain,
            Field::BlueGain => self.blue_gain,
            Field::Ev => self.ev,
            Field::VideoLength => self.video_length_secs,
            Field::VideoFps => self.video_fps,
            Field::VideoFormat => self.video_format,
            Field::Codec => self.codec,
            Field::Interval => self.interval_secs,
            Field::ShotCount => self.shot_count,
            Field::StillFormat => self.still_format,
            Field::FocusX => self.focus_x,
            Field::FocusY => self.focus_y,
            Field::Zoom => self.zoom,
            Field::Saturation => self.saturation,
            Field::Metering => self.metering,
            Field::Awb => self.awb,
            Field::Sharpness => self.sharpness,
            Field::Denoise => self.denoise,
            Field::Duration => self.duration_secs,
        }
    }

    /// Inclusive limits for a field. Shutter, format and fps limits depend on
    /// the detected camera and the current codec/format selection.
    pub fn limits(&self, field: Field, cap: &CameraCapability) -> (i32, i32) {
        match field {
            Field::Mode => (0, MODES.len() as i32 - 1),
            Field::ShutterIndex => (0, cap.max_shutter_index),
            Field::Gain => (0, 20),
            Field::Brightness => (-100, 100),
            Field::Contrast => (0, 200),
            Field::Fullscreen => (0, 1),
            Field::RedGain => (1, 80),
            Field::BlueGain => (1, 80),
            Field::Ev => (-10, 10),
            Field::VideoLength => (1, 999),
            Field::VideoFps => (1, VIDEO_MAX_FPS[self.video_format as usize]),
            Field::VideoFormat => (0, cap.max_video_format(self.codec)),
            Field::Codec => (0, CODECS.len() as i32 - 1),
            Field::Interval => (0, 999),
            Field::ShotCount => (1, 999),
            Field::StillFormat => (0, STILL_FORMATS.len() as i32 - 1),
            Field::FocusX => (0, self.preview_width),
            Field::FocusY => (0, self.preview_height),
            Field::Zoom => (0, MAX_ZOOM),
            Field::Saturation => (0, 20),
            Field::Metering => (0, METERING_MODES.len() as i32 - 1),
            Field::Awb => (0, AWB_MODES.len() as i32 - 1),
            Field::Sharpness => (0, 4),
            Field::Denoise => (0, DENOISE_MODES.len() as i32 - 1),
            Field::Duration => (1, 9999),
        }
    }

    /// Clamp `raw` into the field's limits, assign it, and re-derive the
    /// dependent fields. Out-of-range input is clamped, never an error: drag
    /// gestures routinely overshoot.
    pub fn set(&mut self, field: Field, raw: i32, cap: &CameraCapability) {
        let (min, max) = self.limits(field, cap);
        // The focus-assist sentinel bypasses the zoom stage range.
        let value = if field == Field::Zoom && raw == FOCUS_ASSIST {
            FOCUS_ASSIST
        } else {
            raw.clamp(min, max)
        };
        self.assign(field, value);
        self.derive(field, cap);
    }

    /// Step a field by `delta`, with the same clamping and derivation.
    pub fn step(&mut self, field: Field, delta: i32, cap: &CameraCapability) {
        self.set(field, self.get(field) + delta, cap);
    }

    fn assign(&mut self, field: Field, value: i32) {
        match field {
            Field::Mode => self.mode = value,
            Field::ShutterIndex => self.shutter_index = value,
            Field::Gain => self.gain = value,
            Field::Brightness => self.brightness = value,
            Field::Contrast => self.contrast = value,
            Field::Fullscreen => self.fullscreen = value,
            Field::RedGain => self.red_gain = value,
            Field::BlueGain => self.blue_gain = value,
            Field::Ev => self.ev = value,
            Field::VideoLength => self.video_length_secs = value,
            Field::VideoFps => self.video_fps = value,
            Field::VideoFormat => self.video_format = value,
            Field::Codec => self.codec = value,
            Field::Interval => self.interval_secs = value,
            Field::ShotCount => self.shot_count = value,
            Field::StillFormat => self.still_format = value,
            Field::FocusX => self.focus_x = value,
            Field::FocusY => self.focus_y = value,
            Field::Zoom => self.zoom = value,
            Field::Saturation => self.saturation = value,
            Field::Metering => self.metering = value,
            Field::Awb => self.awb = value,
            Field::Sharpness => self.sharpness = value,
            Field::Denoise => self.denoise = value,
            Field::Duration => self.duration_secs = value,
        }
    }

    /// Re-apply cross-field rules after `changed` was mutated.
    fn derive(&mut self, changed: Field, cap: &CameraCapability) {
        match changed {
            Field::Mode | Field::ShutterIndex => {
                self.floor_interval_to_exposure();
                self.recompute_duration();
            }
            Field::VideoFormat => {
                self.video_fps = self.video_fps.min(VIDEO_MAX_FPS[self.video_format as usize]);
            }
            Field::Codec => {
                self.video_format = self.video_format.min(cap.max_video_format(self.codec));
                self.video_fps = self.video_fps.min(VIDEO_MAX_FPS[self.video_format as usize]);
            }
            Field::Interval => {
                self.floor_interval_to_exposure();
                self.recompute_duration();
            }
            Field::ShotCount => {
                self.recompute_duration();
            }
            Field::Duration => {
                if self.interval_secs > 0 {
                    self.shot_count = (self.duration_secs / self.interval_secs).max(1);
                }
            }
            Field::FocusX | Field::FocusY => {
                self.clamp_focus_point(cap);
            }
            _ => {}
        }
    }

    /// Re-clamp every field once the capability is known: a record saved
    /// against a different camera (or corrupted in place) must land back
    /// inside this session's limits before anything indexes the tables.
    pub fn reconcile(&mut self, cap: &CameraCapability) {
        // Codec and format first: the fps limit reads the format tables, and
        // the format ceiling reads the codec.
        self.codec = self.codec.clamp(0, CODECS.len() as i32 - 1);
        self.video_format = self
            .video_format
            .clamp(0, cap.max_video_format(self.codec));
        for field in RECORD_FIELDS {
            let value = self.get(field);
            if field == Field::Zoom && value == FOCUS_ASSIST {
                continue;
            }
            let (min, max) = self.limits(field, cap);
            self.assign(field, value.clamp(min, max));
        }
        if self.zoom == FOCUS_ASSIST && cap.has_autofocus {
            self.zoom = 0;
        }
        self.clamp_focus_point(cap);
        self.floor_interval_to_exposure();
        self.recompute_duration();
    }

    /// Derived exposure time in microseconds for the current shutter index.
    pub fn exposure_micros(&self) -> i64 {
        exposure_micros(SHUTTERS[self.shutter_index as usize])
    }

    /// Human-readable shutter time, e.g. `1/125` or `2`.
    pub fn shutter_label(&self) -> String {
        let entry = SHUTTERS[self.shutter_index as usize];
        if entry < 0.0 {
            format!("1/{}", entry.abs() as i64)
        } else {
            format!("{}", entry)
        }
    }

    pub fn duration_secs(&self) -> i32 {
        self.duration_secs
    }

    pub fn preview_size(&self) -> (i32, i32) {
        (self.preview_width, self.preview_height)
    }

    /// Current video frame size from the format tables.
    pub fn video_size(&self) -> (i32, i32) {
        (
            VIDEO_WIDTHS[self.video_format as usize],
            VIDEO_HEIGHTS[self.video_format as usize],
        )
    }

    /// A single exposure cannot be shorter than the timelapse interval, so a
    /// long manual shutter drags the interval up with it.
    fn floor_interval_to_exposure(&mut self) {
        if self.mode != 0 || self.interval_secs == 0 {
            return;
        }
        let micros = self.exposure_micros();
        let seconds = micros as f64 / 1_000_000.0;
        let floor = if micros <= 6_000_000 {
            (seconds * 6.33).ceil() as i32
        } else {
            seconds.ceil() as i32
        };
        self.interval_secs = self.interval_secs.max(floor);
    }

    /// Timelapse triangle: duration tracks interval x shots while the
    /// interval is nonzero.
    fn recompute_duration(&mut self) {
        if self.interval_secs > 0 {
            self.duration_secs = (self.interval_secs * self.shot_count).max(1);
        }
    }

    /// Keep the focus rectangle fully inside the preview raster so the
    /// focus-assist crop never leaves the sensor. The bounds round inward;
    /// rounding outward would let the crop spill past the far edge by a
    /// fraction of a pixel.
    fn clamp_focus_point(&mut self, cap: &CameraCapability) {
        let pw = self.preview_width as f64;
        let ph = self.preview_height as f64;
        let half_x = (pw / 2.0) / (cap.native_width as f64 / pw);
        let half_y = (ph / 2.0) / (cap.native_height as f64 / ph);
        self.focus_x = self
            .focus_x
            .clamp(half_x.ceil() as i32, (pw - half_x).floor() as i32);
        self.focus_y = self
            .focus_y
            .clamp(half_y.ceil() as i32, (ph - half_y).floor() as i32);
    }

    /// Normalized crop rectangle for the current zoom state, clipped to the
    /// sensor. `None` when no crop applies.
    pub fn roi(&self, cap: &CameraCapability) -> Option<Roi> {
        let igw = cap.native_width as f64;
        let igh = cap.native_height as f64;
        let pw = self.preview_width as f64;
        let ph = self.preview_height as f64;
        if self.zoom > 0 && self.zoom < FOCUS_ASSIST {
            let mut zwidth = pw * (5 - self.zoom) as f64;
            if zwidth > igw {
                zwidth = igw - (igw / 20.0).floor();
            }
            let mut zheight = ph * (5 - self.zoom) as f64;
            if zheight > igh {
                zheight = igh - (igh / 20.0).floor();
            }
            let zxo = ((igw - zwidth) / 2.0) / igw;
            let zyo = ((igh - zheight) / 2.0) / igh;
            Some((zxo, zyo, zwidth / igw, zheight / igh))
        } else if self.zoom == FOCUS_ASSIST {
            let zxo = (self.focus_x as f64 - (pw / 2.0) / (igw / pw)) / pw;
            let zyo = (self.focus_y as f64 - (ph / 2.0) / (igh / ph)) / ph;
            Some((zxo.max(0.0), zyo.max(0.0), pw / igw, ph / igh))
        } else {
            None
        }
    }
}
