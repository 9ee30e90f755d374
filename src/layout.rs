//! Control grid geometry and pointer hit-testing.
//!
//! The panel is two columns of thirteen button cells to the right of the
//! preview raster. Cell size derives from the preview size, so the decode is
//! deterministic for a given geometry. Each parameter cell has three zones:
//! a slider strip along the top edge (absolute set from the x fraction), a
//! step zone below it (left half decrements, right half increments), and a
//! dead sliver at the bottom.

use crate::settings::Field;

/// Height in pixels of the slider strip at the top of each cell.
const SLIDER_STRIP: i32 = 10;

pub const COLUMNS: i32 = 2;
pub const ROWS: i32 = 13;

/// A drag gesture decoded inside a parameter cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Absolute set: fraction of the cell width, 0.0 at the left edge.
    Slider(f64),
    Increment,
    Decrement,
}

/// What a pressed pointer is over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragHit {
    Adjust { field: Field, gesture: Gesture },
    /// The zoom / focus-assist cell has its own stepping rules.
    ZoomCell { right_half: bool },
}

/// What a released pointer activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseHit {
    CaptureStill,
    CaptureVideo,
    CaptureTimelapse,
    SaveConfig,
    Exit,
    /// Release over the preview raster: move the focus point.
    FocusPoint { x: i32, y: i32 },
    Outside,
}

/// Fixed control-grid geometry for one preview size.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    preview_width: i32,
    preview_height: i32,
    button_width: i32,
    button_height: i32,
}

impl Layout {
    pub fn new(preview_width: i32, preview_height: i32) -> Self {
        Layout {
            preview_width,
            preview_height,
            button_width: preview_width / 8,
            button_height: preview_height / 13,
        }
    }

    pub fn button_size(&self) -> (i32, i32) {
        (self.button_width, self.button_height)
    }

    /// Grid cell under a point, or `None` outside the panel.
    fn cell(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        if x < self.preview_width || y < 0 {
            return None;
        }
        let column = (x - self.preview_width) / self.button_width;
        let row = y / self.button_height;
        if column >= COLUMNS || row >= ROWS {
            return None;
        }
        Some((column, row))
    }

    /// Decode a pressed pointer into a parameter adjustment.
    ///
    /// Rows that carry action buttons (capture, save/exit) respond on release
    /// instead, and points outside the grid decode to nothing: stray drags at
    /// the screen edge are expected noise, not faults.
    pub fn hit_drag(&self, x: i32, y: i32) -> Option<DragHit> {
        let (column, row) = self.cell(x, y)?;
        let cell_left = self.preview_width + column * self.button_width;
        let local_x = x - cell_left;
        let local_y = y - row * self.button_height;

        let field = match (column, row) {
            (0, 1) => Field::Mode,
            (0, 2) => Field::ShutterIndex,
            (0, 3) => Field::Gain,
            (0, 4) => Field::Brightness,
            (0, 5) => Field::Contrast,
            (0, 6) => Field::Ev,
            (0, 7) => Field::BlueGain,
            (0, 8) => Field::RedGain,
            (0, 9) => Field::StillFormat,
            (0, 10) => Field::Awb,
            (0, 11) => Field::Saturation,
            (0, 12) => Field::Metering,
            (1, 1) => Field::VideoLength,
            (1, 2) => Field::VideoFps,
            (1, 3) => Field::VideoFormat,
            (1, 4) => Field::Codec,
            (1, 5) => {
                return Some(DragHit::ZoomCell {
                    right_half: local_x > self.button_width / 2,
                })
            }
            (1, 7) => Field::Duration,
            (1, 8) => Field::Interval,
            (1, 9) => Field::ShotCount,
            (1, 10) => Field::Denoise,
            (1, 11) => Field::Sharpness,
            _ => return None,
        };

        let gesture = if local_y < SLIDER_STRIP {
            Gesture::Slider(local_x as f64 / self.button_width as f64)
        } else if (local_y as f64) < self.button_height as f64 / 1.2 {
            if local_x > self.button_width / 2 {
                Gesture::Increment
            } else {
                Gesture::Decrement
            }
        } else {
            return None;
        };

        Some(DragHit::Adjust { field, gesture })
    }

    /// Decode a released pointer into an action.
    pub fn hit_release(&self, x: i32, y: i32) -> ReleaseHit {
        if x < self.preview_width {
            if x >= 0 && y >= 0 && y < self.preview_height {
                return ReleaseHit::FocusPoint { x, y };
            }
            return ReleaseHit::Outside;
        }
        let Some((column, row)) = self.cell(x, y) else {
            return ReleaseHit::Outside;
        };
        match (column, row) {
            (0, 0) => ReleaseHit::CaptureStill,
            (1, 0) => ReleaseHit::CaptureVideo,
            (1, 6) => ReleaseHit::CaptureTimelapse,
            (1, 12) => {
                let cell_left = self.preview_width + column * self.button_width;
                if x - cell_left > self.button_width / 2 {
                    ReleaseHit::Exit
                } else {
                    ReleaseHit::SaveConfig
                }
            }
            _ => ReleaseHit::Outside,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        // 800x600 preview: 100px wide, 46px tall cells.
        Layout::new(800, 600)
    }

    #[test]
    fn test_points_left_of_panel_are_focus_or_nothing() {
        let l = layout();
        assert_eq!(l.hit_drag(400, 300), None);
        assert_eq!(l.hit_release(400, 300), ReleaseHit::FocusPoint { x: 400, y: 300 });
        assert_eq!(l.hit_release(400, 700), ReleaseHit::Outside);
    }

    #[test]
    fn test_points_past_grid_are_ignored() {
        let l = layout();
        // Third column does not exist.
        assert_eq!(l.hit_drag(800 + 250, 60), None);
        assert_eq!(l.hit_release(800 + 250, 60), ReleaseHit::Outside);
        // Below the last row.
        assert_eq!(l.hit_drag(820, 599), None);
    }

    #[test]
    fn test_slider_strip_decodes_fraction() {
        let l = layout();
        let (bw, bh) = l.button_size();
        // Column 0 row 3 is gain; strip is the top 10 pixels.
        let x = 800 + bw / 2;
        let y = 3 * bh + 5;
        match l.hit_drag(x, y) {
            Some(DragHit::Adjust {
                field: Field::Gain,
                gesture: Gesture::Slider(frac),
            }) => assert!((frac - 0.5).abs() < 0.01),
            other => panic!("expected gain slider, got {:?}", other),
        }
    }

    #[test]
    fn test_step_zone_halves() {
        let l = layout();
        let (bw, bh) = l.button_size();
        let y = 3 * bh + bh / 2;
        assert_eq!(
            l.hit_drag(800 + 10, y),
            Some(DragHit::Adjust {
                field: Field::Gain,
                gesture: Gesture::Decrement
            })
        );
        assert_eq!(
            l.hit_drag(800 + bw - 10, y),
            Some(DragHit::Adjust {
                field: Field::Gain,
                gesture: Gesture::Increment
            })
        );
    }

    #[test]
    fn test_dead_sliver_at_cell_bottom() {
        let l = layout();
        let (_, bh) = l.button_size();
        let y = 3 * bh + bh - 1;
        assert_eq!(l.hit_drag(820, y), None);
    }

    #[test]
    fn test_zoom_cell_reports_halves() {
        let l = layout();
        let (bw, bh) = l.button_size();
        let y = 5 * bh + bh / 2;
        assert_eq!(
            l.hit_drag(800 + bw + 10, y),
            Some(DragHit::ZoomCell { right_half: false })
        );
        assert_eq!(
            l.hit_drag(800 + bw + bw - 5, y),
            Some(DragHit::ZoomCell { right_half: true })
        );
    }

    #[test]
    fn test_capture_buttons_on_release() {
        let l = layout();
        let (bw, bh) = l.button_size();
        assert_eq!(l.hit_release(800 + 10, 10), ReleaseHit::CaptureStill);
        assert_eq!(l.hit_release(800 + bw + 10, 10), ReleaseHit::CaptureVideo);
        assert_eq!(
            l.hit_release(800 + bw + 10, 6 * bh + 10),
            ReleaseHit::CaptureTimelapse
        );
    }

    #[test]
    fn test_save_and_exit_split_last_cell() {
        let l = layout();
        let (bw, bh) = l.button_size();
        let y = 12 * bh + 10;
        assert_eq!(l.hit_release(800 + bw + 10, y), ReleaseHit::SaveConfig);
        assert_eq!(l.hit_release(800 + bw + bw - 5, y), ReleaseHit::Exit);
    }

    #[test]
    fn test_video_column_fields() {
        let l = layout();
        let (bw, bh) = l.button_size();
        let x = 800 + bw + bw / 4;
        let expectations = [
            (1, Field::VideoLength),
            (2, Field::VideoFps),
            (3, Field::VideoFormat),
            (4, Field::Codec),
            (7, Field::Duration),
            (8, Field::Interval),
            (9, Field::ShotCount),
            (10, Field::Denoise),
            (11, Field::Sharpness),
        ];
        for (row, field) in expectations {
            match l.hit_drag(x, row * bh + bh / 2) {
                Some(DragHit::Adjust { field: hit, .. }) => {
                    assert_eq!(hit, field, "row {}", row)
                }
                other => panic!("row {}: expected {:?}, got {:?}", row, field, other),
            }
        }
    }
}
