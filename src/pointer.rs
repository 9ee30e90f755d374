//! Global pointer tracking.
//!
//! A background listener thread captures mouse events and maintains a shared
//! snapshot: current position, whether the primary button is down, and the
//! queue of release positions since the last poll. The control loop reads
//! the snapshot once per iteration; it never blocks on input.
//!
//! The controller consumes the `PointerSource` trait so tests can script
//! gesture sequences without a display.

use rdev::{listen, Button, Event, EventType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Pointer snapshot: absolute position plus primary-button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerState {
    pub x: i32,
    pub y: i32,
    pub pressed: bool,
}

/// Where pointer input comes from.
pub trait PointerSource {
    /// Current position and button state.
    fn state(&mut self) -> PointerState;
    /// Release positions observed since the last call, oldest first.
    fn take_releases(&mut self) -> Vec<(i32, i32)>;
}

#[derive(Debug, Default)]
struct Shared {
    x: i32,
    y: i32,
    pressed: bool,
    releases: Vec<(i32, i32)>,
}

/// Pointer source backed by a global rdev listener.
pub struct GlobalPointer {
    shared: Arc<Mutex<Shared>>,
    stop_flag: Arc<AtomicBool>,
    listener_thread: Option<JoinHandle<()>>,
}

impl GlobalPointer {
    pub fn new() -> Self {
        GlobalPointer {
            shared: Arc::new(Mutex::new(Shared::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            listener_thread: None,
        }
    }

    /// Start the listener thread. Returns an error if already running.
    pub fn start(&mut self) -> Result<(), String> {
        if self.listener_thread.is_some() {
            return Err("Pointer listener already running".to_string());
        }

        let shared = self.shared.clone();
        let stop_flag = self.stop_flag.clone();

        let handle = thread::spawn(move || {
            let callback = move |event: Event| {
                if stop_flag.load(Ordering::SeqCst) {
                    return;
                }
                let mut state = match shared.lock() {
                    Ok(guard) => guard,
                    Err(_) => return,
                };
                match event.event_type {
                    EventType::MouseMove { x, y } => {
                        state.x = x as i32;
                        state.y = y as i32;
                    }
                    EventType::ButtonPress(Button::Left) => {
                        state.pressed = true;
                    }
                    EventType::ButtonRelease(Button::Left) => {
                        state.pressed = false;
                        let release = (state.x, state.y);
                        state.releases.push(release);
                    }
                    _ => {}
                }
            };

            // Blocks until error; there is no clean way to stop rdev's
            // listener, so the stop flag just mutes event processing.
            if let Err(e) = listen(callback) {
                log::error!("pointer listener error: {:?}", e);
            }
        });

        self.listener_thread = Some(handle);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.listener_thread = None;
    }
}

impl Default for GlobalPointer {
    fn default() -> Self {
        GlobalPointer::new()
    }
}

impl PointerSource for GlobalPointer {
    fn state(&mut self) -> PointerState {
        match self.shared.lock() {
            Ok(guard) => PointerState {
                x: guard.x,
                y: guard.y,
                pressed: guard.pressed,
            },
            Err(_) => PointerState::default(),
        }
    }

    fn take_releases(&mut self) -> Vec<(i32, i32)> {
        match self.shared.lock() {
            Ok(mut guard) => std::mem::take(&mut guard.releases),
            Err(_) => Vec::new(),
        }
    }
}

impl Drop for GlobalPointer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inject(pointer: &GlobalPointer, f: impl FnOnce(&mut Shared)) {
        f(&mut pointer.shared.lock().unwrap());
    }

    #[test]
    fn test_state_defaults_to_released_origin() {
        let mut pointer = GlobalPointer::new();
        assert_eq!(pointer.state(), PointerState::default());
    }

    #[test]
    fn test_state_reflects_shared_snapshot() {
        let mut pointer = GlobalPointer::new();
        inject(&pointer, |s| {
            s.x = 840;
            s.y = 120;
            s.pressed = true;
        });
        let state = pointer.state();
        assert_eq!((state.x, state.y), (840, 120));
        assert!(state.pressed);
    }

    #[test]
    fn test_releases_drain_once() {
        let mut pointer = GlobalPointer::new();
        inject(&pointer, |s| {
            s.releases.push((810, 15));
            s.releases.push((910, 15));
        });
        assert_eq!(pointer.take_releases(), vec![(810, 15), (910, 15)]);
        assert!(pointer.take_releases().is_empty());
    }

    #[test]
    fn test_double_start_is_rejected() {
        // Start real listener threads only in environments with a display;
        // here we just exercise the guard by faking a running thread.
        let mut pointer = GlobalPointer::new();
        pointer.listener_thread = Some(thread::spawn(|| {}));
        assert!(pointer.start().is_err());
        pointer.stop();
    }
}
