//! State shared between the control and panel threads

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use hexascroller_core::config::DisplayConfig;
use hexascroller_core::state::DisplayState;

/// Shared service context
///
/// Every read or write of the display state goes through `with_state`, so a
/// reader never sees a message without its expiry or a half-applied change.
pub struct Context {
    state: Mutex<CriticalSectionRawMutex, RefCell<DisplayState>>,
    running: AtomicBool,
    pub display: DisplayConfig,
}

impl Context {
    pub fn new(display: DisplayConfig) -> Self {
        Self {
            state: Mutex::new(RefCell::new(DisplayState::new())),
            running: AtomicBool::new(true),
            display,
        }
    }

    /// Run `f` with exclusive access to the display state
    ///
    /// Keep `f` short; bus and panel I/O belong outside.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut DisplayState) -> R) -> R {
        self.state.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Request shutdown; returns true only for the first caller
    pub fn shutdown(&self) -> bool {
        self.running.swap(false, Ordering::AcqRel)
    }
}
