//! Presentation notifier
//!
//! The presentation layer implements [`Notifier`]; the orchestrator only
//! reports what changed.

use std::time::Duration;

use crate::state::Screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    General,
    Success,
    Failure,
}

impl ToastKind {
    /// Suggested display time; `None` leaves it to the presentation default
    pub fn duration(&self) -> Option<Duration> {
        match self {
            ToastKind::General => None,
            ToastKind::Success => Some(Duration::from_secs(2)),
            ToastKind::Failure => Some(Duration::from_secs(10)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ScreenChanged(Screen),
    Toast(ToastKind, String),
    SessionCleared,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, event: Event);
}

/// Headless notifier that writes every event to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::ScreenChanged(screen) => log::info!("Screen -> {:?}", screen),
            Event::Toast(ToastKind::Failure, message) => log::error!("{}", message),
            Event::Toast(kind, message) => log::info!("[{:?}] {}", kind, message),
            Event::SessionCleared => log::info!("Session cleared"),
        }
    }
}
