//! View models for the driver and dispatcher screens.
//!
//! Views never talk to a widget toolkit: they expose what should be drawn
//! and return transient [`Notice`]s for the caller to show as toasts.

pub mod dispatcher;
pub mod driver;
pub mod map;

pub use dispatcher::{DispatcherBoard, DispatcherView};
pub use driver::{
    CompletionPolicy, DriverError, DriverSession, DriverState, DriverView, GeolocationError,
};
pub use map::MapView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Alert,
    Error,
}

/// A transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notice {
    pub fn info(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            description: None,
        }
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            description: None,
        }
    }

    pub fn alert(title: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Alert,
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// `12 min`
pub fn format_eta(minutes: i32) -> String {
    format!("{minutes} min")
}

/// `3.5 km`, one decimal.
pub fn format_distance(km: f64) -> String {
    format!("{km:.1} km")
}
