use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use log::{error, info, warn};

use crate::device::constants::SHOW_ANIMATION_DURATION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Bounce,
}

/// A toast shown to the user. Fire-and-forget: nothing waits for it to be dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub duration: Duration,
    pub show_animation_duration: Duration,
    pub show_easing: Easing,
    pub hide_on_press: bool,
}

impl Notification {
    fn new(title: &str, description: &str, severity: Severity, duration: Duration) -> Self {
        Notification {
            title: title.to_string(),
            description: description.to_string(),
            severity,
            duration,
            show_animation_duration: SHOW_ANIMATION_DURATION,
            show_easing: Easing::Bounce,
            hide_on_press: true,
        }
    }

    pub fn error(description: &str, duration: Duration) -> Self {
        Notification::new("Oops!", description, Severity::Error, duration)
    }

    pub fn success(description: &str, duration: Duration) -> Self {
        Notification::new("Yippie!", description, Severity::Success, duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    UserProfileForm,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionTag {
    Device,
}

impl fmt::Display for ExceptionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExceptionTag::Device => write!(f, "device"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionContext {
    pub component: &'static str,
    pub method: &'static str,
    pub tag: ExceptionTag,
}

pub trait Notifier: Send + Sync {
    fn show(&self, notification: Notification);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Where exceptions that must not reach the user end up.
pub trait ErrorSink: Send + Sync {
    fn capture_exception(&self, message: &str, context: &ExceptionContext);
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, notification: Notification) {
        match notification.severity {
            Severity::Success => info!("{} {}", notification.title, notification.description),
            Severity::Error => warn!("{} {}", notification.title, notification.description),
        }
    }
}

pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: Route) {
        match route {
            Route::UserProfileForm => info!("Complete your profile (height, gender and birth date) before weighing in"),
            Route::Back => info!("Leaving the weigh-in screen"),
        }
    }
}

pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn capture_exception(&self, message: &str, context: &ExceptionContext) {
        error!(
            "[{}] {}::{}: {}",
            context.tag, context.component, context.method, message
        );
    }
}

/// The app services the weigh-in flow talks to.
#[derive(Clone)]
pub struct Host {
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
    pub errors: Arc<dyn ErrorSink>,
}

impl Host {
    pub fn logging() -> Host {
        Host {
            notifier: Arc::new(LogNotifier),
            navigator: Arc::new(LogNavigator),
            errors: Arc::new(LogErrorSink),
        }
    }
}
