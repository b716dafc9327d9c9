use std::sync::{Arc, Mutex};

use crate::config::types::UserProfile;
use crate::device::sdk::ScaleSdk;
use crate::device::user::ScaleUser;
use crate::error::{DeviceError, SubmissionError};
use crate::notify::{ErrorSink, ExceptionContext, Host, Navigator, Notification, Notifier, Route};
use crate::weighin::record::WeighinRecord;
use crate::weighin::submit::WeighinMutation;

pub fn profile() -> UserProfile {
    UserProfile {
        email: "jane@example.com".to_string(),
        height: Some("5_10".to_string()),
        gender: Some("Female".to_string()),
        birthday: Some("1990-04-01".to_string()),
        athlete_mode: false,
    }
}

#[derive(Default)]
pub struct FakeSdk {
    calls: Vec<&'static str>,
    fail_at: Option<(&'static str, String)>,
    user: Option<ScaleUser>,
}

impl FakeSdk {
    pub fn failing_at(step: &'static str, message: &str) -> Self {
        FakeSdk {
            fail_at: Some((step, message.to_string())),
            ..FakeSdk::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.clone()
    }

    pub fn user(&self) -> Option<&ScaleUser> {
        self.user.as_ref()
    }

    fn step(&mut self, name: &'static str) -> Result<(), DeviceError> {
        self.calls.push(name);
        match &self.fail_at {
            Some((step, message)) if *step == name => Err(DeviceError::Btle { source: btleplug::Error::Other(message.clone().into()) }),
            _ => Ok(()),
        }
    }
}

impl ScaleSdk for FakeSdk {
    async fn init_bluetooth(&mut self) -> Result<(), DeviceError> {
        self.step("init_bluetooth")
    }

    async fn build_user(&mut self, user: &ScaleUser) -> Result<(), DeviceError> {
        self.user = Some(user.clone());
        self.step("build_user")
    }

    async fn start_scan(&mut self) -> Result<(), DeviceError> {
        self.step("start_scan")
    }
}

#[derive(Clone, Default)]
pub struct RecordingHost {
    notifications: Arc<Mutex<Vec<Notification>>>,
    routes: Arc<Mutex<Vec<Route>>>,
    exceptions: Arc<Mutex<Vec<(String, ExceptionContext)>>>,
}

impl RecordingHost {
    pub fn host(&self) -> Host {
        Host {
            notifier: Arc::new(self.clone()),
            navigator: Arc::new(self.clone()),
            errors: Arc::new(self.clone()),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }

    pub fn exceptions(&self) -> Vec<(String, ExceptionContext)> {
        self.exceptions.lock().unwrap().clone()
    }
}

impl Notifier for RecordingHost {
    fn show(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

impl Navigator for RecordingHost {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

impl ErrorSink for RecordingHost {
    fn capture_exception(&self, message: &str, context: &ExceptionContext) {
        self.exceptions.lock().unwrap().push((message.to_string(), context.clone()));
    }
}

pub struct FakeMutation {
    reject: Option<String>,
    submitted: Mutex<Vec<WeighinRecord>>,
}

impl FakeMutation {
    pub fn accepting() -> Self {
        FakeMutation { reject: None, submitted: Mutex::new(Vec::new()) }
    }

    pub fn rejecting(message: &str) -> Self {
        FakeMutation { reject: Some(message.to_string()), submitted: Mutex::new(Vec::new()) }
    }

    pub fn submitted(&self) -> Vec<WeighinRecord> {
        self.submitted.lock().unwrap().clone()
    }
}

impl WeighinMutation for FakeMutation {
    async fn submit(&self, record: &WeighinRecord) -> Result<(), SubmissionError> {
        self.submitted.lock().unwrap().push(record.clone());
        match &self.reject {
            Some(message) => Err(SubmissionError::Rejected { status: 409, message: message.clone() }),
            None => Ok(()),
        }
    }
}
