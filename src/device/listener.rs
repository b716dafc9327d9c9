use log::{debug, info, warn};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::types::UserProfile;
use crate::device::constants::{CONNECTION_NOTICE_DURATION, PROFILE_NOTICE_DURATION};
use crate::device::events::{EventSubscription, ScaleEventChannel};
use crate::device::measurement::DerivedMeasurement;
use crate::device::sdk::ScaleSdk;
use crate::device::types::{DeviceInfo, DeviceStatus, RawMeasurement, ScaleEvent};
use crate::device::user::ScaleUser;
use crate::error::{DeviceError, EventError, ScanError};
use crate::notify::{ExceptionContext, ExceptionTag, Host, Notification, Route};

/// Everything the listener knows about the current scan session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScaleState {
    pub device: Option<DeviceInfo>,
    pub status: Option<DeviceStatus>,
    pub measurement: Option<DerivedMeasurement>,
    /// Bumped on every final measurement, even when it repeats the previous reading.
    pub measurement_count: u64,
    pub start_scale_scan: bool,
}

pub type StateObserver = Box<dyn FnMut(&ScaleState) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// A final measurement arrived.
    Completed,
    /// The scan was stopped without a measurement.
    Stopped,
    ChannelClosed,
    Cancelled,
}

const EVENT_CONTEXT: ExceptionContext = ExceptionContext {
    component: "DeviceListener",
    method: "notification_filter",
    tag: ExceptionTag::Device,
};

/**
 * Listens to the scale SDK: holds the one subscription to its event channel for as long as the
 * listener lives, turns events into status/device/measurement state and starts scans.
 */
pub struct DeviceListener<S: ScaleSdk> {
    sdk: S,
    host: Host,
    state: ScaleState,
    observers: Vec<StateObserver>,
    subscription: EventSubscription,
    session: Uuid,
}

impl<S: ScaleSdk> DeviceListener<S> {
    pub fn new(sdk: S, host: Host, channel: &ScaleEventChannel) -> Result<Self, DeviceError> {
        let subscription = channel.add_listener()?;

        Ok(DeviceListener {
            sdk,
            host,
            state: ScaleState::default(),
            observers: Vec::new(),
            subscription,
            session: Uuid::nil(),
        })
    }

    pub fn device(&self) -> Option<&DeviceInfo> {
        self.state.device.as_ref()
    }

    pub fn status(&self) -> Option<DeviceStatus> {
        self.state.status
    }

    pub fn measurement(&self) -> Option<&DerivedMeasurement> {
        self.state.measurement.as_ref()
    }

    pub fn start_scale_scan(&self) -> bool {
        self.state.start_scale_scan
    }

    pub fn state(&self) -> &ScaleState {
        &self.state
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    /// Registers a callback that runs right after every state change.
    pub fn observe<F>(&mut self, observer: F)
    where
        F: FnMut(&ScaleState) + Send + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    fn changed(&mut self) {
        for observer in self.observers.iter_mut() {
            observer(&self.state);
        }
    }

    fn profile_incomplete(&self, error: ScanError) -> ScanError {
        warn!("Cannot start a scan: {}", error);
        self.host.notifier.show(Notification::error(&error.to_string(), PROFILE_NOTICE_DURATION));
        self.host.navigator.navigate(Route::UserProfileForm);
        error
    }

    async fn connect(&mut self, user: &ScaleUser) -> Result<(), ScanError> {
        self.sdk.init_bluetooth().await
            .map_err(|err| ScanError::from_init_failure(&err))?;
        self.sdk.build_user(user).await
            .map_err(|err| ScanError::from_connection_message(&err.to_string()))?;
        self.sdk.start_scan().await
            .map_err(|err| ScanError::from_connection_message(&err.to_string()))?;
        Ok(())
    }

    pub async fn on_start_scale_scan(&mut self, profile: Option<&UserProfile>) -> Result<(), ScanError> {
        let user = ScaleUser::from_profile(profile).map_err(|error| self.profile_incomplete(error))?;

        self.session = Uuid::new_v4();
        info!("scan {}: starting", self.session);
        self.state.start_scale_scan = true;
        self.changed();

        if let Err(error) = self.connect(&user).await {
            warn!("scan {}: failed to start: {:?}", self.session, error);
            self.host.notifier.show(Notification::error(&error.to_string(), CONNECTION_NOTICE_DURATION));
            self.on_stop_scale_scan();
            return Err(error);
        }

        info!("scan {}: waiting for the scale", self.session);
        Ok(())
    }

    /// Only clears the scan flag; the SDK is not told to stop.
    pub fn on_stop_scale_scan(&mut self) {
        if self.state.start_scale_scan {
            self.state.start_scale_scan = false;
            self.changed();
        }
    }

    /// Forgets the device, status and measurement. The scan flag is left alone.
    pub fn reset_scale(&mut self) {
        self.state.device = None;
        self.state.status = None;
        self.state.measurement = None;
        self.changed();
    }

    fn filter_state_change(&mut self, code: i32) {
        match DeviceStatus::from_state_code(code) {
            Some(status) => {
                info!("scan {}: {}", self.session, status);
                self.state.status = Some(status);
                self.changed();
            },
            None => debug!("scan {}: ignoring scale state {}", self.session, code),
        }
    }

    fn final_measurement_response(&mut self, raw: &RawMeasurement) -> Result<(), EventError> {
        let measurement = DerivedMeasurement::from_raw(raw)?;
        info!("scan {}: measured {} lbs", self.session, measurement.current_weight);

        self.state.measurement = Some(measurement);
        self.state.measurement_count += 1;
        self.changed();
        self.on_stop_scale_scan();
        Ok(())
    }

    pub fn handle_event(&mut self, event: ScaleEvent) -> Result<(), EventError> {
        match event {
            ScaleEvent::ScaleStateChange(code) => self.filter_state_change(code),
            ScaleEvent::FinalMeasurementEvent(raw) => self.final_measurement_response(&raw)?,
            ScaleEvent::DeviceInfo(device) => {
                info!("scan {}: paired with {}", self.session, device.name().or(device.mac()).unwrap_or("a scale"));
                self.state.device = Some(device);
                self.changed();
            },
        }
        Ok(())
    }

    /// Handles one payload from the SDK. Failures go to the error sink and never further.
    pub fn notification_filter(&mut self, payload: Value) {
        let result = ScaleEvent::from_payload(payload).and_then(|event| match event {
            Some(event) => self.handle_event(event),
            None => Ok(()),
        });

        if let Err(error) = result {
            self.host.errors.capture_exception(&error.to_string(), &EVENT_CONTEXT);
        }
    }

    /// Handles the events that are already queued, returning how many there were.
    pub fn process_pending(&mut self) -> usize {
        let mut count = 0;
        while let Some(payload) = self.subscription.try_next() {
            self.notification_filter(payload);
            count += 1;
        }
        count
    }

    /// Handles events until the scan flag drops, the channel closes or `cancel` fires.
    pub async fn run_session(&mut self, cancel: &CancellationToken) -> SessionEnd {
        loop {
            if !self.state.start_scale_scan {
                return match self.state.measurement {
                    Some(_) => SessionEnd::Completed,
                    None => SessionEnd::Stopped,
                };
            }

            let next = tokio::select! {
                _ = cancel.cancelled() => return SessionEnd::Cancelled,
                payload = self.subscription.next() => payload,
            };

            match next {
                Some(payload) => self.notification_filter(payload),
                None => return SessionEnd::ChannelClosed,
            }
        }
    }
}
