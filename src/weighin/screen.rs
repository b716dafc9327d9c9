use std::fmt;
use std::sync::{Arc, Mutex};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::types::UserProfile;
use crate::device::constants::{MESSAGE_WEIGHIN_SAVED, SUBMISSION_NOTICE_DURATION};
use crate::device::listener::{DeviceListener, SessionEnd};
use crate::device::sdk::ScaleSdk;
use crate::device::types::DeviceStatus;
use crate::error::{ScanError, SubmissionError};
use crate::notify::{Host, Notification, Route};
use crate::weighin::form::{WeighinField, WeighinForm, WeighinFormValues};
use crate::weighin::record::{EntrySource, WeighinOrigin, WeighinRecord};
use crate::weighin::schema::WeighinSchema;
use crate::weighin::submit::WeighinMutation;

/// What the weigh-in screen shows right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenView {
    /// Scanning, nothing heard from the scale yet.
    Searching,
    Connecting { status: DeviceStatus },
    Review { weight_only_warning: bool },
    Manual,
    Idle,
}

impl fmt::Display for ScreenView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenView::Searching => write!(f, "Please step onto the scale..."),
            ScreenView::Connecting { status: DeviceStatus::Measuring } => write!(f, "Gathering the measurement..."),
            ScreenView::Connecting { status } => write!(f, "{} to your scale...", status),
            ScreenView::Review { weight_only_warning: true } => write!(f, "It seems we only captured your weight"),
            ScreenView::Review { weight_only_warning: false } => write!(f, "Review your measurement"),
            ScreenView::Manual => write!(f, "Record your weigh-in manually"),
            ScreenView::Idle => write!(f, "Start a scale scan or record manually"),
        }
    }
}

/**
 * The weigh-in screen: owns the device listener and the form, keeps the form defaults in step
 * with the latest measurement and turns the form into a record on submit.
 */
pub struct WeighinScreen<S: ScaleSdk, M: WeighinMutation> {
    listener: DeviceListener<S>,
    form: Arc<Mutex<WeighinForm>>,
    mutation: M,
    host: Host,
    profile: Option<UserProfile>,
    record_manually: bool,
}

impl<S: ScaleSdk, M: WeighinMutation> WeighinScreen<S, M> {
    pub fn new(mut listener: DeviceListener<S>, mutation: M, host: Host, profile: Option<UserProfile>) -> Self {
        let form = Arc::new(Mutex::new(WeighinForm::new(WeighinFormValues::defaults(listener.measurement()))));

        let observed_form = form.clone();
        let mut seen_measurements = listener.state().measurement_count;
        listener.observe(move |state| {
            if state.measurement_count == seen_measurements {
                return;
            }
            seen_measurements = state.measurement_count;

            if let Some(measurement) = state.measurement.as_ref() {
                let mut form = observed_form.lock().expect("Failed to lock weigh-in form");
                if form.is_dirty() {
                    debug!("Discarding edited weigh-in values for the new measurement");
                }
                form.reset(WeighinFormValues::defaults(Some(measurement)));
            }
        });

        WeighinScreen {
            listener,
            form,
            mutation,
            host,
            profile,
            record_manually: false,
        }
    }

    pub fn listener(&self) -> &DeviceListener<S> {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut DeviceListener<S> {
        &mut self.listener
    }

    pub fn record_manually(&self) -> bool {
        self.record_manually
    }

    pub fn values(&self) -> WeighinFormValues {
        self.form.lock().expect("Failed to lock weigh-in form").values().clone()
    }

    pub fn set_field(&mut self, field: WeighinField, value: impl Into<String>) {
        self.form.lock().expect("Failed to lock weigh-in form").set(field, value);
    }

    pub fn entry_source(&self) -> EntrySource {
        match (self.record_manually, self.listener.measurement()) {
            (false, Some(_)) => EntrySource::Scale,
            _ => EntrySource::Manual,
        }
    }

    pub fn schema(&self) -> WeighinSchema {
        match self.entry_source() {
            EntrySource::Scale => WeighinSchema::scale(),
            EntrySource::Manual => WeighinSchema::manual(),
        }
    }

    pub fn view(&self) -> ScreenView {
        let scanning = self.listener.start_scale_scan();

        match (scanning, self.listener.status(), self.listener.measurement()) {
            (true, None, _) => ScreenView::Searching,
            (true, Some(status), _) => ScreenView::Connecting { status },
            _ if self.record_manually => ScreenView::Manual,
            (false, _, Some(measurement)) => ScreenView::Review {
                weight_only_warning: measurement.is_weight_only(),
            },
            _ => ScreenView::Idle,
        }
    }

    pub async fn on_start_scale(&mut self) -> Result<(), ScanError> {
        self.record_manually = false;
        self.listener.on_start_scale_scan(self.profile.as_ref()).await
    }

    pub fn on_record_manually(&mut self) {
        if self.listener.start_scale_scan() {
            self.listener.on_stop_scale_scan();
        }

        self.record_manually = true;
        self.form.lock().expect("Failed to lock weigh-in form").reset(WeighinFormValues::defaults(None));
    }

    pub async fn on_restart_scale_scan(&mut self) -> Result<(), ScanError> {
        self.listener.reset_scale();
        self.listener.on_start_scale_scan(self.profile.as_ref()).await
    }

    pub async fn run_session(&mut self, cancel: &CancellationToken) -> SessionEnd {
        self.listener.run_session(cancel).await
    }

    /// Validates the form and builds the record that would be submitted.
    pub fn record(&self) -> Result<WeighinRecord, SubmissionError> {
        let values = self.values();
        self.schema().validate(&values)?;

        let origin = match (self.entry_source(), self.listener.measurement()) {
            (EntrySource::Scale, Some(measurement)) => WeighinOrigin::Scale {
                measurement,
                device: self.listener.device(),
            },
            _ => WeighinOrigin::Manual,
        };

        Ok(WeighinRecord::from_form(&values, origin))
    }

    /// Submits the form. Validation failures are returned without a notification; the form
    /// keeps its values whatever happens.
    pub async fn submit(&mut self) -> Result<WeighinRecord, SubmissionError> {
        let record = self.record()?;

        match self.mutation.submit(&record).await {
            Ok(()) => {
                info!("Weigh-in submitted ({:?})", self.entry_source());
                self.host.notifier.show(Notification::success(MESSAGE_WEIGHIN_SAVED, SUBMISSION_NOTICE_DURATION));
                self.host.navigator.navigate(Route::Back);
                Ok(record)
            },
            Err(error) => {
                warn!("Failed to submit weigh-in: {}", error);
                self.host.notifier.show(Notification::error(&error.to_string(), SUBMISSION_NOTICE_DURATION));
                Err(error)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::device::events::ScaleEventChannel;
    use crate::device::constants::{DEVICE_SOURCE_MANUAL, DEVICE_SOURCE_SCALE};
    use crate::notify::Severity;
    use crate::test_support::{profile, FakeMutation, FakeSdk, RecordingHost};

    struct Fixture {
        screen: WeighinScreen<FakeSdk, FakeMutation>,
        recording: RecordingHost,
        channel: ScaleEventChannel,
    }

    fn fixture(mutation: FakeMutation) -> Fixture {
        let recording = RecordingHost::default();
        let channel = ScaleEventChannel::new();
        let listener = DeviceListener::new(FakeSdk::default(), recording.host(), &channel).unwrap();
        let screen = WeighinScreen::new(listener, mutation, recording.host(), Some(profile()));
        Fixture { screen, recording, channel }
    }

    fn emit_measurement(channel: &ScaleEventChannel, body_fat: u32) {
        channel.emit(json!({
            "type": "FINAL_MEASUREMENT_EVENT",
            "value": {
                "weight": 70000,
                "bodyFat": body_fat,
                "muscleMass": 30000,
                "visceralFatTanita": 6,
                "basalMetabolicRate": 1580,
                "fatFreeMass": 52500,
                "waterPercentage": 5500,
            },
        }));
    }

    #[tokio::test]
    async fn views_follow_the_scan() {
        let mut f = fixture(FakeMutation::accepting());
        assert_eq!(f.screen.view(), ScreenView::Idle);

        f.screen.on_start_scale().await.unwrap();
        assert_eq!(f.screen.view(), ScreenView::Searching);

        f.channel.emit(json!({ "type": "SCALE_STATE_CHANGE", "value": 2 }));
        f.screen.listener_mut().process_pending();
        assert_eq!(f.screen.view(), ScreenView::Connecting { status: DeviceStatus::Connected });
        assert_eq!(f.screen.view().to_string(), "Connected to your scale...");

        f.channel.emit(json!({ "type": "SCALE_STATE_CHANGE", "value": 4 }));
        f.screen.listener_mut().process_pending();
        assert_eq!(f.screen.view().to_string(), "Gathering the measurement...");

        emit_measurement(&f.channel, 2500);
        f.screen.listener_mut().process_pending();
        assert_eq!(f.screen.view(), ScreenView::Review { weight_only_warning: false });
    }

    #[tokio::test]
    async fn measurement_resets_the_form_defaults() {
        let mut f = fixture(FakeMutation::accepting());
        f.screen.set_field(WeighinField::CurrentWeight, "999");

        f.screen.on_start_scale().await.unwrap();
        emit_measurement(&f.channel, 2500);
        f.screen.listener_mut().process_pending();

        assert_eq!(f.screen.values(), WeighinFormValues {
            current_weight: "154.3".to_string(),
            body_fat: "25".to_string(),
            fat_mass: String::new(),
            muscle_mass: "66.1".to_string(),
            visceral_fat: "6".to_string(),
        });
    }

    #[tokio::test]
    async fn partial_measurement_shows_the_warning() {
        let mut f = fixture(FakeMutation::accepting());
        f.screen.on_start_scale().await.unwrap();
        emit_measurement(&f.channel, 0);
        f.screen.listener_mut().process_pending();

        assert_eq!(f.screen.view(), ScreenView::Review { weight_only_warning: true });
    }

    #[tokio::test]
    async fn scale_submission_sends_device_fields_but_never_fat_mass() {
        let mut f = fixture(FakeMutation::accepting());
        f.channel.emit(json!({ "type": "DEVICE_INFO", "value": { "mac": "AA:BB" } }));
        f.screen.on_start_scale().await.unwrap();
        emit_measurement(&f.channel, 2500);
        f.screen.listener_mut().process_pending();
        f.screen.set_field(WeighinField::FatMass, "38.6");

        let record = f.screen.submit().await.unwrap();

        assert_eq!(record.external_device_id, DEVICE_SOURCE_SCALE);
        assert_eq!(record.fat_mass, None);
        assert_eq!(record.current_weight, Some(154.3));
        assert_eq!(record.basal_metabolic_rate, Some(1580.0));
        assert_eq!(record.fat_free_mass, Some(115.7));
        assert_eq!(record.body_water_percent, Some(55.0));
        assert_eq!(record.device_details.unwrap().mac(), Some("AA:BB"));

        assert_eq!(f.recording.routes(), vec![Route::Back]);
        let notifications = f.recording.notifications();
        assert_eq!(notifications[0].severity, Severity::Success);
        assert_eq!(notifications[0].duration, SUBMISSION_NOTICE_DURATION);
    }

    #[tokio::test]
    async fn manual_entry_stops_the_scan_and_clears_the_form() {
        let mut f = fixture(FakeMutation::accepting());
        f.screen.on_start_scale().await.unwrap();
        emit_measurement(&f.channel, 2500);
        f.screen.listener_mut().process_pending();
        f.screen.on_start_scale().await.unwrap();
        assert!(f.screen.listener().start_scale_scan());

        f.screen.on_record_manually();

        assert!(!f.screen.listener().start_scale_scan());
        assert_eq!(f.screen.view(), ScreenView::Manual);
        assert_eq!(f.screen.values(), WeighinFormValues::default());
        assert_eq!(f.screen.entry_source(), EntrySource::Manual);
        assert!(f.screen.schema().covers(WeighinField::FatMass));
    }

    #[tokio::test]
    async fn manual_submission_uses_the_manual_marker() {
        let mut f = fixture(FakeMutation::accepting());
        f.screen.on_record_manually();
        f.screen.set_field(WeighinField::CurrentWeight, "150");
        f.screen.set_field(WeighinField::BodyFat, "0");

        let record = f.screen.submit().await;

        // "0" is outside the body fat range
        assert!(matches!(record, Err(SubmissionError::Invalid { .. })));
        assert!(f.recording.notifications().is_empty());

        f.screen.set_field(WeighinField::BodyFat, "");
        f.screen.set_field(WeighinField::FatMass, "40");
        let record = f.screen.submit().await.unwrap();

        assert_eq!(record.external_device_id, DEVICE_SOURCE_MANUAL);
        assert_eq!(record.current_weight, Some(150.0));
        assert_eq!(record.fat_mass, Some(40.0));
        assert_eq!(record.body_fat, None);
        assert_eq!(f.screen.mutation.submitted().len(), 1);
    }

    #[tokio::test]
    async fn scanning_again_leaves_manual_mode() {
        let mut f = fixture(FakeMutation::accepting());
        f.screen.on_record_manually();
        assert!(f.screen.record_manually());

        f.screen.on_start_scale().await.unwrap();

        assert!(!f.screen.record_manually());
        assert!(f.screen.listener().start_scale_scan());
    }

    #[tokio::test]
    async fn restart_clears_the_previous_measurement() {
        let mut f = fixture(FakeMutation::accepting());
        f.screen.on_start_scale().await.unwrap();
        f.channel.emit(json!({ "type": "SCALE_STATE_CHANGE", "value": 9 }));
        emit_measurement(&f.channel, 2500);
        f.screen.listener_mut().process_pending();

        f.screen.on_restart_scale_scan().await.unwrap();

        assert_eq!(f.screen.listener().measurement(), None);
        assert_eq!(f.screen.listener().status(), None);
        assert!(f.screen.listener().start_scale_scan());
        assert_eq!(f.screen.view(), ScreenView::Searching);
        assert_eq!(f.screen.listener().sdk().calls().len(), 6);
    }

    #[tokio::test]
    async fn rescan_with_an_identical_reading_reseeds_the_form() {
        let mut f = fixture(FakeMutation::accepting());
        f.screen.on_start_scale().await.unwrap();
        f.channel.emit(json!({ "type": "FINAL_MEASUREMENT_EVENT", "value": { "weight": 70000 } }));
        f.screen.listener_mut().process_pending();
        assert_eq!(f.screen.values().current_weight, "154.3");

        f.screen.on_record_manually();
        assert_eq!(f.screen.values().current_weight, "");

        f.screen.on_start_scale().await.unwrap();
        f.channel.emit(json!({ "type": "FINAL_MEASUREMENT_EVENT", "value": { "weight": 70000 } }));
        f.screen.listener_mut().process_pending();

        assert_eq!(f.screen.view(), ScreenView::Review { weight_only_warning: true });
        assert_eq!(f.screen.values().current_weight, "154.3");
        let record = f.screen.record().unwrap();
        assert_eq!(record.current_weight, Some(154.3));
        assert_eq!(record.external_device_id, DEVICE_SOURCE_SCALE);
    }

    #[tokio::test]
    async fn backend_failure_keeps_the_form() {
        let mut f = fixture(FakeMutation::rejecting("Weigh-in already recorded for this date"));
        f.screen.on_record_manually();
        f.screen.set_field(WeighinField::CurrentWeight, "172.4");

        let result = f.screen.submit().await;

        assert!(matches!(result, Err(SubmissionError::Rejected { status: 409, .. })));
        assert_eq!(f.screen.values().current_weight, "172.4");
        assert!(f.recording.routes().is_empty());

        let notifications = f.recording.notifications();
        assert_eq!(notifications[0].severity, Severity::Error);
        assert_eq!(notifications[0].description, "Weigh-in already recorded for this date");
    }
}
