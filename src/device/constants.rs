use std::time::Duration;

/**
 * Connection state codes reported by the scale SDK in SCALE_STATE_CHANGE events.
 */
pub const STATE_LINK_LOSS: i32 = -1;
pub const STATE_DISCONNECTED: i32 = 0;
pub const STATE_CONNECTING: i32 = 1;
pub const STATE_CONNECTED: i32 = 2;
// pub const STATE_DISCONNECTING: i32 = 3;
pub const STATE_START_MEASURE: i32 = 4;
pub const STATE_REAL_TIME: i32 = 5;
pub const STATE_BODY_FAT: i32 = 7;
// pub const STATE_HEART_RATE: i32 = 8;
pub const STATE_MEASURE_COMPLETED: i32 = 9;

/**
 * Error codes in an SDK failure message that mean this app is not allowed to talk to the scale.
 */
pub const UNAUTHORIZED_ERROR_CODES: [&str; 2] = ["1002", "1005"];

pub const GRAMS_PER_POUND: f64 = 453.592_37;

pub const CENTIMETERS_PER_INCH: f64 = 2.54;

/**
 * Unit flag passed to the SDK when building the scale user. 1 is metric, 2 is imperial.
 */
pub const SCALE_UNIT_METRIC: u8 = 1;

/**
 * Device source markers attached to a weigh-in record.
 */
pub const DEVICE_SOURCE_SCALE: u8 = 17;
pub const DEVICE_SOURCE_MANUAL: u8 = 3;

/**
 * How long notifications stay visible.
 */
pub const PROFILE_NOTICE_DURATION: Duration = Duration::from_secs(6);
pub const CONNECTION_NOTICE_DURATION: Duration = Duration::from_secs(15);
pub const SUBMISSION_NOTICE_DURATION: Duration = Duration::from_secs(8);
pub const SHOW_ANIMATION_DURATION: Duration = Duration::from_millis(800);

pub const MESSAGE_PROFILE_INCOMPLETE: &str =
    "Please complete your profile as we require your birth date, gender and height to calculate your BMI.";
pub const MESSAGE_INVALID_BIRTHDAY: &str = "Please provide a valid birth date to calculate your BMI.";
pub const MESSAGE_INVALID_HEIGHT: &str = "Please provide a valid height to calculate your BMI.";
pub const MESSAGE_BLUETOOTH_UNAVAILABLE: &str =
    "We couldn't connect to your bluetooth. Make sure you have provided the necessary permissions.";
pub const MESSAGE_CONNECTION_FAILED: &str = "Unfortunately, we could not connect. Please try again.";
pub const MESSAGE_UNAUTHORIZED: &str = "This app is not authorized to connect to the scale. Please contact support.";
pub const MESSAGE_WEIGHIN_SAVED: &str =
    "Congratulations on completing your weigh-in! Your dedication to your health and wellness journey is truly inspiring!";
