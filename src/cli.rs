use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};

use crate::config::types::UserProfile;
use crate::weighin::form::WeighinFormValues;

#[derive(Parser, Debug)]
#[command(name = "scale-weighin", version, about = "Weigh in with a bluetooth body composition scale")]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan for the scale and submit its measurement
    Scan(ScanArgs),
    /// Submit a weigh-in typed in by hand
    Manual(ManualArgs),
    /// Show or update the stored profile
    Profile(ProfileArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// JSON lines of scale SDK events; `-` or nothing reads stdin
    #[arg(long, value_name = "FILE")]
    pub events: Option<PathBuf>,

    /// Skip bluetooth discovery. Events always come from `--events` or stdin
    #[arg(long)]
    pub no_bluetooth: bool,

    /// Print the weigh-in instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub email: Option<String>,

    /// Feet and inches, e.g. `5_10`
    #[arg(long)]
    pub height: Option<String>,

    #[arg(long)]
    pub gender: Option<String>,

    /// e.g. `1990-04-01`
    #[arg(long)]
    pub birthday: Option<String>,

    #[arg(long)]
    pub athlete_mode: Option<bool>,
}

impl ProfileArgs {
    pub fn is_update(&self) -> bool {
        self.email.is_some()
            || self.height.is_some()
            || self.gender.is_some()
            || self.birthday.is_some()
            || self.athlete_mode.is_some()
    }

    /// Applies the given options on top of the stored profile.
    pub fn apply(&self, profile: Option<UserProfile>) -> UserProfile {
        let mut profile = profile.unwrap_or_default();

        if let Some(email) = &self.email {
            profile.email = email.clone();
        }
        if let Some(height) = &self.height {
            profile.height = Some(height.clone());
        }
        if let Some(gender) = &self.gender {
            profile.gender = Some(gender.clone());
        }
        if let Some(birthday) = &self.birthday {
            profile.birthday = Some(birthday.clone());
        }
        if let Some(athlete_mode) = self.athlete_mode {
            profile.athlete_mode = athlete_mode;
        }

        profile
    }
}

#[derive(Args, Debug)]
pub struct ManualArgs {
    /// Weight in lbs
    #[arg(long)]
    pub weight: String,

    /// Body fat in percent
    #[arg(long)]
    pub body_fat: Option<String>,

    /// Fat mass in lbs
    #[arg(long)]
    pub fat_mass: Option<String>,

    /// Muscle mass in lbs
    #[arg(long)]
    pub muscle_mass: Option<String>,

    #[arg(long)]
    pub visceral_fat: Option<String>,

    /// Print the weigh-in instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

impl ManualArgs {
    pub fn form_values(&self) -> WeighinFormValues {
        WeighinFormValues {
            current_weight: self.weight.clone(),
            body_fat: self.body_fat.clone().unwrap_or_default(),
            fat_mass: self.fat_mass.clone().unwrap_or_default(),
            muscle_mass: self.muscle_mass.clone().unwrap_or_default(),
            visceral_fat: self.visceral_fat.clone().unwrap_or_default(),
        }
    }
}
