use btleplug::api::{Central, Manager as _, ScanFilter};
use btleplug::platform::{Adapter, Manager};
use log::{debug, info};

use crate::device::user::ScaleUser;
use crate::error::DeviceError;

/**
 * The scale SDK the listener drives. Scanning, pairing and decoding measurements happen behind
 * this trait; results come back as events on a `ScaleEventChannel`.
 */
#[allow(async_fn_in_trait)]
pub trait ScaleSdk {
    async fn init_bluetooth(&mut self) -> Result<(), DeviceError>;

    async fn build_user(&mut self, user: &ScaleUser) -> Result<(), DeviceError>;

    async fn start_scan(&mut self) -> Result<(), DeviceError>;
}

/// Bluetooth transport backed by btleplug. It powers up the adapters and starts discovery, but
/// decoding scale advertisements is left to the vendor bridge: events still arrive through the
/// `ScaleEventChannel` from `--events` or stdin. The discovery scan runs until the process exits.
#[derive(Default)]
pub struct BtleScaleSdk {
    manager: Option<Manager>,
    adapters: Vec<Adapter>,
    user: Option<ScaleUser>,
}

impl BtleScaleSdk {
    pub fn new() -> Self {
        BtleScaleSdk::default()
    }
}

impl ScaleSdk for BtleScaleSdk {
    async fn init_bluetooth(&mut self) -> Result<(), DeviceError> {
        let manager = match self.manager.take() {
            Some(manager) => manager,
            None => Manager::new().await?,
        };

        let adapters = manager.adapters().await?;
        self.manager = Some(manager);

        if adapters.is_empty() {
            return Err(DeviceError::NoAdapter);
        }

        info!("Bluetooth initialized with {} adapter(s)", adapters.len());
        self.adapters = adapters;
        Ok(())
    }

    async fn build_user(&mut self, user: &ScaleUser) -> Result<(), DeviceError> {
        debug!("Scale user: height {} cm, gender {}, athlete type {}", user.height, user.gender, user.athlete_type);
        self.user = Some(user.clone());
        Ok(())
    }

    async fn start_scan(&mut self) -> Result<(), DeviceError> {
        if self.adapters.is_empty() {
            return Err(DeviceError::NotInitialized);
        }

        if self.user.is_none() {
            return Err(DeviceError::NoUser);
        }

        for adapter in &self.adapters {
            info!("Scanning using adapter {}...", adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()));
            adapter.start_scan(ScanFilter::default()).await?;
        }

        Ok(())
    }
}

/// Accepts every request without touching bluetooth; used when scale events are replayed from a
/// recording.
#[derive(Debug, Default)]
pub struct OfflineScaleSdk {
    user: Option<ScaleUser>,
}

impl OfflineScaleSdk {
    pub fn new() -> Self {
        OfflineScaleSdk::default()
    }
}

impl ScaleSdk for OfflineScaleSdk {
    async fn init_bluetooth(&mut self) -> Result<(), DeviceError> {
        info!("Bluetooth disabled, waiting for recorded scale events");
        Ok(())
    }

    async fn build_user(&mut self, user: &ScaleUser) -> Result<(), DeviceError> {
        self.user = Some(user.clone());
        Ok(())
    }

    async fn start_scan(&mut self) -> Result<(), DeviceError> {
        if self.user.is_none() {
            return Err(DeviceError::NoUser);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn btle_scan_requires_initialization() {
        let mut sdk = BtleScaleSdk::new();
        assert!(matches!(sdk.start_scan().await, Err(DeviceError::NotInitialized)));
    }

    #[tokio::test]
    async fn offline_scan_requires_a_user() {
        let mut sdk = OfflineScaleSdk::new();
        sdk.init_bluetooth().await.unwrap();
        assert!(matches!(sdk.start_scan().await, Err(DeviceError::NoUser)));

        let user = ScaleUser {
            birthday: "1990-04-01".to_string(),
            gender: "female".to_string(),
            id: "jane@example.com".to_string(),
            height: 178,
            unit: 1,
            athlete_type: 0,
        };
        sdk.build_user(&user).await.unwrap();
        assert!(sdk.start_scan().await.is_ok());
    }
}
