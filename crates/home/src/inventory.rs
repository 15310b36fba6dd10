//! The in-process device inventory.
//!
//! Devices are declared in the config file and their state lives here for
//! the lifetime of the process. Intent tools mutate it; the device-context
//! builder renders it.

use homeclaw_config::DeviceConfig;
use homeclaw_core::error::ToolError;
use serde::Serialize;
use tokio::sync::RwLock;

/// One controllable device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub entity_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    pub domain: String,
    pub on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

impl Device {
    pub fn state(&self) -> &'static str {
        if self.on { "on" } else { "off" }
    }

    pub fn supports_brightness(&self) -> bool {
        self.domain == "light"
    }
}

impl From<&DeviceConfig> for Device {
    fn from(cfg: &DeviceConfig) -> Self {
        Self {
            entity_id: cfg.entity_id.clone(),
            name: cfg.name.clone(),
            area: cfg.area.clone(),
            domain: cfg.domain.clone(),
            on: cfg.on,
            brightness: cfg.brightness,
        }
    }
}

/// Which devices an intent applies to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Target {
    pub name: Option<String>,
    pub area: Option<String>,
    pub domain: Option<String>,
}

impl Target {
    /// Read `name`, `area` and `domain` from tool arguments.
    ///
    /// At least one of `name` or `area` is required.
    pub fn from_arguments(args: &serde_json::Value) -> Result<Self, ToolError> {
        let field = |key: &str| {
            args.get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let target = Self {
            name: field("name"),
            area: field("area"),
            domain: field("domain"),
        };
        if target.name.is_none() && target.area.is_none() {
            return Err(ToolError::InvalidArguments(
                "either 'name' or 'area' is required".into(),
            ));
        }
        Ok(target)
    }

    fn matches(&self, device: &Device) -> bool {
        let name_ok = self.name.as_deref().is_none_or(|n| {
            device.name.eq_ignore_ascii_case(n) || device.entity_id.eq_ignore_ascii_case(n)
        });
        let area_ok = self.area.as_deref().is_none_or(|a| {
            device
                .area
                .as_deref()
                .is_some_and(|da| normalize_area(da) == normalize_area(a))
        });
        let domain_ok = self
            .domain
            .as_deref()
            .is_none_or(|d| device.domain.eq_ignore_ascii_case(d));
        name_ok && area_ok && domain_ok
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(n) = &self.name {
            parts.push(format!("name '{n}'"));
        }
        if let Some(a) = &self.area {
            parts.push(format!("area '{a}'"));
        }
        if let Some(d) = &self.domain {
            parts.push(format!("domain '{d}'"));
        }
        parts.join(", ")
    }
}

/// Area ids compare case-insensitively with spaces and underscores equal.
pub fn normalize_area(area: &str) -> String {
    area.trim().to_lowercase().replace([' ', '-'], "_")
}

/// The set of devices, guarded for concurrent tool dispatch.
#[derive(Debug, Default)]
pub struct DeviceInventory {
    devices: RwLock<Vec<Device>>,
}

impl DeviceInventory {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: RwLock::new(devices),
        }
    }

    pub fn from_config(devices: &[DeviceConfig]) -> Self {
        Self::new(devices.iter().map(Device::from).collect())
    }

    /// A copy of every device.
    pub async fn snapshot(&self) -> Vec<Device> {
        self.devices.read().await.clone()
    }

    pub async fn get(&self, entity_id: &str) -> Option<Device> {
        self.devices
            .read()
            .await
            .iter()
            .find(|d| d.entity_id == entity_id)
            .cloned()
    }

    /// Apply `change` to every device matching `target` and return the
    /// updated devices. Errors with [`ToolError::NoMatch`] if none match.
    pub async fn update<F>(&self, target: &Target, mut change: F) -> Result<Vec<Device>, ToolError>
    where
        F: FnMut(&mut Device),
    {
        let mut devices = self.devices.write().await;
        let mut changed = Vec::new();
        for device in devices.iter_mut().filter(|d| target.matches(d)) {
            change(device);
            changed.push(device.clone());
        }
        if changed.is_empty() {
            return Err(ToolError::NoMatch(target.describe()));
        }
        Ok(changed)
    }
}
