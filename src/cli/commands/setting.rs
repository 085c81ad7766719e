use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use crate::cli::error::CliResult;
use crate::cli::utils::{render, truncate_with_ellipsis};
use crate::db::Storage;

#[derive(Debug, Serialize)]
pub(crate) struct SettingEntry {
    pub(crate) key: String,
    pub(crate) value: Value,
}

#[derive(Tabled)]
pub(crate) struct SettingDisplay {
    #[tabled(rename = "Key")]
    pub(crate) key: String,
    #[tabled(rename = "Value")]
    pub(crate) value: String,
}

impl From<&SettingEntry> for SettingDisplay {
    fn from(setting: &SettingEntry) -> Self {
        Self {
            key: setting.key.clone(),
            value: truncate_with_ellipsis(&setting.value.to_string(), 60),
        }
    }
}

/// Interpret a command-line value as JSON, falling back to a plain string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Print a setting's value as JSON
pub async fn get_setting<S: Storage>(storage: &S, key: &str) -> CliResult<String> {
    let value = storage.get_setting(key).await?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Create or overwrite a setting
pub async fn set_setting<S: Storage>(storage: &S, key: &str, raw: &str) -> CliResult<String> {
    let value = parse_value(raw);
    storage.set_setting(key, &value).await?;
    Ok(format!("Set {} = {}", key, value))
}

/// List every setting
pub async fn list_settings<S: Storage>(storage: &S, format: &str) -> CliResult<String> {
    let settings: Vec<SettingEntry> = storage
        .get_settings()
        .await?
        .into_iter()
        .map(|(key, value)| SettingEntry { key, value })
        .collect();

    render::<_, SettingDisplay>(&settings, format, "No settings found.")
}
