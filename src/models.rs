use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// KlikResi tracking response (partial, only fields we need)
///
/// Every field is optional and a value of the wrong JSON type reads as
/// absent, so one odd field never discards the rest of the payload.
#[derive(Debug, Default, Deserialize)]
pub struct TrackingPayload {
    #[serde(default, deserialize_with = "lenient_object")]
    pub data: Option<TrackingPayloadData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackingPayloadData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub histories: Option<Vec<HistoryItem>>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub origin: Option<Party>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub destination: Option<Party>,
}

/// One event in the upstream history list
#[derive(Debug, Default, Deserialize)]
pub struct HistoryItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

/// Sender or receiver block
#[derive(Debug, Default, Deserialize)]
pub struct Party {
    #[serde(default, deserialize_with = "lenient_string")]
    pub contact_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
}

impl TrackingPayload {
    /// Decode a parsed body. Anything that is not an object yields the
    /// all-defaults payload.
    pub fn from_json(value: Value) -> Self {
        from_object(value).unwrap_or_default()
    }
}

fn from_object<T: DeserializeOwned>(value: Value) -> Option<T> {
    match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(from_object(Value::deserialize(deserializer)?))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Option<Vec<HistoryItem>>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        // Entries that are not objects become blank events
        Value::Array(items) => items
            .into_iter()
            .map(|item| from_object(item).unwrap_or_default())
            .collect(),
        _ => return Ok(None),
    };
    Ok(Some(items))
}

/// Normalized tracking result shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingData {
    pub awb: String,
    pub courier: String,
    pub status: String,
    pub history: Vec<TrackingHistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingHistoryEntry {
    pub date: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// The last query that produced a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastUsedQuery {
    pub awb: String,
    pub courier: String,
}

impl TrackingData {
    /// Build the display model. `awb` is echoed and `courier` uppercased;
    /// neither is read from the payload.
    pub fn from_payload(awb: &str, courier: &str, payload: TrackingPayload) -> Self {
        let data = payload.data.unwrap_or_default();
        let origin = data.origin.unwrap_or_default();
        let destination = data.destination.unwrap_or_default();

        let history = data
            .histories
            .unwrap_or_default()
            .into_iter()
            .map(|item| TrackingHistoryEntry {
                date: non_empty(item.date).unwrap_or_default(),
                description: non_empty(item.message)
                    .or_else(|| non_empty(item.status))
                    .unwrap_or_default(),
                // Upstream events carry no location
                location: Some(String::new()),
            })
            .collect();

        TrackingData {
            awb: awb.to_string(),
            courier: courier.to_uppercase(),
            status: non_empty(data.status).unwrap_or_else(|| "Unknown".to_string()),
            history,
            receiver: destination.contact_name,
            origin: non_empty(origin.contact_name).or(origin.address),
            destination: destination.address,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
