use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Custom deserializer for Duration from milliseconds
pub fn deserialize_duration_from_ms<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(ms))
}

/// Custom deserializer for Duration from seconds
pub fn deserialize_duration_from_seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

/// Custom deserializer for Duration from minutes
pub fn deserialize_duration_from_minutes<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let minutes = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(minutes.saturating_mul(60)))
}

/// Custom serializer for Duration to milliseconds
pub fn serialize_duration_to_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Custom serializer for Duration to seconds
pub fn serialize_duration_to_seconds<S>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}

/// Custom serializer for Duration to minutes
pub fn serialize_duration_to_minutes<S>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_secs() / 60)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListItem {
    Text(String),
    Integer(i64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringList {
    CommaSeparated(String),
    Items(Vec<ListItem>),
}

/// Custom deserializer for a list of strings.
///
/// Accepts either a sequence (numbers are kept as their decimal text) or a
/// single comma-separated string, which is what environment overrides
/// produce. Blank entries are dropped.
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match StringList::deserialize(deserializer)? {
        StringList::CommaSeparated(s) => s.split(',').map(|item| item.trim().to_string()).collect(),
        StringList::Items(items) => items
            .into_iter()
            .map(|item| match item {
                ListItem::Text(s) => s.trim().to_string(),
                ListItem::Integer(i) => i.to_string(),
            })
            .collect::<Vec<_>>(),
    };
    Ok(items.into_iter().filter(|item| !item.is_empty()).collect())
}
