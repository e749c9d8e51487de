//! Request bodies and query parameters sent to the DisStat API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A point-in-time view of the bot's size, posted on every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub guild_count: u64,
    pub user_count: u64,
    pub shard_count: u32,

    /// Gateway latency in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_ping: Option<u64>,

    #[serde(flatten)]
    pub process: Option<ProcessUsage>,

    #[serde(rename = "customData", skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<Vec<CustomGraphData>>,
}

impl StatsSnapshot {
    /// A shard count of zero is reported as a single shard.
    pub fn new(guild_count: u64, user_count: u64, shard_count: u32) -> Self {
        Self {
            guild_count,
            user_count,
            shard_count: shard_count.max(1),
            api_ping: None,
            process: None,
            custom_data: None,
        }
    }

    pub fn with_api_ping(mut self, api_ping: Option<u64>) -> Self {
        self.api_ping = api_ping;
        self
    }

    /// Usage where nothing could be read is dropped.
    pub fn with_process(mut self, process: ProcessUsage) -> Self {
        self.process = (!process.is_empty()).then_some(process);
        self
    }

    /// An empty list leaves `customData` out of the body.
    pub fn with_custom_data(mut self, custom_data: Vec<CustomGraphData>) -> Self {
        self.custom_data = (!custom_data.is_empty()).then_some(custom_data);
        self
    }
}

/// Resource usage of the bot process. Values that could not be read are left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProcessUsage {
    /// Resident memory of the process in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_usage: Option<u64>,

    /// Total memory of the machine in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ram: Option<u64>,

    /// Global CPU usage in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<f32>,
}

impl ProcessUsage {
    pub fn is_empty(&self) -> bool {
        self.ram_usage.is_none() && self.total_ram.is_none() && self.cpu_usage.is_none()
    }
}

/// A single command invocation. `guild_id` is `null` for direct messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub command: String,
    pub invoker_id: u64,
    pub guild_id: Option<u64>,
}

impl CommandRecord {
    pub fn new(command: impl Into<String>, invoker_id: u64, guild_id: Option<u64>) -> Self {
        Self {
            command: command.into(),
            invoker_id,
            guild_id,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(Error::EmptyCommandName);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphValue {
    Int(i64),
    Text(String),
}

impl From<i64> for GraphValue {
    fn from(value: i64) -> Self {
        GraphValue::Int(value)
    }
}

impl From<&str> for GraphValue {
    fn from(value: &str) -> Self {
        GraphValue::Text(value.to_string())
    }
}

impl From<String> for GraphValue {
    fn from(value: String) -> Self {
        GraphValue::Text(value)
    }
}

/// A data point for one of the bot's custom graphs on DisStat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomGraphData {
    #[serde(rename = "type")]
    pub graph: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value1: Option<GraphValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value2: Option<GraphValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value3: Option<GraphValue>,
}

impl CustomGraphData {
    pub fn new(graph: impl Into<String>) -> Self {
        Self {
            graph: graph.into(),
            value1: None,
            value2: None,
            value3: None,
        }
    }

    pub fn value1(mut self, value: impl Into<GraphValue>) -> Self {
        self.value1 = Some(value.into());
        self
    }

    pub fn value2(mut self, value: impl Into<GraphValue>) -> Self {
        self.value2 = Some(value.into());
        self
    }

    pub fn value3(mut self, value: impl Into<GraphValue>) -> Self {
        self.value3 = Some(value.into());
        self
    }
}

/// Parameters for reading a bot's public entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotQuery {
    pub return_stats: bool,
    pub data_points: Option<u32>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl BotQuery {
    pub fn with_stats() -> Self {
        Self {
            return_stats: true,
            ..Default::default()
        }
    }

    /// Query pairs as sent on the wire. Unset parameters are skipped.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("returnStats", self.return_stats.to_string())];

        if let Some(data_points) = self.data_points {
            pairs.push(("dataPoints", data_points.to_string()));
        }

        if let Some(start) = self.start {
            pairs.push(("start", start.timestamp_millis().to_string()));
        }

        if let Some(end) = self.end {
            pairs.push(("end", end.timestamp_millis().to_string()));
        }

        pairs
            .into_iter()
            .map(|(key, value)| (key, value.to_lowercase()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn snapshot_serializes_counts_only() {
        let snapshot = StatsSnapshot::new(12, 3400, 2);

        assert_eq!(
            serde_json::to_value(snapshot).unwrap(),
            json!({ "guild_count": 12, "user_count": 3400, "shard_count": 2 })
        );
    }

    #[test]
    fn snapshot_clamps_zero_shards() {
        assert_eq!(StatsSnapshot::new(1, 1, 0).shard_count, 1);
    }

    #[test]
    fn snapshot_flattens_process_usage() {
        let snapshot = StatsSnapshot::new(1, 2, 1).with_process(ProcessUsage {
            ram_usage: Some(1024),
            total_ram: None,
            cpu_usage: Some(12.5),
        });

        assert_eq!(
            serde_json::to_value(snapshot).unwrap(),
            json!({
                "guild_count": 1,
                "user_count": 2,
                "shard_count": 1,
                "ram_usage": 1024,
                "cpu_usage": 12.5
            })
        );
    }

    #[test]
    fn empty_process_usage_is_dropped() {
        let snapshot = StatsSnapshot::new(12, 3400, 2).with_process(ProcessUsage::default());

        assert_eq!(snapshot.process, None);
        assert_eq!(snapshot, StatsSnapshot::new(12, 3400, 2));
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            json!({ "guild_count": 12, "user_count": 3400, "shard_count": 2 })
        );
    }

    #[test]
    fn snapshot_carries_ping_and_custom_data() {
        let snapshot = StatsSnapshot::new(1, 2, 1)
            .with_api_ping(Some(87))
            .with_custom_data(vec![CustomGraphData::new("Songs Played").value1(5i64)]);

        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            json!({
                "guild_count": 1,
                "user_count": 2,
                "shard_count": 1,
                "api_ping": 87,
                "customData": [{ "type": "Songs Played", "value1": 5 }]
            })
        );
    }

    #[test]
    fn empty_custom_data_is_left_out() {
        let snapshot = StatsSnapshot::new(1, 2, 1).with_custom_data(vec![]);
        assert_eq!(snapshot.custom_data, None);
    }

    #[test]
    fn command_record_keeps_null_guild() {
        let record = CommandRecord::new("ping", 42, None);

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "command": "ping", "invoker_id": 42, "guild_id": null })
        );
    }

    #[test]
    fn command_record_rejects_blank_name() {
        assert!(matches!(
            CommandRecord::new("  ", 1, None).validate(),
            Err(Error::EmptyCommandName)
        ));
        assert!(CommandRecord::new("ping", 1, None).validate().is_ok());
    }

    #[test]
    fn custom_graph_data_uses_type_key() {
        let data = CustomGraphData::new("Commands Used")
            .value1("ping")
            .value2(42i64);

        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({ "type": "Commands Used", "value1": "ping", "value2": 42 })
        );
    }

    #[test]
    fn bot_query_pairs() {
        let query = BotQuery {
            return_stats: true,
            data_points: Some(30),
            start: Some(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()),
            end: None,
        };

        assert_eq!(
            query.to_pairs(),
            vec![
                ("returnStats", "true".to_string()),
                ("dataPoints", "30".to_string()),
                ("start", "1700000000000".to_string()),
            ]
        );
    }

    #[test]
    fn default_bot_query_only_sends_return_stats() {
        assert_eq!(
            BotQuery::default().to_pairs(),
            vec![("returnStats", "false".to_string())]
        );
    }
}
