use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

/// Outcome of measuring a single KPI.
///
/// Serialized as the bare number, `"N/A"` or `"Error"`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MetricValue<T> {
    Value(T),
    /// The query returned no row or a NULL.
    #[default]
    Unavailable,
    /// The query raised or its result could not be parsed.
    Error,
}

impl<T: Copy> MetricValue<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            MetricValue::Value(v) => Some(*v),
            MetricValue::Unavailable | MetricValue::Error => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, MetricValue::Error)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, MetricValue::Unavailable)
    }
}

impl<T: Serialize> Serialize for MetricValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Value(v) => v.serialize(serializer),
            MetricValue::Unavailable => serializer.serialize_str("N/A"),
            MetricValue::Error => serializer.serialize_str("Error"),
        }
    }
}

/// Used / total memory in GB; both sides share the same sentinel on failure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, ToSchema)]
pub struct MemoryUsage {
    #[schema(value_type = Object)]
    pub used: MetricValue<f64>,
    #[schema(value_type = Object)]
    pub total: MetricValue<f64>,
}

impl MemoryUsage {
    pub fn unavailable() -> Self {
        Self { used: MetricValue::Unavailable, total: MetricValue::Unavailable }
    }

    pub fn error() -> Self {
        Self { used: MetricValue::Error, total: MetricValue::Error }
    }
}

/// One KPI collection attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KpiSample {
    #[schema(value_type = Object)]
    pub cpu_usage_percent: MetricValue<f64>,
    pub memory_usage: MemoryUsage,
    #[schema(value_type = Object)]
    pub active_sessions: MetricValue<i64>,
    /// Set only when the whole collection failed (connection or transaction level).
    #[serde(rename = "error")]
    pub collection_error: Option<String>,
}

impl KpiSample {
    /// Sample for a collection that never reached the database.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        Self { collection_error: Some(reason.into()), ..Self::default() }
    }

    /// `(cpu, memory_used)` when the sample qualifies for the history store.
    pub fn persistable(&self) -> Option<(f64, f64)> {
        if self.collection_error.is_some() {
            return None;
        }
        Some((self.cpu_usage_percent.value()?, self.memory_usage.used.value()?))
    }
}

/// A persisted sample, append-only
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRecord {
    pub id: i64,
    #[sqlx(rename = "recorded_at")]
    pub timestamp: DateTime<Utc>,
    pub cpu_usage: f64,
    pub memory_usage: f64,
}

/// Chart-ready view of a history window, chronological
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct HistoricalSeries {
    /// `HH:MM` labels, one per record
    pub labels: Vec<String>,
    pub cpu: Vec<f64>,
    pub memory: Vec<f64>,
}

impl From<&[HistoricalRecord]> for HistoricalSeries {
    fn from(records: &[HistoricalRecord]) -> Self {
        let mut series = HistoricalSeries {
            labels: Vec::with_capacity(records.len()),
            cpu: Vec::with_capacity(records.len()),
            memory: Vec::with_capacity(records.len()),
        };
        for record in records {
            series.labels.push(record.timestamp.format("%H:%M").to_string());
            series.cpu.push(record.cpu_usage);
            series.memory.push(record.memory_usage);
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_sentinels_serialize_as_strings() {
        let sample = KpiSample {
            cpu_usage_percent: MetricValue::Value(42.5),
            memory_usage: MemoryUsage::error(),
            active_sessions: MetricValue::Unavailable,
            collection_error: None,
        };

        assert_eq!(
            serde_json::to_value(&sample).unwrap(),
            json!({
                "cpuUsagePercent": 42.5,
                "memoryUsage": { "used": "Error", "total": "Error" },
                "activeSessions": "N/A",
                "error": null
            })
        );
    }

    #[test]
    fn test_persistable_requires_cpu_and_memory() {
        let mut sample = KpiSample {
            cpu_usage_percent: MetricValue::Value(42.5),
            memory_usage: MemoryUsage {
                used: MetricValue::Value(3.1),
                total: MetricValue::Value(16.0),
            },
            active_sessions: MetricValue::Error,
            collection_error: None,
        };
        assert_eq!(sample.persistable(), Some((42.5, 3.1)));

        sample.cpu_usage_percent = MetricValue::Error;
        assert_eq!(sample.persistable(), None);

        sample.cpu_usage_percent = MetricValue::Value(1.0);
        sample.memory_usage.used = MetricValue::Unavailable;
        assert_eq!(sample.persistable(), None);
    }

    #[test]
    fn test_collection_error_blocks_persistence() {
        let sample = KpiSample {
            cpu_usage_percent: MetricValue::Value(10.0),
            memory_usage: MemoryUsage { used: MetricValue::Value(1.0), total: MetricValue::Value(2.0) },
            active_sessions: MetricValue::Value(3),
            collection_error: Some("A critical SQL error occurred".into()),
        };
        assert_eq!(sample.persistable(), None);
    }

    #[test]
    fn test_connection_failed_leaves_metrics_unavailable() {
        let sample = KpiSample::connection_failed("down");
        assert!(sample.cpu_usage_percent.is_unavailable());
        assert!(sample.memory_usage.used.is_unavailable());
        assert!(sample.active_sessions.is_unavailable());
        assert_eq!(sample.collection_error.as_deref(), Some("down"));
    }

    #[test]
    fn test_series_labels_are_hour_minute() {
        let records = vec![
            HistoricalRecord {
                id: 1,
                timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 9, 5, 30).unwrap(),
                cpu_usage: 12.0,
                memory_usage: 3.5,
            },
            HistoricalRecord {
                id: 2,
                timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 9, 6, 30).unwrap(),
                cpu_usage: 14.0,
                memory_usage: 3.6,
            },
        ];
        let series = HistoricalSeries::from(records.as_slice());
        assert_eq!(series.labels, vec!["09:05", "09:06"]);
        assert_eq!(series.cpu, vec![12.0, 14.0]);
        assert_eq!(series.memory, vec![3.5, 3.6]);
    }
}
