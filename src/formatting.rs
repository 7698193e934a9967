// src/formatting.rs

use crate::core::WeatherRecord;

/// A trait for turning a weather record into a short, human-readable message.
pub trait TextFormatter: Send + Sync {
    fn format_record(&self, record: &WeatherRecord) -> String;
}

/// A compact one-line-per-series summary, suitable for chat and text channels.
///
/// Hourly series start at midnight of the forecast day, so the first value is
/// labeled as such rather than as a current reading.
pub struct SummaryFormatter;

impl SummaryFormatter {
    fn format_series(&self, name: &str, record: &WeatherRecord) -> Option<String> {
        let values = record.series(name)?;
        let (first, min, max) = match values.first() {
            Some(first) => {
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (*first, min, max)
            }
            None => return None,
        };
        Some(format!(
            "{}: first {:.1}, min {:.1}, max {:.1} ({} hours)",
            name,
            first,
            min,
            max,
            values.len()
        ))
    }
}

impl TextFormatter for SummaryFormatter {
    fn format_record(&self, record: &WeatherRecord) -> String {
        let mut lines = vec![format!("Elevation: {:.1} m", record.elevation)];

        // Non-numeric series such as `time` have nothing to summarize.
        lines.extend(
            record
                .series_names()
                .into_iter()
                .filter_map(|name| self.format_series(name, record)),
        );

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_record(hourly: serde_json::Value) -> WeatherRecord {
        WeatherRecord {
            elevation: 38.0,
            hourly: hourly.as_object().unwrap().clone(),
        }
    }

    #[test]
    fn test_format_record_with_series() {
        let record = create_test_record(json!({
            "time": ["2025-07-08T00:00", "2025-07-08T01:00", "2025-07-08T02:00"],
            "temperature_2m": [16.4, 14.2, 19.0],
        }));

        let text = SummaryFormatter.format_record(&record);

        assert_eq!(
            text,
            "Elevation: 38.0 m\ntemperature_2m: first 16.4, min 14.2, max 19.0 (3 hours)"
        );
    }

    #[test]
    fn test_format_record_without_series() {
        let record = create_test_record(json!({}));
        assert_eq!(SummaryFormatter.format_record(&record), "Elevation: 38.0 m");
    }

    #[test]
    fn test_format_record_skips_all_null_series() {
        let record = create_test_record(json!({ "wind_speed_10m": [null, null] }));
        assert_eq!(SummaryFormatter.format_record(&record), "Elevation: 38.0 m");
    }
}
