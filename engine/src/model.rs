use chrono::{DateTime, NaiveDateTime};
use error::HospitalError;
use scylla::value::{CqlTimestamp, CqlTimeuuid};
use scylla::{DeserializeRow, SerializeRow};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// node id used for the time-based reading identifiers
const NODE_ID: [u8; 6] = [0x68, 0x6f, 0x73, 0x70, 0x69, 0x74];

/// Creates a new time-based identifier for a reading.
pub fn next_reading_id() -> CqlTimeuuid {
    CqlTimeuuid::from(Uuid::now_v1(&NODE_ID))
}

/// Renders a reading identifier as its embedded UTC time.
pub fn reading_time(id: &CqlTimeuuid) -> String {
    let uuid = Uuid::from(*id);
    uuid.get_timestamp()
        .map(|ts| ts.to_unix())
        .and_then(|(secs, nanos)| DateTime::from_timestamp(secs as i64, nanos))
        .map(|time| time.format(DATE_TIME_FORMAT).to_string())
        .unwrap_or_else(|| uuid.to_string())
}

fn opt<T: Display>(value: &Option<T>) -> String {
    match value {
        None => "None".to_string(),
        Some(v) => v.to_string(),
    }
}

/// A full row of `data_by_patient`.
#[derive(Clone, Debug, PartialEq, SerializeRow, DeserializeRow)]
pub struct VitalReading {
    pub patient_id: String,
    pub name: Option<String>,
    pub steps: Option<i32>,
    pub heart_rate: Option<i32>,
    pub spo2: Option<i32>,
    pub glucose: Option<i32>,
    pub timestmp: CqlTimeuuid,
}

impl Display for VitalReading {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "patient_id={} | name={} | steps={} | heart_rate={} | spo2={} | glucose={} | time={}",
            self.patient_id,
            opt(&self.name),
            opt(&self.steps),
            opt(&self.heart_rate),
            opt(&self.spo2),
            opt(&self.glucose),
            reading_time(&self.timestmp)
        )
    }
}

#[derive(Clone, Debug, PartialEq, SerializeRow, DeserializeRow)]
pub struct WearableInfo {
    pub device_id: String,
    pub device_name: Option<String>,
    pub patient_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, SerializeRow)]
pub struct Alert {
    pub alert_id: String,
    pub patient_id: String,
    pub alert_type: String,
    pub value: i32,
    pub threshold: i32,
    pub severity: String,
    pub description: String,
    pub timestmp: CqlTimeuuid,
}

/// Heart rate, steps and SpO2 of one reading.
#[derive(Clone, Debug, PartialEq, DeserializeRow)]
pub struct ActivityReading {
    pub patient_id: String,
    pub name: Option<String>,
    pub heart_rate: Option<i32>,
    pub spo2: Option<i32>,
    pub steps: Option<i32>,
    pub timestmp: CqlTimeuuid,
}

impl Display for ActivityReading {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "patient_id={} | name={} | heart_rate={} | spo2={} | steps={} | time={}",
            self.patient_id,
            opt(&self.name),
            opt(&self.heart_rate),
            opt(&self.spo2),
            opt(&self.steps),
            reading_time(&self.timestmp)
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeserializeRow)]
pub struct IntervalReading {
    pub patient_id: String,
    pub name: Option<String>,
    pub heart_rate: Option<i32>,
    pub glucose: Option<i32>,
    pub timestmp: CqlTimeuuid,
}

impl Display for IntervalReading {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "patient_id={} | name={} | heart_rate={} | glucose={} | time={}",
            self.patient_id,
            opt(&self.name),
            opt(&self.heart_rate),
            opt(&self.glucose),
            reading_time(&self.timestmp)
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeserializeRow)]
pub struct GlucoseReading {
    pub patient_id: String,
    pub name: Option<String>,
    pub glucose: Option<i32>,
    pub timestmp: CqlTimeuuid,
}

impl Display for GlucoseReading {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "patient_id={} | name={} | glucose={} | time={}",
            self.patient_id,
            opt(&self.name),
            opt(&self.glucose),
            reading_time(&self.timestmp)
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeserializeRow)]
pub struct LatestReading {
    pub patient_id: String,
    pub heart_rate: Option<i32>,
    pub spo2: Option<i32>,
    pub glucose: Option<i32>,
    pub timestmp: CqlTimeuuid,
}

impl Display for LatestReading {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "patient_id={} | heart_rate={} | spo2={} | glucose={} | time={}",
            self.patient_id,
            opt(&self.heart_rate),
            opt(&self.spo2),
            opt(&self.glucose),
            reading_time(&self.timestmp)
        )
    }
}

/// A reading matched by one of the out-of-range rules.
#[derive(Clone, Debug, PartialEq, DeserializeRow)]
pub struct FlaggedReading {
    pub patient_id: String,
    pub name: Option<String>,
    pub heart_rate: Option<i32>,
    pub glucose: Option<i32>,
    pub spo2: Option<i32>,
    pub timestmp: Option<CqlTimeuuid>,
}

impl FlaggedReading {
    /// Merge key of the reading, `"None"` when the timestamp is missing.
    pub fn timestamp_key(&self) -> String {
        match &self.timestmp {
            None => "None".to_string(),
            Some(ts) => Uuid::from(*ts).to_string(),
        }
    }
}

impl Display for FlaggedReading {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "patient_id={} | name={} | heart_rate={} | glucose={} | spo2={} | time={}",
            self.patient_id,
            opt(&self.name),
            opt(&self.heart_rate),
            opt(&self.glucose),
            opt(&self.spo2),
            self.timestmp
                .as_ref()
                .map(reading_time)
                .unwrap_or_else(|| "None".to_string())
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeserializeRow)]
pub struct HeartRateSample {
    pub patient_id: String,
    pub name: Option<String>,
    pub heart_rate: Option<i32>,
    pub timestmp: CqlTimeuuid,
}

#[derive(Clone, Debug, PartialEq, DeserializeRow)]
pub struct DeviceSummary {
    pub device_id: String,
    pub device_name: Option<String>,
}

impl Display for DeviceSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "device_id={} | device_name={}",
            self.device_id,
            opt(&self.device_name)
        )
    }
}

/// Closed time range used by the interval query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub fn parse(start: &str, end: &str) -> Result<Interval, HospitalError> {
        Ok(Interval {
            start: parse_date_time(start)?,
            end: parse_date_time(end)?,
        })
    }

    /// An interval whose start lies after its end matches nothing.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn bounds(&self) -> (CqlTimestamp, CqlTimestamp) {
        (
            CqlTimestamp(self.start.and_utc().timestamp_millis()),
            CqlTimestamp(self.end.and_utc().timestamp_millis()),
        )
    }
}

fn parse_date_time(text: &str) -> Result<NaiveDateTime, HospitalError> {
    NaiveDateTime::parse_from_str(text.trim(), DATE_TIME_FORMAT).map_err(|err| {
        HospitalError::invalid_input(format!(
            "'{}' is not a date-time in YYYY-MM-DD HH:MM:SS format: {}",
            text.trim(),
            err
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_parse() {
        let interval = Interval::parse("2025-01-01 08:00:00", " 2025-01-01 09:30:00 ").unwrap();

        assert!(!interval.is_empty());
        let (start, end) = interval.bounds();
        assert_eq!(end.0 - start.0, 90 * 60 * 1000);
    }

    #[test]
    fn test_interval_inverted() {
        let interval = Interval::parse("2025-01-02 00:00:00", "2025-01-01 00:00:00").unwrap();
        assert!(interval.is_empty());
    }

    #[test]
    fn test_interval_bad_format() {
        let res = Interval::parse("01/02/2025", "2025-01-01 00:00:00");
        assert!(matches!(res, Err(HospitalError::InvalidInput(_))));
    }

    #[test]
    fn test_reading_ids_are_time_ordered() {
        let ids = (0..50).map(|_| next_reading_id()).collect::<Vec<_>>();

        let ticks = ids
            .iter()
            .map(|id| {
                let uuid = Uuid::from(*id);
                assert_eq!(uuid.get_version_num(), 1);
                let (secs, nanos) = uuid.get_timestamp().unwrap().to_unix();
                (secs, nanos)
            })
            .collect::<Vec<_>>();

        assert!(ticks.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_reading_time_display() {
        let id = next_reading_id();
        let rendered = reading_time(&id);
        assert!(NaiveDateTime::parse_from_str(&rendered, DATE_TIME_FORMAT).is_ok());
    }

    #[test]
    fn test_flagged_key_without_timestamp() {
        let reading = FlaggedReading {
            patient_id: "P001".to_string(),
            name: None,
            heart_rate: Some(150),
            glucose: None,
            spo2: None,
            timestmp: None,
        };
        assert_eq!(reading.timestamp_key(), "None");
        assert!(reading.to_string().ends_with("time=None"));
    }
}
