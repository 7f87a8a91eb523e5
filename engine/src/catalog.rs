//! CQL statements for the patient vitals keyspace.
//!
//! Every read access pattern has exactly one template in [`VitalsQuery`]; the
//! console menu maps its options onto these one by one.

use error::HospitalError;

pub const CREATE_WEAREABLE_INFO_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS weareable_info (
        device_id TEXT PRIMARY KEY,
        device_name TEXT,
        patient_id TEXT
    )";

pub const CREATE_DATA_BY_PATIENT_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS data_by_patient (
        patient_id TEXT,
        name TEXT,
        steps INT,
        heart_rate INT,
        spo2 INT,
        glucose INT,
        timestmp TIMEUUID,
        PRIMARY KEY (patient_id, timestmp)
    ) WITH CLUSTERING ORDER BY (timestmp DESC)";

pub const CREATE_ALERTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS alerts_by_patient (
        alert_id TEXT,
        patient_id TEXT,
        alert_type TEXT,
        value INT,
        threshold INT,
        severity TEXT,
        description TEXT,
        timestmp TIMEUUID,
        PRIMARY KEY (patient_id, timestmp)
    ) WITH CLUSTERING ORDER BY (timestmp DESC)";

pub const SCHEMA: [&str; 3] = [
    CREATE_WEAREABLE_INFO_TABLE,
    CREATE_DATA_BY_PATIENT_TABLE,
    CREATE_ALERTS_TABLE,
];

pub const INSERT_READING: &str = "
    INSERT INTO data_by_patient (patient_id, name, steps, heart_rate, spo2, glucose, timestmp)
    VALUES (?, ?, ?, ?, ?, ?, ?)";

pub const INSERT_WEAREABLE_INFO: &str = "
    INSERT INTO weareable_info (device_id, device_name, patient_id)
    VALUES (?, ?, ?)";

pub const INSERT_ALERT: &str = "
    INSERT INTO alerts_by_patient (
        alert_id, patient_id, alert_type, value, threshold, severity, description, timestmp
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)";

/// `CREATE KEYSPACE` for `keyspace`, which must be a plain CQL identifier.
pub fn create_keyspace(keyspace: &str, replication_factor: u32) -> Result<String, HospitalError> {
    let mut chars = keyspace.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && keyspace.len() <= 48;
    if !valid {
        return Err(HospitalError::invalid_input(format!(
            "'{}' is not a valid keyspace name",
            keyspace
        )));
    }
    if replication_factor == 0 {
        return Err(HospitalError::invalid_input(
            "replication factor must be at least 1",
        ));
    }

    Ok(format!(
        "CREATE KEYSPACE IF NOT EXISTS {} \
        WITH replication = {{ 'class': 'SimpleStrategy', 'replication_factor': {} }}",
        keyspace, replication_factor
    ))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VitalsQuery {
    DataByPatient,
    ReadingsByInterval,
    GlucoseByPatient,
    LastReadByPatients,
    LastReadByPatient,
    HeartRateAbove,
    GlucoseAbove,
    Spo2Below,
    HeartRateByPatient,
    LastReadsByPatient,
    CountReadings,
    WearableByPatient,
}

impl VitalsQuery {
    pub const ALL: [VitalsQuery; 12] = [
        VitalsQuery::DataByPatient,
        VitalsQuery::ReadingsByInterval,
        VitalsQuery::GlucoseByPatient,
        VitalsQuery::LastReadByPatients,
        VitalsQuery::LastReadByPatient,
        VitalsQuery::HeartRateAbove,
        VitalsQuery::GlucoseAbove,
        VitalsQuery::Spo2Below,
        VitalsQuery::HeartRateByPatient,
        VitalsQuery::LastReadsByPatient,
        VitalsQuery::CountReadings,
        VitalsQuery::WearableByPatient,
    ];

    pub fn cql(&self) -> &'static str {
        match self {
            VitalsQuery::DataByPatient => {
                "SELECT patient_id, name, heart_rate, spo2, steps, timestmp \
                FROM data_by_patient \
                WHERE patient_id = ?"
            }
            VitalsQuery::ReadingsByInterval => {
                "SELECT patient_id, name, heart_rate, glucose, timestmp \
                FROM data_by_patient \
                WHERE patient_id = ? \
                AND timestmp >= minTimeuuid(?) \
                AND timestmp <= maxTimeuuid(?)"
            }
            VitalsQuery::GlucoseByPatient => {
                "SELECT patient_id, name, glucose, timestmp \
                FROM data_by_patient \
                WHERE patient_id = ?"
            }
            VitalsQuery::LastReadByPatients => {
                "SELECT patient_id, heart_rate, spo2, glucose, timestmp \
                FROM data_by_patient \
                WHERE patient_id IN ? \
                PER PARTITION LIMIT 1"
            }
            VitalsQuery::LastReadByPatient => {
                "SELECT * \
                FROM data_by_patient \
                WHERE patient_id = ? \
                LIMIT 1"
            }
            // the three threshold scans filter on regular columns
            VitalsQuery::HeartRateAbove => {
                "SELECT patient_id, name, heart_rate, glucose, spo2, timestmp \
                FROM data_by_patient \
                WHERE patient_id = ? AND heart_rate > ? \
                ALLOW FILTERING"
            }
            VitalsQuery::GlucoseAbove => {
                "SELECT patient_id, name, heart_rate, glucose, spo2, timestmp \
                FROM data_by_patient \
                WHERE patient_id = ? AND glucose > ? \
                ALLOW FILTERING"
            }
            VitalsQuery::Spo2Below => {
                "SELECT patient_id, name, heart_rate, glucose, spo2, timestmp \
                FROM data_by_patient \
                WHERE patient_id = ? AND spo2 < ? \
                ALLOW FILTERING"
            }
            VitalsQuery::HeartRateByPatient => {
                "SELECT patient_id, name, heart_rate, timestmp \
                FROM data_by_patient \
                WHERE patient_id = ?"
            }
            VitalsQuery::LastReadsByPatient => {
                "SELECT * \
                FROM data_by_patient \
                WHERE patient_id = ? \
                LIMIT ?"
            }
            VitalsQuery::CountReadings => {
                "SELECT COUNT(*) AS cnt \
                FROM data_by_patient \
                WHERE patient_id = ?"
            }
            VitalsQuery::WearableByPatient => {
                "SELECT device_id, device_name \
                FROM weareable_info \
                WHERE patient_id = ? \
                ALLOW FILTERING"
            }
        }
    }

    /// Names of the positional parameters, in binding order.
    pub fn params(&self) -> &'static [&'static str] {
        match self {
            VitalsQuery::ReadingsByInterval => &["patient_id", "start", "end"],
            VitalsQuery::LastReadByPatients => &["patient_ids"],
            VitalsQuery::HeartRateAbove | VitalsQuery::GlucoseAbove | VitalsQuery::Spo2Below => {
                &["patient_id", "threshold"]
            }
            VitalsQuery::LastReadsByPatient => &["patient_id", "n"],
            _ => &["patient_id"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_match_params() {
        for query in VitalsQuery::ALL {
            let placeholders = query.cql().matches('?').count();
            assert_eq!(placeholders, query.params().len(), "{:?}", query);
        }
    }

    #[test]
    fn test_threshold_queries_allow_filtering() {
        for query in [
            VitalsQuery::HeartRateAbove,
            VitalsQuery::GlucoseAbove,
            VitalsQuery::Spo2Below,
        ] {
            assert!(query.cql().ends_with("ALLOW FILTERING"));
        }
        assert!(!VitalsQuery::DataByPatient.cql().contains("ALLOW FILTERING"));
    }

    #[test]
    fn test_insert_placeholders() {
        assert_eq!(INSERT_READING.matches('?').count(), 7);
        assert_eq!(INSERT_WEAREABLE_INFO.matches('?').count(), 3);
        assert_eq!(INSERT_ALERT.matches('?').count(), 8);
    }

    #[test]
    fn test_create_keyspace() {
        let cql = create_keyspace("cassandra_project", 3).unwrap();
        assert!(cql.starts_with("CREATE KEYSPACE IF NOT EXISTS cassandra_project"));
        assert!(cql.contains("'replication_factor': 3"));
    }

    #[test]
    fn test_create_keyspace_rejects_bad_names() {
        for name in ["", "1abc", "ks; DROP TABLE x", "with-dash"] {
            assert!(create_keyspace(name, 1).is_err(), "{}", name);
        }
        assert!(create_keyspace("ks", 0).is_err());
    }
}
