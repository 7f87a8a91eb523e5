use crate::batch::{PreparedBatch, write_in_batches};
use crate::catalog::{self, VitalsQuery};
use crate::connection::CassandraConnection;
use crate::model::{
    ActivityReading, Alert, DeviceSummary, FlaggedReading, GlucoseReading, HeartRateSample,
    Interval, IntervalReading, LatestReading, VitalReading,
};
use crate::sample;
use crate::shaper::{HeartRateStats, Thresholds, merge_out_of_range};
use error::HospitalError;
use scylla::client::execution_profile::ExecutionProfile;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::deserialize::row::DeserializeRow;
use scylla::policies::load_balancing::DefaultPolicy;
use scylla::serialize::row::SerializeRow;
use scylla::statement::prepared::PreparedStatement;
use std::collections::HashMap;
use tracing::{debug, info};

/// Rows written by a populate run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopulateSummary {
    pub readings: usize,
    pub wearables: usize,
    pub batches: usize,
}

/// Session on the patient vitals keyspace with every catalog query prepared.
pub struct Cassandra {
    pub(crate) connector: CassandraConnection,
    session: Session,
    prepared_statements: HashMap<VitalsQuery, PreparedStatement>,
}

impl Cassandra {
    /// Connects, creates keyspace and tables when missing and prepares the catalog.
    pub async fn connect(connector: CassandraConnection) -> Result<Cassandra, HospitalError> {
        let policy = DefaultPolicy::builder()
            .prefer_datacenter(connector.local_dc.clone())
            .build();
        let profile = ExecutionProfile::builder()
            .load_balancing_policy(policy)
            .build();

        let session = SessionBuilder::new()
            .known_nodes(connector.nodes())
            .default_execution_profile_handle(profile.into_handle())
            .build()
            .await
            .map_err(HospitalError::wide_column)?;
        info!("☑️ Connected to cassandra cluster {}", connector.cluster_ips);

        let mut cassandra = Cassandra {
            connector,
            session,
            prepared_statements: HashMap::new(),
        };

        cassandra.create_keyspace().await?;
        cassandra.create_schema().await?;
        cassandra.prepare_catalog().await?;

        Ok(cassandra)
    }

    async fn create_keyspace(&self) -> Result<(), HospitalError> {
        let keyspace = &self.connector.keyspace;
        info!(
            "Creating keyspace {} with replication factor {}",
            keyspace, self.connector.replication_factor
        );
        let cql = catalog::create_keyspace(keyspace, self.connector.replication_factor)?;

        self.session
            .query_unpaged(cql, ())
            .await
            .map_err(HospitalError::wide_column)?;
        self.session
            .use_keyspace(keyspace, false)
            .await
            .map_err(HospitalError::wide_column)?;
        Ok(())
    }

    async fn create_schema(&self) -> Result<(), HospitalError> {
        info!("Creating tables...");
        for cql in catalog::SCHEMA {
            self.session
                .query_unpaged(cql, ())
                .await
                .map_err(HospitalError::wide_column)?;
        }
        info!("Tables created successfully.");
        Ok(())
    }

    async fn prepare_catalog(&mut self) -> Result<(), HospitalError> {
        for query in VitalsQuery::ALL {
            let statement = self.prepare(query.cql()).await?;
            self.prepared_statements.insert(query, statement);
        }
        debug!("prepared {} vitals queries", self.prepared_statements.len());
        Ok(())
    }

    async fn prepare(&self, cql: &str) -> Result<PreparedStatement, HospitalError> {
        self.session
            .prepare(cql)
            .await
            .map_err(HospitalError::wide_column)
    }

    fn statement(&self, query: VitalsQuery) -> Result<&PreparedStatement, HospitalError> {
        self.prepared_statements
            .get(&query)
            .ok_or_else(|| {
                HospitalError::wide_column(format!("No prepared statement for {:?}", query))
            })
    }

    /// Runs `query` unpaged and materializes every row.
    async fn rows<R>(
        &self,
        query: VitalsQuery,
        values: impl SerializeRow,
    ) -> Result<Vec<R>, HospitalError>
    where
        R: for<'frame, 'metadata> DeserializeRow<'frame, 'metadata>,
    {
        let result = self
            .session
            .execute_unpaged(self.statement(query)?, values)
            .await
            .map_err(HospitalError::wide_column)?
            .into_rows_result()
            .map_err(HospitalError::wide_column)?;

        let rows = result
            .rows::<R>()
            .map_err(HospitalError::wide_column)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(HospitalError::wide_column)?;

        debug!("{:?} returned {} row(s)", query, rows.len());
        Ok(rows)
    }

    /// Inserts the sample readings and wearables in batches.
    pub async fn populate_sample_data(&self) -> Result<PopulateSummary, HospitalError> {
        let readings = sample::readings();
        let wearables = sample::wearables();

        let reading_stmt = self.prepare(catalog::INSERT_READING).await?;
        let wearable_stmt = self.prepare(catalog::INSERT_WEAREABLE_INFO).await?;

        let mut batches =
            write_in_batches(&mut PreparedBatch::new(&self.session, &reading_stmt), &readings)
                .await?;
        batches +=
            write_in_batches(&mut PreparedBatch::new(&self.session, &wearable_stmt), &wearables)
                .await?;

        info!(
            "Populated {} readings and {} wearables in {} batches",
            readings.len(),
            wearables.len(),
            batches
        );
        Ok(PopulateSummary {
            readings: readings.len(),
            wearables: wearables.len(),
            batches,
        })
    }

    pub async fn insert_alert(&self, alert: &Alert) -> Result<(), HospitalError> {
        let stmt = self.prepare(catalog::INSERT_ALERT).await?;
        self.session
            .execute_unpaged(&stmt, alert)
            .await
            .map_err(HospitalError::wide_column)?;
        Ok(())
    }

    /// Q1: heart rate, steps and SpO2, newest first.
    pub async fn data_by_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<ActivityReading>, HospitalError> {
        self.rows(VitalsQuery::DataByPatient, (patient_id,)).await
    }

    /// Q2: heart rate and glucose inside `interval`.
    pub async fn readings_by_interval(
        &self,
        patient_id: &str,
        interval: &Interval,
    ) -> Result<Vec<IntervalReading>, HospitalError> {
        if interval.is_empty() {
            debug!("empty interval {:?} for {}", interval, patient_id);
            return Ok(vec![]);
        }
        let (start, end) = interval.bounds();
        self.rows(VitalsQuery::ReadingsByInterval, (patient_id, start, end))
            .await
    }

    /// Q3
    pub async fn glucose_by_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<GlucoseReading>, HospitalError> {
        self.rows(VitalsQuery::GlucoseByPatient, (patient_id,)).await
    }

    /// Q4: newest reading of each listed patient.
    pub async fn last_read_by_patients(
        &self,
        patient_ids: &[String],
    ) -> Result<Vec<LatestReading>, HospitalError> {
        if patient_ids.is_empty() {
            return Ok(vec![]);
        }
        self.rows(VitalsQuery::LastReadByPatients, (patient_ids.to_vec(),))
            .await
    }

    /// Q5
    pub async fn last_read_by_patient(
        &self,
        patient_id: &str,
    ) -> Result<Option<VitalReading>, HospitalError> {
        let rows: Vec<VitalReading> = self
            .rows(VitalsQuery::LastReadByPatient, (patient_id,))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Q6: readings breaking any of the limits, merged by timestamp.
    pub async fn out_of_range_by_patient(
        &self,
        patient_id: &str,
        thresholds: &Thresholds,
    ) -> Result<Vec<FlaggedReading>, HospitalError> {
        let mut rule_matches = vec![];
        for (query, limit) in [
            (VitalsQuery::HeartRateAbove, thresholds.heart_rate_above),
            (VitalsQuery::GlucoseAbove, thresholds.glucose_above),
            (VitalsQuery::Spo2Below, thresholds.spo2_below),
        ] {
            rule_matches.push(self.rows::<FlaggedReading>(query, (patient_id, limit)).await?);
        }
        Ok(merge_out_of_range(rule_matches))
    }

    /// Q7
    pub async fn heart_rate_stats(&self, patient_id: &str) -> Result<HeartRateStats, HospitalError> {
        let samples: Vec<HeartRateSample> = self
            .rows(VitalsQuery::HeartRateByPatient, (patient_id,))
            .await?;
        Ok(HeartRateStats::from_samples(
            samples.into_iter().map(|s| s.heart_rate),
        ))
    }

    /// Q8
    pub async fn last_reads_by_patient(
        &self,
        patient_id: &str,
        n: i32,
    ) -> Result<Vec<VitalReading>, HospitalError> {
        if n < 1 {
            return Err(HospitalError::invalid_input(format!(
                "number of reads must be at least 1, got {}",
                n
            )));
        }
        self.rows(VitalsQuery::LastReadsByPatient, (patient_id, n))
            .await
    }

    /// Q9: `Ok(0)` when the store returns no row.
    pub async fn readings_count(&self, patient_id: &str) -> Result<i64, HospitalError> {
        let rows: Vec<(i64,)> = self
            .rows(VitalsQuery::CountReadings, (patient_id,))
            .await?;
        Ok(rows.first().map(|(cnt,)| *cnt).unwrap_or(0))
    }

    /// Q10
    pub async fn wearable_by_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<DeviceSummary>, HospitalError> {
        self.rows(VitalsQuery::WearableByPatient, (patient_id,))
            .await
    }

    pub(crate) async fn stop(self) -> Result<(), HospitalError> {
        drop(self.session);
        info!("Closed cassandra session on {}", self.connector.keyspace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Settings;
    use crate::model::next_reading_id;

    async fn connect() -> Cassandra {
        let settings = Settings::from_env().unwrap();
        Cassandra::connect(settings.cassandra).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "needs a running cassandra node"]
    async fn test_populate_and_query() {
        let cassandra = connect().await;

        let summary = cassandra.populate_sample_data().await.unwrap();
        assert_eq!(summary.batches, 2);

        let latest = cassandra.last_read_by_patient("P009").await.unwrap().unwrap();
        assert_eq!(latest.heart_rate, Some(160));

        assert!(cassandra.readings_count("P009").await.unwrap() >= 1);
        assert_eq!(cassandra.readings_count("no-such-patient").await.unwrap(), 0);

        let flagged = cassandra
            .out_of_range_by_patient("P015", &Thresholds::default())
            .await
            .unwrap();
        assert!(!flagged.is_empty());

        let devices = cassandra.wearable_by_patient("P001").await.unwrap();
        assert!(devices.iter().any(|d| d.device_id == "D001"));

        cassandra.stop().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "needs a running cassandra node"]
    async fn test_inverted_interval_is_empty() {
        let cassandra = connect().await;
        let interval = Interval::parse("2030-01-01 00:00:00", "2020-01-01 00:00:00").unwrap();

        let rows = cassandra.readings_by_interval("P001", &interval).await.unwrap();

        assert!(rows.is_empty());
    }

    #[tokio::test]
    #[ignore = "needs a running cassandra node"]
    async fn test_insert_alert() {
        let cassandra = connect().await;
        let alert = Alert {
            alert_id: "A001".to_string(),
            patient_id: "P009".to_string(),
            alert_type: "heart_rate".to_string(),
            value: 160,
            threshold: 140,
            severity: "high".to_string(),
            description: "heart rate above limit".to_string(),
            timestmp: next_reading_id(),
        };

        cassandra.insert_alert(&alert).await.unwrap();
    }
}
