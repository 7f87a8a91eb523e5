use crate::connection::Neo4jConnection;
use error::HospitalError;
use neo4rs::{Graph, query};
use std::fmt::Debug;
use tracing::{debug, info};

/// Uniqueness constraints and indexes of the care graph.
pub const SCHEMA: [&str; 9] = [
    "CREATE CONSTRAINT patient_id IF NOT EXISTS FOR (n:Patient) REQUIRE n.patient_id IS UNIQUE",
    "CREATE CONSTRAINT doctor_id IF NOT EXISTS FOR (n:Doctor) REQUIRE n.doctor_id IS UNIQUE",
    "CREATE CONSTRAINT medicine_id IF NOT EXISTS FOR (n:Medicine) REQUIRE n.medicine_id IS UNIQUE",
    "CREATE CONSTRAINT treatment_id IF NOT EXISTS FOR (n:Treatment) REQUIRE n.treatment_id IS UNIQUE",
    "CREATE CONSTRAINT diagnosis_id IF NOT EXISTS FOR (n:Diagnosis) REQUIRE n.diagnosis_id IS UNIQUE",
    "CREATE CONSTRAINT clinic_id IF NOT EXISTS FOR (n:Clinic) REQUIRE n.clinic_id IS UNIQUE",
    "CREATE CONSTRAINT contact_id IF NOT EXISTS FOR (n:EmergencyContact) REQUIRE n.contact_id IS UNIQUE",
    "CREATE INDEX doctor_specialty IF NOT EXISTS FOR (n:Doctor) ON (n.specialty)",
    "CREATE INDEX doctor_rating IF NOT EXISTS FOR (n:Doctor) ON (n.rating)",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphQuery {
    PrimaryCare,
    CareTeam,
    MedicationHistory,
    TreatmentPlan,
    DrugInteractions,
    CarePath,
    PatientsByDoctor,
    SpecialistRecommendation,
    EmergencyContacts,
    DoctorClinics,
}

impl GraphQuery {
    pub const ALL: [GraphQuery; 10] = [
        GraphQuery::PrimaryCare,
        GraphQuery::CareTeam,
        GraphQuery::MedicationHistory,
        GraphQuery::TreatmentPlan,
        GraphQuery::DrugInteractions,
        GraphQuery::CarePath,
        GraphQuery::PatientsByDoctor,
        GraphQuery::SpecialistRecommendation,
        GraphQuery::EmergencyContacts,
        GraphQuery::DoctorClinics,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            GraphQuery::PrimaryCare => "Primary care link",
            GraphQuery::CareTeam => "Care team of a patient",
            GraphQuery::MedicationHistory => "Medication history",
            GraphQuery::TreatmentPlan => "Treatment plan by diagnosis",
            GraphQuery::DrugInteractions => "Drug-drug interactions",
            GraphQuery::CarePath => "Care path of a patient",
            GraphQuery::PatientsByDoctor => "Patients by doctor",
            GraphQuery::SpecialistRecommendation => "Specialist recommendation",
            GraphQuery::EmergencyContacts => "Emergency contacts",
            GraphQuery::DoctorClinics => "Clinics of a doctor",
        }
    }

    /// Name of the identifying parameter the query is rooted at.
    pub fn parameter(&self) -> &'static str {
        match self {
            GraphQuery::PrimaryCare
            | GraphQuery::CareTeam
            | GraphQuery::MedicationHistory
            | GraphQuery::CarePath
            | GraphQuery::EmergencyContacts => "patient_id",
            GraphQuery::TreatmentPlan => "diagnosis_id",
            GraphQuery::DrugInteractions => "medicine_id",
            GraphQuery::PatientsByDoctor | GraphQuery::DoctorClinics => "doctor_id",
            GraphQuery::SpecialistRecommendation => "specialty",
        }
    }

    pub fn cypher(&self) -> &'static str {
        match self {
            GraphQuery::PrimaryCare => {
                "MATCH (p:Patient {patient_id: $patient_id}) \
                OPTIONAL MATCH (p)-[:HAS_PRIMARY_DOCTOR]->(d:Doctor) \
                RETURN p {.patient_id, .name, \
                    has_primary_doctor: collect(d {.doctor_id, .name, .specialty})} AS result"
            }
            GraphQuery::CareTeam => {
                "MATCH (p:Patient {patient_id: $patient_id}) \
                RETURN p {.patient_id, .name, \
                    has_primary_doctor: [(p)-[:HAS_PRIMARY_DOCTOR]->(d:Doctor) | d {.doctor_id, .name, .specialty}], \
                    care_team: [(p)-[:CARE_TEAM]->(d:Doctor) | d {.doctor_id, .name, .specialty}]} AS result"
            }
            GraphQuery::MedicationHistory => {
                "MATCH (p:Patient {patient_id: $patient_id}) \
                RETURN p {.patient_id, .name, \
                    treated_with: [(p)-[:TREATED_WITH]->(t:Treatment) | t {.treatment_id, .description, .route, .frequency, \
                        uses_medicine: [(t)-[:USES_MEDICINE]->(m:Medicine) | m {.medicine_id, .name, .dose_mg}]}]} AS result"
            }
            GraphQuery::TreatmentPlan => {
                "MATCH (g:Diagnosis {diagnosis_id: $diagnosis_id}) \
                RETURN g {.diagnosis_id, .name, \
                    treatments: [(t:Treatment)-[:FOR_DIAGNOSIS]->(g) | t {.treatment_id, .description, .route, .frequency, \
                        uses_medicine: [(t)-[:USES_MEDICINE]->(m:Medicine) | m {.medicine_id, .name, .dose_mg}]}]} AS result"
            }
            GraphQuery::DrugInteractions => {
                "MATCH (m:Medicine {medicine_id: $medicine_id}) \
                RETURN m {.medicine_id, .name, .dose_mg, \
                    interacts_with: [(m)-[:INTERACTS_WITH]->(o:Medicine) | o {.medicine_id, .name, .dose_mg}]} AS result"
            }
            GraphQuery::CarePath => {
                "MATCH (p:Patient {patient_id: $patient_id}) \
                RETURN p {.patient_id, .name, \
                    treated_with: [(p)-[:TREATED_WITH]->(t:Treatment) | t {.treatment_id, .description, .route, .frequency, \
                        for_diagnosis: [(t)-[:FOR_DIAGNOSIS]->(g:Diagnosis) | g {.diagnosis_id, .name}], \
                        uses_medicine: [(t)-[:USES_MEDICINE]->(m:Medicine) | m {.medicine_id, .name, .dose_mg}]}], \
                    has_primary_doctor: [(p)-[:HAS_PRIMARY_DOCTOR]->(d:Doctor) | d {.doctor_id, .name, .specialty}], \
                    care_team: [(p)-[:CARE_TEAM]->(d:Doctor) | d {.doctor_id, .name, .specialty}]} AS result"
            }
            GraphQuery::PatientsByDoctor => {
                "MATCH (d:Doctor {doctor_id: $doctor_id}) \
                RETURN d {.doctor_id, .name, .specialty, \
                    primary_patients: [(p:Patient)-[:HAS_PRIMARY_DOCTOR]->(d) | p {.patient_id, .name}], \
                    care_team_patients: [(p:Patient)-[:CARE_TEAM]->(d) | p {.patient_id, .name}]} AS result"
            }
            GraphQuery::SpecialistRecommendation => {
                "MATCH (d:Doctor {specialty: $specialty}) \
                WITH d ORDER BY d.rating DESC LIMIT $limit \
                RETURN d {.doctor_id, .name, .specialty, .rating, \
                    works_at: [(d)-[:WORKS_AT]->(c:Clinic) | c {.clinic_id, .name, .city}]} AS result"
            }
            GraphQuery::EmergencyContacts => {
                "MATCH (p:Patient {patient_id: $patient_id}) \
                RETURN p {.patient_id, .name, \
                    emergency_contact: [(p)-[:EMERGENCY_CONTACT]->(c:EmergencyContact) | c {.contact_id, .name, .phone, .relationship}]} AS result"
            }
            GraphQuery::DoctorClinics => {
                "MATCH (d:Doctor {doctor_id: $doctor_id}) \
                RETURN d {.doctor_id, .name, .specialty, \
                    works_at: [(d)-[:WORKS_AT]->(c:Clinic) | c {.clinic_id, .name, .city}]} AS result"
            }
        }
    }
}

/// Connection to the care graph.
#[derive(Clone)]
pub struct Neo4j {
    pub(crate) uri: String,
    pub(crate) graph: Graph,
}

impl Debug for Neo4j {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Neo4j")
    }
}

impl Neo4j {
    pub async fn connect(connector: Neo4jConnection) -> Result<Neo4j, HospitalError> {
        let graph = Graph::new(&connector.uri, connector.user.clone(), connector.password.clone())
            .map_err(HospitalError::graph)?;

        graph
            .run(query("RETURN 1"))
            .await
            .map_err(HospitalError::graph)?;
        info!("️️☑️ Connected to neo4j at {}", connector.uri);

        let neo = Neo4j {
            uri: connector.uri,
            graph,
        };
        neo.apply_schema().await?;
        Ok(neo)
    }

    pub async fn apply_schema(&self) -> Result<(), HospitalError> {
        for statement in SCHEMA {
            self.graph
                .run(query(statement))
                .await
                .map_err(HospitalError::graph)?;
        }
        info!("[OK] graph schema applied");
        Ok(())
    }

    /// Runs `kind` for `id`; one JSON map per matched root node.
    pub async fn lookup(
        &self,
        kind: GraphQuery,
        id: &str,
    ) -> Result<Vec<serde_json::Value>, HospitalError> {
        self.fetch(kind, query(kind.cypher()).param(kind.parameter(), id))
            .await
    }

    /// Best rated doctors of `specialty`.
    pub async fn recommend_specialists(
        &self,
        specialty: &str,
        limit: i64,
    ) -> Result<Vec<serde_json::Value>, HospitalError> {
        if limit < 1 {
            return Err(HospitalError::invalid_input(format!(
                "number of results must be at least 1, got {}",
                limit
            )));
        }
        let kind = GraphQuery::SpecialistRecommendation;
        self.fetch(
            kind,
            query(kind.cypher())
                .param(kind.parameter(), specialty)
                .param("limit", limit),
        )
        .await
    }

    async fn fetch(
        &self,
        kind: GraphQuery,
        cypher: neo4rs::Query,
    ) -> Result<Vec<serde_json::Value>, HospitalError> {
        let mut stream = self
            .graph
            .execute(cypher)
            .await
            .map_err(HospitalError::graph)?;

        let mut values = vec![];
        while let Some(row) = stream.next().await.map_err(HospitalError::graph)? {
            values.push(
                row.get::<serde_json::Value>("result")
                    .map_err(HospitalError::graph)?,
            );
        }
        debug!("{:?} returned {} value(s)", kind, values.len());
        Ok(values)
    }

    pub(crate) async fn stop(self) -> Result<(), HospitalError> {
        info!("Closed neo4j connection to {}", self.uri);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Settings;

    #[test]
    fn test_queries_bind_their_parameter() {
        for kind in GraphQuery::ALL {
            let placeholder = format!("${}", kind.parameter());
            assert!(kind.cypher().contains(&placeholder), "{:?}", kind);
            assert!(kind.cypher().ends_with("AS result"), "{:?}", kind);
        }
    }

    #[test]
    fn test_recommendation_is_ordered_and_limited() {
        let cypher = GraphQuery::SpecialistRecommendation.cypher();
        assert!(cypher.contains("ORDER BY d.rating DESC LIMIT $limit"));
    }

    #[test]
    fn test_schema_is_idempotent() {
        assert!(SCHEMA.iter().all(|s| s.contains("IF NOT EXISTS")));
    }

    #[tokio::test]
    #[ignore = "needs a running neo4j"]
    async fn test_lookup_unknown_patient() {
        let settings = Settings::from_env().unwrap();
        let neo = Neo4j::connect(settings.neo4j).await.unwrap();

        let res = neo
            .lookup(GraphQuery::PrimaryCare, "no-such-patient")
            .await
            .unwrap();
        assert!(res.is_empty());

        neo.stop().await.unwrap();
    }
}
