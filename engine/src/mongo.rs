use crate::connection::MongoConnection;
use chrono::{Datelike, NaiveDate};
use error::HospitalError;
use futures_util::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Cursor, Database};
use std::time::Duration;
use tracing::{debug, info};

const PATIENTS: &str = "pacientes";
const MEDICINES: &str = "medicamentos";
const RECORDS: &str = "expedientes";

/// Client on the hospital records database.
#[derive(Clone, Debug)]
pub struct MongoDB {
    client: Client,
    database: Database,
}

impl MongoDB {
    pub async fn connect(connector: MongoConnection) -> Result<MongoDB, HospitalError> {
        let mut client_options = ClientOptions::parse(&connector.uri)
            .await
            .map_err(HospitalError::document)?;
        client_options.server_selection_timeout = Some(Duration::from_millis(
            connector.server_selection_timeout_ms,
        ));

        let client = Client::with_options(client_options).map_err(HospitalError::document)?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(HospitalError::document)?;
        info!("☑️ Connected to mongoDB database {}", connector.database);

        let database = client.database(&connector.database);
        Ok(MongoDB { client, database })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }

    pub async fn all_patients(&self) -> Result<Vec<Document>, HospitalError> {
        let cursor = self
            .collection(PATIENTS)
            .find(doc! {})
            .projection(doc! {
                "_id": 0, "Paciente_ID": 1, "Nombre": 1, "Apellido": 1,
                "Telefono": 1, "Domicilio.Ciudad": 1, "Fecha_de_Nacimiento": 1
            })
            .await
            .map_err(HospitalError::document)?;
        collect(cursor).await
    }

    pub async fn patient_by_id(&self, patient_id: &str) -> Result<Option<Document>, HospitalError> {
        self.collection(PATIENTS)
            .find_one(doc! { "Paciente_ID": patient_id })
            .projection(doc! { "_id": 0 })
            .await
            .map_err(HospitalError::document)
    }

    pub async fn patients_with_allergies(&self) -> Result<Vec<Document>, HospitalError> {
        let cursor = self
            .collection(PATIENTS)
            .find(doc! { "Alergias": { "$nin": ["[]", "", Bson::Null] } })
            .projection(doc! {
                "_id": 0, "Paciente_ID": 1, "Nombre": 1, "Apellido": 1, "Alergias": 1
            })
            .await
            .map_err(HospitalError::document)?;
        collect(cursor).await
    }

    /// Case-insensitive substring match on first or last name.
    pub async fn search_patients_by_name(&self, text: &str) -> Result<Vec<Document>, HospitalError> {
        let pattern = regex::escape(text);
        let cursor = self
            .collection(PATIENTS)
            .find(doc! {
                "$or": [
                    { "Nombre": { "$regex": pattern.as_str(), "$options": "i" } },
                    { "Apellido": { "$regex": pattern.as_str(), "$options": "i" } },
                ]
            })
            .projection(doc! {
                "_id": 0, "Paciente_ID": 1, "Nombre": 1, "Apellido": 1, "Telefono": 1
            })
            .await
            .map_err(HospitalError::document)?;
        collect(cursor).await
    }

    pub async fn all_medicines(&self) -> Result<Vec<Document>, HospitalError> {
        let cursor = self
            .collection(MEDICINES)
            .find(doc! {})
            .projection(doc! { "_id": 0 })
            .await
            .map_err(HospitalError::document)?;
        collect(cursor).await
    }

    pub async fn medicines_by_active_ingredient(
        &self,
        ingredient: &str,
    ) -> Result<Vec<Document>, HospitalError> {
        let cursor = self
            .collection(MEDICINES)
            .find(doc! {
                "Principio_Activo": { "$regex": regex::escape(ingredient), "$options": "i" }
            })
            .projection(doc! {
                "_id": 0, "Medicamento_ID": 1, "Nombre": 1, "Dosis": 1, "Stock": 1
            })
            .await
            .map_err(HospitalError::document)?;
        collect(cursor).await
    }

    /// Medicines with at most `limit` units left, lowest stock first.
    pub async fn medicines_low_stock(&self, limit: i64) -> Result<Vec<Document>, HospitalError> {
        let cursor = self
            .collection(MEDICINES)
            .find(doc! { "Stock": { "$lte": limit } })
            .projection(doc! { "_id": 0 })
            .sort(doc! { "Stock": 1 })
            .await
            .map_err(HospitalError::document)?;
        collect(cursor).await
    }

    /// Records are keyed by the numeric patient id.
    pub async fn clinical_record_by_patient_id(
        &self,
        patient_id: &str,
    ) -> Result<Option<Document>, HospitalError> {
        let id = patient_id.trim().parse::<i64>().map_err(|_| {
            HospitalError::invalid_input(format!(
                "clinical records use numeric patient ids, got '{}'",
                patient_id
            ))
        })?;

        self.collection(RECORDS)
            .find_one(doc! { "Paciente_ID": id })
            .projection(doc! { "_id": 0 })
            .await
            .map_err(HospitalError::document)
    }

    pub async fn frequent_diagnoses(&self, limit: i64) -> Result<Vec<Document>, HospitalError> {
        let cursor = self
            .collection(RECORDS)
            .aggregate(frequent_diagnoses_pipeline(limit))
            .await
            .map_err(HospitalError::document)?;
        collect(cursor).await
    }

    pub async fn patients_on_treatment(&self, medicine: &str) -> Result<Vec<Document>, HospitalError> {
        let cursor = self
            .collection(RECORDS)
            .aggregate(treatment_pipeline(medicine))
            .await
            .map_err(HospitalError::document)?;
        collect(cursor).await
    }

    pub(crate) async fn stop(self) -> Result<(), HospitalError> {
        self.client.shutdown().await;
        info!("Closed mongoDB connection");
        Ok(())
    }
}

async fn collect(cursor: Cursor<Document>) -> Result<Vec<Document>, HospitalError> {
    let documents = cursor
        .try_collect::<Vec<_>>()
        .await
        .map_err(HospitalError::document)?;
    debug!("mongo returned {} document(s)", documents.len());
    Ok(documents)
}

pub fn frequent_diagnoses_pipeline(limit: i64) -> Vec<Document> {
    vec![
        doc! { "$unwind": "$Diagnosticos" },
        doc! { "$group": { "_id": "$Diagnosticos", "cantidad": { "$sum": 1 } } },
        doc! { "$sort": { "cantidad": -1 } },
        doc! { "$limit": limit },
    ]
}

/// Records treated with `medicine`, joined with the patient's name and keeping only
/// the matching treatments.
pub fn treatment_pipeline(medicine: &str) -> Vec<Document> {
    let pattern = regex::escape(medicine);
    vec![
        doc! { "$match": { "Tratamientos.medicamento": { "$regex": pattern.as_str(), "$options": "i" } } },
        doc! { "$lookup": {
            "from": PATIENTS,
            "localField": "Paciente_ID",
            "foreignField": "Paciente_ID",
            "as": "paciente_info",
        } },
        doc! { "$unwind": "$paciente_info" },
        doc! { "$project": {
            "_id": 0,
            "Paciente_ID": 1,
            "Nombre": "$paciente_info.Nombre",
            "Apellido": "$paciente_info.Apellido",
            "Tratamiento": {
                "$filter": {
                    "input": "$Tratamientos",
                    "as": "t",
                    "cond": { "$regexMatch": {
                        "input": "$$t.medicamento",
                        "regex": pattern.as_str(),
                        "options": "i",
                    } },
                }
            },
        } },
    ]
}

/// Field rendered for display; missing fields are empty.
pub fn field(document: &Document, key: &str) -> String {
    match document.get(key) {
        None | Some(Bson::Null) => String::new(),
        Some(Bson::String(s)) => s.clone(),
        Some(Bson::Int32(i)) => i.to_string(),
        Some(Bson::Int64(i)) => i.to_string(),
        Some(Bson::Double(d)) => d.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Full years since `birth_date` (`YYYY-MM-DD`) on `today`.
pub fn age_on(birth_date: &str, today: NaiveDate) -> Option<i32> {
    let birth = NaiveDate::parse_from_str(birth_date.trim(), "%Y-%m-%d").ok()?;
    let had_birthday = (today.month(), today.day()) >= (birth.month(), birth.day());
    Some(today.year() - birth.year() - if had_birthday { 0 } else { 1 })
}
