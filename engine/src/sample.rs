use crate::model::{VitalReading, WearableInfo, next_reading_id};

// patient_id, name, steps, heart_rate, spo2, glucose
pub const PATIENTS: [(&str, &str, i32, i32, i32, i32); 15] = [
    ("P001", "Carlos Hernandez", 2023, 98, 100, 100),
    ("P002", "Maria Lopez", 5026, 87, 96, 95),
    ("P003", "Jose Martinez", 7024, 76, 98, 87),
    ("P004", "Ana Garcia", 3500, 90, 97, 110),
    ("P005", "Luis Rodriguez", 12000, 65, 99, 80),
    ("P006", "Carlos Hernandez", 8000, 72, 95, 105),
    ("P007", "Miguel Sanchez", 4500, 145, 98, 92),
    ("P008", "Laura Ramirez", 2000, 68, 92, 66),
    ("P009", "Jorge Flores", 4000, 160, 100, 115),
    ("P010", "Elena Morales", 9500, 75, 97, 89),
    ("P011", "Ricardo Vargas", 11000, 80, 94, 78),
    ("P012", "Patricia Cruz", 3000, 130, 99, 120),
    ("P013", "Diego Navarro", 6000, 70, 96, 85),
    ("P014", "Lucia Herrera", 7500, 88, 93, 98),
    ("P015", "Fernando Castillo", 500, 155, 91, 130),
];

// device_id, device_name, patient_id
pub const WEARABLES: [(&str, &str, &str); 15] = [
    ("D001", "Fitbit Charge 5", "P001"),
    ("D002", "Apple Watch Series 7", "P002"),
    ("D003", "Garmin Venu 2", "P003"),
    ("D004", "Samsung Galaxy Watch 4", "P004"),
    ("D005", "Xiaomi Mi Band 6", "P005"),
    ("D006", "Huawei Watch GT 3", "P006"),
    ("D007", "Amazfit GTR 3", "P007"),
    ("D008", "Withings Steel HR", "P008"),
    ("D009", "Polar Vantage M2", "P009"),
    ("D010", "Suunto 7", "P010"),
    ("D011", "Fossil Gen 5E", "P011"),
    ("D012", "TicWatch Pro 3", "P012"),
    ("D013", "Honor Band 6", "P013"),
    ("D014", "Realme Watch S Pro", "P014"),
    ("D015", "Oura Ring Generation 3", "P015"),
];

/// One reading per sample patient, each stamped with a fresh identifier.
pub fn readings() -> Vec<VitalReading> {
    PATIENTS
        .iter()
        .map(
            |(patient_id, name, steps, heart_rate, spo2, glucose)| VitalReading {
                patient_id: patient_id.to_string(),
                name: Some(name.to_string()),
                steps: Some(*steps),
                heart_rate: Some(*heart_rate),
                spo2: Some(*spo2),
                glucose: Some(*glucose),
                timestmp: next_reading_id(),
            },
        )
        .collect()
}

pub fn wearables() -> Vec<WearableInfo> {
    WEARABLES
        .iter()
        .map(|(device_id, device_name, patient_id)| WearableInfo {
            device_id: device_id.to_string(),
            device_name: Some(device_name.to_string()),
            patient_id: Some(patient_id.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaper::Thresholds;
    use std::collections::HashSet;

    #[test]
    fn test_readings_have_unique_ids() {
        let readings = readings();
        let ids = readings
            .iter()
            .map(|r| uuid::Uuid::from(r.timestmp))
            .collect::<HashSet<_>>();

        assert_eq!(readings.len(), 15);
        assert_eq!(ids.len(), readings.len());
    }

    #[test]
    fn test_every_wearable_has_a_patient() {
        let patients = PATIENTS.iter().map(|p| p.0).collect::<HashSet<_>>();
        assert!(wearables().iter().all(|w| {
            w.patient_id
                .as_deref()
                .is_some_and(|id| patients.contains(id))
        }));
    }

    #[test]
    fn test_sample_contains_out_of_range_readings() {
        let limits = Thresholds::default();
        let flagged = PATIENTS
            .iter()
            .filter(|(_, _, _, hr, spo2, glucose)| {
                *hr > limits.heart_rate_above || *glucose > limits.glucose_above || *spo2 < limits.spo2_below
            })
            .map(|p| p.0)
            .collect::<Vec<_>>();

        assert_eq!(flagged, vec!["P007", "P009", "P015"]);
    }
}
