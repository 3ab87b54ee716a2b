use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::medication::{Medication, NewMedication};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub issue_date: NaiveDate,
    pub diagnosis: String,
    pub notes: Option<String>,
    /// At least one, in the order the doctor wrote them.
    pub medications: Vec<Medication>,
    /// Latest computed end date across medications; `None` when no
    /// medication has a parseable duration.
    pub estimated_end_date: Option<NaiveDate>,
    /// Only the refill scan mutates this.
    pub needs_refill_soon: bool,
}

/// Input form for a doctor-authored prescription. The estimated end date
/// is computed at creation time, never supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrescription {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub issue_date: NaiveDate,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub medications: Vec<NewMedication>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prescription_serializes() {
        let id = Uuid::new_v4();
        let prescription = Prescription {
            id,
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            diagnosis: "Sinusitis".to_string(),
            notes: None,
            medications: vec![Medication {
                id: Uuid::new_v4(),
                prescription_id: id,
                position: 0,
                name: "Amoxicillin".to_string(),
                dosage: "500mg".to_string(),
                frequency: "twice daily".to_string(),
                duration: Some("7 days".to_string()),
            }],
            estimated_end_date: Some(NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()),
            needs_refill_soon: false,
        };

        let json = serde_json::to_string(&prescription).unwrap();
        assert!(json.contains("\"estimated_end_date\":\"2024-03-08\""));
        assert!(json.contains("\"needs_refill_soon\":false"));
        assert!(json.contains("\"issue_date\":\"2024-03-01\""));
    }
}
