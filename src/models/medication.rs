use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A medication line on a prescription. Immutable once the prescription
/// is created; there is no update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub prescription_id: Uuid,
    /// Order within the prescription as the doctor wrote it.
    pub position: u32,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    /// Free text, e.g. "10 days". `None` when the doctor left it open.
    pub duration: Option<String>,
}

/// Input form for one medication on a new prescription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: Option<String>,
}
