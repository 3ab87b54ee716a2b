use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::estimate::latest_end_date;
use crate::models::*;

/// Insert a doctor-authored prescription and its medications in one
/// transaction. The estimated end date is computed here, at creation time;
/// it is never recomputed afterwards.
pub fn insert_prescription(
    conn: &mut Connection,
    input: &NewPrescription,
) -> Result<Prescription, DatabaseError> {
    if input.medications.is_empty() {
        return Err(DatabaseError::ConstraintViolation(
            "prescription requires at least one medication".to_string(),
        ));
    }

    let estimated_end_date = latest_end_date(
        input.issue_date,
        input.medications.iter().map(|m| m.duration.as_deref()),
    );

    let id = Uuid::new_v4();
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO prescriptions (id, patient_id, doctor_id, issue_date, diagnosis,
         notes, estimated_end_date, needs_refill_soon)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
        params![
            id.to_string(),
            input.patient_id.to_string(),
            input.doctor_id.to_string(),
            input.issue_date.to_string(),
            input.diagnosis,
            input.notes,
            estimated_end_date.map(|d| d.to_string()),
        ],
    )?;

    let mut medications = Vec::with_capacity(input.medications.len());
    for (position, med) in input.medications.iter().enumerate() {
        let med_id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO medications (id, prescription_id, position, name, dosage, frequency, duration)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                med_id.to_string(),
                id.to_string(),
                position as u32,
                med.name,
                med.dosage,
                med.frequency,
                med.duration,
            ],
        )?;
        medications.push(Medication {
            id: med_id,
            prescription_id: id,
            position: position as u32,
            name: med.name.clone(),
            dosage: med.dosage.clone(),
            frequency: med.frequency.clone(),
            duration: med.duration.clone(),
        });
    }

    tx.commit()?;

    Ok(Prescription {
        id,
        patient_id: input.patient_id,
        doctor_id: input.doctor_id,
        issue_date: input.issue_date,
        diagnosis: input.diagnosis.clone(),
        notes: input.notes.clone(),
        medications,
        estimated_end_date,
        needs_refill_soon: false,
    })
}

/// Load one prescription with its medications in written order.
pub fn get_prescription(conn: &Connection, id: &Uuid) -> Result<Prescription, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, doctor_id, issue_date, diagnosis, notes,
         estimated_end_date, needs_refill_soon
         FROM prescriptions WHERE id = ?1",
    )?;

    let row = stmt
        .query_map(params![id.to_string()], |row| Ok(prescription_row_from_rusqlite(row)))?
        .next()
        .ok_or_else(|| DatabaseError::NotFound {
            entity_type: "prescription".to_string(),
            id: id.to_string(),
        })?;

    let mut prescription = prescription_from_row(row??)?;
    prescription.medications = get_medications(conn, id)?;
    Ok(prescription)
}

/// All prescriptions for one patient, newest issue date first.
pub fn get_prescriptions_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, doctor_id, issue_date, diagnosis, notes,
         estimated_end_date, needs_refill_soon
         FROM prescriptions WHERE patient_id = ?1 ORDER BY issue_date DESC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok(prescription_row_from_rusqlite(row))
    })?;

    let mut prescriptions = Vec::new();
    for row in rows {
        let mut prescription = prescription_from_row(row??)?;
        prescription.medications = get_medications(conn, &prescription.id)?;
        prescriptions.push(prescription);
    }
    Ok(prescriptions)
}

fn get_medications(conn: &Connection, prescription_id: &Uuid) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, prescription_id, position, name, dosage, frequency, duration
         FROM medications WHERE prescription_id = ?1 ORDER BY position ASC",
    )?;

    let rows = stmt.query_map(params![prescription_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, u32>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, Option<String>>(6)?,
        ))
    })?;

    let mut meds = Vec::new();
    for row in rows {
        let (id, rx_id, position, name, dosage, frequency, duration) = row?;
        meds.push(Medication {
            id: parse_uuid(&id)?,
            prescription_id: parse_uuid(&rx_id)?,
            position,
            name,
            dosage,
            frequency,
            duration,
        });
    }
    Ok(meds)
}

// ═══════════════════════════════════════════
// Refill scan queries
// ═══════════════════════════════════════════

/// The slice of a prescription the refill scan needs.
#[derive(Debug, Clone)]
pub struct RefillCandidate {
    pub id: Uuid,
    pub estimated_end_date: NaiveDate,
    pub needs_refill_soon: bool,
}

/// All prescriptions with a known estimated end date.
///
/// Rows without one are excluded at the query level — the scan never
/// reads them, so their flag value is retained untouched. Rows whose
/// stored date fails to parse are skipped with a diagnostic.
pub fn get_refill_candidates(conn: &Connection) -> Result<Vec<RefillCandidate>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, estimated_end_date, needs_refill_soon
         FROM prescriptions WHERE estimated_end_date IS NOT NULL",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i32>(2)?,
        ))
    })?;

    let mut candidates = Vec::new();
    for row in rows {
        let (id, end_date, needs_refill_soon) = row?;
        let Ok(estimated_end_date) = NaiveDate::parse_from_str(&end_date, "%Y-%m-%d") else {
            tracing::warn!(prescription_id = %id, value = %end_date, "Unparseable estimated_end_date, skipping row");
            continue;
        };
        candidates.push(RefillCandidate {
            id: parse_uuid(&id)?,
            estimated_end_date,
            needs_refill_soon: needs_refill_soon != 0,
        });
    }
    Ok(candidates)
}

/// Flip the refill-soon flag on one prescription.
pub fn set_needs_refill_soon(
    conn: &Connection,
    id: &Uuid,
    flag: bool,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE prescriptions SET needs_refill_soon = ?1 WHERE id = ?2",
        params![flag as i32, id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "prescription".to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

// Internal row type for Prescription mapping
struct PrescriptionRow {
    id: String,
    patient_id: String,
    doctor_id: String,
    issue_date: String,
    diagnosis: String,
    notes: Option<String>,
    estimated_end_date: Option<String>,
    needs_refill_soon: i32,
}

fn prescription_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PrescriptionRow, rusqlite::Error> {
    Ok(PrescriptionRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        issue_date: row.get(3)?,
        diagnosis: row.get(4)?,
        notes: row.get(5)?,
        estimated_end_date: row.get(6)?,
        needs_refill_soon: row.get(7)?,
    })
}

fn prescription_from_row(row: PrescriptionRow) -> Result<Prescription, DatabaseError> {
    let estimated_end_date = row.estimated_end_date.and_then(|d| {
        let parsed = NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok();
        if parsed.is_none() {
            tracing::warn!(prescription_id = %row.id, value = %d, "Unparseable estimated_end_date, treating as absent");
        }
        parsed
    });

    Ok(Prescription {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        doctor_id: parse_uuid(&row.doctor_id)?,
        issue_date: NaiveDate::parse_from_str(&row.issue_date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        diagnosis: row.diagnosis,
        notes: row.notes,
        medications: Vec::new(),
        estimated_end_date,
        needs_refill_soon: row.needs_refill_soon != 0,
    })
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
