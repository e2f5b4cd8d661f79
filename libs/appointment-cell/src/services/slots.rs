use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime, Timelike};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::{AppointmentError, SlotAvailability};

/// Slot grid step. All candidate slots are aligned to this.
pub const SLOT_STEP_MINUTES: u32 = 30;

/// Default clinic hours when a doctor has no configured window: a morning
/// block and an afternoon block, both inclusive of their last slot.
const DEFAULT_BLOCKS: [(u32, u32); 2] = [(9 * 60, 11 * 60 + 30), (14 * 60, 17 * 60)];

fn time_from_minutes(minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).expect("slot minutes within a day")
}

/// The fixed candidate grid: 09:00-11:30 and 14:00-17:00 in 30-minute steps.
pub fn default_slot_grid() -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    for (from, to) in DEFAULT_BLOCKS {
        let mut current = from;
        while current <= to {
            slots.push(time_from_minutes(current));
            current += SLOT_STEP_MINUTES;
        }
    }
    slots
}

/// Candidate grid for a configured (from, to) window: walk from the start in
/// 30-minute steps, stopping before a step would pass the end time.
pub fn window_slot_grid(from: NaiveTime, to: NaiveTime) -> Vec<NaiveTime> {
    let start = from.hour() * 60 + from.minute();
    let end = to.hour() * 60 + to.minute();

    let mut slots = Vec::new();
    let mut current = start;
    while current <= end {
        slots.push(time_from_minutes(current));
        current += SLOT_STEP_MINUTES;
    }
    slots
}

/// "HH:MM" key used to compare candidate slots against stored times, which
/// may carry seconds.
pub fn slot_key(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

pub struct SlotService {
    db: PostgrestClient,
}

impl SlotService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    /// Computes the free/booked split for a doctor on a date. Read-only: the
    /// grid is derived on every call, never stored.
    pub async fn list_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<SlotAvailability, AppointmentError> {
        debug!("Listing slots for doctor {} on {}", doctor_id, date);

        let candidates = self.candidate_slots(doctor_id).await?;
        let booked = self.booked_times(doctor_id, date).await?;

        let mut all_slots = Vec::with_capacity(candidates.len());
        let mut booked_slots = Vec::new();
        let mut available_slots = Vec::new();

        for slot in &candidates {
            let key = slot_key(slot);
            if booked.contains(&key) {
                booked_slots.push(key.clone());
            } else {
                available_slots.push(key.clone());
            }
            all_slots.push(key);
        }

        Ok(SlotAvailability {
            doctor_id,
            date,
            all_slots,
            booked_slots,
            available_slots,
        })
    }

    /// Uses the doctor's configured availability window when present,
    /// otherwise the fixed clinic grid.
    async fn candidate_slots(&self, doctor_id: i64) -> Result<Vec<NaiveTime>, AppointmentError> {
        let path = format!(
            "/rest/v1/doctors?doctor_id=eq.{}&select=available_from,available_to",
            doctor_id
        );
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if let Some(doctor) = result.first() {
            let window = (
                parse_stored_time(&doctor["available_from"]),
                parse_stored_time(&doctor["available_to"]),
            );
            if let (Some(from), Some(to)) = window {
                return Ok(window_slot_grid(from, to));
            }
        }

        Ok(default_slot_grid())
    }

    async fn booked_times(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<HashSet<String>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&select=appointment_time",
            doctor_id, date
        );
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let booked = result
            .iter()
            .filter_map(|row| row["appointment_time"].as_str())
            .filter_map(normalize_time_key)
            .collect();

        Ok(booked)
    }
}

/// Truncates a stored time ("14:00:00" or "14:00") to its "HH:MM" key.
fn normalize_time_key(raw: &str) -> Option<String> {
    let time = NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()?;
    Some(slot_key(&time))
}

fn parse_stored_time(value: &Value) -> Option<NaiveTime> {
    value.as_str().and_then(|raw| {
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
    })
}
