use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::{Notification, NotificationError};

pub struct NotificationService {
    db: PostgrestClient,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Notification>, NotificationError> {
        debug!("Fetching notifications for user: {}", user_id);

        let path = format!(
            "/rest/v1/notifications?user_id=eq.{}&order=created_at.desc",
            user_id
        );
        let result: Vec<Value> = self
            .db
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Notification>, _>>()
            .map_err(|e| NotificationError::Database(format!("Failed to parse notifications: {}", e)))
    }

    pub async fn create(&self, user_id: i64, message: &str) -> Result<Notification, NotificationError> {
        let row = json!({
            "user_id": user_id,
            "message": message,
            "is_read": false,
            "created_at": Utc::now().to_rfc3339()
        });

        let result = self
            .db
            .insert_returning("notifications", row)
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        let created = result
            .first()
            .ok_or_else(|| NotificationError::Database("Failed to create notification".to_string()))?;

        serde_json::from_value(created.clone())
            .map_err(|e| NotificationError::Database(format!("Failed to parse notification: {}", e)))
    }

    pub async fn mark_read(&self, notification_id: i64) -> Result<(), NotificationError> {
        let path = format!("/rest/v1/notifications?id=eq.{}", notification_id);
        let updated = self
            .db
            .update_returning(&path, json!({ "is_read": true }))
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        if updated.is_empty() {
            return Err(NotificationError::NotFound);
        }

        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<(), NotificationError> {
        let path = format!("/rest/v1/notifications?user_id=eq.{}", user_id);
        // No rows is fine here: the user simply has no notifications.
        self.db
            .update_returning(&path, json!({ "is_read": true }))
            .await
            .map_err(|e| NotificationError::Database(e.to_string()))?;

        Ok(())
    }

    /// Fan-out on appointment creation. The two parties not acting get a
    /// message; the administrative account stands in for "the clinic" when a
    /// doctor or patient books.
    pub async fn appointment_booked(
        &self,
        creator_role: &str,
        doctor_id: i64,
        patient_id: i64,
        date: NaiveDate,
        admin_user_id: i64,
    ) -> Result<(), NotificationError> {
        match creator_role {
            "admin" => {
                self.create(
                    doctor_id,
                    &format!("A new appointment has been scheduled for you on {}", date),
                )
                .await?;
                self.create(
                    patient_id,
                    &format!("Your appointment has been scheduled on {}", date),
                )
                .await?;
            }
            "doctor" => {
                self.create(
                    patient_id,
                    &format!("A new appointment has been created by your doctor on {}", date),
                )
                .await?;
                self.create(
                    admin_user_id,
                    &format!("Doctor ID {} created a new appointment", doctor_id),
                )
                .await?;
            }
            "patient" => {
                self.create(
                    doctor_id,
                    &format!(
                        "A new appointment has been requested by patient ID {} on {}",
                        patient_id, date
                    ),
                )
                .await?;
                self.create(
                    admin_user_id,
                    &format!("Patient ID {} created a new appointment", patient_id),
                )
                .await?;
            }
            other => {
                debug!("No notification fan-out for creator role: {}", other);
            }
        }

        Ok(())
    }
}
