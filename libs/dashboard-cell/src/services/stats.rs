use chrono::Utc;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::{DashboardError, DashboardStats};

pub struct DashboardService {
    db: PostgrestClient,
}

impl DashboardService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, DashboardError> {
        debug!("Calculating dashboard statistics");

        let today = Utc::now().date_naive();

        let total_doctors = self.count("/rest/v1/doctors").await?;
        let total_patients = self.count("/rest/v1/patients").await?;
        let total_appointments = self.count("/rest/v1/appointments").await?;
        let upcoming_appointments = self
            .count(&format!("/rest/v1/appointments?appointment_date=gte.{}", today))
            .await?;

        Ok(DashboardStats {
            total_doctors,
            total_patients,
            total_appointments,
            upcoming_appointments,
        })
    }

    async fn count(&self, path: &str) -> Result<i64, DashboardError> {
        self.db
            .count(path)
            .await
            .map_err(|e| DashboardError::Database(e.to_string()))
    }
}
