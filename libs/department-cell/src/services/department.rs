use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;

use crate::models::{CreateDepartmentRequest, Department, DepartmentError};

pub struct DepartmentService {
    db: PostgrestClient,
}

impl DepartmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            db: PostgrestClient::new(config),
        }
    }

    pub async fn list_departments(&self) -> Result<Vec<Department>, DepartmentError> {
        debug!("Fetching all departments");

        let result: Vec<Value> = self
            .db
            .request(Method::GET, "/rest/v1/departments?order=department_name.asc", None)
            .await
            .map_err(|e| DepartmentError::Database(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Department>, _>>()
            .map_err(|e| DepartmentError::Database(format!("Failed to parse departments: {}", e)))
    }

    pub async fn create_department(
        &self,
        request: CreateDepartmentRequest,
    ) -> Result<Department, DepartmentError> {
        debug!("Creating department: {}", request.department_name);

        let row = json!({
            "department_name": request.department_name,
            "head_doctor_id": request.head_doctor_id,
            "location": request.location,
            "phone": request.phone
        });

        let result = self
            .db
            .insert_returning("departments", row)
            .await
            .map_err(|e| DepartmentError::Database(e.to_string()))?;

        let created = result
            .first()
            .ok_or_else(|| DepartmentError::Database("Failed to create department".to_string()))?;

        serde_json::from_value(created.clone())
            .map_err(|e| DepartmentError::Database(format!("Failed to parse department: {}", e)))
    }

    pub async fn delete_department(&self, department_id: i64) -> Result<(), DepartmentError> {
        debug!("Deleting department: {}", department_id);

        let path = format!("/rest/v1/departments?department_id=eq.{}", department_id);
        let deleted = self
            .db
            .delete_returning(&path)
            .await
            .map_err(|e| DepartmentError::Database(e.to_string()))?;

        if deleted.is_empty() {
            return Err(DepartmentError::NotFound);
        }

        Ok(())
    }
}
