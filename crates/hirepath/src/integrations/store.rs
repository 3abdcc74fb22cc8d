use async_trait::async_trait;
use serde::Deserialize;

use crate::config::BackendConfig;
use crate::workflows::intake::domain::ApplicationId;
use crate::workflows::intake::repository::{
    ApplicationStore, NewApplication, NewEducationRow, NewEmploymentRow, StoreError,
};

/// Relational store speaking the hosted backend's PostgREST-style API.
///
/// Each insert is an independent HTTP call; the submission sequencing in the
/// intake service is the only ordering guarantee, there is no transaction.
pub struct RestApplicationStore {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestApplicationStore {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            anon_key: config.anon_key.clone(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn insert_rows<T: serde::Serialize>(
        &self,
        table: &'static str,
        rows: &T,
        want_representation: bool,
    ) -> Result<reqwest::Response, StoreError> {
        let prefer = if want_representation {
            "return=representation"
        } else {
            "return=minimal"
        };
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Prefer", prefer)
            .json(rows)
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                table,
                message: format!("{status}: {message}"),
            });
        }

        Ok(response)
    }
}

#[derive(Debug, Deserialize)]
struct InsertedApplication {
    id: String,
}

#[async_trait]
impl ApplicationStore for RestApplicationStore {
    async fn insert_application(
        &self,
        row: NewApplication,
    ) -> Result<ApplicationId, StoreError> {
        let response = self.insert_rows("applications", &row, true).await?;
        let inserted: Vec<InsertedApplication> = response
            .json()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let first = inserted.into_iter().next().ok_or(StoreError::Rejected {
            table: "applications",
            message: "insert returned no representation".to_string(),
        })?;
        Ok(ApplicationId(first.id))
    }

    async fn insert_education(&self, rows: Vec<NewEducationRow>) -> Result<(), StoreError> {
        self.insert_rows("education", &rows, false).await?;
        Ok(())
    }

    async fn insert_employment(&self, rows: Vec<NewEmploymentRow>) -> Result<(), StoreError> {
        self.insert_rows("employment_history", &rows, false).await?;
        Ok(())
    }
}
