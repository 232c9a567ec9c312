//! Budget, ledger and KPI endpoints.

use anyhow::Result;
use serde_json::Value;

use super::{Api, into_items, segment};
use crate::http::{MultipartForm, RequestOptions};

impl Api {
    /// `GET /bills/{id}/ledger`.
    pub fn ledger(&self, bill_id: &str) -> Result<Vec<Value>> {
        let value = self.http.value(
            &format!("/bills/{}/ledger", segment(bill_id)),
            RequestOptions::get(),
        )?;
        Ok(into_items(value))
    }

    /// `GET /budget/summary`.
    pub fn budget_summary(&self) -> Result<Value> {
        self.http.value("/budget/summary", RequestOptions::get())
    }

    /// `POST /budget/import`: multipart statement upload.
    pub fn import_budget(&self, form: MultipartForm) -> Result<Value> {
        self.http
            .value("/budget/import", RequestOptions::multipart(form))
    }

    /// `GET /kpi/datasets`.
    pub fn kpi_datasets(&self) -> Result<Vec<Value>> {
        let value = self.http.value("/kpi/datasets", RequestOptions::get())?;
        Ok(into_items(value))
    }

    /// `POST /kpi/upload`: multipart dataset upload.
    pub fn upload_kpi(&self, form: MultipartForm) -> Result<Value> {
        self.http.value("/kpi/upload", RequestOptions::multipart(form))
    }
}
