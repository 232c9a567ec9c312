//! RAG search.

use anyhow::Result;
use serde_json::{Value, json};

use super::{Api, into_items};
use crate::http::RequestOptions;

impl Api {
    /// `POST /rag/query`: top `k` matching chunks for `query`.
    pub fn rag_query(&self, query: &str, k: usize) -> Result<Vec<Value>> {
        let value = self.http.value(
            "/rag/query",
            RequestOptions::post(json!({ "query": query, "k": k })),
        )?;
        Ok(into_items(value))
    }
}
