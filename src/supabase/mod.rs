//! Supabase client - auth user lookup, catalog queries and row inserts
//! over the PostgREST HTTP API

pub mod submit;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::catalog::{CatalogExercise, CatalogQuery};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings, usually read from the environment
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Signed-in user's JWT; the anon key is used when absent
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct IdRow {
    id: String,
}

/// Row sink used by draft submission
pub trait Backend {
    /// Insert rows into `table`, returning the ids of the created rows in order
    async fn insert<R: Serialize + Sync>(&self, table: &str, rows: &[R]) -> Result<Vec<String>>;
}

/// HTTP client for one Supabase project
pub struct SupabaseClient {
    http: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self.config
            .access_token
            .as_deref()
            .unwrap_or(&self.config.anon_key);
        self.http
            .request(method, format!("{}{}", self.config.url.trim_end_matches('/'), path))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", bearer))
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = req.send().await.context("request to Supabase failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Supabase error ({}): {}", status, body);
        }
        resp.json().await.context("invalid JSON from Supabase")
    }

    /// `GET /auth/v1/user` - the signed-in trainer
    pub async fn current_user(&self) -> Result<AuthUser> {
        if self.config.access_token.is_none() {
            bail!("not signed in: SUPABASE_ACCESS_TOKEN is not set");
        }
        self.send_json(self.request(Method::GET, "/auth/v1/user")).await
    }

    /// `GET /rest/v1/exercicios` with the query's filters
    pub async fn list_exercises(&self, query: &CatalogQuery) -> Result<Vec<CatalogExercise>> {
        let req = self.request(Method::GET, "/rest/v1/exercicios").query(&query.to_params());
        let rows: Vec<CatalogExercise> = self.send_json(req).await?;
        debug!("Catalog returned {} exercises", rows.len());
        Ok(rows)
    }
}

impl Backend for SupabaseClient {
    async fn insert<R: Serialize + Sync>(&self, table: &str, rows: &[R]) -> Result<Vec<String>> {
        let req = self
            .request(Method::POST, &format!("/rest/v1/{}", table))
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
            .json(rows);
        let created: Vec<IdRow> = self
            .send_json(req)
            .await
            .with_context(|| format!("insert into {} failed", table))?;
        if created.len() != rows.len() {
            bail!("insert into {}: expected {} rows back, got {}", table, rows.len(), created.len());
        }
        info!("Inserted {} row(s) into {}", created.len(), table);
        Ok(created.into_iter().map(|r| r.id).collect())
    }
}
