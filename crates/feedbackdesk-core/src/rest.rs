//! REST adapter for the hosted data platform.
//!
//! Tables live under `/rest/v1/{table}` with PostgREST-style filters, stored
//! procedures under `/rest/v1/rpc/{name}` and serverless functions under
//! `/functions/v1/{name}`. Every request carries the configured key both as
//! `apikey` and as a bearer token.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::config::CoreConfig;
use crate::error::AssistantError;
use crate::protocol::FeedbackInput;
use crate::store::{DataStore, FunctionInvoker, SecretSource};
use crate::types::Teacher;
use crate::upstream::check_status;

const TEACHER_COLUMNS: &str = "id,name,email";

/// Client for the platform's REST, RPC and function endpoints.
#[derive(Debug, Clone)]
pub struct RestStore {
    base: Url,
    key: String,
    client: Client,
}

impl RestStore {
    pub fn new(base_url: &str, key: impl Into<String>) -> Result<Self, AssistantError> {
        let base = Url::parse(base_url)
            .map_err(|e| AssistantError::BadRequest(format!("invalid store URL {base_url:?}: {e}")))?;
        let client = Client::builder()
            .user_agent(concat!("feedbackdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { base, key: key.into(), client })
    }

    pub fn from_config(config: &CoreConfig) -> Result<Self, AssistantError> {
        Self::new(&config.store_url, config.store_key.clone())
    }

    /// Same platform, different key (e.g. the service key on the server).
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self { base: self.base.clone(), key: key.into(), client: self.client.clone() }
    }

    fn endpoint(&self, path: &str) -> Result<Url, AssistantError> {
        self.base
            .join(path)
            .map_err(|e| AssistantError::BadRequest(format!("invalid endpoint {path:?}: {e}")))
    }

    fn table(&self, table: &str, filters: &[(&str, &str)]) -> Result<Url, AssistantError> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        if !filters.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in filters {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn select<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, AssistantError> {
        debug!(url = %url.path(), "select");
        let resp = self.authorized(self.client.get(url)).send().await?;
        let resp = check_status(resp).await.map_err(store_error)?;
        Ok(resp.json().await?)
    }

    async fn insert(&self, table: &str, row: &Value) -> Result<Value, AssistantError> {
        debug!(table, "insert");
        let resp = self
            .authorized(self.client.post(self.table(table, &[])?))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let resp = check_status(resp).await.map_err(store_error)?;
        let rows: Vec<Value> = resp.json().await?;
        Ok(rows.into_iter().next().unwrap_or(Value::Null))
    }

    async fn rpc(&self, name: &str, params: &Value) -> Result<Value, AssistantError> {
        debug!(procedure = name, "rpc");
        let resp = self
            .authorized(self.client.post(self.endpoint(&format!("rest/v1/rpc/{name}"))?))
            .json(params)
            .send()
            .await?;
        let resp = check_status(resp).await.map_err(store_error)?;
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Platform rejections surface as store errors; transport errors stay as-is.
fn store_error(e: AssistantError) -> AssistantError {
    match e {
        AssistantError::Upstream { status, message } => {
            AssistantError::Store(format!("{status}: {message}"))
        }
        other => other,
    }
}

/// Escape pattern metacharacters so user text matches literally.
fn escape_like(fragment: &str) -> String {
    fragment
        .trim()
        .chars()
        .flat_map(|c| match c {
            '*' | '%' | '_' | '\\' => vec!['\\', c],
            _ => vec![c],
        })
        .collect()
}

fn ilike_pattern(fragment: &str) -> String {
    format!("ilike.*{}*", escape_like(fragment))
}

#[async_trait]
impl SecretSource for RestStore {
    async fn secret(&self, name: &str) -> Result<Option<String>, AssistantError> {
        let value = self.rpc("get_secret", &json!({ "secret_name": name })).await?;
        Ok(value.as_str().map(str::to_owned))
    }
}

#[async_trait]
impl FunctionInvoker for RestStore {
    async fn invoke_function(&self, name: &str, body: &Value) -> Result<Value, AssistantError> {
        debug!(function = name, "invoke function");
        let resp = self
            .authorized(self.client.post(self.endpoint(&format!("functions/v1/{name}"))?))
            .json(body)
            .send()
            .await?;
        Ok(check_status(resp).await?.json().await?)
    }
}

#[async_trait]
impl DataStore for RestStore {
    async fn create_subject(&self, name: &str) -> Result<(), AssistantError> {
        self.insert("subjects", &json!({ "name": name })).await.map(|_| ())
    }

    async fn create_observation_type(&self, name: &str) -> Result<(), AssistantError> {
        self.insert("observation_types", &json!({ "name": name })).await.map(|_| ())
    }

    async fn find_teacher_by_email(&self, email: &str) -> Result<Option<Teacher>, AssistantError> {
        let filter = format!("ilike.{}", escape_like(email));
        let url = self.table(
            "teachers",
            &[("select", TEACHER_COLUMNS), ("email", filter.as_str()), ("limit", "1")],
        )?;
        Ok(self.select(url).await?.into_iter().next())
    }

    async fn find_teachers_by_name(&self, fragment: &str) -> Result<Vec<Teacher>, AssistantError> {
        let filter = ilike_pattern(fragment);
        let url = self.table(
            "teachers",
            &[("select", TEACHER_COLUMNS), ("name", filter.as_str()), ("order", "name.asc")],
        )?;
        self.select(url).await
    }

    async fn list_teachers(&self) -> Result<Vec<Teacher>, AssistantError> {
        let url = self.table("teachers", &[("select", TEACHER_COLUMNS), ("order", "name.asc")])?;
        self.select(url).await
    }

    async fn insert_feedback(&self, input: &FeedbackInput) -> Result<Value, AssistantError> {
        self.insert("observations", &serde_json::to_value(input)?).await
    }

    async fn call_procedure(&self, name: &str, params: &Value) -> Result<Value, AssistantError> {
        self.rpc(name, params).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn store() -> RestStore {
        RestStore::new("https://demo.example.co/", "anon-key").unwrap()
    }

    #[test]
    fn table_url_encodes_filters() {
        let url = store()
            .table("teachers", &[("select", TEACHER_COLUMNS), ("name", "ilike.*sam bishop*")])
            .unwrap();
        assert_eq!(url.path(), "/rest/v1/teachers");
        assert_eq!(
            url.query(),
            Some("select=id%2Cname%2Cemail&name=ilike.*sam+bishop*")
        );
    }

    #[test]
    fn function_and_rpc_paths() {
        let s = store();
        assert_eq!(
            s.endpoint("functions/v1/create-feedback").unwrap().as_str(),
            "https://demo.example.co/functions/v1/create-feedback"
        );
        assert_eq!(
            s.endpoint("rest/v1/rpc/get_secret").unwrap().path(),
            "/rest/v1/rpc/get_secret"
        );
    }

    #[test]
    fn ilike_pattern_escapes_wildcards() {
        assert_eq!(ilike_pattern(" Sam "), "ilike.*Sam*");
        assert_eq!(ilike_pattern("50%_a"), "ilike.*50\\%\\_a*");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            RestStore::new("not a url", "k"),
            Err(AssistantError::BadRequest(_))
        ));
    }

    #[test]
    fn platform_rejections_become_store_errors() {
        let e = store_error(AssistantError::Upstream { status: 401, message: "JWT expired".into() });
        assert_eq!(e.to_string(), "data store error: 401: JWT expired");
    }
}
