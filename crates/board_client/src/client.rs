use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use board_core::jobs::JobRecord;
use board_core::{
    Application, ApplicationStatus, Category, Config, DashboardStats, Job, JobDraft, JobFilters,
    NewApplication, ProfileUpdate, StatusUpdate, UserAccount, UserIdentity,
};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use reqwest::{Client, Proxy};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use session_manager::{
    AuthApi, CredentialPair, CredentialStore, LoginRedirect, Registration, SessionError,
};
use tracing::{debug, info};

use crate::auth::{Anonymous, BearerAuthMiddleware, RedirectSlot, TokenRefresher};
use crate::error::{ApiError, Result};

const TOKEN_PATH: &str = "/auth/token/";
const REGISTER_PATH: &str = "/auth/register/";
const ME_PATH: &str = "/auth/me/";

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// List endpoints may or may not be paginated.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListResponse<T> {
    Plain(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> ListResponse<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            ListResponse::Plain(items) => items,
            ListResponse::Paged { results } => results,
        }
    }
}

/// Job board API client bound to one session namespace.
#[derive(Clone)]
pub struct ApiClient {
    // every method except GET; never retried
    http: Arc<ClientWithMiddleware>,
    // GET only; transient failures retried up to `max_retries`
    reads: Arc<ClientWithMiddleware>,
    base_url: String,
    credentials: CredentialStore,
    redirect: RedirectSlot,
}

impl ApiClient {
    pub fn new(config: &Config, credentials: CredentialStore) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let base_url = config.api_base().to_string();
        let client = Self::build_http_client(config)?;
        let redirect = RedirectSlot::default();

        // refresh goes through a client without the bearer layer
        let refresher = TokenRefresher::new(ClientBuilder::new(client.clone()).build(), &base_url);
        let auth = Arc::new(BearerAuthMiddleware::new(
            credentials.clone(),
            refresher,
            redirect.clone(),
        ));

        let http = ClientBuilder::new(client.clone())
            .with_arc(auth.clone())
            .build();
        let reads = ClientBuilder::new(client)
            .with_arc(auth)
            .with(RetryTransientMiddleware::new_with_policy(
                Self::retry_policy(config),
            ))
            .build();

        Ok(Self {
            http: Arc::new(http),
            reads: Arc::new(reads),
            base_url,
            credentials,
            redirect,
        })
    }

    fn build_http_client(config: &Config) -> Result<Client> {
        let mut builder = Client::builder().default_headers(Self::default_headers());
        if !config.http_proxy.is_empty() {
            builder = builder.proxy(Proxy::http(&config.http_proxy)?);
        }
        if !config.https_proxy.is_empty() {
            builder = builder.proxy(Proxy::https(&config.https_proxy)?);
        }
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(builder.build()?)
    }

    fn retry_policy(config: &Config) -> ExponentialBackoff {
        ExponentialBackoff::builder().build_with_max_retries(config.max_retries)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Where to send the user once a refresh fails.
    pub async fn set_login_redirect(&self, redirect: Arc<dyn LoginRedirect>) {
        self.redirect.set(redirect).await;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!("{} from {}", status, response.url());
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status, &body))
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.execute(request).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute_json(self.reads.get(self.url(path))).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute_json(self.http.post(self.url(path)).json(body))
            .await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute_json(self.http.patch(self.url(path)).json(body))
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(self.http.delete(self.url(path))).await?;
        Ok(())
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let response: ListResponse<T> = self.get(path).await?;
        Ok(response.into_vec())
    }

    // ── Authentication ──────────────────────────────────────────────

    pub async fn obtain_token_pair(&self, username: &str, password: &str) -> Result<CredentialPair> {
        let request = self
            .http
            .post(self.url(TOKEN_PATH))
            .with_extension(Anonymous)
            .json(&TokenRequest { username, password });
        self.execute_json(request).await
    }

    pub async fn register_account(&self, registration: &Registration) -> Result<()> {
        let request = self
            .http
            .post(self.url(REGISTER_PATH))
            .with_extension(Anonymous)
            .json(registration);
        self.execute(request).await?;
        Ok(())
    }

    pub async fn me(&self) -> Result<UserIdentity> {
        self.get(ME_PATH).await
    }

    // ── Jobs ────────────────────────────────────────────────────────

    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let records: Vec<JobRecord> = self.list("/jobs/").await?;
        Ok(records.into_iter().map(Job::from).collect())
    }

    /// Fetch every job and filter on the client.
    pub async fn search_jobs(&self, filters: &JobFilters) -> Result<Vec<Job>> {
        let jobs = self.list_jobs().await?;
        Ok(jobs.into_iter().filter(|job| filters.matches(job)).collect())
    }

    pub async fn create_job(&self, draft: &JobDraft) -> Result<Job> {
        let record: JobRecord = self.post("/jobs/", draft).await?;
        info!("Created job {} ({})", record.id, record.title);
        Ok(record.into())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.list("/categories/").await
    }

    pub async fn list_applications(&self) -> Result<Vec<Application>> {
        self.list("/applications/").await
    }

    pub async fn apply(&self, application: &NewApplication) -> Result<Application> {
        self.post("/applications/", application).await
    }

    pub async fn update_application_status(
        &self,
        id: i64,
        status: ApplicationStatus,
    ) -> Result<Application> {
        let application: Application = self
            .patch(&format!("/applications/{id}/"), &StatusUpdate { status })
            .await?;
        info!("Application {} marked {}", id, application.status);
        Ok(application)
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.get("/stats/").await
    }

    // ── Users (admin) ───────────────────────────────────────────────

    pub async fn list_users(&self) -> Result<Vec<UserAccount>> {
        self.list("/auth/users/").await
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.delete(&format!("/auth/users/{id}/")).await?;
        info!("Deleted user {}", id);
        Ok(())
    }

    pub async fn update_user(&self, id: i64, update: &ProfileUpdate) -> Result<UserAccount> {
        self.patch(&format!("/auth/users/{id}/"), update).await
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> session_manager::Result<CredentialPair> {
        self.obtain_token_pair(username, password)
            .await
            .map_err(ApiError::into_login_error)
    }

    async fn register(&self, registration: &Registration) -> session_manager::Result<()> {
        self.register_account(registration)
            .await
            .map_err(SessionError::from)
    }

    async fn current_identity(&self) -> session_manager::Result<UserIdentity> {
        self.me().await.map_err(SessionError::from)
    }
}
