//! Open Supply Hub API client
//!
//! [`OshClient`] bundles a transport, the throttle-aware executor and the
//! facility match engine behind one async API. Reference and search calls
//! return [`Row`]s; uploads and match votes return domain results.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use oshub_core::{
    bulk_submit, ApiRequest, BulkOptions, FacilityMatchEngine, ThrottleExecutor, Transport,
};
use oshub_domain::constants::{
    CONTRIBUTORS_ACTIVE_COUNT_PATH, CONTRIBUTORS_PATH, CONTRIBUTOR_EMBED_CONFIGS_PATH,
    CONTRIBUTOR_LISTS_PATH, CONTRIBUTOR_TYPES_PATH, COUNTRIES_ACTIVE_COUNT_PATH, COUNTRIES_PATH,
    FACILITIES_COUNT_PATH, FACILITIES_DOWNLOADS_PATH, FACILITIES_PATH, FACILITY_PROCESSING_TYPES_PATH, HEALTH_CHECK_PATH,
    HEALTH_CHECK_TIMEOUT_SECS, PARENT_COMPANIES_PATH, PRODUCT_TYPES_PATH, SECTORS_PATH,
    WORKERS_RANGES_PATH,
};
use oshub_domain::{
    ClientConfig, ClosureState, Credentials, FacilityMatchRecord, FacilityRecord, MatchRef,
    OshError, Result, Row, UploadResult,
};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use super::normalize;
use super::query::FacilityQuery;
use super::stats::{CallStats, InstrumentedTransport};
use super::transport::HttpTransport;
use crate::config::{self, CredentialOptions};

/// Async client for the Open Supply Hub API.
///
/// Every call except [`OshClient::health_check`] goes through the throttle
/// executor, so HTTP 429 answers are waited out within the configured
/// budget.
pub struct OshClient {
    config: ClientConfig,
    transport: Arc<InstrumentedTransport>,
    engine: FacilityMatchEngine,
}

impl OshClient {
    /// Create a client over HTTP for `config` as given.
    ///
    /// # Errors
    /// Returns `OshError::Config` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> OshClientBuilder {
        OshClientBuilder::default()
    }

    /// Resolve credentials (environment, credentials file, `config`) and
    /// create a client with them.
    ///
    /// # Errors
    /// Returns `OshError::Config` if the HTTP client cannot be built.
    pub async fn connect(mut config: ClientConfig) -> Result<Self> {
        let mut options = CredentialOptions::new().url(config.credentials.base_url.clone());
        if config.credentials.has_token() {
            options = options.token(config.credentials.token.clone());
        }
        if let Some(source) = config.credentials_source.as_deref() {
            options = options.source(source);
        }

        config.credentials = config::resolve(&options).await?;
        Self::new(config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn engine(&self) -> &FacilityMatchEngine {
        &self.engine
    }

    pub fn call_stats(&self) -> CallStats {
        self.transport.stats()
    }

    /// Number of requests sent so far, retries included.
    pub fn api_call_count(&self) -> u64 {
        self.call_stats().api_call_count
    }

    pub fn last_call_duration(&self) -> Option<Duration> {
        self.call_stats().last_call_duration
    }

    fn executor(&self) -> &ThrottleExecutor {
        self.engine.executor()
    }

    async fn get_json(&self, request: ApiRequest) -> Result<Value> {
        Ok(self.executor().execute(&request).await?.body)
    }

    /// Probe `/health-check/` with a short timeout.
    ///
    /// Never fails: an unreachable host or a non-2xx answer is `false`.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<bool> {
        let request = ApiRequest::get(HEALTH_CHECK_PATH)
            .with_timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS));

        match self.transport.send(&request).await {
            Ok(response) => {
                debug!(status = response.status, "health check answered");
                Ok(response.is_success())
            }
            Err(err) => {
                warn!(error = %err, "health check failed");
                Ok(false)
            }
        }
    }

    /// Verify the token by fetching the facility count.
    ///
    /// # Errors
    /// - `OshError::Config` when no token is configured (no request is sent)
    /// - `OshError::Remote` when the token is refused
    /// - `OshError::MalformedResponse` when the answer carries no count
    #[instrument(skip(self))]
    pub async fn check_token(&self) -> Result<u64> {
        if !self.config.credentials.has_token() {
            return Err(OshError::Config("No/empty token".into()));
        }
        let count = self.get_facilities_count().await?;
        info!(count, "token accepted");
        Ok(count)
    }

    /// ISO 3166-1 alpha-2 codes and country names: `{iso_3166_2, country}`.
    pub async fn get_countries(&self) -> Result<Vec<Row>> {
        let body = self.get_json(ApiRequest::get(COUNTRIES_PATH)).await?;
        normalize::pair_rows(&body, "iso_3166_2", "country")
    }

    /// Number of distinct countries with active facilities.
    pub async fn get_countries_active_count(&self) -> Result<u64> {
        normalize::count(&self.get_json(ApiRequest::get(COUNTRIES_ACTIVE_COUNT_PATH)).await?)
    }

    /// `{contributor_id, contributor_name}`
    pub async fn get_contributors(&self) -> Result<Vec<Row>> {
        let body = self.get_json(ApiRequest::get(CONTRIBUTORS_PATH)).await?;
        normalize::pair_rows(&body, "contributor_id", "contributor_name")
    }

    pub async fn get_contributors_active_count(&self) -> Result<u64> {
        normalize::count(&self.get_json(ApiRequest::get(CONTRIBUTORS_ACTIVE_COUNT_PATH)).await?)
    }

    /// `{contributor_type}`
    pub async fn get_contributor_types(&self) -> Result<Vec<Row>> {
        normalize::contributor_type_rows(&self.get_json(ApiRequest::get(CONTRIBUTOR_TYPES_PATH)).await?)
    }

    /// Lists uploaded by one contributor: `{list_id, list_name}`.
    pub async fn get_contributor_lists(&self, contributor_id: impl Display) -> Result<Vec<Row>> {
        let request =
            ApiRequest::get(CONTRIBUTOR_LISTS_PATH).with_query("contributors", contributor_id.to_string());
        normalize::pair_rows(&self.get_json(request).await?, "list_id", "list_name")
    }

    /// `{sector}`
    pub async fn get_sectors(&self) -> Result<Vec<Row>> {
        normalize::value_rows(&self.get_json(ApiRequest::get(SECTORS_PATH)).await?, "sector")
    }

    /// `{product_type}`
    pub async fn get_product_types(&self) -> Result<Vec<Row>> {
        normalize::value_rows(&self.get_json(ApiRequest::get(PRODUCT_TYPES_PATH)).await?, "product_type")
    }

    /// `{facility_type, processing_type}`, one row per combination.
    pub async fn get_facility_processing_types(&self) -> Result<Vec<Row>> {
        let body = self.get_json(ApiRequest::get(FACILITY_PROCESSING_TYPES_PATH)).await?;
        normalize::processing_type_rows(&body)
    }

    /// `{key_or_contributor, parent_company}`
    pub async fn get_parent_companies(&self) -> Result<Vec<Row>> {
        let body = self.get_json(ApiRequest::get(PARENT_COMPANIES_PATH)).await?;
        normalize::pair_rows(&body, "key_or_contributor", "parent_company")
    }

    /// `{workers_range, lower, upper}`
    pub async fn get_workers_ranges(&self) -> Result<Vec<Row>> {
        normalize::workers_range_rows(&self.get_json(ApiRequest::get(WORKERS_RANGES_PATH)).await?)
    }

    /// Number of facilities in the database.
    pub async fn get_facilities_count(&self) -> Result<u64> {
        normalize::count(&self.get_json(ApiRequest::get(FACILITIES_COUNT_PATH)).await?)
    }

    /// Search facilities, following `next` links until the last page.
    ///
    /// Each feature becomes `{os_id, lon, lat, <properties>}`.
    ///
    /// # Errors
    /// The first failing page aborts the search.
    #[instrument(skip(self, query))]
    pub async fn get_facilities(&self, query: &FacilityQuery) -> Result<Vec<Row>> {
        let mut request = ApiRequest::get(FACILITIES_PATH);
        request.query = query.to_pairs();

        let rows = self
            .collect_pages(request, |body| {
                body.get("features")
                    .and_then(Value::as_array)
                    .ok_or_else(|| OshError::MalformedResponse(format!("expected features, got {body}")))?
                    .iter()
                    .map(normalize::feature_row)
                    .collect()
            })
            .await?;

        debug!(facilities = rows.len(), "facility search finished");
        Ok(rows)
    }

    /// The facility export: every page of `/api/facilities-downloads/`,
    /// one row per facility keyed by the export headers.
    ///
    /// # Errors
    /// The first failing page aborts the download.
    #[instrument(skip(self))]
    pub async fn get_facilities_downloads(&self) -> Result<Vec<Row>> {
        let rows = self
            .collect_pages(ApiRequest::get(FACILITIES_DOWNLOADS_PATH), normalize::download_rows)
            .await?;
        debug!(facilities = rows.len(), "facility download finished");
        Ok(rows)
    }

    /// Embedded map configuration of a contributor as one flat row.
    #[instrument(skip(self, contributor_id), fields(contributor_id = %contributor_id))]
    pub async fn get_contributor_embed_configs(&self, contributor_id: impl Display) -> Result<Row> {
        let path = format!("{CONTRIBUTOR_EMBED_CONFIGS_PATH}{contributor_id}/");
        normalize::embed_config_row(&self.get_json(ApiRequest::get(path)).await?)
    }

    async fn collect_pages<F>(&self, first: ApiRequest, page_rows: F) -> Result<Vec<Row>>
    where
        F: Fn(&Value) -> Result<Vec<Row>>,
    {
        let mut request = first;
        let mut rows = Vec::new();
        let mut pages = 0usize;
        loop {
            let body = self.get_json(request).await?;
            pages += 1;
            rows.extend(page_rows(&body)?);

            match body.get("next").and_then(Value::as_str) {
                Some(next) if !next.is_empty() => request = ApiRequest::get(next),
                _ => break,
            }
        }
        debug!(pages, rows = rows.len(), "pagination finished");
        Ok(rows)
    }

    /// One facility flattened into a single row.
    ///
    /// `extended` adds `<field>_extended` columns for every extended field.
    #[instrument(skip(self))]
    pub async fn get_facility(&self, os_id: &str, extended: bool) -> Result<Row> {
        let body = self.get_json(ApiRequest::get(facility_path(os_id, "")?)).await?;
        normalize::facility_detail_row(&body, extended)
    }

    /// Audit trail of a facility: `{updated_at, action, detail, ...}` rows.
    #[instrument(skip(self))]
    pub async fn get_facility_history(&self, os_id: &str) -> Result<Vec<Row>> {
        let body = self.get_json(ApiRequest::get(facility_path(os_id, "history/")?)).await?;
        normalize::object_rows(&body)
    }

    /// Report a facility as open or closed.
    #[instrument(skip(self, reason_for_report))]
    pub async fn post_facility_open_or_closed(
        &self,
        os_id: &str,
        closure_state: ClosureState,
        reason_for_report: &str,
    ) -> Result<Row> {
        let body = json!({
            "closure_state": closure_state.as_str(),
            "reason_for_report": reason_for_report,
        });
        let request = ApiRequest::post(facility_path(os_id, "report/")?, Some(body));
        let response = self.get_json(request).await?;
        info!(%os_id, %closure_state, "facility status reported");
        normalize::object_row(&response)
    }

    pub async fn post_facility_open(&self, os_id: &str, reason_for_report: &str) -> Result<Row> {
        self.post_facility_open_or_closed(os_id, ClosureState::Open, reason_for_report).await
    }

    pub async fn post_facility_closed(&self, os_id: &str, reason_for_report: &str) -> Result<Row> {
        self.post_facility_open_or_closed(os_id, ClosureState::Closed, reason_for_report).await
    }

    /// Remove the caller's contributions from a facility.
    #[instrument(skip(self))]
    pub async fn post_disassociate_facility(&self, os_id: &str) -> Result<Row> {
        let request = ApiRequest::post(facility_path(os_id, "dissociate/")?, None);
        let response = self.get_json(request).await?;
        info!(%os_id, "facility disassociated");
        normalize::object_row(&response)
    }

    /// Upload one facility record. See [`FacilityMatchEngine::submit`].
    pub async fn post_facility(&self, record: &FacilityRecord, create: bool) -> Result<UploadResult> {
        self.engine.submit(record, create).await
    }

    pub async fn get_facility_match(&self, match_ref: impl Into<MatchRef>) -> Result<FacilityMatchRecord> {
        self.engine.get_match(&match_ref.into()).await
    }

    pub async fn confirm_match(&self, match_ref: impl Into<MatchRef>) -> Result<UploadResult> {
        self.engine.confirm(&match_ref.into()).await
    }

    pub async fn reject_match(&self, match_ref: impl Into<MatchRef>) -> Result<UploadResult> {
        self.engine.reject(&match_ref.into()).await
    }

    /// Upload `records` one at a time; one result row per record, in order.
    pub async fn bulk_submit(&self, records: Vec<Row>, options: &BulkOptions) -> Vec<Row> {
        bulk_submit(&self.engine, records, options).await
    }
}

fn facility_path(os_id: &str, suffix: &str) -> Result<String> {
    let os_id = os_id.trim();
    if os_id.is_empty() || os_id.contains('/') {
        return Err(OshError::InvalidInput(format!("Invalid OS ID: {os_id:?}")));
    }
    Ok(format!("{FACILITIES_PATH}{os_id}/{suffix}"))
}

/// Builder for [`OshClient`].
#[derive(Default)]
pub struct OshClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl OshClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = credentials;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let token = std::mem::take(&mut self.config.credentials.token);
        self.config.credentials = Credentials::new(base_url, token);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.credentials.token = token.into();
        self
    }

    pub fn throttle_budget_secs(mut self, budget_secs: f64) -> Self {
        self.config.throttle_budget_secs = budget_secs;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn public(mut self, public: bool) -> Self {
        self.config.public = public;
        self
    }

    pub fn text_only_fallback(mut self, enabled: bool) -> Self {
        self.config.text_only_fallback = enabled;
        self
    }

    /// Use `transport` instead of HTTP.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// # Errors
    /// Returns `OshError::Config` if the HTTP client cannot be built or the
    /// throttle budget is not finite.
    pub fn build(self) -> Result<OshClient> {
        let inner = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::from_config(&self.config)?),
        };
        let transport = Arc::new(InstrumentedTransport::new(inner));
        let engine = FacilityMatchEngine::from_config(transport.clone(), &self.config)?;

        debug!(base_url = %self.config.credentials.base_url, "client created");
        Ok(OshClient { config: self.config, transport, engine })
    }
}
