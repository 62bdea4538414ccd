//! HTTP implementation of the release service.
//!
//! Every operation is a form-encoded POST carrying the account credentials
//! (`user`, `psw`) and an operation selector (`req`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::ApiConfig;

use super::token::read_token;
use super::{ApiResponse, GatewayError, ReleaseCode, ReleaseService};

const API_ENDPOINT: &str = "/api.php";
const TORRENT_ENDPOINT: &str = "/api/torrent.php";

/// HTTP client for the remote release service.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    username: String,
    token: String,
}

impl HttpGateway {
    /// Create a gateway, reading the API token from `config.token_path`.
    pub fn new(config: &ApiConfig) -> Result<Self, GatewayError> {
        let token = read_token(&config.token_path)?;
        Self::with_token(config, token)
    }

    /// Create a gateway with an already loaded token.
    pub fn with_token(config: &ApiConfig, token: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            token: token.into(),
        })
    }

    /// POST an operation and return the body text.
    async fn post(
        &self,
        endpoint: &str,
        req: &str,
        params: &[(&str, &str)],
    ) -> Result<String, GatewayError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut form: Vec<(&str, &str)> = vec![
            ("user", self.username.as_str()),
            ("psw", self.token.as_str()),
            ("req", req),
        ];
        form.extend_from_slice(params);

        debug!(req = req, endpoint = endpoint, "Calling release service");

        let response = self.client.post(&url).form(&form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(response.text().await?)
    }

    /// Call an operation whose reply may or may not be JSON.
    async fn call(&self, req: &str, params: &[(&str, &str)]) -> Result<ApiResponse, GatewayError> {
        self.call_at(API_ENDPOINT, req, params).await
    }

    async fn call_at(
        &self,
        endpoint: &str,
        req: &str,
        params: &[(&str, &str)],
    ) -> Result<ApiResponse, GatewayError> {
        let response = ApiResponse::decode(self.post(endpoint, req, params).await?);
        if response.is_raw_text() {
            error!(req = req, body = %response, "Cannot decode response");
        }
        Ok(response)
    }

    /// Call an operation whose reply must be JSON.
    async fn call_json(&self, req: &str, params: &[(&str, &str)]) -> Result<Value, GatewayError> {
        let body = self.post(API_ENDPOINT, req, params).await?;
        serde_json::from_str(&body)
            .map_err(|e| GatewayError::Decode(format!("{} reply: {}", req, e)))
    }

    /// List the genres currently active on the service.
    pub async fn active_genres(&self) -> Result<Value, GatewayError> {
        self.call_json("generi", &[]).await
    }

    /// Search releases by title.
    pub async fn search_release(&self, title: &str) -> Result<Value, GatewayError> {
        self.call_json("search_titles", &[("title", title)]).await
    }

    /// Fetch the download information of a release.
    pub async fn download_release(&self, code: &ReleaseCode) -> Result<Value, GatewayError> {
        self.call_json("download_tm", &[("code", code.as_str())]).await
    }

    /// Every genre known to the service, as `[id, name]` pairs.
    pub async fn all_genres(&self) -> Result<ApiResponse, GatewayError> {
        self.call("all_genres", &[]).await
    }

    /// Every release that still needs to be saved.
    pub async fn all_releases_to_save(&self) -> Result<ApiResponse, GatewayError> {
        info!("Requested all releases that need to be saved");
        self.call("get_all_releases_to_save", &[]).await
    }

    /// Every release belonging to the given genres.
    pub async fn all_releases(&self, genres: &Value) -> Result<ApiResponse, GatewayError> {
        info!("Requested all releases present on the service");
        let genres = genres.to_string();
        self.call("get_all_releases", &[("genres", genres.as_str())]).await
    }

    /// Upload `count` new files of the given material type.
    ///
    /// Returns how many were uploaded according to the `upped` field. Replies
    /// without a readable `upped` value count as nothing uploaded.
    pub async fn insert_new_material(
        &self,
        material: &str,
        count: u32,
    ) -> Result<u64, GatewayError> {
        info!(material = material, count = count, "Inserting new material");
        let num = count.to_string();
        let body = self
            .post(
                API_ENDPOINT,
                "insert_new_material",
                &[("num", num.as_str()), ("material", material)],
            )
            .await?;

        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(_) => {
                error!(body = %body, "Error decoding insert_new_material response");
                return Ok(0);
            }
        };
        debug!(response = %value, "Parsed insert_new_material response");

        match value.get("upped").and_then(parse_count) {
            Some(upped) => Ok(upped),
            None => {
                error!(body = %body, "No usable upped key in insert_new_material response");
                Ok(0)
            }
        }
    }

    /// Order a premium copy of a release.
    pub async fn order_release(&self, code: &ReleaseCode) -> Result<ApiResponse, GatewayError> {
        debug!(code = %code, "Ordering release");
        self.call("order_prem_dir_fichier", &[("code", code.as_str())]).await
    }

    /// Mark a release as saved.
    pub async fn save_release(&self, code: &ReleaseCode) -> Result<ApiResponse, GatewayError> {
        self.call("save_release", &[("code", code.as_str())]).await
    }

    /// Ask the service to build a full database dump.
    pub async fn dump_database(&self) -> Result<ApiResponse, GatewayError> {
        self.call("create_dump", &[]).await
    }

    /// Refresh the premium links of a release from its directory.
    pub async fn refresh_premium_links(
        &self,
        code: &ReleaseCode,
    ) -> Result<ApiResponse, GatewayError> {
        self.call("new_1f_links", &[("code", code.as_str())]).await
    }

    /// Rebuild the torrent cache.
    pub async fn refresh_torrent_cache(&self) -> Result<ApiResponse, GatewayError> {
        self.call_at(TORRENT_ENDPOINT, "icv_refresh_cache", &[]).await
    }
}

#[async_trait]
impl ReleaseService for HttpGateway {
    async fn fetch_releases_per_free_account(&self) -> Result<ApiResponse, GatewayError> {
        info!("Requested all releases with a free account");
        self.call("get_all_releases_per_account", &[]).await
    }

    async fn restore_release(&self, code: &ReleaseCode) -> Result<ApiResponse, GatewayError> {
        debug!(code = %code, "Request restore");
        self.call("refresh_1f", &[("code", code.as_str())]).await
    }
}

/// Read a count that may be encoded as a number or a numeric string.
fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
