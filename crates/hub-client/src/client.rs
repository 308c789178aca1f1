use std::time::Duration;

use contracts::{
    DebugReport, GetPlayerResponse, PlayerCode, PlayerUpdate, SavePlayerRequest,
    SavePlayerResponse, DEBUG_PATH, GET_PLAYER_PATH, SAVE_PLAYER_PATH,
};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_CODE: &str = "FG-8V501Y";

#[derive(Debug, Clone)]
pub struct HubClient {
    base_url: String,
    http: reqwest::Client,
}

impl HubClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `Ok(None)` when the backend has no record for `code`.
    pub async fn load_player(
        &self,
        code: &PlayerCode,
    ) -> Result<Option<GetPlayerResponse>, ClientError> {
        let response = self
            .http
            .get(self.url(GET_PLAYER_PATH))
            .query(&[("code", code.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%code, "backend has no record");
            return Ok(None);
        }

        let response = check_status(response).await?;
        Ok(Some(response.json().await?))
    }

    pub async fn save_player(
        &self,
        code: &PlayerCode,
        update: &PlayerUpdate,
    ) -> Result<SavePlayerResponse, ClientError> {
        let request = SavePlayerRequest {
            player_code: Some(code.to_string()),
            player_data: Some(update.clone()),
        };

        let response = self
            .http
            .post(self.url(SAVE_PLAYER_PATH))
            .json(&request)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    pub async fn debug(&self) -> Result<DebugReport, ClientError> {
        let response = self.http.get(self.url(DEBUG_PATH)).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Backend connection test against a known player code.
    pub async fn ping(&self) -> bool {
        let result = self
            .http
            .get(self.url(GET_PLAYER_PATH))
            .query(&[("code", PROBE_CODE)])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(status = %response.status(), "backend answered with an error");
                false
            }
            Err(err) => {
                warn!(error = %err, "backend offline");
                false
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}
