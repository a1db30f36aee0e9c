use crate::error::RoomServiceError;
use huddle_core::utils::{HEALTH_PATH, ROOMS_CREATE_PATH, ROOMS_VERIFY_PATH};
use huddle_core::{HealthReport, RoomCredentials, RoomId, RoomKey};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

/// HTTP client for the room service.
#[derive(Debug, Clone)]
pub struct RoomsApi {
    http: reqwest::Client,
    base_url: String,
}

impl RoomsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> Result<Url, RoomServiceError> {
        Ok(Url::parse(self.base_url.trim_end_matches('/'))?.join(path)?)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RoomServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RoomServiceError::Status {
            status: status.as_u16(),
            body,
        })
    }

    pub async fn create_room(&self) -> Result<RoomCredentials, RoomServiceError> {
        let url = self.url(ROOMS_CREATE_PATH)?;
        debug!("POST {}", url);

        let response = Self::check(self.http.post(url).send().await?).await?;
        Ok(response.json().await?)
    }

    /// Ok when the room exists and the key matches.
    pub async fn verify_room(&self, room_id: &RoomId, room_key: &RoomKey) -> Result<(), RoomServiceError> {
        let mut url = self.url(&format!("{ROOMS_VERIFY_PATH}/{room_id}"))?;
        url.query_pairs_mut()
            .append_pair("room_key", room_key.as_str());
        debug!("GET {}{}", self.base_url, url.path());

        let response = self.http.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(RoomServiceError::RoomNotFound(room_id.clone())),
            StatusCode::UNAUTHORIZED => Err(RoomServiceError::InvalidKey(room_id.clone())),
            _ => Self::check(response).await.map(|_| ()),
        }
    }

    pub async fn health(&self) -> Result<HealthReport, RoomServiceError> {
        let url = self.url(HEALTH_PATH)?;
        let response = Self::check(self.http.get(url).send().await?).await?;
        Ok(response.json().await?)
    }
}
