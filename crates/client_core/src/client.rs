use std::collections::BTreeSet;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{
        Collection, Infant, InfantId, InfantProfile, LingTestRecord, MilestoneProgress, OwnerId,
        ScreeningRecord, ScreeningStatus,
    },
    error::ApiError,
    protocol::{
        AddInfantRequest, CatalogPayload, GenerateAudioRequest, GenerateAudioResponse,
        LoginRequest, LoginResponse, RecommendationRequest, RecommendationResponse, Report,
        SaveLingTestRequest, SaveProgressRequest, SaveRiskFactorsRequest,
    },
};
use tokio::sync::RwLock;
use url::Url;

use crate::error::ClientError;

/// Record store and generation calls, scoped to the signed-in owner.
#[async_trait]
pub trait TrackerBackend: Send + Sync {
    async fn get_profile(&self) -> Result<Option<InfantProfile>, ClientError>;
    async fn save_profile(&self, profile: &InfantProfile) -> Result<InfantProfile, ClientError>;
    async fn get_screening(&self) -> Result<Option<ScreeningRecord>, ClientError>;
    async fn save_risk_factors(
        &self,
        risk_factors: &BTreeSet<String>,
    ) -> Result<ScreeningRecord, ClientError>;
    async fn request_recommendations(
        &self,
        status: ScreeningStatus,
    ) -> Result<RecommendationResponse, ClientError>;
    async fn get_progress(
        &self,
        collection: Collection,
    ) -> Result<Option<MilestoneProgress>, ClientError>;
    async fn save_progress(
        &self,
        collection: Collection,
        completed: &BTreeSet<String>,
    ) -> Result<MilestoneProgress, ClientError>;
    async fn get_ling_test(&self) -> Result<Option<LingTestRecord>, ClientError>;
    async fn save_ling_test(&self, observations: &str) -> Result<LingTestRecord, ClientError>;
    async fn list_infants(&self) -> Result<Vec<Infant>, ClientError>;
    async fn add_infant(&self, name: &str) -> Result<Infant, ClientError>;
    async fn get_infant(&self, infant_id: InfantId) -> Result<Infant, ClientError>;
    async fn report(&self) -> Result<Report, ClientError>;
    async fn catalog(&self) -> Result<CatalogPayload, ClientError>;
    /// Returns a `data:audio/wav;base64,...` URI.
    async fn generate_audio(&self, prompt: &str) -> Result<String, ClientError>;
}

#[derive(Debug, Clone)]
pub struct Session {
    pub owner_id: OwnerId,
    pub token: String,
}

pub struct TrackerClient {
    http: Client,
    server_url: String,
    session: RwLock<Option<Session>>,
}

impl TrackerClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
            session: RwLock::new(None),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn login(&self, username: &str) -> Result<Session, ClientError> {
        let res = self
            .http
            .post(format!("{}/login", self.server_url))
            .json(&LoginRequest {
                username: username.to_string(),
            })
            .send()
            .await?;
        let body: LoginResponse = decode(res).await?;
        let session = Session {
            owner_id: body.owner_id,
            token: body.token,
        };
        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Websocket URL for the owner's event stream.
    pub async fn events_url(&self) -> Result<Url, ClientError> {
        let session = self.session().await.ok_or(ClientError::NotSignedIn)?;
        let ws_base = if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(anyhow!("server_url must start with http:// or https://").into());
        };
        let mut url = Url::parse(&format!("{ws_base}/ws")).map_err(anyhow::Error::from)?;
        url.query_pairs_mut().append_pair("token", &session.token);
        Ok(url)
    }

    async fn request<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let session = self.session().await.ok_or(ClientError::NotSignedIn)?;
        let mut request = self
            .http
            .request(method, format!("{}{path}", self.server_url))
            .bearer_auth(&session.token);
        if let Some(body) = body {
            request = request.json(body);
        }
        decode(request.send().await?).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request::<(), T>(Method::GET, path, None).await
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json().await?);
    }
    match res.json::<ApiError>().await {
        Ok(err) => Err(err.into()),
        Err(_) => Err(ClientError::Status(status.as_u16())),
    }
}

fn progress_path(collection: Collection) -> Result<&'static str, ClientError> {
    match collection {
        Collection::Milestones => Ok("/milestones"),
        Collection::Checklists => Ok("/checklist"),
        other => Err(anyhow!("{} does not hold milestone progress", other.as_str()).into()),
    }
}

#[async_trait]
impl TrackerBackend for TrackerClient {
    async fn get_profile(&self) -> Result<Option<InfantProfile>, ClientError> {
        self.get("/profile").await
    }

    async fn save_profile(&self, profile: &InfantProfile) -> Result<InfantProfile, ClientError> {
        self.request(Method::PUT, "/profile", Some(profile)).await
    }

    async fn get_screening(&self) -> Result<Option<ScreeningRecord>, ClientError> {
        self.get("/screening").await
    }

    async fn save_risk_factors(
        &self,
        risk_factors: &BTreeSet<String>,
    ) -> Result<ScreeningRecord, ClientError> {
        let body = SaveRiskFactorsRequest {
            risk_factors: risk_factors.clone(),
        };
        self.request(Method::PUT, "/screening/risk-factors", Some(&body))
            .await
    }

    async fn request_recommendations(
        &self,
        status: ScreeningStatus,
    ) -> Result<RecommendationResponse, ClientError> {
        let body = RecommendationRequest {
            screening_status: status,
        };
        self.request(Method::POST, "/screening/recommendations", Some(&body))
            .await
    }

    async fn get_progress(
        &self,
        collection: Collection,
    ) -> Result<Option<MilestoneProgress>, ClientError> {
        self.get(progress_path(collection)?).await
    }

    async fn save_progress(
        &self,
        collection: Collection,
        completed: &BTreeSet<String>,
    ) -> Result<MilestoneProgress, ClientError> {
        let body = SaveProgressRequest {
            completed: completed.clone(),
        };
        self.request(Method::PUT, progress_path(collection)?, Some(&body))
            .await
    }

    async fn get_ling_test(&self) -> Result<Option<LingTestRecord>, ClientError> {
        self.get("/ling-test").await
    }

    async fn save_ling_test(&self, observations: &str) -> Result<LingTestRecord, ClientError> {
        let body = SaveLingTestRequest {
            observations: observations.to_string(),
        };
        self.request(Method::PUT, "/ling-test", Some(&body)).await
    }

    async fn list_infants(&self) -> Result<Vec<Infant>, ClientError> {
        self.get("/infants").await
    }

    async fn add_infant(&self, name: &str) -> Result<Infant, ClientError> {
        let body = AddInfantRequest {
            name: name.to_string(),
        };
        self.request(Method::POST, "/infants", Some(&body)).await
    }

    async fn get_infant(&self, infant_id: InfantId) -> Result<Infant, ClientError> {
        self.get(&format!("/infants/{}", infant_id.0)).await
    }

    async fn report(&self) -> Result<Report, ClientError> {
        self.get("/report").await
    }

    async fn catalog(&self) -> Result<CatalogPayload, ClientError> {
        self.get("/catalog").await
    }

    async fn generate_audio(&self, prompt: &str) -> Result<String, ClientError> {
        let body = GenerateAudioRequest {
            prompt: prompt.to_string(),
        };
        let response: GenerateAudioResponse = self
            .request(Method::POST, "/generate/audio", Some(&body))
            .await?;
        Ok(response.media)
    }
}
