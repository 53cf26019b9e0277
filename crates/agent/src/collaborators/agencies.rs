use async_trait::async_trait;
use gtmscout_core::domain::agency::{AgencyMatch, AgencySearchQuery};
use reqwest::Client;

use super::{join_url, CollaboratorError};

const SEARCH_PATH: &str = "api/agencies/search";

#[async_trait]
pub trait AgencyDirectory: Send + Sync {
    async fn search(&self, query: &AgencySearchQuery)
        -> Result<Vec<AgencyMatch>, CollaboratorError>;
}

/// Agency matching service reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpAgencyDirectory {
    client: Client,
    endpoint: String,
}

impl HttpAgencyDirectory {
    /// `client` carries the request timeout.
    pub fn new(client: Client, base_url: &str) -> Self {
        Self { client, endpoint: join_url(base_url, SEARCH_PATH) }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AgencyDirectory for HttpAgencyDirectory {
    async fn search(
        &self,
        query: &AgencySearchQuery,
    ) -> Result<Vec<AgencyMatch>, CollaboratorError> {
        let response = self.client.post(&self.endpoint).json(query).send().await?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        decode_agencies(&body)
    }
}

fn decode_agencies(body: &[u8]) -> Result<Vec<AgencyMatch>, CollaboratorError> {
    serde_json::from_slice(body).map_err(|error| CollaboratorError::Decode(error.to_string()))
}
