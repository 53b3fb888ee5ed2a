//! Location directory and report client over the dashboard HTTP endpoints.

use async_trait::async_trait;
use location_selector_sdk::{
    AncestorsResponse, ChildrenResponse, DirectoryError, LocationDirectoryClient, LocationNode,
};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::HttpDirectoryConfig;
use crate::domain::{ReportDataClient, ReportQuery};

const LOCATIONS_PATH: &str = "locations";
const ANCESTORS_PATH: &str = "locations/ancestors";

/// Single-location payload; the endpoint answers `{}` for unknown ids.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocationInfo {
    name: Option<String>,
    #[serde(alias = "location_type_name")]
    location_type: Option<String>,
    parent_id: Option<String>,
    user_have_access: bool,
    user_have_access_to_parent: bool,
}

/// `reqwest` client bound to the dashboard base URL.
#[derive(Debug, Clone)]
pub struct HttpLocationDirectory {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpLocationDirectory {
    /// # Errors
    ///
    /// - `Internal` if the base URL does not parse or the client cannot be built
    pub fn new(config: &HttpDirectoryConfig) -> Result<Self, DirectoryError> {
        let mut raw = config.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw)
            .map_err(|e| DirectoryError::Internal(format!("invalid base URL {raw}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DirectoryError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        subject: &str,
    ) -> Result<T, DirectoryError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| DirectoryError::Internal(format!("invalid path {path}: {e}")))?;
        debug!(%url, ?query, "directory request");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| DirectoryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::NOT_FOUND => DirectoryError::LocationNotFound {
                    location_id: subject.to_owned(),
                },
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DirectoryError::Unauthorized,
                s if s.is_server_error() => DirectoryError::Network(format!("{path} returned {s}")),
                s => DirectoryError::InvalidResponse(format!("{path} returned {s}")),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DirectoryError::InvalidResponse(format!("{path}: {e}")))
    }
}

#[async_trait]
impl LocationDirectoryClient for HttpLocationDirectory {
    async fn get_root_locations(&self) -> Result<Vec<LocationNode>, DirectoryError> {
        let response: ChildrenResponse = self.get_json(LOCATIONS_PATH, &[], "root").await?;
        Ok(response.locations)
    }

    async fn get_children(&self, parent_id: &str) -> Result<Vec<LocationNode>, DirectoryError> {
        let response: ChildrenResponse = self
            .get_json(LOCATIONS_PATH, &[("parent_id", parent_id)], parent_id)
            .await?;
        Ok(response.locations)
    }

    async fn get_ancestors(&self, location_id: &str) -> Result<AncestorsResponse, DirectoryError> {
        self.get_json(ANCESTORS_PATH, &[("location_id", location_id)], location_id)
            .await
    }

    async fn get_location(&self, location_id: &str) -> Result<LocationNode, DirectoryError> {
        let info: LocationInfo = self
            .get_json(LOCATIONS_PATH, &[("location_id", location_id)], location_id)
            .await?;
        let Some(name) = info.name else {
            return Err(DirectoryError::LocationNotFound {
                location_id: location_id.to_owned(),
            });
        };

        Ok(LocationNode {
            location_id: location_id.to_owned(),
            name,
            parent_id: info.parent_id,
            location_type: info.location_type,
            user_have_access: info.user_have_access,
            user_have_access_to_parent: info.user_have_access_to_parent,
        })
    }
}

#[async_trait]
impl ReportDataClient for HttpLocationDirectory {
    async fn fetch_report(
        &self,
        endpoint: &str,
        query: &ReportQuery,
    ) -> Result<Value, DirectoryError> {
        let pairs = query.to_pairs();
        let borrowed: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let subject = query.location_id.as_deref().unwrap_or("national");
        self.get_json(endpoint, &borrowed, subject).await
    }
}
