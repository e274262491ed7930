//! Upstream catalog access: identifier pagination and batch detail lookups.
//!
//! Every call is issued and awaited in order. There is no retry: a transport
//! error or a non-2xx status aborts the caller.

use crate::config::{UpstreamConfig, MAX_BATCH_SIZE};
use crate::domain::model::RegionContext;
use crate::domain::raw::{CodeListEntry, IdPage, RawChannel, RawService};
use crate::utils::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;

/// Deduplicated identifiers. Iteration order is unspecified.
pub type IdSet = HashSet<String>;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// List endpoints that page through record identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListQuery {
    AllServices,
    ServicesByProvince {
        code: String,
        include_whole_country: bool,
    },
    ServicesByMunicipality {
        code: String,
        include_whole_country: bool,
    },
    ChannelsByProvince {
        code: String,
    },
}

impl ListQuery {
    fn path(&self) -> String {
        match self {
            ListQuery::AllServices => "/Service".to_string(),
            ListQuery::ServicesByProvince { code, .. } => {
                format!("/Service/area/Province/code/{}", code)
            }
            ListQuery::ServicesByMunicipality { code, .. } => {
                format!("/Service/area/Municipality/code/{}", code)
            }
            ListQuery::ChannelsByProvince { code } => {
                format!("/ServiceChannel/area/Province/code/{}", code)
            }
        }
    }

    fn include_whole_country(&self) -> Option<bool> {
        match self {
            ListQuery::AllServices => None,
            ListQuery::ServicesByProvince {
                include_whole_country,
                ..
            }
            | ListQuery::ServicesByMunicipality {
                include_whole_country,
                ..
            } => Some(*include_whole_country),
            ListQuery::ChannelsByProvince { .. } => Some(true),
        }
    }
}

/// Detail endpoints that accept a comma-separated `guids` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailEndpoint {
    Services,
    Channels,
}

impl DetailEndpoint {
    fn path(self) -> &'static str {
        match self {
            DetailEndpoint::Services => "/Service/serviceWithGD/list",
            DetailEndpoint::Channels => "/ServiceChannel/list",
        }
    }
}

/// Splits `ids` into request-sized batches.
pub fn detail_batches(ids: &[String], batch_size: usize) -> impl Iterator<Item = &[String]> {
    ids.chunks(batch_size.clamp(1, MAX_BATCH_SIZE))
}

pub fn format_since(since: DateTime<Utc>) -> String {
    since.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    batch_size: usize,
}

impl CatalogClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            batch_size: config.batch_size.clamp(1, MAX_BATCH_SIZE),
        })
    }

    /// Client against `base_url` with default timeout and batch size.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let config = UpstreamConfig {
            api_url: base_url.into(),
            ..UpstreamConfig::default()
        };
        Self::new(&config)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("📡 GET {} {:?}", url, query);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UpstreamStatus {
                url,
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    /// Pages through `query` and returns every identifier once.
    ///
    /// Page 1 reports the page count; pages 2..=count follow strictly in order.
    pub async fn list_ids(&self, query: &ListQuery, since: Option<DateTime<Utc>>) -> Result<IdSet> {
        let path = query.path();
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(include) = query.include_whole_country() {
            params.push(("includeWholeCountry", include.to_string()));
        }
        if let Some(since) = since {
            params.push(("date", format_since(since)));
        }

        let mut ids = IdSet::new();
        let mut page = 1;
        let mut page_count = 1;
        let mut seen = 0usize;

        while page <= page_count {
            let mut page_params = params.clone();
            page_params.push(("page", page.to_string()));

            let body: IdPage = self.get_json(&path, &page_params).await?;
            if page == 1 {
                page_count = body.page_count;
            }
            seen += body.item_list.len();
            ids.extend(body.item_list.into_iter().map(|item| item.id));
            page += 1;
        }

        tracing::debug!(
            "📄 {}: {} page(s), {} ids ({} unique)",
            path,
            page_count.max(1),
            seen,
            ids.len()
        );
        Ok(ids)
    }

    pub async fn service_ids(&self, since: Option<DateTime<Utc>>) -> Result<IdSet> {
        self.list_ids(&ListQuery::AllServices, since).await
    }

    pub async fn service_ids_by_province(
        &self,
        region: &RegionContext,
        since: Option<DateTime<Utc>>,
        include_whole_country: bool,
    ) -> Result<IdSet> {
        let query = ListQuery::ServicesByProvince {
            code: region.province.code.clone(),
            include_whole_country,
        };
        self.list_ids(&query, since).await
    }

    /// Union of the municipality-scoped service lists over every municipality
    /// in the region.
    pub async fn service_ids_by_municipalities(
        &self,
        region: &RegionContext,
        since: Option<DateTime<Utc>>,
        include_whole_country: bool,
    ) -> Result<IdSet> {
        let mut ids = IdSet::new();
        for municipality in &region.municipalities {
            let query = ListQuery::ServicesByMunicipality {
                code: municipality.id.clone(),
                include_whole_country,
            };
            ids.extend(self.list_ids(&query, since).await?);
        }
        Ok(ids)
    }

    pub async fn channel_ids_by_province(
        &self,
        region: &RegionContext,
        since: Option<DateTime<Utc>>,
    ) -> Result<IdSet> {
        let query = ListQuery::ChannelsByProvince {
            code: region.province.code.clone(),
        };
        self.list_ids(&query, since).await
    }

    /// One request per batch of at most `batch_size` ids; the returned arrays
    /// are concatenated in batch order.
    pub async fn fetch_details<T: DeserializeOwned>(
        &self,
        endpoint: DetailEndpoint,
        ids: &[String],
    ) -> Result<Vec<T>> {
        let mut records = Vec::with_capacity(ids.len());
        for (index, batch) in detail_batches(ids, self.batch_size).enumerate() {
            let params = [("showHeader", "true".to_string()), ("guids", batch.join(","))];
            let mut page: Vec<T> = self.get_json(endpoint.path(), &params).await?;
            tracing::debug!(
                "📦 {} batch {}: requested {}, received {}",
                endpoint.path(),
                index + 1,
                batch.len(),
                page.len()
            );
            records.append(&mut page);
        }
        Ok(records)
    }

    pub async fn fetch_services(&self, ids: &[String]) -> Result<Vec<RawService>> {
        self.fetch_details(DetailEndpoint::Services, ids).await
    }

    pub async fn fetch_channels(&self, ids: &[String]) -> Result<Vec<RawChannel>> {
        self.fetch_details(DetailEndpoint::Channels, ids).await
    }

    pub async fn municipality_codes(&self) -> Result<Vec<CodeListEntry>> {
        self.get_json("/CodeList/GetMunicipalityCodes", &[]).await
    }

    pub async fn province_codes(&self) -> Result<Vec<CodeListEntry>> {
        self.get_json("/CodeList/GetAreaCodes/type/Province", &[]).await
    }
}
