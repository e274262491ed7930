use crate::config::{RegionSpec, ServiceScope, SyncOptions};
use crate::core::fetcher::{CatalogClient, IdSet};
use crate::core::filter::{is_suitable_channel, is_suitable_service};
use crate::core::normalize::{normalize_channel, normalize_service};
use crate::domain::model::{NormalizedChannel, NormalizedService, RegionContext};
use crate::domain::ports::{Collection, DocumentStore};
use crate::utils::error::Result;
use chrono::{DateTime, Datelike, SubsecRound, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Refetch everything and replace both collections.
    Full,
    /// Fetch records changed since the stored watermark and replace those.
    Incremental,
}

impl SyncMode {
    /// Full refresh on the first calendar day (UTC) of each month.
    pub fn for_date(now: DateTime<Utc>) -> Self {
        if now.day() == 1 {
            SyncMode::Full
        } else {
            SyncMode::Incremental
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub services_fetched: usize,
    pub services_deleted: u64,
    pub services_stored: u64,
    pub channels_fetched: usize,
    pub channels_deleted: u64,
    pub channels_stored: u64,
    pub municipalities_stored: u64,
}

impl SyncReport {
    fn new(mode: SyncMode) -> Self {
        Self {
            mode,
            services_fetched: 0,
            services_deleted: 0,
            services_stored: 0,
            channels_fetched: 0,
            channels_deleted: 0,
            channels_stored: 0,
            municipalities_stored: 0,
        }
    }
}

/// Records of one fetch round.
#[derive(Debug, Clone)]
pub struct FetchRound<T> {
    /// Ids of every record fetched, before the suitability filter.
    pub fetched_ids: Vec<String>,
    /// Records that passed the filter, stamped with the round's timestamp.
    pub records: Vec<T>,
}

/// Channel ids referenced by surviving services plus the ids listed directly
/// for the region, deduplicated and sorted.
pub fn channel_closure(services: &[NormalizedService], listed: IdSet) -> Vec<String> {
    let mut ids = listed;
    ids.extend(
        services
            .iter()
            .flat_map(|service| service.channel_ids.iter().cloned()),
    );

    let mut ids: Vec<String> = ids.into_iter().collect();
    ids.sort();
    ids
}

/// Timestamp shared by every record of a fetch round. Millisecond precision
/// matches what the store keeps, so the next watermark compares exactly.
fn round_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub struct ServiceImporter<S: DocumentStore> {
    catalog: CatalogClient,
    store: S,
    region: RegionContext,
    options: SyncOptions,
}

impl<S: DocumentStore> ServiceImporter<S> {
    /// Loads the region's reference data; fails if the catalog is unreachable
    /// or the province cannot be resolved.
    pub async fn new(
        catalog: CatalogClient,
        store: S,
        region: &RegionSpec,
        options: SyncOptions,
    ) -> Result<Self> {
        let region = RegionContext::load(&catalog, region).await?;
        Ok(Self::with_region(catalog, store, region, options))
    }

    pub fn with_region(
        catalog: CatalogClient,
        store: S,
        region: RegionContext,
        options: SyncOptions,
    ) -> Self {
        Self {
            catalog,
            store,
            region,
            options,
        }
    }

    pub fn region(&self) -> &RegionContext {
        &self.region
    }

    pub async fn import_services(&self) -> Result<SyncReport> {
        self.import_services_at(Utc::now()).await
    }

    /// One complete run. Nothing is written to the store until every fetch
    /// has succeeded.
    pub async fn import_services_at(&self, now: DateTime<Utc>) -> Result<SyncReport> {
        let mode = SyncMode::for_date(now);
        let mut report = SyncReport::new(mode);
        tracing::info!("🚀 Starting {:?} sync", mode);

        // 1. 決定增量起點
        let (services_since, channels_since) = match mode {
            SyncMode::Full => (None, None),
            SyncMode::Incremental => (
                self.store.max_last_updated(Collection::Services).await?,
                self.store.max_last_updated(Collection::Channels).await?,
            ),
        };
        tracing::info!(
            "⏱️ Watermarks: services {:?}, channels {:?}",
            services_since,
            channels_since
        );

        // 2. 服務
        let services = self.fetch_services(services_since).await?;
        report.services_fetched = services.fetched_ids.len();

        // 3. 頻道 id 閉包
        let listed = self
            .catalog
            .channel_ids_by_province(&self.region, channels_since)
            .await?;
        let channel_ids = channel_closure(&services.records, listed);
        tracing::info!("🔗 {} channel ids in closure", channel_ids.len());

        // 4. 頻道
        let channels = self.fetch_channels(&channel_ids).await?;
        report.channels_fetched = channels.fetched_ids.len();

        // 5. 寫回
        self.reconcile(mode, &services, &channels, &mut report).await?;

        // 6. 參考資料
        report.municipalities_stored = self.refresh_municipalities().await?;

        tracing::info!(
            "✅ Sync finished: services {} stored / {} deleted, channels {} stored / {} deleted",
            report.services_stored,
            report.services_deleted,
            report.channels_stored,
            report.channels_deleted
        );
        Ok(report)
    }

    async fn changed_service_ids(&self, since: Option<DateTime<Utc>>) -> Result<IdSet> {
        let include_whole_country = self.options.include_whole_country;
        match self.options.service_scope {
            ServiceScope::All => self.catalog.service_ids(since).await,
            ServiceScope::Province => {
                self.catalog
                    .service_ids_by_province(&self.region, since, include_whole_country)
                    .await
            }
            ServiceScope::Municipalities => {
                self.catalog
                    .service_ids_by_municipalities(&self.region, since, include_whole_country)
                    .await
            }
        }
    }

    pub async fn fetch_services(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<FetchRound<NormalizedService>> {
        let mut ids: Vec<String> = self.changed_service_ids(since).await?.into_iter().collect();
        ids.sort();
        tracing::info!("📥 {} changed service ids", ids.len());

        let fetched_at = round_timestamp();
        let raw = self.catalog.fetch_services(&ids).await?;

        let mut fetched_ids = Vec::with_capacity(raw.len());
        let mut records = Vec::new();
        for item in &raw {
            let mut service = normalize_service(item)?;
            service.last_updated = Some(fetched_at);
            fetched_ids.push(service.id.clone());
            if is_suitable_service(&service, &self.region) {
                records.push(service);
            }
        }

        tracing::info!("🧹 {} of {} services suitable", records.len(), fetched_ids.len());
        Ok(FetchRound {
            fetched_ids,
            records,
        })
    }

    pub async fn fetch_channels(&self, ids: &[String]) -> Result<FetchRound<NormalizedChannel>> {
        let fetched_at = round_timestamp();
        let raw = self.catalog.fetch_channels(ids).await?;

        let mut fetched_ids = Vec::with_capacity(raw.len());
        let mut records = Vec::new();
        for item in &raw {
            let mut channel = normalize_channel(item)?;
            channel.last_updated = Some(fetched_at);
            fetched_ids.push(channel.id.clone());
            if is_suitable_channel(&channel, &self.region) {
                records.push(channel);
            }
        }

        tracing::info!("🧹 {} of {} channels suitable", records.len(), fetched_ids.len());
        Ok(FetchRound {
            fetched_ids,
            records,
        })
    }

    /// Full mode clears both collections; incremental mode removes every id
    /// fetched this round, including records the filter has just rejected.
    async fn reconcile(
        &self,
        mode: SyncMode,
        services: &FetchRound<NormalizedService>,
        channels: &FetchRound<NormalizedChannel>,
        report: &mut SyncReport,
    ) -> Result<()> {
        match mode {
            SyncMode::Full => {
                report.services_deleted = self.store.delete_all(Collection::Services).await?;
                report.channels_deleted = self.store.delete_all(Collection::Channels).await?;
            }
            SyncMode::Incremental => {
                report.services_deleted =
                    self.delete_ids(Collection::Services, &services.fetched_ids).await?;
                report.channels_deleted =
                    self.delete_ids(Collection::Channels, &channels.fetched_ids).await?;
            }
        }
        tracing::info!(
            "🗑️ {} old services deleted, {} old channels deleted",
            report.services_deleted,
            report.channels_deleted
        );

        report.services_stored = self.insert(Collection::Services, &services.records).await?;
        report.channels_stored = self.insert(Collection::Channels, &channels.records).await?;
        tracing::info!(
            "💾 {} new services stored, {} new channels stored",
            report.services_stored,
            report.channels_stored
        );
        Ok(())
    }

    async fn delete_ids(&self, collection: Collection, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.store.delete_by_ids(collection, ids).await
    }

    async fn insert<T: Serialize>(&self, collection: Collection, records: &[T]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        let docs = records
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.store.insert_many(collection, docs).await
    }

    /// Replaces the stored municipality list with the cached one.
    pub async fn refresh_municipalities(&self) -> Result<u64> {
        let deleted = self.store.delete_all(Collection::Municipalities).await?;
        let stored = self
            .insert(Collection::Municipalities, &self.region.municipalities)
            .await?;
        tracing::info!("🏘️ {} old municipalities deleted, {} stored", deleted, stored);
        Ok(stored)
    }
}
