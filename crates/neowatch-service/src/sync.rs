//! Feed synchronization pipeline.
//!
//! One run fetches the three feeds concurrently, then applies all writes
//! inside a single transactional scope: asteroids, close approaches, and
//! threat assessments are bulk-upserted in that order and committed
//! together. Any failure, fetch or write, rolls the whole run back.

use std::sync::Arc;

use neowatch_core::config::{AppConfig, SyncConfig};
use neowatch_core::observe::EventObserver;
use neowatch_core::result::AppResult;
use neowatch_core::types::RecordData;
use neowatch_database::repositories::{
    AsteroidRepository, CloseApproachRepository, ThreatAssessmentRepository,
};
use neowatch_database::repository::ConflictAction;
use neowatch_database::DatabasePool;
use neowatch_nasa::{CadClient, NasaApiClient, SbdbClient, SentryClient};

/// Outcome of one feed within a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub created: u64,
    pub updated: u64,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub asteroids: SyncReport,
    pub approaches: SyncReport,
    pub threats: SyncReport,
}

pub struct SyncService {
    db: DatabasePool,
    sbdb: SbdbClient,
    cad: CadClient,
    sentry: SentryClient,
    settings: SyncConfig,
    observer: Arc<dyn EventObserver>,
}

impl SyncService {
    pub fn new(
        db: DatabasePool,
        config: &AppConfig,
        observer: Arc<dyn EventObserver>,
    ) -> AppResult<Self> {
        let api = NasaApiClient::new(&config.nasa, observer.clone())?;
        Ok(Self {
            db,
            sbdb: SbdbClient::new(api.clone(), config.nasa.sbdb_url.clone()),
            cad: CadClient::new(api.clone(), config.nasa.cad_url.clone()),
            sentry: SentryClient::new(api, config.nasa.sentry_url.clone()),
            settings: config.sync.clone(),
            observer,
        })
    }

    /// Fetch all three feeds and persist them in one transaction.
    ///
    /// `limit` caps the asteroid catalog for this run, overriding the
    /// configured limit when given.
    pub async fn run_full_sync(&self, limit: Option<u32>) -> AppResult<SyncSummary> {
        let asteroid_limit = limit.or(self.settings.asteroid_limit);

        tracing::info!(?asteroid_limit, "Starting feed synchronization");
        let (asteroids, approaches, threats) = tokio::try_join!(
            self.sbdb.fetch_asteroids(asteroid_limit),
            self.cad.fetch_approaches(
                self.settings.approach_window_days,
                self.settings.max_approach_distance_au,
            ),
            self.sentry.fetch_impact_risks(),
        )?;

        let summary = self
            .persist(&asteroids, &approaches, &threats)
            .await?;

        tracing::info!(
            asteroids_created = summary.asteroids.created,
            asteroids_updated = summary.asteroids.updated,
            approaches_created = summary.approaches.created,
            approaches_updated = summary.approaches.updated,
            threats_created = summary.threats.created,
            threats_updated = summary.threats.updated,
            "Feed synchronization committed"
        );
        Ok(summary)
    }

    async fn persist(
        &self,
        asteroids: &[RecordData],
        approaches: &[RecordData],
        threats: &[RecordData],
    ) -> AppResult<SyncSummary> {
        let mut uow = self
            .db
            .scope_with_observer("full_sync", self.observer.clone())
            .await?;

        let mut repo: AsteroidRepository<'_> = uow.repository()?;
        let (created, updated) = repo
            .bulk_create(asteroids, ConflictAction::Update, None)
            .await?;
        let asteroid_report = SyncReport {
            fetched: asteroids.len(),
            created,
            updated,
        };

        let mut repo: CloseApproachRepository<'_> = uow.repository()?;
        let (created, updated) = repo
            .bulk_create(approaches, ConflictAction::Update, None)
            .await?;
        let approach_report = SyncReport {
            fetched: approaches.len(),
            created,
            updated,
        };

        let mut repo: ThreatAssessmentRepository<'_> = uow.repository()?;
        let (created, updated) = repo
            .bulk_create(threats, ConflictAction::Update, None)
            .await?;
        let threat_report = SyncReport {
            fetched: threats.len(),
            created,
            updated,
        };

        uow.commit().await?;

        Ok(SyncSummary {
            asteroids: asteroid_report,
            approaches: approach_report,
            threats: threat_report,
        })
    }
}
