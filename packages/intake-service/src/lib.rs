pub mod cache;
pub mod capture;
pub mod embed;
pub mod guardrails;
pub mod normalize;
pub mod runner;
pub mod sessions;
pub mod sync;

mod error;

pub use error::{Error, Result};

use std::{future::Future, pin::Pin, sync::Arc};

use uuid::Uuid;

use intake_config::{Config, EmbeddingProviderConfig, EventsProviderConfig};
use intake_providers::{embedding::EmbeddingBatch, events::EventPage};
use intake_storage::db::Db;

pub use cache::{SimilarItem, SimilarRequest};
pub use capture::{CaptureOutcome, CaptureRequest, CapturedEvent};
pub use embed::EmbedResult;
pub use guardrails::{BlockedReason, GuardrailOutcome, MeteredCall};
pub use normalize::{NormalizeOp, NormalizedInteraction};
pub use runner::{JobError, SweepReport, UserRunReport};
pub use sessions::ProgressEvent;
pub use sync::{SyncReport, SyncRequest};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, intake_providers::Result<EmbeddingBatch>>;
}

/// The provider event feed. Credential refresh lives upstream; implementors
/// receive validated identity and ready-to-use provider access.
pub trait EventSource
where
	Self: Send + Sync,
{
	fn fetch_events<'a>(
		&'a self,
		cfg: &'a EventsProviderConfig,
		user_id: Uuid,
		service: &'a str,
		cursor: Option<&'a str>,
	) -> BoxFuture<'a, intake_providers::Result<EventPage>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub events: Arc<dyn EventSource>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, events: Arc<dyn EventSource>) -> Self {
		Self { embedding, events }
	}
}

pub struct IntakeService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}
impl IntakeService {
	pub fn new(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}
}
