use uuid::Uuid;

use intake_config::{EmbeddingProviderConfig, EventsProviderConfig};
use intake_providers::{
	embedding::{self, EmbeddingBatch},
	events::{self, EventPage},
};
use intake_service::{BoxFuture, EmbeddingProvider, EventSource};

/// HTTP-backed provider wiring for the long-running worker.
pub struct HttpEmbedding;
impl EmbeddingProvider for HttpEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, intake_providers::Result<EmbeddingBatch>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

pub struct HttpEvents;
impl EventSource for HttpEvents {
	fn fetch_events<'a>(
		&'a self,
		cfg: &'a EventsProviderConfig,
		user_id: Uuid,
		service: &'a str,
		cursor: Option<&'a str>,
	) -> BoxFuture<'a, intake_providers::Result<EventPage>> {
		Box::pin(events::fetch_events(cfg, user_id, service, cursor))
	}
}
