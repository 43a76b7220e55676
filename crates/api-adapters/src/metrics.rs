//! Prometheus metrics for the API surface.

use prometheus_client::encoding::text;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    pub status: u32,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct VoteLabels {
    /// Which transition-table row fired: added / removed / flipped.
    pub outcome: String,
}

pub struct ApiMetrics {
    registry: Registry,
    pub http_requests: Family<RequestLabels, Counter>,
    pub votes_cast: Family<VoteLabels, Counter>,
}

impl ApiMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let http_requests = Family::<RequestLabels, Counter>::default();
        registry.register(
            "huntly_http_requests",
            "HTTP requests handled, by method and status",
            http_requests.clone(),
        );
        let votes_cast = Family::<VoteLabels, Counter>::default();
        registry.register(
            "huntly_votes_cast",
            "Vote transitions applied, by outcome",
            votes_cast.clone(),
        );
        Self {
            registry,
            http_requests,
            votes_cast,
        }
    }

    /// Text exposition for the `/metrics` endpoint.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        text::encode(&mut buf, &self.registry)?;
        Ok(buf)
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}
