use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct MetricsHandle {
    registry: Registry,
    http_requests: IntCounterVec,
    market_recomputes: IntCounter,
}

impl MetricsHandle {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests served, by route"),
            &["route"],
        )?;
        let market_recomputes = IntCounter::new(
            "market_recomputes_total",
            "Engine computations run against the record store",
        )?;
        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(market_recomputes.clone()))?;
        Ok(Self {
            registry,
            http_requests,
            market_recomputes,
        })
    }

    pub fn record_request(&self, route: &str) {
        self.http_requests.with_label_values(&[route]).inc();
    }

    pub fn market_recomputes(&self) -> IntCounter {
        self.market_recomputes.clone()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_the_text_exposition() {
        let metrics = MetricsHandle::new().expect("metrics should register");
        metrics.record_request("ping");
        metrics.record_request("ping");
        metrics.market_recomputes().inc();

        let text = String::from_utf8(metrics.encode().unwrap()).unwrap();
        assert!(text.contains("http_requests_total{route=\"ping\"} 2"));
        assert!(text.contains("market_recomputes_total 1"));
    }
}
