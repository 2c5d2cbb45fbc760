//! Prometheus counters served on `/metrics`.
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub struct ApiMetrics {
    registry: Registry,
    validations: IntCounterVec,
    patches: IntCounterVec,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let validations = IntCounterVec::new(
            Opts::new("pwgate_validations_total", "Password validations by outcome"),
            &["outcome"],
        )?;
        let patches = IntCounterVec::new(
            Opts::new("pwgate_policy_patches_total", "Policy patch batches by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(validations.clone()))?;
        registry.register(Box::new(patches.clone()))?;

        Ok(Self {
            registry,
            validations,
            patches,
        })
    }

    /// `outcome` is "allowed" or the denial code
    pub fn record_validation(&self, outcome: &str) {
        self.validations.with_label_values(&[outcome]).inc();
    }

    /// `outcome` is "applied" or the error code
    pub fn record_patch(&self, outcome: &str) {
        self.patches.with_label_values(&[outcome]).inc();
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
