use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::models::parcel::ParcelStatus;

pub struct Metrics {
    registry: Registry,
    pub parcel_transitions_total: IntCounterVec,
    pub parcels_by_status: IntGaugeVec,
    pub payments_collected_total: IntCounter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let parcel_transitions_total = IntCounterVec::new(
            Opts::new(
                "parcel_transitions_total",
                "Parcel status transitions by outcome",
            ),
            &["outcome"],
        )
        .expect("valid parcel_transitions_total metric");

        let parcels_by_status = IntGaugeVec::new(
            Opts::new("parcels_by_status", "Current number of parcels per status"),
            &["status"],
        )
        .expect("valid parcels_by_status metric");

        let payments_collected_total = IntCounter::new(
            "payments_collected_total",
            "Cash payments collected by drivers",
        )
        .expect("valid payments_collected_total metric");

        registry
            .register(Box::new(parcel_transitions_total.clone()))
            .expect("register parcel_transitions_total");
        registry
            .register(Box::new(parcels_by_status.clone()))
            .expect("register parcels_by_status");
        registry
            .register(Box::new(payments_collected_total.clone()))
            .expect("register payments_collected_total");

        for status in ParcelStatus::ALL {
            parcels_by_status.with_label_values(&[status.as_str()]).set(0);
        }

        Self {
            registry,
            parcel_transitions_total,
            parcels_by_status,
            payments_collected_total,
        }
    }

    pub fn record_transition(&self, outcome: &str) {
        self.parcel_transitions_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn parcel_moved(&self, from: ParcelStatus, to: ParcelStatus) {
        self.parcels_by_status
            .with_label_values(&[from.as_str()])
            .dec();
        self.parcels_by_status.with_label_values(&[to.as_str()]).inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
