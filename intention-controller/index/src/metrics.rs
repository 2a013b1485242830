use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, gauge::Gauge},
    registry::Registry,
};

#[derive(Clone, Debug, Default)]
pub struct IndexMetrics {
    pub(crate) size: Gauge,
    pub(crate) applies: Family<OpLabels, Counter>,
    pub(crate) rejections: Family<RejectLabels, Counter>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub(crate) struct OpLabels {
    pub(crate) op: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub(crate) struct RejectLabels {
    pub(crate) reason: String,
}

// === impl IndexMetrics ===

impl IndexMetrics {
    pub fn register(prom: &mut Registry) -> Self {
        let size = Gauge::default();
        prom.register(
            "intention_index_size",
            "Gauge of the number of intentions in the index",
            size.clone(),
        );

        let applies = Family::default();
        prom.register(
            "intention_index_applies",
            "Count of changes applied to the index",
            applies.clone(),
        );

        let rejections = Family::default();
        prom.register(
            "intention_index_rejections",
            "Count of changes rejected by the index",
            rejections.clone(),
        );

        Self {
            size,
            applies,
            rejections,
        }
    }

    pub(crate) fn applied(&self, op: &str) {
        self.applies
            .get_or_create(&OpLabels { op: op.to_string() })
            .inc();
    }

    pub(crate) fn rejected(&self, reason: &str) {
        self.rejections
            .get_or_create(&RejectLabels {
                reason: reason.to_string(),
            })
            .inc();
    }

    pub(crate) fn set_size(&self, size: usize) {
        self.size.set(size as i64);
    }
}
