use crate::IndexMetrics;
use ahash::AHashMap as HashMap;
use intention_controller_core::{
    precedence, Authorizer, Intention, IntentionId, IntentionSpec, ServicePattern,
    ValidationError,
};
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub type SharedIndex = Arc<RwLock<Index>>;

/// Holds all accepted intentions by ID.
#[derive(Debug, Default)]
pub struct Index {
    intentions: HashMap<IntentionId, Arc<Intention>>,
    pub(crate) metrics: IndexMetrics,
}

/// A change to the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Create(IntentionSpec),
    Update(IntentionId, IntentionSpec),
    Delete(IntentionId),
}

/// The outcome of a successfully applied [`Op`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applied {
    Created(IntentionId),
    Updated(IntentionId),

    /// The update did not change the stored intention.
    Unchanged(IntentionId),

    Deleted(IntentionId),
}

/// Selects which end of an intention is matched by [`Index::matches`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MatchType {
    Source,
    Destination,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid intention: {0}")]
    Invalid(#[from] ValidationError),

    #[error("intention not found: {0}")]
    NotFound(IntentionId),

    #[error("duplicate intention found: {0}")]
    Duplicate(IntentionId),

    #[error("permission denied")]
    PermissionDenied,
}

// === impl Index ===

impl Index {
    pub fn new(metrics: IndexMetrics) -> Self {
        Self {
            intentions: HashMap::default(),
            metrics,
        }
    }

    pub fn shared(metrics: IndexMetrics) -> SharedIndex {
        Arc::new(RwLock::new(Self::new(metrics)))
    }

    /// Applies a change on behalf of a caller authorized by `authz`.
    pub fn apply<A>(&mut self, op: Op, authz: &A) -> Result<Applied, Error>
    where
        A: Authorizer + ?Sized,
    {
        let kind = op.kind();
        let result = match op {
            Op::Create(spec) => self.create(spec, authz),
            Op::Update(id, spec) => self.update(id, spec, authz),
            Op::Delete(id) => self.delete(id, authz),
        };

        match &result {
            Ok(applied) => self.metrics.applied(applied.kind()),
            Err(error) => {
                info!(%error, op = %kind, "Rejected");
                self.metrics.rejected(error.reason());
            }
        }
        self.metrics.set_size(self.intentions.len());

        result
    }

    pub fn get(&self, id: &IntentionId) -> Option<Arc<Intention>> {
        self.intentions.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.intentions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intentions.is_empty()
    }

    /// Returns all intentions in precedence order.
    pub fn list(&self) -> Vec<Arc<Intention>> {
        self.collect(|_| true)
    }

    /// Returns the intentions the caller may read, in precedence order.
    pub fn list_readable<A>(&self, authz: &A) -> Vec<Arc<Intention>>
    where
        A: Authorizer + ?Sized,
    {
        self.collect(|ixn| ixn.can_read(authz))
    }

    /// Returns the intentions that apply to the service `namespace/name`, in precedence order.
    ///
    /// With [`MatchType::Destination`], these are the intentions a proxy for the service evaluates
    /// against inbound connections.
    pub fn matches(&self, by: MatchType, namespace: &str, name: &str) -> Vec<Arc<Intention>> {
        self.collect(|ixn| by.pattern(ixn.spec()).matches(namespace, name))
    }

    fn collect(&self, include: impl Fn(&Intention) -> bool) -> Vec<Arc<Intention>> {
        let mut intentions = self
            .intentions
            .values()
            .filter(|ixn| include(ixn))
            .cloned()
            .collect::<Vec<_>>();
        precedence::sort(&mut intentions);
        intentions
    }

    /// Finds the intention, if any, that applies to the same source and destination as `spec`.
    fn find_by_key(&self, spec: &IntentionSpec) -> Option<&Arc<Intention>> {
        self.intentions
            .values()
            .find(|ixn| ixn.spec().key() == spec.key())
    }

    fn create<A>(&mut self, spec: IntentionSpec, authz: &A) -> Result<Applied, Error>
    where
        A: Authorizer + ?Sized,
    {
        // Invalid specs are reported before authorization is checked.
        spec.validate()?;

        if !spec.can_write(authz) {
            return Err(Error::PermissionDenied);
        }

        if let Some(existing) = self.find_by_key(&spec) {
            return Err(Error::Duplicate(existing.id().clone()));
        }

        let id = IntentionId::generate();
        let ixn = Intention::new(id.clone(), spec);
        info!(
            %id,
            source = %ixn.spec().source(),
            destination = %ixn.spec().destination(),
            action = %ixn.spec().action,
            precedence = ixn.precedence(),
            "Created"
        );
        self.intentions.insert(id.clone(), Arc::new(ixn));

        Ok(Applied::Created(id))
    }

    fn update<A>(
        &mut self,
        id: IntentionId,
        spec: IntentionSpec,
        authz: &A,
    ) -> Result<Applied, Error>
    where
        A: Authorizer + ?Sized,
    {
        let current = self
            .intentions
            .get(&id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;

        spec.validate()?;

        // The caller must be able to write both the intention being replaced and its replacement.
        if !current.can_write(authz) || !spec.can_write(authz) {
            return Err(Error::PermissionDenied);
        }

        if let Some(existing) = self.find_by_key(&spec) {
            if existing.id() != &id {
                return Err(Error::Duplicate(existing.id().clone()));
            }
        }

        let mut ixn = Intention::clone(current);
        if !ixn.update(spec) {
            debug!(%id, "Unchanged");
            return Ok(Applied::Unchanged(id));
        }

        info!(
            %id,
            source = %ixn.spec().source(),
            destination = %ixn.spec().destination(),
            action = %ixn.spec().action,
            precedence = ixn.precedence(),
            "Updated"
        );
        self.intentions.insert(id.clone(), Arc::new(ixn));

        Ok(Applied::Updated(id))
    }

    fn delete<A>(&mut self, id: IntentionId, authz: &A) -> Result<Applied, Error>
    where
        A: Authorizer + ?Sized,
    {
        let current = self
            .intentions
            .get(&id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        if !current.can_write(authz) {
            return Err(Error::PermissionDenied);
        }

        self.intentions.remove(&id);
        info!(%id, "Deleted");

        Ok(Applied::Deleted(id))
    }
}

// === impl Op ===

impl Op {
    fn kind(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(..) => "update",
            Self::Delete(_) => "delete",
        }
    }
}

// === impl Applied ===

impl Applied {
    pub fn id(&self) -> &IntentionId {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Unchanged(id) | Self::Deleted(id) => id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "create",
            Self::Updated(_) => "update",
            Self::Unchanged(_) => "noop",
            Self::Deleted(_) => "delete",
        }
    }
}

// === impl MatchType ===

impl MatchType {
    fn pattern(self, spec: &IntentionSpec) -> ServicePattern<'_> {
        match self {
            Self::Source => spec.source(),
            Self::Destination => spec.destination(),
        }
    }
}

// === impl Error ===

impl Error {
    fn reason(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid",
            Self::NotFound(_) => "not_found",
            Self::Duplicate(_) => "duplicate",
            Self::PermissionDenied => "permission_denied",
        }
    }
}
