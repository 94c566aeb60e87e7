use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use rtsl_scene::{InstanceId, World};
use rtsl_types::{Identity, SurrogateRecord};
use tracing::debug;

use crate::codec::Codec;
use crate::error::{CodecError, CodecResult};
use crate::identity::{IdentityStore, ResolveIdentity};

/// Lookup of records by identity.
pub trait RecordSource {
    fn record(&self, identity: Identity) -> Option<&SurrogateRecord>;
}

impl RecordSource for BTreeMap<Identity, SurrogateRecord> {
    fn record(&self, identity: Identity) -> Option<&SurrogateRecord> {
        self.get(&identity)
    }
}

impl RecordSource for HashMap<Identity, SurrogateRecord> {
    fn record(&self, identity: Identity) -> Option<&SurrogateRecord> {
        self.get(&identity)
    }
}

/// Rebuilds live objects from records, resolving forward and cyclic
/// references with placeholders.
///
/// Reconstruction is two explicit steps. [`allocate`](Self::allocate)
/// constructs an empty instance for an identity and binds it, so anything
/// referring to that identity can already point at it.
/// [`populate`](Self::populate) later applies the record's fields. Records
/// reached through references are queued instead of recursed into, and a
/// record is never applied twice.
pub struct Materializer<'a, S: RecordSource + ?Sized> {
    codec: &'a Codec,
    source: &'a S,
    identities: IdentityStore,
    pending: VecDeque<Identity>,
    applied: HashSet<Identity>,
    created: Vec<InstanceId>,
}

impl<'a, S: RecordSource + ?Sized> Materializer<'a, S> {
    pub fn new(codec: &'a Codec, source: &'a S) -> Self {
        Self::with_identities(codec, source, IdentityStore::new())
    }

    /// Start from existing bindings; bound identities are not re-created.
    pub fn with_identities(codec: &'a Codec, source: &'a S, identities: IdentityStore) -> Self {
        Self {
            codec,
            source,
            identities,
            pending: VecDeque::new(),
            applied: HashSet::new(),
            created: Vec::new(),
        }
    }

    /// Phase one: an empty instance bound to `identity`, queued for
    /// population. Returns the existing instance if already bound.
    pub fn allocate(&mut self, identity: Identity, world: &mut World) -> CodecResult<InstanceId> {
        if let Some(instance) = self.identities.instance_for(identity) {
            return Ok(instance);
        }
        let source = self.source;
        let record = source.record(identity).ok_or(CodecError::DanglingReference {
            identity,
            referrer: None,
        })?;
        let instance = world.insert_boxed(self.codec.construct(&record.type_tag)?);
        self.created.push(instance);
        self.identities.bind(identity, instance)?;
        self.pending.push_back(identity);
        Ok(instance)
    }

    /// Phase two: apply the record of an allocated identity.
    pub fn populate(&mut self, identity: Identity, world: &mut World) -> CodecResult<()> {
        if self.applied.contains(&identity) {
            return Ok(());
        }
        let instance = self
            .identities
            .instance_for(identity)
            .ok_or(CodecError::DanglingReference {
                identity,
                referrer: None,
            })?;
        let source = self.source;
        let record = source.record(identity).ok_or(CodecError::DanglingReference {
            identity,
            referrer: None,
        })?;
        let codec = self.codec;
        codec.apply(record, Some(instance), world, self)?;
        self.applied.insert(identity);
        Ok(())
    }

    /// Materialize `roots` and everything they reach.
    pub fn materialize(
        &mut self,
        roots: &[Identity],
        world: &mut World,
    ) -> CodecResult<Vec<InstanceId>> {
        let mut instances = Vec::with_capacity(roots.len());
        for &root in roots {
            instances.push(self.allocate(root, world)?);
        }
        while let Some(identity) = self.pending.pop_front() {
            self.populate(identity, world)?;
        }
        debug!(
            roots = roots.len(),
            created = self.created.len(),
            applied = self.applied.len(),
            "materialized"
        );
        Ok(instances)
    }

    /// Remove every instance this materializer created.
    pub fn rollback(&mut self, world: &mut World) {
        for instance in self.created.drain(..).rev() {
            world.remove(instance);
        }
        self.pending.clear();
        self.applied.clear();
    }

    pub fn created(&self) -> &[InstanceId] {
        &self.created
    }

    pub fn identities(&self) -> &IdentityStore {
        &self.identities
    }

    pub fn into_identities(self) -> IdentityStore {
        self.identities
    }
}

impl<S: RecordSource + ?Sized> ResolveIdentity for Materializer<'_, S> {
    fn bind(&mut self, identity: Identity, instance: InstanceId) -> CodecResult<()> {
        self.identities.bind(identity, instance)
    }

    /// Bound identities resolve directly; identities with a record get a
    /// placeholder; anything else dangles.
    fn resolve(
        &mut self,
        identity: Identity,
        referrer: Identity,
        world: &mut World,
    ) -> CodecResult<InstanceId> {
        if let Some(instance) = self.identities.instance_for(identity) {
            return Ok(instance);
        }
        if self.source.record(identity).is_none() {
            return Err(CodecError::DanglingReference {
                identity,
                referrer: Some(referrer),
            });
        }
        self.allocate(identity, world)
    }
}
