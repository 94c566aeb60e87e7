use std::collections::HashMap;

use rtsl_scene::{InstanceId, World};
use rtsl_types::Identity;

use crate::error::{CodecError, CodecResult};

/// Assigns and recalls identities for live instances during one pass.
///
/// Allocation is monotonic inside the current shard: identities are
/// `compose(ordinal, next_local)` with `next_local` counting up from the
/// shard's initial base. [`open_shard`](Self::open_shard) switches to a new
/// ordinal and resets the counter.
///
/// Instances seeded through [`seed_known`](Self::seed_known) are the
/// "already present" set: they resolve to their persisted identity and are
/// never allocated again.
#[derive(Clone, Debug)]
pub struct IdentityStore {
    forward: HashMap<InstanceId, Identity>,
    reverse: HashMap<Identity, InstanceId>,
    known: HashMap<InstanceId, Identity>,
    known_reverse: HashMap<Identity, InstanceId>,
    ordinal: u32,
    next_local: u32,
    allocated: usize,
}

impl IdentityStore {
    /// A store allocating from `0:1`.
    pub fn new() -> Self {
        Self::with_base(0, 1)
    }

    /// A store allocating from `ordinal:initial_local`.
    pub fn with_base(ordinal: u32, initial_local: u32) -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
            known: HashMap::new(),
            known_reverse: HashMap::new(),
            ordinal,
            next_local: initial_local.max(1),
            allocated: 0,
        }
    }

    /// Pre-seed instances that already have persisted identities.
    pub fn seed_known<I>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (InstanceId, Identity)>,
    {
        for (instance, identity) in bindings {
            if identity.is_null() {
                continue;
            }
            self.known.insert(instance, identity);
            self.known_reverse.insert(identity, instance);
        }
    }

    pub fn is_known(&self, instance: InstanceId) -> bool {
        self.known.contains_key(&instance)
    }

    pub fn known_len(&self) -> usize {
        self.known.len()
    }

    /// Identity of `instance`, allocating the next one if it is new.
    pub fn identity_of(&mut self, instance: InstanceId) -> CodecResult<Identity> {
        if let Some(identity) = self.peek(instance) {
            return Ok(identity);
        }
        let local = self.next_local;
        self.next_local = local.checked_add(1).ok_or(CodecError::IdentityExhausted {
            ordinal: self.ordinal,
        })?;
        let identity = Identity::compose(self.ordinal, local);
        self.forward.insert(instance, identity);
        self.reverse.insert(identity, instance);
        self.allocated += 1;
        Ok(identity)
    }

    /// Identity of `instance` without allocating.
    pub fn peek(&self, instance: InstanceId) -> Option<Identity> {
        self.known
            .get(&instance)
            .or_else(|| self.forward.get(&instance))
            .copied()
    }

    /// Reverse lookup over both bound and known identities.
    pub fn instance_for(&self, identity: Identity) -> Option<InstanceId> {
        self.reverse
            .get(&identity)
            .or_else(|| self.known_reverse.get(&identity))
            .copied()
    }

    /// Record an existing pairing, as done for placeholders during load.
    pub fn bind(&mut self, identity: Identity, instance: InstanceId) -> CodecResult<()> {
        if identity.is_null() {
            return Err(CodecError::NullIdentity);
        }
        match (self.reverse.get(&identity), self.forward.get(&instance)) {
            (Some(bound), _) if *bound != instance => {
                Err(CodecError::IdentityConflict { identity, instance })
            }
            (_, Some(bound)) if *bound != identity => {
                Err(CodecError::IdentityConflict { identity, instance })
            }
            _ => {
                self.forward.insert(instance, identity);
                self.reverse.insert(identity, instance);
                Ok(())
            }
        }
    }

    /// Continue allocation in shard `ordinal` from `next_local`.
    pub fn open_shard(&mut self, ordinal: u32, next_local: u32) {
        self.ordinal = ordinal;
        self.next_local = next_local.max(1);
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// The local part the next allocation will use.
    pub fn next_local(&self) -> u32 {
        self.next_local
    }

    /// Number of identities allocated by [`identity_of`](Self::identity_of).
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Number of bound (non-known) instances.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Bound (non-known) pairs, in no particular order.
    pub fn bindings(&self) -> impl Iterator<Item = (InstanceId, Identity)> + '_ {
        self.forward.iter().map(|(i, id)| (*i, *id))
    }

    pub fn into_bindings(self) -> HashMap<InstanceId, Identity> {
        self.forward
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns a stored identity into a live instance while a record is applied.
pub trait ResolveIdentity {
    /// Pair a freshly constructed instance with the identity of its record.
    fn bind(&mut self, identity: Identity, instance: InstanceId) -> CodecResult<()>;

    /// Instance for `identity`, referenced from the record `referrer`.
    fn resolve(
        &mut self,
        identity: Identity,
        referrer: Identity,
        world: &mut World,
    ) -> CodecResult<InstanceId>;
}

/// Strict resolution: only identities already bound or known resolve.
impl ResolveIdentity for IdentityStore {
    fn bind(&mut self, identity: Identity, instance: InstanceId) -> CodecResult<()> {
        IdentityStore::bind(self, identity, instance)
    }

    fn resolve(
        &mut self,
        identity: Identity,
        referrer: Identity,
        _world: &mut World,
    ) -> CodecResult<InstanceId> {
        self.instance_for(identity)
            .ok_or(CodecError::DanglingReference {
                identity,
                referrer: Some(referrer),
            })
    }
}
