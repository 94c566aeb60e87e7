use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Persistent cross-reference identity of one object.
///
/// The upper 32 bits hold the ordinal of the shard the object was allocated
/// in, the lower 32 bits a shard-local counter. Local counters restart at the
/// same base in every shard; the ordinal keeps identities unique across a
/// shard set.
///
/// The raw value `0` is reserved for "no reference".
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Identity(u64);

impl Identity {
    /// The null identity.
    pub const NULL: Identity = Identity(0);

    const ORDINAL_SHIFT: u32 = 32;
    const LOCAL_MASK: u64 = 0xFFFF_FFFF;

    /// The null identity. Represents "no reference".
    pub const fn null() -> Self {
        Self::NULL
    }

    /// Returns `true` if this is the null identity.
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Compose an identity from a shard ordinal and a shard-local counter.
    pub const fn compose(ordinal: u32, local: u32) -> Self {
        Self(((ordinal as u64) << Self::ORDINAL_SHIFT) | local as u64)
    }

    /// Reinterpret a raw integer.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer written into shard containers.
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Ordinal of the shard this identity was allocated in.
    pub const fn ordinal(&self) -> u32 {
        (self.0 >> Self::ORDINAL_SHIFT) as u32
    }

    /// Shard-local part.
    pub const fn local(&self) -> u32 {
        (self.0 & Self::LOCAL_MASK) as u32
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Identity(null)")
        } else {
            write!(f, "Identity({}:{})", self.ordinal(), self.local())
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ordinal(), self.local())
    }
}

impl FromStr for Identity {
    type Err = TypeError;

    /// Parse `ordinal:local` or a raw decimal integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some((ordinal, local)) => {
                let ordinal = ordinal
                    .parse::<u32>()
                    .map_err(|e| TypeError::OutOfRange(format!("ordinal {ordinal:?}: {e}")))?;
                let local = local
                    .parse::<u32>()
                    .map_err(|e| TypeError::OutOfRange(format!("local {local:?}: {e}")))?;
                Ok(Self::compose(ordinal, local))
            }
            None => s
                .parse::<u64>()
                .map(Self)
                .map_err(|e| TypeError::InvalidIdentity(format!("{s:?}: {e}"))),
        }
    }
}

impl From<Identity> for u64 {
    fn from(id: Identity) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn null_is_zero() {
        assert!(Identity::null().is_null());
        assert_eq!(Identity::NULL.raw(), 0);
        assert_eq!(Identity::default(), Identity::NULL);
    }

    #[test]
    fn compose_splits_back() {
        let id = Identity::compose(3, 17);
        assert_eq!(id.ordinal(), 3);
        assert_eq!(id.local(), 17);
        assert!(!id.is_null());
    }

    #[test]
    fn ordinal_zero_local_one_is_not_null() {
        assert!(!Identity::compose(0, 1).is_null());
        assert_eq!(Identity::compose(0, 1).raw(), 1);
    }

    #[test]
    fn same_local_different_ordinal_differ() {
        assert_ne!(Identity::compose(0, 5), Identity::compose(1, 5));
    }

    #[test]
    fn parse_pair_and_raw() {
        let id: Identity = "2:9".parse().unwrap();
        assert_eq!(id, Identity::compose(2, 9));
        let raw: Identity = id.raw().to_string().parse().unwrap();
        assert_eq!(raw, id);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            "abc".parse::<Identity>(),
            Err(TypeError::InvalidIdentity(_))
        ));
        assert!(matches!(
            "1:x".parse::<Identity>(),
            Err(TypeError::OutOfRange(_))
        ));
    }

    #[test]
    fn display_is_ordinal_colon_local() {
        assert_eq!(Identity::compose(4, 12).to_string(), "4:12");
        assert_eq!(format!("{:?}", Identity::NULL), "Identity(null)");
    }

    #[test]
    fn serde_is_a_plain_integer() {
        let id = Identity::compose(1, 2);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, id.raw().to_string());
        let parsed: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    proptest! {
        #[test]
        fn compose_is_lossless(ordinal in any::<u32>(), local in any::<u32>()) {
            let id = Identity::compose(ordinal, local);
            prop_assert_eq!(id.ordinal(), ordinal);
            prop_assert_eq!(id.local(), local);
            prop_assert_eq!(id.is_null(), ordinal == 0 && local == 0);
        }

        #[test]
        fn ordering_follows_ordinal_first(a in any::<(u32, u32)>(), b in any::<(u32, u32)>()) {
            let ia = Identity::compose(a.0, a.1);
            let ib = Identity::compose(b.0, b.1);
            prop_assert_eq!(ia.cmp(&ib), a.cmp(&b));
        }
    }
}
