//! Optional lifecycle capabilities
//!
//! A component type implements `render` plus any subset of the optional
//! lifecycle methods below. The subset is computed once when the component's
//! shape is built and packed into a [`CapabilitySet`].

use core::fmt;

/// One optional lifecycle method
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Capability {
    InitialState = 0,
    WillMount = 1,
    DidMount = 2,
    WillReceiveProps = 3,
    ShouldUpdate = 4,
    SnapshotBeforeUpdate = 5,
    DidUpdate = 6,
    WillUnmount = 7,
    DidCatch = 8,
    DeriveStateFromProps = 9,
    DeriveStateFromError = 10,
}

impl Capability {
    /// Every capability, in declaration order
    pub const ALL: [Capability; 11] = [
        Capability::InitialState,
        Capability::WillMount,
        Capability::DidMount,
        Capability::WillReceiveProps,
        Capability::ShouldUpdate,
        Capability::SnapshotBeforeUpdate,
        Capability::DidUpdate,
        Capability::WillUnmount,
        Capability::DidCatch,
        Capability::DeriveStateFromProps,
        Capability::DeriveStateFromError,
    ];

    #[inline]
    const fn bit(self) -> u16 {
        1 << self as u16
    }

    /// Name of the host descriptor slot this capability fills
    pub const fn slot_name(self) -> &'static str {
        match self {
            Capability::InitialState => "getInitialState",
            Capability::WillMount => "componentWillMount",
            Capability::DidMount => "componentDidMount",
            Capability::WillReceiveProps => "componentWillReceiveProps",
            Capability::ShouldUpdate => "shouldComponentUpdate",
            Capability::SnapshotBeforeUpdate => "getSnapshotBeforeUpdate",
            Capability::DidUpdate => "componentDidUpdate",
            Capability::WillUnmount => "componentWillUnmount",
            Capability::DidCatch => "componentDidCatch",
            Capability::DeriveStateFromProps => "getDerivedStateFromProps",
            Capability::DeriveStateFromError => "getDerivedStateFromError",
        }
    }

    /// Static hooks live under the descriptor's `statics` sub-object
    pub const fn is_static(self) -> bool {
        matches!(
            self,
            Capability::DeriveStateFromProps | Capability::DeriveStateFromError
        )
    }
}

/// Bitset of [`Capability`] values
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CapabilitySet {
    bits: u16,
}

impl CapabilitySet {
    /// No optional capabilities
    pub const EMPTY: CapabilitySet = CapabilitySet { bits: 0 };

    /// Return a copy with `cap` added
    #[inline]
    pub const fn with(self, cap: Capability) -> Self {
        Self {
            bits: self.bits | cap.bit(),
        }
    }

    /// Add a capability in place
    #[inline]
    pub fn insert(&mut self, cap: Capability) {
        self.bits |= cap.bit();
    }

    /// Check membership
    #[inline]
    pub const fn contains(self, cap: Capability) -> bool {
        self.bits & cap.bit() != 0
    }

    /// Number of capabilities present
    #[inline]
    pub const fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Check if no capability is present
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Raw bits
    #[inline]
    pub const fn to_bits(self) -> u16 {
        self.bits
    }

    /// Iterate over present capabilities in declaration order
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |cap| self.contains(*cap))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::EMPTY;
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_set() {
        let set = CapabilitySet::EMPTY
            .with(Capability::DidMount)
            .with(Capability::InitialState);

        assert!(set.contains(Capability::DidMount));
        assert!(set.contains(Capability::InitialState));
        assert!(!set.contains(Capability::WillUnmount));
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Capability::InitialState, Capability::DidMount]
        );
    }

    #[test]
    fn test_from_iter_dedups() {
        let set: CapabilitySet = [Capability::DidCatch, Capability::DidCatch]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
        assert!(CapabilitySet::EMPTY.is_empty());
    }

    #[test]
    fn test_static_slots() {
        assert!(Capability::DeriveStateFromProps.is_static());
        assert!(!Capability::DidMount.is_static());
        assert_eq!(Capability::ShouldUpdate.slot_name(), "shouldComponentUpdate");
    }
}
