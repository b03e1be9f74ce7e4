use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Combined local/remote endpoint state.
///
/// Exactly one of UNINIT, ACTIVE, CLOSED is set for each side. Callers test
/// bits with `contains` or the `is_*` predicates, and filter collections
/// with `matches`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EndpointState(u8);

impl EndpointState {
    pub const LOCAL_UNINIT: EndpointState = EndpointState(0x01);
    pub const LOCAL_ACTIVE: EndpointState = EndpointState(0x02);
    pub const LOCAL_CLOSED: EndpointState = EndpointState(0x04);
    pub const REMOTE_UNINIT: EndpointState = EndpointState(0x08);
    pub const REMOTE_ACTIVE: EndpointState = EndpointState(0x10);
    pub const REMOTE_CLOSED: EndpointState = EndpointState(0x20);

    pub const LOCAL_MASK: EndpointState = EndpointState(0x07);
    pub const REMOTE_MASK: EndpointState = EndpointState(0x38);

    /// The empty mask; matches every endpoint
    pub const ANY: EndpointState = EndpointState(0);

    /// State of a freshly created endpoint
    pub const fn initial() -> Self {
        EndpointState(Self::LOCAL_UNINIT.0 | Self::REMOTE_UNINIT.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build a mask from raw bits, rejecting bits outside the six flags
    pub fn from_bits(bits: u8) -> Option<Self> {
        if bits & !(Self::LOCAL_MASK.0 | Self::REMOTE_MASK.0) == 0 {
            Some(EndpointState(bits))
        } else {
            None
        }
    }

    pub const fn contains(self, other: EndpointState) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: EndpointState) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn local(self) -> EndpointState {
        EndpointState(self.0 & Self::LOCAL_MASK.0)
    }

    pub const fn remote(self) -> EndpointState {
        EndpointState(self.0 & Self::REMOTE_MASK.0)
    }

    pub(crate) fn with_local(self, flag: EndpointState) -> EndpointState {
        EndpointState((self.0 & !Self::LOCAL_MASK.0) | flag.0)
    }

    pub(crate) fn with_remote(self, flag: EndpointState) -> EndpointState {
        EndpointState((self.0 & !Self::REMOTE_MASK.0) | flag.0)
    }

    pub fn is_local_uninit(self) -> bool {
        self.contains(Self::LOCAL_UNINIT)
    }

    pub fn is_local_active(self) -> bool {
        self.contains(Self::LOCAL_ACTIVE)
    }

    pub fn is_local_closed(self) -> bool {
        self.contains(Self::LOCAL_CLOSED)
    }

    pub fn is_remote_uninit(self) -> bool {
        self.contains(Self::REMOTE_UNINIT)
    }

    pub fn is_remote_active(self) -> bool {
        self.contains(Self::REMOTE_ACTIVE)
    }

    pub fn is_remote_closed(self) -> bool {
        self.contains(Self::REMOTE_CLOSED)
    }

    /// Mask test used by session/link traversal.
    ///
    /// An empty mask matches everything. A mask naming bits of only one
    /// side matches when any of those bits is set. A mask naming both sides
    /// must equal the state exactly.
    pub fn matches(self, mask: EndpointState) -> bool {
        if mask.is_empty() {
            return true;
        }
        if mask.local().is_empty() || mask.remote().is_empty() {
            self.intersects(mask)
        } else {
            self == mask
        }
    }
}

impl BitOr for EndpointState {
    type Output = EndpointState;

    fn bitor(self, rhs: EndpointState) -> EndpointState {
        EndpointState(self.0 | rhs.0)
    }
}

impl BitOrAssign for EndpointState {
    fn bitor_assign(&mut self, rhs: EndpointState) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EndpointState {
    type Output = EndpointState;

    fn bitand(self, rhs: EndpointState) -> EndpointState {
        EndpointState(self.0 & rhs.0)
    }
}

const NAMES: [(EndpointState, &str); 6] = [
    (EndpointState::LOCAL_UNINIT, "LOCAL_UNINIT"),
    (EndpointState::LOCAL_ACTIVE, "LOCAL_ACTIVE"),
    (EndpointState::LOCAL_CLOSED, "LOCAL_CLOSED"),
    (EndpointState::REMOTE_UNINIT, "REMOTE_UNINIT"),
    (EndpointState::REMOTE_ACTIVE, "REMOTE_ACTIVE"),
    (EndpointState::REMOTE_CLOSED, "REMOTE_CLOSED"),
];

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("0")?;
        }
        Ok(())
    }
}

impl fmt::Debug for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EndpointState({})", self)
    }
}
