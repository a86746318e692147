//! Small newtypes replacing the source's sentinel-int conventions.

use std::fmt;

/// A register-file index, `0..128`. `None` in an `Option<RegIndex>` stands in
/// for the source's `-1` ("no such register").
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegIndex(pub u8);

impl RegIndex {
    pub fn new(raw: i64) -> Option<Self> {
        if raw < 0 {
            None
        } else {
            Some(RegIndex(raw as u8))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RegIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The tag uniquely identifying an instruction, equal to its 0-based
/// insertion order in the trace. Replaces the source's `dest_tag` sentinel
/// `-5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub u32);

impl Tag {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which functional-unit pool an instruction routes to. `K1A`/`K1B` are the
/// trace's `1` and `-1` variants; both are served by the k1 pool, but kept
/// distinct so a malformed-trace diagnostic (or future per-variant stat)
/// can still tell them apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuClass {
    K0,
    K1A,
    K1B,
    K2,
}

impl FuClass {
    pub fn from_token(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(FuClass::K0),
            1 => Some(FuClass::K1A),
            -1 => Some(FuClass::K1B),
            2 => Some(FuClass::K2),
            _ => None,
        }
    }

    /// The pool this class is served by.
    pub fn pool(self) -> FuPool {
        match self {
            FuClass::K0 => FuPool::K0,
            FuClass::K1A | FuClass::K1B => FuPool::K1,
            FuClass::K2 => FuPool::K2,
        }
    }
}

/// The three functional-unit pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuPool {
    K0,
    K1,
    K2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reg_index_absent_on_negative() {
        assert_eq!(RegIndex::new(-1), None);
        assert_eq!(RegIndex::new(5), Some(RegIndex(5)));
    }

    #[test]
    fn fu_class_pool_routing() {
        assert_eq!(FuClass::K1A.pool(), FuPool::K1);
        assert_eq!(FuClass::K1B.pool(), FuPool::K1);
        assert_eq!(FuClass::K0.pool(), FuPool::K0);
        assert_eq!(FuClass::K2.pool(), FuPool::K2);
    }

    #[test]
    fn fu_class_from_token() {
        assert_eq!(FuClass::from_token(0), Some(FuClass::K0));
        assert_eq!(FuClass::from_token(-1), Some(FuClass::K1B));
        assert_eq!(FuClass::from_token(7), None);
    }
}
