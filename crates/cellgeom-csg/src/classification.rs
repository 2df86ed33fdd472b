//! Three-valued classification of a region against a geometry.

use std::fmt;
use std::ops::Neg;

/// Where a box or point lies relative to a geometry.
///
/// Ordered `Outside < Ambiguous < Inside`, so intersection is `min` and union
/// is `max`. Negation corresponds to complementing the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Classification {
    /// Entirely outside.
    Outside,
    /// Possibly crossing the boundary.
    Ambiguous,
    /// Entirely inside.
    Inside,
}

impl Classification {
    /// Map a sign (`-1`, `0`, `+1`) to a classification.
    pub fn from_sign(sign: i8) -> Self {
        match sign.signum() {
            1 => Classification::Inside,
            -1 => Classification::Outside,
            _ => Classification::Ambiguous,
        }
    }

    /// The sign of this classification.
    pub fn sign(self) -> i8 {
        match self {
            Classification::Outside => -1,
            Classification::Ambiguous => 0,
            Classification::Inside => 1,
        }
    }

    /// Intersection of two classifications.
    pub fn and(self, other: Self) -> Self {
        self.min(other)
    }

    /// Union of two classifications.
    pub fn or(self, other: Self) -> Self {
        self.max(other)
    }

    /// True for [`Classification::Ambiguous`].
    pub fn is_ambiguous(self) -> bool {
        self == Classification::Ambiguous
    }
}

impl Neg for Classification {
    type Output = Self;

    fn neg(self) -> Self {
        match self {
            Classification::Outside => Classification::Inside,
            Classification::Ambiguous => Classification::Ambiguous,
            Classification::Inside => Classification::Outside,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::Outside => "outside",
            Classification::Ambiguous => "ambiguous",
            Classification::Inside => "inside",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Classification::Outside < Classification::Ambiguous);
        assert!(Classification::Ambiguous < Classification::Inside);
    }

    #[test]
    fn test_combinators() {
        use Classification::*;
        assert_eq!(Inside.and(Ambiguous), Ambiguous);
        assert_eq!(Outside.and(Inside), Outside);
        assert_eq!(Outside.or(Ambiguous), Ambiguous);
        assert_eq!(Inside.or(Outside), Inside);
    }

    #[test]
    fn test_negation_and_sign() {
        for c in [
            Classification::Outside,
            Classification::Ambiguous,
            Classification::Inside,
        ] {
            assert_eq!(-(-c), c);
            assert_eq!(Classification::from_sign(c.sign()), c);
            assert_eq!((-c).sign(), -c.sign());
        }
        assert_eq!(Classification::from_sign(5), Classification::Inside);
    }
}
