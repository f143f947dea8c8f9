use std::ops::{Add, Sub};

/// One of the three scoring dimensions.
///
/// Declaration order doubles as the tie-break precedence when two axes
/// have the same score: catholic wins over liberal, liberal over protestant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Catholic,
    Liberal,
    Protestant,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Catholic, Axis::Liberal, Axis::Protestant];

    pub fn key(&self) -> &'static str {
        match self {
            Axis::Catholic => "catholic",
            Axis::Liberal => "liberal",
            Axis::Protestant => "protestant",
        }
    }
}

/// Accumulated quiz scores, also used as the per-option answer delta.
///
/// Missing axes in content files deserialize as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScoreVector {
    pub catholic: u32,
    pub liberal: u32,
    pub protestant: u32,
}

impl ScoreVector {
    pub const ZERO: ScoreVector = ScoreVector {
        catholic: 0,
        liberal: 0,
        protestant: 0,
    };

    pub fn new(catholic: u32, liberal: u32, protestant: u32) -> Self {
        Self {
            catholic,
            liberal,
            protestant,
        }
    }

    pub fn get(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Catholic => self.catholic,
            Axis::Liberal => self.liberal,
            Axis::Protestant => self.protestant,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn total(&self) -> u32 {
        self.catholic + self.liberal + self.protestant
    }

    /// Axes ordered by score, highest first. Equal scores keep declaration order.
    pub fn ranked(&self) -> [(Axis, u32); 3] {
        let mut ranked = Axis::ALL.map(|axis| (axis, self.get(axis)));
        ranked.sort_by(|(a_axis, a), (b_axis, b)| b.cmp(a).then(a_axis.cmp(b_axis)));
        ranked
    }
}

impl Add for ScoreVector {
    type Output = ScoreVector;

    fn add(self, rhs: ScoreVector) -> ScoreVector {
        ScoreVector {
            catholic: self.catholic + rhs.catholic,
            liberal: self.liberal + rhs.liberal,
            protestant: self.protestant + rhs.protestant,
        }
    }
}

// Saturates at zero; history replay never takes an axis below what was added.
impl Sub for ScoreVector {
    type Output = ScoreVector;

    fn sub(self, rhs: ScoreVector) -> ScoreVector {
        ScoreVector {
            catholic: self.catholic.saturating_sub(rhs.catholic),
            liberal: self.liberal.saturating_sub(rhs.liberal),
            protestant: self.protestant.saturating_sub(rhs.protestant),
        }
    }
}

impl std::iter::Sum for ScoreVector {
    fn sum<I: Iterator<Item = ScoreVector>>(iter: I) -> Self {
        iter.fold(ScoreVector::ZERO, |acc, v| acc + v)
    }
}
