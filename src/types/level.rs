use std::{cmp::Ordering, fmt, hash::{Hash, Hasher}, sync::Arc};

/// A single value from a unit, category or group column.
///
/// Levels are totally ordered so that ordinal categories can be accumulated in order.
/// Within a kind the natural order applies (floats use IEEE total order); across kinds
/// the order is `Int < Float < Str`.
#[derive(Debug, Clone)]
pub enum Level {
    Int(i64),
    Float(f64),
    Str(Arc<str>), // keep the original text, avoid repeated owned Strings
}

impl Level {
    #[inline]
    fn kind_rank(&self) -> u8 {
        match self {
            Level::Int(_) => 0,
            Level::Float(_) => 1,
            Level::Str(_) => 2,
        }
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Level::Int(a), Level::Int(b)) => a.cmp(b),
            (Level::Float(a), Level::Float(b)) => a.total_cmp(b),
            (Level::Str(a), Level::Str(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
}

impl Eq for Level {}

impl Hash for Level {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self {
            Level::Int(v) => v.hash(state),
            Level::Float(v) => v.to_bits().hash(state),
            Level::Str(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Int(v) => write!(f, "{v}"),
            Level::Float(v) => write!(f, "{v}"),
            Level::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Level {
    fn from(value: i64) -> Self { Level::Int(value) }
}

impl From<i32> for Level {
    fn from(value: i32) -> Self { Level::Int(value as i64) }
}

impl From<u32> for Level {
    fn from(value: u32) -> Self { Level::Int(value as i64) }
}

impl From<f64> for Level {
    fn from(value: f64) -> Self { Level::Float(value) }
}

impl From<&str> for Level {
    fn from(value: &str) -> Self { Level::Str(Arc::from(value)) }
}

impl From<String> for Level {
    fn from(value: String) -> Self { Level::Str(Arc::from(value)) }
}
