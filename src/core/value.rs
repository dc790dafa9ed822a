use std::collections::BTreeMap;

/// Attribute name to value mapping. Ordered so that encoded documents are stable.
pub type ProfileMap = BTreeMap<String, Value>;

/// Attribute value. There is no null and no array variant: a null update
/// means "delete the key" and arrays are rejected at the decode boundary.
///
/// Floats compare exactly, so `NaN` is never equal to itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    /// Integers above `i64::MAX`, kept exact so they persist unchanged
    Unsigned(u64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Map(ProfileMap),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Unsigned(u) => i64::try_from(*u).ok(),
            Self::Float(f) => {
                if f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ProfileMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Self::Integer(i),
            Err(_) => Self::Unsigned(u),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<ProfileMap> for Value {
    fn from(m: ProfileMap) -> Self {
        Self::Map(m)
    }
}
