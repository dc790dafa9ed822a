use crate::core::{ProfileMap, Value};

/// `{messageId: count}` of messages triggered
pub const MESSAGE_TRIGGERED: &str = "a.triggered";
/// `{messageId: count}` of messages viewed
pub const MESSAGE_VIEWED: &str = "a.viewed";
/// `{messageId: count}` of messages clicked
pub const MESSAGE_CLICKED: &str = "a.clicked";

pub const AGGREGATE_KEYS: [&str; 3] = [MESSAGE_TRIGGERED, MESSAGE_VIEWED, MESSAGE_CLICKED];

pub fn is_aggregate_key(key: &str) -> bool {
    AGGREGATE_KEYS.contains(&key)
}

/// Copy of `existing` with the count for `id` raised by one.
///
/// A missing or non-numeric count starts from zero.
pub(crate) fn increment(existing: Option<&ProfileMap>, id: &str) -> ProfileMap {
    let mut counts = existing.cloned().unwrap_or_default();
    let count = counts.get(id).and_then(Value::as_i64).unwrap_or(0);
    counts.insert(id.to_string(), Value::Integer(count.saturating_add(1)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_keys() {
        assert!(is_aggregate_key("a.triggered"));
        assert!(is_aggregate_key("a.viewed"));
        assert!(is_aggregate_key("a.clicked"));
        assert!(!is_aggregate_key("a.dismissed"));
    }

    #[test]
    fn test_increment_existing() {
        let mut counts = ProfileMap::new();
        counts.insert("msg123".into(), Value::Integer(2));
        counts.insert("other".into(), Value::Integer(5));

        let updated = increment(Some(&counts), "msg123");
        assert_eq!(updated.get("msg123"), Some(&Value::Integer(3)));
        assert_eq!(updated.get("other"), Some(&Value::Integer(5)));
    }

    #[test]
    fn test_increment_starts_at_one() {
        let updated = increment(None, "msg123");
        assert_eq!(updated.len(), 1);
        assert_eq!(updated.get("msg123"), Some(&Value::Integer(1)));

        let mut counts = ProfileMap::new();
        counts.insert("msg123".into(), Value::Text("junk".into()));
        assert_eq!(
            increment(Some(&counts), "msg123").get("msg123"),
            Some(&Value::Integer(1))
        );
    }
}
