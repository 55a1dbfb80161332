//! Field-equality filtering over stored records.

use crate::record::LogRecord;

/// Filter for querying records. Every set field must match exactly; an empty
/// filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Filter by action label.
    pub action: Option<String>,
    /// Filter by model name.
    pub model: Option<String>,
    /// Filter by actor id.
    pub actor_id: Option<String>,
}

impl RecordFilter {
    pub fn by_action(action: impl Into<String>) -> Self {
        Self {
            action: Some(action.into()),
            ..Default::default()
        }
    }

    pub fn by_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }

    pub fn by_actor(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        fn field_matches(expected: &Option<String>, actual: &str) -> bool {
            expected.as_deref().is_none_or(|e| e == actual)
        }

        field_matches(&self.action, record.action())
            && field_matches(&self.model, record.model())
            && field_matches(&self.actor_id, record.actor_id())
    }

    /// Keep the matching records, preserving their order.
    pub fn apply(&self, records: Vec<LogRecord>) -> Vec<LogRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::actions;

    fn sample() -> Vec<LogRecord> {
        vec![
            LogRecord::builder("dev_001", actions::METHOD_CALL, "UserModel", "a").build(),
            LogRecord::builder("dev_002", actions::DATABASE_TRANSACTION, "Order", "b").build(),
            LogRecord::builder("dev_001", actions::DATABASE_TRANSACTION, "UserModel", "c").build(),
            LogRecord::builder("dev_002", actions::MODEL_INTERACTION, "UserModel", "d").build(),
        ]
    }

    fn methods(records: &[LogRecord]) -> Vec<&str> {
        records.iter().map(LogRecord::method).collect()
    }

    #[test]
    fn test_filter_preserves_order() {
        let filtered = RecordFilter::by_action(actions::DATABASE_TRANSACTION).apply(sample());
        assert_eq!(methods(&filtered), vec!["b", "c"]);

        let filtered = RecordFilter::by_model("UserModel").apply(sample());
        assert_eq!(methods(&filtered), vec!["a", "c", "d"]);

        let filtered = RecordFilter::by_actor("dev_002").apply(sample());
        assert_eq!(methods(&filtered), vec!["b", "d"]);
    }

    #[test]
    fn test_combined_filter() {
        let filter = RecordFilter {
            action: Some(actions::DATABASE_TRANSACTION.to_string()),
            actor_id: Some("dev_001".to_string()),
            ..Default::default()
        };
        assert_eq!(methods(&filter.apply(sample())), vec!["c"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(RecordFilter::by_action("Deploy").apply(sample()).is_empty());
        assert_eq!(RecordFilter::default().apply(sample()).len(), 4);
    }
}
