//! Classify executed statements to decide where their feedback goes.

/// Broad category of an executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Create,
    Drop,
    Select,
    Other,
}

impl QueryKind {
    /// Whether the cached table list of the database is stale after this statement.
    pub fn refreshes_tables(self) -> bool {
        matches!(self, QueryKind::Create | QueryKind::Drop)
    }
}

/// Category plus the status line for the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: QueryKind,
    /// `None` for selects, whose feedback is the result grid.
    pub message: Option<String>,
}

/// Classify a statement by case-insensitive prefix after trimming.
pub fn classify(statement: &str, affected_rows: u64) -> Classification {
    let lowered = statement.trim().to_ascii_lowercase();

    let (kind, message) = if lowered.starts_with("create table if not exists") {
        (QueryKind::Create, Some("Succeed: 0 rows affected".to_string()))
    } else if lowered.starts_with("create table") {
        (
            QueryKind::Create,
            Some(format!("Table created: {} rows affected", affected_rows)),
        )
    } else if lowered.starts_with("drop table") {
        (
            QueryKind::Drop,
            Some(format!("Table deleted: {} rows affected", affected_rows)),
        )
    } else if lowered.starts_with("select") {
        (QueryKind::Select, None)
    } else {
        (
            QueryKind::Other,
            Some(format!("Succeed: {} rows affected", affected_rows)),
        )
    };

    Classification { kind, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn msg(c: &Classification) -> Option<&str> {
        c.message.as_deref()
    }

    #[test]
    fn test_create_if_not_exists_reports_zero() {
        let c = classify("CREATE TABLE IF NOT EXISTS t (x int)", 7);
        assert_eq!(c.kind, QueryKind::Create);
        assert_eq!(msg(&c), Some("Succeed: 0 rows affected"));
    }

    #[test]
    fn test_create_table() {
        let c = classify("create table t (x int)", 5);
        assert_eq!(c.kind, QueryKind::Create);
        assert_eq!(msg(&c), Some("Table created: 5 rows affected"));
    }

    #[test]
    fn test_drop_table() {
        let c = classify("DROP TABLE t", 1);
        assert_eq!(c.kind, QueryKind::Drop);
        assert_eq!(msg(&c), Some("Table deleted: 1 rows affected"));
    }

    #[test]
    fn test_select_has_no_message() {
        let c = classify("select * from t", 0);
        assert_eq!(c.kind, QueryKind::Select);
        assert_eq!(msg(&c), None);
    }

    #[test]
    fn test_other_statements() {
        let c = classify("insert into t values (1)", 1);
        assert_eq!(c.kind, QueryKind::Other);
        assert_eq!(msg(&c), Some("Succeed: 1 rows affected"));

        assert_eq!(classify("PRAGMA foreign_keys = ON", 0).kind, QueryKind::Other);
        assert_eq!(classify("create index i on t(x)", 0).kind, QueryKind::Other);
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(classify("\n\t  SeLeCt 1  ", 0).kind, QueryKind::Select);
    }

    #[test]
    fn test_leading_comment_is_not_skipped() {
        assert_eq!(classify("/* hi */ select 1", 0).kind, QueryKind::Other);
    }

    #[test]
    fn test_unrecognized_and_empty() {
        assert_eq!(classify("", 0).kind, QueryKind::Other);
        assert_eq!(classify("garbage!!", 3).kind, QueryKind::Other);
    }

    #[test]
    fn test_idempotent() {
        let a = classify("drop table t", 2);
        let b = classify("drop table t", 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_refreshes_tables() {
        assert!(QueryKind::Create.refreshes_tables());
        assert!(QueryKind::Drop.refreshes_tables());
        assert!(!QueryKind::Select.refreshes_tables());
        assert!(!QueryKind::Other.refreshes_tables());
    }
}
