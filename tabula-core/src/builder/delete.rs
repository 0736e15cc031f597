//! Delete terminal

use super::QueryBuilder;
use crate::executor::Driver;
use crate::instrument::Operation;
use crate::Result;

impl<D: Driver> QueryBuilder<D> {
    /// Delete every matching row and return the affected count
    pub async fn delete(&self) -> Result<u64> {
        self.ensure_statement()?;
        let compiled = self.connection.compiler().delete(&self.statements)?;
        let executed = self.connection.run_mutation(compiled, Operation::Delete).await?;
        Ok(executed.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::tests::connection;
    use crate::executor::Executed;
    use crate::instrument::Operation;
    use crate::mock::{Event, RecordingSink};
    use crate::Criteria;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_delete_with_criteria() {
        let sink = Arc::new(RecordingSink::default());
        let conn = connection("pgsql", None).with_instrumentation(sink.clone());
        conn.driver().push_executed(Executed {
            rows_affected: 4,
            last_insert_id: None,
        });

        let affected = conn
            .table("sessions")
            .where_(("expires_at", "<", "2024-01-01"))
            .or_where_null("user_id")
            .delete()
            .await
            .unwrap();
        assert_eq!(affected, 4);
        assert_eq!(
            conn.driver().sql(),
            vec![r#"DELETE FROM "sessions" WHERE "expires_at" < $1 OR "user_id" IS NULL"#.to_string()]
        );
        assert_eq!(
            sink.events(),
            vec![Event::Delete {
                sql: r#"DELETE FROM "sessions" WHERE "expires_at" < '2024-01-01' OR "user_id" IS NULL"#.into(),
                affected: 4
            }]
        );
    }

    #[tokio::test]
    async fn test_delete_failure_is_tagged() {
        let sink = Arc::new(RecordingSink::default());
        let conn = connection("sqlite", None).with_instrumentation(sink.clone());
        conn.driver().fail_next_execute("FOREIGN KEY constraint failed");

        assert!(conn.table("users").delete().await.is_err());
        assert!(matches!(
            &sink.exceptions()[0],
            Event::Exception { operation: Operation::Delete, .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_limit_is_dialect_checked() {
        let conn = connection("sqlite", None);
        let err = conn.table("users").limit(1).delete().await.unwrap_err();
        assert!(err.is_misuse());
        assert!(conn.driver().statements().is_empty());
    }
}
