//! Shared database error helpers (constraint categorization, etc.)

use sea_orm::{DbErr, SqlErr};

/// Unique-constraint check for errors surfaced through SeaORM.
pub fn is_seaorm_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    let msg = err.to_string().to_lowercase();
    msg.contains("unique constraint") || msg.contains("duplicate key")
}

/// True if `err` is a unique violation whose backend message names `column`.
///
/// SQLite reports `UNIQUE constraint failed: <table>.<column>`, Postgres
/// names the constraint (`<table>_<column>_key`); both carry the column.
pub fn is_unique_violation_on(err: &DbErr, column: &str) -> bool {
    is_seaorm_unique_violation(err)
        && err
            .to_string()
            .to_lowercase()
            .contains(&column.to_lowercase())
}

/// Foreign-key check for errors surfaced through SeaORM.
pub fn is_seaorm_foreign_key_violation(err: &DbErr) -> bool {
    if matches!(
        err.sql_err(),
        Some(SqlErr::ForeignKeyConstraintViolation(_))
    ) {
        return true;
    }
    err.to_string()
        .to_lowercase()
        .contains("foreign key constraint")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    fn exec_err(msg: &str) -> DbErr {
        DbErr::Exec(RuntimeErr::Internal(msg.to_string()))
    }

    #[test]
    fn plain_errors_are_not_constraint_violations() {
        let err = DbErr::RecordNotFound("user".into());
        assert!(!is_seaorm_unique_violation(&err));
        assert!(!is_seaorm_foreign_key_violation(&err));
        assert!(!is_unique_violation_on(&err, "email"));
    }

    #[test]
    fn unique_violation_names_its_column() {
        let sqlite = exec_err("UNIQUE constraint failed: user.email");
        assert!(is_unique_violation_on(&sqlite, "email"));
        assert!(!is_unique_violation_on(&sqlite, "username"));

        let pg = exec_err(
            "duplicate key value violates unique constraint \"user_username_key\"",
        );
        assert!(is_unique_violation_on(&pg, "username"));
        assert!(!is_unique_violation_on(&pg, "email"));
    }

    #[test]
    fn foreign_key_message_is_recognised() {
        let err = exec_err("FOREIGN KEY constraint failed");
        assert!(is_seaorm_foreign_key_violation(&err));
        assert!(!is_seaorm_unique_violation(&err));
    }
}
