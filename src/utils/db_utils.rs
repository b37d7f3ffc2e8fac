use sqlx::{
    Sqlite, SqlitePool,
    query::QueryAs,
    sqlite::SqliteArguments,
};

use crate::{
    error::ApiError,
    model::{
        od_request::{OD_REQUEST_COLUMNS, OdRequest, OdRequestRow},
        user::{USER_COLUMNS, User, UserRow},
    },
};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone)]
pub enum SqlValue {
    Int(i64),
    Text(String),
}

/// ===============================
/// Dynamic WHERE clause
/// ===============================
#[derive(Debug)]
pub struct WhereClause {
    sql: String,
    values: Vec<SqlValue>,
}

impl Default for WhereClause {
    fn default() -> Self {
        Self {
            sql: String::from(" WHERE 1=1"),
            values: Vec::new(),
        }
    }
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// `condition` must hold exactly one `?` placeholder for `value`.
    pub fn and(&mut self, condition: &str, value: SqlValue) -> &mut Self {
        self.sql.push_str(" AND ");
        self.sql.push_str(condition);
        self.values.push(value);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn bind<'q, O>(
        &self,
        mut query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
        for value in &self.values {
            query = match value {
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
            };
        }
        query
    }
}

pub async fn fetch_user_row_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await
}

pub async fn fetch_user(pool: &SqlitePool, id: i64) -> Result<Option<User>, ApiError> {
    let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(User::try_from).transpose()?)
}

pub async fn fetch_od_request(pool: &SqlitePool, id: i64) -> Result<Option<OdRequest>, ApiError> {
    let row = sqlx::query_as::<_, OdRequestRow>(&format!(
        "SELECT {OD_REQUEST_COLUMNS} FROM od_requests WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(OdRequest::try_from).transpose()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_clause_accumulates_conditions() {
        let mut clause = WhereClause::new();
        clause
            .and("student_id = ?", SqlValue::Int(3))
            .and("status = ?", SqlValue::Text("pending".into()));
        assert_eq!(clause.sql(), " WHERE 1=1 AND student_id = ? AND status = ?");
        assert_eq!(clause.values.len(), 2);
    }
}
