//! Builds parameterized SELECT, INSERT, upsert and DELETE statements for one entity table.

use crate::sort::Sort;
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL (safe: only from entity definitions and validated settings).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// A table addressed by the builder. The first column is the primary key.
#[derive(Clone, Copy, Debug)]
pub struct TableRef<'a> {
    pub schema: &'a str,
    pub name: &'a str,
    pub columns: &'a [&'a str],
}

impl<'a> TableRef<'a> {
    fn qualified(&self) -> String {
        format!("{}.{}", quoted(self.schema), quoted(self.name))
    }

    fn pk(&self) -> &'a str {
        self.columns.first().copied().unwrap_or(crate::entity::ID_COLUMN)
    }

    fn column_list(&self) -> String {
        self.columns.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ")
    }

    /// Non-key columns present in `body`, in table order.
    fn data_columns<'b>(&self, body: &'b Map<String, Value>) -> Vec<(&'a str, &'b Value)> {
        self.columns
            .iter()
            .skip(1)
            .filter_map(|c| body.get(*c).map(|v| (*c, v)))
            .collect()
    }
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// SELECT every row, ordered by the given directives (columns already checked by the caller).
pub fn select_all(table: &TableRef<'_>, sort: &[Sort]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let order_clause = if sort.is_empty() {
        String::new()
    } else {
        let parts: Vec<String> = sort
            .iter()
            .map(|s| format!("{} {}", quoted(&s.property), s.direction.as_sql()))
            .collect();
        format!(" ORDER BY {}", parts.join(", "))
    };
    q.sql = format!("SELECT {} FROM {}{}", table.column_list(), table.qualified(), order_clause);
    q
}

/// SELECT by primary key.
pub fn select_by_id(table: &TableRef<'_>, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        table.column_list(),
        table.qualified(),
        quoted(table.pk()),
        n
    );
    q
}

pub fn exists_by_id(table: &TableRef<'_>, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ${})",
        table.qualified(),
        quoted(table.pk()),
        n
    );
    q
}

/// INSERT letting the database assign the key. Uses DEFAULT VALUES when the body carries no other column.
pub fn insert(table: &TableRef<'_>, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let data = table.data_columns(body);
    if data.is_empty() {
        q.sql = format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            table.qualified(),
            table.column_list()
        );
        return q;
    }
    let mut cols = Vec::with_capacity(data.len());
    let mut placeholders = Vec::with_capacity(data.len());
    for (c, v) in data {
        let n = q.push_param(v.clone());
        cols.push(quoted(c));
        placeholders.push(format!("${}", n));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table.qualified(),
        cols.join(", "),
        placeholders.join(", "),
        table.column_list()
    );
    q
}

/// INSERT with an explicit key, overwriting every other column on conflict.
pub fn upsert(table: &TableRef<'_>, id: i64, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pk = quoted(table.pk());
    let mut cols = vec![pk.clone()];
    let mut placeholders = vec![format!("${}", q.push_param(Value::from(id)))];
    let mut sets = Vec::new();
    for (c, v) in table.data_columns(body) {
        let n = q.push_param(v.clone());
        cols.push(quoted(c));
        placeholders.push(format!("${}", n));
        sets.push(format!("{} = EXCLUDED.{}", quoted(c), quoted(c)));
    }
    if sets.is_empty() {
        sets.push(format!("{} = EXCLUDED.{}", pk, pk));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO UPDATE SET {} RETURNING {}",
        table.qualified(),
        cols.join(", "),
        placeholders.join(", "),
        pk,
        sets.join(", "),
        table.column_list()
    );
    q
}

/// DELETE by id.
pub fn delete_by_id(table: &TableRef<'_>, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    q.sql = format!("DELETE FROM {} WHERE {} = ${}", table.qualified(), quoted(table.pk()), n);
    q
}

/// DDL for one entity table with a generated key.
pub fn create_table(schema: &str, table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {}.{} ({} BIGSERIAL PRIMARY KEY)",
        quoted(schema),
        quoted(table),
        quoted(crate::entity::ID_COLUMN)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID_ONLY: TableRef<'static> = TableRef {
        schema: "public",
        name: "a",
        columns: &["id"],
    };

    const WITH_NAME: TableRef<'static> = TableRef {
        schema: "app",
        name: "b",
        columns: &["id", "name"],
    };

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => Map::new(),
        }
    }

    #[test]
    fn select_all_orders_by_sort() {
        let q = select_all(&ID_ONLY, &[]);
        assert_eq!(q.sql, r#"SELECT "id" FROM "public"."a""#);
        let q = select_all(&ID_ONLY, &Sort::parse("id,desc").unwrap());
        assert_eq!(q.sql, r#"SELECT "id" FROM "public"."a" ORDER BY "id" DESC"#);
        assert!(q.params.is_empty());
    }

    #[test]
    fn insert_without_data_uses_defaults() {
        let q = insert(&ID_ONLY, &obj(json!({"id": null})));
        assert_eq!(q.sql, r#"INSERT INTO "public"."a" DEFAULT VALUES RETURNING "id""#);
        assert!(q.params.is_empty());
    }

    #[test]
    fn insert_binds_data_columns_only() {
        let q = insert(&WITH_NAME, &obj(json!({"id": 9, "name": "x", "other": 1})));
        assert_eq!(q.sql, r#"INSERT INTO "app"."b" ("name") VALUES ($1) RETURNING "id", "name""#);
        assert_eq!(q.params, vec![json!("x")]);
    }

    #[test]
    fn upsert_overwrites_on_conflict() {
        let q = upsert(&ID_ONLY, 3, &obj(json!({"id": 3})));
        assert_eq!(
            q.sql,
            r#"INSERT INTO "public"."a" ("id") VALUES ($1) ON CONFLICT ("id") DO UPDATE SET "id" = EXCLUDED."id" RETURNING "id""#
        );
        let q = upsert(&WITH_NAME, 3, &obj(json!({"id": 3, "name": "y"})));
        assert!(q.sql.contains(r#"DO UPDATE SET "name" = EXCLUDED."name""#));
        assert_eq!(q.params, vec![json!(3), json!("y")]);
    }

    #[test]
    fn key_statements_bind_id() {
        assert_eq!(select_by_id(&ID_ONLY, 5).params, vec![json!(5)]);
        assert_eq!(delete_by_id(&ID_ONLY, 5).sql, r#"DELETE FROM "public"."a" WHERE "id" = $1"#);
        assert!(exists_by_id(&ID_ONLY, 5).sql.starts_with("SELECT EXISTS"));
        assert_eq!(
            create_table("public", "d"),
            r#"CREATE TABLE IF NOT EXISTS "public"."d" ("id" BIGSERIAL PRIMARY KEY)"#
        );
    }
}
