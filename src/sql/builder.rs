//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from typed column references.

use super::params::BindValue;

/// Quote identifier for PostgreSQL (safe: identifiers only come from model definitions).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// A column of a record kind. `sql_type` names a custom type (e.g. an enum):
/// such columns are selected as `::text` and their parameters are cast back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Column {
    pub table: &'static str,
    pub name: &'static str,
    pub sql_type: Option<&'static str>,
}

impl Column {
    pub const fn new(table: &'static str, name: &'static str) -> Self {
        Column {
            table,
            name,
            sql_type: None,
        }
    }

    pub const fn typed(table: &'static str, name: &'static str, sql_type: &'static str) -> Self {
        Column {
            table,
            name,
            sql_type: Some(sql_type),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", quoted(self.table), quoted(self.name))
    }

    /// Expression used in SELECT / RETURNING lists.
    fn select_expr(&self) -> String {
        match self.sql_type {
            Some(_) => format!("{}::text AS {}", self.qualified(), quoted(self.name)),
            None => self.qualified(),
        }
    }

    fn compare(self, op: CompareOp, value: impl Into<BindValue>) -> Condition {
        Condition::Compare {
            column: self,
            op,
            value: value.into(),
        }
    }

    pub fn eq(self, value: impl Into<BindValue>) -> Condition {
        self.compare(CompareOp::Eq, value)
    }

    pub fn ne(self, value: impl Into<BindValue>) -> Condition {
        self.compare(CompareOp::Ne, value)
    }

    pub fn gt(self, value: impl Into<BindValue>) -> Condition {
        self.compare(CompareOp::Gt, value)
    }

    pub fn ge(self, value: impl Into<BindValue>) -> Condition {
        self.compare(CompareOp::Ge, value)
    }

    pub fn lt(self, value: impl Into<BindValue>) -> Condition {
        self.compare(CompareOp::Lt, value)
    }

    pub fn le(self, value: impl Into<BindValue>) -> Condition {
        self.compare(CompareOp::Le, value)
    }

    pub fn is_in<I, V>(self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<BindValue>,
    {
        Condition::In {
            column: self,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(self) -> Condition {
        Condition::IsNull(self)
    }

    pub fn asc(self) -> OrderBy {
        OrderBy {
            column: self,
            descending: false,
        }
    }

    pub fn desc(self) -> OrderBy {
        OrderBy {
            column: self,
            descending: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

/// A WHERE predicate. Values are always bound as parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Compare {
        column: Column,
        op: CompareOp,
        value: BindValue,
    },
    In {
        column: Column,
        values: Vec<BindValue>,
    },
    IsNull(Column),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::And(mut parts) => {
                parts.push(other);
                Condition::And(parts)
            }
            first => Condition::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Condition) -> Condition {
        match self {
            Condition::Or(mut parts) => {
                parts.push(other);
                Condition::Or(parts)
            }
            first => Condition::Or(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }

    fn render(&self, q: &mut QueryBuf) -> String {
        match self {
            Condition::Compare { column, op, value } => {
                let ph = q.push_param(value.clone(), column.sql_type);
                format!("{} {} {}", column.qualified(), op.as_sql(), ph)
            }
            Condition::In { column, values } => {
                if values.is_empty() {
                    return "FALSE".into();
                }
                let placeholders: Vec<String> =
                    values.iter().map(|v| q.push_param(v.clone(), column.sql_type)).collect();
                format!("{} IN ({})", column.qualified(), placeholders.join(", "))
            }
            Condition::IsNull(column) => format!("{} IS NULL", column.qualified()),
            Condition::And(parts) => join_parts(parts, " AND ", "TRUE", q),
            Condition::Or(parts) => join_parts(parts, " OR ", "FALSE", q),
            Condition::Not(inner) => format!("NOT ({})", inner.render(q)),
        }
    }
}

fn join_parts(parts: &[Condition], sep: &str, empty: &str, q: &mut QueryBuf) -> String {
    if parts.is_empty() {
        return empty.into();
    }
    let rendered: Vec<String> = parts.iter().map(|c| format!("({})", c.render(q))).collect();
    rendered.join(sep)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// Join onto `right.table` where `left = right`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub left: Column,
    pub right: Column,
}

impl Join {
    pub fn inner(left: Column, right: Column) -> Self {
        Join {
            kind: JoinKind::Inner,
            left,
            right,
        }
    }

    pub fn left(left: Column, right: Column) -> Self {
        Join {
            kind: JoinKind::Left,
            left,
            right,
        }
    }

    fn render(&self) -> String {
        let kw = match self.kind {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
        };
        format!(
            " {} {} ON {} = {}",
            kw,
            quoted(self.right.table),
            self.left.qualified(),
            self.right.qualified()
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub descending: bool,
}

impl OrderBy {
    fn render(&self) -> String {
        format!(
            "{} {}",
            self.column.qualified(),
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

/// Ordered column assignments for INSERT and UPDATE.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Values {
    entries: Vec<(Column, BindValue)>,
}

impl Values {
    pub fn new() -> Self {
        Values::default()
    }

    /// Assign `column`, replacing an earlier assignment to the same column.
    pub fn set(mut self, column: Column, value: impl Into<BindValue>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| c.name == column.name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
        self
    }

    /// Assign only when `value` is present (partial updates).
    pub fn set_if<V: Into<BindValue>>(self, column: Column, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, column: Column) -> Option<&BindValue> {
        self.entries.iter().find(|(c, _)| c.name == column.name).map(|(_, v)| v)
    }
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a parameter and return its placeholder, cast when the column has a custom type.
    fn push_param(&mut self, v: BindValue, sql_type: Option<&str>) -> String {
        self.params.push(v);
        let n = self.params.len();
        match sql_type {
            Some(t) => format!("${}::{}", n, t),
            None => format!("${}", n),
        }
    }
}

fn select_column_list(columns: &[Column]) -> String {
    columns.iter().map(Column::select_expr).collect::<Vec<_>>().join(", ")
}

fn where_clause(conditions: &[Option<Condition>], q: &mut QueryBuf) -> String {
    let parts: Vec<String> = conditions
        .iter()
        .flatten()
        .map(|c| c.render(q))
        .collect();
    match parts.len() {
        0 => String::new(),
        1 => format!(" WHERE {}", parts[0]),
        _ => format!(
            " WHERE {}",
            parts.iter().map(|p| format!("({})", p)).collect::<Vec<_>>().join(" AND ")
        ),
    }
}

/// Everything a SELECT over one record kind can carry.
pub struct Select<'a> {
    pub table: &'static str,
    pub columns: &'a [Column],
    pub conditions: &'a [Option<Condition>],
    pub joins: &'a [Join],
    pub order_by: &'a [OrderBy],
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Lock the selected rows of `table` until the transaction ends.
    pub for_update: bool,
}

impl<'a> Select<'a> {
    pub fn new(table: &'static str, columns: &'a [Column]) -> Self {
        Select {
            table,
            columns,
            conditions: &[],
            joins: &[],
            order_by: &[],
            limit: None,
            offset: None,
            for_update: false,
        }
    }
}

/// SELECT columns FROM table [JOIN ...] [WHERE ...] [ORDER BY ...] [LIMIT n] [OFFSET n] [FOR UPDATE OF table].
/// `None` conditions are skipped; the rest are ANDed. Zero limit or offset is treated as absent.
pub fn select(s: &Select<'_>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let joins: String = s.joins.iter().map(Join::render).collect();
    let where_sql = where_clause(s.conditions, &mut q);
    let order_sql = if s.order_by.is_empty() {
        String::new()
    } else {
        format!(
            " ORDER BY {}",
            s.order_by.iter().map(OrderBy::render).collect::<Vec<_>>().join(", ")
        )
    };
    let limit_sql = s.limit.filter(|n| *n > 0).map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_sql = s.offset.filter(|n| *n > 0).map(|n| format!(" OFFSET {}", n)).unwrap_or_default();
    let lock_sql = if s.for_update {
        format!(" FOR UPDATE OF {}", quoted(s.table))
    } else {
        String::new()
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{}{}{}{}{}",
        select_column_list(s.columns),
        quoted(s.table),
        joins,
        where_sql,
        order_sql,
        limit_sql,
        offset_sql,
        lock_sql
    );
    q
}

/// INSERT one row and return every column of it, server defaults included.
pub fn insert(table: &'static str, columns: &[Column], values: &Values) -> QueryBuf {
    let mut q = QueryBuf::new();
    let returning = select_column_list(columns);
    if values.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", quoted(table), returning);
        return q;
    }
    let mut cols = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (column, value) in &values.entries {
        cols.push(quoted(column.name));
        placeholders.push(q.push_param(value.clone(), column.sql_type));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(table),
        cols.join(", "),
        placeholders.join(", "),
        returning
    );
    q
}

/// UPDATE rows matching `condition` and return them. With nothing to set,
/// falls back to selecting the matching rows unchanged.
pub fn update(table: &'static str, columns: &[Column], condition: &Condition, values: &Values) -> QueryBuf {
    if values.is_empty() {
        return select(&Select {
            conditions: &[Some(condition.clone())],
            ..Select::new(table, columns)
        });
    }
    let mut q = QueryBuf::new();
    let sets: Vec<String> = values
        .entries
        .iter()
        .map(|(column, value)| {
            let ph = q.push_param(value.clone(), column.sql_type);
            format!("{} = {}", quoted(column.name), ph)
        })
        .collect();
    let where_sql = where_clause(&[Some(condition.clone())], &mut q);
    q.sql = format!(
        "UPDATE {} SET {}{} RETURNING {}",
        quoted(table),
        sets.join(", "),
        where_sql,
        select_column_list(columns)
    );
    q
}

/// DELETE rows matching `condition`.
pub fn delete(table: &'static str, condition: &Condition) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&[Some(condition.clone())], &mut q);
    q.sql = format!("DELETE FROM {}{}", quoted(table), where_sql);
    q
}
