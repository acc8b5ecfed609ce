use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A value bound as a positional parameter (`$n`). Bound values are the only
/// part of a query that may originate from request input.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    Int(i32),
    Real(f32),
    Timestamp(DateTime<Utc>),
    /// Text-typed NULL, used to clear nullable text columns
    Null,
}

impl From<Uuid> for BindValue {
    fn from(v: Uuid) -> Self { BindValue::Uuid(v) }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self { BindValue::Text(v) }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self { BindValue::Text(v.to_string()) }
}

impl From<bool> for BindValue {
    fn from(v: bool) -> Self { BindValue::Bool(v) }
}

impl From<i32> for BindValue {
    fn from(v: i32) -> Self { BindValue::Int(v) }
}

impl From<u16> for BindValue {
    fn from(v: u16) -> Self { BindValue::Int(i32::from(v)) }
}

impl From<f32> for BindValue {
    fn from(v: f32) -> Self { BindValue::Real(v) }
}

impl From<DateTime<Utc>> for BindValue {
    fn from(v: DateTime<Utc>) -> Self { BindValue::Timestamp(v) }
}

impl<T: Into<BindValue>> From<Option<T>> for BindValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(BindValue::Null)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// Normalizes any client-supplied direction: `desc` in any case is
    /// descending, everything else ascending.
    pub fn normalize(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// Conjunctive predicate with exactly one `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereEq {
    pub fragment: &'static str,
    pub value: BindValue,
}

/// Inclusion predicate; its single `?` expands to one placeholder per value.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereIn {
    pub fragment: &'static str,
    pub values: Vec<BindValue>,
}

/// Join clauses known to the store. Only used to make `WhereIn` predicates
/// against mapping tables possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    /// monsters -> mapping_monster_and_types (alias `map`)
    MonsterTypeMapping,
    /// monster_types -> mapping_monster_and_types (alias `map`)
    TypeMonsterMapping,
    /// permissions -> role_permissions (alias `rp`)
    PermissionRoleMapping,
}

impl Join {
    pub fn to_sql(&self) -> &'static str {
        match self {
            Join::MonsterTypeMapping => {
                "INNER JOIN mapping_monster_and_types map ON map.monster_id = monsters.id"
            }
            Join::TypeMonsterMapping => {
                "INNER JOIN mapping_monster_and_types map ON map.monster_type_id = monster_types.id"
            }
            Join::PermissionRoleMapping => {
                "INNER JOIN role_permissions rp ON rp.permission_id = permissions.id"
            }
        }
    }
}

/// Relations resolved and attached after the primary rows are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preload {
    Category,
    Types,
    Role,
    RolePermissions,
}

impl Preload {
    /// Restricted projection used when loading the relation
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Preload::Category | Preload::Types | Preload::Role => &["id", "name"],
            Preload::RolePermissions => &["id", "name", "action"],
        }
    }
}

/// Structured description of a read (or the filter part of a write).
/// Not executable on its own; a `Filter` renders it for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    pub select: Vec<&'static str>,
    pub distinct: bool,
    pub where_eq: Vec<WhereEq>,
    pub where_in: Vec<WhereIn>,
    pub joins: Vec<Join>,
    pub preload: Vec<Preload>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub include_deleted: bool,
}

impl QueryDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &[&'static str]) -> Self {
        self.select = columns.to_vec();
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn where_eq(mut self, fragment: &'static str, value: impl Into<BindValue>) -> Self {
        self.where_eq.push(WhereEq { fragment, value: value.into() });
        self
    }

    pub fn where_in<V: Into<BindValue>>(
        mut self,
        fragment: &'static str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.where_in.push(WhereIn {
            fragment,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        if !self.joins.contains(&join) {
            self.joins.push(join);
        }
        self
    }

    pub fn preload(mut self, relation: Preload) -> Self {
        if !self.preload.contains(&relation) {
            self.preload.push(relation);
        }
        self
    }

    pub fn order_by(mut self, column: &'static str, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy { column, direction });
        self
    }

    pub fn limit(mut self, limit: i64, offset: Option<i64>) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn preloads(&self, relation: Preload) -> bool {
        self.preload.contains(&relation)
    }
}

/// Sparse set of column assignments for INSERT and UPDATE statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    entries: Vec<(&'static str, BindValue)>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `column`, replacing an earlier assignment of the same column
    pub fn set(&mut self, column: &'static str, value: impl Into<BindValue>) -> &mut Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
        self
    }

    pub fn get(&self, column: &str) -> Option<&BindValue> {
        self.entries.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }

    pub fn entries(&self) -> &[(&'static str, BindValue)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<BindValue>,
}
