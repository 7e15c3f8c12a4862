//! Component repository contract and SQLite backend adapter.
//!
//! # Responsibility
//! - Provide single-row insert/get/update/delete over the `components` table.
//! - Resolve caller tokens as either a Uid or an xname.
//! - Map engine outcomes (rows affected, constraint failures, driver errors)
//!   onto [`RepoError`].
//!
//! # Invariants
//! - Write paths validate the component before any SQL runs.
//! - Uid is produced by the table default and read back with `RETURNING`.
//! - Update and delete must touch exactly one row; zero is `NotFound`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::error::ErrorKind;
use crate::model::component::{
    parse_field, Arch, Component, ComponentId, ComponentValidationError, Flag, HardwareClass,
    NetType, Role, WireEnum,
};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{named_params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::fmt::Hyphenated;
use uuid::Uuid;

const TABLE: &str = "components";

pub type RepoResult<T> = Result<T, RepoError>;

/// A caller token after Uid/xname resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentRef {
    Uid(ComponentId),
    Xname(String),
}

impl ComponentRef {
    /// Resolves a token: a hyphenated UUID addresses the system key,
    /// everything else is taken as an xname.
    ///
    /// Only the hyphenated form counts as a Uid. Xnames never contain `-`,
    /// so a 32-character hex xname cannot be read as a simple-form UUID.
    pub fn resolve(token: &str) -> Self {
        if token.len() == Hyphenated::LENGTH {
            if let Ok(uid) = Uuid::try_parse(token) {
                return Self::Uid(uid);
            }
        }
        Self::Xname(token.to_string())
    }

    fn resolved_as(&self) -> &'static str {
        match self {
            Self::Uid(_) => "uid",
            Self::Xname(_) => "xname",
        }
    }
}

impl Display for ComponentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uid(uid) => write!(f, "uid {uid}"),
            Self::Xname(xname) => write!(f, "xname `{xname}`"),
        }
    }
}

impl From<ComponentId> for ComponentRef {
    fn from(value: ComponentId) -> Self {
        Self::Uid(value)
    }
}

/// Errors from component persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Component refused by the validator; no SQL was executed.
    Validation(ComponentValidationError),
    /// Another component already holds this xname.
    Conflict { xname: String },
    /// No row matches the identifier.
    NotFound(ComponentRef),
    /// A keyed write touched more than one row.
    UnexpectedRowCount {
        operation: &'static str,
        count: usize,
    },
    /// Persisted data cannot be converted to a valid component.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Column exists but is not covered by a single-column unique index.
    MissingUniqueConstraint {
        table: &'static str,
        column: &'static str,
    },
    /// Driver failure passed through unmodified.
    Db(DbError),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationFailure,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Db(err) => err.kind(),
            Self::UnexpectedRowCount { .. }
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::MissingUniqueConstraint { .. } => ErrorKind::Internal,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict { xname } => {
                write!(f, "a component with xname `{xname}` already exists")
            }
            Self::NotFound(reference) => write!(f, "component not found: {reference}"),
            Self::UnexpectedRowCount { operation, count } => {
                write!(f, "unexpected number of rows {operation}d: {count}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted component data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "component repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "component repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "component repository requires column `{column}` in table `{table}`"
            ),
            Self::MissingUniqueConstraint { table, column } => write!(
                f,
                "component repository requires a unique constraint on `{table}.{column}`"
            ),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ComponentValidationError> for RepoError {
    fn from(value: ComponentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for components. Each call touches at most one row.
pub trait ComponentRepository {
    /// Stores a new component and writes the assigned Uid back into it.
    ///
    /// Any Uid already on `component` is ignored.
    fn insert(&self, component: &mut Component) -> RepoResult<ComponentId>;

    /// Loads one component by Uid or xname token.
    fn get(&self, identifier: &str) -> RepoResult<Component>;

    /// Overwrites every mutable field of the row at `component.uid`.
    fn update(&self, component: &Component) -> RepoResult<()>;

    /// Permanently removes the row at `uid`.
    fn delete(&self, uid: ComponentId) -> RepoResult<()>;
}

impl<R: ComponentRepository + ?Sized> ComponentRepository for &R {
    fn insert(&self, component: &mut Component) -> RepoResult<ComponentId> {
        (**self).insert(component)
    }

    fn get(&self, identifier: &str) -> RepoResult<Component> {
        (**self).get(identifier)
    }

    fn update(&self, component: &Component) -> RepoResult<()> {
        (**self).update(component)
    }

    fn delete(&self, uid: ComponentId) -> RepoResult<()> {
        (**self).delete(uid)
    }
}

/// Binding of one component attribute to its column and named parameter.
#[derive(Debug, Clone, Copy)]
struct ColumnBinding {
    column: &'static str,
    param: &'static str,
}

const UID: ColumnBinding = ColumnBinding {
    column: "uid",
    param: ":uid",
};
const XNAME: ColumnBinding = ColumnBinding {
    column: "xname",
    param: ":xname",
};
const CLASS: ColumnBinding = ColumnBinding {
    column: HardwareClass::FIELD,
    param: ":class",
};
const ARCH: ColumnBinding = ColumnBinding {
    column: Arch::FIELD,
    param: ":arch",
};
const NET_TYPE: ColumnBinding = ColumnBinding {
    column: NetType::FIELD,
    param: ":net_type",
};
const ROLE: ColumnBinding = ColumnBinding {
    column: Role::FIELD,
    param: ":role",
};
const FLAG: ColumnBinding = ColumnBinding {
    column: Flag::FIELD,
    param: ":flag",
};

/// Columns written by insert and update, in statement order.
/// Must stay in step with `bind_mutable_fields`.
const MUTABLE_COLUMNS: [ColumnBinding; 6] = [XNAME, CLASS, ARCH, NET_TYPE, ROLE, FLAG];

static INSERT_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "INSERT INTO {TABLE} ({}) VALUES ({}) RETURNING {};",
        join_bindings(|binding| binding.column.to_string()),
        join_bindings(|binding| binding.param.to_string()),
        UID.column
    )
});

static UPDATE_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "UPDATE {TABLE} SET {} WHERE {} = {};",
        join_bindings(|binding| format!("{} = {}", binding.column, binding.param)),
        UID.column,
        UID.param
    )
});

static DELETE_SQL: Lazy<String> =
    Lazy::new(|| format!("DELETE FROM {TABLE} WHERE {} = {};", UID.column, UID.param));

static SELECT_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "SELECT {}, {} FROM {TABLE}",
        UID.column,
        join_bindings(|binding| binding.column.to_string())
    )
});

static SELECT_BY_UID_SQL: Lazy<String> =
    Lazy::new(|| format!("{} WHERE {} = :key;", *SELECT_SQL, UID.column));

static SELECT_BY_XNAME_SQL: Lazy<String> =
    Lazy::new(|| format!("{} WHERE {} = :key;", *SELECT_SQL, XNAME.column));

fn join_bindings(render: impl Fn(&ColumnBinding) -> String) -> String {
    MUTABLE_COLUMNS
        .iter()
        .map(render)
        .collect::<Vec<_>>()
        .join(", ")
}

fn bind_mutable_fields(component: &Component) -> [(&'static str, &dyn ToSql); 6] {
    [
        (XNAME.param, &component.xname as &dyn ToSql),
        (CLASS.param, &component.class as &dyn ToSql),
        (ARCH.param, &component.arch as &dyn ToSql),
        (NET_TYPE.param, &component.net_type as &dyn ToSql),
        (ROLE.param, &component.role as &dyn ToSql),
        (FLAG.param, &component.flag as &dyn ToSql),
    ]
}

macro_rules! wire_enum_to_sql {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }
        )+
    };
}

wire_enum_to_sql!(HardwareClass, Arch, NetType, Role, Flag);

/// SQLite-backed component repository.
pub struct SqliteComponentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteComponentRepository<'conn> {
    /// Wraps a connection after checking it carries the migrated schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ComponentRepository for SqliteComponentRepository<'_> {
    fn insert(&self, component: &mut Component) -> RepoResult<ComponentId> {
        component.validate()?;

        let uid_text: String = self
            .conn
            .query_row(
                INSERT_SQL.as_str(),
                &bind_mutable_fields(component)[..],
                |row| row.get(0),
            )
            .map_err(|err| map_write_error(err, &component.xname))?;
        let uid = parse_uid(&uid_text)?;
        component.uid = Some(uid);

        info!("event=component_insert module=repo status=ok uid={uid}");
        Ok(uid)
    }

    fn get(&self, identifier: &str) -> RepoResult<Component> {
        let reference = ComponentRef::resolve(identifier);
        debug!(
            "event=component_get module=repo status=start resolved_as={}",
            reference.resolved_as()
        );

        let (sql, key) = match &reference {
            ComponentRef::Uid(uid) => (SELECT_BY_UID_SQL.as_str(), uid.to_string()),
            ComponentRef::Xname(xname) => (SELECT_BY_XNAME_SQL.as_str(), xname.clone()),
        };

        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query(named_params! { ":key": key })?;
        match rows.next()? {
            Some(row) => parse_component_row(row),
            None => {
                debug!(
                    "event=component_get module=repo status=not_found resolved_as={}",
                    reference.resolved_as()
                );
                Err(RepoError::NotFound(reference))
            }
        }
    }

    fn update(&self, component: &Component) -> RepoResult<()> {
        let uid = component.validate_for_update()?;
        let uid_text = uid.to_string();

        let mut params = bind_mutable_fields(component).to_vec();
        params.push((UID.param, &uid_text as &dyn ToSql));

        let changed = self
            .conn
            .execute(UPDATE_SQL.as_str(), params.as_slice())
            .map_err(|err| map_write_error(err, &component.xname))?;
        expect_single_row("update", changed, uid)?;

        info!("event=component_update module=repo status=ok uid={uid}");
        Ok(())
    }

    fn delete(&self, uid: ComponentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(DELETE_SQL.as_str(), named_params! { ":uid": uid.to_string() })?;
        expect_single_row("delete", changed, uid)?;

        info!("event=component_delete module=repo status=ok uid={uid}");
        Ok(())
    }
}

fn expect_single_row(operation: &'static str, changed: usize, uid: ComponentId) -> RepoResult<()> {
    match changed {
        0 => {
            debug!("event=component_{operation} module=repo status=not_found uid={uid}");
            Err(RepoError::NotFound(uid.into()))
        }
        1 => Ok(()),
        count => {
            warn!(
                "event=component_{operation} module=repo status=error error_code=unexpected_row_count uid={uid} count={count}"
            );
            Err(RepoError::UnexpectedRowCount { operation, count })
        }
    }
}

fn map_write_error(err: rusqlite::Error, xname: &str) -> RepoError {
    if is_xname_unique_violation(&err) {
        debug!("event=component_write module=repo status=conflict");
        return RepoError::Conflict {
            xname: xname.to_string(),
        };
    }
    RepoError::from(err)
}

fn is_xname_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, message) => {
            failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && message
                    .as_deref()
                    .is_some_and(|text| text.contains(&format!("{TABLE}.{}", XNAME.column)))
        }
        _ => false,
    }
}

fn parse_component_row(row: &Row<'_>) -> RepoResult<Component> {
    let uid_text: String = row.get(UID.column)?;
    let uid = parse_uid(&uid_text)?;

    let component = Component {
        uid: Some(uid),
        xname: row.get(XNAME.column)?,
        class: read_enum(row, CLASS)?,
        arch: read_enum(row, ARCH)?,
        net_type: read_enum(row, NET_TYPE)?,
        role: read_enum(row, ROLE)?,
        flag: read_enum(row, FLAG)?,
    };
    component
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("{err} in {TABLE} row {uid}")))?;
    Ok(component)
}

fn read_enum<T: WireEnum>(row: &Row<'_>, binding: ColumnBinding) -> RepoResult<T> {
    let value: String = row.get(binding.column)?;
    parse_field(&value)
        .map_err(|err| RepoError::InvalidData(format!("{err} in {TABLE}.{}", binding.column)))
}

fn parse_uid(value: &str) -> RepoResult<ComponentId> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uid value `{value}` in {TABLE}.{}", UID.column))
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_present: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [TABLE],
        |row| row.get(0),
    )?;
    if !table_present {
        return Err(RepoError::MissingRequiredTable(TABLE));
    }

    for binding in std::iter::once(UID).chain(MUTABLE_COLUMNS) {
        let column_present: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2);",
            [TABLE, binding.column],
            |row| row.get(0),
        )?;
        if !column_present {
            return Err(RepoError::MissingRequiredColumn {
                table: TABLE,
                column: binding.column,
            });
        }
    }

    for binding in [UID, XNAME] {
        if !has_unique_index(conn, binding.column)? {
            return Err(RepoError::MissingUniqueConstraint {
                table: TABLE,
                column: binding.column,
            });
        }
    }

    Ok(())
}

/// True when some full (non-partial) unique index covers exactly `column`.
/// `PRIMARY KEY` and `UNIQUE` column constraints both show up here as
/// automatic indexes.
fn has_unique_index(conn: &Connection, column: &str) -> rusqlite::Result<bool> {
    let mut list_stmt = conn
        .prepare("SELECT name FROM pragma_index_list(?1) WHERE \"unique\" = 1 AND partial = 0;")?;
    let indexes = list_stmt
        .query_map([TABLE], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut info_stmt = conn.prepare("SELECT name FROM pragma_index_info(?1);")?;
    for index in indexes {
        let columns = info_stmt
            .query_map([&index], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if columns == [column] {
            return Ok(true);
        }
    }
    Ok(false)
}
