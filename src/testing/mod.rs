//! In-memory stand-ins for the stores, the transaction coordinator and the
//! image storage, with switches to inject faults into a workflow.
//!
//! A scope works on a private copy of the tables; commit swaps the copy in.
//! Reads always see committed state, like the pooled Postgres reads do.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::Claims;
use crate::config::ImageConfig;
use crate::database::models::{Monster, MonsterCategory, MonsterType, MonsterTypeMapping, Permission, Role, User};
use crate::database::{
    ConstraintKind, DatabaseError, EntityStore, HealthProbe, MonsterStore, TransactionCoordinator, TxScope,
};
use crate::filter::{BindValue, Changeset, Preload, QueryDescriptor, SortDirection};
use crate::handlers::AppState;
use crate::services::{AuthService, CatalogService, MonsterReadService, MonsterWriteService};
use crate::storage::{extension_of, ImageStorage, StorageError};

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub monsters: Vec<Monster>,
    pub categories: Vec<MonsterCategory>,
    pub types: Vec<MonsterType>,
    pub mappings: Vec<MonsterTypeMapping>,
    pub users: Vec<User>,
}

impl Tables {
    pub fn live_monsters(&self) -> Vec<&Monster> {
        self.monsters.iter().filter(|m| m.deleted_at.is_none()).collect()
    }

    pub fn mapped_types(&self, monster_id: Uuid) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .mappings
            .iter()
            .filter(|m| m.monster_id == monster_id)
            .map(|m| m.monster_type_id)
            .collect();
        ids.sort();
        ids
    }
}

#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
    fail_begin: AtomicBool,
    fail_commit: AtomicBool,
    fail_reads: AtomicBool,
    panic_on_mappings: AtomicBool,
    stall_mappings: AtomicBool,
    slow_commit: AtomicBool,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl MemoryDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_category(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().categories.push(MonsterCategory {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn seed_type(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.lock().unwrap().types.push(MonsterType {
            id,
            name: name.to_string(),
        });
        id
    }

    /// A user whose role grants `permissions`.
    pub fn seed_user(&self, email: &str, password: &str, permissions: &[&str]) -> Uuid {
        let role = Role {
            id: Uuid::new_v4(),
            name: "trainer".to_string(),
            permissions: permissions
                .iter()
                .map(|name| Permission {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    action: "ANY".to_string(),
                    role_id: Uuid::nil(),
                })
                .collect(),
        };
        let user = User {
            id: Uuid::new_v4(),
            name: email.to_string(),
            email: email.to_string(),
            encrypted_password: bcrypt::hash(password, 4).unwrap(),
            role_id: role.id,
            role: Some(role),
            ..Default::default()
        };
        let id = user.id;
        self.tables.lock().unwrap().users.push(user);
        id
    }

    pub fn snapshot(&self) -> Tables {
        self.tables.lock().unwrap().clone()
    }

    pub fn fail_begin(&self) {
        self.fail_begin.store(true, Ordering::SeqCst);
    }

    /// The next commit reports failure and discards its changes.
    pub fn fail_next_commit(&self) {
        self.fail_commit.store(true, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Writing mapping rows panics, simulating an unexpected fault mid-workflow.
    pub fn panic_on_mappings(&self) {
        self.panic_on_mappings.store(true, Ordering::SeqCst);
    }

    /// Writing mapping rows hangs long enough to hit any workflow deadline.
    pub fn stall_mappings(&self) {
        self.stall_mappings.store(true, Ordering::SeqCst);
    }

    /// Commits apply their changes, then take a while to report back.
    pub fn slow_commit(&self) {
        self.slow_commit.store(true, Ordering::SeqCst);
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    fn check_reads(&self) -> Result<(), DatabaseError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DatabaseError::Timeout("injected read failure".into()));
        }
        Ok(())
    }
}

pub struct MemoryScope {
    db: Arc<MemoryDb>,
    working: Tables,
}

#[async_trait]
impl TxScope for MemoryScope {
    async fn commit(self) -> Result<(), DatabaseError> {
        if self.db.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(DatabaseError::Connection("injected commit failure".into()));
        }
        *self.db.tables.lock().unwrap() = self.working;
        self.db.commits.fetch_add(1, Ordering::SeqCst);
        if self.db.slow_commit.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        Ok(())
    }

    async fn rollback(self) {
        self.db.rollbacks.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct MemoryCoordinator {
    db: Arc<MemoryDb>,
}

impl MemoryCoordinator {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransactionCoordinator for MemoryCoordinator {
    type Scope = MemoryScope;

    async fn begin(&self) -> Result<MemoryScope, DatabaseError> {
        if self.db.fail_begin.load(Ordering::SeqCst) {
            return Err(DatabaseError::Connection("injected begin failure".into()));
        }
        Ok(MemoryScope {
            db: self.db.clone(),
            working: self.db.snapshot(),
        })
    }
}

fn foreign_key(constraint: &str) -> DatabaseError {
    DatabaseError::Constraint {
        kind: ConstraintKind::ForeignKey,
        constraint: Some(constraint.to_string()),
        message: format!("violates foreign key constraint \"{}\"", constraint),
    }
}

fn unique_violation(constraint: &str) -> DatabaseError {
    DatabaseError::Constraint {
        kind: ConstraintKind::Unique,
        constraint: Some(constraint.to_string()),
        message: format!("duplicate key value violates unique constraint \"{}\"", constraint),
    }
}

fn read_only() -> DatabaseError {
    DatabaseError::QueryError("read-only test store".into())
}

/// `ILIKE` with `\` escapes, `%` and `_`.
fn ilike(value: &str, pattern: &str) -> bool {
    #[derive(Clone, Copy)]
    enum Tok {
        Lit(char),
        One,
        Any,
    }
    let mut toks = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => toks.push(Tok::Lit(chars.next().unwrap_or('\\'))),
            '%' => toks.push(Tok::Any),
            '_' => toks.push(Tok::One),
            c => toks.push(Tok::Lit(c)),
        }
    }
    let value: Vec<char> = value.to_lowercase().chars().collect();

    fn go(v: &[char], t: &[Tok]) -> bool {
        match t.split_first() {
            None => v.is_empty(),
            Some((Tok::Any, rest)) => (0..=v.len()).any(|i| go(&v[i..], rest)),
            Some((Tok::One, rest)) => !v.is_empty() && go(&v[1..], rest),
            Some((Tok::Lit(c), rest)) => {
                !v.is_empty() && c.to_lowercase().eq(v[0].to_lowercase()) && go(&v[1..], rest)
            }
        }
    }
    go(&value, &toks)
}

fn monster_matches(m: &Monster, q: &QueryDescriptor, t: &Tables) -> bool {
    if !q.include_deleted && m.deleted_at.is_some() {
        return false;
    }
    let eq_ok = q.where_eq.iter().all(|w| match (w.fragment, &w.value) {
        (Monster::ID_EQ, BindValue::Uuid(id)) => m.id == *id,
        (Monster::NAME_ILIKE, BindValue::Text(p)) => ilike(&m.name, p),
        (Monster::IS_CAUGHT_EQ, BindValue::Bool(b)) => m.is_caught == *b,
        (fragment, value) => panic!("unsupported predicate {} = {:?}", fragment, value),
    });
    let in_ok = q.where_in.iter().all(|w| match w.fragment {
        Monster::TYPE_ID_IN => t.mappings.iter().any(|map| {
            map.monster_id == m.id && w.values.contains(&BindValue::Uuid(map.monster_type_id))
        }),
        fragment => panic!("unsupported predicate {}", fragment),
    });
    eq_ok && in_ok
}

fn apply(m: &mut Monster, changes: &Changeset) {
    for (column, value) in changes.entries() {
        match (*column, value) {
            ("monster_code", BindValue::Int(v)) => m.monster_code = *v,
            ("name", BindValue::Text(v)) => m.name = v.clone(),
            ("monster_category_id", BindValue::Uuid(v)) => m.monster_category_id = *v,
            ("description", BindValue::Text(v)) => m.description = v.clone(),
            ("length", BindValue::Real(v)) => m.length = *v,
            ("weight", BindValue::Int(v)) => m.weight = *v,
            ("hp", BindValue::Int(v)) => m.hp = *v,
            ("attack", BindValue::Int(v)) => m.attack = *v,
            ("defends", BindValue::Int(v)) => m.defends = *v,
            ("speed", BindValue::Int(v)) => m.speed = *v,
            ("is_caught", BindValue::Bool(v)) => m.is_caught = *v,
            ("image_name", BindValue::Text(v)) => m.image_name = Some(v.clone()),
            ("image_name", BindValue::Null) => m.image_name = None,
            (column, value) => panic!("unsupported assignment {} = {:?}", column, value),
        }
    }
}

/// Monster store over a `MemoryDb`.
#[derive(Clone)]
pub struct MemoryMonsterStore {
    db: Arc<MemoryDb>,
}

impl MemoryMonsterStore {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }

    fn write<R>(&self, scope: Option<&mut MemoryScope>, f: impl FnOnce(&mut Tables) -> R) -> R {
        match scope {
            Some(scope) => f(&mut scope.working),
            None => f(&mut self.db.tables.lock().unwrap()),
        }
    }

    fn select(&self, q: &QueryDescriptor) -> Result<Vec<Monster>, DatabaseError> {
        self.db.check_reads()?;
        let t = self.db.snapshot();
        let mut rows: Vec<Monster> = t.monsters.iter().filter(|m| monster_matches(m, q, &t)).cloned().collect();

        if let Some(order) = &q.order_by {
            rows.sort_by(|a, b| {
                let ord = match order.column {
                    "name" => a.name.cmp(&b.name),
                    "monster_code" => a.monster_code.cmp(&b.monster_code),
                    "created_at" => a.created_at.cmp(&b.created_at),
                    "updated_at" => a.updated_at.cmp(&b.updated_at),
                    other => panic!("unsupported sort column {}", other),
                };
                match order.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        let offset = q.offset.unwrap_or(0).max(0) as usize;
        let limit = q.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        let mut rows: Vec<Monster> = rows.into_iter().skip(offset).take(limit).collect();

        for m in rows.iter_mut() {
            if q.preloads(Preload::Category) {
                m.monster_category = t.categories.iter().find(|c| c.id == m.monster_category_id).cloned();
            }
            if q.preloads(Preload::Types) {
                let mut types: Vec<MonsterType> = t
                    .types
                    .iter()
                    .filter(|ty| t.mappings.iter().any(|map| map.monster_id == m.id && map.monster_type_id == ty.id))
                    .cloned()
                    .collect();
                types.sort_by(|a, b| a.name.cmp(&b.name));
                m.monster_types = types;
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl EntityStore<Monster> for MemoryMonsterStore {
    type Scope = MemoryScope;

    async fn find(&self, id: Uuid, query: &QueryDescriptor) -> Result<Monster, DatabaseError> {
        let query = query.clone().where_eq(Monster::ID_EQ, id);
        self.select(&query)?
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::NotFound(format!("monsters {}", id)))
    }

    async fn first(&self, query: &QueryDescriptor) -> Result<Option<Monster>, DatabaseError> {
        Ok(self.select(&query.clone().limit(1, None))?.into_iter().next())
    }

    async fn list(&self, query: &QueryDescriptor) -> Result<Vec<Monster>, DatabaseError> {
        self.select(query)
    }

    async fn count(&self, query: &QueryDescriptor) -> Result<i64, DatabaseError> {
        let mut query = query.clone();
        query.limit = None;
        query.offset = None;
        Ok(self.select(&query)?.len() as i64)
    }

    async fn create(&self, row: &Changeset, scope: Option<&mut MemoryScope>) -> Result<Uuid, DatabaseError> {
        self.write(scope, |t| {
            let mut m = Monster {
                id: Uuid::new_v4(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
                ..Default::default()
            };
            apply(&mut m, row);
            if !t.categories.iter().any(|c| c.id == m.monster_category_id) {
                return Err(foreign_key("monsters_monster_category_id_fkey"));
            }
            if t.monsters.iter().any(|o| o.monster_code == m.monster_code) {
                return Err(unique_violation("monsters_monster_code_key"));
            }
            let id = m.id;
            t.monsters.push(m);
            Ok(id)
        })
    }

    async fn update(
        &self,
        filter: &QueryDescriptor,
        changes: &Changeset,
        scope: Option<&mut MemoryScope>,
    ) -> Result<u64, DatabaseError> {
        if changes.is_empty() {
            return Ok(0);
        }
        self.write(scope, |t| {
            if let Some(BindValue::Uuid(category)) = changes.get("monster_category_id") {
                if !t.categories.iter().any(|c| c.id == *category) {
                    return Err(foreign_key("monsters_monster_category_id_fkey"));
                }
            }
            let ids: Vec<Uuid> = t
                .monsters
                .iter()
                .filter(|m| monster_matches(m, filter, t))
                .map(|m| m.id)
                .collect();
            for m in t.monsters.iter_mut().filter(|m| ids.contains(&m.id)) {
                apply(m, changes);
                m.updated_at = Utc::now();
            }
            Ok(ids.len() as u64)
        })
    }

    async fn soft_delete(&self, filter: &QueryDescriptor, scope: Option<&mut MemoryScope>) -> Result<u64, DatabaseError> {
        self.write(scope, |t| {
            let ids: Vec<Uuid> = t
                .monsters
                .iter()
                .filter(|m| monster_matches(m, filter, t))
                .map(|m| m.id)
                .collect();
            for m in t.monsters.iter_mut().filter(|m| ids.contains(&m.id)) {
                m.deleted_at = Some(Utc::now());
            }
            Ok(ids.len() as u64)
        })
    }
}

#[async_trait]
impl MonsterStore for MemoryMonsterStore {
    async fn last_assigned_code(&self, scope: Option<&mut MemoryScope>) -> Result<u16, DatabaseError> {
        let max = self.write(scope, |t| t.monsters.iter().map(|m| m.monster_code).max().unwrap_or(0));
        u16::try_from(max).map_err(|e| DatabaseError::QueryError(e.to_string()))
    }

    async fn create_mappings(
        &self,
        mappings: &[MonsterTypeMapping],
        scope: Option<&mut MemoryScope>,
    ) -> Result<(), DatabaseError> {
        if self.db.panic_on_mappings.load(Ordering::SeqCst) {
            panic!("injected fault while writing mappings");
        }
        if self.db.stall_mappings.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.write(scope, |t| {
            for mapping in mappings {
                if !t.monsters.iter().any(|m| m.id == mapping.monster_id) {
                    return Err(foreign_key("mapping_monster_and_types_monster_id_fkey"));
                }
                if !t.types.iter().any(|ty| ty.id == mapping.monster_type_id) {
                    return Err(foreign_key("mapping_monster_and_types_monster_type_id_fkey"));
                }
                if t.mappings.contains(mapping) {
                    return Err(unique_violation("mapping_monster_and_types_pkey"));
                }
                t.mappings.push(*mapping);
            }
            Ok(())
        })
    }

    async fn delete_mappings(&self, monster_id: Uuid, scope: Option<&mut MemoryScope>) -> Result<u64, DatabaseError> {
        self.write(scope, |t| {
            let before = t.mappings.len();
            t.mappings.retain(|m| m.monster_id != monster_id);
            Ok((before - t.mappings.len()) as u64)
        })
    }
}

/// Read-only store for categories and types.
#[derive(Clone)]
pub struct MemoryCatalogStore {
    db: Arc<MemoryDb>,
}

impl MemoryCatalogStore {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }
}

macro_rules! read_only_catalog {
    ($ty:ty, $field:ident) => {
        #[async_trait]
        impl EntityStore<$ty> for MemoryCatalogStore {
            type Scope = MemoryScope;

            async fn find(&self, id: Uuid, _query: &QueryDescriptor) -> Result<$ty, DatabaseError> {
                self.db.check_reads()?;
                self.db
                    .snapshot()
                    .$field
                    .into_iter()
                    .find(|row| row.id == id)
                    .ok_or_else(|| DatabaseError::NotFound(id.to_string()))
            }

            async fn first(&self, query: &QueryDescriptor) -> Result<Option<$ty>, DatabaseError> {
                Ok(<Self as EntityStore<$ty>>::list(self, query).await?.into_iter().next())
            }

            async fn list(&self, _query: &QueryDescriptor) -> Result<Vec<$ty>, DatabaseError> {
                self.db.check_reads()?;
                let mut rows = self.db.snapshot().$field;
                rows.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(rows)
            }

            async fn count(&self, query: &QueryDescriptor) -> Result<i64, DatabaseError> {
                Ok(<Self as EntityStore<$ty>>::list(self, query).await?.len() as i64)
            }

            async fn create(&self, _row: &Changeset, _scope: Option<&mut MemoryScope>) -> Result<Uuid, DatabaseError> {
                Err(read_only())
            }

            async fn update(
                &self,
                _filter: &QueryDescriptor,
                _changes: &Changeset,
                _scope: Option<&mut MemoryScope>,
            ) -> Result<u64, DatabaseError> {
                Err(read_only())
            }

            async fn soft_delete(
                &self,
                _filter: &QueryDescriptor,
                _scope: Option<&mut MemoryScope>,
            ) -> Result<u64, DatabaseError> {
                Err(read_only())
            }
        }
    };
}

read_only_catalog!(MonsterCategory, categories);
read_only_catalog!(MonsterType, types);

/// User lookups by email for the login workflow.
#[derive(Clone)]
pub struct MemoryUserStore {
    db: Arc<MemoryDb>,
}

impl MemoryUserStore {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntityStore<User> for MemoryUserStore {
    type Scope = MemoryScope;

    async fn find(&self, id: Uuid, query: &QueryDescriptor) -> Result<User, DatabaseError> {
        let query = query.clone().where_eq(User::ID_EQ, id);
        self.first(&query)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("users {}", id)))
    }

    async fn first(&self, query: &QueryDescriptor) -> Result<Option<User>, DatabaseError> {
        Ok(self.list(query).await?.into_iter().next())
    }

    async fn list(&self, query: &QueryDescriptor) -> Result<Vec<User>, DatabaseError> {
        self.db.check_reads()?;
        let users = self.db.snapshot().users;
        Ok(users
            .into_iter()
            .filter(|u| {
                query.where_eq.iter().all(|w| match (w.fragment, &w.value) {
                    (User::EMAIL_EQ, BindValue::Text(email)) => u.email == *email,
                    (User::ID_EQ, BindValue::Uuid(id)) => u.id == *id,
                    (fragment, value) => panic!("unsupported predicate {} = {:?}", fragment, value),
                })
            })
            .map(|mut u| {
                if !query.preloads(Preload::Role) {
                    u.role = None;
                } else if !query.preloads(Preload::RolePermissions) {
                    if let Some(role) = u.role.as_mut() {
                        role.permissions.clear();
                    }
                }
                u
            })
            .collect())
    }

    async fn count(&self, query: &QueryDescriptor) -> Result<i64, DatabaseError> {
        Ok(self.list(query).await?.len() as i64)
    }

    async fn create(&self, _row: &Changeset, _scope: Option<&mut MemoryScope>) -> Result<Uuid, DatabaseError> {
        Err(read_only())
    }

    async fn update(
        &self,
        _filter: &QueryDescriptor,
        _changes: &Changeset,
        _scope: Option<&mut MemoryScope>,
    ) -> Result<u64, DatabaseError> {
        Err(read_only())
    }

    async fn soft_delete(&self, _filter: &QueryDescriptor, _scope: Option<&mut MemoryScope>) -> Result<u64, DatabaseError> {
        Err(read_only())
    }
}

#[async_trait]
impl HealthProbe for MemoryDb {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.check_reads()
    }
}

/// Image files kept in a map.
#[derive(Default)]
pub struct MemoryImageStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    next: AtomicUsize,
    fail_save: AtomicBool,
    fail_delete: AtomicBool,
}

impl MemoryImageStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_save(&self) {
        self.fail_save.store(true, Ordering::SeqCst);
    }

    pub fn fail_delete(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.lock().unwrap().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ImageStorage for MemoryImageStorage {
    async fn save(&self, bytes: &[u8], original_name: &str) -> Result<String, StorageError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::new(io::ErrorKind::Other, "injected save failure")));
        }
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let name = format!("monster_{}{}", n, extension_of(original_name));
        self.files.lock().unwrap().insert(name.clone(), bytes.to_vec());
        Ok(name)
    }

    async fn delete(&self, stored_name: &str) -> Result<(), StorageError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "injected delete failure")));
        }
        match self.files.lock().unwrap().remove(stored_name) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(stored_name.to_string())),
        }
    }
}

pub type TestWriter = MonsterWriteService<MemoryMonsterStore, MemoryCoordinator>;

pub fn writer(db: &Arc<MemoryDb>, images: &Arc<MemoryImageStorage>, deadline: Duration) -> TestWriter {
    MonsterWriteService::new(
        MemoryMonsterStore::new(db.clone()),
        MemoryCoordinator::new(db.clone()),
        images.clone(),
        deadline,
    )
}

pub fn reader(db: &Arc<MemoryDb>) -> MonsterReadService<MemoryMonsterStore> {
    MonsterReadService::new(MemoryMonsterStore::new(db.clone()), TEST_BASE_URL, Duration::from_secs(5))
}

/// Handler state wired to the in-memory fakes.
pub fn app_state(db: &Arc<MemoryDb>, images: &Arc<MemoryImageStorage>) -> AppState {
    let deadline = Duration::from_secs(5);
    AppState {
        auth: Arc::new(AuthService::new(MemoryUserStore::new(db.clone()), TEST_SECRET, 24, deadline)),
        catalog: Arc::new(CatalogService::new(
            MemoryCatalogStore::new(db.clone()),
            MemoryCatalogStore::new(db.clone()),
            deadline,
        )),
        reader: Arc::new(reader(db)),
        writer: Arc::new(writer(db, images, deadline)),
        health: db.clone(),
        images: Arc::new(ImageConfig {
            dir: std::env::temp_dir().to_string_lossy().into_owned(),
            ..ImageConfig::default()
        }),
        jwt_secret: Arc::from(TEST_SECRET),
    }
}

/// A signed token carrying the named permissions.
pub fn token_with(permissions: &[&str]) -> String {
    let permission = permissions
        .iter()
        .map(|name| Permission {
            id: Uuid::new_v4(),
            name: name.to_string(),
            action: "ANY".to_string(),
            role_id: Uuid::nil(),
        })
        .collect();
    let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), permission, 1);
    crate::auth::generate_jwt(&claims, TEST_SECRET).unwrap()
}

#[cfg(test)]
mod tests {
    use super::ilike;

    #[test]
    fn ilike_handles_wildcards_and_escapes() {
        assert!(ilike("Pidge", "%pid%"));
        assert!(!ilike("Charm", "%pid%"));
        assert!(ilike("100%", "%0\\%"));
        assert!(!ilike("1000", "%0\\%"));
        assert!(ilike("ab", "a_"));
    }
}
