//! Compound monster writes: create, update, captured-flag update, delete.
//!
//! Each workflow runs its store calls inside one transaction scope. The scope
//! commits only when every step succeeded; ordinary errors and panics both
//! roll it back. Image files are saved before the scope opens and removed
//! again if the scope does not commit. Replaced or orphaned images are
//! deleted only after a successful commit.
//!
//! The request deadline covers every step up to the commit. The commit
//! itself is never cut short, so a timed-out workflow has always rolled back.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use super::outcome::{settle, within, Outcome, ServiceError, ServiceResult};
use crate::database::models::{Monster, MonsterTypeMapping, NewMonster};
use crate::database::{EntityStore, MonsterStore, TransactionCoordinator};
use crate::filter::{Changeset, Preload, QueryDescriptor};
use crate::storage::{ImageStorage, StorageError};

/// An uploaded image, already size and extension checked.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub original_name: String,
}

#[derive(Debug, Clone)]
pub struct CreateMonster {
    pub name: String,
    pub monster_category_id: Uuid,
    pub description: String,
    pub length: f32,
    pub weight: u16,
    pub hp: u16,
    pub attack: u16,
    pub defends: u16,
    pub speed: u16,
    pub monster_type_ids: Vec<Uuid>,
    pub image: Option<ImageUpload>,
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct UpdateMonster {
    pub name: Option<String>,
    pub monster_category_id: Option<Uuid>,
    pub description: Option<String>,
    pub length: Option<f32>,
    pub weight: Option<u16>,
    pub hp: Option<u16>,
    pub attack: Option<u16>,
    pub defends: Option<u16>,
    pub speed: Option<u16>,
    pub is_caught: Option<bool>,
    /// `Some` replaces the whole type list
    pub monster_type_ids: Option<Vec<Uuid>>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonsterId {
    pub id: Uuid,
}

#[async_trait]
pub trait MonsterWriter: Send + Sync {
    async fn create(&self, req: CreateMonster) -> ServiceResult<MonsterId>;
    async fn update(&self, id: Uuid, req: UpdateMonster) -> ServiceResult<()>;
    async fn update_captured(&self, id: Uuid, is_caught: bool) -> ServiceResult<()>;
    async fn delete(&self, id: Uuid) -> ServiceResult<()>;
}

/// Columns needed to diff an update against the stored row.
const UPDATE_COLUMNS: &[&str] = &[
    "id",
    "name",
    "monster_category_id",
    "description",
    "length",
    "weight",
    "hp",
    "attack",
    "defends",
    "speed",
    "is_caught",
    "image_name",
];

pub struct MonsterWriteService<M, C> {
    monsters: M,
    coordinator: C,
    images: Arc<dyn ImageStorage>,
    deadline: Duration,
}

impl<M, C> MonsterWriteService<M, C>
where
    M: MonsterStore,
    C: TransactionCoordinator<Scope = <M as EntityStore<Monster>>::Scope>,
{
    pub fn new(monsters: M, coordinator: C, images: Arc<dyn ImageStorage>, deadline: Duration) -> Self {
        Self {
            monsters,
            coordinator,
            images,
            deadline,
        }
    }

    async fn load(&self, id: Uuid, query: QueryDescriptor) -> Result<Monster, ServiceError> {
        self.monsters
            .find(id, &query)
            .await
            .map_err(|e| ServiceError::from_lookup(e, "monster not found", "failed to get monster by id"))
    }

    async fn begin(&self) -> Result<C::Scope, ServiceError> {
        self.coordinator
            .begin()
            .await
            .map_err(|e| ServiceError::server("failed to create database transaction", e))
    }

    async fn stage_image(&self, image: Option<&ImageUpload>) -> Result<Option<String>, ServiceError> {
        match image {
            Some(upload) => self
                .images
                .save(&upload.bytes, &upload.original_name)
                .await
                .map(Some)
                .map_err(|e| ServiceError::server("failed to upload monster image", e)),
            None => Ok(None),
        }
    }

    /// Removes an image whose row change never committed.
    async fn discard_image(&self, name: &str) {
        if let Err(e) = self.images.delete(name).await {
            warn!(image = %name, error = %e, "Failed to remove image of failed workflow");
        }
    }

    /// Deletes a file the committed state no longer references. A file that is
    /// already gone counts as deleted.
    async fn remove_committed_image(&self, name: &str, message: &'static str) -> Result<(), ServiceError> {
        match self.images.delete(name).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound(_)) => {
                warn!(image = %name, "Image already absent");
                Ok(())
            }
            Err(e) => Err(ServiceError::server(message, e)),
        }
    }

    // Create

    async fn create_committed(
        &self,
        req: &CreateMonster,
        image_name: Option<String>,
        until: Instant,
    ) -> Result<Uuid, ServiceError> {
        let mut scope = within(until, self.begin()).await?;
        let result = AssertUnwindSafe(within(until, self.create_in_scope(&mut scope, req, image_name)))
            .catch_unwind()
            .await;
        settle(scope, result, "failed create monster").await
    }

    async fn create_in_scope(
        &self,
        scope: &mut C::Scope,
        req: &CreateMonster,
        image_name: Option<String>,
    ) -> Result<Uuid, ServiceError> {
        let last = self
            .monsters
            .last_assigned_code(Some(&mut *scope))
            .await
            .map_err(|e| ServiceError::server("failed to get last monster code", e))?;
        let monster_code = last
            .checked_add(1)
            .ok_or_else(|| ServiceError::server("failed to get last monster code", "monster code range exhausted"))?;

        let row = NewMonster {
            monster_code,
            name: req.name.clone(),
            monster_category_id: req.monster_category_id,
            description: req.description.clone(),
            length: req.length,
            weight: req.weight,
            hp: req.hp,
            attack: req.attack,
            defends: req.defends,
            speed: req.speed,
            image_name,
        };
        let id = self
            .monsters
            .create(&row.to_changeset(), Some(&mut *scope))
            .await
            .map_err(|e| ServiceError::from_store(e, "invalid monster category", "failed to create monster"))?;

        let type_ids = unique(&req.monster_type_ids);
        if !type_ids.is_empty() {
            self.monsters
                .create_mappings(&MonsterTypeMapping::for_monster(id, &type_ids), Some(&mut *scope))
                .await
                .map_err(|e| {
                    ServiceError::from_store(e, "invalid monster or monster type data", "failed to create monster type")
                })?;
        }

        info!(monster_id = %id, monster_code, types = type_ids.len(), "Monster created");
        Ok(id)
    }

    // Update

    /// Returns the image the row referenced before the update.
    async fn update_committed(
        &self,
        id: Uuid,
        req: &UpdateMonster,
        new_image: Option<&str>,
        until: Instant,
    ) -> Result<Option<String>, ServiceError> {
        let query = QueryDescriptor::new().select(UPDATE_COLUMNS).preload(Preload::Types);
        let current = within(until, self.load(id, query)).await?;

        let mut changes = sparse_changes(&current, req);
        if let Some(name) = new_image {
            changes.set("image_name", name);
        }
        let type_ids = req.monster_type_ids.as_deref().map(unique);
        let had_types = !current.monster_types.is_empty();

        let mut scope = within(until, self.begin()).await?;
        let work = self.update_in_scope(&mut scope, id, &changes, type_ids.as_deref(), had_types);
        let result = AssertUnwindSafe(within(until, work)).catch_unwind().await;
        settle(scope, result, "failed update monster").await?;

        info!(monster_id = %id, fields = changes.len(), "Monster updated");
        Ok(current.image_name)
    }

    async fn update_in_scope(
        &self,
        scope: &mut C::Scope,
        id: Uuid,
        changes: &Changeset,
        type_ids: Option<&[Uuid]>,
        had_types: bool,
    ) -> Result<(), ServiceError> {
        let filter = QueryDescriptor::new().where_eq(Monster::ID_EQ, id);
        self.monsters
            .update(&filter, changes, Some(&mut *scope))
            .await
            .map_err(|e| ServiceError::from_store(e, "invalid monster category", "failed to update monster"))?;

        if let Some(type_ids) = type_ids {
            if had_types {
                self.monsters
                    .delete_mappings(id, Some(&mut *scope))
                    .await
                    .map_err(|e| ServiceError::server("failed to update monster type", e))?;
            }
            self.monsters
                .create_mappings(&MonsterTypeMapping::for_monster(id, type_ids), Some(&mut *scope))
                .await
                .map_err(|e| {
                    ServiceError::from_store(e, "invalid monster or monster type data", "failed to update monster type")
                })?;
        }
        Ok(())
    }

    // Captured flag

    async fn update_captured_committed(&self, id: Uuid, is_caught: bool, until: Instant) -> Result<(), ServiceError> {
        let current = within(until, self.load(id, QueryDescriptor::new().select(&["id", "is_caught"]))).await?;

        let mut changes = Changeset::new();
        if current.is_caught != is_caught {
            changes.set("is_caught", is_caught);
        }

        let mut scope = within(until, self.begin()).await?;
        let filter = QueryDescriptor::new().where_eq(Monster::ID_EQ, id);
        let result = AssertUnwindSafe(within(until, async {
            self.monsters
                .update(&filter, &changes, Some(&mut scope))
                .await
                .map(|_| ())
                .map_err(|e| ServiceError::server("failed to update monster captured mark", e))
        }))
        .catch_unwind()
        .await;
        settle(scope, result, "failed update monster captured mark").await
    }

    // Delete

    /// Returns the image the deleted row referenced.
    async fn delete_committed(&self, id: Uuid, until: Instant) -> Result<Option<String>, ServiceError> {
        let query = QueryDescriptor::new().select(&["id", "image_name"]).preload(Preload::Types);
        let current = within(until, self.load(id, query)).await?;
        let had_types = !current.monster_types.is_empty();

        let mut scope = within(until, self.begin()).await?;
        let result = AssertUnwindSafe(within(until, self.delete_in_scope(&mut scope, id, had_types)))
            .catch_unwind()
            .await;
        settle(scope, result, "failed delete monster").await?;

        info!(monster_id = %id, "Monster deleted");
        Ok(current.image_name)
    }

    async fn delete_in_scope(&self, scope: &mut C::Scope, id: Uuid, had_types: bool) -> Result<(), ServiceError> {
        let filter = QueryDescriptor::new().where_eq(Monster::ID_EQ, id);
        self.monsters
            .soft_delete(&filter, Some(&mut *scope))
            .await
            .map_err(|e| ServiceError::server("failed to delete monster", e))?;

        if had_types {
            self.monsters
                .delete_mappings(id, Some(&mut *scope))
                .await
                .map_err(|e| ServiceError::server("failed to update monster type", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl<M, C> MonsterWriter for MonsterWriteService<M, C>
where
    M: MonsterStore + 'static,
    C: TransactionCoordinator<Scope = <M as EntityStore<Monster>>::Scope> + 'static,
{
    async fn create(&self, req: CreateMonster) -> ServiceResult<MonsterId> {
        let until = Instant::now() + self.deadline;
        let image_name = self.stage_image(req.image.as_ref()).await?;
        let result = self.create_committed(&req, image_name.clone(), until).await;
        match result {
            Ok(id) => Ok(Outcome::created(MonsterId { id }, "create monster successfully")),
            Err(e) => {
                if let Some(name) = &image_name {
                    self.discard_image(name).await;
                }
                Err(e)
            }
        }
    }

    async fn update(&self, id: Uuid, req: UpdateMonster) -> ServiceResult<()> {
        let until = Instant::now() + self.deadline;
        let new_image = self.stage_image(req.image.as_ref()).await?;
        let result = self.update_committed(id, &req, new_image.as_deref(), until).await;
        let previous_image = match result {
            Ok(previous) => previous,
            Err(e) => {
                if let Some(name) = &new_image {
                    self.discard_image(name).await;
                }
                return Err(e);
            }
        };

        if new_image.is_some() {
            if let Some(old) = previous_image.as_deref().filter(|n| !n.is_empty()) {
                self.remove_committed_image(old, "failed to update monster image").await?;
            }
        }
        Ok(Outcome::ok((), "update monster successfully"))
    }

    async fn update_captured(&self, id: Uuid, is_caught: bool) -> ServiceResult<()> {
        self.update_captured_committed(id, is_caught, Instant::now() + self.deadline)
            .await?;
        Ok(Outcome::ok((), "update monster captured mark successfully"))
    }

    async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let image = self.delete_committed(id, Instant::now() + self.deadline).await?;
        if let Some(name) = image.as_deref().filter(|n| !n.is_empty()) {
            self.remove_committed_image(name, "failed to delete monster image").await?;
        }
        Ok(Outcome::ok((), "delete monster successfully"))
    }
}

/// Fields of `req` that are present and differ from `current`.
///
/// Text fields are written only when non-empty, so an update cannot clear
/// them. Numbers are compared by value.
pub fn sparse_changes(current: &Monster, req: &UpdateMonster) -> Changeset {
    let mut changes = Changeset::new();

    if let Some(name) = req.name.as_deref().filter(|s| !s.is_empty() && *s != current.name) {
        changes.set("name", name);
    }
    if let Some(category) = req.monster_category_id.filter(|c| *c != current.monster_category_id) {
        changes.set("monster_category_id", category);
    }
    if let Some(description) = req
        .description
        .as_deref()
        .filter(|s| !s.is_empty() && *s != current.description)
    {
        changes.set("description", description);
    }
    if let Some(length) = req.length.filter(|l| *l != current.length) {
        changes.set("length", length);
    }

    let numbers = [
        ("weight", req.weight, current.weight),
        ("hp", req.hp, current.hp),
        ("attack", req.attack, current.attack),
        ("defends", req.defends, current.defends),
        ("speed", req.speed, current.speed),
    ];
    for (column, requested, stored) in numbers {
        if let Some(value) = requested.filter(|v| i32::from(*v) != stored) {
            changes.set(column, value);
        }
    }

    if let Some(is_caught) = req.is_caught.filter(|c| *c != current.is_caught) {
        changes.set("is_caught", is_caught);
    }
    changes
}

/// Drops repeated ids, keeping first-seen order.
fn unique(ids: &[Uuid]) -> Vec<Uuid> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}
