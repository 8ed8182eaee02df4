//! In-memory repositories for testing
//!
//! `InMemoryStore` implements every persistence trait without a database and
//! can be told to fail specific writes.

use async_trait::async_trait;
use memos_core::models::{
    ActivityCreate, FindResource, MemoResource, RemoteStorage, Resource, ResourceCreate,
    ResourceLocation, UpdateResource, Visibility,
};
use memos_core::AppError;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::repository::{
    ActivityRepository, MemoResourceRepository, ResourceRepository, SystemSettingRepository,
};

#[derive(Default)]
struct State {
    next_id: i32,
    resources: BTreeMap<i32, Resource>,
    memos: HashMap<i32, Visibility>,
    memo_resources: Vec<MemoResource>,
    activities: Vec<ActivityCreate>,
    settings: HashMap<String, String>,
    storages: HashMap<i32, RemoteStorage>,
    fail_activity: bool,
    fail_resource_create: bool,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_memo(&self, memo_id: i32, visibility: Visibility) {
        self.lock().memos.insert(memo_id, visibility);
    }

    pub fn link_memo(&self, memo_id: i32, resource_id: i32) {
        self.lock().memo_resources.push(MemoResource {
            memo_id,
            resource_id,
        });
    }

    pub fn set_setting(&self, name: &str, value: &str) {
        self.lock()
            .settings
            .insert(name.to_string(), value.to_string());
    }

    pub fn add_remote_storage(&self, storage: RemoteStorage) {
        self.lock().storages.insert(storage.id, storage);
    }

    pub fn activities(&self) -> Vec<ActivityCreate> {
        self.lock().activities.clone()
    }

    /// Resource as stored, including inline bytes.
    pub fn raw_resource(&self, id: i32) -> Option<Resource> {
        self.lock().resources.get(&id).cloned()
    }

    pub fn resource_count(&self) -> usize {
        self.lock().resources.len()
    }

    pub fn fail_activity_writes(&self, fail: bool) {
        self.lock().fail_activity = fail;
    }

    pub fn fail_resource_creates(&self, fail: bool) {
        self.lock().fail_resource_create = fail;
    }
}

fn matches(resource: &Resource, find: &FindResource) -> bool {
    find.id.is_none_or(|id| resource.id == id)
        && find.creator_id.is_none_or(|id| resource.creator_id == id)
        && find
            .filename
            .as_deref()
            .is_none_or(|name| resource.filename == name)
}

/// Mirror the database: inline bytes are only returned when asked for.
fn project(resource: &Resource, get_blob: bool) -> Resource {
    let mut resource = resource.clone();
    if !get_blob && matches!(resource.location, Some(ResourceLocation::Inline(_))) {
        resource.location = None;
    }
    resource
}

fn with_link_count(state: &State, mut resource: Resource) -> Resource {
    resource.linked_memo_amount = state
        .memo_resources
        .iter()
        .filter(|link| link.resource_id == resource.id)
        .count() as i64;
    resource
}

#[async_trait]
impl ResourceRepository for InMemoryStore {
    async fn create_resource(&self, create: ResourceCreate) -> Result<Resource, AppError> {
        let mut state = self.lock();
        if state.fail_resource_create {
            return Err(AppError::Internal("resource insert failed".to_string()));
        }

        state.next_id += 1;
        let now = chrono::Utc::now().timestamp();
        let resource = Resource {
            id: state.next_id,
            creator_id: create.creator_id,
            created_ts: now,
            updated_ts: now,
            filename: create.filename,
            content_type: create.content_type,
            size: create.size,
            location: create.location,
            linked_memo_amount: 0,
        };
        state.resources.insert(resource.id, resource.clone());

        Ok(project(&resource, false))
    }

    async fn get_resource(&self, find: &FindResource) -> Result<Option<Resource>, AppError> {
        let state = self.lock();
        Ok(state
            .resources
            .values()
            .rev()
            .find(|r| matches(r, find))
            .map(|r| with_link_count(&state, project(r, find.get_blob))))
    }

    async fn list_resources(&self, find: &FindResource) -> Result<Vec<Resource>, AppError> {
        let state = self.lock();
        let offset = find.offset.unwrap_or(0).max(0) as usize;
        let limit = find.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);

        Ok(state
            .resources
            .values()
            .rev()
            .filter(|r| matches(r, find))
            .skip(offset)
            .take(limit)
            .map(|r| with_link_count(&state, project(r, find.get_blob)))
            .collect())
    }

    async fn update_resource(&self, update: &UpdateResource) -> Result<Resource, AppError> {
        let mut state = self.lock();
        let resource = state
            .resources
            .get_mut(&update.id)
            .ok_or_else(|| AppError::NotFound(format!("Resource not found: {}", update.id)))?;

        if let Some(filename) = &update.filename {
            resource.filename = filename.clone();
        }
        resource.updated_ts = update.updated_ts;
        let updated = project(resource, false);

        Ok(with_link_count(&state, updated))
    }

    async fn delete_resource(&self, id: i32) -> Result<(), AppError> {
        let mut state = self.lock();
        state.resources.remove(&id);
        state.memo_resources.retain(|link| link.resource_id != id);
        Ok(())
    }
}

#[async_trait]
impl MemoResourceRepository for InMemoryStore {
    async fn list_memo_resources(&self, resource_id: i32) -> Result<Vec<MemoResource>, AppError> {
        Ok(self
            .lock()
            .memo_resources
            .iter()
            .filter(|link| link.resource_id == resource_id)
            .copied()
            .collect())
    }

    async fn get_memo_visibilities(&self, memo_ids: &[i32]) -> Result<Vec<Visibility>, AppError> {
        let state = self.lock();
        Ok(memo_ids
            .iter()
            .filter_map(|id| state.memos.get(id).copied())
            .collect())
    }
}

#[async_trait]
impl ActivityRepository for InMemoryStore {
    async fn create_activity(&self, activity: ActivityCreate) -> Result<(), AppError> {
        let mut state = self.lock();
        if state.fail_activity {
            return Err(AppError::Internal("activity insert failed".to_string()));
        }
        state.activities.push(activity);
        Ok(())
    }
}

#[async_trait]
impl SystemSettingRepository for InMemoryStore {
    async fn get_system_setting(&self, name: &str) -> Result<Option<String>, AppError> {
        Ok(self.lock().settings.get(name).cloned())
    }

    async fn get_remote_storage(&self, id: i32) -> Result<Option<RemoteStorage>, AppError> {
        Ok(self.lock().storages.get(&id).cloned())
    }
}
