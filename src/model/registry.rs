//! 进程内模型注册表
//! In-process model registry
//!
//! 应用表保存在 `DashMap` 中；每个应用的活动模型放在 `ArcSwapOption` 后面，
//! 激活时以原子指针交换发布新快照，查询只读取不可变快照。
//!
//! Applications live in a `DashMap`; each application's active model sits
//! behind an `ArcSwapOption`. Activation publishes a new snapshot with an
//! atomic pointer swap and queries only ever read an immutable snapshot.

use super::{AppDescriptor, AppId, InferenceModel, InferenceService, ModelUuid};
use crate::error::{Error, Result};
use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

struct ActiveModel {
    uuid: ModelUuid,
    model: Arc<dyn InferenceModel>,
}

struct AppSlot {
    descriptor: AppDescriptor,
    models: DashMap<ModelUuid, Arc<dyn InferenceModel>>,
    active: ArcSwapOption<ActiveModel>,
    /// Serialises administrative changes of this slot. Queries never take it.
    admin: Mutex<()>,
}

impl AppSlot {
    fn new(descriptor: AppDescriptor) -> Self {
        Self {
            descriptor,
            models: DashMap::new(),
            active: ArcSwapOption::empty(),
            admin: Mutex::new(()),
        }
    }

    fn check_shape(&self, input: usize, output: usize) -> Result<()> {
        let d = &self.descriptor;
        if input != d.input_size || output != d.output_size {
            return Err(Error::ShapeMismatch {
                app_id: d.app_id,
                expected_input: d.input_size,
                expected_output: d.output_size,
                input,
                output,
            });
        }
        Ok(())
    }
}

/// Directory of applications and their models.
///
/// One registry is constructed at startup and shared by handle with every
/// flow; it is torn down by dropping the last handle.
///
/// 应用及其模型的目录。启动时构造一个注册表，通过句柄共享给所有流；
/// 最后一个句柄被释放时销毁。
#[derive(Default)]
pub struct ModelRegistry {
    apps: DashMap<AppId, Arc<AppSlot>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an application and the widths of its vectors.
    /// 声明一个应用及其向量宽度。
    pub fn register_app(&self, app: AppDescriptor) -> Result<()> {
        match self.apps.entry(app.app_id) {
            Entry::Occupied(_) => Err(Error::AppAlreadyRegistered(app.app_id)),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(AppSlot::new(app)));
                info!(
                    app_id = app.app_id,
                    input_size = app.input_size,
                    output_size = app.output_size,
                    "App registered"
                );
                Ok(())
            }
        }
    }

    /// Removes an application together with all of its models.
    /// 移除应用及其所有模型。
    pub fn unregister_app(&self, app_id: AppId) -> Result<()> {
        self.apps
            .remove(&app_id)
            .ok_or(Error::AppNotRegistered(app_id))?;
        info!(app_id, "App unregistered");
        Ok(())
    }

    pub fn app(&self, app_id: AppId) -> Option<AppDescriptor> {
        self.apps.get(&app_id).map(|slot| slot.descriptor)
    }

    /// Registers a model version. The model must match the widths the
    /// application declared. Registration does not activate it.
    ///
    /// 注册一个模型版本。模型必须与应用声明的宽度一致。注册不会激活模型。
    pub fn register_model(&self, app_id: AppId, model: Arc<dyn InferenceModel>) -> Result<()> {
        let slot = self.slot(app_id)?;
        slot.check_shape(model.input_size(), model.output_size())?;

        let _admin = slot.admin.lock().unwrap_or_else(|e| e.into_inner());
        let uuid = model.uuid();
        match slot.models.entry(uuid) {
            Entry::Occupied(_) => Err(Error::ModelAlreadyRegistered { app_id, uuid }),
            Entry::Vacant(vacant) => {
                vacant.insert(model);
                info!(app_id, uuid, "Model registered");
                Ok(())
            }
        }
    }

    /// Makes a registered model the one answering queries for `app_id`.
    ///
    /// In-flight queries keep the snapshot they already loaded.
    ///
    /// 使已注册的模型成为 `app_id` 的查询应答者。进行中的查询保留其已加载的快照。
    pub fn activate_model(&self, app_id: AppId, uuid: ModelUuid) -> Result<()> {
        let slot = self.slot(app_id)?;
        let _admin = slot.admin.lock().unwrap_or_else(|e| e.into_inner());
        let model = slot
            .models
            .get(&uuid)
            .map(|m| Arc::clone(m.value()))
            .ok_or(Error::ModelNotRegistered { app_id, uuid })?;

        slot.active.store(Some(Arc::new(ActiveModel { uuid, model })));
        info!(app_id, uuid, "Model activated");
        Ok(())
    }

    /// Removes a model version, deactivating it first if it is active.
    /// 移除一个模型版本；如果它处于活动状态，先将其停用。
    pub fn unregister_model(&self, app_id: AppId, uuid: ModelUuid) -> Result<()> {
        let slot = self.slot(app_id)?;
        let _admin = slot.admin.lock().unwrap_or_else(|e| e.into_inner());
        slot.models
            .remove(&uuid)
            .ok_or(Error::ModelNotRegistered { app_id, uuid })?;

        if slot.active.load_full().is_some_and(|a| a.uuid == uuid) {
            slot.active.store(None);
            debug!(app_id, uuid, "Active model deactivated");
        }
        info!(app_id, uuid, "Model unregistered");
        Ok(())
    }

    /// The uuid of the model currently answering queries for `app_id`.
    /// 当前为 `app_id` 应答查询的模型uuid。
    pub fn active_model(&self, app_id: AppId) -> Option<ModelUuid> {
        let slot = self.slot(app_id).ok()?;
        slot.active.load_full().map(|a| a.uuid)
    }

    pub fn registered_models(&self, app_id: AppId) -> Vec<ModelUuid> {
        let mut uuids: Vec<ModelUuid> = self
            .slot(app_id)
            .map(|slot| slot.models.iter().map(|m| *m.key()).collect())
            .unwrap_or_default();
        uuids.sort_unstable();
        uuids
    }

    fn slot(&self, app_id: AppId) -> Result<Arc<AppSlot>> {
        self.apps
            .get(&app_id)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or(Error::AppNotRegistered(app_id))
    }
}

impl InferenceService for ModelRegistry {
    fn query(&self, app_id: AppId, input: &[i64], output: &mut [i64]) -> Result<()> {
        let slot = self
            .slot(app_id)
            .map_err(|_| Error::ModelUnavailable { app_id })?;
        slot.check_shape(input.len(), output.len())?;

        let snapshot = slot.active.load();
        let Some(active) = &*snapshot else {
            return Err(Error::ModelUnavailable { app_id });
        };
        active.model.infer(input, output);
        Ok(())
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut apps: Vec<AppId> = self.apps.iter().map(|a| *a.key()).collect();
        apps.sort_unstable();
        f.debug_struct("ModelRegistry").field("apps", &apps).finish()
    }
}
