//! 子系统的加载与卸载
//! Subsystem load and unload
//!
//! 加载时向主机登记钩子集、向模型注册表声明应用，并在启用时打开遥测通道。
//! 任一步骤失败都会回滚已完成的登记并中止加载。
//!
//! Loading registers the hook set with the host, declares the application
//! with the model registry and opens the telemetry channel when enabled. Any
//! failing step rolls back what was already registered and aborts the load.

use crate::config::Config;
use crate::controller::LearnedController;
use crate::error::Result;
use crate::host::{AlgorithmTable, CongestionOps, TcpSock};
use crate::model::{AppDescriptor, InferenceService, ModelRegistry};
use crate::telemetry::TelemetryChannel;
use std::sync::Arc;
use tracing::{error, info};

/// A loaded plugin: its hook set is visible to the host and its application
/// is declared with the registry.
///
/// 已加载的插件：其钩子集对主机可见，其应用已在注册表中声明。
pub struct Subsystem<S: TcpSock + 'static> {
    registry: Arc<ModelRegistry>,
    table: Arc<dyn AlgorithmTable<S>>,
    controller: Arc<LearnedController>,
}

impl<S: TcpSock + 'static> Subsystem<S> {
    /// Registers everything the plugin needs, or nothing at all.
    /// 登记插件所需的全部内容；失败时不留下任何登记。
    pub fn load(
        config: Config,
        registry: Arc<ModelRegistry>,
        table: Arc<dyn AlgorithmTable<S>>,
    ) -> Result<Self> {
        config.validate()?;

        let app = AppDescriptor {
            app_id: config.model.app_id,
            input_size: config.input_size(),
            output_size: config.model.output_size,
        };
        let name = config.model.algorithm_name;

        let telemetry = config
            .telemetry
            .report_interval
            .map(|_| TelemetryChannel::open(config.telemetry.channel_capacity));
        let service: Arc<dyn InferenceService> = registry.clone();
        let mut controller = LearnedController::new(config, service);
        if let Some(channel) = telemetry {
            controller = controller.with_telemetry(channel);
        }
        let controller = Arc::new(controller);

        let ops: Arc<dyn CongestionOps<S>> = controller.clone();
        if let Err(e) = table.register(ops) {
            error!(name, error = %e, "Cannot register learned controller with host");
            return Err(e);
        }

        if let Err(e) = registry.register_app(app) {
            error!(app_id = app.app_id, error = %e, "Cannot register app with model registry");
            table.unregister(name);
            return Err(e);
        }

        info!(
            name,
            app_id = app.app_id,
            input_size = app.input_size,
            "Learned controller loaded"
        );
        if let Some(channel) = controller.telemetry() {
            info!(
                channel = channel.name(),
                version = channel.version(),
                "Telemetry channel opened"
            );
        }
        Ok(Self {
            registry,
            table,
            controller,
        })
    }

    pub fn controller(&self) -> &Arc<LearnedController> {
        &self.controller
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// The telemetry channel, when reporting is enabled.
    /// 遥测通道（启用上报时）。
    pub fn telemetry(&self) -> Option<&TelemetryChannel> {
        self.controller.telemetry()
    }

    /// Withdraws the hook set and the application. Failures are logged.
    /// 撤销钩子集和应用。失败会被记录。
    pub fn unload(self) {
        let config = self.controller.config();
        let name = config.model.algorithm_name;
        let app_id = config.model.app_id;

        if self.table.unregister(name).is_none() {
            error!(name, "Learned controller was not registered with host");
        }
        if let Err(e) = self.registry.unregister_app(app_id) {
            error!(app_id, error = %e, "Cannot unregister app from model registry");
        }
        info!(name, app_id, "Learned controller unloaded");
    }
}
