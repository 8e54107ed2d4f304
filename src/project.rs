//! Per-project handle
//!
//! This module provides:
//! - `ProjectContext`, owning the command queue, runner, package registry,
//!   status engine, manifest reconciler and event bus of one project
//! - The command surface: install / uninstall / update / prune, manifest
//!   edits, and unqueued reads (status, packages, search, info)
//!
//! Mutating operations are queued on the `CommandExecutor` at call time and
//! run strictly in submission order. Reads see whatever state the last
//! completed operation left behind.

use crate::config::ProjectConfig;
use crate::domain::{DependencyType, Package, ResultSummary, SyncStatus};
use crate::error::{AppError, CommandError};
use crate::events::{EventBus, ProjectEvent};
use crate::executor::{CommandExecutor, TaskHandle};
use crate::manifest::{
    read_file, ManifestHandle, ManifestReconciler, ManifestState, PackageEntryUpdate, RcDocument,
    StructuredFile,
};
use crate::package_manager::{
    classify, BowerCommand, CacheEntry, CommandOutput, ListedPackage, OptionMap, PackageInfo,
    PackageManagerRunner, SearchHit, SystemPackageManager,
};
use crate::package_registry::PackageRegistry;
use crate::status::{StatusReport, SyncStatusEngine};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{info, warn};

/// Options for installing a single package
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallOptions {
    /// Version range or tag; the registry's latest when `None`
    pub version: Option<String>,
    /// Declare the package in the manifest under this map
    pub save: Option<DependencyType>,
}

impl InstallOptions {
    /// Sets the requested version (builder pattern)
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Saves the package to the manifest (builder pattern)
    pub fn save(mut self, dependency_type: DependencyType) -> Self {
        self.save = Some(dependency_type);
        self
    }

    fn endpoint(&self, name: &str) -> String {
        match self.version {
            Some(ref version) => format!("{}#{}", name, version),
            None => name.to_string(),
        }
    }
}

/// Last results of the listing commands, kept to rebuild the registry
#[derive(Debug, Default)]
struct Sources {
    listing: Vec<ListedPackage>,
    cache: Vec<CacheEntry>,
}

struct ProjectInner {
    config: ProjectConfig,
    rc: Option<RcDocument>,
    runner: Arc<dyn PackageManagerRunner>,
    executor: CommandExecutor,
    // Lock order: reconciler, sources, registry, status
    reconciler: Mutex<ManifestReconciler>,
    sources: Mutex<Sources>,
    registry: RwLock<PackageRegistry>,
    status: Mutex<SyncStatusEngine>,
    events: EventBus,
}

/// Handle to one open project; cheap to clone
#[derive(Clone)]
pub struct ProjectContext {
    inner: Arc<ProjectInner>,
}

impl ProjectContext {
    /// Open the project described by `config`, running commands through `runner`
    ///
    /// Reads `.bowerrc` (a corrupt one is an error) and `bower.json` from the
    /// directory bower runs in. A corrupt manifest is reported; until it is
    /// fixed, operations that read or write it fail with `ManifestMalformed`.
    /// The package set stays empty until the first `reload`.
    pub async fn open(
        config: ProjectConfig,
        runner: Arc<dyn PackageManagerRunner>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let rc = RcDocument::load(&config.project_dir)?;

        let mut reconciler = ManifestReconciler::new(&config.working_dir(rc.as_ref()));
        if let Err(e) = reconciler.load() {
            warn!(error = %e, "manifest could not be read");
        }

        let events = EventBus::new();
        let inner = ProjectInner {
            rc,
            runner,
            executor: CommandExecutor::new(),
            reconciler: Mutex::new(reconciler),
            sources: Mutex::new(Sources::default()),
            registry: RwLock::new(PackageRegistry::new()),
            status: Mutex::new(SyncStatusEngine::new(events.clone())),
            events,
            config,
        };
        info!(project = %inner.config.project_dir.display(), "project opened");
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Open the project with the system `bower` binary
    pub async fn open_system(config: ProjectConfig) -> Result<Self, AppError> {
        config.validate()?;
        let rc = RcDocument::load(&config.project_dir)?;
        let runner = SystemPackageManager::new(&config.bower_binary, config.working_dir(rc.as_ref()))
            .with_timeout(config.command_timeout);
        Self::open(config, Arc::new(runner)).await
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.inner.config
    }

    /// Subscribe to project events
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectEvent> {
        self.inner.events.subscribe()
    }

    /// Number of queued or running operations
    pub fn pending(&self) -> usize {
        self.inner.executor.pending()
    }

    /// Returns true while an operation is running
    pub fn is_busy(&self) -> bool {
        self.inner.executor.is_busy()
    }

    fn queue<F, Fut, T>(&self, operation: F) -> TaskHandle<T, AppError>
    where
        F: FnOnce(Arc<ProjectInner>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<T, AppError>> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        self.inner.executor.submit(move || operation(inner))
    }

    // Queued operations

    /// Re-read installed packages, cache and manifest
    pub fn reload(&self) -> TaskHandle<(), AppError> {
        self.queue(|inner| async move { inner.refresh().await })
    }

    /// Install everything the manifest declares
    pub fn install_from_manifest(&self) -> TaskHandle<ResultSummary, AppError> {
        self.queue(|inner| async move { inner.install_from_manifest().await })
    }

    /// Install one package, optionally declaring it in the manifest
    pub fn install_package(
        &self,
        name: &str,
        options: InstallOptions,
    ) -> TaskHandle<ResultSummary, AppError> {
        let name = name.to_string();
        self.queue(move |inner| async move { inner.install_package(&name, &options).await })
    }

    /// Remove an installed package and its manifest entry
    pub fn uninstall(&self, name: &str, force: bool) -> TaskHandle<ResultSummary, AppError> {
        let name = name.to_string();
        self.queue(move |inner| async move { inner.uninstall(&name, force).await })
    }

    /// Update one package, or every package when `name` is `None`
    pub fn update(&self, name: Option<&str>) -> TaskHandle<ResultSummary, AppError> {
        let name = name.map(str::to_string);
        self.queue(move |inner| async move { inner.update(name.as_deref()).await })
    }

    /// Remove installed packages nothing depends on
    pub fn prune(&self) -> TaskHandle<ResultSummary, AppError> {
        self.queue(|inner| async move { inner.prune().await })
    }

    /// Write a manifest declaring the current package set
    pub fn create_manifest(&self) -> TaskHandle<ManifestHandle, AppError> {
        self.queue(|inner| async move { inner.create_manifest().await })
    }

    /// Delete the manifest
    pub fn remove_manifest(&self) -> TaskHandle<(), AppError> {
        self.queue(|inner| async move { inner.remove_manifest().await })
    }

    /// Change the declared range and/or dependency map of one entry
    pub fn update_package_entry(
        &self,
        name: &str,
        update: PackageEntryUpdate,
    ) -> TaskHandle<(), AppError> {
        let name = name.to_string();
        self.queue(move |inner| async move { inner.update_package_entry(&name, &update).await })
    }

    /// The file watcher saw bower.json change or disappear; returns whether
    /// the dependency sets changed
    pub fn manifest_file_changed(&self) -> TaskHandle<bool, AppError> {
        self.queue(|inner| async move {
            let changed = inner.sync_manifest().await?;
            if changed {
                inner.rebuild_registry().await;
            }
            Ok(changed)
        })
    }

    // Reads, never queued

    /// Last computed status report
    pub async fn status(&self) -> StatusReport {
        self.inner.status.lock().await.report().clone()
    }

    /// Last computed status value
    pub async fn sync_status(&self) -> SyncStatus {
        self.inner.status.lock().await.status()
    }

    /// Current package set
    pub async fn packages(&self) -> Vec<Package> {
        self.inner.registry.read().await.packages().to_vec()
    }

    /// Look up one package
    pub async fn package(&self, name: &str) -> Option<Package> {
        self.inner.registry.read().await.package(name).cloned()
    }

    /// Whether bower.json is present
    pub async fn manifest_state(&self) -> ManifestState {
        self.inner.reconciler.lock().await.state()
    }

    /// Search the registry
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, AppError> {
        let command = BowerCommand::Search;
        match self.inner.run(command, vec![query.to_string()], None).await? {
            CommandOutput::Search(hits) => Ok(hits),
            other => Err(other.unexpected(command).into()),
        }
    }

    /// Registry information about one package
    pub async fn info(&self, name: &str) -> Result<PackageInfo, AppError> {
        let command = BowerCommand::Info;
        match self.inner.run(command, vec![name.to_string()], Some(name)).await? {
            CommandOutput::Info(info) => Ok(info),
            other => Err(other.unexpected(command).into()),
        }
    }

    /// Effective package manager configuration
    pub async fn configuration(&self) -> Result<OptionMap, AppError> {
        let command = BowerCommand::GetConfiguration;
        match self.inner.run(command, Vec::new(), None).await? {
            CommandOutput::Configuration(config) => Ok(config),
            other => Err(other.unexpected(command).into()),
        }
    }
}

impl ProjectInner {
    /// Run one command and parse its payload
    async fn run(
        &self,
        command: BowerCommand,
        args: Vec<String>,
        package: Option<&str>,
    ) -> Result<CommandOutput, CommandError> {
        self.run_with(command, args, self.config.command_options(command), package)
            .await
    }

    async fn run_with(
        &self,
        command: BowerCommand,
        args: Vec<String>,
        options: OptionMap,
        package: Option<&str>,
    ) -> Result<CommandOutput, CommandError> {
        let config = self.config.runner_config(self.rc.as_ref());
        let value = self
            .runner
            .execute(command, &args, &options, &config)
            .await
            .map_err(|e| classify(command, package, e))?;
        CommandOutput::parse(command, value)
    }

    /// Query the tool, then resync the manifest and rebuild registry and status
    async fn refresh(&self) -> Result<(), AppError> {
        let listing = match self.run(BowerCommand::List, Vec::new(), None).await? {
            CommandOutput::Listing(listing) => listing.packages,
            other => return Err(other.unexpected(BowerCommand::List).into()),
        };
        let cache = match self.run(BowerCommand::CacheList, Vec::new(), None).await? {
            CommandOutput::Cache(entries) => entries,
            other => return Err(other.unexpected(BowerCommand::CacheList).into()),
        };
        *self.sources.lock().await = Sources { listing, cache };

        self.sync_manifest().await?;
        self.rebuild_registry().await;
        Ok(())
    }

    /// Refresh after a mutating command; failures are logged, not returned
    async fn refresh_after(&self, command: BowerCommand) {
        if let Err(e) = self.refresh().await {
            warn!(%command, error = %e, "reload after command failed");
        }
    }

    /// Bring the reconciler in line with the file on disk
    async fn sync_manifest(&self) -> Result<bool, AppError> {
        let mut reconciler = self.reconciler.lock().await;
        let changed = match read_file(reconciler.path())? {
            Some(raw) => match reconciler.detect_external_change(&raw) {
                Ok(changed) => changed,
                Err(e) => {
                    drop(reconciler);
                    self.status.lock().await.reset();
                    return Err(e.into());
                }
            },
            None => reconciler.external_removal(),
        };
        drop(reconciler);

        if changed {
            self.events.emit(ProjectEvent::ManifestChanged);
        }
        Ok(changed)
    }

    async fn rebuild_registry(&self) {
        let reconciler = self.reconciler.lock().await;
        let sources = self.sources.lock().await;
        let mut registry = self.registry.write().await;
        registry.reload(reconciler.document(), &sources.listing, &sources.cache);
        let packages = registry.packages().to_vec();
        drop(registry);
        drop(sources);
        drop(reconciler);

        self.events.emit(ProjectEvent::Reloaded);
        self.status.lock().await.recompute(&packages);
    }

    /// Finish a mutating command: refresh state and log the outcome
    async fn complete(
        &self,
        command: BowerCommand,
        result: Result<CommandOutput, CommandError>,
    ) -> Result<CommandOutput, AppError> {
        self.refresh_after(command).await;
        let output = result?;
        info!(%command, packages = output.summary().count, "command finished");
        Ok(output)
    }

    async fn install_from_manifest(&self) -> Result<ResultSummary, AppError> {
        {
            let reconciler = self.reconciler.lock().await;
            reconciler.ensure_readable()?;
            if reconciler.state() == ManifestState::Absent {
                return Err(CommandError::ManifestAbsent {
                    path: reconciler.path().to_path_buf(),
                }
                .into());
            }
        }
        let command = BowerCommand::Install;
        let result = self.run(command, Vec::new(), None).await;
        Ok(self.complete(command, result).await?.summary())
    }

    async fn install_package(
        &self,
        name: &str,
        options: &InstallOptions,
    ) -> Result<ResultSummary, AppError> {
        if options.save.is_some() {
            self.reconciler.lock().await.ensure_readable()?;
        }
        let command = BowerCommand::Install;
        let output = match self.run(command, vec![options.endpoint(name)], Some(name)).await {
            Ok(output) => output,
            Err(e) => {
                self.refresh_after(command).await;
                return Err(e.into());
            }
        };
        let summary = output.summary();

        if let Some(dependency_type) = options.save {
            let range = match options.version {
                Some(ref version) => version.clone(),
                None => summary
                    .packages
                    .get(name)
                    .and_then(|p| p.version.as_ref())
                    .map(|v| format!("~{}", v))
                    .unwrap_or_else(|| "*".to_string()),
            };
            self.save_entry(name, &range, dependency_type).await?;
        }

        self.refresh_after(command).await;
        info!(%command, package = name, packages = summary.count, "command finished");
        Ok(summary)
    }

    async fn save_entry(
        &self,
        name: &str,
        range: &str,
        dependency_type: DependencyType,
    ) -> Result<(), AppError> {
        let mut reconciler = self.reconciler.lock().await;
        if reconciler.state() == ManifestState::Absent {
            reconciler.create(&[])?;
        }
        reconciler.add_package_entry(name, range, dependency_type)?;
        drop(reconciler);
        self.events.emit(ProjectEvent::ManifestChanged);
        Ok(())
    }

    async fn uninstall(&self, name: &str, force: bool) -> Result<ResultSummary, AppError> {
        let command = BowerCommand::Uninstall;
        let mut options = self.config.command_options(command);
        if force {
            options.insert("force".to_string(), Value::Bool(true));
        }
        let output = match self
            .run_with(command, vec![name.to_string()], options, Some(name))
            .await
        {
            Ok(output) => output,
            Err(e) => {
                self.refresh_after(command).await;
                return Err(e.into());
            }
        };

        let removed_entry = {
            let mut reconciler = self.reconciler.lock().await;
            if reconciler.is_malformed() {
                warn!(package = name, "manifest is malformed; entry left in place");
                false
            } else if reconciler.state() == ManifestState::Present {
                reconciler.remove_package_entry(name)?
            } else {
                false
            }
        };
        if removed_entry {
            self.events.emit(ProjectEvent::ManifestChanged);
        }

        self.refresh_after(command).await;
        let summary = output.summary();
        info!(%command, package = name, packages = summary.count, "command finished");
        Ok(summary)
    }

    async fn update(&self, name: Option<&str>) -> Result<ResultSummary, AppError> {
        let command = BowerCommand::Update;
        let args = name.map(|n| vec![n.to_string()]).unwrap_or_default();
        let result = self.run(command, args, name).await;
        Ok(self.complete(command, result).await?.summary())
    }

    async fn prune(&self) -> Result<ResultSummary, AppError> {
        let command = BowerCommand::Prune;
        let result = self.run(command, Vec::new(), None).await;
        Ok(self.complete(command, result).await?.summary())
    }

    async fn create_manifest(&self) -> Result<ManifestHandle, AppError> {
        let packages = self.registry.read().await.packages().to_vec();
        let handle = self.reconciler.lock().await.create(&packages)?;
        self.events.emit(ProjectEvent::ManifestChanged);
        self.rebuild_registry().await;
        Ok(handle)
    }

    async fn remove_manifest(&self) -> Result<(), AppError> {
        self.reconciler.lock().await.remove()?;
        self.events.emit(ProjectEvent::ManifestChanged);
        self.rebuild_registry().await;
        Ok(())
    }

    async fn update_package_entry(
        &self,
        name: &str,
        update: &PackageEntryUpdate,
    ) -> Result<(), AppError> {
        self.reconciler
            .lock()
            .await
            .update_package_entry(name, update)?;
        self.events.emit(ProjectEvent::ManifestChanged);
        self.rebuild_registry().await;
        Ok(())
    }
}
