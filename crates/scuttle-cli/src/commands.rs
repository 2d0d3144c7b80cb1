use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::Mutex;
use tracing::{info, warn};

use scuttle_api::build_app;
use scuttle_config::UninstallConfig;
use scuttle_coordinator::{decide_restart, Coordinator, UninstallReport};
use scuttle_domain::{ServiceSpec, TaskSpec};
use scuttle_driver::{synthetic_offers, DriverEvent, FakeDriver, FakeSecretsClient, SecretsClient, UninstallRecorder};
use scuttle_plan::{build_plan, PlanBuildInput, PlanManager};
use scuttle_store::{compute_desired_hash, CachedStore, InMemoryStore, RedbStore, ServiceStateStore, Store};

use crate::output;

/// The stand-in for the service-specification loader this crate doesn't
/// have (out of scope for this pass): whether the run should behave as if the
/// service spec declares transport encryption on every task, which gates
/// the TLS-cleanup phase together with `secrets.enabled`.
fn stand_in_service_spec(cfg: &UninstallConfig, transport_encryption: bool) -> Option<ServiceSpec> {
    transport_encryption.then(|| ServiceSpec {
        name: cfg.service_name.clone(),
        tasks: vec![TaskSpec { name: "*".into(), transport_encryption: true }],
    })
}

/// Warn if the service spec this plan is about to be built against has
/// drifted from the one recorded at the last plan build, then record the
/// current hash. A plan is built exactly once per process,
/// so drift can only be noticed here, not reconciled.
async fn check_desired_hash<S: Store>(
    store: &ServiceStateStore<S>,
    service_spec: &Option<ServiceSpec>,
) -> Result<()> {
    let hash = compute_desired_hash(service_spec);
    if let Some(previous) = store.get_desired_hash().await? {
        if previous != hash {
            warn!("service spec has changed since the last uninstall plan was built; this run will \
                   build its plan against the current spec, which the in-flight plan cannot pick up \
                   until the process restarts");
        }
    }
    store.set_desired_hash(&hash).await?;
    Ok(())
}

pub async fn run(
    cfg: UninstallConfig,
    store_path: Option<PathBuf>,
    simulate: bool,
    transport_encryption: bool,
    bind: SocketAddr,
    auth_token: String,
) -> Result<()> {
    cfg.validate()?;
    if !cfg.uninstall_enabled {
        bail!("uninstall.enabled is false; nothing to do");
    }
    if !simulate {
        bail!(
            "scuttle run currently only supports --simulate: a live master driver is wired in \
             by the host scheduler process and is out of scope for this crate"
        );
    }

    match store_path {
        Some(path) => {
            let backing = RedbStore::open(&path)
                .with_context(|| format!("failed to open store at {}", path.display()))?;
            let backing = CachedStore::warm(backing).await?;
            run_with_store(backing, cfg, transport_encryption, bind, auth_token).await
        }
        None => {
            let backing = CachedStore::new_empty(InMemoryStore::new());
            run_with_store(backing, cfg, transport_encryption, bind, auth_token).await
        }
    }
}

async fn run_with_store<S: Store>(
    backing: S,
    cfg: UninstallConfig,
    transport_encryption: bool,
    bind: SocketAddr,
    auth_token: String,
) -> Result<()> {
    let store = ServiceStateStore::shared(backing);

    let restart = decide_restart(&store).await?;
    info!(?restart, "restart gate decision");

    let tasks = store.list_tasks().await?;
    let framework_id_present = store.get_framework_id().await?.is_some();
    let service_spec = stand_in_service_spec(&cfg, transport_encryption);
    check_desired_hash(&store, &service_spec).await?;

    let plan = build_plan(&PlanBuildInput {
        tasks: &tasks,
        service_spec: service_spec.as_ref(),
        secrets_client_configured: cfg.secrets_enabled,
        framework_id_present,
    });
    let trivial = plan.is_trivial();
    let plan = Arc::new(Mutex::new(PlanManager::new(plan)));

    let driver = FakeDriver::new();
    let offers_tx = driver.sender();
    let recorder = Arc::new(UninstallRecorder::new(driver, store.clone(), plan.clone()));

    let secrets_client: Option<Arc<dyn SecretsClient>> = if cfg.secrets_enabled {
        Some(Arc::new(FakeSecretsClient::new()))
    } else {
        None
    };

    let coordinator = Arc::new(Coordinator::new(recorder, store.clone(), plan.clone(), secrets_client));

    let api = tokio::spawn({
        let store = store.clone();
        let plan = plan.clone();
        let auth_token = Arc::new(auth_token);
        async move {
            let app = build_app(store, plan, auth_token);
            let listener = tokio::net::TcpListener::bind(bind).await.expect("bind API listener");
            info!(%bind, "serving /plans and /events");
            axum::serve(listener, app).await.expect("API server");
        }
    });

    let offer_loop = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.run().await })
    };

    if trivial {
        info!("plan is trivial, nothing to uninstall");
    } else {
        loop {
            if coordinator.report().await.is_complete() {
                break;
            }
            let tasks = store.list_tasks().await?;
            let _ = offers_tx.send(DriverEvent::Offers(synthetic_offers(&tasks)));
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    print!("{}", output::render_report(&coordinator.report().await));

    let _ = offers_tx.send(DriverEvent::Disconnected);
    offer_loop.await.context("coordinator task panicked")?;
    api.abort();
    Ok(())
}

pub async fn status(cfg: UninstallConfig, store_path: Option<PathBuf>, transport_encryption: bool) -> Result<()> {
    cfg.validate()?;
    match store_path {
        Some(path) => {
            let backing = RedbStore::open(&path)
                .with_context(|| format!("failed to open store at {}", path.display()))?;
            status_with_store(backing, cfg, transport_encryption).await
        }
        None => status_with_store(InMemoryStore::new(), cfg, transport_encryption).await,
    }
}

async fn status_with_store<S: Store>(
    backing: S,
    cfg: UninstallConfig,
    transport_encryption: bool,
) -> Result<()> {
    let store = ServiceStateStore::new(backing);
    let tasks = store.list_tasks().await?;
    let framework_id_present = store.get_framework_id().await?.is_some();
    let service_spec = stand_in_service_spec(&cfg, transport_encryption);

    let plan = build_plan(&PlanBuildInput {
        tasks: &tasks,
        service_spec: service_spec.as_ref(),
        secrets_client_configured: cfg.secrets_enabled,
        framework_id_present,
    });
    let manager = PlanManager::new(plan);
    let report = UninstallReport::from_plan(&manager);
    print!("{}", output::render_report(&report));
    Ok(())
}
