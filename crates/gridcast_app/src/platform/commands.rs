use std::fs;
use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::{bail, Context, Result};
use gridcast_core::{Feature, JobId, JobRequest};
use gridcast_engine::{
    EngineHandle, FileStore, JobApi, KeyValueStore, RecentProjectsStore, ReqwestJobApi,
};
use gridcast_logging::{gc_error, gc_info, gc_warn};
use serde::de::DeserializeOwned;

use super::app::App;
use super::config::ClientConfig;
use super::ui;

pub fn read_request_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Submits one job and follows it until its notification is gone.
pub fn follow_job(
    config: &ClientConfig,
    request: JobRequest,
    project_name: Option<String>,
) -> Result<()> {
    let engine = EngineHandle::new(config.engine_config())?;
    let interrupts = listen_for_interrupts();
    let mut app = App::new(config.core_settings(), engine, open_store(config), io::stdout())
        .with_project_name(project_name);

    app.submit(request)?;
    let summary = app.follow(&interrupts)?;
    app.shutdown();
    if summary.succeeded() {
        gc_info!("Run finished: {:?}", summary);
        return Ok(());
    }
    gc_error!("Run did not succeed: {:?}", summary);
    if summary.detached {
        bail!("stopped following before the job finished")
    } else if summary.started == 0 {
        bail!("submission was not sent")
    } else {
        bail!("job did not complete")
    }
}

pub fn show_status(config: &ClientConfig, feature: Feature, job_id: &str) -> Result<()> {
    let api = ReqwestJobApi::new(&config.api_settings())?;
    let job_id = JobId::new(job_id);
    let update = block_on(api.status(feature, &job_id))?
        .with_context(|| format!("status check for {job_id} failed"))?;
    ui::render::status(&mut io::stdout(), &job_id, &update)?;
    Ok(())
}

pub fn cancel_job(config: &ClientConfig, feature: Feature, job_id: &str) -> Result<()> {
    let api = ReqwestJobApi::new(&config.api_settings())?;
    let job_id = JobId::new(job_id);
    let message = block_on(api.cancel(feature, &job_id))?
        .with_context(|| format!("cancel request for {job_id} failed"))?;
    gc_info!("Cancel requested for {} ({}): {}", job_id, feature, message);
    println!("{message}");
    Ok(())
}

pub fn list_recent(config: &ClientConfig) -> Result<()> {
    let recent = RecentProjectsStore::new(open_store(config)).list()?;
    ui::render::recent_projects(&mut io::stdout(), &recent)?;
    Ok(())
}

pub fn forget_project(config: &ClientConfig, path: &str) -> Result<()> {
    let api = ReqwestJobApi::new(&config.api_settings())?;
    let store = RecentProjectsStore::new(open_store(config));
    let recent = block_on(store.remove(&api, path))?
        .with_context(|| format!("could not forget {path}"))?;
    ui::render::recent_projects(&mut io::stdout(), &recent)?;
    Ok(())
}

fn open_store(config: &ClientConfig) -> Arc<dyn KeyValueStore> {
    Arc::new(FileStore::new(config.state_file.clone()))
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

/// Forwards every Ctrl-C as a unit message.
fn listen_for_interrupts() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                gc_warn!("Ctrl-C handling unavailable: {}", err);
                return;
            }
        };
        runtime.block_on(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                gc_info!("Received Ctrl-C");
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
    });
    rx
}
