use std::sync::{Arc, OnceLock};

use futures::{executor::ThreadPool, task::Spawn};
use serde::{Deserialize, Serialize};

use crate::{Error, Model, Store};

#[cfg(test)]
mod tests;

const DEFAULT_THREAD_NAME_PREFIX: &str = "uniflow-effect-";

static SHARED_POOL: OnceLock<ThreadPool> = OnceLock::new();

/// Settings of a [`Store`].
///
/// Every field has a default, so a partial document deserializes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of threads of a pool dedicated to this store.
    ///
    /// `None` runs effects on a pool shared by every store of the process.
    pub worker_threads: Option<usize>,

    /// Name prefix of the dedicated pool's threads. Ignored for the shared pool.
    pub thread_name_prefix: String,

    /// Emit a `debug` event for every action sent to the store.
    pub log_actions: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            log_actions: true,
        }
    }
}

/// Builder returned by [`Store::builder`].
pub struct StoreBuilder<M: Model> {
    state: M,
    env: M::Environment,
    config: StoreConfig,
    spawner: Option<Arc<dyn Spawn + Send + Sync>>,
}

impl<M> StoreBuilder<M>
where
    M: Model + Send + 'static,
    M::Action: std::fmt::Debug,
    M::Environment: Send + Sync + 'static,
{
    pub(crate) fn new(state: M, env: M::Environment) -> Self {
        Self {
            state,
            env,
            config: StoreConfig::default(),
            spawner: None,
        }
    }

    /// Replaces all settings.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn worker_threads(mut self, n: usize) -> Self {
        self.config.worker_threads = Some(n);
        self
    }

    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn log_actions(mut self, log_actions: bool) -> Self {
        self.config.log_actions = log_actions;
        self
    }

    /// Runs effects on `spawner` instead of a thread pool.
    ///
    /// Takes precedence over `worker_threads`.
    pub fn spawner(mut self, spawner: impl Spawn + Send + Sync + 'static) -> Self {
        self.spawner = Some(Arc::new(spawner));
        self
    }

    pub fn build(self) -> Result<Store<M>, Error> {
        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => Arc::new(thread_pool(&self.config)?),
        };
        Ok(Store::from_parts(
            self.state,
            self.env,
            spawner,
            self.config.log_actions,
        ))
    }
}

fn thread_pool(config: &StoreConfig) -> Result<ThreadPool, Error> {
    match config.worker_threads {
        Some(0) => Err(Error::ZeroWorkerThreads),
        Some(n) => ThreadPool::builder()
            .pool_size(n)
            .name_prefix(config.thread_name_prefix.clone())
            .create()
            .map_err(Error::Executor),
        None => shared_pool(),
    }
}

fn shared_pool() -> Result<ThreadPool, Error> {
    if let Some(pool) = SHARED_POOL.get() {
        return Ok(pool.clone());
    }
    let pool = ThreadPool::builder()
        .name_prefix(DEFAULT_THREAD_NAME_PREFIX)
        .create()
        .map_err(Error::Executor)?;
    Ok(SHARED_POOL.get_or_init(|| pool).clone())
}
