/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Execution contexts for submitted operations.
//!
//! The [`Executor`](super::Executor) only needs each operation to run
//! concurrently, eventually, at least once. A [`Spawner`] decides where.

use std::io;
use tokio::runtime::Handle;
use tracing::trace;

/// A unit of work handed to a [`Spawner`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Starts jobs on independent execution contexts.
pub trait Spawner: Send + Sync {
    /// Starts `job`. `name` identifies the job in thread names and logs.
    ///
    /// # Errors
    ///
    /// Returns an error if the job could not be started; the job is dropped
    /// without running.
    fn spawn(&self, name: String, job: Job) -> io::Result<()>;
}

/// Runs every job on its own detached, named OS thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(&self, name: String, job: Job) -> io::Result<()> {
        std::thread::Builder::new().name(name).spawn(job).map(drop)
    }
}

/// Runs jobs on a tokio runtime's blocking pool.
///
/// Jobs block inside `acquire`, so each one occupies a blocking-pool thread
/// until its turn comes and its action finishes.
#[derive(Debug, Clone)]
pub struct TokioBlockingSpawner {
    handle: Handle,
}

impl TokioBlockingSpawner {
    /// Spawns onto the runtime behind `handle`.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Spawns onto the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Spawner for TokioBlockingSpawner {
    fn spawn(&self, name: String, job: Job) -> io::Result<()> {
        trace!(job = %name, "spawning on blocking pool");
        drop(self.handle.spawn_blocking(job));
        Ok(())
    }
}
