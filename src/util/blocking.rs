// This file is part of propdesk, the project listing admin service.
// SPDX-FileCopyrightText: 2026 The propdesk contributors
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Bounded execution of filesystem-heavy project pipelines off the async workers.
//!
//! Every save spools, moves and deletes files and rewrites a YAML record, so the number of
//! pipelines in flight is capped. A small overflow reserve absorbs bursts; past that the
//! caller gets [`BlockingErrorKind::Busy`] and is expected to retry.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingErrorKind {
    Busy,
    Internal,
}

#[derive(Debug)]
pub struct BlockingError {
    operation: &'static str,
    message: String,
    kind: BlockingErrorKind,
}

impl BlockingError {
    fn busy(operation: &'static str, capacity: usize) -> Self {
        Self {
            operation,
            message: format!("all {} pipeline slot(s) in use", capacity),
            kind: BlockingErrorKind::Busy,
        }
    }

    pub fn kind(&self) -> BlockingErrorKind {
        self.kind
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

impl fmt::Display for BlockingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.message)
    }
}

impl Error for BlockingError {}

#[derive(Clone)]
pub struct BlockingPool {
    regular: Arc<Semaphore>,
    overflow: Arc<Semaphore>,
    capacity: usize,
}

impl BlockingPool {
    pub fn new(regular: usize, overflow: usize) -> Self {
        Self {
            regular: Arc::new(Semaphore::new(regular)),
            overflow: Arc::new(Semaphore::new(overflow)),
            capacity: regular + overflow,
        }
    }

    /// Sizes the pool from `upload.max_concurrent_saves`, reserving a quarter on top for bursts.
    pub fn for_saves(max_concurrent_saves: usize) -> Self {
        let regular = max_concurrent_saves.max(1);
        Self::new(regular, (regular / 4).max(1))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn acquire(&self, operation: &'static str) -> Result<OwnedSemaphorePermit, BlockingError> {
        if let Ok(permit) = self.regular.clone().try_acquire_owned() {
            return Ok(permit);
        }
        match self.overflow.clone().try_acquire_owned() {
            Ok(permit) => {
                log::warn!("Save pipelines saturated; {} runs on overflow", operation);
                Ok(permit)
            }
            Err(_) => Err(BlockingError::busy(operation, self.capacity)),
        }
    }

    /// Runs `task` on the blocking threads. Saturation and a panicking task surface through the
    /// caller's own error type.
    pub async fn run<T, E, F>(&self, operation: &'static str, task: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<BlockingError> + Send + 'static,
    {
        let permit = self.acquire(operation)?;
        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            task()
        })
        .await;
        match joined {
            Ok(result) => result,
            Err(err) => Err(E::from(BlockingError {
                operation,
                message: format!("pipeline task failed: {}", err),
                kind: BlockingErrorKind::Internal,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum Outcome {
        Pool(BlockingErrorKind),
        Task(&'static str),
    }

    impl From<BlockingError> for Outcome {
        fn from(err: BlockingError) -> Self {
            Outcome::Pool(err.kind())
        }
    }

    #[tokio::test]
    async fn saturated_pool_reports_busy() {
        let pool = BlockingPool::new(1, 0);
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        let (hold_tx, hold_rx) = std::sync::mpsc::channel::<()>();
        let holder = pool.clone();

        let held = tokio::spawn(async move {
            holder
                .run("hold", move || -> Result<(), Outcome> {
                    let _ = ready_tx.send(());
                    let _ = hold_rx.recv();
                    Ok(())
                })
                .await
        });

        ready_rx.await.expect("ready signal");
        let err = pool
            .run("second", || -> Result<(), Outcome> { Ok(()) })
            .await
            .expect_err("expected busy");
        assert!(matches!(err, Outcome::Pool(BlockingErrorKind::Busy)));

        let _ = hold_tx.send(());
        assert!(held.await.expect("join").is_ok());
    }

    #[tokio::test]
    async fn task_errors_pass_through_unchanged() {
        let pool = BlockingPool::new(1, 0);
        assert_eq!(pool.run("answer", || Ok::<_, Outcome>(42)).await.expect("value"), 42);
        let err = pool
            .run("refuse", || Err::<(), _>(Outcome::Task("refused")))
            .await
            .expect_err("task error");
        assert!(matches!(err, Outcome::Task("refused")));
    }

    #[tokio::test]
    async fn panicking_task_is_internal() {
        let pool = BlockingPool::new(1, 0);
        let err = pool
            .run("explode", || -> Result<(), Outcome> { panic!("boom") })
            .await
            .expect_err("panic");
        assert!(matches!(err, Outcome::Pool(BlockingErrorKind::Internal)));
        assert!(pool.run("after", || Ok::<_, Outcome>(())).await.is_ok());
    }

    #[test]
    fn save_pool_reserves_overflow() {
        assert_eq!(BlockingPool::for_saves(8).capacity(), 10);
        assert_eq!(BlockingPool::for_saves(0).capacity(), 2);
    }
}
