//! Background Worker - 콜백 기반 백그라운드 작업
//!
//! 검색/다운로드처럼 오래 걸리는 I/O를 발행자 스레드 밖에서 실행합니다.
//!
//! ## 콜백 스레드 규약
//!
//! - [`BackgroundWorker::spawn`]: 콜백은 **작업을 실행한 worker 스레드**에서 호출됩니다.
//!   소유 스레드(UI 등)로 되돌리는 것은 호출자 책임입니다.
//! - [`BackgroundWorker::spawn_to_owner`]: 결과를 [`CompletionQueue`]에 넣고,
//!   소유 스레드가 `drain()` / `try_next()`로 꺼내 처리합니다.
//!
//! 취소는 지원하지 않습니다. 시작된 작업은 완료 또는 실패까지 실행됩니다.

use crate::error::{panic_message, Error, Result};
use std::panic::{self, AssertUnwindSafe};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

// ============================================================================
// Completion
// ============================================================================

/// 완료된 작업 결과
#[derive(Debug)]
pub struct Completion<T> {
    /// 작업 이름
    pub name: String,

    /// 결과
    pub result: Result<T>,
}

/// 소유 스레드가 비우는 완료 큐
pub struct CompletionQueue<T> {
    sender: mpsc::UnboundedSender<Completion<T>>,
    receiver: mpsc::UnboundedReceiver<Completion<T>>,
}

impl<T> CompletionQueue<T> {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// worker에 넘길 송신자
    pub fn sender(&self) -> CompletionSender<T> {
        CompletionSender {
            inner: self.sender.clone(),
        }
    }

    /// 완료된 결과 하나 꺼내기 (없으면 None, 블로킹 안 함)
    pub fn try_next(&mut self) -> Option<Completion<T>> {
        self.receiver.try_recv().ok()
    }

    /// 현재까지 완료된 결과 전부 꺼내기
    pub fn drain(&mut self) -> Vec<Completion<T>> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// 다음 완료까지 대기
    pub async fn next(&mut self) -> Option<Completion<T>> {
        self.receiver.recv().await
    }
}

impl<T> Default for CompletionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// 완료 큐 송신자
pub struct CompletionSender<T> {
    inner: mpsc::UnboundedSender<Completion<T>>,
}

impl<T> Clone for CompletionSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

// ============================================================================
// BackgroundWorker
// ============================================================================

/// 백그라운드 작업 실행기 (tokio blocking pool 사용)
#[derive(Clone)]
pub struct BackgroundWorker {
    runtime: Handle,
}

impl BackgroundWorker {
    /// 현재 tokio 런타임에 연결
    pub fn current() -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| Error::NoAsyncRuntime)?;
        Ok(Self { runtime })
    }

    /// 작업 실행 후 **같은 worker 스레드에서** 콜백 호출
    pub fn spawn<T, J, C>(&self, name: impl Into<String>, job: J, callback: C) -> JoinHandle<()>
    where
        T: Send + 'static,
        J: FnOnce() -> Result<T> + Send + 'static,
        C: FnOnce(Result<T>) + Send + 'static,
    {
        let name = name.into();
        self.runtime.spawn_blocking(move || {
            let result = run_job(&name, job);
            if panic::catch_unwind(AssertUnwindSafe(|| callback(result))).is_err() {
                error!(job = %name, "Completion callback panicked");
            }
        })
    }

    /// 작업 실행 후 결과를 완료 큐로 전달 (소유 스레드에서 처리)
    pub fn spawn_to_owner<T, J>(
        &self,
        name: impl Into<String>,
        job: J,
        sender: CompletionSender<T>,
    ) -> JoinHandle<()>
    where
        T: Send + 'static,
        J: FnOnce() -> Result<T> + Send + 'static,
    {
        let name = name.into();
        self.runtime.spawn_blocking(move || {
            let result = run_job(&name, job);
            if sender.inner.send(Completion { name: name.clone(), result }).is_err() {
                debug!(job = %name, "Completion queue dropped before delivery");
            }
        })
    }
}

fn run_job<T, J>(name: &str, job: J) -> Result<T>
where
    J: FnOnce() -> Result<T>,
{
    debug!(job = %name, "Background job started");
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!(job = %name, "Background job failed: {}", e);
            Err(e)
        }
        Err(payload) => {
            let message = panic_message(&*payload);
            error!(job = %name, "Background job panicked: {}", message);
            Err(Error::Worker(format!("{} panicked: {}", name, message)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_callback_runs_on_worker_thread() {
        let worker = BackgroundWorker::current().unwrap();
        let caller = std::thread::current().id();
        let seen = Arc::new(Mutex::new(None));

        let seen_in_callback = Arc::clone(&seen);
        worker
            .spawn(
                "search",
                || Ok(7),
                move |result: Result<i32>| {
                    *seen_in_callback.lock().unwrap() =
                        Some((std::thread::current().id(), result.unwrap()));
                },
            )
            .await
            .unwrap();

        let (thread, value) = seen.lock().unwrap().take().unwrap();
        assert_eq!(value, 7);
        assert_ne!(thread, caller);
    }

    #[tokio::test]
    async fn test_spawn_to_owner_delivers_results() {
        let worker = BackgroundWorker::current().unwrap();
        let mut queue = CompletionQueue::new();

        worker
            .spawn_to_owner("download", || Ok("dataset.csv".to_string()), queue.sender())
            .await
            .unwrap();
        worker
            .spawn_to_owner(
                "broken",
                || Err(Error::Worker("network down".into())),
                queue.sender(),
            )
            .await
            .unwrap();

        let completions = queue.drain();
        assert_eq!(completions.len(), 2);
        assert_eq!(completions[0].name, "download");
        assert_eq!(completions[0].result.as_ref().unwrap(), "dataset.csv");
        assert!(completions[1].result.is_err());
        assert!(queue.try_next().is_none());
    }

    #[tokio::test]
    async fn test_job_panic_becomes_error() {
        let worker = BackgroundWorker::current().unwrap();
        let mut queue = CompletionQueue::<()>::new();

        worker
            .spawn_to_owner("explode", || panic!("kaboom"), queue.sender())
            .await
            .unwrap();

        let completion = queue.next().await.unwrap();
        assert!(matches!(completion.result, Err(Error::Worker(msg)) if msg.contains("kaboom")));
    }

    #[test]
    fn test_current_without_runtime() {
        assert!(matches!(BackgroundWorker::current(), Err(Error::NoAsyncRuntime)));
    }
}
