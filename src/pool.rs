use crate::error::{Result, ScanError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// 固定大小的任务执行池
///
/// 任务通过有界队列分发给常驻 worker；队列满时 `submit` 挂起，形成
/// 天然的背压。`stop` 关闭队列并等待所有 worker 退出，保证已提交的
/// 任务全部执行完毕。
pub struct WorkerPool {
    jobs: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(num_workers: usize, queue_size: usize) -> Self {
        let (jobs, rx) = mpsc::channel::<Job>(queue_size.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..num_workers.max(1))
            .map(|_| {
                let rx = Arc::clone(&rx);
                tokio::spawn(async move {
                    loop {
                        // 锁只覆盖取任务，不覆盖任务执行
                        let job = rx.lock().await.recv().await;
                        match job {
                            Some(job) => job.await,
                            None => break,
                        }
                    }
                })
            })
            .collect();

        Self { jobs, workers }
    }

    /// 提交一个任务；队列满时等待，池已停止时返回错误
    pub async fn submit<F>(&self, job: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.jobs
            .send(Box::pin(job))
            .await
            .map_err(|_| ScanError::PoolStopped)
    }

    /// 关闭队列并等待所有 worker 排空退出
    pub async fn stop(self) {
        let WorkerPool { jobs, workers } = self;
        drop(jobs);

        for worker in workers {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn stop_drains_every_submitted_job() {
        let pool = WorkerPool::new(4, 8);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            pool.submit(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        pool.stop().await;
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn single_worker_executes_jobs_in_order() {
        let pool = WorkerPool::new(1, 4);
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let order = Arc::clone(&order);
            pool.submit(async move {
                order.lock().await.push(i);
            })
            .await
            .unwrap();
        }

        pool.stop().await;
        assert_eq!(*order.lock().await, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn submission_waits_on_full_queue_instead_of_dropping() {
        // 1 worker, queue of 1: the third submit must wait, not fail
        let pool = WorkerPool::new(1, 1);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            pool.submit(async move {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        pool.stop().await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
