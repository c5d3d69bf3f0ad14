use std::time::Duration;
use sysinfo::System;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// 内存治理器：后台周期采样，超过上限时发出警告并触发回收回调
///
/// 软性缓解：从不终止进程或中断扫描。`stop` 之后不再采样。
pub struct MemoryGovernor {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl MemoryGovernor {
    /// 仅告警，不挂接回收动作
    pub fn start(max_memory_bytes: u64, interval: Duration) -> Self {
        Self::with_reclaim(max_memory_bytes, interval, || {})
    }

    /// 超限时额外调用 `reclaim`，调用方可以挂接如 `Scanner::clear_cache`
    pub fn with_reclaim<F>(max_memory_bytes: u64, interval: Duration, reclaim: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (stop, mut stopped) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut system = System::new();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // 第一个 tick 立即返回，跳过它使采样从一个完整周期后开始
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        system.refresh_memory();
                        let used = system.used_memory();
                        if used > max_memory_bytes {
                            tracing::warn!(
                                used_bytes = used,
                                limit_bytes = max_memory_bytes,
                                "memory usage exceeds limit, requesting reclamation"
                            );
                            reclaim();
                        }
                    }
                    _ = stopped.changed() => break,
                }
            }
        });

        Self { stop, handle }
    }

    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.handle.await;
    }
}
