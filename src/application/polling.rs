//! Poll Scheduler - 可取消的周期任务
//!
//! `PollHandle` 封装一个按固定周期执行的后台任务：
//! - 第一次 tick 在启动一个周期之后触发
//! - 每次 tick 的回调执行完毕后才等待下一次 tick，回调不会重叠
//! - 回调耗时超过周期时，错过的 tick 被丢弃（`MissedTickBehavior::Skip`）
//! - `cancel` 幂等，重复调用无副作用

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// 轮询任务句柄
///
/// 丢弃句柄等同于取消
#[derive(Debug)]
pub struct PollHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// 启动轮询
    ///
    /// `tick` 返回 `ControlFlow::Break` 时轮询结束
    pub fn start<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        // interval 不接受零周期
        let period = period.max(Duration::from_millis(1));
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks: u64 = 0;

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {}
                }
                ticks += 1;

                // 进行中的请求同样可以被取消
                let flow = tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    flow = tick() => flow,
                };
                if flow.is_break() {
                    break;
                }
            }

            tracing::debug!(ticks = ticks, "Poll loop stopped");
        });

        Self { token, task }
    }

    /// 取消轮询
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// 轮询是否仍在运行
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
