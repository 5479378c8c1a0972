//! # Timer 模块
//!
//! 基于模拟时间的一次性定时器队列。
//!
//! 宿主每帧调用 [`Scheduler::advance`]，到期的定时器按到期时间顺序返回，
//! 并附带到期后已经过去的时间，调用方据此补足帧内剩余的时间。
//! 卸载时 [`Scheduler::cancel_all`] 清空队列，之后不会再有任何定时器触发。

/// 定时器 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Timer<K> {
    id: TimerId,
    /// 到期时刻（调度器时钟）
    due: f64,
    payload: K,
}

/// 已触发的定时器
#[derive(Debug, Clone)]
pub struct Fired<K> {
    pub id: TimerId,
    pub payload: K,
    /// 到期时刻之后已经过去的时间（秒）
    pub late: f32,
}

/// 定时器队列
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    /// 调度器时钟（秒）
    now: f64,
    timers: Vec<Timer<K>>,
    next_id: u64,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Scheduler<K> {
    /// 创建空队列
    pub fn new() -> Self {
        Self {
            now: 0.0,
            timers: Vec::new(),
            next_id: 1,
        }
    }

    /// 在 `delay` 秒后触发 `payload`
    pub fn schedule(&mut self, delay: f32, payload: K) -> TimerId {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        self.schedule_at(self.now + f64::from(delay), payload)
    }

    /// 在时钟到达 `due` 时触发 `payload`
    ///
    /// `due` 早于当前时钟时，下一次 [`advance`](Self::advance) 立即触发。
    pub fn schedule_at(&mut self, due: f64, payload: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = if due.is_finite() { due } else { self.now };
        self.timers.push(Timer { id, due, payload });
        id
    }

    /// 取消定时器，返回是否确实取消了一个等待中的定时器
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// 取消所有定时器
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// 推进时钟，返回到期的定时器（按到期时间、再按创建顺序）
    pub fn advance(&mut self, dt: f32) -> Vec<Fired<K>> {
        if dt.is_finite() && dt > 0.0 {
            self.now += f64::from(dt);
        }
        let now = self.now;

        let mut due = Vec::new();
        let mut index = 0;
        while index < self.timers.len() {
            if self.timers[index].due <= now {
                due.push(self.timers.swap_remove(index));
            } else {
                index += 1;
            }
        }
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        due.into_iter()
            .map(|t| Fired {
                id: t.id,
                payload: t.payload,
                late: (now - t.due).max(0.0) as f32,
            })
            .collect()
    }

    /// 定时器是否仍在等待
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// 等待中的定时器数量
    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }

    /// 调度器时钟
    pub fn now(&self) -> f64 {
        self.now
    }
}
