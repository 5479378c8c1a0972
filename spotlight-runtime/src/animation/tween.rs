//! # Tween 模块
//!
//! 补间动画实例：在 `duration` 秒内把一个值从 `from` 变化到 `to`。
//!
//! 补间只关心时间轴，不关心值代表什么；
//! 值的含义由持有者（运动控制器、背景驱动、信息浮层）决定。

use super::{EasingFunction, Lerp};

/// 补间状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenState {
    /// 等待开始（有延迟）
    #[default]
    Pending,
    /// 正在播放
    Playing,
    /// 已完成
    Completed,
    /// 已取消
    Cancelled,
}

impl TweenState {
    /// 是否为活跃状态（需要更新）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Playing)
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// 补间动画
#[derive(Debug, Clone)]
pub struct Tween<T: Lerp> {
    from: T,
    to: T,
    /// 动画时长（秒）
    duration: f32,
    easing: EasingFunction,
    /// 延迟启动（秒）
    delay: f32,
    state: TweenState,
    /// 已应用缓动的进度 (0.0 - 1.0)
    progress: f32,
    /// 播放阶段已经过的时间
    elapsed: f32,
    /// 完成时超出 `duration` 的时间，交给下一段动画继续消耗
    overshoot: f32,
}

impl<T: Lerp> Tween<T> {
    /// 创建补间
    ///
    /// 时长非正或非有限时立即完成。
    pub fn new(from: T, to: T, duration: f32) -> Self {
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        let (state, progress) = if duration <= 0.0 {
            (TweenState::Completed, 1.0)
        } else {
            (TweenState::Pending, 0.0)
        };

        Self {
            from,
            to,
            duration,
            easing: EasingFunction::default(),
            delay: 0.0,
            state,
            progress,
            elapsed: 0.0,
            overshoot: 0.0,
        }
    }

    /// 设置缓动函数
    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// 设置延迟
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        if self.delay > 0.0 && self.state == TweenState::Completed {
            // 零时长但有延迟：延迟结束后才算完成
            self.state = TweenState::Pending;
            self.progress = 0.0;
        }
        self
    }

    /// 推进时间
    ///
    /// # 返回
    /// - `true`: 补间仍在进行中
    /// - `false`: 补间已结束
    pub fn update(&mut self, dt: f32) -> bool {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        match self.state {
            TweenState::Pending => {
                self.elapsed += dt;
                if self.elapsed >= self.delay {
                    self.state = TweenState::Playing;
                    self.elapsed -= self.delay;
                    self.update_playing()
                } else {
                    true
                }
            }
            TweenState::Playing => {
                self.elapsed += dt;
                self.update_playing()
            }
            TweenState::Completed | TweenState::Cancelled => false,
        }
    }

    fn update_playing(&mut self) -> bool {
        if self.elapsed >= self.duration {
            self.overshoot = self.elapsed - self.duration;
            self.progress = 1.0;
            self.state = TweenState::Completed;
            false
        } else {
            self.progress = self.easing.apply(self.elapsed / self.duration);
            true
        }
    }

    /// 取消补间，当前值保持不变
    pub fn cancel(&mut self) {
        if self.state.is_active() {
            self.state = TweenState::Cancelled;
        }
    }

    /// 改变目标值，剩余时长不变
    ///
    /// 新的起点为当前值，用于视口尺寸变化后修正飞行中的路径。
    pub fn retarget(&mut self, to: T) {
        if self.state.is_finished() {
            self.from = self.to;
            self.to = to;
            self.progress = 1.0;
            return;
        }
        let current = self.current_value();
        let remaining = self.remaining();
        self.from = current;
        self.to = to;
        self.duration = remaining;
        self.elapsed = 0.0;
        self.progress = 0.0;
        if self.state == TweenState::Playing && self.duration <= 0.0 {
            self.progress = 1.0;
            self.state = TweenState::Completed;
        }
    }

    /// 剩余时长（不含未消耗的延迟）
    pub fn remaining(&self) -> f32 {
        match self.state {
            TweenState::Pending => self.duration,
            TweenState::Playing => (self.duration - self.elapsed).max(0.0),
            TweenState::Completed | TweenState::Cancelled => 0.0,
        }
    }

    /// 当前值
    pub fn current_value(&self) -> T {
        if self.progress >= 1.0 {
            self.to
        } else {
            self.from.lerp(self.to, self.progress)
        }
    }

    /// 动画时长
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// 当前状态
    pub fn state(&self) -> TweenState {
        self.state
    }

    /// 已应用缓动的进度
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// 完成时超出的时间
    pub fn overshoot(&self) -> f32 {
        self.overshoot
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }
}
