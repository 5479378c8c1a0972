//! # Background 模块
//!
//! 背景车辆的无限漂移循环。
//!
//! 每一轮：随机入场点 → 随机弯曲的中点 → 随机离场点，匀速走完两段，
//! 间隔片刻后用新的随机点重新开始。背景车辆不产生阶段事件，
//! 也不与聚光调度或信息浮层交互。
//!
//! 循环是可取消的任务：每一帧以及每一轮重新开始之前都会检查 [`CancelToken`]。
//! 视口尺寸变化时，本轮路径的两端沿原来的边重新定位，不会留在新视口内。

use std::cell::Cell;
use std::rc::Rc;

use rand::Rng;
use tracing::trace;

use crate::animation::{EasingFunction, Point, Tween, VisualState};
use crate::config::{BackgroundConfig, ShowcaseConfig};
use crate::geometry::{Edge, EdgePoint, ViewportGeometry};
use crate::item::ShowcaseItem;

/// 取消令牌
///
/// 克隆共享同一个标志，任一处取消后所有持有者都能看到。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    /// 创建未取消的令牌
    pub fn new() -> Self {
        Self::default()
    }

    /// 取消
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// 是否已取消
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// 漂移循环阶段
#[derive(Debug, Clone)]
enum LoopStage {
    /// 尚未开始第一轮
    Idle,
    /// 沿路径第 `segment` 段运动
    Travelling {
        segment: usize,
        tween: Tween<Point>,
    },
    /// 两轮之间的间隔
    Resting { remaining: f32 },
    /// 已取消，不再更新
    Stopped,
}

/// 背景漂移驱动
#[derive(Debug, Clone)]
pub struct BackgroundLoopDriver {
    /// 槽位序号
    slot: usize,
    item: ShowcaseItem,
    stage: LoopStage,
    /// 本轮路径：起点、中点、终点
    path: [Point; 3],
    /// 本轮入场点与离场点
    ends: [EdgePoint; 2],
    visual: VisualState,
    iterations: u64,
    token: CancelToken,
    settings: BackgroundConfig,
    edge_margin: f32,
}

impl BackgroundLoopDriver {
    /// 创建驱动，第一次 `update` 时开始第一轮
    pub fn new(
        slot: usize,
        item: ShowcaseItem,
        config: &ShowcaseConfig,
        token: CancelToken,
    ) -> Self {
        let origin = EdgePoint {
            edge: Edge::Top,
            point: Point::zero(),
        };
        Self {
            slot,
            item,
            stage: LoopStage::Idle,
            path: [Point::zero(); 3],
            ends: [origin; 2],
            visual: VisualState::default(),
            iterations: 0,
            token,
            settings: config.background.clone(),
            edge_margin: config.geometry.edge_margin,
        }
    }

    /// 推进时间
    ///
    /// 视口不可测量时保持不动，等待可用尺寸。
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, viewport: &ViewportGeometry, rng: &mut R) {
        if self.token.is_cancelled() {
            self.stage = LoopStage::Stopped;
            return;
        }
        if !viewport.is_measurable() {
            return;
        }

        let mut remaining = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        // 单帧内最多重开的轮数，防止零时长配置下空转
        let mut restarts = 0;

        loop {
            match &mut self.stage {
                LoopStage::Stopped => return,
                LoopStage::Idle => {
                    if !self.begin_iteration(viewport, rng) {
                        return;
                    }
                    restarts += 1;
                }
                LoopStage::Travelling { segment, tween } => {
                    let running = tween.update(remaining);
                    self.visual.position = tween.current_value();
                    if running {
                        return;
                    }
                    remaining = tween.overshoot();

                    let next = *segment + 1;
                    if next < self.path.len() {
                        let duration = self.settings.segment_duration.sample(rng);
                        self.stage = LoopStage::Travelling {
                            segment: next,
                            tween: segment_tween(self.path[next - 1], self.path[next], duration),
                        };
                    } else {
                        self.stage = LoopStage::Resting {
                            remaining: self.settings.loop_gap,
                        };
                    }
                }
                LoopStage::Resting { remaining: rest } => {
                    if remaining < *rest {
                        *rest -= remaining;
                        return;
                    }
                    remaining -= *rest;
                    if restarts >= 2 || !self.begin_iteration(viewport, rng) {
                        return;
                    }
                    restarts += 1;
                }
            }
        }
    }

    /// 开始新一轮，令牌已取消时返回 `false`
    fn begin_iteration<R: Rng + ?Sized>(
        &mut self,
        viewport: &ViewportGeometry,
        rng: &mut R,
    ) -> bool {
        if self.token.is_cancelled() {
            self.stage = LoopStage::Stopped;
            return false;
        }

        let entry = EdgePoint::random(viewport, self.edge_margin, rng);
        let exit = EdgePoint::random(viewport, self.edge_margin, rng);
        let start = entry.point;
        self.ends = [entry, exit];
        self.path = curved_path(start, exit.point, viewport, &self.settings, rng);

        self.visual = VisualState::new(
            start,
            self.settings.scale.sample(rng),
            self.settings.blur,
            self.settings.opacity.sample(rng),
        );

        let duration = self.settings.segment_duration.sample(rng);
        self.stage = LoopStage::Travelling {
            segment: 1,
            tween: segment_tween(self.path[0], self.path[1], duration),
        };
        self.iterations += 1;

        trace!(
            slot = self.slot,
            iteration = self.iterations,
            "背景车辆开始新一轮"
        );
        true
    }

    /// 视口尺寸变化
    ///
    /// 两端在同一条边、相同沿边比例处重新定位，中点按比例缩放；
    /// 正在进行的一段改为飞向新位置，剩余时间不变。
    pub fn on_resize(&mut self, old: &ViewportGeometry, new: &ViewportGeometry) {
        if self.token.is_cancelled() || self.iterations == 0 {
            return;
        }
        if !old.is_measurable() || !new.is_measurable() {
            return;
        }

        let margin = self.edge_margin;
        let [entry, exit] = self.ends.map(|end| end.relocate(old, new, margin));
        let mid = self.path[1];
        let mut mid = Point::new(
            mid.x / old.width * new.width,
            mid.y / old.height * new.height,
        );
        if self.settings.clamp_midpoint {
            mid = new.clamp(mid);
        }
        self.ends = [entry, exit];
        self.path = [entry.point, mid, exit.point];

        match &mut self.stage {
            LoopStage::Travelling { segment, tween } => {
                tween.retarget(self.path[*segment]);
                self.visual.position = tween.current_value();
            }
            LoopStage::Resting { .. } => self.visual.position = exit.point,
            LoopStage::Idle | LoopStage::Stopped => {}
        }
    }

    /// 槽位序号
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// 显示的车辆
    pub fn item(&self) -> &ShowcaseItem {
        &self.item
    }

    /// 当前视觉状态
    pub fn visual(&self) -> VisualState {
        self.visual
    }

    /// 本轮路径
    pub fn path(&self) -> [Point; 3] {
        self.path
    }

    /// 已开始的轮数
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// 是否已停止
    pub fn is_stopped(&self) -> bool {
        matches!(self.stage, LoopStage::Stopped)
    }
}

fn segment_tween(from: Point, to: Point, duration: f32) -> Tween<Point> {
    Tween::new(from, to, duration).with_easing(EasingFunction::Linear)
}

/// 构造三点弯曲路径
///
/// 中点在两端中点附近随机偏移，偏移幅度取自 `curve_variation`。
/// `clamp_midpoint` 打开时中点会被限制在视口内。
fn curved_path<R: Rng + ?Sized>(
    start: Point,
    end: Point,
    viewport: &ViewportGeometry,
    settings: &BackgroundConfig,
    rng: &mut R,
) -> [Point; 3] {
    let variation = settings.curve_variation.sample(rng);
    let base = start.midpoint(end);
    let mut mid = Point::new(
        base.x + (rng.random::<f32>() - 0.5) * variation,
        base.y + (rng.random::<f32>() - 0.5) * variation,
    );
    if settings.clamp_midpoint {
        mid = viewport.clamp(mid);
    }
    [start, mid, end]
}
