//! # Motion 模块
//!
//! 单辆聚光车辆的运动控制器。
//!
//! ## 状态机
//!
//! ```text
//! Entering ──到达中心──► Centered ──► Holding ──停留结束──► Exiting ──► Finished
//!    │                      │                                   │
//!    │               ReachedCenter                        CycleComplete
//! ```
//!
//! - 每次阶段切换都会产生 `PhaseChanged` 事件，阶段只能前进，不会跳过或重复
//! - `Centered` 是瞬时阶段：到达中心的同一帧内发出 `ReachedCenter` 并进入 `Holding`
//! - 一帧内多余的时间会继续用于下一阶段，帧率不影响周期总时长

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::{Tween, VisualState};
use crate::config::{FeaturedConfig, ShowcaseConfig};
use crate::error::ShowcaseResult;
use crate::geometry::{EdgePoint, ViewportGeometry};
use crate::item::{ShowcaseItem, ShowcaseMetadata};

/// 聚光车辆的运动阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPhase {
    /// 从边缘飞向中心
    Entering,
    /// 刚到达中心
    Centered,
    /// 居中停留，浮层可见
    Holding,
    /// 飞向边缘离场
    Exiting,
    /// 周期结束，控制器等待丢弃
    Finished,
}

impl MotionPhase {
    /// 该阶段是否允许显示信息浮层
    pub fn shows_metadata(&self) -> bool {
        matches!(self, Self::Centered | Self::Holding)
    }
}

/// 运动控制器事件
#[derive(Debug, Clone, PartialEq)]
pub enum MotionEvent {
    /// 进入新阶段
    PhaseChanged(MotionPhase),
    /// 到达中心，携带浮层信息
    ReachedCenter(ShowcaseMetadata),
    /// 离场完成，携带本次推进中未消耗的时间
    CycleComplete { leftover: f32 },
}

/// 聚光车辆运动控制器
#[derive(Debug, Clone)]
pub struct MotionController {
    item: ShowcaseItem,
    phase: MotionPhase,
    visual: VisualState,
    tween: Tween<VisualState>,
    /// 剩余停留时间
    hold_remaining: f32,
    entry: EdgePoint,
    exit: Option<EdgePoint>,
    /// 最近一次应用的视口尺寸
    viewport: ViewportGeometry,
    settings: FeaturedConfig,
    edge_margin: f32,
    half_extent: f32,
}

impl MotionController {
    /// 开始一个聚光周期
    ///
    /// 车辆被放到随机边缘外侧，缩小、模糊、半透明，然后飞向中心。
    /// 视口不可测量时返回错误，调用方应推迟启动。
    pub fn start<R: Rng + ?Sized>(
        item: ShowcaseItem,
        viewport: &ViewportGeometry,
        config: &ShowcaseConfig,
        rng: &mut R,
    ) -> ShowcaseResult<Self> {
        viewport.ensure_measurable()?;

        let settings = config.featured.clone();
        let edge_margin = config.geometry.edge_margin;
        let half_extent = config.geometry.half_extent;

        let entry = EdgePoint::random(viewport, edge_margin, rng);
        let visual = VisualState::new(
            entry.point,
            settings.offscreen_scale,
            settings.offscreen_blur,
            settings.entry_opacity,
        );
        let duration = settings.entry_duration.sample(rng);
        let target = center_state(viewport, &settings, half_extent);
        let tween = Tween::new(visual, target, duration).with_easing(settings.easing);

        debug!(
            item = item.id,
            edge = ?entry.edge,
            duration = duration,
            "聚光车辆入场"
        );

        Ok(Self {
            item,
            phase: MotionPhase::Entering,
            visual,
            tween,
            hold_remaining: 0.0,
            entry,
            exit: None,
            viewport: *viewport,
            settings,
            edge_margin,
            half_extent,
        })
    }

    /// 推进时间
    ///
    /// 返回本帧产生的事件，顺序与阶段顺序一致。
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> Vec<MotionEvent> {
        let mut events = Vec::new();
        let mut remaining = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        loop {
            match self.phase {
                MotionPhase::Entering => {
                    let Some(leftover) = self.step_tween(remaining) else {
                        break;
                    };
                    remaining = leftover;
                    self.arrive(&mut events);
                }
                MotionPhase::Centered => {
                    self.begin_hold(&mut events);
                }
                MotionPhase::Holding => {
                    if remaining < self.hold_remaining {
                        self.hold_remaining -= remaining;
                        break;
                    }
                    remaining -= self.hold_remaining;
                    self.hold_remaining = 0.0;
                    self.begin_exit(rng, &mut events);
                }
                MotionPhase::Exiting => {
                    let Some(leftover) = self.step_tween(remaining) else {
                        break;
                    };
                    self.finish(leftover, &mut events);
                    break;
                }
                MotionPhase::Finished => break,
            }
        }

        events
    }

    /// 推进当前补间，结束时返回未消耗的时间
    fn step_tween(&mut self, dt: f32) -> Option<f32> {
        if self.tween.is_finished() {
            self.visual = self.tween.current_value();
            return Some(dt);
        }
        let running = self.tween.update(dt);
        self.visual = self.tween.current_value();
        if running {
            None
        } else {
            Some(self.tween.overshoot())
        }
    }

    /// Entering → Centered
    fn arrive(&mut self, events: &mut Vec<MotionEvent>) {
        self.phase = MotionPhase::Centered;
        self.visual = center_state(&self.viewport, &self.settings, self.half_extent);
        events.push(MotionEvent::PhaseChanged(MotionPhase::Centered));
        events.push(MotionEvent::ReachedCenter(self.item.metadata()));
        debug!(item = self.item.id, "聚光车辆到达中心");
        self.begin_hold(events);
    }

    /// Centered → Holding
    fn begin_hold(&mut self, events: &mut Vec<MotionEvent>) {
        self.phase = MotionPhase::Holding;
        self.hold_remaining = self.settings.dwell;
        events.push(MotionEvent::PhaseChanged(MotionPhase::Holding));
    }

    /// Holding → Exiting
    ///
    /// 离场边缘独立随机，可能与入场边缘相同。
    fn begin_exit<R: Rng + ?Sized>(&mut self, rng: &mut R, events: &mut Vec<MotionEvent>) {
        let exit = EdgePoint::random(&self.viewport, self.edge_margin, rng);
        let duration = self.settings.exit_duration.sample(rng);
        let target = self.exit_state(&exit);
        self.tween = Tween::new(self.visual, target, duration).with_easing(self.settings.easing);
        self.exit = Some(exit);
        self.phase = MotionPhase::Exiting;
        events.push(MotionEvent::PhaseChanged(MotionPhase::Exiting));
        debug!(
            item = self.item.id,
            edge = ?exit.edge,
            duration = duration,
            "聚光车辆离场"
        );
    }

    /// Exiting → Finished
    fn finish(&mut self, leftover: f32, events: &mut Vec<MotionEvent>) {
        self.phase = MotionPhase::Finished;
        events.push(MotionEvent::PhaseChanged(MotionPhase::Finished));
        events.push(MotionEvent::CycleComplete { leftover });
    }

    fn exit_state(&self, exit: &EdgePoint) -> VisualState {
        VisualState::new(
            exit.point,
            self.settings.offscreen_scale,
            self.settings.offscreen_blur,
            self.settings.exit_opacity,
        )
    }

    /// 视口尺寸变化
    ///
    /// - Entering：改为飞向新中心，剩余时间不变
    /// - Holding：直接移到新中心
    /// - Exiting：在同一条边、相同比例处重新计算离场点
    ///
    /// 不可测量的尺寸会被忽略。
    pub fn on_resize(&mut self, viewport: &ViewportGeometry) {
        if !viewport.is_measurable() {
            return;
        }
        let old = self.viewport;
        self.viewport = *viewport;

        match self.phase {
            MotionPhase::Entering => {
                self.entry = self.entry.relocate(&old, viewport, self.edge_margin);
                self.tween
                    .retarget(center_state(viewport, &self.settings, self.half_extent));
                self.visual = self.tween.current_value();
            }
            MotionPhase::Centered | MotionPhase::Holding => {
                self.visual = self.visual.at(viewport.center(self.half_extent));
            }
            MotionPhase::Exiting => {
                if let Some(exit) = self.exit {
                    let moved = exit.relocate(&old, viewport, self.edge_margin);
                    let target = self.exit_state(&moved);
                    self.tween.retarget(target);
                    self.visual = self.tween.current_value();
                    self.exit = Some(moved);
                }
            }
            MotionPhase::Finished => {}
        }
    }

    /// 停止所有补间（卸载时调用）
    pub fn cancel(&mut self) {
        self.tween.cancel();
    }

    /// 当前阶段
    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// 当前视觉状态
    pub fn visual(&self) -> VisualState {
        self.visual
    }

    /// 正在展示的车辆
    pub fn item(&self) -> &ShowcaseItem {
        &self.item
    }

    /// 入场边缘点
    pub fn entry(&self) -> EdgePoint {
        self.entry
    }

    /// 离场边缘点（进入 Exiting 后才确定）
    pub fn exit(&self) -> Option<EdgePoint> {
        self.exit
    }

    /// 当前补间的总时长
    pub fn tween_duration(&self) -> f32 {
        self.tween.duration()
    }

    /// 剩余停留时间
    pub fn hold_remaining(&self) -> f32 {
        self.hold_remaining
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        self.phase == MotionPhase::Finished
    }
}

fn center_state(
    viewport: &ViewportGeometry,
    settings: &FeaturedConfig,
    half_extent: f32,
) -> VisualState {
    VisualState::new(
        viewport.center(half_extent),
        settings.center_scale,
        0.0,
        1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ShowcasePool;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const VIEWPORT: ViewportGeometry = ViewportGeometry::new(800.0, 600.0);
    const FRAME: f32 = 1.0 / 60.0;

    fn item() -> ShowcaseItem {
        ShowcasePool::builtin().featured()[0].clone()
    }

    fn run_to_completion(controller: &mut MotionController, rng: &mut StdRng) -> Vec<MotionEvent> {
        let mut events = Vec::new();
        for _ in 0..(60 * 20) {
            events.extend(controller.update(FRAME, rng));
            if controller.is_finished() {
                break;
            }
        }
        events
    }

    #[test]
    fn test_start_offscreen() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = ShowcaseConfig::default();
        let controller = MotionController::start(item(), &VIEWPORT, &config, &mut rng).unwrap();

        assert_eq!(controller.phase(), MotionPhase::Entering);
        let visual = controller.visual();
        assert!(VIEWPORT.outside_distance(visual.position) >= 100.0 - 1e-3);
        assert_eq!(visual.scale, 0.7);
        assert_eq!(visual.blur, 4.0);
        assert_eq!(visual.opacity, 0.8);
        let entry = &config.featured.entry_duration;
        assert!(entry.contains(controller.tween_duration()));
    }

    #[test]
    fn test_start_requires_measurable_viewport() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = ShowcaseConfig::default();
        let zero = ViewportGeometry::new(0.0, 0.0);
        assert!(MotionController::start(item(), &zero, &config, &mut rng).is_err());
    }

    #[test]
    fn test_phase_order() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let config = ShowcaseConfig::default();
            let mut controller =
                MotionController::start(item(), &VIEWPORT, &config, &mut rng).unwrap();

            let events = run_to_completion(&mut controller, &mut rng);
            let phases: Vec<MotionPhase> = events
                .iter()
                .filter_map(|e| match e {
                    MotionEvent::PhaseChanged(p) => Some(*p),
                    _ => None,
                })
                .collect();
            assert_eq!(
                phases,
                vec![
                    MotionPhase::Centered,
                    MotionPhase::Holding,
                    MotionPhase::Exiting,
                    MotionPhase::Finished,
                ]
            );
            assert!(matches!(events.last(), Some(MotionEvent::CycleComplete { .. })));

            let centers = events
                .iter()
                .filter(|e| matches!(e, MotionEvent::ReachedCenter(_)))
                .count();
            assert_eq!(centers, 1);
        }
    }

    #[test]
    fn test_reached_center_carries_metadata_and_magnifies() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = ShowcaseConfig::default();
        let mut controller = MotionController::start(item(), &VIEWPORT, &config, &mut rng).unwrap();

        let mut reached = None;
        for _ in 0..(60 * 6) {
            for event in controller.update(FRAME, &mut rng) {
                if let MotionEvent::ReachedCenter(meta) = event {
                    reached = Some(meta);
                }
            }
            if reached.is_some() {
                break;
            }
        }

        let meta = reached.expect("5 秒内应到达中心");
        assert_eq!(meta.name, "Mercedes Marco Polo");
        assert_eq!(controller.phase(), MotionPhase::Holding);
        let visual = controller.visual();
        assert_eq!(visual.position, VIEWPORT.center(40.0));
        assert_eq!(visual.scale, 1.8);
        assert_eq!(visual.blur, 0.0);
        assert_eq!(visual.opacity, 1.0);
    }

    #[test]
    fn test_exact_cycle_with_fixed_durations() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut config = ShowcaseConfig::default();
        config.featured.entry_duration = crate::config::JitterRange::fixed(2.0);
        config.featured.exit_duration = crate::config::JitterRange::fixed(3.0);
        let mut controller = MotionController::start(item(), &VIEWPORT, &config, &mut rng).unwrap();

        // 大步长也不会丢失阶段：2 + 3 + 3 = 8 秒
        assert!(controller.update(1.5, &mut rng).is_empty());
        let events = controller.update(1.0, &mut rng);
        assert!(events.contains(&MotionEvent::PhaseChanged(MotionPhase::Holding)));
        assert!((controller.hold_remaining() - 2.5).abs() < 1e-4);

        controller.update(5.4, &mut rng);
        assert_eq!(controller.phase(), MotionPhase::Exiting);

        // 总计 8.1 秒，多出的 0.1 秒随完成事件返回
        let events = controller.update(0.2, &mut rng);
        let Some(MotionEvent::CycleComplete { leftover }) = events.last() else {
            panic!("应以 CycleComplete 结尾: {events:?}");
        };
        assert!((leftover - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_single_huge_step_finishes_cycle() {
        let mut rng = StdRng::seed_from_u64(8);
        let config = ShowcaseConfig::default();
        let mut controller = MotionController::start(item(), &VIEWPORT, &config, &mut rng).unwrap();

        let events = controller.update(60.0, &mut rng);
        assert!(controller.is_finished());
        assert_eq!(events.len(), 6);
        // 周期总长在 7.5 到 11.5 秒之间
        let Some(MotionEvent::CycleComplete { leftover }) = events.last() else {
            panic!("应以 CycleComplete 结尾: {events:?}");
        };
        assert!((48.5..=52.5).contains(leftover), "{leftover}");
        assert!(controller.update(1.0, &mut rng).is_empty());
    }

    #[test]
    fn test_exit_state() {
        let mut rng = StdRng::seed_from_u64(21);
        let config = ShowcaseConfig::default();
        let mut controller = MotionController::start(item(), &VIEWPORT, &config, &mut rng).unwrap();
        run_to_completion(&mut controller, &mut rng);

        let exit = controller.exit().expect("离场点应已确定");
        assert!(VIEWPORT.outside_distance(exit.point) >= 100.0 - 1e-3);
        let visual = controller.visual();
        assert_eq!(visual.position, exit.point);
        assert!((visual.scale - 0.7).abs() < 1e-5);
        assert!((visual.opacity - 0.5).abs() < 1e-5);
        assert!((visual.blur - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_resize_mid_entering_lands_in_new_bounds() {
        let narrow = ViewportGeometry::new(400.0, 600.0);
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let config = ShowcaseConfig::default();
            let mut controller =
                MotionController::start(item(), &VIEWPORT, &config, &mut rng).unwrap();

            controller.update(1.0, &mut rng);
            assert_eq!(controller.phase(), MotionPhase::Entering);
            controller.on_resize(&narrow);
            assert!(controller.visual().position.is_finite());

            let mut arrived = false;
            for _ in 0..(60 * 6) {
                let events = controller.update(FRAME, &mut rng);
                if events.contains(&MotionEvent::PhaseChanged(MotionPhase::Holding)) {
                    arrived = true;
                    break;
                }
            }
            assert!(arrived);
            let position = controller.visual().position;
            assert!(narrow.contains(position), "{position:?} 不在新视口内");
            assert_eq!(position, narrow.center(40.0));
        }
    }

    #[test]
    fn test_resize_ignores_unmeasurable() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = ShowcaseConfig::default();
        let mut controller = MotionController::start(item(), &VIEWPORT, &config, &mut rng).unwrap();
        controller.update(0.5, &mut rng);
        let before = controller.visual();

        controller.on_resize(&ViewportGeometry::new(0.0, 0.0));
        assert_eq!(controller.visual(), before);
    }

    #[test]
    fn test_resize_while_exiting_keeps_edge() {
        let mut rng = StdRng::seed_from_u64(4);
        let config = ShowcaseConfig::default();
        let mut controller = MotionController::start(item(), &VIEWPORT, &config, &mut rng).unwrap();
        while controller.phase() != MotionPhase::Exiting {
            controller.update(FRAME, &mut rng);
        }
        let edge = controller.exit().unwrap().edge;

        let narrow = ViewportGeometry::new(400.0, 600.0);
        controller.on_resize(&narrow);
        let exit = controller.exit().unwrap();
        assert_eq!(exit.edge, edge);
        assert!(narrow.outside_distance(exit.point) >= 100.0 - 1e-3);

        run_to_completion(&mut controller, &mut rng);
        assert_eq!(controller.visual().position, exit.point);
    }
}
