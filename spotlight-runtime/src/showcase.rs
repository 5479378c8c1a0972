//! # Showcase 模块
//!
//! 挂载到页面上的车辆展示组件。
//!
//! [`HeroShowcase`] 持有视口几何、聚光调度器、背景漂移驱动、信息浮层、
//! 定时器队列和随机数源。宿主只需要：
//!
//! ```text
//! mount(geometry) ──► tick(dt) ... tick(dt) ──► unmount()
//!                        ▲
//!              request_resize(geometry)
//! ```
//!
//! - 视口不可测量时挂载会推迟启动，直到防抖后的尺寸可用
//! - 尺寸变化经过防抖，每次新请求都会重新计时
//! - 卸载后所有定时器被取消，之后的 `tick` 不再产生任何事件

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::animation::VisualState;
use crate::background::{BackgroundLoopDriver, CancelToken};
use crate::config::ShowcaseConfig;
use crate::error::ShowcaseResult;
use crate::event::ShowcaseEvent;
use crate::geometry::ViewportGeometry;
use crate::item::{ImageSource, ShowcasePool};
use crate::motion::MotionPhase;
use crate::overlay::{MetadataOverlay, OverlaySnapshot};
use crate::sequencer::Sequencer;
use crate::timer::{Fired, Scheduler, TimerId};

/// 组件生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// 已创建，尚未挂载
    Created,
    /// 已挂载
    Mounted,
    /// 已卸载，不会再更新
    Unmounted,
}

#[derive(Debug, Clone)]
enum ShowcaseTimer {
    /// 防抖结束，应用新尺寸
    ApplyGeometry(ViewportGeometry),
    /// 周期间隔结束，开始下一辆
    NextCycle,
}

/// 单个精灵的渲染状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteFrame {
    pub item_id: u32,
    /// 聚光车辆的阶段，背景车辆没有阶段
    pub phase: Option<MotionPhase>,
    pub visual: VisualState,
    pub image: ImageSource,
}

/// 一帧的完整渲染快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowcaseFrame {
    /// 组件时钟（秒）
    pub time: f64,
    pub geometry: ViewportGeometry,
    pub featured_index: usize,
    /// 周期间隔内为空
    pub featured: Option<SpriteFrame>,
    pub background: Vec<SpriteFrame>,
    pub overlay: Option<OverlaySnapshot>,
}

/// 单帧内最多连续开始的周期数，防止零时长配置下空转
const MAX_CYCLES_PER_TICK: usize = 16;

/// 车辆展示组件
#[derive(Debug)]
pub struct HeroShowcase<R: Rng = StdRng> {
    config: ShowcaseConfig,
    sequencer: Sequencer,
    background: Vec<BackgroundLoopDriver>,
    overlay: MetadataOverlay,
    scheduler: Scheduler<ShowcaseTimer>,
    /// 最近一次应用的视口尺寸，卸载后清空
    geometry: Option<ViewportGeometry>,
    pending_resize: Option<TimerId>,
    /// 是否已开始过第一个周期
    started: bool,
    lifecycle: Lifecycle,
    token: CancelToken,
    rng: R,
}

impl HeroShowcase<StdRng> {
    /// 使用固定种子创建，便于复现
    pub fn with_seed(
        pool: ShowcasePool,
        config: ShowcaseConfig,
        seed: u64,
    ) -> ShowcaseResult<Self> {
        Self::new(pool, config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> HeroShowcase<R> {
    /// 创建组件
    ///
    /// 车辆池在这里校验；背景槽位按 `background[i % len]` 分配。
    pub fn new(pool: ShowcasePool, config: ShowcaseConfig, rng: R) -> ShowcaseResult<Self> {
        pool.validate()?;
        let sequencer = Sequencer::new(pool.featured().to_vec())?;

        let token = CancelToken::new();
        let background = pool
            .background_slots(config.background.slots)
            .into_iter()
            .enumerate()
            .map(|(slot, item)| {
                BackgroundLoopDriver::new(slot, item.clone(), &config, token.clone())
            })
            .collect();
        let overlay = MetadataOverlay::new(config.overlay.clone());

        Ok(Self {
            config,
            sequencer,
            background,
            overlay,
            scheduler: Scheduler::new(),
            geometry: None,
            pending_resize: None,
            started: false,
            lifecycle: Lifecycle::Created,
            token,
            rng,
        })
    }

    /// 挂载
    ///
    /// 尺寸可测量时立即开始第一个周期，否则等待 [`request_resize`](Self::request_resize)。
    pub fn mount(&mut self, geometry: ViewportGeometry) -> Vec<ShowcaseEvent> {
        let mut events = Vec::new();
        match self.lifecycle {
            Lifecycle::Created => {}
            Lifecycle::Mounted => {
                warn!("展示组件已挂载，忽略重复挂载");
                return events;
            }
            Lifecycle::Unmounted => {
                warn!("展示组件已卸载，不能再次挂载");
                return events;
            }
        }

        self.lifecycle = Lifecycle::Mounted;
        info!(
            width = geometry.width,
            height = geometry.height,
            featured = self.sequencer.featured_count(),
            background = self.background.len(),
            "展示组件挂载"
        );
        if geometry.is_measurable() {
            self.apply_geometry(geometry, &mut events);
        } else {
            debug!("视口尺寸不可用，推迟启动");
        }
        events
    }

    /// 请求改变视口尺寸
    ///
    /// 经过 `resize_debounce` 秒防抖后生效；期间的新请求会取消旧请求重新计时。
    pub fn request_resize(&mut self, geometry: ViewportGeometry) {
        if self.lifecycle != Lifecycle::Mounted {
            debug!("展示组件未挂载，忽略尺寸变化");
            return;
        }
        if let Some(previous) = self.pending_resize.take() {
            self.scheduler.cancel(previous);
        }
        let id = self.scheduler.schedule(
            self.config.timing.resize_debounce,
            ShowcaseTimer::ApplyGeometry(geometry),
        );
        self.pending_resize = Some(id);
    }

    /// 推进一帧
    ///
    /// 顺序：到期定时器 → 聚光周期 → 背景漂移 → 信息浮层。
    ///
    /// 周期间隔从周期实际结束的时刻算起；帧内开始的新周期只推进
    /// 开始之后剩余的时间，因此周期节奏与帧率无关。
    pub fn tick(&mut self, dt: f32) -> Vec<ShowcaseEvent> {
        let mut events = Vec::new();
        if self.lifecycle != Lifecycle::Mounted {
            return events;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        // 帧开始前已在运行的周期推进完整的 dt
        let mut step = self.sequencer.is_cycle_active().then_some(dt);
        let mut advance_by = dt;
        // 超出上限时，已到期的 NextCycle 留在队列里，下一帧再处理
        for _ in 0..MAX_CYCLES_PER_TICK {
            let fired = self.scheduler.advance(advance_by);
            advance_by = 0.0;
            if let Some(late) = self.fire(fired, &mut events) {
                step = Some(late);
            }
            let Some(elapsed) = step.take() else {
                break;
            };

            let progress = self.sequencer.update(elapsed, &mut self.rng);
            for event in progress.events {
                self.route(event, &mut events);
            }
            let Some(leftover) = progress.leftover else {
                break;
            };

            let finished_at = self.scheduler.now() - f64::from(leftover);
            let delay = f64::from(self.config.timing.inter_cycle_delay.max(0.0));
            self.scheduler
                .schedule_at(finished_at + delay, ShowcaseTimer::NextCycle);
        }

        if let Some(geometry) = self.geometry {
            for driver in &mut self.background {
                driver.update(dt, &geometry, &mut self.rng);
            }
        }

        self.overlay.update(dt);
        events
    }

    /// 处理到期的定时器
    ///
    /// 有新周期开始时返回它在本帧内应推进的时间。
    fn fire(
        &mut self,
        fired: Vec<Fired<ShowcaseTimer>>,
        events: &mut Vec<ShowcaseEvent>,
    ) -> Option<f32> {
        let mut started = None;
        for timer in fired {
            let began = match timer.payload {
                ShowcaseTimer::ApplyGeometry(geometry) => {
                    if self.pending_resize == Some(timer.id) {
                        self.pending_resize = None;
                    }
                    self.apply_geometry(geometry, events)
                }
                ShowcaseTimer::NextCycle => {
                    self.sequencer.advance();
                    self.start_cycle(events)
                }
            };
            if began {
                started = Some(timer.late);
            }
        }
        started
    }

    /// 卸载
    ///
    /// 取消背景令牌和所有定时器，丢弃聚光控制器、信息浮层和视口尺寸。
    pub fn unmount(&mut self) {
        if self.lifecycle == Lifecycle::Unmounted {
            return;
        }
        self.token.cancel();
        self.scheduler.cancel_all();
        self.pending_resize = None;
        self.sequencer.cancel();
        self.overlay.remove();
        self.geometry = None;
        self.lifecycle = Lifecycle::Unmounted;
        info!(
            completed = self.sequencer.completed_cycles(),
            "展示组件卸载"
        );
    }

    /// 应用视口尺寸，返回是否因此开始了第一个周期
    fn apply_geometry(
        &mut self,
        geometry: ViewportGeometry,
        events: &mut Vec<ShowcaseEvent>,
    ) -> bool {
        if !geometry.is_measurable() {
            debug!(
                width = geometry.width,
                height = geometry.height,
                "忽略不可测量的视口尺寸"
            );
            return false;
        }

        debug!(
            width = geometry.width,
            height = geometry.height,
            "应用视口尺寸"
        );
        let previous = self.geometry.replace(geometry);
        events.push(ShowcaseEvent::GeometryApplied { geometry });

        self.sequencer.on_resize(&geometry);
        if let Some(previous) = previous {
            for driver in &mut self.background {
                driver.on_resize(&previous, &geometry);
            }
        }
        self.overlay
            .move_anchor(geometry.center(self.config.geometry.half_extent));

        !self.started && self.start_cycle(events)
    }

    /// 为当前索引开始周期，返回是否成功
    fn start_cycle(&mut self, events: &mut Vec<ShowcaseEvent>) -> bool {
        let Some(geometry) = self.geometry else {
            return false;
        };
        match self
            .sequencer
            .start_cycle(&geometry, &self.config, &mut self.rng)
        {
            Ok(started) => {
                self.started = true;
                let began = !started.is_empty();
                events.extend(started);
                began
            }
            Err(err) => {
                warn!(error = %err, "无法开始聚光周期");
                false
            }
        }
    }

    /// 把聚光周期事件转发给宿主，并驱动信息浮层
    fn route(&mut self, event: ShowcaseEvent, events: &mut Vec<ShowcaseEvent>) {
        match &event {
            ShowcaseEvent::ReachedCenter { item_id, metadata } => {
                let item_id = *item_id;
                let anchor = self
                    .geometry
                    .map(|g| g.center(self.config.geometry.half_extent))
                    .unwrap_or_default();
                self.overlay.show(metadata.clone(), anchor);
                events.push(event);
                events.push(ShowcaseEvent::OverlayShown { item_id });
                return;
            }
            ShowcaseEvent::PhaseChanged { item_id, phase } if !phase.shows_metadata() => {
                if self.overlay.remove() {
                    events.push(ShowcaseEvent::OverlayRemoved { item_id: *item_id });
                }
            }
            _ => {}
        }
        events.push(event);
    }

    /// 当前帧快照，未应用视口尺寸时为空
    pub fn frame(&self) -> Option<ShowcaseFrame> {
        let geometry = self.geometry?;

        let featured = self.sequencer.active().map(|controller| SpriteFrame {
            item_id: controller.item().id,
            phase: Some(controller.phase()),
            visual: controller.visual(),
            image: controller.item().image(),
        });
        let background = self
            .background
            .iter()
            .filter(|driver| driver.iterations() > 0)
            .map(|driver| SpriteFrame {
                item_id: driver.item().id,
                phase: None,
                visual: driver.visual(),
                image: driver.item().image(),
            })
            .collect();

        Some(ShowcaseFrame {
            time: self.scheduler.now(),
            geometry,
            featured_index: self.sequencer.current_index(),
            featured,
            background,
            overlay: self.overlay.snapshot(),
        })
    }

    /// 当前聚光索引
    pub fn featured_index(&self) -> usize {
        self.sequencer.current_index()
    }

    /// 是否有聚光周期在运行
    pub fn is_cycle_active(&self) -> bool {
        self.sequencer.is_cycle_active()
    }

    /// 聚光车辆当前阶段
    pub fn featured_phase(&self) -> Option<MotionPhase> {
        self.sequencer.active().map(|c| c.phase())
    }

    /// 已完成的周期数
    pub fn completed_cycles(&self) -> u64 {
        self.sequencer.completed_cycles()
    }

    /// 等待中的定时器数量
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// 当前视口尺寸
    pub fn geometry(&self) -> Option<ViewportGeometry> {
        self.geometry
    }

    /// 生命周期
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// 背景漂移驱动
    pub fn background(&self) -> &[BackgroundLoopDriver] {
        &self.background
    }

    /// 信息浮层
    pub fn overlay(&self) -> &MetadataOverlay {
        &self.overlay
    }

    /// 组件配置
    pub fn config(&self) -> &ShowcaseConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn showcase(seed: u64) -> HeroShowcase {
        HeroShowcase::with_seed(ShowcasePool::builtin(), ShowcaseConfig::default(), seed).unwrap()
    }

    #[test]
    fn test_mount_starts_first_cycle() {
        let mut hero = showcase(1);
        assert_eq!(hero.lifecycle(), Lifecycle::Created);
        assert!(hero.frame().is_none());

        let events = hero.mount(ViewportGeometry::new(800.0, 600.0));
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ShowcaseEvent::GeometryApplied { .. }));
        assert_eq!(
            events[1],
            ShowcaseEvent::CycleStarted {
                index: 0,
                item_id: 1,
            }
        );
        assert_eq!(
            events[2],
            ShowcaseEvent::PhaseChanged {
                item_id: 1,
                phase: MotionPhase::Entering,
            }
        );
        assert!(hero.is_cycle_active());
        assert_eq!(hero.background().len(), 10);
    }

    #[test]
    fn test_mount_twice_ignored() {
        let mut hero = showcase(1);
        hero.mount(ViewportGeometry::new(800.0, 600.0));
        assert!(hero.mount(ViewportGeometry::new(800.0, 600.0)).is_empty());
    }

    #[test]
    fn test_tick_before_mount_is_noop() {
        let mut hero = showcase(1);
        assert!(hero.tick(1.0).is_empty());
        assert!(!hero.is_cycle_active());
    }

    #[test]
    fn test_resize_is_debounced() {
        let mut hero = showcase(2);
        hero.mount(ViewportGeometry::new(800.0, 600.0));

        hero.request_resize(ViewportGeometry::new(700.0, 600.0));
        hero.tick(0.05);
        hero.request_resize(ViewportGeometry::new(400.0, 600.0));
        assert_eq!(hero.pending_timers(), 1);

        let events = hero.tick(0.08);
        assert!(!events.iter().any(|e| e.name() == "geometry_applied"));
        assert_eq!(hero.geometry(), Some(ViewportGeometry::new(800.0, 600.0)));

        let events = hero.tick(0.05);
        assert!(events.contains(&ShowcaseEvent::GeometryApplied {
            geometry: ViewportGeometry::new(400.0, 600.0),
        }));
        assert_eq!(hero.geometry(), Some(ViewportGeometry::new(400.0, 600.0)));
        assert_eq!(hero.pending_timers(), 0);
    }

    #[test]
    fn test_frame_snapshot() {
        let mut hero = showcase(3);
        hero.mount(ViewportGeometry::new(800.0, 600.0));
        hero.tick(FRAME);

        let frame = hero.frame().unwrap();
        assert_eq!(frame.featured_index, 0);
        let featured = frame.featured.as_ref().unwrap();
        assert_eq!(featured.item_id, 1);
        assert_eq!(featured.phase, Some(MotionPhase::Entering));
        assert!(matches!(featured.image, ImageSource::Remote(_)));
        assert_eq!(frame.background.len(), 10);
        assert!(frame.background.iter().all(|s| s.phase.is_none()));
        assert!(frame.overlay.is_none());

        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"featured_index\":0"));
    }

    #[test]
    fn test_overlay_visible_only_while_holding() {
        let mut hero = showcase(4);
        hero.mount(ViewportGeometry::new(800.0, 600.0));

        for _ in 0..(60 * 25) {
            hero.tick(FRAME);
            let holding = matches!(
                hero.featured_phase(),
                Some(MotionPhase::Centered | MotionPhase::Holding)
            );
            assert_eq!(hero.overlay().is_visible(), holding);
        }
    }

    #[test]
    fn test_unmount_clears_everything() {
        let mut hero = showcase(5);
        hero.mount(ViewportGeometry::new(800.0, 600.0));
        hero.request_resize(ViewportGeometry::new(400.0, 600.0));
        hero.tick(FRAME);

        hero.unmount();
        assert_eq!(hero.lifecycle(), Lifecycle::Unmounted);
        assert_eq!(hero.pending_timers(), 0);
        assert!(!hero.is_cycle_active());
        assert!(hero.geometry().is_none());
        assert!(hero.frame().is_none());
        assert!(hero.tick(10.0).is_empty());
        assert!(hero.mount(ViewportGeometry::new(800.0, 600.0)).is_empty());
    }

    #[test]
    fn test_resize_moves_background_paths() {
        let wide = ViewportGeometry::new(1600.0, 600.0);
        let mut hero = showcase(6);
        hero.mount(ViewportGeometry::new(800.0, 600.0));
        hero.tick(1.0);

        hero.request_resize(wide);
        hero.tick(0.2);
        assert_eq!(hero.geometry(), Some(wide));
        for driver in hero.background() {
            let [start, _, end] = driver.path();
            assert!(wide.outside_distance(start) >= 100.0 - 1e-3);
            assert!(wide.outside_distance(end) >= 100.0 - 1e-3);
        }
    }

    #[test]
    fn test_unvalidated_pool_rejected() {
        // 直接反序列化会跳过校验，构造组件时再检查一次
        let pool: ShowcasePool = serde_json::from_str(r#"{"featured": []}"#).unwrap();
        let result = HeroShowcase::with_seed(pool, ShowcaseConfig::default(), 0);
        assert!(matches!(result, Err(crate::error::ShowcaseError::EmptyFeaturedPool)));
    }
}
