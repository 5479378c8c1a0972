//! # Sequencer 模块
//!
//! 聚光车辆的轮换调度。
//!
//! 同一时刻最多只有一个聚光周期在运行；周期结束后由宿主在
//! `inter_cycle_delay` 之后调用 [`Sequencer::advance`] 并开始下一个周期，
//! 索引按聚光池长度循环，不会跳过或重叠。

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::ShowcaseConfig;
use crate::error::{ShowcaseError, ShowcaseResult};
use crate::event::ShowcaseEvent;
use crate::geometry::ViewportGeometry;
use crate::item::ShowcaseItem;
use crate::motion::{MotionController, MotionEvent, MotionPhase};

/// 一次推进的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleProgress {
    pub events: Vec<ShowcaseEvent>,
    /// 周期在本次推进中结束时，结束之后剩余的时间
    pub leftover: Option<f32>,
}

/// 聚光调度器
#[derive(Debug, Clone)]
pub struct Sequencer {
    featured: Vec<ShowcaseItem>,
    current_index: usize,
    active: Option<MotionController>,
    /// 已完成的周期数
    completed: u64,
}

impl Sequencer {
    /// 创建调度器，聚光池不能为空
    pub fn new(featured: Vec<ShowcaseItem>) -> ShowcaseResult<Self> {
        if featured.is_empty() {
            return Err(ShowcaseError::EmptyFeaturedPool);
        }
        Ok(Self {
            featured,
            current_index: 0,
            active: None,
            completed: 0,
        })
    }

    /// 为当前索引开始一个周期
    ///
    /// 已有周期在运行时不做任何事，返回空事件列表。
    pub fn start_cycle<R: Rng + ?Sized>(
        &mut self,
        viewport: &ViewportGeometry,
        config: &ShowcaseConfig,
        rng: &mut R,
    ) -> ShowcaseResult<Vec<ShowcaseEvent>> {
        if let Some(active) = &self.active {
            warn!(item = active.item().id, "已有聚光周期在运行，忽略重复启动");
            return Ok(Vec::new());
        }

        let item = self.featured[self.current_index].clone();
        let item_id = item.id;
        let controller = MotionController::start(item, viewport, config, rng)?;
        self.active = Some(controller);

        info!(index = self.current_index, item = item_id, "开始聚光周期");
        Ok(vec![
            ShowcaseEvent::CycleStarted {
                index: self.current_index,
                item_id,
            },
            ShowcaseEvent::PhaseChanged {
                item_id,
                phase: MotionPhase::Entering,
            },
        ])
    }

    /// 推进当前周期
    ///
    /// 周期结束时控制器被丢弃，事件以 `CycleComplete` 结尾，
    /// 并带回结束之后剩余的时间。
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> CycleProgress {
        let Some(controller) = &mut self.active else {
            return CycleProgress::default();
        };

        let item_id = controller.item().id;
        let mut leftover = None;
        let events = controller
            .update(dt, rng)
            .into_iter()
            .map(|event| match event {
                MotionEvent::PhaseChanged(phase) => ShowcaseEvent::PhaseChanged { item_id, phase },
                MotionEvent::ReachedCenter(metadata) => {
                    ShowcaseEvent::ReachedCenter { item_id, metadata }
                }
                MotionEvent::CycleComplete { leftover: rest } => {
                    leftover = Some(rest);
                    ShowcaseEvent::CycleComplete {
                        index: self.current_index,
                        item_id,
                    }
                }
            })
            .collect();

        if leftover.is_some() {
            self.active = None;
            self.completed += 1;
            debug!(index = self.current_index, item = item_id, "聚光周期结束");
        }
        CycleProgress { events, leftover }
    }

    /// 索引前进一位，返回新的索引
    ///
    /// 周期仍在运行时不前进。
    pub fn advance(&mut self) -> usize {
        if self.active.is_none() {
            self.current_index = (self.current_index + 1) % self.featured.len();
        }
        self.current_index
    }

    /// 把新的视口尺寸交给运行中的控制器
    pub fn on_resize(&mut self, viewport: &ViewportGeometry) {
        if let Some(controller) = &mut self.active {
            controller.on_resize(viewport);
        }
    }

    /// 停止并丢弃当前周期
    pub fn cancel(&mut self) {
        if let Some(mut controller) = self.active.take() {
            controller.cancel();
            debug!(item = controller.item().id, "聚光周期被取消");
        }
    }

    /// 当前索引
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// 是否有周期在运行
    pub fn is_cycle_active(&self) -> bool {
        self.active.is_some()
    }

    /// 当前运行的控制器
    pub fn active(&self) -> Option<&MotionController> {
        self.active.as_ref()
    }

    /// 已完成的周期数
    pub fn completed_cycles(&self) -> u64 {
        self.completed
    }

    /// 聚光池长度
    pub fn featured_count(&self) -> usize {
        self.featured.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ShowcasePool;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const VIEWPORT: ViewportGeometry = ViewportGeometry::new(800.0, 600.0);

    fn sequencer() -> Sequencer {
        Sequencer::new(ShowcasePool::builtin().featured().to_vec()).unwrap()
    }

    #[test]
    fn test_empty_pool_rejected() {
        assert_eq!(
            Sequencer::new(Vec::new()).unwrap_err(),
            ShowcaseError::EmptyFeaturedPool
        );
    }

    #[test]
    fn test_start_emits_entering() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut seq = sequencer();
        let events = seq
            .start_cycle(&VIEWPORT, &ShowcaseConfig::default(), &mut rng)
            .unwrap();

        assert_eq!(
            events,
            vec![
                ShowcaseEvent::CycleStarted {
                    index: 0,
                    item_id: 1,
                },
                ShowcaseEvent::PhaseChanged {
                    item_id: 1,
                    phase: MotionPhase::Entering,
                },
            ]
        );
        assert!(seq.is_cycle_active());
    }

    #[test]
    fn test_no_overlapping_cycles() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut seq = sequencer();
        let config = ShowcaseConfig::default();
        seq.start_cycle(&VIEWPORT, &config, &mut rng).unwrap();

        let events = seq.start_cycle(&VIEWPORT, &config, &mut rng).unwrap();
        assert!(events.is_empty());
        assert_eq!(seq.advance(), 0);
    }

    #[test]
    fn test_full_cycle_then_advance() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut seq = sequencer();
        let config = ShowcaseConfig::default();
        seq.start_cycle(&VIEWPORT, &config, &mut rng).unwrap();

        let progress = seq.update(60.0, &mut rng);
        assert_eq!(
            progress.events.last(),
            Some(&ShowcaseEvent::CycleComplete {
                index: 0,
                item_id: 1,
            })
        );
        assert!(progress.leftover.is_some_and(|t| t > 45.0));
        assert!(!seq.is_cycle_active());
        assert_eq!(seq.completed_cycles(), 1);
        assert_eq!(seq.update(1.0, &mut rng), CycleProgress::default());

        assert_eq!(seq.advance(), 1);
    }

    #[test]
    fn test_index_wraps() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seq = sequencer();
        let config = ShowcaseConfig::default();
        for expected in [1, 2, 3, 4, 0, 1] {
            seq.start_cycle(&VIEWPORT, &config, &mut rng).unwrap();
            seq.update(60.0, &mut rng);
            assert_eq!(seq.advance(), expected);
        }
    }

    #[test]
    fn test_cancel_drops_controller() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut seq = sequencer();
        seq.start_cycle(&VIEWPORT, &ShowcaseConfig::default(), &mut rng)
            .unwrap();
        seq.cancel();
        assert!(!seq.is_cycle_active());
        assert!(seq.update(10.0, &mut rng).events.is_empty());
    }

    #[test]
    fn test_unmeasurable_start_fails() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut seq = sequencer();
        let zero = ViewportGeometry::new(0.0, 0.0);
        let result = seq.start_cycle(&zero, &ShowcaseConfig::default(), &mut rng);
        assert!(result.is_err());
        assert!(!seq.is_cycle_active());
    }
}
