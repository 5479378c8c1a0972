//! # Spotlight Runtime
//!
//! VanBNB 首页车辆聚光动画的核心运行时库。
//!
//! ## 架构概述
//!
//! `spotlight-runtime` 是纯逻辑核心，不依赖任何渲染引擎或事件循环。
//! 它通过 **帧驱动模式** 与宿主层（Host）通信：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── mount(ViewportGeometry) ─────►│
//!   │──── request_resize(geometry) ────►│
//!   │                                   │ tick(dt)
//!   │◄─── Vec<ShowcaseEvent> ───────────│
//!   │◄─── frame() -> ShowcaseFrame ─────│
//!   │──── unmount() ───────────────────►│
//! ```
//!
//! 同一时刻只有一辆聚光车辆在运动：从随机边缘飞入、在中心放大停留并显示信息浮层、
//! 再飞向随机边缘离场，然后轮到下一辆。背景车辆在后台无限漂移，互不干扰。
//!
//! ## 核心类型
//!
//! - [`HeroShowcase`]：挂载到页面上的展示组件
//! - [`ShowcaseEvent`]：组件向宿主发出的事件
//! - [`ShowcaseFrame`]：可序列化的渲染快照
//! - [`ShowcaseConfig`]：全部可调参数
//! - [`ShowcasePool`]：聚光车辆与背景车辆
//!
//! ## 使用示例
//!
//! ```ignore
//! use spotlight_runtime::{HeroShowcase, ShowcaseConfig, ShowcasePool, ViewportGeometry};
//!
//! let mut hero = HeroShowcase::with_seed(ShowcasePool::builtin(), ShowcaseConfig::default(), 42)?;
//! hero.mount(ViewportGeometry::new(1280.0, 720.0));
//!
//! loop {
//!     for event in hero.tick(1.0 / 60.0) {
//!         host.handle(event);
//!     }
//!     if let Some(frame) = hero.frame() {
//!         host.draw(&frame);
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`animation`]：缓动、补间、视觉状态
//! - [`geometry`]：视口尺寸与边缘点采样
//! - [`timer`]：模拟时间上的定时器队列
//! - [`motion`]：聚光车辆运动状态机
//! - [`background`]：背景车辆漂移循环
//! - [`overlay`]：信息浮层
//! - [`sequencer`]：聚光轮换调度
//! - [`showcase`]：展示组件
//! - [`catalog`]：后端车辆记录的转换与筛选
//! - [`listing`]：发布车辆的分步表单校验
//! - [`config`]：配置
//! - [`error`]：错误类型定义

pub mod animation;
pub mod background;
pub mod catalog;
pub mod config;
pub mod error;
pub mod event;
pub mod geometry;
pub mod item;
pub mod listing;
pub mod motion;
pub mod overlay;
pub mod sequencer;
pub mod showcase;
pub mod timer;

// 重导出核心类型
pub use animation::{EasingFunction, Lerp, Point, Tween, TweenState, VisualState};
pub use background::{BackgroundLoopDriver, CancelToken};
pub use catalog::{PriceSort, VehicleFilter, VehicleRecord, top_rated};
pub use config::{ConfigError, JitterRange, ShowcaseConfig};
pub use error::{CatalogError, ListingError, ShowcaseError, ShowcaseResult};
pub use event::ShowcaseEvent;
pub use geometry::{Edge, EdgePoint, ViewportGeometry};
pub use item::{ImageSource, ShowcaseItem, ShowcaseMetadata, ShowcasePool};
pub use listing::{ListingStep, VehicleDraft};
pub use motion::{MotionController, MotionEvent, MotionPhase};
pub use overlay::{Callout, CalloutKind, MetadataOverlay, OverlaySnapshot};
pub use sequencer::{CycleProgress, Sequencer};
pub use showcase::{HeroShowcase, Lifecycle, ShowcaseFrame, SpriteFrame};
pub use timer::{Fired, Scheduler, TimerId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // 验证所有公共类型都可以正常使用
        let _geometry = ViewportGeometry::new(800.0, 600.0);
        let _phase = MotionPhase::Entering;
        let _config = ShowcaseConfig::default();
        let _pool = ShowcasePool::builtin();
        let _event = ShowcaseEvent::OverlayShown { item_id: 1 };
        let _filter = VehicleFilter::default();
        let _draft = VehicleDraft::default();
    }
}
