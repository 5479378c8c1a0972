//! # Animation 模块
//!
//! 聚光动画使用的时间轴基础设施。
//!
//! ## 核心设计理念
//!
//! 动画层只负责 **时间轴管理**：
//! - 知道某个值从 A 到 B 需要在 duration 内变化
//! - 维护当前值，由持有者查询
//! - **不假设对象类型**，任何实现 [`Lerp`] 的值都可以补间
//!
//! ## 核心概念
//!
//! - [`Tween`]: 单个补间实例
//! - [`EasingFunction`]: 缓动函数
//! - [`VisualState`]: 精灵的位置、缩放、模糊、透明度
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let from = VisualState::new(Point::new(-100.0, 50.0), 0.7, 4.0, 0.8);
//! let to = VisualState::new(Point::new(360.0, 260.0), 1.8, 0.0, 1.0);
//! let mut tween = Tween::new(from, to, 3.0).with_easing(EasingFunction::EaseInOut);
//!
//! while tween.update(1.0 / 60.0) {
//!     draw(tween.current_value());
//! }
//! ```

mod easing;
mod tween;
mod visual;

pub use easing::EasingFunction;
pub use tween::{Tween, TweenState};
pub use visual::{Lerp, Point, VisualState};
