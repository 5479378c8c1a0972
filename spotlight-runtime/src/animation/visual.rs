//! # Visual 模块
//!
//! 精灵的可动画视觉状态：位置、缩放、模糊、透明度。

use serde::{Deserialize, Serialize};

/// 可插值的值
///
/// 补间动画对任意实现此 trait 的类型生效。
pub trait Lerp: Copy {
    /// 线性插值，`t` 为 0 返回 `self`，为 1 返回 `other`
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

/// 二维坐标点（像素，视口左上角为原点）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// 创建新的坐标点
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// 原点
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// 两点的中点
    pub fn midpoint(self, other: Self) -> Self {
        self.lerp(other, 0.5)
    }

    /// 是否为有限值（非 NaN、非无穷）
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Lerp for Point {
    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            x: self.x.lerp(other.x, t),
            y: self.y.lerp(other.y, t),
        }
    }
}

/// 视觉状态
///
/// 一个精灵在某一帧的完整外观。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    /// 左上角位置
    pub position: Point,
    /// 缩放因子（1.0 为原始尺寸）
    pub scale: f32,
    /// 高斯模糊半径（像素）
    pub blur: f32,
    /// 透明度 (0.0 - 1.0)
    pub opacity: f32,
}

impl Default for VisualState {
    fn default() -> Self {
        Self {
            position: Point::zero(),
            scale: 1.0,
            blur: 0.0,
            opacity: 1.0,
        }
    }
}

impl VisualState {
    /// 创建视觉状态
    pub fn new(position: Point, scale: f32, blur: f32, opacity: f32) -> Self {
        Self {
            position,
            scale,
            blur,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// 替换位置，其余属性不变
    pub fn at(self, position: Point) -> Self {
        Self { position, ..self }
    }
}

impl Lerp for VisualState {
    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            scale: self.scale.lerp(other.scale, t),
            blur: self.blur.lerp(other.blur, t),
            opacity: self.opacity.lerp(other.opacity, t).clamp(0.0, 1.0),
        }
    }
}
