//! # Geometry 模块
//!
//! 视口尺寸与边缘点采样。
//!
//! 视口几何只由尺寸变化路径写入，控制器通过 `&ViewportGeometry`
//! 显式读取，不存在全局共享状态。

use rand::Rng;
use serde::{Deserialize, Serialize};

pub use crate::animation::Point;
use crate::error::{ShowcaseError, ShowcaseResult};

/// 视口尺寸
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportGeometry {
    pub width: f32,
    pub height: f32,
}

impl ViewportGeometry {
    /// 创建视口尺寸
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// 尺寸是否可用于计算（有限且大于零）
    pub fn is_measurable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// 检查可测量性，不可测量时返回错误
    pub fn ensure_measurable(&self) -> ShowcaseResult<()> {
        if self.is_measurable() {
            Ok(())
        } else {
            Err(ShowcaseError::UnmeasurableViewport {
                width: self.width,
                height: self.height,
            })
        }
    }

    /// 居中位置
    ///
    /// 位置指精灵方框左上角，因此需要减去半边长；结果不小于 0。
    pub fn center(&self, half_extent: f32) -> Point {
        Point::new(
            (self.width / 2.0 - half_extent).max(0.0),
            (self.height / 2.0 - half_extent).max(0.0),
        )
    }

    /// 点是否在 `[0, width] x [0, height]` 内
    pub fn contains(&self, point: Point) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }

    /// 把点限制到视口内
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(0.0, self.width.max(0.0)),
            point.y.clamp(0.0, self.height.max(0.0)),
        )
    }

    /// 点到视口矩形外侧的距离，点在视口内时为 0
    pub fn outside_distance(&self, point: Point) -> f32 {
        let dx = (-point.x).max(point.x - self.width).max(0.0);
        let dy = (-point.y).max(point.y - self.height).max(0.0);
        dx.max(dy)
    }
}

/// 视口边缘
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    /// 全部边缘
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right];

    /// 均匀随机选择一条边
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// 在这条边外侧 `margin` 处随机取点
    ///
    /// 沿边方向的坐标在 `[0, 边长]` 内均匀分布。
    pub fn random_point<R: Rng + ?Sized>(
        self,
        geometry: &ViewportGeometry,
        margin: f32,
        rng: &mut R,
    ) -> Point {
        let along = rng.random::<f32>();
        self.point_at(geometry, margin, along)
    }

    /// 在这条边外侧 `margin` 处，按沿边比例 `along`（0.0 - 1.0）取点
    pub fn point_at(self, geometry: &ViewportGeometry, margin: f32, along: f32) -> Point {
        let along = along.clamp(0.0, 1.0);
        match self {
            Edge::Top => Point::new(along * geometry.width, -margin),
            Edge::Bottom => Point::new(along * geometry.width, geometry.height + margin),
            Edge::Left => Point::new(-margin, along * geometry.height),
            Edge::Right => Point::new(geometry.width + margin, along * geometry.height),
        }
    }

    /// 已知边上的点，反推沿边比例
    pub fn along_ratio(self, geometry: &ViewportGeometry, point: Point) -> f32 {
        let ratio = match self {
            Edge::Top | Edge::Bottom if geometry.width > 0.0 => point.x / geometry.width,
            Edge::Left | Edge::Right if geometry.height > 0.0 => point.y / geometry.height,
            _ => 0.5,
        };
        if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.5
        }
    }
}

/// 边缘点：边与坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgePoint {
    pub edge: Edge,
    pub point: Point,
}

impl EdgePoint {
    /// 随机选边并取点
    pub fn random<R: Rng + ?Sized>(geometry: &ViewportGeometry, margin: f32, rng: &mut R) -> Self {
        let edge = Edge::random(rng);
        Self {
            edge,
            point: edge.random_point(geometry, margin, rng),
        }
    }

    /// 视口尺寸变化后，在同一条边、相同沿边比例处重新定位
    pub fn relocate(&self, old: &ViewportGeometry, new: &ViewportGeometry, margin: f32) -> Self {
        let along = self.edge.along_ratio(old, self.point);
        Self {
            edge: self.edge,
            point: self.edge.point_at(new, margin, along),
        }
    }
}
