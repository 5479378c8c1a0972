//! # Overlay 模块
//!
//! 聚光车辆到达中心后显示的信息浮层。
//!
//! 浮层由三张卡片组成：车名（附载客数）、日租价格、评分环。
//! 卡片依次错开弹出；浮层在聚光车辆离开 `Holding` 时被整体移除，
//! 因此同一时刻最多只有一份浮层，下一次 `ReachedCenter` 之前一定已移除。

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::animation::{EasingFunction, Lerp, Point, Tween};
use crate::config::OverlayConfig;
use crate::item::ShowcaseMetadata;

/// 浮层容器的初始缩放
const CONTAINER_INITIAL_SCALE: f32 = 0.8;

/// 评分环满分对应的角度
const DEGREES_PER_POINT: f32 = 3.6;

/// 卡片类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalloutKind {
    /// 车名与载客数，位于上方
    Name,
    /// 日租价格，位于左侧
    Price,
    /// 评分，位于右侧
    Score,
}

impl CalloutKind {
    /// 弹出顺序
    pub const ORDER: [CalloutKind; 3] = [CalloutKind::Name, CalloutKind::Price, CalloutKind::Score];

    /// 滑入方向（单位向量，指向卡片初始偏移方向）
    fn slide_direction(self) -> Point {
        match self {
            CalloutKind::Name => Point::new(0.0, 1.0),
            CalloutKind::Price => Point::new(1.0, 0.0),
            CalloutKind::Score => Point::new(-1.0, 0.0),
        }
    }
}

/// 单张卡片的渲染状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callout {
    pub kind: CalloutKind,
    /// 主文本
    pub text: String,
    /// 副文本（车名卡片显示载客数）
    pub subtitle: Option<String>,
    pub opacity: f32,
    pub scale: f32,
    /// 相对最终位置的偏移
    pub offset: Point,
}

/// 浮层快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySnapshot {
    pub metadata: ShowcaseMetadata,
    /// 锚点（聚光车辆居中位置）
    pub anchor: Point,
    pub opacity: f32,
    pub scale: f32,
    pub callouts: Vec<Callout>,
    /// 评分环扫过的角度 (0 - 360)
    pub score_sweep_degrees: f32,
}

#[derive(Debug, Clone)]
struct VisibleOverlay {
    metadata: ShowcaseMetadata,
    anchor: Point,
    container: Tween<f32>,
    callouts: Vec<(CalloutKind, Tween<f32>)>,
}

/// 信息浮层
#[derive(Debug, Clone)]
pub struct MetadataOverlay {
    visible: Option<VisibleOverlay>,
    settings: OverlayConfig,
}

impl MetadataOverlay {
    /// 创建隐藏的浮层
    pub fn new(settings: OverlayConfig) -> Self {
        Self {
            visible: None,
            settings,
        }
    }

    /// 显示浮层
    ///
    /// 已显示时替换内容并记录警告，不会叠加。
    pub fn show(&mut self, metadata: ShowcaseMetadata, anchor: Point) {
        if let Some(current) = &self.visible {
            warn!(
                current = %current.metadata.name,
                next = %metadata.name,
                "信息浮层尚未移除，直接替换"
            );
        }

        let container = Tween::new(0.0, 1.0, self.settings.fade_duration)
            .with_easing(EasingFunction::EaseInOut);
        let callouts = CalloutKind::ORDER
            .iter()
            .enumerate()
            .map(|(index, kind)| {
                let tween = Tween::new(0.0, 1.0, self.settings.callout_duration)
                    .with_easing(EasingFunction::EaseOutQuad)
                    .with_delay(self.settings.callout_stagger * index as f32);
                (*kind, tween)
            })
            .collect();

        self.visible = Some(VisibleOverlay {
            metadata,
            anchor,
            container,
            callouts,
        });
    }

    /// 移除浮层，返回移除前是否可见
    pub fn remove(&mut self) -> bool {
        self.visible.take().is_some()
    }

    /// 推进弹出动画
    pub fn update(&mut self, dt: f32) {
        if let Some(visible) = &mut self.visible {
            visible.container.update(dt);
            for (_, tween) in &mut visible.callouts {
                tween.update(dt);
            }
        }
    }

    /// 锚点随视口变化移动
    pub fn move_anchor(&mut self, anchor: Point) {
        if let Some(visible) = &mut self.visible {
            visible.anchor = anchor;
        }
    }

    /// 是否可见
    pub fn is_visible(&self) -> bool {
        self.visible.is_some()
    }

    /// 当前显示的信息
    pub fn metadata(&self) -> Option<&ShowcaseMetadata> {
        self.visible.as_ref().map(|v| &v.metadata)
    }

    /// 渲染快照
    pub fn snapshot(&self) -> Option<OverlaySnapshot> {
        let visible = self.visible.as_ref()?;
        let meta = &visible.metadata;

        let container = visible.container.current_value();
        let callouts = visible
            .callouts
            .iter()
            .map(|(kind, tween)| {
                let progress = tween.current_value();
                let (text, subtitle) = match kind {
                    CalloutKind::Name => (meta.name.clone(), Some(meta.capacity.clone())),
                    CalloutKind::Price => (meta.price.clone(), None),
                    CalloutKind::Score => (format!("{}/100", meta.score), None),
                };
                let slide = self.settings.callout_slide * (1.0 - progress);
                let direction = kind.slide_direction();
                Callout {
                    kind: *kind,
                    text,
                    subtitle,
                    opacity: progress,
                    scale: self.settings.callout_initial_scale.lerp(1.0, progress),
                    offset: Point::new(direction.x * slide, direction.y * slide),
                }
            })
            .collect();

        Some(OverlaySnapshot {
            metadata: meta.clone(),
            anchor: visible.anchor,
            opacity: container,
            scale: CONTAINER_INITIAL_SCALE.lerp(1.0, container),
            callouts,
            score_sweep_degrees: score_sweep_degrees(meta.score),
        })
    }
}

/// 评分环角度，评分先截断到 0 - 100
pub fn score_sweep_degrees(score: u32) -> f32 {
    score.min(100) as f32 * DEGREES_PER_POINT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ShowcaseMetadata {
        ShowcaseMetadata {
            name: "Fiat Ducato Hymer".to_string(),
            price: "175€".to_string(),
            score: 90,
            capacity: "6 pers".to_string(),
        }
    }

    fn callout(snapshot: &OverlaySnapshot, kind: CalloutKind) -> &Callout {
        snapshot.callouts.iter().find(|c| c.kind == kind).unwrap()
    }

    #[test]
    fn test_hidden_by_default() {
        let overlay = MetadataOverlay::new(OverlayConfig::default());
        assert!(!overlay.is_visible());
        assert!(overlay.snapshot().is_none());
    }

    #[test]
    fn test_callouts_stagger_in() {
        let mut overlay = MetadataOverlay::new(OverlayConfig::default());
        overlay.show(metadata(), Point::new(360.0, 260.0));

        overlay.update(0.05);
        let snap = overlay.snapshot().unwrap();
        assert!(callout(&snap, CalloutKind::Name).opacity > 0.0);
        assert_eq!(callout(&snap, CalloutKind::Price).opacity, 0.0);
        assert_eq!(callout(&snap, CalloutKind::Score).opacity, 0.0);

        overlay.update(0.1);
        let snap = overlay.snapshot().unwrap();
        assert!(callout(&snap, CalloutKind::Price).opacity > 0.0);
        assert_eq!(callout(&snap, CalloutKind::Score).opacity, 0.0);

        overlay.update(0.5);
        let snap = overlay.snapshot().unwrap();
        for c in &snap.callouts {
            assert_eq!(c.opacity, 1.0);
            assert_eq!(c.scale, 1.0);
            assert_eq!(c.offset, Point::zero());
        }
        assert_eq!(snap.opacity, 1.0);
        assert_eq!(snap.scale, 1.0);
    }

    #[test]
    fn test_initial_callout_state() {
        let mut overlay = MetadataOverlay::new(OverlayConfig::default());
        overlay.show(metadata(), Point::zero());
        let snap = overlay.snapshot().unwrap();

        let price = callout(&snap, CalloutKind::Price);
        assert_eq!(price.scale, 0.5);
        assert_eq!(price.offset, Point::new(15.0, 0.0));
        assert_eq!(
            callout(&snap, CalloutKind::Score).offset,
            Point::new(-15.0, 0.0)
        );
        assert_eq!(
            callout(&snap, CalloutKind::Name).offset,
            Point::new(0.0, 15.0)
        );
        assert_eq!(snap.scale, 0.8);
    }

    #[test]
    fn test_callout_text() {
        let mut overlay = MetadataOverlay::new(OverlayConfig::default());
        overlay.show(metadata(), Point::zero());
        let snap = overlay.snapshot().unwrap();

        let name = callout(&snap, CalloutKind::Name);
        assert_eq!(name.text, "Fiat Ducato Hymer");
        assert_eq!(name.subtitle.as_deref(), Some("6 pers"));
        assert_eq!(callout(&snap, CalloutKind::Price).text, "175€");
        assert_eq!(callout(&snap, CalloutKind::Score).text, "90/100");
        assert!((snap.score_sweep_degrees - 324.0).abs() < 1e-3);
    }

    #[test]
    fn test_remove_drops_state() {
        let mut overlay = MetadataOverlay::new(OverlayConfig::default());
        overlay.show(metadata(), Point::zero());
        assert!(overlay.remove());
        assert!(!overlay.is_visible());
        assert!(overlay.metadata().is_none());
        assert!(!overlay.remove());
    }

    #[test]
    fn test_show_twice_replaces() {
        let mut overlay = MetadataOverlay::new(OverlayConfig::default());
        overlay.show(metadata(), Point::zero());
        let mut other = metadata();
        other.name = "Opel Vivaro Life".to_string();
        overlay.show(other, Point::zero());

        assert_eq!(overlay.metadata().unwrap().name, "Opel Vivaro Life");
        assert_eq!(overlay.snapshot().unwrap().callouts.len(), 3);
    }

    #[test]
    fn test_score_sweep_clamped() {
        assert_eq!(score_sweep_degrees(0), 0.0);
        assert!((score_sweep_degrees(50) - 180.0).abs() < 1e-4);
        assert!((score_sweep_degrees(250) - 360.0).abs() < 1e-4);
    }
}
