//! # Event 模块
//!
//! 展示组件向宿主发出的事件。
//!
//! 事件按发生顺序返回，宿主可以据此观察阶段顺序、浮层显隐和周期切换。
//! 事件只描述“发生了什么”，不要求宿主做出任何响应。

use serde::{Deserialize, Serialize};

use crate::geometry::ViewportGeometry;
use crate::item::ShowcaseMetadata;
use crate::motion::MotionPhase;

/// 展示事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShowcaseEvent {
    /// 应用了新的视口尺寸（挂载或防抖结束）
    GeometryApplied { geometry: ViewportGeometry },
    /// 开始一个聚光周期
    CycleStarted { index: usize, item_id: u32 },
    /// 聚光车辆进入新阶段
    PhaseChanged { item_id: u32, phase: MotionPhase },
    /// 聚光车辆到达中心
    ReachedCenter {
        item_id: u32,
        metadata: ShowcaseMetadata,
    },
    /// 信息浮层出现
    OverlayShown { item_id: u32 },
    /// 信息浮层被移除
    OverlayRemoved { item_id: u32 },
    /// 聚光周期结束
    CycleComplete { index: usize, item_id: u32 },
}

impl ShowcaseEvent {
    /// 事件关联的车辆
    pub fn item_id(&self) -> Option<u32> {
        match self {
            Self::GeometryApplied { .. } => None,
            Self::CycleStarted { item_id, .. }
            | Self::PhaseChanged { item_id, .. }
            | Self::ReachedCenter { item_id, .. }
            | Self::OverlayShown { item_id }
            | Self::OverlayRemoved { item_id }
            | Self::CycleComplete { item_id, .. } => Some(*item_id),
        }
    }

    /// 事件名称，用于日志
    pub fn name(&self) -> &'static str {
        match self {
            Self::GeometryApplied { .. } => "geometry_applied",
            Self::CycleStarted { .. } => "cycle_started",
            Self::PhaseChanged { .. } => "phase_changed",
            Self::ReachedCenter { .. } => "reached_center",
            Self::OverlayShown { .. } => "overlay_shown",
            Self::OverlayRemoved { .. } => "overlay_removed",
            Self::CycleComplete { .. } => "cycle_complete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id() {
        let event = ShowcaseEvent::PhaseChanged {
            item_id: 3,
            phase: MotionPhase::Holding,
        };
        assert_eq!(event.item_id(), Some(3));
        assert_eq!(event.name(), "phase_changed");

        let event = ShowcaseEvent::GeometryApplied {
            geometry: ViewportGeometry::new(800.0, 600.0),
        };
        assert_eq!(event.item_id(), None);
    }

    #[test]
    fn test_serialize_shape() {
        let event = ShowcaseEvent::CycleStarted { index: 2, item_id: 3 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["CycleStarted"]["index"], 2);
        assert_eq!(json["CycleStarted"]["item_id"], 3);

        let event = ShowcaseEvent::PhaseChanged {
            item_id: 1,
            phase: MotionPhase::Exiting,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["PhaseChanged"]["phase"], "exiting");
    }
}
