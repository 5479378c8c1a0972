//! # Config 模块
//!
//! 聚光动画的全部可调参数。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高，由 CLI 覆盖）
//! 2. 配置文件 (spotlight.json)
//! 3. 默认值（最低）
//!
//! 时间单位均为秒，长度单位均为像素。

use std::fs;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::animation::EasingFunction;

/// 均匀随机区间 `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JitterRange {
    pub min: f32,
    pub max: f32,
}

impl JitterRange {
    /// 创建区间
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// 固定值（min == max）
    pub const fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// 在区间内均匀采样
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.random_range(self.min..=self.max)
        } else {
            self.min
        }
    }

    /// 值是否落在区间内
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min >= 0.0 && self.min <= self.max
    }
}

/// 聚光动画配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShowcaseConfig {
    /// 视口几何配置
    #[serde(default)]
    pub geometry: GeometryConfig,

    /// 聚光车辆运动配置
    #[serde(default)]
    pub featured: FeaturedConfig,

    /// 背景车辆漂移配置
    #[serde(default)]
    pub background: BackgroundConfig,

    /// 信息浮层配置
    #[serde(default)]
    pub overlay: OverlayConfig,

    /// 调度配置
    #[serde(default)]
    pub timing: TimingConfig,
}

/// 视口几何配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// 边缘点距视口边界的距离
    #[serde(default = "default_edge_margin")]
    pub edge_margin: f32,

    /// 精灵方框的一半边长，用于计算居中位置
    #[serde(default = "default_half_extent")]
    pub half_extent: f32,
}

/// 聚光车辆运动配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturedConfig {
    /// 入场时长
    #[serde(default = "default_entry_duration")]
    pub entry_duration: JitterRange,

    /// 离场时长
    #[serde(default = "default_exit_duration")]
    pub exit_duration: JitterRange,

    /// 居中停留时长
    #[serde(default = "default_dwell")]
    pub dwell: f32,

    /// 画面外的缩放
    #[serde(default = "default_offscreen_scale")]
    pub offscreen_scale: f32,

    /// 画面外的模糊半径
    #[serde(default = "default_offscreen_blur")]
    pub offscreen_blur: f32,

    /// 入场起点透明度
    #[serde(default = "default_entry_opacity")]
    pub entry_opacity: f32,

    /// 离场终点透明度
    #[serde(default = "default_exit_opacity")]
    pub exit_opacity: f32,

    /// 居中时的放大倍数
    #[serde(default = "default_center_scale")]
    pub center_scale: f32,

    /// 进出场缓动
    #[serde(default)]
    pub easing: EasingFunction,
}

/// 背景车辆漂移配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundConfig {
    /// 背景槽位数量
    #[serde(default = "default_background_slots")]
    pub slots: usize,

    /// 每段路径的时长
    #[serde(default = "default_segment_duration")]
    pub segment_duration: JitterRange,

    /// 每轮的缩放
    #[serde(default = "default_background_scale")]
    pub scale: JitterRange,

    /// 每轮的透明度
    #[serde(default = "default_background_opacity")]
    pub opacity: JitterRange,

    /// 模糊半径
    #[serde(default = "default_background_blur")]
    pub blur: f32,

    /// 中点弯曲幅度
    #[serde(default = "default_curve_variation")]
    pub curve_variation: JitterRange,

    /// 是否把弯曲后的中点限制在视口内
    #[serde(default = "default_clamp_midpoint")]
    pub clamp_midpoint: bool,

    /// 两轮之间的间隔
    #[serde(default = "default_loop_gap")]
    pub loop_gap: f32,
}

/// 信息浮层配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// 浮层整体淡入时长
    #[serde(default = "default_overlay_fade")]
    pub fade_duration: f32,

    /// 单个卡片的弹出时长
    #[serde(default = "default_callout_duration")]
    pub callout_duration: f32,

    /// 相邻卡片的错开延迟
    #[serde(default = "default_callout_stagger")]
    pub callout_stagger: f32,

    /// 卡片弹出时的滑入距离
    #[serde(default = "default_callout_slide")]
    pub callout_slide: f32,

    /// 卡片弹出时的初始缩放
    #[serde(default = "default_callout_initial_scale")]
    pub callout_initial_scale: f32,
}

/// 调度配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// 两个聚光周期之间的间隔
    #[serde(default = "default_inter_cycle_delay")]
    pub inter_cycle_delay: f32,

    /// 视口尺寸变化的防抖时长
    #[serde(default = "default_resize_debounce")]
    pub resize_debounce: f32,
}

// 默认值函数
fn default_edge_margin() -> f32 {
    100.0
}

fn default_half_extent() -> f32 {
    40.0
}

fn default_entry_duration() -> JitterRange {
    JitterRange::new(2.0, 5.0)
}

fn default_exit_duration() -> JitterRange {
    JitterRange::new(2.5, 3.5)
}

fn default_dwell() -> f32 {
    3.0
}

fn default_offscreen_scale() -> f32 {
    0.7
}

fn default_offscreen_blur() -> f32 {
    4.0
}

fn default_entry_opacity() -> f32 {
    0.8
}

fn default_exit_opacity() -> f32 {
    0.5
}

fn default_center_scale() -> f32 {
    1.8
}

fn default_background_slots() -> usize {
    10
}

fn default_segment_duration() -> JitterRange {
    JitterRange::new(2.0, 4.0)
}

fn default_background_scale() -> JitterRange {
    JitterRange::new(0.5, 0.9)
}

fn default_background_opacity() -> JitterRange {
    JitterRange::new(0.6, 1.0)
}

fn default_background_blur() -> f32 {
    2.0
}

fn default_curve_variation() -> JitterRange {
    JitterRange::new(30.0, 90.0)
}

fn default_clamp_midpoint() -> bool {
    true
}

fn default_loop_gap() -> f32 {
    0.1
}

fn default_overlay_fade() -> f32 {
    0.3
}

fn default_callout_duration() -> f32 {
    0.3
}

fn default_callout_stagger() -> f32 {
    0.1
}

fn default_callout_slide() -> f32 {
    15.0
}

fn default_callout_initial_scale() -> f32 {
    0.5
}

fn default_inter_cycle_delay() -> f32 {
    0.1
}

fn default_resize_debounce() -> f32 {
    0.1
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            edge_margin: default_edge_margin(),
            half_extent: default_half_extent(),
        }
    }
}

impl Default for FeaturedConfig {
    fn default() -> Self {
        Self {
            entry_duration: default_entry_duration(),
            exit_duration: default_exit_duration(),
            dwell: default_dwell(),
            offscreen_scale: default_offscreen_scale(),
            offscreen_blur: default_offscreen_blur(),
            entry_opacity: default_entry_opacity(),
            exit_opacity: default_exit_opacity(),
            center_scale: default_center_scale(),
            easing: EasingFunction::EaseInOut,
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            slots: default_background_slots(),
            segment_duration: default_segment_duration(),
            scale: default_background_scale(),
            opacity: default_background_opacity(),
            blur: default_background_blur(),
            curve_variation: default_curve_variation(),
            clamp_midpoint: default_clamp_midpoint(),
            loop_gap: default_loop_gap(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            fade_duration: default_overlay_fade(),
            callout_duration: default_callout_duration(),
            callout_stagger: default_callout_stagger(),
            callout_slide: default_callout_slide(),
            callout_initial_scale: default_callout_initial_scale(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            inter_cycle_delay: default_inter_cycle_delay(),
            resize_debounce: default_resize_debounce(),
        }
    }
}

impl ShowcaseConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match Self::from_json(&content) {
                Ok(config) => {
                    info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 从 JSON 文本解析并验证
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("featured.entry_duration", self.featured.entry_duration),
            ("featured.exit_duration", self.featured.exit_duration),
            (
                "background.segment_duration",
                self.background.segment_duration,
            ),
            ("background.scale", self.background.scale),
            ("background.opacity", self.background.opacity),
            (
                "background.curve_variation",
                self.background.curve_variation,
            ),
        ];
        for (name, range) in ranges {
            if !range.is_valid() {
                return Err(ConfigError::Invalid(format!(
                    "{name} 必须满足 0 <= min <= max，实际为 {}..{}",
                    range.min, range.max
                )));
            }
        }

        if self.background.opacity.max > 1.0 {
            return Err(ConfigError::Invalid("background.opacity 不能超过 1.0".to_string()));
        }

        let non_negative = [
            ("geometry.edge_margin", self.geometry.edge_margin),
            ("geometry.half_extent", self.geometry.half_extent),
            ("featured.dwell", self.featured.dwell),
            ("featured.offscreen_scale", self.featured.offscreen_scale),
            ("featured.offscreen_blur", self.featured.offscreen_blur),
            ("featured.center_scale", self.featured.center_scale),
            ("background.blur", self.background.blur),
            ("background.loop_gap", self.background.loop_gap),
            ("overlay.fade_duration", self.overlay.fade_duration),
            ("overlay.callout_duration", self.overlay.callout_duration),
            ("overlay.callout_stagger", self.overlay.callout_stagger),
            (
                "overlay.callout_initial_scale",
                self.overlay.callout_initial_scale,
            ),
            ("timing.inter_cycle_delay", self.timing.inter_cycle_delay),
            ("timing.resize_debounce", self.timing.resize_debounce),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} 必须为非负有限值，实际为 {value}"
                )));
            }
        }

        let opacities = [
            ("featured.entry_opacity", self.featured.entry_opacity),
            ("featured.exit_opacity", self.featured.exit_opacity),
        ];
        for (name, value) in opacities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} 必须在 0.0 - 1.0 之间，实际为 {value}"
                )));
            }
        }

        Ok(())
    }

    /// 一个聚光周期的最短时长（入场 + 停留 + 离场 + 间隔）
    pub fn min_cycle_duration(&self) -> f32 {
        self.featured.entry_duration.min
            + self.featured.dwell
            + self.featured.exit_duration.min
            + self.timing.inter_cycle_delay
    }

    /// 一个聚光周期的最长时长
    pub fn max_cycle_duration(&self) -> f32 {
        self.featured.entry_duration.max
            + self.featured.dwell
            + self.featured.exit_duration.max
            + self.timing.inter_cycle_delay
    }
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 序列化/反序列化失败
    #[error("配置序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_default_config() {
        let config = ShowcaseConfig::default();
        assert_eq!(config.geometry.edge_margin, 100.0);
        assert_eq!(config.featured.dwell, 3.0);
        assert_eq!(config.featured.entry_duration, JitterRange::new(2.0, 5.0));
        assert_eq!(config.featured.exit_duration, JitterRange::new(2.5, 3.5));
        assert_eq!(config.background.slots, 10);
        assert!(config.background.clamp_midpoint);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "featured": { "dwell": 1.5 }, "timing": { "inter_cycle_delay": 0.0 } }"#;
        let config = ShowcaseConfig::from_json(json).unwrap();
        assert_eq!(config.featured.dwell, 1.5);
        assert_eq!(config.featured.center_scale, 1.8);
        assert_eq!(config.timing.inter_cycle_delay, 0.0);
        assert_eq!(config.timing.resize_debounce, 0.1);
        assert_eq!(config.background, BackgroundConfig::default());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = ShowcaseConfig::default();
        config.featured.entry_duration = JitterRange::new(5.0, 2.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("featured.entry_duration"));
    }

    #[test]
    fn test_validate_rejects_negative_and_opacity() {
        let mut config = ShowcaseConfig::default();
        config.geometry.edge_margin = -1.0;
        assert!(config.validate().is_err());

        let mut config = ShowcaseConfig::default();
        config.featured.exit_opacity = 1.5;
        assert!(config.validate().is_err());

        let mut config = ShowcaseConfig::default();
        config.background.opacity = JitterRange::new(0.5, 1.2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        assert!(matches!(
            ShowcaseConfig::from_json("not json"),
            Err(ConfigError::Serialization(_))
        ));
        assert!(matches!(
            ShowcaseConfig::from_json(r#"{ "featured": { "dwell": -3.0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spotlight.json");

        let mut config = ShowcaseConfig::default();
        config.background.slots = 4;
        config.save(&path).unwrap();

        let loaded = ShowcaseConfig::load(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = ShowcaseConfig::load("/nonexistent/spotlight.json");
        assert_eq!(config, ShowcaseConfig::default());
    }

    #[test]
    fn test_jitter_sample_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = JitterRange::new(2.0, 5.0);
        for _ in 0..200 {
            assert!(range.contains(range.sample(&mut rng)));
        }
        assert_eq!(JitterRange::fixed(3.0).sample(&mut rng), 3.0);
    }

    #[test]
    fn test_cycle_duration_bounds() {
        let config = ShowcaseConfig::default();
        assert!((config.min_cycle_duration() - 7.6).abs() < 1e-5);
        assert!((config.max_cycle_duration() - 11.6).abs() < 1e-5);
    }
}
