//! # Error 模块
//!
//! 定义 spotlight-runtime 中使用的错误类型。
//!
//! 动画运行期间没有可恢复的错误：图片缺失降级为占位图，
//! 视口不可测量时推迟启动。这里的错误只出现在构建阶段。
//! 发布表单的校验错误单独放在 [`ListingError`] 中。

use thiserror::Error;

use crate::listing::ListingStep;

/// 聚光展示错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShowcaseError {
    /// 聚光车辆池为空
    #[error("聚光车辆池不能为空")]
    EmptyFeaturedPool,

    /// 同一车辆同时出现在聚光池和背景池
    #[error("车辆 {id} 同时出现在聚光池和背景池")]
    OverlappingPools { id: u32 },

    /// 同一池内出现重复 ID
    #[error("车辆 ID {id} 重复")]
    DuplicateItem { id: u32 },

    /// 评分超出 0..=100
    #[error("车辆 {id} 的评分 {score} 超出 0-100 范围")]
    ScoreOutOfRange { id: u32, score: u32 },

    /// 视口尺寸不可测量（零或非有限值）
    #[error("视口尺寸不可测量: {width}x{height}")]
    UnmeasurableViewport { width: f32, height: f32 },
}

/// 目录数据错误
#[derive(Error, Debug)]
pub enum CatalogError {
    /// JSON 解析失败
    #[error("车辆记录解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    /// 读取失败
    #[error("车辆记录读取失败: {0}")]
    Io(#[from] std::io::Error),

    /// 转换后的车辆池无效
    #[error("车辆池无效: {0}")]
    Pool(#[from] ShowcaseError),
}

/// 发布表单校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ListingError {
    /// 必填项为空
    #[error("{step}: 缺少必填项 {}", .fields.join("、"))]
    MissingFields {
        step: ListingStep,
        fields: Vec<&'static str>,
    },

    /// 数值不合法
    #[error("{step}: {field} 的取值 {value} 无效")]
    InvalidValue {
        step: ListingStep,
        field: &'static str,
        value: String,
    },

    /// 不在可选列表中
    #[error("{step}: {field} 不支持 {value}")]
    UnknownOption {
        step: ListingStep,
        field: &'static str,
        value: String,
    },

    /// 没有照片
    #[error("至少需要上传一张照片")]
    NoPhotos,
}

impl ListingError {
    /// 出错的表单步骤
    pub fn step(&self) -> ListingStep {
        match self {
            ListingError::MissingFields { step, .. }
            | ListingError::InvalidValue { step, .. }
            | ListingError::UnknownOption { step, .. } => *step,
            ListingError::NoPhotos => ListingStep::Photos,
        }
    }
}

/// Result 类型别名
pub type ShowcaseResult<T> = Result<T, ShowcaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ShowcaseError::OverlappingPools { id: 3 };
        assert_eq!(err.to_string(), "车辆 3 同时出现在聚光池和背景池");

        let err = ShowcaseError::ScoreOutOfRange { id: 7, score: 120 };
        assert!(err.to_string().contains("120"));
    }

    #[test]
    fn test_catalog_error_from_pool() {
        let err: CatalogError = ShowcaseError::EmptyFeaturedPool.into();
        assert!(matches!(err, CatalogError::Pool(ShowcaseError::EmptyFeaturedPool)));
    }

    #[test]
    fn test_listing_error_step() {
        let err = ListingError::UnknownOption {
            step: ListingStep::Characteristics,
            field: "fuel_type",
            value: "charbon".to_string(),
        };
        assert_eq!(err.step(), ListingStep::Characteristics);
        assert_eq!(err.to_string(), "车辆参数: fuel_type 不支持 charbon");
        assert_eq!(ListingError::NoPhotos.step(), ListingStep::Photos);
    }
}
