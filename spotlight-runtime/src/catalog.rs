//! # Catalog 模块
//!
//! 后端车辆记录到展示车辆的转换。
//!
//! 记录以 JSON 数组的形式提供，字段与车辆列表接口一致。
//! 这里同时实现车辆列表页使用的筛选与价格排序，以及按评分挑选聚光车辆。

use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CatalogError;
use crate::item::{ShowcaseItem, ShowcasePool};

/// 评分上限（五星制）
const MAX_RATING: f32 = 5.0;

/// 后端车辆记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: String,
    pub name: String,
    /// 车型，如 `van`、`camping_car`
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub location: String,
    pub price_per_day: f32,
    pub capacity: u32,
    /// 平均评分 (0 - 5)
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub reviews_count: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub fuel_type: String,
    #[serde(default)]
    pub transmission: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl VehicleRecord {
    /// 百分制评分
    pub fn score(&self) -> u32 {
        let rating = if self.rating.is_finite() {
            self.rating.clamp(0.0, MAX_RATING)
        } else {
            0.0
        };
        ((rating * 20.0).round() as u32).min(100)
    }
}

impl ShowcaseItem {
    /// 由车辆记录生成展示车辆
    ///
    /// 记录 ID 是字符串，展示 ID 由调用方分配。
    pub fn from_record(record: &VehicleRecord, id: u32) -> Self {
        ShowcaseItem::new(
            id,
            record.name.clone(),
            format!("{}€", record.price_per_day),
            record.score(),
            format!("{} pers", record.capacity),
            record.images.first().cloned().unwrap_or_default(),
        )
    }
}

impl ShowcasePool {
    /// 由车辆记录生成车辆池
    ///
    /// 按评分排序后前 `featured_count` 辆作为聚光车辆，其余进入背景；
    /// 展示 ID 为排序后的位置（从 1 开始）。
    pub fn from_records(
        records: &[VehicleRecord],
        featured_count: usize,
    ) -> Result<Self, CatalogError> {
        let mut items: Vec<ShowcaseItem> = rank_by_rating(records.iter())
            .into_iter()
            .enumerate()
            .map(|(index, record)| ShowcaseItem::from_record(record, index as u32 + 1))
            .collect();

        let background = items.split_off(featured_count.min(items.len()));
        debug!(
            featured = items.len(),
            background = background.len(),
            "由车辆记录生成车辆池"
        );
        Ok(ShowcasePool::new(items, background)?)
    }
}

/// 价格排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSort {
    #[default]
    Asc,
    Desc,
}

impl FromStr for PriceSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("未知的排序方向: {other}")),
        }
    }
}

/// 车辆列表筛选条件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleFilter {
    /// 车型，`None` 或 `"all"` 表示不限
    pub vehicle_type: Option<String>,
    /// 地点关键字（不区分大小写的子串匹配）
    pub location: Option<String>,
    /// 最少载客数
    pub min_capacity: Option<u32>,
    pub min_price: Option<f32>,
    pub max_price: Option<f32>,
    pub price_sort: PriceSort,
    /// 只保留可预订的车辆
    pub available_only: bool,
}

impl VehicleFilter {
    /// 单条记录是否满足条件
    pub fn matches(&self, record: &VehicleRecord) -> bool {
        if let Some(kind) = self.vehicle_type.as_deref() {
            if kind != "all" && record.vehicle_type != kind {
                return false;
            }
        }
        if let Some(location) = self.location.as_deref() {
            let needle = location.trim().to_lowercase();
            if !needle.is_empty() && !record.location.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if self.min_capacity.is_some_and(|min| record.capacity < min) {
            return false;
        }
        if self.min_price.is_some_and(|min| record.price_per_day < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| record.price_per_day > max) {
            return false;
        }
        if self.available_only && !record.available {
            return false;
        }
        true
    }

    /// 筛选并按价格排序
    pub fn apply<'a>(&self, records: &'a [VehicleRecord]) -> Vec<&'a VehicleRecord> {
        let mut matched: Vec<&VehicleRecord> = records
            .iter()
            .filter(|record| self.matches(record))
            .collect();
        matched.sort_by(|a, b| {
            let order = a.price_per_day.total_cmp(&b.price_per_day);
            match self.price_sort {
                PriceSort::Asc => order,
                PriceSort::Desc => order.reverse(),
            }
        });
        matched
    }
}

/// 评分最高的 `limit` 辆车
///
/// 没有评价的车辆不参与排名；评分相同时评价数多的在前。
pub fn top_rated(records: &[VehicleRecord], limit: usize) -> Vec<&VehicleRecord> {
    let mut ranked = rank_by_rating(records.iter().filter(|r| r.reviews_count > 0));
    ranked.truncate(limit);
    ranked
}

fn rank_by_rating<'a>(records: impl Iterator<Item = &'a VehicleRecord>) -> Vec<&'a VehicleRecord> {
    let mut ranked: Vec<&VehicleRecord> = records.collect();
    ranked.sort_by(|a, b| match b.rating.total_cmp(&a.rating) {
        Ordering::Equal => b.reviews_count.cmp(&a.reviews_count),
        other => other,
    });
    ranked
}

/// 解析 JSON 车辆记录数组
pub fn parse_records(content: &str) -> Result<Vec<VehicleRecord>, CatalogError> {
    Ok(serde_json::from_str(content)?)
}

/// 从文件读取车辆记录
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<VehicleRecord>, CatalogError> {
    let content = fs::read_to_string(path)?;
    parse_records(&content)
}
