//! # Item 模块
//!
//! 展示车辆与车辆池。
//!
//! 车辆池在挂载前一次性给定，运行期间不可变。
//! 聚光池与背景池按 ID 互斥，背景车辆永远不会出现信息浮层。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ShowcaseError, ShowcaseResult};

/// 占位图资源
pub const PLACEHOLDER_IMAGE: &str = "placeholder://vehicle";

/// 展示车辆
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowcaseItem {
    pub id: u32,
    pub display_name: String,
    /// 价格文案，如 `"189€"`
    pub price_label: String,
    /// 评分 (0 - 100)
    pub score: u32,
    /// 载客文案，如 `"4 pers"`
    pub capacity_label: String,
    /// 图片地址，可能为空或无效
    #[serde(default)]
    pub image_ref: String,
}

/// 解析后的图片来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "src", rename_all = "snake_case")]
pub enum ImageSource {
    /// 可用的远程地址
    Remote(String),
    /// 相对资源路径
    Asset(String),
    /// 地址缺失或无效，使用占位图
    Placeholder,
}

impl ImageSource {
    /// 渲染时实际使用的地址
    pub fn src(&self) -> &str {
        match self {
            ImageSource::Remote(src) | ImageSource::Asset(src) => src,
            ImageSource::Placeholder => PLACEHOLDER_IMAGE,
        }
    }
}

/// 浮层显示的车辆信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowcaseMetadata {
    pub name: String,
    pub price: String,
    pub score: u32,
    pub capacity: String,
}

impl ShowcaseItem {
    /// 创建展示车辆
    pub fn new(
        id: u32,
        display_name: impl Into<String>,
        price_label: impl Into<String>,
        score: u32,
        capacity_label: impl Into<String>,
        image_ref: impl Into<String>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            price_label: price_label.into(),
            score,
            capacity_label: capacity_label.into(),
            image_ref: image_ref.into(),
        }
    }

    /// 解析图片地址
    ///
    /// 绝对地址必须是 http(s)；相对路径不能为空且不能包含空白。
    /// 其他情况一律降级为占位图，不影响动画状态机。
    pub fn image(&self) -> ImageSource {
        let raw = self.image_ref.trim();
        if raw.is_empty() {
            return ImageSource::Placeholder;
        }

        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
                ImageSource::Remote(url.to_string())
            }
            Ok(_) => ImageSource::Placeholder,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                if raw.chars().any(char::is_whitespace) {
                    ImageSource::Placeholder
                } else {
                    ImageSource::Asset(raw.to_string())
                }
            }
            Err(_) => ImageSource::Placeholder,
        }
    }

    /// 浮层信息
    pub fn metadata(&self) -> ShowcaseMetadata {
        ShowcaseMetadata {
            name: self.display_name.clone(),
            price: self.price_label.clone(),
            score: self.score,
            capacity: self.capacity_label.clone(),
        }
    }
}

/// 车辆池
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowcasePool {
    featured: Vec<ShowcaseItem>,
    #[serde(default)]
    background: Vec<ShowcaseItem>,
}

impl ShowcasePool {
    /// 创建并校验车辆池
    ///
    /// - 聚光池不能为空
    /// - 评分不能超过 100
    /// - 池内 ID 不能重复，两个池之间不能有相同 ID
    pub fn new(featured: Vec<ShowcaseItem>, background: Vec<ShowcaseItem>) -> ShowcaseResult<Self> {
        let pool = Self {
            featured,
            background,
        };
        pool.validate()?;
        Ok(pool)
    }

    /// 从 JSON 解析并校验
    pub fn from_json(content: &str) -> Result<Self, crate::error::CatalogError> {
        let pool: Self = serde_json::from_str(content)?;
        pool.validate()?;
        Ok(pool)
    }

    /// 校验车辆池
    pub fn validate(&self) -> ShowcaseResult<()> {
        if self.featured.is_empty() {
            return Err(ShowcaseError::EmptyFeaturedPool);
        }

        for item in self.featured.iter().chain(&self.background) {
            if item.score > 100 {
                return Err(ShowcaseError::ScoreOutOfRange {
                    id: item.id,
                    score: item.score,
                });
            }
        }

        let featured_ids = unique_ids(&self.featured)?;
        let background_ids = unique_ids(&self.background)?;
        if let Some(id) = featured_ids.intersection(&background_ids).min() {
            return Err(ShowcaseError::OverlappingPools { id: *id });
        }

        Ok(())
    }

    /// 聚光车辆
    pub fn featured(&self) -> &[ShowcaseItem] {
        &self.featured
    }

    /// 背景车辆
    pub fn background(&self) -> &[ShowcaseItem] {
        &self.background
    }

    /// 背景槽位分配
    ///
    /// 第 `i` 个槽位显示 `background[i % background.len()]`；
    /// 背景池为空时没有槽位。
    pub fn background_slots(&self, slots: usize) -> Vec<&ShowcaseItem> {
        if self.background.is_empty() {
            return Vec::new();
        }
        (0..slots)
            .map(|i| &self.background[i % self.background.len()])
            .collect()
    }

    /// 内置车辆池
    ///
    /// 前 5 辆为聚光车辆，其余 10 辆用于背景漂移。
    pub fn builtin() -> Self {
        const IMAGE_BASE: &str = "https://images.unsplash.com/photo-";
        const IMAGE_QUERY: &str = "?q=80&w=1760&auto=format&fit=crop";

        const PHOTOS: [&str; 15] = [
            "1561361513-2d000a50f0dc",
            "1533591380348-14193f1de18f",
            "1543965170-4c01a586684e",
            "1527786356703-4b100091cd2c",
            "1566933293069-b55c7f326dd4",
            "1523987355523-c7b5b0dd90a7",
            "1464207687429-7505649dae38",
            "1469854523086-cc02fe5d8800",
            "1519046904884-53103b34b206",
            "1493238792000-8113da705763",
            "1489686995744-f47e995ffe61",
            "1516939884455-1445c8652f83",
            "1502672023488-70e25813eb80",
            "1502744688674-c619d1586c9e",
            "1519885277449-12eee5564d68",
        ];

        let rows: [(&str, &str, u32, &str); 15] = [
            ("Mercedes Marco Polo", "189€", 95, "4 pers"),
            ("Volkswagen California Ocean", "159€", 92, "4 pers"),
            ("Ford Transit Custom Nugget", "145€", 88, "4 pers"),
            ("Fiat Ducato Hymer", "175€", 90, "6 pers"),
            ("Citroën SpaceTourer Camper", "135€", 86, "5 pers"),
            ("Peugeot Boxer Aménagé", "125€", 84, "4 pers"),
            ("Renault Trafic SpaceClass", "115€", 82, "4 pers"),
            ("Nissan Primastar Camper", "120€", 83, "4 pers"),
            ("Opel Vivaro Life", "110€", 80, "5 pers"),
            ("Toyota Proace Verso", "130€", 85, "6 pers"),
            ("Iveco Daily Camper", "165€", 87, "6 pers"),
            ("Man TGE Camper Van", "155€", 89, "4 pers"),
            ("Volkswagen Crafter", "170€", 91, "5 pers"),
            ("Mercedes Vito Marco Polo", "140€", 86, "4 pers"),
            ("Citroën Jumpy Camper", "105€", 79, "4 pers"),
        ];

        let mut items: Vec<ShowcaseItem> = rows
            .iter()
            .zip(PHOTOS)
            .enumerate()
            .map(|(index, (&(name, price, score, capacity), photo))| {
                ShowcaseItem::new(
                    index as u32 + 1,
                    name,
                    price,
                    score,
                    capacity,
                    format!("{IMAGE_BASE}{photo}{IMAGE_QUERY}"),
                )
            })
            .collect();
        let background = items.split_off(5);

        Self {
            featured: items,
            background,
        }
    }
}

fn unique_ids(items: &[ShowcaseItem]) -> ShowcaseResult<HashSet<u32>> {
    let mut ids = HashSet::with_capacity(items.len());
    for item in items {
        if !ids.insert(item.id) {
            return Err(ShowcaseError::DuplicateItem { id: item.id });
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u32) -> ShowcaseItem {
        ShowcaseItem::new(
            id,
            format!("Van {id}"),
            "100€",
            80,
            "4 pers",
            "vans/van.jpg",
        )
    }

    #[test]
    fn test_builtin_pool() {
        let pool = ShowcasePool::builtin();
        assert_eq!(pool.featured().len(), 5);
        assert_eq!(pool.background().len(), 10);
        assert!(pool.validate().is_ok());
        assert_eq!(pool.featured()[0].display_name, "Mercedes Marco Polo");
        assert!(matches!(pool.featured()[0].image(), ImageSource::Remote(_)));
    }

    #[test]
    fn test_empty_featured_rejected() {
        let err = ShowcasePool::new(vec![], vec![item(1)]).unwrap_err();
        assert_eq!(err, ShowcaseError::EmptyFeaturedPool);
    }

    #[test]
    fn test_overlap_rejected() {
        let err = ShowcasePool::new(vec![item(1), item(2)], vec![item(3), item(2)]).unwrap_err();
        assert_eq!(err, ShowcaseError::OverlappingPools { id: 2 });
    }

    #[test]
    fn test_duplicate_and_score_rejected() {
        let err = ShowcasePool::new(vec![item(1), item(1)], vec![]).unwrap_err();
        assert_eq!(err, ShowcaseError::DuplicateItem { id: 1 });

        let mut bad = item(9);
        bad.score = 101;
        let err = ShowcasePool::new(vec![bad], vec![]).unwrap_err();
        assert_eq!(err, ShowcaseError::ScoreOutOfRange { id: 9, score: 101 });
    }

    #[test]
    fn test_background_slots_cycle() {
        let pool = ShowcasePool::new(vec![item(1)], vec![item(10), item(11), item(12)]).unwrap();
        let ids: Vec<u32> = pool.background_slots(5).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![10, 11, 12, 10, 11]);

        let lonely = ShowcasePool::new(vec![item(1)], vec![]).unwrap();
        assert!(lonely.background_slots(10).is_empty());
    }

    #[test]
    fn test_image_fallback() {
        let mut v = item(1);
        assert_eq!(v.image(), ImageSource::Asset("vans/van.jpg".to_string()));

        v.image_ref = String::new();
        assert_eq!(v.image(), ImageSource::Placeholder);
        assert_eq!(v.image().src(), PLACEHOLDER_IMAGE);

        v.image_ref = "ftp://example.com/van.jpg".to_string();
        assert_eq!(v.image(), ImageSource::Placeholder);

        v.image_ref = "not a path".to_string();
        assert_eq!(v.image(), ImageSource::Placeholder);

        v.image_ref = "https://cdn.example.com/van.jpg".to_string();
        assert_eq!(
            v.image(),
            ImageSource::Remote("https://cdn.example.com/van.jpg".to_string())
        );
    }

    #[test]
    fn test_metadata() {
        let meta = ShowcasePool::builtin().featured()[3].metadata();
        assert_eq!(meta.name, "Fiat Ducato Hymer");
        assert_eq!(meta.price, "175€");
        assert_eq!(meta.score, 90);
        assert_eq!(meta.capacity, "6 pers");
    }

    #[test]
    fn test_pool_from_json() {
        let json = r#"{
            "featured": [
                { "id": 1, "display_name": "A", "price_label": "99€", "score": 90, "capacity_label": "2 pers" }
            ]
        }"#;
        let pool = ShowcasePool::from_json(json).unwrap();
        assert_eq!(pool.featured().len(), 1);
        assert!(pool.background().is_empty());
        assert_eq!(pool.featured()[0].image(), ImageSource::Placeholder);
    }
}
