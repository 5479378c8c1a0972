//! # Listing 模块
//!
//! 合作伙伴发布车辆时的分步表单草稿。
//!
//! 表单分为七步，每一步有自己的必填项。提交前按步骤顺序逐步校验，
//! 第一处未通过的步骤就是宿主应当跳转回去的步骤。
//! 这里只负责校验和预览，不负责上传照片或写入后端。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::VehicleRecord;
use crate::error::{CatalogError, ListingError};

/// 可选车型
pub const VEHICLE_TYPES: [&str; 5] = ["van", "campervan", "fourgon", "4x4", "minivan"];

/// 可选燃料
pub const FUEL_TYPES: [&str; 4] = ["diesel", "essence", "hybride", "electrique"];

/// 可选变速箱
pub const TRANSMISSIONS: [&str; 2] = ["manuelle", "automatique"];

/// 可选装备
pub const EQUIPMENT: [&str; 18] = [
    "wifi",
    "cuisine",
    "frigo",
    "douche",
    "wc",
    "chauffage",
    "climatisation",
    "lit_double",
    "lit_simple",
    "convertible",
    "table",
    "rangements",
    "panneaux_solaires",
    "prise_220v",
    "usb",
    "store",
    "porte_velos",
    "coffre_toit",
];

/// 未填写周租价格时，按七天日租打九折
const WEEKLY_DISCOUNT: f32 = 0.9;

/// 表单步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStep {
    /// 品牌、型号、车型
    Informations,
    /// 燃料、变速箱、座位
    Characteristics,
    /// 日租、周租、押金
    Pricing,
    /// 取车地点
    Location,
    /// 标题与描述
    Description,
    /// 装备清单
    Equipment,
    /// 照片
    Photos,
}

impl ListingStep {
    /// 全部步骤，按表单顺序
    pub const ALL: [ListingStep; 7] = [
        ListingStep::Informations,
        ListingStep::Characteristics,
        ListingStep::Pricing,
        ListingStep::Location,
        ListingStep::Description,
        ListingStep::Equipment,
        ListingStep::Photos,
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// 下一步，最后一步返回 `None`
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.position() + 1).copied()
    }

    /// 上一步，第一步返回 `None`
    pub fn previous(self) -> Option<Self> {
        self.position().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// 显示名称
    pub fn label(self) -> &'static str {
        match self {
            ListingStep::Informations => "基本信息",
            ListingStep::Characteristics => "车辆参数",
            ListingStep::Pricing => "价格",
            ListingStep::Location => "地点",
            ListingStep::Description => "描述",
            ListingStep::Equipment => "装备",
            ListingStep::Photos => "照片",
        }
    }
}

impl fmt::Display for ListingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ListingStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "informations" | "info" => Ok(Self::Informations),
            "characteristics" | "specs" => Ok(Self::Characteristics),
            "pricing" => Ok(Self::Pricing),
            "location" => Ok(Self::Location),
            "description" => Ok(Self::Description),
            "equipment" => Ok(Self::Equipment),
            "photos" => Ok(Self::Photos),
            other => Err(format!("未知的表单步骤: {other}")),
        }
    }
}

/// 发布车辆的表单草稿
///
/// 所有字段都可以缺省，缺省值与空白表单一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleDraft {
    pub brand: String,
    pub model: String,
    pub year: Option<u16>,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub registration: String,

    pub capacity: u32,
    pub beds: u32,
    pub fuel_type: String,
    pub transmission: String,
    pub mileage: Option<u32>,

    pub price_per_day: Option<f32>,
    pub price_per_week: Option<f32>,
    pub deposit: Option<f32>,

    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub title: String,
    pub description: String,

    /// 装备 ID，取自 [`EQUIPMENT`]
    pub equipment: Vec<String>,
    /// 已上传照片的地址
    pub photos: Vec<String>,
}

impl Default for VehicleDraft {
    fn default() -> Self {
        Self {
            brand: String::new(),
            model: String::new(),
            year: None,
            vehicle_type: String::new(),
            registration: String::new(),
            capacity: 2,
            beds: 2,
            fuel_type: String::new(),
            transmission: String::new(),
            mileage: None,
            price_per_day: None,
            price_per_week: None,
            deposit: None,
            location: String::new(),
            latitude: None,
            longitude: None,
            title: String::new(),
            description: String::new(),
            equipment: Vec::new(),
            photos: Vec::new(),
        }
    }
}

impl VehicleDraft {
    /// 从 JSON 解析草稿
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(content)?)
    }

    /// 校验单个步骤
    pub fn validate_step(&self, step: ListingStep) -> Result<(), ListingError> {
        match step {
            ListingStep::Informations => {
                require(
                    step,
                    [
                        ("brand", &self.brand),
                        ("model", &self.model),
                        ("type", &self.vehicle_type),
                    ],
                )?;
                one_of(step, "type", &self.vehicle_type, &VEHICLE_TYPES)
            }
            ListingStep::Characteristics => {
                require(
                    step,
                    [
                        ("fuel_type", &self.fuel_type),
                        ("transmission", &self.transmission),
                    ],
                )?;
                one_of(step, "fuel_type", &self.fuel_type, &FUEL_TYPES)?;
                one_of(step, "transmission", &self.transmission, &TRANSMISSIONS)?;
                if self.capacity == 0 {
                    return Err(invalid(step, "capacity", self.capacity));
                }
                Ok(())
            }
            ListingStep::Pricing => self.validate_pricing(),
            ListingStep::Location => {
                require(step, [("location", &self.location)])?;
                if let Some(lat) = self.latitude.filter(|v| !(-90.0..=90.0).contains(v)) {
                    return Err(invalid(step, "latitude", lat));
                }
                if let Some(lng) = self.longitude.filter(|v| !(-180.0..=180.0).contains(v)) {
                    return Err(invalid(step, "longitude", lng));
                }
                Ok(())
            }
            ListingStep::Description => require(
                step,
                [("title", &self.title), ("description", &self.description)],
            ),
            ListingStep::Equipment => self
                .equipment
                .iter()
                .try_for_each(|id| one_of(step, "equipment", id, &EQUIPMENT)),
            ListingStep::Photos => {
                if self.photos.iter().all(|p| p.trim().is_empty()) {
                    Err(ListingError::NoPhotos)
                } else {
                    Ok(())
                }
            }
        }
    }

    fn validate_pricing(&self) -> Result<(), ListingError> {
        let step = ListingStep::Pricing;
        let missing: Vec<&'static str> = [
            ("price_per_day", self.price_per_day),
            ("deposit", self.deposit),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(ListingError::MissingFields {
                step,
                fields: missing,
            });
        }

        if let Some(price) = self.price_per_day.filter(|p| !(p.is_finite() && *p > 0.0)) {
            return Err(invalid(step, "price_per_day", price));
        }
        if let Some(price) = self.price_per_week.filter(|p| !(p.is_finite() && *p > 0.0)) {
            return Err(invalid(step, "price_per_week", price));
        }
        if let Some(deposit) = self.deposit.filter(|d| !(d.is_finite() && *d >= 0.0)) {
            return Err(invalid(step, "deposit", deposit));
        }
        Ok(())
    }

    /// 按表单顺序校验全部步骤，返回第一处错误
    pub fn validate(&self) -> Result<(), ListingError> {
        let result = ListingStep::ALL
            .iter()
            .try_for_each(|step| self.validate_step(*step));
        if let Err(err) = &result {
            debug!(step = %err.step(), error = %err, "车辆草稿未通过校验");
        }
        result
    }

    /// 第一个未通过校验的步骤
    pub fn first_invalid_step(&self) -> Option<ListingStep> {
        self.validate().err().map(|err| err.step())
    }

    /// 周租价格，未填写时按日租推算
    pub fn weekly_price(&self) -> Option<f32> {
        self.price_per_week
            .or_else(|| self.price_per_day.map(|p| p * 7.0 * WEEKLY_DISCOUNT))
    }

    /// 生成车辆记录预览
    ///
    /// 草稿必须完整通过校验；新车辆没有评价，默认可预订。
    pub fn to_record(&self, id: impl Into<String>) -> Result<VehicleRecord, ListingError> {
        self.validate()?;
        Ok(VehicleRecord {
            id: id.into(),
            name: self.title.trim().to_string(),
            vehicle_type: self.vehicle_type.clone(),
            location: self.location.trim().to_string(),
            price_per_day: self.price_per_day.unwrap_or_default(),
            capacity: self.capacity,
            rating: 0.0,
            reviews_count: 0,
            images: self.photos.clone(),
            features: self.equipment.clone(),
            fuel_type: self.fuel_type.clone(),
            transmission: self.transmission.clone(),
            available: true,
        })
    }
}

/// 必填字段不能为空白
fn require<const N: usize>(
    step: ListingStep,
    fields: [(&'static str, &String); N],
) -> Result<(), ListingError> {
    let missing: Vec<&'static str> = fields
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ListingError::MissingFields {
            step,
            fields: missing,
        })
    }
}

fn one_of(
    step: ListingStep,
    field: &'static str,
    value: &str,
    options: &[&str],
) -> Result<(), ListingError> {
    if options.contains(&value.trim()) {
        Ok(())
    } else {
        Err(ListingError::UnknownOption {
            step,
            field,
            value: value.to_string(),
        })
    }
}

fn invalid(step: ListingStep, field: &'static str, value: impl fmt::Display) -> ListingError {
    ListingError::InvalidValue {
        step,
        field,
        value: value.to_string(),
    }
}
