use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::AppError;

/// SKU 最大长度 (custom_cogs.sku 列宽)
pub const MAX_SKU_LEN: usize = 255;

/// 店铺 COGS 设置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// 默认 COGS 百分比 (0-100), 未配置自定义成本的 SKU 使用
    #[serde(rename = "defaultCOGSPercentage", default)]
    pub default_cogs_percentage: BigDecimal,
    /// SKU -> 单位成本
    #[serde(rename = "customCOGS", default)]
    pub custom_cogs: HashMap<String, BigDecimal>,
}

impl StoreSettings {
    pub fn unit_cost_for(&self, sku: &str) -> Option<&BigDecimal> {
        self.custom_cogs.get(sku)
    }

    /// 去除 SKU 首尾空白; 去空白后重复的 SKU 无法确定取哪个成本, 直接拒绝
    pub fn normalized(self) -> Result<Self, AppError> {
        let mut custom_cogs = HashMap::with_capacity(self.custom_cogs.len());
        for (sku, cost) in self.custom_cogs {
            let key = sku.trim().to_string();
            if custom_cogs.insert(key.clone(), cost).is_some() {
                return Err(AppError::InvalidSettings(format!(
                    "customCOGS contains SKU {} more than once after trimming",
                    key
                )));
            }
        }

        Ok(Self {
            default_cogs_percentage: self.default_cogs_percentage,
            custom_cogs,
        })
    }

    /// 校验百分比范围及单位成本非负
    pub fn validate(&self) -> Result<(), AppError> {
        let hundred = BigDecimal::from(100);
        if self.default_cogs_percentage < BigDecimal::zero() || self.default_cogs_percentage > hundred {
            return Err(AppError::InvalidSettings(format!(
                "defaultCOGSPercentage must be between 0 and 100, got {}",
                self.default_cogs_percentage
            )));
        }

        if let Some((sku, cost)) = self.custom_cogs.iter().find(|(_, c)| **c < BigDecimal::zero()) {
            return Err(AppError::InvalidSettings(format!(
                "customCOGS for SKU {} must not be negative, got {}",
                sku, cost
            )));
        }

        if self.custom_cogs.keys().any(|sku| sku.trim().is_empty()) {
            return Err(AppError::InvalidSettings("customCOGS contains an empty SKU".to_string()));
        }

        if let Some(sku) = self.custom_cogs.keys().find(|sku| sku.chars().count() > MAX_SKU_LEN) {
            return Err(AppError::InvalidSettings(format!(
                "customCOGS SKU {}... exceeds {} characters",
                sku.chars().take(32).collect::<String>(),
                MAX_SKU_LEN
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn deserializes_ui_payload() {
        let settings: StoreSettings = serde_json::from_str(
            r#"{"defaultCOGSPercentage": "30", "customCOGS": {"TSHIRT-RED": "4.25"}}"#,
        )
        .unwrap();

        assert_eq!(settings.default_cogs_percentage, BigDecimal::from(30));
        assert_eq!(
            settings.unit_cost_for("TSHIRT-RED"),
            Some(&BigDecimal::from_str("4.25").unwrap())
        );
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_percentage() {
        let settings = StoreSettings {
            default_cogs_percentage: BigDecimal::from(101),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(AppError::InvalidSettings(_))));
    }

    #[test]
    fn rejects_negative_unit_cost() {
        let mut settings = StoreSettings::default();
        settings.custom_cogs.insert("SKU-1".to_string(), BigDecimal::from(-1));
        assert!(matches!(settings.validate(), Err(AppError::InvalidSettings(_))));
    }

    #[test]
    fn trimmed_duplicate_skus_are_rejected() {
        let mut settings = StoreSettings::default();
        settings.custom_cogs.insert("X".to_string(), BigDecimal::from(1));
        settings.custom_cogs.insert(" X ".to_string(), BigDecimal::from(2));
        assert!(matches!(settings.normalized(), Err(AppError::InvalidSettings(_))));
    }

    #[test]
    fn normalized_trims_sku_keys() {
        let mut settings = StoreSettings::default();
        settings.custom_cogs.insert(" MUG-1 ".to_string(), BigDecimal::from(3));
        let settings = settings.normalized().unwrap();
        assert_eq!(settings.unit_cost_for("MUG-1"), Some(&BigDecimal::from(3)));
    }

    #[test]
    fn rejects_overlong_sku() {
        let mut settings = StoreSettings::default();
        settings.custom_cogs.insert("S".repeat(MAX_SKU_LEN + 1), BigDecimal::from(1));
        assert!(matches!(settings.validate(), Err(AppError::InvalidSettings(_))));
    }
}
