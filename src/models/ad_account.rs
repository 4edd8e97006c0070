use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 广告平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdPlatform {
    Meta,
    Google,
}

impl AdPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdPlatform::Meta => "meta",
            AdPlatform::Google => "google",
        }
    }
}

impl fmt::Display for AdPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meta" | "facebook" => Ok(AdPlatform::Meta),
            "google" => Ok(AdPlatform::Google),
            other => Err(format!("unknown ad platform: {}", other)),
        }
    }
}

/// 已关联的广告账户
///
/// `access_token` 只接受反序列化, 不会出现在响应或日志中
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdAccount {
    pub platform: AdPlatform,
    pub account_id: String,
    #[serde(skip_serializing)]
    pub access_token: String,
}

impl fmt::Debug for AdAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdAccount")
            .field("platform", &self.platform)
            .field("account_id", &self.account_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_never_leaves_the_process() {
        let account = AdAccount {
            platform: AdPlatform::Google,
            account_id: "123-456-7890".to_string(),
            access_token: "ya29.secret".to_string(),
        };

        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, r#"{"platform":"google","accountId":"123-456-7890"}"#);
        assert!(!format!("{:?}", account).contains("ya29"));
    }

    #[test]
    fn parses_platform_names() {
        assert_eq!("Meta".parse::<AdPlatform>(), Ok(AdPlatform::Meta));
        assert_eq!("google".parse::<AdPlatform>(), Ok(AdPlatform::Google));
        assert!("tiktok".parse::<AdPlatform>().is_err());
    }
}
