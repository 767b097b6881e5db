use crate::core::patcher::DEFAULT_FUNCTION_NAME;
use crate::core::sampler::QuotaTable;
use crate::core::tagger::default_markers;
use crate::core::ConfigProvider;
use crate::domain::model::Continent;
use crate::domain::ports::PatchFailurePolicy;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_TARGET_PATH: &str = "js/countries.js";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub target: TargetConfig,
    pub quotas: Option<BTreeMap<String, usize>>,
    pub markers: Option<BTreeMap<String, String>>,
    pub error_handling: Option<ErrorHandlingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_target_path")]
    pub path: String,
    pub function_name: Option<String>,
    pub exact_match: Option<bool>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            path: default_target_path(),
            function_name: None,
            exact_match: None,
        }
    }
}

fn default_target_path() -> String {
    DEFAULT_TARGET_PATH.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    /// "write"（預設）或 "abort"
    pub on_patch_failure: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${COUNTRIES_FILE})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    fn parse_continent(field: &str, key: &str) -> Result<Continent> {
        key.parse::<Continent>()
            .map_err(|reason| EtlError::InvalidConfigValueError {
                field: field.to_string(),
                value: key.to_string(),
                reason,
            })
    }

    /// 配額表；沒設定時用預設的 8/8/8/5/3
    pub fn quota_table(&self) -> Result<QuotaTable> {
        match &self.quotas {
            None => Ok(QuotaTable::default()),
            Some(quotas) => quotas
                .iter()
                .map(|(key, quota)| Ok((Self::parse_continent("quotas", key)?, *quota)))
                .collect::<Result<Vec<_>>>()
                .map(QuotaTable::new),
        }
    }

    /// 區段標題；覆寫的值沿用預設的比對順序
    pub fn marker_list(&self) -> Result<Vec<(Continent, String)>> {
        let mut markers = default_markers();
        if let Some(overrides) = &self.markers {
            for (key, marker) in overrides {
                let continent = Self::parse_continent("markers", key)?;
                if let Some(slot) = markers.iter_mut().find(|(c, _)| *c == continent) {
                    slot.1 = marker.clone();
                }
            }
        }
        Ok(markers)
    }

    pub fn failure_policy(&self) -> Result<PatchFailurePolicy> {
        let value = self
            .error_handling
            .as_ref()
            .and_then(|e| e.on_patch_failure.as_deref())
            .unwrap_or("write");

        crate::utils::validation::validate_one_of(
            "error_handling.on_patch_failure",
            value,
            &["write", "abort"],
        )?;

        Ok(match value {
            "abort" => PatchFailurePolicy::Abort,
            _ => PatchFailurePolicy::Write,
        })
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_path("target.path", &self.target.path)?;
        validate_identifier("target.function_name", self.function_name())?;

        self.quota_table()?.validate()?;

        for (continent, marker) in self.marker_list()? {
            validate_non_empty_string(&format!("markers.{}", continent), &marker)?;
        }

        self.failure_policy()?;
        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn target_path(&self) -> &str {
        &self.target.path
    }

    fn function_name(&self) -> &str {
        self.target
            .function_name
            .as_deref()
            .unwrap_or(DEFAULT_FUNCTION_NAME)
    }

    fn quotas(&self) -> QuotaTable {
        self.quota_table().unwrap_or_default()
    }

    fn markers(&self) -> Vec<(Continent, String)> {
        self.marker_list().unwrap_or_else(|_| default_markers())
    }

    fn patch_failure_policy(&self) -> PatchFailurePolicy {
        self.failure_policy().unwrap_or_default()
    }

    fn exact_match(&self) -> bool {
        self.target.exact_match.unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
