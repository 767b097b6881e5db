use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 固定的五大洲分類，順序即抽樣時的處理順序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Continent {
    Europe,
    Asia,
    Africa,
    Americas,
    Oceania,
}

impl Continent {
    pub const ALL: [Continent; 5] = [
        Continent::Europe,
        Continent::Asia,
        Continent::Africa,
        Continent::Americas,
        Continent::Oceania,
    ];

    /// 寫進資料檔的值
    pub fn as_str(&self) -> &'static str {
        match self {
            Continent::Europe => "Europe",
            Continent::Asia => "Asia",
            Continent::Africa => "Africa",
            Continent::Americas => "Americas",
            Continent::Oceania => "Oceania",
        }
    }

    /// 區段標題上顯示的名稱
    pub fn display_label(&self) -> &'static str {
        match self {
            Continent::Oceania => "Oceania & Others",
            other => other.as_str(),
        }
    }

    /// 前端介面用的土耳其文名稱
    pub fn local_label(&self) -> &'static str {
        match self {
            Continent::Europe => "Avrupa",
            Continent::Asia => "Asya",
            Continent::Africa => "Afrika",
            Continent::Americas => "Amerika",
            Continent::Oceania => "Okyanusya",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Continent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Continent::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown continent: {}", s))
    }
}

/// 從資料檔某一行抽出來的國家紀錄
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub continent: Option<Continent>,
    pub name: Option<String>,
    pub line_number: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOutcome {
    Replaced,
    AlreadyInstalled,
    NotFound,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaggingStats {
    pub tagged: usize,
    pub already_tagged: usize,
    pub skipped_no_id: usize,
    pub skipped_no_context: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransformResult {
    pub content: String,
    pub stats: TaggingStats,
    pub patch: PatchOutcome,
    pub changed: bool,
}
