use crate::core::tagger::RECORD_TOKEN;
use crate::domain::model::{Continent, Record};
use crate::utils::error::Result;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::LazyLock;

static ID_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"id: "([^"]+)""#).expect("id pattern is valid"));
static CONTINENT_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"continent: "([^"]+)""#).expect("continent pattern is valid"));
static NAME_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name: "([^"]*)""#).expect("name pattern is valid"));

/// 逐行抽出國家紀錄（只看 `{ id:` 開頭的行，不解析 JS）
pub fn extract_records(text: &str) -> Vec<Record> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| line.contains(RECORD_TOKEN))
        .filter_map(|(index, line)| {
            let id = ID_VALUE.captures(line)?.get(1)?.as_str().to_string();
            let continent = CONTINENT_VALUE
                .captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|value| value.as_str().parse::<Continent>().ok());
            let name = NAME_VALUE
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|value| value.as_str().to_string());

            Some(Record {
                id,
                continent,
                name,
                line_number: index + 1,
            })
        })
        .collect()
}

pub fn find_by_id<'a>(records: &'a [Record], id: &str) -> Option<&'a Record> {
    records.iter().find(|record| record.id == id)
}

pub fn position_by_id(records: &[Record], id: &str) -> Option<usize> {
    records.iter().position(|record| record.id == id)
}

pub fn continent_counts<'a, I>(records: I) -> BTreeMap<Continent, usize>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter_map(|record| record.continent)
        .fold(BTreeMap::new(), |mut counts, continent| {
            *counts.entry(continent).or_insert(0) += 1;
            counts
        })
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    name: &'a str,
    continent: &'a str,
}

pub fn write_json<W: Write>(records: &[&Record], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

/// 欄位為 id,name,continent；缺少的欄位輸出空字串
pub fn write_csv<W: Write>(records: &[&Record], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(CsvRow {
            id: &record.id,
            name: record.name.as_deref().unwrap_or(""),
            continent: record.continent.map(|c| c.as_str()).unwrap_or(""),
        })?;
    }
    writer.flush()?;
    Ok(())
}
