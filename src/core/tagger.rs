//! 依照區段標題註解，把洲別欄位補進每一筆國家紀錄。
//!
//! 掃描是一個 fold：狀態只有「目前所在的洲」，每一行產生新狀態和輸出行。

use crate::domain::model::{Continent, TaggingStats};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

pub const RECORD_TOKEN: &str = "{ id:";
pub const CONTINENT_TOKEN: &str = "continent:";

static ID_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"id: "([^"]+)","#).expect("id field pattern is valid"));

/// 預設的區段標題，比對順序與判斷優先權相同
pub fn default_markers() -> Vec<(Continent, String)> {
    vec![
        (Continent::Americas, "// Americas".to_string()),
        (Continent::Europe, "// Europe".to_string()),
        (Continent::Asia, "// Asia".to_string()),
        (Continent::Africa, "// Africa".to_string()),
        (Continent::Oceania, "// Oceania".to_string()),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// 不是紀錄行
    Passthrough,
    Tagged,
    AlreadyTagged,
    SkippedNoId,
    SkippedNoContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedLine<'a> {
    pub text: Cow<'a, str>,
    pub kind: LineKind,
}

#[derive(Debug, Clone, Default)]
pub struct TaggingReport {
    pub lines: Vec<String>,
    pub stats: TaggingStats,
}

impl TaggingReport {
    pub fn into_text(self) -> String {
        self.lines.concat()
    }
}

#[derive(Debug, Clone)]
pub struct ContinentTagger {
    markers: Vec<(Continent, String)>,
}

impl Default for ContinentTagger {
    fn default() -> Self {
        Self::new(default_markers())
    }
}

impl ContinentTagger {
    pub fn new(markers: Vec<(Continent, String)>) -> Self {
        Self { markers }
    }

    /// 原始子字串比對，不檢查是否真的在註解內
    pub fn detect_marker(&self, line: &str) -> Option<Continent> {
        self.markers
            .iter()
            .find(|(_, marker)| line.contains(marker.as_str()))
            .map(|(continent, _)| *continent)
    }

    /// 處理單一行：先更新區段狀態，再判斷是否需要補欄位
    pub fn step<'a>(
        &self,
        state: Option<Continent>,
        line: &'a str,
    ) -> (Option<Continent>, TaggedLine<'a>) {
        let state = self.detect_marker(line).or(state);

        if !line.contains(RECORD_TOKEN) {
            return (state, TaggedLine { text: Cow::Borrowed(line), kind: LineKind::Passthrough });
        }
        if line.contains(CONTINENT_TOKEN) {
            return (state, TaggedLine { text: Cow::Borrowed(line), kind: LineKind::AlreadyTagged });
        }

        let Some(id_match) = ID_FIELD.find(line) else {
            return (state, TaggedLine { text: Cow::Borrowed(line), kind: LineKind::SkippedNoId });
        };
        let Some(continent) = state else {
            return (
                state,
                TaggedLine { text: Cow::Borrowed(line), kind: LineKind::SkippedNoContext },
            );
        };

        let end = id_match.end();
        let tagged = format!(
            "{} {} \"{}\",{}",
            &line[..end],
            CONTINENT_TOKEN,
            continent.as_str(),
            &line[end..]
        );
        (state, TaggedLine { text: Cow::Owned(tagged), kind: LineKind::Tagged })
    }

    pub fn tag_lines<'a, I>(&self, lines: I) -> TaggingReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (_, report) = lines.into_iter().enumerate().fold(
            (None, TaggingReport::default()),
            |(state, mut report), (index, line)| {
                let (state, out) = self.step(state, line);
                match out.kind {
                    LineKind::Tagged => report.stats.tagged += 1,
                    LineKind::AlreadyTagged => report.stats.already_tagged += 1,
                    LineKind::SkippedNoId => {
                        tracing::debug!("Line {}: record without id field, left as is", index + 1);
                        report.stats.skipped_no_id += 1;
                    }
                    LineKind::SkippedNoContext => {
                        tracing::debug!("Line {}: record before any section marker, left as is", index + 1);
                        report.stats.skipped_no_context += 1;
                    }
                    LineKind::Passthrough => {}
                }
                report.lines.push(out.text.into_owned());
                (state, report)
            },
        );
        report
    }

    /// 保留原本的換行字元，輸出可以直接串回檔案內容
    pub fn tag_text(&self, text: &str) -> TaggingReport {
        self.tag_lines(text.split_inclusive('\n'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_updates_state_for_same_line() {
        let tagger = ContinentTagger::default();
        let (state, out) = tagger.step(None, "    // Europe (30)\n");
        assert_eq!(state, Some(Continent::Europe));
        assert_eq!(out.kind, LineKind::Passthrough);
    }

    #[test]
    fn test_inserts_continent_after_id() {
        let tagger = ContinentTagger::default();
        let line = r#"    { id: "FRA", name: "Fransa", flag: "🇫🇷" },"#;
        let (_, out) = tagger.step(Some(Continent::Europe), line);
        assert_eq!(out.kind, LineKind::Tagged);
        assert_eq!(
            out.text,
            r#"    { id: "FRA", continent: "Europe", name: "Fransa", flag: "🇫🇷" },"#
        );
    }

    #[test]
    fn test_record_without_context_is_untouched() {
        let tagger = ContinentTagger::default();
        let line = r#"{ id: "XXX", name: "Nowhere" },"#;
        let (state, out) = tagger.step(None, line);
        assert_eq!(state, None);
        assert_eq!(out.kind, LineKind::SkippedNoContext);
        assert!(matches!(out.text, Cow::Borrowed(_)));
    }

    #[test]
    fn test_record_without_trailing_comma_after_id_is_untouched() {
        let tagger = ContinentTagger::default();
        let line = r#"{ id: "LAST" }"#;
        let (_, out) = tagger.step(Some(Continent::Asia), line);
        assert_eq!(out.kind, LineKind::SkippedNoId);
        assert_eq!(out.text, line);
    }

    #[test]
    fn test_first_marker_in_priority_order_wins() {
        let tagger = ContinentTagger::default();
        assert_eq!(
            tagger.detect_marker("// Asia and // Americas"),
            Some(Continent::Americas)
        );
        assert_eq!(tagger.detect_marker("// Oceania & Others (18)"), Some(Continent::Oceania));
        assert_eq!(tagger.detect_marker("// europe"), None);
    }

    #[test]
    fn test_tag_text_preserves_line_endings() {
        let tagger = ContinentTagger::default();
        let text = "// Africa\r\n{ id: \"EGY\", name: \"Mısır\" },\r\n";
        let report = tagger.tag_text(text);
        assert_eq!(report.lines.len(), 2);
        assert_eq!(
            report.into_text(),
            "// Africa\r\n{ id: \"EGY\", continent: \"Africa\", name: \"Mısır\" },\r\n"
        );
    }
}
