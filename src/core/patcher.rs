//! 把資料檔裡的隨機抽樣函式換成配額抽樣版本。
//!
//! 預設用函式名稱定位整個定義（大括號配對，略過字串與註解），
//! 不依賴空白排版；舊的逐字比對模式保留在 [`patch_exact`]。

use crate::core::sampler::QuotaTable;
use crate::domain::model::PatchOutcome;
use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;

pub const DEFAULT_FUNCTION_NAME: &str = "getRandomCountries";

/// 原始資料檔中的函式本體，逐字比對模式使用
const LEGACY_FUNCTION_TEMPLATE: &str = "export function {function_name}(count = 32) {
    const shuffled = [...COUNTRIES].sort(() => Math.random() - 0.5);
    return shuffled.slice(0, count);
}";

const QUOTA_FUNCTION_TEMPLATE: &str = r#"export function {function_name}(count = {total}, firstSelectedCountry = null) {
    // Quotas per continent (total {total}): {quota_summary}
    const quotas = {
{quota_entries}
    };
    const shuffle = items => {
        for (let i = items.length - 1; i > 0; i--) {
            const j = Math.floor(Math.random() * (i + 1));
            [items[i], items[j]] = [items[j], items[i]];
        }
        return items;
    };
    const isCandidate = c => !firstSelectedCountry || c.id !== firstSelectedCountry.id;

    if (count <= 0) {
        return [];
    }

    if (count === {total}) {
        const selected = [];
        const regions = [{regions}];

        // The pinned country takes one slot of its own continent
        if (firstSelectedCountry) {
            selected.push(firstSelectedCountry);
            const region = firstSelectedCountry.continent;
            if (quotas[region] > 0) {
                quotas[region]--;
            }
        }

        regions.forEach(region => {
            const pool = shuffle(COUNTRIES.filter(c => c.continent === region && isCandidate(c)));
            selected.push(...pool.slice(0, quotas[region]));
        });

        // Safety net when a continent has fewer countries than its quota
        if (selected.length < count) {
            const remaining = shuffle(COUNTRIES.filter(c => !selected.includes(c)));
            selected.push(...remaining.slice(0, count - selected.length));
        }

        const head = firstSelectedCountry ? 1 : 0;
        return [...selected.slice(0, head), ...shuffle(selected.slice(head)).slice(0, count - head)];
    }

    const shuffled = shuffle(COUNTRIES.filter(isCandidate));
    if (firstSelectedCountry) {
        return [firstSelectedCountry, ...shuffled.slice(0, count - 1)];
    }
    return shuffled.slice(0, count);
}"#;

pub fn legacy_function(function_name: &str) -> String {
    LEGACY_FUNCTION_TEMPLATE.replace("{function_name}", function_name)
}

/// 依配額表產生 JS 版的配額抽樣函式
pub fn render_quota_function(function_name: &str, quotas: &QuotaTable) -> String {
    let quota_entries = quotas
        .iter()
        .map(|(continent, quota)| format!("        \"{}\": {}", continent, quota))
        .collect::<Vec<_>>()
        .join(",\n");
    let quota_summary = quotas
        .iter()
        .map(|(continent, quota)| format!("{} {}", continent, quota))
        .collect::<Vec<_>>()
        .join(", ");
    let regions = quotas
        .iter()
        .map(|(continent, _)| format!("\"{}\"", continent))
        .collect::<Vec<_>>()
        .join(", ");

    QUOTA_FUNCTION_TEMPLATE
        .replace("{function_name}", function_name)
        .replace("{total}", &quotas.full_sample_size().to_string())
        .replace("{quota_summary}", &quota_summary)
        .replace("{quota_entries}", &quota_entries)
        .replace("{regions}", &regions)
}

/// 找出 `function <name>(...) { ... }` 整段定義的位置（含前面的 `export`）
pub fn find_function(text: &str, function_name: &str) -> Option<Range<usize>> {
    let pattern = format!(
        r"(?:export\s+)?function\s+{}\s*\(",
        regex::escape(function_name)
    );
    let re = Regex::new(&pattern).ok()?;
    let start = re.find(text)?.start();
    let end = definition_end(text, start)?;
    Some(start..end)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    LineComment,
    BlockComment,
    Quoted(char),
}

/// 從函式開頭掃到本體結束的 `}`，回傳它之後的位置
fn definition_end(text: &str, start: usize) -> Option<usize> {
    let mut state = Scan::Code;
    let mut parens = 0usize;
    let mut braces = 0usize;
    let mut in_body = false;
    let mut chars = text[start..].char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match state {
            Scan::LineComment => {
                if c == '\n' {
                    state = Scan::Code;
                }
            }
            Scan::BlockComment => {
                if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                    chars.next();
                    state = Scan::Code;
                }
            }
            Scan::Quoted(quote) => {
                if c == '\\' {
                    chars.next();
                } else if c == quote {
                    state = Scan::Code;
                }
            }
            Scan::Code => match c {
                '/' if matches!(chars.peek(), Some((_, '/'))) => state = Scan::LineComment,
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    chars.next();
                    state = Scan::BlockComment;
                }
                '"' | '\'' | '`' => state = Scan::Quoted(c),
                '(' => parens += 1,
                ')' => parens = parens.saturating_sub(1),
                '{' if in_body => braces += 1,
                '{' if parens == 0 => {
                    in_body = true;
                    braces = 1;
                }
                '}' if in_body => {
                    braces -= 1;
                    if braces == 0 {
                        return Some(start + offset + 1);
                    }
                }
                _ => {}
            },
        }
    }

    None
}

/// 範本一律是 LF；`source` 用 CRLF 時跟著換
fn with_line_endings_of<'a>(source: &str, snippet: &'a str) -> Cow<'a, str> {
    if source.contains("\r\n") {
        Cow::Owned(snippet.replace("\r\n", "\n").replace('\n', "\r\n"))
    } else {
        Cow::Borrowed(snippet)
    }
}

/// 依函式名稱替換整段定義
pub fn patch_function(text: &str, function_name: &str, replacement: &str) -> (String, PatchOutcome) {
    let Some(range) = find_function(text, function_name) else {
        return (text.to_string(), PatchOutcome::NotFound);
    };

    let current = &text[range.clone()];
    let replacement = with_line_endings_of(current, replacement);
    if current == replacement {
        return (text.to_string(), PatchOutcome::AlreadyInstalled);
    }

    let mut patched = String::with_capacity(text.len() + replacement.len());
    patched.push_str(&text[..range.start]);
    patched.push_str(&replacement);
    patched.push_str(&text[range.end..]);
    (patched, PatchOutcome::Replaced)
}

/// 逐字比對：空白或排版不同就會失敗（換行字元除外）
pub fn patch_exact(text: &str, original: &str, replacement: &str) -> (String, PatchOutcome) {
    let original = with_line_endings_of(text, original);
    let replacement = with_line_endings_of(text, replacement);

    if text.contains(&*original) {
        (text.replace(&*original, &replacement), PatchOutcome::Replaced)
    } else if text.contains(&*replacement) {
        (text.to_string(), PatchOutcome::AlreadyInstalled)
    } else {
        (text.to_string(), PatchOutcome::NotFound)
    }
}
