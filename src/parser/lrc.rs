//! # LRC / ELRC 格式解析器
//!
//! 逐行处理带方括号时间戳的歌词文本。增强型 LRC 与标准 LRC
//! 共用同一套文法，区别仅在于行内是否出现 `<MM:SS.fff>` 逐字标签。

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::types::{LyricFormat, LyricsDocument, LyricsMetadata, TimedLine, TimedWord};
use crate::utils::{DEFAULT_LAST_LINE_DURATION_SECS, normalize_text_whitespace, parse_timestamp};

/// 匹配占满整行的 `[key:value]` 元数据标签
static METADATA_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?P<key>[^\[\]:]+):(?P<value>[^\]]*)]$").expect("未能编译 METADATA_TAG_REGEX")
});

/// 匹配行首的单个时间戳，例如 `[00:12.34]` 或 `[1:00:12.3]`
static LEADING_TIMESTAMP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?:\d{1,2}:)?\d{1,2}:\d{2}(?:\.\d{1,3})?\]")
        .expect("未能编译 LEADING_TIMESTAMP_REGEX")
});

/// 匹配行内的逐字时间戳，例如 `<00:01.50>`
static INLINE_WORD_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\d{1,3}:\d{2}(?:\.\d{1,3})?>").expect("未能编译 INLINE_WORD_TAG_REGEX")
});

/// 匹配 `Name: remainder` 形式的演唱者前缀
static VOICE_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z0-9][A-Za-z0-9 ]*):\s*(?P<rest>.+)$")
        .expect("未能编译 VOICE_PREFIX_REGEX")
});

/// 解析 LRC / ELRC 格式的歌词文本。
///
/// `format` 只记录文档的来源，不改变解析行为。
pub(crate) fn parse_lrc(content: &str, format: LyricFormat) -> LyricsDocument {
    let mut doc = LyricsDocument::new(format);
    let mut author: Option<String> = None;
    let mut voice_fixed = false;

    for raw_line in content.lines() {
        let line_str = raw_line.trim();
        if line_str.is_empty() {
            continue;
        }

        if try_parse_metadata_tag(line_str, &mut doc.metadata, &mut author, &mut doc.warnings) {
            continue;
        }

        // 剥离行首的全部时间戳；一行可以携带多个，每个产生一个独立的行
        let (timestamps, rest) = strip_leading_timestamps(line_str);
        if timestamps.is_empty() {
            // 以方括号开头却既不是元数据也不是时间戳的行值得提醒
            if line_str.starts_with('[') {
                warn!("跳过无法识别的标签行: '{line_str}'");
                doc.warnings.push(format!("跳过无法识别的标签行: '{line_str}'"));
            }
            continue;
        }

        // 演唱者名在整个文档中只锁定一次；此后的前缀保留在文本里
        let (voice, text) = if voice_fixed {
            (None, rest.trim())
        } else {
            split_voice_prefix(rest.trim())
        };
        if voice.is_some() {
            voice_fixed = true;
        }
        if text.is_empty() {
            continue;
        }
        let is_background = text.starts_with('(') && text.ends_with(')');

        for &start_time in &timestamps {
            let mut line = TimedLine::new(start_time);
            line.voice = voice.clone();
            line.is_background = is_background;
            line.words = build_words(text, start_time);
            line.raw_text = normalize_text_whitespace(text);
            line.rebuild_raw_text();
            doc.lines.push(line);
        }
    }

    // `author` 仅在没有显式词曲作者时按逗号拆分使用
    if doc.metadata.songwriters.is_empty()
        && let Some(author) = author
    {
        doc.metadata.songwriters = author
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }

    doc.sort_lines();
    infer_end_times(&mut doc.lines);
    doc
}

/// 若该行是元数据标签则消费它并返回 `true`。
///
/// 键以数字开头的行是时间戳而非元数据，交还给调用方。
fn try_parse_metadata_tag(
    line: &str,
    metadata: &mut LyricsMetadata,
    author: &mut Option<String>,
    warnings: &mut Vec<String>,
) -> bool {
    let Some(caps) = METADATA_TAG_REGEX.captures(line) else {
        return false;
    };
    let key = caps["key"].trim();
    if key.is_empty() || key.starts_with(|c: char| c.is_ascii_digit()) {
        return false;
    }
    let value = normalize_text_whitespace(&caps["value"]);
    if value.is_empty() {
        // 空值不覆盖已知字段，但原样保留键以支持往返
        metadata.custom.insert(key.to_string(), value);
        return true;
    }

    match key.to_ascii_lowercase().as_str() {
        "ti" | "title" => metadata.title = Some(value),
        "ar" | "artist" => metadata.artist = Some(value),
        "al" | "album" => metadata.album = Some(value),
        "au" | "author" => *author = Some(value),
        "by" => metadata.credit = Some(value),
        "la" | "lang" | "language" => metadata.language = Some(value),
        "offset" => match value.trim_start_matches('+').parse::<i64>() {
            Ok(offset) => metadata.offset_ms = Some(offset),
            Err(_) => {
                warn!("无法解析 offset 标签的值: '{value}'");
                warnings.push(format!("无法解析 offset 标签的值: '{value}'"));
            }
        },
        _ => {
            metadata.custom.insert(key.to_string(), value);
        }
    }
    true
}

/// 从行首反复剥离时间戳，返回解析出的秒数列表和剩余文本。
fn strip_leading_timestamps(line: &str) -> (Vec<f64>, &str) {
    let mut timestamps = Vec::new();
    let mut rest = line;
    while let Some(m) = LEADING_TIMESTAMP_REGEX.find(rest) {
        timestamps.push(parse_timestamp(m.as_str()));
        rest = &rest[m.end()..];
    }
    (timestamps, rest)
}

/// 识别 `Name: remainder` 形式的演唱者前缀。
fn split_voice_prefix(text: &str) -> (Option<String>, &str) {
    if let Some(caps) = VOICE_PREFIX_REGEX.captures(text) {
        let name = caps.name("name").map_or("", |m| m.as_str()).trim();
        let rest_start = caps.name("rest").map_or(text.len(), |m| m.start());
        if !name.is_empty() {
            return (Some(name.to_string()), &text[rest_start..]);
        }
    }
    (None, text)
}

/// 从行文本构建单词列表。
///
/// 行内的逐字标签设置"当前单词时间"，其后的非标签文本
/// 按空白切分为单词并消费该时间，直到下一个标签；
/// 没有标签时所有单词继承行的开始时间。
fn build_words(text: &str, line_start: f64) -> Vec<TimedWord> {
    let mut words = Vec::new();
    let mut current_time = line_start;
    let mut segment_start = 0;

    for tag in INLINE_WORD_TAG_REGEX.find_iter(text) {
        push_tokens(&text[segment_start..tag.start()], current_time, &mut words);
        current_time = parse_timestamp(tag.as_str());
        segment_start = tag.end();
    }
    push_tokens(&text[segment_start..], current_time, &mut words);
    words
}

fn push_tokens(segment: &str, time: f64, words: &mut Vec<TimedWord>) {
    for token in segment.split_whitespace() {
        words.push(TimedWord::new(token, time));
    }
}

/// 为排好序的行推断结束时间。
///
/// 每行的结束时间是下一行的开始时间，最后一行延续固定时长；
/// 行内每个单词的结束时间是下一个单词的开始时间，
/// 最后一个单词对齐到行的结束时间。
pub(crate) fn infer_end_times(lines: &mut [TimedLine]) {
    let starts: Vec<f64> = lines.iter().map(|l| l.start_time).collect();
    for (index, line) in lines.iter_mut().enumerate() {
        let line_end = starts
            .get(index + 1)
            .copied()
            .unwrap_or(line.start_time + DEFAULT_LAST_LINE_DURATION_SECS);
        line.end_time = Some(line_end);

        let word_starts: Vec<f64> = line.words.iter().map(|w| w.start_time).collect();
        for (word_index, word) in line.words.iter_mut().enumerate() {
            word.end_time = Some(word_starts.get(word_index + 1).copied().unwrap_or(line_end));
        }
    }
}
