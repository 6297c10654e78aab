//! # TTML 生成器
//!
//! 输出 Apple Music / AMLL 风格的 TTML 歌词：根元素携带
//! `itunes:timing` 定时模式，`<head>` 中写入演唱者和元数据，
//! `<body>` 下单个 `<div>` 容纳所有 `<p>` 歌词行。

mod body;
mod head;

use quick_xml::Writer;

use crate::error::ConvertError;
use crate::types::LyricsDocument;
use crate::utils::{TimestampPrecision, format_timestamp};

pub(crate) const TTML_NS: &str = "http://www.w3.org/ns/ttml";
pub(crate) const TTM_NS: &str = "http://www.w3.org/ns/ttml#metadata";
pub(crate) const TTS_NS: &str = "http://www.w3.org/ns/ttml#styling";
pub(crate) const ITUNES_NS: &str = "http://music.apple.com/lyric-ttml-internal";
pub(crate) const AMLL_NS: &str = "http://www.example.com/ns/amll";

/// 单词开始时间与行开始时间的偏差超过该阈值（秒）时，
/// 认为该行携带真实的逐字定时信息。
const WORD_SYNC_THRESHOLD_SECS: f64 = 0.05;

/// TTML 的定时模式。
#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) enum TimingMode {
    Word,
    Line,
}

impl TimingMode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Word => "Word",
            Self::Line => "Line",
        }
    }
}

/// 演唱者注册表：按相遇顺序给每个不同的 voice 分配 `v1`、`v2`……
///
/// 文档完全没有演唱者标注时回退为一个无名的默认 agent。
pub(super) struct AgentRegistry {
    entries: Vec<(String, Option<String>)>,
}

impl AgentRegistry {
    fn build(doc: &LyricsDocument) -> Self {
        let mut entries: Vec<(String, Option<String>)> = Vec::new();
        for line in &doc.lines {
            if let Some(voice) = &line.voice
                && !entries.iter().any(|(_, name)| name.as_ref() == Some(voice))
            {
                entries.push((format!("v{}", entries.len() + 1), Some(voice.clone())));
            }
        }
        if entries.is_empty() && !doc.lines.is_empty() {
            entries.push(("v1".to_string(), None));
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, Option<String>)] {
        &self.entries
    }

    pub fn id_for(&self, voice: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, name)| name.as_deref() == Some(voice))
            .map(|(id, _)| id.as_str())
    }

    /// 无演唱者标注的行只在注册表只含默认 agent 时才归属它。
    pub fn fallback_id(&self) -> Option<&str> {
        match self.entries.as_slice() {
            [(id, None)] => Some(id.as_str()),
            _ => None,
        }
    }
}

/// 生成 TTML 文本。
///
/// # Errors
///
/// 在写入 XML 或将输出缓冲区转换为 UTF-8 字符串失败时返回 `ConvertError`。
pub(crate) fn generate_ttml(doc: &LyricsDocument) -> Result<String, ConvertError> {
    let mut buffer = Vec::new();
    let mut writer = Writer::new(&mut buffer);

    let timing_mode = detect_timing_mode(doc);
    let agents = AgentRegistry::build(doc);

    let mut root = writer
        .create_element("tt")
        .with_attribute(("xmlns", TTML_NS))
        .with_attribute(("xmlns:ttm", TTM_NS))
        .with_attribute(("xmlns:tts", TTS_NS))
        .with_attribute(("xmlns:itunes", ITUNES_NS))
        .with_attribute(("xmlns:amll", AMLL_NS))
        .with_attribute(("itunes:timing", timing_mode.as_str()));
    if let Some(lang) = doc
        .metadata
        .language
        .as_ref()
        .filter(|lang| !lang.is_empty())
    {
        root = root.with_attribute(("xml:lang", lang.as_str()));
    }

    root.write_inner_content(|writer| {
        head::write_head(writer, doc, &agents)?;
        body::write_body(writer, doc, &agents)?;
        Ok(())
    })?;

    String::from_utf8(buffer).map_err(ConvertError::FromUtf8)
}

/// 判断文档的定时模式标签。
///
/// 只要有一行拥有多个单词、且首词之后的某个单词的开始时间
/// 比行开始时间晚出阈值，就认为整个文档是逐字定时的。
/// 该标签只写入 `itunes:timing`，不影响实际输出的结构。
fn detect_timing_mode(doc: &LyricsDocument) -> TimingMode {
    let word_synced = doc.lines.iter().any(|line| {
        line.words.len() > 1
            && line
                .words
                .iter()
                .skip(1)
                .any(|word| word.start_time - line.start_time > WORD_SYNC_THRESHOLD_SECS)
    });
    if word_synced {
        TimingMode::Word
    } else {
        TimingMode::Line
    }
}

/// TTML 用的毫秒精度时间字符串。
pub(super) fn format_ttml_time(seconds: f64) -> String {
    format_timestamp(seconds, TimestampPrecision::Milliseconds)
}
