//! # 解析器入口
//!
//! 将原始文本按格式分发给具体的解析器，输出规范化的 [`LyricsDocument`]。
//! 所有解析器都是全函数：畸形输入产生警告或空文档，从不返回错误。

pub(crate) mod lrc;
pub(crate) mod ttml;

use crate::types::{LyricFormat, LyricsDocument, TimedLine, TimedWord};

/// 按指定格式解析原始文本。
pub(crate) fn parse_as(content: &str, format: LyricFormat) -> LyricsDocument {
    match format {
        LyricFormat::Plain => parse_plain(content),
        LyricFormat::Lrc | LyricFormat::EnhancedLrc => lrc::parse_lrc(content, format),
        LyricFormat::Ttml => ttml::parse_ttml(content),
    }
}

/// 解析无时间戳的纯文本。
///
/// 每个非空行成为一个开始时间为 0 的 `TimedLine`，
/// 单词按空白切分并继承行的开始时间。不做结束时间推断。
fn parse_plain(content: &str) -> LyricsDocument {
    let mut doc = LyricsDocument::new(LyricFormat::Plain);
    for raw_line in content.lines() {
        let text = raw_line.trim();
        if text.is_empty() {
            continue;
        }
        let mut line = TimedLine::new(0.0);
        line.words = text
            .split_whitespace()
            .map(|token| TimedWord::new(token, 0.0))
            .collect();
        line.rebuild_raw_text();
        doc.lines.push(line);
    }
    doc
}
