//! # 生成器入口
//!
//! 将规范化文档序列化为各目标格式的文本。
//! 生成器只读取文档，从不修改它；时间回退规则
//! （行结束、单词结束）在序列化时现场计算。

pub(crate) mod lrc;
pub(crate) mod ttml;

use crate::error::ConvertError;
use crate::types::{LyricFormat, LyricsDocument};

/// 将文档序列化为指定格式的文本。
pub(crate) fn generate_as(
    doc: &LyricsDocument,
    target: LyricFormat,
) -> Result<String, ConvertError> {
    match target {
        LyricFormat::Plain => Ok(generate_plain(doc)),
        LyricFormat::Lrc => lrc::generate_lrc(doc, lrc::LrcVariant::Standard),
        LyricFormat::EnhancedLrc => lrc::generate_lrc(doc, lrc::LrcVariant::Enhanced),
        LyricFormat::Ttml => ttml::generate_ttml(doc),
    }
}

/// 生成纯文本：每行歌词的整行文本各占一行，丢弃所有时间信息。
fn generate_plain(doc: &LyricsDocument) -> String {
    let mut output = String::new();
    for line in &doc.lines {
        output.push_str(&line.raw_text);
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimedLine;

    #[test]
    fn test_generate_plain_drops_timing() {
        let mut doc = LyricsDocument::new(LyricFormat::Lrc);
        let mut line = TimedLine::new(12.34);
        line.raw_text = "Hello world".to_string();
        doc.lines.push(line);
        let mut line = TimedLine::new(15.0);
        line.raw_text = "Second".to_string();
        doc.lines.push(line);

        assert_eq!(generate_plain(&doc), "Hello world\nSecond\n");
    }

    #[test]
    fn test_generate_as_dispatches() {
        let mut doc = LyricsDocument::new(LyricFormat::Plain);
        let mut line = TimedLine::new(1.0);
        line.raw_text = "Hi".to_string();
        doc.lines.push(line);

        let lrc = generate_as(&doc, LyricFormat::Lrc).unwrap();
        assert!(lrc.contains("[00:01.00]Hi"));

        let ttml = generate_as(&doc, LyricFormat::Ttml).unwrap();
        assert!(ttml.starts_with("<tt"));
    }
}
