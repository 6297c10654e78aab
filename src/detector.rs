//! # 歌词格式探测器
//!
//! 对原始文本做纯启发式分类，按优先级依次检查
//! TTML、增强型 LRC、标准 LRC，否则视为纯文本。
//! 探测不验证内容的良构性。

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::types::LyricFormat;

/// TTML 根元素的命名空间 URI。
const TTML_NAMESPACE_URI: &str = "http://www.w3.org/ns/ttml";

/// 匹配 `<tt>` 根标签（允许属性和命名空间前缀形式 `<tt:...>`）
static TTML_ROOT_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<tt[\s>:]").expect("未能编译 TTML_ROOT_TAG_REGEX"));

/// 匹配 ELRC 的行内逐字时间戳，例如 `<00:01.50>`
static INLINE_WORD_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\d{1,3}:\d{2}(?:\.\d{1,3})?>").expect("未能编译 INLINE_WORD_TAG_REGEX")
});

/// 匹配 LRC 的行级时间戳，例如 `[00:12.34]`，与解析器的文法一致
static LINE_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:\d{1,2}:)?\d{1,2}:\d{2}(?:\.\d{1,3})?\]").expect("未能编译 LINE_TAG_REGEX")
});

/// 对原始文本分类，返回最可能的歌词格式。
#[must_use]
pub fn detect(content: &str) -> LyricFormat {
    let format = if TTML_ROOT_TAG_REGEX.is_match(content) || content.contains(TTML_NAMESPACE_URI) {
        LyricFormat::Ttml
    } else if INLINE_WORD_TAG_REGEX.is_match(content) {
        LyricFormat::EnhancedLrc
    } else if LINE_TAG_REGEX.is_match(content) {
        LyricFormat::Lrc
    } else {
        LyricFormat::Plain
    };
    debug!("格式探测结果: {format}");
    format
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_ttml() {
        assert_eq!(
            detect(r#"<tt xmlns="http://www.w3.org/ns/ttml"><body/></tt>"#),
            LyricFormat::Ttml
        );
        assert_eq!(detect("<tt>\n</tt>"), LyricFormat::Ttml);
    }

    #[test]
    fn test_detect_elrc() {
        assert_eq!(
            detect("[00:01.00] <00:01.00>Hello <00:01.50>world"),
            LyricFormat::EnhancedLrc
        );
    }

    #[test]
    fn test_detect_lrc() {
        assert_eq!(detect("[00:12.34]Hello world"), LyricFormat::Lrc);
        assert_eq!(detect("[ti:Song]\n[00:12]Hi"), LyricFormat::Lrc);
        assert_eq!(detect("[1:00:12.3]Hi"), LyricFormat::Lrc);
        // 分钟超过两位不是合法的行级时间戳
        assert_eq!(detect("[100:00.00]text"), LyricFormat::Plain);
    }

    #[test]
    fn test_detect_plain() {
        assert_eq!(detect("just some lyrics\nwithout timestamps"), LyricFormat::Plain);
        assert_eq!(detect(""), LyricFormat::Plain);
        // 元数据标签本身不足以判定为 LRC
        assert_eq!(detect("a <tag> that is not ttml"), LyricFormat::Plain);
    }

    #[test]
    fn test_ttml_takes_priority_over_lrc() {
        let mixed = "<tt xmlns=\"http://www.w3.org/ns/ttml\"><body><p>[00:01.00]x</p></body></tt>";
        assert_eq!(detect(mixed), LyricFormat::Ttml);
    }
}
