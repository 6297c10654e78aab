//! # lyrics-processor
//!
//! A conversion engine between timed-lyrics formats.
//!
//! Lyrics are parsed into a normalized [`LyricsDocument`] and serialized
//! back out, so every supported format converts to every other one:
//!
//! - Plain text (no timestamps)
//! - LRC (line-level timestamps)
//! - Enhanced LRC (word-level timestamps)
//! - TTML (Apple Music / AMLL flavored timed text)
//!
//! Parsing is lenient by design: malformed input degrades to warnings on
//! the document instead of errors, and unparseable timestamps read as zero.
//!
//! # Example
//!
//! ```rust
//! use lyrics_processor::{LyricFormat, convert, detect};
//!
//! let lrc = "[ti:Song]\n[00:01.00]Hello world\n";
//! assert_eq!(detect(lrc), LyricFormat::Lrc);
//!
//! let ttml = convert(lrc, LyricFormat::Ttml).unwrap();
//! assert!(ttml.contains("itunes:timing"));
//! ```

mod detector;
mod error;
mod generator;
mod parser;
mod shift;
mod types;
mod utils;

pub use detector::detect;
pub use error::ConvertError;
pub use shift::shift;
pub use types::{LyricFormat, LyricsDocument, LyricsMetadata, TimedLine, TimedWord};
pub use utils::{
    TimestampPrecision, format_timestamp, normalize_text_whitespace, parse_timestamp,
};

/// 探测格式后解析原始文本。
#[must_use]
pub fn parse(content: &str) -> LyricsDocument {
    parser::parse_as(content, detector::detect(content))
}

/// 按指定格式解析原始文本。
///
/// 解析是全函数：畸形输入产生文档上的警告，从不返回错误。
#[must_use]
pub fn parse_as(content: &str, format: LyricFormat) -> LyricsDocument {
    parser::parse_as(content, format)
}

/// 将文档序列化为指定格式的文本。
///
/// # Errors
///
/// 生成 TTML 时写入 XML 或转换 UTF-8 失败会返回 [`ConvertError`]。
pub fn generate(doc: &LyricsDocument, target: LyricFormat) -> Result<String, ConvertError> {
    generator::generate_as(doc, target)
}

/// 一步完成转换：探测来源格式、解析、再生成目标格式。
///
/// # Errors
///
/// 与 [`generate`] 相同。
pub fn convert(content: &str, target: LyricFormat) -> Result<String, ConvertError> {
    generate(&parse(content), target)
}
