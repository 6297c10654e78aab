//! # LRC / 增强型 LRC 生成器
//!
//! 输出标准的 `[MM:SS.xx]` 行级时间戳；增强型变体在行时间戳后
//! 为每个单词追加 `<MM:SS.xx>` 行内时间戳。
//! 元数据块写在所有歌词行之前。

use std::fmt::Write;

use crate::error::ConvertError;
use crate::types::{LyricsDocument, LyricsMetadata, TimedLine};
use crate::utils::{TimestampPrecision, format_timestamp};

/// LRC 的两种输出变体。
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum LrcVariant {
    /// 只有行级时间戳。
    Standard,
    /// 行级加逐字时间戳。
    Enhanced,
}

/// 生成 LRC 文本。
pub(crate) fn generate_lrc(
    doc: &LyricsDocument,
    variant: LrcVariant,
) -> Result<String, ConvertError> {
    let mut output = String::new();
    write_metadata_block(&mut output, &doc.metadata)?;

    for line in &doc.lines {
        let tag = format_timestamp(line.start_time, TimestampPrecision::Centiseconds);
        match variant {
            LrcVariant::Standard => {
                writeln!(output, "[{tag}]{}", display_text(line))?;
            }
            LrcVariant::Enhanced if !line.words.is_empty() => {
                write!(output, "[{tag}]")?;
                for word in &line.words {
                    let word_tag =
                        format_timestamp(word.start_time, TimestampPrecision::Centiseconds);
                    write!(output, " <{word_tag}>{}", word.text)?;
                }
                writeln!(output)?;
            }
            // 没有逐字信息的行退化为标准形式
            LrcVariant::Enhanced => {
                writeln!(output, "[{tag}]{}", display_text(line))?;
            }
        }
    }
    Ok(output)
}

/// 标准 LRC 行文本，演唱者还原为 `Name:` 前缀。
fn display_text(line: &TimedLine) -> String {
    match &line.voice {
        Some(voice) => format!("{voice}: {}", line.raw_text),
        None => line.raw_text.clone(),
    }
}

/// 写出 `[key:value]` 形式的元数据标签块。
///
/// 已知字段使用约定俗成的标签名；`custom` 中的键按字典序输出，
/// 以保证生成结果确定。
fn write_metadata_block(
    output: &mut String,
    metadata: &LyricsMetadata,
) -> Result<(), ConvertError> {
    if let Some(title) = &metadata.title {
        writeln!(output, "[ti:{title}]")?;
    }
    if let Some(artist) = &metadata.artist {
        writeln!(output, "[ar:{artist}]")?;
    }
    if let Some(album) = &metadata.album {
        writeln!(output, "[al:{album}]")?;
    }
    if !metadata.songwriters.is_empty() {
        writeln!(output, "[au:{}]", metadata.songwriters.join(", "))?;
    }
    if let Some(credit) = &metadata.credit {
        writeln!(output, "[by:{credit}]")?;
    }
    if let Some(offset) = metadata.offset_ms {
        writeln!(output, "[offset:{offset}]")?;
    }
    if let Some(language) = &metadata.language {
        writeln!(output, "[la:{language}]")?;
    }

    let mut custom_keys: Vec<&String> = metadata.custom.keys().collect();
    custom_keys.sort();
    for key in custom_keys {
        writeln!(output, "[{key}:{}]", metadata.custom[key])?;
    }
    Ok(())
}
