//! TTML `<body>` 部分的写出。
//!
//! 所有歌词行放在单个 `<div>` 下。序列化时现场计算时间回退：
//! 行缺少结束时间时用下一行的开始时间（最后一行加默认时长），
//! 单词缺少结束时间时用开始时间加默认单词时长。

use quick_xml::{
    Writer,
    events::{BytesText, Event},
};

use crate::error::ConvertError;
use crate::types::{LyricsDocument, TimedWord};
use crate::utils::{DEFAULT_LAST_LINE_DURATION_SECS, DEFAULT_WORD_DURATION_SECS};

use super::{AgentRegistry, format_ttml_time};

pub(super) fn write_body<W: std::io::Write>(
    writer: &mut Writer<W>,
    doc: &LyricsDocument,
    agents: &AgentRegistry,
) -> Result<(), ConvertError> {
    if doc.lines.is_empty() {
        writer.create_element("body").write_empty()?;
        return Ok(());
    }

    let first_start = format_ttml_time(doc.lines[0].start_time);
    let total_end = format_ttml_time(line_end(doc, doc.lines.len() - 1));

    writer
        .create_element("body")
        .with_attribute(("dur", total_end.as_str()))
        .write_inner_content(|writer| {
            writer
                .create_element("div")
                .with_attribute(("begin", first_start.as_str()))
                .with_attribute(("end", total_end.as_str()))
                .write_inner_content(|writer| {
                    for index in 0..doc.lines.len() {
                        write_line(writer, doc, index, agents)?;
                    }
                    Ok(())
                })?;
            Ok(())
        })?;
    Ok(())
}

/// 一行的有效结束时间：显式值，否则下一行的开始时间，
/// 最后一行回退为开始时间加默认时长。
fn line_end(doc: &LyricsDocument, index: usize) -> f64 {
    let line = &doc.lines[index];
    line.end_time.unwrap_or_else(|| {
        doc.lines.get(index + 1).map_or(
            line.start_time + DEFAULT_LAST_LINE_DURATION_SECS,
            |next| next.start_time,
        )
    })
}

fn write_line<W: std::io::Write>(
    writer: &mut Writer<W>,
    doc: &LyricsDocument,
    index: usize,
    agents: &AgentRegistry,
) -> Result<(), ConvertError> {
    let line = &doc.lines[index];

    let mut attrs: Vec<(String, String)> = vec![
        ("begin".to_string(), format_ttml_time(line.start_time)),
        ("end".to_string(), format_ttml_time(line_end(doc, index))),
    ];
    let agent_id = match &line.voice {
        Some(voice) => agents.id_for(voice),
        None => agents.fallback_id(),
    };
    if let Some(id) = agent_id {
        attrs.push(("ttm:agent".to_string(), id.to_string()));
    }
    if line.is_background {
        attrs.push(("ttm:role".to_string(), "x-bg".to_string()));
    }
    if !line.attributes.contains_key("itunes:key") {
        attrs.push(("itunes:key".to_string(), format!("L{}", index + 1)));
    }
    // 解析时保留的厂商属性按键排序后原样还原
    let mut vendor: Vec<(&String, &String)> = line.attributes.iter().collect();
    vendor.sort();
    for (key, value) in vendor {
        attrs.push((key.clone(), value.clone()));
    }

    let mut p = writer.create_element("p");
    for (key, value) in &attrs {
        p = p.with_attribute((key.as_str(), value.as_str()));
    }

    if !line.words.is_empty() {
        p.write_inner_content(|writer| {
            for (word_index, word) in line.words.iter().enumerate() {
                if word_index > 0 {
                    writer.write_event(Event::Text(BytesText::new(" ")))?;
                }
                write_word(writer, word)?;
            }
            Ok(())
        })?;
    } else {
        p.write_text_content(BytesText::new(&line.raw_text))?;
    }
    Ok(())
}

fn write_word<W: std::io::Write>(
    writer: &mut Writer<W>,
    word: &TimedWord,
) -> Result<(), ConvertError> {
    let begin = format_ttml_time(word.start_time);
    let end = format_ttml_time(
        word.end_time
            .unwrap_or(word.start_time + DEFAULT_WORD_DURATION_SECS),
    );

    let mut span = writer
        .create_element("span")
        .with_attribute(("begin", begin.as_str()))
        .with_attribute(("end", end.as_str()));
    if word.is_background {
        span = span.with_attribute(("ttm:role", "x-bg"));
    }
    span.write_text_content(BytesText::new(&word.text))?;
    Ok(())
}
