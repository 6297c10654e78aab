//! TTML `<head>` 部分的写出：演唱者声明、iTunes 词作者块和 AMLL 元数据。

use quick_xml::{Writer, events::BytesText};

use crate::error::ConvertError;
use crate::types::LyricsDocument;

use super::{AgentRegistry, ITUNES_NS};

pub(super) fn write_head<W: std::io::Write>(
    writer: &mut Writer<W>,
    doc: &LyricsDocument,
    agents: &AgentRegistry,
) -> Result<(), ConvertError> {
    writer
        .create_element("head")
        .write_inner_content(|writer| {
            writer
                .create_element("metadata")
                .write_inner_content(|writer| {
                    write_agents(writer, agents)?;
                    write_songwriters(writer, doc)?;
                    write_amll_metadata(writer, doc)?;
                    Ok(())
                })?;
            write_styling_and_layout(writer)?;
            Ok(())
        })?;
    Ok(())
}

fn write_agents<W: std::io::Write>(
    writer: &mut Writer<W>,
    agents: &AgentRegistry,
) -> Result<(), ConvertError> {
    for (id, name) in agents.entries() {
        let agent = writer
            .create_element("ttm:agent")
            .with_attribute(("type", "person"))
            .with_attribute(("xml:id", id.as_str()));
        if let Some(name) = name {
            agent.write_inner_content(|writer| {
                writer
                    .create_element("ttm:name")
                    .with_attribute(("type", "full"))
                    .write_text_content(BytesText::new(name))?;
                Ok(())
            })?;
        } else {
            agent.write_empty()?;
        }
    }
    Ok(())
}

/// 固定的样式和布局声明。
fn write_styling_and_layout<W: std::io::Write>(writer: &mut Writer<W>) -> Result<(), ConvertError> {
    writer
        .create_element("styling")
        .write_inner_content(|writer| {
            writer
                .create_element("style")
                .with_attribute(("xml:id", "s1"))
                .with_attribute(("tts:textAlign", "center"))
                .write_empty()?;
            Ok(())
        })?;
    writer
        .create_element("layout")
        .write_inner_content(|writer| {
            writer
                .create_element("region")
                .with_attribute(("xml:id", "bottom"))
                .with_attribute(("tts:displayAlign", "after"))
                .write_empty()?;
            Ok(())
        })?;
    Ok(())
}

fn write_songwriters<W: std::io::Write>(
    writer: &mut Writer<W>,
    doc: &LyricsDocument,
) -> Result<(), ConvertError> {
    let songwriters: Vec<&String> = doc
        .metadata
        .songwriters
        .iter()
        .filter(|name| !name.trim().is_empty())
        .collect();
    if songwriters.is_empty() {
        return Ok(());
    }

    writer
        .create_element("iTunesMetadata")
        .with_attribute(("xmlns", ITUNES_NS))
        .write_inner_content(|writer| {
            writer
                .create_element("songwriters")
                .write_inner_content(|writer| {
                    for name in &songwriters {
                        writer
                            .create_element("songwriter")
                            .write_text_content(BytesText::new(name))?;
                    }
                    Ok(())
                })?;
            Ok(())
        })?;
    Ok(())
}

/// 已知字段映射到 AMLL 约定的键名，`custom` 按字典序原样输出。
fn write_amll_metadata<W: std::io::Write>(
    writer: &mut Writer<W>,
    doc: &LyricsDocument,
) -> Result<(), ConvertError> {
    let metadata = &doc.metadata;
    let mut pairs: Vec<(&str, &str)> = Vec::new();
    if let Some(title) = &metadata.title {
        pairs.push(("musicName", title));
    }
    if let Some(artist) = &metadata.artist {
        pairs.push(("artists", artist));
    }
    if let Some(album) = &metadata.album {
        pairs.push(("album", album));
    }

    let mut custom_keys: Vec<&String> = metadata.custom.keys().collect();
    custom_keys.sort();
    for key in custom_keys {
        pairs.push((key, &metadata.custom[key]));
    }

    for (key, value) in pairs {
        writer
            .create_element("amll:meta")
            .with_attribute(("key", key))
            .with_attribute(("value", value))
            .write_empty()?;
    }
    Ok(())
}
