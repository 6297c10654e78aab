//! 从 TTML `<head>` 中提取演唱者映射和厂商元数据。

use std::collections::HashMap;

use crate::types::LyricsMetadata;
use crate::utils::normalize_text_whitespace;

use super::dom::XmlElement;

/// 收集 `<ttm:agent>` 声明，建立 `xml:id` 到显示名的映射。
///
/// 没有 `<ttm:name>` 子元素（或名字为空）的 agent 回退到用 id 本身。
pub(super) fn collect_agents(head: &XmlElement) -> HashMap<String, String> {
    let mut agents = HashMap::new();
    let mut elements = Vec::new();
    head.collect_descendants("agent", &mut elements);

    for agent in elements {
        let Some(id) = agent.attr_by_local("id") else {
            continue;
        };
        let name = agent
            .child_elements()
            .find(|child| child.local_name() == "name")
            .map(|name| normalize_text_whitespace(&name.text_content()))
            .filter(|name| !name.is_empty());
        agents.insert(id.to_string(), name.unwrap_or_else(|| id.to_string()));
    }
    agents
}

/// 收集头部的元数据：`<amll:meta>` 键值对、iTunes 词作者、
/// 以及其他带 key/value 属性的 `<meta>` 元素。
pub(super) fn collect_metadata(head: &XmlElement, metadata: &mut LyricsMetadata) {
    let mut meta_elements = Vec::new();
    head.collect_descendants("meta", &mut meta_elements);

    for meta in meta_elements {
        let (Some(key), Some(value)) = (meta.attr_by_local("key"), meta.attr_by_local("value"))
        else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        match key {
            "musicName" => metadata.title = Some(value.to_string()),
            "artists" => metadata.artist = Some(value.to_string()),
            "album" => metadata.album = Some(value.to_string()),
            _ => {
                metadata.custom.insert(key.to_string(), value.to_string());
            }
        }
    }

    let mut songwriters = Vec::new();
    head.collect_descendants("songwriter", &mut songwriters);
    for songwriter in songwriters {
        let name = normalize_text_whitespace(&songwriter.text_content());
        if !name.is_empty() {
            metadata.songwriters.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::dom::build_tree;
    use super::*;

    #[test]
    fn test_collect_agents_with_and_without_names() {
        let root = build_tree(
            r#"<head xmlns:ttm="urn:x"><metadata>
                <ttm:agent type="person" xml:id="v1"><ttm:name type="full">  Lead  Singer </ttm:name></ttm:agent>
                <ttm:agent type="group" xml:id="v2"/>
            </metadata></head>"#,
        )
        .unwrap();
        let agents = collect_agents(&root);
        assert_eq!(agents.get("v1").map(String::as_str), Some("Lead Singer"));
        assert_eq!(agents.get("v2").map(String::as_str), Some("v2"));
    }

    #[test]
    fn test_collect_metadata_keys_and_songwriters() {
        let root = build_tree(
            r#"<head xmlns:amll="urn:a" xmlns:itunes="urn:i"><metadata>
                <amll:meta key="musicName" value="Song"/>
                <amll:meta key="artists" value="Artist"/>
                <amll:meta key="album" value="Album"/>
                <amll:meta key="ncmMusicId" value="12345"/>
                <amll:meta key="empty" value=""/>
                <iTunesMetadata xmlns="urn:i"><songwriters><songwriter>Writer A</songwriter><songwriter> </songwriter></songwriters></iTunesMetadata>
            </metadata></head>"#,
        )
        .unwrap();
        let mut metadata = LyricsMetadata::default();
        collect_metadata(&root, &mut metadata);
        assert_eq!(metadata.title.as_deref(), Some("Song"));
        assert_eq!(metadata.artist.as_deref(), Some("Artist"));
        assert_eq!(metadata.album.as_deref(), Some("Album"));
        assert_eq!(
            metadata.custom.get("ncmMusicId").map(String::as_str),
            Some("12345")
        );
        assert!(!metadata.custom.contains_key("empty"));
        assert_eq!(metadata.songwriters, vec!["Writer A".to_string()]);
    }
}
