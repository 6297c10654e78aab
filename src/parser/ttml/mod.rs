//! # TTML 解析器
//!
//! 将 `Timed Text Markup Language` 歌词解析为规范化文档。
//!
//! 解析分两步：先把整个输入物化为一棵宽容的迷你 XML 树
//! （见 [`dom`]），再对每个 `<p>` 行元素做纯函数式的递归遍历，
//! 自上而下传递 `(is_background, current_start)` 继承状态来提取
//! 逐字时间信息。对非良构的 XML 降级为空文档加一条警告，
//! 从不返回错误。

mod dom;
mod metadata;

use std::collections::HashMap;

use tracing::warn;

use crate::types::{LyricFormat, LyricsDocument, TimedLine, TimedWord};
use crate::utils::{normalize_text_whitespace, parse_timestamp};

use dom::{XmlElement, XmlNode};

/// 递归遍历时自上而下传递的继承状态。
#[derive(Clone, Copy)]
struct SpanInheritance {
    /// 当前子树是否处于背景人声之内。只会向下开启，从不关闭。
    is_background: bool,
    /// 最近一个显式 `begin` 属性给出的开始时间（秒）。
    start_time: f64,
}

/// 解析 TTML 文本。
pub(crate) fn parse_ttml(content: &str) -> LyricsDocument {
    let mut doc = LyricsDocument::new(LyricFormat::Ttml);

    let Some(root) = dom::build_tree(content) else {
        warn!("TTML 输入不是良构的 XML，返回空文档");
        doc.warnings
            .push("输入不是良构的 XML，已返回空文档".to_string());
        return doc;
    };

    if let Some(lang) = root.attr_by_local("lang").filter(|lang| !lang.is_empty()) {
        doc.metadata.language = Some(lang.to_string());
    }

    let mut agents = HashMap::new();
    if let Some(head) = root.find_descendant("head") {
        agents = metadata::collect_agents(head);
        metadata::collect_metadata(head, &mut doc.metadata);
    }

    let Some(body) = root.find_descendant("body") else {
        doc.warnings.push("TTML 缺少 <body> 元素".to_string());
        return doc;
    };

    let divs: Vec<&XmlElement> = body
        .child_elements()
        .filter(|element| element.local_name() == "div")
        .collect();

    if divs.is_empty() {
        // 容忍省略 <div> 直接把 <p> 挂在 <body> 下的文档
        for p in body.child_elements().filter(|e| e.local_name() == "p") {
            if let Some(line) = parse_line(p, &agents) {
                doc.lines.push(line);
            }
        }
    } else {
        for div in divs {
            for p in div.child_elements().filter(|e| e.local_name() == "p") {
                if let Some(line) = parse_line(p, &agents) {
                    doc.lines.push(line);
                }
            }
        }
    }

    doc.sort_lines();
    doc
}

/// 解析单个 `<p>` 行元素。没有任何单词的行返回 `None`。
fn parse_line(p: &XmlElement, agents: &HashMap<String, String>) -> Option<TimedLine> {
    let start_time = p.attr_by_local("begin").map_or(0.0, parse_ttml_time);
    let end_time = p.attr_by_local("end").map(parse_ttml_time);

    let mut line = TimedLine::new(start_time);
    line.end_time = end_time;

    // agent 引用未声明时回退到用 id 本身作为演唱者名
    line.voice = p
        .attr_by_local("agent")
        .map(|id| agents.get(id).cloned().unwrap_or_else(|| id.to_string()));

    let role_is_background = p.attr_by_local("role") == Some("x-bg");
    let style_hints_background = p
        .attr_by_local("style")
        .is_some_and(|style| style.contains("bg"));

    for (name, value) in &p.attributes {
        if is_vendor_attribute(name) {
            line.attributes.insert(name.clone(), value.clone());
        }
    }

    let inherited = SpanInheritance {
        is_background: role_is_background,
        start_time,
    };
    line.words = collect_words(p, inherited);
    if let Some(end) = end_time {
        backfill_end_times(&mut line.words, start_time, end);
    }
    if line.words.is_empty() {
        return None;
    }
    line.rebuild_raw_text();
    line.is_background =
        role_is_background || style_hints_background || line.raw_text.starts_with('(');
    Some(line)
}

/// 深度优先收集一个行元素下的所有单词。
///
/// 文本节点在规范化空白后成为单词，开始时间取继承值；
/// 子元素用自己的 `begin`（若有）更新继承的开始时间，
/// 并在带 `end` 时把结束时间回填到子树内尚未定界的单词上。
fn collect_words(element: &XmlElement, inherited: SpanInheritance) -> Vec<TimedWord> {
    let mut words = Vec::new();
    for child in &element.children {
        match child {
            XmlNode::Text(text) => {
                let cleaned = normalize_text_whitespace(text);
                if !cleaned.is_empty() {
                    let mut word = TimedWord::new(cleaned, inherited.start_time);
                    word.is_background = inherited.is_background;
                    words.push(word);
                }
            }
            XmlNode::Element(span) => {
                let child_state = SpanInheritance {
                    is_background: inherited.is_background
                        || span.attr_by_local("role") == Some("x-bg"),
                    start_time: span
                        .attr_by_local("begin")
                        .map_or(inherited.start_time, parse_ttml_time),
                };
                words.extend(collect_words(span, child_state));
                if let Some(end) = span.attr_by_local("end").map(parse_ttml_time) {
                    backfill_end_times(&mut words, child_state.start_time, end);
                }
            }
        }
    }
    words
}

/// 把分组的显式结束时间回填到其尾部尚未定界的单词上。
///
/// 从后向前扫描，遇到开始时间早于分组起点、
/// 或已经有结束时间的单词即停止。
fn backfill_end_times(words: &mut [TimedWord], group_start: f64, end: f64) {
    for word in words.iter_mut().rev() {
        if word.start_time >= group_start && word.end_time.is_none() {
            word.end_time = Some(end);
        } else {
            break;
        }
    }
}

/// 解析 TTML 时间表达式。
///
/// 支持时钟形式（`H:MM:SS.fff` / `MM:SS.fff`）以及
/// 偏移形式（`7.5s`、`1500ms`、裸十进制数）。无法解析时返回 `0.0`。
fn parse_ttml_time(value: &str) -> f64 {
    let trimmed = value.trim();
    if let Some(millis) = trimmed.strip_suffix("ms") {
        return millis
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map_or(0.0, |v| (v / 1000.0).max(0.0));
    }
    if !trimmed.contains(':')
        && let Some(seconds) = trimmed.strip_suffix('s')
    {
        return seconds
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map_or(0.0, |v| v.max(0.0));
    }
    parse_timestamp(trimmed)
}

/// 带前缀的非标准属性原样保留到行的属性包中。
/// `xmlns` 声明和已被消费的 `ttm:`/`xml:` 属性除外。
fn is_vendor_attribute(name: &str) -> bool {
    name.contains(':')
        && !name.starts_with("xmlns")
        && !name.starts_with("ttm:")
        && !name.starts_with("xml:")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORD_SYNCED: &str = r#"<tt xmlns="http://www.w3.org/ns/ttml" xmlns:ttm="http://www.w3.org/ns/ttml#metadata" xml:lang="en">
  <head>
    <metadata>
      <ttm:agent type="person" xml:id="v1"><ttm:name type="full">Lead</ttm:name></ttm:agent>
    </metadata>
  </head>
  <body>
    <div>
      <p begin="00:01.000" end="00:03.000" ttm:agent="v1" itunes:key="L1"><span begin="00:01.000" end="00:01.500">Hello</span> <span begin="00:01.500">world</span></p>
    </div>
  </body>
</tt>"#;

    #[test]
    fn test_parse_word_synced_line() {
        let doc = parse_ttml(WORD_SYNCED);
        assert!(doc.warnings.is_empty());
        assert_eq!(doc.metadata.language.as_deref(), Some("en"));
        assert_eq!(doc.lines.len(), 1);

        let line = &doc.lines[0];
        assert!((line.start_time - 1.0).abs() < 1e-9);
        assert_eq!(line.end_time, Some(3.0));
        assert_eq!(line.voice.as_deref(), Some("Lead"));
        assert_eq!(line.raw_text, "Hello world");
        assert_eq!(
            line.attributes.get("itunes:key").map(String::as_str),
            Some("L1")
        );

        assert_eq!(line.words.len(), 2);
        assert!((line.words[0].start_time - 1.0).abs() < 1e-9);
        assert_eq!(line.words[0].end_time, Some(1.5));
        // 第二个单词没有显式 end，由行的 end 回填
        assert!((line.words[1].start_time - 1.5).abs() < 1e-9);
        assert_eq!(line.words[1].end_time, Some(3.0));
    }

    #[test]
    fn test_malformed_xml_yields_empty_document_with_warning() {
        let doc = parse_ttml("<tt><body><p>unclosed");
        assert!(doc.lines.is_empty());
        assert_eq!(doc.warnings.len(), 1);
        assert_eq!(doc.format, LyricFormat::Ttml);
    }

    #[test]
    fn test_line_synced_paragraph_without_spans() {
        let doc = parse_ttml(
            r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div><p begin="00:05.000" end="00:08.000">Just a line</p></div></body></tt>"#,
        );
        assert_eq!(doc.lines.len(), 1);
        let line = &doc.lines[0];
        assert_eq!(line.raw_text, "Just a line");
        assert_eq!(line.words.len(), 1);
        assert!((line.words[0].start_time - 5.0).abs() < 1e-9);
        assert_eq!(line.words[0].end_time, Some(8.0));
    }

    #[test]
    fn test_unknown_agent_falls_back_to_id() {
        let doc = parse_ttml(
            r#"<tt xmlns:ttm="urn:x"><body><p begin="1s" ttm:agent="v9">text</p></body></tt>"#,
        );
        assert_eq!(doc.lines[0].voice.as_deref(), Some("v9"));
    }

    #[test]
    fn test_background_role_propagates_to_words() {
        let doc = parse_ttml(
            r#"<tt xmlns:ttm="urn:x"><body><div>
                <p begin="00:01.000" end="00:04.000"><span begin="00:01.000">lead</span><span ttm:role="x-bg"><span begin="00:02.000">(ooh)</span></span></p>
            </div></body></tt>"#,
        );
        let line = &doc.lines[0];
        assert!(!line.is_background);
        assert_eq!(line.words.len(), 2);
        assert!(!line.words[0].is_background);
        assert!(line.words[1].is_background);
        assert_eq!(line.words[1].text, "(ooh)");
    }

    #[test]
    fn test_background_line_role() {
        let doc = parse_ttml(
            r#"<tt xmlns:ttm="urn:x"><body><p begin="2s" ttm:role="x-bg">(echo)</p></body></tt>"#,
        );
        let line = &doc.lines[0];
        assert!(line.is_background);
        assert!(line.words[0].is_background);
    }

    #[test]
    fn test_paragraphs_directly_under_body() {
        let doc = parse_ttml(
            r#"<tt><body><p begin="00:02.000">second</p><p begin="00:01.000">first</p></body></tt>"#,
        );
        assert_eq!(doc.lines.len(), 2);
        // 行按开始时间排序
        assert_eq!(doc.lines[0].raw_text, "first");
        assert_eq!(doc.lines[1].raw_text, "second");
    }

    #[test]
    fn test_empty_paragraphs_are_skipped() {
        let doc = parse_ttml(
            r#"<tt><body><div><p begin="00:01.000"></p><p begin="00:02.000">   </p></div></body></tt>"#,
        );
        assert!(doc.lines.is_empty());
    }

    #[test]
    fn test_offset_time_expressions() {
        assert!((parse_ttml_time("7.5s") - 7.5).abs() < 1e-9);
        assert!((parse_ttml_time("1500ms") - 1.5).abs() < 1e-9);
        assert!((parse_ttml_time("12.25") - 12.25).abs() < 1e-9);
        assert!((parse_ttml_time("00:01:02.5") - 62.5).abs() < 1e-9);
        assert_eq!(parse_ttml_time("bogus"), 0.0);
    }

    #[test]
    fn test_backfill_stops_at_delimited_words() {
        let mut words = vec![TimedWord::new("a", 1.0), TimedWord::new("b", 2.0)];
        words[0].end_time = Some(1.5);
        backfill_end_times(&mut words, 1.0, 3.0);
        assert_eq!(words[0].end_time, Some(1.5));
        assert_eq!(words[1].end_time, Some(3.0));
    }
}
