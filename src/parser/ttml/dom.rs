//! # 宽容的迷你 XML 树
//!
//! 基于 `quick-xml` 的事件流构建一棵轻量的元素树，供 TTML 解析器
//! 做递归遍历。对命名空间完全宽容：元素和属性都按本地名匹配，
//! 不解析前缀绑定。任何 XML 错误都使整棵树构建失败（返回 `None`），
//! 由调用方降级为空文档。

use std::str;

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use tracing::warn;

/// 一个 XML 元素节点。
pub(super) struct XmlElement {
    /// 限定名（保留原始前缀，例如 `ttm:agent`）。
    pub name: String,
    /// 属性列表：限定名 → 已解码并反转义的值。
    pub attributes: Vec<(String, String)>,
    /// 子节点，保持文档顺序。
    pub children: Vec<XmlNode>,
}

/// 元素的子节点：子元素或文本。
pub(super) enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// 取限定名的本地部分。
pub(super) fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl XmlElement {
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// 按本地名查找属性值，忽略命名空间前缀（`xmlns` 声明除外）。
    pub fn attr_by_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| !name.starts_with("xmlns") && local_part(name) == local)
            .map(|(_, value)| value.as_str())
    }

    /// 遍历直接子元素。
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// 深度优先查找第一个指定本地名的后代元素。
    pub fn find_descendant(&self, local: &str) -> Option<&XmlElement> {
        for child in self.child_elements() {
            if child.local_name() == local {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(local) {
                return Some(found);
            }
        }
        None
    }

    /// 收集所有指定本地名的后代元素（文档顺序）。
    pub fn collect_descendants<'a>(&'a self, local: &str, out: &mut Vec<&'a XmlElement>) {
        for child in self.child_elements() {
            if child.local_name() == local {
                out.push(child);
            }
            child.collect_descendants(local, out);
        }
    }

    /// 拼接该元素下所有文本节点的内容。
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.append_text(&mut out);
        out
    }

    fn append_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.append_text(out),
            }
        }
    }
}

/// 将 XML 文本物化为一棵元素树。
///
/// 返回第一个闭合的顶层元素。输入不够良构（无法闭合根元素、
/// 标签错配、读取错误）时返回 `None`。
pub(super) fn build_tree(content: &str) -> Option<XmlElement> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().expand_empty_elements = true;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                stack.push(element_from_start(&e, &reader));
            }
            Ok(Event::End(_)) => {
                let finished = stack.pop()?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(finished)),
                    None => return Some(finished),
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(parent) = stack.last_mut()
                    && let Ok(text) = e.xml_content()
                {
                    push_text(parent, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(parent) = stack.last_mut()
                    && let Ok(entity) = str::from_utf8(e.as_ref())
                    && let Some(decoded) = resolve_entity(entity)
                {
                    let mut tmp = [0u8; 4];
                    push_text(parent, decoded.encode_utf8(&mut tmp));
                }
            }
            Ok(Event::Eof) => {
                if !stack.is_empty() {
                    warn!("TTML 输入在根元素闭合前结束");
                }
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("XML 解析失败，位置 {}: {e}", reader.error_position());
                return None;
            }
        }
        buf.clear();
    }
}

fn element_from_start(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> XmlElement {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes().with_checks(false).flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if let Ok(value) = attr.decode_and_unescape_value(reader.decoder()) {
            attributes.push((key, value.into_owned()));
        }
    }
    XmlElement {
        name,
        attributes,
        children: Vec::new(),
    }
}

/// 追加文本，相邻的文本节点合并为一个。
fn push_text(parent: &mut XmlElement, text: &str) {
    if let Some(XmlNode::Text(existing)) = parent.children.last_mut() {
        existing.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}

fn resolve_entity(name: &str) -> Option<char> {
    if let Some(numeric) = name.strip_prefix('#') {
        let (radix, digits) = numeric
            .strip_prefix('x')
            .map_or((10, numeric), |hex| (16, hex));
        return u32::from_str_radix(digits, radix).ok().and_then(char::from_u32);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tree_basic() {
        let root = build_tree(r#"<tt a="1"><body><p begin="2">hi</p></body></tt>"#).unwrap();
        assert_eq!(root.local_name(), "tt");
        let body = root.find_descendant("body").unwrap();
        let p = body.child_elements().next().unwrap();
        assert_eq!(p.attr_by_local("begin"), Some("2"));
        assert_eq!(p.text_content(), "hi");
    }

    #[test]
    fn test_namespace_tolerant_lookup() {
        let root = build_tree(
            r#"<tt xmlns:ttm="urn:x"><body><p ttm:agent="v1" xmlns:agent="urn:y">x</p></body></tt>"#,
        )
        .unwrap();
        let p = root.find_descendant("p").unwrap();
        assert_eq!(p.attr_by_local("agent"), Some("v1"));
    }

    #[test]
    fn test_malformed_input_yields_none() {
        assert!(build_tree("<tt><body>").is_none());
        assert!(build_tree("not xml at all").is_none());
        assert!(build_tree("").is_none());
    }

    #[test]
    fn test_entities_and_empty_elements() {
        let root = build_tree("<tt><p>a &amp; b</p><br/></tt>").unwrap();
        let p = root.find_descendant("p").unwrap();
        assert_eq!(p.text_content(), "a & b");
        assert!(root.find_descendant("br").is_some());
    }
}
