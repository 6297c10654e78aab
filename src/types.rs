//! 歌词转换引擎的核心数据类型。

use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};

/// 枚举：表示支持的歌词格式。
///
/// 只记录文档的来源格式，不约束后续可以生成哪些格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize, EnumIter)]
#[strum(ascii_case_insensitive)]
#[derive(Default)]
pub enum LyricFormat {
    /// 无时间戳的纯文本。
    Plain,
    /// 标准 LRC (`LyRiCs`) 格式。
    #[default]
    Lrc,
    /// 增强型 LRC (Enhanced LRC) 格式，支持逐字时间戳。
    EnhancedLrc,
    /// `Timed Text Markup Language` 格式。
    Ttml,
}

impl LyricFormat {
    /// 将歌词格式枚举转换为对应的文件扩展名字符串。
    #[must_use]
    pub const fn to_extension_str(self) -> &'static str {
        match self {
            LyricFormat::Plain => "txt",
            LyricFormat::Lrc => "lrc",
            LyricFormat::EnhancedLrc => "elrc",
            LyricFormat::Ttml => "ttml",
        }
    }

    /// 从字符串（通常是文件扩展名或用户输入）解析歌词格式枚举。
    /// 此方法不区分大小写，并会移除输入字符串中的空格和点。
    pub fn from_string(s: &str) -> Option<Self> {
        let normalized_s = s.to_uppercase().replace([' ', '.'], "");
        match normalized_s.as_str() {
            "PLAIN" | "TXT" | "TEXT" => Some(LyricFormat::Plain),
            "LRC" => Some(LyricFormat::Lrc),
            "ENHANCEDLRC" | "ELRC" | "LRCX" => Some(LyricFormat::EnhancedLrc),
            "TTML" | "XML" => Some(LyricFormat::Ttml),
            _ => None,
        }
    }
}

impl fmt::Display for LyricFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LyricFormat::Plain => write!(f, "Plain"),
            LyricFormat::Lrc => write!(f, "LRC"),
            LyricFormat::EnhancedLrc => write!(f, "Enhanced LRC"),
            LyricFormat::Ttml => write!(f, "TTML"),
        }
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// 分配一个在进程内单调递增的不透明 ID。
///
/// ID 只保证在文档内唯一，不携带任何语义，
/// 也不应参与任何相等性比较。
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// 表示一个逐字歌词中的单词。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedWord {
    /// 不透明的唯一标识。
    pub id: u64,
    /// 单词的文本内容，不包含首尾空白。
    pub text: String,
    /// 单词开始时间（秒）。
    pub start_time: f64,
    /// 可选的单词结束时间（秒）。
    pub end_time: Option<f64>,
    /// 该单词是否为背景人声。
    pub is_background: bool,
}

impl TimedWord {
    /// 创建一个只有开始时间的新单词。
    #[must_use]
    pub fn new(text: impl Into<String>, start_time: f64) -> Self {
        Self {
            id: next_id(),
            text: text.into(),
            start_time,
            end_time: None,
            is_background: false,
        }
    }
}

/// 表示一行带时间戳的歌词。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedLine {
    /// 不透明的唯一标识。
    pub id: u64,
    /// 行开始时间（秒），始终 >= 0。
    pub start_time: f64,
    /// 可选的行结束时间（秒）。
    pub end_time: Option<f64>,
    /// 组成该行的单词列表。
    pub words: Vec<TimedWord>,
    /// 整行文本。`words` 非空时等于各单词文本以空格连接的结果；
    /// `words` 为空时以该字段为准。
    pub raw_text: String,
    /// 可选的演唱者标识（TTML agent 名，或 LRC 的 `Name:` 前缀）。
    pub voice: Option<String>,
    /// 该行是否为背景人声。
    pub is_background: bool,
    /// 开放的属性包，用于保留格式特有的行级属性（例如 `itunes:key`）。
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl TimedLine {
    /// 创建一个带有指定开始时间的空行。
    #[must_use]
    pub fn new(start_time: f64) -> Self {
        Self {
            id: next_id(),
            start_time,
            end_time: None,
            words: Vec::new(),
            raw_text: String::new(),
            voice: None,
            is_background: false,
            attributes: HashMap::new(),
        }
    }

    /// 用当前的单词列表重建 `raw_text`。`words` 为空时保持原文本不变。
    pub fn rebuild_raw_text(&mut self) {
        if !self.words.is_empty() {
            self.raw_text = self
                .words
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
        }
    }
}

/// 歌词文档的元数据。
///
/// 固定字段覆盖各格式共有的已知键；
/// 未识别的键原样保留在 `custom` 中以支持往返转换。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LyricsMetadata {
    /// 歌曲标题。
    pub title: Option<String>,
    /// 艺术家。
    pub artist: Option<String>,
    /// 专辑名。
    pub album: Option<String>,
    /// 词曲作者列表。
    pub songwriters: Vec<String>,
    /// 主歌词的语言代码 (BCP 47)。
    pub language: Option<String>,
    /// 制作者署名（LRC 的 `by:` 标签）。
    pub credit: Option<String>,
    /// 全局时间偏移量（毫秒，LRC 的 `offset:` 标签）。
    pub offset_ms: Option<i64>,
    /// 所有未识别的元数据键值对。
    #[serde(default)]
    pub custom: HashMap<String, String>,
}

/// 规范化的歌词文档。
///
/// 这是所有解析器的输出，也是所有生成器的输入。
/// 引擎的每个操作都消费一个文档并产生新值，从不原地修改调用方的数据。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsDocument {
    /// 文档的来源格式。
    pub format: LyricFormat,
    /// 歌词行列表，始终按开始时间升序排列（相同时间保持相遇顺序）。
    pub lines: Vec<TimedLine>,
    /// 文档元数据。
    pub metadata: LyricsMetadata,
    /// 解析过程中产生的警告信息列表。
    pub warnings: Vec<String>,
}

impl LyricsDocument {
    /// 创建一个指定来源格式的空文档。
    #[must_use]
    pub fn new(format: LyricFormat) -> Self {
        Self {
            format,
            lines: Vec::new(),
            metadata: LyricsMetadata::default(),
            warnings: Vec::new(),
        }
    }

    /// 按开始时间对所有行做稳定升序排序。
    pub(crate) fn sort_lines(&mut self) {
        self.lines.sort_by(|a, b| {
            a.start_time
                .partial_cmp(&b.start_time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}
