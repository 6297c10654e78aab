//! 时间戳编解码器和文本工具函数。

/// 最后一行歌词的默认持续时间（秒）。
pub(crate) const DEFAULT_LAST_LINE_DURATION_SECS: f64 = 5.0;

/// 缺少结束时间的单词在生成 TTML 时的默认持续时间（秒）。
pub(crate) const DEFAULT_WORD_DURATION_SECS: f64 = 0.5;

/// 时间戳小数部分的精度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPrecision {
    /// 两位小数（厘秒），LRC / ELRC 使用。
    Centiseconds,
    /// 三位小数（毫秒），TTML 使用。
    Milliseconds,
}

impl TimestampPrecision {
    const fn scale(self) -> u64 {
        match self {
            Self::Centiseconds => 100,
            Self::Milliseconds => 1000,
        }
    }

    const fn digits(self) -> usize {
        match self {
            Self::Centiseconds => 2,
            Self::Milliseconds => 3,
        }
    }
}

/// 将秒数格式化为 `MM:SS.xx` / `MM:SS.xxx`，
/// 超过一小时时切换为 `H:MM:SS.xx(x)`。
///
/// 负数或非有限的输入产生对应精度的零值字符串，从不报错。
#[must_use]
pub fn format_timestamp(seconds: f64, precision: TimestampPrecision) -> String {
    let scale = precision.scale();
    let digits = precision.digits();

    let clamped = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };

    // 在整数厘秒/毫秒域内舍入，避免浮点误差影响进位
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = (clamped * scale as f64).round() as u64;
    let fraction = total % scale;
    let total_secs = total / scale;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}.{fraction:0digits$}")
    } else {
        format!("{minutes:02}:{secs:02}.{fraction:0digits$}")
    }
}

/// 将时间戳字符串解析为秒数。
///
/// 接受 `H:MM:SS[.fff]`、`MM:SS[.fff]` 或裸的十进制数，
/// 解析前会剥离方括号 / 尖括号装饰和首尾空白。
///
/// 这是一个全函数：任何无法解析的输入都返回 `0.0`。
/// 需要区分"缺失"和"零"的调用方必须自行检查原始文本。
#[must_use]
pub fn parse_timestamp(input: &str) -> f64 {
    let cleaned = input
        .trim()
        .trim_matches(|c| matches!(c, '[' | ']' | '<' | '>'))
        .trim();
    if cleaned.is_empty() {
        return 0.0;
    }

    let parts: Vec<&str> = cleaned.split(':').collect();
    let value = match parts.as_slice() {
        [secs] => secs.trim().parse::<f64>().ok(),
        [mins, secs] => parse_clock_parts(&[mins], secs),
        [hours, mins, secs] => parse_clock_parts(&[hours, mins], secs),
        _ => None,
    };

    value
        .filter(|v| v.is_finite())
        .map_or(0.0, |v| v.max(0.0))
}

/// 解析 `H:MM:SS` 形式中冒号分隔的各部分。
/// 秒允许带小数；小时和分钟必须是非负整数。
fn parse_clock_parts(leading: &[&str], seconds_part: &str) -> Option<f64> {
    let seconds = seconds_part.trim().parse::<f64>().ok()?;
    if seconds < 0.0 {
        return None;
    }
    let mut total = seconds;
    let mut factor = 60.0;
    for part in leading.iter().rev() {
        let unit = part.trim().parse::<u64>().ok()?;
        #[allow(clippy::cast_precision_loss)]
        {
            total += unit as f64 * factor;
        }
        factor *= 60.0;
    }
    Some(total)
}

/// 规范化文本中的空白字符：去除首尾空白，内部空白折叠为单个空格。
#[must_use]
pub fn normalize_text_whitespace(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    trimmed.split_whitespace().collect::<Vec<&str>>().join(" ")
}
