//! 时间轴整体平移。

use crate::types::LyricsDocument;

/// 将文档中所有时间戳平移 `offset_secs` 秒，返回新文档。
///
/// 每个时间值独立地在 0 处截断：向前平移时已经到 0 的时间停在 0，
/// 其余时间继续减小，因此行间（以及词间）的相对间隔可能被压缩。
/// 行的顺序和所有 ID 保持不变。
#[must_use]
pub fn shift(doc: &LyricsDocument, offset_secs: f64) -> LyricsDocument {
    let mut shifted = doc.clone();
    for line in &mut shifted.lines {
        line.start_time = clamp_shift(line.start_time, offset_secs);
        line.end_time = line.end_time.map(|end| clamp_shift(end, offset_secs));
        for word in &mut line.words {
            word.start_time = clamp_shift(word.start_time, offset_secs);
            word.end_time = word.end_time.map(|end| clamp_shift(end, offset_secs));
        }
    }
    shifted
}

fn clamp_shift(time: f64, offset_secs: f64) -> f64 {
    (time + offset_secs).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LyricFormat, TimedLine, TimedWord};

    fn sample_doc() -> LyricsDocument {
        let mut doc = LyricsDocument::new(LyricFormat::Lrc);
        let mut line = TimedLine::new(5.0);
        line.end_time = Some(8.0);
        line.words.push(TimedWord::new("Hello", 5.0));
        line.words.last_mut().unwrap().end_time = Some(6.0);
        line.rebuild_raw_text();
        doc.lines.push(line);
        let mut line = TimedLine::new(10.0);
        line.raw_text = "Second".to_string();
        doc.lines.push(line);
        doc
    }

    #[test]
    fn test_shift_forward() {
        let shifted = shift(&sample_doc(), 2.5);
        assert!((shifted.lines[0].start_time - 7.5).abs() < 1e-9);
        assert_eq!(shifted.lines[0].end_time, Some(10.5));
        assert!((shifted.lines[0].words[0].start_time - 7.5).abs() < 1e-9);
        assert_eq!(shifted.lines[0].words[0].end_time, Some(8.5));
        assert!((shifted.lines[1].start_time - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_shift_zero_is_identity_with_same_ids() {
        let doc = sample_doc();
        let shifted = shift(&doc, 0.0);
        assert_eq!(shifted.lines.len(), doc.lines.len());
        for (original, moved) in doc.lines.iter().zip(&shifted.lines) {
            assert_eq!(original.id, moved.id);
            assert!((original.start_time - moved.start_time).abs() < 1e-12);
        }
    }

    #[test]
    fn test_shift_clamps_each_time_independently() {
        // 开始时间为 5 的行向前移 100 秒：所有时间都停在 0
        let shifted = shift(&sample_doc(), -100.0);
        assert_eq!(shifted.lines[0].start_time, 0.0);
        assert_eq!(shifted.lines[0].end_time, Some(0.0));
        assert_eq!(shifted.lines[0].words[0].start_time, 0.0);
        assert_eq!(shifted.lines[1].start_time, 0.0);
    }

    #[test]
    fn test_partial_clamp_compresses_gaps() {
        let shifted = shift(&sample_doc(), -7.0);
        // 第一行被截断到 0，第二行还剩 3 秒，间隔从 5 秒压缩到 3 秒
        assert_eq!(shifted.lines[0].start_time, 0.0);
        assert_eq!(shifted.lines[0].end_time, Some(1.0));
        assert!((shifted.lines[1].start_time - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_shift_does_not_mutate_input() {
        let doc = sample_doc();
        let _ = shift(&doc, -100.0);
        assert!((doc.lines[0].start_time - 5.0).abs() < 1e-12);
    }
}
