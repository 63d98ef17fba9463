//! Helvetica 字体度量、文本折行与输出编码
//!
//! 布局引擎需要在不接触 PDF 库的情况下量出文本宽度，这里内嵌
//! Helvetica / Helvetica-Bold 的字宽表（单位 1/1000 em，ASCII 区间逐字精确，
//! ASCII 之外的 Latin-1 字形取近似均宽）。斜体与常规字宽一致。

/// 字体样式；尺寸单独传
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

const PT_TO_MM: f32 = 25.4 / 72.0;

/// ASCII 之外字形的近似宽度
const DEFAULT_WIDTH: u16 = 556;

/// Helvetica 字宽，0x20..=0x7E
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold 字宽，0x20..=0x7E
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width_units(c: char, font: FontStyle) -> u16 {
    let table = match font {
        FontStyle::Bold => &HELVETICA_BOLD_WIDTHS,
        _ => &HELVETICA_WIDTHS,
    };
    let code = c as u32;
    if (0x20..=0x7E).contains(&code) {
        table[(code - 0x20) as usize]
    } else {
        DEFAULT_WIDTH
    }
}

/// 文本在指定字号下的渲染宽度（毫米）
pub fn text_width_mm(text: &str, font: FontStyle, size_pt: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| u32::from(char_width_units(c, font)))
        .sum();
    units as f32 * size_pt * PT_TO_MM / 1000.0
}

/// 把文本折成不超过 `max_width_mm` 的行
///
/// 显式换行保留；段内按词贪心折行；单个超宽词按字符硬断。
/// 永远返回至少一行（空文本折成一个空行）。
pub fn wrap_text(text: &str, font: FontStyle, size_pt: f32, max_width_mm: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph, font, size_pt, max_width_mm, &mut lines);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_paragraph(
    paragraph: &str,
    font: FontStyle,
    size_pt: f32,
    max_width_mm: f32,
    lines: &mut Vec<String>,
) {
    let words: Vec<&str> = paragraph.split_whitespace().collect();
    if words.is_empty() {
        lines.push(String::new());
        return;
    }

    let mut current = String::new();
    for word in words {
        for piece in break_word(word, font, size_pt, max_width_mm) {
            let candidate = if current.is_empty() {
                piece.clone()
            } else {
                format!("{} {}", current, piece)
            };
            if current.is_empty() || text_width_mm(&candidate, font, size_pt) <= max_width_mm {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, piece));
            }
        }
    }
    lines.push(current);
}

/// 超宽词按字符切成若干能放进一行的片段
fn break_word(word: &str, font: FontStyle, size_pt: f32, max_width_mm: f32) -> Vec<String> {
    if text_width_mm(word, font, size_pt) <= max_width_mm {
        return vec![word.to_string()];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        let mut candidate = piece.clone();
        candidate.push(c);
        if !piece.is_empty() && text_width_mm(&candidate, font, size_pt) > max_width_mm {
            pieces.push(std::mem::replace(&mut piece, c.to_string()));
        } else {
            piece = candidate;
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// 把文本编码为 WinAnsi 字节序列
///
/// 无法表示的字符逐个替换为 '?'，返回替换数量供调用方记一条警告
pub fn encode_win_ansi(text: &str) -> (Vec<u8>, usize) {
    let mut bytes = Vec::with_capacity(text.len());
    let mut substituted = 0usize;

    for c in text.chars() {
        let code = c as u32;
        let byte = match code {
            0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
            // WinAnsi 对常见排版符号有单独码位
            _ => match c {
                '\u{20AC}' => Some(0x80), // €
                '\u{2018}' => Some(0x91),
                '\u{2019}' => Some(0x92),
                '\u{201C}' => Some(0x93),
                '\u{201D}' => Some(0x94),
                '\u{2022}' => Some(0x95),
                '\u{2013}' => Some(0x96),
                '\u{2014}' => Some(0x97),
                _ => None,
            },
        };
        match byte {
            Some(b) => bytes.push(b),
            None => {
                bytes.push(b'?');
                substituted += 1;
            }
        }
    }

    (bytes, substituted)
}
