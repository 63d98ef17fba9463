//! ReportDocument → PDF 字节流
//!
//! 用 lopdf 手工构建文档：内置 Helvetica 三款核心字体（常规/加粗/斜体），
//! 每页一个内容流，页面几何来自布局块，文本按 WinAnsi 编码、
//! 无法表示的字符逐个替换为 '?'（记一条警告，不失败）。

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use tracing::warn;

use crate::error::Result;
use crate::report::fonts::{encode_win_ansi, text_width_mm, FontStyle};
use crate::report::layout::{
    Align, Cell, ReportDocument, ReportPage, CELL_PADDING_MM, LINE_HEIGHT_MM, PAGE_HEIGHT_MM,
    PAGE_WIDTH_MM,
};

/// 每页顶部居中的报表标题
const REPORT_TITLE: &str = "eCourts Case Status Report";
/// 标题基线位置（毫米，自页顶算）
const TITLE_BASELINE_MM: f32 = 16.0;
/// 页脚基线位置
const FOOTER_BASELINE_MM: f32 = 287.0;

const PT_PER_MM: f32 = 72.0 / 25.4;

/// 把分页报表序列化为 PDF
pub fn write_pdf(report: &ReportDocument) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let font_bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let font_italic = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Oblique",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_regular,
            "F2" => font_bold,
            "F3" => font_italic,
        },
    });

    let mut substituted_total = 0usize;
    let mut page_ids = Vec::new();

    for (index, page) in report.pages.iter().enumerate() {
        let operations = page_operations(page, index + 1, &mut substituted_total);
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_ids.len() as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(595.28),
            Object::Real(841.89),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    if substituted_total > 0 {
        warn!(
            "⚠️ {} 个字符无法用输出编码表示，已替换为 '?'",
            substituted_total
        );
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// 单页的内容流：页眉标题、页脚页码、全部布局块
fn page_operations(page: &ReportPage, page_number: usize, substituted: &mut usize) -> Vec<Operation> {
    let mut ops = Vec::new();

    // FPDF 风格的细边框线宽（0.2mm）
    ops.push(Operation::new("w", vec![real(0.57)]));

    // 页眉
    let title_x = (PAGE_WIDTH_MM - text_width_mm(REPORT_TITLE, FontStyle::Bold, 12.0)) / 2.0;
    let (title_bytes, _) = encode_win_ansi(REPORT_TITLE);
    ops.extend(show_text(title_x, TITLE_BASELINE_MM, FontStyle::Bold, 12.0, title_bytes));

    // 页脚
    let footer = format!("Page {}", page_number);
    let footer_x = (PAGE_WIDTH_MM - text_width_mm(&footer, FontStyle::Italic, 8.0)) / 2.0;
    let (footer_bytes, _) = encode_win_ansi(&footer);
    ops.extend(show_text(
        footer_x,
        FOOTER_BASELINE_MM,
        FontStyle::Italic,
        8.0,
        footer_bytes,
    ));

    for block in &page.blocks {
        for cell in &block.cells {
            ops.extend(cell_operations(cell, substituted));
        }
    }

    ops
}

/// 一个格子：底色（可选）→ 边框 → 逐行文本
fn cell_operations(cell: &Cell, substituted: &mut usize) -> Vec<Operation> {
    let mut ops = Vec::new();

    let rect_operands = vec![
        real(pt(cell.rect.x)),
        real(flip_y(cell.rect.bottom())),
        real(pt(cell.rect.w)),
        real(pt(cell.rect.h)),
    ];

    if let Some((r, g, b)) = cell.fill {
        ops.push(Operation::new(
            "rg",
            vec![
                real(f32::from(r) / 255.0),
                real(f32::from(g) / 255.0),
                real(f32::from(b) / 255.0),
            ],
        ));
        ops.push(Operation::new("re", rect_operands.clone()));
        ops.push(Operation::new("f", vec![]));
        // 恢复黑色，后续文本也走非描边色
        ops.push(Operation::new("rg", vec![real(0.0), real(0.0), real(0.0)]));
    }

    ops.push(Operation::new("re", rect_operands));
    ops.push(Operation::new("S", vec![]));

    for (i, line) in cell.lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let (bytes, subs) = encode_win_ansi(line);
        *substituted += subs;

        let baseline_mm = cell.rect.y + LINE_HEIGHT_MM * (i as f32 + 1.0) - 1.7;
        let x_mm = match cell.align {
            Align::Left => cell.rect.x + CELL_PADDING_MM,
            Align::Center => {
                let width = text_width_mm(line, cell.font, cell.size_pt);
                cell.rect.x + ((cell.rect.w - width) / 2.0).max(CELL_PADDING_MM)
            }
        };
        ops.extend(show_text(x_mm, baseline_mm, cell.font, cell.size_pt, bytes));
    }

    ops
}

fn show_text(x_mm: f32, baseline_mm: f32, font: FontStyle, size_pt: f32, bytes: Vec<u8>) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font_name(font).to_vec()), real(size_pt)],
        ),
        Operation::new("Td", vec![real(pt(x_mm)), real(flip_y(baseline_mm))]),
        Operation::new("Tj", vec![Object::String(bytes, StringFormat::Literal)]),
        Operation::new("ET", vec![]),
    ]
}

fn font_name(font: FontStyle) -> &'static [u8] {
    match font {
        FontStyle::Regular => b"F1",
        FontStyle::Bold => b"F2",
        FontStyle::Italic => b"F3",
    }
}

fn pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// PDF 坐标系原点在左下角，纵轴翻转
fn flip_y(mm: f32) -> f32 {
    (PAGE_HEIGHT_MM - mm) * PT_PER_MM
}

fn real(value: f32) -> Object {
    Object::Real(value)
}
