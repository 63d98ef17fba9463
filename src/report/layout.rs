//! 报表布局引擎
//!
//! 把归一化案件记录排成定尺寸页面上的块序列。只做几何计算，
//! 不做 PDF 序列化，因此可以直接对块和矩形断言做单元测试。
//!
//! 不变量：
//! - 任何块的矩形都不越过所在页的可打印下界
//! - 同页块之间不重叠（纵向游标单调前进）
//! - 章节头永不跨页（临近页底先开新页）

use crate::models::{CaseRecord, CaseTable};
use crate::report::fonts::{wrap_text, FontStyle};

// A4 纵向，单位毫米
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;
pub const PRINTABLE_WIDTH_MM: f32 = 190.0;
/// 页眉（报表标题）下方的内容起点
pub const CONTENT_TOP_MM: f32 = 30.0;
/// 内容可打印下界（其下留给页脚）
pub const PRINTABLE_BOTTOM_MM: f32 = 270.0;

pub const LINE_HEIGHT_MM: f32 = 6.0;
pub const SECTION_HEADER_HEIGHT_MM: f32 = 8.0;
pub const SECTION_SPACING_MM: f32 = 5.0;
pub const KEY_COLUMN_WIDTH_MM: f32 = 60.0;
/// 单元格内边距（折行宽度按两侧各留一份计算）
pub const CELL_PADDING_MM: f32 = 1.0;

/// 临近页底阈值：章节头
const SECTION_BREAK_THRESHOLD_MM: f32 = 250.0;
/// 临近页底阈值：普通行
const ROW_BREAK_THRESHOLD_MM: f32 = 260.0;

/// 单元格最多能排的行数；超出部分截断（视觉降级，不报错）
const MAX_CELL_LINES: usize =
    ((PRINTABLE_BOTTOM_MM - CONTENT_TOP_MM) / LINE_HEIGHT_MM) as usize;

/// 章节头底色（淡蓝）
pub const SECTION_FILL: (u8, u8, u8) = (200, 220, 255);
/// 表头底色（浅灰）
pub const TABLE_HEADER_FILL: (u8, u8, u8) = (240, 240, 240);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    SectionHeader,
    KeyValueRow,
    TableHeaderRow,
    TableDataRow,
    TextBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// 一个带边框的格子：矩形 + 已折行文本 + 字体样式
#[derive(Debug, Clone)]
pub struct Cell {
    pub rect: Rect,
    pub lines: Vec<String>,
    pub font: FontStyle,
    pub size_pt: f32,
    pub fill: Option<(u8, u8, u8)>,
    pub align: Align,
}

/// 布局块：同一行逻辑内容的全部格子
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    /// 所有格子的外包矩形
    pub rect: Rect,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportPage {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub pages: Vec<ReportPage>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// 把案件记录排版成分页报表
///
/// 每个顶层 Mapping 条目是一个章节：整宽章节头 + 按内容形态排版的主体 + 固定
/// 章节间距。顶层不是 Mapping 时整体当作一段文本兜底。
pub fn layout_report(record: &CaseRecord) -> ReportDocument {
    let mut cursor = LayoutCursor::new();

    match record {
        CaseRecord::Mapping(sections) => {
            for (name, content) in sections {
                layout_section(&mut cursor, name, content);
            }
        }
        other => layout_text_block(&mut cursor, &value_text(other)),
    }

    cursor.finish()
}

/// 纵向游标：持有已完成的页和当前页，负责分页判断
struct LayoutCursor {
    pages: Vec<ReportPage>,
    current: ReportPage,
    y: f32,
}

impl LayoutCursor {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: ReportPage::default(),
            y: CONTENT_TOP_MM,
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = CONTENT_TOP_MM;
    }

    /// 分页判断：越过临近页底阈值，或剩余空间放不下 `needed`，就开新页。
    /// 页首（还没放任何内容）不开新页，防止放不下时空转。
    fn ensure_room(&mut self, threshold: f32, needed: f32) {
        let over_threshold = self.y > threshold;
        let would_overflow = self.y + needed > PRINTABLE_BOTTOM_MM;
        if (over_threshold || would_overflow) && self.y > CONTENT_TOP_MM {
            self.break_page();
        }
    }

    fn push_block(&mut self, block: Block) {
        self.y = block.rect.bottom();
        self.current.blocks.push(block);
    }

    fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    fn finish(mut self) -> ReportDocument {
        self.pages.push(self.current);
        ReportDocument { pages: self.pages }
    }
}

fn layout_section(cursor: &mut LayoutCursor, name: &str, content: &CaseRecord) {
    cursor.ensure_room(SECTION_BREAK_THRESHOLD_MM, SECTION_HEADER_HEIGHT_MM);

    let rect = Rect {
        x: MARGIN_MM,
        y: cursor.y,
        w: PRINTABLE_WIDTH_MM,
        h: SECTION_HEADER_HEIGHT_MM,
    };
    cursor.push_block(Block {
        kind: BlockKind::SectionHeader,
        rect,
        cells: vec![Cell {
            rect,
            lines: vec![name.to_string()],
            font: FontStyle::Bold,
            size_pt: 12.0,
            fill: Some(SECTION_FILL),
            align: Align::Left,
        }],
    });

    match content {
        CaseRecord::Mapping(entries) => layout_mapping(cursor, entries),
        CaseRecord::Table(table) => layout_table(cursor, table),
        CaseRecord::Scalar(text) => layout_text_block(cursor, text),
    }

    cursor.advance(SECTION_SPACING_MM);
}

/// 两栏键值：键栏定宽加粗，值栏占满剩余；行高取两栏折行后的较大者
fn layout_mapping(cursor: &mut LayoutCursor, entries: &[(String, CaseRecord)]) {
    let value_width = PRINTABLE_WIDTH_MM - KEY_COLUMN_WIDTH_MM;

    for (key, value) in entries {
        let key_lines = wrap_cell_text(key, FontStyle::Bold, 10.0, KEY_COLUMN_WIDTH_MM);
        let value_lines =
            wrap_cell_text(&value_text(value), FontStyle::Regular, 10.0, value_width);
        let row_height = LINE_HEIGHT_MM * key_lines.len().max(value_lines.len()) as f32;

        cursor.ensure_room(ROW_BREAK_THRESHOLD_MM, row_height);

        let y = cursor.y;
        let key_rect = Rect {
            x: MARGIN_MM,
            y,
            w: KEY_COLUMN_WIDTH_MM,
            h: row_height,
        };
        let value_rect = Rect {
            x: MARGIN_MM + KEY_COLUMN_WIDTH_MM,
            y,
            w: value_width,
            h: row_height,
        };

        cursor.push_block(Block {
            kind: BlockKind::KeyValueRow,
            rect: Rect {
                x: MARGIN_MM,
                y,
                w: PRINTABLE_WIDTH_MM,
                h: row_height,
            },
            cells: vec![
                Cell {
                    rect: key_rect,
                    lines: key_lines,
                    font: FontStyle::Bold,
                    size_pt: 10.0,
                    fill: None,
                    align: Align::Left,
                },
                Cell {
                    rect: value_rect,
                    lines: value_lines,
                    font: FontStyle::Regular,
                    size_pt: 10.0,
                    fill: None,
                    align: Align::Left,
                },
            ],
        });
    }
}

/// 表格：列宽均分；表头加粗带底色；数据行 9pt；空表渲染一行占位
fn layout_table(cursor: &mut LayoutCursor, table: &CaseTable) {
    if table.is_empty() {
        let lines =
            wrap_cell_text("No records found.", FontStyle::Regular, 10.0, PRINTABLE_WIDTH_MM);
        let height = LINE_HEIGHT_MM * lines.len() as f32;
        cursor.ensure_room(ROW_BREAK_THRESHOLD_MM, height);

        let rect = Rect {
            x: MARGIN_MM,
            y: cursor.y,
            w: PRINTABLE_WIDTH_MM,
            h: height,
        };
        cursor.push_block(Block {
            kind: BlockKind::TableDataRow,
            rect,
            cells: vec![Cell {
                rect,
                lines,
                font: FontStyle::Regular,
                size_pt: 10.0,
                fill: None,
                align: Align::Left,
            }],
        });
        return;
    }

    let column_count = table.column_count();
    let column_width = PRINTABLE_WIDTH_MM / column_count as f32;

    layout_table_row(
        cursor,
        BlockKind::TableHeaderRow,
        table.headers(),
        column_width,
        FontStyle::Bold,
        10.0,
        Some(TABLE_HEADER_FILL),
        Align::Center,
    );

    for row in table.rows() {
        layout_table_row(
            cursor,
            BlockKind::TableDataRow,
            row,
            column_width,
            FontStyle::Regular,
            9.0,
            None,
            Align::Left,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn layout_table_row(
    cursor: &mut LayoutCursor,
    kind: BlockKind,
    cells_text: &[String],
    column_width: f32,
    font: FontStyle,
    size_pt: f32,
    fill: Option<(u8, u8, u8)>,
    align: Align,
) {
    let wrapped: Vec<Vec<String>> = cells_text
        .iter()
        .map(|text| wrap_cell_text(text, font, size_pt, column_width))
        .collect();
    let row_height = LINE_HEIGHT_MM
        * wrapped
            .iter()
            .map(|lines| lines.len())
            .max()
            .unwrap_or(1) as f32;

    cursor.ensure_room(ROW_BREAK_THRESHOLD_MM, row_height);

    let y = cursor.y;
    let cells: Vec<Cell> = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, lines)| Cell {
            rect: Rect {
                x: MARGIN_MM + column_width * i as f32,
                y,
                w: column_width,
                h: row_height,
            },
            lines,
            font,
            size_pt,
            fill,
            align,
        })
        .collect();

    cursor.push_block(Block {
        kind,
        rect: Rect {
            x: MARGIN_MM,
            y,
            w: column_width * cells.len() as f32,
            h: row_height,
        },
        cells,
    });
}

/// 整宽文本块；比一页还高的文本按页切块
fn layout_text_block(cursor: &mut LayoutCursor, text: &str) {
    if text.is_empty() {
        return;
    }

    let mut lines = wrap_text(
        text,
        FontStyle::Regular,
        10.0,
        PRINTABLE_WIDTH_MM - 2.0 * CELL_PADDING_MM,
    );

    while !lines.is_empty() {
        cursor.ensure_room(ROW_BREAK_THRESHOLD_MM, LINE_HEIGHT_MM);
        let available = ((PRINTABLE_BOTTOM_MM - cursor.y) / LINE_HEIGHT_MM) as usize;
        let take = lines.len().min(available.max(1));
        let chunk: Vec<String> = lines.drain(..take).collect();
        let height = LINE_HEIGHT_MM * chunk.len() as f32;

        let rect = Rect {
            x: MARGIN_MM,
            y: cursor.y,
            w: PRINTABLE_WIDTH_MM,
            h: height,
        };
        cursor.push_block(Block {
            kind: BlockKind::TextBlock,
            rect,
            cells: vec![Cell {
                rect,
                lines: chunk,
                font: FontStyle::Regular,
                size_pt: 10.0,
                fill: None,
                align: Align::Left,
            }],
        });
    }
}

/// 折行到单元格内宽，并截断到单页能容纳的行数
fn wrap_cell_text(text: &str, font: FontStyle, size_pt: f32, cell_width: f32) -> Vec<String> {
    let mut lines = wrap_text(text, font, size_pt, cell_width - 2.0 * CELL_PADDING_MM);
    lines.truncate(MAX_CELL_LINES);
    lines
}

/// 把任意形态的子记录转成两栏布局里值栏的文本
fn value_text(record: &CaseRecord) -> String {
    match record {
        CaseRecord::Scalar(text) => text.clone(),
        CaseRecord::Mapping(entries) => entries
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value_text(value)))
            .collect::<Vec<_>>()
            .join("\n"),
        CaseRecord::Table(table) => table
            .rows()
            .iter()
            .map(|row| row.join(" / "))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
