//! 报表渲染
//!
//! 分两个纯阶段：`layout` 把案件记录排成带坐标的分页块结构，
//! `pdf_writer` 把块结构序列化为 PDF 字节流。几何断言只依赖前者。

pub mod fonts;
pub mod layout;
pub mod pdf_writer;

pub use layout::{layout_report, ReportDocument};
pub use pdf_writer::write_pdf;
