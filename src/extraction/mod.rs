//! 抽取引擎
//!
//! 结果页面的结构因页面变体而异，也可能缺少预期元素，所以抽取不是一次
//! 整体解析，而是一串彼此独立、尽力而为的章节抽取器。找不到锚点的章节
//! 贡献一个空值，整体抽取永远不会因为单个章节失败。
//!
//! 输出的顶层 Mapping 始终包含全部章节名，顺序固定。

pub mod sections;

use scraper::Html;
use tracing::debug;

use crate::models::CaseRecord;

/// 从结果页 HTML 中抽取归一化案件记录
///
/// 对同一份输入是确定性的：两次调用产出结构相同的记录
pub fn extract_case_record(html: &str) -> CaseRecord {
    let document = Html::parse_document(html);

    let sections: Vec<(String, CaseRecord)> = [
        ("Case Details", sections::case_details(&document)),
        ("Case Status", sections::case_status(&document)),
        (
            "Petitioner and Advocate",
            sections::petitioner_advocate(&document),
        ),
        (
            "Respondent and Advocate",
            sections::respondent_advocate(&document),
        ),
        ("Acts", sections::acts(&document)),
        (
            "Subordinate Court Information",
            sections::subordinate_court(&document),
        ),
        ("FIR Details", sections::fir_details(&document)),
        ("IA Details", sections::ia_details(&document)),
        ("Orders", sections::orders(&document)),
        ("Category Details", sections::category_details(&document)),
    ]
    .into_iter()
    .map(|(name, record)| (name.to_string(), record))
    .collect();

    let missing: Vec<&str> = sections
        .iter()
        .filter(|(_, record)| record.is_empty())
        .map(|(name, _)| name.as_str())
        .collect();
    if !missing.is_empty() {
        debug!("未能抽取的章节（保留为空值）: {:?}", missing);
    }

    CaseRecord::Mapping(sections)
}
