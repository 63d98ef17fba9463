//! 案件记录数据模型
//!
//! 抽取引擎的产物：一个运行期决定形态的递归值。用显式的带标签枚举表示，
//! 渲染层对它做穷尽匹配，而不是运行期类型猜测。

/// 归一化的案件记录
///
/// 顶层永远是 `Mapping`（章节名 → 子记录）。生成后不再修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseRecord {
    /// 纯文本（当事人/律师列表等自由文本章节）
    Scalar(String),
    /// 有序键值对（案件详情、案件状态等）
    Mapping(Vec<(String, CaseRecord)>),
    /// 表格（法条、命令、中间申请等）
    Table(CaseTable),
}

impl CaseRecord {
    pub fn scalar(text: impl Into<String>) -> Self {
        CaseRecord::Scalar(text.into())
    }

    pub fn empty_mapping() -> Self {
        CaseRecord::Mapping(Vec::new())
    }

    /// 记录是否没有任何实际内容
    pub fn is_empty(&self) -> bool {
        match self {
            CaseRecord::Scalar(text) => text.is_empty(),
            CaseRecord::Mapping(entries) => entries.is_empty(),
            CaseRecord::Table(table) => table.is_empty(),
        }
    }

    /// 在 Mapping 中按键查找子记录（非 Mapping 返回 None）
    pub fn get(&self, key: &str) -> Option<&CaseRecord> {
        match self {
            CaseRecord::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, record)| record),
            _ => None,
        }
    }
}

/// 表头固定的表格
///
/// 不变量：每一行的列数恰好等于表头列数。`push_row` 对列数不匹配的行直接丢弃，
/// 既不补空也不截断。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaseTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CaseTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// 追加一行；列数与表头不一致时丢弃并返回 false
    pub fn push_row(&mut self, row: Vec<String>) -> bool {
        if row.len() != self.headers.len() {
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_drops_mismatched_columns() {
        let mut table = CaseTable::new(vec!["A".to_string(), "B".to_string()]);

        assert!(table.push_row(vec!["1".to_string(), "2".to_string()]));
        assert!(!table.push_row(vec!["3".to_string()]));
        assert!(!table.push_row(vec!["3".to_string(), "4".to_string(), "5".to_string()]));

        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0], vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_mapping_lookup() {
        let record = CaseRecord::Mapping(vec![(
            "CNR Number".to_string(),
            CaseRecord::scalar("ABC123"),
        )]);

        assert_eq!(
            record.get("CNR Number"),
            Some(&CaseRecord::scalar("ABC123"))
        );
        assert_eq!(record.get("Missing"), None);
    }

    #[test]
    fn test_is_empty() {
        assert!(CaseRecord::scalar("").is_empty());
        assert!(CaseRecord::empty_mapping().is_empty());
        assert!(CaseRecord::Table(CaseTable::default()).is_empty());
        assert!(!CaseRecord::scalar("x").is_empty());
    }
}
