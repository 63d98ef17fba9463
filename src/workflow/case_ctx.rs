//! 案件查询上下文
//!
//! 封装"我正在查哪一宗案件"这一信息

use std::fmt::Display;

use crate::error::{Result, ScrapeError};

/// 案件查询上下文
#[derive(Debug, Clone)]
pub struct CaseCtx {
    /// 案件类型（下拉选项的部分文本，如 "Cr.A(SJ)"）
    pub case_type: String,
    /// 案号
    pub case_number: String,
    /// 立案年份（四位数字）
    pub year: String,
}

impl CaseCtx {
    pub fn new(
        case_type: impl Into<String>,
        case_number: impl Into<String>,
        year: impl Into<String>,
    ) -> Self {
        Self {
            case_type: case_type.into(),
            case_number: case_number.into(),
            year: year.into(),
        }
    }

    /// 校验请求字段；不通过的请求在碰浏览器之前就被拒绝
    pub fn validate(&self) -> Result<()> {
        if self.case_type.trim().is_empty() {
            return Err(ScrapeError::InvalidInput("case_type 不能为空".to_string()));
        }
        if self.case_number.trim().is_empty() {
            return Err(ScrapeError::InvalidInput("case_number 不能为空".to_string()));
        }
        if self.year.len() != 4 || !self.year.chars().all(|c| c.is_ascii_digit()) {
            return Err(ScrapeError::InvalidInput(
                "year 必须是四位数字".to_string(),
            ));
        }
        Ok(())
    }

    /// 报告下载文件名
    pub fn report_filename(&self) -> String {
        format!("Case_{}_{}.pdf", self.case_number, self.year)
    }
}

impl Display for CaseCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.case_type, self.case_number, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request_passes() {
        assert!(CaseCtx::new("Cr.A(SJ)", "123", "2021").validate().is_ok());
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let err = CaseCtx::new("", "123", "2021").validate().unwrap_err();
        assert!(err.is_client_error());

        let err = CaseCtx::new("Cr.A(SJ)", "  ", "2021").validate().unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_malformed_year_is_rejected() {
        assert!(CaseCtx::new("Cr.A(SJ)", "123", "21").validate().is_err());
        assert!(CaseCtx::new("Cr.A(SJ)", "123", "20x1").validate().is_err());
        assert!(CaseCtx::new("Cr.A(SJ)", "123", "20211").validate().is_err());
    }

    #[test]
    fn test_report_filename() {
        let ctx = CaseCtx::new("Cr.A(SJ)", "456", "2023");
        assert_eq!(ctx.report_filename(), "Case_456_2023.pdf");
    }
}
