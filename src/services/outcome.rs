//! 提交结果判定 - 业务能力层
//!
//! 对单个页面快照做纯函数判定，不等待、不重试。
//! 规则按优先级排列，命中即返回。

use crate::models::DocumentSnapshot;

/// 验证码被驳回时页面上会出现的提示语（小写比较）
const REJECTION_PHRASES: [&str; 4] = [
    "invalid captcha",
    "wrong captcha",
    "does not match",
    "verification code",
];

/// 查询有效但没有任何记录时的提示语
const EMPTY_RESULT_PHRASES: [&str; 2] = ["record not found", "no records found"];

/// 结果容器选择器；任一可见即视为提交成功
///
/// 会话层采集快照时用同一份列表计算 `result_visible`
pub const SUCCESS_SELECTORS: &str =
    "#showList, #show_filing_details, #history_case_no, #caseHistory, .case_details_table";

/// 单次快照的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 提交被接受（出现结果容器，或有效的空结果）
    Success,
    /// 提交被驳回（弹窗或错误提示语）
    Rejected,
    /// 暂时无法判定，调用方继续轮询
    Pending,
}

/// 判定一次提交的结果
///
/// 优先级：弹窗 > 驳回提示语 > 结果容器可见 > 空结果提示语 > 待定。
/// 驳回提示语排在结果容器之前：旧结果可能还挂在页面上，
/// 而新的错误提示才反映本次提交。
pub fn classify(snapshot: &DocumentSnapshot) -> Outcome {
    if snapshot.alert_text.is_some() {
        return Outcome::Rejected;
    }

    let body = snapshot.body_text.to_lowercase();

    if REJECTION_PHRASES.iter().any(|phrase| body.contains(phrase)) {
        return Outcome::Rejected;
    }

    if snapshot.result_visible {
        return Outcome::Success;
    }

    if EMPTY_RESULT_PHRASES.iter().any(|phrase| body.contains(phrase)) {
        return Outcome::Success;
    }

    Outcome::Pending
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_not_found_is_success() {
        let snapshot = DocumentSnapshot::of_text("Record Not Found for the given case");
        assert_eq!(classify(&snapshot), Outcome::Success);
    }

    #[test]
    fn test_invalid_captcha_is_rejected() {
        let snapshot = DocumentSnapshot::of_text("Error: Invalid Captcha entered");
        assert_eq!(classify(&snapshot), Outcome::Rejected);
    }

    #[test]
    fn test_neutral_text_is_pending() {
        let snapshot = DocumentSnapshot::of_text("Please wait while we process your request");
        assert_eq!(classify(&snapshot), Outcome::Pending);
    }

    #[test]
    fn test_alert_wins_over_visible_results() {
        let snapshot = DocumentSnapshot {
            alert_text: Some("Enter captcha".to_string()),
            body_text: "Record Not Found".to_string(),
            result_visible: true,
        };
        assert_eq!(classify(&snapshot), Outcome::Rejected);
    }

    #[test]
    fn test_rejection_phrase_wins_over_visible_results() {
        // 上一次查询的结果容器可能还在页面上
        let snapshot = DocumentSnapshot {
            alert_text: None,
            body_text: "The captcha does not match".to_string(),
            result_visible: true,
        };
        assert_eq!(classify(&snapshot), Outcome::Rejected);
    }

    #[test]
    fn test_visible_results_are_success() {
        let snapshot = DocumentSnapshot {
            alert_text: None,
            body_text: "Case History".to_string(),
            result_visible: true,
        };
        assert_eq!(classify(&snapshot), Outcome::Success);
    }
}
