//! 页面状态快照
//!
//! 由会话层在一次 JS 求值中原子地采集。采集时会顺带读取并清空弹窗钩子，
//! 所以拿到快照后，判定函数可以保持纯函数。

use serde::Deserialize;

/// 提交验证码后某一时刻的页面状态
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    /// 被钩子截获的弹窗文本（截获即视为已确认/关闭）
    #[serde(default)]
    pub alert_text: Option<String>,
    /// 页面可见文本
    #[serde(default)]
    pub body_text: String,
    /// 任一结果容器是否可见
    #[serde(default)]
    pub result_visible: bool,
}

impl DocumentSnapshot {
    /// 只含可见文本的快照（测试和日志场景）
    pub fn of_text(text: impl Into<String>) -> Self {
        Self {
            body_text: text.into(),
            ..Self::default()
        }
    }
}
