//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，对上层只暴露三种能力：
//! 执行 JS、把 JS 结果反序列化为类型、对单个元素截图。
//! 不认识案件、验证码等业务概念。

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::Result;

/// JS 执行器
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于导航等少数场景）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 对匹配选择器的第一个元素截图，返回 PNG 字节
    pub async fn capture_element(&self, selector: &str) -> Result<Vec<u8>> {
        let element = self.page.find_element(selector).await?;
        let bytes = element.screenshot(CaptureScreenshotFormat::Png).await?;
        Ok(bytes)
    }
}
