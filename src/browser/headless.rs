use std::path::Path;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{Result, ScrapeError};

/// 启动无头浏览器并导航到查询表单页
///
/// 每个请求独占一个浏览器实例；调用方负责在所有退出路径上关闭它
pub async fn launch_headless_browser(config: &Config) -> Result<(Browser, Page)> {
    info!("🚀 启动无头浏览器...");
    debug!("目标 URL: {}", config.ecourts_url);

    let mut builder = BrowserConfig::builder()
        .new_headless_mode()
        .window_size(1920, 1080)
        .args(vec![
            "--disable-gpu",           // 无头模式下禁用 GPU
            "--no-sandbox",            // 禁用沙盒，防止权限问题导致的崩溃
            "--disable-dev-shm-usage", // 防止共享内存不足
        ]);

    if let Some(path) = &config.chrome_executable {
        builder = builder.chrome_executable(Path::new(path));
    }

    let browser_config = builder.build().map_err(|e| {
        error!("配置无头浏览器失败: {}", e);
        ScrapeError::BrowserLaunch(e)
    })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        e
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    // 创建新页面并导航
    let page = browser.new_page(config.ecourts_url.as_str()).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        e
    })?;

    // 等待初始导航完成；表单控件随后由会话层按需轮询
    let _ = page.wait_for_navigation().await?;

    info!("✅ 无头浏览器已导航到查询表单页");
    Ok((browser, page))
}
