//! 验证码识别 - 业务能力层
//!
//! 识别本身是尽力而为的外部能力：结果可能是空串，也可能是乱码，
//! 由解析循环决定怎么处理。

use tokio::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, ScrapeError};

/// 验证码图片 → 候选文本
#[allow(async_fn_in_trait)]
pub trait ChallengeRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String>;
}

/// 基于 Tesseract 命令行的识别实现
///
/// 截图先灰度化再送入 OCR，识别率明显更高。
/// 中间文件放在临时文件里，任何退出路径（含错误）都会随 drop 删除。
pub struct TesseractRecognizer {
    tesseract_cmd: String,
}

impl TesseractRecognizer {
    pub fn new(config: &Config) -> Self {
        Self {
            tesseract_cmd: config.tesseract_cmd.clone(),
        }
    }
}

impl ChallengeRecognizer for TesseractRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String> {
        let gray = image::load_from_memory(image)?.to_luma8();

        // tesseract 按扩展名识别格式，后缀必须是 .png
        let staging = tempfile::Builder::new()
            .prefix("captcha_")
            .suffix(".png")
            .tempfile()?;
        gray.save(staging.path())?;

        let output = Command::new(&self.tesseract_cmd)
            .arg(staging.path())
            .arg("stdout")
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ScrapeError::Recognition(stderr));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("OCR 原始输出: {:?}", text);
        Ok(text)
    }
}
