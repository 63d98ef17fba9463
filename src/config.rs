use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// 程序配置
///
/// 默认值即 eCourts 站点的实际参数；可通过 `config.toml` 或环境变量覆盖
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 服务监听端口
    pub server_port: u16,
    /// 同时处理的案件请求数量（每个请求独占一个浏览器实例）
    pub max_concurrent_cases: usize,
    /// 查询表单页面 URL
    pub ecourts_url: String,
    /// 浏览器可执行文件路径（None 时由 chromiumoxide 自动探测）
    pub chrome_executable: Option<String>,
    /// Tesseract 可执行文件（需在 PATH 中，或写绝对路径）
    pub tesseract_cmd: String,
    /// 等待表单控件出现/就绪的时限（秒）
    pub form_timeout_secs: u64,
    /// 验证码最大自动尝试次数
    pub max_attempts: usize,
    /// 单次提交后的验证窗口（秒）
    pub validation_window_secs: u64,
    /// 验证轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 等待验证码图片加载完成的时限（秒）
    pub image_load_timeout_secs: u64,
    /// 验证通过后等待结果容器出现的时限（秒）
    pub result_window_secs: u64,
    /// 自动识别耗尽后，等待人工完成验证码的时限（秒）
    pub manual_window_secs: u64,
    /// 自动识别耗尽后是否降级为等待人工干预（false 则直接报错）
    pub manual_fallback: bool,
    /// 是否输出详细日志（JS 载荷、页面快照等）
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 5000,
            max_concurrent_cases: 2,
            ecourts_url: "https://hcservices.ecourts.gov.in/ecourtindiaHC/cases/case_no.php?state_cd=7&dist_cd=1&court_code=1&stateNm=Madhya%20Pradesh".to_string(),
            chrome_executable: None,
            tesseract_cmd: "tesseract".to_string(),
            form_timeout_secs: 20,
            max_attempts: 5,
            validation_window_secs: 15,
            poll_interval_ms: 500,
            image_load_timeout_secs: 5,
            result_window_secs: 60,
            manual_window_secs: 300,
            manual_fallback: true,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载配置：config.toml（若存在）→ 环境变量覆盖
    pub fn load() -> Self {
        Self::from_file("config.toml")
            .unwrap_or_default()
            .with_env_overrides()
    }

    /// 从 TOML 文件读取配置；文件不存在或解析失败返回 None
    pub fn from_file(path: &str) -> Option<Self> {
        let text = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&text) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("⚠️ 解析 {} 失败，使用默认配置: {}", path, e);
                None
            }
        }
    }

    fn with_env_overrides(self) -> Self {
        Self {
            server_port: env_parse("SERVER_PORT", self.server_port),
            max_concurrent_cases: env_parse("MAX_CONCURRENT_CASES", self.max_concurrent_cases),
            ecourts_url: std::env::var("ECOURTS_URL").unwrap_or(self.ecourts_url),
            chrome_executable: std::env::var("CHROME_EXECUTABLE")
                .ok()
                .or(self.chrome_executable),
            tesseract_cmd: std::env::var("TESSERACT_CMD").unwrap_or(self.tesseract_cmd),
            form_timeout_secs: env_parse("FORM_TIMEOUT_SECS", self.form_timeout_secs),
            max_attempts: env_parse("MAX_ATTEMPTS", self.max_attempts),
            validation_window_secs: env_parse("VALIDATION_WINDOW_SECS", self.validation_window_secs),
            poll_interval_ms: env_parse("POLL_INTERVAL_MS", self.poll_interval_ms),
            image_load_timeout_secs: env_parse("IMAGE_LOAD_TIMEOUT_SECS", self.image_load_timeout_secs),
            result_window_secs: env_parse("RESULT_WINDOW_SECS", self.result_window_secs),
            manual_window_secs: env_parse("MANUAL_WINDOW_SECS", self.manual_window_secs),
            manual_fallback: env_parse("MANUAL_FALLBACK", self.manual_fallback),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging),
        }
    }

    pub fn form_timeout(&self) -> Duration {
        Duration::from_secs(self.form_timeout_secs)
    }

    pub fn validation_window(&self) -> Duration {
        Duration::from_secs(self.validation_window_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn image_load_timeout(&self) -> Duration {
        Duration::from_secs(self.image_load_timeout_secs)
    }

    pub fn result_window(&self) -> Duration {
        Duration::from_secs(self.result_window_secs)
    }

    pub fn manual_window(&self) -> Duration {
        Duration::from_secs(self.manual_window_secs)
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let config = Config::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.validation_window(), Duration::from_secs(15));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str("max_attempts = 3").expect("合法的 TOML 片段");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.server_port, 5000);
    }
}
