//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 拼图链路（参数校验 → 来源加载 → 解码 → 绘制）只有一个错误枚举。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//! 除“超出网格容量的来源被跳过”之外，任何错误都不会被吞掉。

/// 拼图处理统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum CollageError {
    /// 必填参数缺失，携带调用方可见的字段名（如 `imageWidth`）。
    #[error("缺少必填参数：{0}")]
    MissingOption(&'static str),

    /// 网络下载或文件读取失败，`location` 为原始 URL / 路径。
    #[error("无法获取图片来源：{location}（{reason}）")]
    SourceUnavailable { location: String, reason: String },

    /// 来源值不属于任何已知类型。
    #[error("不支持的图片来源类型：{0}")]
    UnsupportedSourceType(String),

    #[error("参数错误：{0}")]
    InvalidOption(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("渲染错误：{0}")]
    Render(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}

impl CollageError {
    pub(crate) fn source_unavailable(location: &str, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    /// 稳定的机器可读错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingOption(_) => "missing_option",
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::UnsupportedSourceType(_) => "unsupported_source_type",
            Self::InvalidOption(_) => "invalid_option",
            Self::InvalidFormat(_) => "invalid_format",
            Self::Decode(_) => "decode_failed",
            Self::Render(_) => "render_failed",
            Self::ResourceLimit(_) => "resource_limit",
        }
    }

    /// 出错所在阶段，便于日志聚合。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::MissingOption(_) | Self::InvalidOption(_) | Self::UnsupportedSourceType(_) => {
                "options"
            }
            Self::SourceUnavailable { .. } | Self::ResourceLimit(_) => "load",
            Self::InvalidFormat(_) | Self::Decode(_) => "decode",
            Self::Render(_) => "render",
        }
    }
}

impl From<CollageError> for String {
    fn from(error: CollageError) -> Self {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_unavailable_message_names_location() {
        let err = CollageError::source_unavailable("/tmp/missing.png", "No such file");

        assert!(err.to_string().contains("/tmp/missing.png"));
        assert_eq!(err.code(), "source_unavailable");
        assert_eq!(err.stage(), "load");
    }

    #[test]
    fn missing_option_uses_caller_field_name() {
        let err = CollageError::MissingOption("imageWidth");

        assert_eq!(err.to_string(), "缺少必填参数：imageWidth");
        assert_eq!(err.stage(), "options");
    }
}
