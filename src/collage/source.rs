//! # 数据源模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”收敛为一个带标签的枚举，每个变体对应一种加载策略：
//! - `Buffer`：内存字节，直接返回
//! - `Location`：URL 或本地路径字符串，在加载时按前缀（`http` / `ftp`）区分
//! - `File`：`Path`/`PathBuf` 构造的本地路径，原样保留（含非 UTF-8 路径）
//! - `Canvas`：已绘制的画布，同步编码为 PNG
//!
//! 在 Rust 接口里“其他类型”无法构造；只有 JSON 入口（`from_json`）会遇到
//! 数字、布尔值等无法识别的值，并在那里返回 `UnsupportedSourceType`。

use std::fmt;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use serde_json::Value;

use super::{Canvas, CollageError};

/// 图片输入来源。
#[derive(Clone)]
pub enum ImageSource {
    /// 已编码的图片字节。
    Buffer(Bytes),
    /// 网络地址或本地文件路径。
    Location(String),
    /// 本地文件路径，不经过字符串转换。
    File(PathBuf),
    /// 已绘制完成的画布。
    Canvas(Canvas),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Self::Location(location) => f.debug_tuple("Location").field(location).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Canvas(canvas) => {
                write!(f, "Canvas({}x{})", canvas.width(), canvas.height())
            }
        }
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Buffer(Bytes::from(bytes))
    }
}

impl From<Bytes> for ImageSource {
    fn from(bytes: Bytes) -> Self {
        Self::Buffer(bytes)
    }
}

impl From<&str> for ImageSource {
    fn from(location: &str) -> Self {
        Self::Location(location.to_string())
    }
}

impl From<String> for ImageSource {
    fn from(location: String) -> Self {
        Self::Location(location)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<Canvas> for ImageSource {
    fn from(canvas: Canvas) -> Self {
        Self::Canvas(canvas)
    }
}

/// 判断地址是否按网络来源处理。
///
/// 仅看前缀，`http`、`https`、`ftp`、`ftps` 都视为网络地址。
pub(crate) fn is_remote_location(location: &str) -> bool {
    location.starts_with("http") || location.starts_with("ftp")
}

impl ImageSource {
    /// 从 JSON 值构造来源。
    ///
    /// - 字符串：`data:image/...;base64,` 解码为字节，其余视为 URL / 路径
    /// - 数字数组，或 `{"type":"Buffer","data":[...]}`：视为字节
    /// - 其他：`UnsupportedSourceType`
    pub fn from_json(value: &Value) -> Result<Self, CollageError> {
        match value {
            Value::String(text) if text.trim_start().starts_with("data:") => {
                Ok(Self::Buffer(Bytes::from(parse_data_url(text)?)))
            }
            Value::String(text) => Ok(Self::Location(text.clone())),
            Value::Array(items) => byte_array(items)
                .map(|bytes| Self::Buffer(Bytes::from(bytes)))
                .ok_or_else(|| CollageError::UnsupportedSourceType("array".to_string())),
            Value::Object(map) => {
                let is_buffer = map.get("type").and_then(Value::as_str) == Some("Buffer");
                match (is_buffer, map.get("data")) {
                    (true, Some(Value::Array(items))) => byte_array(items)
                        .map(|bytes| Self::Buffer(Bytes::from(bytes)))
                        .ok_or_else(|| CollageError::UnsupportedSourceType("object".to_string())),
                    _ => Err(CollageError::UnsupportedSourceType("object".to_string())),
                }
            }
            other => Err(CollageError::UnsupportedSourceType(json_type_name(other).to_string())),
        }
    }

    /// 来源提示（用于日志与诊断）。
    pub(crate) fn hint(&self) -> &'static str {
        match self {
            Self::Buffer(_) => "buffer",
            Self::Location(location) if is_remote_location(location) => "url",
            Self::Location(_) | Self::File(_) => "file",
            Self::Canvas(_) => "canvas",
        }
    }
}

fn byte_array(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 解析 `data:<mime>;base64,<payload>` 形式的来源。
fn parse_data_url(data: &str) -> Result<Vec<u8>, CollageError> {
    let normalized = data.trim();

    let base64_start = normalized
        .find(";base64,")
        .ok_or_else(|| CollageError::InvalidFormat("缺少 base64 标记".to_string()))?;

    general_purpose::STANDARD
        .decode(&normalized[base64_start + 8..])
        .map_err(|e| CollageError::InvalidFormat(format!("Base64 解码失败：{}", e)))
}
