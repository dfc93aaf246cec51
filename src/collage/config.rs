//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“进程级策略”集中到 `ComposerConfig`：来源体积上限、超时、解码像素上限、
//! 画布像素上限、缩放滤镜以及文本样式。单次调用的布局参数（网格、间距、背景色）
//! 不在这里，见 `options` 模块。
//!
//! ## 实现思路
//!
//! - `Default` 与既有输出保持一致：不设超时，文本 40px 黑色、起点 (150,150)、行距 75。
//! - `ScalingProfile` 负责档位字符串解析与反向输出。
//! - `apply_scaling_profile` 将档位转换为具体滤镜。
//! - `infer_scaling_profile` 用于从当前配置反推档位。

use image::Rgba;
use image::imageops::FilterType;

use super::CollageError;

/// 文本绘制样式。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// 字号（像素）。
    pub font_size: f32,
    /// 文字填充色，与背景色无关。
    pub fill: Rgba<u8>,
    /// 第一行的水平起点。
    pub origin_x: i64,
    /// 第一行的基线位置。
    pub origin_y: i64,
    /// 行距（像素）。
    pub line_height: i64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 40.0,
            fill: Rgba([0, 0, 0, 255]),
            origin_x: 150,
            origin_y: 150,
            line_height: 75,
        }
    }
}

/// 拼图处理配置。
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// 单个来源允许的最大字节数。
    pub max_file_size: u64,
    /// 网络下载总超时（秒），`None` 表示不限制。
    pub download_timeout: Option<u64>,
    /// 建立连接超时（秒），`None` 表示不限制。
    pub connect_timeout: Option<u64>,
    /// 解码前按图片头校验的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 创建画布前校验的像素上限。
    pub max_canvas_pixels: u64,
    /// 缩放到格子尺寸时使用的滤镜。
    pub resize_filter: FilterType,
    /// 文本卡片的样式。
    pub text_style: TextStyle,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            download_timeout: None,
            connect_timeout: None,
            max_decoded_pixels: 40_000_000,
            max_canvas_pixels: 100_000_000,
            resize_filter: FilterType::Triangle,
            text_style: TextStyle::default(),
        }
    }
}

/// 缩放质量档位。
///
/// - `Quality`：CatmullRom，尽量保真
/// - `Balanced`：Triangle（默认）
/// - `Speed`：Nearest，优先速度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingProfile {
    Quality,
    Balanced,
    Speed,
}

impl ScalingProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use photo_collage::collage::ScalingProfile;
    ///
    /// let p = ScalingProfile::from_str("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), photo_collage::collage::CollageError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(profile: &str) -> Result<Self, CollageError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(CollageError::InvalidOption(format!(
                "未知缩放档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl ComposerConfig {
    /// 基于当前滤镜反推缩放档位。
    pub fn infer_scaling_profile(&self) -> ScalingProfile {
        match self.resize_filter {
            FilterType::CatmullRom | FilterType::Lanczos3 | FilterType::Gaussian => {
                ScalingProfile::Quality
            }
            FilterType::Nearest => ScalingProfile::Speed,
            FilterType::Triangle => ScalingProfile::Balanced,
        }
    }

    pub fn apply_scaling_profile(&mut self, profile: ScalingProfile) {
        self.resize_filter = match profile {
            ScalingProfile::Quality => FilterType::CatmullRom,
            ScalingProfile::Balanced => FilterType::Triangle,
            ScalingProfile::Speed => FilterType::Nearest,
        };
    }
}
