//! # 调用参数模块
//!
//! ## 设计思路
//!
//! 每个入口各有一个“原始参数”结构（字段全部可选）和一个校验后的结构。
//! 默认值以函数式方式补齐：`validate` 消费原始参数、返回新结构，调用方传入的数据不会被原地修改。
//!
//! ## 实现思路
//!
//! - 必填字段按固定声明顺序检查，报告第一个缺失的字段。
//! - 数值为 0、颜色为空字符串都按“未提供”处理，与既有调用约定一致：
//!   `width: 0` 报缺失，`canvasWidth: 0` 表示按网格推导。
//! - JSON 入口统一走 `from_json`，字段名使用 camelCase。

use image::Rgba;
use serde::Deserialize;
use serde_json::Value;

use super::color::parse_color;
use super::layout::{GridLayout, OuterSpacing};
use super::{CollageError, ImageSource};

const DEFAULT_BACKGROUND: &str = "#000000";

/// `create_collage` 的完整参数。
#[derive(Debug, Clone, Default)]
pub struct CollageOptions {
    pub sources: Option<Vec<ImageSource>>,
    /// 每行格子数。
    pub width: Option<u32>,
    /// 行数。
    pub height: Option<u32>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    /// 格子间距，默认 0。
    pub spacing: Option<u32>,
    /// 背景色，默认 `#000000`。
    pub background_color: Option<String>,
    /// 水印来源，每个格子绘制后都会在画布原点叠加一次。
    pub overlay: Option<ImageSource>,
    pub overlay_width: Option<u32>,
    pub overlay_height: Option<u32>,
    /// 显式画布尺寸，缺省时按网格推导。
    pub canvas_width: Option<u32>,
    pub canvas_height: Option<u32>,
    pub outer_spacing: Option<OuterSpacing>,
}

/// `create_collage` 的入参：裸来源列表或完整参数。
#[derive(Debug, Clone)]
pub enum CollageRequest {
    Sources(Vec<ImageSource>),
    Options(CollageOptions),
}

impl From<Vec<ImageSource>> for CollageRequest {
    fn from(sources: Vec<ImageSource>) -> Self {
        Self::Sources(sources)
    }
}

impl From<CollageOptions> for CollageRequest {
    fn from(options: CollageOptions) -> Self {
        Self::Options(options)
    }
}

impl CollageRequest {
    /// 裸列表等价于 `{ sources: list }`，其余字段走默认 / 必填校验。
    pub fn into_options(self) -> CollageOptions {
        match self {
            Self::Sources(sources) => CollageOptions {
                sources: Some(sources),
                ..CollageOptions::default()
            },
            Self::Options(options) => options,
        }
    }

    /// 从 JSON 构造：数组视为裸来源列表，对象视为完整参数。
    pub fn from_json(value: Value) -> Result<Self, CollageError> {
        match value {
            Value::Array(items) => Ok(Self::Sources(sources_from_json(&items)?)),
            other => CollageOptions::from_json(other).map(Self::Options),
        }
    }
}

/// 校验后的拼图参数。
#[derive(Debug, Clone)]
pub struct CollageLayout {
    pub sources: Vec<ImageSource>,
    pub grid: GridLayout,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background: Rgba<u8>,
    pub overlay: Option<OverlaySpec>,
}

/// 拼图中的水印：来源 + 可选绘制尺寸（缺省为原始尺寸）。
#[derive(Debug, Clone)]
pub struct OverlaySpec {
    pub source: ImageSource,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl CollageOptions {
    /// 以来源列表构造，其余字段留空。
    pub fn new(sources: Vec<ImageSource>) -> Self {
        Self {
            sources: Some(sources),
            ..Self::default()
        }
    }

    /// 校验必填字段并补齐默认值。
    ///
    /// 必填顺序：`sources`、`width`、`height`、`imageWidth`、`imageHeight`。
    pub fn validate(self) -> Result<CollageLayout, CollageError> {
        let sources = self.sources.ok_or(CollageError::MissingOption("sources"))?;
        let columns = required(self.width, "width")?;
        let rows = required(self.height, "height")?;
        let tile_width = required(self.image_width, "imageWidth")?;
        let tile_height = required(self.image_height, "imageHeight")?;

        let grid = GridLayout {
            columns,
            rows,
            tile_width,
            tile_height,
            spacing: self.spacing.unwrap_or(0),
            outer: self.outer_spacing.unwrap_or_default(),
        };

        let background = background_or_default(self.background_color.as_deref())?;

        // 显式尺寸优先，仅缺省的一边按网格推导
        let canvas_width = match present(self.canvas_width) {
            Some(width) => width,
            None => grid.derived_width()?,
        };
        let canvas_height = match present(self.canvas_height) {
            Some(height) => height,
            None => grid.derived_height()?,
        };

        let overlay = self.overlay.map(|source| OverlaySpec {
            source,
            width: present(self.overlay_width),
            height: present(self.overlay_height),
        });

        Ok(CollageLayout {
            sources,
            grid,
            canvas_width,
            canvas_height,
            background,
            overlay,
        })
    }

    pub fn from_json(value: Value) -> Result<Self, CollageError> {
        let raw: RawCollageOptions = serde_json::from_value(value)
            .map_err(|e| CollageError::InvalidOption(format!("拼图参数格式错误：{}", e)))?;

        Ok(Self {
            sources: raw.sources.as_deref().map(sources_from_json).transpose()?,
            width: raw.width,
            height: raw.height,
            image_width: raw.image_width,
            image_height: raw.image_height,
            spacing: raw.spacing,
            background_color: raw.background_color,
            overlay: optional_source_from_json(raw.overlay.as_ref())?,
            overlay_width: raw.overlay_width,
            overlay_height: raw.overlay_height,
            canvas_width: raw.canvas_width,
            canvas_height: raw.canvas_height,
            outer_spacing: raw.outer_spacing,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCollageOptions {
    sources: Option<Vec<Value>>,
    width: Option<u32>,
    height: Option<u32>,
    image_width: Option<u32>,
    image_height: Option<u32>,
    spacing: Option<u32>,
    background_color: Option<String>,
    overlay: Option<Value>,
    overlay_width: Option<u32>,
    overlay_height: Option<u32>,
    canvas_width: Option<u32>,
    canvas_height: Option<u32>,
    #[serde(alias = "outerspacing")]
    outer_spacing: Option<OuterSpacing>,
}

/// `generate_image_from_text` 的参数。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    pub canvas_width: Option<u32>,
    pub canvas_height: Option<u32>,
    pub text_strings: Option<Vec<String>>,
    pub background_color: Option<String>,
}

/// 校验后的文本卡片参数。
#[derive(Debug, Clone)]
pub struct TextLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub text_strings: Vec<String>,
    pub background: Rgba<u8>,
}

impl TextOptions {
    /// 必填顺序：`canvasWidth`、`canvasHeight`、`textStrings`。
    pub fn validate(self) -> Result<TextLayout, CollageError> {
        let canvas_width = required(self.canvas_width, "canvasWidth")?;
        let canvas_height = required(self.canvas_height, "canvasHeight")?;
        let text_strings = self
            .text_strings
            .ok_or(CollageError::MissingOption("textStrings"))?;
        let background = background_or_default(self.background_color.as_deref())?;

        Ok(TextLayout {
            canvas_width,
            canvas_height,
            text_strings,
            background,
        })
    }

    pub fn from_json(value: Value) -> Result<Self, CollageError> {
        serde_json::from_value(value)
            .map_err(|e| CollageError::InvalidOption(format!("文本参数格式错误：{}", e)))
    }
}

/// `add_overlay` 的参数。
#[derive(Debug, Clone, Default)]
pub struct OverlayOptions {
    pub canvas_width: Option<u32>,
    pub canvas_height: Option<u32>,
    pub sources: Option<Vec<ImageSource>>,
    pub overlay: Option<ImageSource>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub overlay_width: Option<u32>,
    pub overlay_height: Option<u32>,
}

/// 校验后的叠加参数。
#[derive(Debug, Clone)]
pub struct OverlayLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub sources: Vec<ImageSource>,
    pub overlay: ImageSource,
    pub image_width: u32,
    pub image_height: u32,
    pub overlay_width: u32,
    pub overlay_height: u32,
}

impl OverlayOptions {
    /// 必填顺序：`canvasWidth`、`canvasHeight`、`sources`、`overlay`、
    /// `imageWidth`、`imageHeight`、`overlayWidth`、`overlayHeight`。
    pub fn validate(self) -> Result<OverlayLayout, CollageError> {
        Ok(OverlayLayout {
            canvas_width: required(self.canvas_width, "canvasWidth")?,
            canvas_height: required(self.canvas_height, "canvasHeight")?,
            sources: self.sources.ok_or(CollageError::MissingOption("sources"))?,
            overlay: self.overlay.ok_or(CollageError::MissingOption("overlay"))?,
            image_width: required(self.image_width, "imageWidth")?,
            image_height: required(self.image_height, "imageHeight")?,
            overlay_width: required(self.overlay_width, "overlayWidth")?,
            overlay_height: required(self.overlay_height, "overlayHeight")?,
        })
    }

    pub fn from_json(value: Value) -> Result<Self, CollageError> {
        let raw: RawOverlayOptions = serde_json::from_value(value)
            .map_err(|e| CollageError::InvalidOption(format!("叠加参数格式错误：{}", e)))?;

        Ok(Self {
            canvas_width: raw.canvas_width,
            canvas_height: raw.canvas_height,
            sources: raw.sources.as_deref().map(sources_from_json).transpose()?,
            overlay: optional_source_from_json(raw.overlay.as_ref())?,
            image_width: raw.image_width,
            image_height: raw.image_height,
            overlay_width: raw.overlay_width,
            overlay_height: raw.overlay_height,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOverlayOptions {
    canvas_width: Option<u32>,
    canvas_height: Option<u32>,
    sources: Option<Vec<Value>>,
    overlay: Option<Value>,
    image_width: Option<u32>,
    image_height: Option<u32>,
    overlay_width: Option<u32>,
    overlay_height: Option<u32>,
}

fn present(value: Option<u32>) -> Option<u32> {
    value.filter(|v| *v != 0)
}

fn required(value: Option<u32>, field: &'static str) -> Result<u32, CollageError> {
    present(value).ok_or(CollageError::MissingOption(field))
}

fn background_or_default(color: Option<&str>) -> Result<Rgba<u8>, CollageError> {
    match color.map(str::trim).filter(|c| !c.is_empty()) {
        Some(color) => parse_color(color),
        None => parse_color(DEFAULT_BACKGROUND),
    }
}

fn sources_from_json(items: &[Value]) -> Result<Vec<ImageSource>, CollageError> {
    items.iter().map(ImageSource::from_json).collect()
}

fn optional_source_from_json(value: Option<&Value>) -> Result<Option<ImageSource>, CollageError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(other) => ImageSource::from_json(other).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete() -> CollageOptions {
        CollageOptions {
            width: Some(2),
            height: Some(2),
            image_width: Some(100),
            image_height: Some(100),
            ..CollageOptions::new(vec![ImageSource::from(vec![1u8, 2, 3])])
        }
    }

    #[test]
    fn validate_applies_defaults() {
        let layout = complete().validate().unwrap();

        assert_eq!(layout.grid.spacing, 0);
        assert_eq!(layout.grid.outer, OuterSpacing::default());
        assert_eq!(layout.background, Rgba([0, 0, 0, 255]));
        assert_eq!((layout.canvas_width, layout.canvas_height), (200, 200));
        assert!(layout.overlay.is_none());
    }

    #[test]
    fn explicit_canvas_size_is_used_verbatim() {
        let options = CollageOptions {
            canvas_width: Some(640),
            canvas_height: Some(480),
            spacing: Some(10),
            ..complete()
        };

        let layout = options.validate().unwrap();
        assert_eq!((layout.canvas_width, layout.canvas_height), (640, 480));
    }

    #[test]
    fn explicit_canvas_skips_grid_derivation() {
        let huge = CollageOptions {
            width: Some(u32::MAX),
            height: Some(u32::MAX),
            image_width: Some(u32::MAX),
            image_height: Some(u32::MAX),
            ..complete()
        };

        let layout = CollageOptions {
            canvas_width: Some(64),
            canvas_height: Some(48),
            ..huge.clone()
        }
        .validate()
        .unwrap();
        assert_eq!((layout.canvas_width, layout.canvas_height), (64, 48));

        let only_width = CollageOptions {
            canvas_width: Some(64),
            ..huge
        };
        assert!(matches!(
            only_width.validate(),
            Err(CollageError::InvalidOption(_))
        ));
    }

    #[test]
    fn missing_fields_are_reported_in_declared_order() {
        let cases: Vec<(CollageOptions, &str)> = vec![
            (CollageOptions::default(), "sources"),
            (CollageOptions { width: None, height: None, ..complete() }, "width"),
            (CollageOptions { height: None, image_width: None, ..complete() }, "height"),
            (CollageOptions { image_width: None, ..complete() }, "imageWidth"),
            (CollageOptions { image_height: None, ..complete() }, "imageHeight"),
        ];

        for (options, field) in cases {
            let result = options.validate();
            assert!(
                matches!(result, Err(CollageError::MissingOption(f)) if f == field),
                "expected missing {field}"
            );
        }
    }

    #[test]
    fn zero_counts_as_missing_for_required_fields() {
        let options = CollageOptions {
            width: Some(0),
            ..complete()
        };

        assert!(matches!(
            options.validate(),
            Err(CollageError::MissingOption("width"))
        ));
    }

    #[test]
    fn bare_source_list_requires_grid_fields() {
        let request = CollageRequest::from(vec![ImageSource::from("a.png")]);

        assert!(matches!(
            request.into_options().validate(),
            Err(CollageError::MissingOption("width"))
        ));
    }

    #[test]
    fn invalid_background_is_rejected() {
        let options = CollageOptions {
            background_color: Some("not-a-color".to_string()),
            ..complete()
        };

        assert!(matches!(options.validate(), Err(CollageError::InvalidOption(_))));
    }

    #[test]
    fn collage_options_from_json_uses_camel_case() {
        let value = json!({
            "sources": ["a.png", "https://example.com/b.png"],
            "width": 2,
            "height": 1,
            "imageWidth": 50,
            "imageHeight": 40,
            "spacing": 4,
            "backgroundColor": "#fff",
            "overlay": "logo.png",
            "overlayWidth": 20,
            "outerspacing": {"left": 3, "top": 6}
        });

        let layout = CollageRequest::from_json(value)
            .unwrap()
            .into_options()
            .validate()
            .unwrap();

        assert_eq!(layout.sources.len(), 2);
        assert_eq!(layout.grid.outer, OuterSpacing { left: 3, top: 6 });
        assert_eq!((layout.canvas_width, layout.canvas_height), (104, 40));
        assert_eq!(layout.background, Rgba([255, 255, 255, 255]));

        let overlay = layout.overlay.unwrap();
        assert_eq!(overlay.width, Some(20));
        assert_eq!(overlay.height, None);
    }

    #[test]
    fn json_array_is_a_bare_source_list() {
        let request = CollageRequest::from_json(json!(["a.png", "b.png"])).unwrap();

        assert!(matches!(request, CollageRequest::Sources(ref s) if s.len() == 2));
    }

    #[test]
    fn json_unsupported_source_fails_before_validation() {
        let result = CollageRequest::from_json(json!({"sources": ["a.png", 7]}));

        assert!(matches!(
            result,
            Err(CollageError::UnsupportedSourceType(ref t)) if t == "number"
        ));
    }

    #[test]
    fn json_type_mismatch_is_invalid_option() {
        let result = CollageRequest::from_json(json!({"width": "two"}));

        assert!(matches!(result, Err(CollageError::InvalidOption(_))));
    }

    #[test]
    fn text_options_require_canvas_then_strings() {
        let missing_height = TextOptions {
            canvas_width: Some(500),
            ..TextOptions::default()
        };
        assert!(matches!(
            missing_height.validate(),
            Err(CollageError::MissingOption("canvasHeight"))
        ));

        let missing_strings = TextOptions {
            canvas_width: Some(500),
            canvas_height: Some(500),
            ..TextOptions::default()
        };
        assert!(matches!(
            missing_strings.validate(),
            Err(CollageError::MissingOption("textStrings"))
        ));

        let parsed = TextOptions::from_json(json!({
            "canvasWidth": 500,
            "canvasHeight": 500,
            "textStrings": ["a", "b"]
        }))
        .unwrap()
        .validate()
        .unwrap();
        assert_eq!(parsed.text_strings, vec!["a", "b"]);
        assert_eq!(parsed.background, Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn overlay_options_require_overlay_before_tile_size() {
        let options = OverlayOptions {
            canvas_width: Some(100),
            canvas_height: Some(100),
            sources: Some(vec![]),
            image_width: Some(10),
            ..OverlayOptions::default()
        };

        assert!(matches!(
            options.validate(),
            Err(CollageError::MissingOption("overlay"))
        ));
    }

    #[test]
    fn overlay_options_from_json_parses_sources() {
        let options = OverlayOptions::from_json(json!({
            "canvasWidth": 100,
            "canvasHeight": 80,
            "sources": ["photo.jpg"],
            "overlay": "https://example.com/mark.png",
            "imageWidth": 100,
            "imageHeight": 80,
            "overlayWidth": 30,
            "overlayHeight": 10
        }))
        .unwrap()
        .validate()
        .unwrap();

        assert_eq!(options.sources.len(), 1);
        assert!(matches!(options.overlay, ImageSource::Location(ref u) if u.starts_with("https")));
        assert_eq!((options.overlay_width, options.overlay_height), (30, 10));
    }
}
