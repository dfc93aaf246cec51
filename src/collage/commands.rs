//! # 命令层
//!
//! ## 设计思路
//!
//! 命令层仅做入参适配与结果返回，不承载业务逻辑。
//! 所有实际处理交由共享的默认 `Composer`，保持函数薄、稳定、易测试。
//!
//! 默认 `Composer` 在首次调用时按 `ComposerConfig::default()` 构建；
//! 需要自定义配置时，在任何命令调用之前执行一次 `configure_default_composer`。

use once_cell::sync::OnceCell;
use serde_json::Value;

use super::{
    Canvas, CollageError, CollageRequest, Composer, ComposerConfig, OverlayOptions, TextOptions,
};

static DEFAULT_COMPOSER: OnceCell<Composer> = OnceCell::new();

/// 序列化友好的错误结构，供 JSON 调用方使用。
#[derive(Debug, Clone, serde::Serialize)]
pub struct CollageCommandError {
    pub code: &'static str,
    pub stage: &'static str,
    pub message: String,
}

impl From<CollageError> for CollageCommandError {
    fn from(error: CollageError) -> Self {
        Self {
            code: error.code(),
            stage: error.stage(),
            message: error.to_string(),
        }
    }
}

fn default_composer() -> Result<&'static Composer, CollageError> {
    DEFAULT_COMPOSER.get_or_try_init(|| Composer::new(ComposerConfig::default()))
}

/// 以指定配置初始化默认 `Composer`，只能成功一次。
pub fn configure_default_composer(config: ComposerConfig) -> Result<(), CollageError> {
    let composer = Composer::new(config)?;
    DEFAULT_COMPOSER.set(composer).map_err(|_| {
        CollageError::InvalidOption("默认 Composer 已初始化，无法重复配置".to_string())
    })?;

    log::info!("⚙️ 默认 Composer 已按自定义配置初始化");
    Ok(())
}

/// 按网格拼接图片。
pub async fn create_collage(request: impl Into<CollageRequest>) -> Result<Canvas, CollageError> {
    default_composer()?.create_collage(request).await
}

/// JSON 入参版本：可以是来源数组，也可以是 camelCase 选项对象。
pub async fn create_collage_from_json(value: Value) -> Result<Canvas, CollageCommandError> {
    let request = CollageRequest::from_json(value)?;
    Ok(create_collage(request).await?)
}

/// 在空白画布上逐行绘制文本。
pub async fn generate_image_from_text(options: TextOptions) -> Result<Canvas, CollageError> {
    default_composer()?.generate_image_from_text(options).await
}

pub async fn generate_image_from_text_json(value: Value) -> Result<Canvas, CollageCommandError> {
    let options = TextOptions::from_json(value)?;
    Ok(generate_image_from_text(options).await?)
}

/// 把所有来源叠到画布原点，每次绘制后叠加水印。
pub async fn add_overlay(options: OverlayOptions) -> Result<Canvas, CollageError> {
    default_composer()?.add_overlay(options).await
}

pub async fn add_overlay_from_json(value: Value) -> Result<Canvas, CollageCommandError> {
    let options = OverlayOptions::from_json(value)?;
    Ok(add_overlay(options).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_carries_code_and_stage() {
        let error = CollageCommandError::from(CollageError::MissingOption("width"));

        assert_eq!(error.code, "missing_option");
        assert_eq!(error.stage, "options");
        assert!(error.message.contains("width"));
    }

    #[test]
    fn command_error_serializes_as_flat_object() {
        let error = CollageCommandError::from(CollageError::Render("boom".to_string()));
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["code"], "render_failed");
        assert_eq!(json["stage"], "render");
    }

    #[tokio::test]
    async fn json_entry_reports_missing_option() {
        let error = create_collage_from_json(serde_json::json!({ "sources": [] }))
            .await
            .unwrap_err();

        assert_eq!(error.code, "missing_option");
    }

    #[test]
    fn default_composer_cannot_be_reconfigured_after_use() {
        default_composer().unwrap();

        let result = configure_default_composer(ComposerConfig::default());

        assert!(matches!(result, Err(CollageError::InvalidOption(_))));
    }
}
