//! # 拼图模块（collage）
//!
//! ## 设计思路
//!
//! 该模块将“参数校验 → 来源加载 → 解码缩放 → 画布绘制 → 命令暴露”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `commands`：默认 `Composer` 与薄封装的入口函数
//! - `handler`：编排三条绘制流水线
//! - `loader`：字节/URL/文件/画布四类来源统一归一为字节
//! - `pipeline`：签名校验、像素限制、解码与缩放
//! - `canvas`/`text`：RGBA 画布与文字光栅化
//! - `options`/`layout`/`color`：入参模型、网格几何与颜色解析
//! - `config/error/source`：配置、错误、来源模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 调用方
//!    ↓
//! commands.rs（默认 Composer + JSON 入参适配）
//!    ↓
//! handler.rs（校验 → 建画布 → 并发加载 → 串行绘制 + 阶段耗时日志）
//!    ├─ options.rs / layout.rs（必填校验、默认值、格子坐标）
//!    ├─ loader.rs（来源加载 + 体积校验）
//!    ├─ pipeline.rs（解码 + 像素限制 + 缩放）
//!    └─ canvas.rs / text.rs（绘制 + 编码 PNG）
//!    ↓
//! 返回 Canvas 或 CollageError
//! ```

pub mod commands;
mod canvas;
mod color;
mod config;
mod error;
mod handler;
mod layout;
mod loader;
mod options;
mod pipeline;
mod source;
mod text;

pub use canvas::Canvas;
pub use color::parse_color;
pub use commands::{
    add_overlay,
    add_overlay_from_json,
    configure_default_composer,
    create_collage,
    create_collage_from_json,
    generate_image_from_text,
    generate_image_from_text_json,
    CollageCommandError,
};
pub use config::{ComposerConfig, ScalingProfile, TextStyle};
pub use error::CollageError;
pub use handler::Composer;
pub use layout::{GridLayout, OuterSpacing};
pub use options::{
    CollageLayout, CollageOptions, CollageRequest, OverlayLayout, OverlayOptions, OverlaySpec,
    TextLayout, TextOptions,
};
pub use source::ImageSource;
pub use text::measure_text;
