//! # 照片拼图：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  调用方 (Rust / JSON)                    │
//! │                                                          │
//! │  create_collage ── generate_image_from_text ── add_overlay│
//! └───────┼──────────────────────────────────────────────────┘
//!         ↕ Result<Canvas, CollageError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕              collage                             │
//! │                                                          │
//! │  ┌─ options/layout   必填校验·默认值·网格坐标            │
//! │  ├─ loader           字节/URL/文件/画布 → 字节           │
//! │  ├─ pipeline         签名校验·像素限制·解码·缩放         │
//! │  ├─ canvas/text      RGBA 画布·文字光栅化·PNG 编码       │
//! │  └─ error            CollageError (统一错误类型)         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`collage`] | 网格拼图、文字卡片、水印叠加及其来源加载 |

pub mod collage;
