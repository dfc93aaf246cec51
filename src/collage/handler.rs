//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `Composer` 只负责流程编排，三条入口共用同一套“校验 → 建画布 → 加载 → 绘制”链路：
//! 1. 校验参数并补齐默认值
//! 2. 创建画布并填充背景
//! 3. 并发加载全部来源（scatter/gather，保持输入顺序）
//! 4. 按索引顺序逐个解码、缩放、绘制
//!
//! ## 实现思路
//!
//! - 加载阶段并发，绘制阶段严格串行，画布只被当前调用持有。
//! - 任一来源加载或解码失败即整体失败，不返回半成品。
//! - 水印在每次绘制后都叠加到画布原点，与既有输出保持一致；水印只解码、缩放一次。
//! - 记录 `load/draw/total` 阶段耗时，便于性能诊断。

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future;
use image::RgbaImage;

use super::{
    Canvas, CollageError, CollageRequest, ComposerConfig, OverlayOptions, TextOptions,
};

/// 拼图处理器。
///
/// 封装配置与复用型 HTTP 客户端。
pub struct Composer {
    pub(super) config: Arc<ComposerConfig>,
    pub(super) http_client: reqwest::Client,
}

impl Composer {
    /// 根据配置创建处理器。
    ///
    /// # 示例
    /// ```rust
    /// use photo_collage::collage::{Composer, ComposerConfig};
    ///
    /// let composer = Composer::new(ComposerConfig::default())?;
    /// assert!(composer.config().download_timeout.is_none());
    /// # Ok::<(), photo_collage::collage::CollageError>(())
    /// ```
    pub fn new(config: ComposerConfig) -> Result<Self, CollageError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.download_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.connect_timeout {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        let http_client = builder
            .build()
            .map_err(|e| CollageError::InvalidOption(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// 按网格拼接图片。
    ///
    /// 入参可以是来源列表，也可以是完整的 `CollageOptions`。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use photo_collage::collage::{CollageOptions, Composer, ComposerConfig, ImageSource};
    ///
    /// # async fn demo() -> Result<(), photo_collage::collage::CollageError> {
    /// let composer = Composer::new(ComposerConfig::default())?;
    /// let options = CollageOptions {
    ///     width: Some(2),
    ///     height: Some(1),
    ///     image_width: Some(300),
    ///     image_height: Some(200),
    ///     ..CollageOptions::new(vec![
    ///         ImageSource::from("photos/a.jpg"),
    ///         ImageSource::from("https://example.com/b.jpg"),
    ///     ])
    /// };
    /// let canvas = composer.create_collage(options).await?;
    /// let _png = canvas.to_png_bytes()?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_collage(
        &self,
        request: impl Into<CollageRequest>,
    ) -> Result<Canvas, CollageError> {
        let total_start = Instant::now();
        let layout = request.into().into_options().validate()?;
        self.validate_canvas_limits(layout.canvas_width, layout.canvas_height)?;
        self.validate_canvas_limits(layout.grid.tile_width, layout.grid.tile_height)?;
        if let Some(spec) = &layout.overlay {
            self.validate_canvas_limits(spec.width.unwrap_or(1), spec.height.unwrap_or(1))?;
        }

        let mut canvas = Canvas::new(layout.canvas_width, layout.canvas_height);
        canvas.fill(layout.background);

        let load_start = Instant::now();
        let overlay_source = layout.overlay.as_ref().map(|spec| &spec.source);
        let (photos, overlay_bytes) = tokio::try_join!(
            self.resolve_all(&layout.sources),
            self.resolve_optional(overlay_source),
        )?;
        let load_elapsed = load_start.elapsed();

        let draw_start = Instant::now();
        let overlay = match (&layout.overlay, overlay_bytes) {
            (Some(spec), Some(bytes)) => {
                Some(self.prepare_overlay(&bytes, spec.width, spec.height)?)
            }
            _ => None,
        };

        let grid = layout.grid;
        let skipped = photos.len().saturating_sub(grid.capacity());
        if skipped > 0 {
            log::debug!(
                "⏭️ {} 个来源超出网格容量 {}，已跳过",
                skipped,
                grid.capacity()
            );
        }

        for (index, bytes) in photos.iter().enumerate() {
            let Some((x, y)) = grid.tile_origin(index) else {
                continue;
            };

            let photo = self.decode_image(bytes, layout.sources[index].hint())?;
            let tile = self.scale_to(&photo, grid.tile_width, grid.tile_height);
            canvas.draw_image(&tile, x, y);

            if let Some(overlay) = &overlay {
                canvas.draw_image(overlay, 0, 0);
            }
        }
        let draw_elapsed = draw_start.elapsed();

        log::info!(
            "✅ 拼图完成 - 画布: {}x{} 来源: {} load={}ms draw={}ms total={}ms",
            canvas.width(),
            canvas.height(),
            photos.len(),
            load_elapsed.as_millis(),
            draw_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(canvas)
    }

    /// 在空白画布上逐行绘制文本。
    ///
    /// 第 `i` 行绘制在 `(origin_x, origin_y + i * line_height)`，字号与颜色取自
    /// `ComposerConfig::text_style`，与背景色无关。
    pub async fn generate_image_from_text(
        &self,
        options: TextOptions,
    ) -> Result<Canvas, CollageError> {
        let total_start = Instant::now();
        let layout = options.validate()?;
        self.validate_canvas_limits(layout.canvas_width, layout.canvas_height)?;

        let mut canvas = Canvas::new(layout.canvas_width, layout.canvas_height);
        canvas.fill(layout.background);

        let style = self.config.text_style;
        let lines =
            future::join_all(layout.text_strings.iter().map(|line| future::ready(line.as_str())))
                .await;

        for (index, line) in lines.into_iter().enumerate() {
            let baseline = style
                .origin_y
                .saturating_add(style.line_height.saturating_mul(index as i64));
            canvas.fill_text(line, style.origin_x, baseline, &style)?;
        }

        log::info!(
            "✅ 文本卡片完成 - 画布: {}x{} 行数: {} total={}ms",
            canvas.width(),
            canvas.height(),
            layout.text_strings.len(),
            total_start.elapsed().as_millis()
        );

        Ok(canvas)
    }

    /// 把每个来源都绘制到画布原点，并在每次绘制后叠加水印。
    pub async fn add_overlay(&self, options: OverlayOptions) -> Result<Canvas, CollageError> {
        let total_start = Instant::now();
        let layout = options.validate()?;
        self.validate_canvas_limits(layout.canvas_width, layout.canvas_height)?;
        self.validate_canvas_limits(layout.image_width, layout.image_height)?;
        self.validate_canvas_limits(layout.overlay_width, layout.overlay_height)?;

        let mut canvas = Canvas::new(layout.canvas_width, layout.canvas_height);

        let load_start = Instant::now();
        let (photos, overlay_bytes) = tokio::try_join!(
            self.resolve_all(&layout.sources),
            self.resolve_source(&layout.overlay),
        )?;
        let load_elapsed = load_start.elapsed();

        let draw_start = Instant::now();
        let overlay = self.prepare_overlay(
            &overlay_bytes,
            Some(layout.overlay_width),
            Some(layout.overlay_height),
        )?;

        for (index, bytes) in photos.iter().enumerate() {
            let photo = self.decode_image(bytes, layout.sources[index].hint())?;
            let scaled = self.scale_to(&photo, layout.image_width, layout.image_height);
            canvas.draw_image(&scaled, 0, 0);
            canvas.draw_image(&overlay, 0, 0);
        }
        let draw_elapsed = draw_start.elapsed();

        log::info!(
            "✅ 水印叠加完成 - 画布: {}x{} 来源: {} load={}ms draw={}ms total={}ms",
            canvas.width(),
            canvas.height(),
            photos.len(),
            load_elapsed.as_millis(),
            draw_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(canvas)
    }

    /// 解码水印并缩放到绘制尺寸，缺省尺寸取原图尺寸。
    fn prepare_overlay(
        &self,
        bytes: &[u8],
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<RgbaImage, CollageError> {
        let overlay = self.decode_image(bytes, "overlay")?;
        let width = width.unwrap_or(overlay.width());
        let height = height.unwrap_or(overlay.height());

        Ok(self.scale_to(&overlay, width, height))
    }

    /// 画布以及每个缩放目标（格子、水印）都受 `max_canvas_pixels` 约束。
    fn validate_canvas_limits(&self, width: u32, height: u32) -> Result<(), CollageError> {
        let pixels = width as u64 * height as u64;
        if pixels > self.config.max_canvas_pixels {
            return Err(CollageError::ResourceLimit(format!(
                "绘制尺寸过大：{}x{}（限制：{} 像素）",
                width, height, self.config.max_canvas_pixels
            )));
        }

        Ok(())
    }
}
