//! # 网格布局计算
//!
//! 纯算术：画布尺寸推导与每个格子的左上角坐标。
//!
//! 坐标公式沿用既有输出：
//!
//! ```text
//! x = col * tile_width + (col + 1) * spacing + outer.left
//! y = row * tile_height + outer.top
//! ```
//!
//! 即每一行整体右移一个 `spacing`，纵向不插入间距。改动会让已有拼图的像素位置全部变化。

use super::CollageError;

/// 网格外边距（第一行 / 第一列之前）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct OuterSpacing {
    pub left: i64,
    pub top: i64,
}

/// 已校验的网格几何参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// 每行格子数（`width`）。
    pub columns: u32,
    /// 行数（`height`）。
    pub rows: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub outer: OuterSpacing,
}

impl GridLayout {
    /// 网格可容纳的来源数量，超出部分被跳过。
    pub fn capacity(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// 未显式指定画布尺寸时的推导结果：
    /// `columns * tile_width + (columns - 1) * spacing`，高度同理。
    pub fn derived_canvas_size(&self) -> Result<(u32, u32), CollageError> {
        Ok((self.derived_width()?, self.derived_height()?))
    }

    pub fn derived_width(&self) -> Result<u32, CollageError> {
        Self::span(self.columns, self.tile_width, self.spacing)
            .ok_or_else(|| CollageError::InvalidOption("画布宽度计算溢出".to_string()))
    }

    pub fn derived_height(&self) -> Result<u32, CollageError> {
        Self::span(self.rows, self.tile_height, self.spacing)
            .ok_or_else(|| CollageError::InvalidOption("画布高度计算溢出".to_string()))
    }

    fn span(count: u32, tile: u32, spacing: u32) -> Option<u32> {
        let gaps = count.checked_sub(1)?.checked_mul(spacing)?;
        count.checked_mul(tile)?.checked_add(gaps)
    }

    /// 第 `index` 个来源（行优先）的绘制起点；超出容量返回 `None`。
    ///
    /// 外边距来自调用方，可为任意 `i64`；坐标按饱和运算计算，极端值只会把格子推到画布之外。
    pub fn tile_origin(&self, index: usize) -> Option<(i64, i64)> {
        if index >= self.capacity() {
            return None;
        }

        let columns = self.columns as usize;
        let col = (index % columns) as i64;
        let row = (index / columns) as i64;
        let spacing = self.spacing as i64;

        let x = col
            .saturating_mul(self.tile_width as i64)
            .saturating_add((col + 1).saturating_mul(spacing))
            .saturating_add(self.outer.left);
        let y = row
            .saturating_mul(self.tile_height as i64)
            .saturating_add(self.outer.top);

        Some((x, y))
    }
}
