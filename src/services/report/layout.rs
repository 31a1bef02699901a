//! Page model and the vertical cursor that fills it.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner.

use crate::services::charts::Raster;

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 30.0;

/// A line starts a new page once the cursor is this close to the bottom margin.
pub const LINE_BREAK_THRESHOLD: f32 = 50.0;

pub const BODY_SIZE: f32 = 9.0;
pub const SECTION_SIZE: f32 = 11.0;
pub const COLUMN_SIZE: f32 = 10.0;
pub const TITLE_SIZE: f32 = 16.0;
pub const TITLE_ADVANCE: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub weight: FontWeight,
    pub text: String,
}

/// An image scaled into its slot; `x`/`y` is the bottom-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub raster: Raster,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextLine),
    Image(ImageBlock),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Histogram,
    Boxplot,
    Scatter,
}

impl ChartKind {
    /// Remaining space below which the chart moves to a new page.
    pub fn threshold(self) -> f32 {
        match self {
            ChartKind::Histogram | ChartKind::Scatter => 180.0,
            ChartKind::Boxplot => 160.0,
        }
    }

    pub fn height(self) -> f32 {
        match self {
            ChartKind::Histogram | ChartKind::Scatter => 140.0,
            ChartKind::Boxplot => 120.0,
        }
    }

    pub fn advance(self) -> f32 {
        self.height() + 10.0
    }
}

#[derive(Debug)]
pub struct PageCursor {
    pages: Vec<Page>,
    y: f32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCursor {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure_space(&mut self, threshold: f32) {
        if self.y < MARGIN + threshold {
            self.new_page();
        }
    }

    fn push_text(&mut self, text: String, weight: FontWeight, size: f32) {
        let y = self.y;
        self.current().elements.push(Element::Text(TextLine {
            x: MARGIN,
            y,
            size,
            weight,
            text,
        }));
    }

    pub fn title(&mut self, text: impl Into<String>) {
        self.push_text(text.into(), FontWeight::Bold, TITLE_SIZE);
        self.y -= TITLE_ADVANCE;
    }

    /// Emits a line, breaking the page first when it is nearly full.
    pub fn line(&mut self, text: impl Into<String>, weight: FontWeight, size: f32) {
        self.ensure_space(LINE_BREAK_THRESHOLD);
        self.line_unchecked(text, weight, size);
    }

    pub fn body(&mut self, text: impl Into<String>) {
        self.line(text, FontWeight::Regular, BODY_SIZE);
    }

    pub fn line_unchecked(&mut self, text: impl Into<String>, weight: FontWeight, size: f32) {
        self.push_text(text.into(), weight, size);
        self.y -= size + 3.0;
    }

    pub fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    /// Places a chart across the full content width, aspect ratio kept and
    /// centred within its slot.
    pub fn image(&mut self, kind: ChartKind, raster: Raster) {
        self.ensure_space(kind.threshold());

        let slot_width = PAGE_WIDTH - 2.0 * MARGIN;
        let slot_height = kind.height();
        let (w, h) = (raster.width.max(1) as f32, raster.height.max(1) as f32);
        let scale = (slot_width / w).min(slot_height / h);
        let (width, height) = (w * scale, h * scale);

        let y = self.y;
        self.current().elements.push(Element::Image(ImageBlock {
            x: MARGIN + (slot_width - width) / 2.0,
            y: y - slot_height + (slot_height - height) / 2.0,
            width,
            height,
            raster,
        }));
        self.y -= kind.advance();
    }

    pub fn finish(self) -> Vec<Page> {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(width: u32, height: u32) -> Raster {
        Raster {
            width,
            height,
            pixels: vec![0; (width * height * 3) as usize],
        }
    }

    #[test]
    fn lines_advance_by_size_plus_three() {
        let mut cursor = PageCursor::new();
        cursor.title("Title");
        assert_eq!(cursor.y(), PAGE_HEIGHT - MARGIN - TITLE_ADVANCE);
        let before = cursor.y();
        cursor.body("x");
        assert_eq!(cursor.y(), before - 12.0);
    }

    #[test]
    fn line_breaks_near_bottom() {
        let mut cursor = PageCursor::new();
        while cursor.y() >= MARGIN + LINE_BREAK_THRESHOLD {
            cursor.body("filler");
        }
        cursor.body("overflow");
        let pages = cursor.finish();
        assert_eq!(pages.len(), 2);
        match &pages[1].elements[0] {
            Element::Text(line) => {
                assert_eq!(line.text, "overflow");
                assert_eq!(line.y, PAGE_HEIGHT - MARGIN);
            }
            other => panic!("unexpected element {:?}", other),
        }
    }

    #[test]
    fn chart_thresholds_differ_by_kind() {
        let mut cursor = PageCursor::new();
        cursor.gap(PAGE_HEIGHT - 2.0 * MARGIN - 170.0);
        // 170 left: a boxplot still fits, a histogram does not
        cursor.image(ChartKind::Boxplot, raster(800, 300));
        assert_eq!(cursor.finish().len(), 1);

        let mut cursor = PageCursor::new();
        cursor.gap(PAGE_HEIGHT - 2.0 * MARGIN - 170.0);
        cursor.image(ChartKind::Histogram, raster(800, 300));
        assert_eq!(cursor.finish().len(), 2);
    }

    #[test]
    fn images_keep_aspect_ratio_inside_slot() {
        let mut cursor = PageCursor::new();
        cursor.image(ChartKind::Histogram, raster(800, 300));
        let pages = cursor.finish();
        let Element::Image(block) = &pages[0].elements[0] else {
            panic!("expected an image");
        };
        assert!(block.width <= PAGE_WIDTH - 2.0 * MARGIN + 1e-3);
        assert!(block.height <= 140.0 + 1e-3);
        assert!((block.width / block.height - 800.0 / 300.0).abs() < 1e-3);
    }
}
