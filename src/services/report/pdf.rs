use std::io::Cursor;

use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Pt,
};

use super::layout::{Element, FontWeight, ImageBlock, TextLine, PAGE_HEIGHT, PAGE_WIDTH};
use super::Report;
use crate::error::ReportError;

/// Rasters are placed at 72 dpi so one pixel is one point before scaling.
const IMAGE_DPI: f32 = 72.0;
const LAYER_NAME: &str = "Layer 1";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference, custom: Option<&[u8]>) -> Result<Self, ReportError> {
        match custom {
            Some(bytes) => {
                let font = doc
                    .add_external_font(Cursor::new(bytes.to_vec()))
                    .map_err(|e| ReportError::Font(e.to_string()))?;
                Ok(Fonts {
                    regular: font.clone(),
                    bold: font,
                })
            }
            None => Ok(Fonts {
                regular: doc
                    .add_builtin_font(BuiltinFont::Helvetica)
                    .map_err(|e| ReportError::Font(e.to_string()))?,
                bold: doc
                    .add_builtin_font(BuiltinFont::HelveticaBold)
                    .map_err(|e| ReportError::Font(e.to_string()))?,
            }),
        }
    }

    fn for_weight(&self, weight: FontWeight) -> &IndirectFontRef {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn draw_text(layer: &PdfLayerReference, fonts: &Fonts, line: &TextLine) {
    layer.use_text(
        line.text.as_str(),
        line.size,
        mm(line.x),
        mm(line.y),
        fonts.for_weight(line.weight),
    );
}

fn draw_image(layer: &PdfLayerReference, block: &ImageBlock) -> Result<(), ReportError> {
    let raster = &block.raster;
    let buffer = RgbImage::from_raw(raster.width, raster.height, raster.pixels.clone())
        .ok_or_else(|| ReportError::Pdf("raster size does not match its pixel buffer".into()))?;
    let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(buffer));

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(mm(block.x)),
            translate_y: Some(mm(block.y)),
            scale_x: Some(block.width / raster.width.max(1) as f32),
            scale_y: Some(block.height / raster.height.max(1) as f32),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
    Ok(())
}

impl Report {
    /// Serializes the laid-out pages as a PDF. `custom_font` is a TrueType
    /// font used for every line in place of the built-in Helvetica pair.
    pub fn to_pdf(&self, custom_font: Option<&[u8]>) -> Result<Vec<u8>, ReportError> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(self.title.as_str(), mm(PAGE_WIDTH), mm(PAGE_HEIGHT), LAYER_NAME);
        let fonts = Fonts::load(&doc, custom_font)?;

        for (idx, page) in self.pages.iter().enumerate() {
            let (page_idx, layer_idx) = if idx == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), LAYER_NAME)
            };
            let layer = doc.get_page(page_idx).get_layer(layer_idx);

            for element in &page.elements {
                match element {
                    Element::Text(line) => draw_text(&layer, &fonts, line),
                    Element::Image(block) => draw_image(&layer, block)?,
                }
            }
        }

        doc.save_to_bytes().map_err(|e| ReportError::Pdf(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::layout::{ChartKind, PageCursor};
    use super::*;
    use crate::services::charts::Raster;

    fn report(pages: usize) -> Report {
        let mut cursor = PageCursor::new();
        cursor.title("Report");
        cursor.image(
            ChartKind::Histogram,
            Raster {
                width: 2,
                height: 2,
                pixels: vec![0xff; 12],
            },
        );
        let mut built = cursor.finish();
        built.resize(pages, Default::default());
        Report {
            title: "Report".into(),
            file_name: "survey_report_en.pdf".into(),
            pages: built,
        }
    }

    #[test]
    fn writes_a_pdf_document() {
        let bytes = report(3).to_pdf(None).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn invalid_font_bytes_are_a_font_error() {
        let result = report(1).to_pdf(Some(b"not a font"));
        assert!(matches!(result, Err(ReportError::Font(_))));
    }

    #[test]
    fn mismatched_raster_is_rejected() {
        let mut broken = report(1);
        if let Some(Element::Image(block)) = broken.pages[0].elements.get_mut(1) {
            block.raster.pixels.truncate(3);
        }
        assert!(matches!(broken.to_pdf(None), Err(ReportError::Pdf(_))));
    }
}
