//! Text extraction with pdf.js.
//!
//! Expects `pdfjsLib` to be a global, as it is when pdf.js is loaded from a `<script>` tag.

use js_sys::{Array, Object, Promise, Reflect};
use readaloud::{Page, PageStyle, TextItem};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::string_from_js_value;

#[wasm_bindgen]
extern "C" {
    /// `PDFDocumentLoadingTask`
    type LoadingTask;

    #[wasm_bindgen(catch, js_namespace = pdfjsLib, js_name = getDocument)]
    fn get_document(src: &str) -> Result<LoadingTask, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn promise(this: &LoadingTask) -> Promise;

    /// `PDFDocumentProxy`
    type PdfDocument;

    #[wasm_bindgen(method, getter, js_name = numPages)]
    fn num_pages(this: &PdfDocument) -> u32;

    #[wasm_bindgen(catch, method, js_name = getPage)]
    fn get_page(this: &PdfDocument, number: u32) -> Result<Promise, JsValue>;

    /// `PDFPageProxy`
    type PdfPage;

    #[wasm_bindgen(catch, method, js_name = getTextContent)]
    fn get_text_content(this: &PdfPage) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, method, js_name = getViewport)]
    fn get_viewport(this: &PdfPage, params: &Object) -> Result<JsValue, JsValue>;
}

/// Extract the text of every page of the PDF at `url`.
///
/// Any failure is logged and gives no pages at all.
pub(crate) async fn extract_pages(url: &str) -> Vec<Page> {
    match try_extract_pages(url).await {
        Ok(pages) => pages,
        Err(err) => {
            log::error!(
                "Error extracting text from {url:?}: {}",
                string_from_js_value(&err)
            );
            Vec::new()
        }
    }
}

async fn try_extract_pages(url: &str) -> Result<Vec<Page>, JsValue> {
    let document: PdfDocument = JsFuture::from(get_document(url)?.promise())
        .await?
        .unchecked_into();

    let num_pages = document.num_pages();
    log::debug!("{url:?} has {num_pages} pages");

    let mut pages = Vec::with_capacity(num_pages as usize);
    for number in 1..=num_pages {
        let page: PdfPage = JsFuture::from(document.get_page(number)?).await?.unchecked_into();
        let content = JsFuture::from(page.get_text_content()?).await?;

        let params = Object::new();
        Reflect::set(&params, &"scale".into(), &1.0.into())?;
        let viewport = page.get_viewport(&params)?;
        let height = number_property(&viewport, "height").unwrap_or_default();

        pages.push(Page {
            items: text_items(&content)?,
            style: PageStyle::for_page_height(height as f32),
        });
    }
    Ok(pages)
}

fn text_items(content: &JsValue) -> Result<Vec<TextItem>, JsValue> {
    let items: Array = Reflect::get(content, &"items".into())?.dyn_into()?;
    let mut text_items = Vec::with_capacity(items.length() as usize);
    for item in items.iter() {
        // Marked-content markers have no `str`.
        let Some(text) = Reflect::get(&item, &"str".into())?.as_string() else {
            continue;
        };
        let transform: Vec<f64> = match Reflect::get(&item, &"transform".into())?.dyn_into::<Array>() {
            Ok(values) => values.iter().filter_map(|value| value.as_f64()).collect(),
            Err(_) => Vec::new(),
        };
        let transform = text_matrix(&transform);
        let font_name = Reflect::get(&item, &"fontName".into())?
            .as_string()
            .unwrap_or_default();
        let font_size = font_size(number_property(&item, "fontSize"), &transform);

        text_items.push(TextItem {
            text,
            transform,
            font_name,
            font_size,
        });
    }
    Ok(text_items)
}

fn number_property(object: &JsValue, name: &str) -> Option<f64> {
    Reflect::get(object, &name.into()).ok()?.as_f64()
}

/// The six entries of a text matrix. Missing entries are those of the identity matrix.
fn text_matrix(values: &[f64]) -> [f32; 6] {
    let mut matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    for (entry, value) in matrix.iter_mut().zip(values) {
        *entry = *value as f32;
    }
    matrix
}

/// The reported font size, or the one implied by the text matrix.
fn font_size(reported: Option<f64>, transform: &[f32; 6]) -> f32 {
    match reported {
        Some(size) if size.is_finite() && size > 0.0 => size as f32,
        _ => TextItem::font_size_from_transform(transform),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_matrix_pads_with_identity() {
        assert_eq!(
            text_matrix(&[12.0, 0.0, 0.0, 12.0, 72.0, 700.0]),
            [12.0, 0.0, 0.0, 12.0, 72.0, 700.0]
        );
        assert_eq!(text_matrix(&[2.0]), [2.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(text_matrix(&[]), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn font_size_falls_back_to_the_matrix() {
        let matrix = [0.0, 18.0, -18.0, 0.0, 0.0, 0.0];
        assert_eq!(font_size(Some(11.0), &matrix), 11.0);
        assert_eq!(font_size(None, &matrix), 18.0);
        assert_eq!(font_size(Some(0.0), &matrix), 18.0);
        assert_eq!(font_size(Some(f64::NAN), &matrix), 18.0);
    }
}
