//! WASM bindings for in-browser formatting removal.
//!
//! Exposes flattening and character-range removal to JavaScript via
//! wasm-bindgen.

use wasm_bindgen::prelude::*;

use crate::document::Document;
use crate::remove::RemoveFormatting;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "wasm")]
    console_error_panic_hook::set_once();
}

/// Flatten an HTML fragment.
#[wasm_bindgen]
pub fn flatten_html(html: &str) -> String {
    crate::flatten(html)
}

/// Remove formatting from the characters `start..end` of the document's
/// text and return the resulting body markup.
#[wasm_bindgen]
pub fn remove_formatting(html: &str, start: usize, end: usize) -> Result<String, JsValue> {
    let mut doc = Document::parse(html);
    doc.select_text(start, end)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    RemoveFormatting::new()
        .apply(&mut doc)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    Ok(doc.to_html())
}
