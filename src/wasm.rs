//! WASM bindings for browser-based conversion.
//!
//! Includes cannot be followed in the browser; XInclude directives are kept
//! as `include::` lines pointing at the would-be output files.

use wasm_bindgen::prelude::*;

use crate::asciidoc::{Converter, UsedIds, prune_anchors, tidy_lines};
use crate::config::Config;
use crate::dom::parse_xml;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Convert a DocBook document to AsciiDoc with default settings.
#[wasm_bindgen]
pub fn docbook_to_asciidoc(xml: &str) -> Result<String, JsValue> {
    let config = Config::default();
    let dom = parse_xml(xml).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let used_ids = UsedIds::new();
    let lines = Converter::new(&dom, &config, used_ids.clone()).convert();
    let mut content = tidy_lines(prune_anchors(lines, &used_ids)).join("\n");
    content.push('\n');
    Ok(content)
}
