/// utubext - YouTube market opportunity finder, as a Chrome extension popup
/// Built with Rust + WASM + Yew

pub mod analysis;
pub mod config;
pub mod error;
pub mod filter;
pub mod gemini;
pub mod metadata;
pub mod recorder;
pub mod remote;
pub mod session;
pub mod storage;
pub mod ui;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Re-export watch page detection for JavaScript access
#[wasm_bindgen]
pub fn is_youtube_watch_page(url: &str) -> bool {
    metadata::is_watch_page(url)
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}
