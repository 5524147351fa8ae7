pub mod caption;

pub use caption::{format_html, CaptionError, Captioner, DEFAULT_ENDPOINT};
