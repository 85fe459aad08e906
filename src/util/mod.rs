pub mod config;
pub mod files;
pub mod merge;
pub mod resolve;
pub mod retry;
pub mod state;

use supports_hyperlinks::Stream;

// osc 8 hyperlink if the terminal can show it, plain text otherwise
pub fn to_hyperlink(url: &str, text: &str) -> String {
    if supports_hyperlinks::on(Stream::Stdout) {
        format!("\x1b]8;;{url}\x1b\\{text}\x1b]8;;\x1b\\")
    } else {
        text.to_owned()
    }
}
