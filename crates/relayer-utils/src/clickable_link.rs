use std::fmt;

use url::Url;

/// Represents a clickable link containing text and url
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ClickableLink<'a> {
    text: &'a str,
    url: &'a str,
}

impl<'a> ClickableLink<'a> {
    /// Create a new link with a name and target URL, helpful to print clickable links in the terminal.
    pub fn new(text: &'a str, url: &'a str) -> Self {
        Self { text, url }
    }
}

impl fmt::Display for ClickableLink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\u{1b}]8;;{}\u{1b}\\{}\u{1b}]8;;\u{1b}\\",
            self.url, self.text
        )
    }
}

/// Renders a transaction hash as a terminal link into the block explorer,
/// or as plain text when no explorer is configured.
pub fn tx_link(explorer: Option<&Url>, tx_hash: &str) -> String {
    match explorer {
        Some(explorer) => {
            let mut url = explorer.clone();
            url.set_path(&format!("tx/{tx_hash}"));
            ClickableLink::new(tx_hash, url.as_str()).to_string()
        }
        None => tx_hash.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_without_explorer() {
        assert_eq!(tx_link(None, "0xabc"), "0xabc");
    }

    #[test]
    fn links_into_explorer() {
        let explorer = Url::parse("https://etherscan.io").unwrap();
        let link = tx_link(Some(&explorer), "0xabc");
        assert!(link.contains("https://etherscan.io/tx/0xabc"));
        assert!(link.contains("\u{1b}]8;;"));
    }
}
