use cssparser::{Parser, ParserInput, Token};
use scraper::{Html, Selector};

use crate::decode::{decode_text, DecodeError};

/// Pulls raw (possibly relative) outbound references out of fetched content.
///
/// The markup queries are compiled once here and reused for every document;
/// callers share one extractor across the whole crawl.
pub struct LinkExtractor {
    anchors: Selector,
    images: Selector,
    stylesheets: Selector,
    scripts: Selector,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self {
            anchors: Selector::parse("a[href]").expect("static selector"),
            images: Selector::parse("img[src]").expect("static selector"),
            stylesheets: Selector::parse(r#"link[href][rel="stylesheet"]"#)
                .expect("static selector"),
            scripts: Selector::parse("script[src]").expect("static selector"),
        }
    }

    /// Returns the reference strings found in `body`, dispatched on media
    /// type. Content that is neither markup nor a stylesheet yields nothing.
    pub fn extract(
        &self,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<Vec<String>, DecodeError> {
        let media_type = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());
        match media_type.as_deref() {
            Some("text/html") => {
                let markup = decode_text(body, content_type)?;
                Ok(self.extract_markup(&markup))
            }
            Some("text/css") => {
                let stylesheet = decode_text(body, content_type)?;
                Ok(extract_stylesheet_urls(&stylesheet))
            }
            _ => Ok(Vec::new()),
        }
    }

    fn extract_markup(&self, markup: &str) -> Vec<String> {
        let document = Html::parse_document(markup);
        let mut references = Vec::new();
        for (selector, attribute) in [
            (&self.anchors, "href"),
            (&self.images, "src"),
            (&self.stylesheets, "href"),
            (&self.scripts, "src"),
        ] {
            for element in document.select(selector) {
                if let Some(value) = element.value().attr(attribute) {
                    if !value.is_empty() {
                        references.push(value.to_string());
                    }
                }
            }
        }
        references
    }
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects the target of every `url(...)` token in a stylesheet, with the
/// wrapper and any surrounding quotes removed. Malformed tokens are skipped.
fn extract_stylesheet_urls(stylesheet: &str) -> Vec<String> {
    let mut input = ParserInput::new(stylesheet);
    let mut parser = Parser::new(&mut input);
    let mut references = Vec::new();
    collect_url_tokens(&mut parser, &mut references);
    references
}

fn collect_url_tokens<'i>(parser: &mut Parser<'i, '_>, out: &mut Vec<String>) {
    loop {
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::UnquotedUrl(value) => out.push(value.to_string()),
            // `url("...")` and `url('...')` tokenize as a function with a
            // quoted-string argument.
            Token::Function(name) if name.eq_ignore_ascii_case("url") => {
                let _ = parser.parse_nested_block(|block| {
                    loop {
                        let inner = match block.next() {
                            Ok(inner) => inner.clone(),
                            Err(_) => break,
                        };
                        if let Token::QuotedString(value) = inner {
                            out.push(value.to_string());
                        }
                    }
                    Ok::<(), cssparser::ParseError<'i, ()>>(())
                });
            }
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                let _ = parser.parse_nested_block(|block| {
                    collect_url_tokens(block, out);
                    Ok::<(), cssparser::ParseError<'i, ()>>(())
                });
            }
            _ => {}
        }
    }
}
