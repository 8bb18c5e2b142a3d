//! Tokenizer for pasted HTML.
//!
//! Deliberately forgiving: anything that does not look like markup is text,
//! and a stray `<` is text too.

use logos::{Lexer, Logos};

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum HtmlToken<'src> {
    #[token("<!--", skip_comment)]
    Comment,

    // <!DOCTYPE ...>, <![CDATA[...]]> and <?xml ...?>
    #[regex(r"<![A-Za-z\[][^>]*>")]
    #[regex(r"<\?[^>]*>")]
    Declaration,

    #[regex(r#"<[A-Za-z][A-Za-z0-9:-]*([^>"']|"[^"]*"|'[^']*')*>"#, |lex| lex.slice())]
    OpenTag(&'src str),

    #[regex(r"</[A-Za-z][A-Za-z0-9:-]*[ \t\r\n]*>", close_name)]
    CloseTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),

    #[token("<")]
    StrayAngle,
}

fn skip_comment<'src>(lex: &mut Lexer<'src, HtmlToken<'src>>) -> bool {
    let end = lex
        .remainder()
        .find("-->")
        .map_or(lex.remainder().len(), |i| i + 3);
    lex.bump(end);
    true
}

fn close_name<'src>(lex: &mut Lexer<'src, HtmlToken<'src>>) -> &'src str {
    lex.slice()[2..].trim_end_matches('>').trim_end()
}

/// A start tag split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Lowercased tag name
    pub name: String,
    /// Attributes with lowercased names and decoded values
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

impl StartTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Parse the raw text of an open tag such as `<td colspan="2" data-x=1>`
pub fn parse_start_tag(raw: &str) -> StartTag {
    let inner = raw.trim_start_matches('<').trim_end_matches('>');
    let self_closing = inner.ends_with('/');
    let inner = inner.trim_end_matches('/');

    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = inner[..name_end].to_ascii_lowercase();

    let mut attrs = Vec::new();
    let mut rest = &inner[name_end..];
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }
        let key_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let mut value = String::new();
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (raw_value, remaining) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let end = body.find(quote).unwrap_or(body.len());
                    (&body[..end], body.get(end + 1..).unwrap_or(""))
                }
                _ => {
                    let end = after_eq
                        .find(|c: char| c.is_ascii_whitespace())
                        .unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            value = html_escape::decode_html_entities(raw_value).into_owned();
            rest = remaining;
        }
        if !key.is_empty() {
            attrs.push((key, value));
        }
    }

    StartTag {
        name,
        attrs,
        self_closing,
    }
}

/// Split an inline `style` attribute into lowercased property/value pairs
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();
            if property.is_empty() || value.is_empty() {
                None
            } else {
                Some((property, value.to_string()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<HtmlToken<'_>> {
        HtmlToken::lexer(source).filter_map(Result::ok).collect()
    }

    #[test]
    fn test_lex_tags_and_text() {
        let toks = tokens(r#"<p class="x">a &amp; b</p>"#);
        assert_eq!(
            toks,
            vec![
                HtmlToken::OpenTag(r#"<p class="x">"#),
                HtmlToken::Text("a &amp; b"),
                HtmlToken::CloseTag("p"),
            ]
        );
    }

    #[test]
    fn test_lex_skips_comments_and_doctype() {
        let toks = tokens("<!DOCTYPE html><!-- a > b --><hr>");
        assert_eq!(
            toks,
            vec![
                HtmlToken::Declaration,
                HtmlToken::Comment,
                HtmlToken::OpenTag("<hr>")
            ]
        );
    }

    #[test]
    fn test_quoted_gt_stays_in_tag() {
        let toks = tokens(r#"<a title="1 > 0" href="x">go</a>"#);
        assert_eq!(toks[0], HtmlToken::OpenTag(r#"<a title="1 > 0" href="x">"#));
    }

    #[test]
    fn test_stray_angle_is_its_own_token() {
        let toks = tokens("1 < 2");
        assert_eq!(
            toks,
            vec![
                HtmlToken::Text("1 "),
                HtmlToken::StrayAngle,
                HtmlToken::Text(" 2")
            ]
        );
    }

    #[test]
    fn test_parse_start_tag_attributes() {
        let tag = parse_start_tag(r#"<TD ColSpan="2" data-checked=true style='color: red' hidden/>"#);
        assert_eq!(tag.name, "td");
        assert_eq!(tag.attr("colspan"), Some("2"));
        assert_eq!(tag.attr("data-checked"), Some("true"));
        assert_eq!(tag.attr("style"), Some("color: red"));
        assert_eq!(tag.attr("hidden"), Some(""));
        assert!(tag.self_closing);
    }

    #[test]
    fn test_parse_style() {
        let style = parse_style("Color: #333; font-size:14px !important; ;bogus");
        assert_eq!(
            style,
            vec![
                ("color".to_string(), "#333".to_string()),
                ("font-size".to_string(), "14px".to_string()),
            ]
        );
    }
}
