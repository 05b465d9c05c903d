// src/sitemap.rs
// =============================================================================
// This module writes the sitemap file.
//
// Format (https://www.sitemaps.org/protocol.html):
//   <?xml version="1.0" encoding="UTF-8"?>
//   <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//     <url>
//       <loc>https://example.com/</loc>
//     </url>
//     ...
//   </urlset>
//
// URLs must be XML-escaped: a query string like "?a=1&b=2" is common and a
// raw '&' would make the file invalid.
// =============================================================================

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

// Writes a sitemap listing `urls` to `writer`
pub fn render_sitemap<W: Write>(mut writer: W, urls: &[String]) -> io::Result<()> {
    writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(writer, r#"<urlset xmlns="{}">"#, SITEMAP_NAMESPACE)?;

    for url in urls {
        writeln!(writer, "\t<url>\n\t\t<loc>{}</loc>\n\t</url>", escape_xml(url))?;
    }

    writeln!(writer, "</urlset>")?;
    writer.flush()
}

// Creates (or overwrites) the sitemap file at `path`
pub fn write_sitemap(path: &Path, urls: &[String]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create sitemap file {}", path.display()))?;

    render_sitemap(BufWriter::new(file), urls)
        .with_context(|| format!("Failed to write sitemap to {}", path.display()))
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(urls: &[&str]) -> String {
        let urls: Vec<String> = urls.iter().map(|u| u.to_string()).collect();
        let mut out = Vec::new();
        render_sitemap(&mut out, &urls).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_render_sitemap() {
        let xml = render(&["https://example.com/", "https://example.com/about"]);
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n\
             \t<url>\n\t\t<loc>https://example.com/</loc>\n\t</url>\n\
             \t<url>\n\t\t<loc>https://example.com/about</loc>\n\t</url>\n\
             </urlset>\n"
        );
    }

    #[test]
    fn test_empty_sitemap_is_still_valid() {
        let xml = render(&[]);
        assert!(xml.contains("<urlset"));
        assert!(xml.ends_with("</urlset>\n"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_locations_are_escaped() {
        let xml = render(&["https://example.com/?a=1&b='2'"]);
        assert!(xml.contains("<loc>https://example.com/?a=1&amp;b=&apos;2&apos;</loc>"));
    }

    #[test]
    fn test_write_sitemap_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitemap.xml");

        write_sitemap(&path, &["https://example.com/".to_string()]).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<?xml"));
        assert!(written.contains("<loc>https://example.com/</loc>"));
    }

    #[test]
    fn test_write_sitemap_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("sitemap.xml");
        assert!(write_sitemap(&path, &[]).is_err());
    }
}
