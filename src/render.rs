//! Article page rendering
//!
//! Streams the static article template through an HTML rewriter that fills
//! in SEO tags and the article content, so the browser gets a complete page
//! without a client-side fetch.

use std::path::Path;

use hyper::body::Bytes;
use lol_html::html_content::ContentType;
use lol_html::{element, HtmlRewriter, Settings};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::RenderError;
use crate::upstream::Article;

/// Template read size per rewriter write
const CHUNK_SIZE: usize = 8 * 1024;

/// Marker script telling the frontend the article is already in the DOM
const PRELOADED_SCRIPT: &str = "<script>window.SERVER_PRELOADED = true;</script>";

/// Render `article` into the template at `template`
///
/// The template is rewritten as it is read; the output is buffered whole
/// because the finished page is also what gets cached.
pub async fn render_article(
    template: &Path,
    article: &Article,
    site_name: &str,
) -> Result<Bytes, RenderError> {
    let template_error = |source: std::io::Error| RenderError::Template {
        path: template.display().to_string(),
        source,
    };
    let mut file = File::open(template).await.map_err(template_error)?;

    let page_title = format!("{} | {site_name}", article.title);
    let category_href = article.category_href();

    let mut output = Vec::new();
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("title", |el| {
                    el.set_inner_content(&page_title, ContentType::Text);
                    Ok(())
                }),
                element!(r#"meta[name="description"]"#, |el| {
                    el.set_attribute("content", article.excerpt())?;
                    Ok(())
                }),
                element!(r#"meta[property="og:title"]"#, |el| {
                    el.set_attribute("content", &article.title)?;
                    Ok(())
                }),
                element!(r#"meta[property="og:image"]"#, |el| {
                    el.set_attribute("content", article.image_url())?;
                    Ok(())
                }),
                element!(".article-title", |el| {
                    el.set_inner_content(&article.title, ContentType::Text);
                    Ok(())
                }),
                element!(".category-tag", |el| {
                    el.set_inner_content(article.category_name(), ContentType::Text);
                    el.set_attribute("href", &category_href)?;
                    Ok(())
                }),
                element!(".featured-image", |el| {
                    el.set_attribute("src", article.image_url())?;
                    Ok(())
                }),
                element!("#articleBody", |el| {
                    el.set_inner_content(article.content(), ContentType::Html);
                    Ok(())
                }),
                element!("head", |el| {
                    el.append(PRELOADED_SCRIPT, ContentType::Html);
                    Ok(())
                }),
            ],
            ..Settings::new()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf).await.map_err(template_error)?;
        if read == 0 {
            break;
        }
        rewriter.write(&buf[..read])?;
    }
    rewriter.end()?;

    Ok(Bytes::from(output))
}
