//! Pulls metas out of a geometas country page.
//!
//! Each meta on the page lives in a `div` whose class list contains `py-6`. Inside it there
//! are two links to the meta's detail view: one wrapping the image and one holding the
//! caption text. Blocks without exactly one of each are skipped.

use crate::libgeometas::dataset::Meta;
use crate::libgeometas::site::Site;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[class*='py-6']").expect("block selector"));
static DETAIL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href*='/metas/detail']").expect("link selector"));
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").expect("img selector"));

pub fn extract(html: &str, site: &Site) -> Vec<Meta> {
    let document = Html::parse_document(html);
    document
        .select(&BLOCK)
        .filter_map(|block| extract_block(block, site))
        .collect()
}

fn extract_block(block: ElementRef, site: &Site) -> Option<Meta> {
    let (image_links, text_links): (Vec<ElementRef>, Vec<ElementRef>) = block
        .select(&DETAIL_LINK)
        .partition(|link| link.select(&IMG).next().is_some());

    let ([image_link], [text_link]) = (image_links.as_slice(), text_links.as_slice()) else {
        return None;
    };

    let img = image_link.select(&IMG).next()?;
    let src = img.value().attr("src").unwrap_or("").trim();
    let caption = text_link
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    Some(Meta::new(caption, site.resolve(src)))
}
