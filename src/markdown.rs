use comrak::Options;

/// Renders a post body to HTML. Raw HTML in the source is escaped.
pub fn to_html(source: &str) -> String {
    let mut options = Options::default();
    options.extension.footnotes = true;
    options.extension.table = true;
    options.extension.header_ids = Some("content-".to_string());
    options.extension.strikethrough = true;
    options.extension.tagfilter = true;
    options.extension.autolink = true;
    options.render.escape = true;

    comrak::markdown_to_html(source, &options)
}
