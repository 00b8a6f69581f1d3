//! HTML page templates.

use askama::Template;

/// The upload form page, with an optional flash message.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// Message shown when the previous request was rejected.
    pub flash: Option<String>,
}

/// The about page.
#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate;

/// One rendered search result.
pub struct ResultItem {
    /// Web path of the matched image, served from `/static/`.
    pub web_path: String,
    /// File name shown as the caption.
    pub file_name: String,
    /// Similarity score, preformatted (e.g. `"87.5"`).
    pub similarity: String,
    /// Raw distance, preformatted (e.g. `"0.3127"`).
    pub distance: String,
}

/// The search results page.
#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate {
    /// Web path of the uploaded query image.
    pub query_image: String,
    /// Matches, closest first.
    pub results: Vec<ResultItem>,
}
