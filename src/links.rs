//! Deep-link validation for purchase buttons
//!
//! The backend is asked for direct product pages but often answers with a
//! store homepage, an internal search or a category listing. A buy link is
//! only offered when the URL looks like a specific product page.

use url::Url;

/// Path or query fragments that mark search and listing pages
const SEARCH_MARKERS: &[&str] = &[
    "/search",
    "/busqueda",
    "/results",
    "/category",
    "/categoria",
    "/find",
    "/query",
    "/listado",
    "s=",
    "q=",
    "keyword=",
    "query=",
    "filter=",
    "orderby=",
    "ps=",
];

/// Path prefixes of institutional landing pages
const LANDING_PREFIXES: &[&str] = &[
    "/nosotros",
    "/contacto",
    "/sedes",
    "/domicilios",
    "/promociones",
];

/// Path fragments used by product detail pages of common store platforms
const PRODUCT_TOKENS: &[&str] = &[
    "/p/",
    "/pdp/",
    "/producto/",
    "/item/",
    "/medicamentos/",
    "/detalle/",
    "/sku/",
    "-p-",
    ".html",
    "/catalogo/producto/",
    "/catalogo/articulo/",
];

/// Shortest path accepted as a product page
const MIN_PATH_LEN: usize = 12;

/// Minimum number of non-empty path segments for a URL without a product token
const MIN_PATH_DEPTH: usize = 2;

/// Outcome of classifying a product URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkVerdict {
    /// Looks like a direct product page
    Valid,
    /// Could not be parsed as a URL
    Unparseable,
    /// Scheme is not http or https
    UnsupportedScheme,
    /// Path is the root or too short to name a product
    PathTooShort,
    /// Search results, category or filtered listing
    SearchOrListing,
    /// Institutional page such as contact or store locations
    LandingPage,
    /// Neither a product token nor enough path depth
    NotProductLike,
}

impl LinkVerdict {
    /// Short human-readable reason
    pub fn describe(&self) -> &'static str {
        match self {
            LinkVerdict::Valid => "direct product page",
            LinkVerdict::Unparseable => "not a valid URL",
            LinkVerdict::UnsupportedScheme => "not an http(s) link",
            LinkVerdict::PathTooShort => "homepage or path too short",
            LinkVerdict::SearchOrListing => "search or listing page",
            LinkVerdict::LandingPage => "store landing page",
            LinkVerdict::NotProductLike => "does not look like a product page",
        }
    }
}

/// Classifies `url`, explaining why it is or is not a product page
///
/// Path and query are compared lower-cased.
pub fn classify_product_url(url: &str) -> LinkVerdict {
    let Ok(parsed) = Url::parse(url) else {
        return LinkVerdict::Unparseable;
    };

    if !parsed.scheme().starts_with("http") {
        return LinkVerdict::UnsupportedScheme;
    }

    let path = parsed.path().to_lowercase();
    let query = parsed
        .query()
        .map(|q| format!("?{}", q.to_lowercase()))
        .unwrap_or_default();

    if path.len() < MIN_PATH_LEN || path == "/" {
        return LinkVerdict::PathTooShort;
    }

    if SEARCH_MARKERS
        .iter()
        .any(|marker| path.contains(marker) || query.contains(marker))
    {
        return LinkVerdict::SearchOrListing;
    }

    if LANDING_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return LinkVerdict::LandingPage;
    }

    let has_product_token = PRODUCT_TOKENS.iter().any(|token| path.contains(token));
    let depth = path.split('/').filter(|segment| !segment.is_empty()).count();

    if has_product_token || depth >= MIN_PATH_DEPTH {
        LinkVerdict::Valid
    } else {
        LinkVerdict::NotProductLike
    }
}

/// Returns true if `url` points directly at a product page
///
/// Never panics; malformed input is simply not valid.
pub fn is_valid_product_url(url: &str) -> bool {
    classify_product_url(url) == LinkVerdict::Valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_token_url_is_valid() {
        assert!(is_valid_product_url("https://store.com/p/ibuprofeno-400mg-caja"));
    }

    #[test]
    fn test_search_url_is_rejected() {
        assert!(!is_valid_product_url("https://store.com/search?q=ibuprofeno"));
    }

    #[test]
    fn test_root_url_is_rejected() {
        assert!(!is_valid_product_url("https://store.com/"));
        assert_eq!(classify_product_url("https://store.com"), LinkVerdict::PathTooShort);
    }

    #[test]
    fn test_contact_page_is_rejected() {
        assert!(!is_valid_product_url("https://store.com/contacto"));
    }

    #[test]
    fn test_deep_medicine_path_is_valid() {
        assert!(is_valid_product_url(
            "https://store.com/medicamentos/analgesicos/ibuprofeno-400"
        ));
    }

    #[test]
    fn test_non_http_scheme_is_rejected() {
        assert!(!is_valid_product_url("ftp://store.com/p/123"));
        assert_eq!(
            classify_product_url("ftp://store.com/p/ibuprofeno-400mg"),
            LinkVerdict::UnsupportedScheme
        );
    }

    #[test]
    fn test_unparseable_input_is_rejected() {
        assert_eq!(classify_product_url("not a url"), LinkVerdict::Unparseable);
        assert_eq!(classify_product_url(""), LinkVerdict::Unparseable);
        assert!(!is_valid_product_url("https://"));
    }

    #[test]
    fn test_html_suffix_is_valid() {
        assert!(is_valid_product_url(
            "https://www.larebajavirtual.com/ibuprofeno-400.html"
        ));
    }

    #[test]
    fn test_single_segment_without_token_is_rejected() {
        assert_eq!(
            classify_product_url("https://store.com/ibuprofeno400mgcaja"),
            LinkVerdict::NotProductLike
        );
    }

    #[test]
    fn test_listing_markers_in_query_are_rejected() {
        assert_eq!(
            classify_product_url("https://store.com/p/ibuprofeno-400?ps=20"),
            LinkVerdict::SearchOrListing
        );
        assert_eq!(
            classify_product_url("https://store.com/medicamentos/dolor?orderBy=price"),
            LinkVerdict::SearchOrListing
        );
    }

    #[test]
    fn test_listing_markers_in_path_are_rejected() {
        assert_eq!(
            classify_product_url("https://store.com/categoria/analgesicos/ibuprofeno"),
            LinkVerdict::SearchOrListing
        );
    }

    #[test]
    fn test_landing_pages_are_rejected_even_when_deep() {
        assert_eq!(
            classify_product_url("https://store.com/promociones/ibuprofeno-400"),
            LinkVerdict::LandingPage
        );
        assert_eq!(
            classify_product_url("https://store.com/sedes/manizales/centro"),
            LinkVerdict::LandingPage
        );
    }

    #[test]
    fn test_checks_are_case_insensitive() {
        assert!(is_valid_product_url("HTTPS://STORE.COM/P/IBUPROFENO-400MG"));
        assert!(!is_valid_product_url("https://store.com/SEARCH/ibuprofeno-400"));
    }

    #[test]
    fn test_unrelated_query_parameters_are_allowed() {
        assert!(is_valid_product_url(
            "https://store.com/p/ibuprofeno-400?utm_medium=ai"
        ));
    }

    #[test]
    fn test_verdict_descriptions() {
        assert_eq!(LinkVerdict::Valid.describe(), "direct product page");
        assert_eq!(LinkVerdict::LandingPage.describe(), "store landing page");
    }
}
