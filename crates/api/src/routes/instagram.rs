//! Instagram thumbnail proxy endpoint.

use axum::{
    extract::rejection::QueryRejection,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::Thumbnail;

#[derive(Debug, Default, Deserialize)]
pub struct ThumbnailQuery {
    pub url: Option<String>,
    pub w: Option<String>,
    pub q: Option<String>,
    pub raw: Option<String>,
}

impl ThumbnailQuery {
    /// Requested width; blank or non-numeric values fall back to the default.
    fn width(&self) -> Option<u32> {
        parse_dimension(self.w.as_deref())
    }

    fn quality(&self) -> Option<u32> {
        parse_dimension(self.q.as_deref())
    }

    fn wants_redirect(&self) -> bool {
        matches!(
            self.raw.as_deref().map(str::trim),
            Some("1") | Some("true")
        )
    }
}

fn parse_dimension(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}

/// `GET /api/instagram-image?url=&w=&q=&raw=`.
pub async fn instagram_image(
    State(state): State<AppState>,
    query: Result<Query<ThumbnailQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let url = query
        .url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Missing url parameter"))?;

    let thumbnail = state
        .thumbnails
        .thumbnail(url, query.width(), query.quality(), query.wants_redirect())
        .await?;

    Ok(match thumbnail {
        Thumbnail::Redirect(target) => Redirect::temporary(&target).into_response(),
        Thumbnail::Image {
            content_type,
            bytes,
        } => (
            [
                (header::CONTENT_TYPE, content_type),
                (
                    header::CACHE_CONTROL,
                    format!("public, max-age={}", state.thumbnails.cache_max_age_secs()),
                ),
            ],
            bytes,
        )
            .into_response(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_redirect() {
        let mut query = ThumbnailQuery::default();
        assert!(!query.wants_redirect());
        query.raw = Some("1".into());
        assert!(query.wants_redirect());
        query.raw = Some("true".into());
        assert!(query.wants_redirect());
        query.raw = Some("0".into());
        assert!(!query.wants_redirect());
    }

    #[test]
    fn test_unparseable_size_falls_back_to_default() {
        let mut query = ThumbnailQuery::default();
        assert_eq!(query.width(), None);

        query.w = Some(String::new());
        assert_eq!(query.width(), None);
        query.w = Some("abc".into());
        assert_eq!(query.width(), None);
        query.w = Some("-5".into());
        assert_eq!(query.width(), None);
        query.w = Some(" 320 ".into());
        assert_eq!(query.width(), Some(320));

        query.q = Some("high".into());
        assert_eq!(query.quality(), None);
        query.q = Some("80".into());
        assert_eq!(query.quality(), Some(80));
    }
}
