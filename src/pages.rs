use axum::response::Html;

/// GET / and GET /world_map
pub async fn world_map() -> Html<&'static str> {
    Html(include_str!("pages/world_map.html"))
}

/// GET /globe - Map and globe side by side.
pub async fn globe() -> Html<&'static str> {
    Html(include_str!("pages/globe.html"))
}
