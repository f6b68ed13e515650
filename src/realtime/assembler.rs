use crate::resolve::{LocationResolver, Resolution};
use crate::types::{AnalyticsRow, ResponseRecord};

/// One output record per row, in row order. Unresolved rows keep null
/// coordinates.
pub async fn assemble(rows: Vec<AnalyticsRow>, resolver: &LocationResolver) -> Vec<ResponseRecord> {
    let mut records = Vec::with_capacity(rows.len());
    let mut lookup_misses = 0usize;
    let mut geocode_failures = 0usize;

    for row in rows {
        let resolution = resolver.resolve(&row).await;
        match resolution {
            Resolution::Found(_) => {}
            Resolution::LookupMiss => lookup_misses += 1,
            Resolution::GeocodeFailed => geocode_failures += 1,
        }
        records.push(ResponseRecord::from_row(row, resolution.coordinates()));
    }

    tracing::info!(
        rows = records.len(),
        lookup_misses,
        geocode_failures,
        resolver = resolver.strategy_name(),
        "assembled realtime response"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::CountryCoordinates;
    use std::sync::Arc;

    fn resolver() -> LocationResolver {
        let table = CountryCoordinates::from_json(
            br#"{"ref_country_codes": [
                {"country": "Japan", "latitude": 36.0, "longitude": 138.0},
                {"country": "Brazil", "latitude": -10.0, "longitude": -55.0}
            ]}"#,
        )
        .unwrap();
        LocationResolver::Static(Arc::new(table))
    }

    fn row(country: &str, users: &str) -> AnalyticsRow {
        AnalyticsRow {
            country: country.to_string(),
            city: None,
            active_users: users.to_string(),
        }
    }

    #[tokio::test]
    async fn test_japan_record() {
        let records = assemble(vec![row("Japan", "3")], &resolver()).await;
        let json = serde_json::to_value(&records).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"country": "Japan", "active_users": "3", "latitude": 36.0, "longitude": 138.0}
            ])
        );
    }

    #[tokio::test]
    async fn test_order_and_length_preserved() {
        let rows = vec![row("Brazil", "7"), row("Atlantis", "1"), row("Japan", "2")];
        let records = assemble(rows, &resolver()).await;

        let countries: Vec<&str> = records.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, ["Brazil", "Atlantis", "Japan"]);
        assert_eq!(records[1].latitude, None);
        assert_eq!(records[1].longitude, None);
        assert_eq!(records[2].latitude, Some(36.0));
    }

    #[tokio::test]
    async fn test_empty_rows() {
        assert!(assemble(Vec::new(), &resolver()).await.is_empty());
    }
}
