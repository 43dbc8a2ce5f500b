use super::*;

fn resolved(
    source: &str,
    date: Option<(i32, u32, u32)>,
    query: &str,
    lat: f64,
    lon: f64,
) -> Sighting {
    let fields = SightingFields {
        date: Some("raw".to_owned()),
        time: Some("8.45pm".to_owned()),
        location: Some(format!("{query} (near)")),
        features: Some("Red, then green".to_owned()),
        description: Some("Hovered \"silently\" for 5 minutes".to_owned()),
    };
    let date = date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
    let geo = GeoMatch {
        coordinates: Coordinates::new(lat, lon).unwrap(),
        query: query.to_owned(),
    };
    Sighting::from_parts(source, fields, date).with_resolution(Some(geo), 2)
}

fn unresolved(source: &str) -> Sighting {
    let fields = SightingFields {
        location: Some("Somewhere remote".to_owned()),
        ..SightingFields::default()
    };
    Sighting::from_parts(source, fields, NaiveDate::from_ymd_opt(2011, 1, 5))
        .with_resolution(None, 4)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

#[test]
fn csv_header_matches_export_layout() {
    let sighting = resolved(
        "s1",
        Some((2014, 10, 21)),
        "Cashmere, Christchurch",
        -43.567,
        172.627,
    );
    let mut buf = Vec::new();
    write_csv(&mut buf, [&sighting]).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(
        text.lines().next(),
        Some(
            "Date,Time,Location,Features,Description,Latitude,Longitude,\
             Source,ResolvedLocation,ResolutionAttempts"
        )
    );
    assert!(text.contains("2014-10-21"));
}

#[test]
fn csv_round_trip_preserves_resolution() {
    let original = vec![
        resolved(
            "https://example.org/2014",
            Some((2014, 10, 21)),
            "Cashmere, Christchurch",
            -43.567_123_4,
            172.627_987_6,
        ),
        resolved("https://example.org/2010", None, "Waiheke", -36.8, 175.1),
        unresolved("https://example.org/2011"),
    ];

    let mut buf = Vec::new();
    let written = write_csv(&mut buf, &original).unwrap();
    assert_eq!(written, 3);

    let restored = read_csv(buf.as_slice()).unwrap();
    assert_eq!(restored.len(), original.len());
    for (before, after) in original.iter().zip(&restored) {
        assert_eq!(after.date(), before.date());
        assert_eq!(after.latitude(), before.latitude());
        assert_eq!(after.longitude(), before.longitude());
        assert_eq!(after.resolved_location(), before.resolved_location());
        assert_eq!(after.resolution_attempts(), before.resolution_attempts());
        assert_eq!(after.source(), before.source());
        assert_eq!(after.raw_time(), before.raw_time());
        assert_eq!(after.description(), before.description());
    }
}

#[test]
fn empty_export_still_has_header() {
    let mut buf = Vec::new();
    let written = write_csv(&mut buf, std::iter::empty()).unwrap();
    assert_eq!(written, 0);
    let restored = read_csv(buf.as_slice()).unwrap();
    assert!(restored.is_empty());
    assert!(String::from_utf8(buf).unwrap().starts_with("Date,Time,"));
}

#[test]
fn half_resolved_row_is_rejected() {
    let csv = "Date,Time,Location,Features,Description,Latitude,Longitude,\
               Source,ResolvedLocation,ResolutionAttempts\n\
               2014-10-21,,Tauranga,,,-37.68,,s1,Tauranga,1\n";
    let err = read_csv(csv.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("line 2"), "got: {err:#}");
}

#[test]
fn out_of_range_coordinates_are_rejected() {
    let csv = "Date,Time,Location,Features,Description,Latitude,Longitude,\
               Source,ResolvedLocation,ResolutionAttempts\n\
               ,,Tauranga,,,-137.68,176.1,s1,Tauranga,1\n";
    assert!(read_csv(csv.as_bytes()).is_err());
}

// ---------------------------------------------------------------------------
// GeoJSON
// ---------------------------------------------------------------------------

#[test]
fn geojson_includes_only_dated_and_located_sightings_in_date_order() {
    let sightings = vec![
        resolved("late", Some((2015, 5, 3)), "Tauranga", -37.68, 176.16),
        resolved("undated", None, "Waiheke", -36.8, 175.1),
        unresolved("unresolved"),
        resolved("early", Some((2010, 10, 27)), "Waiheke", -36.8, 175.1),
    ];

    let collection = to_geojson(&sightings);
    assert_eq!(collection["type"], "FeatureCollection");
    let features = collection["features"].as_array().unwrap();
    let sources: Vec<&str> = features
        .iter()
        .map(|f| f["properties"]["source"].as_str().unwrap())
        .collect();
    assert_eq!(sources, vec!["early", "late"]);
}

#[test]
fn geojson_point_is_longitude_first() {
    let sightings = vec![resolved("s", Some((2014, 10, 21)), "Tauranga", -37.68, 176.16)];
    let collection = to_geojson(&sightings);
    let feature = &collection["features"][0];
    assert_eq!(feature["geometry"]["type"], "Point");
    assert_eq!(feature["geometry"]["coordinates"], json!([176.16, -37.68]));
    assert_eq!(feature["properties"]["date"], "2014-10-21");
    assert_eq!(feature["properties"]["resolvedLocation"], "Tauranga");
}
