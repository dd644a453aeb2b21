//! Gene locus registry: embedded artifact, file loading and lookups

use std::io::Write;

use agro_grna::{GrnaError, LocusRegistry, LookupError};
use rstest::rstest;
use tempfile::NamedTempFile;

#[rstest]
#[case("rice", "drought resistance", "LOC_Os06g03670", "DREB1A")]
#[case("Rice", "Flood Tolerance", "LOC_Os09g11460", "SUB1A")]
#[case("  RICE ", "  grain size", "GW2", "GW2")]
fn test_embedded_lookup(
    #[case] crop: &str,
    #[case] trait_name: &str,
    #[case] external_id: &str,
    #[case] symbol: &str,
) {
    let registry = LocusRegistry::embedded().unwrap();
    let locus = registry.lookup(crop, trait_name).unwrap();
    assert_eq!(locus.crop, "rice");
    assert_eq!(locus.organism_id, "oryza_sativa");
    assert_eq!(locus.external_id, external_id);
    assert_eq!(locus.symbol, symbol);
}

#[test]
fn test_lookup_failures_distinguish_crop_and_trait() {
    let registry = LocusRegistry::embedded().unwrap();

    assert_eq!(
        registry.lookup("kryptonite", "drought resistance"),
        Err(LookupError::UnsupportedCrop {
            crop: "kryptonite".to_string()
        })
    );
    assert!(matches!(
        registry.lookup("rice", "flight"),
        Err(LookupError::UnsupportedTrait { .. })
    ));
    // Crops may be listed without any supported trait
    assert_eq!(registry.traits("okra_pulses"), Some(vec![]));
    assert!(matches!(
        registry.lookup("okra_pulses", "yield"),
        Err(LookupError::UnsupportedTrait { .. })
    ));
    assert!(matches!(
        registry.lookup("", ""),
        Err(LookupError::UnsupportedCrop { .. })
    ));
}

#[test]
fn test_embedded_registry_shape() {
    let registry = LocusRegistry::embedded().unwrap();
    assert!(registry.crop_count() > 50);
    assert!(registry.len() >= registry.crop_count());

    let crops: Vec<&str> = registry.crops().collect();
    let mut sorted = crops.clone();
    sorted.sort_unstable();
    assert_eq!(crops, sorted);

    for crop in crops {
        for trait_name in registry.traits(crop).unwrap() {
            let locus = registry.lookup(crop, trait_name).unwrap();
            assert!(!locus.external_id.is_empty());
            assert!(!locus.symbol.is_empty());
        }
    }
}

#[test]
fn test_registry_from_file_with_legacy_key() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "Sorghum": {{
                "scientific_name": "sorghum_bicolor",
                "traits": {{
                    "Drought Tolerance": {{"ensembl_id": "SORBI_3003G234400", "symbol": "SbDREB2"}}
                }}
            }}
        }}"#
    )
    .unwrap();

    let registry = LocusRegistry::from_path(file.path()).unwrap();
    assert_eq!(registry.crop_count(), 1);
    assert_eq!(registry.len(), 1);

    let locus = registry.lookup("sorghum", "drought tolerance").unwrap();
    assert_eq!(locus.external_id, "SORBI_3003G234400");
    assert_eq!(locus.organism_name(), "sorghum bicolor");
    assert!(registry.lookup("rice", "drought resistance").is_err());
}

#[rstest]
#[case("{}")]
#[case("[]")]
#[case("not json")]
#[case(r#"{"rice": {"scientific_name": "", "traits": {}}}"#)]
fn test_invalid_registry_artifacts(#[case] json: &str) {
    let err = LocusRegistry::from_json_str(json).unwrap_err();
    assert!(matches!(
        err,
        GrnaError::RegistryEmpty | GrnaError::RegistryFormat { .. }
    ));
}

#[rstest]
#[case::crop(r#"{"rice": {"scientific_name": "oryza_sativa", "traits": {}}, "Rice ": {"scientific_name": "oryza_sativa", "traits": {}}}"#, "crop 'rice'")]
#[case::trait_name(r#"{"rice": {"scientific_name": "oryza_sativa", "traits": {"Grain Size": {"external_id": "A", "symbol": "A"}, "grain size": {"external_id": "B", "symbol": "B"}}}}"#, "trait 'grain size'")]
fn test_colliding_keys_are_rejected(#[case] json: &str, #[case] expected: &str) {
    match LocusRegistry::from_json_str(json) {
        Err(GrnaError::RegistryFormat { msg }) => assert!(msg.contains(expected), "{}", msg),
        other => panic!("expected a format error, got {:?}", other),
    }
}

#[test]
fn test_missing_registry_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = LocusRegistry::from_path(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, GrnaError::Io { .. }));
}

#[test]
fn test_registry_serializes_verbatim() {
    let registry = LocusRegistry::embedded().unwrap();
    let json = serde_json::to_string(&registry).unwrap();
    let reparsed = LocusRegistry::from_json_str(&json).unwrap();
    assert_eq!(registry, reparsed);

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value["rice"]["traits"]["drought resistance"],
        serde_json::json!({"external_id": "LOC_Os06g03670", "symbol": "DREB1A"})
    );
}
