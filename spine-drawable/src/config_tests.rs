use crate::{AnimationMix, DrawableConfig, Error, MAX_MESH_VERTICES};

#[test]
fn empty_object_yields_defaults() {
    let config = DrawableConfig::from_json_str("{}").unwrap();
    assert_eq!(config, DrawableConfig::default());
    assert_eq!(config.scale, 1.0);
    assert_eq!(config.time_scale, 1.0);
    assert_eq!(config.max_vertices, MAX_MESH_VERTICES);
}

#[test]
fn parses_all_fields() {
    let config = DrawableConfig::from_json_slice(
        br#"{
            "scale": 0.5,
            "skin": "goblin",
            "time_scale": 2.0,
            "default_mix": 0.2,
            "mixes": [{ "from": "walk", "to": "run", "duration": 0.4 }],
            "max_vertices": 1024,
            "offset": [10.0, -4.0],
            "flip_x": true,
            "flip_y": false
        }"#,
    )
    .unwrap();

    assert_eq!(config.scale, 0.5);
    assert_eq!(config.skin.as_deref(), Some("goblin"));
    assert_eq!(config.time_scale, 2.0);
    assert_eq!(config.default_mix, 0.2);
    assert_eq!(
        config.mixes,
        vec![AnimationMix {
            from: "walk".to_string(),
            to: "run".to_string(),
            duration: 0.4,
        }]
    );
    assert_eq!(config.max_vertices, 1024);
    assert_eq!(config.offset, [10.0, -4.0]);
    assert!(config.flip_x);
    assert!(!config.flip_y);
}

#[test]
fn rejects_invalid_values() {
    for input in [
        r#"{ "scale": 0 }"#,
        r#"{ "scale": -1 }"#,
        r#"{ "default_mix": -0.5 }"#,
        r#"{ "time_scale": -1 }"#,
        r#"{ "max_vertices": 3 }"#,
    ] {
        let err = DrawableConfig::from_json_str(input).unwrap_err();
        assert!(matches!(err, Error::Config { .. }), "{input}: {err}");
    }
}

#[test]
fn rejects_unknown_fields_and_malformed_json() {
    let err = DrawableConfig::from_json_str(r#"{ "scael": 2 }"#).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));

    let err = DrawableConfig::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn validate_checks_configs_built_in_code() {
    assert!(DrawableConfig::default().validate().is_ok());

    let config = DrawableConfig {
        time_scale: f32::NAN,
        ..DrawableConfig::default()
    };
    assert!(matches!(config.validate(), Err(Error::Config { .. })));
}
