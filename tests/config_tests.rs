use slideshow_wallpaper::config::Configuration;
use slideshow_wallpaper::selector::SelectionMode;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
wallpaper-path: "/srv/wallpapers"
shuffle: true
poll-interval: 500ms
frame-rate: 30
crossfade-duration: 2s
max-decode-dimension: 2048
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.wallpaper_path, PathBuf::from("/srv/wallpapers"));
    assert_eq!(cfg.selection_mode(), SelectionMode::Shuffle);
    assert_eq!(cfg.poll_interval, Duration::from_millis(500));
    assert_eq!(cfg.crossfade_duration, Duration::from_secs(2));
    assert_eq!(cfg.max_decode_dimension, 2048);

    let timing = cfg.validated().unwrap().timing();
    assert_eq!(timing.frame_interval, Duration::from_millis(33));
    assert_eq!(timing.poll_interval, Duration::from_millis(500));
}

#[test]
fn window_section_overrides_defaults() {
    let yaml = r#"
wallpaper-path: "/w"
window:
  title: "Desk"
  fullscreen: false
  pointer-parallax: false
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.window.title, "Desk");
    assert!(!cfg.window.fullscreen);
    assert!(!cfg.window.pointer_parallax);
    assert!(cfg.window.hide_cursor);
}

#[test]
fn unknown_keys_are_rejected() {
    let yaml = r#"
wallpaper-path: "/w"
transition: fade
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn zero_frame_rate_fails_validation() {
    let yaml = r#"
wallpaper-path: "/w"
frame-rate: 0
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("frame-rate"));
}

#[test]
fn zero_crossfade_fails_validation() {
    let yaml = r#"
wallpaper-path: "/w"
crossfade-duration: 0s
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "wallpaper-path: /pictures\nshuffle: false\n").unwrap();
    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.wallpaper_path, PathBuf::from("/pictures"));
    assert_eq!(cfg.selection_mode(), SelectionMode::Sequential);
}

#[test]
fn missing_file_names_the_path() {
    let err = Configuration::from_yaml_file("/nonexistent/slideshow.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/slideshow.yaml"));
}

#[test]
fn intervals_longer_than_a_day_fail_validation() {
    let yaml = r#"
wallpaper-path: "/w"
poll-interval: 500000000000years
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("poll-interval"));

    let yaml = r#"
wallpaper-path: "/w"
crossfade-duration: 25h
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());

    let yaml = r#"
wallpaper-path: "/w"
poll-interval: 24h
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_ok());
}
