use block_golf::launch::{LaunchError, LaunchOptions, DEFAULT_COURSE_PATH};

#[test]
fn defaults_without_arguments() {
    let opts = LaunchOptions::from_args(Vec::<String>::new()).unwrap();
    assert_eq!(opts.course_path, DEFAULT_COURSE_PATH);
    assert_eq!(opts.players, 2);
    assert!(!opts.autoplay);
    assert_eq!(opts.run_duration_seconds, None);
}

#[test]
fn parses_every_flag() {
    let opts = LaunchOptions::from_args(["--course", "links.ron", "--players", "4", "--autoplay", "--runtime", "12.5"]).unwrap();
    assert_eq!(opts.course_path, "links.ron");
    assert_eq!(opts.players, 4);
    assert!(opts.autoplay);
    assert_eq!(opts.run_duration_seconds, Some(12.5));
}

#[test]
fn rejects_bad_input() {
    assert_eq!(LaunchOptions::from_args(["--course"]), Err(LaunchError::MissingValue("--course")));
    assert_eq!(
        LaunchOptions::from_args(["--players", "0"]),
        Err(LaunchError::InvalidNumber { flag: "--players", value: "0".into() })
    );
    assert_eq!(
        LaunchOptions::from_args(["--runtime", "soon"]),
        Err(LaunchError::InvalidNumber { flag: "--runtime", value: "soon".into() })
    );
    let err = LaunchOptions::from_args(["--fast"]).unwrap_err();
    assert_eq!(err, LaunchError::UnknownFlag("--fast".into()));
    assert!(err.to_string().contains("--fast"));
}
