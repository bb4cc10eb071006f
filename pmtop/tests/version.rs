//! Parsing and staleness classification rules.

use pmtop::version::{classify, Version, VersionStatus};

fn v(s: &str) -> Version {
    s.parse().expect("version")
}

#[test]
fn parses_with_and_without_leading_v() {
    assert_eq!(
        v("v1.2.3"),
        Version {
            major: 1,
            minor: 2,
            patch: 3
        }
    );
    assert_eq!(v("1.2.3"), v("v1.2.3"));
    assert_eq!(v("v0.0.0"), Version::UNKNOWN);
}

#[test]
fn rejects_malformed_versions() {
    for bad in ["", "1.2", "1.2.3.4", "a.b.c", "v1..3", "1.2.x"] {
        assert!(bad.parse::<Version>().is_err(), "accepted {bad:?}");
    }
    let err = "nonsense".parse::<Version>().unwrap_err();
    assert_eq!(err.input, "nonsense");
}

#[test]
fn minor_drift_beyond_two_is_behind() {
    assert_eq!(
        classify(v("1.4.0"), v("v1.7.0"), None),
        VersionStatus::Behind
    );
}

#[test]
fn next_major_with_minor_is_behind() {
    assert_eq!(
        classify(v("2.0.0"), v("v3.1.0"), None),
        VersionStatus::Behind
    );
}

#[test]
fn major_jump_of_two_is_behind() {
    assert_eq!(
        classify(v("1.0.0"), v("v3.0.0"), None),
        VersionStatus::Behind
    );
}

#[test]
fn exact_match_is_updated() {
    assert_eq!(
        classify(v("1.4.0"), v("v1.4.0"), None),
        VersionStatus::Updated
    );
}

#[test]
fn unknown_sentinel_is_behind() {
    assert_eq!(
        classify(v("1.4.0"), Version::UNKNOWN, Some(VersionStatus::Updated)),
        VersionStatus::Behind
    );
}

#[test]
fn near_versions_fall_back_to_reported_status() {
    // One minor ahead: within range, so the server's own word stands
    assert_eq!(
        classify(v("1.4.0"), v("v1.5.0"), Some(VersionStatus::Updated)),
        VersionStatus::Updated
    );
    assert_eq!(
        classify(v("1.4.0"), v("v1.5.0"), None),
        VersionStatus::Critical
    );
}

#[test]
fn distance_overrides_reported_status() {
    assert_eq!(
        classify(v("1.4.0"), v("v1.7.0"), Some(VersionStatus::Updated)),
        VersionStatus::Behind
    );
}
