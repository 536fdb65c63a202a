use chrono::{Duration, TimeZone, Utc};

use super::*;

#[test]
fn test_secret_string_is_redacted() {
    let secret = SecretString::new("ghs_abcdef");
    assert_eq!(format!("{secret:?}"), "SecretString(***)");
    assert_eq!(secret.to_string(), "***");
    assert_eq!(secret.expose(), "ghs_abcdef");
}

#[test]
fn test_installation_token_debug_does_not_leak() {
    let token = InstallationToken {
        token: SecretString::new("ghs_abcdef"),
        expires_at: Timestamp::now(),
    };
    assert!(!format!("{token:?}").contains("ghs_abcdef"));
}

#[test]
fn test_installation_token_expiry() {
    let issued = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let token = InstallationToken {
        token: SecretString::new("t"),
        expires_at: Timestamp::from_utc(issued + Duration::hours(1)),
    };

    assert!(!token.is_expired_at(Timestamp::from_utc(issued)));
    assert!(token.is_expired_at(Timestamp::from_utc(issued + Duration::hours(1))));
}

#[test]
fn test_script_exit_propagation() {
    assert!(ScriptExit::Code { code: 0 }.success());
    assert!(!ScriptExit::Code { code: 3 }.success());
    assert!(!ScriptExit::Signal.success());

    assert_eq!(ScriptExit::Code { code: 3 }.propagated_code(), 3);
    assert_eq!(ScriptExit::Code { code: 0 }.propagated_code(), 0);
    assert_eq!(ScriptExit::Signal.propagated_code(), 1);
}
