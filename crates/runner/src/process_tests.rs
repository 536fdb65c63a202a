use pipeline::SecretString;
use pretty_assertions::assert_eq;

use super::*;

fn sh(script: &str) -> ScriptInvocation {
    ScriptInvocation {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        working_dir: None,
    }
}

fn var(name: &str, value: &str) -> ScriptEnvVar {
    ScriptEnvVar {
        name: name.to_string(),
        value: SecretString::new(value),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_exit_code_is_reported_verbatim() {
    let exit = ProcessScriptRunner::new()
        .run(&sh("exit 3"), &[])
        .await
        .unwrap();
    assert_eq!(exit, ScriptExit::Code { code: 3 });
}

#[cfg(unix)]
#[tokio::test]
async fn test_zero_exit_is_success() {
    let exit = ProcessScriptRunner::new()
        .run(&sh("true"), &[])
        .await
        .unwrap();
    assert!(exit.success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_bindings_reach_the_child() {
    let env = [var("GITHUB_TOKEN", "ghs_secret"), var("ISSUE_NUMBER", "42")];
    let exit = ProcessScriptRunner::new()
        .run(
            &sh(r#"[ "$GITHUB_TOKEN" = ghs_secret ] && [ "$ISSUE_NUMBER" = 42 ]"#),
            &env,
        )
        .await
        .unwrap();
    assert_eq!(exit, ScriptExit::Code { code: 0 });
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_environment_is_inherited() {
    // PATH is always set for the test process.
    let exit = ProcessScriptRunner::new()
        .run(&sh(r#"[ -n "$PATH" ]"#), &[])
        .await
        .unwrap();
    assert!(exit.success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_signal_termination() {
    let exit = ProcessScriptRunner::new()
        .run(&sh("kill -KILL $$"), &[])
        .await
        .unwrap();
    assert_eq!(exit, ScriptExit::Signal);
    assert_eq!(exit.propagated_code(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_working_directory_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker"), "").unwrap();

    let mut script = sh("[ -f marker ]");
    script.working_dir = Some(dir.path().to_path_buf());

    let exit = ProcessScriptRunner::new().run(&script, &[]).await.unwrap();
    assert!(exit.success());
}

#[tokio::test]
async fn test_missing_program_is_a_launch_error() {
    let script = ScriptInvocation {
        program: "steward-test-no-such-program".to_string(),
        args: Vec::new(),
        working_dir: None,
    };

    let err = ProcessScriptRunner::new().run(&script, &[]).await.unwrap_err();
    assert_eq!(err.program, "steward-test-no-such-program");
    assert!(err.message.starts_with("Failed to start"), "{}", err.message);
}
