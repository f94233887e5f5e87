// tests/api_shapes.rs

use serde_json::json;

use bashq::api::{
    parse_command_id, ErrorResponse, ForceStartResponse, MessageResponse, SubmitRequest,
    SubmitResponse,
};
use bashq::engine::{ForceStart, SubmitStatus, Submission};
use bashq::errors::BashqError;
use bashq::types::CommandStatus;

#[test]
fn submit_response_json() {
    let queued = SubmitResponse::from(Submission {
        status: SubmitStatus::Queued,
        id: 7,
    });
    assert_eq!(
        serde_json::to_value(&queued).unwrap(),
        json!({"status": "queued", "id": 7, "message": "Command is being queued"})
    );

    let executing = SubmitResponse::from(Submission {
        status: SubmitStatus::Executing,
        id: 8,
    });
    assert_eq!(executing.message, "Command is being executed");
}

#[test]
fn submit_request_accepts_script_field() {
    let req: SubmitRequest = serde_json::from_str(r#"{"script": "ls -la"}"#).unwrap();
    assert_eq!(req.script, "ls -la");
}

#[test]
fn force_start_response_messages() {
    let started = ForceStartResponse::new(3, ForceStart::Started(3));
    assert!(started.started);
    assert_eq!(started.status, CommandStatus::Running);

    let noop = ForceStartResponse::new(3, ForceStart::AlreadyInState(CommandStatus::Completed));
    assert!(!noop.started);
    assert_eq!(noop.message, "Command is already completed");
    assert_eq!(
        serde_json::to_value(&noop).unwrap()["status"],
        json!("completed")
    );
}

#[test]
fn error_response_maps_status_codes() {
    let validation = ErrorResponse::from(&BashqError::Validation("script is required".into()));
    assert_eq!(validation.status_code, 400);
    assert!(validation.error.contains("script is required"));

    let missing = ErrorResponse::from(&BashqError::NotFound(9));
    assert_eq!(missing.status_code, 404);

    let not_started = ErrorResponse::from(&BashqError::NotStarted(9));
    assert_eq!(not_started.status_code, 404);

    let internal = ErrorResponse::from(&BashqError::Store("lock poisoned".into()));
    assert_eq!(internal.status_code, 500);
    assert_eq!(internal.error, "internal error");
    assert_eq!(
        serde_json::to_value(&internal).unwrap(),
        json!({"error": "internal error"})
    );
}

#[test]
fn message_response_json() {
    let msg = MessageResponse::new("Command stopped");
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({"message": "Command stopped"})
    );
}

#[test]
fn command_ids_must_be_positive_integers() {
    assert_eq!(parse_command_id("12").unwrap(), 12);
    assert_eq!(parse_command_id(" 3 ").unwrap(), 3);
    for raw in ["0", "-1", "abc", ""] {
        let err = parse_command_id(raw).unwrap_err();
        assert_eq!(err.status_code(), 400, "{raw:?}");
    }
}
