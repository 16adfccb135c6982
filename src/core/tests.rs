use super::*;

#[test]
fn test_session_state_transition() {
    use SessionState::*;

    // valid
    assert!(SessionState::is_valid_transition(Idle, StrategySelected));
    assert!(SessionState::is_valid_transition(StrategySelected, SingleInFlight));
    assert!(SessionState::is_valid_transition(SingleInFlight, Done));
    assert!(SessionState::is_valid_transition(StrategySelected, MultipartInitiated));
    assert!(SessionState::is_valid_transition(MultipartInitiated, PartsAuthorized));
    assert!(SessionState::is_valid_transition(PartsAuthorized, PartsUploading));
    assert!(SessionState::is_valid_transition(PartsUploading, Completing));
    assert!(SessionState::is_valid_transition(Completing, Done));
    assert!(SessionState::is_valid_transition(PartsUploading, Aborting));
    assert!(SessionState::is_valid_transition(Completing, Aborting));
    assert!(SessionState::is_valid_transition(Aborting, Failed));
    assert!(SessionState::is_valid_transition(Aborting, Aborted));
    assert!(SessionState::is_valid_transition(Idle, Failed));
    assert!(SessionState::is_valid_transition(SingleInFlight, Failed));

    // invalid
    assert!(!SessionState::is_valid_transition(SingleInFlight, Aborting));
    assert!(!SessionState::is_valid_transition(PartsUploading, Done));
    assert!(!SessionState::is_valid_transition(Done, Failed));
    assert!(!SessionState::is_valid_transition(Failed, Idle));
    assert!(!SessionState::is_valid_transition(Aborted, StrategySelected));
    assert!(!SessionState::is_valid_transition(MultipartInitiated, Aborted));
}

#[test]
fn test_session_id_generation() {
    let id1 = SessionId::new();
    let id2 = SessionId::new();

    assert_ne!(id1, id2);
    assert_eq!(id1, id1);
    assert!(!id1.to_string().is_empty());
}

#[test]
fn test_key_is_assigned_once() {
    let mut session = UploadSession::new();
    let target = MultipartTarget {
        upload_id: "upload-1".to_string(),
        key: "certificates/a.png".to_string(),
    };

    session.assign_target(&target).unwrap();
    assert!(session.assign_key("certificates/a.png").is_ok());
    assert!(session.assign_key("certificates/b.png").is_err());
    let other = MultipartTarget {
        upload_id: "upload-2".to_string(),
        key: target.key.clone(),
    };
    assert!(session.assign_target(&other).is_err());
    assert_eq!(session.target(), Some(target));
    assert_eq!(session.key(), Some("certificates/a.png"));
    assert_eq!(session.upload_id(), Some("upload-1"));
}

#[test]
fn test_completed_parts_sorted_and_complete() {
    let mut session = UploadSession::new();
    session.set_parts(vec![
        PartTask::new(3, ByteRange::new(10, 12), "u3".to_string()),
        PartTask::new(1, ByteRange::new(0, 5), "u1".to_string()),
        PartTask::new(2, ByteRange::new(5, 10), "u2".to_string()),
    ]);

    assert_eq!(session.parts().len(), 3);
    session.record_receipt(2, "\"b\"".to_string());
    session.record_receipt(3, "\"c\"".to_string());
    assert!(session.completed_parts().is_none());

    session.record_receipt(1, "\"a\"".to_string());
    let parts = session.completed_parts().unwrap();
    let numbers: Vec<u32> = parts.iter().map(|part| part.part_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(parts[0].e_tag, "\"a\"");
}

#[test]
fn test_terminal_session_rejects_transitions() {
    let mut session = UploadSession::new();
    session.select_mode(TransportMode::Single).unwrap();
    assert_eq!(session.mode(), Some(TransportMode::Single));
    session.transition(SessionState::SingleInFlight).unwrap();
    session.transition(SessionState::Done).unwrap();

    assert!(session.transition(SessionState::Failed).is_err());
    let report = session.report();
    assert_eq!(report.state, SessionState::Done);
    assert!(report.elapsed().is_some());
}
