use std::time::Duration;

use kobzar::domain::{AudioFile, AudioTask, TaskError, TaskState, Transcript};

fn task_with_audio(filename: &str) -> AudioTask {
    AudioTask::new("test task", Some(AudioFile::new(&b"audio bytes"[..], filename)))
}

#[test]
fn given_draft_with_valid_audio_when_enqueuing_then_task_is_pending() {
    let mut task = task_with_audio("recording.mp3");
    task.enqueue().unwrap();
    assert_eq!(task.state, TaskState::Pending);
}

#[test]
fn given_no_audio_when_enqueuing_then_validation_fails_without_mutation() {
    let mut task = AudioTask::new("test task", None);
    let err = task.enqueue().unwrap_err();
    assert!(matches!(err, TaskError::MissingAudio));
    assert_eq!(task.state, TaskState::Draft);
}

#[test]
fn given_empty_audio_when_enqueuing_then_validation_fails() {
    let mut task = AudioTask::new("test task", Some(AudioFile::new(&b""[..], "a.mp3")));
    assert!(matches!(task.enqueue(), Err(TaskError::MissingAudio)));
}

#[test]
fn given_unsupported_extension_when_enqueuing_then_error_lists_supported_formats() {
    let mut task = task_with_audio("notes.txt");
    let err = task.enqueue().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("mp3, wav, m4a, ogg, flac"), "{}", message);
    assert_eq!(task.state, TaskState::Draft);
}

#[test]
fn given_uppercase_extension_when_enqueuing_then_it_is_accepted() {
    let mut task = task_with_audio("RECORDING.MP3");
    task.enqueue().unwrap();
    assert_eq!(task.state, TaskState::Pending);
}

#[test]
fn given_pending_task_when_cancelling_then_task_returns_to_draft() {
    let mut task = task_with_audio("a.wav");
    task.enqueue().unwrap();
    assert!(task.cancel());
    assert_eq!(task.state, TaskState::Draft);
}

#[test]
fn given_draft_task_when_cancelling_then_nothing_happens() {
    let mut task = task_with_audio("a.wav");
    assert!(!task.cancel());
    assert_eq!(task.state, TaskState::Draft);
}

#[test]
fn given_pending_task_when_claiming_then_task_is_transcribing() {
    let mut task = task_with_audio("a.flac");
    task.enqueue().unwrap();
    assert!(task.start_transcribing());
    assert_eq!(task.state, TaskState::Transcribing);
}

#[test]
fn given_non_pending_task_when_claiming_then_claim_is_refused() {
    let mut task = task_with_audio("a.flac");
    assert!(!task.start_transcribing());
    assert_eq!(task.state, TaskState::Draft);
}

#[test]
fn given_transcribing_task_when_completing_then_result_present_and_error_absent() {
    let mut task = task_with_audio("a.m4a");
    task.enqueue().unwrap();
    task.start_transcribing();

    let transcript = Transcript::new("hello".to_string(), task.id, Duration::from_secs(2));
    task.complete(transcript);

    assert_eq!(task.state, TaskState::Done);
    assert!(task.transcript.is_some());
    assert!(task.error_message.is_none());
}

#[test]
fn given_transcribing_task_when_failing_then_error_present_and_result_absent() {
    let mut task = task_with_audio("a.ogg");
    task.enqueue().unwrap();
    task.start_transcribing();
    task.fail("provider unavailable");

    assert_eq!(task.state, TaskState::Error);
    assert_eq!(task.error_message.as_deref(), Some("provider unavailable"));
    assert!(task.transcript.is_none());
}

#[test]
fn given_done_task_when_resetting_then_outcome_is_cleared_and_reset_is_idempotent() {
    let mut task = task_with_audio("a.mp3");
    task.enqueue().unwrap();
    task.start_transcribing();
    task.complete(Transcript::new(
        "text".to_string(),
        task.id,
        Duration::from_secs(1),
    ));

    task.reset();
    assert_eq!(task.state, TaskState::Draft);
    assert!(task.transcript.is_none());
    assert!(task.error_message.is_none());

    task.reset();
    assert_eq!(task.state, TaskState::Draft);
    assert!(task.transcript.is_none());
}

#[test]
fn given_failed_task_when_re_enqueuing_then_error_is_cleared() {
    let mut task = task_with_audio("a.mp3");
    task.enqueue().unwrap();
    task.start_transcribing();
    task.fail("timeout");

    task.enqueue().unwrap();
    assert_eq!(task.state, TaskState::Pending);
    assert!(task.error_message.is_none());
}

#[test]
fn given_pending_task_when_enqueuing_again_then_it_is_rejected() {
    let mut task = task_with_audio("a.mp3");
    task.enqueue().unwrap();
    assert!(matches!(
        task.enqueue(),
        Err(TaskError::NotEnqueueable { .. })
    ));
    assert_eq!(task.state, TaskState::Pending);
}

#[test]
fn given_transcript_when_building_then_result_filename_derives_from_task_id() {
    let task = task_with_audio("a.mp3");
    let transcript = Transcript::new("text".to_string(), task.id, Duration::from_secs(1));
    assert_eq!(
        transcript.result_filename,
        format!("transcription_{}.txt", task.id)
    );
}
