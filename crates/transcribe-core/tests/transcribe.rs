use std::time::Duration;

use bytes::Bytes;
use notula_audio_chunk::{PcmSpec, wav};
use notula_speech_client::Error as RecognizeError;
use serde_json::json;
use transcribe_core::{
    AudioFormat, ChunkPolicy, DiarizationOptions, Error, NO_SPEECH_MESSAGE, PollPolicy,
    RetryPolicy, TranscodeFuture, Transcoder, TranscribeOptions, Transcriber, TranscriptionStatus,
    format_user_friendly_error,
};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transcriber_for(server: &MockServer) -> Transcriber {
    Transcriber::builder()
        .api_base(server.uri())
        .api_key("test-key")
        .retry(RetryPolicy {
            num_retries: 0,
            max_delay_secs: 1,
        })
        .poll(PollPolicy {
            interval: Duration::from_millis(10),
            max_attempts: 5,
        })
        .build()
}

fn quick_options() -> TranscribeOptions {
    TranscribeOptions {
        inter_chunk_delay: Duration::ZERO,
        ..Default::default()
    }
}

fn second_chunks() -> ChunkPolicy {
    ChunkPolicy {
        chunk_seconds: 1,
        compressed_bytes_per_sec: 1000,
    }
}

fn pcm_wav(seconds: u32, sample_rate: u32) -> Bytes {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..(seconds * sample_rate) {
            writer.write_sample((i % 2000) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    Bytes::from(cursor.into_inner())
}

fn mp3_bytes(len: usize) -> Bytes {
    let mut data = vec![0xFF, 0xFB, 0x90, 0x00];
    data.resize(len, 0x55);
    Bytes::from(data)
}

fn text_response(transcript: &str) -> serde_json::Value {
    json!({
        "results": [
            { "alternatives": [ { "transcript": transcript, "confidence": 0.92 } ] }
        ]
    })
}

fn diarized_response(words: &[(&str, i32)]) -> serde_json::Value {
    let transcript = words.iter().map(|(w, _)| *w).collect::<Vec<_>>().join(" ");
    let word_objs: Vec<_> = words
        .iter()
        .map(|(w, tag)| json!({ "word": w, "speakerTag": tag }))
        .collect();

    json!({
        "results": [
            {
                "alternatives": [
                    { "transcript": transcript, "confidence": 0.9, "words": word_objs }
                ]
            }
        ]
    })
}

#[tokio::test]
async fn short_wav_transcribes_as_one_complete_chunk() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "config": { "encoding": "LINEAR16", "sampleRateHertz": 16000 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("short meeting recap")))
        .expect(1)
        .mount(&server)
        .await;

    let result = transcriber_for(&server)
        .transcribe(pcm_wav(30, 16000), &quick_options())
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Complete);
    assert_eq!(result.text, "[00:00] short meeting recap");
    assert!(result.errors.is_empty());
    assert!(result.speakers.is_empty());
}

#[tokio::test]
async fn diarized_wav_reports_the_speaker_roster() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .and(body_partial_json(json!({
            "config": {
                "diarizationConfig": { "enableSpeakerDiarization": true, "minSpeakerCount": 2 },
                "enableWordTimeOffsets": true
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(diarized_response(&[
            ("good", 3),
            ("morning", 3),
            ("team", 3),
            ("hello", 1),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let options = TranscribeOptions {
        diarization: Some(DiarizationOptions {
            min_speakers: Some(2),
            max_speakers: None,
        }),
        ..quick_options()
    };

    let result = transcriber_for(&server)
        .transcribe(pcm_wav(5, 16000), &options)
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Complete);
    // Tag set {1, 3} numbers tag 1 first, so the opening voice renders as 2.
    assert_eq!(
        result.text,
        "[00:00]\nSpeaker 2: good morning team\nSpeaker 1: hello"
    );
    let ids: Vec<&str> = result.speakers.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn long_pcm_is_chunked_with_running_timestamps() {
    let server = MockServer::start().await;

    for text in ["first part", "second part", "third part"] {
        Mock::given(method("POST"))
            .and(path("/v1/speech:recognize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response(text)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }

    let options = TranscribeOptions {
        chunking: second_chunks(),
        ..quick_options()
    };

    let result = transcriber_for(&server)
        .transcribe(pcm_wav(3, 8000), &options)
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Complete);
    assert_eq!(
        result.text,
        "[00:00] first part\n\n[00:01] second part\n\n[00:02] third part"
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn webm_audio_is_declared_as_ogg_opus() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .and(body_partial_json(json!({
            "config": { "encoding": "OGG_OPUS", "sampleRateHertz": 48000 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("from the browser")))
        .expect(1)
        .mount(&server)
        .await;

    let mut webm = vec![0x1A, 0x45, 0xDF, 0xA3];
    webm.resize(600, 0);

    let result = transcriber_for(&server)
        .transcribe(Bytes::from(webm), &quick_options())
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Complete);
    assert_eq!(result.text, "[00:00] from the browser");
}

#[tokio::test]
async fn failing_chunk_yields_a_partial_transcript() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("the good half")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // Everything after the first chunk fails on every strategy.
    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
        .mount(&server)
        .await;

    let options = TranscribeOptions {
        chunking: second_chunks(),
        ..quick_options()
    };

    let result = transcriber_for(&server)
        .transcribe(mp3_bytes(2000), &options)
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Partial);
    assert_eq!(result.text, "[00:00] the good half");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].index, 1);
    assert!(result.errors[0].message.contains("503"));
}

#[tokio::test]
async fn all_chunks_failing_is_a_failed_run() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = transcriber_for(&server)
        .transcribe(pcm_wav(2, 16000), &quick_options())
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Failed);
    assert_eq!(result.text, "");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].index, 0);
}

#[tokio::test]
async fn silent_audio_reports_no_speech() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let result = transcriber_for(&server)
        .transcribe(pcm_wav(2, 16000), &quick_options())
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Complete);
    assert_eq!(result.text, NO_SPEECH_MESSAGE);
    assert!(result.errors.is_empty());
    assert!(result.speakers.is_empty());
}

#[tokio::test]
async fn silent_chunks_are_skipped_not_failed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("after the silence")))
        .mount(&server)
        .await;

    let options = TranscribeOptions {
        chunking: second_chunks(),
        ..quick_options()
    };

    let result = transcriber_for(&server)
        .transcribe(pcm_wav(2, 8000), &options)
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Complete);
    assert_eq!(result.text, "[00:01] after the silence");
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn bad_credentials_abort_the_run() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": 401, "message": "API key not valid", "status": "UNAUTHENTICATED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = transcriber_for(&server)
        .transcribe(pcm_wav(1, 16000), &quick_options())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Recognize(RecognizeError::Auth(_))));
    assert!(format_user_friendly_error(&err).contains("API key"));
}

#[tokio::test]
async fn empty_audio_is_rejected_up_front() {
    let server = MockServer::start().await;

    let err = transcriber_for(&server)
        .transcribe(Bytes::new(), &quick_options())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::EmptyAudio));
}

#[tokio::test]
async fn diarized_run_falls_back_to_the_async_job() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(500).set_body_string("sync path down"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/speech:longrunningrecognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "op-77" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/operations/op-77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "op-77",
            "done": true,
            "response": {
                "results": [
                    {
                        "alternatives": [
                            {
                                "transcript": "finally done",
                                "words": [
                                    { "word": "finally", "speakerTag": 1 },
                                    { "word": "done", "speakerTag": 1 }
                                ]
                            }
                        ]
                    }
                ]
            }
        })))
        .mount(&server)
        .await;

    let options = TranscribeOptions {
        diarization: Some(DiarizationOptions::default()),
        ..quick_options()
    };

    let result = transcriber_for(&server)
        .transcribe(pcm_wav(1, 16000), &options)
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Complete);
    assert_eq!(result.text, "[00:00]\nSpeaker 1: finally done");
    assert_eq!(result.speakers.len(), 1);
}

#[tokio::test]
async fn speaker_ids_stay_stable_across_chunks() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(diarized_response(&[("hi", 4), ("all", 7)])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(diarized_response(&[("bye", 7)])))
        .mount(&server)
        .await;

    let options = TranscribeOptions {
        diarization: Some(DiarizationOptions::default()),
        speaker_context: Some(Duration::from_secs(300)),
        chunking: second_chunks(),
        ..quick_options()
    };

    let result = transcriber_for(&server)
        .transcribe(pcm_wav(2, 8000), &options)
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Complete);
    // Tag 7 was numbered 2 in the first chunk and keeps that ID when it
    // speaks alone in the second.
    assert_eq!(
        result.text,
        "[00:00]\nSpeaker 1: hi\nSpeaker 2: all\n\n[00:01]\nSpeaker 2: bye"
    );
    let ids: Vec<&str> = result.speakers.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn transcoded_audio_goes_out_as_linear16() {
    struct PcmFake;

    impl Transcoder for PcmFake {
        fn supports(&self, format: AudioFormat) -> bool {
            format == AudioFormat::Mp3
        }

        fn to_linear16<'a>(
            &'a self,
            _audio: &'a [u8],
            _format: AudioFormat,
            target_rate: u32,
        ) -> TranscodeFuture<'a> {
            Box::pin(async move {
                let spec = PcmSpec {
                    sample_rate: target_rate,
                    channels: 1,
                    bits_per_sample: 16,
                };
                let data = vec![0u8; target_rate as usize * 2 * 2];
                Ok(wav::with_header(spec, &data))
            })
        }
    }

    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .and(body_partial_json(json!({
            "config": { "encoding": "LINEAR16", "sampleRateHertz": 16000 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("converted fine")))
        .mount(&server)
        .await;

    let transcriber = Transcriber::builder()
        .api_base(server.uri())
        .api_key("test-key")
        .retry(RetryPolicy {
            num_retries: 0,
            max_delay_secs: 1,
        })
        .transcoder(PcmFake)
        .build();

    let options = TranscribeOptions {
        chunking: ChunkPolicy {
            chunk_seconds: 1,
            compressed_bytes_per_sec: 1000,
        },
        ..quick_options()
    };

    // 5000 compressed bytes is five chunk budgets, so the pipeline asks the
    // transcoder for PCM; the two-second WAV it returns splits exactly.
    let result = transcriber
        .transcribe(mp3_bytes(5000), &options)
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Complete);
    assert_eq!(
        result.text,
        "[00:00] converted fine\n\n[00:01] converted fine"
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn transcode_failure_fails_the_run_without_calling_the_provider() {
    struct Broken;

    impl Transcoder for Broken {
        fn supports(&self, _format: AudioFormat) -> bool {
            true
        }

        fn to_linear16<'a>(
            &'a self,
            _audio: &'a [u8],
            format: AudioFormat,
            _target_rate: u32,
        ) -> TranscodeFuture<'a> {
            Box::pin(async move { Err(Error::Transcode(format!("decoder crashed on {format}"))) })
        }
    }

    let server = MockServer::start().await;

    let transcriber = Transcriber::builder()
        .api_base(server.uri())
        .api_key("test-key")
        .transcoder(Broken)
        .build();

    let options = TranscribeOptions {
        diarization: Some(DiarizationOptions::default()),
        ..quick_options()
    };

    let result = transcriber
        .transcribe(mp3_bytes(100), &options)
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptionStatus::Failed);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].index, 0);
    assert!(result.errors[0].message.contains("decoder crashed"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
