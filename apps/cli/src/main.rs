use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use notula_transcribe_core::{
    DiarizationOptions, TranscribeOptions, Transcriber, TranscriptionStatus,
    format_user_friendly_error,
};

#[derive(Parser)]
#[command(name = "notula", about = "Transcribe an audio file")]
struct Cli {
    /// Audio file to transcribe (wav, mp3, ogg/opus, flac, webm)
    audio: PathBuf,

    #[arg(long, env = "GOOGLE_SPEECH_API_KEY", default_value = "")]
    api_key: String,

    #[arg(long, default_value = "en-US")]
    language: String,

    #[arg(long)]
    model: Option<String>,

    /// Attribute the transcript to numbered speakers
    #[arg(long)]
    diarize: bool,

    #[arg(long, requires = "diarize")]
    min_speakers: Option<u32>,

    #[arg(long, requires = "diarize")]
    max_speakers: Option<u32>,

    /// Amplify quiet PCM audio before sending it
    #[arg(long)]
    boost: bool,

    /// Declare LINEAR16 to the provider regardless of the sniffed format
    #[arg(long)]
    force_linear16: bool,

    /// Print the full result as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn to_options(&self) -> TranscribeOptions {
        let mut options = TranscribeOptions {
            language_code: self.language.clone(),
            diarization: self.diarize.then(|| DiarizationOptions {
                min_speakers: self.min_speakers,
                max_speakers: self.max_speakers,
            }),
            boost_audio: self.boost,
            force_linear16: self.force_linear16,
            filename_hint: self
                .audio
                .file_name()
                .and_then(|n| n.to_str())
                .map(String::from),
            ..Default::default()
        };

        if let Some(model) = &self.model {
            options.model = Some(model.clone());
        }

        options
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(TranscriptionStatus::Failed) => {
            eprintln!("Transcription failed.");
            std::process::exit(1);
        }
        Ok(_) => {}
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<TranscriptionStatus> {
    let audio = read_audio(&cli.audio)?;
    let options = cli.to_options();

    let transcriber = Transcriber::builder().api_key(cli.api_key.clone()).build();

    let result = transcriber.transcribe(audio, &options).await.map_err(|err| {
        let friendly = format_user_friendly_error(&err);
        anyhow::Error::new(err).context(friendly)
    })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if !result.speakers.is_empty() {
            let roster: Vec<&str> = result.speakers.iter().map(|s| s.label.as_str()).collect();
            println!("Speakers: {}", roster.join(", "));
            println!();
        }
        println!("{}", result.text);
    }

    for failure in &result.errors {
        eprintln!("warning: chunk {} failed: {}", failure.index + 1, failure.message);
    }

    Ok(result.status)
}

fn read_audio(path: &Path) -> anyhow::Result<Bytes> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Bytes::from(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_map_onto_pipeline_options() {
        let cli = Cli::try_parse_from([
            "notula",
            "take.mp3",
            "--api-key",
            "k",
            "--language",
            "de-DE",
            "--diarize",
            "--min-speakers",
            "2",
            "--boost",
        ])
        .unwrap();

        let options = cli.to_options();
        assert_eq!(options.language_code, "de-DE");
        assert!(options.boost_audio);
        assert!(!options.force_linear16);
        assert_eq!(options.filename_hint.as_deref(), Some("take.mp3"));
        let diarization = options.diarization.unwrap();
        assert_eq!(diarization.min_speakers, Some(2));
        assert_eq!(diarization.max_speakers, None);
    }

    #[test]
    fn speaker_bounds_require_diarization() {
        let parsed = Cli::try_parse_from(["notula", "take.wav", "--min-speakers", "2"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn reads_the_audio_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"RIFFxxxxWAVE").unwrap();

        let bytes = read_audio(file.path()).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");

        assert!(read_audio(Path::new("/definitely/missing.wav")).is_err());
    }
}
