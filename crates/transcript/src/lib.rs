mod reconstruct;
mod registry;
mod speaker;

pub use reconstruct::{DiarizedTranscript, TranscriptSegment, reconstruct, reconstruct_with};
pub use registry::SpeakerRegistry;
pub use speaker::{SPEAKER_COLORS, Speaker, SpeakerMap};
