pub mod emitter;
pub mod lines;
pub mod progress;
pub mod wrap;

pub use emitter::{emit_cues, planned_cue_count, EmittedCaptions, MIN_CUE_DURATION};
pub use lines::{group_words, CaptionLine};
pub use progress::{NoProgress, ProgressEvent, ProgressSink, StdoutProgress};
pub use wrap::wrap_text;
