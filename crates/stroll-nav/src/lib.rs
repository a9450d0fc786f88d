pub mod doctor;
pub mod feed;
pub mod gnss;
pub mod phrases;
pub mod reroute;
pub mod scheduler;
pub mod session;
pub mod speech;

pub use feed::PositionFeed;
pub use gnss::{spawn_gnss, GnssSource, NmeaParser};
pub use phrases::Language;
pub use reroute::OffRouteGuard;
pub use scheduler::{
    reset_voice_state, time_to_maneuver, ManeuverId, NavigationScheduler, Prompt, SchedulerState, Stage,
    StepContext, Thresholds, VoiceFlags,
};
pub use session::{NavSession, SessionConfig, SessionState};
pub use speech::{
    run_speech_worker, ChannelSpeech, ConsoleVoice, MutedSpeech, RecordingSpeech, SpeechSink, Utterance,
    UtteranceQueue, UtteranceState, Voice,
};
