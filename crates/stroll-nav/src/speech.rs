//! Handing lines to a voice without blocking the position path.
//!
//! The navigation side only sees [`SpeechSink::speak`], which must return
//! immediately. Playback happens in [`run_speech_worker`], which keeps an
//! [`UtteranceQueue`] with one record per line so identical lines are not
//! queued twice while the first is still waiting or playing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Fire-and-forget speech output.
pub trait SpeechSink {
    fn speak(&self, text: &str);
}

/// Speech disabled: lines are only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutedSpeech;

impl SpeechSink for MutedSpeech {
    fn speak(&self, text: &str) {
        debug!("speech (muted): {}", text);
    }
}

/// Keeps every line; for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeech {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeech {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl SpeechSink for RecordingSpeech {
    fn speak(&self, text: &str) {
        if let Ok(mut l) = self.lines.lock() {
            l.push(text.to_string());
        }
    }
}

/// Sends lines to a [`run_speech_worker`] task.
#[derive(Debug, Clone)]
pub struct ChannelSpeech {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSpeech {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SpeechSink for ChannelSpeech {
    fn speak(&self, text: &str) {
        if self.tx.send(text.to_string()).is_err() {
            warn!("speech: worker gone, dropping \"{}\"", text);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceState {
    Pending,
    Speaking,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub state: UtteranceState,
}

const LOG_LEN: usize = 5;

/// Utterance records, oldest first.
#[derive(Debug, Default)]
pub struct UtteranceQueue {
    next_id: u64,
    live: VecDeque<Utterance>,
    log: VecDeque<String>,
}

impl UtteranceQueue {
    /// Queue `text` unless the same text is already pending or speaking.
    pub fn offer(&mut self, text: String) -> Option<u64> {
        if self.live.iter().any(|u| u.text == text) {
            debug!("speech: \"{}\" already in flight", text);
            return None;
        }
        self.next_id += 1;
        self.log.push_front(text.clone());
        self.log.truncate(LOG_LEN);
        self.live.push_back(Utterance { id: self.next_id, text, state: UtteranceState::Pending });
        Some(self.next_id)
    }

    /// Move the oldest pending utterance to speaking, unless something is
    /// already speaking.
    pub fn start_next(&mut self) -> Option<Utterance> {
        if self.is_speaking() {
            return None;
        }
        let u = self.live.iter_mut().find(|u| u.state == UtteranceState::Pending)?;
        u.state = UtteranceState::Speaking;
        Some(u.clone())
    }

    /// Mark `id` done and drop it from the live set.
    pub fn finish(&mut self, id: u64) -> Option<Utterance> {
        let pos = self.live.iter().position(|u| u.id == id)?;
        let mut u = self.live.remove(pos)?;
        u.state = UtteranceState::Done;
        Some(u)
    }

    pub fn is_speaking(&self) -> bool {
        self.live.iter().any(|u| u.state == UtteranceState::Speaking)
    }

    pub fn pending(&self) -> usize {
        self.live.iter().filter(|u| u.state == UtteranceState::Pending).count()
    }

    /// Most recent lines first, at most five.
    pub fn recent(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }
}

/// Something that can say a line out loud.
pub trait Voice: Send + 'static {
    /// Start playing `text`; returns how long playback takes.
    fn start(&mut self, text: &str) -> Duration;
}

/// Prints lines to stdout and paces them at a speaking rate.
#[derive(Debug, Clone)]
pub struct ConsoleVoice {
    pub secs_per_word: f64,
}

impl Default for ConsoleVoice {
    fn default() -> Self {
        Self { secs_per_word: 0.35 }
    }
}

impl Voice for ConsoleVoice {
    fn start(&mut self, text: &str) -> Duration {
        println!("[voice] {}", text);
        let words = text.split_whitespace().count().max(1);
        Duration::from_secs_f64(words as f64 * self.secs_per_word)
    }
}

/// Plays queued lines one at a time until every [`ChannelSpeech`] is dropped
/// and the queue has drained.
pub async fn run_speech_worker<V: Voice>(mut rx: mpsc::UnboundedReceiver<String>, mut voice: V) -> UtteranceQueue {
    let mut queue = UtteranceQueue::default();
    let mut open = true;
    let mut playing: Option<(u64, tokio::time::Instant)> = None;

    loop {
        if playing.is_none() {
            if let Some(u) = queue.start_next() {
                info!("speech: \"{}\"", u.text);
                let dur = voice.start(&u.text);
                playing = Some((u.id, tokio::time::Instant::now() + dur));
            } else if !open {
                break;
            }
        }

        let deadline = playing.map(|(_, at)| at);
        tokio::select! {
            msg = rx.recv(), if open => match msg {
                Some(text) => { queue.offer(text); }
                None => open = false,
            },
            _ = sleep_until_opt(deadline), if deadline.is_some() => {
                if let Some((id, _)) = playing.take() {
                    queue.finish(id);
                }
            }
        }
    }
    queue
}

async fn sleep_until_opt(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
