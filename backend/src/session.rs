//! The running game.
//!
//! One tokio task owns the orchestrator. User intents arrive over an mpsc
//! channel; the one-second tick and the reveal settle delay are polled in the
//! same `select!` loop, so every event is handled in arrival order on a
//! single task. The tick interval exists only between `StartTicking` and
//! `StopTicking`, and the settle deadline only between `ScheduleSettle` and
//! its expiry or `CancelSettle`: dropping them is the cancellation.

use std::pin::Pin;
use std::time::Duration;

use game_core::{
    AudioCue, AudioError, AudioOutput, AudioTrack, Effect, Event, GameConfig, GameView, Intent,
    Orchestrator, Roster,
};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};

const TICK: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    State(GameView),
    Audio(AudioCommand),
    Error { message: String },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AudioCommand {
    pub action: AudioAction,
    pub track: AudioTrack,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudioAction {
    Play,
    Pause,
    Stop,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("game session stopped")]
    Closed,
}

impl<T> From<mpsc::error::SendError<T>> for SessionError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        SessionError::Closed
    }
}

impl From<oneshot::error::RecvError> for SessionError {
    fn from(_: oneshot::error::RecvError) -> Self {
        SessionError::Closed
    }
}

/// Sends audio commands to every connected screen; the browser does the
/// actual playback.
pub struct BroadcastAudio {
    tx: broadcast::Sender<ServerMessage>,
}

impl BroadcastAudio {
    fn send(&self, action: AudioAction, track: &AudioTrack) -> Result<(), AudioError> {
        self.tx
            .send(ServerMessage::Audio(AudioCommand {
                action,
                track: track.clone(),
            }))
            .map(|_| ())
            .map_err(|_| AudioError::Unavailable)
    }
}

impl AudioOutput for BroadcastAudio {
    fn play(&mut self, track: &AudioTrack) -> Result<(), AudioError> {
        self.send(AudioAction::Play, track)
    }

    fn pause(&mut self, track: &AudioTrack) -> Result<(), AudioError> {
        self.send(AudioAction::Pause, track)
    }

    fn stop(&mut self, track: &AudioTrack) -> Result<(), AudioError> {
        self.send(AudioAction::Stop, track)
    }
}

enum Command {
    Event(Event, oneshot::Sender<GameView>),
    Snapshot(oneshot::Sender<GameView>),
}

#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<ServerMessage>,
    track: AudioTrack,
}

impl SessionHandle {
    pub fn spawn(roster: Roster, rng: ChaCha8Rng, config: GameConfig, track: AudioTrack) -> Self {
        let (commands, rx) = mpsc::channel(32);
        let (events, _) = broadcast::channel(64);
        let session = Session {
            orchestrator: Orchestrator::new(roster, rng, config),
            audio: AudioCue::new(track.clone(), BroadcastAudio { tx: events.clone() }),
            events: events.clone(),
            ticker: None,
            settle: None,
        };
        tokio::spawn(session.run(rx));
        Self {
            commands,
            events,
            track,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Result<GameView, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands.send(Command::Snapshot(reply)).await?;
        Ok(rx.await?)
    }

    /// What a screen joining mid-game needs: the current state, then the
    /// music if it is supposed to be playing.
    pub async fn catch_up(&self) -> Result<Vec<ServerMessage>, SessionError> {
        let view = self.snapshot().await?;
        let playing = view.audio_playing;
        let mut messages = vec![ServerMessage::State(view)];
        if playing {
            messages.push(ServerMessage::Audio(AudioCommand {
                action: AudioAction::Play,
                track: self.track.clone(),
            }));
        }
        Ok(messages)
    }

    pub async fn intent(&self, intent: Intent) -> Result<GameView, SessionError> {
        self.send(Event::from(intent)).await
    }

    pub async fn reset_game(&self) -> Result<GameView, SessionError> {
        self.send(Event::ResetGame).await
    }

    pub async fn replace_roster(&self, roster: Roster) -> Result<GameView, SessionError> {
        self.send(Event::ReplaceParticipants(roster)).await
    }

    async fn send(&self, event: Event) -> Result<GameView, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands.send(Command::Event(event, reply)).await?;
        Ok(rx.await?)
    }
}

struct Session {
    orchestrator: Orchestrator<ChaCha8Rng>,
    audio: AudioCue<BroadcastAudio>,
    events: broadcast::Sender<ServerMessage>,
    ticker: Option<Interval>,
    settle: Option<Pin<Box<Sleep>>>,
}

impl Session {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Event(event, reply)) => {
                        let view = self.dispatch(event);
                        let _ = reply.send(view);
                    }
                    Some(Command::Snapshot(reply)) => {
                        let _ = reply.send(self.orchestrator.view());
                    }
                    None => break,
                },
                _ = next_tick(&mut self.ticker), if self.ticker.is_some() => {
                    self.dispatch(Event::Tick);
                }
                _ = settle_elapsed(&mut self.settle), if self.settle.is_some() => {
                    self.settle = None;
                    self.dispatch(Event::SettleElapsed);
                }
            }
        }
        tracing::info!("game session stopped");
        // Dropping `self` releases the ticker and stops the music.
    }

    fn dispatch(&mut self, event: Event) -> GameView {
        let effects = self.orchestrator.handle(event);
        for effect in effects {
            self.apply(effect);
        }
        let view = self.orchestrator.view();
        let _ = self.events.send(ServerMessage::State(view.clone()));
        view
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ScheduleSettle(delay) => {
                self.settle = Some(Box::pin(tokio::time::sleep(delay)));
            }
            Effect::CancelSettle => self.settle = None,
            Effect::StartTicking => {
                let mut ticker = tokio::time::interval_at(Instant::now() + TICK, TICK);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
            }
            Effect::StopTicking => self.ticker = None,
            Effect::PlayAudio => self.audio.play(),
            Effect::StopAudio => self.audio.stop(),
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn settle_elapsed(settle: &mut Option<Pin<Box<Sleep>>>) {
    match settle {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}
