use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::engine::{PickerError, SelectionEngine};
use crate::roster::Roster;
use crate::timer::{Countdown, Tick};
use crate::view::{GameView, PhaseTag, Prompt, TimerKind, TimerView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Spinning { target: String },
    Revealed { target: String },
    Waiting { target: String },
    Countdown { target: String },
    Modal { target: String },
}

impl Phase {
    pub fn tag(&self) -> PhaseTag {
        match self {
            Phase::Idle => PhaseTag::Idle,
            Phase::Spinning { .. } => PhaseTag::Spinning,
            Phase::Revealed { .. } => PhaseTag::Revealed,
            Phase::Waiting { .. } => PhaseTag::Waiting,
            Phase::Countdown { .. } => PhaseTag::Countdown,
            Phase::Modal { .. } => PhaseTag::Modal,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Phase::Idle => None,
            Phase::Spinning { target }
            | Phase::Revealed { target }
            | Phase::Waiting { target }
            | Phase::Countdown { target }
            | Phase::Modal { target } => Some(target),
        }
    }
}

/// User intent coming from the presentation layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Intent {
    RequestPick,
    AnimationComplete,
    RequestNextPlayer,
    RequestProtectGift,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RequestPick,
    AnimationComplete,
    /// The settle delay scheduled on reveal has elapsed.
    SettleElapsed,
    /// One second has passed on the running timer.
    Tick,
    RequestNextPlayer,
    RequestProtectGift,
    ResetGame,
    ReplaceParticipants(Roster),
}

impl From<Intent> for Event {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::RequestPick => Event::RequestPick,
            Intent::AnimationComplete => Event::AnimationComplete,
            Intent::RequestNextPlayer => Event::RequestNextPlayer,
            Intent::RequestProtectGift => Event::RequestProtectGift,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    ScheduleSettle(Duration),
    CancelSettle,
    /// Deliver [`Event::Tick`] once per second until told to stop.
    StartTicking,
    StopTicking,
    PlayAudio,
    StopAudio,
}

/// Turn flow: idle, spinning, revealed, waiting, countdown, modal, idle.
/// [`Orchestrator::handle`] returns the side effects for the driver to carry
/// out; nothing here sleeps or plays sound.
pub struct Orchestrator<R> {
    phase: Phase,
    engine: SelectionEngine<R>,
    wait: Countdown,
    countdown: Countdown,
    config: GameConfig,
    audio_on: bool,
}

impl<R: Rng> Orchestrator<R> {
    pub fn new(participants: Roster, rng: R, config: GameConfig) -> Self {
        Self {
            phase: Phase::Idle,
            engine: SelectionEngine::new(participants, rng),
            wait: Countdown::new(config.wait_secs),
            countdown: Countdown::new(config.countdown_secs),
            config,
            audio_on: false,
        }
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let from = phase.tag();
        let (next, effects) = self.transition(phase, event);
        if next.tag() != from {
            tracing::debug!(?from, to = ?next.tag(), "phase change");
        }
        self.phase = next;
        for effect in &effects {
            match effect {
                Effect::PlayAudio => self.audio_on = true,
                Effect::StopAudio => self.audio_on = false,
                _ => {}
            }
        }
        effects
    }

    fn transition(&mut self, phase: Phase, event: Event) -> (Phase, Vec<Effect>) {
        match (phase, event) {
            (phase, Event::ResetGame) => {
                let effects = self.teardown(&phase);
                self.engine.reset();
                tracing::info!("game reset");
                (Phase::Idle, effects)
            }
            (phase, Event::ReplaceParticipants(roster)) => {
                let effects = self.teardown(&phase);
                tracing::info!(participants = roster.len(), "new game with updated names");
                self.engine.restart_with(roster);
                (Phase::Idle, effects)
            }

            (Phase::Idle, Event::RequestPick) if !self.engine.is_round_complete() => {
                match self.engine.draw() {
                    Ok(name) => {
                        let target = name.to_string();
                        (Phase::Spinning { target }, Vec::new())
                    }
                    Err(err) => {
                        invariant_violation("draw", &err);
                        (Phase::Idle, Vec::new())
                    }
                }
            }
            (Phase::Idle, Event::RequestNextPlayer) if self.engine.is_round_complete() => {
                self.next_player();
                (Phase::Idle, Vec::new())
            }

            (Phase::Spinning { target }, Event::AnimationComplete) => {
                if let Err(err) = self.engine.confirm() {
                    invariant_violation("confirm", &err);
                }
                (
                    Phase::Revealed { target },
                    vec![Effect::ScheduleSettle(self.config.settle)],
                )
            }

            (Phase::Revealed { target }, Event::SettleElapsed) => {
                self.wait.reset();
                if self.wait.start() {
                    (Phase::Waiting { target }, vec![Effect::StartTicking])
                } else {
                    self.enter_countdown(target, false)
                }
            }

            (Phase::Waiting { target }, Event::Tick) => match self.wait.tick() {
                Tick::Completed => self.enter_countdown(target, true),
                Tick::Running(_) | Tick::Ignored => (Phase::Waiting { target }, Vec::new()),
            },

            (Phase::Countdown { target }, Event::Tick) => match self.countdown.tick() {
                Tick::Completed => (
                    Phase::Modal { target },
                    vec![Effect::StopTicking, Effect::StopAudio],
                ),
                Tick::Running(_) | Tick::Ignored => (Phase::Countdown { target }, Vec::new()),
            },

            (
                phase @ (Phase::Waiting { .. } | Phase::Countdown { .. } | Phase::Modal { .. }),
                Event::RequestNextPlayer,
            ) => {
                let effects = self.teardown(&phase);
                self.next_player();
                (Phase::Idle, effects)
            }

            (Phase::Modal { .. }, Event::RequestProtectGift) if self.engine.can_protect() => {
                self.protect_gift();
                (Phase::Idle, Vec::new())
            }

            (phase, event) => {
                tracing::debug!(phase = ?phase.tag(), ?event, "event ignored");
                (phase, Vec::new())
            }
        }
    }

    /// A zero-length countdown goes straight to the modal without music.
    fn enter_countdown(&mut self, target: String, ticking: bool) -> (Phase, Vec<Effect>) {
        self.countdown.reset();
        if self.countdown.start() {
            let mut effects = Vec::with_capacity(2);
            if !ticking {
                effects.push(Effect::StartTicking);
            }
            effects.push(Effect::PlayAudio);
            (Phase::Countdown { target }, effects)
        } else if ticking {
            (Phase::Modal { target }, vec![Effect::StopTicking])
        } else {
            (Phase::Modal { target }, Vec::new())
        }
    }

    /// Stops whatever the phase being left has running and rewinds both
    /// timers.
    fn teardown(&mut self, phase: &Phase) -> Vec<Effect> {
        self.wait.reset();
        self.countdown.reset();
        match phase {
            Phase::Revealed { .. } => vec![Effect::CancelSettle],
            Phase::Waiting { .. } => vec![Effect::StopTicking],
            Phase::Countdown { .. } => vec![Effect::StopTicking, Effect::StopAudio],
            Phase::Idle | Phase::Spinning { .. } | Phase::Modal { .. } => Vec::new(),
        }
    }

    fn next_player(&mut self) {
        self.wait.reset();
        self.countdown.reset();
        if self.engine.is_game_complete() {
            tracing::info!("every gift protected, starting over");
            self.engine.reset();
        } else if self.engine.is_round_complete() {
            self.advance_round();
        }
    }

    fn protect_gift(&mut self) {
        if self.engine.protect_current() {
            tracing::info!(name = ?self.engine.current(), "gift protected");
        }
        self.wait.reset();
        self.countdown.reset();
        // Counted after the protection above: a single player left does not
        // advance here, the next "next player" does.
        if self.engine.is_round_complete() && self.engine.unprotected_count() > 1 {
            self.advance_round();
        }
    }

    fn advance_round(&mut self) {
        match self.engine.advance_round() {
            Ok(round) => tracing::info!(round, "next round"),
            Err(err) => invariant_violation("advance_round", &err),
        }
    }
}

impl<R> Orchestrator<R> {
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn engine(&self) -> &SelectionEngine<R> {
        &self.engine
    }

    pub fn wait_timer(&self) -> &Countdown {
        &self.wait
    }

    pub fn countdown_timer(&self) -> &Countdown {
        &self.countdown
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_audio_playing(&self) -> bool {
        self.audio_on
    }

    /// Nobody drawn yet in this game and no draw in flight.
    pub fn is_first_pick(&self) -> bool {
        self.engine.round() == 1 && self.engine.picked().is_empty() && self.phase.target().is_none()
    }

    pub fn view(&self) -> GameView {
        let engine = &self.engine;
        let is_round_complete = engine.is_round_complete();
        let idle = matches!(self.phase, Phase::Idle);
        let first_pick = self.is_first_pick();
        let total_names = engine.participants().len();

        let prompt = if is_round_complete {
            Prompt::RoundComplete
        } else if first_pick {
            Prompt::FirstPick
        } else {
            Prompt::NextPlayer
        };

        let timer = match self.phase {
            Phase::Waiting { .. } => Some(TimerView::new(TimerKind::Wait, &self.wait)),
            Phase::Countdown { .. } => Some(TimerView::new(TimerKind::Countdown, &self.countdown)),
            _ => None,
        };

        let reel_names = if engine.available().is_empty() {
            engine.participants().to_vec()
        } else {
            engine.available().to_vec()
        };

        GameView {
            phase: self.phase.tag(),
            target_name: self.phase.target().map(str::to_string),
            current_name: engine.current().map(str::to_string),
            show_result: self.phase.target().is_some(),
            reel_names,
            available: engine.available().to_vec(),
            remaining: engine.available().len(),
            picked: engine.picked().to_vec(),
            picked_count: engine.picked().len(),
            total_names,
            progress: if total_names == 0 {
                0.0
            } else {
                engine.picked().len() as f32 / total_names as f32
            },
            protected: engine.protected().to_vec(),
            round: engine.round(),
            can_protect: engine.can_protect(),
            pick_enabled: idle && !is_round_complete,
            can_continue: idle && is_round_complete,
            is_round_complete,
            is_game_complete: engine.is_game_complete(),
            prompt,
            show_current_player: idle && !first_pick && engine.current().is_some(),
            timer,
            audio_playing: self.audio_on,
        }
    }
}

fn invariant_violation(op: &str, err: &PickerError) {
    tracing::error!(op, error = %err, "invariant violation in selection engine");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn orchestrator(names: &[&str]) -> Orchestrator<ChaCha8Rng> {
        Orchestrator::new(
            Roster::new(names.iter().copied()).unwrap(),
            ChaCha8Rng::seed_from_u64(42),
            GameConfig::default(),
        )
    }

    fn ticks(o: &mut Orchestrator<ChaCha8Rng>, n: u32) -> Vec<Effect> {
        (0..n).flat_map(|_| o.handle(Event::Tick)).collect()
    }

    /// Drives one full turn up to the modal.
    fn play_turn(o: &mut Orchestrator<ChaCha8Rng>) -> String {
        assert!(o.handle(Event::RequestPick).is_empty());
        let target = o.phase().target().unwrap().to_string();
        o.handle(Event::AnimationComplete);
        o.handle(Event::SettleElapsed);
        ticks(o, 5);
        ticks(o, 15);
        assert_eq!(o.phase().tag(), PhaseTag::Modal);
        target
    }

    #[test]
    fn full_turn_emits_effects_in_order() {
        let mut o = orchestrator(&["Anna", "Bo", "Cas"]);
        assert!(o.is_first_pick());
        assert_eq!(o.view().prompt, Prompt::FirstPick);

        assert!(o.handle(Event::RequestPick).is_empty());
        let target = o.phase().target().unwrap().to_string();
        assert_eq!(o.engine().pending(), Some(target.as_str()));
        assert!(o.engine().picked().is_empty());
        assert!(!o.is_first_pick());

        assert_eq!(
            o.handle(Event::AnimationComplete),
            vec![Effect::ScheduleSettle(Duration::from_secs(1))]
        );
        assert_eq!(o.phase(), &Phase::Revealed { target: target.clone() });
        assert_eq!(o.engine().current(), Some(target.as_str()));

        assert_eq!(o.handle(Event::SettleElapsed), vec![Effect::StartTicking]);
        assert!(o.wait_timer().is_running());
        assert_eq!(o.view().timer.unwrap().remaining, 5);

        assert!(ticks(&mut o, 4).is_empty());
        assert_eq!(o.handle(Event::Tick), vec![Effect::PlayAudio]);
        assert_eq!(o.phase().tag(), PhaseTag::Countdown);
        assert!(o.is_audio_playing());
        let timer = o.view().timer.unwrap();
        assert_eq!((timer.kind, timer.remaining, timer.total), (TimerKind::Countdown, 15, 15));

        assert!(ticks(&mut o, 14).is_empty());
        assert_eq!(
            o.handle(Event::Tick),
            vec![Effect::StopTicking, Effect::StopAudio]
        );
        assert_eq!(o.phase(), &Phase::Modal { target });
        assert!(!o.is_audio_playing());
        assert!(!o.countdown_timer().is_running());
    }

    #[test]
    fn pick_only_from_idle() {
        let mut o = orchestrator(&["Anna", "Bo"]);
        o.handle(Event::RequestPick);
        let target = o.phase().target().unwrap().to_string();
        assert!(o.handle(Event::RequestPick).is_empty());
        assert_eq!(o.phase(), &Phase::Spinning { target });
        assert_eq!(o.engine().available().len(), 1);
        assert!(!o.view().pick_enabled);
    }

    #[test]
    fn stray_events_are_ignored() {
        let mut o = orchestrator(&["Anna", "Bo"]);
        assert!(o.handle(Event::AnimationComplete).is_empty());
        assert!(o.handle(Event::SettleElapsed).is_empty());
        assert!(o.handle(Event::Tick).is_empty());
        assert!(o.handle(Event::RequestProtectGift).is_empty());
        assert!(o.handle(Event::RequestNextPlayer).is_empty());
        assert_eq!(o.phase(), &Phase::Idle);
        assert_eq!(o.engine().available().len(), 2);
    }

    #[test]
    fn round_complete_disables_pick_until_next_player() {
        let mut o = orchestrator(&["Anna", "Bo"]);
        play_turn(&mut o);
        o.handle(Event::RequestNextPlayer);
        play_turn(&mut o);

        // Last pick of the round: round complete while still in the modal.
        assert!(o.engine().is_round_complete());
        o.handle(Event::RequestNextPlayer);
        assert_eq!(o.engine().round(), 2);
        assert_eq!(o.engine().available().len(), 2);
        let view = o.view();
        assert!(view.pick_enabled);
        assert_eq!(view.prompt, Prompt::NextPlayer);
        assert!(view.show_current_player);
    }

    #[test]
    fn next_player_mid_round_keeps_round_state() {
        let mut o = orchestrator(&["Anna", "Bo", "Cas"]);
        let first = play_turn(&mut o);
        assert!(o.handle(Event::RequestNextPlayer).is_empty());
        assert_eq!(o.phase(), &Phase::Idle);
        assert_eq!(o.engine().picked(), [first]);
        assert_eq!(o.engine().round(), 1);
        assert_eq!(o.wait_timer().remaining(), 5);
        assert_eq!(o.countdown_timer().remaining(), 15);
        assert!(!o.view().can_protect);
    }

    #[test]
    fn skip_from_countdown_stops_ticking_and_audio() {
        let mut o = orchestrator(&["Anna", "Bo", "Cas"]);
        o.handle(Event::RequestPick);
        o.handle(Event::AnimationComplete);
        o.handle(Event::SettleElapsed);
        ticks(&mut o, 7);
        assert_eq!(o.phase().tag(), PhaseTag::Countdown);
        assert!(o.is_audio_playing());

        assert_eq!(
            o.handle(Event::RequestNextPlayer),
            vec![Effect::StopTicking, Effect::StopAudio]
        );
        assert_eq!(o.phase(), &Phase::Idle);
        assert!(!o.wait_timer().is_running());
        assert!(!o.countdown_timer().is_running());
        assert_eq!(o.countdown_timer().remaining(), 15);
        assert!(!o.is_audio_playing());
        assert!(o.view().timer.is_none());
        assert!(ticks(&mut o, 3).is_empty());
    }

    fn with_timings(wait_secs: u32, countdown_secs: u32) -> Orchestrator<ChaCha8Rng> {
        Orchestrator::new(
            Roster::new(["Anna", "Bo"]).unwrap(),
            ChaCha8Rng::seed_from_u64(42),
            GameConfig {
                wait_secs,
                countdown_secs,
                ..GameConfig::default()
            },
        )
    }

    #[test]
    fn zero_countdown_reaches_modal_without_music() {
        let mut o = with_timings(5, 0);
        o.handle(Event::RequestPick);
        o.handle(Event::AnimationComplete);
        o.handle(Event::SettleElapsed);
        assert!(ticks(&mut o, 4).is_empty());
        assert_eq!(o.handle(Event::Tick), vec![Effect::StopTicking]);
        assert_eq!(o.phase().tag(), PhaseTag::Modal);
        assert!(!o.is_audio_playing());
    }

    #[test]
    fn zero_wait_starts_countdown_on_settle() {
        let mut o = with_timings(0, 3);
        o.handle(Event::RequestPick);
        o.handle(Event::AnimationComplete);
        assert_eq!(
            o.handle(Event::SettleElapsed),
            vec![Effect::StartTicking, Effect::PlayAudio]
        );
        assert_eq!(o.phase().tag(), PhaseTag::Countdown);
        ticks(&mut o, 3);
        assert_eq!(o.phase().tag(), PhaseTag::Modal);
        assert!(!o.is_audio_playing());

        let mut o = with_timings(0, 0);
        o.handle(Event::RequestPick);
        o.handle(Event::AnimationComplete);
        assert!(o.handle(Event::SettleElapsed).is_empty());
        assert_eq!(o.phase().tag(), PhaseTag::Modal);
    }

    #[test]
    fn reset_during_reveal_cancels_settle() {
        let mut o = orchestrator(&["Anna", "Bo"]);
        o.handle(Event::RequestPick);
        o.handle(Event::AnimationComplete);
        assert_eq!(o.handle(Event::ResetGame), vec![Effect::CancelSettle]);
        assert_eq!(o.phase(), &Phase::Idle);
        assert!(o.engine().picked().is_empty());
        assert_eq!(o.engine().available().len(), 2);
        assert!(o.handle(Event::SettleElapsed).is_empty());
        assert!(o.is_first_pick());
    }

    #[test]
    fn replace_participants_starts_new_game() {
        let mut o = orchestrator(&["Anna", "Bo"]);
        o.handle(Event::RequestPick);
        o.handle(Event::AnimationComplete);
        o.handle(Event::SettleElapsed);
        let roster = Roster::new(["Cas", "Dirk", "Eva"]).unwrap();
        assert_eq!(
            o.handle(Event::ReplaceParticipants(roster)),
            vec![Effect::StopTicking]
        );
        let view = o.view();
        assert_eq!(view.phase, PhaseTag::Idle);
        assert_eq!(view.available, ["Cas", "Dirk", "Eva"]);
        assert_eq!(view.total_names, 3);
        assert_eq!(view.round, 1);
    }

    #[test]
    fn protect_then_advance_excludes_protected() {
        let mut o = orchestrator(&["Anna", "Bo", "Cas"]);
        for _ in 0..3 {
            play_turn(&mut o);
            assert!(!o.engine().can_protect());
            o.handle(Event::RequestNextPlayer);
        }
        assert_eq!(o.engine().round(), 2);

        let protector = play_turn(&mut o);
        assert!(o.view().can_protect);
        assert!(o.handle(Event::RequestProtectGift).is_empty());
        assert_eq!(o.phase(), &Phase::Idle);
        assert_eq!(o.engine().protected(), [protector.clone()]);
        assert!(!o.view().can_protect);

        play_turn(&mut o);
        o.handle(Event::RequestNextPlayer);
        play_turn(&mut o);
        o.handle(Event::RequestNextPlayer);

        assert_eq!(o.engine().round(), 3);
        assert_eq!(o.engine().available().len(), 2);
        assert!(!o.engine().available().contains(&protector));
    }

    #[test]
    fn protect_on_last_pick_advances_when_more_than_one_left() {
        let mut o = orchestrator(&["Anna", "Bo", "Cas"]);
        for _ in 0..3 {
            play_turn(&mut o);
            o.handle(Event::RequestNextPlayer);
        }
        play_turn(&mut o);
        o.handle(Event::RequestNextPlayer);
        play_turn(&mut o);
        o.handle(Event::RequestNextPlayer);
        let last = play_turn(&mut o);
        assert!(o.engine().is_round_complete());

        o.handle(Event::RequestProtectGift);
        assert_eq!(o.engine().round(), 3);
        assert_eq!(o.engine().available().len(), 2);
        assert!(!o.engine().available().contains(&last));
    }

    #[test]
    fn single_remaining_player_protects_then_game_resets() {
        let mut o = orchestrator(&["Anna", "Bo"]);
        for _ in 0..2 {
            play_turn(&mut o);
            o.handle(Event::RequestNextPlayer);
        }

        // Round 2: first player protects, second does not.
        let first = play_turn(&mut o);
        o.handle(Event::RequestProtectGift);
        let second = play_turn(&mut o);
        assert_ne!(first, second);
        o.handle(Event::RequestNextPlayer);
        assert_eq!(o.engine().round(), 3);
        assert_eq!(o.engine().available(), [second.clone()]);

        // Round 3: the last unprotected player protects.
        assert_eq!(play_turn(&mut o), second);
        assert!(o.view().can_protect);
        o.handle(Event::RequestProtectGift);
        assert!(o.engine().is_game_complete());
        assert_eq!(o.engine().round(), 3);

        let view = o.view();
        assert!(view.is_game_complete);
        assert!(!view.pick_enabled);
        assert!(view.can_continue);
        assert_eq!(view.prompt, Prompt::RoundComplete);

        // "Next player" now restarts rather than advancing.
        o.handle(Event::RequestNextPlayer);
        let view = o.view();
        assert_eq!(view.round, 1);
        assert!(view.protected.is_empty());
        assert_eq!(view.available.len(), 2);
        assert!(view.pick_enabled);
        assert_eq!(view.prompt, Prompt::FirstPick);
    }

    #[test]
    fn protect_leaving_one_player_waits_for_continue() {
        let mut o = orchestrator(&["Anna", "Bo"]);
        for _ in 0..2 {
            play_turn(&mut o);
            o.handle(Event::RequestNextPlayer);
        }
        let first = play_turn(&mut o);
        o.handle(Event::RequestNextPlayer);
        play_turn(&mut o);
        o.handle(Event::RequestProtectGift);

        // Round complete, one unprotected player left: no auto-advance.
        assert_eq!(o.engine().round(), 2);
        assert!(o.view().can_continue);
        assert!(o.handle(Event::RequestPick).is_empty());
        assert_eq!(o.phase(), &Phase::Idle);

        o.handle(Event::RequestNextPlayer);
        assert_eq!(o.engine().round(), 3);
        assert_eq!(o.engine().available(), [first]);
    }

    #[test]
    fn intents_deserialize_from_tagged_json() {
        let intent: Intent = serde_json::from_str(r#"{"type":"request_protect_gift"}"#).unwrap();
        assert_eq!(Event::from(intent), Event::RequestProtectGift);
    }
}
