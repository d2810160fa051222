//! Sound cues
//!
//! The simulation never plays anything itself. It raises `GameEvent`s, and
//! this module maps them to fire-and-forget cues for whatever backend the
//! host plugs in.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Book picked up (from the floor or out of a kid's hands)
    PickupBook,
    /// Book slid back onto a shelf
    ShelveBook,
    /// Kid giggles while running off; one clip per voice variant
    KidLaugh { voice: u8 },
    /// Looping pant while sprinting on an empty tank
    OutOfBreathStart,
    OutOfBreathStop,
    /// Chaos maxed out
    UhOh,
    /// Survived the shift
    Victory,
}

impl SoundEffect {
    /// Cue for an event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match *event {
            GameEvent::ItemPickedUp { .. } | GameEvent::ItemSnatched { .. } => {
                Some(Self::PickupBook)
            }
            GameEvent::ItemReturned { .. } => Some(Self::ShelveBook),
            GameEvent::NpcFled { voice, .. } => Some(Self::KidLaugh { voice }),
            GameEvent::OutOfBreath => Some(Self::OutOfBreathStart),
            GameEvent::CaughtBreath => Some(Self::OutOfBreathStop),
            GameEvent::RunLost { .. } => Some(Self::UhOh),
            GameEvent::RunWon => Some(Self::Victory),
            _ => None,
        }
    }

    /// Clip name a file-based backend would load
    pub fn clip(&self) -> String {
        match self {
            Self::PickupBook => "pickup_book".into(),
            Self::ShelveBook => "book_on_shelf".into(),
            Self::KidLaugh { voice } => format!("kid_laughing_{voice}"),
            Self::OutOfBreathStart | Self::OutOfBreathStop => "out_of_breath".into(),
            Self::UhOh => "uh_oh".into(),
            Self::Victory => "victory".into(),
        }
    }

    /// Mix level relative to the SFX bus
    pub fn base_volume(&self) -> f32 {
        match self {
            Self::PickupBook => 0.7,
            Self::KidLaugh { .. } => 0.5,
            _ => 0.6,
        }
    }
}

/// Audio backend
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
}

/// Play the cue of every event that has one; returns how many were played
pub fn dispatch(sink: &mut dyn AudioSink, events: &[GameEvent]) -> usize {
    let mut played = 0;
    for effect in events.iter().filter_map(SoundEffect::for_event) {
        sink.play(effect);
        played += 1;
    }
    played
}

/// Discards every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _effect: SoundEffect) {}
}

/// Logs cues instead of playing them (headless runs)
#[derive(Debug, Clone)]
pub struct LogAudio {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    played: u64,
}

impl Default for LogAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl LogAudio {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            played: 0,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Cues that were audible
    pub fn played(&self) -> u64 {
        self.played
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume() * effect.base_volume();
        if vol <= 0.0 {
            return;
        }
        self.played += 1;
        log::debug!("Sound {} at {vol:.2}", effect.clip());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ContainerId, ItemId, LossReason, NpcId};

    #[test]
    fn test_kid_laugh_carries_voice() {
        let event = GameEvent::NpcFled {
            npc: NpcId(4),
            voice: 3,
        };
        let effect = SoundEffect::for_event(&event);
        assert_eq!(effect, Some(SoundEffect::KidLaugh { voice: 3 }));
        assert_eq!(effect.map(|e| e.clip()).as_deref(), Some("kid_laughing_3"));
    }

    #[test]
    fn test_silent_events() {
        assert_eq!(SoundEffect::for_event(&GameEvent::XpGained { amount: 5 }), None);
        assert_eq!(
            SoundEffect::for_event(&GameEvent::NpcSpawned {
                npc: NpcId(0),
                tier: 1
            }),
            None
        );
    }

    #[test]
    fn test_dispatch_counts_cues() {
        let events = [
            GameEvent::ItemPickedUp { item: ItemId(1) },
            GameEvent::XpGained { amount: 7 },
            GameEvent::ItemReturned {
                item: ItemId(1),
                container: ContainerId(0),
            },
            GameEvent::RunLost {
                reason: LossReason::Chaos,
            },
        ];
        let mut audio = LogAudio::new();
        assert_eq!(dispatch(&mut audio, &events), 3);
        assert_eq!(audio.played(), 3);

        audio.set_muted(true);
        dispatch(&mut audio, &events);
        assert_eq!(audio.played(), 3);
    }

    #[test]
    fn test_zero_volume_is_silent() {
        let events = [GameEvent::ItemPickedUp { item: ItemId(1) }];
        let mut audio = LogAudio::new();
        audio.set_sfx_volume(-2.0);
        dispatch(&mut audio, &events);
        assert_eq!(audio.played(), 0);

        audio.set_sfx_volume(1.0);
        audio.set_master_volume(3.0);
        dispatch(&mut audio, &events);
        assert_eq!(audio.played(), 1);
    }
}
