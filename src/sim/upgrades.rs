//! Level-up upgrade catalogue

use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::player::Player;

/// Passive upgrades offered on level-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Upgrade {
    Speed,
    PickupRadius,
    CarrySlots,
    Stamina,
    ChaosDampening,
    XpGain,
}

impl Upgrade {
    pub const ALL: [Upgrade; 6] = [
        Upgrade::Speed,
        Upgrade::PickupRadius,
        Upgrade::CarrySlots,
        Upgrade::Stamina,
        Upgrade::ChaosDampening,
        Upgrade::XpGain,
    ];

    /// Stable string id used by the host and tuning files
    pub fn id(&self) -> &'static str {
        match self {
            Upgrade::Speed => "speed",
            Upgrade::PickupRadius => "pickupRadius",
            Upgrade::CarrySlots => "carrySlots",
            Upgrade::Stamina => "stamina",
            Upgrade::ChaosDampening => "chaosDampening",
            Upgrade::XpGain => "xpGain",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Upgrade::Speed => "Comfy Shoes",
            Upgrade::PickupRadius => "Long Arms",
            Upgrade::CarrySlots => "Book Belt",
            Upgrade::Stamina => "Fitness Training",
            Upgrade::ChaosDampening => "Zen Focus",
            Upgrade::XpGain => "Reading Glasses",
        }
    }

    /// Card text for the effect at `level`
    pub fn describe(&self, level: u8) -> String {
        let level = level as f32;
        match self {
            Upgrade::Speed => format!("+{:.0}% Movement Speed", 10.0 * level),
            Upgrade::PickupRadius => format!("+{:.1}m Pickup/Return Radius", 0.1 * level),
            Upgrade::CarrySlots => format!("+{level} Book Slots"),
            Upgrade::Stamina => format!("+{:.0} Max Stamina", 10.0 * level),
            Upgrade::ChaosDampening => format!("-{:.0}% Chaos Gain", 2.0 * level),
            Upgrade::XpGain => format!("+{:.0}% XP Gain", 8.0 * level),
        }
    }

    pub fn max_level(&self) -> u8 {
        match self {
            Upgrade::Speed | Upgrade::XpGain => 5,
            Upgrade::CarrySlots => 7,
            Upgrade::PickupRadius | Upgrade::Stamina | Upgrade::ChaosDampening => 10,
        }
    }
}

impl std::fmt::Display for Upgrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Up to `count` distinct upgrades the player has not maxed, in random order
pub fn offer(rng: &mut Pcg32, player: &Player, count: usize) -> Vec<Upgrade> {
    let mut open: Vec<Upgrade> = Upgrade::ALL
        .into_iter()
        .filter(|u| player.upgrade_level(*u) < u.max_level())
        .collect();
    open.shuffle(rng);
    open.truncate(count);
    open
}

/// Raise an upgrade by one level; false (and no change) when it is maxed
pub fn apply(upgrade: Upgrade, player: &mut Player) -> bool {
    let level = player.upgrade_level(upgrade);
    if level >= upgrade.max_level() {
        return false;
    }
    player.upgrades.insert(upgrade, level + 1);

    let stats = &mut player.stats;
    match upgrade {
        // 10% of the 3 m/s base, so levels add rather than compound
        Upgrade::Speed => stats.move_speed += 0.3,
        Upgrade::PickupRadius => {
            stats.pickup_radius += 0.1;
            stats.return_radius += 0.1;
        }
        Upgrade::CarrySlots => stats.carry_slots += 1,
        Upgrade::Stamina => {
            stats.max_stamina += 10.0;
            stats.stamina += 10.0;
        }
        Upgrade::ChaosDampening => stats.chaos_dampening += 2.0,
        Upgrade::XpGain => stats.xp_multiplier += 0.08,
    }
    log::info!("Upgrade {} -> level {}", upgrade.id(), level + 1);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use rand::SeedableRng;

    fn player() -> Player {
        Player::new(&Tuning::default())
    }

    #[test]
    fn test_ids_round_trip_through_parser() {
        for u in Upgrade::ALL {
            assert_eq!(Upgrade::from_id(u.id()), Some(u));
        }
        assert_eq!(Upgrade::from_id("shushWave"), None);
    }

    #[test]
    fn test_apply_until_maxed() {
        let mut p = player();
        for _ in 0..5 {
            assert!(apply(Upgrade::Speed, &mut p));
        }
        assert!((p.stats.move_speed - 4.5).abs() < 1e-4);
        assert!(!apply(Upgrade::Speed, &mut p));
        assert!((p.stats.move_speed - 4.5).abs() < 1e-4);
        assert_eq!(p.upgrade_level(Upgrade::Speed), 5);
    }

    #[test]
    fn test_apply_effects() {
        let mut p = player();
        assert!(apply(Upgrade::PickupRadius, &mut p));
        assert!(apply(Upgrade::CarrySlots, &mut p));
        assert!(apply(Upgrade::Stamina, &mut p));
        assert!(apply(Upgrade::ChaosDampening, &mut p));
        assert!(apply(Upgrade::XpGain, &mut p));
        assert!((p.stats.pickup_radius - 1.1).abs() < 1e-5);
        assert!((p.stats.return_radius - 0.6).abs() < 1e-5);
        assert_eq!(p.stats.carry_slots, 6);
        assert_eq!(p.stats.max_stamina, 110.0);
        assert_eq!(p.stats.stamina, 110.0);
        assert_eq!(p.stats.chaos_dampening, 2.0);
        assert!((p.stats.xp_multiplier - 1.08).abs() < 1e-5);
    }

    #[test]
    fn test_offer_skips_maxed_and_is_distinct() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut p = player();
        while apply(Upgrade::XpGain, &mut p) {}
        for _ in 0..20 {
            let offered = offer(&mut rng, &p, 3);
            assert_eq!(offered.len(), 3);
            assert!(!offered.contains(&Upgrade::XpGain));
            assert!(offered[0] != offered[1] && offered[1] != offered[2] && offered[0] != offered[2]);
        }
    }

    #[test]
    fn test_offer_empty_when_everything_maxed() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut p = player();
        for u in Upgrade::ALL {
            while apply(u, &mut p) {}
        }
        assert!(offer(&mut rng, &p, 3).is_empty());
    }
}
