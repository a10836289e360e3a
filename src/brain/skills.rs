//! Skill-slot adaptation
//!
//! Each purchase retunes the four skill-slot flags to suit the weapon type
//! just acquired and turns automatic casting on.

use crate::config::Settings;
use crate::vision::WeaponKind;

/// Runtime skill-casting state, seeded from settings and mutated by
/// purchases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillLoadout {
    pub auto_cast: bool,
    pub slots: [bool; 4],
}

impl SkillLoadout {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            auto_cast: settings.auto_skills,
            slots: settings.skill_slots,
        }
    }
}

/// Static slot table keyed by weapon type.
pub fn loadout_for(kind: WeaponKind) -> SkillLoadout {
    let slots = match kind {
        // Periodic boosts suit damage-over-time builds.
        WeaponKind::Elemental => [true, true, false, true],
        // Single-target/crit slots.
        WeaponKind::Ballistic => [true, false, true, false],
        // Area damage.
        WeaponKind::Explosive => [false, true, true, true],
        // Sustained damage.
        WeaponKind::Energy => [true, true, false, true],
        WeaponKind::Unknown => [true; 4],
    };
    SkillLoadout {
        auto_cast: true,
        slots,
    }
}
