//! Level-up perk selection
//!
//! Always take the highest rarity on offer; when several cards share it,
//! prefer the middle card, then the right one, then the left, matching the
//! game's habit of putting the featured perk in the center.

use crate::vision::PerkChoice;

const INDEX_PREFERENCE: [usize; 3] = [1, 2, 0];

/// Choose the perk to click, or `None` when no choices were detected.
pub fn choose(choices: &[PerkChoice]) -> Option<&PerkChoice> {
    let best = choices.iter().map(|c| c.rarity).max()?;
    for idx in INDEX_PREFERENCE {
        if let Some(choice) = choices.iter().find(|c| c.index == idx && c.rarity == best) {
            return Some(choice);
        }
    }
    choices.first()
}
