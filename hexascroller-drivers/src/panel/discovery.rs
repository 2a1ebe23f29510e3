//! Panel discovery
//!
//! Physical port order says nothing about where a panel hangs in the
//! chain, so every candidate is opened, asked for its logical id and
//! placed in that slot. Candidates are probed one at a time.

use heapless::Vec;
use hexascroller_core::config::PANEL_COUNT;
use hexascroller_core::traits::{ConnectionError, PanelError, PanelLink};

/// Discovery did not produce exactly one link per logical id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("panel discovery incomplete: missing ids {missing:?}, duplicate ids {duplicates:?}")]
pub struct DiscoveryError {
    /// Ids no candidate answered with
    pub missing: Vec<u8, PANEL_COUNT>,
    /// Ids claimed by more than one candidate
    pub duplicates: Vec<u8, PANEL_COUNT>,
}

fn probe<L: PanelLink>(link: &mut L) -> Result<u8, ConnectionError> {
    link.identify().map_err(|err| match err {
        PanelError::Command(e) => ConnectionError::NoResponse(e),
        PanelError::Validation(_) => ConnectionError::Unavailable,
    })
}

/// Open and identify every candidate, returning links ordered by id
///
/// `open` brings up one candidate. `report` is called once per candidate
/// with the id it answered or the reason it was skipped; ids outside
/// `0..PANEL_COUNT` are reported and then ignored. The first link to claim
/// an id keeps the slot.
pub fn discover<C, L, O, R>(
    candidates: impl IntoIterator<Item = C>,
    mut open: O,
    mut report: R,
) -> Result<[L; PANEL_COUNT], DiscoveryError>
where
    L: PanelLink,
    O: FnMut(&C) -> Result<L, ConnectionError>,
    R: FnMut(&C, Result<u8, ConnectionError>),
{
    let mut slots: [Option<L>; PANEL_COUNT] = core::array::from_fn(|_| None);
    let mut duplicates = Vec::new();

    for candidate in candidates {
        let found = open(&candidate).and_then(|mut link| probe(&mut link).map(|id| (id, link)));
        let (id, link) = match found {
            Ok(found) => found,
            Err(err) => {
                report(&candidate, Err(err));
                continue;
            }
        };
        report(&candidate, Ok(id));

        let Some(slot) = slots.get_mut(usize::from(id)) else {
            continue;
        };
        if slot.is_some() {
            if !duplicates.contains(&id) {
                // At most PANEL_COUNT distinct ids reach this point
                let _ = duplicates.push(id);
            }
            continue;
        }
        *slot = Some(link);
    }

    let missing: Vec<u8, PANEL_COUNT> = slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_none())
        .map(|(id, _)| id as u8)
        .collect();

    match slots {
        [Some(a), Some(b), Some(c)] if duplicates.is_empty() => Ok([a, b, c]),
        _ => Err(DiscoveryError {
            missing,
            duplicates,
        }),
    }
}
