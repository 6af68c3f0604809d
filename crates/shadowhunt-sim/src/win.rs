//! Match outcome from Shadow statuses.

use shadowhunt_protocol::ActorStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Undecided,
    GuardiansWin,
    ShadowsWin,
}

/// Pure decision over the current Shadow statuses.
///
/// The match is decided only once no Shadow is still alive. Then a single
/// escape is enough for the Shadows.
pub struct WinDeterminer;

impl WinDeterminer {
    pub fn evaluate(statuses: impl IntoIterator<Item = ActorStatus>) -> Verdict {
        let mut alive = 0usize;
        let mut escaped = 0usize;
        for status in statuses {
            match status {
                ActorStatus::Alive => alive += 1,
                ActorStatus::Escaped => escaped += 1,
                ActorStatus::Dead => {}
            }
        }

        if alive > 0 {
            Verdict::Undecided
        } else if escaped > 0 {
            Verdict::ShadowsWin
        } else {
            Verdict::GuardiansWin
        }
    }
}
