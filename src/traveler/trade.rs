//! Transfer protocol between goods holders
//!
//! Any owner that can `take` a requested good and `put` an incoming one can
//! take part in a transfer: a traveler's carried inventory, a storage
//! property, or a town market.

use serde::{Deserialize, Serialize};

use crate::core::types::TravelerId;
use crate::goods::{Good, Property};
use crate::world::Town;

/// Something goods can be moved into and out of
pub trait GoodsHolder {
    /// Remove up to `request`; on return `request` holds what was removed
    fn take(&mut self, request: &mut Good);

    /// Add `incoming`; returns the amount discarded over capacity
    fn put(&mut self, incoming: &Good) -> f64;
}

impl GoodsHolder for Property {
    fn take(&mut self, request: &mut Good) {
        Property::take(self, request)
    }

    fn put(&mut self, incoming: &Good) -> f64 {
        Property::put(self, incoming)
    }
}

impl GoodsHolder for Town {
    fn take(&mut self, request: &mut Good) {
        self.property.take(request)
    }

    fn put(&mut self, incoming: &Good) -> f64 {
        self.property.put(incoming)
    }
}

/// Move each good from `source` to `destination`, describing the transfer in `log`.
///
/// Goods are clamped to what `source` actually held, so after the call each
/// entry of `goods` is the amount that changed hands. Items are joined in
/// English: "a", "a and b", "a, b, and c". Returns the total amount the
/// destination discarded over capacity.
pub fn transfer<S, D>(goods: &mut [Good], source: &mut S, destination: &mut D, log: &mut String) -> f64
where
    S: GoodsHolder + ?Sized,
    D: GoodsHolder + ?Sized,
{
    let count = goods.len();
    let mut discarded = 0.0;
    for (i, good) in goods.iter_mut().enumerate() {
        if i > 0 {
            if count != 2 {
                log.push(',');
            }
            if i + 1 == count {
                log.push_str(" and");
            }
            log.push(' ');
        }
        source.take(good);
        discarded += destination.put(good);
        log.push_str(&good.log_entry());
    }
    if discarded > 0.0 {
        tracing::debug!("transfer discarded {} over capacity", discarded);
    }
    discarded
}

/// An employment agreement posted on a town's job board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// The bidder while posted; the employer once hired
    pub party: TravelerId,
    /// Value still owed to the employer
    pub owed: f64,
    /// Value paid per day
    pub wage: f64,
}

impl Contract {
    pub fn new(party: TravelerId, owed: f64, wage: f64) -> Self {
        Self { party, owed, wage }
    }
}
