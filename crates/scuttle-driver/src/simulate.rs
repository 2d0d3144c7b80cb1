use rand::seq::SliceRandom;

use scuttle_domain::{Offer, OfferId, TaskRecord};

/// Generate synthetic offers containing a framework's own reservations,
/// in random order, as if the master were re-offering them one resource
/// at a time. This is the `--simulate` driver mode's offer source (E3):
/// it exercises the full offer loop end to end without a live master
/// connection.
pub fn synthetic_offers(tasks: &[TaskRecord]) -> Vec<Offer> {
    let mut resources: Vec<_> = tasks
        .iter()
        .flat_map(|t| t.resources.iter().cloned())
        .filter(|r| !r.is_released())
        .collect();
    resources.shuffle(&mut rand::thread_rng());

    resources
        .into_iter()
        .enumerate()
        .map(|(i, resource)| Offer { id: OfferId::new(format!("sim-offer-{i}")), resources: vec![resource] })
        .collect()
}
