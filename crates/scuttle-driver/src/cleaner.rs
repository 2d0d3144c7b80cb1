use scuttle_domain::{Offer, OfferId, Operation, ResourceKind};

/// One offer the cleaner consumed, paired with the operations to send
/// back in its accept call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedOffer {
    pub offer_id: OfferId,
    pub operations: Vec<Operation>,
}

/// Output of one cleaning pass over a batch of offers: the offers
/// the cleaner consumed (each with its own operation batch — "one accept
/// per offer"), and the offers it didn't touch (nothing to release in
/// them), left for the caller to decline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanOutcome {
    pub accepted: Vec<AcceptedOffer>,
    pub unconsumed: Vec<OfferId>,
}

/// Component E. Stateless: given the raw offer list from one offer
/// cycle, emit UNRESERVE/DESTROY operations for every reservation the
/// framework owns among them. Does not know or care which plan step a
/// reservation belongs to — it releases everything offered back that
/// isn't already tombstoned; the recorder maps operations back to steps.
pub fn clean_offers(offers: &[Offer]) -> CleanOutcome {
    let mut outcome = CleanOutcome::default();

    for offer in offers {
        let mut operations = Vec::new();
        for resource in &offer.resources {
            if resource.is_released() {
                continue;
            }
            match resource.kind {
                ResourceKind::Volume => {
                    // Destroy before unreserve, ordered within the same accept call.
                    operations.push(Operation::Destroy {
                        reservation_id: resource.reservation_id.clone(),
                    });
                    operations.push(Operation::Unreserve {
                        reservation_id: resource.reservation_id.clone(),
                    });
                }
                ResourceKind::Scalar | ResourceKind::Range => {
                    operations.push(Operation::Unreserve {
                        reservation_id: resource.reservation_id.clone(),
                    });
                }
            }
        }

        if operations.is_empty() {
            outcome.unconsumed.push(offer.id.clone());
        } else {
            outcome.accepted.push(AcceptedOffer { offer_id: offer.id.clone(), operations });
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttle_domain::{Resource, ReservationId};

    fn resource(id: &str, kind: ResourceKind) -> Resource {
        Resource {
            reservation_id: ReservationId::new(id),
            kind,
            role: "svc-role".into(),
            principal: "svc-principal".into(),
            name: "res".into(),
        }
    }

    #[test]
    fn scalar_and_range_emit_unreserve_only() {
        let offer = Offer {
            id: OfferId::new("o1"),
            resources: vec![resource("r1", ResourceKind::Scalar), resource("r2", ResourceKind::Range)],
        };
        let outcome = clean_offers(&[offer]);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(
            outcome.accepted[0].operations,
            vec![
                Operation::Unreserve { reservation_id: ReservationId::new("r1") },
                Operation::Unreserve { reservation_id: ReservationId::new("r2") },
            ]
        );
    }

    #[test]
    fn volume_emits_destroy_then_unreserve() {
        let offer = Offer { id: OfferId::new("o1"), resources: vec![resource("r1", ResourceKind::Volume)] };
        let outcome = clean_offers(&[offer]);
        assert_eq!(
            outcome.accepted[0].operations,
            vec![
                Operation::Destroy { reservation_id: ReservationId::new("r1") },
                Operation::Unreserve { reservation_id: ReservationId::new("r1") },
            ]
        );
    }

    #[test]
    fn tombstoned_resources_are_skipped() {
        let offer = Offer {
            id: OfferId::new("o1"),
            resources: vec![resource("uninstalled_r1", ResourceKind::Scalar)],
        };
        let outcome = clean_offers(&[offer]);
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.unconsumed, vec![OfferId::new("o1")]);
    }

    #[test]
    fn mixed_batch_partitions_offers_correctly() {
        let matching = Offer { id: OfferId::new("o1"), resources: vec![resource("r1", ResourceKind::Scalar)] };
        let empty = Offer { id: OfferId::new("o2"), resources: vec![] };
        let outcome = clean_offers(&[matching, empty]);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.unconsumed, vec![OfferId::new("o2")]);
    }
}
