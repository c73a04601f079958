//! Queries that were written to the resolver but not yet answered.

use dane_core::ScanRequest;
use hickory_proto::rr::Name;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A dispatched query awaiting its answer
#[derive(Debug, Clone)]
pub(crate) struct Pending {
    pub request: ScanRequest,
    pub name: Name,
}

/// Outcome of matching a response against the in-flight set
#[derive(Debug)]
pub(crate) enum Claim {
    /// The response answers this pending query
    Matched(Pending),
    /// No query with this id is outstanding
    Unknown,
    /// The id is outstanding but the echoed question differs
    Mismatch(Name),
}

/// Transaction id to pending query map shared by dispatcher and collector.
///
/// The dispatcher registers an id before writing the query so the entry is
/// always visible by the time its answer can be read.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    pending: Mutex<HashMap<u16, Pending>>,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashMap<u16, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a query. Returns false if the id is already outstanding.
    pub fn register(&self, pending: Pending) -> bool {
        let mut map = self.lock();
        let id = pending.request.transaction_id;
        if map.contains_key(&id) {
            return false;
        }
        map.insert(id, pending);
        true
    }

    /// Forget a query whose write failed.
    pub fn withdraw(&self, id: u16) {
        self.lock().remove(&id);
    }

    /// Claim the pending query a response belongs to.
    pub fn claim(&self, id: u16, question: Option<&Name>) -> Claim {
        let mut map = self.lock();
        let mismatch = match (map.get(&id), question) {
            (None, _) => return Claim::Unknown,
            (Some(pending), Some(name)) if *name != pending.name => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = mismatch {
            return Claim::Mismatch(name);
        }
        map.remove(&id).map_or(Claim::Unknown, Claim::Matched)
    }

    /// Number of outstanding queries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove everything still outstanding, ordered by transaction id.
    pub fn drain_domains(&self) -> Vec<String> {
        let mut rest: Vec<(u16, String)> = self
            .lock()
            .drain()
            .map(|(id, p)| (id, p.request.domain))
            .collect();
        rest.sort_unstable_by_key(|(id, _)| *id);
        rest.into_iter().map(|(_, domain)| domain).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dane_core::Transport;

    fn pending(id: u16, domain: &str) -> Pending {
        Pending {
            request: ScanRequest {
                domain: domain.to_string(),
                transaction_id: id,
                port: "443".into(),
                transport: Transport::Tcp,
            },
            name: Name::from_ascii(format!("_443._tcp.{domain}.")).unwrap(),
        }
    }

    #[test]
    fn test_register_and_claim() {
        let in_flight = InFlight::default();
        assert!(in_flight.register(pending(1, "a.example")));
        assert!(!in_flight.register(pending(1, "b.example")));
        assert_eq!(in_flight.len(), 1);

        let name = Name::from_ascii("_443._tcp.a.example.").unwrap();
        match in_flight.claim(1, Some(&name)) {
            Claim::Matched(p) => assert_eq!(p.request.domain, "a.example"),
            other => panic!("unexpected claim {other:?}"),
        }
        assert!(in_flight.is_empty());
        assert!(matches!(in_flight.claim(1, None), Claim::Unknown));
    }

    #[test]
    fn test_claim_is_case_insensitive_and_checks_question() {
        let in_flight = InFlight::default();
        in_flight.register(pending(5, "a.example"));

        let other = Name::from_ascii("_443._tcp.b.example.").unwrap();
        assert!(matches!(in_flight.claim(5, Some(&other)), Claim::Mismatch(_)));
        assert_eq!(in_flight.len(), 1);

        let upper = Name::from_ascii("_443._TCP.A.EXAMPLE.").unwrap();
        assert!(matches!(in_flight.claim(5, Some(&upper)), Claim::Matched(_)));
    }

    #[test]
    fn test_withdraw_and_drain() {
        let in_flight = InFlight::default();
        in_flight.register(pending(9, "c.example"));
        in_flight.register(pending(2, "a.example"));
        in_flight.register(pending(4, "b.example"));
        in_flight.withdraw(4);

        assert_eq!(in_flight.drain_domains(), vec!["a.example", "c.example"]);
        assert!(in_flight.is_empty());
    }
}
