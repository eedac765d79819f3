// 📍 Geocode Joiner
// Both sides must resolve against the reference table or the route is dropped

use crate::normalize::{NormalizedTransaction, PostalKey};
use crate::parser::Passthrough;
use crate::reference::{Coordinate, PostalIndex};
use tracing::debug;

/// A transaction whose payer and payee both resolved to coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTransaction {
    pub time_ms: i64,
    pub payer_coordinate: Coordinate,
    pub payee_coordinate: Coordinate,
    pub passthrough: Option<Passthrough>,
    pub line_number: u64,
}

/// Which side failed the lookup. Payer is checked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMiss {
    Payer,
    Payee,
}

#[derive(Debug, Default)]
pub struct JoinOutcome {
    pub transactions: Vec<EnrichedTransaction>,
    pub unresolved_payer: usize,
    pub unresolved_payee: usize,
}

fn lookup(index: &PostalIndex, key: &PostalKey) -> Option<Coordinate> {
    index.lookup(&key.country, &key.postal_code).cloned()
}

pub fn resolve(tx: NormalizedTransaction, index: &PostalIndex) -> Result<EnrichedTransaction, JoinMiss> {
    let payer_coordinate = lookup(index, &tx.payer).ok_or(JoinMiss::Payer)?;
    let payee_coordinate = lookup(index, &tx.payee).ok_or(JoinMiss::Payee)?;

    Ok(EnrichedTransaction {
        time_ms: tx.time_ms,
        payer_coordinate,
        payee_coordinate,
        passthrough: tx.passthrough,
        line_number: tx.line_number,
    })
}

/// Inner-join a batch against the index, preserving input order
pub fn join_batch(batch: Vec<NormalizedTransaction>, index: &PostalIndex) -> JoinOutcome {
    let mut outcome = JoinOutcome {
        transactions: Vec::with_capacity(batch.len()),
        ..JoinOutcome::default()
    };

    for tx in batch {
        match resolve(tx, index) {
            Ok(enriched) => outcome.transactions.push(enriched),
            Err(JoinMiss::Payer) => outcome.unresolved_payer += 1,
            Err(JoinMiss::Payee) => outcome.unresolved_payee += 1,
        }
    }

    debug!(
        kept = outcome.transactions.len(),
        unresolved_payer = outcome.unresolved_payer,
        unresolved_payee = outcome.unresolved_payee,
        "Joined transactions to reference table"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{Degrees, GeoLookupEntry};

    fn index() -> PostalIndex {
        PostalIndex::from_entries(vec![
            GeoLookupEntry {
                country: "US".to_string(),
                postal_code: "20815".to_string(),
                latitude: Degrees::parse("38.9832").unwrap(),
                longitude: Degrees::parse("-77.0007").unwrap(),
            },
            GeoLookupEntry {
                country: "CA".to_string(),
                postal_code: "K1A".to_string(),
                latitude: Degrees::parse("45.4215").unwrap(),
                longitude: Degrees::parse("-75.6972").unwrap(),
            },
        ])
    }

    fn normalized(payer: (&str, &str), payee: (&str, &str)) -> NormalizedTransaction {
        NormalizedTransaction {
            time_ms: 1000,
            payer: PostalKey {
                country: payer.0.to_string(),
                postal_code: payer.1.to_string(),
            },
            payee: PostalKey {
                country: payee.0.to_string(),
                postal_code: payee.1.to_string(),
            },
            passthrough: None,
            line_number: 2,
        }
    }

    #[test]
    fn test_both_sides_resolve() {
        let enriched = resolve(normalized(("US", "20815"), ("CA", "K1A")), &index()).unwrap();

        assert_eq!(enriched.payer_coordinate.longitude.as_str(), "-77.0007");
        assert_eq!(enriched.payee_coordinate.latitude.as_str(), "45.4215");
    }

    #[test]
    fn test_unresolved_payee_drops_route() {
        let result = resolve(normalized(("US", "20815"), ("US", "99999")), &index());
        assert_eq!(result, Err(JoinMiss::Payee));
    }

    #[test]
    fn test_unresolved_payer_drops_route() {
        let result = resolve(normalized(("US", "00000"), ("US", "20815")), &index());
        assert_eq!(result, Err(JoinMiss::Payer));
    }

    #[test]
    fn test_country_is_part_of_key() {
        let result = resolve(normalized(("CA", "20815"), ("US", "20815")), &index());
        assert_eq!(result, Err(JoinMiss::Payer));
    }

    #[test]
    fn test_join_batch_counts_and_keeps_order() {
        let mut first = normalized(("US", "20815"), ("CA", "K1A"));
        first.line_number = 2;
        let mut second = normalized(("CA", "K1A"), ("US", "20815"));
        second.line_number = 4;

        let outcome = join_batch(
            vec![
                first,
                normalized(("US", "1"), ("US", "20815")),
                normalized(("US", "20815"), ("US", "1")),
                second,
            ],
            &index(),
        );

        assert_eq!(outcome.unresolved_payer, 1);
        assert_eq!(outcome.unresolved_payee, 1);
        let lines: Vec<u64> = outcome.transactions.iter().map(|t| t.line_number).collect();
        assert_eq!(lines, vec![2, 4]);
    }
}
