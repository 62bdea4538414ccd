//! Per-account work queue of releases awaiting restoration.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::gateway::{AccountId, ApiResponse, ReleaseCode};

use super::types::RestorerError;

/// Releases awaiting restoration, grouped by hosting account.
///
/// Every account present maps to a non-empty queue once the catalog is
/// built; accounts are dropped as soon as their queue empties. Accounts are
/// visited in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkCatalog {
    queues: BTreeMap<AccountId, Vec<ReleaseCode>>,
}

impl WorkCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a genre -> account -> codes listing into per-account queues.
    ///
    /// The genre level is discarded. Empty JSON arrays are accepted wherever
    /// an object is expected, since the service encodes empty maps that way.
    pub fn from_listing(listing: &ApiResponse) -> Result<Self, RestorerError> {
        let genres = match listing.as_json() {
            Some(value) => entries(value, "listing")?,
            None => {
                return Err(RestorerError::MalformedListing(format!(
                    "listing is not JSON: {}",
                    truncate(&listing.to_string())
                )))
            }
        };

        let mut catalog = Self::new();
        for (genre, accounts) in genres {
            let accounts = entries(accounts, &format!("genre {}", genre))?;
            for (account, codes) in accounts {
                let codes = codes.as_array().ok_or_else(|| {
                    RestorerError::MalformedListing(format!(
                        "codes of account {} in genre {} are not a list",
                        account, genre
                    ))
                })?;
                for code in codes {
                    let code = ReleaseCode::from_json(code).ok_or_else(|| {
                        RestorerError::MalformedListing(format!(
                            "invalid release code {} for account {}",
                            code, account
                        ))
                    })?;
                    catalog.push(AccountId::new(account.as_str()), code);
                }
            }
        }

        Ok(catalog)
    }

    /// Append a code to an account's queue, creating the queue if needed.
    pub fn push(&mut self, account: AccountId, code: ReleaseCode) {
        self.queues.entry(account).or_default().push(code);
    }

    /// Remove one occurrence of `code` from `account`'s queue.
    ///
    /// Returns whether something was removed; unknown accounts or codes are a
    /// no-op.
    pub fn remove_item(&mut self, account: &AccountId, code: &ReleaseCode) -> bool {
        let Some(queue) = self.queues.get_mut(account) else {
            return false;
        };
        match queue.iter().position(|c| c == code) {
            Some(idx) => {
                queue.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Drop every account whose queue is empty.
    pub fn prune_empty(&mut self) -> Vec<AccountId> {
        let empty: Vec<AccountId> = self
            .queues
            .iter()
            .filter(|(_, queue)| queue.is_empty())
            .map(|(account, _)| account.clone())
            .collect();
        for account in &empty {
            self.queues.remove(account);
        }
        empty
    }

    /// Total number of queued releases across all accounts.
    pub fn count_remaining(&self) -> usize {
        self.queues.values().map(Vec::len).sum()
    }

    pub fn queue(&self, account: &AccountId) -> Option<&[ReleaseCode]> {
        self.queues.get(account).map(Vec::as_slice)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> {
        self.queues.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &[ReleaseCode])> {
        self.queues.iter().map(|(a, q)| (a, q.as_slice()))
    }

    pub fn contains_account(&self, account: &AccountId) -> bool {
        self.queues.contains_key(account)
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

impl FromIterator<(AccountId, Vec<ReleaseCode>)> for WorkCatalog {
    fn from_iter<I: IntoIterator<Item = (AccountId, Vec<ReleaseCode>)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (account, codes) in iter {
            for code in codes {
                catalog.push(account.clone(), code);
            }
        }
        catalog
    }
}

fn entries<'a>(
    value: &'a Value,
    what: &str,
) -> Result<Vec<(&'a String, &'a Value)>, RestorerError> {
    match value {
        Value::Object(map) => Ok(map.iter().collect()),
        Value::Array(items) if items.is_empty() => Ok(Vec::new()),
        other => Err(RestorerError::MalformedListing(format!(
            "{} is not a map: {}",
            what,
            truncate(&other.to_string())
        ))),
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn code(c: &str) -> ReleaseCode {
        ReleaseCode::from(c)
    }

    fn account(a: &str) -> AccountId {
        AccountId::from(a)
    }

    #[test]
    fn test_flattens_genres() {
        let listing = ApiResponse::Json(json!({
            "G1": {"A": [1, 2]},
            "G2": {"A": [3], "B": ["x"]},
        }));

        let catalog = WorkCatalog::from_listing(&listing).unwrap();

        assert_eq!(catalog.len(), 2);
        let mut a: Vec<_> = catalog.queue(&account("A")).unwrap().to_vec();
        a.sort();
        assert_eq!(a, vec![code("1"), code("2"), code("3")]);
        assert_eq!(catalog.queue(&account("B")).unwrap(), &[code("x")]);
        assert_eq!(catalog.count_remaining(), 4);
    }

    #[test]
    fn test_empty_listing_encodings() {
        for listing in [json!({}), json!([]), json!({"G1": []})] {
            let catalog = WorkCatalog::from_listing(&ApiResponse::Json(listing)).unwrap();
            assert!(catalog.is_empty());
        }
    }

    #[test]
    fn test_account_with_no_codes_is_not_queued() {
        let listing = ApiResponse::Json(json!({"G1": {"A": [], "B": [7]}}));
        let catalog = WorkCatalog::from_listing(&listing).unwrap();
        assert!(!catalog.contains_account(&account("A")));
        assert!(catalog.contains_account(&account("B")));
    }

    #[test]
    fn test_malformed_listings() {
        let cases = [
            ApiResponse::Text("Wrong credentials".to_string()),
            ApiResponse::Json(json!(true)),
            ApiResponse::Json(json!({"G1": [1, 2]})),
            ApiResponse::Json(json!({"G1": {"A": 5}})),
            ApiResponse::Json(json!({"G1": {"A": [{"code": 1}]}})),
        ];
        for listing in cases {
            let result = WorkCatalog::from_listing(&listing);
            assert!(
                matches!(result, Err(RestorerError::MalformedListing(_))),
                "expected malformed listing for {}",
                listing
            );
        }
    }

    #[test]
    fn test_remove_item() {
        let mut catalog: WorkCatalog =
            [(account("A"), vec![code("1"), code("2")])].into_iter().collect();

        assert!(catalog.remove_item(&account("A"), &code("1")));
        assert_eq!(catalog.queue(&account("A")).unwrap(), &[code("2")]);
    }

    #[test]
    fn test_remove_absent_item_is_noop() {
        let mut catalog: WorkCatalog =
            [(account("A"), vec![code("1"), code("2")])].into_iter().collect();
        let before = catalog.clone();

        assert!(!catalog.remove_item(&account("A"), &code("9")));
        assert!(!catalog.remove_item(&account("Z"), &code("1")));
        assert_eq!(catalog, before);
    }

    #[test]
    fn test_remove_item_removes_single_occurrence() {
        let mut catalog: WorkCatalog = [(account("A"), vec![code("1"), code("1")])]
            .into_iter()
            .collect();
        catalog.remove_item(&account("A"), &code("1"));
        assert_eq!(catalog.count_remaining(), 1);
    }

    #[test]
    fn test_prune_empty() {
        let mut catalog: WorkCatalog = [
            (account("A"), vec![code("1")]),
            (account("B"), vec![code("2")]),
        ]
        .into_iter()
        .collect();
        catalog.remove_item(&account("A"), &code("1"));

        let pruned = catalog.prune_empty();

        assert_eq!(pruned, vec![account("A")]);
        assert_eq!(catalog.accounts().collect::<Vec<_>>(), vec![&account("B")]);
    }

    #[test]
    fn test_count_remaining() {
        let catalog: WorkCatalog = [
            (account("A"), vec![code("1"), code("2")]),
            (account("B"), vec![code("3")]),
        ]
        .into_iter()
        .collect();
        assert_eq!(catalog.count_remaining(), 3);
        assert_eq!(WorkCatalog::new().count_remaining(), 0);
    }
}
