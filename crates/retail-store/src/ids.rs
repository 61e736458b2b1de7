//! Record ids: `<PREFIX>_<unix millis>-<8 hex chars>`.
//!
//! The millisecond part keeps ids roughly time-ordered; the random suffix
//! keeps two records created in the same millisecond apart.

use chrono::Utc;
use uuid::Uuid;

fn new_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{millis}-{}", &suffix[..8])
}

pub fn sale_id() -> String {
    new_id("SALE")
}

pub fn register_id() -> String {
    new_id("CASH")
}

pub fn withdrawal_id() -> String {
    new_id("WD")
}

pub fn client_id() -> String {
    new_id("CLIENT")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let id = sale_id();
        let (prefix, rest) = id.split_once('_').unwrap();
        let (millis, suffix) = rest.split_once('-').unwrap();

        assert_eq!(prefix, "SALE");
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_same_millisecond_ids_differ() {
        let ids: std::collections::HashSet<String> = (0..100).map(|_| withdrawal_id()).collect();
        assert_eq!(ids.len(), 100);
        assert!(client_id().starts_with("CLIENT_"));
        assert!(register_id().starts_with("CASH_"));
    }
}
